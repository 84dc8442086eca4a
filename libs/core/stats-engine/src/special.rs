// [libs/core/stats-engine/src/special.rs]
/*!
 * =================================================================
 * APARATO: SPECIAL FUNCTIONS KERNEL (V14.1 - NUMERIC SEALED)
 * CLASIFICACIÓN: CORE MATH (ESTRATO L1)
 * RESPONSABILIDAD: FUNCIONES ESPECIALES PARA COLAS DE DISTRIBUCIÓN
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SELF-CONTAINED NUMERICS: Implementación propia de erf, gamma
 *    incompleta regularizada y digamma, sin dependencias externas.
 * 2. PRECISION BUDGET: Error absoluto < 1.5e-7 para erf (Abramowitz &
 *    Stegun 7.1.26) y < 1e-10 para las series de gamma incompleta.
 *
 * # Mathematical Proof (Tail Evaluation):
 * P(k/2, x/2) (gamma regularizada inferior) evalúa la CDF chi-cuadrado;
 * la serie converge para x < a+1 y la fracción continua de Lentz para
 * x >= a+1, cubriendo el dominio completo con precisión uniforme.
 * =================================================================
 */

/// Iteraciones máximas de las series de gamma incompleta.
const GAMMA_MAX_ITERATIONS: usize = 200;
/// Tolerancia relativa de convergencia de las series.
const GAMMA_EPSILON: f64 = 1.0e-12;
/// Piso numérico para la fracción continua de Lentz.
const LENTZ_TINY: f64 = 1.0e-300;

/**
 * Función error mediante la aproximación 7.1.26 de Abramowitz & Stegun.
 * Error absoluto máximo 1.5e-7, suficiente para bandas de p-valor.
 */
pub fn error_function(argument: f64) -> f64 {
    let sign = if argument < 0.0 { -1.0 } else { 1.0 };
    let magnitude = argument.abs();

    let t = 1.0 / (1.0 + 0.3275911 * magnitude);
    let polynomial = t
        * (0.254829592
            + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));

    sign * (1.0 - polynomial * (-magnitude * magnitude).exp())
}

/// CDF de la normal estándar.
pub fn standard_normal_cdf(argument: f64) -> f64 {
    0.5 * (1.0 + error_function(argument / std::f64::consts::SQRT_2))
}

/// Logaritmo natural de la función gamma (Lanczos g=7, n=9).
pub fn ln_gamma(argument: f64) -> f64 {
    const LANCZOS_COEFFICIENTS: [f64; 9] = [
        0.999_999_999_999_809_93,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];

    if argument < 0.5 {
        // Reflexión de Euler para el semiplano izquierdo.
        let pi = std::f64::consts::PI;
        return (pi / (pi * argument).sin()).ln() - ln_gamma(1.0 - argument);
    }

    let shifted = argument - 1.0;
    let mut accumulator = LANCZOS_COEFFICIENTS[0];
    for (index, coefficient) in LANCZOS_COEFFICIENTS.iter().enumerate().skip(1) {
        accumulator += coefficient / (shifted + index as f64);
    }

    let t = shifted + 7.5;
    0.5 * (2.0 * std::f64::consts::PI).ln() + (shifted + 0.5) * t.ln() - t + accumulator.ln()
}

/**
 * Gamma incompleta regularizada inferior P(a, x).
 *
 * Serie ascendente para x < a + 1; complemento de la fracción continua
 * de Lentz en el resto del dominio.
 */
pub fn regularized_lower_gamma(shape: f64, argument: f64) -> f64 {
    if argument <= 0.0 || shape <= 0.0 {
        return 0.0;
    }

    if argument < shape + 1.0 {
        // Serie ascendente.
        let mut term = 1.0 / shape;
        let mut sum = term;
        let mut denominator = shape;
        for _ in 0..GAMMA_MAX_ITERATIONS {
            denominator += 1.0;
            term *= argument / denominator;
            sum += term;
            if term.abs() < sum.abs() * GAMMA_EPSILON {
                break;
            }
        }
        sum * (-argument + shape * argument.ln() - ln_gamma(shape)).exp()
    } else {
        1.0 - regularized_upper_gamma_continued_fraction(shape, argument)
    }
}

/// Gamma incompleta regularizada superior Q(a, x) por fracción continua.
fn regularized_upper_gamma_continued_fraction(shape: f64, argument: f64) -> f64 {
    let mut b = argument + 1.0 - shape;
    let mut c = 1.0 / LENTZ_TINY;
    let mut d = 1.0 / b;
    let mut h = d;

    for iteration in 1..=GAMMA_MAX_ITERATIONS {
        let a_n = -(iteration as f64) * (iteration as f64 - shape);
        b += 2.0;
        d = a_n * d + b;
        if d.abs() < LENTZ_TINY {
            d = LENTZ_TINY;
        }
        c = b + a_n / c;
        if c.abs() < LENTZ_TINY {
            c = LENTZ_TINY;
        }
        d = 1.0 / d;
        let delta = d * c;
        h *= delta;
        if (delta - 1.0).abs() < GAMMA_EPSILON {
            break;
        }
    }

    h * (-argument + shape * argument.ln() - ln_gamma(shape)).exp()
}

/// Función digamma ψ(x) por recurrencia y expansión asintótica.
pub fn digamma(argument: f64) -> f64 {
    let mut x = argument;
    let mut accumulator = 0.0;

    // Recurrencia ψ(x) = ψ(x+1) − 1/x hasta el dominio asintótico.
    while x < 6.0 {
        accumulator -= 1.0 / x;
        x += 1.0;
    }

    let inverse = 1.0 / x;
    let inverse_squared = inverse * inverse;
    accumulator + x.ln() - 0.5 * inverse
        - inverse_squared
            * (1.0 / 12.0 - inverse_squared * (1.0 / 120.0 - inverse_squared / 252.0))
}
