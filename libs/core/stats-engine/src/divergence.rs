// [libs/core/stats-engine/src/divergence.rs]
/*!
 * =================================================================
 * APARATO: DISTRIBUTIONAL DIVERGENCE KERNEL (V15.0 - TRIPLE METRIC)
 * CLASIFICACIÓN: CORE MATH (ESTRATO L1)
 * RESPONSABILIDAD: PSI, KOLMOGOROV-SMIRNOV Y CHI-CUADRADO CATEGÓRICO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. FROZEN SUPPORT: El PSI discretiza referencia y ventana corriente
 *    sobre bordes congelados de la referencia (ver histogram.rs).
 * 2. ASYMPTOTIC TAILS: P-valores KS por la serie Q_KS y chi-cuadrado por
 *    gamma incompleta regularizada, sin tablas externas.
 * 3. LAPLACE GUARD: Suavizado aditivo ε=1e-3 en frecuencias categóricas.
 *
 * # Mathematical Proof (PSI Decomposition):
 * PSI = Σ_b (p_cur(b) − p_ref(b)) · ln(p_cur(b) / p_ref(b)) >= 0 con
 * igualdad sii las proporciones coinciden bin a bin; el suavizado
 * aditivo garantiza la existencia del logaritmo en todo el soporte.
 * =================================================================
 */

use crate::errors::StatsError;
use crate::histogram::{bin_proportions, HistogramSpec};
use crate::special::regularized_lower_gamma;
use std::collections::BTreeMap;

/// Suavizado aditivo nominal para proporciones y frecuencias.
pub const LAPLACE_SMOOTHING_EPSILON: f64 = 1e-3;

/// Resultado del test de Kolmogorov-Smirnov de dos muestras.
#[derive(Debug, Clone, PartialEq)]
pub struct KsOutcome {
    /// Estadístico D: máxima diferencia absoluta entre CDFs empíricas.
    pub statistic: f64,
    /// P-valor asintótico por la serie Q_KS.
    pub p_value: f64,
}

/// Resultado del test chi-cuadrado categórico.
#[derive(Debug, Clone, PartialEq)]
pub struct ChiSquareOutcome {
    /// Estadístico chi-cuadrado agregado.
    pub statistic: f64,
    /// Grados de libertad (categorías − 1).
    pub degrees_of_freedom: usize,
    /// P-valor por cola superior de la distribución chi-cuadrado.
    pub p_value: f64,
}

/**
 * Population Stability Index entre referencia congelada y ventana corriente.
 *
 * Ambas muestras se discretizan sobre la especificación de bordes sellada
 * en la referencia de entrenamiento.
 */
pub fn population_stability_index(
    reference: &[f64],
    current: &[f64],
    spec: &HistogramSpec,
) -> Result<f64, StatsError> {
    let reference_proportions = bin_proportions(reference, spec, LAPLACE_SMOOTHING_EPSILON)?;
    let current_proportions = bin_proportions(current, spec, LAPLACE_SMOOTHING_EPSILON)?;

    Ok(reference_proportions
        .iter()
        .zip(current_proportions.iter())
        .map(|(p_ref, p_cur)| (p_cur - p_ref) * (p_cur / p_ref).ln())
        .sum())
}

/**
 * Test KS de dos muestras con p-valor asintótico.
 *
 * # Errors:
 * `EmptySample` si cualquiera de las muestras está vacía.
 */
pub fn kolmogorov_smirnov(reference: &[f64], current: &[f64]) -> Result<KsOutcome, StatsError> {
    if reference.is_empty() || current.is_empty() {
        return Err(StatsError::EmptySample("kolmogorov_smirnov".into()));
    }

    let mut ordered_reference = reference.to_vec();
    let mut ordered_current = current.to_vec();
    ordered_reference.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    ordered_current.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let reference_size = ordered_reference.len();
    let current_size = ordered_current.len();

    // Barrido de fusión sobre ambas CDFs empíricas.
    let mut index_reference = 0usize;
    let mut index_current = 0usize;
    let mut maximum_distance = 0.0_f64;

    while index_reference < reference_size && index_current < current_size {
        let value_reference = ordered_reference[index_reference];
        let value_current = ordered_current[index_current];

        if value_reference <= value_current {
            index_reference += 1;
        }
        if value_current <= value_reference {
            index_current += 1;
        }

        let cdf_reference = index_reference as f64 / reference_size as f64;
        let cdf_current = index_current as f64 / current_size as f64;
        maximum_distance = maximum_distance.max((cdf_reference - cdf_current).abs());
    }

    let effective_size = (reference_size as f64 * current_size as f64)
        / (reference_size as f64 + current_size as f64);
    let lambda = (effective_size.sqrt() + 0.12 + 0.11 / effective_size.sqrt()) * maximum_distance;

    Ok(KsOutcome {
        statistic: maximum_distance,
        p_value: ks_tail_probability(lambda),
    })
}

/// Serie asintótica Q_KS(λ) = 2 Σ (−1)^{j−1} exp(−2 j² λ²).
fn ks_tail_probability(lambda: f64) -> f64 {
    if lambda < 1e-9 {
        return 1.0;
    }

    let mut accumulator = 0.0_f64;
    let mut sign = 1.0_f64;
    let exponent_base = -2.0 * lambda * lambda;

    for term_index in 1..=100 {
        let term = sign * (exponent_base * (term_index * term_index) as f64).exp();
        accumulator += term;
        if term.abs() < 1e-12 {
            break;
        }
        sign = -sign;
    }

    (2.0 * accumulator).clamp(0.0, 1.0)
}

/**
 * Chi-cuadrado de homogeneidad para features categóricas con suavizado
 * de Laplace sobre las frecuencias esperadas.
 *
 * Las categorías se toman de la unión de ambos lados; la frecuencia
 * esperada se deriva de la distribución de referencia escalada al tamaño
 * de la ventana corriente.
 */
pub fn chi_square_categorical(
    reference_labels: &[String],
    current_labels: &[String],
) -> Result<ChiSquareOutcome, StatsError> {
    if reference_labels.is_empty() || current_labels.is_empty() {
        return Err(StatsError::EmptySample("chi_square_categorical".into()));
    }

    let mut category_union: BTreeMap<&str, (f64, f64)> = BTreeMap::new();
    for label in reference_labels {
        category_union.entry(label.as_str()).or_insert((0.0, 0.0)).0 += 1.0;
    }
    for label in current_labels {
        category_union.entry(label.as_str()).or_insert((0.0, 0.0)).1 += 1.0;
    }

    let category_count = category_union.len();
    if category_count < 2 {
        return Err(StatsError::DegenerateDistribution(
            "chi_square requires at least two categories".into(),
        ));
    }

    let reference_total = reference_labels.len() as f64
        + LAPLACE_SMOOTHING_EPSILON * category_count as f64;
    let current_total = current_labels.len() as f64;

    let statistic: f64 = category_union
        .values()
        .map(|(reference_count, current_count)| {
            let reference_proportion =
                (reference_count + LAPLACE_SMOOTHING_EPSILON) / reference_total;
            let expected = reference_proportion * current_total;
            (current_count - expected).powi(2) / expected
        })
        .sum();

    let degrees_of_freedom = category_count - 1;
    let p_value =
        1.0 - regularized_lower_gamma(degrees_of_freedom as f64 / 2.0, statistic / 2.0);

    Ok(ChiSquareOutcome { statistic, degrees_of_freedom, p_value: p_value.clamp(0.0, 1.0) })
}
