// [libs/core/stats-engine/src/descriptive.rs]
/*!
 * =================================================================
 * APARATO: DESCRIPTIVE STATISTICS KERNEL (V14.0 - NOMINAL)
 * CLASIFICACIÓN: CORE MATH (ESTRATO L1)
 * RESPONSABILIDAD: MOMENTOS MUESTRALES Y CUANTILES DETERMINISTAS
 * =================================================================
 */

use crate::errors::StatsError;

/// Media aritmética de la muestra.
pub fn sample_mean(sample: &[f64]) -> Result<f64, StatsError> {
    if sample.is_empty() {
        return Err(StatsError::EmptySample("sample_mean".into()));
    }
    Ok(sample.iter().sum::<f64>() / sample.len() as f64)
}

/// Varianza muestral (divisor n−1; n==1 degenera a 0).
pub fn sample_variance(sample: &[f64]) -> Result<f64, StatsError> {
    if sample.is_empty() {
        return Err(StatsError::EmptySample("sample_variance".into()));
    }
    if sample.len() == 1 {
        return Ok(0.0);
    }
    let mean = sample_mean(sample)?;
    let sum_of_squares: f64 = sample.iter().map(|value| (value - mean).powi(2)).sum();
    Ok(sum_of_squares / (sample.len() - 1) as f64)
}

/// Desviación estándar muestral.
pub fn sample_standard_deviation(sample: &[f64]) -> Result<f64, StatsError> {
    Ok(sample_variance(sample)?.sqrt())
}

/**
 * Cuantil empírico por interpolación lineal entre estadísticos de orden.
 *
 * # Errors:
 * - `EmptySample` ante muestra vacía.
 * - `InvalidParameter` si la probabilidad sale de [0, 1].
 */
pub fn quantile(sample: &[f64], probability: f64) -> Result<f64, StatsError> {
    if sample.is_empty() {
        return Err(StatsError::EmptySample("quantile".into()));
    }
    if !(0.0..=1.0).contains(&probability) {
        return Err(StatsError::InvalidParameter(format!(
            "quantile probability out of range: {}",
            probability
        )));
    }

    let mut ordered = sample.to_vec();
    ordered.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let position = probability * (ordered.len() - 1) as f64;
    let lower_index = position.floor() as usize;
    let upper_index = position.ceil() as usize;

    if lower_index == upper_index {
        return Ok(ordered[lower_index]);
    }

    let fraction = position - lower_index as f64;
    Ok(ordered[lower_index] * (1.0 - fraction) + ordered[upper_index] * fraction)
}
