// [libs/core/stats-engine/src/association.rs]
/*!
 * =================================================================
 * APARATO: ASSOCIATION KERNEL (V15.2 - KNN ESTIMATOR SEALED)
 * CLASIFICACIÓN: CORE MATH (ESTRATO L1)
 * RESPONSABILIDAD: CORRELACIÓN DE PEARSON E INFORMACIÓN MUTUA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. DUAL ESTIMATORS: Información mutua por tabla de contingencia para
 *    features discretas y por vecinos k-NN (Ross 2014) para continuas
 *    contra etiqueta discreta.
 * 2. SORTED WINDOW OPTIMIZATION: En una dimensión el k-ésimo vecino se
 *    resuelve con ventanas ordenadas, llevando el estimador a O(n log n).
 *
 * # Mathematical Proof (Ross Estimator):
 * I(X;Y) ≈ ψ(N) − ⟨ψ(N_y)⟩ + ψ(k) − ⟨ψ(m_i)⟩ donde m_i es el conteo de
 * puntos de la muestra completa dentro del radio del k-ésimo vecino de la
 * misma clase. El estimador es consistente para X continua e Y discreta.
 * =================================================================
 */

use crate::errors::StatsError;
use crate::special::digamma;
use std::collections::BTreeMap;

/**
 * Coeficiente de correlación de Pearson entre dos muestras pareadas.
 *
 * # Errors:
 * - `LengthMismatch` ante longitudes distintas.
 * - `DegenerateDistribution` si alguna muestra carece de varianza.
 */
pub fn pearson_correlation(left: &[f64], right: &[f64]) -> Result<f64, StatsError> {
    if left.len() != right.len() {
        return Err(StatsError::LengthMismatch { expected: left.len(), observed: right.len() });
    }
    if left.is_empty() {
        return Err(StatsError::EmptySample("pearson_correlation".into()));
    }

    let sample_size = left.len() as f64;
    let mean_left = left.iter().sum::<f64>() / sample_size;
    let mean_right = right.iter().sum::<f64>() / sample_size;

    let mut covariance_accumulator = 0.0;
    let mut variance_left = 0.0;
    let mut variance_right = 0.0;

    for (value_left, value_right) in left.iter().zip(right.iter()) {
        let delta_left = value_left - mean_left;
        let delta_right = value_right - mean_right;
        covariance_accumulator += delta_left * delta_right;
        variance_left += delta_left * delta_left;
        variance_right += delta_right * delta_right;
    }

    if variance_left < f64::EPSILON || variance_right < f64::EPSILON {
        return Err(StatsError::DegenerateDistribution(
            "pearson requires non-null variance on both sides".into(),
        ));
    }

    Ok(covariance_accumulator / (variance_left.sqrt() * variance_right.sqrt()))
}

/**
 * Información mutua (nats) entre una feature discreta y la etiqueta binaria
 * mediante tabla de contingencia.
 */
pub fn mutual_information_discrete(
    feature_values: &[i64],
    labels: &[bool],
) -> Result<f64, StatsError> {
    if feature_values.len() != labels.len() {
        return Err(StatsError::LengthMismatch {
            expected: feature_values.len(),
            observed: labels.len(),
        });
    }
    if feature_values.is_empty() {
        return Err(StatsError::EmptySample("mutual_information_discrete".into()));
    }

    let sample_size = feature_values.len() as f64;
    let mut joint_counts: BTreeMap<(i64, bool), f64> = BTreeMap::new();
    let mut feature_counts: BTreeMap<i64, f64> = BTreeMap::new();
    let mut label_counts: BTreeMap<bool, f64> = BTreeMap::new();

    for (feature_value, label) in feature_values.iter().zip(labels.iter()) {
        *joint_counts.entry((*feature_value, *label)).or_insert(0.0) += 1.0;
        *feature_counts.entry(*feature_value).or_insert(0.0) += 1.0;
        *label_counts.entry(*label).or_insert(0.0) += 1.0;
    }

    let mutual_information: f64 = joint_counts
        .iter()
        .map(|((feature_value, label), joint_count)| {
            let joint_probability = joint_count / sample_size;
            let feature_probability = feature_counts[feature_value] / sample_size;
            let label_probability = label_counts[label] / sample_size;
            joint_probability * (joint_probability / (feature_probability * label_probability)).ln()
        })
        .sum();

    Ok(mutual_information.max(0.0))
}

/**
 * Información mutua (nats) entre una feature continua y la etiqueta binaria
 * mediante el estimador de vecinos k-NN en una dimensión.
 *
 * # Errors:
 * - `InvalidParameter` si k == 0.
 * - `DegenerateDistribution` si alguna clase tiene menos de 2 muestras.
 */
pub fn mutual_information_continuous(
    feature_values: &[f64],
    labels: &[bool],
    neighbor_count: usize,
) -> Result<f64, StatsError> {
    if feature_values.len() != labels.len() {
        return Err(StatsError::LengthMismatch {
            expected: feature_values.len(),
            observed: labels.len(),
        });
    }
    if feature_values.is_empty() {
        return Err(StatsError::EmptySample("mutual_information_continuous".into()));
    }
    if neighbor_count == 0 {
        return Err(StatsError::InvalidParameter("neighbor_count must be >= 1".into()));
    }

    let total_size = feature_values.len();

    // Vista ordenada global para los conteos de radio.
    let mut ordered_global: Vec<f64> = feature_values.to_vec();
    ordered_global.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    // Vistas ordenadas por clase para el k-ésimo vecino intra-clase.
    let mut ordered_by_class: BTreeMap<bool, Vec<f64>> = BTreeMap::new();
    for (value, label) in feature_values.iter().zip(labels.iter()) {
        ordered_by_class.entry(*label).or_default().push(*value);
    }
    for class_values in ordered_by_class.values_mut() {
        class_values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
        if class_values.len() < 2 {
            return Err(StatsError::DegenerateDistribution(
                "each label class requires at least two samples".into(),
            ));
        }
    }

    let mut digamma_neighbor_accumulator = 0.0;
    let mut digamma_class_accumulator = 0.0;
    let mut digamma_radius_accumulator = 0.0;

    for (value, label) in feature_values.iter().zip(labels.iter()) {
        let class_values = &ordered_by_class[label];
        let class_size = class_values.len();
        // k efectivo acotado por el tamaño de la clase (excluyendo el propio punto).
        let effective_k = neighbor_count.min(class_size - 1);

        let kth_distance = kth_neighbor_distance_sorted(class_values, *value, effective_k);

        // Conteo global de puntos dentro del radio (excluyendo el propio punto).
        let radius_count =
            count_within_radius_sorted(&ordered_global, *value, kth_distance).saturating_sub(1);

        digamma_neighbor_accumulator += digamma(effective_k as f64);
        digamma_class_accumulator += digamma(class_size as f64);
        digamma_radius_accumulator += digamma((radius_count.max(1)) as f64);
    }

    let sample_size = total_size as f64;
    let mutual_information = digamma(sample_size)
        - digamma_class_accumulator / sample_size
        + digamma_neighbor_accumulator / sample_size
        - digamma_radius_accumulator / sample_size;

    Ok(mutual_information.max(0.0))
}

/// Distancia al k-ésimo vecino de 'target' dentro de una vista ordenada.
fn kth_neighbor_distance_sorted(ordered_values: &[f64], target: f64, neighbor_count: usize) -> f64 {
    let anchor = ordered_values
        .binary_search_by(|probe| probe.partial_cmp(&target).unwrap_or(std::cmp::Ordering::Less))
        .unwrap_or_else(|insertion_point| insertion_point);

    // Expansión bidireccional de la ventana ordenada: el siguiente vecino
    // más cercano siempre está en uno de los dos bordes.
    let mut left_cursor = anchor as isize - 1;
    let mut right_cursor = anchor;
    let mut collected = 0usize;
    let mut last_distance = 0.0_f64;
    let mut skipped_self = false;

    while collected < neighbor_count {
        let left_distance = if left_cursor >= 0 {
            (target - ordered_values[left_cursor as usize]).abs()
        } else {
            f64::INFINITY
        };
        let right_distance = if right_cursor < ordered_values.len() {
            (ordered_values[right_cursor] - target).abs()
        } else {
            f64::INFINITY
        };

        let chosen_distance = if left_distance <= right_distance {
            left_cursor -= 1;
            left_distance
        } else {
            right_cursor += 1;
            right_distance
        };

        if chosen_distance.is_infinite() {
            break;
        }

        // El propio punto (distancia 0) se excluye una sola vez.
        if !skipped_self && chosen_distance < f64::EPSILON {
            skipped_self = true;
            continue;
        }

        collected += 1;
        last_distance = chosen_distance;
    }

    last_distance
}

/// Conteo de puntos con |x − target| <= radius en una vista ordenada.
fn count_within_radius_sorted(ordered_values: &[f64], target: f64, radius: f64) -> usize {
    let lower_bound = target - radius;
    let upper_bound = target + radius;

    let first_index = ordered_values.partition_point(|probe| *probe < lower_bound);
    let last_index = ordered_values.partition_point(|probe| *probe <= upper_bound);
    last_index.saturating_sub(first_index)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certify_pearson_perfect_correlation() {
        let left: Vec<f64> = (0..100).map(|index| index as f64).collect();
        let right: Vec<f64> = left.iter().map(|value| 3.0 * value + 7.0).collect();
        let inverted: Vec<f64> = left.iter().map(|value| -value).collect();

        assert!((pearson_correlation(&left, &right).expect("r") - 1.0).abs() < 1e-9);
        assert!((pearson_correlation(&left, &inverted).expect("r") + 1.0).abs() < 1e-9);
    }

    #[test]
    fn certify_discrete_mi_on_perfect_predictor() {
        // Feature idéntica a la etiqueta: MI == H(Y) = ln(2) para clases balanceadas.
        let labels: Vec<bool> = (0..1000).map(|index| index % 2 == 0).collect();
        let feature: Vec<i64> = labels.iter().map(|label| i64::from(*label)).collect();

        let mutual_information = mutual_information_discrete(&feature, &labels).expect("mi");
        assert!((mutual_information - std::f64::consts::LN_2).abs() < 1e-9);

        // Feature constante: MI == 0.
        let constant_feature = vec![5_i64; labels.len()];
        let null_information = mutual_information_discrete(&constant_feature, &labels).expect("mi");
        assert!(null_information.abs() < 1e-9);
    }

    #[test]
    fn certify_continuous_mi_separable_exceeds_noise() {
        // Clase positiva centrada en 10, negativa en 0: información alta.
        let mut values = Vec::new();
        let mut labels = Vec::new();
        for index in 0..400 {
            let jitter = (index as f64 * 0.618).fract();
            values.push(jitter);
            labels.push(false);
            values.push(10.0 + jitter);
            labels.push(true);
        }
        let separable = mutual_information_continuous(&values, &labels, 5).expect("mi");

        // Feature independiente de la etiqueta: información cercana a cero.
        let independent: Vec<f64> = (0..800).map(|index| (index as f64 * 0.37).fract()).collect();
        let noise = mutual_information_continuous(&independent, &labels, 5).expect("mi");

        assert!(
            separable > noise + 0.2,
            "separable {} must dominate noise {}",
            separable,
            noise
        );
    }
}
