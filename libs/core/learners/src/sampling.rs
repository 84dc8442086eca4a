// [libs/core/learners/src/sampling.rs]
/*!
 * =================================================================
 * APARATO: IMBALANCE RESAMPLING KERNEL (V21.1 - LEAKAGE SHIELD)
 * CLASIFICACIÓN: CORE LEARNING (ESTRATO L1)
 * RESPONSABILIDAD: COMPENSACIÓN DE DESBALANCE SOBRE EL SPLIT DE ENTRENAMIENTO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. LEAKAGE SHIELD: Las tres estrategias operan EXCLUSIVAMENTE sobre la
 *    matriz de entrenamiento; el split de prueba jamás se remuestre.
 * 2. SEEDED SYNTHESIS: SMOTE interpola vecinos de la clase minoritaria
 *    con el RNG sembrado del trabajo, preservando la reproducibilidad.
 * =================================================================
 */

use crate::errors::LearnerError;
use crate::matrix::{FeatureColumn, FeatureMatrix};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Vecindario nominal del interpolador SMOTE.
const SMOTE_NEIGHBOR_COUNT: usize = 5;

/**
 * Pesos por muestra inversos a la frecuencia de clase.
 *
 * # Errors:
 * `DegenerateTrainingSet` si el split contiene una sola clase.
 */
pub fn apply_class_weights(labels: &[bool]) -> Result<Vec<f64>, LearnerError> {
    let positive_count = labels.iter().filter(|label| **label).count();
    let negative_count = labels.len() - positive_count;

    if positive_count == 0 || negative_count == 0 {
        return Err(LearnerError::DegenerateTrainingSet(
            "class weighting requires both classes".into(),
        ));
    }

    let total = labels.len() as f64;
    let positive_weight = total / (2.0 * positive_count as f64);
    let negative_weight = total / (2.0 * negative_count as f64);

    Ok(labels
        .iter()
        .map(|label| if *label { positive_weight } else { negative_weight })
        .collect())
}

/**
 * Sobremuestreo sintético de la clase minoritaria por interpolación de
 * vecinos (SMOTE) hasta igualar la clase mayoritaria.
 */
pub fn synthetic_minority_oversample(
    matrix: &FeatureMatrix,
    random_seed: u64,
) -> Result<FeatureMatrix, LearnerError> {
    let labels = matrix
        .labels
        .as_ref()
        .ok_or_else(|| LearnerError::EmptyMatrix("smote requires labels".into()))?;

    let minority_rows: Vec<usize> =
        labels.iter().enumerate().filter(|(_, label)| **label).map(|(row, _)| row).collect();
    let majority_count = labels.len() - minority_rows.len();

    if minority_rows.is_empty() || majority_count == 0 {
        return Err(LearnerError::DegenerateTrainingSet(
            "smote requires both classes".into(),
        ));
    }
    if minority_rows.len() >= majority_count {
        // Sin déficit minoritario, la matriz queda intacta.
        return Ok(matrix.clone());
    }
    if minority_rows.len() < 2 {
        return Err(LearnerError::DegenerateTrainingSet(
            "smote requires at least two minority samples".into(),
        ));
    }

    let synthetic_count = majority_count - minority_rows.len();
    let mut random_engine = StdRng::seed_from_u64(random_seed);

    // Filas minoritarias materializadas para el cálculo de vecinos.
    let minority_materialized: Vec<Vec<f64>> =
        minority_rows.iter().map(|row| matrix.row(*row)).collect();

    let mut augmented = matrix.clone();
    let augmented_labels = augmented
        .labels
        .as_mut()
        .ok_or_else(|| LearnerError::EmptyMatrix("smote label channel vanished".into()))?;

    for _ in 0..synthetic_count {
        let anchor_position = random_engine.gen_range(0..minority_materialized.len());
        let anchor_row = &minority_materialized[anchor_position];

        // Vecinos más cercanos por distancia euclidiana dentro de la minoría.
        let mut neighbor_candidates: Vec<(usize, f64)> = minority_materialized
            .iter()
            .enumerate()
            .filter(|(position, _)| *position != anchor_position)
            .map(|(position, candidate_row)| {
                let squared_distance: f64 = anchor_row
                    .iter()
                    .zip(candidate_row.iter())
                    .map(|(left, right)| (left - right).powi(2))
                    .sum();
                (position, squared_distance)
            })
            .collect();
        neighbor_candidates
            .sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        neighbor_candidates.truncate(SMOTE_NEIGHBOR_COUNT);

        let (neighbor_position, _) =
            neighbor_candidates[random_engine.gen_range(0..neighbor_candidates.len())];
        let neighbor_row = &minority_materialized[neighbor_position];

        // Interpolación convexa anchor + u (neighbor − anchor), u ~ U(0,1).
        let interpolation_factor: f64 = random_engine.gen_range(0.0..1.0);
        for (column_index, column) in augmented.columns.iter_mut().enumerate() {
            let interpolated = anchor_row[column_index]
                + interpolation_factor * (neighbor_row[column_index] - anchor_row[column_index]);
            column.values.push(interpolated);
        }
        augmented_labels.push(true);
    }

    Ok(augmented)
}

/**
 * Submuestreo aleatorio sembrado de la clase mayoritaria hasta igualar
 * la minoritaria.
 */
pub fn undersample_majority(
    matrix: &FeatureMatrix,
    random_seed: u64,
) -> Result<FeatureMatrix, LearnerError> {
    let labels = matrix
        .labels
        .as_ref()
        .ok_or_else(|| LearnerError::EmptyMatrix("undersample requires labels".into()))?;

    let minority_rows: Vec<usize> =
        labels.iter().enumerate().filter(|(_, label)| **label).map(|(row, _)| row).collect();
    let mut majority_rows: Vec<usize> =
        labels.iter().enumerate().filter(|(_, label)| !**label).map(|(row, _)| row).collect();

    if minority_rows.is_empty() || majority_rows.is_empty() {
        return Err(LearnerError::DegenerateTrainingSet(
            "undersampling requires both classes".into(),
        ));
    }
    if majority_rows.len() <= minority_rows.len() {
        return Ok(matrix.clone());
    }

    // Barajado de Fisher-Yates sembrado y truncado al tamaño minoritario.
    let mut random_engine = StdRng::seed_from_u64(random_seed);
    for shuffle_index in (1..majority_rows.len()).rev() {
        let swap_index = random_engine.gen_range(0..=shuffle_index);
        majority_rows.swap(shuffle_index, swap_index);
    }
    majority_rows.truncate(minority_rows.len());

    let mut retained_rows = minority_rows;
    retained_rows.extend(majority_rows);
    retained_rows.sort_unstable();

    Ok(matrix.select_rows(&retained_rows))
}

/// Forja una columna sintética (utilidad de tests del estrato superior).
pub fn forge_column(name: &str, dtype_label: &str, values: Vec<f64>) -> FeatureColumn {
    FeatureColumn { name: name.to_string(), dtype_label: dtype_label.to_string(), values }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::FeatureMatrix;

    fn forge_imbalanced_matrix() -> FeatureMatrix {
        // 90 negativas, 10 positivas.
        let mut values = Vec::new();
        let mut labels = Vec::new();
        for index in 0..90 {
            values.push(index as f64 * 0.1);
            labels.push(false);
        }
        for index in 0..10 {
            values.push(50.0 + index as f64);
            labels.push(true);
        }
        FeatureMatrix {
            columns: vec![forge_column("amount", "continuous", values)],
            labels: Some(labels),
        }
    }

    #[test]
    fn certify_class_weights_rebalance_mass() {
        let matrix = forge_imbalanced_matrix();
        let labels = matrix.labels.clone().expect("labels");
        let weights = apply_class_weights(&labels).expect("weights");

        let positive_mass: f64 = labels
            .iter()
            .zip(weights.iter())
            .filter(|(label, _)| **label)
            .map(|(_, weight)| *weight)
            .sum();
        let negative_mass: f64 = labels
            .iter()
            .zip(weights.iter())
            .filter(|(label, _)| !**label)
            .map(|(_, weight)| *weight)
            .sum();
        assert!((positive_mass - negative_mass).abs() < 1e-9);
    }

    #[test]
    fn certify_smote_balances_and_interpolates_in_hull() {
        let matrix = forge_imbalanced_matrix();
        let balanced = synthetic_minority_oversample(&matrix, 1234).expect("smote");

        let labels = balanced.labels.as_ref().expect("labels");
        let positive_count = labels.iter().filter(|label| **label).count();
        let negative_count = labels.len() - positive_count;
        assert_eq!(positive_count, negative_count);

        // Las filas sintéticas viven en la envolvente convexa de la minoría.
        for (row, label) in labels.iter().enumerate().skip(100) {
            assert!(*label);
            let value = balanced.columns[0].values[row];
            assert!((50.0..=59.0).contains(&value), "synthetic value {} out of hull", value);
        }
    }

    #[test]
    fn certify_undersampling_is_seed_deterministic() {
        let matrix = forge_imbalanced_matrix();
        let first = undersample_majority(&matrix, 777).expect("undersample");
        let second = undersample_majority(&matrix, 777).expect("undersample");
        assert_eq!(first, second);
        assert_eq!(first.row_count(), 20);
    }
}
