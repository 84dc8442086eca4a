// [libs/domain/training/src/split.rs]
/*!
 * =================================================================
 * APARATO: STRATIFIED SPLIT KERNEL (V18.1 - SEEDED SHUFFLE)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: PARTICIÓN ESTRATIFICADA SEMBRADA POR ETIQUETA
 *
 * # Mathematical Proof (Stratification):
 * Cada clase se baraja y corta de forma independiente con la misma
 * fracción, por lo que la prevalencia de fraude del split de prueba
 * difiere de la global en a lo sumo 1/|clase| por redondeo.
 * =================================================================
 */

use crate::errors::TrainingError;
use aegis_core_learners::FeatureMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/**
 * Divide una matriz etiquetada en (entrenamiento, prueba) estratificando
 * por etiqueta con barajado sembrado.
 *
 * # Errors:
 * - `AlgorithmRejected` si la fracción sale de (0, 1) o alguna clase
 *   carece de muestras suficientes para ambos lados.
 */
pub fn stratified_split(
    matrix: &FeatureMatrix,
    train_fraction: f64,
    random_seed: u64,
) -> Result<(FeatureMatrix, FeatureMatrix), TrainingError> {
    if !(train_fraction > 0.0 && train_fraction < 1.0) {
        return Err(TrainingError::AlgorithmRejected(format!(
            "train_fraction must be in (0, 1), observed {}",
            train_fraction
        )));
    }

    let labels = matrix
        .labels
        .as_ref()
        .ok_or_else(|| TrainingError::Internal("split requires labels".into()))?;

    let mut positive_rows: Vec<usize> = Vec::new();
    let mut negative_rows: Vec<usize> = Vec::new();
    for (row_index, label) in labels.iter().enumerate() {
        if *label {
            positive_rows.push(row_index);
        } else {
            negative_rows.push(row_index);
        }
    }

    if positive_rows.len() < 2 || negative_rows.len() < 2 {
        return Err(TrainingError::AlgorithmRejected(
            "stratified split requires at least two samples per class".into(),
        ));
    }

    let mut random_engine = StdRng::seed_from_u64(random_seed);
    let mut train_rows = Vec::new();
    let mut test_rows = Vec::new();

    for class_rows in [&mut positive_rows, &mut negative_rows] {
        // Barajado de Fisher-Yates sembrado por clase.
        for shuffle_index in (1..class_rows.len()).rev() {
            let swap_index = random_engine.gen_range(0..=shuffle_index);
            class_rows.swap(shuffle_index, swap_index);
        }
        // Al menos una muestra de cada clase en cada lado.
        let cut = ((class_rows.len() as f64 * train_fraction).round() as usize)
            .clamp(1, class_rows.len() - 1);
        train_rows.extend_from_slice(&class_rows[..cut]);
        test_rows.extend_from_slice(&class_rows[cut..]);
    }

    // Orden estable por índice original para reproducibilidad bit-perfecta.
    train_rows.sort_unstable();
    test_rows.sort_unstable();

    Ok((matrix.select_rows(&train_rows), matrix.select_rows(&test_rows)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_core_learners::FeatureColumn;

    fn forge_matrix(row_count: usize, fraud_every: usize) -> FeatureMatrix {
        FeatureMatrix {
            columns: vec![FeatureColumn {
                name: "x".into(),
                dtype_label: "continuous".into(),
                values: (0..row_count).map(|index| index as f64).collect(),
            }],
            labels: Some((0..row_count).map(|index| index % fraud_every == 0).collect()),
        }
    }

    #[test]
    fn certify_split_preserves_class_ratio() {
        let matrix = forge_matrix(1000, 20);
        let (train, test) = stratified_split(&matrix, 0.8, 99).expect("split");

        let prevalence = |side: &FeatureMatrix| -> f64 {
            let labels = side.labels.as_ref().expect("labels");
            labels.iter().filter(|label| **label).count() as f64 / labels.len() as f64
        };

        assert!((prevalence(&train) - 0.05).abs() < 0.01);
        assert!((prevalence(&test) - 0.05).abs() < 0.01);
        assert_eq!(train.row_count() + test.row_count(), 1000);
    }

    #[test]
    fn certify_split_is_seed_deterministic() {
        let matrix = forge_matrix(500, 10);
        let first = stratified_split(&matrix, 0.8, 1234).expect("split");
        let second = stratified_split(&matrix, 0.8, 1234).expect("split");
        assert_eq!(first.0, second.0);
        assert_eq!(first.1, second.1);
    }

    #[test]
    fn certify_degenerate_class_rejected() {
        let matrix = FeatureMatrix {
            columns: vec![FeatureColumn {
                name: "x".into(),
                dtype_label: "continuous".into(),
                values: vec![1.0, 2.0, 3.0],
            }],
            labels: Some(vec![false, false, false]),
        };
        assert!(matches!(
            stratified_split(&matrix, 0.8, 1),
            Err(TrainingError::AlgorithmRejected(_))
        ));
    }
}
