// [tests/mirror/libs/core/learners/matrix_codec_integrity.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE CODEC COLUMNAR Y REMUESTREO (V2.1 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-MIRROR
 * RESPONSABILIDAD: INTEGRIDAD BIT-PERFECTA DE LA MATRIZ Y SMOTE
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use aegis_core_learners::sampling::{
        apply_class_weights, synthetic_minority_oversample, undersample_majority,
    };
    use aegis_core_learners::{FeatureColumn, FeatureMatrix};

    fn forge_imbalanced_matrix() -> FeatureMatrix {
        let mut amount = Vec::new();
        let mut velocity = Vec::new();
        let mut labels = Vec::new();
        for index in 0..190 {
            amount.push(10.0 + (index % 50) as f64);
            velocity.push((index % 7) as f64);
            labels.push(false);
        }
        for index in 0..10 {
            amount.push(5_000.0 + index as f64 * 100.0);
            velocity.push(20.0 + index as f64);
            labels.push(true);
        }
        FeatureMatrix {
            columns: vec![
                FeatureColumn { name: "amount".into(), dtype_label: "continuous".into(), values: amount },
                FeatureColumn { name: "velocity".into(), dtype_label: "discrete".into(), values: velocity },
            ],
            labels: Some(labels),
        }
    }

    /**
     * CERTIFICACIÓN: El codec de artefacto es bit-estable y reversible.
     */
    #[test]
    fn certify_artifact_codec_bit_stability() {
        let matrix = forge_imbalanced_matrix();
        let first_bytes = matrix.to_artifact_bytes().expect("encode");
        let second_bytes = matrix.to_artifact_bytes().expect("encode");
        assert_eq!(first_bytes, second_bytes);

        let recovered = FeatureMatrix::from_artifact_bytes(&first_bytes).expect("decode");
        assert_eq!(recovered, matrix);
        assert_eq!(recovered.row_count(), 200);
        assert_eq!(recovered.column_count(), 2);
    }

    /**
     * CERTIFICACIÓN: SMOTE multidimensional interpola dentro de la
     * envolvente convexa de la minoría y balancea exactamente.
     */
    #[test]
    fn certify_smote_multidimensional_hull() {
        let matrix = forge_imbalanced_matrix();
        let balanced = synthetic_minority_oversample(&matrix, 2024).expect("smote");

        let labels = balanced.labels.as_ref().expect("labels");
        let positives = labels.iter().filter(|label| **label).count();
        assert_eq!(positives * 2, labels.len());

        // Toda fila sintética vive dentro del rango de la minoría original.
        for row_index in 200..balanced.row_count() {
            let amount = balanced.columns[0].values[row_index];
            let velocity = balanced.columns[1].values[row_index];
            assert!((5_000.0..=5_900.0).contains(&amount), "amount {}", amount);
            assert!((20.0..=29.0).contains(&velocity), "velocity {}", velocity);
        }
    }

    /**
     * CERTIFICACIÓN: Undersampling equilibra y los pesos de clase
     * reparten masa idéntica a cada lado.
     */
    #[test]
    fn certify_undersampling_and_weights() {
        let matrix = forge_imbalanced_matrix();

        let reduced = undersample_majority(&matrix, 99).expect("undersample");
        let reduced_labels = reduced.labels.as_ref().expect("labels");
        let reduced_positives = reduced_labels.iter().filter(|label| **label).count();
        assert_eq!(reduced_positives * 2, reduced_labels.len());
        assert_eq!(reduced.row_count(), 20);

        let weights =
            apply_class_weights(matrix.labels.as_ref().expect("labels")).expect("weights");
        let positive_mass: f64 = matrix
            .labels
            .as_ref()
            .expect("labels")
            .iter()
            .zip(weights.iter())
            .filter(|(label, _)| **label)
            .map(|(_, weight)| weight)
            .sum();
        let total_mass: f64 = weights.iter().sum();
        assert!((positive_mass / total_mass - 0.5).abs() < 1e-9);
    }
}
