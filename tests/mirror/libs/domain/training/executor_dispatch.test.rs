// [tests/mirror/libs/domain/training/executor_dispatch.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL DESPACHO POLIMÓRFICO (V2.3 - MASTER)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: LOS CINCO ALGORITMOS SOBRE EL MISMO CONTRATO
 * =================================================================
 */

use aegis_core_learners::{FeatureColumn, FeatureMatrix};
use aegis_domain_models::feature::{
    compute_schema_hash, FeatureConfig, FeatureSet, FeatureSetStatus, SelectedFeature,
};
use aegis_domain_models::{AlgorithmKind, FeatureDtype, ImbalanceStrategy};
use aegis_domain_training::{TrainingExecutor, TrainingRequest};
use chrono::Utc;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Corpus separable de laboratorio (5% fraude, dos features con señal).
fn forge_lab_matrix() -> FeatureMatrix {
    let mut amount = Vec::new();
    let mut velocity = Vec::new();
    let mut labels = Vec::new();
    for index in 0..800 {
        let jitter = (index as f64 * 0.618_033).fract();
        let is_fraud = index % 20 == 0;
        amount.push(if is_fraud { 30.0 + jitter * 4.0 } else { jitter * 6.0 });
        velocity.push(if is_fraud { 10.0 + jitter } else { jitter * 2.0 });
        labels.push(is_fraud);
    }
    FeatureMatrix {
        columns: vec![
            FeatureColumn { name: "amount_zscore".into(), dtype_label: "continuous".into(), values: amount },
            FeatureColumn { name: "velocity_count_1h_24h".into(), dtype_label: "continuous".into(), values: velocity },
        ],
        labels: Some(labels),
    }
}

fn forge_feature_set(matrix: &FeatureMatrix) -> FeatureSet {
    let ordered_schema: Vec<(String, FeatureDtype)> = matrix
        .columns
        .iter()
        .map(|column| (column.name.clone(), FeatureDtype::Continuous))
        .collect();
    FeatureSet {
        id: Uuid::new_v4(),
        dataset_id: Uuid::new_v4(),
        config: FeatureConfig::default(),
        status: FeatureSetStatus::Completed,
        generated_feature_names: matrix.column_names(),
        selected_features: matrix
            .columns
            .iter()
            .map(|column| SelectedFeature {
                name: column.name.clone(),
                dtype: FeatureDtype::Continuous,
                variance_score: 1.0,
                mutual_information_score: 0.3,
                model_importance_score: 0.4,
                combined_rank_score: 1.5,
            })
            .collect(),
        schema_hash: compute_schema_hash(&ordered_schema),
        matrix_artifact_reference: Some("features/00000000-0000-0000-0000-000000000011".into()),
        error_message: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn forge_request(algorithm: AlgorithmKind, strategy: ImbalanceStrategy) -> TrainingRequest {
    let mut hyperparameters = BTreeMap::new();
    hyperparameters.insert("n_estimators".into(), serde_json::json!(20));
    hyperparameters.insert("epochs".into(), serde_json::json!(15));
    TrainingRequest {
        job_id: Uuid::parse_str("11111111-1111-1111-1111-111111111111").expect("uuid"),
        algorithm,
        hyperparameters,
        imbalance_strategy: strategy,
        decision_threshold: 0.5,
        train_fraction: 0.8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /**
     * CERTIFICACIÓN: Cada algoritmo del catálogo entrega métricas
     * completas, importancia alineada al contrato y checksum de 64 hex.
     */
    #[test]
    fn certify_every_algorithm_seals_complete_artifacts() {
        let matrix = forge_lab_matrix();
        let feature_set = forge_feature_set(&matrix);

        for algorithm in [
            AlgorithmKind::XgboostLike,
            AlgorithmKind::LightgbmLike,
            AlgorithmKind::RandomForest,
            AlgorithmKind::IsolationForest,
            AlgorithmKind::SmallNn,
        ] {
            let artifacts = TrainingExecutor::execute(
                &matrix,
                &feature_set,
                &forge_request(algorithm, ImbalanceStrategy::ClassWeight),
                |_, _| {},
                || false,
            )
            .unwrap_or_else(|fault| panic!("{:?} failed: {}", algorithm, fault))
            .expect("not cancelled");

            // Set de métricas completo: ninguna entrada NaN.
            for value in [
                artifacts.metrics.precision,
                artifacts.metrics.recall,
                artifacts.metrics.f1_score,
                artifacts.metrics.auc_roc,
                artifacts.metrics.false_positive_rate,
            ] {
                assert!(value.is_finite(), "{:?} produced a non-finite metric", algorithm);
            }

            assert_eq!(artifacts.feature_importance.len(), 2, "{:?}", algorithm);
            assert_eq!(artifacts.checksum_hexadecimal.len(), 64, "{:?}", algorithm);
            assert!(!artifacts.native_bytes.is_empty());
            assert!(!artifacts.portable_bytes.is_empty());
        }
    }

    /**
     * CERTIFICACIÓN: El booster supervisado supera el piso F1 de los
     * escenarios de laboratorio con la semilla nominal fija.
     */
    #[test]
    fn certify_supervised_quality_floor() {
        let matrix = forge_lab_matrix();
        let feature_set = forge_feature_set(&matrix);

        let artifacts = TrainingExecutor::execute(
            &matrix,
            &feature_set,
            &forge_request(AlgorithmKind::XgboostLike, ImbalanceStrategy::ClassWeight),
            |_, _| {},
            || false,
        )
        .expect("train")
        .expect("not cancelled");

        assert!(
            artifacts.metrics.f1_score >= 0.7,
            "separable corpus must clear the f1 floor, observed {}",
            artifacts.metrics.f1_score
        );
    }

    /**
     * CERTIFICACIÓN: Las tres estrategias de desbalance son ejecutables
     * sobre el mismo contrato sin fuga hacia el split de prueba.
     */
    #[test]
    fn certify_imbalance_strategy_matrix() {
        let matrix = forge_lab_matrix();
        let feature_set = forge_feature_set(&matrix);

        for strategy in [
            ImbalanceStrategy::ClassWeight,
            ImbalanceStrategy::Smote,
            ImbalanceStrategy::Undersample,
        ] {
            let artifacts = TrainingExecutor::execute(
                &matrix,
                &feature_set,
                &forge_request(AlgorithmKind::LightgbmLike, strategy),
                |_, _| {},
                || false,
            )
            .unwrap_or_else(|fault| panic!("{:?} failed: {}", strategy, fault))
            .expect("not cancelled");

            assert!(artifacts.metrics.auc_roc > 0.5, "{:?}", strategy);
        }
    }

    /**
     * CERTIFICACIÓN: Mismo trabajo, mismos artefactos (determinismo por
     * semilla de la orden propietaria).
     */
    #[test]
    fn certify_job_seeded_reproducibility() {
        let matrix = forge_lab_matrix();
        let feature_set = forge_feature_set(&matrix);
        let request = forge_request(AlgorithmKind::RandomForest, ImbalanceStrategy::ClassWeight);

        let first = TrainingExecutor::execute(&matrix, &feature_set, &request, |_, _| {}, || false)
            .expect("train")
            .expect("not cancelled");
        let second = TrainingExecutor::execute(&matrix, &feature_set, &request, |_, _| {}, || false)
            .expect("train")
            .expect("not cancelled");

        assert_eq!(first.portable_bytes, second.portable_bytes);
        assert_eq!(first.checksum_hexadecimal, second.checksum_hexadecimal);
    }
}
