// [libs/domain/models/src/tests_serialization.rs]
/**
 * =================================================================
 * APARATO: DOMAIN SERIALIZATION TEST (V30.1 - INTEGRATION LEVEL)
 * CLASIFICACIÓN: TRINITY EVIDENCE (ESTRATO L2-MODELS)
 * RESPONSABILIDAD: CERTIFICACIÓN DE PARIDAD JSON DE CONTRATOS TIPADOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TAGGED UNION PARITY: Valida que los discriminadores serde de los
 *    payloads de trabajo sobrevivan el roundtrip de red bit-perfecto.
 * 2. LIFECYCLE LABELS: Certifica las etiquetas SCREAMING_SNAKE_CASE que
 *    el catálogo persiste como columnas de estado.
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use aegis_domain_models::feature::FeatureConfig;
    use aegis_domain_models::job::{JobPayload, JobKind};
    use aegis_domain_models::model::{AlgorithmKind, ImbalanceStrategy, ModelStage};
    use aegis_domain_models::retrain::MergeStrategy;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    /**
     * CERTIFICACIÓN: Roundtrip del payload de entrenamiento tipado.
     */
    #[test]
    fn certify_train_payload_tagged_roundtrip() {
        let mut hyperparameters = BTreeMap::new();
        hyperparameters.insert("max_depth".to_string(), serde_json::json!(6));
        hyperparameters.insert("learning_rate".to_string(), serde_json::json!(0.1));

        let payload_instance = JobPayload::Train {
            feature_set_id: Uuid::new_v4(),
            algorithm: AlgorithmKind::XgboostLike,
            hyperparameters,
            imbalance_strategy: ImbalanceStrategy::ClassWeight,
            decision_threshold: 0.5,
        };

        let serialized_json = serde_json::to_string_pretty(&payload_instance)
            .expect("CRITICAL_FAULT: Serialization strata collapsed.");

        // Auditoría de firma de protocolo: discriminador y etiquetas canónicas.
        assert!(serialized_json.contains("\"payload_kind\": \"Train\""));
        assert!(serialized_json.contains("\"algorithm\": \"xgboost_like\""));
        assert!(serialized_json.contains("\"imbalance_strategy\": \"class_weight\""));

        let recovered_payload: JobPayload = serde_json::from_str(&serialized_json)
            .expect("CRITICAL_FAULT: Deserialization failed. Schema drift detected.");

        assert_eq!(recovered_payload.kind(), JobKind::Training);
    }

    /**
     * CERTIFICACIÓN: Etiquetas de ciclo de vida persistidas por el catálogo.
     */
    #[test]
    fn certify_lifecycle_stage_labels() {
        assert_eq!(
            serde_json::to_string(&ModelStage::Production).expect("stage json"),
            "\"PRODUCTION\""
        );
        assert_eq!(ModelStage::Production.canonical_tag(), "PRODUCTION");
        assert_eq!(ModelStage::Archived.canonical_tag(), "ARCHIVED");
    }

    /**
     * CERTIFICACIÓN: Estrategia de fusión con parámetros discriminados.
     */
    #[test]
    fn certify_merge_strategy_parameters_roundtrip() {
        let strategy_instance = MergeStrategy::Weighted { new_weight: 2.5 };
        let serialized_json = serde_json::to_string(&strategy_instance).expect("merge json");
        assert!(serialized_json.contains("\"strategy\":\"Weighted\""));

        let recovered: MergeStrategy = serde_json::from_str(&serialized_json).expect("merge parse");
        assert_eq!(recovered, strategy_instance);
    }

    /**
     * CERTIFICACIÓN: Los defaults de configuración de features respetan
     * los umbrales nominales del pipeline de selección.
     */
    #[test]
    fn certify_feature_config_nominal_defaults() {
        let default_config = FeatureConfig::default();
        assert!((default_config.variance_threshold - 0.01).abs() < f64::EPSILON);
        assert!((default_config.correlation_threshold - 0.95).abs() < f64::EPSILON);
        assert_eq!(default_config.max_features, 30);
        assert_eq!(default_config.mutual_information_neighbors, 5);
        assert_eq!(default_config.aggregation_window_hours, vec![1, 6, 24, 168, 720]);
    }
}
