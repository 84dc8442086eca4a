// [tests/mirror/libs/infra/catalog/lineage_integrity.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE LINAJE DE DATOS (V2.1 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: INMUTABILIDAD DE DATASETS Y GUARDIA DE REFERENCIAS
 * =================================================================
 */

use aegis_domain_models::{
    ColumnSpec, ColumnType, DatasetStatus, FeatureConfig, FeatureSetStatus, ModelMetrics,
    ModelRecord, ModelStage, SelectedFeature,
};
use aegis_infra_catalog::{
    CatalogClient, CatalogError, CatalogFeed, DatasetRepository, FeatureSetRepository,
    ModelRepository,
};
use chrono::Utc;
use std::collections::BTreeMap;
use uuid::Uuid;

fn forge_schema() -> Vec<ColumnSpec> {
    vec![
        ColumnSpec { name: "transaction_id".into(), dtype: ColumnType::Text, nullable: false },
        ColumnSpec { name: "amount".into(), dtype: ColumnType::Float, nullable: false },
        ColumnSpec { name: "is_fraud".into(), dtype: ColumnType::Boolean, nullable: false },
    ]
}

async fn forge_client() -> CatalogClient {
    CatalogClient::connect(":memory:", None).await.expect("catalog ignition")
}

#[cfg(test)]
mod tests {
    use super::*;

    /**
     * CERTIFICACIÓN: Ciclo PROCESSING -> ACTIVE -> ARCHIVED con CAS y
     * unicidad de (name, version) en el linaje.
     */
    #[tokio::test]
    async fn certify_dataset_lifecycle_and_versioning() {
        let client = forge_client().await;
        let repository = DatasetRepository::new(client);

        let dataset = repository
            .create("transactions_q1", 1, None, 1000, &forge_schema(), "cafe".repeat(16).as_str(), "dataset/00000000-0000-0000-0000-000000000001")
            .await
            .expect("create");
        assert_eq!(dataset.status, DatasetStatus::Processing);

        repository.activate(dataset.id).await.expect("activate");
        // Doble activación: CAS perdido.
        assert!(matches!(
            repository.activate(dataset.id).await,
            Err(CatalogError::ConflictingState { .. })
        ));

        // La colisión de (name, version) es rechazada por el índice único.
        let duplicate = repository
            .create("transactions_q1", 1, None, 5, &forge_schema(), "beef".repeat(16).as_str(), "dataset/00000000-0000-0000-0000-000000000002")
            .await;
        assert!(duplicate.is_err());

        // Versión nueva con linaje al padre.
        let successor = repository
            .create(
                "transactions_q1",
                2,
                Some(dataset.id),
                2000,
                &forge_schema(),
                "dead".repeat(16).as_str(),
                "dataset/00000000-0000-0000-0000-000000000003",
            )
            .await
            .expect("create v2");
        assert_eq!(successor.parent_dataset_id, Some(dataset.id));
        assert_eq!(repository.latest_version("transactions_q1").await.expect("latest"), Some(2));

        repository.archive(dataset.id).await.expect("archive");
        assert_eq!(
            repository.get(dataset.id).await.expect("fetch").status,
            DatasetStatus::Archived
        );
    }

    /**
     * CERTIFICACIÓN: El FeatureSet sella su contrato al completar y el
     * borrado queda vetado mientras un modelo lo referencie.
     */
    #[tokio::test]
    async fn certify_feature_set_contract_and_reference_guard() {
        let client = forge_client().await;
        let dataset_repository = DatasetRepository::new(client.clone());
        let feature_set_repository = FeatureSetRepository::new(client.clone());
        let model_repository = ModelRepository::new(client, CatalogFeed::new());

        let dataset = dataset_repository
            .create("transactions_lab", 1, None, 500, &forge_schema(), "feed".repeat(16).as_str(), "dataset/00000000-0000-0000-0000-000000000009")
            .await
            .expect("create dataset");
        dataset_repository.activate(dataset.id).await.expect("activate");

        let feature_set = feature_set_repository
            .create_pending(dataset.id, &FeatureConfig::default())
            .await
            .expect("create pending");
        assert_eq!(feature_set.status, FeatureSetStatus::Pending);

        feature_set_repository.mark_running(feature_set.id).await.expect("running");
        feature_set_repository
            .complete(
                feature_set.id,
                &["amount".into(), "amount_zscore".into()],
                &[SelectedFeature {
                    name: "amount_zscore".into(),
                    dtype: aegis_domain_models::FeatureDtype::Continuous,
                    variance_score: 1.2,
                    mutual_information_score: 0.4,
                    model_importance_score: 0.6,
                    combined_rank_score: 1.0,
                }],
                "c0ffee00".repeat(8).as_str(),
                "features/00000000-0000-0000-0000-000000000042",
            )
            .await
            .expect("complete");

        let sealed = feature_set_repository.get(feature_set.id).await.expect("fetch");
        assert_eq!(sealed.status, FeatureSetStatus::Completed);
        assert_eq!(sealed.selected_feature_names(), vec!["amount_zscore".to_string()]);
        assert!(!sealed.schema_hash.is_empty());

        // Modelo referenciando el contrato: el borrado queda vetado.
        let model = ModelRecord {
            id: Uuid::new_v4(),
            algorithm: aegis_domain_models::AlgorithmKind::RandomForest,
            hyperparameters: BTreeMap::new(),
            feature_set_id: feature_set.id,
            schema_hash: sealed.schema_hash.clone(),
            metrics: ModelMetrics {
                precision: 0.9,
                recall: 0.85,
                f1_score: 0.87,
                auc_roc: 0.94,
                false_positive_rate: 0.02,
                decision_threshold: 0.5,
            },
            feature_importance: Vec::new(),
            feature_names: sealed.selected_feature_names(),
            native_artifact_reference: format!("model_native/{}", Uuid::new_v4()),
            portable_artifact_reference: format!("model_portable/{}", Uuid::new_v4()),
            checksum_hexadecimal: "12".repeat(32),
            stage: ModelStage::Trained,
            archived_reason: None,
            promoted_at: None,
            trained_at: Utc::now(),
            created_at: Utc::now(),
        };
        model_repository.register_trained(&model).await.expect("register");

        assert!(matches!(
            feature_set_repository.delete_guarded(feature_set.id).await,
            Err(CatalogError::ConflictingState { .. })
        ));
    }

    /**
     * CERTIFICACIÓN: La falla de la forja registra el error sin publicar
     * salida parcial y los estados terminales rechazan re-sellado.
     */
    #[tokio::test]
    async fn certify_failure_without_partial_output() {
        let client = forge_client().await;
        let dataset_repository = DatasetRepository::new(client.clone());
        let feature_set_repository = FeatureSetRepository::new(client);

        let dataset = dataset_repository
            .create("transactions_broken", 1, None, 0, &forge_schema(), "0000".repeat(16).as_str(), "dataset/00000000-0000-0000-0000-000000000007")
            .await
            .expect("create dataset");

        let feature_set = feature_set_repository
            .create_pending(dataset.id, &FeatureConfig::default())
            .await
            .expect("create pending");
        feature_set_repository.mark_running(feature_set.id).await.expect("running");
        feature_set_repository
            .fail(feature_set.id, "dataset contains zero rows")
            .await
            .expect("fail");

        let failed = feature_set_repository.get(feature_set.id).await.expect("fetch");
        assert_eq!(failed.status, FeatureSetStatus::Failed);
        assert!(failed.matrix_artifact_reference.is_none());
        assert!(failed.schema_hash.is_empty());
        assert_eq!(failed.error_message.as_deref(), Some("dataset contains zero rows"));

        // Completar un FAILED es un conflicto CAS.
        assert!(feature_set_repository
            .complete(feature_set.id, &[], &[], "hash", "features/00000000-0000-0000-0000-000000000001")
            .await
            .is_err());
    }
}
