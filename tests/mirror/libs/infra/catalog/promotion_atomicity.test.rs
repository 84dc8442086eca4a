// [tests/mirror/libs/infra/catalog/promotion_atomicity.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE LA TRANSACCIÓN DE PROMOCIÓN (V2.3 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: INVARIANTE DE PRODUCCIÓN ÚNICA Y CORONA ATÓMICA
 *
 * # Mathematical Proof (Single Crown):
 * El test certifica que sobre cualquier historia serial de promociones
 * el conteo de filas PRODUCTION es <= 1, que la degradación del campeón
 * y la coronación del retador son observables como un solo paso, y que
 * la puerta de baselines rechaza candidatos deficientes listando las
 * métricas infractoras.
 * =================================================================
 */

use aegis_domain_models::{
    Baseline, BaselineOperator, ControlPlaneEvent, ModelMetrics, ModelRecord, ModelStage,
};
use aegis_infra_catalog::{CatalogClient, CatalogError, CatalogFeed, ModelRepository};
use chrono::Utc;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Forja un registro de modelo TRAINED con métricas configurables.
fn forge_model_record(f1_score: f64) -> ModelRecord {
    ModelRecord {
        id: Uuid::new_v4(),
        algorithm: aegis_domain_models::AlgorithmKind::XgboostLike,
        hyperparameters: BTreeMap::new(),
        feature_set_id: Uuid::new_v4(),
        schema_hash: "feedface".repeat(8),
        metrics: ModelMetrics {
            precision: 0.91,
            recall: 0.87,
            f1_score,
            auc_roc: 0.95,
            false_positive_rate: 0.02,
            decision_threshold: 0.5,
        },
        feature_importance: Vec::new(),
        feature_names: vec!["amount".into(), "velocity".into()],
        native_artifact_reference: format!("model_native/{}", Uuid::new_v4()),
        portable_artifact_reference: format!("model_portable/{}", Uuid::new_v4()),
        checksum_hexadecimal: "ab".repeat(32),
        stage: ModelStage::Trained,
        archived_reason: None,
        promoted_at: None,
        trained_at: Utc::now(),
        created_at: Utc::now(),
    }
}

async fn forge_repository() -> (ModelRepository, CatalogFeed) {
    let client = CatalogClient::connect(":memory:", None).await.expect("catalog ignition");
    let feed = CatalogFeed::new();
    (ModelRepository::new(client, feed.clone()), feed)
}

#[cfg(test)]
mod tests {
    use super::*;

    /**
     * CERTIFICACIÓN: Corona atómica con degradación 'superseded' y
     * producción única sobre una cadena de promociones.
     */
    #[tokio::test]
    async fn certify_atomic_crown_swap_chain() {
        let (repository, feed) = forge_repository().await;
        let mut activation_receiver = feed.subscribe();

        let first_model = forge_model_record(0.85);
        let second_model = forge_model_record(0.88);
        repository.register_trained(&first_model).await.expect("register first");
        repository.register_trained(&second_model).await.expect("register second");

        // Cadena: TRAINED -> STAGING -> PRODUCTION para el primero.
        repository
            .patch_stage(first_model.id, ModelStage::Trained, ModelStage::Staging)
            .await
            .expect("stage first");
        let crowned_first =
            repository.promote_to_production(first_model.id).await.expect("crown first");
        assert_eq!(crowned_first.stage, ModelStage::Production);
        assert!(crowned_first.promoted_at.is_some());

        // El evento de activación transporta el contrato completo.
        match activation_receiver.recv().await.expect("activation event") {
            ControlPlaneEvent::ModelActivated { model_id, schema_hash, .. } => {
                assert_eq!(model_id, first_model.id);
                assert_eq!(schema_hash, first_model.schema_hash);
            }
            other => panic!("unexpected event {:?}", other),
        }

        // Segunda corona: el primero degrada a ARCHIVED 'superseded'.
        repository
            .patch_stage(second_model.id, ModelStage::Trained, ModelStage::Staging)
            .await
            .expect("stage second");
        repository.promote_to_production(second_model.id).await.expect("crown second");

        let archived_first = repository.get(first_model.id).await.expect("fetch first");
        assert_eq!(archived_first.stage, ModelStage::Archived);
        assert_eq!(archived_first.archived_reason.as_deref(), Some("superseded"));

        // Invariante supremo: a lo sumo UNA fila PRODUCTION.
        let production_rows =
            repository.list(Some(ModelStage::Production), 16, 0).await.expect("list");
        assert_eq!(production_rows.len(), 1);
        assert_eq!(production_rows[0].id, second_model.id);

        // Reversibilidad explícita: el archivado re-promovido recupera la corona.
        repository.promote_to_production(first_model.id).await.expect("re-crown archived");
        let production_rows =
            repository.list(Some(ModelStage::Production), 16, 0).await.expect("list");
        assert_eq!(production_rows.len(), 1);
        assert_eq!(production_rows[0].id, first_model.id);
    }

    /**
     * CERTIFICACIÓN: La promoción directa desde TRAINED es un conflicto.
     */
    #[tokio::test]
    async fn certify_trained_cannot_skip_staging() {
        let (repository, _feed) = forge_repository().await;
        let model = forge_model_record(0.9);
        repository.register_trained(&model).await.expect("register");

        let direct_crown = repository.promote_to_production(model.id).await;
        assert!(matches!(direct_crown, Err(CatalogError::ConflictingState { .. })));

        // patch_stage tampoco permite fabricar PRODUCTION por fuera.
        let illegal_patch =
            repository.patch_stage(model.id, ModelStage::Trained, ModelStage::Production).await;
        assert!(illegal_patch.is_err());
    }

    /**
     * CERTIFICACIÓN: La puerta de baselines lista las métricas infractoras.
     */
    #[tokio::test]
    async fn certify_baseline_gate_lists_offenders() {
        let (repository, _feed) = forge_repository().await;
        let model = forge_model_record(0.80);
        repository.register_trained(&model).await.expect("register");
        repository
            .patch_stage(model.id, ModelStage::Trained, ModelStage::Staging)
            .await
            .expect("stage");

        for (metric_name, threshold) in
            [("precision", 0.90), ("recall", 0.95), ("auc_roc", 0.99)]
        {
            repository
                .set_baseline(&Baseline {
                    model_id: model.id,
                    metric_name: metric_name.into(),
                    threshold,
                    operator: BaselineOperator::GreaterOrEqual,
                })
                .await
                .expect("baseline");
        }

        match repository.promote_to_production(model.id).await {
            Err(CatalogError::BaselinesNotMet(offenders)) => {
                // precision 0.91 satisface; recall 0.87 y auc 0.95 no.
                assert_eq!(offenders.len(), 2);
                assert!(offenders.iter().any(|entry| entry.contains("recall")));
                assert!(offenders.iter().any(|entry| entry.contains("auc_roc")));
            }
            other => panic!("expected BaselinesNotMet, observed {:?}", other.map(|m| m.stage)),
        }

        // El candidato permanece en STAGING: nada se movió.
        let untouched = repository.get(model.id).await.expect("fetch");
        assert_eq!(untouched.stage, ModelStage::Staging);
    }

    /**
     * CERTIFICACIÓN: El CAS perdido reporta el estado observado.
     */
    #[tokio::test]
    async fn certify_cas_conflict_reports_observed_state() {
        let (repository, _feed) = forge_repository().await;
        let model = forge_model_record(0.9);
        repository.register_trained(&model).await.expect("register");

        let stale_transition =
            repository.patch_stage(model.id, ModelStage::Staging, ModelStage::Trained).await;
        match stale_transition {
            Err(CatalogError::ConflictingState { observed, .. }) => {
                assert_eq!(observed, "TRAINED");
            }
            other => panic!("expected conflict, observed {:?}", other.is_ok()),
        }
    }
}
