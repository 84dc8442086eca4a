// [tests/mirror/apps/control_tower/retrain_machine.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE LA MÁQUINA DE REENTRENAMIENTO (V3.0 - C10)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * RESPONSABILIDAD: TRANSICIONES CUSTODIADAS, RECHAZOS Y PUERTA HUMANA
 * =================================================================
 */

use aegis_control_tower::services::executors::execute_claimed_job;
use aegis_control_tower::state::AppState;
use aegis_control_tower::surface::ControlSurface;
use aegis_data_forge::{SynthesisProfile, TransactionSynthesizer};
use aegis_domain_features::records_to_csv;
use aegis_domain_models::{
    Baseline, BaselineOperator, ColumnSpec, ColumnType, FeatureConfig, ImbalanceStrategy,
    JobKind, JobPayload, MergeStrategy, ModelStage, RetrainReason, RetrainState,
};
use aegis_infra_artifacts::FilesystemArtifactVault;
use aegis_infra_catalog::CatalogClient;
use std::collections::BTreeMap;
use tempfile::TempDir;
use uuid::Uuid;

async fn forge_state(workspace: &TempDir) -> AppState {
    let catalog_client =
        CatalogClient::connect(":memory:", None).await.expect("catalog ignition");
    let artifact_vault =
        FilesystemArtifactVault::ignite(&workspace.path().join("vault")).expect("vault ignition");
    AppState::new(catalog_client, artifact_vault, &workspace.path().join("spill.jsonl"))
}

fn forge_ingest_schema() -> Vec<ColumnSpec> {
    [
        ("transaction_id", ColumnType::Text),
        ("user_id", ColumnType::Text),
        ("amount", ColumnType::Float),
        ("timestamp", ColumnType::Timestamp),
        ("is_fraud", ColumnType::Boolean),
    ]
    .into_iter()
    .map(|(name, dtype)| ColumnSpec { name: name.into(), dtype, nullable: false })
    .collect()
}

/// Prepara un modelo base TRAINED sobre un corpus sintético.
async fn forge_base_model(state: &AppState, surface: &ControlSurface) -> Uuid {
    let records = TransactionSynthesizer::synthesize(&SynthesisProfile {
        row_count: 1_200,
        fraud_rate: 0.06,
        user_count: 50,
        random_seed: 21,
        amount_shift_sigmas: 0.0,
    });
    let csv_bytes = records_to_csv(&records).expect("csv");
    let dataset = surface
        .create_dataset("transactions_retrain", &forge_ingest_schema(), &csv_bytes, 1_200)
        .await
        .expect("dataset");

    let (_, feature_set_id) = surface
        .compute_features(dataset.id, &FeatureConfig::default())
        .await
        .expect("compute");
    let feature_claim = state
        .job_repository
        .claim_next_of_kind(JobKind::Feature)
        .await
        .expect("claim")
        .expect("order");
    execute_claimed_job(state, feature_claim).await;

    let mut hyperparameters = BTreeMap::new();
    hyperparameters.insert("n_estimators".to_string(), serde_json::json!(12));
    surface
        .submit_training(
            feature_set_id,
            aegis_domain_models::AlgorithmKind::XgboostLike,
            hyperparameters,
            ImbalanceStrategy::ClassWeight,
            0.5,
        )
        .await
        .expect("submit");
    let training_claim = state
        .job_repository
        .claim_next_of_kind(JobKind::Training)
        .await
        .expect("claim")
        .expect("order");
    execute_claimed_job(state, training_claim).await;

    surface
        .list_models(Some(ModelStage::Trained), 4)
        .await
        .expect("list")
        .into_iter()
        .next()
        .expect("base model")
        .id
}

/// Avanza la orden C10 encolada hasta su ancla.
async fn drive_retrain(state: &AppState) {
    let claimed = state
        .job_repository
        .claim_next_of_kind(JobKind::Retraining)
        .await
        .expect("claim")
        .expect("retrain order queued");
    execute_claimed_job(state, claimed).await;
}

#[cfg(test)]
mod tests {
    use super::*;

    /**
     * CERTIFICACIÓN: Mejora mínima imposible -> REJECTED con la causa
     * canónica "no_significant_improvement".
     */
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn certify_rejection_on_insufficient_improvement() {
        let workspace = TempDir::new().expect("tempdir");
        let state = forge_state(&workspace).await;
        let surface = ControlSurface::new(state.clone());
        let base_model_id = forge_base_model(&state, &surface).await;

        // min_improvement imposible (1.0 absoluto en F1).
        let order = state
            .retrain_repository
            .create(base_model_id, RetrainReason::ConceptDrift, &MergeStrategy::Append, true, 1.0)
            .await
            .expect("create order");
        state
            .job_repository
            .enqueue(
                &JobPayload::Retrain { retrain_job_id: order.id },
                Some(&format!("retrain:{}", order.id)),
            )
            .await
            .expect("enqueue");

        drive_retrain(&state).await;

        let terminal = state.retrain_repository.get(order.id).await.expect("fetch");
        assert_eq!(terminal.state, RetrainState::Rejected);
        assert_eq!(terminal.rejection_reason.as_deref(), Some("no_significant_improvement"));
        assert!(terminal.candidate_model_id.is_some(), "candidate must exist before comparison");
        assert!(terminal.candidate_feature_set_id.is_some());
    }

    /**
     * CERTIFICACIÓN: Baselines inalcanzables del modelo base -> REJECTED
     * en VALIDATION con los infractores listados.
     */
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn certify_rejection_on_baseline_validation() {
        let workspace = TempDir::new().expect("tempdir");
        let state = forge_state(&workspace).await;
        let surface = ControlSurface::new(state.clone());
        let base_model_id = forge_base_model(&state, &surface).await;

        // Baseline imposible sobre el linaje del modelo base.
        surface
            .set_baseline(&Baseline {
                model_id: base_model_id,
                metric_name: "precision".into(),
                threshold: 1.01,
                operator: BaselineOperator::GreaterOrEqual,
            })
            .await
            .expect("baseline");

        let order = state
            .retrain_repository
            .create(base_model_id, RetrainReason::DataDrift, &MergeStrategy::Append, true, -10.0)
            .await
            .expect("create order");
        state
            .job_repository
            .enqueue(&JobPayload::Retrain { retrain_job_id: order.id }, None)
            .await
            .expect("enqueue");

        drive_retrain(&state).await;

        let terminal = state.retrain_repository.get(order.id).await.expect("fetch");
        assert_eq!(terminal.state, RetrainState::Rejected);
        assert!(terminal
            .rejection_reason
            .as_deref()
            .expect("reason")
            .starts_with("baselines_not_met"));
    }

    /**
     * CERTIFICACIÓN: El disparo por sesgo JAMÁS auto-promueve; la orden
     * queda anclada en COMPARISON y la aprobación humana corona.
     */
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn certify_bias_human_gate_then_approval() {
        let workspace = TempDir::new().expect("tempdir");
        let state = forge_state(&workspace).await;
        let surface = ControlSurface::new(state.clone());
        let base_model_id = forge_base_model(&state, &surface).await;

        // min_improvement negativo: la comparación siempre pasa; el veto
        // por sesgo es lo ÚNICO que retiene la corona.
        let order = state
            .retrain_repository
            .create(
                base_model_id,
                RetrainReason::BiasDetected,
                &MergeStrategy::Append,
                true,
                -10.0,
            )
            .await
            .expect("create order");
        state
            .job_repository
            .enqueue(&JobPayload::Retrain { retrain_job_id: order.id }, None)
            .await
            .expect("enqueue");

        drive_retrain(&state).await;

        // Ancla en la puerta humana.
        let anchored = state.retrain_repository.get(order.id).await.expect("fetch");
        assert_eq!(anchored.state, RetrainState::Comparison);
        let candidate_id = anchored.candidate_model_id.expect("candidate");

        // Aprobación explícita del operador: corona atómica vía C5.
        surface.approve_retraining_promotion(order.id).await.expect("approve");

        let promoted = state.retrain_repository.get(order.id).await.expect("fetch");
        assert_eq!(promoted.state, RetrainState::Promoted);

        let production = surface
            .list_models(Some(ModelStage::Production), 8)
            .await
            .expect("list production");
        assert_eq!(production.len(), 1);
        assert_eq!(production[0].id, candidate_id);
    }
}
