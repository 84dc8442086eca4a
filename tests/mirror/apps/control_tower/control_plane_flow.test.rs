// [tests/mirror/apps/control_tower/control_plane_flow.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL FLUJO EXTREMO A EXTREMO (V3.0 - GOLDEN)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L4-MIRROR
 * RESPONSABILIDAD: INGESTA -> FORJA -> ENTRENAMIENTO -> CORONA ->
 *                  SERVICIO -> VIGILANCIA SOBRE UN CATÁLOGO EN RAM
 *
 * # Mathematical Proof (Golden Path):
 * El test recorre la cadena completa de los escenarios S1-S5 sobre un
 * catálogo :memory: y una bóveda temporal, certificando los invariantes
 * observables: contrato sellado, producción única, determinismo de
 * scoring y deduplicación de la alerta de deriva.
 * =================================================================
 */

use aegis_control_tower::services::activation_listener::execute_verified_swap;
use aegis_control_tower::services::executors::execute_claimed_job;
use aegis_control_tower::state::AppState;
use aegis_control_tower::surface::ControlSurface;
use aegis_data_forge::{SynthesisProfile, TransactionSynthesizer};
use aegis_domain_features::records_to_csv;
use aegis_domain_models::{
    AlertStatus, Baseline, BaselineOperator, ColumnSpec, ColumnType, DriftMetricRecord,
    FeatureConfig, FeatureSetStatus, ImbalanceStrategy, JobKind, JobPayload, JobState,
    MetricStatus, ModelStage, MonitorKind, PredictionRecord,
};
use aegis_domain_serving::PredictRequest;
use aegis_infra_artifacts::FilesystemArtifactVault;
use aegis_infra_catalog::CatalogClient;
use chrono::{Duration, Utc};
use std::collections::{BTreeMap, HashMap};
use tempfile::TempDir;
use uuid::Uuid;

/// Forja el estado maestro completo sobre sustratos efímeros.
async fn forge_state(workspace: &TempDir) -> AppState {
    let catalog_client =
        CatalogClient::connect(":memory:", None).await.expect("catalog ignition");
    let artifact_vault =
        FilesystemArtifactVault::ignite(&workspace.path().join("vault")).expect("vault ignition");
    AppState::new(catalog_client, artifact_vault, &workspace.path().join("spill.jsonl"))
}

/// Esquema de ingesta nominal del corpus sintético.
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

/// Ejecuta en línea la siguiente orden reclamable de una clase.
async fn drive_one_job(state: &AppState, kind: JobKind) -> Uuid {
    let claimed = state
        .job_repository
        .claim_next_of_kind(kind)
        .await
        .expect("claim")
        .expect("an order must be queued");
    let job_identifier = claimed.id;
    execute_claimed_job(state, claimed).await;
    job_identifier
}

#[cfg(test)]
mod tests {
    use super::*;

    /**
     * CERTIFICACIÓN GOLDEN PATH: la cadena completa S1 -> S4.
     */
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn certify_golden_path_ingest_to_serving() {
        let workspace = TempDir::new().expect("tempdir");
        let state = forge_state(&workspace).await;
        let surface = ControlSurface::new(state.clone());

        // --- S1a: INGESTA DEL CORPUS SINTÉTICO ---
        let records = TransactionSynthesizer::synthesize(&SynthesisProfile {
            row_count: 2_000,
            fraud_rate: 0.05,
            user_count: 80,
            random_seed: 42,
            amount_shift_sigmas: 0.0,
        });
        let csv_bytes = records_to_csv(&records).expect("csv");
        let dataset = surface
            .create_dataset("transactions_lab", &forge_ingest_schema(), &csv_bytes, 2_000)
            .await
            .expect("dataset");

        // --- S1b: FORJA DE FEATURES CON DEFAULTS ---
        let (feature_job, feature_set_id) = surface
            .compute_features(dataset.id, &FeatureConfig::default())
            .await
            .expect("compute request");
        let driven = drive_one_job(&state, JobKind::Feature).await;
        assert_eq!(driven, feature_job);
        assert_eq!(
            state.job_repository.get(feature_job).await.expect("job").state,
            JobState::Completed
        );

        let sealed_contract = surface.get_feature_set(feature_set_id).await.expect("feature set");
        assert_eq!(sealed_contract.status, FeatureSetStatus::Completed);
        assert!(!sealed_contract.schema_hash.is_empty());
        assert!(!sealed_contract.selected_features.is_empty());
        assert!(sealed_contract.selected_features.len() <= 30);

        // --- S2: ENTRENAMIENTO XGBOOST-LIKE ---
        let mut hyperparameters = BTreeMap::new();
        hyperparameters.insert("max_depth".to_string(), serde_json::json!(4));
        hyperparameters.insert("learning_rate".to_string(), serde_json::json!(0.2));
        hyperparameters.insert("n_estimators".to_string(), serde_json::json!(30));
        hyperparameters.insert("scale_pos_weight".to_string(), serde_json::json!(5.0));

        let _training_job = surface
            .submit_training(
                feature_set_id,
                aegis_domain_models::AlgorithmKind::XgboostLike,
                hyperparameters,
                ImbalanceStrategy::ClassWeight,
                0.5,
            )
            .await
            .expect("submit training");
        drive_one_job(&state, JobKind::Training).await;

        let trained_models = surface
            .list_models(Some(ModelStage::Trained), 8)
            .await
            .expect("list trained");
        assert_eq!(trained_models.len(), 1);
        let model = trained_models.into_iter().next().expect("model");

        // Invariante 3: el orden de features del modelo ES el del contrato.
        assert_eq!(model.feature_names, sealed_contract.selected_feature_names());
        assert_eq!(model.schema_hash, sealed_contract.schema_hash);
        assert_eq!(model.checksum_hexadecimal.len(), 64);

        // --- S3: BASELINES Y CORONA ---
        surface
            .set_baseline(&Baseline {
                model_id: model.id,
                metric_name: "auc_roc".into(),
                threshold: 0.60,
                operator: BaselineOperator::GreaterOrEqual,
            })
            .await
            .expect("baseline");

        surface.promote_model(model.id, ModelStage::Staging).await.expect("stage");
        surface.promote_model(model.id, ModelStage::Production).await.expect("crown");

        let production = surface
            .list_models(Some(ModelStage::Production), 8)
            .await
            .expect("list production");
        assert_eq!(production.len(), 1, "at-most-one-production invariant");

        // Hidratación del plano de servicio (swap verificado).
        execute_verified_swap(&state, model.id).await.expect("hot swap");
        assert_eq!(state.scoring_engine.current_model_id(), Some(model.id));

        // --- S4: RÁFAGA DE PREDICCIONES IDÉNTICAS ---
        let mut feature_values = HashMap::new();
        for feature_name in &model.feature_names {
            feature_values.insert(feature_name.clone(), 1.0);
        }
        let request = PredictRequest {
            transaction_id: Some("txn-golden".into()),
            user_id: Some("user-00001".into()),
            feature_values,
            explain: false,
        };

        let mut observed_scores = Vec::new();
        for _ in 0..50 {
            let response = surface.predict(&request).await.expect("predict");
            assert_eq!(response.model_id, model.id);
            observed_scores.push(response.score);
        }
        assert!(observed_scores.windows(2).all(|pair| pair[0] == pair[1]));

        // El Flusher drena la bóveda hacia el log durable.
        let drained = state.prediction_vault.drain_for_flush();
        assert_eq!(drained.len(), 50);
        state.prediction_repository.persist_batch(&drained).await.expect("flush");

        let logged = state
            .prediction_repository
            .window_of_model(model.id, Utc::now() - Duration::hours(1), Utc::now(), 100)
            .await
            .expect("window");
        assert_eq!(logged.len(), 50);
        assert!(logged.iter().all(|prediction| prediction.model_id == model.id));
    }

    /**
     * CERTIFICACIÓN (ESCENARIO S5): el desplazamiento de +3σ en la
     * ventana de servicio produce la alerta CRITICAL deduplicada y la
     * orden de reentrenamiento en PENDING.
     */
    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn certify_drift_sweep_raises_single_alert() {
        let workspace = TempDir::new().expect("tempdir");
        let state = forge_state(&workspace).await;
        let surface = ControlSurface::new(state.clone());

        // Corpus, contrato y modelo coronado (camino abreviado).
        let records = TransactionSynthesizer::synthesize(&SynthesisProfile {
            row_count: 1_500,
            fraud_rate: 0.05,
            user_count: 60,
            random_seed: 7,
            amount_shift_sigmas: 0.0,
        });
        let csv_bytes = records_to_csv(&records).expect("csv");
        let dataset = surface
            .create_dataset("transactions_drift", &forge_ingest_schema(), &csv_bytes, 1_500)
            .await
            .expect("dataset");
        let (_, feature_set_id) = surface
            .compute_features(dataset.id, &FeatureConfig::default())
            .await
            .expect("compute");
        drive_one_job(&state, JobKind::Feature).await;

        let mut hyperparameters = BTreeMap::new();
        hyperparameters.insert("n_estimators".to_string(), serde_json::json!(15));
        surface
            .submit_training(
                feature_set_id,
                aegis_domain_models::AlgorithmKind::LightgbmLike,
                hyperparameters,
                ImbalanceStrategy::ClassWeight,
                0.5,
            )
            .await
            .expect("submit");
        drive_one_job(&state, JobKind::Training).await;

        let model = surface
            .list_models(Some(ModelStage::Trained), 4)
            .await
            .expect("list")
            .into_iter()
            .next()
            .expect("model");
        surface.promote_model(model.id, ModelStage::Staging).await.expect("stage");
        surface.promote_model(model.id, ModelStage::Production).await.expect("crown");

        // Ventana de servicio desplazada: vectores de entrada con la
        // señal corrida +3σ sobre TODAS las features del contrato.
        let contract = surface.get_feature_set(feature_set_id).await.expect("contract");
        let feature_count = contract.selected_features.len();
        let shifted_batch: Vec<(PredictionRecord, Option<(Uuid, String)>)> = (0..200)
            .map(|index| {
                (
                    PredictionRecord {
                        id: Uuid::new_v4(),
                        model_id: model.id,
                        transaction_id: Some(format!("txn-shift-{}", index)),
                        input_vector: vec![1_000_000.0; feature_count],
                        score: 0.5,
                        label_flag: false,
                        confidence: 0.1,
                        explanation: None,
                        latency_milliseconds: 3.0,
                        degraded: false,
                        actual_label: None,
                        created_at: Utc::now(),
                    },
                    None,
                )
            })
            .collect();
        state.prediction_repository.persist_batch(&shifted_batch).await.expect("inject");

        // Dos barridos: la segunda emisión se fusiona, jamás duplica.
        for _ in 0..2 {
            surface
                .trigger_monitoring(JobPayload::DriftScan { model_id: model.id })
                .await
                .expect("trigger");
            drive_one_job(&state, JobKind::Monitoring).await;
        }

        // Métricas CRITICAL registradas para la familia data_drift.
        let drift_rows: Vec<DriftMetricRecord> = state
            .metric_repository
            .drift_metrics_of_model(model.id, Utc::now() - Duration::hours(1), 500)
            .await
            .expect("metrics");
        assert!(drift_rows
            .iter()
            .any(|row| row.kind == MonitorKind::DataDrift
                && row.metric_name == "psi"
                && row.status == MetricStatus::Critical));

        // Invariante 5: a lo sumo UNA alerta ACTIVE por clave de clase.
        let active_alerts = surface
            .list_alerts(Some(AlertStatus::Active), None, Some(model.id), 64)
            .await
            .expect("alerts");
        assert!(!active_alerts.is_empty());
        let mut observed_keys: Vec<&String> =
            active_alerts.iter().map(|alert| &alert.dedup_key).collect();
        observed_keys.sort();
        observed_keys.dedup();
        assert_eq!(observed_keys.len(), active_alerts.len(), "dedup keys must be unique");

        // La histéresis silencia la re-emisión sobre un CRITICAL sostenido:
        // el segundo barrido no duplica ni fusiona nada nuevo.
        assert!(active_alerts.iter().all(|alert| alert.occurrence_count == 1));

        // Auto-retrain habilitado: la orden C10 nace en PENDING.
        let retrain_orders = surface.list_retraining(8).await.expect("retrain list");
        assert_eq!(retrain_orders.len(), 1);
        assert_eq!(retrain_orders[0].base_model_id, model.id);
    }
}
