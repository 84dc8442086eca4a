// [apps/control-tower/src/surface.rs]
/*!
 * =================================================================
 * APARATO: CONTROL SURFACE FACADE (V16.0 - TRANSPORT AGNOSTIC)
 * CLASIFICACIÓN: APPLICATION BOUNDARY (ESTRATO L4)
 * RESPONSABILIDAD: OPERACIONES EXPUESTAS DEL PLANO DE CONTROL
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SKIN-AGNOSTIC: La piel HTTP/REST y la identidad viven FUERA del
 *    núcleo; esta superficie recibe un principal ya verificado y
 *    traduce hacia los repositorios y servicios.
 * 2. TEN OPERATION FAMILIES: datasets, features, training, registro,
 *    inferencia, vigilancia, alertas, trabajos, reentrenamiento y A/B.
 * =================================================================
 */

use crate::services::executors::experiment;
use crate::services::retrain_driver;
use crate::state::AppState;
use aegis_domain_models::{
    Alert, AlertSeverity, AlertStatus, AbTest, AbTestState, AlgorithmKind, Baseline, ColumnSpec,
    Dataset, DatasetStatus, FeatureConfig, FeatureSet, ImbalanceStrategy, JobPayload, JobRecord,
    JobState, MergeStrategy, ModelRecord, ModelStage, RetrainJob, RetrainReason, RetrainState,
};
use aegis_domain_serving::{load_active_model, AbBinding, PredictRequest, PredictionResponse};
use aegis_infra_artifacts::ArtifactNamespace;
use anyhow::{bail, Context};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Fachada de operaciones del plano de control.
#[derive(Clone)]
pub struct ControlSurface {
    application_state: AppState,
}

impl ControlSurface {
    /// Forja la superficie sobre el estado maestro.
    pub fn new(application_state: AppState) -> Self {
        Self { application_state }
    }

    // --- 1. CICLO DE VIDA DE DATASETS ---

    /// Registra un dataset nuevo: blob sellado + fila ACTIVE.
    #[instrument(skip(self, csv_bytes, schema))]
    pub async fn create_dataset(
        &self,
        name: &str,
        schema: &[ColumnSpec],
        csv_bytes: &[u8],
        row_count: u64,
    ) -> anyhow::Result<Dataset> {
        let blob_descriptor = self
            .application_state
            .artifact_vault
            .put(ArtifactNamespace::Dataset, csv_bytes)
            .context("dataset blob crystallization")?;

        let next_version = self
            .application_state
            .dataset_repository
            .latest_version(name)
            .await?
            .map(|version| version + 1)
            .unwrap_or(1);

        let dataset = self
            .application_state
            .dataset_repository
            .create(
                name,
                next_version,
                None,
                row_count,
                schema,
                &blob_descriptor.sha256_hexadecimal,
                &blob_descriptor.reference,
            )
            .await?;
        self.application_state.dataset_repository.activate(dataset.id).await?;
        Ok(dataset)
    }

    /// Lista datasets con filtro de estado.
    pub async fn list_datasets(
        &self,
        status_filter: Option<DatasetStatus>,
        limit: u32,
        offset: u32,
    ) -> anyhow::Result<Vec<Dataset>> {
        Ok(self.application_state.dataset_repository.list(status_filter, limit, offset).await?)
    }

    /// Recupera un dataset.
    pub async fn get_dataset(&self, dataset_id: Uuid) -> anyhow::Result<Dataset> {
        Ok(self.application_state.dataset_repository.get(dataset_id).await?)
    }

    /// Archiva un dataset ACTIVE.
    pub async fn archive_dataset(&self, dataset_id: Uuid) -> anyhow::Result<()> {
        Ok(self.application_state.dataset_repository.archive(dataset_id).await?)
    }

    // --- 2. CICLO DE VIDA DE FEATURES ---

    /// Solicita el cómputo C3: registra el FeatureSet y encola la orden.
    #[instrument(skip(self, config))]
    pub async fn compute_features(
        &self,
        dataset_id: Uuid,
        config: &FeatureConfig,
    ) -> anyhow::Result<(Uuid, Uuid)> {
        let feature_set = self
            .application_state
            .feature_set_repository
            .create_pending(dataset_id, config)
            .await?;

        let job_identifier = self
            .application_state
            .job_repository
            .enqueue(
                &JobPayload::FeatureCompute {
                    dataset_id,
                    feature_set_id: feature_set.id,
                    config: config.clone(),
                },
                Some(&format!("feature_compute:{}", feature_set.id)),
            )
            .await?;

        Ok((job_identifier, feature_set.id))
    }

    /// Recupera un FeatureSet (consulta y previsualización).
    pub async fn get_feature_set(&self, feature_set_id: Uuid) -> anyhow::Result<FeatureSet> {
        Ok(self.application_state.feature_set_repository.get(feature_set_id).await?)
    }

    // --- 3. ENTRENAMIENTO ---

    /// Somete una orden de entrenamiento C4.
    #[instrument(skip(self, hyperparameters))]
    pub async fn submit_training(
        &self,
        feature_set_id: Uuid,
        algorithm: AlgorithmKind,
        hyperparameters: std::collections::BTreeMap<String, serde_json::Value>,
        imbalance_strategy: ImbalanceStrategy,
        decision_threshold: f64,
    ) -> anyhow::Result<Uuid> {
        Ok(self
            .application_state
            .job_repository
            .enqueue(
                &JobPayload::Train {
                    feature_set_id,
                    algorithm,
                    hyperparameters,
                    imbalance_strategy,
                    decision_threshold,
                },
                None,
            )
            .await?)
    }

    /// Recupera una orden del Ledger.
    pub async fn get_job(&self, job_id: Uuid) -> anyhow::Result<JobRecord> {
        Ok(self.application_state.job_repository.get(job_id).await?)
    }

    /// Solicita la cancelación cooperativa de una orden.
    pub async fn cancel_job(&self, job_id: Uuid) -> anyhow::Result<()> {
        Ok(self.application_state.job_repository.request_cancellation(job_id).await?)
    }

    // --- 4. REGISTRO DE MODELOS Y PROMOCIÓN ---

    /// Lista modelos con filtro de etapa.
    pub async fn list_models(
        &self,
        stage_filter: Option<ModelStage>,
        limit: u32,
    ) -> anyhow::Result<Vec<ModelRecord>> {
        Ok(self.application_state.model_repository.list(stage_filter, limit, 0).await?)
    }

    /// Recupera un modelo.
    pub async fn get_model(&self, model_id: Uuid) -> anyhow::Result<ModelRecord> {
        Ok(self.application_state.model_repository.get(model_id).await?)
    }

    /// Define un baseline sobre el modelo.
    pub async fn set_baseline(&self, baseline: &Baseline) -> anyhow::Result<()> {
        Ok(self.application_state.model_repository.set_baseline(baseline).await?)
    }

    /**
     * Promoción de etapa: STAGING vía CAS; PRODUCTION vía la transacción
     * de corona con puerta de baselines.
     */
    #[instrument(skip(self))]
    pub async fn promote_model(
        &self,
        model_id: Uuid,
        target_stage: ModelStage,
    ) -> anyhow::Result<ModelRecord> {
        match target_stage {
            ModelStage::Staging => {
                self.application_state
                    .model_repository
                    .patch_stage(model_id, ModelStage::Trained, ModelStage::Staging)
                    .await?;
                Ok(self.application_state.model_repository.get(model_id).await?)
            }
            ModelStage::Production => {
                let crowned =
                    self.application_state.model_repository.promote_to_production(model_id).await?;
                let _ = self
                    .application_state
                    .system_repository
                    .append_audit_event(
                        "registry",
                        "model_promoted",
                        &model_id.to_string(),
                        None,
                    )
                    .await;
                Ok(crowned)
            }
            other => bail!("promotion target {:?} is not a legal surface operation", other),
        }
    }

    /// Retiro explícito del modelo PRODUCTION.
    pub async fn retire_model(&self, model_id: Uuid, reason: &str) -> anyhow::Result<()> {
        self.application_state.model_repository.retire_production(model_id, reason).await?;
        let _ = self
            .application_state
            .system_repository
            .append_audit_event("registry", "model_retired", &model_id.to_string(), Some(reason))
            .await;
        Ok(())
    }

    /// Comparación de dos modelos con reporte sellado en la bóveda.
    #[instrument(skip(self))]
    pub async fn compare_models(
        &self,
        left_model_id: Uuid,
        right_model_id: Uuid,
    ) -> anyhow::Result<String> {
        let left = self.application_state.model_repository.get(left_model_id).await?;
        let right = self.application_state.model_repository.get(right_model_id).await?;

        let report = json!({
            "left_model": left.id.to_string(),
            "right_model": right.id.to_string(),
            "deltas": {
                "precision": right.metrics.precision - left.metrics.precision,
                "recall": right.metrics.recall - left.metrics.recall,
                "f1_score": right.metrics.f1_score - left.metrics.f1_score,
                "auc_roc": right.metrics.auc_roc - left.metrics.auc_roc,
                "false_positive_rate":
                    right.metrics.false_positive_rate - left.metrics.false_positive_rate,
            },
            "left_metrics": left.metrics,
            "right_metrics": right.metrics,
        });

        let descriptor = self
            .application_state
            .artifact_vault
            .put(ArtifactNamespace::Report, &serde_json::to_vec_pretty(&report)?)
            .context("comparison report crystallization")?;
        Ok(descriptor.reference)
    }

    // --- 5. INFERENCIA ---

    /**
     * Predicción individual: scoring caliente + rastro durable + muestras
     * A/B del brazo asignado.
     */
    pub async fn predict(&self, request: &PredictRequest) -> anyhow::Result<PredictionResponse> {
        let outcome = self.application_state.scoring_engine.predict(request)?;

        for entry in outcome.log_entries {
            self.application_state.prediction_vault.enqueue(entry);
        }

        if let Some((ab_test_id, arm)) = outcome.assigned_arm {
            let is_challenger =
                arm == aegis_domain_serving::ab_router::ExperimentArm::Challenger;
            let _ = self
                .application_state
                .ab_test_repository
                .increment_arm_samples(ab_test_id, is_challenger)
                .await;
        }

        Ok(outcome.response)
    }

    /// Scoring por lotes compartiendo el modelo caliente.
    pub async fn batch_predict(
        &self,
        requests: &[PredictRequest],
    ) -> anyhow::Result<Vec<PredictionResponse>> {
        let mut responses = Vec::with_capacity(requests.len());
        for request in requests {
            responses.push(self.predict(request).await?);
        }
        Ok(responses)
    }

    /// Backfill del resultado real de una predicción.
    pub async fn record_outcome(
        &self,
        prediction_id: Uuid,
        actual_label: bool,
    ) -> anyhow::Result<()> {
        Ok(self
            .application_state
            .prediction_repository
            .record_outcome(prediction_id, actual_label)
            .await?)
    }

    // --- 6. VIGILANCIA ---

    /// Dispara un barrido de vigilancia bajo demanda.
    pub async fn trigger_monitoring(&self, payload: JobPayload) -> anyhow::Result<Uuid> {
        Ok(self.application_state.job_repository.enqueue(&payload, None).await?)
    }

    // --- 7. ALERTAS ---

    /// Lista alertas con filtros.
    pub async fn list_alerts(
        &self,
        status_filter: Option<AlertStatus>,
        severity_filter: Option<AlertSeverity>,
        model_filter: Option<Uuid>,
        limit: u32,
    ) -> anyhow::Result<Vec<Alert>> {
        Ok(self
            .application_state
            .alert_repository
            .list(status_filter, severity_filter, model_filter, limit)
            .await?)
    }

    /// Reconocimiento idempotente de una alerta.
    pub async fn acknowledge_alert(&self, alert_id: Uuid) -> anyhow::Result<Alert> {
        Ok(self.application_state.alert_repository.acknowledge(alert_id).await?)
    }

    /// Resolución de una alerta.
    pub async fn resolve_alert(&self, alert_id: Uuid) -> anyhow::Result<Alert> {
        Ok(self.application_state.alert_repository.resolve(alert_id).await?)
    }

    /// Descarte terminal de una alerta.
    pub async fn dismiss_alert(&self, alert_id: Uuid) -> anyhow::Result<Alert> {
        Ok(self.application_state.alert_repository.dismiss(alert_id).await?)
    }

    // --- 8. TRABAJOS ---

    /// Lista órdenes del Ledger.
    pub async fn list_jobs(
        &self,
        state_filter: Option<JobState>,
        limit: u32,
    ) -> anyhow::Result<Vec<JobRecord>> {
        Ok(self.application_state.job_repository.list(state_filter, limit).await?)
    }

    /// Dispara inmediatamente un disparador recurrente por nombre.
    pub async fn run_schedule_now(&self, schedule_name: &str) -> anyhow::Result<Uuid> {
        let schedules = self.application_state.schedule_repository.list().await?;
        let schedule = schedules
            .into_iter()
            .find(|candidate| candidate.name == schedule_name)
            .with_context(|| format!("schedule '{}' absent", schedule_name))?;
        Ok(self.application_state.job_repository.enqueue(&schedule.payload, None).await?)
    }

    /// Habilita o deshabilita un disparador recurrente.
    pub async fn set_schedule_enabled(
        &self,
        schedule_name: &str,
        enabled: bool,
    ) -> anyhow::Result<()> {
        Ok(self.application_state.schedule_repository.set_enabled(schedule_name, enabled).await?)
    }

    // --- 9. REENTRENAMIENTO ---

    /// Dispara una orden C10 manual.
    #[instrument(skip(self))]
    pub async fn trigger_retraining(
        &self,
        base_model_id: Uuid,
        reason: RetrainReason,
        merge_strategy: MergeStrategy,
        auto_promote: bool,
    ) -> anyhow::Result<RetrainJob> {
        let order = self
            .application_state
            .retrain_repository
            .create(
                base_model_id,
                reason,
                &merge_strategy,
                auto_promote && reason.allows_auto_promotion(),
                0.01,
            )
            .await?;

        self.application_state
            .job_repository
            .enqueue(
                &JobPayload::Retrain { retrain_job_id: order.id },
                Some(&format!("retrain:{}", order.id)),
            )
            .await?;
        Ok(order)
    }

    /// Lista órdenes de reentrenamiento.
    pub async fn list_retraining(&self, limit: u32) -> anyhow::Result<Vec<RetrainJob>> {
        Ok(self.application_state.retrain_repository.list(limit).await?)
    }

    /**
     * Aprobación humana: promueve el candidato de una orden anclada en
     * COMPARISON (única vía para reentrenos disparados por sesgo).
     */
    #[instrument(skip(self))]
    pub async fn approve_retraining_promotion(
        &self,
        retrain_job_id: Uuid,
    ) -> anyhow::Result<()> {
        let order = self.application_state.retrain_repository.get(retrain_job_id).await?;
        if order.state != RetrainState::Comparison {
            bail!("retrain order {} is not awaiting approval", retrain_job_id);
        }
        let candidate_model_id = order
            .candidate_model_id
            .with_context(|| format!("order {} carries no candidate", retrain_job_id))?;

        retrain_driver::complete_promotion(&self.application_state, &order, candidate_model_id)
            .await
            .map_err(|fault| anyhow::anyhow!(fault.detail))?;
        info!("🧑‍⚖️ [SURFACE]: Retrain order {} approved and promoted.", retrain_job_id);
        Ok(())
    }

    // --- 10. EXPERIMENTOS A/B ---

    /// Registra un experimento en DRAFT.
    #[allow(clippy::too_many_arguments)]
    pub async fn create_ab_test(
        &self,
        champion_model_id: Uuid,
        challenger_model_id: Uuid,
        traffic_split: f64,
        min_samples: u64,
        primary_metric: &str,
        mirror_mode: bool,
        auto_promote: bool,
    ) -> anyhow::Result<AbTest> {
        Ok(self
            .application_state
            .ab_test_repository
            .create(
                champion_model_id,
                challenger_model_id,
                traffic_split,
                min_samples,
                primary_metric,
                mirror_mode,
                auto_promote,
            )
            .await?)
    }

    /**
     * Arranca el experimento: carga verificada del retador y vínculo al
     * motor de scoring.
     */
    #[instrument(skip(self))]
    pub async fn start_ab_test(&self, ab_test_id: Uuid) -> anyhow::Result<()> {
        let experiment = self.application_state.ab_test_repository.get(ab_test_id).await?;
        let challenger = self
            .application_state
            .model_repository
            .get(experiment.challenger_model_id)
            .await?;

        let portable_bytes = self
            .application_state
            .artifact_vault
            .get(&challenger.portable_artifact_reference)
            .context("challenger artifact fetch")?;

        let challenger_active = load_active_model(
            challenger.id,
            &challenger.schema_hash,
            &challenger.feature_names,
            &portable_bytes,
            &challenger.checksum_hexadecimal,
            vec![0.0; challenger.feature_names.len()],
            challenger.metrics.decision_threshold,
        )?;

        self.application_state
            .ab_test_repository
            .cas_state(ab_test_id, AbTestState::Draft, AbTestState::Running)
            .await?;

        self.application_state.scoring_engine.attach_experiment(AbBinding {
            test_id: ab_test_id,
            traffic_split: experiment.traffic_split,
            mirror_mode: experiment.mirror_mode,
            challenger: Arc::new(challenger_active),
        });

        info!("🧪 [SURFACE]: Experiment {} now routing traffic.", ab_test_id);
        Ok(())
    }

    /// Encola la evaluación de significancia.
    pub async fn evaluate_ab_test(&self, ab_test_id: Uuid) -> anyhow::Result<Uuid> {
        Ok(self
            .application_state
            .job_repository
            .enqueue(&JobPayload::AbEvaluate { ab_test_id }, None)
            .await?)
    }

    /**
     * Conclusión confirmada por el operador; con promote_challenger la
     * corona se ejecuta atómicamente vía C5.
     */
    #[instrument(skip(self))]
    pub async fn conclude_ab_test(
        &self,
        ab_test_id: Uuid,
        promote_challenger: bool,
    ) -> anyhow::Result<()> {
        let experiment = self.application_state.ab_test_repository.get(ab_test_id).await?;

        if promote_challenger {
            experiment::conclude_with_promotion(
                &self.application_state,
                ab_test_id,
                experiment.challenger_model_id,
            )
            .await
            .map_err(|fault| anyhow::anyhow!(fault.detail))?;
        } else {
            self.application_state
                .ab_test_repository
                .cas_state(ab_test_id, AbTestState::Evaluating, AbTestState::Completed)
                .await?;
            self.application_state.scoring_engine.detach_experiment();
        }
        Ok(())
    }

    /// Aborto del experimento con desvinculación del motor.
    pub async fn abort_ab_test(&self, ab_test_id: Uuid) -> anyhow::Result<()> {
        let experiment = self.application_state.ab_test_repository.get(ab_test_id).await?;
        let abort_source = match experiment.state {
            AbTestState::Running => AbTestState::Running,
            AbTestState::Evaluating => AbTestState::Evaluating,
            AbTestState::Draft => AbTestState::Draft,
            other => bail!("experiment in {:?} cannot be aborted", other),
        };
        self.application_state
            .ab_test_repository
            .cas_state(ab_test_id, abort_source, AbTestState::Aborted)
            .await?;
        self.application_state.scoring_engine.detach_experiment();
        Ok(())
    }
}
