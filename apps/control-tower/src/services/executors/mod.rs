// [apps/control-tower/src/services/executors/mod.rs]
/*!
 * =================================================================
 * APARATO: JOB EXECUTOR MATRIX (V15.0 - TYPED DISPATCH)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: DESPACHO TIPADO Y SELLADO TERMINAL DE ÓRDENES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TAGGED DISPATCH: El discriminador del payload decide el ejecutor;
 *    cero mapas débilmente tipados en el plano de trabajo.
 * 2. COOPERATIVE CANCELLATION: Una sonda asíncrona espeja la bandera
 *    del Ledger hacia un AtomicBool consumido por el cómputo bloqueante
 *    en cada frontera de etapa.
 * 3. ALERT ON FAULT: Las clases {ArtifactCorrupted, Internal,
 *    UpstreamUnavailable} emiten alerta operativa al sellar FAILED.
 * =================================================================
 */

pub mod feature;
pub mod training;
pub mod monitoring;
pub mod experiment;

use crate::services::retrain_driver;
use crate::state::AppState;
use aegis_domain_models::{
    build_alert_dedup_key, AlertSeverity, AlertSourceKind, FaultClass, JobPayload, JobRecord,
};
use chrono::Utc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument};
use uuid::Uuid;

/// Veredicto de una ejecución no fallida.
pub enum ExecutionVerdict {
    /// Secuencia completa sellada.
    Completed,
    /// Cancelación cooperativa observada en frontera de etapa.
    Cancelled,
}

/// Fallo tipado de un ejecutor con su clase de taxonomía.
pub struct ExecutionFault {
    /// Clase transport-agnóstica del fallo.
    pub fault_class: FaultClass,
    /// Detalle técnico registrado en la orden.
    pub detail: String,
}

impl ExecutionFault {
    /// Forja un fallo tipado.
    pub fn new(fault_class: FaultClass, detail: impl Into<String>) -> Self {
        Self { fault_class, detail: detail.into() }
    }
}

/**
 * Ejecuta una orden reclamada y sella su estado terminal en el Ledger.
 */
#[instrument(skip(application_state, claimed_job), fields(job_id = %claimed_job.id))]
pub async fn execute_claimed_job(application_state: &AppState, claimed_job: JobRecord) {
    let job_identifier = claimed_job.id;

    let execution_outcome: Result<ExecutionVerdict, ExecutionFault> =
        match claimed_job.payload.clone() {
            JobPayload::FeatureCompute { dataset_id, feature_set_id, config } => {
                feature::execute_feature_compute(
                    application_state,
                    job_identifier,
                    dataset_id,
                    feature_set_id,
                    config,
                )
                .await
            }
            JobPayload::Train {
                feature_set_id,
                algorithm,
                hyperparameters,
                imbalance_strategy,
                decision_threshold,
            } => {
                training::execute_training(
                    application_state,
                    job_identifier,
                    feature_set_id,
                    algorithm,
                    hyperparameters,
                    imbalance_strategy,
                    decision_threshold,
                )
                .await
            }
            JobPayload::DriftScan { model_id } => {
                monitoring::execute_drift_scan(application_state, job_identifier, model_id).await
            }
            JobPayload::ConceptScan { model_id } => {
                monitoring::execute_concept_scan(application_state, job_identifier, model_id).await
            }
            JobPayload::BiasScan { model_id, protected_attributes } => {
                monitoring::execute_bias_scan(
                    application_state,
                    job_identifier,
                    model_id,
                    protected_attributes,
                )
                .await
            }
            JobPayload::Retrain { retrain_job_id } => {
                retrain_driver::execute_retrain_order(
                    application_state,
                    job_identifier,
                    retrain_job_id,
                )
                .await
            }
            JobPayload::AbEvaluate { ab_test_id } => {
                experiment::execute_ab_evaluation(application_state, job_identifier, ab_test_id)
                    .await
            }
        };

    // --- SELLADO TERMINAL EN EL LEDGER ---
    match execution_outcome {
        Ok(ExecutionVerdict::Completed) => {
            if let Err(seal_fault) =
                application_state.job_repository.mark_completed(job_identifier).await
            {
                error!("❌ [EXECUTOR]: Completion seal rejected: {}", seal_fault);
            }
        }
        Ok(ExecutionVerdict::Cancelled) => {
            info!("🛑 [EXECUTOR]: Order {} cancelled cooperatively.", job_identifier);
            if let Err(seal_fault) =
                application_state.job_repository.mark_cancelled(job_identifier).await
            {
                error!("❌ [EXECUTOR]: Cancellation seal rejected: {}", seal_fault);
            }
        }
        Err(execution_fault) => {
            error!(
                "❌ [EXECUTOR]: Order {} failed [{}]: {}",
                job_identifier, execution_fault.fault_class, execution_fault.detail
            );
            if let Err(seal_fault) = application_state
                .job_repository
                .mark_failed(job_identifier, &execution_fault.detail)
                .await
            {
                error!("❌ [EXECUTOR]: Failure seal rejected: {}", seal_fault);
            }

            // Alertas únicamente para las clases que lo ameritan.
            if execution_fault.fault_class.warrants_alert() {
                let alert_type = format!("job_failed:{}", execution_fault.fault_class);
                let dedup_key = build_alert_dedup_key(None, &alert_type, Utc::now());
                let _ = application_state
                    .alert_repository
                    .submit_with_dedup(
                        AlertSourceKind::Jobs,
                        Some(job_identifier.to_string()),
                        None,
                        &alert_type,
                        &dedup_key,
                        AlertSeverity::Critical,
                        "Background job failed",
                        &execution_fault.detail,
                    )
                    .await;
            }
        }
    }
}

/// Sonda de cancelación: espeja la bandera del Ledger hacia un AtomicBool.
pub struct CancellationProbe {
    /// Bandera consumida por el cómputo bloqueante.
    pub flag: Arc<AtomicBool>,
    probe_handle: JoinHandle<()>,
}

impl CancellationProbe {
    /// Arranca la sonda con ciclo de 2 segundos.
    pub fn spawn(application_state: &AppState, job_identifier: Uuid) -> Self {
        let flag = Arc::new(AtomicBool::new(false));
        let flag_reference = flag.clone();
        let repository = application_state.job_repository.clone();

        let probe_handle = tokio::spawn(async move {
            let mut probe_ticker = tokio::time::interval(Duration::from_secs(2));
            loop {
                probe_ticker.tick().await;
                match repository.is_cancellation_requested(job_identifier).await {
                    Ok(true) => {
                        flag_reference.store(true, Ordering::Relaxed);
                        break;
                    }
                    Ok(false) => {}
                    Err(_) => break,
                }
            }
        });

        Self { flag, probe_handle }
    }

    /// Sella la sonda al terminar la ejecución.
    pub fn seal(self) {
        self.probe_handle.abort();
    }
}

/// Sincronizador de progreso: espeja el acumulador hacia el Ledger.
pub struct ProgressSync {
    /// Acumulador (fracción, etiqueta de etapa) alimentado por el cómputo.
    pub accumulator: Arc<Mutex<(f64, String)>>,
    sync_handle: JoinHandle<()>,
}

impl ProgressSync {
    /// Arranca el espejo con ciclo de 1 segundo.
    pub fn spawn(application_state: &AppState, job_identifier: Uuid) -> Self {
        let accumulator = Arc::new(Mutex::new((0.0_f64, "claimed".to_string())));
        let accumulator_reference = accumulator.clone();
        let repository = application_state.job_repository.clone();

        let sync_handle = tokio::spawn(async move {
            let mut sync_ticker = tokio::time::interval(Duration::from_secs(1));
            loop {
                sync_ticker.tick().await;
                let (fraction, stage_tag) = {
                    let guard = match accumulator_reference.lock() {
                        Ok(guard) => guard,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                    guard.clone()
                };
                let _ = repository.update_progress(job_identifier, fraction, &stage_tag).await;
            }
        });

        Self { accumulator, sync_handle }
    }

    /// Sella el espejo con un último reporte síncrono.
    pub async fn seal(self, application_state: &AppState, job_identifier: Uuid) {
        self.sync_handle.abort();
        let (fraction, stage_tag) = {
            let guard = match self.accumulator.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.clone()
        };
        let _ = application_state
            .job_repository
            .update_progress(job_identifier, fraction, &stage_tag)
            .await;
    }
}
