// [apps/control-tower/src/services/executors/training.rs]
/*!
 * =================================================================
 * APARATO: TRAINING EXECUTOR BRIDGE (V15.2 - RETRY-ONCE DISCIPLINE)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: ENTRENAMIENTO C4 SOBRE EL POOL DE TRABAJO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. RETRY-ONCE: Únicamente la clase Internal se reintenta, a lo sumo
 *    una vez; el resto de la taxonomía es terminal.
 * 2. ATOMIC REGISTRATION: El modelo se registra TRAINED únicamente con
 *    ambos artefactos sellados en la bóveda y checksum presente.
 * 3. CONTRACT BY CONSTRUCTION: feature_names del modelo ES el orden
 *    seleccionado del FeatureSet verificado por digest.
 * =================================================================
 */

use super::{CancellationProbe, ExecutionFault, ExecutionVerdict, ProgressSync};
use crate::state::AppState;
use aegis_core_learners::FeatureMatrix;
use aegis_domain_models::feature::FeatureSetStatus;
use aegis_domain_models::{AlgorithmKind, FaultClass, ImbalanceStrategy, ModelRecord, ModelStage};
use aegis_domain_training::{TrainingError, TrainingExecutor, TrainingRequest};
use aegis_infra_artifacts::ArtifactNamespace;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/**
 * Ejecuta la orden Train extremo a extremo con política retry-once.
 */
#[instrument(skip_all, fields(job_id = %job_identifier, algorithm = algorithm.canonical_tag()))]
pub async fn execute_training(
    application_state: &AppState,
    job_identifier: Uuid,
    feature_set_id: Uuid,
    algorithm: AlgorithmKind,
    hyperparameters: BTreeMap<String, serde_json::Value>,
    imbalance_strategy: ImbalanceStrategy,
    decision_threshold: f64,
) -> Result<ExecutionVerdict, ExecutionFault> {
    let progress_sync = ProgressSync::spawn(application_state, job_identifier);
    let cancellation_probe = CancellationProbe::spawn(application_state, job_identifier);

    // --- CARGA DEL CONTRATO Y LA MATRIZ ---
    let feature_set = application_state
        .feature_set_repository
        .get(feature_set_id)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    if feature_set.status != FeatureSetStatus::Completed {
        cancellation_probe.seal();
        progress_sync.seal(application_state, job_identifier).await;
        return Err(ExecutionFault::new(
            FaultClass::ConflictingState,
            format!("feature_set {} is not COMPLETED", feature_set_id),
        ));
    }

    let matrix_reference = feature_set.matrix_artifact_reference.clone().ok_or_else(|| {
        ExecutionFault::new(FaultClass::Internal, "completed feature_set without matrix artifact")
    })?;
    let matrix_bytes = application_state
        .artifact_vault
        .get(&matrix_reference)
        .map_err(|fault| ExecutionFault::new(FaultClass::ArtifactCorrupted, fault.to_string()))?;
    let matrix = FeatureMatrix::from_artifact_bytes(&matrix_bytes)
        .map_err(|fault| ExecutionFault::new(FaultClass::ArtifactCorrupted, fault.to_string()))?;

    let request = TrainingRequest {
        job_id: job_identifier,
        algorithm,
        hyperparameters,
        imbalance_strategy,
        decision_threshold,
        train_fraction: 0.8,
    };

    // --- AJUSTE EN PUENTE BLOQUEANTE CON RETRY-ONCE ---
    let shared_matrix = Arc::new(matrix);
    let shared_feature_set = Arc::new(feature_set);
    let mut retry_budget = 1u32;

    let trained_artifacts = loop {
        let matrix_reference = shared_matrix.clone();
        let feature_set_reference = shared_feature_set.clone();
        let request_clone = request.clone();
        let progress_accumulator = progress_sync.accumulator.clone();
        let cancellation_flag = cancellation_probe.flag.clone();

        let attempt_outcome = tokio::task::spawn_blocking(move || {
            TrainingExecutor::execute(
                &matrix_reference,
                &feature_set_reference,
                &request_clone,
                |fraction, stage_tag| {
                    let mut guard = match progress_accumulator.lock() {
                        Ok(guard) => guard,
                        Err(poisoned) => poisoned.into_inner(),
                    };
                    // Progreso monótono garantizado por el acumulador.
                    if fraction >= guard.0 {
                        *guard = (fraction, stage_tag.to_string());
                    }
                },
                || cancellation_flag.load(Ordering::Relaxed),
            )
        })
        .await
        .map_err(|join_fault| ExecutionFault::new(FaultClass::Internal, join_fault.to_string()))?;

        match attempt_outcome {
            Ok(Some(artifacts)) => break artifacts,
            Ok(None) => {
                cancellation_probe.seal();
                progress_sync.seal(application_state, job_identifier).await;
                return Ok(ExecutionVerdict::Cancelled);
            }
            Err(training_fault) => {
                if training_fault.is_retryable_once() && retry_budget > 0 {
                    retry_budget -= 1;
                    warn!("🔁 [TRAINING_EXECUTOR]: Internal fault, single retry engaged: {}", training_fault);
                    continue;
                }
                cancellation_probe.seal();
                progress_sync.seal(application_state, job_identifier).await;
                return Err(translate_training_fault(training_fault));
            }
        }
    };

    cancellation_probe.seal();

    // --- PUBLICACIÓN DUAL DE ARTEFACTOS ---
    let native_descriptor = application_state
        .artifact_vault
        .put(ArtifactNamespace::ModelNative, &trained_artifacts.native_bytes)
        .map_err(|fault| ExecutionFault::new(FaultClass::UpstreamUnavailable, fault.to_string()))?;
    let portable_descriptor = application_state
        .artifact_vault
        .put(ArtifactNamespace::ModelPortable, &trained_artifacts.portable_bytes)
        .map_err(|fault| ExecutionFault::new(FaultClass::UpstreamUnavailable, fault.to_string()))?;

    // --- REGISTRO ATÓMICO EN TRAINED ---
    let model_record = ModelRecord {
        id: Uuid::new_v4(),
        algorithm,
        hyperparameters: request.hyperparameters.clone(),
        feature_set_id,
        schema_hash: shared_feature_set.schema_hash.clone(),
        metrics: trained_artifacts.metrics.clone(),
        feature_importance: trained_artifacts.feature_importance.clone(),
        feature_names: shared_feature_set.selected_feature_names(),
        native_artifact_reference: native_descriptor.reference,
        portable_artifact_reference: portable_descriptor.reference,
        checksum_hexadecimal: trained_artifacts.checksum_hexadecimal.clone(),
        stage: ModelStage::Trained,
        archived_reason: None,
        promoted_at: None,
        trained_at: Utc::now(),
        created_at: Utc::now(),
    };

    application_state
        .model_repository
        .register_trained(&model_record)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    progress_sync.seal(application_state, job_identifier).await;
    info!(
        "🎓 [TRAINING_EXECUTOR]: Model {} registered (f1 {:.4}).",
        model_record.id, model_record.metrics.f1_score
    );
    Ok(ExecutionVerdict::Completed)
}

/// Traduce la taxonomía del motor hacia el fallo de ejecución.
fn translate_training_fault(training_fault: TrainingError) -> ExecutionFault {
    ExecutionFault::new(training_fault.fault_class(), training_fault.to_string())
}
