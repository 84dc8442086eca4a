// [apps/control-tower/src/services/executors/feature.rs]
/*!
 * =================================================================
 * APARATO: FEATURE COMPUTE EXECUTOR (V15.1 - FORGE BRIDGE)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: EJECUCIÓN DE LA FORJA C3 SOBRE EL POOL DE TRABAJO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. BLOCKING BRIDGE: El cómputo columnar corre en spawn_blocking con
 *    la sonda de cancelación espejada al AtomicBool.
 * 2. NO PARTIAL PUBLISH: La falla de cualquier etapa sella FAILED en el
 *    FeatureSet sin artefacto publicado.
 * =================================================================
 */

use super::{CancellationProbe, ExecutionFault, ExecutionVerdict, ProgressSync};
use crate::state::AppState;
use aegis_core_learners::seeding::derive_seed_from_identifier;
use aegis_domain_features::{
    parse_transaction_csv, FeatureForgePipeline, FixedDateHolidayCalendar,
};
use aegis_domain_models::{FaultClass, FeatureConfig};
use aegis_infra_artifacts::ArtifactNamespace;
use std::sync::atomic::Ordering;
use tracing::{info, instrument};
use uuid::Uuid;

/**
 * Ejecuta la orden FeatureCompute extremo a extremo.
 */
#[instrument(skip(application_state, config), fields(job_id = %job_identifier))]
pub async fn execute_feature_compute(
    application_state: &AppState,
    job_identifier: Uuid,
    dataset_id: Uuid,
    feature_set_id: Uuid,
    config: FeatureConfig,
) -> Result<ExecutionVerdict, ExecutionFault> {
    let progress_sync = ProgressSync::spawn(application_state, job_identifier);
    let cancellation_probe = CancellationProbe::spawn(application_state, job_identifier);

    let execution = execute_inner(
        application_state,
        job_identifier,
        dataset_id,
        feature_set_id,
        config,
        &progress_sync,
        &cancellation_probe,
    )
    .await;

    cancellation_probe.seal();
    progress_sync.seal(application_state, job_identifier).await;
    execution
}

async fn execute_inner(
    application_state: &AppState,
    job_identifier: Uuid,
    dataset_id: Uuid,
    feature_set_id: Uuid,
    config: FeatureConfig,
    progress_sync: &ProgressSync,
    cancellation_probe: &CancellationProbe,
) -> Result<ExecutionVerdict, ExecutionFault> {
    // --- ETAPA 0: TRANSICIÓN PENDING -> RUNNING ---
    application_state
        .feature_set_repository
        .mark_running(feature_set_id)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    let seal_failure = |detail: &str| {
        let repository = application_state.feature_set_repository.clone();
        let owned_detail = detail.to_string();
        async move {
            let _ = repository.fail(feature_set_id, &owned_detail).await;
        }
    };

    // --- ETAPA 1: CARGA Y DECODIFICACIÓN DEL DATASET ---
    set_progress(progress_sync, 0.05, "dataset_fetch");
    let dataset = match application_state.dataset_repository.get(dataset_id).await {
        Ok(dataset) => dataset,
        Err(fault) => {
            seal_failure(&fault.to_string()).await;
            return Err(ExecutionFault::new(fault.fault_class(), fault.to_string()));
        }
    };

    let csv_bytes = match application_state.artifact_vault.get(&dataset.blob_reference) {
        Ok(bytes) => bytes,
        Err(fault) => {
            seal_failure(&fault.to_string()).await;
            return Err(ExecutionFault::new(FaultClass::UpstreamUnavailable, fault.to_string()));
        }
    };

    let records = match parse_transaction_csv(&csv_bytes) {
        Ok(records) => records,
        Err(fault) => {
            seal_failure(&fault.to_string()).await;
            return Err(ExecutionFault::new(fault.fault_class(), fault.to_string()));
        }
    };

    // --- ETAPA 2: FORJA COMPLETA EN EL PUENTE BLOQUEANTE ---
    set_progress(progress_sync, 0.20, "forge_pipeline");
    let job_seed = derive_seed_from_identifier(job_identifier);
    let cancellation_flag = cancellation_probe.flag.clone();

    let forge_outcome = tokio::task::spawn_blocking(move || {
        let holiday_calendar = FixedDateHolidayCalendar::with_nominal_profile();
        FeatureForgePipeline::execute(&records, &config, &holiday_calendar, job_seed, || {
            cancellation_flag.load(Ordering::Relaxed)
        })
    })
    .await
    .map_err(|join_fault| ExecutionFault::new(FaultClass::Internal, join_fault.to_string()))?;

    let forge_product = match forge_outcome {
        Ok(Some(product)) => product,
        Ok(None) => {
            // Cancelación: el FeatureSet regresa a FAILED con causa explícita.
            seal_failure("cancelled before completion").await;
            return Ok(ExecutionVerdict::Cancelled);
        }
        Err(fault) => {
            seal_failure(&fault.to_string()).await;
            return Err(ExecutionFault::new(fault.fault_class(), fault.to_string()));
        }
    };

    // --- ETAPA 3: PUBLICACIÓN DEL ARTEFACTO Y SELLADO DEL CONTRATO ---
    set_progress(progress_sync, 0.85, "artifact_publish");
    let matrix_bytes = forge_product
        .selected_matrix
        .to_artifact_bytes()
        .map_err(|fault| ExecutionFault::new(FaultClass::Internal, fault.to_string()))?;

    let descriptor = application_state
        .artifact_vault
        .put(ArtifactNamespace::Features, &matrix_bytes)
        .map_err(|fault| ExecutionFault::new(FaultClass::UpstreamUnavailable, fault.to_string()))?;

    application_state
        .feature_set_repository
        .complete(
            feature_set_id,
            &forge_product.generated_feature_names,
            &forge_product.selection.selected_features,
            &forge_product.schema_hash,
            &descriptor.reference,
        )
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    set_progress(progress_sync, 1.0, "sealed");
    info!(
        "🧬 [FEATURE_EXECUTOR]: FeatureSet {} completed with {} features.",
        feature_set_id,
        forge_product.selection.selected_features.len()
    );
    Ok(ExecutionVerdict::Completed)
}

/// Actualiza el acumulador de progreso compartido.
fn set_progress(progress_sync: &ProgressSync, fraction: f64, stage_tag: &str) {
    let mut guard = match progress_sync.accumulator.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    *guard = (fraction, stage_tag.to_string());
}
