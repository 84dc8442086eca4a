// [apps/control-tower/src/services/retrain_driver.rs]
/*!
 * =================================================================
 * APARATO: RETRAIN STATE MACHINE DRIVER (V16.0 - GUARDED ADVANCE)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: AVANCE DE LA MÁQUINA C10 BAJO EL POOL DE TRABAJO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. PURE TRANSITIONS: Cada etapa es una función de (fila corriente,
 *    entradas) hacia (estado siguiente, efectos); el driver las avanza
 *    bajo la sonda de cancelación del scheduler.
 * 2. MERGE STRATEGIES: replace / append / weighted / sliding_window
 *    fusionan el dataset histórico del modelo base con la versión ACTIVE
 *    más reciente del linaje.
 * 3. HUMAN GATE ON BIAS: Los reentrenos disparados por sesgo JAMÁS
 *    auto-promueven; la máquina queda en COMPARISON esperando la
 *    aprobación explícita del operador.
 *
 * # Mathematical Proof (Termination):
 * El grafo PENDING -> ... -> {PROMOTED, REJECTED, FAILED} es acíclico y
 * cada pasada avanza al menos un estado o se detiene en la puerta
 * humana, por lo que toda orden termina o queda explícitamente anclada.
 * =================================================================
 */

use crate::services::executors::{CancellationProbe, ExecutionFault, ExecutionVerdict};
use crate::state::AppState;
use aegis_core_learners::seeding::derive_seed_from_identifier;
use aegis_domain_features::{
    parse_transaction_csv, records_to_csv, FeatureForgePipeline, FixedDateHolidayCalendar,
    TransactionRecord,
};
use aegis_domain_models::{
    Dataset, FaultClass, FeatureConfig, ImbalanceStrategy, MergeStrategy, ModelRecord, ModelStage,
    RetrainJob, RetrainState,
};
use aegis_domain_training::{TrainingExecutor, TrainingRequest};
use aegis_infra_artifacts::ArtifactNamespace;
use chrono::Utc;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/**
 * Ejecuta una orden Retrain avanzando la máquina hasta estado absorbente
 * o hasta la puerta de aprobación humana.
 */
#[instrument(skip(application_state), fields(job_id = %job_identifier, retrain_id = %retrain_job_id))]
pub async fn execute_retrain_order(
    application_state: &AppState,
    job_identifier: Uuid,
    retrain_job_id: Uuid,
) -> Result<ExecutionVerdict, ExecutionFault> {
    let cancellation_probe = CancellationProbe::spawn(application_state, job_identifier);

    let advance_outcome =
        advance_until_anchor(application_state, retrain_job_id, &cancellation_probe).await;

    cancellation_probe.seal();
    advance_outcome
}

/// Bucle del driver: avanza etapa por etapa con cancelación en fronteras.
async fn advance_until_anchor(
    application_state: &AppState,
    retrain_job_id: Uuid,
    cancellation_probe: &CancellationProbe,
) -> Result<ExecutionVerdict, ExecutionFault> {
    loop {
        if cancellation_probe.flag.load(Ordering::Relaxed) {
            return Ok(ExecutionVerdict::Cancelled);
        }

        let order = application_state
            .retrain_repository
            .get(retrain_job_id)
            .await
            .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

        if order.state.is_terminal() {
            return Ok(ExecutionVerdict::Completed);
        }

        let advanced = match order.state {
            RetrainState::Pending => advance_pending(application_state, &order).await,
            RetrainState::DataPreparation => {
                advance_data_preparation(application_state, &order, cancellation_probe).await
            }
            RetrainState::Training => {
                advance_training(application_state, &order, cancellation_probe).await
            }
            RetrainState::Validation => advance_validation(application_state, &order).await,
            RetrainState::Comparison => advance_comparison(application_state, &order).await,
            RetrainState::Promoted | RetrainState::Rejected | RetrainState::Failed => {
                return Ok(ExecutionVerdict::Completed);
            }
        };

        match advanced {
            Ok(StageAdvance::Progressed) => continue,
            Ok(StageAdvance::Cancelled) => return Ok(ExecutionVerdict::Cancelled),
            Ok(StageAdvance::AwaitingApproval) => {
                info!("🧑‍⚖️ [RETRAIN]: Order {} anchored awaiting human approval.", retrain_job_id);
                return Ok(ExecutionVerdict::Completed);
            }
            Err(stage_fault) => {
                // La falla de etapa sella FAILED en la máquina.
                let _ = application_state
                    .retrain_repository
                    .cas_transition(
                        retrain_job_id,
                        order.state,
                        RetrainState::Failed,
                        None,
                        None,
                        None,
                        Some(&stage_fault.detail),
                    )
                    .await;
                return Err(stage_fault);
            }
        }
    }
}

/// Resultado del avance de una etapa individual.
enum StageAdvance {
    Progressed,
    Cancelled,
    AwaitingApproval,
}

/// PENDING -> DATA_PREPARATION.
async fn advance_pending(
    application_state: &AppState,
    order: &RetrainJob,
) -> Result<StageAdvance, ExecutionFault> {
    application_state
        .retrain_repository
        .cas_transition(
            order.id,
            RetrainState::Pending,
            RetrainState::DataPreparation,
            None,
            None,
            None,
            None,
        )
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;
    Ok(StageAdvance::Progressed)
}

/// DATA_PREPARATION: fusión de datasets + forja del contrato candidato.
async fn advance_data_preparation(
    application_state: &AppState,
    order: &RetrainJob,
    cancellation_probe: &CancellationProbe,
) -> Result<StageAdvance, ExecutionFault> {
    // --- LINAJE: DATASET HISTÓRICO + VERSIÓN ACTIVE MÁS RECIENTE ---
    let base_model = application_state
        .model_repository
        .get(order.base_model_id)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;
    let base_feature_set = application_state
        .feature_set_repository
        .get(base_model.feature_set_id)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;
    let historical_dataset = application_state
        .dataset_repository
        .get(base_feature_set.dataset_id)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    let historical_records = fetch_dataset_records(application_state, &historical_dataset)?;
    let fresh_records =
        fetch_latest_lineage_records(application_state, &historical_dataset).await?;

    let merged_records =
        merge_with_strategy(&order.merge_strategy, historical_records, fresh_records);
    if merged_records.is_empty() {
        return Err(ExecutionFault::new(
            FaultClass::Validation,
            "merge strategy produced an empty training corpus",
        ));
    }

    // --- DATASET DERIVADO SELLADO EN EL LINAJE ---
    let merged_csv = records_to_csv(&merged_records)
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;
    let blob_descriptor = application_state
        .artifact_vault
        .put(ArtifactNamespace::Dataset, &merged_csv)
        .map_err(|fault| ExecutionFault::new(FaultClass::UpstreamUnavailable, fault.to_string()))?;

    let next_version = application_state
        .dataset_repository
        .latest_version(&historical_dataset.name)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?
        .unwrap_or(historical_dataset.version)
        + 1;

    let derived_dataset = application_state
        .dataset_repository
        .create(
            &historical_dataset.name,
            next_version,
            Some(historical_dataset.id),
            merged_records.len() as u64,
            &historical_dataset.schema,
            &blob_descriptor.sha256_hexadecimal,
            &blob_descriptor.reference,
        )
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;
    application_state
        .dataset_repository
        .activate(derived_dataset.id)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    // --- FORJA DEL CONTRATO CANDIDATO ---
    let candidate_feature_set = application_state
        .feature_set_repository
        .create_pending(derived_dataset.id, &base_feature_set.config)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;
    application_state
        .feature_set_repository
        .mark_running(candidate_feature_set.id)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    let forge_seed = derive_seed_from_identifier(order.id);
    let forge_config: FeatureConfig = base_feature_set.config.clone();
    let cancellation_flag = cancellation_probe.flag.clone();
    let forge_outcome = tokio::task::spawn_blocking(move || {
        let holiday_calendar = FixedDateHolidayCalendar::with_nominal_profile();
        FeatureForgePipeline::execute(&merged_records, &forge_config, &holiday_calendar, forge_seed, || {
            cancellation_flag.load(Ordering::Relaxed)
        })
    })
    .await
    .map_err(|join_fault| ExecutionFault::new(FaultClass::Internal, join_fault.to_string()))?;

    let forge_product = match forge_outcome {
        Ok(Some(product)) => product,
        Ok(None) => {
            let _ = application_state
                .feature_set_repository
                .fail(candidate_feature_set.id, "cancelled during retrain data preparation")
                .await;
            return Ok(StageAdvance::Cancelled);
        }
        Err(forge_fault) => {
            let _ = application_state
                .feature_set_repository
                .fail(candidate_feature_set.id, &forge_fault.to_string())
                .await;
            return Err(ExecutionFault::new(forge_fault.fault_class(), forge_fault.to_string()));
        }
    };

    let matrix_bytes = forge_product
        .selected_matrix
        .to_artifact_bytes()
        .map_err(|fault| ExecutionFault::new(FaultClass::Internal, fault.to_string()))?;
    let matrix_descriptor = application_state
        .artifact_vault
        .put(ArtifactNamespace::Features, &matrix_bytes)
        .map_err(|fault| ExecutionFault::new(FaultClass::UpstreamUnavailable, fault.to_string()))?;

    application_state
        .feature_set_repository
        .complete(
            candidate_feature_set.id,
            &forge_product.generated_feature_names,
            &forge_product.selection.selected_features,
            &forge_product.schema_hash,
            &matrix_descriptor.reference,
        )
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    application_state
        .retrain_repository
        .cas_transition(
            order.id,
            RetrainState::DataPreparation,
            RetrainState::Training,
            Some(candidate_feature_set.id),
            None,
            None,
            None,
        )
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    info!("🔄 [RETRAIN]: Data preparation sealed for order {}.", order.id);
    Ok(StageAdvance::Progressed)
}

/// TRAINING: candidato con el algoritmo e hiperparámetros del modelo base.
async fn advance_training(
    application_state: &AppState,
    order: &RetrainJob,
    cancellation_probe: &CancellationProbe,
) -> Result<StageAdvance, ExecutionFault> {
    let base_model = application_state
        .model_repository
        .get(order.base_model_id)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;
    let candidate_feature_set_id = order.candidate_feature_set_id.ok_or_else(|| {
        ExecutionFault::new(FaultClass::Internal, "training stage without candidate feature set")
    })?;
    let candidate_feature_set = application_state
        .feature_set_repository
        .get(candidate_feature_set_id)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    let matrix_reference =
        candidate_feature_set.matrix_artifact_reference.clone().ok_or_else(|| {
            ExecutionFault::new(FaultClass::Internal, "candidate feature set without matrix")
        })?;
    let matrix_bytes = application_state
        .artifact_vault
        .get(&matrix_reference)
        .map_err(|fault| ExecutionFault::new(FaultClass::ArtifactCorrupted, fault.to_string()))?;
    let matrix = aegis_core_learners::FeatureMatrix::from_artifact_bytes(&matrix_bytes)
        .map_err(|fault| ExecutionFault::new(FaultClass::ArtifactCorrupted, fault.to_string()))?;

    let request = TrainingRequest {
        job_id: order.id,
        algorithm: base_model.algorithm,
        hyperparameters: base_model.hyperparameters.clone(),
        imbalance_strategy: ImbalanceStrategy::ClassWeight,
        decision_threshold: base_model.metrics.decision_threshold,
        train_fraction: 0.8,
    };

    let shared_matrix = Arc::new(matrix);
    let shared_feature_set = Arc::new(candidate_feature_set);
    let cancellation_flag = cancellation_probe.flag.clone();
    let matrix_for_fit = shared_matrix.clone();
    let feature_set_for_fit = shared_feature_set.clone();
    let request_for_fit = request.clone();

    let training_outcome = tokio::task::spawn_blocking(move || {
        TrainingExecutor::execute(
            &matrix_for_fit,
            &feature_set_for_fit,
            &request_for_fit,
            |_, _| {},
            || cancellation_flag.load(Ordering::Relaxed),
        )
    })
    .await
    .map_err(|join_fault| ExecutionFault::new(FaultClass::Internal, join_fault.to_string()))?;

    let trained = match training_outcome {
        Ok(Some(artifacts)) => artifacts,
        Ok(None) => return Ok(StageAdvance::Cancelled),
        Err(training_fault) => {
            return Err(ExecutionFault::new(
                training_fault.fault_class(),
                training_fault.to_string(),
            ));
        }
    };

    let native_descriptor = application_state
        .artifact_vault
        .put(ArtifactNamespace::ModelNative, &trained.native_bytes)
        .map_err(|fault| ExecutionFault::new(FaultClass::UpstreamUnavailable, fault.to_string()))?;
    let portable_descriptor = application_state
        .artifact_vault
        .put(ArtifactNamespace::ModelPortable, &trained.portable_bytes)
        .map_err(|fault| ExecutionFault::new(FaultClass::UpstreamUnavailable, fault.to_string()))?;

    let candidate_model = ModelRecord {
        id: Uuid::new_v4(),
        algorithm: base_model.algorithm,
        hyperparameters: base_model.hyperparameters.clone(),
        feature_set_id: shared_feature_set.id,
        schema_hash: shared_feature_set.schema_hash.clone(),
        metrics: trained.metrics.clone(),
        feature_importance: trained.feature_importance.clone(),
        feature_names: shared_feature_set.selected_feature_names(),
        native_artifact_reference: native_descriptor.reference,
        portable_artifact_reference: portable_descriptor.reference,
        checksum_hexadecimal: trained.checksum_hexadecimal.clone(),
        stage: ModelStage::Trained,
        archived_reason: None,
        promoted_at: None,
        trained_at: Utc::now(),
        created_at: Utc::now(),
    };
    application_state
        .model_repository
        .register_trained(&candidate_model)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    application_state
        .retrain_repository
        .cas_transition(
            order.id,
            RetrainState::Training,
            RetrainState::Validation,
            None,
            Some(candidate_model.id),
            None,
            None,
        )
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    info!("🔄 [RETRAIN]: Candidate {} trained for order {}.", candidate_model.id, order.id);
    Ok(StageAdvance::Progressed)
}

/// VALIDATION: baselines del modelo base sobre el candidato.
async fn advance_validation(
    application_state: &AppState,
    order: &RetrainJob,
) -> Result<StageAdvance, ExecutionFault> {
    let candidate_model_id = order.candidate_model_id.ok_or_else(|| {
        ExecutionFault::new(FaultClass::Internal, "validation stage without candidate model")
    })?;
    let candidate_model = application_state
        .model_repository
        .get(candidate_model_id)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    let offending = application_state
        .model_repository
        .unmet_baselines(order.base_model_id, &candidate_model.metrics)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    if offending.is_empty() {
        application_state
            .retrain_repository
            .cas_transition(
                order.id,
                RetrainState::Validation,
                RetrainState::Comparison,
                None,
                None,
                None,
                None,
            )
            .await
            .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;
        Ok(StageAdvance::Progressed)
    } else {
        let offenders: Vec<String> =
            offending.iter().map(|entry| entry.metric_name.clone()).collect();
        application_state
            .retrain_repository
            .cas_transition(
                order.id,
                RetrainState::Validation,
                RetrainState::Rejected,
                None,
                None,
                Some(&format!("baselines_not_met: {}", offenders.join(", "))),
                None,
            )
            .await
            .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;
        warn!("🔄 [RETRAIN]: Order {} rejected on baselines {:?}.", order.id, offenders);
        Ok(StageAdvance::Progressed)
    }
}

/// COMPARISON: mejora mínima de la métrica primaria + puerta humana.
async fn advance_comparison(
    application_state: &AppState,
    order: &RetrainJob,
) -> Result<StageAdvance, ExecutionFault> {
    let candidate_model_id = order.candidate_model_id.ok_or_else(|| {
        ExecutionFault::new(FaultClass::Internal, "comparison stage without candidate model")
    })?;
    let candidate_model = application_state
        .model_repository
        .get(candidate_model_id)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;
    let base_model = application_state
        .model_repository
        .get(order.base_model_id)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    let observed_improvement =
        candidate_model.metrics.f1_score - base_model.metrics.f1_score;
    if observed_improvement < order.min_improvement {
        application_state
            .retrain_repository
            .cas_transition(
                order.id,
                RetrainState::Comparison,
                RetrainState::Rejected,
                None,
                None,
                Some("no_significant_improvement"),
                None,
            )
            .await
            .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;
        info!(
            "🔄 [RETRAIN]: Order {} rejected (Δf1 {:.4} < {:.4}).",
            order.id, observed_improvement, order.min_improvement
        );
        return Ok(StageAdvance::Progressed);
    }

    // Puerta humana: sin auto-promoción (o vetada por sesgo), la orden
    // queda anclada en COMPARISON hasta la aprobación explícita.
    if !(order.auto_promote && order.reason.allows_auto_promotion()) {
        return Ok(StageAdvance::AwaitingApproval);
    }

    complete_promotion(application_state, order, candidate_model_id).await?;
    Ok(StageAdvance::Progressed)
}

/**
 * Ejecuta la promoción del candidato (invocada por el driver en modo
 * automático o por la superficie tras la aprobación humana).
 */
pub async fn complete_promotion(
    application_state: &AppState,
    order: &RetrainJob,
    candidate_model_id: Uuid,
) -> Result<(), ExecutionFault> {
    application_state
        .model_repository
        .patch_stage(candidate_model_id, ModelStage::Trained, ModelStage::Staging)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;
    application_state
        .model_repository
        .promote_to_production(candidate_model_id)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    application_state
        .retrain_repository
        .cas_transition(
            order.id,
            RetrainState::Comparison,
            RetrainState::Promoted,
            None,
            None,
            None,
            None,
        )
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    let _ = application_state
        .system_repository
        .append_audit_event(
            "retrain_controller",
            "candidate_promoted",
            &candidate_model_id.to_string(),
            Some(&format!("retrain order {}", order.id)),
        )
        .await;

    info!("👑 [RETRAIN]: Candidate {} promoted by order {}.", candidate_model_id, order.id);
    Ok(())
}

/// Registros del blob de un dataset.
fn fetch_dataset_records(
    application_state: &AppState,
    dataset: &Dataset,
) -> Result<Vec<TransactionRecord>, ExecutionFault> {
    let csv_bytes = application_state
        .artifact_vault
        .get(&dataset.blob_reference)
        .map_err(|fault| ExecutionFault::new(FaultClass::UpstreamUnavailable, fault.to_string()))?;
    parse_transaction_csv(&csv_bytes)
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))
}

/// Registros de la versión ACTIVE más reciente del linaje (si difiere).
async fn fetch_latest_lineage_records(
    application_state: &AppState,
    historical_dataset: &Dataset,
) -> Result<Vec<TransactionRecord>, ExecutionFault> {
    let lineage = application_state
        .dataset_repository
        .list(Some(aegis_domain_models::DatasetStatus::Active), 64, 0)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    let freshest = lineage
        .into_iter()
        .filter(|candidate| {
            candidate.name == historical_dataset.name
                && candidate.version > historical_dataset.version
        })
        .max_by_key(|candidate| candidate.version);

    match freshest {
        Some(fresh_dataset) => fetch_dataset_records(application_state, &fresh_dataset),
        None => Ok(Vec::new()),
    }
}

/// Fusión de corpus según la estrategia declarada.
fn merge_with_strategy(
    strategy: &MergeStrategy,
    historical_records: Vec<TransactionRecord>,
    fresh_records: Vec<TransactionRecord>,
) -> Vec<TransactionRecord> {
    match strategy {
        MergeStrategy::Replace => {
            if fresh_records.is_empty() {
                historical_records
            } else {
                fresh_records
            }
        }
        MergeStrategy::Append => {
            let mut merged = historical_records;
            merged.extend(fresh_records);
            merged
        }
        MergeStrategy::Weighted { new_weight } => {
            let replication = (new_weight.round() as usize).max(1);
            let mut merged = historical_records;
            for _ in 0..replication {
                merged.extend(fresh_records.iter().cloned());
            }
            merged
        }
        MergeStrategy::SlidingWindow { max_rows } => {
            let mut merged = historical_records;
            merged.extend(fresh_records);
            merged.sort_by_key(|record| record.event_time);
            let retained_start = merged.len().saturating_sub(*max_rows as usize);
            merged.split_off(retained_start)
        }
    }
}
