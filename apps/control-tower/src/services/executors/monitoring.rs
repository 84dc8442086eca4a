// [apps/control-tower/src/services/executors/monitoring.rs]
/*!
 * =================================================================
 * APARATO: MONITORING EXECUTOR MATRIX (V15.3 - TRIPLE SWEEP)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: BARRIDOS C7 (DERIVA, CONCEPTO, EQUIDAD) + DISPARO C10
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. FROZEN REFERENCE: La referencia de deriva se congela desde la
 *    matriz de entrenamiento del FeatureSet del modelo, jamás desde una
 *    ventana móvil.
 * 2. HYSTERESIS DISCIPLINE: La emisión de alertas respeta la histéresis
 *    de dos ventanas; las ventanas OK alimentan la auto-resolución.
 * 3. RETRAIN TRIGGER: Una banda CRITICAL con el flag de auto-retrain en
 *    alto crea la orden C10 en PENDING (deduplicada por modelo vivo).
 * =================================================================
 */

use super::{ExecutionFault, ExecutionVerdict};
use crate::state::AppState;
use aegis_core_learners::{FeatureMatrix, ScoringModel, TrainedLearner};
use aegis_domain_features::parse_transaction_csv;
use aegis_domain_models::{
    build_alert_dedup_key, AlertSeverity, AlertSourceKind, BiasMetricRecord, DriftMetricRecord,
    FaultClass, JobPayload, MergeStrategy, MetricStatus, MonitorKind, RetrainReason,
};
use aegis_domain_monitoring::{
    analyze_bias, analyze_concept_drift, analyze_data_drift, should_emit_alert, BiasThresholds,
    GroupObservation, ReferenceSnapshot,
};
use aegis_domain_training::evaluate_scores;
use aegis_infra_catalog::repositories::system::FLAG_AUTO_RETRAIN_ENABLED;
use chrono::{Duration, Utc};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Ventana móvil nominal de vigilancia (días).
const SURVEILLANCE_WINDOW_DAYS: i64 = 7;
/// Tope de predicciones por barrido.
const SURVEILLANCE_WINDOW_LIMIT: u32 = 20_000;
/// Ventanas OK consecutivas para auto-resolución de alertas.
const AUTO_RESOLVE_OK_WINDOWS: u32 = 2;

/**
 * Barrido de deriva distribucional por feature del contrato.
 */
#[instrument(skip(application_state), fields(job_id = %job_identifier, model_id = %model_id))]
pub async fn execute_drift_scan(
    application_state: &AppState,
    job_identifier: Uuid,
    model_id: Uuid,
) -> Result<ExecutionVerdict, ExecutionFault> {
    let model = application_state
        .model_repository
        .get(model_id)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    // --- REFERENCIA CONGELADA DESDE LA MATRIZ DE ENTRENAMIENTO ---
    let feature_set = application_state
        .feature_set_repository
        .get(model.feature_set_id)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;
    let matrix_reference = feature_set.matrix_artifact_reference.clone().ok_or_else(|| {
        ExecutionFault::new(FaultClass::Internal, "feature_set without matrix artifact")
    })?;
    let matrix_bytes = application_state
        .artifact_vault
        .get(&matrix_reference)
        .map_err(|fault| ExecutionFault::new(FaultClass::ArtifactCorrupted, fault.to_string()))?;
    let training_matrix = FeatureMatrix::from_artifact_bytes(&matrix_bytes)
        .map_err(|fault| ExecutionFault::new(FaultClass::ArtifactCorrupted, fault.to_string()))?;
    let reference_snapshot = ReferenceSnapshot::freeze_from_matrix(&training_matrix);

    // --- VENTANA CORRIENTE DESDE EL LOG DE PREDICCIONES ---
    let window_end = Utc::now();
    let window_start = window_end - Duration::days(SURVEILLANCE_WINDOW_DAYS);
    let window_predictions = application_state
        .prediction_repository
        .window_of_model(model_id, window_start, window_end, SURVEILLANCE_WINDOW_LIMIT)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    let feature_count = model.feature_names.len();
    let aligned_vectors: Vec<&Vec<f64>> = window_predictions
        .iter()
        .map(|prediction| &prediction.input_vector)
        .filter(|vector| vector.len() == feature_count)
        .collect();

    if aligned_vectors.len() < 30 {
        info!(
            "📡 [DRIFT_SCAN]: Window underpopulated ({} rows). Sweep skipped.",
            aligned_vectors.len()
        );
        return Ok(ExecutionVerdict::Completed);
    }

    // Transposición fila-mayor -> columna-mayor alineada al contrato.
    let mut current_columns: Vec<Vec<f64>> = vec![Vec::with_capacity(aligned_vectors.len()); feature_count];
    for vector in &aligned_vectors {
        for (position, value) in vector.iter().enumerate() {
            current_columns[position].push(*value);
        }
    }

    let findings =
        analyze_data_drift(&reference_snapshot, &model.feature_names, &current_columns)
            .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    // --- PERSISTENCIA, HISTÉRESIS Y ALERTAS ---
    let mut critical_observed = false;
    for finding in &findings {
        let recent_statuses = application_state
            .metric_repository
            .recent_drift_statuses(model_id, &finding.feature_name, &finding.metric_name, 2)
            .await
            .unwrap_or_default();

        let record = DriftMetricRecord {
            id: Uuid::new_v4(),
            model_id,
            kind: MonitorKind::DataDrift,
            feature_name: finding.feature_name.clone(),
            metric_name: finding.metric_name.clone(),
            value: finding.value,
            status: finding.status,
            window_start,
            window_end,
            computed_at: Utc::now(),
        };
        application_state
            .metric_repository
            .insert_drift(&record)
            .await
            .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

        let alert_type = format!("data_drift:{}", finding.feature_name);
        match finding.status {
            MetricStatus::Ok => {
                let _ = application_state
                    .alert_repository
                    .record_ok_window(
                        &format!("{}|{}", model_id, alert_type),
                        AUTO_RESOLVE_OK_WINDOWS,
                    )
                    .await;
            }
            status => {
                if status == MetricStatus::Critical {
                    critical_observed = true;
                }
                if should_emit_alert(status, &recent_statuses) {
                    let severity = if status == MetricStatus::Critical {
                        AlertSeverity::Critical
                    } else {
                        AlertSeverity::Warning
                    };
                    let _ = application_state
                        .alert_repository
                        .submit_with_dedup(
                            AlertSourceKind::Monitoring,
                            Some(record.id.to_string()),
                            Some(model_id),
                            &alert_type,
                            &build_alert_dedup_key(Some(model_id), &alert_type, window_end),
                            severity,
                            &format!("Data drift on {}", finding.feature_name),
                            &format!(
                                "{} = {:.4} over the {}-day window",
                                finding.metric_name, finding.value, SURVEILLANCE_WINDOW_DAYS
                            ),
                        )
                        .await;
                }
            }
        }
    }

    if critical_observed {
        trigger_retrain_when_enabled(application_state, model_id, RetrainReason::DataDrift).await;
    }

    info!("📡 [DRIFT_SCAN]: Sweep sealed with {} findings.", findings.len());
    Ok(ExecutionVerdict::Completed)
}

/**
 * Evaluación de deriva de concepto sobre etiquetas frescas.
 */
#[instrument(skip(application_state), fields(job_id = %job_identifier, model_id = %model_id))]
pub async fn execute_concept_scan(
    application_state: &AppState,
    job_identifier: Uuid,
    model_id: Uuid,
) -> Result<ExecutionVerdict, ExecutionFault> {
    let model = application_state
        .model_repository
        .get(model_id)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    let window_end = Utc::now();
    let window_start = window_end - Duration::days(SURVEILLANCE_WINDOW_DAYS);
    let labeled_predictions = application_state
        .prediction_repository
        .labeled_of_model(model_id, window_start, SURVEILLANCE_WINDOW_LIMIT)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    if labeled_predictions.len() < 30 {
        info!(
            "📡 [CONCEPT_SCAN]: Only {} labeled rows. Sweep skipped.",
            labeled_predictions.len()
        );
        return Ok(ExecutionVerdict::Completed);
    }

    let scores: Vec<f64> =
        labeled_predictions.iter().map(|prediction| prediction.score).collect();
    let actual_labels: Vec<bool> = labeled_predictions
        .iter()
        .map(|prediction| prediction.actual_label.unwrap_or(false))
        .collect();

    let live_evaluation =
        evaluate_scores(&scores, &actual_labels, model.metrics.decision_threshold)
            .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    let findings = analyze_concept_drift(&model.metrics, &live_evaluation.metrics);

    let mut critical_observed = false;
    for finding in &findings {
        let recent_statuses = application_state
            .metric_repository
            .recent_drift_statuses(model_id, &finding.metric_name, "relative_degradation", 2)
            .await
            .unwrap_or_default();

        let record = DriftMetricRecord {
            id: Uuid::new_v4(),
            model_id,
            kind: MonitorKind::ConceptDrift,
            feature_name: finding.metric_name.clone(),
            metric_name: "relative_degradation".into(),
            value: finding.relative_degradation,
            status: finding.status,
            window_start,
            window_end,
            computed_at: Utc::now(),
        };
        application_state
            .metric_repository
            .insert_drift(&record)
            .await
            .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

        let alert_type = format!("concept_drift:{}", finding.metric_name);
        match finding.status {
            MetricStatus::Ok => {
                let _ = application_state
                    .alert_repository
                    .record_ok_window(
                        &format!("{}|{}", model_id, alert_type),
                        AUTO_RESOLVE_OK_WINDOWS,
                    )
                    .await;
            }
            status => {
                if status == MetricStatus::Critical {
                    critical_observed = true;
                }
                if should_emit_alert(status, &recent_statuses) {
                    let severity = if status == MetricStatus::Critical {
                        AlertSeverity::Critical
                    } else {
                        AlertSeverity::Warning
                    };
                    let _ = application_state
                        .alert_repository
                        .submit_with_dedup(
                            AlertSourceKind::Monitoring,
                            Some(record.id.to_string()),
                            Some(model_id),
                            &alert_type,
                            &build_alert_dedup_key(Some(model_id), &alert_type, window_end),
                            severity,
                            &format!("Concept drift on {}", finding.metric_name),
                            &format!(
                                "baseline {:.4} vs live {:.4} ({:.1}% degradation)",
                                finding.baseline_value,
                                finding.live_value,
                                finding.relative_degradation * 100.0
                            ),
                        )
                        .await;
                }
            }
        }
    }

    if critical_observed {
        trigger_retrain_when_enabled(application_state, model_id, RetrainReason::ConceptDrift)
            .await;
    }

    info!("📡 [CONCEPT_SCAN]: Sweep sealed with {} findings.", findings.len());
    Ok(ExecutionVerdict::Completed)
}

/**
 * Auditoría de equidad sobre la fuente etiquetada de registro.
 *
 * El log de predicciones no retiene atributos protegidos; la auditoría
 * re-puntúa el dataset etiquetado de origen del modelo agrupando por el
 * atributo configurado.
 */
#[instrument(skip(application_state, protected_attributes), fields(job_id = %job_identifier, model_id = %model_id))]
pub async fn execute_bias_scan(
    application_state: &AppState,
    job_identifier: Uuid,
    model_id: Uuid,
    protected_attributes: Vec<String>,
) -> Result<ExecutionVerdict, ExecutionFault> {
    let model = application_state
        .model_repository
        .get(model_id)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;
    let feature_set = application_state
        .feature_set_repository
        .get(model.feature_set_id)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;
    let dataset = application_state
        .dataset_repository
        .get(feature_set.dataset_id)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    // Registros crudos (atributo protegido) + matriz del contrato.
    let csv_bytes = application_state
        .artifact_vault
        .get(&dataset.blob_reference)
        .map_err(|fault| ExecutionFault::new(FaultClass::UpstreamUnavailable, fault.to_string()))?;
    let records = parse_transaction_csv(&csv_bytes)
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    let matrix_reference = feature_set.matrix_artifact_reference.clone().ok_or_else(|| {
        ExecutionFault::new(FaultClass::Internal, "feature_set without matrix artifact")
    })?;
    let matrix_bytes = application_state
        .artifact_vault
        .get(&matrix_reference)
        .map_err(|fault| ExecutionFault::new(FaultClass::ArtifactCorrupted, fault.to_string()))?;
    let matrix = FeatureMatrix::from_artifact_bytes(&matrix_bytes)
        .map_err(|fault| ExecutionFault::new(FaultClass::ArtifactCorrupted, fault.to_string()))?;

    if matrix.row_count() != records.len() {
        return Err(ExecutionFault::new(
            FaultClass::Internal,
            "matrix rows misaligned with dataset records",
        ));
    }

    // Aprendiz verificado para el re-scoring de la auditoría.
    let portable_bytes = application_state
        .artifact_vault
        .get(&model.portable_artifact_reference)
        .map_err(|fault| ExecutionFault::new(FaultClass::ArtifactCorrupted, fault.to_string()))?;
    let learner = TrainedLearner::from_portable_bytes(&portable_bytes)
        .map_err(|fault| ExecutionFault::new(FaultClass::ArtifactCorrupted, fault.to_string()))?;

    let window_end = Utc::now();
    let window_start = window_end - Duration::days(SURVEILLANCE_WINDOW_DAYS);
    let mut critical_observed = false;

    for protected_attribute in &protected_attributes {
        if protected_attribute != "customer_segment" {
            warn!(
                "⚖️  [BIAS_SCAN]: Attribute '{}' is not captured by the ingest contract. Skipped.",
                protected_attribute
            );
            continue;
        }

        let observations: Vec<GroupObservation> = records
            .iter()
            .enumerate()
            .filter_map(|(row_index, record)| {
                record.customer_segment.as_ref().map(|segment| GroupObservation {
                    group_label: segment.clone(),
                    predicted_positive: learner.score_row(&matrix.row(row_index))
                        >= model.metrics.decision_threshold,
                    actual_label: Some(record.is_fraud),
                })
            })
            .collect();

        if observations.len() < 30 {
            info!("⚖️  [BIAS_SCAN]: Attribute '{}' underpopulated. Skipped.", protected_attribute);
            continue;
        }

        let findings = match analyze_bias(&observations, &BiasThresholds::default()) {
            Ok(findings) => findings,
            Err(audit_fault) => {
                warn!("⚖️  [BIAS_SCAN]: Audit rejected: {}", audit_fault);
                continue;
            }
        };

        for finding in &findings {
            let recent_statuses = application_state
                .metric_repository
                .recent_bias_statuses(model_id, protected_attribute, &finding.metric_name, 2)
                .await
                .unwrap_or_default();

            let record = BiasMetricRecord {
                id: Uuid::new_v4(),
                model_id,
                protected_attribute: protected_attribute.clone(),
                metric_name: finding.metric_name.clone(),
                value: finding.value,
                status: finding.status,
                window_start,
                window_end,
                computed_at: Utc::now(),
            };
            application_state
                .metric_repository
                .insert_bias(&record)
                .await
                .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

            let alert_type =
                format!("bias:{}:{}", protected_attribute, finding.metric_name);
            match finding.status {
                MetricStatus::Ok => {
                    let _ = application_state
                        .alert_repository
                        .record_ok_window(
                            &format!("{}|{}", model_id, alert_type),
                            AUTO_RESOLVE_OK_WINDOWS,
                        )
                        .await;
                }
                status => {
                    if status == MetricStatus::Critical {
                        critical_observed = true;
                    }
                    if should_emit_alert(status, &recent_statuses) {
                        let severity = if status == MetricStatus::Critical {
                            AlertSeverity::Critical
                        } else {
                            AlertSeverity::Warning
                        };
                        let _ = application_state
                            .alert_repository
                            .submit_with_dedup(
                                AlertSourceKind::Monitoring,
                                Some(record.id.to_string()),
                                Some(model_id),
                                &alert_type,
                                &build_alert_dedup_key(Some(model_id), &alert_type, window_end),
                                severity,
                                &format!(
                                    "Fairness breach on {} ({})",
                                    protected_attribute, finding.metric_name
                                ),
                                &format!("{} = {:.4}", finding.metric_name, finding.value),
                            )
                            .await;
                    }
                }
            }
        }
    }

    if critical_observed {
        trigger_retrain_when_enabled(application_state, model_id, RetrainReason::BiasDetected)
            .await;
    }

    info!("⚖️  [BIAS_SCAN]: Audit sealed.");
    Ok(ExecutionVerdict::Completed)
}

/**
 * Crea la orden C10 en PENDING cuando el flag de auto-retrain está en
 * alto y no existe una orden viva para el modelo.
 */
async fn trigger_retrain_when_enabled(
    application_state: &AppState,
    model_id: Uuid,
    reason: RetrainReason,
) {
    let auto_retrain_enabled = application_state
        .system_repository
        .flag(FLAG_AUTO_RETRAIN_ENABLED, true)
        .await
        .unwrap_or(true);
    if !auto_retrain_enabled {
        return;
    }

    // Deduplicación por modelo: una sola orden viva a la vez.
    let live_orders = application_state.retrain_repository.list_live().await.unwrap_or_default();
    if live_orders.iter().any(|order| order.base_model_id == model_id) {
        return;
    }

    let created = application_state
        .retrain_repository
        .create(model_id, reason, &MergeStrategy::Append, reason.allows_auto_promotion(), 0.01)
        .await;

    match created {
        Ok(retrain_order) => {
            let idempotency_key = format!("retrain:{}", retrain_order.id);
            let _ = application_state
                .job_repository
                .enqueue(
                    &JobPayload::Retrain { retrain_job_id: retrain_order.id },
                    Some(&idempotency_key),
                )
                .await;
            info!(
                "🔄 [MONITORING]: Retrain order {} created for model {} ({:?}).",
                retrain_order.id, model_id, reason
            );
        }
        Err(create_fault) => {
            warn!("⚠️ [MONITORING]: Retrain order rejected: {}", create_fault);
        }
    }
}
