// [libs/domain/monitoring/src/concept.rs]
/*!
 * =================================================================
 * APARATO: CONCEPT DRIFT ANALYZER (V16.2 - BASELINE DEGRADATION)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: DEGRADACIÓN RELATIVA CONTRA MÉTRICAS DE ENTRENAMIENTO
 *
 * # Mathematical Proof (Relative Degradation):
 * Para métricas crecientes-mejores, la degradación es
 * d = (m_base − m_live) / m_base; d >= 0.05 -> WARNING, d >= 0.10 ->
 * CRITICAL. Para la tasa de falsos positivos (decreciente-mejor) la
 * degradación se mide con el signo invertido.
 * =================================================================
 */

use aegis_domain_models::{MetricStatus, ModelMetrics};
use tracing::instrument;

/// Umbral de degradación relativa para WARNING.
const WARNING_DEGRADATION: f64 = 0.05;
/// Umbral de degradación relativa para CRITICAL.
const CRITICAL_DEGRADATION: f64 = 0.10;

/// Hallazgo individual de deriva de concepto.
#[derive(Debug, Clone, PartialEq)]
pub struct ConceptFinding {
    /// Métrica vigilada ("precision", "recall", "f1_score", "auc_roc", "fpr").
    pub metric_name: String,
    /// Valor de entrenamiento sellado.
    pub baseline_value: f64,
    /// Valor observado sobre etiquetas frescas.
    pub live_value: f64,
    /// Degradación relativa observada.
    pub relative_degradation: f64,
    /// Banda semafórica resultante.
    pub status: MetricStatus,
}

/// Banda de degradación relativa.
fn degradation_status(relative_degradation: f64) -> MetricStatus {
    if relative_degradation >= CRITICAL_DEGRADATION {
        MetricStatus::Critical
    } else if relative_degradation >= WARNING_DEGRADATION {
        MetricStatus::Warning
    } else {
        MetricStatus::Ok
    }
}

/**
 * Compara las métricas vivas (recomputadas sobre predicciones con
 * etiqueta real) contra las métricas selladas del entrenamiento.
 */
#[instrument(skip_all)]
pub fn analyze_concept_drift(
    baseline_metrics: &ModelMetrics,
    live_metrics: &ModelMetrics,
) -> Vec<ConceptFinding> {
    let ascending_metrics = [
        ("precision", baseline_metrics.precision, live_metrics.precision),
        ("recall", baseline_metrics.recall, live_metrics.recall),
        ("f1_score", baseline_metrics.f1_score, live_metrics.f1_score),
        ("auc_roc", baseline_metrics.auc_roc, live_metrics.auc_roc),
    ];

    let mut findings: Vec<ConceptFinding> = ascending_metrics
        .into_iter()
        .filter(|(_, baseline_value, _)| *baseline_value > f64::EPSILON)
        .map(|(metric_name, baseline_value, live_value)| {
            let relative_degradation =
                ((baseline_value - live_value) / baseline_value).max(0.0);
            ConceptFinding {
                metric_name: metric_name.to_string(),
                baseline_value,
                live_value,
                relative_degradation,
                status: degradation_status(relative_degradation),
            }
        })
        .collect();

    // FPR: decreciente-mejor; la degradación es el crecimiento relativo.
    if baseline_metrics.false_positive_rate > f64::EPSILON {
        let baseline_value = baseline_metrics.false_positive_rate;
        let live_value = live_metrics.false_positive_rate;
        let relative_degradation = ((live_value - baseline_value) / baseline_value).max(0.0);
        findings.push(ConceptFinding {
            metric_name: "false_positive_rate".into(),
            baseline_value,
            live_value,
            relative_degradation,
            status: degradation_status(relative_degradation),
        });
    }

    findings
}
