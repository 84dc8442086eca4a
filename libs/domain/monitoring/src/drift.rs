// [libs/domain/monitoring/src/drift.rs]
/*!
 * =================================================================
 * APARATO: DATA DRIFT ANALYZER (V17.0 - TRIPLE METRIC BANDS)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: DERIVA DISTRIBUCIONAL CONTRA REFERENCIA CONGELADA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. BANDED VERDICTS: PSI {<0.10 OK, <0.25 WARNING, >= CRITICAL};
 *    KS {<0.05 OK, <0.15 WARNING, >= CRITICAL}; Chi² por p-valor
 *    {>=0.05 OK, >=0.01 WARNING, < CRITICAL}.
 * 2. DTYPE ROUTING: Continuas -> PSI + KS; discretas/binarias -> Chi²
 *    con suavizado de Laplace.
 * =================================================================
 */

use crate::errors::MonitorError;
use crate::reference::ReferenceSnapshot;
use aegis_core_stats::{chi_square_categorical, kolmogorov_smirnov, population_stability_index};
use aegis_domain_models::MetricStatus;
use tracing::{info, instrument};

/// Observaciones mínimas de la ventana corriente por feature.
const MINIMUM_WINDOW_OBSERVATIONS: usize = 30;

/// Hallazgo individual del barrido de deriva.
#[derive(Debug, Clone, PartialEq)]
pub struct DriftFinding {
    /// Feature vigilada.
    pub feature_name: String,
    /// Estadístico computado ("psi", "ks_statistic", "chi_square_p").
    pub metric_name: String,
    /// Valor observado.
    pub value: f64,
    /// Banda semafórica resultante.
    pub status: MetricStatus,
}

/// Banda del PSI según los umbrales nominales.
pub fn psi_status(psi_value: f64) -> MetricStatus {
    if psi_value < 0.10 {
        MetricStatus::Ok
    } else if psi_value < 0.25 {
        MetricStatus::Warning
    } else {
        MetricStatus::Critical
    }
}

/// Banda del estadístico KS según los umbrales nominales.
pub fn ks_status(ks_statistic: f64) -> MetricStatus {
    if ks_statistic < 0.05 {
        MetricStatus::Ok
    } else if ks_statistic < 0.15 {
        MetricStatus::Warning
    } else {
        MetricStatus::Critical
    }
}

/// Banda del p-valor de Chi² (p bajo = distribución desplazada).
pub fn chi_square_status(p_value: f64) -> MetricStatus {
    if p_value >= 0.05 {
        MetricStatus::Ok
    } else if p_value >= 0.01 {
        MetricStatus::Warning
    } else {
        MetricStatus::Critical
    }
}

/**
 * Barrido completo de deriva: cada feature del contrato se compara con la
 * referencia congelada usando el estadístico de su tipo físico.
 *
 * 'current_window' es columna-mayor alineada al orden del contrato.
 *
 * # Errors:
 * `WindowUnderpopulated` si la ventana no alcanza el piso de observaciones.
 */
#[instrument(skip_all, fields(features = feature_names.len()))]
pub fn analyze_data_drift(
    snapshot: &ReferenceSnapshot,
    feature_names: &[String],
    current_window: &[Vec<f64>],
) -> Result<Vec<DriftFinding>, MonitorError> {
    let window_size = current_window.first().map(|column| column.len()).unwrap_or(0);
    if window_size < MINIMUM_WINDOW_OBSERVATIONS {
        return Err(MonitorError::WindowUnderpopulated(format!(
            "window holds {} observations, floor is {}",
            window_size, MINIMUM_WINDOW_OBSERVATIONS
        )));
    }

    let mut findings = Vec::new();

    for (feature_position, feature_name) in feature_names.iter().enumerate() {
        let reference = snapshot.feature(feature_name)?;
        let current_values = &current_window[feature_position];

        if reference.dtype_label == "continuous" {
            let Some(histogram) = &reference.histogram else {
                // Referencia degenerada: sin soporte de binning, se omite.
                continue;
            };

            let psi_value =
                population_stability_index(&reference.sample, current_values, histogram)?;
            findings.push(DriftFinding {
                feature_name: feature_name.clone(),
                metric_name: "psi".into(),
                value: psi_value,
                status: psi_status(psi_value),
            });

            let ks_outcome = kolmogorov_smirnov(&reference.sample, current_values)?;
            findings.push(DriftFinding {
                feature_name: feature_name.clone(),
                metric_name: "ks_statistic".into(),
                value: ks_outcome.statistic,
                status: ks_status(ks_outcome.statistic),
            });
        } else {
            // Categóricas (binarias/discretas): Chi² sobre niveles textuales.
            let reference_labels: Vec<String> =
                reference.sample.iter().map(|value| format!("{}", value.round())).collect();
            let current_labels: Vec<String> =
                current_values.iter().map(|value| format!("{}", value.round())).collect();

            match chi_square_categorical(&reference_labels, &current_labels) {
                Ok(outcome) => findings.push(DriftFinding {
                    feature_name: feature_name.clone(),
                    metric_name: "chi_square_p".into(),
                    value: outcome.p_value,
                    status: chi_square_status(outcome.p_value),
                }),
                Err(_) => {
                    // Nivel único en ambas ventanas: sin evidencia de deriva.
                    continue;
                }
            }
        }
    }

    let critical_count =
        findings.iter().filter(|finding| finding.status == MetricStatus::Critical).count();
    info!("📡 [DRIFT]: Sweep produced {} findings ({} critical).", findings.len(), critical_count);

    Ok(findings)
}
