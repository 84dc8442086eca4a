// [libs/domain/monitoring/src/bias.rs]
/*!
 * =================================================================
 * APARATO: FAIRNESS AUDIT ANALYZER (V16.3 - FOUR METRIC PANEL)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: DISPARIDAD ENTRE GRUPOS PROTEGIDOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. FOUR METRIC PANEL: diferencia de paridad demográfica, diferencia de
 *    odds igualadas, impacto dispar y diferencia de paridad de FPR.
 * 2. NEAR-BREACH WARNING: Un valor dentro del 80% del margen hacia el
 *    umbral emite WARNING; la violación del umbral emite CRITICAL.
 *
 * # Mathematical Proof (Disparate Impact):
 * DI = min_g P(ŷ=1|g) / max_g P(ŷ=1|g) en [0,1]; DI = 1 es equidad
 * perfecta y el umbral nominal 0.80 codifica la regla de los cuatro
 * quintos.
 * =================================================================
 */

use crate::errors::MonitorError;
use aegis_domain_models::MetricStatus;
use std::collections::BTreeMap;
use tracing::instrument;

/// Observación individual etiquetada por grupo protegido.
#[derive(Debug, Clone)]
pub struct GroupObservation {
    /// Nivel del atributo protegido ("retail", "premium", ...).
    pub group_label: String,
    /// Veredicto binario emitido por el modelo.
    pub predicted_positive: bool,
    /// Etiqueta real cuando está disponible (odds y FPR la exigen).
    pub actual_label: Option<bool>,
}

/// Umbrales por atributo protegido.
#[derive(Debug, Clone, PartialEq)]
pub struct BiasThresholds {
    /// Diferencia máxima de paridad demográfica.
    pub parity_difference_max: f64,
    /// Impacto dispar mínimo aceptable.
    pub disparate_impact_min: f64,
    /// Diferencia máxima de odds igualadas.
    pub odds_difference_max: f64,
    /// Diferencia máxima de paridad de FPR.
    pub fpr_difference_max: f64,
}

impl Default for BiasThresholds {
    fn default() -> Self {
        Self {
            parity_difference_max: 0.10,
            disparate_impact_min: 0.80,
            odds_difference_max: 0.10,
            fpr_difference_max: 0.10,
        }
    }
}

/// Hallazgo individual del panel de equidad.
#[derive(Debug, Clone, PartialEq)]
pub struct BiasFinding {
    /// Métrica del panel.
    pub metric_name: String,
    /// Valor observado.
    pub value: f64,
    /// Banda semafórica resultante.
    pub status: MetricStatus,
}

/// Acumulador por grupo.
#[derive(Default)]
struct GroupAccumulator {
    total: f64,
    predicted_positive: f64,
    labeled_positive: f64,
    labeled_negative: f64,
    true_positive: f64,
    false_positive: f64,
}

/**
 * Audita el panel de cuatro métricas de equidad sobre observaciones
 * agrupadas por el atributo protegido.
 *
 * # Errors:
 * `ProtectedAttributeAbsent` si hay menos de dos grupos observados.
 */
#[instrument(skip_all, fields(observations = observations.len()))]
pub fn analyze_bias(
    observations: &[GroupObservation],
    thresholds: &BiasThresholds,
) -> Result<Vec<BiasFinding>, MonitorError> {
    let mut accumulators: BTreeMap<&str, GroupAccumulator> = BTreeMap::new();
    for observation in observations {
        let accumulator = accumulators.entry(observation.group_label.as_str()).or_default();
        accumulator.total += 1.0;
        if observation.predicted_positive {
            accumulator.predicted_positive += 1.0;
        }
        match observation.actual_label {
            Some(true) => {
                accumulator.labeled_positive += 1.0;
                if observation.predicted_positive {
                    accumulator.true_positive += 1.0;
                }
            }
            Some(false) => {
                accumulator.labeled_negative += 1.0;
                if observation.predicted_positive {
                    accumulator.false_positive += 1.0;
                }
            }
            None => {}
        }
    }

    if accumulators.len() < 2 {
        return Err(MonitorError::ProtectedAttributeAbsent(
            "fairness audit requires at least two observed groups".into(),
        ));
    }

    let overall_positive_rate = observations
        .iter()
        .filter(|observation| observation.predicted_positive)
        .count() as f64
        / observations.len() as f64;

    // --- PARIDAD DEMOGRÁFICA Y RATES POR GRUPO ---
    let mut parity_difference = 0.0_f64;
    let mut minimum_positive_rate = f64::INFINITY;
    let mut maximum_positive_rate = 0.0_f64;

    for accumulator in accumulators.values() {
        let group_positive_rate = accumulator.predicted_positive / accumulator.total;
        parity_difference =
            parity_difference.max((group_positive_rate - overall_positive_rate).abs());
        minimum_positive_rate = minimum_positive_rate.min(group_positive_rate);
        maximum_positive_rate = maximum_positive_rate.max(group_positive_rate);
    }

    let disparate_impact = if maximum_positive_rate > f64::EPSILON {
        minimum_positive_rate / maximum_positive_rate
    } else {
        1.0
    };

    // --- ODDS IGUALADAS Y PARIDAD DE FPR (EXIGEN ETIQUETAS) ---
    let labeled_total: f64 = accumulators
        .values()
        .map(|accumulator| accumulator.labeled_positive + accumulator.labeled_negative)
        .sum();
    let overall_tpr = rate(
        accumulators.values().map(|a| a.true_positive).sum::<f64>(),
        accumulators.values().map(|a| a.labeled_positive).sum::<f64>(),
    );
    let overall_fpr = rate(
        accumulators.values().map(|a| a.false_positive).sum::<f64>(),
        accumulators.values().map(|a| a.labeled_negative).sum::<f64>(),
    );

    let mut odds_difference = 0.0_f64;
    let mut fpr_difference = 0.0_f64;
    if labeled_total > 0.0 {
        for accumulator in accumulators.values() {
            if accumulator.labeled_positive > 0.0 {
                let group_tpr = accumulator.true_positive / accumulator.labeled_positive;
                odds_difference = odds_difference.max((group_tpr - overall_tpr).abs());
            }
            if accumulator.labeled_negative > 0.0 {
                let group_fpr = accumulator.false_positive / accumulator.labeled_negative;
                odds_difference = odds_difference.max((group_fpr - overall_fpr).abs());
                fpr_difference = fpr_difference.max((group_fpr - overall_fpr).abs());
            }
        }
    }

    Ok(vec![
        BiasFinding {
            metric_name: "demographic_parity_difference".into(),
            value: parity_difference,
            status: ceiling_status(parity_difference, thresholds.parity_difference_max),
        },
        BiasFinding {
            metric_name: "disparate_impact".into(),
            value: disparate_impact,
            status: floor_status(disparate_impact, thresholds.disparate_impact_min),
        },
        BiasFinding {
            metric_name: "equalized_odds_difference".into(),
            value: odds_difference,
            status: ceiling_status(odds_difference, thresholds.odds_difference_max),
        },
        BiasFinding {
            metric_name: "fpr_parity_difference".into(),
            value: fpr_difference,
            status: ceiling_status(fpr_difference, thresholds.fpr_difference_max),
        },
    ])
}

/// Tasa protegida contra denominador nulo.
fn rate(numerator: f64, denominator: f64) -> f64 {
    if denominator > f64::EPSILON {
        numerator / denominator
    } else {
        0.0
    }
}

/// Banda para métricas acotadas por techo (menor es mejor).
fn ceiling_status(value: f64, ceiling: f64) -> MetricStatus {
    if value > ceiling {
        MetricStatus::Critical
    } else if value > ceiling * 0.8 {
        MetricStatus::Warning
    } else {
        MetricStatus::Ok
    }
}

/// Banda para métricas acotadas por piso (mayor es mejor).
fn floor_status(value: f64, floor: f64) -> MetricStatus {
    if value < floor {
        MetricStatus::Critical
    } else if value < floor + (1.0 - floor) * 0.2 {
        MetricStatus::Warning
    } else {
        MetricStatus::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forge_observations(
        group_a_positive: usize,
        group_b_positive: usize,
        group_size: usize,
    ) -> Vec<GroupObservation> {
        let mut observations = Vec::new();
        for index in 0..group_size {
            observations.push(GroupObservation {
                group_label: "retail".into(),
                predicted_positive: index < group_a_positive,
                actual_label: Some(index % 2 == 0),
            });
            observations.push(GroupObservation {
                group_label: "premium".into(),
                predicted_positive: index < group_b_positive,
                actual_label: Some(index % 2 == 0),
            });
        }
        observations
    }

    #[test]
    fn certify_balanced_groups_are_nominal() {
        let observations = forge_observations(20, 20, 100);
        let findings = analyze_bias(&observations, &BiasThresholds::default()).expect("audit");
        let parity = findings
            .iter()
            .find(|finding| finding.metric_name == "demographic_parity_difference")
            .expect("parity");
        assert_eq!(parity.status, MetricStatus::Ok);
        let impact = findings
            .iter()
            .find(|finding| finding.metric_name == "disparate_impact")
            .expect("impact");
        assert!((impact.value - 1.0).abs() < 1e-9);
    }

    #[test]
    fn certify_skewed_groups_breach_thresholds() {
        // retail: 40% positivos; premium: 5% positivos.
        let observations = forge_observations(40, 5, 100);
        let findings = analyze_bias(&observations, &BiasThresholds::default()).expect("audit");

        let parity = findings
            .iter()
            .find(|finding| finding.metric_name == "demographic_parity_difference")
            .expect("parity");
        assert_eq!(parity.status, MetricStatus::Critical);

        let impact = findings
            .iter()
            .find(|finding| finding.metric_name == "disparate_impact")
            .expect("impact");
        assert!(impact.value < 0.80);
        assert_eq!(impact.status, MetricStatus::Critical);
    }

    #[test]
    fn certify_single_group_rejected() {
        let observations = vec![GroupObservation {
            group_label: "retail".into(),
            predicted_positive: true,
            actual_label: None,
        }];
        assert!(matches!(
            analyze_bias(&observations, &BiasThresholds::default()),
            Err(MonitorError::ProtectedAttributeAbsent(_))
        ));
    }
}
