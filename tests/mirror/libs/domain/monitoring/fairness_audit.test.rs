// [tests/mirror/libs/domain/monitoring/fairness_audit.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE AUDITORÍA DE EQUIDAD (V2.1 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: PANEL DE CUATRO MÉTRICAS, REGLA 4/5 E HISTÉRESIS
 * =================================================================
 */

use aegis_domain_models::MetricStatus;
use aegis_domain_monitoring::{
    analyze_bias, effective_prior_status, should_emit_alert, BiasFinding, BiasThresholds,
    GroupObservation,
};

/// Universo con tasas de positivos y errores controlados por grupo.
fn forge_observations(
    retail_positive_rate: f64,
    premium_positive_rate: f64,
    group_size: usize,
) -> Vec<GroupObservation> {
    let mut observations = Vec::new();
    for index in 0..group_size {
        let fraction = index as f64 / group_size as f64;
        observations.push(GroupObservation {
            group_label: "retail".into(),
            predicted_positive: fraction < retail_positive_rate,
            actual_label: Some(index % 3 == 0),
        });
        observations.push(GroupObservation {
            group_label: "premium".into(),
            predicted_positive: fraction < premium_positive_rate,
            actual_label: Some(index % 3 == 0),
        });
    }
    observations
}

fn finding_of<'a>(findings: &'a [BiasFinding], metric_name: &str) -> &'a BiasFinding {
    findings
        .iter()
        .find(|finding| finding.metric_name == metric_name)
        .unwrap_or_else(|| panic!("finding '{}' absent", metric_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    /**
     * CERTIFICACIÓN: El panel completo existe y es nominal en equilibrio.
     */
    #[test]
    fn certify_four_metric_panel_balanced() {
        let observations = forge_observations(0.20, 0.20, 300);
        let findings = analyze_bias(&observations, &BiasThresholds::default()).expect("audit");

        assert_eq!(findings.len(), 4);
        for metric_name in [
            "demographic_parity_difference",
            "disparate_impact",
            "equalized_odds_difference",
            "fpr_parity_difference",
        ] {
            assert_eq!(
                finding_of(&findings, metric_name).status,
                MetricStatus::Ok,
                "balanced universe must be nominal on {}",
                metric_name
            );
        }
        assert!((finding_of(&findings, "disparate_impact").value - 1.0).abs() < 1e-9);
    }

    /**
     * CERTIFICACIÓN: La regla de los cuatro quintos (DI < 0.80) dispara
     * CRITICAL junto con la diferencia de paridad.
     */
    #[test]
    fn certify_four_fifths_rule_breach() {
        // retail 40% vs premium 10%: DI = 0.25, paridad = 0.15.
        let observations = forge_observations(0.40, 0.10, 300);
        let findings = analyze_bias(&observations, &BiasThresholds::default()).expect("audit");

        let impact = finding_of(&findings, "disparate_impact");
        assert!(impact.value < 0.80);
        assert_eq!(impact.status, MetricStatus::Critical);

        let parity = finding_of(&findings, "demographic_parity_difference");
        assert!(parity.value > 0.10);
        assert_eq!(parity.status, MetricStatus::Critical);
    }

    /**
     * CERTIFICACIÓN: Umbrales por atributo configurables relajan el veto.
     */
    #[test]
    fn certify_per_attribute_thresholds() {
        let observations = forge_observations(0.40, 0.10, 300);
        let permissive = BiasThresholds {
            parity_difference_max: 0.50,
            disparate_impact_min: 0.10,
            odds_difference_max: 0.50,
            fpr_difference_max: 0.50,
        };
        let findings = analyze_bias(&observations, &permissive).expect("audit");
        assert!(findings.iter().all(|finding| finding.status != MetricStatus::Critical));
    }

    /**
     * CERTIFICACIÓN: Histéresis de dos ventanas sobre el flujo de estados.
     */
    #[test]
    fn certify_hysteresis_discipline() {
        use MetricStatus::{Critical, Ok, Warning};

        // Escalada desde nominal: emisión inmediata.
        assert!(should_emit_alert(Critical, &[Ok, Ok]));
        // Estado sostenido: silencio.
        assert!(!should_emit_alert(Critical, &[Critical, Critical]));
        // Descenso: el previo efectivo retiene el peor de dos ventanas.
        assert_eq!(effective_prior_status(&[Warning, Critical]), Critical);
        assert_eq!(effective_prior_status(&[Ok, Ok]), Ok);
        // Tras dos ventanas nominales el regreso a WARNING re-emite.
        assert!(should_emit_alert(Warning, &[Ok, Ok, Critical]));
    }
}
