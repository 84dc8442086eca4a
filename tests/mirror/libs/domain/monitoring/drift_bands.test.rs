// [tests/mirror/libs/domain/monitoring/drift_bands.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE BANDAS DE DERIVA (V2.2 - SCENARIO S5)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: BANDAS PSI/KS, DERIVA DE CONCEPTO Y REFERENCIA FIJA
 * =================================================================
 */

use aegis_core_learners::{FeatureColumn, FeatureMatrix};
use aegis_domain_models::{MetricStatus, ModelMetrics};
use aegis_domain_monitoring::{
    analyze_concept_drift, analyze_data_drift, ReferenceSnapshot,
};

/// Pseudo-normal determinista para el corpus de referencia.
fn forge_pseudo_normal(sample_size: usize, mean_shift: f64) -> Vec<f64> {
    (0..sample_size)
        .map(|index| {
            let mut accumulator = 0.0_f64;
            for lane in 1..=12u64 {
                let raw = (index as u64)
                    .wrapping_mul(2_862_933_555_777_941_757)
                    .wrapping_add(lane.wrapping_mul(3_037_000_493));
                accumulator += (raw >> 11) as f64 / (1u64 << 53) as f64;
            }
            accumulator - 6.0 + mean_shift
        })
        .collect()
}

fn forge_snapshot() -> (ReferenceSnapshot, Vec<String>) {
    let matrix = FeatureMatrix {
        columns: vec![FeatureColumn {
            name: "amount_zscore".into(),
            dtype_label: "continuous".into(),
            values: forge_pseudo_normal(5000, 0.0),
        }],
        labels: None,
    };
    (ReferenceSnapshot::freeze_from_matrix(&matrix), vec!["amount_zscore".into()])
}

#[cfg(test)]
mod tests {
    use super::*;

    /**
     * CERTIFICACIÓN (ESCENARIO S5): El desplazamiento de +3σ sobre
     * amount_zscore produce PSI >= 0.25 con banda CRITICAL.
     */
    #[test]
    fn certify_three_sigma_shift_breaches_critical() {
        let (snapshot, names) = forge_snapshot();
        let shifted_window = vec![forge_pseudo_normal(4000, 3.0)];

        let findings = analyze_data_drift(&snapshot, &names, &shifted_window).expect("drift");

        let psi = findings.iter().find(|finding| finding.metric_name == "psi").expect("psi");
        assert!(psi.value >= 0.25, "psi {} must breach the critical band", psi.value);
        assert_eq!(psi.status, MetricStatus::Critical);

        let ks = findings
            .iter()
            .find(|finding| finding.metric_name == "ks_statistic")
            .expect("ks");
        assert_eq!(ks.status, MetricStatus::Critical);
    }

    /**
     * CERTIFICACIÓN: La banda WARNING existe entre los umbrales (un
     * desplazamiento leve no escala directo a CRITICAL).
     */
    #[test]
    fn certify_graduated_bands() {
        let (snapshot, names) = forge_snapshot();

        let stable = analyze_data_drift(&snapshot, &names, &vec![forge_pseudo_normal(4000, 0.0)])
            .expect("drift");
        assert!(stable.iter().all(|finding| finding.status == MetricStatus::Ok));

        let mild = analyze_data_drift(&snapshot, &names, &vec![forge_pseudo_normal(4000, 0.35)])
            .expect("drift");
        let mild_psi = mild.iter().find(|finding| finding.metric_name == "psi").expect("psi");
        assert!(
            mild_psi.status == MetricStatus::Warning || mild_psi.status == MetricStatus::Critical,
            "a visible shift cannot stay nominal (psi {})",
            mild_psi.value
        );

        let severe = analyze_data_drift(&snapshot, &names, &vec![forge_pseudo_normal(4000, 3.0)])
            .expect("drift");
        let severe_psi =
            severe.iter().find(|finding| finding.metric_name == "psi").expect("psi");
        assert!(severe_psi.value > mild_psi.value);
    }

    /**
     * CERTIFICACIÓN: Deriva de concepto con los umbrales 5% / 10%.
     */
    #[test]
    fn certify_concept_degradation_thresholds() {
        let baseline = ModelMetrics {
            precision: 0.90,
            recall: 0.85,
            f1_score: 0.875,
            auc_roc: 0.95,
            false_positive_rate: 0.02,
            decision_threshold: 0.5,
        };

        // Degradación del 7% en recall: WARNING exacto en banda.
        let mut warning_live = baseline.clone();
        warning_live.recall = baseline.recall * 0.93;
        let warning_findings = analyze_concept_drift(&baseline, &warning_live);
        let recall_finding = warning_findings
            .iter()
            .find(|finding| finding.metric_name == "recall")
            .expect("recall");
        assert_eq!(recall_finding.status, MetricStatus::Warning);

        // Degradación del 15% en AUC: CRITICAL.
        let mut critical_live = baseline.clone();
        critical_live.auc_roc = baseline.auc_roc * 0.85;
        let critical_findings = analyze_concept_drift(&baseline, &critical_live);
        let auc_finding = critical_findings
            .iter()
            .find(|finding| finding.metric_name == "auc_roc")
            .expect("auc");
        assert_eq!(auc_finding.status, MetricStatus::Critical);
        assert!((auc_finding.relative_degradation - 0.15).abs() < 1e-9);
    }
}
