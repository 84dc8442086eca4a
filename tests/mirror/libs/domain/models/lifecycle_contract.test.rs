// [tests/mirror/libs/domain/models/lifecycle_contract.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE CONTRATOS DE CICLO DE VIDA (V2.0 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: AUDITORÍA DEL RETÍCULO DE ESTADOS DE MODELOS
 *
 * # Mathematical Proof (Lattice Soundness):
 * El test enumera el producto cartesiano de etapas y certifica que el
 * conjunto de transiciones legales coincide EXACTAMENTE con el retículo
 * declarado, sin aristas fantasma ni reversas ilegales.
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use aegis_domain_models::model::{Baseline, BaselineOperator, ModelMetrics, ModelStage};
    use aegis_domain_models::retrain::{RetrainReason, RetrainState};
    use uuid::Uuid;

    /**
     * CERTIFICACIÓN: Retículo completo de transiciones de modelo.
     */
    #[test]
    fn certify_model_stage_lattice() {
        use ModelStage::{Archived, Production, Staging, Trained};

        let legal_edges = [
            (Trained, Staging),
            (Staging, Production),
            (Staging, Trained),
            (Production, Archived),
            (Staging, Archived),
            (Trained, Archived),
            (Archived, Production),
        ];

        for source in [Trained, Staging, Production, Archived] {
            for target in [Trained, Staging, Production, Archived] {
                let expected = legal_edges.contains(&(source, target));
                assert_eq!(
                    source.can_transition_to(target),
                    expected,
                    "lattice divergence on {:?} -> {:?}",
                    source,
                    target
                );
            }
        }
    }

    /**
     * CERTIFICACIÓN: Los estados absorbentes de la máquina C10.
     */
    #[test]
    fn certify_retrain_terminal_states() {
        assert!(RetrainState::Promoted.is_terminal());
        assert!(RetrainState::Rejected.is_terminal());
        assert!(RetrainState::Failed.is_terminal());
        assert!(!RetrainState::Pending.is_terminal());
        assert!(!RetrainState::Comparison.is_terminal());
    }

    /**
     * CERTIFICACIÓN: El veto de auto-promoción por sesgo.
     */
    #[test]
    fn certify_bias_vetoes_auto_promotion() {
        assert!(!RetrainReason::BiasDetected.allows_auto_promotion());
        assert!(RetrainReason::DataDrift.allows_auto_promotion());
        assert!(RetrainReason::ConceptDrift.allows_auto_promotion());
        assert!(RetrainReason::Manual.allows_auto_promotion());
    }

    /**
     * CERTIFICACIÓN: Evaluación de baselines sobre el set de métricas.
     */
    #[test]
    fn certify_baseline_evaluation() {
        let metrics = ModelMetrics {
            precision: 0.92,
            recall: 0.86,
            f1_score: 0.89,
            auc_roc: 0.96,
            false_positive_rate: 0.015,
            decision_threshold: 0.5,
        };

        let satisfied = Baseline {
            model_id: Uuid::new_v4(),
            metric_name: "precision".into(),
            threshold: 0.90,
            operator: BaselineOperator::GreaterOrEqual,
        };
        assert!(satisfied.is_met_by(&metrics));

        let violated = Baseline {
            model_id: Uuid::new_v4(),
            metric_name: "recall".into(),
            threshold: 0.90,
            operator: BaselineOperator::GreaterOrEqual,
        };
        assert!(!violated.is_met_by(&metrics));

        let ceiling = Baseline {
            model_id: Uuid::new_v4(),
            metric_name: "false_positive_rate".into(),
            threshold: 0.02,
            operator: BaselineOperator::LessOrEqual,
        };
        assert!(ceiling.is_met_by(&metrics));

        // Métrica desconocida: el baseline jamás se da por satisfecho.
        let unknown = Baseline {
            model_id: Uuid::new_v4(),
            metric_name: "nonexistent".into(),
            threshold: 0.1,
            operator: BaselineOperator::GreaterOrEqual,
        };
        assert!(!unknown.is_met_by(&metrics));
    }
}
