// [tests/mirror/libs/core/learners/gradient_boost_learning.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL BOOSTER DE GRADIENTE (V2.2 - MASTER)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-MIRROR
 * RESPONSABILIDAD: SEPARABILIDAD, POLÍTICAS DE CRECIMIENTO Y CODECS
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use aegis_core_learners::gradient_boost::{GradientBoostModel, GradientBoostParameters};
    use aegis_core_learners::trees::TreeGrowthPolicy;
    use aegis_core_learners::{FeatureColumn, FeatureMatrix, ScoringModel, TrainedLearner};

    fn forge_ring_matrix() -> FeatureMatrix {
        // Problema no lineal: fraude en la banda |x| grande de dos features.
        let mut x_axis = Vec::new();
        let mut y_axis = Vec::new();
        let mut labels = Vec::new();
        for index in 0..600 {
            let angle = index as f64 * 0.104_719; // ~6 grados
            let radius = if index % 3 == 0 { 4.0 } else { 1.0 };
            x_axis.push(radius * angle.cos());
            y_axis.push(radius * angle.sin());
            labels.push(radius > 2.0);
        }
        FeatureMatrix {
            columns: vec![
                FeatureColumn { name: "axis_x".into(), dtype_label: "continuous".into(), values: x_axis },
                FeatureColumn { name: "axis_y".into(), dtype_label: "continuous".into(), values: y_axis },
            ],
            labels: Some(labels),
        }
    }

    fn nominal_parameters(policy: TreeGrowthPolicy) -> GradientBoostParameters {
        GradientBoostParameters {
            n_estimators: 40,
            learning_rate: 0.25,
            max_depth: 4,
            max_leaves: 16,
            scale_pos_weight: 1.0,
            min_samples_leaf: 2,
            lambda_regularization: 1.0,
            growth_policy: policy,
        }
    }

    /**
     * CERTIFICACIÓN: Ambas políticas de crecimiento separan el anillo.
     */
    #[test]
    fn certify_both_growth_policies_learn_nonlinear_boundary() {
        let matrix = forge_ring_matrix();

        for policy in [TreeGrowthPolicy::LevelWise, TreeGrowthPolicy::LeafWise] {
            let model = GradientBoostModel::fit_with_progress(
                &matrix,
                &nominal_parameters(policy),
                None,
                |_| true,
            )
            .expect("fit")
            .expect("not cancelled");

            // Centro (legítimo) vs periferia (fraude).
            assert!(model.score_row(&[0.5, 0.5]) < 0.35, "policy {:?}", policy);
            assert!(model.score_row(&[3.8, 0.5]) > 0.65, "policy {:?}", policy);
        }
    }

    /**
     * CERTIFICACIÓN: Roundtrip nativo y portable del aprendiz sellado.
     */
    #[test]
    fn certify_dual_codec_roundtrip() {
        let matrix = forge_ring_matrix();
        let model = GradientBoostModel::fit_with_progress(
            &matrix,
            &nominal_parameters(TreeGrowthPolicy::LevelWise),
            None,
            |_| true,
        )
        .expect("fit")
        .expect("not cancelled");
        let sealed = TrainedLearner::GradientBoost(model);

        let native_bytes = sealed.to_native_bytes().expect("native");
        let portable_bytes = sealed.to_portable_bytes().expect("portable");

        let from_native = TrainedLearner::from_native_bytes(&native_bytes).expect("decode native");
        let from_portable =
            TrainedLearner::from_portable_bytes(&portable_bytes).expect("decode portable");

        let probe_row = [3.5, -1.0];
        assert_eq!(sealed.score_row(&probe_row), from_native.score_row(&probe_row));
        assert_eq!(sealed.score_row(&probe_row), from_portable.score_row(&probe_row));
    }

    /**
     * CERTIFICACIÓN: El peso de clase positiva empuja el recall.
     */
    #[test]
    fn certify_scale_pos_weight_raises_positive_scores() {
        let matrix = forge_ring_matrix();

        let neutral = GradientBoostModel::fit_with_progress(
            &matrix,
            &nominal_parameters(TreeGrowthPolicy::LevelWise),
            None,
            |_| true,
        )
        .expect("fit")
        .expect("not cancelled");

        let mut weighted_parameters = nominal_parameters(TreeGrowthPolicy::LevelWise);
        weighted_parameters.scale_pos_weight = 10.0;
        let weighted = GradientBoostModel::fit_with_progress(
            &matrix,
            &weighted_parameters,
            None,
            |_| true,
        )
        .expect("fit")
        .expect("not cancelled");

        // Punto fronterizo: la ponderación positiva eleva el score.
        let boundary_row = [2.0, 0.0];
        assert!(weighted.score_row(&boundary_row) >= neutral.score_row(&boundary_row));
    }
}
