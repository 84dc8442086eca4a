// [tests/mirror/libs/domain/serving/scoring_contract.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL CONTRATO DE SCORING (V2.2 - HOT SWAP)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: NORMALIZACIÓN, DETERMINISMO, SWAP Y EXPLICACIÓN
 * =================================================================
 */

use aegis_core_learners::gradient_boost::{GradientBoostModel, GradientBoostParameters};
use aegis_core_learners::trees::TreeGrowthPolicy;
use aegis_core_learners::{FeatureColumn, FeatureMatrix, TrainedLearner};
use aegis_domain_serving::{
    load_active_model, ActiveModel, FeatureResolver, PredictRequest, ScoringEngine, ServingError,
};
use aegis_infra_feature_cache::TtlFeatureCache;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::Duration;
use uuid::Uuid;

/// Forja un modelo activo entrenado sobre una frontera en 'amount'.
fn forge_active_model(feature_names: Vec<String>) -> ActiveModel {
    let row_count = 400usize;
    let columns: Vec<FeatureColumn> = feature_names
        .iter()
        .enumerate()
        .map(|(column_index, name)| FeatureColumn {
            name: name.clone(),
            dtype_label: "continuous".into(),
            values: (0..row_count)
                .map(|row| {
                    let jitter = (row as f64 * 0.618).fract() * 0.2;
                    if column_index == 0 {
                        if row % 2 == 0 { 6.0 + jitter } else { jitter }
                    } else {
                        jitter
                    }
                })
                .collect(),
        })
        .collect();

    let matrix = FeatureMatrix {
        columns,
        labels: Some((0..row_count).map(|row| row % 2 == 0).collect()),
    };

    let booster = GradientBoostModel::fit_with_progress(
        &matrix,
        &GradientBoostParameters {
            n_estimators: 15,
            learning_rate: 0.3,
            max_depth: 3,
            max_leaves: 8,
            scale_pos_weight: 1.0,
            min_samples_leaf: 2,
            lambda_regularization: 1.0,
            growth_policy: TreeGrowthPolicy::LevelWise,
        },
        None,
        |_| true,
    )
    .expect("fit")
    .expect("not cancelled");

    let portable = TrainedLearner::GradientBoost(booster).to_portable_bytes().expect("portable");
    let checksum = hex::encode(Sha256::digest(&portable));
    load_active_model(
        Uuid::new_v4(),
        "contract-hash",
        &feature_names,
        &portable,
        &checksum,
        vec![0.0; feature_names.len()],
        0.5,
    )
    .expect("load")
}

fn forge_engine() -> ScoringEngine {
    ScoringEngine::new(FeatureResolver::new(
        TtlFeatureCache::new(128, Duration::from_secs(60)),
        None,
        None,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    /**
     * CERTIFICACIÓN (ESCENARIO S4): un lote de solicitudes idénticas
     * produce scores idénticos, todos registrados con el mismo modelo.
     */
    #[test]
    fn certify_batch_determinism_same_model() {
        let engine = forge_engine();
        let model = forge_active_model(vec!["amount".into(), "hour_of_day".into()]);
        let model_id = model.model_id;
        engine.activate_model(model);

        let request = PredictRequest {
            transaction_id: Some("txn-000042".into()),
            user_id: None,
            feature_values: HashMap::from([
                ("amount".to_string(), 6.1),
                ("hour_of_day".to_string(), 0.1),
            ]),
            explain: false,
        };

        let batch: Vec<PredictRequest> = std::iter::repeat(request).take(200).collect();
        let outcomes = engine.batch_predict(&batch);

        let mut observed_scores = Vec::new();
        for outcome in outcomes {
            let scored = outcome.expect("predict");
            assert_eq!(scored.response.model_id, model_id);
            assert!(scored.response.latency_milliseconds < 100.0);
            observed_scores.push(scored.response.score);
        }
        assert!(observed_scores.windows(2).all(|pair| pair[0] == pair[1]));
        assert_eq!(engine.predictions_served_total(), 200);
    }

    /**
     * CERTIFICACIÓN: Sin modelo caliente el contrato reporta
     * ModelUnavailable; jamás un error crudo de almacenamiento.
     */
    #[test]
    fn certify_dark_serving_plane() {
        let engine = forge_engine();
        let request = PredictRequest {
            transaction_id: None,
            user_id: None,
            feature_values: HashMap::new(),
            explain: false,
        };
        assert!(matches!(engine.predict(&request), Err(ServingError::ModelUnavailable)));
    }

    /**
     * CERTIFICACIÓN: La explicación entrega top-k firmado por signo y la
     * feature dominante coincide con la señal entrenada.
     */
    #[test]
    fn certify_explanation_top_k() {
        let engine = forge_engine();
        engine.activate_model(forge_active_model(vec!["amount".into(), "noise".into()]));

        let request = PredictRequest {
            transaction_id: None,
            user_id: None,
            feature_values: HashMap::from([
                ("amount".to_string(), 6.5),
                ("noise".to_string(), 0.1),
            ]),
            explain: true,
        };

        let outcome = engine.predict(&request).expect("predict");
        let explanation = outcome.response.explanation.expect("explanation requested");

        assert!(!explanation.top_positive.is_empty());
        assert_eq!(explanation.top_positive[0].feature_name, "amount");
        assert!(explanation.top_positive[0].contribution > 0.0);
        for entry in &explanation.top_negative {
            assert!(entry.contribution < 0.0);
        }
    }

    /**
     * CERTIFICACIÓN: El swap caliente re-dirige las solicitudes nuevas
     * al modelo recién coronado sin ventanas intermedias.
     */
    #[test]
    fn certify_hot_swap_rebinds_new_requests() {
        let engine = forge_engine();
        let request = PredictRequest {
            transaction_id: None,
            user_id: None,
            feature_values: HashMap::from([("amount".to_string(), 6.0)]),
            explain: false,
        };

        let first_model = forge_active_model(vec!["amount".into()]);
        let first_id = first_model.model_id;
        engine.activate_model(first_model);
        assert_eq!(engine.predict(&request).expect("predict").response.model_id, first_id);

        let second_model = forge_active_model(vec!["amount".into()]);
        let second_id = second_model.model_id;
        engine.activate_model(second_model);
        assert_eq!(engine.predict(&request).expect("predict").response.model_id, second_id);

        // Retiro explícito: el plano queda oscuro.
        engine.deactivate_model();
        assert!(matches!(engine.predict(&request), Err(ServingError::ModelUnavailable)));
    }
}
