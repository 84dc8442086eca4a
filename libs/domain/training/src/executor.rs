// [libs/domain/training/src/executor.rs]
/*!
 * =================================================================
 * APARATO: TRAINING EXECUTOR MASTER (V19.0 - POLYMORPHIC DISPATCH)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: ORQUESTACIÓN POLIMÓRFICA DEL ENTRENAMIENTO C4
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SCHEMA SHIELD FIRST: La matriz cargada se rechaza si su digest no
 *    coincide con el contrato del FeatureSet, antes de tocar el split.
 * 2. LEAKAGE DISCIPLINE: La estrategia de desbalance opera EXCLUSIVAMENTE
 *    sobre el split de entrenamiento.
 * 3. MONOTONIC PROGRESS: Las fronteras de etapa emiten progreso monótono
 *    en [0,1] con etiqueta de etapa; la cancelación se sondea en cada
 *    frontera y abandona dentro de la etapa corriente.
 * 4. DUAL SERIALIZATION: Forma nativa (bincode) + portable (JSON) con
 *    SHA-256 sellado sobre la portable.
 *
 * # Mathematical Proof (Contract Integrity):
 * feature_names del modelo es una copia del orden seleccionado del
 * FeatureSet verificado por digest, por lo que el invariante de
 * consistencia entrenamiento-servicio se cumple por construcción.
 * =================================================================
 */

use crate::errors::TrainingError;
use crate::evaluation::evaluate_scores;
use crate::split::stratified_split;
use aegis_core_learners::explainer::ContributionExplainer;
use aegis_core_learners::gradient_boost::{GradientBoostModel, GradientBoostParameters};
use aegis_core_learners::isolation_forest::{IsolationForestModel, IsolationForestParameters};
use aegis_core_learners::neural::{CompactNeuralModel, CompactNeuralParameters};
use aegis_core_learners::random_forest::{RandomForestModel, RandomForestParameters};
use aegis_core_learners::sampling::{
    apply_class_weights, synthetic_minority_oversample, undersample_majority,
};
use aegis_core_learners::seeding::derive_seed_from_identifier;
use aegis_core_learners::trees::TreeGrowthPolicy;
use aegis_core_learners::{FeatureMatrix, ScoringModel, TrainedLearner};
use aegis_domain_models::feature::{compute_schema_hash, FeatureSet};
use aegis_domain_models::{AlgorithmKind, FeatureWeight, ImbalanceStrategy, ModelMetrics};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use tracing::{info, instrument};
use uuid::Uuid;

use self::selection_dtype_bridge::dtype_of_column_label;

/// Solicitud tipada de entrenamiento.
#[derive(Debug, Clone)]
pub struct TrainingRequest {
    /// Orden de trabajo propietaria (ancla de la semilla).
    pub job_id: Uuid,
    /// Algoritmo solicitado.
    pub algorithm: AlgorithmKind,
    /// Mapa de hiperparámetros crudo.
    pub hyperparameters: BTreeMap<String, serde_json::Value>,
    /// Estrategia de desbalance sobre el split de entrenamiento.
    pub imbalance_strategy: ImbalanceStrategy,
    /// Umbral de decisión de las métricas dependientes de corte.
    pub decision_threshold: f64,
    /// Fracción de entrenamiento del split estratificado.
    pub train_fraction: f64,
}

/// Artefactos sellados de un entrenamiento exitoso.
pub struct TrainedArtifacts {
    /// Aprendiz entrenado.
    pub learner: TrainedLearner,
    /// Métricas sobre el split de prueba.
    pub metrics: ModelMetrics,
    /// Importancia global por feature (orden del contrato).
    pub feature_importance: Vec<FeatureWeight>,
    /// Explicador local anclado a medias de entrenamiento.
    pub explainer: ContributionExplainer,
    /// Forma nativa serializada (bincode).
    pub native_bytes: Vec<u8>,
    /// Forma portable serializada (JSON canónico).
    pub portable_bytes: Vec<u8>,
    /// SHA-256 hexadecimal de la forma portable.
    pub checksum_hexadecimal: String,
}

/// Orquestador central del entrenamiento C4.
pub struct TrainingExecutor;

impl TrainingExecutor {
    /**
     * Ejecuta la secuencia completa de entrenamiento.
     *
     * Retorna None ante cancelación cooperativa observada en frontera.
     *
     * # Errors:
     * - `FeatureSchemaMismatch` si la matriz no honra el contrato.
     * - `AlgorithmRejected` ante hiperparámetros fuera de dominio.
     * - `Internal` ante colapsos del núcleo de aprendizaje.
     */
    #[instrument(
        skip_all,
        fields(
            job_id = %request.job_id,
            algorithm = request.algorithm.canonical_tag(),
            rows = matrix.row_count()
        )
    )]
    pub fn execute<ProgressFn, CancelFn>(
        matrix: &FeatureMatrix,
        feature_set: &FeatureSet,
        request: &TrainingRequest,
        mut on_progress: ProgressFn,
        mut is_cancelled: CancelFn,
    ) -> Result<Option<TrainedArtifacts>, TrainingError>
    where
        ProgressFn: FnMut(f64, &str),
        CancelFn: FnMut() -> bool,
    {
        // --- ETAPA 1: VERIFICACIÓN DEL CONTRATO ---
        on_progress(0.05, "schema_verification");
        let observed_schema: Vec<_> = matrix
            .columns
            .iter()
            .map(|column| (column.name.clone(), dtype_of_column_label(&column.dtype_label)))
            .collect();
        let observed_hash = compute_schema_hash(&observed_schema);
        if observed_hash != feature_set.schema_hash {
            return Err(TrainingError::FeatureSchemaMismatch {
                expected: feature_set.schema_hash.clone(),
                observed: observed_hash,
            });
        }
        if is_cancelled() {
            return Ok(None);
        }

        // --- ETAPA 2: SPLIT ESTRATIFICADO SEMBRADO ---
        on_progress(0.10, "stratified_split");
        let training_seed = derive_seed_from_identifier(request.job_id);
        let (raw_training_split, test_split) =
            stratified_split(matrix, request.train_fraction, training_seed)?;
        if is_cancelled() {
            return Ok(None);
        }

        // --- ETAPA 3: ESTRATEGIA DE DESBALANCE (SOLO ENTRENAMIENTO) ---
        on_progress(0.15, "imbalance_strategy");
        let (training_split, class_sample_weights) = match request.imbalance_strategy {
            ImbalanceStrategy::ClassWeight => {
                let labels = raw_training_split
                    .labels
                    .as_ref()
                    .ok_or_else(|| TrainingError::Internal("training labels vanished".into()))?;
                let weights = apply_class_weights(labels)?;
                (raw_training_split, Some(weights))
            }
            ImbalanceStrategy::Smote => {
                (synthetic_minority_oversample(&raw_training_split, training_seed)?, None)
            }
            ImbalanceStrategy::Undersample => {
                (undersample_majority(&raw_training_split, training_seed)?, None)
            }
        };
        if is_cancelled() {
            return Ok(None);
        }

        // --- ETAPA 4: AJUSTE CON PRESUPUESTO ACOTADO ---
        let fit_outcome = Self::dispatch_fit(
            &training_split,
            request,
            training_seed,
            class_sample_weights.as_deref(),
            &mut on_progress,
            &mut is_cancelled,
        )?;
        let Some(learner) = fit_outcome else {
            return Ok(None);
        };

        // --- ETAPA 5: EVALUACIÓN SOBRE EL SPLIT DE PRUEBA ---
        on_progress(0.88, "evaluation");
        let test_labels = test_split
            .labels
            .as_ref()
            .ok_or_else(|| TrainingError::Internal("test labels vanished".into()))?;
        let test_scores: Vec<f64> =
            (0..test_split.row_count()).map(|row| learner.score_row(&test_split.row(row))).collect();
        let evaluation = evaluate_scores(&test_scores, test_labels, request.decision_threshold)?;
        if is_cancelled() {
            return Ok(None);
        }

        // --- ETAPA 6: IMPORTANCIA GLOBAL Y EXPLICADOR LOCAL ---
        on_progress(0.93, "explainability");
        let importance_values = learner.feature_importance();
        let feature_importance: Vec<FeatureWeight> = matrix
            .columns
            .iter()
            .zip(importance_values.iter())
            .map(|(column, importance)| FeatureWeight {
                feature_name: column.name.clone(),
                importance: *importance,
            })
            .collect();

        let training_means: Vec<f64> = training_split
            .columns
            .iter()
            .map(|column| {
                column.values.iter().sum::<f64>() / column.values.len().max(1) as f64
            })
            .collect();
        let explainer = ContributionExplainer::from_training_means(training_means);

        // --- ETAPA 7: SERIALIZACIÓN DUAL Y CHECKSUM ---
        on_progress(0.97, "serialization");
        let native_bytes = learner.to_native_bytes()?;
        let portable_bytes = learner.to_portable_bytes()?;
        let checksum_hexadecimal = hex::encode(Sha256::digest(&portable_bytes));

        on_progress(1.0, "sealed");
        info!(
            "🎓 [TRAINING]: Job {} sealed f1={:.4} auc={:.4}.",
            request.job_id, evaluation.metrics.f1_score, evaluation.metrics.auc_roc
        );

        Ok(Some(TrainedArtifacts {
            learner,
            metrics: evaluation.metrics,
            feature_importance,
            explainer,
            native_bytes,
            portable_bytes,
            checksum_hexadecimal,
        }))
    }

    /// Despacho polimórfico por algoritmo con progreso en [0.15, 0.85].
    fn dispatch_fit<ProgressFn, CancelFn>(
        training_split: &FeatureMatrix,
        request: &TrainingRequest,
        training_seed: u64,
        class_sample_weights: Option<&[f64]>,
        on_progress: &mut ProgressFn,
        is_cancelled: &mut CancelFn,
    ) -> Result<Option<TrainedLearner>, TrainingError>
    where
        ProgressFn: FnMut(f64, &str),
        CancelFn: FnMut() -> bool,
    {
        let map = &request.hyperparameters;
        let fit_stage_tag = match request.algorithm {
            AlgorithmKind::XgboostLike | AlgorithmKind::LightgbmLike => "boosting",
            AlgorithmKind::RandomForest => "bagging",
            AlgorithmKind::IsolationForest => "isolation",
            AlgorithmKind::SmallNn => "epochs",
        };
        // Progreso del ajuste proyectado sobre [0.15, 0.85]; retorna false
        // ante cancelación cooperativa.
        let mut fit_callback = |fraction: f64| -> bool {
            on_progress(0.15 + 0.70 * fraction, fit_stage_tag);
            !is_cancelled()
        };

        let learner = match request.algorithm {
            AlgorithmKind::XgboostLike | AlgorithmKind::LightgbmLike => {
                let is_leaf_wise = request.algorithm == AlgorithmKind::LightgbmLike;
                let parameters = GradientBoostParameters {
                    n_estimators: parse_usize(map, "n_estimators", 200)?,
                    learning_rate: parse_f64(map, "learning_rate", 0.1)?,
                    max_depth: parse_usize(map, "max_depth", 6)?,
                    max_leaves: parse_usize(map, "num_leaves", if is_leaf_wise { 31 } else { 64 })?,
                    scale_pos_weight: parse_f64(map, "scale_pos_weight", 1.0)?,
                    min_samples_leaf: parse_usize(map, "min_samples_leaf", 1)?,
                    lambda_regularization: parse_f64(map, "lambda", 1.0)?,
                    growth_policy: if is_leaf_wise {
                        TreeGrowthPolicy::LeafWise
                    } else {
                        TreeGrowthPolicy::LevelWise
                    },
                };
                GradientBoostModel::fit_with_progress(
                    training_split,
                    &parameters,
                    class_sample_weights,
                    &mut fit_callback,
                )?
                .map(TrainedLearner::GradientBoost)
            }
            AlgorithmKind::RandomForest => {
                let parameters = RandomForestParameters {
                    n_estimators: parse_usize(map, "n_estimators", 100)?,
                    max_depth: parse_usize(map, "max_depth", 8)?,
                    min_samples_leaf: parse_usize(map, "min_samples_leaf", 2)?,
                };
                RandomForestModel::fit_with_progress(
                    training_split,
                    &parameters,
                    class_sample_weights,
                    training_seed,
                    &mut fit_callback,
                )?
                .map(TrainedLearner::RandomForest)
            }
            AlgorithmKind::IsolationForest => {
                let parameters = IsolationForestParameters {
                    n_estimators: parse_usize(map, "n_estimators", 100)?,
                    subsample_size: parse_usize(map, "subsample_size", 256)?,
                };
                IsolationForestModel::fit_with_progress(
                    training_split,
                    &parameters,
                    training_seed,
                    &mut fit_callback,
                )?
                .map(TrainedLearner::IsolationForest)
            }
            AlgorithmKind::SmallNn => {
                let parameters = CompactNeuralParameters {
                    hidden_units: parse_usize(map, "hidden_units", 16)?,
                    epochs: parse_usize(map, "epochs", 30)?,
                    learning_rate: parse_f64(map, "learning_rate", 0.05)?,
                    scale_pos_weight: parse_f64(map, "scale_pos_weight", 1.0)?,
                };
                CompactNeuralModel::fit_with_progress(
                    training_split,
                    &parameters,
                    training_seed,
                    &mut fit_callback,
                )?
                .map(TrainedLearner::CompactNeural)
            }
        };

        Ok(learner)
    }
}

/// Parsea un hiperparámetro entero con default nominal.
fn parse_usize(
    map: &BTreeMap<String, serde_json::Value>,
    key: &str,
    default_value: usize,
) -> Result<usize, TrainingError> {
    match map.get(key) {
        None => Ok(default_value),
        Some(value) => value
            .as_u64()
            .map(|parsed| parsed as usize)
            .ok_or_else(|| {
                TrainingError::AlgorithmRejected(format!(
                    "hyperparameter '{}' must be a non-negative integer",
                    key
                ))
            }),
    }
}

/// Parsea un hiperparámetro flotante con default nominal.
fn parse_f64(
    map: &BTreeMap<String, serde_json::Value>,
    key: &str,
    default_value: f64,
) -> Result<f64, TrainingError> {
    match map.get(key) {
        None => Ok(default_value),
        Some(value) => value.as_f64().ok_or_else(|| {
            TrainingError::AlgorithmRejected(format!("hyperparameter '{}' must be numeric", key))
        }),
    }
}

/// Puente de etiquetas de columna hacia el dtype del contrato.
pub(crate) mod selection_dtype_bridge {
    use aegis_domain_models::FeatureDtype;

    /// Resuelve el dtype de dominio desde la etiqueta de columna.
    pub fn dtype_of_column_label(dtype_label: &str) -> FeatureDtype {
        match dtype_label {
            "binary" => FeatureDtype::Binary,
            "discrete" => FeatureDtype::Discrete,
            _ => FeatureDtype::Continuous,
        }
    }
}
