// [libs/core/learners/src/gradient_boost.rs]
/*!
 * =================================================================
 * APARATO: GRADIENT BOOSTING ENGINE (V22.1 - LOGISTIC NEWTON)
 * CLASIFICACIÓN: CORE LEARNING (ESTRATO L1)
 * RESPONSABILIDAD: BOOSTING LOGÍSTICO CON DOBLE POLÍTICA DE CRECIMIENTO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. BUDGETED ITERATIONS: El presupuesto de iteraciones está acotado por
 *    MAX_ESTIMATOR_BUDGET; hiperparámetros por encima son rechazados.
 * 2. CLASS WEIGHT SYNERGY: 'scale_pos_weight' pondera gradiente y hessiano
 *    de la clase positiva, compensando el desbalance de fraude.
 * 3. GROWTH POLICY INJECTION: La política (niveles u hojas) llega del
 *    algoritmo solicitado sin duplicar el motor.
 *
 * # Mathematical Proof (Newton Boosting):
 * Con pérdida logística L = −[y ln p + (1−y) ln(1−p)] y p = σ(F), los
 * términos de segundo orden son g = w(p − y), h = w p (1 − p). Cada árbol
 * minimiza la expansión de Taylor local y la actualización F += η f_t
 * converge monótonamente en el conjunto de entrenamiento.
 * =================================================================
 */

use crate::errors::LearnerError;
use crate::matrix::FeatureMatrix;
use crate::trees::{RegressionTree, TreeFitConfig, TreeGrowthPolicy};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Tope duro del presupuesto de iteraciones de boosting.
pub const MAX_ESTIMATOR_BUDGET: usize = 500;

/// Hiperparámetros tipados del booster.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradientBoostParameters {
    /// Cantidad de árboles (1 ..= MAX_ESTIMATOR_BUDGET).
    pub n_estimators: usize,
    /// Tasa de aprendizaje η en (0, 1].
    pub learning_rate: f64,
    /// Profundidad máxima por árbol (1..=16).
    pub max_depth: usize,
    /// Tope de hojas por árbol (vinculante en LeafWise).
    pub max_leaves: usize,
    /// Ponderación de la clase positiva (>= 1 compensa el desbalance).
    pub scale_pos_weight: f64,
    /// Mínimo de muestras por hoja.
    pub min_samples_leaf: usize,
    /// Regularización λ de los pesos de hoja.
    pub lambda_regularization: f64,
    /// Política de crecimiento de los árboles.
    pub growth_policy: TreeGrowthPolicy,
}

impl GradientBoostParameters {
    /**
     * Valida el dominio completo de los hiperparámetros.
     *
     * # Errors:
     * `InvalidHyperparameter` nombrando el primer parámetro fuera de dominio.
     */
    pub fn validate(&self) -> Result<(), LearnerError> {
        if self.n_estimators == 0 || self.n_estimators > MAX_ESTIMATOR_BUDGET {
            return Err(LearnerError::InvalidHyperparameter(format!(
                "n_estimators must be in 1..={}, observed {}",
                MAX_ESTIMATOR_BUDGET, self.n_estimators
            )));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(LearnerError::InvalidHyperparameter(format!(
                "learning_rate must be in (0, 1], observed {}",
                self.learning_rate
            )));
        }
        if self.max_depth == 0 || self.max_depth > 16 {
            return Err(LearnerError::InvalidHyperparameter(format!(
                "max_depth must be in 1..=16, observed {}",
                self.max_depth
            )));
        }
        if self.max_leaves < 2 {
            return Err(LearnerError::InvalidHyperparameter(format!(
                "max_leaves must be >= 2, observed {}",
                self.max_leaves
            )));
        }
        if self.scale_pos_weight < 1.0 || !self.scale_pos_weight.is_finite() {
            return Err(LearnerError::InvalidHyperparameter(format!(
                "scale_pos_weight must be >= 1, observed {}",
                self.scale_pos_weight
            )));
        }
        if self.min_samples_leaf == 0 {
            return Err(LearnerError::InvalidHyperparameter(
                "min_samples_leaf must be >= 1".into(),
            ));
        }
        Ok(())
    }
}

/// Booster entrenado serializable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GradientBoostModel {
    /// Árboles en orden de iteración.
    pub trees: Vec<RegressionTree>,
    /// Log-odds inicial (prior de clase).
    pub initial_log_odds: f64,
    /// Tasa de aprendizaje sellada.
    pub learning_rate: f64,
    /// Aridad de entrada sellada.
    pub feature_count: usize,
}

impl GradientBoostModel {
    /**
     * Entrena el booster sobre una matriz etiquetada.
     *
     * El callback de progreso recibe la fracción de iteraciones completadas
     * y retorna 'false' para solicitar el abandono cooperativo (el llamador
     * traduce a Cancelled).
     */
    pub fn fit_with_progress<ProgressFn>(
        matrix: &FeatureMatrix,
        parameters: &GradientBoostParameters,
        sample_weights: Option<&[f64]>,
        mut on_progress: ProgressFn,
    ) -> Result<Option<Self>, LearnerError>
    where
        ProgressFn: FnMut(f64) -> bool,
    {
        parameters.validate()?;

        let labels = matrix
            .labels
            .as_ref()
            .ok_or_else(|| LearnerError::EmptyMatrix("boosting requires labels".into()))?;
        let row_count = matrix.row_count();
        if row_count == 0 {
            return Err(LearnerError::EmptyMatrix("boosting on empty matrix".into()));
        }

        let positive_count = labels.iter().filter(|label| **label).count();
        if positive_count == 0 || positive_count == row_count {
            return Err(LearnerError::DegenerateTrainingSet(
                "boosting requires both classes present".into(),
            ));
        }

        // Ponderación compuesta: clase positiva × pesos externos opcionales.
        let composed_weights: Vec<f64> = labels
            .iter()
            .enumerate()
            .map(|(row, label)| {
                let class_weight = if *label { parameters.scale_pos_weight } else { 1.0 };
                class_weight * sample_weights.map(|weights| weights[row]).unwrap_or(1.0)
            })
            .collect();

        let prior = positive_count as f64 / row_count as f64;
        let initial_log_odds = (prior / (1.0 - prior)).ln();

        let tree_config = TreeFitConfig {
            max_depth: parameters.max_depth,
            min_samples_leaf: parameters.min_samples_leaf,
            lambda_regularization: parameters.lambda_regularization,
            growth_policy: parameters.growth_policy,
            max_leaves: parameters.max_leaves,
            feature_subset: None,
        };

        let mut raw_scores = vec![initial_log_odds; row_count];
        let mut trees = Vec::with_capacity(parameters.n_estimators);

        for iteration in 0..parameters.n_estimators {
            // Términos de segundo orden de la pérdida logística ponderada.
            let mut gradients = Vec::with_capacity(row_count);
            let mut hessians = Vec::with_capacity(row_count);
            for row in 0..row_count {
                let probability = sigmoid(raw_scores[row]);
                let target = if labels[row] { 1.0 } else { 0.0 };
                let weight = composed_weights[row];
                gradients.push(weight * (probability - target));
                hessians.push((weight * probability * (1.0 - probability)).max(1e-12));
            }

            let tree = RegressionTree::fit(matrix, &gradients, &hessians, &tree_config)?;

            for row in 0..row_count {
                raw_scores[row] += parameters.learning_rate * tree.predict_row(&matrix.row(row));
            }
            trees.push(tree);

            let progress_fraction = (iteration + 1) as f64 / parameters.n_estimators as f64;
            if !on_progress(progress_fraction) {
                debug!("🛑 [BOOSTER]: Cooperative abandonment acknowledged at iteration {}.", iteration);
                return Ok(None);
            }
        }

        Ok(Some(Self {
            trees,
            initial_log_odds,
            learning_rate: parameters.learning_rate,
            feature_count: matrix.column_count(),
        }))
    }

    /// Score crudo (log-odds acumulado) de una fila.
    pub fn raw_score(&self, feature_row: &[f64]) -> f64 {
        let tree_sum: f64 = self.trees.iter().map(|tree| tree.predict_row(feature_row)).sum();
        self.initial_log_odds + self.learning_rate * tree_sum
    }
}

impl crate::ScoringModel for GradientBoostModel {
    fn score_row(&self, feature_row: &[f64]) -> f64 {
        sigmoid(self.raw_score(feature_row))
    }

    fn feature_importance(&self) -> Vec<f64> {
        let mut importance_buffer = vec![0.0_f64; self.feature_count];
        for tree in &self.trees {
            tree.accumulate_importance(&mut importance_buffer);
        }
        normalize_importance(importance_buffer)
    }
}

/// Sigmoide numéricamente estable.
pub fn sigmoid(raw: f64) -> f64 {
    if raw >= 0.0 {
        1.0 / (1.0 + (-raw).exp())
    } else {
        let exponential = raw.exp();
        exponential / (1.0 + exponential)
    }
}

/// Normaliza un buffer de importancia a suma unitaria.
pub fn normalize_importance(importance_buffer: Vec<f64>) -> Vec<f64> {
    let total: f64 = importance_buffer.iter().sum();
    if total <= f64::EPSILON {
        return importance_buffer;
    }
    importance_buffer.into_iter().map(|value| value / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{FeatureColumn, FeatureMatrix};
    use crate::ScoringModel;

    fn forge_separable_matrix() -> FeatureMatrix {
        // Clase positiva con amount alto, negativa con amount bajo.
        let mut amount = Vec::new();
        let mut noise = Vec::new();
        let mut labels = Vec::new();
        for index in 0..200 {
            let jitter = (index as f64 * 0.618_033).fract();
            amount.push(jitter);
            noise.push((index as f64 * 0.414_213).fract());
            labels.push(false);
            amount.push(5.0 + jitter);
            noise.push((index as f64 * 0.732_050).fract());
            labels.push(true);
        }
        FeatureMatrix {
            columns: vec![
                FeatureColumn { name: "amount".into(), dtype_label: "continuous".into(), values: amount },
                FeatureColumn { name: "noise".into(), dtype_label: "continuous".into(), values: noise },
            ],
            labels: Some(labels),
        }
    }

    fn nominal_parameters() -> GradientBoostParameters {
        GradientBoostParameters {
            n_estimators: 20,
            learning_rate: 0.3,
            max_depth: 3,
            max_leaves: 8,
            scale_pos_weight: 1.0,
            min_samples_leaf: 1,
            lambda_regularization: 1.0,
            growth_policy: TreeGrowthPolicy::LevelWise,
        }
    }

    #[test]
    fn certify_booster_separates_classes() {
        let matrix = forge_separable_matrix();
        let model = GradientBoostModel::fit_with_progress(
            &matrix,
            &nominal_parameters(),
            None,
            |_| true,
        )
        .expect("fit")
        .expect("not cancelled");

        assert!(model.score_row(&[0.2, 0.5]) < 0.2);
        assert!(model.score_row(&[5.5, 0.5]) > 0.8);

        // La importancia debe concentrarse en la feature separadora.
        let importance = model.feature_importance();
        assert!(importance[0] > importance[1]);
    }

    #[test]
    fn certify_cancellation_mid_training() {
        let matrix = forge_separable_matrix();
        let mut observed_calls = 0usize;
        let outcome = GradientBoostModel::fit_with_progress(
            &matrix,
            &nominal_parameters(),
            None,
            |_| {
                observed_calls += 1;
                observed_calls < 5
            },
        )
        .expect("fit");
        assert!(outcome.is_none(), "cancellation must abandon without a model");
    }

    #[test]
    fn certify_hyperparameter_rejection() {
        let mut parameters = nominal_parameters();
        parameters.n_estimators = 0;
        assert!(matches!(parameters.validate(), Err(LearnerError::InvalidHyperparameter(_))));

        parameters = nominal_parameters();
        parameters.learning_rate = 2.0;
        assert!(matches!(parameters.validate(), Err(LearnerError::InvalidHyperparameter(_))));
    }
}
