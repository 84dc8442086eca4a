// [libs/core/learners/src/random_forest.rs]
/*!
 * =================================================================
 * APARATO: RANDOM FOREST ENGINE (V21.0 - BAGGING SOBERANO)
 * CLASIFICACIÓN: CORE LEARNING (ESTRATO L1)
 * RESPONSABILIDAD: BAGGING DE ÁRBOLES DE MEDIA SOBRE BOOTSTRAP SEMBRADO
 *
 * # Mathematical Proof (Probability Leaves):
 * Con g = −y, h = 1 el peso de Newton de cada hoja colapsa a la media
 * muestral de la etiqueta, de modo que cada árbol emite P(y=1 | hoja) y
 * el promedio del bosque es un estimador consistente de la probabilidad.
 * =================================================================
 */

use crate::errors::LearnerError;
use crate::matrix::FeatureMatrix;
use crate::trees::{RegressionTree, TreeFitConfig, TreeGrowthPolicy};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Tope duro de árboles del bosque.
pub const MAX_FOREST_BUDGET: usize = 300;

/// Hiperparámetros tipados del bosque.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RandomForestParameters {
    /// Cantidad de árboles (1 ..= MAX_FOREST_BUDGET).
    pub n_estimators: usize,
    /// Profundidad máxima por árbol.
    pub max_depth: usize,
    /// Mínimo de muestras por hoja.
    pub min_samples_leaf: usize,
}

impl RandomForestParameters {
    /// Valida el dominio completo de los hiperparámetros.
    pub fn validate(&self) -> Result<(), LearnerError> {
        if self.n_estimators == 0 || self.n_estimators > MAX_FOREST_BUDGET {
            return Err(LearnerError::InvalidHyperparameter(format!(
                "n_estimators must be in 1..={}, observed {}",
                MAX_FOREST_BUDGET, self.n_estimators
            )));
        }
        if self.max_depth == 0 || self.max_depth > 24 {
            return Err(LearnerError::InvalidHyperparameter(format!(
                "max_depth must be in 1..=24, observed {}",
                self.max_depth
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

/// Bosque entrenado serializable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RandomForestModel {
    /// Árboles de media del ensamble.
    pub trees: Vec<RegressionTree>,
    /// Aridad de entrada sellada.
    pub feature_count: usize,
}

impl RandomForestModel {
    /**
     * Entrena el bosque con bootstrap y subespacio de features por árbol.
     *
     * El callback de progreso sigue el mismo contrato cooperativo que el
     * booster: retornar 'false' abandona sin modelo.
     */
    pub fn fit_with_progress<ProgressFn>(
        matrix: &FeatureMatrix,
        parameters: &RandomForestParameters,
        sample_weights: Option<&[f64]>,
        random_seed: u64,
        mut on_progress: ProgressFn,
    ) -> Result<Option<Self>, LearnerError>
    where
        ProgressFn: FnMut(f64) -> bool,
    {
        parameters.validate()?;

        let labels = matrix
            .labels
            .as_ref()
            .ok_or_else(|| LearnerError::EmptyMatrix("forest requires labels".into()))?;
        let row_count = matrix.row_count();
        if row_count == 0 {
            return Err(LearnerError::EmptyMatrix("forest on empty matrix".into()));
        }

        let feature_count = matrix.column_count();
        // Subespacio clásico sqrt(d) por árbol.
        let subspace_size = ((feature_count as f64).sqrt().ceil() as usize).clamp(1, feature_count);

        let mut random_engine = StdRng::seed_from_u64(random_seed);
        let mut trees = Vec::with_capacity(parameters.n_estimators);

        for iteration in 0..parameters.n_estimators {
            // Bootstrap con reemplazo del tamaño de la muestra original.
            let bootstrap_rows: Vec<usize> =
                (0..row_count).map(|_| random_engine.gen_range(0..row_count)).collect();
            let bootstrap_matrix = matrix.select_rows(&bootstrap_rows);
            let bootstrap_labels: Vec<bool> =
                bootstrap_rows.iter().map(|row| labels[*row]).collect();

            // Subespacio de features muestreado sin reemplazo.
            let mut candidate_features: Vec<usize> = (0..feature_count).collect();
            for shuffle_index in (1..candidate_features.len()).rev() {
                let swap_index = random_engine.gen_range(0..=shuffle_index);
                candidate_features.swap(shuffle_index, swap_index);
            }
            candidate_features.truncate(subspace_size);

            // Hojas de media ponderada: g = −w·y, h = w.
            let bootstrap_weights: Vec<f64> = bootstrap_rows
                .iter()
                .map(|row| sample_weights.map(|weights| weights[*row]).unwrap_or(1.0))
                .collect();
            let gradients: Vec<f64> = bootstrap_labels
                .iter()
                .zip(bootstrap_weights.iter())
                .map(|(label, weight)| if *label { -weight } else { 0.0 })
                .collect();
            let hessians = bootstrap_weights;

            let tree_config = TreeFitConfig {
                max_depth: parameters.max_depth,
                min_samples_leaf: parameters.min_samples_leaf,
                lambda_regularization: 0.0,
                growth_policy: TreeGrowthPolicy::LevelWise,
                max_leaves: usize::MAX,
                feature_subset: Some(candidate_features),
            };

            trees.push(RegressionTree::fit(&bootstrap_matrix, &gradients, &hessians, &tree_config)?);

            let progress_fraction = (iteration + 1) as f64 / parameters.n_estimators as f64;
            if !on_progress(progress_fraction) {
                return Ok(None);
            }
        }

        Ok(Some(Self { trees, feature_count }))
    }
}

impl crate::ScoringModel for RandomForestModel {
    fn score_row(&self, feature_row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.5;
        }
        let vote_sum: f64 = self.trees.iter().map(|tree| tree.predict_row(feature_row)).sum();
        (vote_sum / self.trees.len() as f64).clamp(0.0, 1.0)
    }

    fn feature_importance(&self) -> Vec<f64> {
        let mut importance_buffer = vec![0.0_f64; self.feature_count];
        for tree in &self.trees {
            tree.accumulate_importance(&mut importance_buffer);
        }
        crate::gradient_boost::normalize_importance(importance_buffer)
    }
}
