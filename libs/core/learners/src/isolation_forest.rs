// [libs/core/learners/src/isolation_forest.rs]
/*!
 * =================================================================
 * APARATO: ISOLATION FOREST ENGINE (V21.2 - UNSUPERVISED STRATA)
 * CLASIFICACIÓN: CORE LEARNING (ESTRATO L1)
 * RESPONSABILIDAD: AISLAMIENTO ALEATORIO SEMBRADO PARA ANOMALÍAS
 *
 * # Mathematical Proof (Anomaly Score):
 * s(x) = 2^(−E[h(x)] / c(ψ)) con c(ψ) = 2 H(ψ−1) − 2(ψ−1)/ψ la longitud
 * media de camino de un BST fallido. Las anomalías se aíslan en caminos
 * cortos, empujando s hacia 1; los puntos nominales hacia valores < 0.5.
 * =================================================================
 */

use crate::errors::LearnerError;
use crate::matrix::FeatureMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Submuestra nominal por árbol de aislamiento.
pub const DEFAULT_SUBSAMPLE_SIZE: usize = 256;
/// Tope duro de árboles de aislamiento.
pub const MAX_ISOLATION_BUDGET: usize = 500;

/// Hiperparámetros tipados del bosque de aislamiento.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IsolationForestParameters {
    /// Cantidad de árboles (1 ..= MAX_ISOLATION_BUDGET).
    pub n_estimators: usize,
    /// Tamaño de submuestra por árbol.
    pub subsample_size: usize,
}

impl IsolationForestParameters {
    /// Valida el dominio completo de los hiperparámetros.
    pub fn validate(&self) -> Result<(), LearnerError> {
        if self.n_estimators == 0 || self.n_estimators > MAX_ISOLATION_BUDGET {
            return Err(LearnerError::InvalidHyperparameter(format!(
                "n_estimators must be in 1..={}, observed {}",
                MAX_ISOLATION_BUDGET, self.n_estimators
            )));
        }
        if self.subsample_size < 8 {
            return Err(LearnerError::InvalidHyperparameter(format!(
                "subsample_size must be >= 8, observed {}",
                self.subsample_size
            )));
        }
        Ok(())
    }
}

/// Nodo del árbol de aislamiento en arena plana.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum IsolationNode {
    /// Hoja externa con el tamaño residual del nodo.
    External {
        /// Muestras restantes al alcanzar la hoja.
        remaining_size: usize,
    },
    /// Corte aleatorio value < threshold -> left.
    Internal {
        /// Feature del corte aleatorio.
        feature_index: usize,
        /// Umbral uniforme en el rango del nodo.
        threshold: f64,
        /// Hijo izquierdo en la arena.
        left: usize,
        /// Hijo derecho en la arena.
        right: usize,
    },
}

/// Árbol de aislamiento individual.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IsolationTree {
    /// Arena de nodos; la raíz es el índice 0.
    pub nodes: Vec<IsolationNode>,
}

/// Bosque de aislamiento entrenado.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IsolationForestModel {
    /// Árboles del ensamble.
    pub trees: Vec<IsolationTree>,
    /// Submuestra usada (normalizador c(ψ) del score).
    pub subsample_size: usize,
    /// Aridad de entrada sellada.
    pub feature_count: usize,
    /// Frecuencia de cortes por feature (proxy de importancia).
    pub split_frequency: Vec<f64>,
}

/// Longitud media de camino c(n) de un BST fallido.
fn average_path_length(sample_size: usize) -> f64 {
    if sample_size <= 1 {
        return 0.0;
    }
    let n = sample_size as f64;
    // Armónico H(n−1) ≈ ln(n−1) + γ.
    let harmonic = (n - 1.0).ln() + 0.577_215_664_901_532_9;
    2.0 * harmonic - 2.0 * (n - 1.0) / n
}

impl IsolationForestModel {
    /**
     * Entrena el bosque de aislamiento sobre la matriz (las etiquetas,
     * si existen, se ignoran: el aprendizaje es no supervisado).
     */
    pub fn fit_with_progress<ProgressFn>(
        matrix: &FeatureMatrix,
        parameters: &IsolationForestParameters,
        random_seed: u64,
        mut on_progress: ProgressFn,
    ) -> Result<Option<Self>, LearnerError>
    where
        ProgressFn: FnMut(f64) -> bool,
    {
        parameters.validate()?;

        let row_count = matrix.row_count();
        if row_count == 0 {
            return Err(LearnerError::EmptyMatrix("isolation forest on empty matrix".into()));
        }

        let feature_count = matrix.column_count();
        let effective_subsample = parameters.subsample_size.min(row_count);
        let depth_limit = (effective_subsample as f64).log2().ceil() as usize;

        let mut random_engine = StdRng::seed_from_u64(random_seed);
        let mut trees = Vec::with_capacity(parameters.n_estimators);
        let mut split_frequency = vec![0.0_f64; feature_count];

        for iteration in 0..parameters.n_estimators {
            let subsample_rows: Vec<usize> =
                (0..effective_subsample).map(|_| random_engine.gen_range(0..row_count)).collect();

            let mut tree = IsolationTree { nodes: Vec::new() };
            Self::grow_isolation_node(
                matrix,
                &subsample_rows,
                0,
                depth_limit,
                &mut tree,
                &mut random_engine,
                &mut split_frequency,
            );
            trees.push(tree);

            let progress_fraction = (iteration + 1) as f64 / parameters.n_estimators as f64;
            if !on_progress(progress_fraction) {
                return Ok(None);
            }
        }

        Ok(Some(Self {
            trees,
            subsample_size: effective_subsample,
            feature_count,
            split_frequency,
        }))
    }

    /// Crecimiento recursivo con cortes uniformes; retorna el índice del nodo.
    fn grow_isolation_node(
        matrix: &FeatureMatrix,
        node_rows: &[usize],
        depth: usize,
        depth_limit: usize,
        tree: &mut IsolationTree,
        random_engine: &mut StdRng,
        split_frequency: &mut [f64],
    ) -> usize {
        if depth >= depth_limit || node_rows.len() <= 1 {
            let node_index = tree.nodes.len();
            tree.nodes.push(IsolationNode::External { remaining_size: node_rows.len() });
            return node_index;
        }

        // Selección de feature con rango no degenerado.
        let feature_count = matrix.column_count();
        let mut chosen: Option<(usize, f64, f64)> = None;
        for _ in 0..feature_count {
            let feature_index = random_engine.gen_range(0..feature_count);
            let values = &matrix.columns[feature_index].values;
            let minimum = node_rows.iter().map(|row| values[*row]).fold(f64::INFINITY, f64::min);
            let maximum =
                node_rows.iter().map(|row| values[*row]).fold(f64::NEG_INFINITY, f64::max);
            if (maximum - minimum).abs() > f64::EPSILON {
                chosen = Some((feature_index, minimum, maximum));
                break;
            }
        }

        let Some((feature_index, minimum, maximum)) = chosen else {
            let node_index = tree.nodes.len();
            tree.nodes.push(IsolationNode::External { remaining_size: node_rows.len() });
            return node_index;
        };

        let threshold = random_engine.gen_range(minimum..maximum);
        split_frequency[feature_index] += 1.0;

        let values = &matrix.columns[feature_index].values;
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) =
            node_rows.iter().partition(|row| values[**row] < threshold);

        // Reserva del nodo interno antes de los hijos para anclar el índice.
        let node_index = tree.nodes.len();
        tree.nodes.push(IsolationNode::External { remaining_size: 0 });

        let left_index = Self::grow_isolation_node(
            matrix, &left_rows, depth + 1, depth_limit, tree, random_engine, split_frequency,
        );
        let right_index = Self::grow_isolation_node(
            matrix, &right_rows, depth + 1, depth_limit, tree, random_engine, split_frequency,
        );

        tree.nodes[node_index] =
            IsolationNode::Internal { feature_index, threshold, left: left_index, right: right_index };
        node_index
    }

    /// Longitud de camino de una fila en un árbol.
    fn path_length(tree: &IsolationTree, feature_row: &[f64]) -> f64 {
        let mut cursor = 0usize;
        let mut depth = 0.0_f64;
        loop {
            match &tree.nodes[cursor] {
                IsolationNode::External { remaining_size } => {
                    return depth + average_path_length(*remaining_size);
                }
                IsolationNode::Internal { feature_index, threshold, left, right } => {
                    cursor = if feature_row[*feature_index] < *threshold { *left } else { *right };
                    depth += 1.0;
                }
            }
        }
    }
}

impl crate::ScoringModel for IsolationForestModel {
    fn score_row(&self, feature_row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.5;
        }
        let mean_path: f64 = self
            .trees
            .iter()
            .map(|tree| Self::path_length(tree, feature_row))
            .sum::<f64>()
            / self.trees.len() as f64;

        let normalizer = average_path_length(self.subsample_size);
        if normalizer <= f64::EPSILON {
            return 0.5;
        }
        2.0_f64.powf(-mean_path / normalizer)
    }

    fn feature_importance(&self) -> Vec<f64> {
        crate::gradient_boost::normalize_importance(self.split_frequency.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matrix::{FeatureColumn, FeatureMatrix};
    use crate::ScoringModel;

    #[test]
    fn certify_outlier_scores_above_cluster() {
        // Nube compacta alrededor de 0 con un punto extremo en 100.
        let values: Vec<f64> = (0..500).map(|index| (index as f64 * 0.01).sin()).collect();
        let matrix = FeatureMatrix {
            columns: vec![FeatureColumn {
                name: "amount".into(),
                dtype_label: "continuous".into(),
                values,
            }],
            labels: None,
        };

        let parameters = IsolationForestParameters { n_estimators: 100, subsample_size: 128 };
        let model = IsolationForestModel::fit_with_progress(&matrix, &parameters, 7, |_| true)
            .expect("fit")
            .expect("not cancelled");

        let inlier_score = model.score_row(&[0.0]);
        let outlier_score = model.score_row(&[100.0]);
        assert!(
            outlier_score > inlier_score + 0.1,
            "outlier {} must dominate inlier {}",
            outlier_score,
            inlier_score
        );
    }
}
