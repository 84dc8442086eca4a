// [libs/core/learners/src/trees.rs]
/*!
 * =================================================================
 * APARATO: REGRESSION TREE KERNEL (V22.0 - SECOND ORDER GAIN)
 * CLASIFICACIÓN: CORE LEARNING (ESTRATO L1)
 * RESPONSABILIDAD: ÁRBOL CART SOBRE ARENA PLANA CON DOBLE POLÍTICA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ARENA SOVEREIGNTY: Los nodos viven en un Vec plano con índices de
 *    hijos; cero punteros propietarios cíclicos y codec directo.
 * 2. DUAL GROWTH POLICY: Crecimiento por niveles (frontera BFS) o por
 *    hojas (mejor ganancia primero), compartiendo el mismo buscador de
 *    cortes de segundo orden.
 * 3. NEWTON LEAVES: Peso de hoja w = −G/(H+λ), válido tanto para boosting
 *    logístico (g, h reales) como para regresión a la media (g=−y, h=1).
 *
 * # Mathematical Proof (Split Gain):
 * Gain = ½ [ G_L²/(H_L+λ) + G_R²/(H_R+λ) − G²/(H+λ) ] >= 0 para el corte
 * óptimo; la búsqueda sobre cada feature ordenada es exacta y el argmax
 * global por nodo es determinista con desempate por índice de feature.
 * =================================================================
 */

use crate::errors::LearnerError;
use crate::matrix::FeatureMatrix;
use serde::{Deserialize, Serialize};

/// Política de expansión del árbol.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum TreeGrowthPolicy {
    /// Expansión por niveles completos (estilo xgboost).
    LevelWise,
    /// Expansión de la hoja de mejor ganancia (estilo lightgbm).
    LeafWise,
}

/// Nodo del árbol en la arena plana.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum TreeNode {
    /// Hoja con peso de Newton sellado.
    Leaf {
        /// Peso w = −G/(H+λ).
        value: f64,
    },
    /// Corte binario value < threshold -> left.
    Split {
        /// Índice de la feature del corte.
        feature_index: usize,
        /// Umbral del corte (punto medio entre valores adyacentes).
        threshold: f64,
        /// Índice del hijo izquierdo en la arena.
        left: usize,
        /// Índice del hijo derecho en la arena.
        right: usize,
        /// Ganancia del corte (contribución a la importancia).
        gain: f64,
    },
}

/// Configuración del ajuste de un árbol individual.
#[derive(Debug, Clone)]
pub struct TreeFitConfig {
    /// Profundidad máxima de la arena.
    pub max_depth: usize,
    /// Mínimo de muestras por hoja.
    pub min_samples_leaf: usize,
    /// Regularización λ del denominador de Newton.
    pub lambda_regularization: f64,
    /// Política de crecimiento.
    pub growth_policy: TreeGrowthPolicy,
    /// Tope de hojas (solo vinculante en LeafWise).
    pub max_leaves: usize,
    /// Subconjunto de features habilitadas (None = todas).
    pub feature_subset: Option<Vec<usize>>,
}

/// Candidato de expansión evaluado por el buscador de cortes.
struct SplitCandidate {
    gain: f64,
    feature_index: usize,
    threshold: f64,
    left_rows: Vec<usize>,
    right_rows: Vec<usize>,
}

/// Árbol de regresión sobre arena plana.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RegressionTree {
    /// Arena de nodos; la raíz es el índice 0.
    pub nodes: Vec<TreeNode>,
    /// Aridad de entrada sellada en el ajuste.
    pub feature_count: usize,
}

impl RegressionTree {
    /**
     * Ajusta el árbol a gradientes y hessianos por fila.
     *
     * # Errors:
     * - `EmptyMatrix` ante cero filas.
     * - `ShapeMismatch` si gradientes y hessianos no se alinean.
     */
    pub fn fit(
        matrix: &FeatureMatrix,
        gradients: &[f64],
        hessians: &[f64],
        config: &TreeFitConfig,
    ) -> Result<Self, LearnerError> {
        let row_count = matrix.row_count();
        if row_count == 0 {
            return Err(LearnerError::EmptyMatrix("tree fit on empty matrix".into()));
        }
        if gradients.len() != row_count || hessians.len() != row_count {
            return Err(LearnerError::ShapeMismatch {
                expected: row_count,
                observed: gradients.len().min(hessians.len()),
            });
        }

        let mut tree = Self { nodes: Vec::new(), feature_count: matrix.column_count() };
        let all_rows: Vec<usize> = (0..row_count).collect();

        match config.growth_policy {
            TreeGrowthPolicy::LevelWise => {
                tree.grow_level_wise(matrix, gradients, hessians, config, all_rows);
            }
            TreeGrowthPolicy::LeafWise => {
                tree.grow_leaf_wise(matrix, gradients, hessians, config, all_rows);
            }
        }

        Ok(tree)
    }

    /// Expansión BFS por niveles completos hasta max_depth.
    fn grow_level_wise(
        &mut self,
        matrix: &FeatureMatrix,
        gradients: &[f64],
        hessians: &[f64],
        config: &TreeFitConfig,
        root_rows: Vec<usize>,
    ) {
        // Cola de frontera: (índice de nodo reservado, filas, profundidad).
        let mut frontier = std::collections::VecDeque::new();
        self.nodes.push(Self::leaf_for(&root_rows, gradients, hessians, config));
        frontier.push_back((0usize, root_rows, 0usize));

        while let Some((node_index, node_rows, depth)) = frontier.pop_front() {
            if depth >= config.max_depth {
                continue;
            }
            let Some(candidate) =
                Self::best_split(matrix, gradients, hessians, config, &node_rows)
            else {
                continue;
            };

            let left_index = self.nodes.len();
            self.nodes.push(Self::leaf_for(&candidate.left_rows, gradients, hessians, config));
            let right_index = self.nodes.len();
            self.nodes.push(Self::leaf_for(&candidate.right_rows, gradients, hessians, config));

            self.nodes[node_index] = TreeNode::Split {
                feature_index: candidate.feature_index,
                threshold: candidate.threshold,
                left: left_index,
                right: right_index,
                gain: candidate.gain,
            };

            frontier.push_back((left_index, candidate.left_rows, depth + 1));
            frontier.push_back((right_index, candidate.right_rows, depth + 1));
        }
    }

    /// Expansión por mejor ganancia global hasta agotar max_leaves.
    fn grow_leaf_wise(
        &mut self,
        matrix: &FeatureMatrix,
        gradients: &[f64],
        hessians: &[f64],
        config: &TreeFitConfig,
        root_rows: Vec<usize>,
    ) {
        self.nodes.push(Self::leaf_for(&root_rows, gradients, hessians, config));

        // Hojas expandibles corrientes: (índice de nodo, filas, profundidad).
        let mut expandable: Vec<(usize, Vec<usize>, usize)> = vec![(0, root_rows, 0)];
        let mut leaf_count = 1usize;

        while leaf_count < config.max_leaves {
            // Selección de la hoja con mejor ganancia potencial.
            let mut best_position: Option<usize> = None;
            let mut best_candidate: Option<SplitCandidate> = None;

            for (position, (_, leaf_rows, depth)) in expandable.iter().enumerate() {
                if *depth >= config.max_depth {
                    continue;
                }
                if let Some(candidate) =
                    Self::best_split(matrix, gradients, hessians, config, leaf_rows)
                {
                    let is_better = best_candidate
                        .as_ref()
                        .map(|current| candidate.gain > current.gain)
                        .unwrap_or(true);
                    if is_better {
                        best_position = Some(position);
                        best_candidate = Some(candidate);
                    }
                }
            }

            let (Some(position), Some(candidate)) = (best_position, best_candidate) else {
                break;
            };
            let (node_index, _, depth) = expandable.swap_remove(position);

            let left_index = self.nodes.len();
            self.nodes.push(Self::leaf_for(&candidate.left_rows, gradients, hessians, config));
            let right_index = self.nodes.len();
            self.nodes.push(Self::leaf_for(&candidate.right_rows, gradients, hessians, config));

            self.nodes[node_index] = TreeNode::Split {
                feature_index: candidate.feature_index,
                threshold: candidate.threshold,
                left: left_index,
                right: right_index,
                gain: candidate.gain,
            };

            expandable.push((left_index, candidate.left_rows, depth + 1));
            expandable.push((right_index, candidate.right_rows, depth + 1));
            leaf_count += 1;
        }
    }

    /// Hoja con peso de Newton para un conjunto de filas.
    fn leaf_for(
        rows: &[usize],
        gradients: &[f64],
        hessians: &[f64],
        config: &TreeFitConfig,
    ) -> TreeNode {
        let gradient_sum: f64 = rows.iter().map(|row| gradients[*row]).sum();
        let hessian_sum: f64 = rows.iter().map(|row| hessians[*row]).sum();
        TreeNode::Leaf { value: -gradient_sum / (hessian_sum + config.lambda_regularization) }
    }

    /// Búsqueda exacta del mejor corte de segundo orden sobre el nodo.
    fn best_split(
        matrix: &FeatureMatrix,
        gradients: &[f64],
        hessians: &[f64],
        config: &TreeFitConfig,
        node_rows: &[usize],
    ) -> Option<SplitCandidate> {
        if node_rows.len() < 2 * config.min_samples_leaf {
            return None;
        }

        let total_gradient: f64 = node_rows.iter().map(|row| gradients[*row]).sum();
        let total_hessian: f64 = node_rows.iter().map(|row| hessians[*row]).sum();
        let lambda = config.lambda_regularization;
        let parent_objective = total_gradient * total_gradient / (total_hessian + lambda);

        let candidate_features: Vec<usize> = match &config.feature_subset {
            Some(subset) => subset.clone(),
            None => (0..matrix.column_count()).collect(),
        };

        let mut best: Option<SplitCandidate> = None;

        for feature_index in candidate_features {
            let column_values = &matrix.columns[feature_index].values;

            // Orden determinista de las filas del nodo por valor de feature.
            let mut ordered_rows = node_rows.to_vec();
            ordered_rows.sort_by(|a, b| {
                column_values[*a]
                    .partial_cmp(&column_values[*b])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let mut left_gradient = 0.0_f64;
            let mut left_hessian = 0.0_f64;

            for boundary in 0..ordered_rows.len() - 1 {
                let row = ordered_rows[boundary];
                left_gradient += gradients[row];
                left_hessian += hessians[row];

                let left_size = boundary + 1;
                let right_size = ordered_rows.len() - left_size;
                if left_size < config.min_samples_leaf || right_size < config.min_samples_leaf {
                    continue;
                }

                let current_value = column_values[row];
                let next_value = column_values[ordered_rows[boundary + 1]];
                if (next_value - current_value).abs() < f64::EPSILON {
                    // Sin frontera real entre valores idénticos.
                    continue;
                }

                let right_gradient = total_gradient - left_gradient;
                let right_hessian = total_hessian - left_hessian;

                let gain = 0.5
                    * (left_gradient * left_gradient / (left_hessian + lambda)
                        + right_gradient * right_gradient / (right_hessian + lambda)
                        - parent_objective);

                if gain <= 1e-12 {
                    continue;
                }

                let is_better = best.as_ref().map(|current| gain > current.gain).unwrap_or(true);
                if is_better {
                    let threshold = (current_value + next_value) / 2.0;
                    let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = node_rows
                        .iter()
                        .partition(|candidate_row| column_values[**candidate_row] < threshold);
                    best = Some(SplitCandidate {
                        gain,
                        feature_index,
                        threshold,
                        left_rows,
                        right_rows,
                    });
                }
            }
        }

        best
    }

    /// Predicción cruda (suma de pesos de hoja alcanzada).
    pub fn predict_row(&self, feature_row: &[f64]) -> f64 {
        let mut cursor = 0usize;
        loop {
            match &self.nodes[cursor] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split { feature_index, threshold, left, right, .. } => {
                    cursor = if feature_row[*feature_index] < *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Acumula la ganancia por feature en el buffer de importancia.
    pub fn accumulate_importance(&self, importance_buffer: &mut [f64]) {
        for node in &self.nodes {
            if let TreeNode::Split { feature_index, gain, .. } = node {
                importance_buffer[*feature_index] += gain.max(0.0);
            }
        }
    }
}
