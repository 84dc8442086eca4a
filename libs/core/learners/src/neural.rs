// [libs/core/learners/src/neural.rs]
/*!
 * =================================================================
 * APARATO: COMPACT NEURAL ENGINE (V21.0 - SINGLE HIDDEN STRATA)
 * CLASIFICACIÓN: CORE LEARNING (ESTRATO L1)
 * RESPONSABILIDAD: PERCEPTRÓN MULTICAPA COMPACTO CON ÉPOCAS ACOTADAS
 *
 * # Mathematical Proof (Bounded Epochs):
 * El presupuesto de iteraciones es epochs × filas, acotado por
 * MAX_EPOCH_BUDGET. El descenso por gradiente estocástico con tasa fija
 * sobre pérdida logística es convergente en media para tasas pequeñas.
 * =================================================================
 */

use crate::errors::LearnerError;
use crate::gradient_boost::sigmoid;
use crate::matrix::FeatureMatrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Tope duro de épocas de entrenamiento.
pub const MAX_EPOCH_BUDGET: usize = 200;

/// Hiperparámetros tipados del perceptrón compacto.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompactNeuralParameters {
    /// Unidades de la única capa oculta (1..=256).
    pub hidden_units: usize,
    /// Épocas de entrenamiento (1 ..= MAX_EPOCH_BUDGET).
    pub epochs: usize,
    /// Tasa de aprendizaje del SGD.
    pub learning_rate: f64,
    /// Ponderación de la clase positiva.
    pub scale_pos_weight: f64,
}

impl CompactNeuralParameters {
    /// Valida el dominio completo de los hiperparámetros.
    pub fn validate(&self) -> Result<(), LearnerError> {
        if self.hidden_units == 0 || self.hidden_units > 256 {
            return Err(LearnerError::InvalidHyperparameter(format!(
                "hidden_units must be in 1..=256, observed {}",
                self.hidden_units
            )));
        }
        if self.epochs == 0 || self.epochs > MAX_EPOCH_BUDGET {
            return Err(LearnerError::InvalidHyperparameter(format!(
                "epochs must be in 1..={}, observed {}",
                MAX_EPOCH_BUDGET, self.epochs
            )));
        }
        if !(self.learning_rate > 0.0 && self.learning_rate < 1.0) {
            return Err(LearnerError::InvalidHyperparameter(format!(
                "learning_rate must be in (0, 1), observed {}",
                self.learning_rate
            )));
        }
        if self.scale_pos_weight < 1.0 {
            return Err(LearnerError::InvalidHyperparameter(format!(
                "scale_pos_weight must be >= 1, observed {}",
                self.scale_pos_weight
            )));
        }
        Ok(())
    }
}

/// Perceptrón entrenado serializable.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompactNeuralModel {
    /// Pesos entrada -> oculta (hidden_units × feature_count, row-major).
    pub input_weights: Vec<f64>,
    /// Sesgos de la capa oculta.
    pub hidden_biases: Vec<f64>,
    /// Pesos oculta -> salida.
    pub output_weights: Vec<f64>,
    /// Sesgo de salida.
    pub output_bias: f64,
    /// Unidades ocultas selladas.
    pub hidden_units: usize,
    /// Aridad de entrada sellada.
    pub feature_count: usize,
}

impl CompactNeuralModel {
    /**
     * Entrena el perceptrón con SGD sembrado y épocas acotadas.
     * El callback de progreso se invoca por época con contrato cooperativo.
     */
    pub fn fit_with_progress<ProgressFn>(
        matrix: &FeatureMatrix,
        parameters: &CompactNeuralParameters,
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
            .ok_or_else(|| LearnerError::EmptyMatrix("neural fit requires labels".into()))?;
        let row_count = matrix.row_count();
        if row_count == 0 {
            return Err(LearnerError::EmptyMatrix("neural fit on empty matrix".into()));
        }

        let feature_count = matrix.column_count();
        let hidden_units = parameters.hidden_units;
        let mut random_engine = StdRng::seed_from_u64(random_seed);

        // Inicialización uniforme escalada por la aridad de entrada.
        let initialization_scale = 1.0 / (feature_count as f64).sqrt();
        let mut input_weights: Vec<f64> = (0..hidden_units * feature_count)
            .map(|_| random_engine.gen_range(-initialization_scale..initialization_scale))
            .collect();
        let mut hidden_biases = vec![0.0_f64; hidden_units];
        let mut output_weights: Vec<f64> = (0..hidden_units)
            .map(|_| random_engine.gen_range(-initialization_scale..initialization_scale))
            .collect();
        let mut output_bias = 0.0_f64;

        let mut hidden_activations = vec![0.0_f64; hidden_units];

        for epoch in 0..parameters.epochs {
            // Orden de visita barajado por época (Fisher-Yates sembrado).
            let mut visit_order: Vec<usize> = (0..row_count).collect();
            for shuffle_index in (1..visit_order.len()).rev() {
                let swap_index = random_engine.gen_range(0..=shuffle_index);
                visit_order.swap(shuffle_index, swap_index);
            }

            for row_index in visit_order {
                let feature_row = matrix.row(row_index);
                let target = if labels[row_index] { 1.0 } else { 0.0 };
                let sample_weight =
                    if labels[row_index] { parameters.scale_pos_weight } else { 1.0 };

                // Paso forward: oculta tanh, salida sigmoide.
                for unit in 0..hidden_units {
                    let weight_offset = unit * feature_count;
                    let mut pre_activation = hidden_biases[unit];
                    for (feature_index, feature_value) in feature_row.iter().enumerate() {
                        pre_activation += input_weights[weight_offset + feature_index] * feature_value;
                    }
                    hidden_activations[unit] = pre_activation.tanh();
                }

                let mut output_pre_activation = output_bias;
                for unit in 0..hidden_units {
                    output_pre_activation += output_weights[unit] * hidden_activations[unit];
                }
                let prediction = sigmoid(output_pre_activation);

                // Retropropagación de la pérdida logística ponderada.
                let output_delta = sample_weight * (prediction - target);

                for unit in 0..hidden_units {
                    let hidden_delta = output_delta
                        * output_weights[unit]
                        * (1.0 - hidden_activations[unit] * hidden_activations[unit]);

                    output_weights[unit] -=
                        parameters.learning_rate * output_delta * hidden_activations[unit];

                    let weight_offset = unit * feature_count;
                    for (feature_index, feature_value) in feature_row.iter().enumerate() {
                        input_weights[weight_offset + feature_index] -=
                            parameters.learning_rate * hidden_delta * feature_value;
                    }
                    hidden_biases[unit] -= parameters.learning_rate * hidden_delta;
                }
                output_bias -= parameters.learning_rate * output_delta;
            }

            let progress_fraction = (epoch + 1) as f64 / parameters.epochs as f64;
            if !on_progress(progress_fraction) {
                return Ok(None);
            }
        }

        Ok(Some(Self {
            input_weights,
            hidden_biases,
            output_weights,
            output_bias,
            hidden_units,
            feature_count,
        }))
    }
}

impl crate::ScoringModel for CompactNeuralModel {
    fn score_row(&self, feature_row: &[f64]) -> f64 {
        let mut output_pre_activation = self.output_bias;
        for unit in 0..self.hidden_units {
            let weight_offset = unit * self.feature_count;
            let mut pre_activation = self.hidden_biases[unit];
            for (feature_index, feature_value) in feature_row.iter().enumerate() {
                pre_activation += self.input_weights[weight_offset + feature_index] * feature_value;
            }
            output_pre_activation += self.output_weights[unit] * pre_activation.tanh();
        }
        sigmoid(output_pre_activation)
    }

    fn feature_importance(&self) -> Vec<f64> {
        // Importancia por magnitud de conexión: Σ_unidades |W1| · |W2|.
        let mut importance = vec![0.0_f64; self.feature_count];
        for unit in 0..self.hidden_units {
            let weight_offset = unit * self.feature_count;
            let output_magnitude = self.output_weights[unit].abs();
            for feature_index in 0..self.feature_count {
                importance[feature_index] +=
                    self.input_weights[weight_offset + feature_index].abs() * output_magnitude;
            }
        }
        crate::gradient_boost::normalize_importance(importance)
    }
}
