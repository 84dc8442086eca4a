// [libs/core/learners/src/errors.rs]
/*!
 * =================================================================
 * APARATO: LEARNER ERROR CATALOG (V20.0 - SOBERANO)
 * CLASIFICACIÓN: CORE LEARNING (ESTRATO L1)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE APRENDIZAJE
 * =================================================================
 */

use thiserror::Error;

/// Fallos del núcleo de aprendizaje.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LearnerError {
    /// Hiperparámetro ausente, malformado o fuera de dominio.
    /// El motor C4 lo traduce a AlgorithmRejected.
    #[error("[L1_LEARNER_FAULT]: HYPERPARAMETER_REJECTED -> {0}")]
    InvalidHyperparameter(String),

    /// La matriz de entrada está vacía o carece de etiquetas.
    #[error("[L1_LEARNER_FAULT]: EMPTY_MATRIX -> {0}")]
    EmptyMatrix(String),

    /// La fila de scoring no coincide con la aridad del modelo.
    #[error("[L1_LEARNER_FAULT]: SHAPE_MISMATCH -> expected {expected}, observed {observed}")]
    ShapeMismatch {
        /// Cardinalidad esperada por el modelo.
        expected: usize,
        /// Cardinalidad observada en la entrada.
        observed: usize,
    },

    /// Fallo de codec en la forma nativa o portable.
    #[error("[L1_LEARNER_FAULT]: SERIALIZATION_COLLAPSE -> {0}")]
    Serialization(String),

    /// Condición degenerada durante el ajuste (clase única, varianza nula).
    #[error("[L1_LEARNER_FAULT]: DEGENERATE_TRAINING_SET -> {0}")]
    DegenerateTrainingSet(String),
}
