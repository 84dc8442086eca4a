// [libs/domain/training/src/errors.rs]
/*!
 * =================================================================
 * APARATO: TRAINING ERROR CATALOG (V18.0 - RETRY AWARE)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: TAXONOMÍA DE FALLOS DEL MOTOR DE ENTRENAMIENTO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SINGLE RETRY CLASS: Únicamente 'Internal' es reintentable (a lo
 *    sumo una vez); el resto es terminal para la orden de trabajo.
 * 2. SCHEMA SHIELD: 'FeatureSchemaMismatch' transporta ambos digests
 *    para el diagnóstico inmediato del skew.
 * =================================================================
 */

use aegis_core_learners::LearnerError;
use aegis_domain_models::FaultClass;
use thiserror::Error;

/// Fallos del motor de entrenamiento C4.
#[derive(Error, Debug)]
pub enum TrainingError {
    /// El digest de la matriz no coincide con el contrato del FeatureSet.
    #[error("[L2_TRAINING_FAULT]: FEATURE_SCHEMA_MISMATCH -> expected {expected}, observed {observed}")]
    FeatureSchemaMismatch {
        /// Digest sellado en el FeatureSet.
        expected: String,
        /// Digest recomputado de la matriz cargada.
        observed: String,
    },

    /// Presupuesto de memoria o matriz fuera de límites.
    #[error("[L2_TRAINING_FAULT]: RESOURCE_EXHAUSTED -> {0}")]
    ResourceExhausted(String),

    /// Hiperparámetros rechazados por el algoritmo.
    #[error("[L2_TRAINING_FAULT]: ALGORITHM_REJECTED -> {0}")]
    AlgorithmRejected(String),

    /// Cancelación cooperativa observada en frontera de etapa.
    #[error("[L2_TRAINING_FAULT]: CANCELLED")]
    Cancelled,

    /// Invariante interno roto (único con reintento, máximo uno).
    #[error("[L2_TRAINING_FAULT]: INTERNAL_COLLAPSE -> {0}")]
    Internal(String),
}

impl TrainingError {
    /// Política de reintento del motor: solo Internal, a lo sumo una vez.
    pub fn is_retryable_once(&self) -> bool {
        matches!(self, Self::Internal(_))
    }

    /// Proyección sobre la taxonomía transport-agnóstica.
    pub fn fault_class(&self) -> FaultClass {
        match self {
            Self::FeatureSchemaMismatch { .. } => FaultClass::Validation,
            Self::ResourceExhausted(_) => FaultClass::ResourceExhausted,
            Self::AlgorithmRejected(_) => FaultClass::Validation,
            Self::Cancelled => FaultClass::Cancelled,
            Self::Internal(_) => FaultClass::Internal,
        }
    }
}

impl From<LearnerError> for TrainingError {
    fn from(fault: LearnerError) -> Self {
        match fault {
            LearnerError::InvalidHyperparameter(detail) => Self::AlgorithmRejected(detail),
            LearnerError::DegenerateTrainingSet(detail) => Self::AlgorithmRejected(detail),
            other => Self::Internal(other.to_string()),
        }
    }
}
