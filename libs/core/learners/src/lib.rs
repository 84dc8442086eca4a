// [libs/core/learners/src/lib.rs]
/*!
 * =================================================================
 * APARATO: LEARNERS HUB (V20.0 - EXPORTS LEVELED)
 * CLASIFICACIÓN: CORE LEARNING (ESTRATO L1)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DEL NÚCLEO DE APRENDIZAJE
 * =================================================================
 */

pub mod errors;
pub mod seeding;
pub mod matrix;
pub mod trees;
pub mod gradient_boost;
pub mod random_forest;
pub mod isolation_forest;
pub mod neural;
pub mod sampling;
pub mod explainer;

// --- RE-EXPORTACIONES SOBERANAS ---

pub use errors::LearnerError;
pub use seeding::derive_seed_from_identifier;
pub use matrix::{FeatureColumn, FeatureMatrix};
pub use trees::{RegressionTree, TreeGrowthPolicy};
pub use gradient_boost::{GradientBoostModel, GradientBoostParameters};
pub use random_forest::{RandomForestModel, RandomForestParameters};
pub use isolation_forest::{IsolationForestModel, IsolationForestParameters};
pub use neural::{CompactNeuralModel, CompactNeuralParameters};
pub use sampling::{apply_class_weights, synthetic_minority_oversample, undersample_majority};
pub use explainer::{ContributionExplainer, SignedContribution};

use serde::{Deserialize, Serialize};

/// Contrato uniforme de scoring para todos los aprendices entrenados.
pub trait ScoringModel {
    /// Score de fraude en [0, 1] para una fila alineada al orden de features.
    fn score_row(&self, feature_row: &[f64]) -> f64;

    /// Importancia global normalizada por feature (misma cardinalidad que la fila).
    fn feature_importance(&self) -> Vec<f64>;
}

/// Aprendiz entrenado serializable (forma nativa bincode / portable JSON).
///
/// El etiquetado externo de serde es deliberado: bincode exige un formato
/// no auto-descriptivo y rechaza uniones con tag/content adyacente.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TrainedLearner {
    /// Booster de gradiente (crecimiento por niveles u hojas).
    GradientBoost(GradientBoostModel),
    /// Bagging de árboles de regresión sobre etiquetas binarias.
    RandomForest(RandomForestModel),
    /// Bosque de aislamiento no supervisado.
    IsolationForest(IsolationForestModel),
    /// Perceptrón multicapa compacto.
    CompactNeural(CompactNeuralModel),
}

impl ScoringModel for TrainedLearner {
    fn score_row(&self, feature_row: &[f64]) -> f64 {
        match self {
            Self::GradientBoost(model) => model.score_row(feature_row),
            Self::RandomForest(model) => model.score_row(feature_row),
            Self::IsolationForest(model) => model.score_row(feature_row),
            Self::CompactNeural(model) => model.score_row(feature_row),
        }
    }

    fn feature_importance(&self) -> Vec<f64> {
        match self {
            Self::GradientBoost(model) => model.feature_importance(),
            Self::RandomForest(model) => model.feature_importance(),
            Self::IsolationForest(model) => model.feature_importance(),
            Self::CompactNeural(model) => model.feature_importance(),
        }
    }
}

impl TrainedLearner {
    /// Serializa la forma nativa (bincode) del aprendiz.
    pub fn to_native_bytes(&self) -> Result<Vec<u8>, LearnerError> {
        bincode::serialize(self)
            .map_err(|fault| LearnerError::Serialization(fault.to_string()))
    }

    /// Serializa la forma portable (JSON canónico) del aprendiz.
    pub fn to_portable_bytes(&self) -> Result<Vec<u8>, LearnerError> {
        serde_json::to_vec(self)
            .map_err(|fault| LearnerError::Serialization(fault.to_string()))
    }

    /// Reconstruye el aprendiz desde la forma nativa.
    pub fn from_native_bytes(bytes: &[u8]) -> Result<Self, LearnerError> {
        bincode::deserialize(bytes)
            .map_err(|fault| LearnerError::Serialization(fault.to_string()))
    }

    /// Reconstruye el aprendiz desde la forma portable.
    pub fn from_portable_bytes(bytes: &[u8]) -> Result<Self, LearnerError> {
        serde_json::from_slice(bytes)
            .map_err(|fault| LearnerError::Serialization(fault.to_string()))
    }
}
