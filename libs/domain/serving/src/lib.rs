// [libs/domain/serving/src/lib.rs]
/*!
 * =================================================================
 * APARATO: SERVING DOMAIN HUB (V22.0 - EXPORTS LEVELED)
 * =================================================================
 */

pub mod errors;
pub mod loader;
pub mod resolver;
pub mod ab_router;
pub mod engine;
pub mod vault;

// --- RE-EXPORTACIONES SOBERANAS ---

pub use errors::ServingError;
pub use loader::{load_active_model, ActiveModel};
pub use resolver::{FeatureResolver, OnlineFeatureStore};
pub use ab_router::{route_arm, ExperimentArm};
pub use engine::{
    AbBinding, PredictRequest, PredictionResponse, ScoredOutcome, ScoringEngine,
};
pub use vault::PredictionVault;
