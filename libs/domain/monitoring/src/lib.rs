// [libs/domain/monitoring/src/lib.rs]
/*!
 * =================================================================
 * APARATO: MONITORING DOMAIN HUB (V16.0 - EXPORTS LEVELED)
 * =================================================================
 */

pub mod errors;
pub mod reference;
pub mod drift;
pub mod concept;
pub mod bias;
pub mod hysteresis;

// --- RE-EXPORTACIONES SOBERANAS ---

pub use errors::MonitorError;
pub use reference::{FeatureReference, ReferenceSnapshot};
pub use drift::{analyze_data_drift, DriftFinding};
pub use concept::{analyze_concept_drift, ConceptFinding};
pub use bias::{analyze_bias, BiasFinding, BiasThresholds, GroupObservation};
pub use hysteresis::{effective_prior_status, should_emit_alert};
