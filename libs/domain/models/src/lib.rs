// [libs/domain/models/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DOMAIN MODELS HUB (V30.2 - EXPORTS LEVELED)
 * =================================================================
 */

pub mod dataset;
pub mod feature;
pub mod model;
pub mod prediction;
pub mod monitoring;
pub mod alert;
pub mod job;
pub mod retrain;
pub mod abtest;
pub mod events;
pub mod faults;

// --- RE-EXPORTACIONES SOBERANAS ---

pub use dataset::{Dataset, DatasetStatus, ColumnSpec, ColumnType};
pub use feature::{
    FeatureConfig, FeatureSet, FeatureSetStatus, SelectedFeature, FeatureDtype,
    compute_schema_hash,
};
pub use model::{
    ModelRecord, ModelStage, AlgorithmKind, ImbalanceStrategy, ModelMetrics,
    Baseline, BaselineOperator, FeatureWeight,
};
pub use prediction::{PredictionRecord, Explanation, FeatureContribution};
pub use monitoring::{DriftMetricRecord, BiasMetricRecord, MetricStatus, MonitorKind};
pub use alert::{Alert, AlertSeverity, AlertStatus, AlertSourceKind, build_alert_dedup_key};
pub use job::{JobRecord, JobState, JobKind, JobPayload, RecurringSchedule};
pub use retrain::{RetrainJob, RetrainState, RetrainReason, MergeStrategy};
pub use abtest::{AbTest, AbTestState, AbRecommendation, AbVerdict};
pub use events::{ControlPlaneEvent, SystemPulse};
pub use faults::FaultClass;
