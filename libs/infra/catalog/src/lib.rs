// [libs/infra/catalog/src/lib.rs]
/*!
 * =================================================================
 * APARATO: METADATA CATALOG HUB (V40.0 - EXPORTS LEVELED)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DEL CATÁLOGO TRANSACCIONAL
 * =================================================================
 */

pub mod errors;
pub mod client;
pub mod schema;
pub mod feed;
pub mod retry;
pub mod repositories;

// --- RE-EXPORTACIONES SOBERANAS ---

pub use client::CatalogClient;
pub use errors::CatalogError;
pub use feed::CatalogFeed;
pub use retry::{retry_with_backoff, BackoffPolicy};
pub use repositories::{
    AbTestRepository, AlertRepository, BaselineNotMet, DatasetRepository, FeatureSetRepository,
    JobRepository, MetricRepository, ModelRepository, PredictionRepository, RetrainRepository,
    ScheduleRepository, SystemRepository,
};
