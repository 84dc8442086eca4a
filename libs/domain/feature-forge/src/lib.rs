// [libs/domain/feature-forge/src/lib.rs]
/*!
 * =================================================================
 * APARATO: FEATURE FORGE HUB (V25.0 - EXPORTS LEVELED)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DE LA FORJA DE FEATURES
 * =================================================================
 */

pub mod errors;
pub mod records;
pub mod calendar;
pub mod families;
pub mod selection;
pub mod pipeline;

// --- RE-EXPORTACIONES SOBERANAS ---

pub use errors::ForgeError;
pub use records::{parse_transaction_csv, records_to_csv, TransactionRecord};
pub use calendar::{FixedDateHolidayCalendar, HolidayCalendar};
pub use selection::{run_selection_cascade, SelectionOutcome};
pub use pipeline::{FeatureForgePipeline, ForgeOutcome};
