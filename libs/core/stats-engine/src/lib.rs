// [libs/core/stats-engine/src/lib.rs]
/*!
 * =================================================================
 * APARATO: STATS ENGINE HUB (V14.0 - EXPORTS LEVELED)
 * CLASIFICACIÓN: CORE MATH (ESTRATO L1)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DEL NÚCLEO ESTADÍSTICO
 * =================================================================
 */

pub mod errors;
pub mod special;
pub mod descriptive;
pub mod histogram;
pub mod divergence;
pub mod association;
pub mod hypothesis;

// --- RE-EXPORTACIONES SOBERANAS ---

pub use errors::StatsError;
pub use descriptive::{sample_mean, sample_variance, sample_standard_deviation, quantile};
pub use histogram::{HistogramSpec, bin_proportions};
pub use divergence::{
    population_stability_index, kolmogorov_smirnov, chi_square_categorical,
    KsOutcome, ChiSquareOutcome,
};
pub use association::{pearson_correlation, mutual_information_discrete, mutual_information_continuous};
pub use hypothesis::{two_proportion_z_test, ZTestOutcome};
