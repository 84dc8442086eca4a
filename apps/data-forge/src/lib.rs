// [apps/data-forge/src/lib.rs]
/*!
 * =================================================================
 * APARATO: DATA FORGE LIBRARY ROOT (V10.0 - SOVEREIGN AUTHORITY)
 * =================================================================
 */

/// Motor de síntesis determinista de transacciones.
pub mod generator;

pub use generator::{SynthesisProfile, TransactionSynthesizer};
