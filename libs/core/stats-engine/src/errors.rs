// [libs/core/stats-engine/src/errors.rs]
/*!
 * =================================================================
 * APARATO: STATS ERROR CATALOG (V14.0 - SOBERANO)
 * CLASIFICACIÓN: CORE MATH (ESTRATO L1)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS NUMÉRICOS
 * =================================================================
 */

use thiserror::Error;

/// Fallos del núcleo estadístico.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatsError {
    /// La muestra de entrada está vacía.
    #[error("[L1_STATS_FAULT]: EMPTY_SAMPLE -> {0}")]
    EmptySample(String),

    /// Las muestras pareadas difieren en longitud.
    #[error("[L1_STATS_FAULT]: LENGTH_MISMATCH -> expected {expected}, observed {observed}")]
    LengthMismatch {
        /// Longitud esperada.
        expected: usize,
        /// Longitud observada.
        observed: usize,
    },

    /// La distribución carece de la variación requerida por el estimador.
    #[error("[L1_STATS_FAULT]: DEGENERATE_DISTRIBUTION -> {0}")]
    DegenerateDistribution(String),

    /// Parámetro fuera del dominio del estimador.
    #[error("[L1_STATS_FAULT]: INVALID_PARAMETER -> {0}")]
    InvalidParameter(String),
}
