// [libs/domain/models/src/faults.rs]
/*!
 * =================================================================
 * APARATO: FAULT TAXONOMY CONTRACT (V30.0 - TRANSPORT AGNOSTIC)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CLASIFICACIÓN SEMÁNTICA UNIFICADA DE FALLOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. BOUNDARY TRANSLATION: Cada crate traduce sus fallos nativos a esta
 *    taxonomía en su frontera; el interior conserva errores tipados ricos.
 * 2. RETRY SEMANTICS: La clase determina la política de reintento
 *    (backoff exponencial acotado para UpstreamUnavailable en trabajos
 *    de fondo; fail-fast en el plano de servicio).
 * =================================================================
 */

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

/// Taxonomía de fallos independiente del transporte.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FaultClass {
    /// Entrada malformada, esquema inválido o enum desconocido. Sin reintento.
    Validation,
    /// CAS optimista perdido o invariante violado. Reintento tras re-lectura.
    ConflictingState,
    /// Entidad inexistente.
    NotFound,
    /// Cola llena, presupuesto de memoria o tamaño de artefacto excedido.
    ResourceExhausted,
    /// Digest SHA-256 no coincide en lectura; dispara rollback de modelo.
    ArtifactCorrupted,
    /// Catálogo, bóveda o caché inalcanzables. Backoff acotado en fondo.
    UpstreamUnavailable,
    /// Cancelación cooperativa observada.
    Cancelled,
    /// Invariante interno roto; registrado con contexto completo.
    Internal,
}

impl FaultClass {
    /// Política de reintento de trabajos de fondo para esta clase.
    pub fn is_retryable_in_background(&self) -> bool {
        matches!(self, Self::UpstreamUnavailable | Self::Internal)
    }

    /// Clases que justifican la emisión de una alerta operativa.
    pub fn warrants_alert(&self) -> bool {
        matches!(self, Self::ArtifactCorrupted | Self::Internal | Self::UpstreamUnavailable)
    }
}

impl std::fmt::Display for FaultClass {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Validation => "VALIDATION",
            Self::ConflictingState => "CONFLICTING_STATE",
            Self::NotFound => "NOT_FOUND",
            Self::ResourceExhausted => "RESOURCE_EXHAUSTED",
            Self::ArtifactCorrupted => "ARTIFACT_CORRUPTED",
            Self::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            Self::Cancelled => "CANCELLED",
            Self::Internal => "INTERNAL",
        };
        write!(formatter, "{}", label)
    }
}
