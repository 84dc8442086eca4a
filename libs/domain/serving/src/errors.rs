// [libs/domain/serving/src/errors.rs]
/*!
 * =================================================================
 * APARATO: SERVING ERROR CATALOG (V22.0 - BOUNDARY SHIELD)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: TAXONOMÍA DE FALLOS DEL PLANO DE SERVICIO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. NO RAW STORAGE ERRORS: El plano de servicio jamás expone fallos
 *    crudos de almacenamiento; degrada la respuesta o reporta
 *    UpstreamUnavailable.
 * =================================================================
 */

use aegis_domain_models::FaultClass;
use thiserror::Error;

/// Fallos del plano de servicio C6.
#[derive(Error, Debug)]
pub enum ServingError {
    /// Features requeridas ausentes de la solicitud (4xx-equivalente).
    #[error("[L2_SERVING_FAULT]: FEATURE_MISSING -> {0:?}")]
    FeatureMissing(Vec<String>),

    /// Sin modelo PRODUCTION cargado en el puntero caliente.
    #[error("[L2_SERVING_FAULT]: MODEL_UNAVAILABLE")]
    ModelUnavailable,

    /// El artefacto de modelo no honra su checksum (dispara rollback).
    #[error("[L2_SERVING_FAULT]: ARTIFACT_CORRUPTED -> expected {expected}, observed {observed}")]
    ArtifactCorrupted {
        /// Digest sellado en el registro.
        expected: String,
        /// Digest recomputado de los bytes cargados.
        observed: String,
    },

    /// Decodificación del artefacto portable rechazada.
    #[error("[L2_SERVING_FAULT]: MODEL_DECODE_REJECTED -> {0}")]
    ModelDecodeRejected(String),

    /// Catálogo o caché inalcanzables tras la vía de recomputación.
    #[error("[L2_SERVING_FAULT]: UPSTREAM_UNAVAILABLE -> {0}")]
    UpstreamUnavailable(String),

    /// Invariante interno roto en el plano de servicio.
    #[error("[L2_SERVING_FAULT]: INTERNAL_COLLAPSE -> {0}")]
    Internal(String),
}

impl ServingError {
    /// Proyección sobre la taxonomía transport-agnóstica del dominio.
    pub fn fault_class(&self) -> FaultClass {
        match self {
            Self::FeatureMissing(_) => FaultClass::Validation,
            Self::ModelUnavailable => FaultClass::UpstreamUnavailable,
            Self::ArtifactCorrupted { .. } => FaultClass::ArtifactCorrupted,
            Self::ModelDecodeRejected(_) => FaultClass::ArtifactCorrupted,
            Self::UpstreamUnavailable(_) => FaultClass::UpstreamUnavailable,
            Self::Internal(_) => FaultClass::Internal,
        }
    }
}
