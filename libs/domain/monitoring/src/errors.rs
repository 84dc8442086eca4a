// [libs/domain/monitoring/src/errors.rs]
/*!
 * =================================================================
 * APARATO: MONITOR ERROR CATALOG (V16.0 - SOBERANO)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE VIGILANCIA
 * =================================================================
 */

use aegis_core_stats::StatsError;
use aegis_domain_models::FaultClass;
use thiserror::Error;

/// Fallos del motor de vigilancia C7.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// La ventana corriente carece de observaciones suficientes.
    #[error("[L2_MONITOR_FAULT]: WINDOW_UNDERPOPULATED -> {0}")]
    WindowUnderpopulated(String),

    /// La referencia congelada no cubre la feature solicitada.
    #[error("[L2_MONITOR_FAULT]: REFERENCE_FEATURE_ABSENT -> {0}")]
    ReferenceFeatureAbsent(String),

    /// Falla del núcleo estadístico.
    #[error("[L2_MONITOR_FAULT]: STATS_KERNEL_FAULT -> {0}")]
    Stats(#[from] StatsError),

    /// El atributo protegido configurado no existe en las observaciones.
    #[error("[L2_MONITOR_FAULT]: PROTECTED_ATTRIBUTE_ABSENT -> {0}")]
    ProtectedAttributeAbsent(String),
}

impl MonitorError {
    /// Proyección sobre la taxonomía transport-agnóstica del dominio.
    pub fn fault_class(&self) -> FaultClass {
        match self {
            Self::WindowUnderpopulated(_) | Self::ProtectedAttributeAbsent(_) => {
                FaultClass::Validation
            }
            Self::ReferenceFeatureAbsent(_) => FaultClass::Validation,
            Self::Stats(_) => FaultClass::Internal,
        }
    }
}
