// [libs/domain/feature-forge/src/errors.rs]
/*!
 * =================================================================
 * APARATO: FORGE ERROR CATALOG (V25.0 - SOBERANO)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE LA FORJA
 * =================================================================
 */

use aegis_core_learners::LearnerError;
use aegis_core_stats::StatsError;
use aegis_domain_models::FaultClass;
use thiserror::Error;

/// Fallos de la forja de features.
#[derive(Error, Debug)]
pub enum ForgeError {
    /// Entrada rechazada antes de la etapa 1 (dataset vacío, columna ausente).
    #[error("[L2_FORGE_FAULT]: VALIDATION_REJECTED -> {0}")]
    Validation(String),

    /// Fila cruda malformada durante la decodificación CSV.
    #[error("[L2_FORGE_FAULT]: RECORD_DECODE_REJECTED -> line {line}: {detail}")]
    RecordDecode {
        /// Línea ofensora (1-indexada, cabecera incluida).
        line: usize,
        /// Detalle técnico del rechazo.
        detail: String,
    },

    /// Falla del núcleo estadístico durante la selección.
    #[error("[L2_FORGE_FAULT]: STATS_KERNEL_FAULT -> {0}")]
    Stats(#[from] StatsError),

    /// Falla del núcleo de aprendizaje durante la etapa 4.
    #[error("[L2_FORGE_FAULT]: LEARNER_KERNEL_FAULT -> {0}")]
    Learner(#[from] LearnerError),

    /// La cascada de selección no dejó ninguna feature superviviente.
    #[error("[L2_FORGE_FAULT]: SELECTION_COLLAPSED -> {0}")]
    SelectionCollapsed(String),
}

impl ForgeError {
    /// Proyección sobre la taxonomía transport-agnóstica del dominio.
    pub fn fault_class(&self) -> FaultClass {
        match self {
            Self::Validation(_) | Self::RecordDecode { .. } => FaultClass::Validation,
            Self::Stats(_) | Self::Learner(_) | Self::SelectionCollapsed(_) => FaultClass::Internal,
        }
    }
}
