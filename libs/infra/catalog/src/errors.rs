// [libs/infra/catalog/src/errors.rs]
/*!
 * =================================================================
 * APARATO: CATALOG ERROR CATALOG (V40.1 - SOBERANO)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE PERSISTENCIA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TAXONOMY BRIDGE: Cada variante se proyecta sobre la taxonomía
 *    transport-agnóstica del dominio vía 'fault_class()'.
 * 2. CAS AWARENESS: 'ConflictingState' transporta el estado esperado y
 *    el observado para el reintento informado del llamador.
 * 3. ZERO ABBREVIATIONS: Nomenclatura nominal absoluta.
 * =================================================================
 */

use aegis_domain_models::FaultClass;
use thiserror::Error;

/// Fallos del catálogo de metadatos.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Error de enlace físico o de red con el cluster libSQL.
    #[error("[L3_CATALOG_NET_FAULT]: DATABASE_UPLINK_SEVERED -> {0}")]
    ConnectionError(String),

    /// Fallo en la configuración del entorno (variables vacías o malformadas).
    #[error("[L3_CATALOG_CONFIG_FAULT]: STRATEGIC_ENV_VOID -> {0}")]
    ConfigurationError(String),

    /// Error de sintaxis o ejecución devuelto por el motor libSQL.
    #[error("[L3_CATALOG_QUERY_FAULT]: SQL_QUERY_REJECTED -> {0}")]
    QueryError(#[from] libsql::Error),

    /// Fallo en la transformación de tipos entre SQLite y el dominio Rust.
    #[error("[L3_CATALOG_MAPPING_FAULT]: DATA_MAPPING_VIOLATION -> {0}")]
    MappingError(String),

    /// La entidad solicitada no existe en las tablas activas.
    #[error("[L3_CATALOG_FAULT]: ENTITY_NOT_FOUND -> {0}")]
    NotFound(String),

    /// CAS optimista perdido: el estado corriente difiere del esperado.
    #[error("[L3_CATALOG_FAULT]: CONFLICTING_STATE -> entity {entity}, expected {expected}, observed {observed}")]
    ConflictingState {
        /// Entidad afectada.
        entity: String,
        /// Estado exigido por el CAS.
        expected: String,
        /// Estado observado en el catálogo.
        observed: String,
    },

    /// Entrada rechazada antes de tocar el almacenamiento.
    #[error("[L3_CATALOG_FAULT]: VALIDATION_REJECTED -> {0}")]
    Validation(String),

    /// Los baselines activos del modelo objetivo no se satisfacen.
    #[error("[L3_CATALOG_FAULT]: BASELINES_NOT_MET -> {0:?}")]
    BaselinesNotMet(Vec<String>),

    /// Error al comprometer cambios en una secuencia multi-tabla.
    #[error("[L3_CATALOG_FAULT]: TRANSACTION_COLLAPSE")]
    TransactionError,
}

impl CatalogError {
    /// Proyección sobre la taxonomía transport-agnóstica del dominio.
    pub fn fault_class(&self) -> FaultClass {
        match self {
            Self::ConnectionError(_) | Self::QueryError(_) | Self::TransactionError => {
                FaultClass::UpstreamUnavailable
            }
            Self::ConfigurationError(_) | Self::Validation(_) | Self::BaselinesNotMet(_) => {
                FaultClass::Validation
            }
            Self::MappingError(_) => FaultClass::Internal,
            Self::NotFound(_) => FaultClass::NotFound,
            Self::ConflictingState { .. } => FaultClass::ConflictingState,
        }
    }
}
