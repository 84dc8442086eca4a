// [libs/infra/catalog/src/repositories/mod.rs]
/*!
 * =================================================================
 * APARATO: REPOSITORY ACCESS MATRIX (V41.0 - TOPOLOGY MASTER)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: ORQUESTACIÓN DE SUBSISTEMAS DE PERSISTENCIA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ACCESS SOVEREIGNTY: Centraliza la visibilidad de los repositorios
 *    para la inyección de dependencias en la Torre de Control.
 * 2. MAPPING HELPERS: Conversión uniforme de tipos SQLite <-> dominio
 *    compartida por todos los estratos de persistencia.
 *
 * # Mathematical Proof (Modular Encapsulation):
 * El barrel file actúa como una interfaz galvánica. Los sub-módulos
 * permanecen aislados, y solo las estructuras de autoridad (Repositories)
 * son expuestas al exterior, reduciendo el acoplamiento sistémico.
 * =================================================================
 */

// --- ESTRATO 1: LINAJE DE DATOS (C2/C3) ---

/// Gestión de datasets versionados inmutables.
pub mod dataset;
/// Gestión de FeatureSets y su contrato de extracción.
pub mod feature_set;

// --- ESTRATO 2: REGISTRO Y SERVICIO (C5/C6) ---

/// Registro de modelos, baselines y transacción de promoción.
pub mod model;
/// Log inmutable de predicciones y backfill de etiquetas.
pub mod prediction;

// --- ESTRATO 3: VIGILANCIA Y ALERTAS (C7/C8) ---

/// Filas de métricas de deriva y sesgo con rastro de estados.
pub mod metric;
/// Alertas deduplicadas con ciclo de vida.
pub mod alert;

// --- ESTRATO 4: ORQUESTACIÓN (C9/C10/C11) ---

/// Ledger de trabajos (CAS, idempotencia, arrendamientos).
pub mod job;
/// Disparadores recurrentes con reclamación CAS.
pub mod schedule;
/// Máquina de estados de reentrenamiento.
pub mod retrain;

// --- ESTRATO 5: SISTEMA Y AUDITORÍA ---

/// Flags operativos y rastro de auditoría.
pub mod system;

// --- RE-EXPORTACIONES SOBERANAS (NOMINAL ACCESS API) ---

pub use ab_test::AbTestRepository;
pub use alert::AlertRepository;
pub use dataset::DatasetRepository;
pub use feature_set::FeatureSetRepository;
pub use job::JobRepository;
pub use metric::MetricRepository;
pub use model::{BaselineNotMet, ModelRepository};
pub use prediction::PredictionRepository;
pub use retrain::RetrainRepository;
pub use schedule::ScheduleRepository;
pub use system::SystemRepository;

use crate::errors::CatalogError;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Proyecta un texto opcional hacia el valor SQL (NULL ante ausencia).
pub(crate) fn optional_text<TextT: Into<String>>(value: Option<TextT>) -> libsql::Value {
    match value {
        Some(text) => libsql::Value::Text(text.into()),
        None => libsql::Value::Null,
    }
}

/// Proyecta un entero opcional hacia el valor SQL (NULL ante ausencia).
pub(crate) fn optional_integer(value: Option<i64>) -> libsql::Value {
    match value {
        Some(number) => libsql::Value::Integer(number),
        None => libsql::Value::Null,
    }
}

/// Parsea una marca temporal RFC 3339 persistida.
pub(crate) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, CatalogError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|stamped| stamped.with_timezone(&Utc))
        .map_err(|fault| CatalogError::MappingError(format!("timestamp '{}': {}", raw, fault)))
}

/// Parsea un identificador UUID persistido.
pub(crate) fn parse_identifier(raw: &str) -> Result<Uuid, CatalogError> {
    Uuid::parse_str(raw)
        .map_err(|fault| CatalogError::MappingError(format!("identifier '{}': {}", raw, fault)))
}

/// Deserializa una columna JSON al tipo de dominio.
pub(crate) fn parse_json_column<T: serde::de::DeserializeOwned>(
    raw: &str,
    column_label: &str,
) -> Result<T, CatalogError> {
    serde_json::from_str(raw).map_err(|fault| {
        CatalogError::MappingError(format!("json column '{}': {}", column_label, fault))
    })
}

/// Serializa un valor de dominio hacia una columna JSON.
pub(crate) fn to_json_column<T: serde::Serialize>(
    value: &T,
    column_label: &str,
) -> Result<String, CatalogError> {
    serde_json::to_string(value).map_err(|fault| {
        CatalogError::MappingError(format!("json column '{}': {}", column_label, fault))
    })
}
