// [libs/domain/models/src/dataset.rs]
/*!
 * =================================================================
 * APARATO: DATASET DOMAIN MODEL (V30.0 - IMMUTABLE LEDGER)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO SOBERANO DE DATOS TABULARES VERSIONADOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. VERSIONED LINEAGE: Cada (name, version) es una entidad nueva e
 *    inmutable; el enlace al padre preserva la genealogía completa.
 * 2. CHECKSUM SOVEREIGNTY: El digest SHA-256 del blob sella la identidad
 *    física del dataset contra corrupción silenciosa.
 * 3. NOMINAL PRECISION: Nomenclatura nominal absoluta en todos los campos.
 *
 * # Mathematical Proof (Immutability):
 * Una vez que el dataset alcanza el estado ACTIVE, ninguna operación del
 * catálogo permite mutar su esquema ni su blob. Toda evolución se expresa
 * como una versión nueva con 'parent_dataset_id' poblado.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

/// Tipos lógicos de columna soportados por el pipeline tabular.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Enteros con signo de 64 bits.
    Integer,
    /// Punto flotante de doble precisión.
    Float,
    /// Texto UTF-8 arbitrario (categóricas incluidas).
    Text,
    /// Bandera booleana.
    Boolean,
    /// Marca temporal UTC (RFC 3339 en reposo).
    Timestamp,
}

/// Definición ordenada de una columna dentro del esquema del dataset.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnSpec {
    /// Nombre nominal de la columna.
    pub name: String,
    /// Tipo lógico declarado.
    pub dtype: ColumnType,
    /// Admisión de valores ausentes.
    pub nullable: bool,
}

/// Ciclo de vida del dataset dentro del catálogo.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DatasetStatus {
    /// Ingesta o validación en curso; aún mutable.
    Processing,
    /// Sellado e inmutable; apto para pipelines de features.
    Active,
    /// Retirado de circulación; preservado para linaje.
    Archived,
}

/// Entidad soberana de datos tabulares de transacciones.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    /// Identificador único universal de la entidad.
    #[typeshare(serialized_as = "string")]
    pub id: Uuid,
    /// Nombre lógico compartido entre versiones.
    pub name: String,
    /// Versión monótona dentro del linaje del nombre.
    pub version: u32,
    /// Enlace genealógico a la versión precedente.
    #[typeshare(serialized_as = "string")]
    pub parent_dataset_id: Option<Uuid>,
    /// Volumen de filas certificado en la ingesta.
    #[typeshare(serialized_as = "number")]
    pub row_count: u64,
    /// Cantidad de columnas del esquema sellado.
    pub column_count: u32,
    /// Esquema ordenado (nombre, tipo, nulabilidad).
    pub schema: Vec<ColumnSpec>,
    /// Digest SHA-256 hexadecimal del blob de origen.
    pub content_checksum: String,
    /// Referencia al blob en la bóveda de artefactos (namespace/uuid).
    pub blob_reference: String,
    /// Estado del ciclo de vida.
    pub status: DatasetStatus,
    /// Marca de creación UTC.
    #[typeshare(serialized_as = "string")]
    pub created_at: DateTime<Utc>,
    /// Última transición de estado UTC.
    #[typeshare(serialized_as = "string")]
    pub updated_at: DateTime<Utc>,
}

impl Dataset {
    /// Localiza la posición ordinal de una columna por nombre.
    pub fn column_position(&self, column_name: &str) -> Option<usize> {
        self.schema.iter().position(|column| column.name == column_name)
    }
}
