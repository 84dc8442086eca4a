// [libs/domain/models/src/feature.rs]
/*!
 * =================================================================
 * APARATO: FEATURE SET DOMAIN MODEL (V30.4 - SCHEMA HASH SEALED)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DE EXTRACCIÓN Y SELECCIÓN DE FEATURES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SCHEMA HASH SOVEREIGNTY: El digest SHA-256 sobre la lista ordenada
 *    (nombre, dtype) es la única identidad del contrato de extracción
 *    visto por el plano de servicio.
 * 2. STAGE TRACEABILITY: Cada feature seleccionada conserva los puntajes
 *    de las cuatro etapas de selección para auditoría retrospectiva.
 * 3. NOMINAL PURITY: Erradicación total de abreviaciones.
 *
 * # Mathematical Proof (Training-Serving Consistency):
 * Sea S la lista ordenada de pares (nombre, dtype) seleccionados. El hash
 * H = SHA256(S) es invariante ante reconstrucciones con configuración
 * distinta que produzcan el mismo S, y cualquier divergencia de contrato
 * entre entrenamiento y servicio produce H' != H detectable en O(1).
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use typeshare::typeshare;
use uuid::Uuid;

/// Tipo físico de una feature computada.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FeatureDtype {
    /// Valor continuo de doble precisión.
    Continuous,
    /// Valor entero o conteo discreto.
    Discrete,
    /// Bandera binaria {0.0, 1.0}.
    Binary,
}

impl FeatureDtype {
    /// Etiqueta canónica usada en el cómputo del schema hash.
    pub fn canonical_label(&self) -> &'static str {
        match self {
            Self::Continuous => "continuous",
            Self::Discrete => "discrete",
            Self::Binary => "binary",
        }
    }
}

/// Configuración declarativa del pipeline de ingeniería de features.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureConfig {
    /// Familia de transformaciones sobre la transacción individual.
    pub enable_transaction_family: bool,
    /// Familia de agregados históricos por usuario.
    pub enable_behavioral_family: bool,
    /// Familia de señales temporales (hora, festivo, antigüedad).
    pub enable_temporal_family: bool,
    /// Familia de agregados sobre ventanas móviles ancladas al evento.
    pub enable_aggregation_family: bool,
    /// Ventanas móviles en horas {1, 6, 24, 168, 720}.
    pub aggregation_window_hours: Vec<u32>,
    /// Umbral mínimo de varianza para la etapa 1.
    pub variance_threshold: f64,
    /// Umbral |r| de Pearson para la poda por colinealidad (etapa 2).
    pub correlation_threshold: f64,
    /// Vecindario k del estimador de información mutua (etapa 3).
    pub mutual_information_neighbors: u32,
    /// Cardinalidad máxima del subconjunto final seleccionado.
    pub max_features: u32,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            enable_transaction_family: true,
            enable_behavioral_family: true,
            enable_temporal_family: true,
            enable_aggregation_family: true,
            aggregation_window_hours: vec![1, 6, 24, 168, 720],
            variance_threshold: 0.01,
            correlation_threshold: 0.95,
            mutual_information_neighbors: 5,
            max_features: 30,
        }
    }
}

/// Ciclo de vida del cómputo de un FeatureSet.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeatureSetStatus {
    /// Registrado, pendiente de ejecución.
    Pending,
    /// Pipeline en curso.
    Running,
    /// Matriz publicada y schema hash sellado.
    Completed,
    /// Falla en alguna etapa; sin salida parcial publicada.
    Failed,
}

/// Feature sobreviviente del pipeline con su rastro de selección.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectedFeature {
    /// Nombre nominal de la feature.
    pub name: String,
    /// Tipo físico sellado en el contrato.
    pub dtype: FeatureDtype,
    /// Varianza muestral observada (etapa 1).
    pub variance_score: f64,
    /// Información mutua estimada contra la etiqueta (etapa 3).
    pub mutual_information_score: f64,
    /// Importancia del modelo sustituto (etapa 4).
    pub model_importance_score: f64,
    /// Puntaje combinado por promedio de rangos (0.5 / 0.5).
    pub combined_rank_score: f64,
}

/// Entidad de conjunto de features propiedad exclusiva de un Dataset.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSet {
    /// Identificador único universal.
    #[typeshare(serialized_as = "string")]
    pub id: Uuid,
    /// Dataset propietario (borrado en cascada).
    #[typeshare(serialized_as = "string")]
    pub dataset_id: Uuid,
    /// Configuración declarativa utilizada.
    pub config: FeatureConfig,
    /// Estado del ciclo de vida del cómputo.
    pub status: FeatureSetStatus,
    /// Lista completa de features generadas antes de la selección.
    pub generated_feature_names: Vec<String>,
    /// Subconjunto final ordenado con puntajes por etapa.
    pub selected_features: Vec<SelectedFeature>,
    /// SHA-256 del esquema ordenado (nombre, dtype) seleccionado.
    pub schema_hash: String,
    /// Referencia al artefacto de matriz columnar en la bóveda.
    pub matrix_artifact_reference: Option<String>,
    /// Mensaje técnico de falla cuando status = FAILED.
    pub error_message: Option<String>,
    /// Marca de creación UTC.
    #[typeshare(serialized_as = "string")]
    pub created_at: DateTime<Utc>,
    /// Última transición UTC.
    #[typeshare(serialized_as = "string")]
    pub updated_at: DateTime<Utc>,
}

impl FeatureSet {
    /// Lista ordenada de nombres seleccionados (contrato de servicio).
    pub fn selected_feature_names(&self) -> Vec<String> {
        self.selected_features.iter().map(|feature| feature.name.clone()).collect()
    }
}

/// Computa el digest SHA-256 canónico del esquema ordenado de features.
///
/// La representación canónica es `nombre:dtype` por línea, en el orden
/// final de selección. Dos reconstrucciones con configuración distinta que
/// produzcan el mismo esquema ordenado producen el mismo digest.
pub fn compute_schema_hash(ordered_schema: &[(String, FeatureDtype)]) -> String {
    let mut digest_engine = Sha256::new();
    for (feature_name, feature_dtype) in ordered_schema {
        digest_engine.update(feature_name.as_bytes());
        digest_engine.update(b":");
        digest_engine.update(feature_dtype.canonical_label().as_bytes());
        digest_engine.update(b"\n");
    }
    hex::encode(digest_engine.finalize())
}
