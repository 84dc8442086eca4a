// [libs/domain/models/src/model.rs]
/*!
 * =================================================================
 * APARATO: MODEL REGISTRY DOMAIN MODEL (V31.0 - PROMOTION SEALED)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DE CICLO DE VIDA DE MODELOS Y BASELINES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SINGLE PRODUCTION INVARIANT: El estado PRODUCTION es globalmente
 *    exclusivo; la máquina de estados local valida transiciones y el
 *    catálogo las sella con índice único parcial.
 * 2. DUAL ARTIFACT REFS: Forma nativa y forma portable con digest SHA-256
 *    computado sobre la portable.
 * 3. FEATURE CONTRACT BINDING: El modelo referencia su FeatureSet por id
 *    Y por schema_hash, cerrando la puerta al skew de servicio.
 *
 * # Mathematical Proof (Lifecycle Lattice):
 * TRAINED -> STAGING -> PRODUCTION -> ARCHIVED con reversas permitidas
 * únicamente STAGING -> TRAINED y PRODUCTION -> ARCHIVED. El conjunto de
 * transiciones válidas forma un orden parcial sin ciclos, garantizando
 * terminación de cualquier historia de promociones.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use typeshare::typeshare;
use uuid::Uuid;

/// Algoritmos de entrenamiento soportados por el motor C4.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AlgorithmKind {
    /// Bosque de aislamiento para detección no supervisada.
    IsolationForest,
    /// Gradient boosting con crecimiento por niveles.
    XgboostLike,
    /// Gradient boosting con crecimiento por hojas.
    LightgbmLike,
    /// Bagging de árboles de decisión.
    RandomForest,
    /// Perceptrón multicapa compacto de una capa oculta.
    SmallNn,
}

impl AlgorithmKind {
    /// Etiqueta canónica persistida en el catálogo.
    pub fn canonical_tag(&self) -> &'static str {
        match self {
            Self::IsolationForest => "isolation_forest",
            Self::XgboostLike => "xgboost_like",
            Self::LightgbmLike => "lightgbm_like",
            Self::RandomForest => "random_forest",
            Self::SmallNn => "small_nn",
        }
    }
}

/// Estrategia de compensación de desbalance de clases.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ImbalanceStrategy {
    /// Ponderación inversa a la frecuencia de clase.
    ClassWeight,
    /// Sobremuestreo sintético por interpolación de vecinos.
    Smote,
    /// Submuestreo aleatorio de la clase mayoritaria.
    Undersample,
}

/// Ciclo de vida del modelo en el registro.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModelStage {
    /// Entrenado y evaluado; fuera de cualquier plano de servicio.
    Trained,
    /// Candidato en antesala de promoción.
    Staging,
    /// Sirviendo tráfico; globalmente único.
    Production,
    /// Retirado; reversible solo mediante promoción explícita.
    Archived,
}

impl ModelStage {
    /// Valida la legalidad de una transición del retículo de ciclo de vida.
    pub fn can_transition_to(&self, target_stage: ModelStage) -> bool {
        matches!(
            (self, target_stage),
            (Self::Trained, Self::Staging)
                | (Self::Staging, Self::Production)
                | (Self::Staging, Self::Trained)
                | (Self::Production, Self::Archived)
                | (Self::Staging, Self::Archived)
                | (Self::Trained, Self::Archived)
                | (Self::Archived, Self::Production)
        )
    }

    /// Etiqueta canónica persistida en el catálogo.
    pub fn canonical_tag(&self) -> &'static str {
        match self {
            Self::Trained => "TRAINED",
            Self::Staging => "STAGING",
            Self::Production => "PRODUCTION",
            Self::Archived => "ARCHIVED",
        }
    }
}

/// Métricas de evaluación selladas en el registro del modelo.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMetrics {
    /// Precisión sobre el split de prueba.
    pub precision: f64,
    /// Exhaustividad sobre el split de prueba.
    pub recall: f64,
    /// Media armónica de precisión y exhaustividad.
    pub f1_score: f64,
    /// Área bajo la curva ROC.
    pub auc_roc: f64,
    /// Tasa de falsos positivos al umbral de decisión.
    pub false_positive_rate: f64,
    /// Umbral de decisión usado en la evaluación.
    pub decision_threshold: f64,
}

impl ModelMetrics {
    /// Resuelve una métrica por nombre canónico para la validación de baselines.
    pub fn metric_by_name(&self, metric_name: &str) -> Option<f64> {
        match metric_name {
            "precision" => Some(self.precision),
            "recall" => Some(self.recall),
            "f1_score" | "f1" => Some(self.f1_score),
            "auc_roc" | "auc" => Some(self.auc_roc),
            "false_positive_rate" | "fpr" => Some(self.false_positive_rate),
            _ => None,
        }
    }
}

/// Importancia global de una feature dentro del modelo ajustado.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureWeight {
    /// Nombre nominal de la feature.
    pub feature_name: String,
    /// Peso de importancia normalizado en [0, 1].
    pub importance: f64,
}

/// Operador relacional de un baseline.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BaselineOperator {
    /// Métrica >= umbral.
    GreaterOrEqual,
    /// Métrica <= umbral.
    LessOrEqual,
    /// Métrica > umbral.
    Greater,
    /// Métrica < umbral.
    Less,
    /// Métrica == umbral (tolerancia 1e-9).
    Equal,
}

impl BaselineOperator {
    /// Evalúa el predicado del operador sobre un valor observado.
    pub fn is_satisfied(&self, observed_value: f64, threshold: f64) -> bool {
        match self {
            Self::GreaterOrEqual => observed_value >= threshold,
            Self::LessOrEqual => observed_value <= threshold,
            Self::Greater => observed_value > threshold,
            Self::Less => observed_value < threshold,
            Self::Equal => (observed_value - threshold).abs() < 1e-9,
        }
    }
}

/// Umbral de métrica exigido en promoción y vigilado en producción.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Baseline {
    /// Modelo propietario del baseline.
    #[typeshare(serialized_as = "string")]
    pub model_id: Uuid,
    /// Nombre canónico de la métrica vigilada.
    pub metric_name: String,
    /// Umbral exigido.
    pub threshold: f64,
    /// Operador relacional del contrato.
    pub operator: BaselineOperator,
}

impl Baseline {
    /// Verifica el baseline contra el set de métricas del modelo.
    pub fn is_met_by(&self, metrics: &ModelMetrics) -> bool {
        metrics
            .metric_by_name(&self.metric_name)
            .map(|observed| self.operator.is_satisfied(observed, self.threshold))
            .unwrap_or(false)
    }
}

/// Entidad soberana del registro de modelos.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRecord {
    /// Identificador único universal.
    #[typeshare(serialized_as = "string")]
    pub id: Uuid,
    /// Algoritmo de entrenamiento utilizado.
    pub algorithm: AlgorithmKind,
    /// Mapa de hiperparámetros sellado en el entrenamiento.
    pub hyperparameters: BTreeMap<String, serde_json::Value>,
    /// FeatureSet exacto referenciado por identidad.
    #[typeshare(serialized_as = "string")]
    pub feature_set_id: Uuid,
    /// Schema hash del FeatureSet (doble anclaje anti-skew).
    pub schema_hash: String,
    /// Métricas de evaluación sobre el split de prueba.
    pub metrics: ModelMetrics,
    /// Importancia global por feature.
    pub feature_importance: Vec<FeatureWeight>,
    /// Orden de features exigido en el servicio (== FeatureSet.selected).
    pub feature_names: Vec<String>,
    /// Referencia al artefacto nativo en la bóveda.
    pub native_artifact_reference: String,
    /// Referencia al artefacto portable en la bóveda.
    pub portable_artifact_reference: String,
    /// SHA-256 hexadecimal computado sobre la forma portable.
    pub checksum_hexadecimal: String,
    /// Etapa del ciclo de vida.
    pub stage: ModelStage,
    /// Justificación técnica del archivado ("superseded", "corrupted", ...).
    pub archived_reason: Option<String>,
    /// Marca de la última promoción a PRODUCTION.
    #[typeshare(serialized_as = "string")]
    pub promoted_at: Option<DateTime<Utc>>,
    /// Marca del sellado de entrenamiento.
    #[typeshare(serialized_as = "string")]
    pub trained_at: DateTime<Utc>,
    /// Marca de creación UTC.
    #[typeshare(serialized_as = "string")]
    pub created_at: DateTime<Utc>,
}
