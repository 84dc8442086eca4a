// [libs/domain/models/src/monitoring.rs]
/*!
 * =================================================================
 * APARATO: MONITORING METRICS DOMAIN MODEL (V30.2 - BANDS LEVELED)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DE MÉTRICAS DE DERIVA Y SESGO
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

/// Familia de vigilancia que produjo la métrica.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MonitorKind {
    /// Deriva distribucional de features de entrada.
    DataDrift,
    /// Degradación de desempeño contra baselines.
    ConceptDrift,
    /// Disparidad entre grupos protegidos.
    Bias,
}

impl MonitorKind {
    /// Etiqueta canónica persistida y usada en claves de deduplicación.
    pub fn canonical_tag(&self) -> &'static str {
        match self {
            Self::DataDrift => "data_drift",
            Self::ConceptDrift => "concept_drift",
            Self::Bias => "bias",
        }
    }
}

/// Banda semafórica de severidad de una métrica vigilada.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricStatus {
    /// Dentro de los parámetros nominales.
    Ok,
    /// Desviación que exige observación.
    Warning,
    /// Desviación que exige intervención.
    Critical,
}

/// Fila de métrica de deriva (distribucional o de concepto).
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriftMetricRecord {
    /// Identificador único universal.
    #[typeshare(serialized_as = "string")]
    pub id: Uuid,
    /// Modelo vigilado.
    #[typeshare(serialized_as = "string")]
    pub model_id: Uuid,
    /// Familia de vigilancia.
    pub kind: MonitorKind,
    /// Feature (data drift) o métrica de modelo (concept drift) observada.
    pub feature_name: String,
    /// Nombre del estadístico ("psi", "ks_statistic", "chi_square_p", ...).
    pub metric_name: String,
    /// Valor observado del estadístico.
    pub value: f64,
    /// Banda semafórica resultante.
    pub status: MetricStatus,
    /// Inicio de la ventana corriente evaluada.
    #[typeshare(serialized_as = "string")]
    pub window_start: DateTime<Utc>,
    /// Fin de la ventana corriente evaluada.
    #[typeshare(serialized_as = "string")]
    pub window_end: DateTime<Utc>,
    /// Marca del cómputo.
    #[typeshare(serialized_as = "string")]
    pub computed_at: DateTime<Utc>,
}

/// Fila de métrica de equidad por atributo protegido.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BiasMetricRecord {
    /// Identificador único universal.
    #[typeshare(serialized_as = "string")]
    pub id: Uuid,
    /// Modelo vigilado.
    #[typeshare(serialized_as = "string")]
    pub model_id: Uuid,
    /// Atributo protegido configurado (ej. "customer_segment").
    pub protected_attribute: String,
    /// Métrica de equidad ("demographic_parity_difference", "disparate_impact",
    /// "equalized_odds_difference", "fpr_parity_difference").
    pub metric_name: String,
    /// Valor observado.
    pub value: f64,
    /// Banda semafórica resultante.
    pub status: MetricStatus,
    /// Inicio de la ventana evaluada.
    #[typeshare(serialized_as = "string")]
    pub window_start: DateTime<Utc>,
    /// Fin de la ventana evaluada.
    #[typeshare(serialized_as = "string")]
    pub window_end: DateTime<Utc>,
    /// Marca del cómputo.
    #[typeshare(serialized_as = "string")]
    pub computed_at: DateTime<Utc>,
}
