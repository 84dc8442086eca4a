// [libs/domain/models/src/prediction.rs]
/*!
 * =================================================================
 * APARATO: PREDICTION LOG DOMAIN MODEL (V30.1 - APPEND ONLY)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DEL RASTRO INMUTABLE DE SCORING
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

/// Contribución firmada de una feature a un score individual.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureContribution {
    /// Nombre nominal de la feature.
    pub feature_name: String,
    /// Contribución firmada al score (positiva empuja hacia fraude).
    pub contribution: f64,
}

/// Explicación local top-k de una predicción individual.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Explanation {
    /// Features que más empujaron el score hacia fraude.
    pub top_positive: Vec<FeatureContribution>,
    /// Features que más empujaron el score hacia legítimo.
    pub top_negative: Vec<FeatureContribution>,
}

/// Registro inmutable de una predicción servida.
///
/// Append-only; únicamente 'actual_label' admite backfill posterior cuando
/// el resultado real de la transacción llega del mundo exterior.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRecord {
    /// Identificador único universal.
    #[typeshare(serialized_as = "string")]
    pub id: Uuid,
    /// Modelo que computó el score.
    #[typeshare(serialized_as = "string")]
    pub model_id: Uuid,
    /// Identificador de transacción externo (ruteo A/B determinista).
    pub transaction_id: Option<String>,
    /// Vector de entrada normalizado al orden de feature_names del modelo.
    pub input_vector: Vec<f64>,
    /// Score de fraude en [0, 1].
    pub score: f64,
    /// Veredicto binario al umbral de decisión.
    pub label_flag: bool,
    /// Confianza derivada de la distancia al umbral.
    pub confidence: f64,
    /// Explicación local opcional (fuera del hot path).
    pub explanation: Option<Explanation>,
    /// Latencia de servicio observada en milisegundos.
    pub latency_milliseconds: f64,
    /// Bandera de respuesta degradada (imputación por deadline).
    pub degraded: bool,
    /// Etiqueta real rellenada con posterioridad.
    pub actual_label: Option<bool>,
    /// Marca temporal monótona por modelo (partición temporal).
    #[typeshare(serialized_as = "string")]
    pub created_at: DateTime<Utc>,
}
