// [libs/domain/models/src/alert.rs]
/*!
 * =================================================================
 * APARATO: ALERT DOMAIN MODEL (V30.3 - DEDUP SEALED)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DE EVENTOS DE ALERTA CON CICLO DE VIDA
 *
 * # Mathematical Proof (Deduplication Key):
 * La clave (model_id, alert_type, window_bucket) define una clase de
 * equivalencia sobre el flujo de alertas. El gestor garantiza a lo sumo
 * una alerta ACTIVE por clase; las emisiones subsecuentes se fusionan
 * incrementando el contador de ocurrencias.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

/// Subsistema emisor de la alerta.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertSourceKind {
    /// Motor de vigilancia de deriva y sesgo.
    Monitoring,
    /// Motor de entrenamiento y pipelines de fondo.
    Jobs,
    /// Plano de servicio (integridad de artefactos, latencia).
    Serving,
    /// Controlador de reentrenamiento.
    Retraining,
}

/// Severidad semántica de la alerta.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertSeverity {
    /// Informativa; sin acción requerida.
    Info,
    /// Requiere observación del operador.
    Warning,
    /// Requiere intervención inmediata.
    Critical,
}

/// Ciclo de vida de la alerta.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertStatus {
    /// Emitida y sin atender.
    Active,
    /// Reconocida por un operador.
    Acknowledged,
    /// Condición subyacente resuelta.
    Resolved,
    /// Descartada; estado terminal alternativo.
    Dismissed,
}

/// Evento de alerta deduplicado con referencias débiles a su origen.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    /// Identificador único universal.
    #[typeshare(serialized_as = "string")]
    pub id: Uuid,
    /// Subsistema emisor.
    pub source_kind: AlertSourceKind,
    /// Referencia débil al origen (id de métrica, job, artefacto).
    pub source_reference: Option<String>,
    /// Modelo afectado cuando aplica.
    #[typeshare(serialized_as = "string")]
    pub model_id: Option<Uuid>,
    /// Tipo semántico ("data_drift:amount_zscore", "artifact_corrupted", ...).
    pub alert_type: String,
    /// Clave de deduplicación (model, tipo, bucket de ventana).
    pub dedup_key: String,
    /// Severidad semántica.
    pub severity: AlertSeverity,
    /// Título corto para el operador.
    pub title: String,
    /// Detalle técnico estructurado.
    pub details: String,
    /// Estado del ciclo de vida.
    pub status: AlertStatus,
    /// Conteo de emisiones fusionadas sobre la misma clave.
    pub occurrence_count: u32,
    /// Marca de creación UTC.
    #[typeshare(serialized_as = "string")]
    pub created_at: DateTime<Utc>,
    /// Última emisión fusionada.
    #[typeshare(serialized_as = "string")]
    pub last_seen_at: DateTime<Utc>,
    /// Marca de reconocimiento.
    #[typeshare(serialized_as = "string")]
    pub acknowledged_at: Option<DateTime<Utc>>,
    /// Marca de resolución o descarte.
    #[typeshare(serialized_as = "string")]
    pub resolved_at: Option<DateTime<Utc>>,
}

/// Construye la clave canónica de deduplicación de alertas.
///
/// El bucket de ventana es el día UTC del cierre de la ventana evaluada,
/// de modo que reemisiones dentro del mismo día colapsan en una sola
/// alerta ACTIVE.
pub fn build_alert_dedup_key(
    model_id: Option<Uuid>,
    alert_type: &str,
    window_end: DateTime<Utc>,
) -> String {
    let model_component = model_id
        .map(|identifier| identifier.to_string())
        .unwrap_or_else(|| "global".to_string());
    format!("{}|{}|{}", model_component, alert_type, window_end.format("%Y-%m-%d"))
}
