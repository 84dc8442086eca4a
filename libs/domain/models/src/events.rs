// [libs/domain/models/src/events.rs]
/*!
 * =================================================================
 * APARATO: CONTROL PLANE EVENT CONTRACT (V31.0 - FEED SYNC)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: DEFINICIÓN DE SEÑALES DEL BUS DE EVENTOS TIPADO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ATOMIC ACTIVATION: 'ModelActivated' transporta id, schema hash,
 *    referencia portable y checksum para que el plano de servicio ejecute
 *    el swap copy-then-swap sin consultas adicionales.
 * 2. ORDERED DELIVERY: Para un mismo modelo, las activaciones se emiten
 *    en orden de promoción; los consumidores procesan en orden de llegada.
 * 3. IDEMPOTENT CONSUMERS: La entrega es al-menos-una-vez; cada señal
 *    porta identidad suficiente para deduplicar en el consumidor.
 * =================================================================
 */

use crate::alert::AlertSeverity;
use crate::job::{JobKind, JobState};
use crate::monitoring::MetricStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

/// Pulso agregado del sistema para el HUD de mando.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SystemPulse {
    /// Trabajos actualmente en ejecución.
    pub jobs_in_flight: u32,
    /// Profundidad corriente de la cola de trabajos.
    pub queue_depth: u32,
    /// Modelo en producción (si existe).
    #[typeshare(serialized_as = "string")]
    pub production_model_id: Option<Uuid>,
    /// Estimación corriente de latencia p99 de servicio en milisegundos.
    pub serving_p99_milliseconds: f64,
    /// Predicciones servidas desde la ignición.
    #[typeshare(serialized_as = "number")]
    pub predictions_served_total: u64,
    /// Colapsos de hilo observados desde la ignición.
    #[typeshare(serialized_as = "number")]
    pub panics_observed: u64,
    /// Marca de tiempo milimétrica (Epoch MS) del pulso.
    #[typeshare(serialized_as = "number")]
    pub timestamp_ms: u64,
}

/// Unión discriminada de señales del plano de control.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_kind", content = "payload")]
pub enum ControlPlaneEvent {
    /// Un modelo alcanzó PRODUCTION; el plano de servicio debe recargar.
    ModelActivated {
        /// Modelo recién promovido.
        #[typeshare(serialized_as = "string")]
        model_id: Uuid,
        /// Contrato de extracción exigido al servicio.
        schema_hash: String,
        /// Referencia al artefacto portable en la bóveda.
        portable_artifact_reference: String,
        /// Digest SHA-256 esperado del artefacto portable.
        checksum_hexadecimal: String,
        /// Marca de promoción (orden total por modelo).
        #[typeshare(serialized_as = "string")]
        promoted_at: DateTime<Utc>,
    },
    /// Un modelo fue retirado de PRODUCTION sin sucesor.
    ModelRetired {
        /// Modelo retirado.
        #[typeshare(serialized_as = "string")]
        model_id: Uuid,
        /// Justificación técnica del retiro.
        reason: String,
    },
    /// Una alerta fue creada o fusionada.
    AlertRaised {
        /// Alerta afectada.
        #[typeshare(serialized_as = "string")]
        alert_id: Uuid,
        /// Clave de deduplicación de la clase.
        dedup_key: String,
        /// Severidad semántica corriente.
        severity: AlertSeverity,
        /// Título corto para el operador.
        title: String,
    },
    /// Un trabajo cambió de estado en el Ledger.
    JobStateChanged {
        /// Trabajo afectado.
        #[typeshare(serialized_as = "string")]
        job_id: Uuid,
        /// Clase de concurrencia del trabajo.
        kind: JobKind,
        /// Estado alcanzado.
        state: JobState,
        /// Progreso monótono en [0, 1].
        progress: f64,
    },
    /// El motor de vigilancia confirmó una métrica fuera de banda.
    DriftDetected {
        /// Modelo vigilado.
        #[typeshare(serialized_as = "string")]
        model_id: Uuid,
        /// Feature o métrica observada.
        feature_name: String,
        /// Estadístico computado.
        metric_name: String,
        /// Valor observado.
        value: f64,
        /// Banda semafórica alcanzada.
        status: MetricStatus,
    },
    /// Pulso agregado del sistema.
    SystemPulseUpdate(SystemPulse),
}
