// [libs/domain/models/src/job.rs]
/*!
 * =================================================================
 * APARATO: JOB LEDGER DOMAIN MODEL (V31.1 - TYPED PAYLOADS)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO SOBERANO DE ÓRDENES DE TRABAJO TIPADAS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. TAGGED PAYLOAD SOVEREIGNTY: Cada clase de trabajo transporta un
 *    payload tipado bajo unión discriminada serde; el Ledger almacena el
 *    discriminador junto al payload.
 * 2. IDEMPOTENCY ANCHOR: La clave de idempotencia deduplica encolados y
 *    previene trabajo duplicado ante reintentos de red.
 * 3. LEASE DISCIPLINE: started_at + lease sirven al Reaper para la
 *    recuperación de trabajos zombie con contador de reintentos.
 *
 * # Mathematical Proof (Queue Exclusivity):
 * La reclamación de un trabajo es un CAS sobre (id, state='QUEUED').
 * Dos workers concurrentes no pueden ganar el mismo CAS, por lo que a lo
 * sumo una ejecución por orden existe en cualquier historia serial.
 * =================================================================
 */

use crate::feature::FeatureConfig;
use crate::model::{AlgorithmKind, ImbalanceStrategy};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use typeshare::typeshare;
use uuid::Uuid;

/// Clase de trabajo usada por los topes de concurrencia por familia.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    /// Cómputo de features (tope por defecto: 4).
    Feature,
    /// Entrenamiento de modelos (tope por defecto: 2).
    Training,
    /// Vigilancia de deriva, concepto y sesgo (tope por defecto: 4).
    Monitoring,
    /// Orquestación de reentrenamiento (tope por defecto: 1).
    Retraining,
}

impl JobKind {
    /// Etiqueta canónica persistida en el Ledger.
    pub fn canonical_tag(&self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::Training => "training",
            Self::Monitoring => "monitoring",
            Self::Retraining => "retraining",
        }
    }
}

/// Payload tipado por clase de trabajo (unión discriminada).
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "payload_kind", content = "parameters")]
pub enum JobPayload {
    /// Ejecuta el pipeline C3 sobre un dataset sellado.
    FeatureCompute {
        /// Dataset de origen.
        #[typeshare(serialized_as = "string")]
        dataset_id: Uuid,
        /// FeatureSet pre-registrado que recibirá el resultado.
        #[typeshare(serialized_as = "string")]
        feature_set_id: Uuid,
        /// Configuración declarativa del pipeline.
        config: FeatureConfig,
    },
    /// Entrena un modelo sobre un FeatureSet COMPLETED.
    Train {
        /// FeatureSet de origen.
        #[typeshare(serialized_as = "string")]
        feature_set_id: Uuid,
        /// Algoritmo a ejecutar.
        algorithm: AlgorithmKind,
        /// Mapa de hiperparámetros.
        hyperparameters: BTreeMap<String, serde_json::Value>,
        /// Estrategia de desbalance aplicada solo al split de entrenamiento.
        imbalance_strategy: ImbalanceStrategy,
        /// Umbral de decisión para las métricas dependientes de corte.
        decision_threshold: f64,
    },
    /// Barrido de deriva distribucional por feature numérica.
    DriftScan {
        /// Modelo en producción a vigilar.
        #[typeshare(serialized_as = "string")]
        model_id: Uuid,
    },
    /// Evaluación de degradación contra baselines con etiquetas nuevas.
    ConceptScan {
        /// Modelo en producción a vigilar.
        #[typeshare(serialized_as = "string")]
        model_id: Uuid,
    },
    /// Barrido de métricas de equidad por atributo protegido.
    BiasScan {
        /// Modelo en producción a vigilar.
        #[typeshare(serialized_as = "string")]
        model_id: Uuid,
        /// Atributos protegidos a auditar.
        protected_attributes: Vec<String>,
    },
    /// Avance de la máquina de estados de reentrenamiento C10.
    Retrain {
        /// Orden de reentrenamiento a avanzar.
        #[typeshare(serialized_as = "string")]
        retrain_job_id: Uuid,
    },
    /// Evaluación de significancia de un test A/B maduro.
    AbEvaluate {
        /// Test A/B a evaluar.
        #[typeshare(serialized_as = "string")]
        ab_test_id: Uuid,
    },
}

impl JobPayload {
    /// Clase de concurrencia a la que pertenece el payload.
    pub fn kind(&self) -> JobKind {
        match self {
            Self::FeatureCompute { .. } => JobKind::Feature,
            Self::Train { .. } => JobKind::Training,
            Self::DriftScan { .. } | Self::ConceptScan { .. } | Self::BiasScan { .. }
            | Self::AbEvaluate { .. } => JobKind::Monitoring,
            Self::Retrain { .. } => JobKind::Retraining,
        }
    }
}

/// Estado del trabajo en el Ledger.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    /// Encolado, pendiente de reclamación.
    Queued,
    /// Reclamado por un worker bajo arrendamiento.
    Running,
    /// Finalizado con éxito.
    Completed,
    /// Finalizado con error terminal.
    Failed,
    /// Cancelación cooperativa observada.
    Cancelled,
}

impl JobState {
    /// Etiqueta canónica persistida en el Ledger.
    pub fn canonical_tag(&self) -> &'static str {
        match self {
            Self::Queued => "QUEUED",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
        }
    }
}

/// Orden de trabajo soberana despachada por el plano de control.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Identificador único universal de la orden.
    #[typeshare(serialized_as = "string")]
    pub id: Uuid,
    /// Payload tipado con su discriminador.
    pub payload: JobPayload,
    /// Estado del ciclo de vida.
    pub state: JobState,
    /// Progreso monótono reportado en [0, 1].
    pub progress: f64,
    /// Etiqueta de etapa corriente ("split", "fit", "epoch_12", ...).
    pub stage_tag: Option<String>,
    /// Clave de idempotencia única para deduplicar encolados.
    pub idempotency_key: Option<String>,
    /// Reintentos consumidos tras barridos del Reaper (máximo 3).
    pub retry_count: u32,
    /// Error terminal registrado cuando state = FAILED.
    pub error_message: Option<String>,
    /// Marca de encolado UTC.
    #[typeshare(serialized_as = "string")]
    pub created_at: DateTime<Utc>,
    /// Marca de reclamación (inicio del arrendamiento).
    #[typeshare(serialized_as = "string")]
    pub started_at: Option<DateTime<Utc>>,
    /// Marca de finalización terminal.
    #[typeshare(serialized_as = "string")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Disparador recurrente tipo cron con próximo disparo almacenado.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringSchedule {
    /// Identificador único universal.
    #[typeshare(serialized_as = "string")]
    pub id: Uuid,
    /// Nombre nominal del disparador ("drift_scan_production").
    pub name: String,
    /// Payload a encolar en cada disparo.
    pub payload: JobPayload,
    /// Periodo entre disparos en segundos.
    #[typeshare(serialized_as = "number")]
    pub interval_seconds: u64,
    /// Próximo disparo programado (ancla del CAS de reclamación).
    #[typeshare(serialized_as = "string")]
    pub next_run_at: DateTime<Utc>,
    /// Habilitación operativa del disparador.
    pub enabled: bool,
    /// Marca del último disparo efectivo.
    #[typeshare(serialized_as = "string")]
    pub last_fired_at: Option<DateTime<Utc>>,
}
