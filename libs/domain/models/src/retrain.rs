// [libs/domain/models/src/retrain.rs]
/*!
 * =================================================================
 * APARATO: RETRAIN ORCHESTRATION DOMAIN MODEL (V30.5 - STATE MACHINE)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DE LA MÁQUINA DE ESTADOS DE REENTRENAMIENTO
 *
 * # Mathematical Proof (Guarded Progression):
 * PENDING -> DATA_PREPARATION -> TRAINING -> VALIDATION -> COMPARISON ->
 * {PROMOTED | REJECTED | FAILED}. Cada transición está custodiada por un
 * predicado puro sobre (fila actual, entradas); el grafo es acíclico y
 * toda historia termina en un estado absorbente.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

/// Causa que disparó el reentrenamiento.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetrainReason {
    /// Deriva distribucional confirmada por C7.
    DataDrift,
    /// Degradación de desempeño confirmada por C7.
    ConceptDrift,
    /// Disparidad de equidad confirmada por C7 (veto de auto-promoción).
    BiasDetected,
    /// Disparo programado por calendario.
    Scheduled,
    /// Solicitud explícita de un operador.
    Manual,
}

impl RetrainReason {
    /// La promoción automática queda vetada para disparos por sesgo;
    /// esos reentrenos exigen aprobación humana sin importar las métricas.
    pub fn allows_auto_promotion(&self) -> bool {
        !matches!(self, Self::BiasDetected)
    }
}

/// Estrategia de fusión de datos históricos con etiquetas nuevas.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "strategy", content = "parameters")]
pub enum MergeStrategy {
    /// Descarta lo histórico; entrena solo con lo nuevo.
    Replace,
    /// Concatena histórico + nuevo sin ponderación.
    Append,
    /// Concatena ponderando las filas nuevas por replicación.
    Weighted {
        /// Peso relativo de las filas nuevas (>= 1.0).
        new_weight: f64,
    },
    /// Conserva únicamente las filas más recientes hasta el tope.
    SlidingWindow {
        /// Tope de filas retenidas tras la fusión.
        #[typeshare(serialized_as = "number")]
        max_rows: u64,
    },
}

/// Estado de la máquina de reentrenamiento C10.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RetrainState {
    /// Registrado, pendiente de arranque.
    Pending,
    /// Fusión de datos en curso.
    DataPreparation,
    /// Entrenamiento del candidato en curso (delegado a C4).
    Training,
    /// Verificación de baselines del modelo base sobre el candidato.
    Validation,
    /// Comparación de la métrica primaria contra el modelo base.
    Comparison,
    /// Candidato promovido vía C5.
    Promoted,
    /// Candidato rechazado con causa registrada.
    Rejected,
    /// Falla terminal de la secuencia.
    Failed,
}

impl RetrainState {
    /// Estados absorbentes de la máquina.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Promoted | Self::Rejected | Self::Failed)
    }

    /// Etiqueta canónica persistida en el catálogo.
    pub fn canonical_tag(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::DataPreparation => "DATA_PREPARATION",
            Self::Training => "TRAINING",
            Self::Validation => "VALIDATION",
            Self::Comparison => "COMPARISON",
            Self::Promoted => "PROMOTED",
            Self::Rejected => "REJECTED",
            Self::Failed => "FAILED",
        }
    }
}

/// Orden de reentrenamiento orquestada por el controlador C10.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrainJob {
    /// Identificador único universal.
    #[typeshare(serialized_as = "string")]
    pub id: Uuid,
    /// Modelo base cuyo linaje se reentrena.
    #[typeshare(serialized_as = "string")]
    pub base_model_id: Uuid,
    /// Causa del disparo.
    pub reason: RetrainReason,
    /// Estrategia de fusión de datos.
    pub merge_strategy: MergeStrategy,
    /// Estado corriente de la máquina.
    pub state: RetrainState,
    /// FeatureSet producido en DATA_PREPARATION.
    #[typeshare(serialized_as = "string")]
    pub candidate_feature_set_id: Option<Uuid>,
    /// Modelo candidato producido en TRAINING.
    #[typeshare(serialized_as = "string")]
    pub candidate_model_id: Option<Uuid>,
    /// Autorización de promoción sin confirmación humana.
    pub auto_promote: bool,
    /// Mejora absoluta mínima exigida en la métrica primaria (F1).
    pub min_improvement: f64,
    /// Causa de rechazo cuando state = REJECTED.
    pub rejection_reason: Option<String>,
    /// Error terminal cuando state = FAILED.
    pub error_message: Option<String>,
    /// Marca de creación UTC.
    #[typeshare(serialized_as = "string")]
    pub created_at: DateTime<Utc>,
    /// Última transición UTC.
    #[typeshare(serialized_as = "string")]
    pub updated_at: DateTime<Utc>,
}
