// [libs/domain/models/src/abtest.rs]
/*!
 * =================================================================
 * APARATO: A/B EXPERIMENT DOMAIN MODEL (V30.2 - DETERMINISTIC ARMS)
 * CLASIFICACIÓN: DOMAIN MODELS (ESTRATO L2)
 * RESPONSABILIDAD: CONTRATO DE EXPERIMENTOS CHAMPION/CHALLENGER
 *
 * # Mathematical Proof (Deterministic Routing):
 * El brazo de una transacción es h(transaction_id) mod 10000 comparado
 * contra traffic_split * 10000, con h = SipHash-1-3 de clave fija. La
 * asignación es una función pura del identificador, por lo que la misma
 * transacción siempre observa el mismo brazo durante el experimento.
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use typeshare::typeshare;
use uuid::Uuid;

/// Estado del experimento A/B.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AbTestState {
    /// Configurado, sin tráfico.
    Draft,
    /// Enrutando tráfico y acumulando muestras.
    Running,
    /// Muestras suficientes; evaluación de significancia en curso.
    Evaluating,
    /// Concluido con veredicto sellado.
    Completed,
    /// Abortado por el operador.
    Aborted,
}

impl AbTestState {
    /// Etiqueta canónica persistida en el catálogo.
    pub fn canonical_tag(&self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::Running => "RUNNING",
            Self::Evaluating => "EVALUATING",
            Self::Completed => "COMPLETED",
            Self::Aborted => "ABORTED",
        }
    }
}

/// Recomendación del test de significancia.
#[typeshare]
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AbRecommendation {
    /// El retador supera al campeón con significancia al 95%.
    ChallengerWins,
    /// El campeón retiene la corona con significancia al 95%.
    ChampionWins,
    /// La banda de confianza contiene el cero.
    NoSignificantDifference,
}

/// Veredicto estadístico sellado al concluir la evaluación.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbVerdict {
    /// Recomendación derivada de la banda del 95%.
    pub recommendation: AbRecommendation,
    /// Estadístico z del test de dos proporciones.
    pub z_statistic: f64,
    /// Valor p bilateral asociado.
    pub p_value: f64,
    /// Tasa de acierto observada del campeón.
    pub champion_rate: f64,
    /// Tasa de acierto observada del retador.
    pub challenger_rate: f64,
}

/// Experimento de tráfico dividido entre campeón y retador.
#[typeshare]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AbTest {
    /// Identificador único universal.
    #[typeshare(serialized_as = "string")]
    pub id: Uuid,
    /// Modelo en producción defendiendo la corona.
    #[typeshare(serialized_as = "string")]
    pub champion_model_id: Uuid,
    /// Modelo candidato bajo evaluación.
    #[typeshare(serialized_as = "string")]
    pub challenger_model_id: Uuid,
    /// Fracción del tráfico dirigida al retador (0, 1).
    pub traffic_split: f64,
    /// Muestras mínimas por brazo antes de evaluar.
    #[typeshare(serialized_as = "number")]
    pub min_samples: u64,
    /// Métrica primaria del veredicto ("f1", "precision", ...).
    pub primary_metric: String,
    /// Muestras acumuladas por el campeón.
    #[typeshare(serialized_as = "number")]
    pub champion_samples: u64,
    /// Muestras acumuladas por el retador.
    #[typeshare(serialized_as = "number")]
    pub challenger_samples: u64,
    /// Modo espejo: ambos scores se exponen externamente.
    pub mirror_mode: bool,
    /// Promoción automática del retador al concluir (vetada ante sesgo).
    pub auto_promote: bool,
    /// Estado del experimento.
    pub state: AbTestState,
    /// Veredicto sellado cuando state = COMPLETED.
    pub result: Option<AbVerdict>,
    /// Marca de creación UTC.
    #[typeshare(serialized_as = "string")]
    pub created_at: DateTime<Utc>,
    /// Marca de conclusión o aborto.
    #[typeshare(serialized_as = "string")]
    pub concluded_at: Option<DateTime<Utc>>,
}
