// [libs/domain/serving/src/engine.rs]
/*!
 * =================================================================
 * APARATO: SCORING ENGINE MASTER (V23.0 - HOT SWAP SEALED)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: SCORING CON MODELO CALIENTE Y RUTEO A/B
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. COPY-THEN-SWAP: La activación construye el modelo completo y luego
 *    permuta el puntero bajo el cerrojo; las solicitudes en vuelo retienen
 *    su Arc y completan contra el modelo previo.
 * 2. SINGLE DYNAMIC LOOKUP: La normalización mapa -> vector ordenado es
 *    el ÚNICO punto del sistema con búsqueda dinámica de claves.
 * 3. CHAMPION ANSWER DISCIPLINE: En experimento activo, ambos brazos se
 *    registran pero la respuesta externa transporta el score del campeón
 *    salvo modo espejo.
 * 4. OFF-PATH EXPLANATION: La explicación corre fuera del presupuesto
 *    p99 y puede excederlo legítimamente.
 *
 * # Mathematical Proof (Swap Atomicity):
 * El puntero caliente es un Arc permutado bajo RwLock de escritura; todo
 * lector observa o bien el modelo previo completo o bien el nuevo
 * completo, jamás un estado intermedio.
 * =================================================================
 */

use crate::ab_router::{route_arm, ExperimentArm};
use crate::errors::ServingError;
use crate::loader::ActiveModel;
use crate::resolver::FeatureResolver;
use crate::vault::VaultEntry;
use aegis_core_learners::explainer::ContributionExplainer;
use aegis_core_learners::ScoringModel;
use aegis_domain_models::{Explanation, FeatureContribution, PredictionRecord};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::{info, instrument};
use uuid::Uuid;

/// Presupuesto p99 nominal del servicio (milisegundos).
pub const DEFAULT_P99_BUDGET_MILLISECONDS: u64 = 100;
/// Reserva fija para el scoring dentro del presupuesto.
pub const SCORING_RESERVATION_MILLISECONDS: u64 = 20;
/// Top-k de contribuciones por signo en la explicación.
const EXPLANATION_TOP_K: usize = 3;

/// Solicitud de predicción normalizable.
#[derive(Debug, Clone)]
pub struct PredictRequest {
    /// Identificador externo (ancla del ruteo A/B determinista).
    pub transaction_id: Option<String>,
    /// Alcance de usuario para la resolución de features online.
    pub user_id: Option<String>,
    /// Mapa crudo de features entrantes (claves extra se ignoran).
    pub feature_values: HashMap<String, f64>,
    /// Solicita la explicación local (fuera del hot path).
    pub explain: bool,
}

/// Respuesta externa del plano de servicio.
#[derive(Debug, Clone)]
pub struct PredictionResponse {
    /// Modelo cuyo score se responde externamente.
    pub model_id: Uuid,
    /// Score de fraude en [0, 1].
    pub score: f64,
    /// Veredicto binario al umbral sellado.
    pub label_flag: bool,
    /// Confianza derivada de la distancia al umbral.
    pub confidence: f64,
    /// Explicación local opcional.
    pub explanation: Option<Explanation>,
    /// Latencia observada en milisegundos.
    pub latency_milliseconds: f64,
    /// Bandera de degradación por imputación.
    pub degraded: bool,
}

/// Vínculo de experimento activo en el plano de servicio.
pub struct AbBinding {
    /// Experimento corriente.
    pub test_id: Uuid,
    /// Fracción de tráfico del retador.
    pub traffic_split: f64,
    /// Modo espejo: la respuesta externa transporta el brazo asignado.
    pub mirror_mode: bool,
    /// Modelo retador verificado y cargado.
    pub challenger: Arc<ActiveModel>,
}

/// Resultado completo de un scoring (respuesta + rastro durable).
pub struct ScoredOutcome {
    /// Respuesta externa.
    pub response: PredictionResponse,
    /// Registros a encolar en la bóveda de predicciones.
    pub log_entries: Vec<VaultEntry>,
    /// Brazo asignado cuando hay experimento activo.
    pub assigned_arm: Option<(Uuid, ExperimentArm)>,
}

/// Motor de scoring del plano de servicio.
pub struct ScoringEngine {
    /// Puntero caliente al modelo PRODUCTION (single-writer, many-reader).
    hot_model: RwLock<Option<Arc<ActiveModel>>>,
    /// Experimento A/B activo (si existe).
    experiment: RwLock<Option<Arc<AbBinding>>>,
    /// Resolutor en capas de features online.
    feature_resolver: FeatureResolver,
    /// Presupuesto p99 de la solicitud.
    p99_budget: Duration,
    /// Contador de predicciones servidas desde la ignición.
    predictions_served: AtomicU64,
}

impl ScoringEngine {
    /// Forja el motor con el resolutor inyectado y presupuesto nominal.
    pub fn new(feature_resolver: FeatureResolver) -> Self {
        Self {
            hot_model: RwLock::new(None),
            experiment: RwLock::new(None),
            feature_resolver,
            p99_budget: Duration::from_millis(DEFAULT_P99_BUDGET_MILLISECONDS),
            predictions_served: AtomicU64::new(0),
        }
    }

    /// Activa un modelo verificado mediante copy-then-swap.
    #[instrument(skip(self, staged_model), fields(model_id = %staged_model.model_id))]
    pub fn activate_model(&self, staged_model: ActiveModel) {
        let staged_arc = Arc::new(staged_model);
        let mut pointer_guard = match self.hot_model.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let previous = pointer_guard.replace(staged_arc);
        info!(
            "🔁 [ENGINE]: Hot pointer swapped (previous: {:?}).",
            previous.map(|model| model.model_id)
        );
    }

    /// Retira el modelo caliente (retiro explícito sin sucesor).
    pub fn deactivate_model(&self) {
        let mut pointer_guard = match self.hot_model.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *pointer_guard = None;
    }

    /// Identidad del modelo corriente.
    pub fn current_model_id(&self) -> Option<Uuid> {
        match self.hot_model.read() {
            Ok(guard) => guard.as_ref().map(|model| model.model_id),
            Err(poisoned) => poisoned.into_inner().as_ref().map(|model| model.model_id),
        }
    }

    /// Predicciones servidas desde la ignición.
    pub fn predictions_served_total(&self) -> u64 {
        self.predictions_served.load(Ordering::Relaxed)
    }

    /// Vincula un experimento A/B activo.
    pub fn attach_experiment(&self, binding: AbBinding) {
        let mut experiment_guard = match self.experiment.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *experiment_guard = Some(Arc::new(binding));
    }

    /// Desvincula el experimento corriente.
    pub fn detach_experiment(&self) {
        let mut experiment_guard = match self.experiment.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *experiment_guard = None;
    }

    /**
     * Ejecuta una predicción individual bajo el presupuesto p99.
     *
     * # Errors:
     * - `ModelUnavailable` sin modelo caliente.
     * - `FeatureMissing` ante features requeridas ausentes.
     */
    #[instrument(skip_all)]
    pub fn predict(&self, request: &PredictRequest) -> Result<ScoredOutcome, ServingError> {
        let ignition = Instant::now();
        let resolver_deadline = ignition + self.p99_budget
            - Duration::from_millis(SCORING_RESERVATION_MILLISECONDS);

        // Snapshot del puntero caliente (las solicitudes en vuelo retienen su Arc).
        let champion = {
            let pointer_guard = match self.hot_model.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            pointer_guard.clone().ok_or(ServingError::ModelUnavailable)?
        };
        let experiment_snapshot = {
            let experiment_guard = match self.experiment.read() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            experiment_guard.clone()
        };

        // --- NORMALIZACIÓN MAPA -> VECTOR ORDENADO (ÚNICO LOOKUP DINÁMICO) ---
        let (feature_vector, degraded) =
            self.normalize_request(&champion, request, resolver_deadline)?;

        // --- RUTEO DE BRAZO Y SCORING ---
        let champion_score = champion.learner.score_row(&feature_vector);

        let mut log_entries: Vec<VaultEntry> = Vec::with_capacity(2);
        let mut assigned_arm = None;
        let mut external_model = champion.clone();
        let mut external_score = champion_score;

        if let (Some(binding), Some(transaction_id)) =
            (experiment_snapshot.as_ref(), request.transaction_id.as_ref())
        {
            let arm = route_arm(transaction_id, binding.traffic_split);
            assigned_arm = Some((binding.test_id, arm));

            match arm {
                ExperimentArm::Champion => {
                    log_entries.push(self.build_record(
                        &champion,
                        champion_score,
                        &feature_vector,
                        request,
                        degraded,
                        ignition,
                        Some((binding.test_id, "champion".to_string())),
                    ));
                }
                ExperimentArm::Challenger => {
                    let challenger_score =
                        binding.challenger.learner.score_row(&feature_vector);

                    // Ambos brazos quedan registrados; el campeón como sombra.
                    log_entries.push(self.build_record(
                        &binding.challenger,
                        challenger_score,
                        &feature_vector,
                        request,
                        degraded,
                        ignition,
                        Some((binding.test_id, "challenger".to_string())),
                    ));
                    log_entries.push(self.build_record(
                        &champion,
                        champion_score,
                        &feature_vector,
                        request,
                        degraded,
                        ignition,
                        Some((binding.test_id, "champion_shadow".to_string())),
                    ));

                    if binding.mirror_mode {
                        external_model = binding.challenger.clone();
                        external_score = challenger_score;
                    }
                }
            }
        } else {
            log_entries.push(self.build_record(
                &champion,
                champion_score,
                &feature_vector,
                request,
                degraded,
                ignition,
                None,
            ));
        }

        // --- EXPLICACIÓN (FUERA DEL HOT PATH) ---
        let explanation = if request.explain {
            Some(build_explanation(
                &external_model.explainer,
                &external_model.learner,
                &external_model.feature_names,
                &feature_vector,
            ))
        } else {
            None
        };

        let latency_milliseconds = ignition.elapsed().as_secs_f64() * 1000.0;
        self.predictions_served.fetch_add(1, Ordering::Relaxed);

        let threshold = external_model.decision_threshold;
        Ok(ScoredOutcome {
            response: PredictionResponse {
                model_id: external_model.model_id,
                score: external_score,
                label_flag: external_score >= threshold,
                confidence: confidence_of(external_score, threshold),
                explanation,
                latency_milliseconds,
                degraded,
            },
            log_entries,
            assigned_arm,
        })
    }

    /// Scoring por lotes compartiendo el mismo snapshot caliente.
    pub fn batch_predict(
        &self,
        requests: &[PredictRequest],
    ) -> Vec<Result<ScoredOutcome, ServingError>> {
        requests.iter().map(|request| self.predict(request)).collect()
    }

    /// Normaliza el mapa entrante al vector ordenado del contrato.
    fn normalize_request(
        &self,
        model: &ActiveModel,
        request: &PredictRequest,
        resolver_deadline: Instant,
    ) -> Result<(Vec<f64>, bool), ServingError> {
        let mut feature_vector = vec![0.0_f64; model.feature_names.len()];
        let mut online_positions: Vec<usize> = Vec::new();
        let mut missing_required: Vec<String> = Vec::new();

        for (position, feature_name) in model.feature_names.iter().enumerate() {
            if let Some(value) = request.feature_values.get(feature_name) {
                feature_vector[position] = *value;
            } else if is_online_feature(feature_name) && request.user_id.is_some() {
                online_positions.push(position);
            } else {
                missing_required.push(feature_name.clone());
            }
        }

        if !missing_required.is_empty() {
            return Err(ServingError::FeatureMissing(missing_required));
        }

        let mut degraded = false;
        if !online_positions.is_empty() {
            let user_scope = request
                .user_id
                .as_ref()
                .ok_or_else(|| ServingError::Internal("user scope vanished".into()))?;
            let online_names: Vec<String> = online_positions
                .iter()
                .map(|position| model.feature_names[*position].clone())
                .collect();

            let resolved =
                self.feature_resolver.resolve_batch(user_scope, &online_names, resolver_deadline);
            degraded = resolved.degraded;
            for (slot, position) in online_positions.iter().enumerate() {
                feature_vector[*position] = resolved.values[slot];
            }
        }

        Ok((feature_vector, degraded))
    }

    /// Construye el registro durable de una predicción.
    #[allow(clippy::too_many_arguments)]
    fn build_record(
        &self,
        model: &ActiveModel,
        score: f64,
        feature_vector: &[f64],
        request: &PredictRequest,
        degraded: bool,
        ignition: Instant,
        ab_binding: Option<(Uuid, String)>,
    ) -> VaultEntry {
        let record = PredictionRecord {
            id: Uuid::new_v4(),
            model_id: model.model_id,
            transaction_id: request.transaction_id.clone(),
            input_vector: feature_vector.to_vec(),
            score,
            label_flag: score >= model.decision_threshold,
            confidence: confidence_of(score, model.decision_threshold),
            explanation: None,
            latency_milliseconds: ignition.elapsed().as_secs_f64() * 1000.0,
            degraded,
            actual_label: None,
            created_at: Utc::now(),
        };
        (record, ab_binding)
    }
}

/// Confianza como distancia normalizada al umbral.
fn confidence_of(score: f64, threshold: f64) -> f64 {
    let half_span = threshold.max(1.0 - threshold);
    ((score - threshold).abs() / half_span).clamp(0.0, 1.0)
}

/// Features resolubles desde las capas online (no exigidas al cliente).
fn is_online_feature(feature_name: &str) -> bool {
    feature_name.starts_with("user_")
        || feature_name.starts_with("velocity_")
        || feature_name == "seconds_since_last_txn"
}

/// Explicación top-k por signo mediante el explicador de oclusión.
fn build_explanation(
    explainer: &ContributionExplainer,
    learner: &dyn ScoringModel,
    feature_names: &[String],
    feature_vector: &[f64],
) -> Explanation {
    struct DynProbe<'a> {
        inner: &'a dyn ScoringModel,
    }
    impl ScoringModel for DynProbe<'_> {
        fn score_row(&self, feature_row: &[f64]) -> f64 {
            self.inner.score_row(feature_row)
        }
        fn feature_importance(&self) -> Vec<f64> {
            self.inner.feature_importance()
        }
    }

    let contributions = explainer.explain(&DynProbe { inner: learner }, feature_vector);
    let (positive, negative) =
        ContributionExplainer::top_k_split(&contributions, EXPLANATION_TOP_K);

    let materialize = |entries: Vec<aegis_core_learners::SignedContribution>| {
        entries
            .into_iter()
            .map(|entry| FeatureContribution {
                feature_name: feature_names
                    .get(entry.feature_index)
                    .cloned()
                    .unwrap_or_else(|| format!("feature_{}", entry.feature_index)),
                contribution: entry.contribution,
            })
            .collect()
    };

    Explanation { top_positive: materialize(positive), top_negative: materialize(negative) }
}
