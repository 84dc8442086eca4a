// [apps/control-tower/src/services/executors/experiment.rs]
/*!
 * =================================================================
 * APARATO: A/B EVALUATION EXECUTOR (V15.1 - SIGNIFICANCE GATE)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: VEREDICTO ESTADÍSTICO DE EXPERIMENTOS MADUROS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. MATURITY GATE: La evaluación exige min(muestras por brazo) >=
 *    min_samples Y resultados etiquetados suficientes; inmaduro, el
 *    experimento permanece RUNNING.
 * 2. TWO PROPORTION Z: La métrica primaria se deriva de los aciertos
 *    etiquetados por brazo; banda de confianza bilateral del 95%.
 * 3. AUTO CONCLUDE: Con auto_promote en alto y veredicto
 *    CHALLENGER_WINS, la conclusión promueve vía C5 en el mismo camino.
 * =================================================================
 */

use super::{ExecutionFault, ExecutionVerdict};
use crate::state::AppState;
use aegis_core_stats::two_proportion_z_test;
use aegis_domain_models::{AbRecommendation, AbTestState, AbVerdict, ModelStage};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Nivel de significancia bilateral del veredicto.
const SIGNIFICANCE_ALPHA: f64 = 0.05;
/// Resultados etiquetados mínimos por brazo para el test z.
const MINIMUM_LABELED_PER_ARM: u64 = 30;

/**
 * Evalúa la significancia de un experimento maduro.
 */
#[instrument(skip(application_state), fields(job_id = %job_identifier, ab_test_id = %ab_test_id))]
pub async fn execute_ab_evaluation(
    application_state: &AppState,
    job_identifier: Uuid,
    ab_test_id: Uuid,
) -> Result<ExecutionVerdict, ExecutionFault> {
    let experiment = application_state
        .ab_test_repository
        .get(ab_test_id)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    if experiment.state != AbTestState::Running {
        info!("🧪 [AB_EVALUATE]: Experiment {} not RUNNING. Nothing to do.", ab_test_id);
        return Ok(ExecutionVerdict::Completed);
    }

    // --- PUERTA DE MADUREZ POR MUESTRAS ---
    if experiment.champion_samples.min(experiment.challenger_samples) < experiment.min_samples {
        info!(
            "🧪 [AB_EVALUATE]: Immature experiment ({} / {} samples). Staying RUNNING.",
            experiment.champion_samples, experiment.challenger_samples
        );
        return Ok(ExecutionVerdict::Completed);
    }

    // --- RESULTADOS ETIQUETADOS POR BRAZO ---
    let (champion_successes, champion_trials) = application_state
        .prediction_repository
        .ab_arm_outcome_counts(ab_test_id, "champion")
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;
    let (challenger_successes, challenger_trials) = application_state
        .prediction_repository
        .ab_arm_outcome_counts(ab_test_id, "challenger")
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    if champion_trials < MINIMUM_LABELED_PER_ARM || challenger_trials < MINIMUM_LABELED_PER_ARM {
        info!(
            "🧪 [AB_EVALUATE]: Labeled outcomes pending ({} / {}). Staying RUNNING.",
            champion_trials, challenger_trials
        );
        return Ok(ExecutionVerdict::Completed);
    }

    // --- TRANSICIÓN A EVALUATING Y TEST DE SIGNIFICANCIA ---
    application_state
        .ab_test_repository
        .cas_state(ab_test_id, AbTestState::Running, AbTestState::Evaluating)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    let z_outcome = two_proportion_z_test(
        challenger_successes,
        challenger_trials,
        champion_successes,
        champion_trials,
    )
    .map_err(|fault| {
        ExecutionFault::new(aegis_domain_models::FaultClass::Internal, fault.to_string())
    })?;

    let recommendation = if !z_outcome.is_significant_at(SIGNIFICANCE_ALPHA) {
        AbRecommendation::NoSignificantDifference
    } else if z_outcome.proportion_left > z_outcome.proportion_right {
        AbRecommendation::ChallengerWins
    } else {
        AbRecommendation::ChampionWins
    };

    let verdict = AbVerdict {
        recommendation,
        z_statistic: z_outcome.z_statistic,
        p_value: z_outcome.p_value,
        champion_rate: z_outcome.proportion_right,
        challenger_rate: z_outcome.proportion_left,
    };

    application_state
        .ab_test_repository
        .seal_verdict(ab_test_id, &verdict)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    info!(
        "🧪 [AB_EVALUATE]: Verdict sealed ({:?}, z={:.3}, p={:.4}).",
        recommendation, verdict.z_statistic, verdict.p_value
    );

    // --- CONCLUSIÓN AUTOMÁTICA (SI ESTÁ AUTORIZADA) ---
    if experiment.auto_promote && recommendation == AbRecommendation::ChallengerWins {
        conclude_with_promotion(application_state, ab_test_id, experiment.challenger_model_id)
            .await?;
    }

    Ok(ExecutionVerdict::Completed)
}

/// Conclusión con promoción atómica del retador vía C5.
pub async fn conclude_with_promotion(
    application_state: &AppState,
    ab_test_id: Uuid,
    challenger_model_id: Uuid,
) -> Result<(), ExecutionFault> {
    // El retador debe transitar por STAGING antes de la corona.
    let challenger = application_state
        .model_repository
        .get(challenger_model_id)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    if challenger.stage == ModelStage::Trained {
        application_state
            .model_repository
            .patch_stage(challenger_model_id, ModelStage::Trained, ModelStage::Staging)
            .await
            .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;
    }

    if let Err(promotion_fault) = application_state
        .model_repository
        .promote_to_production(challenger_model_id)
        .await
    {
        warn!("🧪 [AB_CONCLUDE]: Promotion rejected: {}", promotion_fault);
        return Err(ExecutionFault::new(
            promotion_fault.fault_class(),
            promotion_fault.to_string(),
        ));
    }

    application_state
        .ab_test_repository
        .cas_state(ab_test_id, AbTestState::Evaluating, AbTestState::Completed)
        .await
        .map_err(|fault| ExecutionFault::new(fault.fault_class(), fault.to_string()))?;

    application_state.scoring_engine.detach_experiment();

    let _ = application_state
        .system_repository
        .append_audit_event(
            "ab_controller",
            "challenger_promoted",
            &challenger_model_id.to_string(),
            Some(&format!("experiment {}", ab_test_id)),
        )
        .await;

    info!("👑 [AB_CONCLUDE]: Challenger {} crowned via experiment {}.", challenger_model_id, ab_test_id);
    Ok(())
}
