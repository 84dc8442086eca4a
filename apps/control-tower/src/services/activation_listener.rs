// [apps/control-tower/src/services/activation_listener.rs]
/*!
 * =================================================================
 * APARATO: MODEL ACTIVATION LISTENER (V14.0 - ORDERED HOT SWAP)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: RECARGA ATÓMICA DEL PLANO DE SERVICIO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ORDERED PROCESSING: Las activaciones se procesan en orden de
 *    llegada del feed; para un mismo modelo, el orden de promoción.
 * 2. CORRUPTION ROLLBACK: Un artefacto con digest divergente sella el
 *    modelo como 'corrupted' y re-promueve el último PRODUCTION sano
 *    archivado cuando existe.
 * 3. COPY-THEN-SWAP: El modelo se construye y verifica COMPLETO antes
 *    de permutar el puntero caliente.
 * =================================================================
 */

use crate::state::AppState;
use aegis_domain_models::{build_alert_dedup_key, AlertSeverity, AlertSourceKind, ControlPlaneEvent};
use aegis_domain_serving::{load_active_model, ServingError};
use chrono::Utc;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/**
 * Inicia el listener de activaciones suscrito al feed de cambios.
 */
pub async fn spawn_activation_listener(application_state: AppState) {
    let mut feed_receiver = application_state.change_feed.subscribe();

    tokio::spawn(async move {
        info!("🛰️  [ACTIVATION]: Hot swap listener online.");

        // Procesamiento estrictamente en orden de llegada.
        loop {
            match feed_receiver.recv().await {
                Ok(ControlPlaneEvent::ModelActivated { model_id, .. }) => {
                    if let Err(swap_fault) =
                        execute_verified_swap(&application_state, model_id).await
                    {
                        error!("❌ [ACTIVATION]: Swap for {} failed: {}", model_id, swap_fault);
                    }
                }
                Ok(ControlPlaneEvent::ModelRetired { model_id, .. }) => {
                    if application_state.scoring_engine.current_model_id() == Some(model_id) {
                        application_state.scoring_engine.deactivate_model();
                        warn!("🛰️  [ACTIVATION]: Hot pointer cleared after retirement of {}.", model_id);
                    }
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    // El consumidor idempotente re-sincroniza desde el catálogo.
                    warn!("🛰️  [ACTIVATION]: Feed lagged, {} signals skipped.", skipped);
                    if let Ok(Some(production_model)) =
                        application_state.model_repository.current_production().await
                    {
                        if let Err(resync_fault) =
                            execute_verified_swap(&application_state, production_model.id).await
                        {
                            error!("❌ [ACTIVATION]: Resync failed: {}", resync_fault);
                        }
                    }
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
        info!("🛰️  [ACTIVATION]: Feed channel sealed. Listener drained.");
    });
}

/**
 * Carga verificada + swap del puntero caliente, con rollback ante
 * corrupción del artefacto portable.
 */
#[instrument(skip(application_state))]
pub async fn execute_verified_swap(
    application_state: &AppState,
    model_id: Uuid,
) -> anyhow::Result<()> {
    let model_record = application_state.model_repository.get(model_id).await?;

    let portable_bytes =
        match application_state.artifact_vault.get(&model_record.portable_artifact_reference) {
            Ok(bytes) => bytes,
            Err(vault_fault) => {
                warn!("☣️  [ACTIVATION]: Artifact fetch collapsed: {}", vault_fault);
                execute_corruption_rollback(application_state, model_id).await?;
                return Ok(());
            }
        };

    let explainer_means = vec![0.0_f64; model_record.feature_names.len()];
    let staged = load_active_model(
        model_record.id,
        &model_record.schema_hash,
        &model_record.feature_names,
        &portable_bytes,
        &model_record.checksum_hexadecimal,
        explainer_means,
        model_record.metrics.decision_threshold,
    );

    match staged {
        Ok(active_model) => {
            application_state.scoring_engine.activate_model(active_model);
            info!("👑 [ACTIVATION]: Model {} now serving.", model_id);
            Ok(())
        }
        Err(ServingError::ArtifactCorrupted { expected, observed }) => {
            warn!(
                "☣️  [ACTIVATION]: Corrupted artifact for {} (expected {}, observed {}).",
                model_id, expected, observed
            );
            execute_corruption_rollback(application_state, model_id).await
        }
        Err(load_fault) => Err(load_fault.into()),
    }
}

/// Sella el modelo corrupto y re-promueve el último PRODUCTION sano.
async fn execute_corruption_rollback(
    application_state: &AppState,
    corrupted_model_id: Uuid,
) -> anyhow::Result<()> {
    let rollback_candidate =
        application_state.model_repository.mark_corrupted(corrupted_model_id).await?;

    let dedup_key = build_alert_dedup_key(
        Some(corrupted_model_id),
        "artifact_corrupted",
        Utc::now(),
    );
    let _ = application_state
        .alert_repository
        .submit_with_dedup(
            AlertSourceKind::Serving,
            Some(corrupted_model_id.to_string()),
            Some(corrupted_model_id),
            "artifact_corrupted",
            &dedup_key,
            AlertSeverity::Critical,
            "Model artifact corrupted on load",
            "Checksum verification failed during hot swap; model archived as corrupted",
        )
        .await;

    match rollback_candidate {
        Some(previous_model_id) => {
            info!("🔙 [ACTIVATION]: Rolling back to archived champion {}.", previous_model_id);
            application_state.model_repository.promote_to_production(previous_model_id).await?;
            Ok(())
        }
        None => {
            application_state.scoring_engine.deactivate_model();
            warn!("🔙 [ACTIVATION]: No rollback candidate. Serving plane dark.");
            Ok(())
        }
    }
}
