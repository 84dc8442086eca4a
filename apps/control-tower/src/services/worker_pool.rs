// [apps/control-tower/src/services/worker_pool.rs]
/*!
 * =================================================================
 * APARATO: JOB WORKER POOL (V14.0 - CAPPED CONCURRENCY)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: RECLAMACIÓN Y DESPACHO CON TOPES POR CLASE
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ONE JOB PER WORKER: Cada worker retiene a lo sumo una orden; el
 *    semáforo por clase materializa el tope de concurrencia y la
 *    contrapresión (sin permiso, no hay reclamación).
 * 2. CAS CLAIM DISCIPLINE: La reclamación delega en el CAS del Ledger;
 *    el pool jamás ejecuta una orden sin haberla ganado.
 * 3. GRACEFUL DRAIN: Al bajar la bandera operativa, los bucles dejan de
 *    reclamar y los trabajos en vuelo completan su etapa corriente.
 * =================================================================
 */

use crate::services::executors;
use crate::state::AppState;
use aegis_domain_models::JobKind;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{error, info};

/// Pausa del bucle de reclamación ante cola vacía.
const IDLE_CLAIM_PAUSE_SECONDS: u64 = 2;

/// Configuración de topes por clase del pool.
#[derive(Debug, Clone, Copy)]
pub struct PoolCaps {
    /// Tope de cómputo de features.
    pub feature: usize,
    /// Tope de entrenamiento.
    pub training: usize,
    /// Tope de vigilancia.
    pub monitoring: usize,
    /// Tope de reentrenamiento.
    pub retraining: usize,
}

/**
 * Inicia los bucles de reclamación por clase en el runtime de Tokio.
 */
pub async fn spawn_worker_pool(application_state: AppState, caps: PoolCaps) {
    let kind_caps = [
        (JobKind::Feature, caps.feature),
        (JobKind::Training, caps.training),
        (JobKind::Monitoring, caps.monitoring),
        (JobKind::Retraining, caps.retraining),
    ];

    for (kind, cap) in kind_caps {
        let state_reference = application_state.clone();
        let kind_semaphore = Arc::new(Semaphore::new(cap.max(1)));

        tokio::spawn(async move {
            info!(
                "🏭 [WORKER_POOL]: Claim loop online for {} (cap {}).",
                kind.canonical_tag(),
                cap
            );

            loop {
                if !state_reference.is_operational.load(Ordering::Relaxed) {
                    info!("🏭 [WORKER_POOL]: Claim loop drained for {}.", kind.canonical_tag());
                    break;
                }

                // Contrapresión: sin permiso libre no se reclama del Ledger.
                let claim_permit = match kind_semaphore.clone().acquire_owned().await {
                    Ok(permit) => permit,
                    Err(_) => break,
                };

                match state_reference.job_repository.claim_next_of_kind(kind).await {
                    Ok(Some(claimed_job)) => {
                        let worker_state = state_reference.clone();
                        tokio::spawn(async move {
                            executors::execute_claimed_job(&worker_state, claimed_job).await;
                            drop(claim_permit);
                        });
                    }
                    Ok(None) => {
                        drop(claim_permit);
                        tokio::time::sleep(Duration::from_secs(IDLE_CLAIM_PAUSE_SECONDS)).await;
                    }
                    Err(claim_fault) => {
                        drop(claim_permit);
                        error!(
                            "❌ [WORKER_POOL]: Claim for {} failed: {}",
                            kind.canonical_tag(),
                            claim_fault
                        );
                        tokio::time::sleep(Duration::from_secs(IDLE_CLAIM_PAUSE_SECONDS)).await;
                    }
                }
            }
        });
    }
}
