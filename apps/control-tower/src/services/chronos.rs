// [apps/control-tower/src/services/chronos.rs]
/*!
 * =================================================================
 * APARATO: CHRONOS RECURRING SCHEDULER (V13.0 - CAS FIRE ENGINE)
 * CLASIFICACIÓN: INFRASTRUCTURE SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: DISPARO RECURRENTE CON RECLAMACIÓN CAS EXCLUSIVA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SINGLE WINNER: La reclamación de un disparo vencido es un CAS sobre
 *    next_run_at; instancias concurrentes no duplican encolados.
 * 2. IDEMPOTENT ENQUEUE: La clave (nombre, disparo programado) deduplica
 *    reintentos de red contra el Ledger.
 *
 * # Mathematical Proof (No Double Fire):
 * Para cada (schedule, next_run_at) a lo sumo un CAS gana; el perdedor
 * observa cero filas afectadas y se abstiene de encolar. La clave de
 * idempotencia sella la segunda línea de defensa en el Ledger.
 * =================================================================
 */

use crate::state::AppState;
use chrono::Utc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info};

/**
 * Inicia el bucle del scheduler recurrente en el runtime de Tokio.
 */
pub async fn spawn_chronos(application_state: AppState, tick_seconds: u64) {
    let mut scheduler_ticker = interval(Duration::from_secs(tick_seconds.max(1)));

    tokio::spawn(async move {
        info!("⏰ [CHRONOS]: Recurring trigger engine initiated ({}s tick).", tick_seconds);

        loop {
            scheduler_ticker.tick().await;

            if !application_state.is_operational.load(Ordering::Relaxed) {
                info!("⏰ [CHRONOS]: Operational flag lowered. Scheduler drained.");
                break;
            }

            let now = Utc::now();
            let due = match application_state.schedule_repository.due_schedules(now).await {
                Ok(schedules) => schedules,
                Err(catalog_fault) => {
                    error!("❌ [CHRONOS]: Due probe failed: {}", catalog_fault);
                    continue;
                }
            };

            for schedule in due {
                // Reclamación CAS: solo una instancia gana el disparo.
                match application_state.schedule_repository.claim_fire(&schedule, now).await {
                    Ok(true) => {
                        let idempotency_key = format!(
                            "{}:{}",
                            schedule.name,
                            schedule.next_run_at.timestamp()
                        );
                        match application_state
                            .job_repository
                            .enqueue(&schedule.payload, Some(&idempotency_key))
                            .await
                        {
                            Ok(job_identifier) => {
                                info!(
                                    "🔥 [CHRONOS]: Schedule '{}' fired as job {}.",
                                    schedule.name, job_identifier
                                );
                            }
                            Err(enqueue_fault) => {
                                error!(
                                    "❌ [CHRONOS]: Enqueue for '{}' failed: {}",
                                    schedule.name, enqueue_fault
                                );
                            }
                        }
                    }
                    Ok(false) => {
                        // CAS perdido: otra instancia ganó el disparo.
                    }
                    Err(claim_fault) => {
                        error!("❌ [CHRONOS]: Claim for '{}' failed: {}", schedule.name, claim_fault);
                    }
                }
            }
        }
    });
}
