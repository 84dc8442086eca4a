// [apps/control-tower/src/services/reaper.rs]
/*!
 * =================================================================
 * APARATO: THE REAPER SYSTEM SERVICE (V13.1 - LEASE HYGIENE)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE (ESTRATO L4)
 * RESPONSABILIDAD: PURGA DE ARRENDAMIENTOS ZOMBIE DEL LEDGER
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. STALE LEASE SWEEP: Órdenes RUNNING con arrendamiento vencido
 *    regresan a cola con el contador de reintentos incrementado;
 *    agotado el presupuesto, se sellan FAILED.
 * 2. ALERT ON EXHAUSTION: El agotamiento de reintentos emite alerta
 *    operativa para el Panóptico.
 * =================================================================
 */

use crate::state::AppState;
use aegis_domain_models::{build_alert_dedup_key, AlertSeverity, AlertSourceKind};
use chrono::Utc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::time::interval;
use tracing::{error, info, warn};

/// Ciclo nominal del barrido de higiene (segundos).
const REAPER_SWEEP_INTERVAL_SECONDS: u64 = 60;

/**
 * Inicia el servicio de limpieza perpetua en el runtime de Tokio.
 */
pub async fn spawn_reaper(application_state: AppState, lease_ttl_minutes: i64) {
    let mut maintenance_ticker = interval(Duration::from_secs(REAPER_SWEEP_INTERVAL_SECONDS));

    tokio::spawn(async move {
        info!("💀 [REAPER_ACTIVE]: Lease hygiene daemon initiated ({}m TTL).", lease_ttl_minutes);

        loop {
            maintenance_ticker.tick().await;

            if !application_state.is_operational.load(Ordering::Relaxed) {
                info!("💀 [REAPER]: Operational flag lowered. Daemon drained.");
                break;
            }

            match application_state.job_repository.sweep_stale_leases(lease_ttl_minutes).await {
                Ok((requeued_count, exhausted_count)) => {
                    if requeued_count > 0 {
                        warn!("💀 [REAPER_SWEEP]: Requeued {} zombie orders.", requeued_count);
                    }
                    if exhausted_count > 0 {
                        // El agotamiento de reintentos amerita alerta operativa.
                        let submit_outcome = application_state
                            .alert_repository
                            .submit_with_dedup(
                                AlertSourceKind::Jobs,
                                None,
                                None,
                                "job_lease_exhausted",
                                &build_alert_dedup_key(None, "job_lease_exhausted", Utc::now()),
                                AlertSeverity::Warning,
                                "Job leases exhausted",
                                &format!(
                                    "{} orders failed after exhausting lease retries",
                                    exhausted_count
                                ),
                            )
                            .await;
                        if let Err(alert_fault) = submit_outcome {
                            error!("❌ [REAPER]: Exhaustion alert rejected: {}", alert_fault);
                        }
                    }
                }
                Err(sweep_fault) => {
                    error!("❌ [REAPER_FAULT]: Lease sweep failed: {}", sweep_fault);
                }
            }
        }
    });
}
