// [apps/control-tower/src/services/prediction_flusher.rs]
/*!
 * =================================================================
 * APARATO: PREDICTION FLUSHER SERVICE (V13.0 - WRITE BEHIND)
 * CLASIFICACIÓN: BACKGROUND INFRASTRUCTURE SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: DRENAJE DURABLE DE LA BÓVEDA DE PREDICCIONES
 * =================================================================
 */

use crate::state::AppState;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::time::interval;
use tracing::{debug, error, info};

/// Configuración de ráfagas de persistencia.
const FLUSH_INTERVAL_SECONDS: u64 = 5;

/// Daemon de volcado táctico del log de predicciones.
pub struct PredictionFlusherService {
    application_state: AppState,
}

impl PredictionFlusherService {
    /// Forja el servicio inyectando el estado maestro.
    pub fn new(application_state: AppState) -> Self {
        Self { application_state }
    }

    /**
     * Inicia el daemon de volcado táctico.
     * Al bajar la bandera operativa ejecuta un drenaje final antes de morir.
     */
    pub async fn spawn_flusher_daemon(self) {
        tokio::spawn(async move {
            let mut timer = interval(Duration::from_secs(FLUSH_INTERVAL_SECONDS));
            info!("💾 [PREDICTION_FLUSHER]: Archival heart active. Every {}s", FLUSH_INTERVAL_SECONDS);

            loop {
                timer.tick().await;

                let is_draining =
                    !self.application_state.is_operational.load(Ordering::Relaxed);

                // 1. DRENAJE ATÓMICO (+ REABSORCIÓN DE DERRAME)
                let pending_batch = self.application_state.prediction_vault.drain_for_flush();

                if !pending_batch.is_empty() {
                    // 2. PERSISTENCIA EN EL CATÁLOGO
                    match self
                        .application_state
                        .prediction_repository
                        .persist_batch(&pending_batch)
                        .await
                    {
                        Ok(count) => {
                            debug!("✅ [FLUSH_SUCCESS]: Secured {} predictions.", count);
                        }
                        Err(flush_fault) => {
                            error!("❌ [FLUSH_CRITICAL_FAULT]: Persistence failure: {}", flush_fault);
                        }
                    }
                }

                if is_draining {
                    info!("💾 [PREDICTION_FLUSHER]: Final drain executed. Daemon sealed.");
                    break;
                }
            }
        });
    }
}
