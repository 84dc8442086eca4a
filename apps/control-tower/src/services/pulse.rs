// [apps/control-tower/src/services/pulse.rs]
/*!
 * =================================================================
 * APARATO: SYSTEM PULSE BROADCASTER (V13.0 - HUD HEARTBEAT)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: PULSO AGREGADO PERIÓDICO PARA EL PANÓPTICO
 * =================================================================
 */

use crate::state::AppState;
use aegis_domain_models::{ControlPlaneEvent, JobKind, JobState, SystemPulse};
use chrono::Utc;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tokio::time::interval;
use tracing::info;

/// Ciclo nominal del pulso (segundos).
const PULSE_INTERVAL_SECONDS: u64 = 10;

/**
 * Inicia el emisor del pulso agregado del sistema.
 */
pub async fn spawn_pulse_broadcaster(application_state: AppState) {
    let mut pulse_ticker = interval(Duration::from_secs(PULSE_INTERVAL_SECONDS));

    tokio::spawn(async move {
        info!("💓 [PULSE]: System heartbeat online. Every {}s", PULSE_INTERVAL_SECONDS);

        loop {
            pulse_ticker.tick().await;

            if !application_state.is_operational.load(Ordering::Relaxed) {
                break;
            }

            let mut queue_depth = 0u64;
            for kind in [
                JobKind::Feature,
                JobKind::Training,
                JobKind::Monitoring,
                JobKind::Retraining,
            ] {
                queue_depth += application_state
                    .job_repository
                    .queue_depth_of_kind(kind)
                    .await
                    .unwrap_or(0);
            }

            let jobs_in_flight = application_state
                .job_repository
                .list(Some(JobState::Running), 256)
                .await
                .map(|jobs| jobs.len() as u32)
                .unwrap_or(0);

            application_state.change_feed.publish(ControlPlaneEvent::SystemPulseUpdate(
                SystemPulse {
                    jobs_in_flight,
                    queue_depth: queue_depth as u32,
                    production_model_id: application_state.scoring_engine.current_model_id(),
                    serving_p99_milliseconds: 0.0,
                    predictions_served_total: application_state
                        .scoring_engine
                        .predictions_served_total(),
                    panics_observed: aegis_shared_panoptes::observed_panic_count(),
                    timestamp_ms: Utc::now().timestamp_millis() as u64,
                },
            ));
        }
    });
}
