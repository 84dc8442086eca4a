// [tests/mirror/libs/infra/catalog/job_ledger_integrity.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL LEDGER DE TRABAJOS (V2.4 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: IDEMPOTENCIA, CAS, PROGRESO MONÓTONO Y REAPER
 * =================================================================
 */

use aegis_domain_models::{JobKind, JobPayload, JobState};
use aegis_infra_catalog::{CatalogClient, CatalogError, CatalogFeed, JobRepository};
use uuid::Uuid;

/// Payload nominal de vigilancia para las pruebas del Ledger.
fn forge_payload() -> JobPayload {
    JobPayload::DriftScan { model_id: Uuid::new_v4() }
}

async fn forge_repository() -> JobRepository {
    let client = CatalogClient::connect(":memory:", None).await.expect("catalog ignition");
    JobRepository::new(client, CatalogFeed::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    /**
     * CERTIFICACIÓN: N encolados con la misma clave rinden UNA orden.
     */
    #[tokio::test]
    async fn certify_idempotent_enqueue() {
        let repository = forge_repository().await;

        let first = repository.enqueue(&forge_payload(), Some("scan:model:today")).await.expect("enqueue");
        let second = repository.enqueue(&forge_payload(), Some("scan:model:today")).await.expect("enqueue");
        let third = repository.enqueue(&forge_payload(), Some("scan:model:today")).await.expect("enqueue");
        assert_eq!(first, second);
        assert_eq!(first, third);

        assert_eq!(repository.queue_depth_of_kind(JobKind::Monitoring).await.expect("depth"), 1);

        // Clave distinta: orden nueva.
        let unrelated = repository.enqueue(&forge_payload(), Some("scan:other")).await.expect("enqueue");
        assert_ne!(first, unrelated);
    }

    /**
     * CERTIFICACIÓN: La reclamación es exclusiva y el sellado exige RUNNING.
     */
    #[tokio::test]
    async fn certify_exclusive_claim_and_cas_seals() {
        let repository = forge_repository().await;
        let enqueued = repository.enqueue(&forge_payload(), None).await.expect("enqueue");

        // El sellado terminal de una orden QUEUED es un conflicto CAS.
        assert!(matches!(
            repository.mark_completed(enqueued).await,
            Err(CatalogError::ConflictingState { .. })
        ));

        let claimed = repository
            .claim_next_of_kind(JobKind::Monitoring)
            .await
            .expect("claim")
            .expect("one order queued");
        assert_eq!(claimed.id, enqueued);
        assert_eq!(claimed.state, JobState::Running);
        assert!(claimed.started_at.is_some());

        // La cola quedó vacía: la segunda reclamación se abstiene.
        let empty_claim = repository.claim_next_of_kind(JobKind::Monitoring).await.expect("claim");
        assert!(empty_claim.is_none());

        repository.mark_completed(enqueued).await.expect("seal");
        let sealed = repository.get(enqueued).await.expect("fetch");
        assert_eq!(sealed.state, JobState::Completed);
        assert!((sealed.progress - 1.0).abs() < f64::EPSILON);

        // Doble sellado: conflicto, sin sobreescritura silenciosa.
        assert!(repository.mark_completed(enqueued).await.is_err());
    }

    /**
     * CERTIFICACIÓN: El progreso persistido es monótono no-decreciente.
     */
    #[tokio::test]
    async fn certify_monotonic_progress() {
        let repository = forge_repository().await;
        let enqueued = repository.enqueue(&forge_payload(), None).await.expect("enqueue");
        let claimed = repository
            .claim_next_of_kind(JobKind::Monitoring)
            .await
            .expect("claim")
            .expect("order");

        repository.update_progress(claimed.id, 0.6, "sweep").await.expect("progress");
        // Regresión de progreso: el Ledger retiene el máximo.
        repository.update_progress(claimed.id, 0.3, "sweep").await.expect("progress");

        let observed = repository.get(enqueued).await.expect("fetch");
        assert!((observed.progress - 0.6).abs() < 1e-9);
    }

    /**
     * CERTIFICACIÓN: Cancelación cooperativa y sellado CANCELLED.
     */
    #[tokio::test]
    async fn certify_cooperative_cancellation() {
        let repository = forge_repository().await;
        let enqueued = repository.enqueue(&forge_payload(), None).await.expect("enqueue");
        let claimed = repository
            .claim_next_of_kind(JobKind::Monitoring)
            .await
            .expect("claim")
            .expect("order");

        assert!(!repository.is_cancellation_requested(claimed.id).await.expect("flag"));
        repository.request_cancellation(claimed.id).await.expect("request");
        assert!(repository.is_cancellation_requested(claimed.id).await.expect("flag"));

        repository.mark_cancelled(claimed.id).await.expect("seal");
        assert_eq!(repository.get(enqueued).await.expect("fetch").state, JobState::Cancelled);
    }

    /**
     * CERTIFICACIÓN: El Reaper reencola arrendamientos vencidos hasta
     * agotar los tres reintentos y después sella FAILED.
     */
    #[tokio::test]
    async fn certify_reaper_retry_budget() {
        let repository = forge_repository().await;
        let enqueued = repository.enqueue(&forge_payload(), None).await.expect("enqueue");

        // Tres ciclos reclamación -> barrido con TTL vencido (0 minutos).
        for expected_retry in 1..=3u32 {
            let claimed = repository
                .claim_next_of_kind(JobKind::Monitoring)
                .await
                .expect("claim")
                .expect("order");
            assert_eq!(claimed.id, enqueued);

            tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
            let (requeued, exhausted) =
                repository.sweep_stale_leases(0).await.expect("sweep");
            assert_eq!((requeued, exhausted), (1, 0), "cycle {}", expected_retry);

            let observed = repository.get(enqueued).await.expect("fetch");
            assert_eq!(observed.state, JobState::Queued);
            assert_eq!(observed.retry_count, expected_retry);
        }

        // Cuarto ciclo: presupuesto agotado, sellado FAILED.
        let _ = repository
            .claim_next_of_kind(JobKind::Monitoring)
            .await
            .expect("claim")
            .expect("order");
        tokio::time::sleep(std::time::Duration::from_millis(1100)).await;
        let (requeued, exhausted) = repository.sweep_stale_leases(0).await.expect("sweep");
        assert_eq!((requeued, exhausted), (0, 1));

        let terminal = repository.get(enqueued).await.expect("fetch");
        assert_eq!(terminal.state, JobState::Failed);
        assert!(terminal.error_message.expect("error").contains("lease expired"));
    }
}
