// [tests/mirror/libs/infra/catalog/alert_dedup.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE DEDUPLICACIÓN DE ALERTAS (V2.2 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: FUSIÓN POR CLAVE, CICLO DE VIDA Y AUTO-RESOLUCIÓN
 * =================================================================
 */

use aegis_domain_models::{AlertSeverity, AlertSourceKind, AlertStatus};
use aegis_infra_catalog::{AlertRepository, CatalogClient, CatalogFeed};
use uuid::Uuid;

async fn forge_repository() -> AlertRepository {
    let client = CatalogClient::connect(":memory:", None).await.expect("catalog ignition");
    AlertRepository::new(client, CatalogFeed::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    /**
     * CERTIFICACIÓN: N emisiones sobre la misma clave rinden UNA alerta
     * ACTIVE con contador de ocurrencias y severidad dominante.
     */
    #[tokio::test]
    async fn certify_merge_over_duplicate() {
        let repository = forge_repository().await;
        let model_id = Uuid::new_v4();
        let dedup_key = format!("{}|data_drift:amount_zscore|2026-08-01", model_id);

        let first = repository
            .submit_with_dedup(
                AlertSourceKind::Monitoring,
                None,
                Some(model_id),
                "data_drift:amount_zscore",
                &dedup_key,
                AlertSeverity::Warning,
                "Data drift on amount_zscore",
                "psi = 0.18",
            )
            .await
            .expect("first emission");
        assert_eq!(first.occurrence_count, 1);

        let merged = repository
            .submit_with_dedup(
                AlertSourceKind::Monitoring,
                None,
                Some(model_id),
                "data_drift:amount_zscore",
                &dedup_key,
                AlertSeverity::Critical,
                "Data drift on amount_zscore",
                "psi = 0.31",
            )
            .await
            .expect("second emission");

        // Misma identidad, contador incrementado, severidad dominante.
        assert_eq!(merged.id, first.id);
        assert_eq!(merged.occurrence_count, 2);
        assert_eq!(merged.severity, AlertSeverity::Critical);
        assert_eq!(merged.details, "psi = 0.31");

        // Invariante: a lo sumo una ACTIVE por clave.
        assert_eq!(repository.active_count_for_key(&dedup_key).await.expect("count"), 1);
    }

    /**
     * CERTIFICACIÓN: acknowledge es idempotente y el ciclo termina en
     * RESOLVED; una emisión posterior sobre la clave abre alerta NUEVA.
     */
    #[tokio::test]
    async fn certify_lifecycle_and_reopen() {
        let repository = forge_repository().await;
        let dedup_key = "global|job_failed:internal|2026-08-01";

        let submitted = repository
            .submit_with_dedup(
                AlertSourceKind::Jobs,
                None,
                None,
                "job_failed:internal",
                dedup_key,
                AlertSeverity::Critical,
                "Background job failed",
                "invariant broken",
            )
            .await
            .expect("emission");

        let acknowledged = repository.acknowledge(submitted.id).await.expect("ack");
        assert_eq!(acknowledged.status, AlertStatus::Acknowledged);
        assert!(acknowledged.acknowledged_at.is_some());

        // Segunda invocación: no-op certificado.
        let acknowledged_again = repository.acknowledge(submitted.id).await.expect("ack twice");
        assert_eq!(acknowledged_again.status, AlertStatus::Acknowledged);
        assert_eq!(acknowledged_again.acknowledged_at, acknowledged.acknowledged_at);

        let resolved = repository.resolve(submitted.id).await.expect("resolve");
        assert_eq!(resolved.status, AlertStatus::Resolved);

        // La clave quedó libre: una emisión nueva abre OTRA alerta.
        let reopened = repository
            .submit_with_dedup(
                AlertSourceKind::Jobs,
                None,
                None,
                "job_failed:internal",
                dedup_key,
                AlertSeverity::Warning,
                "Background job failed",
                "second wave",
            )
            .await
            .expect("reopen");
        assert_ne!(reopened.id, submitted.id);
        assert_eq!(reopened.occurrence_count, 1);
    }

    /**
     * CERTIFICACIÓN: DISMISSED es terminal alternativo.
     */
    #[tokio::test]
    async fn certify_dismissal_terminal() {
        let repository = forge_repository().await;
        let submitted = repository
            .submit_with_dedup(
                AlertSourceKind::Serving,
                None,
                None,
                "latency_budget",
                "global|latency_budget|2026-08-01",
                AlertSeverity::Info,
                "Latency budget grazed",
                "p99 at 94ms",
            )
            .await
            .expect("emission");

        let dismissed = repository.dismiss(submitted.id).await.expect("dismiss");
        assert_eq!(dismissed.status, AlertStatus::Dismissed);

        // Resolver una alerta descartada es un no-op sobre el estado.
        let still_dismissed = repository.resolve(submitted.id).await.expect("resolve");
        assert_eq!(still_dismissed.status, AlertStatus::Dismissed);
    }

    /**
     * CERTIFICACIÓN: Dos ventanas OK consecutivas resuelven la alerta;
     * una sola no alcanza (histéresis de auto-resolución).
     */
    #[tokio::test]
    async fn certify_auto_resolve_after_consecutive_ok_windows() {
        let repository = forge_repository().await;
        let model_id = Uuid::new_v4();
        let dedup_prefix = format!("{}|data_drift:amount_zscore", model_id);

        let submitted = repository
            .submit_with_dedup(
                AlertSourceKind::Monitoring,
                None,
                Some(model_id),
                "data_drift:amount_zscore",
                &format!("{}|2026-08-01", dedup_prefix),
                AlertSeverity::Critical,
                "Data drift on amount_zscore",
                "psi = 0.4",
            )
            .await
            .expect("emission");

        // Primera ventana OK: viva todavía.
        let resolved_count =
            repository.record_ok_window(&dedup_prefix, 2).await.expect("ok window");
        assert_eq!(resolved_count, 0);
        assert_eq!(
            repository.get(submitted.id).await.expect("fetch").status,
            AlertStatus::Active
        );

        // Segunda ventana OK consecutiva: resolución automática.
        let resolved_count =
            repository.record_ok_window(&dedup_prefix, 2).await.expect("ok window");
        assert_eq!(resolved_count, 1);
        assert_eq!(
            repository.get(submitted.id).await.expect("fetch").status,
            AlertStatus::Resolved
        );
    }
}
