// [libs/infra/catalog/src/repositories/alert.rs]
/*!
 * =================================================================
 * APARATO: ALERT REPOSITORY (V42.0 - DEDUP MERGE ENGINE)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: ALERTAS DEDUPLICADAS CON CICLO DE VIDA COMPLETO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. MERGE OVER DUPLICATE: Una emisión sobre una clave con alerta ACTIVE
 *    fusiona (detalles, last_seen_at, contador) en vez de crear una nueva.
 * 2. IDEMPOTENT LIFECYCLE: acknowledge/resolve repetidos sobre el mismo
 *    estado son no-ops; jamás fallan por repetición.
 * 3. AUTO-RESOLVE STREAK: El contador de ventanas OK consecutivas habilita
 *    la resolución automática tras N ventanas nominales.
 *
 * # Mathematical Proof (Dedup Invariant):
 * La fusión dentro de la transacción garantiza que para toda clave K el
 * conteo de alertas ACTIVE con dedup_key = K sea <= 1 en cualquier
 * historia serializada.
 * =================================================================
 */

use crate::client::CatalogClient;
use crate::errors::CatalogError;
use crate::feed::CatalogFeed;
use crate::repositories::{optional_text, parse_identifier, parse_timestamp};
use aegis_domain_models::{
    Alert, AlertSeverity, AlertSourceKind, AlertStatus, ControlPlaneEvent,
};
use chrono::Utc;
use libsql::{params, Row};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Repositorio de autoridad única para alertas.
pub struct AlertRepository {
    catalog_client: CatalogClient,
    change_feed: CatalogFeed,
}

const ALERT_PROJECTION: &str =
    "SELECT id, source_kind, source_reference, model_id, alert_type, dedup_key, severity, \
     title, details, status, occurrence_count, created_at, last_seen_at, acknowledged_at, \
     resolved_at, ok_streak FROM alerts";

impl AlertRepository {
    /// Inicializa una nueva instancia del repositorio.
    pub fn new(catalog_client: CatalogClient, change_feed: CatalogFeed) -> Self {
        Self { catalog_client, change_feed }
    }

    /**
     * Emite una alerta con deduplicación por clave.
     *
     * Si existe una alerta ACTIVE con la misma clave, se fusiona; en caso
     * contrario se crea una nueva. Retorna la alerta resultante.
     */
    #[instrument(skip(self, details), fields(dedup_key = %dedup_key))]
    pub async fn submit_with_dedup(
        &self,
        source_kind: AlertSourceKind,
        source_reference: Option<String>,
        model_id: Option<Uuid>,
        alert_type: &str,
        dedup_key: &str,
        severity: AlertSeverity,
        title: &str,
        details: &str,
    ) -> Result<Alert, CatalogError> {
        let now = Utc::now();
        let connection = self.catalog_client.get_connection()?;
        let transaction =
            connection.transaction().await.map_err(|_| CatalogError::TransactionError)?;

        let mut existing_results = transaction
            .query(
                &format!("{} WHERE dedup_key = ?1 AND status = 'ACTIVE' LIMIT 1", ALERT_PROJECTION),
                params![dedup_key],
            )
            .await?;

        let resulting_alert = if let Some(existing_row) = existing_results.next().await? {
            let mut existing_alert = map_row_to_alert(&existing_row)?;
            drop(existing_results);

            // Fusión: detalles frescos, severidad dominante, contador y pulso.
            let merged_severity = existing_alert.severity.max(severity);
            transaction
                .execute(
                    "UPDATE alerts SET details = ?2, severity = ?3, \
                     occurrence_count = occurrence_count + 1, last_seen_at = ?4, ok_streak = 0 \
                     WHERE id = ?1",
                    params![
                        existing_alert.id.to_string(),
                        details,
                        severity_tag(merged_severity),
                        now.to_rfc3339(),
                    ],
                )
                .await?;

            existing_alert.details = details.to_string();
            existing_alert.severity = merged_severity;
            existing_alert.occurrence_count += 1;
            existing_alert.last_seen_at = now;
            debug!("🔁 [ALERTS]: Merged emission into {} (x{}).", existing_alert.id, existing_alert.occurrence_count);
            existing_alert
        } else {
            drop(existing_results);
            let fresh_alert = Alert {
                id: Uuid::new_v4(),
                source_kind,
                source_reference,
                model_id,
                alert_type: alert_type.to_string(),
                dedup_key: dedup_key.to_string(),
                severity,
                title: title.to_string(),
                details: details.to_string(),
                status: AlertStatus::Active,
                occurrence_count: 1,
                created_at: now,
                last_seen_at: now,
                acknowledged_at: None,
                resolved_at: None,
            };

            transaction
                .execute(
                    r#"
                    INSERT INTO alerts (
                        id, source_kind, source_reference, model_id, alert_type, dedup_key,
                        severity, title, details, status, occurrence_count,
                        created_at, last_seen_at, ok_streak
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'ACTIVE', 1, ?10, ?10, 0)
                    "#,
                    params![
                        fresh_alert.id.to_string(),
                        source_kind_tag(source_kind),
                        optional_text(fresh_alert.source_reference.clone()),
                        optional_text(fresh_alert.model_id.map(|identifier| identifier.to_string())),
                        alert_type,
                        dedup_key,
                        severity_tag(severity),
                        title,
                        details,
                        now.to_rfc3339(),
                    ],
                )
                .await?;

            info!("🚨 [ALERTS]: New {} alert [{}] raised.", severity_tag(severity), title);
            fresh_alert
        };

        transaction.commit().await.map_err(|_| CatalogError::TransactionError)?;

        self.change_feed.publish(ControlPlaneEvent::AlertRaised {
            alert_id: resulting_alert.id,
            dedup_key: resulting_alert.dedup_key.clone(),
            severity: resulting_alert.severity,
            title: resulting_alert.title.clone(),
        });

        Ok(resulting_alert)
    }

    /// Reconocimiento idempotente (ACTIVE -> ACKNOWLEDGED; repetición no-op).
    #[instrument(skip(self))]
    pub async fn acknowledge(&self, alert_id: Uuid) -> Result<Alert, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        connection
            .execute(
                "UPDATE alerts SET status = 'ACKNOWLEDGED', acknowledged_at = ?2 \
                 WHERE id = ?1 AND status = 'ACTIVE'",
                params![alert_id.to_string(), Utc::now().to_rfc3339()],
            )
            .await?;
        self.get(alert_id).await
    }

    /// Resolución (desde ACTIVE o ACKNOWLEDGED; repetición no-op).
    #[instrument(skip(self))]
    pub async fn resolve(&self, alert_id: Uuid) -> Result<Alert, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        connection
            .execute(
                "UPDATE alerts SET status = 'RESOLVED', resolved_at = ?2 \
                 WHERE id = ?1 AND status IN ('ACTIVE', 'ACKNOWLEDGED')",
                params![alert_id.to_string(), Utc::now().to_rfc3339()],
            )
            .await?;
        self.get(alert_id).await
    }

    /// Descarte terminal alternativo.
    #[instrument(skip(self))]
    pub async fn dismiss(&self, alert_id: Uuid) -> Result<Alert, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        connection
            .execute(
                "UPDATE alerts SET status = 'DISMISSED', resolved_at = ?2 \
                 WHERE id = ?1 AND status IN ('ACTIVE', 'ACKNOWLEDGED')",
                params![alert_id.to_string(), Utc::now().to_rfc3339()],
            )
            .await?;
        self.get(alert_id).await
    }

    /**
     * Registra una ventana OK para una clave de deduplicación y resuelve
     * automáticamente al alcanzar el umbral de ventanas consecutivas.
     */
    #[instrument(skip(self))]
    pub async fn record_ok_window(
        &self,
        dedup_prefix: &str,
        consecutive_ok_required: u32,
    ) -> Result<u64, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        connection
            .execute(
                "UPDATE alerts SET ok_streak = ok_streak + 1 \
                 WHERE dedup_key LIKE ?1 AND status IN ('ACTIVE', 'ACKNOWLEDGED')",
                params![format!("{}%", dedup_prefix)],
            )
            .await?;

        let resolved_count = connection
            .execute(
                "UPDATE alerts SET status = 'RESOLVED', resolved_at = ?2 \
                 WHERE dedup_key LIKE ?1 AND status IN ('ACTIVE', 'ACKNOWLEDGED') \
                 AND ok_streak >= ?3",
                params![
                    format!("{}%", dedup_prefix),
                    Utc::now().to_rfc3339(),
                    consecutive_ok_required as i64,
                ],
            )
            .await?;

        if resolved_count > 0 {
            info!("🌤️  [ALERTS]: Auto-resolved {} alerts after {} nominal windows.", resolved_count, consecutive_ok_required);
        }
        Ok(resolved_count)
    }

    /// Recupera una alerta por identificador.
    pub async fn get(&self, alert_id: Uuid) -> Result<Alert, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query(
                &format!("{} WHERE id = ?1", ALERT_PROJECTION),
                params![alert_id.to_string()],
            )
            .await?;
        let data_row = query_results
            .next()
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("alert {}", alert_id)))?;
        map_row_to_alert(&data_row)
    }

    /// Lista alertas con filtros de estado, severidad y modelo.
    pub async fn list(
        &self,
        status_filter: Option<AlertStatus>,
        severity_filter: Option<AlertSeverity>,
        model_filter: Option<Uuid>,
        limit: u32,
    ) -> Result<Vec<Alert>, CatalogError> {
        let connection = self.catalog_client.get_connection()?;

        let mut conditions: Vec<String> = Vec::new();
        if let Some(status) = status_filter {
            conditions.push(format!("status = '{}'", status_tag(status)));
        }
        if let Some(severity) = severity_filter {
            conditions.push(format!("severity = '{}'", severity_tag(severity)));
        }
        if let Some(model_id) = model_filter {
            conditions.push(format!("model_id = '{}'", model_id));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        let mut query_results = connection
            .query(
                &format!(
                    "{} {} ORDER BY last_seen_at DESC LIMIT ?1",
                    ALERT_PROJECTION, where_clause
                ),
                params![limit as i64],
            )
            .await?;

        let mut alerts = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            alerts.push(map_row_to_alert(&data_row)?);
        }
        Ok(alerts)
    }

    /// Conteo de alertas ACTIVE por clave (auditoría del invariante).
    pub async fn active_count_for_key(&self, dedup_key: &str) -> Result<u64, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query(
                "SELECT COUNT(*) FROM alerts WHERE dedup_key = ?1 AND status = 'ACTIVE'",
                params![dedup_key],
            )
            .await?;
        match query_results.next().await? {
            Some(row) => Ok(row.get::<i64>(0)? as u64),
            None => Ok(0),
        }
    }
}

/// Etiqueta canónica del origen.
fn source_kind_tag(kind: AlertSourceKind) -> &'static str {
    match kind {
        AlertSourceKind::Monitoring => "monitoring",
        AlertSourceKind::Jobs => "jobs",
        AlertSourceKind::Serving => "serving",
        AlertSourceKind::Retraining => "retraining",
    }
}

/// Parsea la etiqueta del origen.
fn parse_source_kind(raw: &str) -> Result<AlertSourceKind, CatalogError> {
    match raw {
        "monitoring" => Ok(AlertSourceKind::Monitoring),
        "jobs" => Ok(AlertSourceKind::Jobs),
        "serving" => Ok(AlertSourceKind::Serving),
        "retraining" => Ok(AlertSourceKind::Retraining),
        other => Err(CatalogError::MappingError(format!("unknown alert source '{}'", other))),
    }
}

/// Etiqueta canónica de severidad.
fn severity_tag(severity: AlertSeverity) -> &'static str {
    match severity {
        AlertSeverity::Info => "INFO",
        AlertSeverity::Warning => "WARNING",
        AlertSeverity::Critical => "CRITICAL",
    }
}

/// Parsea la etiqueta de severidad.
fn parse_severity(raw: &str) -> Result<AlertSeverity, CatalogError> {
    match raw {
        "INFO" => Ok(AlertSeverity::Info),
        "WARNING" => Ok(AlertSeverity::Warning),
        "CRITICAL" => Ok(AlertSeverity::Critical),
        other => Err(CatalogError::MappingError(format!("unknown severity '{}'", other))),
    }
}

/// Etiqueta canónica de estado.
fn status_tag(status: AlertStatus) -> &'static str {
    match status {
        AlertStatus::Active => "ACTIVE",
        AlertStatus::Acknowledged => "ACKNOWLEDGED",
        AlertStatus::Resolved => "RESOLVED",
        AlertStatus::Dismissed => "DISMISSED",
    }
}

/// Parsea la etiqueta de estado.
fn parse_status(raw: &str) -> Result<AlertStatus, CatalogError> {
    match raw {
        "ACTIVE" => Ok(AlertStatus::Active),
        "ACKNOWLEDGED" => Ok(AlertStatus::Acknowledged),
        "RESOLVED" => Ok(AlertStatus::Resolved),
        "DISMISSED" => Ok(AlertStatus::Dismissed),
        other => Err(CatalogError::MappingError(format!("unknown alert status '{}'", other))),
    }
}

/// Transforma una fila de persistencia en la entidad de dominio.
fn map_row_to_alert(data_row: &Row) -> Result<Alert, CatalogError> {
    Ok(Alert {
        id: parse_identifier(&data_row.get::<String>(0)?)?,
        source_kind: parse_source_kind(&data_row.get::<String>(1)?)?,
        source_reference: data_row.get(2)?,
        model_id: data_row
            .get::<Option<String>>(3)?
            .map(|raw| parse_identifier(&raw))
            .transpose()?,
        alert_type: data_row.get(4)?,
        dedup_key: data_row.get(5)?,
        severity: parse_severity(&data_row.get::<String>(6)?)?,
        title: data_row.get(7)?,
        details: data_row.get(8)?,
        status: parse_status(&data_row.get::<String>(9)?)?,
        occurrence_count: data_row.get::<i64>(10)? as u32,
        created_at: parse_timestamp(&data_row.get::<String>(11)?)?,
        last_seen_at: parse_timestamp(&data_row.get::<String>(12)?)?,
        acknowledged_at: data_row
            .get::<Option<String>>(13)?
            .map(|raw| parse_timestamp(&raw))
            .transpose()?,
        resolved_at: data_row
            .get::<Option<String>>(14)?
            .map(|raw| parse_timestamp(&raw))
            .transpose()?,
    })
}
