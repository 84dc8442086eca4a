// [libs/infra/catalog/src/repositories/metric.rs]
/*!
 * =================================================================
 * APARATO: MONITORING METRIC REPOSITORY (V41.0 - HYSTERESIS TRAIL)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: RASTRO DE MÉTRICAS DE DERIVA Y SESGO POR VENTANA
 * =================================================================
 */

use crate::client::CatalogClient;
use crate::errors::CatalogError;
use crate::repositories::{parse_identifier, parse_timestamp};
use aegis_domain_models::{BiasMetricRecord, DriftMetricRecord, MetricStatus, MonitorKind};
use chrono::{DateTime, Utc};
use libsql::{params, Row};
use tracing::instrument;
use uuid::Uuid;

/// Repositorio de autoridad única para métricas de vigilancia.
pub struct MetricRepository {
    catalog_client: CatalogClient,
}

impl MetricRepository {
    /// Inicializa una nueva instancia del repositorio.
    pub fn new(catalog_client: CatalogClient) -> Self {
        Self { catalog_client }
    }

    /// Cristaliza una fila de métrica de deriva.
    #[instrument(skip(self, record))]
    pub async fn insert_drift(&self, record: &DriftMetricRecord) -> Result<(), CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        connection
            .execute(
                r#"
                INSERT INTO drift_metrics (
                    id, model_id, kind, feature_name, metric_name, value, status,
                    window_start, window_end, computed_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
                params![
                    record.id.to_string(),
                    record.model_id.to_string(),
                    record.kind.canonical_tag(),
                    record.feature_name.clone(),
                    record.metric_name.clone(),
                    record.value,
                    status_tag(record.status),
                    record.window_start.to_rfc3339(),
                    record.window_end.to_rfc3339(),
                    record.computed_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    /// Cristaliza una fila de métrica de sesgo.
    #[instrument(skip(self, record))]
    pub async fn insert_bias(&self, record: &BiasMetricRecord) -> Result<(), CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        connection
            .execute(
                r#"
                INSERT INTO bias_metrics (
                    id, model_id, protected_attribute, metric_name, value, status,
                    window_start, window_end, computed_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    record.id.to_string(),
                    record.model_id.to_string(),
                    record.protected_attribute.clone(),
                    record.metric_name.clone(),
                    record.value,
                    status_tag(record.status),
                    record.window_start.to_rfc3339(),
                    record.window_end.to_rfc3339(),
                    record.computed_at.to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }

    /**
     * Rastro reciente de estados de una identidad de métrica de deriva,
     * ordenado del más nuevo al más viejo (insumo de la histéresis).
     */
    pub async fn recent_drift_statuses(
        &self,
        model_id: Uuid,
        feature_name: &str,
        metric_name: &str,
        limit: u32,
    ) -> Result<Vec<MetricStatus>, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query(
                "SELECT status FROM drift_metrics \
                 WHERE model_id = ?1 AND feature_name = ?2 AND metric_name = ?3 \
                 ORDER BY computed_at DESC LIMIT ?4",
                params![model_id.to_string(), feature_name, metric_name, limit as i64],
            )
            .await?;

        let mut statuses = Vec::new();
        while let Some(row) = query_results.next().await? {
            statuses.push(parse_status(&row.get::<String>(0)?)?);
        }
        Ok(statuses)
    }

    /// Rastro reciente de estados de una métrica de sesgo.
    pub async fn recent_bias_statuses(
        &self,
        model_id: Uuid,
        protected_attribute: &str,
        metric_name: &str,
        limit: u32,
    ) -> Result<Vec<MetricStatus>, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query(
                "SELECT status FROM bias_metrics \
                 WHERE model_id = ?1 AND protected_attribute = ?2 AND metric_name = ?3 \
                 ORDER BY computed_at DESC LIMIT ?4",
                params![model_id.to_string(), protected_attribute, metric_name, limit as i64],
            )
            .await?;

        let mut statuses = Vec::new();
        while let Some(row) = query_results.next().await? {
            statuses.push(parse_status(&row.get::<String>(0)?)?);
        }
        Ok(statuses)
    }

    /// Métricas de deriva de un modelo dentro de una ventana de consulta.
    pub async fn drift_metrics_of_model(
        &self,
        model_id: Uuid,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<DriftMetricRecord>, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query(
                "SELECT id, model_id, kind, feature_name, metric_name, value, status, \
                 window_start, window_end, computed_at FROM drift_metrics \
                 WHERE model_id = ?1 AND computed_at >= ?2 ORDER BY computed_at DESC LIMIT ?3",
                params![model_id.to_string(), since.to_rfc3339(), limit as i64],
            )
            .await?;

        let mut records = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            records.push(map_row_to_drift(&data_row)?);
        }
        Ok(records)
    }

    /// Métricas de sesgo de un modelo dentro de una ventana de consulta.
    pub async fn bias_metrics_of_model(
        &self,
        model_id: Uuid,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<BiasMetricRecord>, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query(
                "SELECT id, model_id, protected_attribute, metric_name, value, status, \
                 window_start, window_end, computed_at FROM bias_metrics \
                 WHERE model_id = ?1 AND computed_at >= ?2 ORDER BY computed_at DESC LIMIT ?3",
                params![model_id.to_string(), since.to_rfc3339(), limit as i64],
            )
            .await?;

        let mut records = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            records.push(map_row_to_bias(&data_row)?);
        }
        Ok(records)
    }
}

/// Etiqueta canónica de la banda semafórica.
fn status_tag(status: MetricStatus) -> &'static str {
    match status {
        MetricStatus::Ok => "OK",
        MetricStatus::Warning => "WARNING",
        MetricStatus::Critical => "CRITICAL",
    }
}

/// Parsea la etiqueta de banda semafórica.
fn parse_status(raw: &str) -> Result<MetricStatus, CatalogError> {
    match raw {
        "OK" => Ok(MetricStatus::Ok),
        "WARNING" => Ok(MetricStatus::Warning),
        "CRITICAL" => Ok(MetricStatus::Critical),
        other => Err(CatalogError::MappingError(format!("unknown metric status '{}'", other))),
    }
}

/// Parsea la etiqueta de familia de vigilancia.
fn parse_kind(raw: &str) -> Result<MonitorKind, CatalogError> {
    match raw {
        "data_drift" => Ok(MonitorKind::DataDrift),
        "concept_drift" => Ok(MonitorKind::ConceptDrift),
        "bias" => Ok(MonitorKind::Bias),
        other => Err(CatalogError::MappingError(format!("unknown monitor kind '{}'", other))),
    }
}

/// Transforma una fila de deriva en la entidad de dominio.
fn map_row_to_drift(data_row: &Row) -> Result<DriftMetricRecord, CatalogError> {
    Ok(DriftMetricRecord {
        id: parse_identifier(&data_row.get::<String>(0)?)?,
        model_id: parse_identifier(&data_row.get::<String>(1)?)?,
        kind: parse_kind(&data_row.get::<String>(2)?)?,
        feature_name: data_row.get(3)?,
        metric_name: data_row.get(4)?,
        value: data_row.get(5)?,
        status: parse_status(&data_row.get::<String>(6)?)?,
        window_start: parse_timestamp(&data_row.get::<String>(7)?)?,
        window_end: parse_timestamp(&data_row.get::<String>(8)?)?,
        computed_at: parse_timestamp(&data_row.get::<String>(9)?)?,
    })
}

/// Transforma una fila de sesgo en la entidad de dominio.
fn map_row_to_bias(data_row: &Row) -> Result<BiasMetricRecord, CatalogError> {
    Ok(BiasMetricRecord {
        id: parse_identifier(&data_row.get::<String>(0)?)?,
        model_id: parse_identifier(&data_row.get::<String>(1)?)?,
        protected_attribute: data_row.get(2)?,
        metric_name: data_row.get(3)?,
        value: data_row.get(4)?,
        status: parse_status(&data_row.get::<String>(5)?)?,
        window_start: parse_timestamp(&data_row.get::<String>(6)?)?,
        window_end: parse_timestamp(&data_row.get::<String>(7)?)?,
        computed_at: parse_timestamp(&data_row.get::<String>(8)?)?,
    })
}
