// [libs/infra/catalog/src/repositories/prediction.rs]
/*!
 * =================================================================
 * APARATO: PREDICTION LOG REPOSITORY (V41.2 - APPEND ONLY)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: RASTRO INMUTABLE DE SCORING Y BACKFILL DE ETIQUETAS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. BATCH CRYSTALLIZATION: El Flusher drena la bóveda de predicciones
 *    en ráfagas transaccionales, acotando el round-trip por registro.
 * 2. OUTCOME BACKFILL: 'actual_label' es la única columna mutable,
 *    alimentando la vigilancia de concepto y los veredictos A/B.
 * =================================================================
 */

use crate::client::CatalogClient;
use crate::errors::CatalogError;
use crate::repositories::{optional_integer, optional_text, parse_identifier, parse_json_column, parse_timestamp, to_json_column};
use aegis_domain_models::PredictionRecord;
use chrono::{DateTime, Utc};
use libsql::{params, Row};
use tracing::{debug, instrument};
use uuid::Uuid;

/// Repositorio de autoridad única para el log de predicciones.
pub struct PredictionRepository {
    catalog_client: CatalogClient,
}

const PREDICTION_PROJECTION: &str =
    "SELECT id, model_id, transaction_id, input_vector_json, score, label_flag, confidence, \
     explanation_json, latency_milliseconds, degraded, actual_label, created_at FROM predictions";

impl PredictionRepository {
    /// Inicializa una nueva instancia del repositorio.
    pub fn new(catalog_client: CatalogClient) -> Self {
        Self { catalog_client }
    }

    /// Cristaliza una ráfaga de predicciones en una sola transacción.
    #[instrument(skip(self, batch), fields(batch_size = batch.len()))]
    pub async fn persist_batch(
        &self,
        batch: &[(PredictionRecord, Option<(Uuid, String)>)],
    ) -> Result<u64, CatalogError> {
        if batch.is_empty() {
            return Ok(0);
        }

        let connection = self.catalog_client.get_connection()?;
        let transaction =
            connection.transaction().await.map_err(|_| CatalogError::TransactionError)?;

        for (record, ab_binding) in batch {
            let (ab_test_id, ab_arm) = match ab_binding {
                Some((test_id, arm)) => (Some(test_id.to_string()), Some(arm.clone())),
                None => (None, None),
            };
            let explanation_column = record
                .explanation
                .as_ref()
                .map(|explanation| to_json_column(explanation, "explanation_json"))
                .transpose()?;
            transaction
                .execute(
                    r#"
                    INSERT INTO predictions (
                        id, model_id, transaction_id, input_vector_json, score, label_flag,
                        confidence, explanation_json, latency_milliseconds, degraded,
                        actual_label, created_at, ab_test_id, ab_arm
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                    "#,
                    params![
                        record.id.to_string(),
                        record.model_id.to_string(),
                        optional_text(record.transaction_id.clone()),
                        to_json_column(&record.input_vector, "input_vector_json")?,
                        record.score,
                        record.label_flag as i64,
                        record.confidence,
                        optional_text(explanation_column),
                        record.latency_milliseconds,
                        record.degraded as i64,
                        optional_integer(record.actual_label.map(|label| label as i64)),
                        record.created_at.to_rfc3339(),
                        optional_text(ab_test_id),
                        optional_text(ab_arm),
                    ],
                )
                .await?;
        }

        transaction.commit().await.map_err(|_| CatalogError::TransactionError)?;
        debug!("💾 [PREDICTION_LOG]: Secured {} records.", batch.len());
        Ok(batch.len() as u64)
    }

    /// Backfill de la etiqueta real de una predicción.
    #[instrument(skip(self))]
    pub async fn record_outcome(
        &self,
        prediction_id: Uuid,
        actual_label: bool,
    ) -> Result<(), CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let rows_affected = connection
            .execute(
                "UPDATE predictions SET actual_label = ?2 WHERE id = ?1",
                params![prediction_id.to_string(), actual_label as i64],
            )
            .await?;
        if rows_affected == 0 {
            return Err(CatalogError::NotFound(format!("prediction {}", prediction_id)));
        }
        Ok(())
    }

    /// Ventana de predicciones de un modelo para la vigilancia de deriva.
    pub async fn window_of_model(
        &self,
        model_id: Uuid,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<PredictionRecord>, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query(
                &format!(
                    "{} WHERE model_id = ?1 AND created_at >= ?2 AND created_at < ?3 \
                     ORDER BY created_at ASC LIMIT ?4",
                    PREDICTION_PROJECTION
                ),
                params![
                    model_id.to_string(),
                    window_start.to_rfc3339(),
                    window_end.to_rfc3339(),
                    limit as i64,
                ],
            )
            .await?;

        let mut records = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            records.push(map_row_to_prediction(&data_row)?);
        }
        Ok(records)
    }

    /// Predicciones con etiqueta real rellenada (vigilancia de concepto).
    pub async fn labeled_of_model(
        &self,
        model_id: Uuid,
        since: DateTime<Utc>,
        limit: u32,
    ) -> Result<Vec<PredictionRecord>, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query(
                &format!(
                    "{} WHERE model_id = ?1 AND actual_label IS NOT NULL AND created_at >= ?2 \
                     ORDER BY created_at ASC LIMIT ?3",
                    PREDICTION_PROJECTION
                ),
                params![model_id.to_string(), since.to_rfc3339(), limit as i64],
            )
            .await?;

        let mut records = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            records.push(map_row_to_prediction(&data_row)?);
        }
        Ok(records)
    }

    /// Conteos (aciertos, ensayos etiquetados) de un brazo A/B.
    pub async fn ab_arm_outcome_counts(
        &self,
        ab_test_id: Uuid,
        arm_label: &str,
    ) -> Result<(u64, u64), CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query(
                "SELECT \
                   SUM(CASE WHEN label_flag = actual_label THEN 1 ELSE 0 END), \
                   COUNT(*) \
                 FROM predictions \
                 WHERE ab_test_id = ?1 AND ab_arm = ?2 AND actual_label IS NOT NULL",
                params![ab_test_id.to_string(), arm_label],
            )
            .await?;

        match query_results.next().await? {
            Some(row) => {
                let successes = row.get::<Option<i64>>(0)?.unwrap_or(0);
                let trials = row.get::<i64>(1)?;
                Ok((successes as u64, trials as u64))
            }
            None => Ok((0, 0)),
        }
    }
}

/// Transforma una fila de persistencia en la entidad de dominio.
fn map_row_to_prediction(data_row: &Row) -> Result<PredictionRecord, CatalogError> {
    Ok(PredictionRecord {
        id: parse_identifier(&data_row.get::<String>(0)?)?,
        model_id: parse_identifier(&data_row.get::<String>(1)?)?,
        transaction_id: data_row.get(2)?,
        input_vector: parse_json_column(&data_row.get::<String>(3)?, "input_vector_json")?,
        score: data_row.get(4)?,
        label_flag: data_row.get::<i64>(5)? != 0,
        confidence: data_row.get(6)?,
        explanation: data_row
            .get::<Option<String>>(7)?
            .map(|raw| parse_json_column(&raw, "explanation_json"))
            .transpose()?,
        latency_milliseconds: data_row.get(8)?,
        degraded: data_row.get::<i64>(9)? != 0,
        actual_label: data_row.get::<Option<i64>>(10)?.map(|label| label != 0),
        created_at: parse_timestamp(&data_row.get::<String>(11)?)?,
    })
}
