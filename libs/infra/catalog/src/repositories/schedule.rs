// [libs/infra/catalog/src/repositories/schedule.rs]
/*!
 * =================================================================
 * APARATO: RECURRING SCHEDULE REPOSITORY (V41.0 - CAS FIRE CLAIM)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: DISPARADORES RECURRENTES CON PRÓXIMO DISPARO SELLADO
 *
 * # Mathematical Proof (Single Fire):
 * La reclamación de un disparo es un CAS sobre (id, next_run_at). Dos
 * schedulers concurrentes leen el mismo next_run_at pero solo uno logra
 * avanzarlo; el perdedor observa cero filas afectadas y se abstiene.
 * =================================================================
 */

use crate::client::CatalogClient;
use crate::errors::CatalogError;
use crate::repositories::{parse_identifier, parse_json_column, parse_timestamp, to_json_column};
use aegis_domain_models::{JobPayload, RecurringSchedule};
use chrono::{DateTime, Duration, Utc};
use libsql::{params, Row};
use tracing::{info, instrument};
use uuid::Uuid;

/// Repositorio de autoridad única para disparadores recurrentes.
pub struct ScheduleRepository {
    catalog_client: CatalogClient,
}

const SCHEDULE_PROJECTION: &str =
    "SELECT id, name, payload_json, interval_seconds, next_run_at, enabled, last_fired_at \
     FROM recurring_schedules";

impl ScheduleRepository {
    /// Inicializa una nueva instancia del repositorio.
    pub fn new(catalog_client: CatalogClient) -> Self {
        Self { catalog_client }
    }

    /// Registra (o reemplaza por nombre) un disparador recurrente.
    #[instrument(skip(self, payload))]
    pub async fn upsert(
        &self,
        name: &str,
        payload: &JobPayload,
        interval_seconds: u64,
        first_run_at: DateTime<Utc>,
    ) -> Result<Uuid, CatalogError> {
        if interval_seconds == 0 {
            return Err(CatalogError::Validation("interval_seconds must be positive".into()));
        }

        let connection = self.catalog_client.get_connection()?;
        let schedule_identifier = Uuid::new_v4();
        connection
            .execute(
                r#"
                INSERT INTO recurring_schedules (
                    id, name, payload_json, interval_seconds, next_run_at, enabled
                ) VALUES (?1, ?2, ?3, ?4, ?5, 1)
                ON CONFLICT(name) DO UPDATE SET
                    payload_json = ?3, interval_seconds = ?4
                "#,
                params![
                    schedule_identifier.to_string(),
                    name,
                    to_json_column(payload, "payload_json")?,
                    interval_seconds as i64,
                    first_run_at.to_rfc3339(),
                ],
            )
            .await?;

        info!("⏰ [CHRONOS_LEDGER]: Schedule '{}' armed every {}s.", name, interval_seconds);
        Ok(schedule_identifier)
    }

    /// Disparadores habilitados cuyo próximo disparo ya venció.
    pub async fn due_schedules(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<RecurringSchedule>, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query(
                &format!(
                    "{} WHERE enabled = 1 AND next_run_at <= ?1 ORDER BY next_run_at ASC",
                    SCHEDULE_PROJECTION
                ),
                params![now.to_rfc3339()],
            )
            .await?;

        let mut schedules = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            schedules.push(map_row_to_schedule(&data_row)?);
        }
        Ok(schedules)
    }

    /**
     * Reclama un disparo vencido mediante CAS sobre next_run_at.
     * Retorna true si esta instancia ganó la reclamación.
     */
    #[instrument(skip(self, schedule))]
    pub async fn claim_fire(
        &self,
        schedule: &RecurringSchedule,
        now: DateTime<Utc>,
    ) -> Result<bool, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let next_fire = now + Duration::seconds(schedule.interval_seconds as i64);

        let rows_affected = connection
            .execute(
                "UPDATE recurring_schedules \
                 SET next_run_at = ?3, last_fired_at = ?4 \
                 WHERE id = ?1 AND next_run_at = ?2 AND enabled = 1",
                params![
                    schedule.id.to_string(),
                    schedule.next_run_at.to_rfc3339(),
                    next_fire.to_rfc3339(),
                    now.to_rfc3339(),
                ],
            )
            .await?;

        Ok(rows_affected == 1)
    }

    /// Habilita o deshabilita un disparador por nombre.
    #[instrument(skip(self))]
    pub async fn set_enabled(&self, name: &str, enabled: bool) -> Result<(), CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let rows_affected = connection
            .execute(
                "UPDATE recurring_schedules SET enabled = ?2 WHERE name = ?1",
                params![name, enabled as i64],
            )
            .await?;
        if rows_affected == 0 {
            return Err(CatalogError::NotFound(format!("schedule '{}'", name)));
        }
        Ok(())
    }

    /// Lista completa de disparadores.
    pub async fn list(&self) -> Result<Vec<RecurringSchedule>, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query(&format!("{} ORDER BY name ASC", SCHEDULE_PROJECTION), ())
            .await?;

        let mut schedules = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            schedules.push(map_row_to_schedule(&data_row)?);
        }
        Ok(schedules)
    }
}

/// Transforma una fila de persistencia en la entidad de dominio.
fn map_row_to_schedule(data_row: &Row) -> Result<RecurringSchedule, CatalogError> {
    Ok(RecurringSchedule {
        id: parse_identifier(&data_row.get::<String>(0)?)?,
        name: data_row.get(1)?,
        payload: parse_json_column(&data_row.get::<String>(2)?, "payload_json")?,
        interval_seconds: data_row.get::<i64>(3)? as u64,
        next_run_at: parse_timestamp(&data_row.get::<String>(4)?)?,
        enabled: data_row.get::<i64>(5)? != 0,
        last_fired_at: data_row
            .get::<Option<String>>(6)?
            .map(|raw| parse_timestamp(&raw))
            .transpose()?,
    })
}
