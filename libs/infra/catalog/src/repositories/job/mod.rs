// [libs/infra/catalog/src/repositories/job/mod.rs]
/*!
 * =================================================================
 * APARATO: JOB LEDGER REPOSITORY (V42.1 - TACTICAL LEDGER GUARD)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GESTIÓN DEL CICLO DE VIDA DE ÓRDENES DE TRABAJO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. SEMANTIC ERROR HANDLING: Utiliza 'CatalogError' para reportar
 *    fallos de transacción, permitiendo recuperación autonómica.
 * 2. IDEMPOTENT ENQUEUE: Claves repetidas retornan la orden viva previa
 *    en lugar de duplicar trabajo.
 * 3. FEED SYNC: Todo cambio de estado publica 'JobStateChanged' tras el
 *    commit para los consumidores idempotentes.
 *
 * # Mathematical Proof (Transactional Exclusivity):
 * El repositorio implementa un semáforo ACID. Al encapsular la búsqueda
 * y reclamación dentro de una guardia CAS de estado, se garantiza que
 * ninguna orden sea ejecutada por dos workers simultáneamente.
 * =================================================================
 */

pub mod queries;

use crate::client::CatalogClient;
use crate::errors::CatalogError;
use crate::feed::CatalogFeed;
use crate::repositories::{optional_text, parse_identifier, parse_json_column, parse_timestamp, to_json_column};
use aegis_domain_models::{ControlPlaneEvent, JobKind, JobPayload, JobRecord, JobState};
use chrono::{Duration, Utc};
use libsql::{params, Row};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use self::queries as sql_registry;

/// Reintentos máximos antes del sellado FAILED por el Reaper.
pub const MAX_LEASE_RETRIES: u32 = 3;
/// Arrendamiento nominal de una orden reclamada (30 minutos).
pub const DEFAULT_LEASE_TTL_MINUTES: i64 = 30;

/// Repositorio de autoridad única para el Ledger de trabajos.
pub struct JobRepository {
    catalog_client: CatalogClient,
    change_feed: CatalogFeed,
}

impl JobRepository {
    /// Inicializa una nueva instancia del repositorio.
    pub fn new(catalog_client: CatalogClient, change_feed: CatalogFeed) -> Self {
        Self { catalog_client, change_feed }
    }

    /**
     * Encola una orden con deduplicación por clave de idempotencia.
     *
     * Ante clave repetida con orden viva, retorna el identificador previo
     * sin crear trabajo nuevo.
     */
    #[instrument(skip(self, payload))]
    pub async fn enqueue(
        &self,
        payload: &JobPayload,
        idempotency_key: Option<&str>,
    ) -> Result<Uuid, CatalogError> {
        let connection = self.catalog_client.get_connection()?;

        if let Some(key) = idempotency_key {
            let mut existing_results =
                connection.query(sql_registry::FIND_BY_IDEMPOTENCY_KEY, params![key]).await?;
            if let Some(existing_row) = existing_results.next().await? {
                let existing_identifier = parse_identifier(&existing_row.get::<String>(0)?)?;
                debug!("🔁 [JOB_LEDGER]: Idempotent enqueue deduplicated into {}.", existing_identifier);
                return Ok(existing_identifier);
            }
        }

        let job_identifier = Uuid::new_v4();
        connection
            .execute(
                sql_registry::INITIALIZE_JOB,
                params![
                    job_identifier.to_string(),
                    payload.kind().canonical_tag(),
                    to_json_column(payload, "payload_json")?,
                    optional_text(idempotency_key),
                    Utc::now().to_rfc3339(),
                ],
            )
            .await?;

        self.change_feed.publish(ControlPlaneEvent::JobStateChanged {
            job_id: job_identifier,
            kind: payload.kind(),
            state: JobState::Queued,
            progress: 0.0,
        });

        info!("📥 [JOB_LEDGER]: Order {} enqueued as {}.", job_identifier, payload.kind().canonical_tag());
        Ok(job_identifier)
    }

    /**
     * Reclama la orden en cola más antigua de una clase mediante CAS.
     * Solo una reclamación concurrente gana; las demás retornan None.
     */
    #[instrument(skip(self))]
    pub async fn claim_next_of_kind(
        &self,
        kind: JobKind,
    ) -> Result<Option<JobRecord>, CatalogError> {
        let connection = self.catalog_client.get_connection()?;

        loop {
            let mut candidate_results = connection
                .query(sql_registry::FIND_NEXT_QUEUED_OF_KIND, params![kind.canonical_tag()])
                .await?;

            let Some(candidate_row) = candidate_results.next().await? else {
                return Ok(None);
            };
            let candidate_identifier: String = candidate_row.get(0)?;
            drop(candidate_results);

            let rows_affected = connection
                .execute(
                    sql_registry::CLAIM_JOB,
                    params![candidate_identifier.clone(), Utc::now().to_rfc3339()],
                )
                .await?;

            if rows_affected == 1 {
                let claimed = self.get(parse_identifier(&candidate_identifier)?).await?;
                self.change_feed.publish(ControlPlaneEvent::JobStateChanged {
                    job_id: claimed.id,
                    kind: claimed.payload.kind(),
                    state: JobState::Running,
                    progress: claimed.progress,
                });
                return Ok(Some(claimed));
            }
            // CAS perdido contra otra reclamación; reintento inmediato.
        }
    }

    /// Sincroniza el progreso monótono y la etiqueta de etapa.
    pub async fn update_progress(
        &self,
        job_id: Uuid,
        progress: f64,
        stage_tag: &str,
    ) -> Result<(), CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        connection
            .execute(
                sql_registry::UPDATE_PROGRESS,
                params![job_id.to_string(), progress.clamp(0.0, 1.0), stage_tag],
            )
            .await?;
        Ok(())
    }

    /// Solicita la cancelación cooperativa de una orden viva.
    #[instrument(skip(self))]
    pub async fn request_cancellation(&self, job_id: Uuid) -> Result<(), CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let rows_affected = connection
            .execute(sql_registry::REQUEST_CANCELLATION, params![job_id.to_string()])
            .await?;
        if rows_affected == 0 {
            return Err(CatalogError::ConflictingState {
                entity: format!("job {}", job_id),
                expected: "QUEUED|RUNNING".into(),
                observed: "terminal".into(),
            });
        }
        Ok(())
    }

    /// Bandera de cancelación (sondeada en fronteras de etapa).
    pub async fn is_cancellation_requested(&self, job_id: Uuid) -> Result<bool, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query(sql_registry::READ_CANCEL_FLAG, params![job_id.to_string()])
            .await?;
        match query_results.next().await? {
            Some(row) => Ok(row.get::<i64>(0)? != 0),
            None => Err(CatalogError::NotFound(format!("job {}", job_id))),
        }
    }

    /// Sella la orden como completada (CAS desde RUNNING).
    #[instrument(skip(self))]
    pub async fn mark_completed(&self, job_id: Uuid) -> Result<(), CatalogError> {
        self.seal_terminal(job_id, sql_registry::MARK_COMPLETED, None, JobState::Completed).await
    }

    /// Sella la orden como fallida con su error terminal.
    #[instrument(skip(self, error_message))]
    pub async fn mark_failed(&self, job_id: Uuid, error_message: &str) -> Result<(), CatalogError> {
        self.seal_terminal(job_id, sql_registry::MARK_FAILED, Some(error_message), JobState::Failed)
            .await
    }

    /// Sella la cancelación cooperativa observada.
    #[instrument(skip(self))]
    pub async fn mark_cancelled(&self, job_id: Uuid) -> Result<(), CatalogError> {
        self.seal_terminal(job_id, sql_registry::MARK_CANCELLED, None, JobState::Cancelled).await
    }

    /// Motor interno de sellado terminal con difusión post-commit.
    async fn seal_terminal(
        &self,
        job_id: Uuid,
        sql_statement: &str,
        error_message: Option<&str>,
        target_state: JobState,
    ) -> Result<(), CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let now = Utc::now().to_rfc3339();

        let rows_affected = match error_message {
            Some(message) => {
                connection
                    .execute(sql_statement, params![job_id.to_string(), message, now])
                    .await?
            }
            None => connection.execute(sql_statement, params![job_id.to_string(), now]).await?,
        };

        if rows_affected == 0 {
            return Err(CatalogError::ConflictingState {
                entity: format!("job {}", job_id),
                expected: "RUNNING".into(),
                observed: self.observed_state(job_id).await?,
            });
        }

        let sealed = self.get(job_id).await?;
        self.change_feed.publish(ControlPlaneEvent::JobStateChanged {
            job_id,
            kind: sealed.payload.kind(),
            state: target_state,
            progress: sealed.progress,
        });
        Ok(())
    }

    /**
     * Barrido del Reaper: devuelve a cola los arrendamientos vencidos con
     * reintentos disponibles y sella FAILED los agotados.
     * Retorna (reencolados, fallados).
     */
    #[instrument(skip(self))]
    pub async fn sweep_stale_leases(
        &self,
        lease_ttl_minutes: i64,
    ) -> Result<(u64, u64), CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let expiration_threshold = (Utc::now() - Duration::minutes(lease_ttl_minutes)).to_rfc3339();

        let exhausted_count = connection
            .execute(
                sql_registry::FAIL_EXHAUSTED_LEASES,
                params![
                    expiration_threshold.clone(),
                    Utc::now().to_rfc3339(),
                    MAX_LEASE_RETRIES as i64,
                ],
            )
            .await?;

        let requeued_count = connection
            .execute(
                sql_registry::RESET_STALE_LEASES,
                params![expiration_threshold, MAX_LEASE_RETRIES as i64],
            )
            .await?;

        if requeued_count > 0 || exhausted_count > 0 {
            warn!(
                "💀 [REAPER]: Swept stale leases. Requeued {}, failed {}.",
                requeued_count, exhausted_count
            );
        }
        Ok((requeued_count, exhausted_count))
    }

    /// Recupera una orden por identificador.
    pub async fn get(&self, job_id: Uuid) -> Result<JobRecord, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query(
                &format!("{} WHERE id = ?1", sql_registry::JOB_PROJECTION),
                params![job_id.to_string()],
            )
            .await?;
        let data_row = query_results
            .next()
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("job {}", job_id)))?;
        map_row_to_job(&data_row)
    }

    /// Lista órdenes por estado con paginación simple.
    pub async fn list(
        &self,
        state_filter: Option<JobState>,
        limit: u32,
    ) -> Result<Vec<JobRecord>, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = match state_filter {
            Some(state) => {
                connection
                    .query(
                        &format!(
                            "{} WHERE state = ?1 ORDER BY created_at DESC LIMIT ?2",
                            sql_registry::JOB_PROJECTION
                        ),
                        params![state.canonical_tag(), limit as i64],
                    )
                    .await?
            }
            None => {
                connection
                    .query(
                        &format!(
                            "{} ORDER BY created_at DESC LIMIT ?1",
                            sql_registry::JOB_PROJECTION
                        ),
                        params![limit as i64],
                    )
                    .await?
            }
        };

        let mut jobs = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            jobs.push(map_row_to_job(&data_row)?);
        }
        Ok(jobs)
    }

    /// Profundidad corriente de la cola para una clase.
    pub async fn queue_depth_of_kind(&self, kind: JobKind) -> Result<u64, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query(sql_registry::QUEUE_DEPTH_OF_KIND, params![kind.canonical_tag()])
            .await?;
        match query_results.next().await? {
            Some(row) => Ok(row.get::<i64>(0)? as u64),
            None => Ok(0),
        }
    }

    /// Estado observado para mensajes de conflicto.
    async fn observed_state(&self, job_id: Uuid) -> Result<String, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query("SELECT state FROM jobs WHERE id = ?1", params![job_id.to_string()])
            .await?;
        match query_results.next().await? {
            Some(row) => Ok(row.get::<String>(0)?),
            None => Err(CatalogError::NotFound(format!("job {}", job_id))),
        }
    }
}

/// Parsea la etiqueta de estado de orden.
fn parse_state(raw: &str) -> Result<JobState, CatalogError> {
    match raw {
        "QUEUED" => Ok(JobState::Queued),
        "RUNNING" => Ok(JobState::Running),
        "COMPLETED" => Ok(JobState::Completed),
        "FAILED" => Ok(JobState::Failed),
        "CANCELLED" => Ok(JobState::Cancelled),
        other => Err(CatalogError::MappingError(format!("unknown job state '{}'", other))),
    }
}

/// Transforma una fila de persistencia en la entidad de dominio.
fn map_row_to_job(data_row: &Row) -> Result<JobRecord, CatalogError> {
    Ok(JobRecord {
        id: parse_identifier(&data_row.get::<String>(0)?)?,
        payload: parse_json_column(&data_row.get::<String>(2)?, "payload_json")?,
        state: parse_state(&data_row.get::<String>(3)?)?,
        progress: data_row.get(4)?,
        stage_tag: data_row.get(5)?,
        idempotency_key: data_row.get(6)?,
        retry_count: data_row.get::<i64>(7)? as u32,
        error_message: data_row.get(8)?,
        created_at: parse_timestamp(&data_row.get::<String>(9)?)?,
        started_at: data_row
            .get::<Option<String>>(10)?
            .map(|raw| parse_timestamp(&raw))
            .transpose()?,
        completed_at: data_row
            .get::<Option<String>>(11)?
            .map(|raw| parse_timestamp(&raw))
            .transpose()?,
    })
}
