// [libs/infra/catalog/src/repositories/retrain.rs]
/*!
 * =================================================================
 * APARATO: RETRAIN REPOSITORY (V41.0 - GUARDED MACHINE)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DE LA MÁQUINA DE REENTRENAMIENTO
 *
 * # Mathematical Proof (Guarded Progression):
 * Toda transición es un CAS sobre (id, state). El driver de C10 avanza
 * la máquina estado por estado; una transición concurrente perdida se
 * reporta como ConflictingState y el driver re-lee la fila.
 * =================================================================
 */

use crate::client::CatalogClient;
use crate::errors::CatalogError;
use crate::repositories::{optional_text, parse_identifier, parse_json_column, parse_timestamp, to_json_column};
use aegis_domain_models::{MergeStrategy, RetrainJob, RetrainReason, RetrainState};
use chrono::Utc;
use libsql::{params, Row};
use tracing::{info, instrument};
use uuid::Uuid;

/// Repositorio de autoridad única para órdenes de reentrenamiento.
pub struct RetrainRepository {
    catalog_client: CatalogClient,
}

const RETRAIN_PROJECTION: &str =
    "SELECT id, base_model_id, reason, merge_strategy_json, state, candidate_feature_set_id, \
     candidate_model_id, auto_promote, min_improvement, rejection_reason, error_message, \
     created_at, updated_at FROM retrain_jobs";

impl RetrainRepository {
    /// Inicializa una nueva instancia del repositorio.
    pub fn new(catalog_client: CatalogClient) -> Self {
        Self { catalog_client }
    }

    /// Registra una orden nueva en PENDING.
    #[instrument(skip(self, merge_strategy))]
    pub async fn create(
        &self,
        base_model_id: Uuid,
        reason: RetrainReason,
        merge_strategy: &MergeStrategy,
        auto_promote: bool,
        min_improvement: f64,
    ) -> Result<RetrainJob, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let now = Utc::now();
        let retrain_job = RetrainJob {
            id: Uuid::new_v4(),
            base_model_id,
            reason,
            merge_strategy: merge_strategy.clone(),
            state: RetrainState::Pending,
            candidate_feature_set_id: None,
            candidate_model_id: None,
            auto_promote,
            min_improvement,
            rejection_reason: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        };

        connection
            .execute(
                r#"
                INSERT INTO retrain_jobs (
                    id, base_model_id, reason, merge_strategy_json, state,
                    auto_promote, min_improvement, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, 'PENDING', ?5, ?6, ?7, ?7)
                "#,
                params![
                    retrain_job.id.to_string(),
                    base_model_id.to_string(),
                    reason_tag(reason),
                    to_json_column(merge_strategy, "merge_strategy_json")?,
                    auto_promote as i64,
                    min_improvement,
                    now.to_rfc3339(),
                ],
            )
            .await?;

        info!("🔄 [RETRAIN_LEDGER]: Order {} created for base model {}.", retrain_job.id, base_model_id);
        Ok(retrain_job)
    }

    /**
     * Avanza la máquina mediante CAS (from_state -> to_state) sellando los
     * campos producidos por la etapa.
     */
    #[instrument(skip(self))]
    pub async fn cas_transition(
        &self,
        retrain_job_id: Uuid,
        from_state: RetrainState,
        to_state: RetrainState,
        candidate_feature_set_id: Option<Uuid>,
        candidate_model_id: Option<Uuid>,
        rejection_reason: Option<&str>,
        error_message: Option<&str>,
    ) -> Result<(), CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let rows_affected = connection
            .execute(
                r#"
                UPDATE retrain_jobs SET
                    state = ?3,
                    candidate_feature_set_id = COALESCE(?4, candidate_feature_set_id),
                    candidate_model_id = COALESCE(?5, candidate_model_id),
                    rejection_reason = COALESCE(?6, rejection_reason),
                    error_message = COALESCE(?7, error_message),
                    updated_at = ?8
                WHERE id = ?1 AND state = ?2
                "#,
                params![
                    retrain_job_id.to_string(),
                    from_state.canonical_tag(),
                    to_state.canonical_tag(),
                    optional_text(candidate_feature_set_id.map(|identifier| identifier.to_string())),
                    optional_text(candidate_model_id.map(|identifier| identifier.to_string())),
                    optional_text(rejection_reason),
                    optional_text(error_message),
                    Utc::now().to_rfc3339(),
                ],
            )
            .await?;

        if rows_affected == 0 {
            return Err(CatalogError::ConflictingState {
                entity: format!("retrain_job {}", retrain_job_id),
                expected: from_state.canonical_tag().to_string(),
                observed: self.observed_state(retrain_job_id).await?,
            });
        }
        Ok(())
    }

    /// Recupera una orden por identificador.
    pub async fn get(&self, retrain_job_id: Uuid) -> Result<RetrainJob, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query(
                &format!("{} WHERE id = ?1", RETRAIN_PROJECTION),
                params![retrain_job_id.to_string()],
            )
            .await?;
        let data_row = query_results
            .next()
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("retrain_job {}", retrain_job_id)))?;
        map_row_to_retrain(&data_row)
    }

    /// Lista órdenes no terminales (insumo del driver C10).
    pub async fn list_live(&self) -> Result<Vec<RetrainJob>, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query(
                &format!(
                    "{} WHERE state NOT IN ('PROMOTED', 'REJECTED', 'FAILED') \
                     ORDER BY created_at ASC",
                    RETRAIN_PROJECTION
                ),
                (),
            )
            .await?;

        let mut orders = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            orders.push(map_row_to_retrain(&data_row)?);
        }
        Ok(orders)
    }

    /// Lista completa con paginación simple.
    pub async fn list(&self, limit: u32) -> Result<Vec<RetrainJob>, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query(
                &format!("{} ORDER BY created_at DESC LIMIT ?1", RETRAIN_PROJECTION),
                params![limit as i64],
            )
            .await?;

        let mut orders = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            orders.push(map_row_to_retrain(&data_row)?);
        }
        Ok(orders)
    }

    /// Estado observado para mensajes de conflicto.
    async fn observed_state(&self, retrain_job_id: Uuid) -> Result<String, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query(
                "SELECT state FROM retrain_jobs WHERE id = ?1",
                params![retrain_job_id.to_string()],
            )
            .await?;
        match query_results.next().await? {
            Some(row) => Ok(row.get::<String>(0)?),
            None => Err(CatalogError::NotFound(format!("retrain_job {}", retrain_job_id))),
        }
    }
}

/// Etiqueta canónica de la causa de reentrenamiento.
fn reason_tag(reason: RetrainReason) -> &'static str {
    match reason {
        RetrainReason::DataDrift => "DATA_DRIFT",
        RetrainReason::ConceptDrift => "CONCEPT_DRIFT",
        RetrainReason::BiasDetected => "BIAS_DETECTED",
        RetrainReason::Scheduled => "SCHEDULED",
        RetrainReason::Manual => "MANUAL",
    }
}

/// Parsea la etiqueta de causa.
fn parse_reason(raw: &str) -> Result<RetrainReason, CatalogError> {
    match raw {
        "DATA_DRIFT" => Ok(RetrainReason::DataDrift),
        "CONCEPT_DRIFT" => Ok(RetrainReason::ConceptDrift),
        "BIAS_DETECTED" => Ok(RetrainReason::BiasDetected),
        "SCHEDULED" => Ok(RetrainReason::Scheduled),
        "MANUAL" => Ok(RetrainReason::Manual),
        other => Err(CatalogError::MappingError(format!("unknown retrain reason '{}'", other))),
    }
}

/// Parsea la etiqueta de estado de la máquina.
fn parse_state(raw: &str) -> Result<RetrainState, CatalogError> {
    match raw {
        "PENDING" => Ok(RetrainState::Pending),
        "DATA_PREPARATION" => Ok(RetrainState::DataPreparation),
        "TRAINING" => Ok(RetrainState::Training),
        "VALIDATION" => Ok(RetrainState::Validation),
        "COMPARISON" => Ok(RetrainState::Comparison),
        "PROMOTED" => Ok(RetrainState::Promoted),
        "REJECTED" => Ok(RetrainState::Rejected),
        "FAILED" => Ok(RetrainState::Failed),
        other => Err(CatalogError::MappingError(format!("unknown retrain state '{}'", other))),
    }
}

/// Transforma una fila de persistencia en la entidad de dominio.
fn map_row_to_retrain(data_row: &Row) -> Result<RetrainJob, CatalogError> {
    Ok(RetrainJob {
        id: parse_identifier(&data_row.get::<String>(0)?)?,
        base_model_id: parse_identifier(&data_row.get::<String>(1)?)?,
        reason: parse_reason(&data_row.get::<String>(2)?)?,
        merge_strategy: parse_json_column(&data_row.get::<String>(3)?, "merge_strategy_json")?,
        state: parse_state(&data_row.get::<String>(4)?)?,
        candidate_feature_set_id: data_row
            .get::<Option<String>>(5)?
            .map(|raw| parse_identifier(&raw))
            .transpose()?,
        candidate_model_id: data_row
            .get::<Option<String>>(6)?
            .map(|raw| parse_identifier(&raw))
            .transpose()?,
        auto_promote: data_row.get::<i64>(7)? != 0,
        min_improvement: data_row.get(8)?,
        rejection_reason: data_row.get(9)?,
        error_message: data_row.get(10)?,
        created_at: parse_timestamp(&data_row.get::<String>(11)?)?,
        updated_at: parse_timestamp(&data_row.get::<String>(12)?)?,
    })
}
