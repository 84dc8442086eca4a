// [libs/infra/catalog/src/repositories/dataset.rs]
/*!
 * =================================================================
 * APARATO: DATASET REPOSITORY (V41.0 - IMMUTABLE LINEAGE)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DEL LINAJE DE DATASETS VERSIONADOS
 *
 * # Mathematical Proof (Immutability Guard):
 * Toda mutación de estado es un CAS sobre (id, status). Un dataset en
 * ACTIVE solo admite la transición a ARCHIVED; el contenido y el esquema
 * jamás se actualizan tras la activación.
 * =================================================================
 */

use crate::client::CatalogClient;
use crate::errors::CatalogError;
use crate::repositories::{optional_text, parse_identifier, parse_json_column, parse_timestamp, to_json_column};
use aegis_domain_models::{ColumnSpec, Dataset, DatasetStatus};
use chrono::Utc;
use libsql::{params, Row};
use tracing::{info, instrument};
use uuid::Uuid;

/// Repositorio de autoridad única para el linaje de datasets.
pub struct DatasetRepository {
    catalog_client: CatalogClient,
}

impl DatasetRepository {
    /// Inicializa una nueva instancia del repositorio.
    pub fn new(catalog_client: CatalogClient) -> Self {
        Self { catalog_client }
    }

    /**
     * Registra un dataset nuevo en estado PROCESSING.
     *
     * # Errors:
     * - `Validation` ante esquema vacío.
     * - `QueryError` si (name, version) colisiona con un linaje sellado.
     */
    #[instrument(skip(self, schema))]
    pub async fn create(
        &self,
        name: &str,
        version: u32,
        parent_dataset_id: Option<Uuid>,
        row_count: u64,
        schema: &[ColumnSpec],
        content_checksum: &str,
        blob_reference: &str,
    ) -> Result<Dataset, CatalogError> {
        if schema.is_empty() {
            return Err(CatalogError::Validation("dataset schema cannot be empty".into()));
        }
        if name.trim().is_empty() {
            return Err(CatalogError::Validation("dataset name cannot be empty".into()));
        }

        let connection = self.catalog_client.get_connection()?;
        let dataset = Dataset {
            id: Uuid::new_v4(),
            name: name.to_string(),
            version,
            parent_dataset_id,
            row_count,
            column_count: schema.len() as u32,
            schema: schema.to_vec(),
            content_checksum: content_checksum.to_string(),
            blob_reference: blob_reference.to_string(),
            status: DatasetStatus::Processing,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        connection
            .execute(
                r#"
                INSERT INTO datasets (
                    id, name, version, parent_dataset_id, row_count, column_count,
                    schema_json, content_checksum, blob_reference, status,
                    created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'PROCESSING', ?10, ?10)
                "#,
                params![
                    dataset.id.to_string(),
                    dataset.name.clone(),
                    dataset.version as i64,
                    optional_text(dataset.parent_dataset_id.map(|identifier| identifier.to_string())),
                    dataset.row_count as i64,
                    dataset.column_count as i64,
                    to_json_column(&dataset.schema, "schema_json")?,
                    dataset.content_checksum.clone(),
                    dataset.blob_reference.clone(),
                    dataset.created_at.to_rfc3339(),
                ],
            )
            .await?;

        info!("🗂️  [DATASET]: Lineage {}@v{} registered as PROCESSING.", name, version);
        Ok(dataset)
    }

    /// Sella el dataset como ACTIVE (CAS desde PROCESSING).
    #[instrument(skip(self))]
    pub async fn activate(&self, dataset_id: Uuid) -> Result<(), CatalogError> {
        self.cas_status(dataset_id, DatasetStatus::Processing, DatasetStatus::Active).await
    }

    /// Retira el dataset (CAS desde ACTIVE).
    #[instrument(skip(self))]
    pub async fn archive(&self, dataset_id: Uuid) -> Result<(), CatalogError> {
        self.cas_status(dataset_id, DatasetStatus::Active, DatasetStatus::Archived).await
    }

    /// Transición compare-and-set del estado del dataset.
    async fn cas_status(
        &self,
        dataset_id: Uuid,
        from_status: DatasetStatus,
        to_status: DatasetStatus,
    ) -> Result<(), CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let rows_affected = connection
            .execute(
                "UPDATE datasets SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2",
                params![
                    dataset_id.to_string(),
                    status_tag(from_status),
                    status_tag(to_status),
                    Utc::now().to_rfc3339(),
                ],
            )
            .await?;

        if rows_affected == 0 {
            let observed = self.observed_status(&connection, dataset_id).await?;
            return Err(CatalogError::ConflictingState {
                entity: format!("dataset {}", dataset_id),
                expected: status_tag(from_status).to_string(),
                observed,
            });
        }
        Ok(())
    }

    /// Recupera un dataset por identificador.
    pub async fn get(&self, dataset_id: Uuid) -> Result<Dataset, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query(
                "SELECT id, name, version, parent_dataset_id, row_count, column_count, \
                 schema_json, content_checksum, blob_reference, status, created_at, updated_at \
                 FROM datasets WHERE id = ?1",
                params![dataset_id.to_string()],
            )
            .await?;

        let data_row = query_results
            .next()
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("dataset {}", dataset_id)))?;
        map_row_to_dataset(&data_row)
    }

    /// Lista datasets por estado con paginación simple.
    pub async fn list(
        &self,
        status_filter: Option<DatasetStatus>,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<Dataset>, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = match status_filter {
            Some(status) => {
                connection
                    .query(
                        "SELECT id, name, version, parent_dataset_id, row_count, column_count, \
                         schema_json, content_checksum, blob_reference, status, created_at, updated_at \
                         FROM datasets WHERE status = ?1 ORDER BY created_at DESC LIMIT ?2 OFFSET ?3",
                        params![status_tag(status), limit as i64, offset as i64],
                    )
                    .await?
            }
            None => {
                connection
                    .query(
                        "SELECT id, name, version, parent_dataset_id, row_count, column_count, \
                         schema_json, content_checksum, blob_reference, status, created_at, updated_at \
                         FROM datasets ORDER BY created_at DESC LIMIT ?1 OFFSET ?2",
                        params![limit as i64, offset as i64],
                    )
                    .await?
            }
        };

        let mut datasets = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            datasets.push(map_row_to_dataset(&data_row)?);
        }
        Ok(datasets)
    }

    /// Versión máxima registrada para un nombre de linaje.
    pub async fn latest_version(&self, name: &str) -> Result<Option<u32>, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query("SELECT MAX(version) FROM datasets WHERE name = ?1", params![name])
            .await?;
        match query_results.next().await? {
            Some(row) => Ok(row.get::<Option<i64>>(0)?.map(|version| version as u32)),
            None => Ok(None),
        }
    }

    /// Estado observado para mensajes de conflicto.
    async fn observed_status(
        &self,
        connection: &libsql::Connection,
        dataset_id: Uuid,
    ) -> Result<String, CatalogError> {
        let mut query_results = connection
            .query("SELECT status FROM datasets WHERE id = ?1", params![dataset_id.to_string()])
            .await?;
        match query_results.next().await? {
            Some(row) => Ok(row.get::<String>(0)?),
            None => Err(CatalogError::NotFound(format!("dataset {}", dataset_id))),
        }
    }
}

/// Etiqueta canónica del estado de dataset.
fn status_tag(status: DatasetStatus) -> &'static str {
    match status {
        DatasetStatus::Processing => "PROCESSING",
        DatasetStatus::Active => "ACTIVE",
        DatasetStatus::Archived => "ARCHIVED",
    }
}

/// Parsea la etiqueta canónica hacia el estado de dominio.
fn parse_status(raw: &str) -> Result<DatasetStatus, CatalogError> {
    match raw {
        "PROCESSING" => Ok(DatasetStatus::Processing),
        "ACTIVE" => Ok(DatasetStatus::Active),
        "ARCHIVED" => Ok(DatasetStatus::Archived),
        other => Err(CatalogError::MappingError(format!("unknown dataset status '{}'", other))),
    }
}

/// Transforma una fila de persistencia en la entidad de dominio.
fn map_row_to_dataset(data_row: &Row) -> Result<Dataset, CatalogError> {
    Ok(Dataset {
        id: parse_identifier(&data_row.get::<String>(0)?)?,
        name: data_row.get(1)?,
        version: data_row.get::<i64>(2)? as u32,
        parent_dataset_id: data_row
            .get::<Option<String>>(3)?
            .map(|raw| parse_identifier(&raw))
            .transpose()?,
        row_count: data_row.get::<i64>(4)? as u64,
        column_count: data_row.get::<i64>(5)? as u32,
        schema: parse_json_column(&data_row.get::<String>(6)?, "schema_json")?,
        content_checksum: data_row.get(7)?,
        blob_reference: data_row.get(8)?,
        status: parse_status(&data_row.get::<String>(9)?)?,
        created_at: parse_timestamp(&data_row.get::<String>(10)?)?,
        updated_at: parse_timestamp(&data_row.get::<String>(11)?)?,
    })
}
