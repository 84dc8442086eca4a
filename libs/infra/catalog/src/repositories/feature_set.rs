// [libs/infra/catalog/src/repositories/feature_set.rs]
/*!
 * =================================================================
 * APARATO: FEATURE SET REPOSITORY (V41.1 - CONTRACT GUARD)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA DEL CONTRATO DE EXTRACCIÓN DE FEATURES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. NO PARTIAL OUTPUT: La finalización sella atómicamente esquema,
 *    puntajes y referencia de matriz; la falla registra el error sin
 *    publicar salida parcial.
 * 2. REFERENCE SHIELD: El borrado está vetado mientras algún modelo
 *    referencie el FeatureSet (guardia de conteo en transacción).
 * =================================================================
 */

use crate::client::CatalogClient;
use crate::errors::CatalogError;
use crate::repositories::{optional_text, parse_identifier, parse_json_column, parse_timestamp, to_json_column};
use aegis_domain_models::{FeatureConfig, FeatureSet, FeatureSetStatus, SelectedFeature};
use chrono::Utc;
use libsql::{params, Row};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Repositorio de autoridad única para FeatureSets.
pub struct FeatureSetRepository {
    catalog_client: CatalogClient,
}

impl FeatureSetRepository {
    /// Inicializa una nueva instancia del repositorio.
    pub fn new(catalog_client: CatalogClient) -> Self {
        Self { catalog_client }
    }

    /// Registra un FeatureSet en estado PENDING para un dataset sellado.
    #[instrument(skip(self, config))]
    pub async fn create_pending(
        &self,
        dataset_id: Uuid,
        config: &FeatureConfig,
    ) -> Result<FeatureSet, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let feature_set = FeatureSet {
            id: Uuid::new_v4(),
            dataset_id,
            config: config.clone(),
            status: FeatureSetStatus::Pending,
            generated_feature_names: Vec::new(),
            selected_features: Vec::new(),
            schema_hash: String::new(),
            matrix_artifact_reference: None,
            error_message: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        connection
            .execute(
                r#"
                INSERT INTO feature_sets (
                    id, dataset_id, config_json, status, created_at, updated_at
                ) VALUES (?1, ?2, ?3, 'PENDING', ?4, ?4)
                "#,
                params![
                    feature_set.id.to_string(),
                    dataset_id.to_string(),
                    to_json_column(config, "config_json")?,
                    feature_set.created_at.to_rfc3339(),
                ],
            )
            .await?;

        Ok(feature_set)
    }

    /// Marca el inicio del pipeline (CAS PENDING -> RUNNING).
    #[instrument(skip(self))]
    pub async fn mark_running(&self, feature_set_id: Uuid) -> Result<(), CatalogError> {
        self.cas_status(feature_set_id, FeatureSetStatus::Pending, FeatureSetStatus::Running, None)
            .await
    }

    /**
     * Sella la finalización exitosa con el contrato completo.
     * Transición CAS RUNNING -> COMPLETED en una sola sentencia.
     */
    #[instrument(skip(self, generated_names, selected_features))]
    pub async fn complete(
        &self,
        feature_set_id: Uuid,
        generated_names: &[String],
        selected_features: &[SelectedFeature],
        schema_hash: &str,
        matrix_artifact_reference: &str,
    ) -> Result<(), CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let rows_affected = connection
            .execute(
                r#"
                UPDATE feature_sets SET
                    status = 'COMPLETED',
                    generated_names_json = ?2,
                    selected_features_json = ?3,
                    schema_hash = ?4,
                    matrix_artifact_reference = ?5,
                    updated_at = ?6
                WHERE id = ?1 AND status = 'RUNNING'
                "#,
                params![
                    feature_set_id.to_string(),
                    to_json_column(&generated_names, "generated_names_json")?,
                    to_json_column(&selected_features, "selected_features_json")?,
                    schema_hash,
                    matrix_artifact_reference,
                    Utc::now().to_rfc3339(),
                ],
            )
            .await?;

        if rows_affected == 0 {
            return Err(CatalogError::ConflictingState {
                entity: format!("feature_set {}", feature_set_id),
                expected: "RUNNING".into(),
                observed: self.observed_status(feature_set_id).await?,
            });
        }

        info!("🧬 [FEATURE_SET]: Contract {} sealed with hash {}.", feature_set_id, schema_hash);
        Ok(())
    }

    /// Registra la falla terminal del pipeline sin salida parcial.
    #[instrument(skip(self))]
    pub async fn fail(&self, feature_set_id: Uuid, error_message: &str) -> Result<(), CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let rows_affected = connection
            .execute(
                "UPDATE feature_sets SET status = 'FAILED', error_message = ?2, updated_at = ?3 \
                 WHERE id = ?1 AND status IN ('PENDING', 'RUNNING')",
                params![feature_set_id.to_string(), error_message, Utc::now().to_rfc3339()],
            )
            .await?;
        if rows_affected == 0 {
            warn!("⚠️ [FEATURE_SET]: Failure seal rejected for {} (terminal state).", feature_set_id);
        }
        Ok(())
    }

    /// Recupera un FeatureSet por identificador.
    pub async fn get(&self, feature_set_id: Uuid) -> Result<FeatureSet, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query(
                "SELECT id, dataset_id, config_json, status, generated_names_json, \
                 selected_features_json, schema_hash, matrix_artifact_reference, error_message, \
                 created_at, updated_at FROM feature_sets WHERE id = ?1",
                params![feature_set_id.to_string()],
            )
            .await?;

        let data_row = query_results
            .next()
            .await?
            .ok_or_else(|| CatalogError::NotFound(format!("feature_set {}", feature_set_id)))?;
        map_row_to_feature_set(&data_row)
    }

    /// Lista los FeatureSets de un dataset propietario.
    pub async fn list_by_dataset(&self, dataset_id: Uuid) -> Result<Vec<FeatureSet>, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query(
                "SELECT id, dataset_id, config_json, status, generated_names_json, \
                 selected_features_json, schema_hash, matrix_artifact_reference, error_message, \
                 created_at, updated_at FROM feature_sets WHERE dataset_id = ?1 \
                 ORDER BY created_at DESC",
                params![dataset_id.to_string()],
            )
            .await?;

        let mut feature_sets = Vec::new();
        while let Some(data_row) = query_results.next().await? {
            feature_sets.push(map_row_to_feature_set(&data_row)?);
        }
        Ok(feature_sets)
    }

    /**
     * Elimina un FeatureSet si y solo si ningún modelo lo referencia.
     *
     * # Errors:
     * `ConflictingState` mientras exista al menos una referencia fuerte.
     */
    #[instrument(skip(self))]
    pub async fn delete_guarded(&self, feature_set_id: Uuid) -> Result<(), CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let transaction = connection
            .transaction()
            .await
            .map_err(|_| CatalogError::TransactionError)?;

        let mut reference_results = transaction
            .query(
                "SELECT COUNT(*) FROM models WHERE feature_set_id = ?1",
                params![feature_set_id.to_string()],
            )
            .await?;
        let reference_count: i64 = reference_results
            .next()
            .await?
            .map(|row| row.get(0))
            .transpose()?
            .unwrap_or(0);

        if reference_count > 0 {
            return Err(CatalogError::ConflictingState {
                entity: format!("feature_set {}", feature_set_id),
                expected: "unreferenced".into(),
                observed: format!("{} model references", reference_count),
            });
        }

        transaction
            .execute("DELETE FROM feature_sets WHERE id = ?1", params![feature_set_id.to_string()])
            .await?;
        transaction.commit().await.map_err(|_| CatalogError::TransactionError)?;
        Ok(())
    }

    /// Borrado en cascada al retirar el dataset propietario.
    pub async fn delete_cascade_of_dataset(&self, dataset_id: Uuid) -> Result<u64, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        Ok(connection
            .execute(
                "DELETE FROM feature_sets WHERE dataset_id = ?1 AND id NOT IN \
                 (SELECT feature_set_id FROM models)",
                params![dataset_id.to_string()],
            )
            .await?)
    }

    /// Transición compare-and-set del estado.
    async fn cas_status(
        &self,
        feature_set_id: Uuid,
        from_status: FeatureSetStatus,
        to_status: FeatureSetStatus,
        error_message: Option<&str>,
    ) -> Result<(), CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let rows_affected = connection
            .execute(
                "UPDATE feature_sets SET status = ?3, error_message = ?4, updated_at = ?5 \
                 WHERE id = ?1 AND status = ?2",
                params![
                    feature_set_id.to_string(),
                    status_tag(from_status),
                    status_tag(to_status),
                    optional_text(error_message),
                    Utc::now().to_rfc3339(),
                ],
            )
            .await?;

        if rows_affected == 0 {
            return Err(CatalogError::ConflictingState {
                entity: format!("feature_set {}", feature_set_id),
                expected: status_tag(from_status).to_string(),
                observed: self.observed_status(feature_set_id).await?,
            });
        }
        Ok(())
    }

    /// Estado observado para mensajes de conflicto.
    async fn observed_status(&self, feature_set_id: Uuid) -> Result<String, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query(
                "SELECT status FROM feature_sets WHERE id = ?1",
                params![feature_set_id.to_string()],
            )
            .await?;
        match query_results.next().await? {
            Some(row) => Ok(row.get::<String>(0)?),
            None => Err(CatalogError::NotFound(format!("feature_set {}", feature_set_id))),
        }
    }
}

/// Etiqueta canónica del estado de FeatureSet.
fn status_tag(status: FeatureSetStatus) -> &'static str {
    match status {
        FeatureSetStatus::Pending => "PENDING",
        FeatureSetStatus::Running => "RUNNING",
        FeatureSetStatus::Completed => "COMPLETED",
        FeatureSetStatus::Failed => "FAILED",
    }
}

/// Parsea la etiqueta canónica hacia el estado de dominio.
fn parse_status(raw: &str) -> Result<FeatureSetStatus, CatalogError> {
    match raw {
        "PENDING" => Ok(FeatureSetStatus::Pending),
        "RUNNING" => Ok(FeatureSetStatus::Running),
        "COMPLETED" => Ok(FeatureSetStatus::Completed),
        "FAILED" => Ok(FeatureSetStatus::Failed),
        other => Err(CatalogError::MappingError(format!("unknown feature_set status '{}'", other))),
    }
}

/// Transforma una fila de persistencia en la entidad de dominio.
fn map_row_to_feature_set(data_row: &Row) -> Result<FeatureSet, CatalogError> {
    Ok(FeatureSet {
        id: parse_identifier(&data_row.get::<String>(0)?)?,
        dataset_id: parse_identifier(&data_row.get::<String>(1)?)?,
        config: parse_json_column(&data_row.get::<String>(2)?, "config_json")?,
        status: parse_status(&data_row.get::<String>(3)?)?,
        generated_feature_names: parse_json_column(
            &data_row.get::<String>(4)?,
            "generated_names_json",
        )?,
        selected_features: parse_json_column(
            &data_row.get::<String>(5)?,
            "selected_features_json",
        )?,
        schema_hash: data_row.get(6)?,
        matrix_artifact_reference: data_row.get(7)?,
        error_message: data_row.get(8)?,
        created_at: parse_timestamp(&data_row.get::<String>(9)?)?,
        updated_at: parse_timestamp(&data_row.get::<String>(10)?)?,
    })
}
