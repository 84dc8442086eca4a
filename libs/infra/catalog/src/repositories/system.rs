// [libs/infra/catalog/src/repositories/system.rs]
/*!
 * =================================================================
 * APARATO: SYSTEM STATE REPOSITORY (V41.0 - OPERATIONAL FLAGS)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: FLAGS OPERATIVOS Y RASTRO DE AUDITORÍA APPEND-ONLY
 * =================================================================
 */

use crate::client::CatalogClient;
use crate::errors::CatalogError;
use crate::repositories::optional_text;
use chrono::Utc;
use libsql::params;
use tracing::instrument;
use uuid::Uuid;

/// Flag operativo: habilitación del reentrenamiento automático.
pub const FLAG_AUTO_RETRAIN_ENABLED: &str = "auto_retrain_enabled";

/// Repositorio de flags de sistema y auditoría.
pub struct SystemRepository {
    catalog_client: CatalogClient,
}

impl SystemRepository {
    /// Inicializa una nueva instancia del repositorio.
    pub fn new(catalog_client: CatalogClient) -> Self {
        Self { catalog_client }
    }

    /// Define un flag booleano de sistema.
    #[instrument(skip(self))]
    pub async fn set_flag(&self, flag_key: &str, enabled: bool) -> Result<(), CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        connection
            .execute(
                "INSERT INTO system_state (key, value_int, updated_at) VALUES (?1, ?2, ?3) \
                 ON CONFLICT(key) DO UPDATE SET value_int = ?2, updated_at = ?3",
                params![flag_key, enabled as i64, Utc::now().to_rfc3339()],
            )
            .await?;
        Ok(())
    }

    /// Lee un flag booleano (default ante ausencia).
    pub async fn flag(&self, flag_key: &str, default_value: bool) -> Result<bool, CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        let mut query_results = connection
            .query("SELECT value_int FROM system_state WHERE key = ?1", params![flag_key])
            .await?;
        match query_results.next().await? {
            Some(row) => Ok(row.get::<Option<i64>>(0)?.map(|value| value != 0).unwrap_or(default_value)),
            None => Ok(default_value),
        }
    }

    /// Registra un evento de auditoría append-only.
    #[instrument(skip(self, details))]
    pub async fn append_audit_event(
        &self,
        actor: &str,
        action: &str,
        subject_reference: &str,
        details: Option<&str>,
    ) -> Result<(), CatalogError> {
        let connection = self.catalog_client.get_connection()?;
        connection
            .execute(
                "INSERT INTO audit_events (id, actor, action, subject_reference, details, recorded_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    Uuid::new_v4().to_string(),
                    actor,
                    action,
                    subject_reference,
                    optional_text(details),
                    Utc::now().to_rfc3339(),
                ],
            )
            .await?;
        Ok(())
    }
}
