// [libs/infra/catalog/src/client.rs]
/*!
 * =================================================================
 * APARATO: CATALOG CONNECTION CLIENT (V40.2 - MEMORY ANCHORED)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GESTIÓN DE ENLACES TÁCTICOS Y PERSISTENCIA ACID
 *
 * # Mathematical Proof (In-Memory Consistency):
 * Para garantizar que el esquema sea visible entre hilos en modo RAM,
 * el cliente detecta URLs de memoria y aplica el ancla de persistencia
 * ANTES de la ejecución del bootstrap, asegurando que las tablas residan
 * en un segmento de memoria compartido.
 * =================================================================
 */

use crate::errors::CatalogError;
use crate::schema::apply_full_catalog_schema;
use libsql::{Builder, Connection, Database};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Cliente del catálogo de metadatos (fábrica de conexiones).
#[derive(Clone)]
pub struct CatalogClient {
    internal_database_driver: Arc<Database>,
    /// Mantiene la base de datos viva en memoria evitando que SQLite la purgue.
    _memory_persistence_anchor: Option<Arc<Connection>>,
}

impl CatalogClient {
    /**
     * Establece el enlace con el catálogo y sincroniza el esquema.
     *
     * # Errors:
     * `ConnectionError` ante URL vacía, token ausente en modo remoto o
     * colapso de la sincronización estructural.
     */
    #[instrument(skip(database_access_token))]
    pub async fn connect(
        database_connection_url: &str,
        database_access_token: Option<String>,
    ) -> Result<Self, CatalogError> {
        if database_connection_url.is_empty() {
            return Err(CatalogError::ConfigurationError(
                "CRITICAL_FAULT: DATABASE_URL_UNDEFINED".into(),
            ));
        }

        info!("🔌 [CATALOG]: Initiating tactical link synchronization to [{}]", database_connection_url);

        let is_remote = database_connection_url.starts_with("libsql://")
            || database_connection_url.starts_with("https://");

        let is_memory = database_connection_url.contains(":memory:")
            || database_connection_url.contains("mode=memory");

        let database_driver = if is_remote {
            let token = database_access_token.ok_or_else(|| {
                CatalogError::ConfigurationError(
                    "SECURITY_FAULT: Remote access denied (Token missing)".into(),
                )
            })?;
            Builder::new_remote(database_connection_url.to_string(), token).build().await
        } else {
            Builder::new_local(database_connection_url).build().await
        }
        .map_err(|fault| {
            CatalogError::ConnectionError(format!("DRIVER_IGNITION_FAILURE: {}", fault))
        })?;

        let shared_driver = Arc::new(database_driver);
        let mut anchor = None;

        if is_memory {
            // En modo memoria el ancla se abre ANTES que cualquier otra operación.
            let anchor_connection = shared_driver.connect().map_err(|fault| {
                CatalogError::ConnectionError(format!("ANCHOR_FAULT: {}", fault))
            })?;

            apply_full_catalog_schema(&anchor_connection).await.map_err(|fault| {
                CatalogError::ConnectionError(format!("SCHEMA_SYNC_FAULT: {}", fault))
            })?;

            anchor = Some(Arc::new(anchor_connection));
            info!("⚓ [CATALOG]: Memory strata solidified and anchored.");
        } else {
            let bootstrap_connection = shared_driver.connect().map_err(|fault| {
                CatalogError::ConnectionError(format!("BOOTSTRAP_LINK_FAULT: {}", fault))
            })?;
            apply_full_catalog_schema(&bootstrap_connection).await.map_err(|fault| {
                CatalogError::ConnectionError(format!("SCHEMA_SYNC_FAULT: {}", fault))
            })?;
        }

        Ok(Self {
            internal_database_driver: shared_driver,
            _memory_persistence_anchor: anchor,
        })
    }

    /// Asigna una conexión viva del pool del driver.
    pub fn get_connection(&self) -> Result<Connection, CatalogError> {
        self.internal_database_driver.connect().map_err(|fault| {
            error!("⚠️ [POOL_FAULT]: Connection allocation failed: {}", fault);
            CatalogError::ConnectionError(fault.to_string())
        })
    }
}
