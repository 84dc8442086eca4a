// [libs/infra/catalog/src/feed.rs]
/*!
 * =================================================================
 * APARATO: TYPED CHANGE FEED (V40.0 - POST-COMMIT BROADCAST)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: DIFUSIÓN AL-MENOS-UNA-VEZ DE CAMBIOS DE ENTIDAD
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. POST-COMMIT DISCIPLINE: Los repositorios publican ÚNICAMENTE tras
 *    el commit; un evento jamás precede a su fila.
 * 2. ORDERED PER ENTITY: El canal broadcast preserva el orden de emisión;
 *    para un mismo modelo las activaciones llegan en orden de promoción.
 * 3. LOSS TOLERANCE: Sin suscriptores el evento se descarta; los
 *    consumidores idempotentes reconstruyen estado desde el catálogo.
 * =================================================================
 */

use aegis_domain_models::ControlPlaneEvent;
use tokio::sync::broadcast;
use tracing::trace;

/// Capacidad del canal de difusión del feed.
const FEED_CHANNEL_CAPACITY: usize = 4096;

/// Feed de cambios tipado para Model, Alert y Job.
#[derive(Debug, Clone)]
pub struct CatalogFeed {
    internal_transmission_channel: broadcast::Sender<ControlPlaneEvent>,
}

impl CatalogFeed {
    /// Forja un feed con buffer endurecido.
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(FEED_CHANNEL_CAPACITY);
        Self { internal_transmission_channel: sender }
    }

    /// Genera un receptor nuevo para un consumidor idempotente.
    pub fn subscribe(&self) -> broadcast::Receiver<ControlPlaneEvent> {
        self.internal_transmission_channel.subscribe()
    }

    /// Publica un evento post-commit (descarte silencioso sin suscriptores).
    pub fn publish(&self, event: ControlPlaneEvent) {
        match self.internal_transmission_channel.send(event) {
            Ok(subscriber_count) => {
                trace!("📡 [CATALOG_FEED]: Signal broadcasted to {} links.", subscriber_count);
            }
            Err(_) => {
                // Silencio nominal: sin consumidores activos del feed.
                trace!("💤 [CATALOG_FEED]: Signal discarded. No active links.");
            }
        }
    }
}

impl Default for CatalogFeed {
    fn default() -> Self {
        Self::new()
    }
}
