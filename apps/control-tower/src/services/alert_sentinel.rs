// [apps/control-tower/src/services/alert_sentinel.rs]
/*!
 * =================================================================
 * APARATO: ALERT NOTIFICATION SENTINEL (V13.2 - PLUGGABLE SINKS)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: DESPACHO DE NOTIFICACIONES SIN BLOQUEAR PERSISTENCIA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. PERSISTENCE FIRST: La alerta ya está sellada en el catálogo cuando
 *    el sentinel la observa por el feed; un sink caído JAMÁS bloquea ni
 *    revierte la persistencia.
 * 2. PLUGGABLE SINKS: Sink de rastro (siempre activo) + webhook opcional
 *    con timeout endurecido.
 * =================================================================
 */

use crate::state::AppState;
use aegis_domain_models::{AlertSeverity, ControlPlaneEvent};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use tracing::{error, info, warn};

/// Sink de notificación conectable.
#[async_trait::async_trait]
pub trait NotificationSink: Send + Sync {
    /// Despacha una notificación; el fallo se registra y se descarta.
    async fn notify(&self, severity: AlertSeverity, title: &str, dedup_key: &str);
}

/// Sink de rastro estructurado (siempre activo).
pub struct TracingSink;

#[async_trait::async_trait]
impl NotificationSink for TracingSink {
    async fn notify(&self, severity: AlertSeverity, title: &str, dedup_key: &str) {
        match severity {
            AlertSeverity::Critical => {
                error!(target: "alerts", "🚨 [{:?}] {} (key {})", severity, title, dedup_key);
            }
            AlertSeverity::Warning => {
                warn!(target: "alerts", "⚠️ [{:?}] {} (key {})", severity, title, dedup_key);
            }
            AlertSeverity::Info => {
                info!(target: "alerts", "ℹ️ [{:?}] {} (key {})", severity, title, dedup_key);
            }
        }
    }
}

/// Sink webhook con cliente endurecido.
pub struct WebhookSink {
    network_client: Client,
    webhook_url: String,
}

impl WebhookSink {
    /// Forja el sink con timeout estratégico.
    pub fn new(webhook_url: String) -> Option<Self> {
        let network_client = Client::builder()
            .timeout(Duration::from_secs(5))
            .user_agent("Aegis-Alert-Sentinel/V13")
            .build()
            .ok()?;
        Some(Self { network_client, webhook_url })
    }
}

#[async_trait::async_trait]
impl NotificationSink for WebhookSink {
    async fn notify(&self, severity: AlertSeverity, title: &str, dedup_key: &str) {
        let payload = json!({
            "severity": format!("{:?}", severity),
            "title": title,
            "dedup_key": dedup_key,
        });
        if let Err(delivery_fault) =
            self.network_client.post(&self.webhook_url).json(&payload).send().await
        {
            // El fallo del sink se registra y se descarta: persistencia intacta.
            warn!("📣 [SENTINEL]: Webhook delivery failed: {}", delivery_fault);
        }
    }
}

/**
 * Inicia el sentinel de notificaciones suscrito al feed de cambios.
 */
pub async fn spawn_alert_sentinel(application_state: AppState, webhook_url: Option<String>) {
    let mut feed_receiver = application_state.change_feed.subscribe();

    let mut sinks: Vec<Box<dyn NotificationSink>> = vec![Box::new(TracingSink)];
    if let Some(webhook_sink) = webhook_url.and_then(WebhookSink::new) {
        sinks.push(Box::new(webhook_sink));
    }

    tokio::spawn(async move {
        info!("📣 [SENTINEL]: Alert notification sentinel online ({} sinks).", sinks.len());

        loop {
            match feed_receiver.recv().await {
                Ok(ControlPlaneEvent::AlertRaised { severity, title, dedup_key, .. }) => {
                    for sink in &sinks {
                        sink.notify(severity, &title, &dedup_key).await;
                    }
                }
                Ok(_) => {}
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    // Entrega al-menos-una-vez: el rezago se tolera.
                    warn!("📣 [SENTINEL]: Feed lagged, {} signals skipped.", skipped);
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
        info!("📣 [SENTINEL]: Feed channel sealed. Sentinel drained.");
    });
}
