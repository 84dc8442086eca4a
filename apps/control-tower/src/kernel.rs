// [apps/control-tower/src/kernel.rs]
/**
 * =================================================================
 * APARATO: CONTROL TOWER SOVEREIGN KERNEL (V12.0 - GUARD ACTIVE)
 * CLASIFICACIÓN: COMPOSITION ROOT (ESTRATO L1-APP)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICIÓN SEGURA
 *
 * VISION HIPER-HOLÍSTICA:
 * Actúa como la placa base donde se conectan todos los servicios.
 * El apagado respeta el orden de desmontaje: scheduler primero,
 * plano de servicio al final (drenaje de la bóveda incluido).
 * =================================================================
 */

use crate::bootstrap::{Bootstrap, TowerConfig};
use crate::services::{
    spawn_activation_listener, spawn_alert_sentinel, spawn_chronos, spawn_pulse_broadcaster,
    spawn_reaper, spawn_worker_pool, PoolCaps, PredictionFlusherService,
};
use crate::state::AppState;
use aegis_infra_artifacts::FilesystemArtifactVault;
use aegis_infra_catalog::CatalogClient;
use std::sync::atomic::Ordering;
use std::time::Duration;
use tracing::{error, info, instrument};

/// Núcleo de mando de la torre de control.
pub struct ControlTowerKernel {
    /// Configuración operativa sellada.
    pub tower_config: TowerConfig,
    /// Estado maestro compartido.
    pub application_state: AppState,
}

impl ControlTowerKernel {
    /**
     * Realiza la ignición del cliente táctico y el estado neural.
     * Establece la conexión al catálogo antes de levantar servicios.
     */
    #[instrument(skip(tower_config))]
    pub async fn ignite(tower_config: TowerConfig) -> anyhow::Result<Self> {
        let catalog_client = CatalogClient::connect(
            &tower_config.database_url,
            tower_config.database_access_token.clone(),
        )
        .await?;

        let artifact_vault = FilesystemArtifactVault::ignite(&tower_config.artifact_vault_root)?;

        let application_state = AppState::new(
            catalog_client,
            artifact_vault,
            &tower_config.prediction_spill_path,
        );

        Ok(Self { tower_config, application_state })
    }

    /**
     * Lanza la ejecución de todas las operaciones autónomas de la torre
     * y bloquea hasta la señal de apagado.
     */
    pub async fn launch_sovereign_operations(self) -> anyhow::Result<()> {
        let shared_application_state = self.application_state.clone();

        // --- 1. PLANO DE SERVICIO: LISTENER DE ACTIVACIONES ---
        spawn_activation_listener(shared_application_state.clone()).await;

        // Si ya existe un PRODUCTION sellado, el plano de servicio se
        // hidrata ANTES de abrir los pools de trabajo.
        if let Ok(Some(production_model)) =
            shared_application_state.model_repository.current_production().await
        {
            if let Err(hydration_fault) = crate::services::activation_listener::execute_verified_swap(
                &shared_application_state,
                production_model.id,
            )
            .await
            {
                error!("⚠️ [KERNEL]: Production hydration failed: {}", hydration_fault);
            }
        }

        // --- 2. DAEMONS DE OBSERVABILIDAD Y NOTIFICACIÓN ---
        spawn_alert_sentinel(
            shared_application_state.clone(),
            self.tower_config.alert_webhook_url.clone(),
        )
        .await;
        spawn_pulse_broadcaster(shared_application_state.clone()).await;

        // --- 3. PERSISTENCIA WRITE-BEHIND DEL LOG DE PREDICCIONES ---
        PredictionFlusherService::new(shared_application_state.clone())
            .spawn_flusher_daemon()
            .await;

        // --- 4. HIGIENE DE ARRENDAMIENTOS (REAPER) ---
        spawn_reaper(shared_application_state.clone(), self.tower_config.job_lease_ttl_minutes)
            .await;

        // --- 5. POOL DE WORKERS CON TOPES POR CLASE ---
        spawn_worker_pool(
            shared_application_state.clone(),
            PoolCaps {
                feature: self.tower_config.feature_concurrency,
                training: self.tower_config.training_concurrency,
                monitoring: self.tower_config.monitoring_concurrency,
                retraining: self.tower_config.retraining_concurrency,
            },
        )
        .await;

        // --- 6. SCHEDULER RECURRENTE (CHRONOS) ---
        spawn_chronos(shared_application_state.clone(), self.tower_config.chronos_tick_seconds)
            .await;

        // --- 7. ARMADO DE DISPARADORES NOMINALES ---
        Bootstrap::spawn_schedule_arming(
            shared_application_state.clone(),
            self.tower_config.clone(),
        );

        info!("🛰️  [KERNEL]: Control tower fully operational. Awaiting shutdown signal.");

        // --- 8. ESPERA DE SEÑAL Y DESMONTAJE ORDENADO ---
        tokio::signal::ctrl_c().await?;
        info!("🛑 [KERNEL]: Shutdown signal received. Draining (scheduler first, serving last).");

        // Bajar la bandera detiene Chronos, el pool y el Reaper; el
        // Flusher ejecuta su drenaje final antes de morir.
        shared_application_state.is_operational.store(false, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_secs(6)).await;

        info!("🛰️  [KERNEL]: Teardown sealed. Good night.");
        Ok(())
    }
}
