// [apps/control-tower/src/bootstrap.rs]
/*!
 * =================================================================
 * APARATO: TOWER BOOTSTRAP (V11.0 - CONFIG SOVEREIGN)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: CONFIGURACIÓN OPERATIVA Y ARMADO DE DISPARADORES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ENV HYDRATION: Toda coordenada táctica llega del entorno con
 *    defaults nominales de laboratorio.
 * 2. NOMINAL SCHEDULES: El arranque arma los disparadores recurrentes
 *    de vigilancia contra el modelo PRODUCTION vigente.
 * =================================================================
 */

use crate::state::AppState;
use aegis_domain_models::JobPayload;
use chrono::Utc;
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, instrument, warn};

/// Topes de concurrencia nominales por clase de trabajo.
pub const DEFAULT_TRAINING_CONCURRENCY: usize = 2;
/// Tope nominal de cómputo de features.
pub const DEFAULT_FEATURE_CONCURRENCY: usize = 4;
/// Tope nominal de vigilancia.
pub const DEFAULT_MONITORING_CONCURRENCY: usize = 4;
/// Tope nominal de reentrenamiento.
pub const DEFAULT_RETRAINING_CONCURRENCY: usize = 1;

/// Configuración operativa de la torre de control.
#[derive(Debug, Clone, Parser)]
#[command(name = "aegis-control-tower", about = "AEGIS fraud MLOps control plane")]
pub struct TowerConfig {
    /// URL del catálogo libSQL (archivo local, :memory: o remoto).
    #[arg(long, env = "DATABASE_URL", default_value = "aegis_catalog.db")]
    pub database_url: String,

    /// Token de acceso para catálogos remotos.
    #[arg(long, env = "CATALOG_AUTH_TOKEN")]
    pub database_access_token: Option<String>,

    /// Raíz física de la bóveda de artefactos.
    #[arg(long, env = "ARTIFACT_VAULT_ROOT", default_value = "dist/artifact_vault")]
    pub artifact_vault_root: PathBuf,

    /// Archivo de derrame de la bóveda de predicciones.
    #[arg(long, env = "PREDICTION_SPILL_PATH", default_value = "dist/prediction_spill.jsonl")]
    pub prediction_spill_path: PathBuf,

    /// Tope de workers de entrenamiento.
    #[arg(long, env = "TRAINING_CONCURRENCY", default_value_t = DEFAULT_TRAINING_CONCURRENCY)]
    pub training_concurrency: usize,

    /// Tope de workers de features.
    #[arg(long, env = "FEATURE_CONCURRENCY", default_value_t = DEFAULT_FEATURE_CONCURRENCY)]
    pub feature_concurrency: usize,

    /// Tope de workers de vigilancia.
    #[arg(long, env = "MONITORING_CONCURRENCY", default_value_t = DEFAULT_MONITORING_CONCURRENCY)]
    pub monitoring_concurrency: usize,

    /// Tope de workers de reentrenamiento.
    #[arg(long, env = "RETRAINING_CONCURRENCY", default_value_t = DEFAULT_RETRAINING_CONCURRENCY)]
    pub retraining_concurrency: usize,

    /// Intervalo del scheduler recurrente (segundos).
    #[arg(long, env = "CHRONOS_TICK_SECONDS", default_value_t = 15)]
    pub chronos_tick_seconds: u64,

    /// Arrendamiento de órdenes reclamadas (minutos).
    #[arg(long, env = "JOB_LEASE_TTL_MINUTES", default_value_t = 30)]
    pub job_lease_ttl_minutes: i64,

    /// URL del sink webhook de alertas (opcional).
    #[arg(long, env = "ALERT_WEBHOOK_URL")]
    pub alert_webhook_url: Option<String>,

    /// Habilitación del reentrenamiento automático ante deriva crítica.
    #[arg(long, env = "AUTO_RETRAIN_ENABLED", default_value_t = true)]
    pub auto_retrain_enabled: bool,
}

/// Autoridad de arranque de la torre.
pub struct Bootstrap;

impl Bootstrap {
    /// Intervalo nominal del barrido de deriva (segundos).
    const DRIFT_SCAN_INTERVAL_SECONDS: u64 = 6 * 3600;
    /// Intervalo nominal de la evaluación de concepto (segundos).
    const CONCEPT_SCAN_INTERVAL_SECONDS: u64 = 12 * 3600;
    /// Intervalo nominal de la auditoría de equidad (segundos).
    const BIAS_SCAN_INTERVAL_SECONDS: u64 = 24 * 3600;

    /**
     * Arma los disparadores recurrentes de vigilancia contra el modelo
     * PRODUCTION vigente (si existe) y sella los flags operativos.
     */
    #[instrument(skip(application_shared_state, config))]
    pub fn spawn_schedule_arming(application_shared_state: AppState, config: TowerConfig) {
        tokio::spawn(async move {
            info!("🩺 [BOOTSTRAP]: Arming nominal surveillance schedules...");

            if let Err(flag_fault) = application_shared_state
                .system_repository
                .set_flag(
                    aegis_infra_catalog::repositories::system::FLAG_AUTO_RETRAIN_ENABLED,
                    config.auto_retrain_enabled,
                )
                .await
            {
                warn!("⚠️ [BOOTSTRAP]: Flag seal rejected: {}", flag_fault);
            }

            let production_model = match application_shared_state
                .model_repository
                .current_production()
                .await
            {
                Ok(Some(model)) => model,
                Ok(None) => {
                    info!("🩺 [BOOTSTRAP]: No PRODUCTION model yet. Schedules armed on promotion.");
                    return;
                }
                Err(catalog_fault) => {
                    warn!("⚠️ [BOOTSTRAP]: Production probe failed: {}", catalog_fault);
                    return;
                }
            };

            let nominal_schedules = [
                (
                    "drift_scan_production",
                    JobPayload::DriftScan { model_id: production_model.id },
                    Self::DRIFT_SCAN_INTERVAL_SECONDS,
                ),
                (
                    "concept_scan_production",
                    JobPayload::ConceptScan { model_id: production_model.id },
                    Self::CONCEPT_SCAN_INTERVAL_SECONDS,
                ),
                (
                    "bias_scan_production",
                    JobPayload::BiasScan {
                        model_id: production_model.id,
                        protected_attributes: vec!["customer_segment".to_string()],
                    },
                    Self::BIAS_SCAN_INTERVAL_SECONDS,
                ),
            ];

            for (schedule_name, payload, interval_seconds) in nominal_schedules {
                let outcome = application_shared_state
                    .schedule_repository
                    .upsert(schedule_name, &payload, interval_seconds, Utc::now())
                    .await;
                if let Err(schedule_fault) = outcome {
                    warn!("⚠️ [BOOTSTRAP]: Schedule '{}' rejected: {}", schedule_name, schedule_fault);
                }
            }

            info!("✅ [BOOTSTRAP]: Surveillance schedules armed and certified.");
        });
    }
}
