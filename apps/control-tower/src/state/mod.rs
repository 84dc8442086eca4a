// [apps/control-tower/src/state/mod.rs]
/*!
 * =================================================================
 * APARATO: SOVEREIGN STATE ORCHESTRATOR (V12.0 - SINGULARITY GOLD)
 * CLASIFICACIÓN: APPLICATION STATE (ESTRATO L1-APP)
 * RESPONSABILIDAD: ORQUESTACIÓN DE ESTRATOS, REPOSITORIOS Y SERVICIO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. COMPOSITION ROOT: Centraliza el rastro de los repositorios, la
 *    bóveda de artefactos, el motor de scoring y los daemons.
 * 2. EXPLICIT LIFETIMES: Servicios de vida larga instanciados UNA vez
 *    en la ignición y pasados por referencia compartida (Arc); cero
 *    singletons de proceso.
 * 3. NOMINAL PURITY: Erradicación total de abreviaciones. Uso de
 *    'Arc<T>' para inmutabilidad compartida.
 *
 * # Mathematical Proof (Deterministic State Hub):
 * El aparato garantiza coherencia 360°: cualquier promoción sellada en
 * el catálogo es visible por el plano de servicio a través del feed de
 * cambios, con el catálogo como única fuente de verdad de estado.
 * =================================================================
 */

use aegis_domain_serving::{FeatureResolver, PredictionVault, ScoringEngine};
use aegis_infra_artifacts::FilesystemArtifactVault;
use aegis_infra_catalog::repositories::{
    AbTestRepository, AlertRepository, DatasetRepository, FeatureSetRepository, JobRepository,
    MetricRepository, ModelRepository, PredictionRepository, RetrainRepository,
    ScheduleRepository, SystemRepository,
};
use aegis_infra_catalog::{CatalogClient, CatalogFeed};
use aegis_infra_feature_cache::TtlFeatureCache;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::debug;

/**
 * Contenedor de estado compartido (Thread-Safe) para la Torre de Control.
 * Actúa como la placa base neural donde se conectan todos los estratos.
 */
#[derive(Clone)]
pub struct AppState {
    /// Cliente táctico del catálogo de metadatos.
    pub catalog_client: CatalogClient,
    /// Feed de cambios tipado (Model, Alert, Job).
    pub change_feed: CatalogFeed,
    /// Bóveda física de artefactos verificados.
    pub artifact_vault: Arc<FilesystemArtifactVault>,
    /// Motor de scoring con puntero caliente.
    pub scoring_engine: Arc<ScoringEngine>,
    /// Bóveda de tránsito del log de predicciones.
    pub prediction_vault: Arc<PredictionVault>,
    /// Bandera operativa global (drenaje en apagado).
    pub is_operational: Arc<AtomicBool>,

    // --- ESTRATO DE REPOSITORIOS SOBERANOS ---
    /// Linaje de datasets.
    pub dataset_repository: Arc<DatasetRepository>,
    /// Contratos de features.
    pub feature_set_repository: Arc<FeatureSetRepository>,
    /// Registro de modelos y baselines.
    pub model_repository: Arc<ModelRepository>,
    /// Log inmutable de predicciones.
    pub prediction_repository: Arc<PredictionRepository>,
    /// Métricas de vigilancia.
    pub metric_repository: Arc<MetricRepository>,
    /// Alertas deduplicadas.
    pub alert_repository: Arc<AlertRepository>,
    /// Ledger de trabajos.
    pub job_repository: Arc<JobRepository>,
    /// Disparadores recurrentes.
    pub schedule_repository: Arc<ScheduleRepository>,
    /// Máquina de reentrenamiento.
    pub retrain_repository: Arc<RetrainRepository>,
    /// Experimentos champion/challenger.
    pub ab_test_repository: Arc<AbTestRepository>,
    /// Flags operativos y auditoría.
    pub system_repository: Arc<SystemRepository>,
}

impl AppState {
    /**
     * Forja una nueva instancia del Estado Maestro inyectando todas las
     * dependencias de vida larga.
     */
    pub fn new(
        catalog_client: CatalogClient,
        artifact_vault: FilesystemArtifactVault,
        prediction_spill_path: &Path,
    ) -> Self {
        debug!("🧬 [APP_STATE]: Executing sovereign ignition sequence V12.0...");

        let change_feed = CatalogFeed::new();

        // Pre-hidratación de repositorios soberanos.
        let dataset_repository = Arc::new(DatasetRepository::new(catalog_client.clone()));
        let feature_set_repository = Arc::new(FeatureSetRepository::new(catalog_client.clone()));
        let model_repository =
            Arc::new(ModelRepository::new(catalog_client.clone(), change_feed.clone()));
        let prediction_repository = Arc::new(PredictionRepository::new(catalog_client.clone()));
        let metric_repository = Arc::new(MetricRepository::new(catalog_client.clone()));
        let alert_repository =
            Arc::new(AlertRepository::new(catalog_client.clone(), change_feed.clone()));
        let job_repository =
            Arc::new(JobRepository::new(catalog_client.clone(), change_feed.clone()));
        let schedule_repository = Arc::new(ScheduleRepository::new(catalog_client.clone()));
        let retrain_repository = Arc::new(RetrainRepository::new(catalog_client.clone()));
        let ab_test_repository = Arc::new(AbTestRepository::new(catalog_client.clone()));
        let system_repository = Arc::new(SystemRepository::new(catalog_client.clone()));

        // Motor de scoring con resolutor consultivo local.
        let feature_resolver =
            FeatureResolver::new(TtlFeatureCache::with_nominal_profile(), None, None);
        let scoring_engine = Arc::new(ScoringEngine::new(feature_resolver));

        let prediction_vault = Arc::new(PredictionVault::new(
            aegis_domain_serving::vault::DEFAULT_VAULT_CAPACITY,
            prediction_spill_path.to_path_buf(),
        ));

        Self {
            catalog_client,
            change_feed,
            artifact_vault: Arc::new(artifact_vault),
            scoring_engine,
            prediction_vault,
            is_operational: Arc::new(AtomicBool::new(true)),
            dataset_repository,
            feature_set_repository,
            model_repository,
            prediction_repository,
            metric_repository,
            alert_repository,
            job_repository,
            schedule_repository,
            retrain_repository,
            ab_test_repository,
            system_repository,
        }
    }
}
