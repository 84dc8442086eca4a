// [libs/infra/catalog/src/schema.rs]
/**
 * =================================================================
 * APARATO: CATALOG DATABASE SCHEMA (V41.0 - CONTROL PLANE STRATA)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 *
 * VISION HIPER-HOLÍSTICA:
 * 1. SINGLE-PRODUCTION SHIELD: Índice único parcial sobre models(stage)
 *    como segunda línea de defensa del invariante de producción única.
 * 2. IDEMPOTENCY ANCHOR: Índice único sobre jobs(idempotency_key) para
 *    la deduplicación de encolados.
 * 3. TIME PARTITION READY: El log de predicciones indexa (model, created_at)
 *    habilitando el recorte por ventanas temporales.
 * 4. IDEMPOTENCIA: Gestión de errores para migraciones en caliente.
 * =================================================================
 */

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::{debug, info, instrument, warn};

/**
 * ESTRATO 1: SOLIDIFICACIÓN (Génesis de Tablas)
 * Define las entidades base del plano de control AEGIS.
 */
const CONTROL_PLANE_TABLES: &[(&str, &str)] = &[
    ("TABLE_DATASETS", r#"
        CREATE TABLE IF NOT EXISTS datasets (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            version INTEGER NOT NULL,
            parent_dataset_id TEXT,
            row_count INTEGER NOT NULL DEFAULT 0,
            column_count INTEGER NOT NULL DEFAULT 0,
            schema_json TEXT NOT NULL,
            content_checksum TEXT NOT NULL,
            blob_reference TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'PROCESSING',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(name, version)
        );
    "#),
    ("TABLE_FEATURE_SETS", r#"
        CREATE TABLE IF NOT EXISTS feature_sets (
            id TEXT PRIMARY KEY,
            dataset_id TEXT NOT NULL,
            config_json TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'PENDING',
            generated_names_json TEXT NOT NULL DEFAULT '[]',
            selected_features_json TEXT NOT NULL DEFAULT '[]',
            schema_hash TEXT NOT NULL DEFAULT '',
            matrix_artifact_reference TEXT,
            error_message TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
    "#),
    ("TABLE_MODELS", r#"
        CREATE TABLE IF NOT EXISTS models (
            id TEXT PRIMARY KEY,
            algorithm TEXT NOT NULL,
            hyperparameters_json TEXT NOT NULL,
            feature_set_id TEXT NOT NULL,
            schema_hash TEXT NOT NULL,
            metrics_json TEXT NOT NULL,
            importance_json TEXT NOT NULL DEFAULT '[]',
            feature_names_json TEXT NOT NULL,
            native_artifact_reference TEXT NOT NULL,
            portable_artifact_reference TEXT NOT NULL,
            checksum_hexadecimal TEXT NOT NULL,
            stage TEXT NOT NULL DEFAULT 'TRAINED',
            archived_reason TEXT,
            promoted_at TEXT,
            trained_at TEXT NOT NULL,
            created_at TEXT NOT NULL
        );
    "#),
    ("TABLE_BASELINES", r#"
        CREATE TABLE IF NOT EXISTS baselines (
            model_id TEXT NOT NULL,
            metric_name TEXT NOT NULL,
            threshold REAL NOT NULL,
            operator TEXT NOT NULL,
            PRIMARY KEY(model_id, metric_name)
        );
    "#),
    ("TABLE_PREDICTIONS", r#"
        CREATE TABLE IF NOT EXISTS predictions (
            id TEXT PRIMARY KEY,
            model_id TEXT NOT NULL,
            transaction_id TEXT,
            input_vector_json TEXT NOT NULL,
            score REAL NOT NULL,
            label_flag INTEGER NOT NULL,
            confidence REAL NOT NULL,
            explanation_json TEXT,
            latency_milliseconds REAL NOT NULL,
            degraded INTEGER NOT NULL DEFAULT 0,
            actual_label INTEGER,
            created_at TEXT NOT NULL
        );
    "#),
    ("TABLE_DRIFT_METRICS", r#"
        CREATE TABLE IF NOT EXISTS drift_metrics (
            id TEXT PRIMARY KEY,
            model_id TEXT NOT NULL,
            kind TEXT NOT NULL,
            feature_name TEXT NOT NULL,
            metric_name TEXT NOT NULL,
            value REAL NOT NULL,
            status TEXT NOT NULL,
            window_start TEXT NOT NULL,
            window_end TEXT NOT NULL,
            computed_at TEXT NOT NULL
        );
    "#),
    ("TABLE_BIAS_METRICS", r#"
        CREATE TABLE IF NOT EXISTS bias_metrics (
            id TEXT PRIMARY KEY,
            model_id TEXT NOT NULL,
            protected_attribute TEXT NOT NULL,
            metric_name TEXT NOT NULL,
            value REAL NOT NULL,
            status TEXT NOT NULL,
            window_start TEXT NOT NULL,
            window_end TEXT NOT NULL,
            computed_at TEXT NOT NULL
        );
    "#),
    ("TABLE_ALERTS", r#"
        CREATE TABLE IF NOT EXISTS alerts (
            id TEXT PRIMARY KEY,
            source_kind TEXT NOT NULL,
            source_reference TEXT,
            model_id TEXT,
            alert_type TEXT NOT NULL,
            dedup_key TEXT NOT NULL,
            severity TEXT NOT NULL,
            title TEXT NOT NULL,
            details TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'ACTIVE',
            occurrence_count INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            last_seen_at TEXT NOT NULL,
            acknowledged_at TEXT,
            resolved_at TEXT
        );
    "#),
    ("TABLE_JOBS", r#"
        CREATE TABLE IF NOT EXISTS jobs (
            id TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            payload_json TEXT NOT NULL,
            state TEXT NOT NULL DEFAULT 'QUEUED',
            progress REAL NOT NULL DEFAULT 0.0,
            stage_tag TEXT,
            idempotency_key TEXT,
            retry_count INTEGER NOT NULL DEFAULT 0,
            cancel_requested INTEGER NOT NULL DEFAULT 0,
            error_message TEXT,
            created_at TEXT NOT NULL,
            started_at TEXT,
            completed_at TEXT
        );
    "#),
    ("TABLE_RECURRING_SCHEDULES", r#"
        CREATE TABLE IF NOT EXISTS recurring_schedules (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            payload_json TEXT NOT NULL,
            interval_seconds INTEGER NOT NULL,
            next_run_at TEXT NOT NULL,
            enabled INTEGER NOT NULL DEFAULT 1,
            last_fired_at TEXT
        );
    "#),
    ("TABLE_RETRAIN_JOBS", r#"
        CREATE TABLE IF NOT EXISTS retrain_jobs (
            id TEXT PRIMARY KEY,
            base_model_id TEXT NOT NULL,
            reason TEXT NOT NULL,
            merge_strategy_json TEXT NOT NULL,
            state TEXT NOT NULL DEFAULT 'PENDING',
            candidate_feature_set_id TEXT,
            candidate_model_id TEXT,
            auto_promote INTEGER NOT NULL DEFAULT 0,
            min_improvement REAL NOT NULL DEFAULT 0.01,
            rejection_reason TEXT,
            error_message TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
    "#),
    ("TABLE_AB_TESTS", r#"
        CREATE TABLE IF NOT EXISTS ab_tests (
            id TEXT PRIMARY KEY,
            champion_model_id TEXT NOT NULL,
            challenger_model_id TEXT NOT NULL,
            traffic_split REAL NOT NULL,
            min_samples INTEGER NOT NULL,
            primary_metric TEXT NOT NULL,
            champion_samples INTEGER NOT NULL DEFAULT 0,
            challenger_samples INTEGER NOT NULL DEFAULT 0,
            mirror_mode INTEGER NOT NULL DEFAULT 0,
            auto_promote INTEGER NOT NULL DEFAULT 0,
            state TEXT NOT NULL DEFAULT 'DRAFT',
            result_json TEXT,
            created_at TEXT NOT NULL,
            concluded_at TEXT
        );
    "#),
    ("TABLE_SYSTEM_STATE", r#"
        CREATE TABLE IF NOT EXISTS system_state (
            key TEXT PRIMARY KEY,
            value_text TEXT,
            value_int INTEGER,
            updated_at TEXT NOT NULL
        );
    "#),
    ("TABLE_AUDIT_EVENTS", r#"
        CREATE TABLE IF NOT EXISTS audit_events (
            id TEXT PRIMARY KEY,
            actor TEXT NOT NULL,
            action TEXT NOT NULL,
            subject_reference TEXT NOT NULL,
            details TEXT,
            recorded_at TEXT NOT NULL
        );
    "#),
];

/**
 * ESTRATO 2: EVOLUCIÓN (Mutaciones de Columna)
 * Asegura que las tablas existentes se adapten a las nuevas capacidades.
 */
const EVOLUTIONARY_STRATA: &[(&str, &str)] = &[
    ("ALERT_AUTO_RESOLVE_STREAK", "ALTER TABLE alerts ADD COLUMN ok_streak INTEGER NOT NULL DEFAULT 0"),
    ("PREDICTION_AB_TEST", "ALTER TABLE predictions ADD COLUMN ab_test_id TEXT"),
    ("PREDICTION_AB_ARM", "ALTER TABLE predictions ADD COLUMN ab_arm TEXT"),
];

/**
 * ESTRATO 3: ENDURECIMIENTO (Índices de Aceleración y Defensa)
 * Optimiza el acceso y sella los invariantes estructurales.
 */
const ACCELERATION_INDEXES: &[(&str, &str)] = &[
    // Segunda línea de defensa del invariante de producción única.
    ("IDX_MODELS_SINGLE_PRODUCTION",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_models_single_production ON models(stage) WHERE stage = 'PRODUCTION';"),
    ("IDX_MODELS_STAGE", "CREATE INDEX IF NOT EXISTS idx_models_stage ON models(stage);"),
    ("IDX_FEATURE_SETS_DATASET",
        "CREATE INDEX IF NOT EXISTS idx_feature_sets_dataset ON feature_sets(dataset_id);"),
    // Ancla de idempotencia del Ledger de trabajos.
    ("IDX_JOBS_IDEMPOTENCY",
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_jobs_idempotency ON jobs(idempotency_key) WHERE idempotency_key IS NOT NULL;"),
    ("IDX_JOBS_STATE", "CREATE INDEX IF NOT EXISTS idx_jobs_state ON jobs(state, kind, created_at);"),
    // Partición temporal lógica del log de predicciones.
    ("IDX_PREDICTIONS_MODEL_TIME",
        "CREATE INDEX IF NOT EXISTS idx_predictions_model_time ON predictions(model_id, created_at);"),
    ("IDX_PREDICTIONS_AB",
        "CREATE INDEX IF NOT EXISTS idx_predictions_ab ON predictions(ab_test_id, ab_arm);"),
    ("IDX_ALERTS_DEDUP",
        "CREATE INDEX IF NOT EXISTS idx_alerts_dedup ON alerts(dedup_key, status);"),
    ("IDX_DRIFT_METRICS_IDENTITY",
        "CREATE INDEX IF NOT EXISTS idx_drift_metrics_identity ON drift_metrics(model_id, feature_name, metric_name, computed_at);"),
    ("IDX_BIAS_METRICS_IDENTITY",
        "CREATE INDEX IF NOT EXISTS idx_bias_metrics_identity ON bias_metrics(model_id, protected_attribute, metric_name, computed_at);"),
    ("IDX_SCHEDULES_DUE",
        "CREATE INDEX IF NOT EXISTS idx_schedules_due ON recurring_schedules(enabled, next_run_at);"),
];

/**
 * Ejecuta la secuencia maestra de sincronización del esquema estructural.
 *
 * # Errors:
 * Retorna error si alguna tabla base falla en solidificarse, indicando
 * un colapso en el enlace con el catálogo.
 */
#[instrument(skip(database_connection))]
pub async fn apply_full_catalog_schema(database_connection: &Connection) -> Result<()> {
    info!("🏗️ [SCHEMA_ENGINE]: Initiating structural synchronization V41.0...");

    solidify_base_strata(database_connection).await?;
    execute_evolutionary_repair(database_connection).await?;
    harden_access_layer(database_connection).await?;

    info!("✅ [SCHEMA_ENGINE]: Control Plane Ledger V41.0 level and certified.");
    Ok(())
}

async fn solidify_base_strata(database_connection: &Connection) -> Result<()> {
    for (identifier, sql) in CONTROL_PLANE_TABLES {
        debug!("  ↳ Solidifying: {}", identifier);
        database_connection
            .execute(*sql, ())
            .await
            .with_context(|| format!("CRITICAL_SOLIDIFICATION_FAULT: {}", identifier))?;
    }
    Ok(())
}

async fn execute_evolutionary_repair(database_connection: &Connection) -> Result<()> {
    for (identifier, sql) in EVOLUTIONARY_STRATA {
        match database_connection.execute(*sql, ()).await {
            Ok(_) => debug!("  ↳ Evolution applied: {}", identifier),
            Err(fault) => {
                // La columna duplicada es la firma nominal de una migración ya aplicada.
                let fault_text = fault.to_string();
                if fault_text.contains("duplicate column") {
                    debug!("  ↳ Evolution already present: {}", identifier);
                } else {
                    warn!("  ↳ Evolution rejected [{}]: {}", identifier, fault_text);
                }
            }
        }
    }
    Ok(())
}

async fn harden_access_layer(database_connection: &Connection) -> Result<()> {
    for (identifier, sql) in ACCELERATION_INDEXES {
        debug!("  ↳ Hardening: {}", identifier);
        database_connection
            .execute(*sql, ())
            .await
            .with_context(|| format!("INDEX_HARDENING_FAULT: {}", identifier))?;
    }
    Ok(())
}
