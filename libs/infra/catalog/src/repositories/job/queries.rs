// [libs/infra/catalog/src/repositories/job/queries.rs]
/*!
 * =================================================================
 * APARATO: JOB LEDGER SQL STORE (V42.0 - TACTICAL LEDGER SQL)
 * CLASIFICACIÓN: INFRASTRUCTURE SQL (ESTRATO L3)
 * RESPONSABILIDAD: DEFINICIÓN DE SENTENCIAS ATÓMICAS PARA TRABAJOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. FULL LIFECYCLE COVERAGE: Centraliza desde el encolado idempotente
 *    hasta el barrido de arrendamientos vencidos del Reaper.
 * 2. ZERO ABBREVIATIONS: Nomenclatura nominal absoluta en los nombres
 *    de las constantes.
 *
 * # Mathematical Proof (ACID Consistency):
 * Las consultas utilizan guardias de estado (WHERE state = 'QUEUED')
 * para garantizar que la transición de propiedad sea una operación
 * atómica indivisible en el catálogo.
 * =================================================================
 */

// --- ESTRATO DE IGNICIÓN Y ASIGNACIÓN ---

/// Inicializa una nueva orden de trabajo en el Ledger.
pub const INITIALIZE_JOB: &str = r#"
    INSERT INTO jobs (
        id, kind, payload_json, state, idempotency_key, created_at
    ) VALUES (?1, ?2, ?3, 'QUEUED', ?4, ?5)
"#;

/// Localiza una orden viva previa con la misma clave de idempotencia.
pub const FIND_BY_IDEMPOTENCY_KEY: &str = r#"
    SELECT id FROM jobs
    WHERE idempotency_key = ?1 AND state IN ('QUEUED', 'RUNNING')
    LIMIT 1
"#;

/// Candidata más antigua en cola para una clase habilitada.
pub const FIND_NEXT_QUEUED_OF_KIND: &str = r#"
    SELECT id FROM jobs
    WHERE state = 'QUEUED' AND kind = ?1
    ORDER BY created_at ASC
    LIMIT 1
"#;

/// Reclama la propiedad de una orden de forma atómica (CAS de estado).
pub const CLAIM_JOB: &str = r#"
    UPDATE jobs
    SET state = 'RUNNING', started_at = ?2, stage_tag = 'claimed'
    WHERE id = ?1 AND state = 'QUEUED'
"#;

// --- ESTRATO DE SEGUIMIENTO (PACEMAKER) ---

/// Sincroniza el progreso monótono y la etiqueta de etapa corriente.
pub const UPDATE_PROGRESS: &str = r#"
    UPDATE jobs
    SET progress = MAX(progress, ?2), stage_tag = ?3
    WHERE id = ?1 AND state = 'RUNNING'
"#;

/// Solicita la cancelación cooperativa de una orden viva.
pub const REQUEST_CANCELLATION: &str = r#"
    UPDATE jobs
    SET cancel_requested = 1
    WHERE id = ?1 AND state IN ('QUEUED', 'RUNNING')
"#;

/// Lee la bandera de cancelación (sondeada en fronteras de etapa).
pub const READ_CANCEL_FLAG: &str = r#"
    SELECT cancel_requested FROM jobs WHERE id = ?1
"#;

// --- ESTRATO DE FINALIZACIÓN Y CERTIFICACIÓN ---

/// Sella la orden como completada (CAS desde RUNNING).
pub const MARK_COMPLETED: &str = r#"
    UPDATE jobs
    SET state = 'COMPLETED', progress = 1.0, completed_at = ?2
    WHERE id = ?1 AND state = 'RUNNING'
"#;

/// Sella la orden como fallida con el error terminal.
pub const MARK_FAILED: &str = r#"
    UPDATE jobs
    SET state = 'FAILED', error_message = ?2, completed_at = ?3
    WHERE id = ?1 AND state = 'RUNNING'
"#;

/// Sella la cancelación cooperativa observada.
pub const MARK_CANCELLED: &str = r#"
    UPDATE jobs
    SET state = 'CANCELLED', completed_at = ?2
    WHERE id = ?1 AND state IN ('QUEUED', 'RUNNING')
"#;

// --- ESTRATO DEL REAPER (HIGIENE DE ARRENDAMIENTOS) ---

/// Devuelve a cola las órdenes con arrendamiento vencido y reintentos disponibles.
pub const RESET_STALE_LEASES: &str = r#"
    UPDATE jobs
    SET state = 'QUEUED', started_at = NULL, retry_count = retry_count + 1
    WHERE state = 'RUNNING' AND started_at < ?1 AND retry_count < ?2
"#;

/// Sella como fallidas las órdenes zombie sin reintentos disponibles.
pub const FAIL_EXHAUSTED_LEASES: &str = r#"
    UPDATE jobs
    SET state = 'FAILED', error_message = 'lease expired after max retries', completed_at = ?2
    WHERE state = 'RUNNING' AND started_at < ?1 AND retry_count >= ?3
"#;

// --- ESTRATO DE CONSULTA ---

/// Proyección completa de una orden.
pub const JOB_PROJECTION: &str = r#"
    SELECT id, kind, payload_json, state, progress, stage_tag, idempotency_key,
           retry_count, error_message, created_at, started_at, completed_at
    FROM jobs
"#;

/// Profundidad corriente de la cola por clase.
pub const QUEUE_DEPTH_OF_KIND: &str = r#"
    SELECT COUNT(*) FROM jobs WHERE state = 'QUEUED' AND kind = ?1
"#;
