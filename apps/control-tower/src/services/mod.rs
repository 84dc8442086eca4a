// [apps/control-tower/src/services/mod.rs]
/**
 * =================================================================
 * APARATO: SERVICE ORCHESTRATION HUB (V14.0 - COMMAND ENABLED)
 * CLASIFICACIÓN: APPLICATION SERVICES (ESTRATO L4)
 * RESPONSABILIDAD: EXPOSICIÓN NOMINAL DE DAEMONS Y MOTORES
 *
 * VISION HIPER-HOLÍSTICA:
 * Actúa como la central de registro de la inteligencia del sistema.
 * 1. MODULARIDAD: Cada servicio opera como una unidad atómica aislada.
 * 2. TYPE SAFETY: Garantiza la visibilidad de los tipos de servicio
 *    en el Kernel y la superficie.
 * =================================================================
 */

pub mod activation_listener;
pub mod alert_sentinel;
pub mod chronos;
pub mod executors;
pub mod prediction_flusher;
pub mod pulse;
pub mod reaper;
pub mod retrain_driver;
pub mod worker_pool;

// --- RE-EXPORTACIONES SOBERANAS (NOMINAL ACCESS) ---

pub use activation_listener::spawn_activation_listener;
pub use alert_sentinel::spawn_alert_sentinel;
pub use chronos::spawn_chronos;
pub use prediction_flusher::PredictionFlusherService;
pub use pulse::spawn_pulse_broadcaster;
pub use reaper::spawn_reaper;
pub use worker_pool::{spawn_worker_pool, PoolCaps};
