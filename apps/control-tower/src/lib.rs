// [apps/control-tower/src/lib.rs]
/*!
 * =================================================================
 * APARATO: CONTROL TOWER LIBRARY ROOT (V10.1 - SOVEREIGN AUTHORITY)
 * CLASIFICACIÓN: CRATE ROOT (ESTRATO L3)
 * RESPONSABILIDAD: DEFINICIÓN SUPREMA DEL ÁRBOL DE MÓDULOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. MODULE HIERARCHY HARDENING: Establece la autoridad única de
 *    módulos, permitiendo que 'crate::' sea resuelto de forma
 *    determinista tanto en la librería como en el binario.
 * 2. PUBLIC INTERFACE: Expone 'prelude' para facilitar la ignición
 *    del Kernel desde el binario 'main.rs'.
 * =================================================================
 */

// --- ESTRATO DE INFRAESTRUCTURA Y ARRANQUE ---
/// Configuración operativa y armado de disparadores nominales.
pub mod bootstrap;

// --- ESTRATO DE DATOS Y ESTADO (L1-APP) ---
/// Gestor del sistema nervioso central de la torre.
pub mod state;

// --- ESTRATO DE TRANSPORTE Y ACCIÓN ---
/// Núcleo de mando y control para la ignición de servicios.
pub mod kernel;
/// Superficie transport-agnóstica de operaciones del plano de control.
pub mod surface;

// --- ESTRATO DE SOPORTE ---
/// Daemons de fondo, pool de workers y controladores.
pub mod services;

/**
 * PRELUDIO DE LA TORRE DE CONTROL
 *
 * Re-exportación estratégica de los componentes necesarios para
 * la ignición mínima del sistema. Reduce el acoplamiento en 'main.rs'.
 */
pub mod prelude {
    pub use crate::bootstrap::TowerConfig;
    pub use crate::kernel::ControlTowerKernel;
    pub use crate::state::AppState;
}
