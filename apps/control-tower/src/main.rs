// [apps/control-tower/src/main.rs]
/*!
 * =================================================================
 * APARATO: CONTROL TOWER MAIN ENTRY POINT (V11.0 - GOLD MASTER)
 * CLASIFICACIÓN: APPLICATION SHELL (ESTRATO L3)
 * RESPONSABILIDAD: BOOTSTRAP DE INFRAESTRUCTURA E IGNICIÓN SEGURA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. RUNTIME REFINERY: Pila de Tokio elevada (4MB) para los barridos
 *    columnares de la forja sin riesgo de overflow.
 * 2. ZERO ABBREVIATIONS: Nomenclatura nominal absoluta en la captura
 *    de entorno y configuración.
 *
 * # Mathematical Proof (Deterministic Ignition):
 * El proceso garantiza que el catálogo y la bóveda estén certificados
 * ANTES de abrir pools de trabajo, previniendo estados de carrera donde
 * un worker reclame órdenes sin sustrato de persistencia.
 * =================================================================
 */

use aegis_control_tower::prelude::*;
use aegis_shared_panoptes::{init_telemetry, TelemetryProfile};
use clap::Parser;
use dotenvy::dotenv;
use tracing::{error, info};

/**
 * Punto de ignición supremo del binario de la torre.
 */
fn main() -> Result<(), Box<dyn std::error::Error>> {
    // 1. CARGA DE ENTORNO SOBERANO
    dotenv().ok();

    // 2. INICIALIZACIÓN DE OBSERVABILIDAD NEURAL (PANOPTES)
    init_telemetry(TelemetryProfile::from_environment("aegis_control_tower"));

    // 3. CONFIGURACIÓN DEL RUNTIME SOBERANO CON PROTECCIÓN DE PILA (4MB)
    let runtime_tower = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_stack_size(4 * 1024 * 1024)
        .build()?;

    runtime_tower.block_on(async {
        info!("🛰️  [COMMAND_CENTER]: Global ignition sequence starting...");

        // 4. ADQUISICIÓN DE COORDENADAS TÁCTICAS
        let tower_config = TowerConfig::parse();

        // 5. IGNICIÓN DEL KERNEL Y OPERACIONES SOBERANAS
        match ControlTowerKernel::ignite(tower_config).await {
            Ok(kernel) => {
                if let Err(launch_fault) = kernel.launch_sovereign_operations().await {
                    error!("💀 [COMMAND_CENTER]: Sovereign operations collapsed: {}", launch_fault);
                }
            }
            Err(ignition_fault) => {
                error!("💀 [COMMAND_CENTER]: Ignition aborted: {}", ignition_fault);
            }
        }
    });

    Ok(())
}
