// [libs/shared/panoptes/src/lib.rs]
/*!
 * =================================================================
 * APARATO: PANOPTES TELEMETRY AUTHORITY (V13.0 - PULSE ACCOUNTING)
 * CLASIFICACIÓN: SHARED UTILITY (ESTRATO L4/L6)
 * RESPONSABILIDAD: PERFIL DE TELEMETRÍA, AMORTIGUACIÓN DE RUIDO Y
 *                  CONTABILIDAD DE PÁNICOS PARA EL PULSO DEL SISTEMA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. PROFILE SOVEREIGNTY: El formato y la verbosidad llegan de las
 *    variables AEGIS_LOG_FORMAT / AEGIS_LOG_VERBOSITY con defaults por
 *    perfil de compilación; RUST_LOG explícito conserva la última palabra.
 * 2. DEPENDENCY DAMPING: La lista de amortiguación silencia ÚNICAMENTE
 *    las dependencias ruidosas de ESTE stack (libsql, reqwest/hyper y la
 *    cadena TLS) sin tocar los estratos del dominio.
 * 3. PANIC ACCOUNTING: Todo colapso de hilo queda contado en un
 *    acumulador atómico que el emisor de pulso reporta al Panóptico; el
 *    hook registra hilo y coordenadas antes de la defunción.
 * =================================================================
 */

use std::panic;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as formatting_layer, EnvFilter};

/// Variable de entorno del formato de emisión ("json" | "pretty").
pub const LOG_FORMAT_ENVIRONMENT_KEY: &str = "AEGIS_LOG_FORMAT";
/// Variable de entorno de la verbosidad del dominio ("info", "debug", ...).
pub const LOG_VERBOSITY_ENVIRONMENT_KEY: &str = "AEGIS_LOG_VERBOSITY";

/// Amortiguación de dependencias ruidosas del stack de la plataforma.
/// El catálogo libSQL y el cliente de egreso dominan el ruido; la cadena
/// TLS emite handshakes por debajo del interés operativo.
const DEPENDENCY_DAMPING: &[(&str, &str)] = &[
    ("libsql", "error"),
    ("libsql_replication", "error"),
    ("reqwest", "warn"),
    ("hyper", "warn"),
    ("h2", "warn"),
    ("rustls", "warn"),
];

/// Acumulador global de colapsos de hilo observados desde la ignición.
static OBSERVED_PANIC_COUNT: AtomicU64 = AtomicU64::new(0);

/// Formato de emisión del rastro estructurado.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Tramas JSON planas para la ingesta del Panóptico.
    Json,
    /// Salida compacta legible para el operador local.
    Pretty,
}

impl LogFormat {
    /// Resuelve el formato desde su etiqueta textual.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" | "compact" => Some(Self::Pretty),
            _ => None,
        }
    }

    /// Default por perfil de compilación: JSON en release, legible en debug.
    pub fn build_profile_default() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

/// Perfil de telemetría sellado en la ignición del proceso.
#[derive(Debug, Clone)]
pub struct TelemetryProfile {
    /// Identificador nominal del servicio emisor.
    pub service_identifier: String,
    /// Formato de emisión resuelto.
    pub log_format: LogFormat,
    /// Verbosidad del estrato de dominio ("info", "debug", ...).
    pub domain_verbosity: String,
}

impl TelemetryProfile {
    /**
     * Hidrata el perfil desde el entorno del proceso.
     *
     * AEGIS_LOG_FORMAT y AEGIS_LOG_VERBOSITY gobiernan formato y nivel;
     * ausentes, rigen los defaults del perfil de compilación.
     */
    pub fn from_environment(service_identifier: &str) -> Self {
        let log_format = std::env::var(LOG_FORMAT_ENVIRONMENT_KEY)
            .ok()
            .and_then(|label| LogFormat::from_label(&label))
            .unwrap_or_else(LogFormat::build_profile_default);

        let domain_verbosity = std::env::var(LOG_VERBOSITY_ENVIRONMENT_KEY)
            .unwrap_or_else(|_| {
                if cfg!(debug_assertions) { "debug" } else { "info" }.to_string()
            });

        Self {
            service_identifier: service_identifier.to_string(),
            log_format,
            domain_verbosity,
        }
    }
}

/**
 * Ensambla las directivas del filtro: verbosidad del servicio + la lista
 * de amortiguación de dependencias de la plataforma.
 *
 * Función pura: el resultado es una cadena de directivas separadas por
 * coma apta para EnvFilter.
 */
pub fn assemble_filter_directives(service_identifier: &str, domain_verbosity: &str) -> String {
    let mut directives = Vec::with_capacity(DEPENDENCY_DAMPING.len() + 1);
    directives.push(format!("{}={}", service_identifier, domain_verbosity));
    for (dependency, ceiling) in DEPENDENCY_DAMPING {
        directives.push(format!("{}={}", dependency, ceiling));
    }
    directives.join(",")
}

/// Colapsos de hilo observados desde la ignición (insumo del pulso).
pub fn observed_panic_count() -> u64 {
    OBSERVED_PANIC_COUNT.load(Ordering::Relaxed)
}

/**
 * Inicializa la telemetría del proceso según el perfil sellado.
 *
 * Un RUST_LOG explícito del operador conserva la última palabra sobre el
 * filtro; el hook de pánicos queda instalado en ambos casos.
 *
 * # Errors:
 * Retorna pánico si otro suscriptor global ya fue inicializado.
 */
pub fn init_telemetry(profile: TelemetryProfile) {
    let environmental_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(assemble_filter_directives(
            &profile.service_identifier,
            &profile.domain_verbosity,
        ))
    });

    match profile.log_format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(environmental_filter)
                .with(formatting_layer::layer().json().flatten_event(true))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(environmental_filter)
                .with(formatting_layer::layer().compact().with_target(false))
                .init();
        }
    }

    install_panic_accounting(&profile.service_identifier);

    info!(
        "👁️  [PANOPTES_ONLINE]: Telemetry sealed for [{}] ({:?}, domain '{}').",
        profile.service_identifier, profile.log_format, profile.domain_verbosity
    );
}

/**
 * Instala el hook contable de pánicos preservando el hook previo.
 *
 * El acumulador alimenta el pulso del sistema; el rastro registra hilo y
 * coordenadas para el diagnóstico post-mortem de workers y daemons.
 */
pub fn install_panic_accounting(service_identifier: &str) {
    let service_snapshot = service_identifier.to_string();
    let previous_hook = panic::take_hook();

    panic::set_hook(Box::new(move |panic_metadata| {
        let accumulated = OBSERVED_PANIC_COUNT.fetch_add(1, Ordering::Relaxed) + 1;

        let thread_label = std::thread::current()
            .name()
            .unwrap_or("unnamed_worker")
            .to_string();
        let panic_coordinates = panic_metadata
            .location()
            .map(|location| format!("{}:{}:{}", location.file(), location.line(), location.column()))
            .unwrap_or_else(|| "unknown_coordinates".to_string());
        let panic_payload_message = panic_metadata
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| panic_metadata.payload().downcast_ref::<String>().map(String::as_str))
            .unwrap_or("opaque panic payload");

        error!(
            target: "panic_monitor",
            service = %service_snapshot,
            thread = %thread_label,
            coordinates = %panic_coordinates,
            accumulated_panics = accumulated,
            "🔥 [THREAD_COLLAPSE]: {}",
            panic_payload_message
        );

        previous_hook(panic_metadata);
    }));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certify_format_label_resolution() {
        assert_eq!(LogFormat::from_label("json"), Some(LogFormat::Json));
        assert_eq!(LogFormat::from_label("JSON"), Some(LogFormat::Json));
        assert_eq!(LogFormat::from_label("pretty"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::from_label("compact"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::from_label("yaml"), None);
    }

    #[test]
    fn certify_directive_assembly_damps_platform_stack() {
        let directives = assemble_filter_directives("aegis_control_tower", "debug");

        assert!(directives.starts_with("aegis_control_tower=debug"));
        // La amortiguación cubre el catálogo y la cadena de egreso.
        assert!(directives.contains("libsql=error"));
        assert!(directives.contains("reqwest=warn"));
        assert!(directives.contains("rustls=warn"));
        // Sin directivas vacías ni separadores colgantes.
        assert!(directives.split(',').all(|directive| directive.contains('=')));
    }

    #[test]
    fn certify_panic_accounting_increments() {
        install_panic_accounting("panoptes_probe");
        let baseline = observed_panic_count();

        let outcome = std::panic::catch_unwind(|| {
            panic!("controlled collapse for accounting");
        });
        assert!(outcome.is_err());
        assert!(observed_panic_count() > baseline);
    }
}
