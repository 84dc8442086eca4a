// [libs/infra/feature-cache/src/lib.rs]
/*!
 * =================================================================
 * APARATO: ONLINE FEATURE CACHE (V11.0 - VOLATILE LRU)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: ACELERACIÓN CONSULTIVA DE FEATURES ONLINE
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. ADVISORY SEMANTICS: La caché jamás es autoritativa; una clave
 *    ausente dispara recomputación, nunca un fallo de predicción.
 * 2. VOLATILE-LRU: Ante presión de capacidad se desalojan primero las
 *    entradas expiradas y luego la de uso menos reciente.
 * 3. SINGLE ROUND-TRIP: 'multi_get' resuelve el lote completo bajo un
 *    solo cerrojo, acotando la suspensión del plano de servicio.
 *
 * # Mathematical Proof (Eviction Correctness):
 * El contador lógico de toques es estrictamente creciente; el mínimo del
 * contador entre entradas vivas identifica la de uso menos reciente en
 * O(n) sobre la capacidad, que está acotada por configuración.
 * =================================================================
 */

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

/// Capacidad nominal de la caché de features.
pub const DEFAULT_CACHE_CAPACITY: usize = 100_000;
/// TTL nominal de una entrada (segundos).
pub const DEFAULT_TTL_SECONDS: u64 = 300;

/// Entrada viva con expiración y rastro de uso.
struct CacheEntry {
    feature_value: f64,
    expires_at: Instant,
    touch_sequence: u64,
}

/// Estado interior protegido por el cerrojo único.
struct CacheInterior {
    entries: HashMap<String, CacheEntry>,
    touch_counter: u64,
}

/// Caché consultiva de features con TTL y desalojo volatile-LRU.
pub struct TtlFeatureCache {
    interior: Mutex<CacheInterior>,
    capacity: usize,
    time_to_live: Duration,
}

impl TtlFeatureCache {
    /// Forja una caché con capacidad y TTL explícitos.
    pub fn new(capacity: usize, time_to_live: Duration) -> Self {
        Self {
            interior: Mutex::new(CacheInterior {
                entries: HashMap::with_capacity(capacity.min(4096)),
                touch_counter: 0,
            }),
            capacity: capacity.max(1),
            time_to_live,
        }
    }

    /// Forja la caché con los parámetros nominales de la plataforma.
    pub fn with_nominal_profile() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY, Duration::from_secs(DEFAULT_TTL_SECONDS))
    }

    /// Inserta o refresca una clave de feature.
    pub fn put(&self, feature_key: &str, feature_value: f64) {
        self.put_at(feature_key, feature_value, Instant::now());
    }

    /// Variante con reloj explícito (determinismo en pruebas).
    pub fn put_at(&self, feature_key: &str, feature_value: f64, now: Instant) {
        let mut interior = match self.interior.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if interior.entries.len() >= self.capacity
            && !interior.entries.contains_key(feature_key)
        {
            Self::evict_one(&mut interior, now);
        }

        interior.touch_counter += 1;
        let sequence = interior.touch_counter;
        interior.entries.insert(
            feature_key.to_string(),
            CacheEntry {
                feature_value,
                expires_at: now + self.time_to_live,
                touch_sequence: sequence,
            },
        );
    }

    /// Lectura individual (None ante ausencia o expiración).
    pub fn get(&self, feature_key: &str) -> Option<f64> {
        self.multi_get_at(std::slice::from_ref(&feature_key.to_string()), Instant::now())
            .into_iter()
            .next()
            .flatten()
    }

    /// Lote completo bajo un solo cerrojo (contrato de round-trip único).
    pub fn multi_get(&self, feature_keys: &[String]) -> Vec<Option<f64>> {
        self.multi_get_at(feature_keys, Instant::now())
    }

    /// Variante con reloj explícito (determinismo en pruebas).
    pub fn multi_get_at(&self, feature_keys: &[String], now: Instant) -> Vec<Option<f64>> {
        let mut interior = match self.interior.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let mut resolved = Vec::with_capacity(feature_keys.len());
        for feature_key in feature_keys {
            // Sondeo en dos fases para liberar el préstamo del mapa antes
            // de la purga perezosa de expiradas.
            let probe = match interior.entries.get(feature_key) {
                Some(entry) if entry.expires_at > now => Some(Some(entry.feature_value)),
                Some(_) => Some(None),
                None => None,
            };

            let outcome = match probe {
                Some(Some(feature_value)) => {
                    interior.touch_counter += 1;
                    let sequence = interior.touch_counter;
                    if let Some(entry) = interior.entries.get_mut(feature_key) {
                        entry.touch_sequence = sequence;
                    }
                    Some(feature_value)
                }
                Some(None) => {
                    // Expirada: purga perezosa en la misma pasada.
                    interior.entries.remove(feature_key);
                    None
                }
                None => None,
            };
            resolved.push(outcome);
        }
        resolved
    }

    /// Cantidad de entradas vivas (incluye expiradas aún no purgadas).
    pub fn entry_count(&self) -> usize {
        match self.interior.lock() {
            Ok(guard) => guard.entries.len(),
            Err(poisoned) => poisoned.into_inner().entries.len(),
        }
    }

    /// Desaloja una entrada: expiradas primero, luego LRU.
    fn evict_one(interior: &mut CacheInterior, now: Instant) {
        let expired_key = interior
            .entries
            .iter()
            .find(|(_, entry)| entry.expires_at <= now)
            .map(|(key, _)| key.clone());

        let victim_key = expired_key.or_else(|| {
            interior
                .entries
                .iter()
                .min_by_key(|(_, entry)| entry.touch_sequence)
                .map(|(key, _)| key.clone())
        });

        if let Some(key) = victim_key {
            debug!("🧹 [FEATURE_CACHE]: Evicting key {}.", key);
            interior.entries.remove(&key);
        }
    }
}
