// [libs/domain/serving/src/resolver.rs]
/*!
 * =================================================================
 * APARATO: ONLINE FEATURE RESOLVER (V22.2 - LAYERED LOOKUP)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: RESOLUCIÓN EN CAPAS DE FEATURES ONLINE
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. THREE LAYER CASCADE: caché local (TTL corto) -> caché externa ->
 *    recomputación desde datos crudos recientes.
 * 2. ADVISORY MISSES: Un miss de caché JAMÁS falla la predicción si la
 *    recomputación cabe en el presupuesto; agotado el deadline, la
 *    respuesta degrada con imputación neutra.
 * 3. DEADLINE DISCIPLINE: El presupuesto por solicitud deriva del p99
 *    menos la reserva fija de scoring.
 * =================================================================
 */

use aegis_infra_feature_cache::TtlFeatureCache;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

/// Fuente de features online (caché externa o recomputador).
pub trait OnlineFeatureStore: Send + Sync {
    /// Lote de claves en un solo round-trip; None por clave ausente.
    fn multi_get(&self, feature_keys: &[String]) -> Vec<Option<f64>>;
}

/// Resultado de una resolución por lotes.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedFeatures {
    /// Valores en el orden solicitado (imputación neutra ante degradación).
    pub values: Vec<f64>,
    /// Verdadero si alguna feature degradó a imputación neutra.
    pub degraded: bool,
}

/// Resolutor en capas del plano de servicio.
pub struct FeatureResolver {
    /// Capa 1: caché local de TTL corto.
    local_cache: TtlFeatureCache,
    /// Capa 2: caché externa consultiva.
    external_cache: Option<Arc<dyn OnlineFeatureStore>>,
    /// Capa 3: recomputación desde datos crudos recientes.
    recompute_source: Option<Arc<dyn OnlineFeatureStore>>,
}

impl FeatureResolver {
    /// Forja el resolutor con las capas disponibles.
    pub fn new(
        local_cache: TtlFeatureCache,
        external_cache: Option<Arc<dyn OnlineFeatureStore>>,
        recompute_source: Option<Arc<dyn OnlineFeatureStore>>,
    ) -> Self {
        Self { local_cache, external_cache, recompute_source }
    }

    /**
     * Resuelve un lote de features online para un alcance de usuario.
     *
     * El deadline acota las capas lentas: si ya venció, las features aún
     * ausentes degradan a imputación neutra (0.0) con la bandera en alto.
     */
    pub fn resolve_batch(
        &self,
        user_scope: &str,
        feature_names: &[String],
        deadline: Instant,
    ) -> ResolvedFeatures {
        let scoped_keys: Vec<String> = feature_names
            .iter()
            .map(|feature_name| format!("{}:{}", user_scope, feature_name))
            .collect();

        // --- CAPA 1: CACHÉ LOCAL ---
        let mut resolved = self.local_cache.multi_get(&scoped_keys);

        // --- CAPA 2: CACHÉ EXTERNA (UN SOLO ROUND-TRIP) ---
        if resolved.iter().any(Option::is_none) && Instant::now() < deadline {
            if let Some(external) = &self.external_cache {
                let missing_keys: Vec<String> = scoped_keys
                    .iter()
                    .zip(resolved.iter())
                    .filter(|(_, value)| value.is_none())
                    .map(|(key, _)| key.clone())
                    .collect();

                let external_values = external.multi_get(&missing_keys);
                let mut external_cursor = 0usize;
                for (position, value) in resolved.iter_mut().enumerate() {
                    if value.is_none() {
                        if let Some(found) = external_values[external_cursor] {
                            *value = Some(found);
                            // Promoción hacia la capa local.
                            self.local_cache.put(&scoped_keys[position], found);
                        }
                        external_cursor += 1;
                    }
                }
            }
        }

        // --- CAPA 3: RECOMPUTACIÓN DESDE DATOS CRUDOS ---
        if resolved.iter().any(Option::is_none) && Instant::now() < deadline {
            if let Some(recompute) = &self.recompute_source {
                let missing_keys: Vec<String> = scoped_keys
                    .iter()
                    .zip(resolved.iter())
                    .filter(|(_, value)| value.is_none())
                    .map(|(key, _)| key.clone())
                    .collect();

                let recomputed_values = recompute.multi_get(&missing_keys);
                let mut recompute_cursor = 0usize;
                for (position, value) in resolved.iter_mut().enumerate() {
                    if value.is_none() {
                        if let Some(found) = recomputed_values[recompute_cursor] {
                            *value = Some(found);
                            self.local_cache.put(&scoped_keys[position], found);
                        }
                        recompute_cursor += 1;
                    }
                }
            }
        }

        // --- IMPUTACIÓN NEUTRA ANTE DEGRADACIÓN ---
        let mut degraded = false;
        let values = resolved
            .into_iter()
            .map(|value| {
                value.unwrap_or_else(|| {
                    degraded = true;
                    0.0
                })
            })
            .collect();

        if degraded {
            debug!("🩹 [RESOLVER]: Batch degraded to neutral imputation for scope {}.", user_scope);
        }
        ResolvedFeatures { values, degraded }
    }
}
