// [libs/domain/serving/src/ab_router.rs]
/*!
 * =================================================================
 * APARATO: DETERMINISTIC A/B ROUTER (V22.0 - SIPHASH ARMS)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: ASIGNACIÓN DETERMINISTA DE BRAZO POR TRANSACCIÓN
 *
 * # Mathematical Proof (Stable Assignment):
 * arm(tx) = [SipHash13_k(tx) mod 10000 < split · 10000]. La función es
 * pura sobre el identificador con clave fija, por lo que la misma
 * transacción observa el mismo brazo durante toda la vida del test, y
 * la fracción de retadores converge al split por equidistribución.
 * =================================================================
 */

use siphasher::sip::SipHasher13;
use std::hash::{Hash, Hasher};

/// Resolución del espacio de ruteo (basis points).
const ROUTING_SPACE: u64 = 10_000;
/// Clave fija del hasher de ruteo (estable entre procesos).
const ROUTING_KEY: (u64, u64) = (0x5f3a_91c4_aa12_7703, 0x1d0b_44e9_83c5_2f61);

/// Brazo asignado de un experimento.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExperimentArm {
    /// Modelo en producción defendiendo la corona.
    Champion,
    /// Modelo candidato bajo evaluación.
    Challenger,
}

impl ExperimentArm {
    /// Etiqueta persistida junto a la predicción.
    pub fn canonical_tag(&self) -> &'static str {
        match self {
            Self::Champion => "champion",
            Self::Challenger => "challenger",
        }
    }
}

/// Asigna el brazo de una transacción para un split dado.
pub fn route_arm(transaction_id: &str, traffic_split: f64) -> ExperimentArm {
    let mut hasher = SipHasher13::new_with_keys(ROUTING_KEY.0, ROUTING_KEY.1);
    transaction_id.hash(&mut hasher);
    let bucket = hasher.finish() % ROUTING_SPACE;

    let challenger_buckets = (traffic_split.clamp(0.0, 1.0) * ROUTING_SPACE as f64) as u64;
    if bucket < challenger_buckets {
        ExperimentArm::Challenger
    } else {
        ExperimentArm::Champion
    }
}
