// [libs/core/learners/src/seeding.rs]
/*!
 * =================================================================
 * APARATO: DETERMINISTIC SEEDING KERNEL (V20.0 - JOB ANCHORED)
 * CLASIFICACIÓN: CORE LEARNING (ESTRATO L1)
 * RESPONSABILIDAD: DERIVACIÓN DE SEMILLAS DESDE IDENTIFICADORES DE TRABAJO
 *
 * # Mathematical Proof (Reproducibility):
 * Toda fuente de aleatoriedad del pipeline se siembra con los primeros
 * 8 bytes little-endian del UUID del trabajo propietario. Dos ejecuciones
 * del mismo trabajo recorren exactamente la misma secuencia pseudoaleatoria,
 * haciendo la salida bit-reproducible.
 * =================================================================
 */

use uuid::Uuid;

/// Deriva la semilla de 64 bits de un identificador de trabajo.
pub fn derive_seed_from_identifier(job_identifier: Uuid) -> u64 {
    let uuid_bytes = job_identifier.as_bytes();
    let mut seed_bytes = [0u8; 8];
    seed_bytes.copy_from_slice(&uuid_bytes[0..8]);
    u64::from_le_bytes(seed_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certify_seed_is_stable_per_identifier() {
        let identifier = Uuid::parse_str("11111111-1111-1111-1111-111111111111").expect("uuid");
        assert_eq!(
            derive_seed_from_identifier(identifier),
            derive_seed_from_identifier(identifier)
        );
        assert_eq!(derive_seed_from_identifier(identifier), 0x1111_1111_1111_1111);
    }

    #[test]
    fn certify_distinct_identifiers_diverge() {
        let left = Uuid::parse_str("11111111-1111-1111-1111-111111111111").expect("uuid");
        let right = Uuid::parse_str("22222222-2222-2222-2222-222222222222").expect("uuid");
        assert_ne!(derive_seed_from_identifier(left), derive_seed_from_identifier(right));
    }
}
