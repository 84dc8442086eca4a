// [libs/infra/artifacts/src/errors.rs]
/*!
 * =================================================================
 * APARATO: VAULT ERROR CATALOG (V12.0 - SOBERANO)
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE LA BÓVEDA
 * =================================================================
 */

use thiserror::Error;

/// Fallos de la bóveda de artefactos.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Fallo físico de IO contra el sistema de archivos.
    #[error("[L3_VAULT_IO_FAULT]: STORAGE_UPLINK_SEVERED -> {0}")]
    Io(#[from] std::io::Error),

    /// Intento de sobreescritura sobre una referencia sellada.
    #[error("[L3_VAULT_FAULT]: WRITE_ONCE_VIOLATION -> {0}")]
    AlreadyExists(String),

    /// La referencia solicitada no existe en el estrato físico.
    #[error("[L3_VAULT_FAULT]: REFERENCE_NOT_FOUND -> {0}")]
    NotFound(String),

    /// El digest recomputado no coincide con el sellado en la escritura.
    #[error("[L3_VAULT_FAULT]: ARTIFACT_CORRUPTED -> reference {reference}, expected {expected}, observed {observed}")]
    ArtifactCorrupted {
        /// Referencia afectada.
        reference: String,
        /// Digest sellado en la escritura.
        expected: String,
        /// Digest recomputado en la lectura.
        observed: String,
    },

    /// La referencia no respeta el formato 'namespace/uuid'.
    #[error("[L3_VAULT_FAULT]: MALFORMED_REFERENCE -> {0}")]
    MalformedReference(String),
}
