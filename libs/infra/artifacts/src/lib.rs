// [libs/infra/artifacts/src/lib.rs]
/*!
 * =================================================================
 * APARATO: ARTIFACT VAULT HUB (V12.0 - EXPORTS LEVELED)
 * =================================================================
 */

pub mod errors;
pub mod vault;

// --- RE-EXPORTACIONES SOBERANAS ---

pub use errors::VaultError;
pub use vault::{
    ArtifactDescriptor, ArtifactNamespace, FilesystemArtifactVault, VerifiedArtifactReader,
};
