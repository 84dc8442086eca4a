// [libs/infra/artifacts/src/vault.rs]
/*!
 * =================================================================
 * APARATO: CONTENT-ADDRESSED ARTIFACT VAULT (V13.0 - MMAP STREAMING)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: PERSISTENCIA FÍSICA VERIFICADA DE ARTEFACTOS
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. WRITE-ONCE DISCIPLINE: Escritura a archivo temporal + rename; toda
 *    referencia existente rechaza la sobreescritura.
 * 2. PARANOID READS: Cada lectura recomputa SHA-256 contra el digest
 *    sellado en el sidecar; la discrepancia es ArtifactCorrupted.
 * 3. MMAP WINDOWS: Los modelos mayores que un buffer de RAM se leen por
 *    mapeo de memoria con verificación previa del digest completo.
 *
 * # Mathematical Proof (Content Addressing):
 * El par (referencia, digest) forma el identificador físico del artefacto.
 * La probabilidad de colisión SHA-256 es < 2^-128 para el volumen de la
 * plataforma, por lo que digest distinto implica contenido distinto.
 * =================================================================
 */

use crate::errors::VaultError;
use memmap2::Mmap;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Extensión del sidecar de digest.
const DIGEST_SIDECAR_EXTENSION: &str = "sha256";

/// Espacios de nombres físicos de la bóveda.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactNamespace {
    /// Blobs de datasets crudos.
    Dataset,
    /// Matrices columnar de features.
    Features,
    /// Forma nativa de modelos (bincode).
    ModelNative,
    /// Forma portable de modelos (JSON canónico).
    ModelPortable,
    /// Reportes de comparación y auditoría.
    Report,
}

impl ArtifactNamespace {
    /// Segmento de ruta física del espacio de nombres.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Self::Dataset => "dataset",
            Self::Features => "features",
            Self::ModelNative => "model_native",
            Self::ModelPortable => "model_portable",
            Self::Report => "report",
        }
    }

    /// Resuelve el espacio de nombres desde el segmento textual.
    pub fn from_segment(segment: &str) -> Option<Self> {
        match segment {
            "dataset" => Some(Self::Dataset),
            "features" => Some(Self::Features),
            "model_native" => Some(Self::ModelNative),
            "model_portable" => Some(Self::ModelPortable),
            "report" => Some(Self::Report),
            _ => None,
        }
    }
}

/// Descriptor sellado de un artefacto escrito.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactDescriptor {
    /// Referencia lógica 'namespace/uuid'.
    pub reference: String,
    /// Digest SHA-256 hexadecimal del contenido.
    pub sha256_hexadecimal: String,
    /// Tamaño físico en bytes.
    pub size_bytes: u64,
}

/// Lector verificado respaldado por mapeo de memoria.
pub struct VerifiedArtifactReader {
    memory_map: Mmap,
}

impl VerifiedArtifactReader {
    /// Vista completa de bytes del artefacto verificado.
    pub fn bytes(&self) -> &[u8] {
        &self.memory_map
    }

    /// Ventana acotada para consumo incremental.
    pub fn window(&self, offset: usize, length: usize) -> Option<&[u8]> {
        let end = offset.checked_add(length)?;
        self.memory_map.get(offset..end)
    }

    /// Longitud total en bytes.
    pub fn len(&self) -> usize {
        self.memory_map.len()
    }

    /// Verdadero si el artefacto está vacío.
    pub fn is_empty(&self) -> bool {
        self.memory_map.is_empty()
    }
}

/// Bóveda física respaldada por el sistema de archivos local.
#[derive(Debug, Clone)]
pub struct FilesystemArtifactVault {
    /// Raíz física de todos los espacios de nombres.
    vault_root_directory: PathBuf,
}

impl FilesystemArtifactVault {
    /**
     * Inicializa la bóveda creando los cinco espacios de nombres.
     *
     * # Errors:
     * `Io` si la jerarquía física no puede solidificarse.
     */
    #[instrument(skip(root_directory))]
    pub fn ignite(root_directory: &Path) -> Result<Self, VaultError> {
        for namespace in [
            ArtifactNamespace::Dataset,
            ArtifactNamespace::Features,
            ArtifactNamespace::ModelNative,
            ArtifactNamespace::ModelPortable,
            ArtifactNamespace::Report,
        ] {
            fs::create_dir_all(root_directory.join(namespace.path_segment()))?;
        }
        info!("🏛️  [VAULT]: Artifact strata solidified at {:?}.", root_directory);
        Ok(Self { vault_root_directory: root_directory.to_path_buf() })
    }

    /**
     * Escribe un artefacto nuevo y retorna su descriptor sellado.
     *
     * La escritura es temporal + rename para que ningún lector observe un
     * artefacto a medio cristalizar.
     */
    #[instrument(skip(self, content_bytes), fields(namespace = namespace.path_segment(), size = content_bytes.len()))]
    pub fn put(
        &self,
        namespace: ArtifactNamespace,
        content_bytes: &[u8],
    ) -> Result<ArtifactDescriptor, VaultError> {
        let artifact_identifier = Uuid::new_v4();
        let reference = format!("{}/{}", namespace.path_segment(), artifact_identifier);
        let final_path = self.physical_path(&reference)?;

        if final_path.exists() {
            return Err(VaultError::AlreadyExists(reference));
        }

        let digest_hexadecimal = hex::encode(Sha256::digest(content_bytes));

        // Cristalización atómica: tmp + rename dentro del mismo directorio.
        let temporary_path = final_path.with_extension("tmp");
        {
            let mut temporary_file = fs::File::create(&temporary_path)?;
            temporary_file.write_all(content_bytes)?;
            temporary_file.sync_all()?;
        }
        fs::rename(&temporary_path, &final_path)?;
        fs::write(
            final_path.with_extension(DIGEST_SIDECAR_EXTENSION),
            digest_hexadecimal.as_bytes(),
        )?;

        debug!("💾 [VAULT]: Artifact {} sealed ({} bytes).", reference, content_bytes.len());

        Ok(ArtifactDescriptor {
            reference,
            sha256_hexadecimal: digest_hexadecimal,
            size_bytes: content_bytes.len() as u64,
        })
    }

    /**
     * Lee un artefacto completo verificando su digest.
     *
     * # Errors:
     * `ArtifactCorrupted` si el digest recomputado difiere del sellado.
     */
    #[instrument(skip(self))]
    pub fn get(&self, reference: &str) -> Result<Vec<u8>, VaultError> {
        let physical_path = self.existing_path(reference)?;
        let content_bytes = fs::read(&physical_path)?;

        let expected_digest = self.sealed_digest(reference)?;
        let observed_digest = hex::encode(Sha256::digest(&content_bytes));

        if observed_digest != expected_digest {
            warn!("🔥 [VAULT]: Integrity collapse on {}.", reference);
            return Err(VaultError::ArtifactCorrupted {
                reference: reference.to_string(),
                expected: expected_digest,
                observed: observed_digest,
            });
        }

        Ok(content_bytes)
    }

    /**
     * Abre un lector mmap verificando el digest completo antes de exponer
     * ventanas de lectura.
     */
    #[instrument(skip(self))]
    pub fn open_verified_stream(
        &self,
        reference: &str,
    ) -> Result<VerifiedArtifactReader, VaultError> {
        let physical_path = self.existing_path(reference)?;
        let file_handle = fs::File::open(&physical_path)?;
        // SAFETY contract of memmap2: el archivo es write-once y jamás se
        // muta tras el rename de cristalización.
        let memory_map = unsafe { Mmap::map(&file_handle)? };

        let expected_digest = self.sealed_digest(reference)?;
        let observed_digest = hex::encode(Sha256::digest(&memory_map[..]));
        if observed_digest != expected_digest {
            return Err(VaultError::ArtifactCorrupted {
                reference: reference.to_string(),
                expected: expected_digest,
                observed: observed_digest,
            });
        }

        Ok(VerifiedArtifactReader { memory_map })
    }

    /// Tamaño y digest sin leer el cuerpo del artefacto.
    pub fn stat(&self, reference: &str) -> Result<ArtifactDescriptor, VaultError> {
        let physical_path = self.existing_path(reference)?;
        let metadata = fs::metadata(&physical_path)?;
        Ok(ArtifactDescriptor {
            reference: reference.to_string(),
            sha256_hexadecimal: self.sealed_digest(reference)?,
            size_bytes: metadata.len(),
        })
    }

    /// Elimina el artefacto y su sidecar.
    #[instrument(skip(self))]
    pub fn delete(&self, reference: &str) -> Result<(), VaultError> {
        let physical_path = self.existing_path(reference)?;
        fs::remove_file(&physical_path)?;
        let sidecar_path = physical_path.with_extension(DIGEST_SIDECAR_EXTENSION);
        if sidecar_path.exists() {
            fs::remove_file(sidecar_path)?;
        }
        Ok(())
    }

    /// Digest sellado en el sidecar de la referencia.
    fn sealed_digest(&self, reference: &str) -> Result<String, VaultError> {
        let sidecar_path = self.physical_path(reference)?.with_extension(DIGEST_SIDECAR_EXTENSION);
        if !sidecar_path.exists() {
            return Err(VaultError::NotFound(format!("{} (digest sidecar)", reference)));
        }
        Ok(fs::read_to_string(sidecar_path)?.trim().to_string())
    }

    /// Ruta física validada de una referencia (exista o no).
    fn physical_path(&self, reference: &str) -> Result<PathBuf, VaultError> {
        let mut segments = reference.split('/');
        let namespace_segment = segments
            .next()
            .ok_or_else(|| VaultError::MalformedReference(reference.to_string()))?;
        let identifier_segment = segments
            .next()
            .ok_or_else(|| VaultError::MalformedReference(reference.to_string()))?;

        if segments.next().is_some()
            || ArtifactNamespace::from_segment(namespace_segment).is_none()
            || Uuid::parse_str(identifier_segment).is_err()
        {
            return Err(VaultError::MalformedReference(reference.to_string()));
        }

        Ok(self.vault_root_directory.join(namespace_segment).join(identifier_segment))
    }

    /// Ruta física exigiendo existencia previa.
    fn existing_path(&self, reference: &str) -> Result<PathBuf, VaultError> {
        let physical_path = self.physical_path(reference)?;
        if !physical_path.exists() {
            return Err(VaultError::NotFound(reference.to_string()));
        }
        Ok(physical_path)
    }
}
