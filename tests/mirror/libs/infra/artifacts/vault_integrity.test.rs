// [tests/mirror/libs/infra/artifacts/vault_integrity.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE LA BÓVEDA DE ARTEFACTOS (V2.0 - TORTURE)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: WRITE-ONCE, VERIFICACIÓN PARANOICA Y STREAMING
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use aegis_infra_artifacts::{ArtifactNamespace, FilesystemArtifactVault, VaultError};
    use tempfile::TempDir;

    /**
     * CERTIFICACIÓN: Ciclo completo put -> stat -> get -> delete sobre
     * los cinco espacios de nombres.
     */
    #[test]
    fn certify_full_lifecycle_across_namespaces() {
        let workspace = TempDir::new().expect("tempdir");
        let vault = FilesystemArtifactVault::ignite(workspace.path()).expect("ignite");

        for namespace in [
            ArtifactNamespace::Dataset,
            ArtifactNamespace::Features,
            ArtifactNamespace::ModelNative,
            ArtifactNamespace::ModelPortable,
            ArtifactNamespace::Report,
        ] {
            let payload = format!("payload for {}", namespace.path_segment()).into_bytes();
            let descriptor = vault.put(namespace, &payload).expect("put");

            let stat = vault.stat(&descriptor.reference).expect("stat");
            assert_eq!(stat.size_bytes, payload.len() as u64);
            assert_eq!(stat.sha256_hexadecimal, descriptor.sha256_hexadecimal);

            assert_eq!(vault.get(&descriptor.reference).expect("get"), payload);

            vault.delete(&descriptor.reference).expect("delete");
            assert!(matches!(vault.get(&descriptor.reference), Err(VaultError::NotFound(_))));
        }
    }

    /**
     * CERTIFICACIÓN: El digest del descriptor es reproducible desde el
     * contenido y distinto para contenidos distintos.
     */
    #[test]
    fn certify_content_addressing() {
        let workspace = TempDir::new().expect("tempdir");
        let vault = FilesystemArtifactVault::ignite(workspace.path()).expect("ignite");

        let first = vault.put(ArtifactNamespace::Report, b"alpha").expect("put");
        let second = vault.put(ArtifactNamespace::Report, b"alpha").expect("put");
        let third = vault.put(ArtifactNamespace::Report, b"beta").expect("put");

        // Mismo contenido, mismo digest; referencias físicas distintas.
        assert_eq!(first.sha256_hexadecimal, second.sha256_hexadecimal);
        assert_ne!(first.reference, second.reference);
        assert_ne!(first.sha256_hexadecimal, third.sha256_hexadecimal);
    }

    /**
     * CERTIFICACIÓN: Sabotaje del sidecar también dispara corrupción.
     */
    #[test]
    fn certify_sidecar_tamper_detection() {
        let workspace = TempDir::new().expect("tempdir");
        let vault = FilesystemArtifactVault::ignite(workspace.path()).expect("ignite");

        let descriptor = vault.put(ArtifactNamespace::ModelNative, b"pristine").expect("put");
        let identifier = descriptor.reference.split('/').nth(1).expect("uuid");
        let sidecar_path = workspace
            .path()
            .join("model_native")
            .join(format!("{}.sha256", identifier));
        std::fs::write(&sidecar_path, "0".repeat(64)).expect("tamper sidecar");

        assert!(matches!(
            vault.get(&descriptor.reference),
            Err(VaultError::ArtifactCorrupted { .. })
        ));
    }

    /**
     * CERTIFICACIÓN: Las ventanas mmap respetan los límites físicos.
     */
    #[test]
    fn certify_streaming_window_bounds() {
        let workspace = TempDir::new().expect("tempdir");
        let vault = FilesystemArtifactVault::ignite(workspace.path()).expect("ignite");

        let payload: Vec<u8> = (0..10_000).map(|index| (index % 251) as u8).collect();
        let descriptor = vault.put(ArtifactNamespace::ModelPortable, &payload).expect("put");

        let reader = vault.open_verified_stream(&descriptor.reference).expect("stream");
        assert_eq!(reader.len(), 10_000);
        assert_eq!(reader.bytes(), &payload[..]);
        assert_eq!(reader.window(0, 100), Some(&payload[0..100]));
        assert_eq!(reader.window(9_900, 100), Some(&payload[9_900..10_000]));
        assert_eq!(reader.window(9_901, 100), None);
        assert_eq!(reader.window(usize::MAX, 1), None);
    }
}
