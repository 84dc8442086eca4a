// [libs/domain/serving/src/vault.rs]
/*!
 * =================================================================
 * APARATO: PREDICTION VAULT (V22.3 - SPILL BEFORE DROP)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: BÓVEDA DE TRÁNSITO DE PREDICCIONES CON DERRAME
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. NON-BLOCKING HOT PATH: El encolado jamás bloquea el scoring; el
 *    Flusher drena en ráfagas por fuera del presupuesto p99.
 * 2. SPILL BEFORE DROP: Ante saturación del buffer, los registros se
 *    derraman a JSONL local ANTES de descartar; la pérdida de log es
 *    tolerable, el descarte silencioso no.
 * 3. REPLAY ON DRAIN: El drenaje reabsorbe el derrame pendiente, de modo
 *    que una saturación transitoria no pierde rastro.
 * =================================================================
 */

use aegis_domain_models::PredictionRecord;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, warn};
use uuid::Uuid;

/// Capacidad nominal del buffer en RAM.
pub const DEFAULT_VAULT_CAPACITY: usize = 8_192;

/// Entrada de la bóveda: predicción + vínculo A/B opcional.
pub type VaultEntry = (PredictionRecord, Option<(Uuid, String)>);

/// Bóveda de tránsito para el log durable de predicciones.
pub struct PredictionVault {
    buffer: Mutex<Vec<VaultEntry>>,
    capacity: usize,
    spill_file_path: PathBuf,
}

impl PredictionVault {
    /// Forja la bóveda con capacidad y archivo de derrame explícitos.
    pub fn new(capacity: usize, spill_file_path: PathBuf) -> Self {
        Self {
            buffer: Mutex::new(Vec::with_capacity(capacity.min(1024))),
            capacity: capacity.max(1),
            spill_file_path,
        }
    }

    /**
     * Encola una predicción sin bloquear el hot path.
     *
     * Ante buffer saturado, el registro se derrama a disco; si el derrame
     * también falla, el registro se pierde con rastro forense.
     */
    pub fn enqueue(&self, entry: VaultEntry) {
        let mut buffer_guard = match self.buffer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if buffer_guard.len() < self.capacity {
            buffer_guard.push(entry);
            return;
        }
        drop(buffer_guard);

        // Derrame a disco antes de descartar.
        if let Err(spill_fault) = self.spill_to_disk(&entry) {
            warn!("💧 [VAULT]: Spill failed, prediction trace lost: {}", spill_fault);
        }
    }

    /// Cantidad de entradas vivas en RAM.
    pub fn buffered_count(&self) -> usize {
        match self.buffer.lock() {
            Ok(guard) => guard.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    /**
     * Drena atómicamente el buffer y reabsorbe el derrame pendiente.
     * Consumido por el Flusher en cada ráfaga de persistencia.
     */
    pub fn drain_for_flush(&self) -> Vec<VaultEntry> {
        let mut drained = {
            let mut buffer_guard = match self.buffer.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            std::mem::take(&mut *buffer_guard)
        };

        // Reabsorción del derrame (si existe).
        match self.replay_spill() {
            Ok(mut replayed) if !replayed.is_empty() => {
                debug!("💾 [VAULT]: Replayed {} spilled records.", replayed.len());
                drained.append(&mut replayed);
            }
            Ok(_) => {}
            Err(replay_fault) => {
                warn!("💧 [VAULT]: Spill replay failed: {}", replay_fault);
            }
        }

        drained
    }

    /// Derrama una entrada individual como línea JSON.
    fn spill_to_disk(&self, entry: &VaultEntry) -> std::io::Result<()> {
        let serialized = serde_json::to_string(entry)
            .map_err(|fault| std::io::Error::new(std::io::ErrorKind::InvalidData, fault))?;
        let mut spill_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.spill_file_path)?;
        writeln!(spill_file, "{}", serialized)?;
        Ok(())
    }

    /// Reabsorbe y trunca el archivo de derrame.
    fn replay_spill(&self) -> std::io::Result<Vec<VaultEntry>> {
        if !self.spill_file_path.exists() {
            return Ok(Vec::new());
        }

        let spill_file = File::open(&self.spill_file_path)?;
        let mut replayed = Vec::new();
        for line in BufReader::new(spill_file).lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<VaultEntry>(&line) {
                Ok(entry) => replayed.push(entry),
                Err(decode_fault) => {
                    warn!("💧 [VAULT]: Discarding undecodable spill line: {}", decode_fault);
                }
            }
        }

        std::fs::remove_file(&self.spill_file_path)?;
        Ok(replayed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn forge_record() -> PredictionRecord {
        PredictionRecord {
            id: Uuid::new_v4(),
            model_id: Uuid::new_v4(),
            transaction_id: Some("tx".into()),
            input_vector: vec![1.0, 2.0],
            score: 0.8,
            label_flag: true,
            confidence: 0.6,
            explanation: None,
            latency_milliseconds: 3.5,
            degraded: false,
            actual_label: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn certify_enqueue_and_drain() {
        let workspace = TempDir::new().expect("tempdir");
        let vault = PredictionVault::new(10, workspace.path().join("spill.jsonl"));

        vault.enqueue((forge_record(), None));
        vault.enqueue((forge_record(), Some((Uuid::new_v4(), "challenger".into()))));
        assert_eq!(vault.buffered_count(), 2);

        let drained = vault.drain_for_flush();
        assert_eq!(drained.len(), 2);
        assert_eq!(vault.buffered_count(), 0);
    }

    #[test]
    fn certify_spill_before_drop_and_replay() {
        let workspace = TempDir::new().expect("tempdir");
        let vault = PredictionVault::new(2, workspace.path().join("spill.jsonl"));

        // Saturación: las entradas 3 y 4 derraman a disco.
        for _ in 0..4 {
            vault.enqueue((forge_record(), None));
        }
        assert_eq!(vault.buffered_count(), 2);

        let drained = vault.drain_for_flush();
        assert_eq!(drained.len(), 4, "spilled records must be replayed on drain");

        // El derrame quedó truncado tras la reabsorción.
        let empty_drain = vault.drain_for_flush();
        assert!(empty_drain.is_empty());
    }
}
