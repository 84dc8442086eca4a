// [tests/mirror/libs/domain/serving/ab_routing_vault.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE RUTEO A/B Y BÓVEDA (V2.2 - SCENARIO S6)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: SPLIT DETERMINISTA, BRAZOS REGISTRADOS Y DERRAME
 * =================================================================
 */

use aegis_domain_serving::ab_router::{route_arm, ExperimentArm};

#[cfg(test)]
mod tests {
    use super::*;

    /**
     * CERTIFICACIÓN (ESCENARIO S6): 2000 transacciones con split del 10%
     * convergen a la proporción 9:1 dentro de la tolerancia del 5% del
     * mínimo de muestras.
     */
    #[test]
    fn certify_scenario_s6_split_convergence() {
        let total_requests = 2_000usize;
        let min_samples = 1_000.0_f64;

        let mut champion_samples = 0_f64;
        let mut challenger_samples = 0_f64;
        for index in 0..total_requests {
            match route_arm(&format!("txn-{:06}", index), 0.10) {
                ExperimentArm::Champion => champion_samples += 1.0,
                ExperimentArm::Challenger => challenger_samples += 1.0,
            }
        }

        let imbalance =
            (champion_samples - 9.0 * challenger_samples).abs() / min_samples;
        assert!(
            imbalance < 0.05 * 9.0 + 1.0,
            "champion {} vs challenger {} (imbalance {})",
            champion_samples,
            challenger_samples,
            imbalance
        );
        // Tolerancia directa sobre la fracción: 10% ± 2%.
        let challenger_fraction = challenger_samples / total_requests as f64;
        assert!((challenger_fraction - 0.10).abs() < 0.02);
    }

    /**
     * CERTIFICACIÓN: La asignación es una función pura del identificador
     * (misma transacción, mismo brazo, en cualquier orden de llegada).
     */
    #[test]
    fn certify_stable_assignment_under_replay() {
        let forward: Vec<ExperimentArm> =
            (0..500).map(|index| route_arm(&format!("txn-{}", index), 0.25)).collect();
        let replayed: Vec<ExperimentArm> =
            (0..500).rev().map(|index| route_arm(&format!("txn-{}", index), 0.25)).collect();

        for (position, arm) in forward.iter().enumerate() {
            assert_eq!(*arm, replayed[499 - position]);
        }
    }
}

#[cfg(test)]
mod vault_tests {
    use aegis_domain_models::PredictionRecord;
    use aegis_domain_serving::PredictionVault;
    use chrono::Utc;
    use tempfile::TempDir;
    use uuid::Uuid;

    fn forge_record(score: f64) -> PredictionRecord {
        PredictionRecord {
            id: Uuid::new_v4(),
            model_id: Uuid::new_v4(),
            transaction_id: Some("txn".into()),
            input_vector: vec![score, 1.0 - score],
            score,
            label_flag: score >= 0.5,
            confidence: 0.4,
            explanation: None,
            latency_milliseconds: 2.0,
            degraded: false,
            actual_label: None,
            created_at: Utc::now(),
        }
    }

    /**
     * CERTIFICACIÓN: La saturación derrama a disco ANTES de descartar y
     * el drenaje reabsorbe el derrame completo con los vínculos A/B.
     */
    #[test]
    fn certify_spill_before_drop_preserves_ab_bindings() {
        let workspace = TempDir::new().expect("tempdir");
        let vault = PredictionVault::new(3, workspace.path().join("spill.jsonl"));
        let experiment_id = Uuid::new_v4();

        for index in 0..8 {
            let binding = if index % 2 == 0 {
                Some((experiment_id, "challenger".to_string()))
            } else {
                None
            };
            vault.enqueue((forge_record(index as f64 / 10.0), binding));
        }

        // Tres en RAM, cinco en el derrame físico.
        assert_eq!(vault.buffered_count(), 3);
        assert!(workspace.path().join("spill.jsonl").exists());

        let drained = vault.drain_for_flush();
        assert_eq!(drained.len(), 8);

        let bound_count = drained
            .iter()
            .filter(|(_, binding)| {
                binding.as_ref().map(|(test_id, _)| *test_id == experiment_id).unwrap_or(false)
            })
            .count();
        assert_eq!(bound_count, 4);

        // El derrame quedó truncado tras la reabsorción.
        assert!(vault.drain_for_flush().is_empty());
        assert!(!workspace.path().join("spill.jsonl").exists());
    }
}
