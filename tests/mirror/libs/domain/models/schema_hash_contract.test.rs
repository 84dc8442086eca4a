// [tests/mirror/libs/domain/models/schema_hash_contract.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DEL CONTRATO SCHEMA HASH (V2.1 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: DETERMINISMO Y SENSIBILIDAD DEL DIGEST DE CONTRATO
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use aegis_domain_models::feature::{compute_schema_hash, FeatureDtype};
    use aegis_domain_models::alert::build_alert_dedup_key;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn forge_schema() -> Vec<(String, FeatureDtype)> {
        vec![
            ("amount_zscore".to_string(), FeatureDtype::Continuous),
            ("user_txn_count_24h".to_string(), FeatureDtype::Discrete),
            ("is_international".to_string(), FeatureDtype::Binary),
        ]
    }

    /**
     * CERTIFICACIÓN: Mismo esquema ordenado, mismo digest (siempre).
     */
    #[test]
    fn certify_hash_is_deterministic() {
        assert_eq!(compute_schema_hash(&forge_schema()), compute_schema_hash(&forge_schema()));
        assert_eq!(compute_schema_hash(&forge_schema()).len(), 64);
    }

    /**
     * CERTIFICACIÓN: El digest es sensible al orden, al nombre y al dtype.
     */
    #[test]
    fn certify_hash_sensitivity() {
        let canonical = compute_schema_hash(&forge_schema());

        // Permutación del orden.
        let mut permuted = forge_schema();
        permuted.swap(0, 1);
        assert_ne!(canonical, compute_schema_hash(&permuted));

        // Mutación del dtype.
        let mut retyped = forge_schema();
        retyped[0].1 = FeatureDtype::Discrete;
        assert_ne!(canonical, compute_schema_hash(&retyped));

        // Mutación del nombre.
        let mut renamed = forge_schema();
        renamed[2].0 = "is_domestic".to_string();
        assert_ne!(canonical, compute_schema_hash(&renamed));
    }

    /**
     * CERTIFICACIÓN: La clave de deduplicación colapsa por día UTC.
     */
    #[test]
    fn certify_alert_dedup_key_buckets_by_day() {
        let model_id = Uuid::new_v4();
        let morning = Utc.with_ymd_and_hms(2026, 7, 30, 8, 0, 0).unwrap();
        let evening = Utc.with_ymd_and_hms(2026, 7, 30, 22, 30, 0).unwrap();
        let next_day = Utc.with_ymd_and_hms(2026, 7, 31, 0, 30, 0).unwrap();

        let key_morning =
            build_alert_dedup_key(Some(model_id), "data_drift:amount_zscore", morning);
        let key_evening =
            build_alert_dedup_key(Some(model_id), "data_drift:amount_zscore", evening);
        let key_next_day =
            build_alert_dedup_key(Some(model_id), "data_drift:amount_zscore", next_day);

        assert_eq!(key_morning, key_evening);
        assert_ne!(key_morning, key_next_day);
        assert!(key_morning.contains("data_drift:amount_zscore"));
    }
}
