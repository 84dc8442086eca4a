// [tests/mirror/libs/domain/feature_forge/pipeline_determinism.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE DETERMINISMO DE LA FORJA (V2.2 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: HASH ESTABLE, SELECCIÓN ACOTADA Y FRONTERAS DE FALLA
 * =================================================================
 */

use aegis_domain_features::{
    parse_transaction_csv, records_to_csv, FeatureForgePipeline, FixedDateHolidayCalendar,
    ForgeError, TransactionRecord,
};
use aegis_domain_models::FeatureConfig;
use chrono::{Duration, TimeZone, Utc};

/// Corpus sintético determinista con firma de fraude aprendible.
fn forge_corpus(row_count: usize) -> Vec<TransactionRecord> {
    let origin = Utc.with_ymd_and_hms(2026, 2, 1, 0, 0, 0).unwrap();
    (0..row_count)
        .map(|index| {
            let is_fraud = index % 20 == 0;
            TransactionRecord {
                transaction_id: format!("txn-{:06}", index),
                user_id: format!("user-{:04}", index % 53),
                amount: if is_fraud {
                    2_500.0 + (index % 11) as f64 * 300.0
                } else {
                    15.0 + (index % 120) as f64
                },
                event_time: origin + Duration::minutes(index as i64 * 7),
                merchant_category: ["grocery", "travel", "jewelry", "fuel"][index % 4].into(),
                payment_method: ["card", "wire", "wallet"][index % 3].into(),
                device_type: ["mobile", "desktop"][index % 2].into(),
                is_international: is_fraud && index % 3 == 0,
                account_created_at: Some(origin - Duration::days(100 + (index % 400) as i64)),
                customer_segment: Some(["retail", "premium"][index % 2].into()),
                is_fraud,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    /**
     * CERTIFICACIÓN: Dos corridas con bytes idénticos y config idéntica
     * producen schema hash idéntico y matrices bit-idénticas, incluso a
     * través del roundtrip CSV del linaje.
     */
    #[test]
    fn certify_hash_stability_through_csv_roundtrip() {
        let records = forge_corpus(1200);
        let config = FeatureConfig::default();
        let calendar = FixedDateHolidayCalendar::with_nominal_profile();

        let direct = FeatureForgePipeline::execute(&records, &config, &calendar, 77, || false)
            .expect("forge")
            .expect("not cancelled");

        // Roundtrip por el codec de linaje: CSV -> filas -> forja.
        let csv_bytes = records_to_csv(&records).expect("csv");
        let replayed_records = parse_transaction_csv(&csv_bytes).expect("parse");
        let replayed =
            FeatureForgePipeline::execute(&replayed_records, &config, &calendar, 77, || false)
                .expect("forge")
                .expect("not cancelled");

        assert_eq!(direct.schema_hash, replayed.schema_hash);
        assert_eq!(
            direct.selected_matrix.to_artifact_bytes().expect("encode"),
            replayed.selected_matrix.to_artifact_bytes().expect("encode")
        );
    }

    /**
     * CERTIFICACIÓN: El subconjunto final respeta el tope configurado y
     * registra los puntajes de las cuatro etapas.
     */
    #[test]
    fn certify_selection_bounds_and_score_trail() {
        let records = forge_corpus(1500);
        let config = FeatureConfig::default();
        let calendar = FixedDateHolidayCalendar::with_nominal_profile();

        let product = FeatureForgePipeline::execute(&records, &config, &calendar, 5, || false)
            .expect("forge")
            .expect("not cancelled");

        let selected = &product.selection.selected_features;
        assert!(!selected.is_empty());
        assert!(selected.len() <= config.max_features as usize);
        assert!(product.generated_feature_names.len() >= selected.len());

        for feature in selected {
            assert!(
                feature.variance_score >= config.variance_threshold,
                "stage 1 survivor {} with variance {}",
                feature.name,
                feature.variance_score
            );
            assert!(feature.combined_rank_score >= 1.0);
            assert!(feature.mutual_information_score >= 0.0);
        }

        // La matriz proyectada honra el orden del contrato.
        let matrix_names = product.selected_matrix.column_names();
        let contract_names: Vec<String> =
            selected.iter().map(|feature| feature.name.clone()).collect();
        assert_eq!(matrix_names, contract_names);
    }

    /**
     * CERTIFICACIÓN: Config distinta que preserva el esquema ordenado
     * preserva el hash (el digest depende del contrato, no de la config).
     */
    #[test]
    fn certify_hash_depends_on_schema_not_config() {
        let records = forge_corpus(1000);
        let calendar = FixedDateHolidayCalendar::with_nominal_profile();

        let nominal = FeatureForgePipeline::execute(
            &records,
            &FeatureConfig::default(),
            &calendar,
            9,
            || false,
        )
        .expect("forge")
        .expect("not cancelled");

        // Variación inocua de configuración: mismo espacio de features.
        let mut tweaked_config = FeatureConfig::default();
        tweaked_config.mutual_information_neighbors = 7;

        let tweaked =
            FeatureForgePipeline::execute(&records, &tweaked_config, &calendar, 9, || false)
                .expect("forge")
                .expect("not cancelled");

        if nominal.selection.selected_features.iter().map(|f| &f.name).collect::<Vec<_>>()
            == tweaked.selection.selected_features.iter().map(|f| &f.name).collect::<Vec<_>>()
        {
            assert_eq!(nominal.schema_hash, tweaked.schema_hash);
        }
    }

    /**
     * CERTIFICACIÓN: Corpus vacío rechazado con Validation antes de la
     * etapa 1 (jamás un artefacto nulo).
     */
    #[test]
    fn certify_empty_corpus_validation() {
        let calendar = FixedDateHolidayCalendar::with_nominal_profile();
        let outcome = FeatureForgePipeline::execute(
            &[],
            &FeatureConfig::default(),
            &calendar,
            1,
            || false,
        );
        assert!(matches!(outcome, Err(ForgeError::Validation(_))));
    }
}
