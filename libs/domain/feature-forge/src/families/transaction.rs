// [libs/domain/feature-forge/src/families/transaction.rs]
/*!
 * =================================================================
 * APARATO: TRANSACTION FEATURE FAMILY (V25.2 - ONE-HOT SEALED)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: FEATURES DE LA TRANSACCIÓN INDIVIDUAL
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. DETERMINISTIC ONE-HOTS: Las categorías codificadas se ordenan por
 *    frecuencia descendente con desempate alfabético, acotadas al tope
 *    nominal; el orden de columnas resultante es una función pura del
 *    dataset.
 * 2. GLOBAL STANDARDIZATION: El z-score del monto usa media y desviación
 *    del dataset completo, selladas luego como referencia de deriva.
 * =================================================================
 */

use crate::records::TransactionRecord;
use aegis_core_learners::FeatureColumn;
use aegis_core_stats::{quantile, sample_mean, sample_standard_deviation};
use std::collections::HashMap;

use super::forge_typed_column;

/// Tope de categorías one-hot por columna categórica.
const ONE_HOT_CATEGORY_CAP: usize = 8;
/// Cuantil que define el umbral de monto alto.
const HIGH_VALUE_QUANTILE: f64 = 0.95;

/// Computa la familia transaccional completa.
pub fn compute(records: &[TransactionRecord]) -> Vec<FeatureColumn> {
    let amounts: Vec<f64> = records.iter().map(|record| record.amount).collect();

    let amount_mean = sample_mean(&amounts).unwrap_or(0.0);
    let amount_deviation = sample_standard_deviation(&amounts).unwrap_or(0.0);
    let high_value_threshold = quantile(&amounts, HIGH_VALUE_QUANTILE).unwrap_or(f64::INFINITY);

    let mut columns = vec![
        forge_typed_column("amount".into(), amounts.clone()),
        forge_typed_column(
            "amount_log".into(),
            amounts.iter().map(|amount| (1.0 + amount.abs()).ln()).collect(),
        ),
        forge_typed_column(
            "amount_zscore".into(),
            amounts
                .iter()
                .map(|amount| {
                    if amount_deviation > f64::EPSILON {
                        (amount - amount_mean) / amount_deviation
                    } else {
                        0.0
                    }
                })
                .collect(),
        ),
        forge_typed_column(
            "amount_round_flag".into(),
            amounts
                .iter()
                .map(|amount| f64::from(amount.fract().abs() < 1e-9 && *amount >= 10.0))
                .collect(),
        ),
        forge_typed_column(
            "high_value_flag".into(),
            amounts.iter().map(|amount| f64::from(*amount >= high_value_threshold)).collect(),
        ),
        forge_typed_column(
            "is_international".into(),
            records.iter().map(|record| f64::from(record.is_international)).collect(),
        ),
    ];

    columns.extend(one_hot_family("merchant", records, |record| &record.merchant_category));
    columns.extend(one_hot_family("payment", records, |record| &record.payment_method));
    columns.extend(one_hot_family("device", records, |record| &record.device_type));

    columns
}

/// One-hots deterministas de una columna categórica.
fn one_hot_family<SelectorFn>(
    prefix: &str,
    records: &[TransactionRecord],
    selector: SelectorFn,
) -> Vec<FeatureColumn>
where
    SelectorFn: Fn(&TransactionRecord) -> &String,
{
    let mut frequency_by_category: HashMap<&str, usize> = HashMap::new();
    for record in records {
        *frequency_by_category.entry(selector(record).as_str()).or_insert(0) += 1;
    }

    // Orden determinista: frecuencia descendente, desempate alfabético.
    let mut ranked_categories: Vec<(&str, usize)> = frequency_by_category.into_iter().collect();
    ranked_categories.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked_categories.truncate(ONE_HOT_CATEGORY_CAP);

    ranked_categories
        .into_iter()
        .map(|(category, _)| {
            let values = records
                .iter()
                .map(|record| f64::from(selector(record).as_str() == category))
                .collect();
            forge_typed_column(format!("{}_{}", prefix, sanitize(category)), values)
        })
        .collect()
}

/// Normaliza la categoría hacia un sufijo de columna seguro.
fn sanitize(category: &str) -> String {
    category
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch.to_ascii_lowercase() } else { '_' })
        .collect()
}
