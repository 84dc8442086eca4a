// [libs/domain/feature-forge/src/families/behavioral.rs]
/*!
 * =================================================================
 * APARATO: BEHAVIORAL FEATURE FAMILY (V25.1 - LEAKAGE SHIELD)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: AGREGADOS HISTÓRICOS POR USUARIO
 *
 * # Mathematical Proof (Temporal Causality):
 * Cada feature de la fila i usa EXCLUSIVAMENTE transacciones del mismo
 * usuario estrictamente anteriores al evento i. El estimador es causal:
 * ninguna información futura contamina el contrato de entrenamiento.
 * =================================================================
 */

use crate::records::TransactionRecord;
use aegis_core_learners::FeatureColumn;
use std::collections::HashMap;

use super::forge_typed_column;

/// Computa la familia conductual completa.
pub fn compute(records: &[TransactionRecord]) -> Vec<FeatureColumn> {
    let row_count = records.len();

    // Índices por usuario ordenados por tiempo de evento.
    let mut rows_by_user: HashMap<&str, Vec<usize>> = HashMap::new();
    for (row_index, record) in records.iter().enumerate() {
        rows_by_user.entry(record.user_id.as_str()).or_default().push(row_index);
    }
    for user_rows in rows_by_user.values_mut() {
        user_rows.sort_by_key(|row_index| records[*row_index].event_time);
    }

    let mut prior_count = vec![0.0_f64; row_count];
    let mut prior_mean_amount = vec![0.0_f64; row_count];
    let mut amount_over_mean_ratio = vec![1.0_f64; row_count];

    for user_rows in rows_by_user.values() {
        let mut running_sum = 0.0_f64;
        for (position, row_index) in user_rows.iter().enumerate() {
            let record = &records[*row_index];
            if position > 0 {
                let mean = running_sum / position as f64;
                prior_count[*row_index] = position as f64;
                prior_mean_amount[*row_index] = mean;
                amount_over_mean_ratio[*row_index] =
                    if mean > f64::EPSILON { record.amount / mean } else { 1.0 };
            }
            running_sum += record.amount;
        }
    }

    vec![
        forge_typed_column("user_prior_txn_count".into(), prior_count),
        forge_typed_column("user_prior_amount_mean".into(), prior_mean_amount),
        forge_typed_column("user_amount_over_mean_ratio".into(), amount_over_mean_ratio),
    ]
}
