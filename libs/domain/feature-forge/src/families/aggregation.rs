// [libs/domain/feature-forge/src/families/aggregation.rs]
/*!
 * =================================================================
 * APARATO: AGGREGATION FEATURE FAMILY (V25.2 - ROLLING WINDOWS)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: AGREGADOS SOBRE VENTANAS MÓVILES ANCLADAS AL EVENTO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. EVENT-TIME ANCHORING: Cada ventana (t − w, t) se ancla al tiempo del
 *    evento de la fila, no al reloj de pared del cómputo.
 * 2. TWO-POINTER SWEEP: El barrido por usuario ordenado resuelve todas
 *    las ventanas en O(n · |ventanas|) sin re-escaneo cuadrático.
 * 3. VELOCITY RATIOS: Ratios corto/largo plazo para ráfagas de fraude
 *    (cardado en ráfaga), derivados de las ventanas ya computadas.
 * =================================================================
 */

use crate::records::TransactionRecord;
use aegis_core_learners::FeatureColumn;
use chrono::Duration;
use std::collections::HashMap;

use super::forge_typed_column;

/// Computa la familia de agregación para las ventanas configuradas.
pub fn compute(records: &[TransactionRecord], window_hours: &[u32]) -> Vec<FeatureColumn> {
    let row_count = records.len();

    let mut rows_by_user: HashMap<&str, Vec<usize>> = HashMap::new();
    for (row_index, record) in records.iter().enumerate() {
        rows_by_user.entry(record.user_id.as_str()).or_default().push(row_index);
    }
    for user_rows in rows_by_user.values_mut() {
        user_rows.sort_by_key(|row_index| records[*row_index].event_time);
    }

    let mut columns = Vec::new();
    let mut count_by_window: HashMap<u32, Vec<f64>> = HashMap::new();
    let mut sum_by_window: HashMap<u32, Vec<f64>> = HashMap::new();

    for window in window_hours {
        let window_duration = Duration::hours(*window as i64);
        let mut window_count = vec![0.0_f64; row_count];
        let mut window_sum = vec![0.0_f64; row_count];
        let mut window_max = vec![0.0_f64; row_count];

        for user_rows in rows_by_user.values() {
            // Barrido de dos punteros: [window_start_cursor, position) es la
            // ventana causal (t − w, t) del evento corriente.
            let mut window_start_cursor = 0usize;
            for (position, row_index) in user_rows.iter().enumerate() {
                let current_time = records[*row_index].event_time;
                while window_start_cursor < position
                    && records[user_rows[window_start_cursor]].event_time
                        <= current_time - window_duration
                {
                    window_start_cursor += 1;
                }

                let mut count = 0.0;
                let mut sum = 0.0;
                let mut maximum = 0.0_f64;
                for prior_position in window_start_cursor..position {
                    let prior_amount = records[user_rows[prior_position]].amount;
                    count += 1.0;
                    sum += prior_amount;
                    maximum = maximum.max(prior_amount);
                }

                window_count[*row_index] = count;
                window_sum[*row_index] = sum;
                window_max[*row_index] = maximum;
            }
        }

        columns.push(forge_typed_column(
            format!("user_txn_count_{}h", window),
            window_count.clone(),
        ));
        columns.push(forge_typed_column(
            format!("user_amount_sum_{}h", window),
            window_sum.clone(),
        ));
        columns.push(forge_typed_column(format!("user_amount_max_{}h", window), window_max));

        count_by_window.insert(*window, window_count);
        sum_by_window.insert(*window, window_sum);
    }

    // Ratios de velocidad corto/largo plazo sobre ventanas ya selladas.
    if let (Some(short_count), Some(long_count)) =
        (count_by_window.get(&1), count_by_window.get(&24))
    {
        let velocity: Vec<f64> = short_count
            .iter()
            .zip(long_count.iter())
            .map(|(short, long)| short / long.max(1.0))
            .collect();
        columns.push(forge_typed_column("velocity_count_1h_24h".into(), velocity));
    }
    if let (Some(short_sum), Some(long_sum)) = (sum_by_window.get(&1), sum_by_window.get(&24)) {
        let velocity: Vec<f64> = short_sum
            .iter()
            .zip(long_sum.iter())
            .map(|(short, long)| short / long.max(1.0))
            .collect();
        columns.push(forge_typed_column("velocity_amount_1h_24h".into(), velocity));
    }

    columns
}
