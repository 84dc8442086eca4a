// [libs/domain/feature-forge/src/families/temporal.rs]
/*!
 * =================================================================
 * APARATO: TEMPORAL FEATURE FAMILY (V25.1 - UTC ANCHORED)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: SEÑALES DE CALENDARIO Y RELOJ EN UTC
 * =================================================================
 */

use crate::calendar::HolidayCalendar;
use crate::records::TransactionRecord;
use aegis_core_learners::FeatureColumn;
use chrono::{Datelike, Timelike};
use std::collections::HashMap;

use super::forge_typed_column;

/// Tope del intervalo entre transacciones (30 días en segundos).
const TIME_SINCE_LAST_CAP_SECONDS: f64 = 30.0 * 24.0 * 3600.0;

/// Computa la familia temporal completa.
pub fn compute(
    records: &[TransactionRecord],
    holiday_calendar: &dyn HolidayCalendar,
) -> Vec<FeatureColumn> {
    let row_count = records.len();

    let mut hour_of_day = Vec::with_capacity(row_count);
    let mut day_of_week = Vec::with_capacity(row_count);
    let mut weekend_flag = Vec::with_capacity(row_count);
    let mut night_flag = Vec::with_capacity(row_count);
    let mut holiday_flag = Vec::with_capacity(row_count);
    let mut account_age_days = Vec::with_capacity(row_count);

    for record in records {
        let hour = record.event_time.hour();
        let weekday = record.event_time.weekday().num_days_from_monday();

        hour_of_day.push(hour as f64);
        day_of_week.push(weekday as f64);
        weekend_flag.push(f64::from(weekday >= 5));
        night_flag.push(f64::from(hour < 6 || hour >= 22));
        holiday_flag.push(f64::from(holiday_calendar.is_holiday(record.event_time)));
        account_age_days.push(
            record
                .account_created_at
                .map(|created| {
                    ((record.event_time - created).num_seconds() as f64 / 86_400.0).max(0.0)
                })
                .unwrap_or(0.0),
        );
    }

    // Intervalo desde la última transacción del mismo usuario (causal).
    let mut rows_by_user: HashMap<&str, Vec<usize>> = HashMap::new();
    for (row_index, record) in records.iter().enumerate() {
        rows_by_user.entry(record.user_id.as_str()).or_default().push(row_index);
    }

    let mut seconds_since_last = vec![TIME_SINCE_LAST_CAP_SECONDS; row_count];
    for user_rows in rows_by_user.values_mut() {
        user_rows.sort_by_key(|row_index| records[*row_index].event_time);
        for window in user_rows.windows(2) {
            let previous = &records[window[0]];
            let current = &records[window[1]];
            let delta = (current.event_time - previous.event_time).num_seconds() as f64;
            seconds_since_last[window[1]] = delta.clamp(0.0, TIME_SINCE_LAST_CAP_SECONDS);
        }
    }

    vec![
        forge_typed_column("hour_of_day".into(), hour_of_day),
        forge_typed_column("day_of_week".into(), day_of_week),
        forge_typed_column("weekend_flag".into(), weekend_flag),
        forge_typed_column("night_flag".into(), night_flag),
        forge_typed_column("holiday_flag".into(), holiday_flag),
        forge_typed_column("account_age_days".into(), account_age_days),
        forge_typed_column("seconds_since_last_txn".into(), seconds_since_last),
    ]
}
