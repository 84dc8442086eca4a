// [libs/domain/feature-forge/src/calendar.rs]
/*!
 * =================================================================
 * APARATO: HOLIDAY CALENDAR INTERFACE (V25.0 - INJECTED LOOKUP)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: FUENTE INYECTABLE DE FESTIVOS PARA FEATURES TEMPORALES
 * =================================================================
 */

use chrono::{DateTime, Datelike, Utc};
use std::collections::HashSet;

/// Fuente de verdad inyectable de días festivos.
pub trait HolidayCalendar: Send + Sync {
    /// Verdadero si la fecha (mes, día) cae en festivo.
    fn is_holiday(&self, moment: DateTime<Utc>) -> bool;
}

/// Calendario de fechas fijas (mes, día), independiente del año.
pub struct FixedDateHolidayCalendar {
    fixed_dates: HashSet<(u32, u32)>,
}

impl FixedDateHolidayCalendar {
    /// Forja un calendario con fechas (mes, día) explícitas.
    pub fn new(fixed_dates: &[(u32, u32)]) -> Self {
        Self { fixed_dates: fixed_dates.iter().copied().collect() }
    }

    /// Perfil nominal occidental: año nuevo, navidad y víspera.
    pub fn with_nominal_profile() -> Self {
        Self::new(&[(1, 1), (12, 24), (12, 25), (12, 31)])
    }
}

impl HolidayCalendar for FixedDateHolidayCalendar {
    fn is_holiday(&self, moment: DateTime<Utc>) -> bool {
        self.fixed_dates.contains(&(moment.month(), moment.day()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn certify_nominal_profile_dates() {
        let calendar = FixedDateHolidayCalendar::with_nominal_profile();
        let christmas = Utc.with_ymd_and_hms(2026, 12, 25, 12, 0, 0).unwrap();
        let ordinary = Utc.with_ymd_and_hms(2026, 3, 17, 12, 0, 0).unwrap();
        assert!(calendar.is_holiday(christmas));
        assert!(!calendar.is_holiday(ordinary));
    }
}
