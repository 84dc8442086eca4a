// [libs/domain/monitoring/src/hysteresis.rs]
/*!
 * =================================================================
 * APARATO: STATUS HYSTERESIS KERNEL (V16.0 - TWO WINDOW DISCIPLINE)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: TRANSICIONES DE ESTADO CON HISTÉRESIS DE DOS VENTANAS
 *
 * # Mathematical Proof (Step-Down Discipline):
 * El estado efectivo previo es el MÁXIMO de las dos últimas ventanas
 * computadas: un estado solo desciende tras dos ventanas consecutivas
 * en la banda inferior, eliminando el parpadeo de alertas en la
 * frontera de los umbrales.
 * =================================================================
 */

use aegis_domain_models::MetricStatus;

/// Ventanas consecutivas exigidas antes de descender de banda.
pub const STEP_DOWN_WINDOW_COUNT: usize = 2;

/**
 * Estado efectivo previo de una identidad de métrica.
 *
 * 'recent_statuses' llega del catálogo ordenado del más nuevo al más
 * viejo. Sin historia, el previo efectivo es OK.
 */
pub fn effective_prior_status(recent_statuses: &[MetricStatus]) -> MetricStatus {
    recent_statuses
        .iter()
        .take(STEP_DOWN_WINDOW_COUNT)
        .copied()
        .max()
        .unwrap_or(MetricStatus::Ok)
}

/**
 * Decide la emisión de alerta para una ventana recién computada.
 *
 * Se emite ÚNICAMENTE en la transición OK -> WARNING o en cualquier
 * llegada a CRITICAL desde un previo efectivo no crítico.
 */
pub fn should_emit_alert(computed: MetricStatus, recent_statuses: &[MetricStatus]) -> bool {
    let effective_prior = effective_prior_status(recent_statuses);
    match computed {
        MetricStatus::Ok => false,
        MetricStatus::Warning => effective_prior == MetricStatus::Ok,
        MetricStatus::Critical => effective_prior != MetricStatus::Critical,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MetricStatus::{Critical, Ok, Warning};

    #[test]
    fn certify_escalations_emit_immediately() {
        assert!(should_emit_alert(Warning, &[Ok, Ok]));
        assert!(should_emit_alert(Critical, &[Ok, Ok]));
        assert!(should_emit_alert(Critical, &[Warning, Warning]));
        assert!(should_emit_alert(Critical, &[]));
    }

    #[test]
    fn certify_sustained_states_stay_silent() {
        assert!(!should_emit_alert(Warning, &[Warning, Warning]));
        assert!(!should_emit_alert(Critical, &[Critical, Critical]));
        assert!(!should_emit_alert(Ok, &[Ok, Ok]));
    }

    #[test]
    fn certify_step_down_requires_two_windows() {
        // Una sola ventana OK tras CRITICAL: el previo efectivo sigue CRITICAL.
        assert_eq!(effective_prior_status(&[Ok, Critical]), Critical);
        // Dos ventanas OK consecutivas: el previo efectivo desciende.
        assert_eq!(effective_prior_status(&[Ok, Ok, Critical]), Ok);
        // El parpadeo WARNING/CRITICAL no re-emite al volver a CRITICAL.
        assert!(!should_emit_alert(Critical, &[Critical, Warning]));
    }
}
