// [libs/infra/catalog/src/retry.rs]
/*!
 * =================================================================
 * APARATO: BACKOFF RETRY KERNEL (V40.0 - CAPPED EXPONENTIAL)
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: REINTENTO ACOTADO ANTE UPSTREAM INALCANZABLE
 *
 * # Mathematical Proof (Bounded Wait):
 * La espera acumulada máxima es Σ min(base · 2^i, cap) para i < attempts,
 * acotada por attempts × cap = 50 s con el perfil nominal, garantizando
 * que ningún trabajo de fondo quede suspendido sin límite.
 * =================================================================
 */

use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Política de backoff exponencial acotado.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    /// Espera base del primer reintento.
    pub base_delay: Duration,
    /// Factor multiplicativo entre reintentos.
    pub growth_factor: u32,
    /// Techo de espera individual.
    pub delay_cap: Duration,
    /// Intentos totales (incluido el primero).
    pub max_attempts: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        // Perfil nominal: base 100 ms, factor 2, techo 10 s, 5 intentos.
        Self {
            base_delay: Duration::from_millis(100),
            growth_factor: 2,
            delay_cap: Duration::from_secs(10),
            max_attempts: 5,
        }
    }
}

impl BackoffPolicy {
    /// Espera correspondiente al intento fallido número 'attempt' (base 0).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = self.growth_factor.saturating_pow(attempt);
        self.base_delay.saturating_mul(multiplier).min(self.delay_cap)
    }
}

/**
 * Ejecuta una operación asíncrona con reintento acotado.
 *
 * La clausura de elegibilidad decide qué fallos son reintentables
 * (clase UpstreamUnavailable); el resto se propaga de inmediato.
 */
pub async fn retry_with_backoff<OperationFn, FutureT, OkT, ErrT, EligibleFn>(
    policy: BackoffPolicy,
    operation_label: &str,
    mut operation: OperationFn,
    is_retryable: EligibleFn,
) -> Result<OkT, ErrT>
where
    OperationFn: FnMut() -> FutureT,
    FutureT: Future<Output = Result<OkT, ErrT>>,
    ErrT: std::fmt::Display,
    EligibleFn: Fn(&ErrT) -> bool,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(outcome) => return Ok(outcome),
            Err(fault) => {
                attempt += 1;
                if attempt >= policy.max_attempts || !is_retryable(&fault) {
                    return Err(fault);
                }
                let delay = policy.delay_for_attempt(attempt - 1);
                warn!(
                    "🔁 [BACKOFF]: Operation [{}] failed (attempt {}/{}): {}. Retrying in {:?}.",
                    operation_label, attempt, policy.max_attempts, fault, delay
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certify_delay_progression_is_capped() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_for_attempt(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(400));
        // El techo de 10 s domina a partir del séptimo reintento.
        assert_eq!(policy.delay_for_attempt(10), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn certify_retry_until_success() {
        let mut remaining_failures = 2u32;
        let outcome: Result<u32, String> = retry_with_backoff(
            BackoffPolicy {
                base_delay: Duration::from_millis(1),
                growth_factor: 2,
                delay_cap: Duration::from_millis(4),
                max_attempts: 5,
            },
            "probe",
            || {
                let should_fail = remaining_failures > 0;
                if should_fail {
                    remaining_failures -= 1;
                }
                async move {
                    if should_fail {
                        Err("upstream severed".to_string())
                    } else {
                        Ok(7)
                    }
                }
            },
            |_| true,
        )
        .await;
        assert_eq!(outcome, Ok(7));
    }

    #[tokio::test]
    async fn certify_non_retryable_propagates_immediately() {
        let mut observed_attempts = 0u32;
        let outcome: Result<(), String> = retry_with_backoff(
            BackoffPolicy::default(),
            "probe",
            || {
                observed_attempts += 1;
                async { Err("validation rejected".to_string()) }
            },
            |_| false,
        )
        .await;
        assert!(outcome.is_err());
        assert_eq!(observed_attempts, 1);
    }
}
