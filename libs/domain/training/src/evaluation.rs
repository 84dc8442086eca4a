// [libs/domain/training/src/evaluation.rs]
/*!
 * =================================================================
 * APARATO: EVALUATION KERNEL (V18.2 - THRESHOLD METRICS)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: MÉTRICAS DE CLASIFICACIÓN SOBRE EL SPLIT DE PRUEBA
 *
 * # Mathematical Proof (Rank AUC):
 * El AUC se computa por el estadístico de Mann-Whitney con rangos
 * promediados ante empates: AUC = (R⁺ − n⁺(n⁺+1)/2) / (n⁺ · n⁻), un
 * estimador exacto del área bajo la curva ROC empírica.
 * =================================================================
 */

use crate::errors::TrainingError;
use aegis_domain_models::ModelMetrics;

/// Resultado completo de una evaluación.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationOutcome {
    /// Métricas selladas al umbral de decisión.
    pub metrics: ModelMetrics,
    /// Matriz de confusión (tp, fp, tn, fn) al umbral.
    pub confusion: (u64, u64, u64, u64),
}

/**
 * Evalúa scores contra etiquetas al umbral de decisión dado.
 *
 * # Errors:
 * - `Internal` ante longitudes desalineadas.
 * - `AlgorithmRejected` si el split de prueba carece de ambas clases
 *   (el modelo no puede certificar métricas completas).
 */
pub fn evaluate_scores(
    scores: &[f64],
    labels: &[bool],
    decision_threshold: f64,
) -> Result<EvaluationOutcome, TrainingError> {
    if scores.len() != labels.len() {
        return Err(TrainingError::Internal(format!(
            "scores/labels misaligned: {} vs {}",
            scores.len(),
            labels.len()
        )));
    }
    if scores.is_empty() {
        return Err(TrainingError::AlgorithmRejected("empty evaluation split".into()));
    }

    let positive_count = labels.iter().filter(|label| **label).count() as u64;
    let negative_count = labels.len() as u64 - positive_count;
    if positive_count == 0 || negative_count == 0 {
        return Err(TrainingError::AlgorithmRejected(
            "evaluation split must contain both classes".into(),
        ));
    }

    // --- MÉTRICAS AL UMBRAL ---
    let mut true_positives = 0u64;
    let mut false_positives = 0u64;
    let mut true_negatives = 0u64;
    let mut false_negatives = 0u64;

    for (score, label) in scores.iter().zip(labels.iter()) {
        let predicted_positive = *score >= decision_threshold;
        match (predicted_positive, *label) {
            (true, true) => true_positives += 1,
            (true, false) => false_positives += 1,
            (false, false) => true_negatives += 1,
            (false, true) => false_negatives += 1,
        }
    }

    let precision = if true_positives + false_positives > 0 {
        true_positives as f64 / (true_positives + false_positives) as f64
    } else {
        0.0
    };
    let recall = true_positives as f64 / positive_count as f64;
    let f1_score = if precision + recall > f64::EPSILON {
        2.0 * precision * recall / (precision + recall)
    } else {
        0.0
    };
    let false_positive_rate = false_positives as f64 / negative_count as f64;

    // --- AUC POR RANGOS (MANN-WHITNEY, EMPATES PROMEDIADOS) ---
    let mut indexed_scores: Vec<(f64, bool)> =
        scores.iter().copied().zip(labels.iter().copied()).collect();
    indexed_scores.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut positive_rank_sum = 0.0_f64;
    let mut cursor = 0usize;
    while cursor < indexed_scores.len() {
        let mut tie_end = cursor;
        while tie_end + 1 < indexed_scores.len()
            && (indexed_scores[tie_end + 1].0 - indexed_scores[cursor].0).abs() < f64::EPSILON
        {
            tie_end += 1;
        }
        // Rango promediado del bloque de empates [cursor, tie_end].
        let averaged_rank = (cursor + tie_end + 2) as f64 / 2.0;
        for entry in &indexed_scores[cursor..=tie_end] {
            if entry.1 {
                positive_rank_sum += averaged_rank;
            }
        }
        cursor = tie_end + 1;
    }

    let auc_roc = (positive_rank_sum
        - positive_count as f64 * (positive_count as f64 + 1.0) / 2.0)
        / (positive_count as f64 * negative_count as f64);

    Ok(EvaluationOutcome {
        metrics: ModelMetrics {
            precision,
            recall,
            f1_score,
            auc_roc,
            false_positive_rate,
            decision_threshold,
        },
        confusion: (true_positives, false_positives, true_negatives, false_negatives),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn certify_perfect_separation() {
        let scores = [0.1, 0.2, 0.3, 0.8, 0.9, 0.95];
        let labels = [false, false, false, true, true, true];
        let outcome = evaluate_scores(&scores, &labels, 0.5).expect("evaluate");

        assert!((outcome.metrics.precision - 1.0).abs() < 1e-12);
        assert!((outcome.metrics.recall - 1.0).abs() < 1e-12);
        assert!((outcome.metrics.f1_score - 1.0).abs() < 1e-12);
        assert!((outcome.metrics.auc_roc - 1.0).abs() < 1e-12);
        assert!(outcome.metrics.false_positive_rate.abs() < 1e-12);
    }

    #[test]
    fn certify_random_scores_auc_near_half() {
        // Scores idénticos: AUC degenera exactamente a 0.5 por empates.
        let scores = vec![0.5_f64; 100];
        let labels: Vec<bool> = (0..100).map(|index| index % 2 == 0).collect();
        let outcome = evaluate_scores(&scores, &labels, 0.5).expect("evaluate");
        assert!((outcome.metrics.auc_roc - 0.5).abs() < 1e-9);
    }

    #[test]
    fn certify_single_class_rejected() {
        let scores = [0.4, 0.6];
        let labels = [true, true];
        assert!(matches!(
            evaluate_scores(&scores, &labels, 0.5),
            Err(TrainingError::AlgorithmRejected(_))
        ));
    }

    #[test]
    fn certify_threshold_shifts_fpr() {
        let scores = [0.3, 0.55, 0.6, 0.9];
        let labels = [false, false, true, true];

        let strict = evaluate_scores(&scores, &labels, 0.7).expect("evaluate");
        let loose = evaluate_scores(&scores, &labels, 0.5).expect("evaluate");
        assert!(strict.metrics.false_positive_rate <= loose.metrics.false_positive_rate);
        assert!(strict.metrics.recall <= loose.metrics.recall);
    }
}
