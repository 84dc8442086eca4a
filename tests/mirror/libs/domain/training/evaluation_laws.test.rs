// [tests/mirror/libs/domain/training/evaluation_laws.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE LEYES DE EVALUACIÓN (V2.1 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: AUC POR RANGOS, MATRIZ DE CONFUSIÓN Y SPLIT
 * =================================================================
 */

use aegis_core_learners::{FeatureColumn, FeatureMatrix};
use aegis_domain_training::{evaluate_scores, stratified_split};

#[cfg(test)]
mod tests {
    use super::*;

    /**
     * CERTIFICACIÓN: La matriz de confusión cuadra exactamente con las
     * métricas derivadas en un caso de mano.
     */
    #[test]
    fn certify_confusion_arithmetic() {
        // 4 positivos (3 detectados), 6 negativos (1 falso positivo).
        let scores = [0.9, 0.8, 0.7, 0.2, 0.6, 0.3, 0.2, 0.1, 0.4, 0.45];
        let labels = [true, true, true, true, false, false, false, false, false, false];

        let outcome = evaluate_scores(&scores, &labels, 0.5).expect("evaluate");
        let (true_positives, false_positives, true_negatives, false_negatives) =
            outcome.confusion;

        assert_eq!((true_positives, false_positives), (3, 1));
        assert_eq!((true_negatives, false_negatives), (5, 1));
        assert!((outcome.metrics.precision - 0.75).abs() < 1e-12);
        assert!((outcome.metrics.recall - 0.75).abs() < 1e-12);
        assert!((outcome.metrics.false_positive_rate - 1.0 / 6.0).abs() < 1e-12);
    }

    /**
     * CERTIFICACIÓN: El AUC por rangos es invariante ante transformación
     * monótona de los scores.
     */
    #[test]
    fn certify_auc_monotonic_invariance() {
        let scores: Vec<f64> = (0..200).map(|index| index as f64 / 200.0).collect();
        let labels: Vec<bool> = (0..200).map(|index| index >= 120).collect();

        let direct = evaluate_scores(&scores, &labels, 0.5).expect("evaluate");

        // Transformación monótona: sigmoide escalada.
        let warped: Vec<f64> =
            scores.iter().map(|value| 1.0 / (1.0 + (-8.0 * (value - 0.4)).exp())).collect();
        let transformed = evaluate_scores(&warped, &labels, 0.5).expect("evaluate");

        assert!((direct.metrics.auc_roc - transformed.metrics.auc_roc).abs() < 1e-9);
    }

    /**
     * CERTIFICACIÓN: El split estratificado jamás deja una clase vacía
     * en ninguno de los dos lados, incluso con minorías mínimas.
     */
    #[test]
    fn certify_split_never_starves_a_class()  {
        let matrix = FeatureMatrix {
            columns: vec![FeatureColumn {
                name: "x".into(),
                dtype_label: "continuous".into(),
                values: (0..40).map(|index| index as f64).collect(),
            }],
            // Solo 2 positivos sobre 40 filas.
            labels: Some((0..40).map(|index| index < 2).collect()),
        };

        let (train, test) = stratified_split(&matrix, 0.8, 3).expect("split");
        let positives_in = |side: &FeatureMatrix| {
            side.labels.as_ref().expect("labels").iter().filter(|label| **label).count()
        };
        assert_eq!(positives_in(&train) + positives_in(&test), 2);
        assert!(positives_in(&train) >= 1);
        assert!(positives_in(&test) >= 1);
    }

    /**
     * CERTIFICACIÓN: Los splits de dos semillas distintas difieren (la
     * semilla gobierna el barajado).
     */
    #[test]
    fn certify_seed_governs_shuffle() {
        let matrix = FeatureMatrix {
            columns: vec![FeatureColumn {
                name: "x".into(),
                dtype_label: "continuous".into(),
                values: (0..400).map(|index| index as f64).collect(),
            }],
            labels: Some((0..400).map(|index| index % 5 == 0).collect()),
        };

        let (train_a, _) = stratified_split(&matrix, 0.8, 1).expect("split");
        let (train_b, _) = stratified_split(&matrix, 0.8, 2).expect("split");
        assert_ne!(train_a, train_b);
    }
}
