// [tests/mirror/libs/domain/feature_forge/selection_cascade.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE LA CASCADA DE SELECCIÓN (V2.1 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: ORDEN DE ETAPAS, DESEMPATES Y PODA DETERMINISTA
 * =================================================================
 */

use aegis_core_learners::{FeatureColumn, FeatureMatrix};
use aegis_domain_features::run_selection_cascade;
use aegis_domain_models::FeatureConfig;

/// Matriz de laboratorio con columnas de destino conocido.
fn forge_lab_matrix() -> FeatureMatrix {
    let row_count = 600usize;
    let labels: Vec<bool> = (0..row_count).map(|index| index % 4 == 0).collect();

    let signal: Vec<f64> = labels
        .iter()
        .enumerate()
        .map(|(index, label)| {
            let jitter = (index as f64 * 0.618_033).fract() * 0.3;
            if *label { 9.0 + jitter } else { jitter }
        })
        .collect();
    // Gemela afín de la señal: |r| == 1, debe podarse la de nombre mayor.
    let twin: Vec<f64> = signal.iter().map(|value| value * 0.5 + 3.0).collect();
    let noise: Vec<f64> = (0..row_count).map(|index| (index as f64 * 0.37).fract() * 4.0).collect();
    let frozen = vec![7.77_f64; row_count];
    let binary_flag: Vec<f64> = labels.iter().map(|label| f64::from(*label)).collect();

    FeatureMatrix {
        columns: vec![
            FeatureColumn { name: "a_signal".into(), dtype_label: "continuous".into(), values: signal },
            FeatureColumn { name: "b_signal_twin".into(), dtype_label: "continuous".into(), values: twin },
            FeatureColumn { name: "c_noise".into(), dtype_label: "continuous".into(), values: noise },
            FeatureColumn { name: "d_frozen".into(), dtype_label: "continuous".into(), values: frozen },
            FeatureColumn { name: "e_label_echo".into(), dtype_label: "binary".into(), values: binary_flag },
        ],
        labels: Some(labels),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /**
     * CERTIFICACIÓN: Varianza nula cae en etapa 1, la gemela colineal en
     * etapa 2 (desempate alfabético) y la señal encabeza el rango final.
     */
    #[test]
    fn certify_stage_semantics() {
        let matrix = forge_lab_matrix();
        let outcome =
            run_selection_cascade(&matrix, &FeatureConfig::default(), 13).expect("cascade");
        let names: Vec<&str> =
            outcome.selected_features.iter().map(|feature| feature.name.as_str()).collect();

        assert!(!names.contains(&"d_frozen"), "variance stage must drop the frozen column");
        assert!(
            !names.contains(&"b_signal_twin"),
            "collinearity stage must drop the lexicographically greater twin"
        );
        assert!(names.contains(&"a_signal"));
        assert!(names.contains(&"e_label_echo"));

        // El eco binario de la etiqueta o la señal dominan el rango.
        let leader = &outcome.selected_features[0];
        assert!(
            leader.name == "a_signal" || leader.name == "e_label_echo",
            "unexpected leader {}",
            leader.name
        );
    }

    /**
     * CERTIFICACIÓN: El tope max_features corta la lista ordenada.
     */
    #[test]
    fn certify_max_features_cut() {
        let matrix = forge_lab_matrix();
        let mut config = FeatureConfig::default();
        config.max_features = 2;

        let outcome = run_selection_cascade(&matrix, &config, 13).expect("cascade");
        assert_eq!(outcome.selected_features.len(), 2);
    }

    /**
     * CERTIFICACIÓN: Umbral de correlación relajado conserva la gemela.
     */
    #[test]
    fn certify_correlation_threshold_is_respected() {
        let matrix = forge_lab_matrix();
        let mut config = FeatureConfig::default();
        config.correlation_threshold = 1.1; // Nada supera |r| > 1.1.

        let outcome = run_selection_cascade(&matrix, &config, 13).expect("cascade");
        let names: Vec<&str> =
            outcome.selected_features.iter().map(|feature| feature.name.as_str()).collect();
        assert!(names.contains(&"b_signal_twin"));
    }
}
