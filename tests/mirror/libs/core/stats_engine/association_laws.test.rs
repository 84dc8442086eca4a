// [tests/mirror/libs/core/stats_engine/association_laws.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE LEYES DE ASOCIACIÓN (V2.0 - ZENITH)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-MIRROR
 * RESPONSABILIDAD: AUDITORÍA DE PEARSON, INFORMACIÓN MUTUA Y TEST Z
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use aegis_core_stats::{
        mutual_information_continuous, mutual_information_discrete, pearson_correlation,
        two_proportion_z_test,
    };

    /**
     * CERTIFICACIÓN: Simetría e invarianza afín de Pearson.
     */
    #[test]
    fn certify_pearson_affine_invariance() {
        let left: Vec<f64> = (0..500).map(|index| (index as f64 * 0.77).sin()).collect();
        let right: Vec<f64> = (0..500).map(|index| (index as f64 * 0.31).cos()).collect();

        let direct = pearson_correlation(&left, &right).expect("r");
        let mirrored = pearson_correlation(&right, &left).expect("r");
        assert!((direct - mirrored).abs() < 1e-12, "pearson must be symmetric");

        // Transformación afín positiva: r invariante.
        let scaled: Vec<f64> = right.iter().map(|value| 4.0 * value + 11.0).collect();
        let affine = pearson_correlation(&left, &scaled).expect("r");
        assert!((direct - affine).abs() < 1e-9);
    }

    /**
     * CERTIFICACIÓN: La información mutua discreta está acotada por la
     * entropía de la etiqueta y es nula ante independencia.
     */
    #[test]
    fn certify_discrete_mi_bounds() {
        let labels: Vec<bool> = (0..2000).map(|index| index % 2 == 0).collect();

        // Predictor perfecto: MI == H(Y) == ln 2.
        let perfect: Vec<i64> = labels.iter().map(|label| i64::from(*label)).collect();
        let perfect_information = mutual_information_discrete(&perfect, &labels).expect("mi");
        assert!((perfect_information - std::f64::consts::LN_2).abs() < 1e-9);

        // Feature independiente de la etiqueta (periodo coprimo).
        let independent: Vec<i64> = (0..2000).map(|index| (index % 5) as i64).collect();
        let independent_information =
            mutual_information_discrete(&independent, &labels).expect("mi");
        assert!(independent_information < 0.01);
    }

    /**
     * CERTIFICACIÓN: El estimador k-NN continuo ordena señal > ruido.
     */
    #[test]
    fn certify_continuous_mi_signal_over_noise() {
        let mut values = Vec::new();
        let mut labels = Vec::new();
        for index in 0..600 {
            let jitter = (index as f64 * 0.618_033).fract();
            values.push(jitter * 0.5);
            labels.push(false);
            values.push(7.0 + jitter * 0.5);
            labels.push(true);
        }
        let signal = mutual_information_continuous(&values, &labels, 5).expect("mi");

        let noise_values: Vec<f64> =
            (0..1200).map(|index| (index as f64 * 0.414_213).fract()).collect();
        let noise = mutual_information_continuous(&noise_values, &labels, 5).expect("mi");

        assert!(signal > noise + 0.3, "signal {} vs noise {}", signal, noise);
    }

    /**
     * CERTIFICACIÓN: Simetría del test z y frontera de significancia.
     */
    #[test]
    fn certify_z_test_symmetry() {
        let forward = two_proportion_z_test(800, 1000, 750, 1000).expect("z");
        let backward = two_proportion_z_test(750, 1000, 800, 1000).expect("z");

        assert!((forward.z_statistic + backward.z_statistic).abs() < 1e-12);
        assert!((forward.p_value - backward.p_value).abs() < 1e-12);
        assert!(forward.is_significant_at(0.05));
    }
}
