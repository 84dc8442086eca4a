// [tests/mirror/libs/core/stats_engine/divergence_integrity.test.rs]
/*!
 * =================================================================
 * APARATO: CERTIFICADOR DE DIVERGENCIAS (V2.0 - TORTURE GRADE)
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L1-MIRROR
 * RESPONSABILIDAD: AUDITORÍA DE PSI, KS Y CHI² CONTRA VERDADES CONOCIDAS
 * =================================================================
 */

#[cfg(test)]
mod tests {
    use aegis_core_stats::histogram::HistogramSpec;
    use aegis_core_stats::{
        chi_square_categorical, kolmogorov_smirnov, population_stability_index,
    };

    /// Pseudo-normal determinista por suma de doce uniformes.
    fn forge_pseudo_normal(sample_size: usize, mean_shift: f64) -> Vec<f64> {
        (0..sample_size)
            .map(|index| {
                let mut accumulator = 0.0_f64;
                for lane in 1..=12u64 {
                    let raw = (index as u64)
                        .wrapping_mul(6_364_136_223_846_793_005)
                        .wrapping_add(lane.wrapping_mul(1_442_695_040_888_963_407));
                    accumulator += (raw >> 11) as f64 / (1u64 << 53) as f64;
                }
                accumulator - 6.0 + mean_shift
            })
            .collect()
    }

    /**
     * CERTIFICACIÓN: El PSI de una población estable es nominal y el de
     * un desplazamiento de +3σ viola la banda crítica.
     */
    #[test]
    fn certify_psi_bands_on_shift() {
        let reference = forge_pseudo_normal(4000, 0.0);
        let spec = HistogramSpec::freeze_from_reference(&reference, 10).expect("spec");

        let stable = forge_pseudo_normal(4000, 0.0);
        let stable_psi = population_stability_index(&reference, &stable, &spec).expect("psi");
        assert!(stable_psi < 0.10, "stable psi {} must be nominal", stable_psi);

        let shifted = forge_pseudo_normal(4000, 3.0);
        let shifted_psi = population_stability_index(&reference, &shifted, &spec).expect("psi");
        assert!(shifted_psi >= 0.25, "shifted psi {} must be critical", shifted_psi);
    }

    /**
     * CERTIFICACIÓN: KS ordena correctamente nulo < leve < severo.
     */
    #[test]
    fn certify_ks_monotonic_in_shift() {
        let reference = forge_pseudo_normal(3000, 0.0);
        let mild = forge_pseudo_normal(3000, 0.3);
        let severe = forge_pseudo_normal(3000, 2.0);

        let mild_outcome = kolmogorov_smirnov(&reference, &mild).expect("ks");
        let severe_outcome = kolmogorov_smirnov(&reference, &severe).expect("ks");

        assert!(mild_outcome.statistic < severe_outcome.statistic);
        assert!(severe_outcome.statistic > 0.15);
        assert!(severe_outcome.p_value < 0.01);
    }

    /**
     * CERTIFICACIÓN: Chi² categórico estable vs redistribuido.
     */
    #[test]
    fn certify_chi_square_redistribution() {
        let reference: Vec<String> = (0..1000)
            .map(|index| match index % 10 {
                0..=6 => "card".to_string(),
                7 | 8 => "wire".to_string(),
                _ => "wallet".to_string(),
            })
            .collect();

        let stable = chi_square_categorical(&reference, &reference).expect("chi2");
        assert!(stable.p_value > 0.9);

        let redistributed: Vec<String> = (0..1000)
            .map(|index| match index % 10 {
                0 | 1 => "card".to_string(),
                2..=8 => "wire".to_string(),
                _ => "wallet".to_string(),
            })
            .collect();
        let shifted = chi_square_categorical(&reference, &redistributed).expect("chi2");
        assert!(shifted.p_value < 0.001);
        assert_eq!(shifted.degrees_of_freedom, 2);
    }
}
