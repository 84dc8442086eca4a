// [libs/core/learners/src/explainer.rs]
/*!
 * =================================================================
 * APARATO: LOCAL CONTRIBUTION EXPLAINER (V21.0 - OCCLUSION STRATA)
 * CLASIFICACIÓN: CORE LEARNING (ESTRATO L1)
 * RESPONSABILIDAD: CONTRIBUCIONES LOCALES POR OCLUSIÓN A LA MEDIA
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. OFF-HOT-PATH: El explicador corre fuera del presupuesto p99 del
 *    servicio; cada explicación cuesta d evaluaciones del modelo.
 * 2. BASELINE ANCHOR: Las medias de entrenamiento selladas en el artefacto
 *    definen el punto de referencia de la oclusión.
 *
 * # Mathematical Proof (Occlusion Attribution):
 * c_j = f(x) − f(x con x_j := μ_j). La suma de contribuciones no es
 * exactamente f(x) − f(μ) (interacciones), pero el signo y el orden de
 * magnitud por feature son fieles para árboles y redes suaves.
 * =================================================================
 */

use crate::ScoringModel;
use serde::{Deserialize, Serialize};

/// Contribución firmada de una feature individual.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignedContribution {
    /// Posición de la feature en el orden del contrato.
    pub feature_index: usize,
    /// Contribución firmada al score.
    pub contribution: f64,
}

/// Explicador local anclado a las medias de entrenamiento.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContributionExplainer {
    /// Media de entrenamiento por feature (punto de oclusión).
    pub feature_means: Vec<f64>,
}

impl ContributionExplainer {
    /// Sella el explicador con las medias del split de entrenamiento.
    pub fn from_training_means(feature_means: Vec<f64>) -> Self {
        Self { feature_means }
    }

    /**
     * Computa las contribuciones por oclusión de una fila contra un modelo.
     * Retorna las contribuciones ordenadas por magnitud descendente.
     */
    pub fn explain<ModelT: ScoringModel>(
        &self,
        model: &ModelT,
        feature_row: &[f64],
    ) -> Vec<SignedContribution> {
        let base_score = model.score_row(feature_row);
        let mut occluded_row = feature_row.to_vec();

        let mut contributions: Vec<SignedContribution> = (0..feature_row.len())
            .map(|feature_index| {
                let original_value = occluded_row[feature_index];
                occluded_row[feature_index] = self
                    .feature_means
                    .get(feature_index)
                    .copied()
                    .unwrap_or(0.0);
                let occluded_score = model.score_row(&occluded_row);
                occluded_row[feature_index] = original_value;

                SignedContribution {
                    feature_index,
                    contribution: base_score - occluded_score,
                }
            })
            .collect();

        contributions.sort_by(|a, b| {
            b.contribution
                .abs()
                .partial_cmp(&a.contribution.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        contributions
    }

    /// Separa las k contribuciones positivas y negativas dominantes.
    pub fn top_k_split(
        contributions: &[SignedContribution],
        top_k: usize,
    ) -> (Vec<SignedContribution>, Vec<SignedContribution>) {
        let positive: Vec<SignedContribution> = contributions
            .iter()
            .filter(|entry| entry.contribution > 0.0)
            .take(top_k)
            .cloned()
            .collect();
        let negative: Vec<SignedContribution> = contributions
            .iter()
            .filter(|entry| entry.contribution < 0.0)
            .take(top_k)
            .cloned()
            .collect();
        (positive, negative)
    }
}
