// [libs/domain/feature-forge/src/selection.rs]
/*!
 * =================================================================
 * APARATO: FOUR-STAGE SELECTION CASCADE (V26.0 - RANK FUSION)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: CASCADA DETERMINISTA DE SELECCIÓN DE FEATURES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. FIXED FOUR STAGES: varianza -> colinealidad -> información mutua ->
 *    importancia del modelo sustituto, en ese orden inviolable.
 * 2. DETERMINISTIC TIE-BREAKS: Todo desempate (poda de pares correlados,
 *    rangos empatados) se resuelve por nombre de columna ascendente.
 * 3. RANK FUSION 0.5/0.5: El puntaje final promedia los rangos de las
 *    etapas 3 y 4; el tope max_features corta la lista ordenada.
 *
 * # Mathematical Proof (Determinism):
 * Cada etapa es una función pura de (matriz, configuración, semilla).
 * La semilla del modelo sustituto deriva del trabajo propietario, por lo
 * que (bytes de dataset, config) idénticos reproducen exactamente la
 * misma lista seleccionada y por ende el mismo schema hash.
 * =================================================================
 */

use crate::errors::ForgeError;
use aegis_core_learners::gradient_boost::{GradientBoostModel, GradientBoostParameters};
use aegis_core_learners::trees::TreeGrowthPolicy;
use aegis_core_learners::{FeatureMatrix, ScoringModel};
use aegis_core_stats::{
    mutual_information_continuous, mutual_information_discrete, pearson_correlation,
    sample_variance,
};
use aegis_domain_models::feature::{FeatureConfig, FeatureDtype, SelectedFeature};
use tracing::{debug, info, instrument};

/// Capacidad del modelo sustituto de la etapa 4.
const SURROGATE_ESTIMATORS: usize = 40;
/// Profundidad del modelo sustituto de la etapa 4.
const SURROGATE_DEPTH: usize = 3;

/// Resultado sellado de la cascada de selección.
#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    /// Subconjunto final ordenado con los puntajes de cada etapa.
    pub selected_features: Vec<SelectedFeature>,
}

/**
 * Ejecuta la cascada de cuatro etapas sobre una matriz etiquetada.
 *
 * # Errors:
 * - `Validation` si la matriz carece de etiquetas o filas.
 * - `SelectionCollapsed` si ninguna columna sobrevive las etapas 1-2.
 */
#[instrument(skip(matrix, config), fields(columns = matrix.column_count(), rows = matrix.row_count()))]
pub fn run_selection_cascade(
    matrix: &FeatureMatrix,
    config: &FeatureConfig,
    _surrogate_seed: u64,
) -> Result<SelectionOutcome, ForgeError> {
    let labels = matrix
        .labels
        .as_ref()
        .ok_or_else(|| ForgeError::Validation("selection requires a labeled matrix".into()))?;
    if matrix.row_count() == 0 {
        return Err(ForgeError::Validation("selection on empty matrix".into()));
    }

    // --- ETAPA 1: FILTRO DE VARIANZA ---
    let mut survivors: Vec<(String, f64)> = Vec::new();
    for column in &matrix.columns {
        let variance = sample_variance(&column.values)?;
        if variance >= config.variance_threshold {
            survivors.push((column.name.clone(), variance));
        } else {
            debug!("  ↳ Stage 1 dropped '{}' (variance {:.6}).", column.name, variance);
        }
    }
    if survivors.is_empty() {
        return Err(ForgeError::SelectionCollapsed(
            "variance filter eliminated every column".into(),
        ));
    }

    // --- ETAPA 2: PODA DE COLINEALIDAD (GREEDY DETERMINISTA) ---
    // Orden alfabético: ante |r| > umbral se poda el nombre mayor.
    survivors.sort_by(|a, b| a.0.cmp(&b.0));
    let mut retained: Vec<(String, f64)> = Vec::new();
    for (candidate_name, candidate_variance) in survivors {
        let candidate_values = &matrix
            .column(&candidate_name)
            .ok_or_else(|| ForgeError::Validation(format!("column '{}' vanished", candidate_name)))?
            .values;

        let mut is_collinear = false;
        for (retained_name, _) in &retained {
            let retained_values = &matrix
                .column(retained_name)
                .ok_or_else(|| {
                    ForgeError::Validation(format!("column '{}' vanished", retained_name))
                })?
                .values;
            match pearson_correlation(candidate_values, retained_values) {
                Ok(correlation) if correlation.abs() > config.correlation_threshold => {
                    debug!(
                        "  ↳ Stage 2 dropped '{}' (|r|={:.4} vs '{}').",
                        candidate_name,
                        correlation.abs(),
                        retained_name
                    );
                    is_collinear = true;
                    break;
                }
                _ => {}
            }
        }
        if !is_collinear {
            retained.push((candidate_name, candidate_variance));
        }
    }

    // --- ETAPA 3: INFORMACIÓN MUTUA CONTRA LA ETIQUETA ---
    let mut staged: Vec<(String, f64, FeatureDtype, f64)> = Vec::new();
    for (feature_name, variance) in retained {
        let column = matrix
            .column(&feature_name)
            .ok_or_else(|| ForgeError::Validation(format!("column '{}' vanished", feature_name)))?;
        let dtype = dtype_of_label(&column.dtype_label);

        let mutual_information = match dtype {
            FeatureDtype::Continuous => mutual_information_continuous(
                &column.values,
                labels,
                config.mutual_information_neighbors as usize,
            )?,
            FeatureDtype::Discrete | FeatureDtype::Binary => {
                let discretized: Vec<i64> =
                    column.values.iter().map(|value| value.round() as i64).collect();
                mutual_information_discrete(&discretized, labels)?
            }
        };
        staged.push((feature_name, variance, dtype, mutual_information));
    }

    // --- ETAPA 4: IMPORTANCIA DEL MODELO SUSTITUTO ---
    let staged_names: Vec<String> = staged.iter().map(|entry| entry.0.clone()).collect();
    let surrogate_matrix = matrix.select_columns(&staged_names)?;
    let surrogate_parameters = GradientBoostParameters {
        n_estimators: SURROGATE_ESTIMATORS,
        learning_rate: 0.3,
        max_depth: SURROGATE_DEPTH,
        max_leaves: 8,
        scale_pos_weight: 1.0,
        min_samples_leaf: 5,
        lambda_regularization: 1.0,
        growth_policy: TreeGrowthPolicy::LevelWise,
    };
    let surrogate_model = GradientBoostModel::fit_with_progress(
        &surrogate_matrix,
        &surrogate_parameters,
        None,
        |_| true,
    )?
    .ok_or_else(|| ForgeError::SelectionCollapsed("surrogate fit abandoned".into()))?;
    let surrogate_importance = surrogate_model.feature_importance();

    // --- FUSIÓN DE RANGOS 0.5 / 0.5 ---
    let mutual_information_ranks = ranks_descending(
        &staged.iter().map(|entry| (entry.0.clone(), entry.3)).collect::<Vec<_>>(),
    );
    let importance_ranks = ranks_descending(
        &staged
            .iter()
            .enumerate()
            .map(|(position, entry)| (entry.0.clone(), surrogate_importance[position]))
            .collect::<Vec<_>>(),
    );

    let mut fused: Vec<SelectedFeature> = staged
        .into_iter()
        .enumerate()
        .map(|(position, (name, variance, dtype, mutual_information))| SelectedFeature {
            combined_rank_score: 0.5 * mutual_information_ranks[&name]
                + 0.5 * importance_ranks[&name],
            model_importance_score: surrogate_importance[position],
            mutual_information_score: mutual_information,
            variance_score: variance,
            dtype,
            name,
        })
        .collect();

    // Mejor rango combinado primero; desempate alfabético.
    fused.sort_by(|a, b| {
        a.combined_rank_score
            .partial_cmp(&b.combined_rank_score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.name.cmp(&b.name))
    });
    fused.truncate(config.max_features as usize);

    info!("🎯 [SELECTION]: Cascade retained {} features.", fused.len());
    Ok(SelectionOutcome { selected_features: fused })
}

/// Rango descendente (1 = mejor) por nombre, desempate alfabético.
fn ranks_descending(scored: &[(String, f64)]) -> std::collections::HashMap<String, f64> {
    let mut ordered: Vec<&(String, f64)> = scored.iter().collect();
    ordered.sort_by(|a, b| {
        b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.0.cmp(&b.0))
    });
    ordered
        .into_iter()
        .enumerate()
        .map(|(position, (name, _))| (name.clone(), (position + 1) as f64))
        .collect()
}

/// Resuelve el dtype de dominio desde la etiqueta de columna.
pub(crate) fn dtype_of_label(dtype_label: &str) -> FeatureDtype {
    match dtype_label {
        "binary" => FeatureDtype::Binary,
        "discrete" => FeatureDtype::Discrete,
        _ => FeatureDtype::Continuous,
    }
}
