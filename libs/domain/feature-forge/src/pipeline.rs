// [libs/domain/feature-forge/src/pipeline.rs]
/*!
 * =================================================================
 * APARATO: FEATURE FORGE PIPELINE (V26.1 - CONTRACT SEALER)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: ORQUESTACIÓN FAMILIAS -> CASCADA -> SCHEMA HASH
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. NO PARTIAL OUTPUT: Cualquier falla de etapa aborta la forja sin
 *    publicar matriz ni contrato; el llamador sella FAILED.
 * 2. SEEDED DETERMINISM: Toda aleatoriedad deriva de la semilla del
 *    trabajo propietario (bytes idénticos + config idéntica = hash
 *    idéntico).
 * 3. CANCELLATION POINTS: La bandera cooperativa se sondea en cada
 *    frontera de familia y antes de la cascada.
 * =================================================================
 */

use crate::calendar::HolidayCalendar;
use crate::errors::ForgeError;
use crate::families;
use crate::records::TransactionRecord;
use crate::selection::{run_selection_cascade, SelectionOutcome};
use aegis_core_learners::FeatureMatrix;
use aegis_domain_models::feature::{compute_schema_hash, FeatureConfig};
use tracing::{info, instrument};

/// Resultado completo de una forja exitosa.
#[derive(Debug, Clone)]
pub struct ForgeOutcome {
    /// Matriz columnar proyectada al subconjunto seleccionado.
    pub selected_matrix: FeatureMatrix,
    /// Nombres de todas las features generadas antes de la selección.
    pub generated_feature_names: Vec<String>,
    /// Resultado de la cascada con puntajes por etapa.
    pub selection: SelectionOutcome,
    /// Digest SHA-256 del contrato ordenado (nombre, dtype).
    pub schema_hash: String,
}

/// Orquestador del pipeline C3.
pub struct FeatureForgePipeline;

impl FeatureForgePipeline {
    /**
     * Ejecuta la forja completa sobre filas tipadas.
     *
     * El callback de cancelación retorna true para solicitar el abandono
     * cooperativo; la forja aborta en la siguiente frontera de etapa.
     *
     * # Errors:
     * - `Validation` ante dataset vacío (antes de la etapa 1).
     * - `SelectionCollapsed` si la cascada elimina todas las columnas.
     */
    #[instrument(skip_all, fields(rows = records.len()))]
    pub fn execute<CancelFn>(
        records: &[TransactionRecord],
        config: &FeatureConfig,
        holiday_calendar: &dyn HolidayCalendar,
        job_seed: u64,
        mut is_cancelled: CancelFn,
    ) -> Result<Option<ForgeOutcome>, ForgeError>
    where
        CancelFn: FnMut() -> bool,
    {
        if records.is_empty() {
            return Err(ForgeError::Validation("dataset contains zero rows".into()));
        }

        let labels: Vec<bool> = records.iter().map(|record| record.is_fraud).collect();
        let mut full_matrix = FeatureMatrix { columns: Vec::new(), labels: Some(labels) };

        // --- GENERACIÓN POR FAMILIAS (FRONTERAS DE CANCELACIÓN) ---
        if config.enable_transaction_family {
            full_matrix.columns.extend(families::transaction::compute(records));
            if is_cancelled() {
                return Ok(None);
            }
        }
        if config.enable_behavioral_family {
            full_matrix.columns.extend(families::behavioral::compute(records));
            if is_cancelled() {
                return Ok(None);
            }
        }
        if config.enable_temporal_family {
            full_matrix.columns.extend(families::temporal::compute(records, holiday_calendar));
            if is_cancelled() {
                return Ok(None);
            }
        }
        if config.enable_aggregation_family {
            full_matrix
                .columns
                .extend(families::aggregation::compute(records, &config.aggregation_window_hours));
            if is_cancelled() {
                return Ok(None);
            }
        }

        if full_matrix.columns.is_empty() {
            return Err(ForgeError::Validation(
                "every feature family is disabled in the configuration".into(),
            ));
        }

        let generated_feature_names = full_matrix.column_names();
        info!("🛠️  [FORGE]: Generated {} candidate features.", generated_feature_names.len());

        // --- CASCADA DE SELECCIÓN DE CUATRO ETAPAS ---
        let selection = run_selection_cascade(&full_matrix, config, job_seed)?;
        if is_cancelled() {
            return Ok(None);
        }

        // --- PROYECCIÓN Y SELLADO DEL CONTRATO ---
        let selected_names: Vec<String> =
            selection.selected_features.iter().map(|feature| feature.name.clone()).collect();
        let selected_matrix = full_matrix.select_columns(&selected_names)?;

        let ordered_schema: Vec<(String, aegis_domain_models::FeatureDtype)> = selection
            .selected_features
            .iter()
            .map(|feature| (feature.name.clone(), feature.dtype))
            .collect();
        let schema_hash = compute_schema_hash(&ordered_schema);

        info!(
            "🧬 [FORGE]: Contract sealed with {} features, hash {}.",
            selected_names.len(),
            schema_hash
        );

        Ok(Some(ForgeOutcome {
            selected_matrix,
            generated_feature_names,
            selection,
            schema_hash,
        }))
    }
}
