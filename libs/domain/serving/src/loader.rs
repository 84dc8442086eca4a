// [libs/domain/serving/src/loader.rs]
/*!
 * =================================================================
 * APARATO: VERIFIED MODEL LOADER (V22.1 - CHECKSUM GATE)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: CARGA VERIFICADA DEL MODELO ACTIVO
 *
 * # Mathematical Proof (Load Integrity):
 * Todo modelo cargado satisface sha256(bytes) == checksum registrado; la
 * discrepancia es ArtifactCorrupted y dispara el rollback del registro
 * hacia el último PRODUCTION sano archivado.
 * =================================================================
 */

use crate::errors::ServingError;
use aegis_core_learners::explainer::ContributionExplainer;
use aegis_core_learners::TrainedLearner;
use sha2::{Digest, Sha256};
use tracing::{info, instrument};
use uuid::Uuid;

/// Modelo activo sellado para el puntero caliente.
pub struct ActiveModel {
    /// Identidad del modelo en el registro.
    pub model_id: Uuid,
    /// Contrato de extracción exigido.
    pub schema_hash: String,
    /// Orden de features del contrato de servicio.
    pub feature_names: Vec<String>,
    /// Aprendiz reconstruido desde la forma portable.
    pub learner: TrainedLearner,
    /// Explicador local anclado a medias de entrenamiento.
    pub explainer: ContributionExplainer,
    /// Umbral de decisión sellado en el entrenamiento.
    pub decision_threshold: f64,
    /// Digest del artefacto portable verificado en la carga.
    pub checksum_hexadecimal: String,
}

/**
 * Construye el modelo activo desde los bytes portables verificados.
 *
 * # Errors:
 * - `ArtifactCorrupted` ante digest divergente.
 * - `ModelDecodeRejected` ante bytes que no decodifican al aprendiz.
 */
#[instrument(skip(portable_bytes, explainer_means), fields(model_id = %model_id, bytes = portable_bytes.len()))]
pub fn load_active_model(
    model_id: Uuid,
    schema_hash: &str,
    feature_names: &[String],
    portable_bytes: &[u8],
    expected_checksum_hexadecimal: &str,
    explainer_means: Vec<f64>,
    decision_threshold: f64,
) -> Result<ActiveModel, ServingError> {
    let observed_checksum = hex::encode(Sha256::digest(portable_bytes));
    if observed_checksum != expected_checksum_hexadecimal {
        return Err(ServingError::ArtifactCorrupted {
            expected: expected_checksum_hexadecimal.to_string(),
            observed: observed_checksum,
        });
    }

    let learner = TrainedLearner::from_portable_bytes(portable_bytes)
        .map_err(|fault| ServingError::ModelDecodeRejected(fault.to_string()))?;

    info!("🔥 [LOADER]: Model {} verified and staged for hot swap.", model_id);

    Ok(ActiveModel {
        model_id,
        schema_hash: schema_hash.to_string(),
        feature_names: feature_names.to_vec(),
        learner,
        explainer: ContributionExplainer::from_training_means(explainer_means),
        decision_threshold,
        checksum_hexadecimal: observed_checksum,
    })
}
