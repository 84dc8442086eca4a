// [libs/domain/monitoring/src/reference.rs]
/*!
 * =================================================================
 * APARATO: FROZEN REFERENCE SNAPSHOT (V16.1 - TRAINING ANCHOR)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: DISTRIBUCIÓN DE ENTRENAMIENTO CONGELADA POR FEATURE
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. FROZEN AT TRAINING: El snapshot se sella en el momento del
 *    entrenamiento; toda ventana corriente se compara contra ESTA
 *    distribución, jamás contra una referencia móvil.
 * 2. BOUNDED SAMPLE: La muestra cruda se acota por decimación
 *    determinista para mantener el artefacto serializable y estable.
 * =================================================================
 */

use crate::errors::MonitorError;
use aegis_core_learners::FeatureMatrix;
use aegis_core_stats::histogram::{HistogramSpec, DEFAULT_BIN_COUNT};
use serde::{Deserialize, Serialize};

/// Tope de observaciones crudas retenidas por feature.
const REFERENCE_SAMPLE_CAP: usize = 10_000;

/// Distribución congelada de una feature individual.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureReference {
    /// Nombre nominal de la feature.
    pub feature_name: String,
    /// Etiqueta de tipo físico sellada en el contrato.
    pub dtype_label: String,
    /// Bordes de discretización congelados (features continuas).
    pub histogram: Option<HistogramSpec>,
    /// Muestra cruda decimada de la referencia.
    pub sample: Vec<f64>,
}

/// Snapshot completo de la distribución de entrenamiento.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReferenceSnapshot {
    /// Referencias en el orden del contrato de features.
    pub features: Vec<FeatureReference>,
}

impl ReferenceSnapshot {
    /**
     * Congela el snapshot desde la matriz de entrenamiento.
     *
     * Las features degeneradas (rango nulo) conservan la muestra pero
     * sin especificación de histograma; el barrido de deriva las omite.
     */
    pub fn freeze_from_matrix(matrix: &FeatureMatrix) -> Self {
        let features = matrix
            .columns
            .iter()
            .map(|column| {
                let decimated_sample = decimate(&column.values, REFERENCE_SAMPLE_CAP);
                let histogram = if column.dtype_label == "continuous" {
                    HistogramSpec::freeze_from_reference(&decimated_sample, DEFAULT_BIN_COUNT).ok()
                } else {
                    None
                };
                FeatureReference {
                    feature_name: column.name.clone(),
                    dtype_label: column.dtype_label.clone(),
                    histogram,
                    sample: decimated_sample,
                }
            })
            .collect();
        Self { features }
    }

    /// Referencia de una feature por nombre.
    pub fn feature(&self, feature_name: &str) -> Result<&FeatureReference, MonitorError> {
        self.features
            .iter()
            .find(|reference| reference.feature_name == feature_name)
            .ok_or_else(|| MonitorError::ReferenceFeatureAbsent(feature_name.to_string()))
    }

    /// Codec de artefacto hacia JSON.
    pub fn to_artifact_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Codec de artefacto desde JSON.
    pub fn from_artifact_bytes(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }
}

/// Decimación determinista por paso fijo hasta el tope.
fn decimate(values: &[f64], cap: usize) -> Vec<f64> {
    if values.len() <= cap {
        return values.to_vec();
    }
    let step = values.len() as f64 / cap as f64;
    (0..cap).map(|index| values[(index as f64 * step) as usize]).collect()
}
