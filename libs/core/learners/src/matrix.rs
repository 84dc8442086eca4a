// [libs/core/learners/src/matrix.rs]
/*!
 * =================================================================
 * APARATO: COLUMNAR FEATURE MATRIX (V21.0 - CODEC SEALED)
 * CLASIFICACIÓN: CORE LEARNING (ESTRATO L1)
 * RESPONSABILIDAD: CONTENEDOR COLUMNAR TIPADO Y CODEC DE ARTEFACTO
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. COLUMN-MAJOR SOVEREIGNTY: El almacenamiento columnar habilita los
 *    barridos de varianza, correlación y binning sin transposición.
 * 2. BINCODE ARTIFACT: La matriz serializada ES el artefacto 'features'
 *    de la bóveda; el codec es bit-determinista para un contenido dado.
 * 3. LABEL CHANNEL: Canal de etiquetas opcional separado de las columnas,
 *    preservando la pureza del contrato de extracción.
 * =================================================================
 */

use crate::errors::LearnerError;
use serde::{Deserialize, Serialize};

/// Columna tipada de la matriz de features.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureColumn {
    /// Nombre nominal de la feature.
    pub name: String,
    /// Etiqueta de tipo físico ("continuous" | "discrete" | "binary").
    pub dtype_label: String,
    /// Valores en orden de fila.
    pub values: Vec<f64>,
}

/// Matriz columnar con canal de etiquetas opcional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FeatureMatrix {
    /// Columnas en el orden del contrato de extracción.
    pub columns: Vec<FeatureColumn>,
    /// Etiquetas binarias alineadas por fila (ausentes en scoring puro).
    pub labels: Option<Vec<bool>>,
}

impl FeatureMatrix {
    /// Cantidad de filas (0 si no hay columnas).
    pub fn row_count(&self) -> usize {
        self.columns.first().map(|column| column.values.len()).unwrap_or(0)
    }

    /// Cantidad de columnas.
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Nombres ordenados de columnas.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|column| column.name.clone()).collect()
    }

    /// Acceso a una columna por nombre.
    pub fn column(&self, column_name: &str) -> Option<&FeatureColumn> {
        self.columns.iter().find(|column| column.name == column_name)
    }

    /// Extrae la fila materializada en el orden corriente de columnas.
    pub fn row(&self, row_index: usize) -> Vec<f64> {
        self.columns.iter().map(|column| column.values[row_index]).collect()
    }

    /**
     * Proyección ordenada de un subconjunto de columnas.
     *
     * # Errors:
     * `EmptyMatrix` si alguna columna solicitada no existe.
     */
    pub fn select_columns(&self, ordered_names: &[String]) -> Result<FeatureMatrix, LearnerError> {
        let mut projected_columns = Vec::with_capacity(ordered_names.len());
        for requested_name in ordered_names {
            let column = self.column(requested_name).ok_or_else(|| {
                LearnerError::EmptyMatrix(format!("column '{}' absent from matrix", requested_name))
            })?;
            projected_columns.push(column.clone());
        }
        Ok(FeatureMatrix { columns: projected_columns, labels: self.labels.clone() })
    }

    /**
     * Proyección de un subconjunto de filas (índices en orden arbitrario).
     */
    pub fn select_rows(&self, row_indices: &[usize]) -> FeatureMatrix {
        let projected_columns = self
            .columns
            .iter()
            .map(|column| FeatureColumn {
                name: column.name.clone(),
                dtype_label: column.dtype_label.clone(),
                values: row_indices.iter().map(|index| column.values[*index]).collect(),
            })
            .collect();

        let projected_labels = self
            .labels
            .as_ref()
            .map(|labels| row_indices.iter().map(|index| labels[*index]).collect());

        FeatureMatrix { columns: projected_columns, labels: projected_labels }
    }

    /**
     * Valida la coherencia estructural (longitudes uniformes y etiquetas
     * alineadas) antes de publicar el artefacto.
     */
    pub fn validate_structure(&self) -> Result<(), LearnerError> {
        let expected_rows = self.row_count();
        for column in &self.columns {
            if column.values.len() != expected_rows {
                return Err(LearnerError::ShapeMismatch {
                    expected: expected_rows,
                    observed: column.values.len(),
                });
            }
        }
        if let Some(labels) = &self.labels {
            if labels.len() != expected_rows {
                return Err(LearnerError::ShapeMismatch {
                    expected: expected_rows,
                    observed: labels.len(),
                });
            }
        }
        Ok(())
    }

    /// Codec de artefacto: matriz -> bytes bincode deterministas.
    pub fn to_artifact_bytes(&self) -> Result<Vec<u8>, LearnerError> {
        bincode::serialize(self).map_err(|fault| LearnerError::Serialization(fault.to_string()))
    }

    /// Codec de artefacto: bytes bincode -> matriz validada.
    pub fn from_artifact_bytes(bytes: &[u8]) -> Result<Self, LearnerError> {
        let matrix: FeatureMatrix = bincode::deserialize(bytes)
            .map_err(|fault| LearnerError::Serialization(fault.to_string()))?;
        matrix.validate_structure()?;
        Ok(matrix)
    }
}
