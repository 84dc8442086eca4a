// [libs/core/stats-engine/src/histogram.rs]
/*!
 * =================================================================
 * APARATO: HISTOGRAM BINNING KERNEL (V14.2 - REFERENCE ANCHORED)
 * CLASIFICACIÓN: CORE MATH (ESTRATO L1)
 * RESPONSABILIDAD: DISCRETIZACIÓN DETERMINISTA PARA DIVERGENCIAS
 *
 * # Mathematical Proof (Shared Support):
 * El PSI exige que referencia y ventana corriente se discreticen sobre
 * los MISMOS bordes. La especificación de bordes se congela sobre la
 * distribución de referencia y se reutiliza bit-perfecta en cada ventana,
 * eliminando el sesgo de soporte móvil.
 * =================================================================
 */

use crate::errors::StatsError;
use serde::{Deserialize, Serialize};

/// Cantidad nominal de bins para divergencias distribucionales.
pub const DEFAULT_BIN_COUNT: usize = 10;

/// Especificación congelada de bordes de discretización.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistogramSpec {
    /// Bordes interiores ordenados; implícitos −∞ y +∞ en los extremos.
    pub interior_edges: Vec<f64>,
}

impl HistogramSpec {
    /**
     * Congela bordes equiespaciados sobre el rango observado de la
     * distribución de referencia.
     *
     * # Errors:
     * - `EmptySample` ante referencia vacía.
     * - `DegenerateDistribution` si el rango observado es nulo.
     */
    pub fn freeze_from_reference(reference: &[f64], bin_count: usize) -> Result<Self, StatsError> {
        if reference.is_empty() {
            return Err(StatsError::EmptySample("histogram reference".into()));
        }
        if bin_count < 2 {
            return Err(StatsError::InvalidParameter(format!(
                "bin_count must be >= 2, observed {}",
                bin_count
            )));
        }

        let minimum = reference.iter().cloned().fold(f64::INFINITY, f64::min);
        let maximum = reference.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        if (maximum - minimum).abs() < f64::EPSILON {
            return Err(StatsError::DegenerateDistribution(
                "reference range collapsed to a point".into(),
            ));
        }

        let bin_width = (maximum - minimum) / bin_count as f64;
        let interior_edges = (1..bin_count)
            .map(|index| minimum + bin_width * index as f64)
            .collect();

        Ok(Self { interior_edges })
    }

    /// Cantidad total de bins (bordes interiores + 1).
    pub fn bin_count(&self) -> usize {
        self.interior_edges.len() + 1
    }

    /// Bin asignado a un valor (búsqueda binaria sobre los bordes).
    pub fn bin_of(&self, value: f64) -> usize {
        match self
            .interior_edges
            .binary_search_by(|edge| edge.partial_cmp(&value).unwrap_or(std::cmp::Ordering::Less))
        {
            Ok(index) => index + 1,
            Err(index) => index,
        }
    }
}

/**
 * Proporciones por bin con suavizado aditivo de Laplace.
 *
 * El suavizado garantiza soporte estrictamente positivo en ambos lados
 * del logaritmo del PSI.
 */
pub fn bin_proportions(
    sample: &[f64],
    spec: &HistogramSpec,
    smoothing_epsilon: f64,
) -> Result<Vec<f64>, StatsError> {
    if sample.is_empty() {
        return Err(StatsError::EmptySample("bin_proportions".into()));
    }

    let bin_count = spec.bin_count();
    let mut counts = vec![0.0_f64; bin_count];
    for value in sample {
        counts[spec.bin_of(*value)] += 1.0;
    }

    let smoothed_total = sample.len() as f64 + smoothing_epsilon * bin_count as f64;
    Ok(counts
        .into_iter()
        .map(|count| (count + smoothing_epsilon) / smoothed_total)
        .collect())
}
