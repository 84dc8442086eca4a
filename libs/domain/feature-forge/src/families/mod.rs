// [libs/domain/feature-forge/src/families/mod.rs]
/*!
 * =================================================================
 * APARATO: FEATURE FAMILY MATRIX (V25.0 - TOPOLOGY MASTER)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: ORQUESTACIÓN DE LAS CUATRO FAMILIAS DE FEATURES
 * =================================================================
 */

/// Transformaciones sobre la transacción individual.
pub mod transaction;
/// Agregados históricos por usuario (sin fuga temporal).
pub mod behavioral;
/// Señales de calendario y reloj.
pub mod temporal;
/// Agregados sobre ventanas móviles ancladas al evento.
pub mod aggregation;

use aegis_core_learners::FeatureColumn;

/// Asigna la etiqueta de tipo físico observando los valores de la columna.
pub(crate) fn infer_dtype_label(values: &[f64]) -> &'static str {
    let mut all_binary = true;
    let mut all_integral = true;
    for value in values {
        if !(*value == 0.0 || *value == 1.0) {
            all_binary = false;
        }
        if value.fract().abs() > f64::EPSILON {
            all_integral = false;
        }
        if !all_binary && !all_integral {
            break;
        }
    }
    if all_binary {
        "binary"
    } else if all_integral {
        "discrete"
    } else {
        "continuous"
    }
}

/// Forja una columna tipando automáticamente sus valores.
pub(crate) fn forge_typed_column(name: String, values: Vec<f64>) -> FeatureColumn {
    let dtype_label = infer_dtype_label(&values).to_string();
    FeatureColumn { name, dtype_label, values }
}
