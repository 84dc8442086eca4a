// [libs/domain/feature-forge/src/records.rs]
/*!
 * =================================================================
 * APARATO: TRANSACTION RECORD DECODER (V25.1 - TYPED COERCION)
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: DECODIFICACIÓN TIPADA DEL DATASET DE TRANSACCIONES
 *
 * VISION HIPER-HOLÍSTICA 2026:
 * 1. STRICT CORE COLUMNS: transaction_id, user_id, amount, timestamp e
 *    is_fraud son obligatorias; su ausencia es Validation antes de la
 *    etapa 1 de la forja.
 * 2. TOLERANT PERIPHERY: Las columnas categóricas y el atributo protegido
 *    son opcionales con defaults nominales.
 * =================================================================
 */

use crate::errors::ForgeError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fila tipada del dataset de transacciones.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionRecord {
    /// Identificador externo de la transacción.
    pub transaction_id: String,
    /// Identificador del usuario pagador.
    pub user_id: String,
    /// Monto de la transacción.
    pub amount: f64,
    /// Momento del evento (UTC).
    pub event_time: DateTime<Utc>,
    /// Categoría del comercio.
    pub merchant_category: String,
    /// Método de pago.
    pub payment_method: String,
    /// Tipo de dispositivo.
    pub device_type: String,
    /// Bandera de transacción internacional.
    pub is_international: bool,
    /// Alta de la cuenta del usuario (antigüedad).
    pub account_created_at: Option<DateTime<Utc>>,
    /// Atributo protegido para la auditoría de equidad.
    pub customer_segment: Option<String>,
    /// Etiqueta de fraude confirmada.
    pub is_fraud: bool,
}

/// Columnas obligatorias del contrato de ingesta.
const REQUIRED_COLUMNS: [&str; 5] =
    ["transaction_id", "user_id", "amount", "timestamp", "is_fraud"];

/**
 * Decodifica el blob CSV de un dataset hacia filas tipadas.
 *
 * # Errors:
 * - `Validation` ante blob vacío o columnas obligatorias ausentes.
 * - `RecordDecode` ante la primera fila malformada (sin salida parcial).
 */
pub fn parse_transaction_csv(csv_bytes: &[u8]) -> Result<Vec<TransactionRecord>, ForgeError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(csv_bytes);

    let header_row = csv_reader
        .headers()
        .map_err(|fault| ForgeError::Validation(format!("unreadable header: {}", fault)))?
        .clone();

    let column_positions: HashMap<String, usize> = header_row
        .iter()
        .enumerate()
        .map(|(position, column_name)| (column_name.to_string(), position))
        .collect();

    for required_column in REQUIRED_COLUMNS {
        if !column_positions.contains_key(required_column) {
            return Err(ForgeError::Validation(format!(
                "required column '{}' absent from dataset header",
                required_column
            )));
        }
    }

    let mut decoded_records = Vec::new();
    for (row_index, row_outcome) in csv_reader.records().enumerate() {
        let line_number = row_index + 2;
        let raw_row = row_outcome.map_err(|fault| ForgeError::RecordDecode {
            line: line_number,
            detail: fault.to_string(),
        })?;

        let field = |column: &str| -> Option<&str> {
            column_positions.get(column).and_then(|position| raw_row.get(*position))
        };

        let amount: f64 = field("amount")
            .unwrap_or_default()
            .parse()
            .map_err(|_| ForgeError::RecordDecode {
                line: line_number,
                detail: "amount is not a number".into(),
            })?;

        let event_time = parse_flexible_timestamp(field("timestamp").unwrap_or_default())
            .ok_or_else(|| ForgeError::RecordDecode {
                line: line_number,
                detail: "timestamp is not RFC 3339 nor epoch seconds".into(),
            })?;

        let is_fraud = parse_flexible_boolean(field("is_fraud").unwrap_or_default())
            .ok_or_else(|| ForgeError::RecordDecode {
                line: line_number,
                detail: "is_fraud is not a boolean".into(),
            })?;

        decoded_records.push(TransactionRecord {
            transaction_id: field("transaction_id").unwrap_or_default().to_string(),
            user_id: field("user_id").unwrap_or_default().to_string(),
            amount,
            event_time,
            merchant_category: field("merchant_category").unwrap_or("unknown").to_string(),
            payment_method: field("payment_method").unwrap_or("unknown").to_string(),
            device_type: field("device_type").unwrap_or("unknown").to_string(),
            is_international: field("is_international")
                .and_then(parse_flexible_boolean_str)
                .unwrap_or(false),
            account_created_at: field("account_created_at").and_then(parse_flexible_timestamp),
            customer_segment: field("customer_segment")
                .filter(|value| !value.is_empty())
                .map(str::to_string),
            is_fraud,
        });
    }

    if decoded_records.is_empty() {
        return Err(ForgeError::Validation("dataset contains zero data rows".into()));
    }

    Ok(decoded_records)
}

/**
 * Serializa filas tipadas de vuelta al contrato CSV de ingesta.
 *
 * Inversa de 'parse_transaction_csv' para la fusión de datasets del
 * controlador de reentrenamiento.
 */
pub fn records_to_csv(records: &[TransactionRecord]) -> Result<Vec<u8>, ForgeError> {
    let mut csv_writer = csv::Writer::from_writer(Vec::new());
    csv_writer
        .write_record([
            "transaction_id",
            "user_id",
            "amount",
            "timestamp",
            "merchant_category",
            "payment_method",
            "device_type",
            "is_international",
            "account_created_at",
            "customer_segment",
            "is_fraud",
        ])
        .map_err(|fault| ForgeError::Validation(format!("csv header write: {}", fault)))?;

    for record in records {
        csv_writer
            .write_record([
                record.transaction_id.as_str(),
                record.user_id.as_str(),
                &record.amount.to_string(),
                &record.event_time.to_rfc3339(),
                record.merchant_category.as_str(),
                record.payment_method.as_str(),
                record.device_type.as_str(),
                if record.is_international { "1" } else { "0" },
                &record
                    .account_created_at
                    .map(|created| created.to_rfc3339())
                    .unwrap_or_default(),
                record.customer_segment.as_deref().unwrap_or(""),
                if record.is_fraud { "1" } else { "0" },
            ])
            .map_err(|fault| ForgeError::Validation(format!("csv row write: {}", fault)))?;
    }

    csv_writer
        .into_inner()
        .map_err(|fault| ForgeError::Validation(format!("csv finalize: {}", fault)))
}

/// Parsea RFC 3339 o epoch en segundos.
fn parse_flexible_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(stamped) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamped.with_timezone(&Utc));
    }
    raw.parse::<i64>().ok().and_then(|epoch_seconds| {
        DateTime::<Utc>::from_timestamp(epoch_seconds, 0)
    })
}

/// Parsea booleanos tolerantes ("1"/"0"/"true"/"false").
fn parse_flexible_boolean(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

/// Variante por referencia para el encadenado de Option.
fn parse_flexible_boolean_str(raw: &str) -> Option<bool> {
    parse_flexible_boolean(raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOMINAL_CSV: &str = "\
transaction_id,user_id,amount,timestamp,merchant_category,payment_method,device_type,is_international,is_fraud
tx-1,user-a,120.50,2026-01-15T10:00:00Z,electronics,card,mobile,0,0
tx-2,user-a,9000.00,2026-01-15T11:30:00Z,jewelry,wire,desktop,1,1
";

    #[test]
    fn certify_nominal_decoding() {
        let records = parse_transaction_csv(NOMINAL_CSV.as_bytes()).expect("decode");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].user_id, "user-a");
        assert!(records[1].is_fraud);
        assert!(records[1].is_international);
    }

    #[test]
    fn certify_missing_required_column_is_validation() {
        let headless = "transaction_id,user_id,amount,timestamp\ntx,u,1.0,2026-01-01T00:00:00Z\n";
        assert!(matches!(
            parse_transaction_csv(headless.as_bytes()),
            Err(ForgeError::Validation(_))
        ));
    }

    #[test]
    fn certify_empty_dataset_is_validation() {
        let empty = "transaction_id,user_id,amount,timestamp,is_fraud\n";
        assert!(matches!(
            parse_transaction_csv(empty.as_bytes()),
            Err(ForgeError::Validation(_))
        ));
    }

    #[test]
    fn certify_malformed_row_is_decode_fault() {
        let broken = "transaction_id,user_id,amount,timestamp,is_fraud\ntx,u,not-a-number,2026-01-01T00:00:00Z,0\n";
        assert!(matches!(
            parse_transaction_csv(broken.as_bytes()),
            Err(ForgeError::RecordDecode { line: 2, .. })
        ));
    }
}
