//! Column layout of the observation dataset.
//!
//! The header names are the ones the form has always written, so files
//! produced by earlier versions load unchanged.

use std::sync::{Arc, OnceLock};

use arrow_schema::{DataType, Field, Schema, SchemaRef};

/// Column headers, in file order.
pub const COLUMNS: [&str; 10] = [
    "Nombre",
    "Edad",
    "Género",
    "Presión Arterial",
    "Frecuencia Cardíaca",
    "Frecuencia Respiratoria",
    "Saturación de Oxígeno",
    "NT-proBNP",
    "Creatinina",
    "Comentarios",
];

/// Arrow type of each column, aligned with [`COLUMNS`].
const TYPES: [DataType; 10] = [
    DataType::Utf8,
    DataType::Int64,
    DataType::Utf8,
    DataType::Utf8,
    DataType::Int64,
    DataType::Int64,
    DataType::Int64,
    DataType::Int64,
    DataType::Float64,
    DataType::Utf8,
];

/// The dataset schema.
///
/// Every column is nullable: empty fields in an existing file decode to
/// nulls and are written back as empty fields.
#[must_use]
pub fn record_schema() -> SchemaRef {
    static SCHEMA: OnceLock<SchemaRef> = OnceLock::new();
    SCHEMA
        .get_or_init(|| {
            let fields: Vec<Field> = COLUMNS
                .iter()
                .zip(TYPES)
                .map(|(name, data_type)| Field::new(*name, data_type, true))
                .collect();
            Arc::new(Schema::new(fields))
        })
        .clone()
}

/// The header row as written by the serializer.
#[must_use]
pub fn header_line() -> String {
    COLUMNS.join(",")
}
