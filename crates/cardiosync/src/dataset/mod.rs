//! Tabular dataset of patient observations.
//!
//! A [`Dataset`] is an append-only Arrow table with the fixed schema from
//! [`schema`]. It round-trips through comma-separated text with a header row
//! and no index column.

pub mod schema;

use std::io::Cursor;
use std::sync::Arc;

use arrow_array::{ArrayRef, Float64Array, Int64Array, RecordBatch, StringArray};
use arrow_csv::reader::Format;
use arrow_csv::{ReaderBuilder, WriterBuilder};
use arrow_schema::ArrowError;
use tracing::debug;

use crate::error::{Error, Result};
use crate::record::Record;

pub use schema::{header_line, record_schema, COLUMNS};

/// An ordered collection of records, oldest first.
#[derive(Debug, Clone)]
pub struct Dataset {
    batch: RecordBatch,
}

impl Dataset {
    /// A dataset with no rows.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            batch: RecordBatch::new_empty(record_schema()),
        }
    }

    /// Build a dataset holding the given records in order.
    ///
    /// # Errors
    ///
    /// Returns an error if the columns cannot be assembled into a batch.
    pub fn from_records(records: &[Record]) -> Result<Self> {
        let columns: Vec<ArrayRef> = vec![
            Arc::new(StringArray::from_iter_values(
                records.iter().map(|r| r.nombre.as_str()),
            )),
            Arc::new(Int64Array::from_iter_values(
                records.iter().map(|r| i64::from(r.edad)),
            )),
            Arc::new(StringArray::from_iter_values(
                records.iter().map(|r| r.genero.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(
                records.iter().map(|r| r.presion_arterial.as_str()),
            )),
            Arc::new(Int64Array::from_iter_values(
                records.iter().map(|r| i64::from(r.frecuencia_cardiaca)),
            )),
            Arc::new(Int64Array::from_iter_values(
                records.iter().map(|r| i64::from(r.frecuencia_respiratoria)),
            )),
            Arc::new(Int64Array::from_iter_values(
                records.iter().map(|r| i64::from(r.saturacion_oxigeno)),
            )),
            Arc::new(Int64Array::from_iter_values(
                records.iter().map(|r| i64::from(r.nt_pro_bnp)),
            )),
            Arc::new(Float64Array::from_iter_values(
                records.iter().map(|r| r.creatinina),
            )),
            Arc::new(StringArray::from_iter_values(
                records.iter().map(|r| r.comentarios.as_str()),
            )),
        ];

        let batch = RecordBatch::try_new(record_schema(), columns)?;
        Ok(Self { batch })
    }

    /// Decode comma-separated content with a header row.
    ///
    /// `origin` names where the bytes came from and is only used in errors.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedDataset`] if the content is empty or any row
    /// fails to decode, and [`Error::ColumnMismatch`] if the header row does
    /// not name the expected columns in order.
    pub fn from_csv(bytes: &[u8], origin: &str) -> Result<Self> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(Error::malformed(
                origin,
                ArrowError::CsvError("no header row".to_string()),
            ));
        }

        let (found, _) = Format::default()
            .with_header(true)
            .infer_schema(Cursor::new(bytes), Some(0))
            .map_err(|e| Error::malformed(origin, e))?;
        let found: Vec<&str> = found.fields().iter().map(|f| f.name().as_str()).collect();
        if found != COLUMNS {
            return Err(Error::ColumnMismatch {
                origin: origin.to_string(),
                expected: header_line(),
                found: found.join(","),
            });
        }

        let schema = record_schema();
        let reader = ReaderBuilder::new(schema.clone())
            .with_header(true)
            .build(Cursor::new(bytes))
            .map_err(|e| Error::malformed(origin, e))?;
        let batches = reader
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| Error::malformed(origin, e))?;

        let batch = arrow_select::concat::concat_batches(&schema, &batches)
            .map_err(|e| Error::malformed(origin, e))?;
        debug!("Decoded {} rows from {}", batch.num_rows(), origin);
        Ok(Self { batch })
    }

    /// Encode as comma-separated UTF-8 text with a header row.
    ///
    /// # Errors
    ///
    /// Returns an error if a column cannot be formatted.
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        self.encode(true)
    }

    /// Encode the rows only, without a header row.
    ///
    /// # Errors
    ///
    /// Returns an error if a column cannot be formatted.
    pub fn to_csv_rows(&self) -> Result<Vec<u8>> {
        self.encode(false)
    }

    fn encode(&self, header: bool) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        {
            let mut writer = WriterBuilder::new().with_header(header).build(&mut out);
            writer.write(&self.batch)?;
        }
        Ok(out)
    }

    /// Return a new dataset with `other`'s rows after this one's.
    ///
    /// # Errors
    ///
    /// Returns an error if the batches cannot be concatenated.
    pub fn append(&self, other: &Dataset) -> Result<Self> {
        let batch =
            arrow_select::concat::concat_batches(&record_schema(), [&self.batch, &other.batch])?;
        Ok(Self { batch })
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.batch.num_rows()
    }

    /// Whether the dataset holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.batch.num_rows() == 0
    }

    /// The underlying Arrow batch.
    #[must_use]
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    /// Render as an aligned text table.
    ///
    /// # Errors
    ///
    /// Returns an error if a value cannot be formatted.
    pub fn pretty(&self) -> Result<String> {
        let table = arrow_cast::pretty::pretty_format_batches(std::slice::from_ref(&self.batch))?;
        Ok(table.to_string())
    }
}

impl Default for Dataset {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Gender;

    fn ana() -> Record {
        let mut record = Record::new("Ana", 45, Gender::Femenino);
        record.presion_arterial = "120/80".to_string();
        record.frecuencia_cardiaca = 98;
        record.frecuencia_respiratoria = 22;
        record.saturacion_oxigeno = 91;
        record.nt_pro_bnp = 1500;
        record.creatinina = 1.25;
        record.comentarios = "disnea".to_string();
        record
    }

    #[test]
    fn test_empty_dataset() {
        let dataset = Dataset::empty();
        assert!(dataset.is_empty());
        assert_eq!(dataset.len(), 0);
        assert_eq!(dataset.batch().num_columns(), COLUMNS.len());
    }

    #[test]
    fn test_to_csv_single_record() {
        let dataset = Dataset::from_records(&[ana()]).unwrap();
        let text = String::from_utf8(dataset.to_csv().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], header_line());
        assert_eq!(lines[1], "Ana,45,Femenino,120/80,98,22,91,1500,1.25,disnea");
    }

    #[test]
    fn test_to_csv_rows_has_no_header() {
        let dataset = Dataset::from_records(&[ana()]).unwrap();
        let rows = dataset.to_csv_rows().unwrap();
        assert_eq!(rows, b"Ana,45,Femenino,120/80,98,22,91,1500,1.25,disnea\n");
    }

    #[test]
    fn test_quoted_fields_survive_reload() {
        let mut record = ana();
        record.comentarios = "edema, ortopnea \"grave\"".to_string();
        let original = Dataset::from_records(&[record]).unwrap().to_csv().unwrap();

        let reloaded = Dataset::from_csv(&original, "test").unwrap();
        assert_eq!(reloaded.len(), 1);
        assert_eq!(reloaded.to_csv().unwrap(), original);
    }

    #[test]
    fn test_append_keeps_order() {
        let first = Dataset::from_records(&[ana()]).unwrap();
        let second = Dataset::from_records(&[Record::new("Luis", 70, Gender::Masculino)]).unwrap();

        let combined = first.append(&second).unwrap();
        assert_eq!(combined.len(), 2);

        let text = String::from_utf8(combined.to_csv().unwrap()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[1].starts_with("Ana,"));
        assert!(lines[2].starts_with("Luis,70,Masculino,"));
    }

    #[test]
    fn test_append_to_empty() {
        let combined = Dataset::empty()
            .append(&Dataset::from_records(&[ana()]).unwrap())
            .unwrap();
        assert_eq!(combined.len(), 1);
    }

    #[test]
    fn test_from_csv_empty_content() {
        let err = Dataset::from_csv(b"", "empty.csv").unwrap_err();
        assert!(matches!(err, Error::MalformedDataset { .. }));
    }

    #[test]
    fn test_from_csv_header_only() {
        let content = format!("{}\n", header_line());
        let dataset = Dataset::from_csv(content.as_bytes(), "header.csv").unwrap();
        assert!(dataset.is_empty());
    }

    #[test]
    fn test_from_csv_wrong_header() {
        let err = Dataset::from_csv(b"Name,Age\nAna,45\n", "other.csv").unwrap_err();
        match err {
            Error::ColumnMismatch { origin, found, .. } => {
                assert_eq!(origin, "other.csv");
                assert_eq!(found, "Name,Age");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_from_csv_unparseable_number() {
        let content = format!(
            "{}\nAna,cuarenta,Femenino,120/80,98,22,91,1500,1.25,\n",
            header_line()
        );
        let err = Dataset::from_csv(content.as_bytes(), "bad.csv").unwrap_err();
        assert!(err.is_malformed_data());
    }

    #[test]
    fn test_from_csv_short_row() {
        let content = format!("{}\nAna,45\n", header_line());
        let err = Dataset::from_csv(content.as_bytes(), "short.csv").unwrap_err();
        assert!(err.is_malformed_data());
    }

    #[test]
    fn test_empty_fields_written_back_empty() {
        let content = format!("{}\nAna,45,Femenino,,98,22,91,1500,1.25,\n", header_line());
        let dataset = Dataset::from_csv(content.as_bytes(), "gaps.csv").unwrap();
        assert_eq!(dataset.to_csv().unwrap(), content.as_bytes());
    }

    #[test]
    fn test_pretty_contains_values() {
        let dataset = Dataset::from_records(&[ana()]).unwrap();
        let table = dataset.pretty().unwrap();
        assert!(table.contains("Nombre"));
        assert!(table.contains("Ana"));
    }
}
