//! CSV export of registered batches.
//!
//! Each record is run through the calculator, so the "Labels Needed" and
//! "Extra Pieces" columns always agree with the current calculation rules.

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::calculator::compute_input;
use crate::model::{CalcError, PackingInput, PackingResult};

pub const CSV_HEADERS: [&str; 11] = [
    "ID",
    "Date and Time",
    "Part Code",
    "Batch",
    "Total Pieces",
    "Pieces per Container",
    "Containers per Pallet",
    "Extra Pieces",
    "Labels Needed",
    "Labels Used",
    "Notes",
];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExportError {
    #[error("Record {id} cannot be exported: {source}")]
    InvalidRecord {
        id: u64,
        #[source]
        source: CalcError,
    },
}

/// A registered production batch as supplied by the record store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[schema(
    example = json!({
        "id": 7,
        "date_created": "2026-10-15 08:30",
        "part_code": "A-100",
        "batch_number": "L-2291",
        "total_pieces": 1025,
        "pieces_per_container": 50,
        "containers_per_pallet": 10,
        "used_labels": 0,
        "notes": ""
    })
)]
pub struct BatchRecord {
    pub id: u64,
    #[serde(default)]
    pub date_created: String,
    pub part_code: String,
    pub batch_number: String,
    pub total_pieces: i64,
    pub pieces_per_container: i64,
    pub containers_per_pallet: i64,
    #[serde(default)]
    pub used_labels: u64,
    #[serde(default)]
    pub notes: String,
}

impl BatchRecord {
    pub fn packing_input(&self) -> PackingInput {
        PackingInput::new(
            self.total_pieces,
            self.pieces_per_container,
            self.containers_per_pallet,
        )
    }

    /// Calculates the record, tagging failures with the record id.
    pub fn calculate(&self) -> Result<PackingResult, ExportError> {
        compute_input(&self.packing_input())
            .map_err(|source| ExportError::InvalidRecord { id: self.id, source })
    }
}

fn escape_field(raw: &str) -> String {
    if raw.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", raw.replace('"', "\"\""))
    } else {
        raw.to_string()
    }
}

fn push_row<I, S>(out: &mut String, fields: I)
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let row = fields
        .into_iter()
        .map(|field| escape_field(field.as_ref()))
        .collect::<Vec<_>>()
        .join(",");
    out.push_str(&row);
    out.push('\n');
}

/// Renders records as CSV with a header row.
///
/// Fails on the first record whose capacities are invalid.
pub fn records_to_csv(records: &[BatchRecord]) -> Result<String, ExportError> {
    let mut out = String::new();
    push_row(&mut out, CSV_HEADERS);

    for record in records {
        let result = record.calculate()?;
        push_row(
            &mut out,
            [
                record.id.to_string(),
                record.date_created.clone(),
                record.part_code.clone(),
                record.batch_number.clone(),
                record.total_pieces.to_string(),
                record.pieces_per_container.to_string(),
                record.containers_per_pallet.to_string(),
                result.extra_pieces().to_string(),
                result.labels_needed().to_string(),
                record.used_labels.to_string(),
                record.notes.clone(),
            ],
        );
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: u64, total_pieces: i64, per_container: i64, per_pallet: i64) -> BatchRecord {
        BatchRecord {
            id,
            date_created: "2026-10-15 08:30".to_string(),
            part_code: "A-100".to_string(),
            batch_number: "L-1".to_string(),
            total_pieces,
            pieces_per_container: per_container,
            containers_per_pallet: per_pallet,
            used_labels: 0,
            notes: String::new(),
        }
    }

    #[test]
    fn header_only_for_no_records() {
        let csv = records_to_csv(&[]).unwrap();
        assert_eq!(csv.lines().count(), 1);
        assert!(csv.starts_with("ID,Date and Time,Part Code"));
        assert!(csv.contains("Extra Pieces,Labels Needed"));
    }

    #[test]
    fn rows_carry_labels_and_extra_pieces() {
        let csv = records_to_csv(&[record(1, 1025, 50, 10)]).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(row, "1,2026-10-15 08:30,A-100,L-1,1025,50,10,25,21,0,");
    }

    #[test]
    fn notes_with_separators_are_quoted() {
        let mut rec = record(2, 100, 10, 1);
        rec.notes = "checked, \"ok\"".to_string();
        let csv = records_to_csv(&[rec]).unwrap();
        assert!(csv.ends_with(",\"checked, \"\"ok\"\"\"\n"));
    }

    #[test]
    fn invalid_record_reports_its_id() {
        let err = records_to_csv(&[record(1, 10, 5, 1), record(9, 10, 0, 1)]).unwrap_err();
        let ExportError::InvalidRecord { id, source } = err;
        assert_eq!(id, 9);
        assert_eq!(source.field(), "units_per_container");
    }

    #[test]
    fn record_deserializes_with_defaults() {
        let json = r#"{
            "id": 3,
            "part_code": "B-7",
            "batch_number": "L-9",
            "total_pieces": 10,
            "pieces_per_container": 3,
            "containers_per_pallet": 1
        }"#;
        let rec: BatchRecord = serde_json::from_str(json).expect("Should parse valid JSON");
        assert_eq!(rec.used_labels, 0);
        assert!(rec.notes.is_empty());
        assert_eq!(rec.calculate().unwrap().labels_needed(), 4);
    }
}
