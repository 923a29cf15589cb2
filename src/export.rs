use crate::errors::{AppError, AppResult};
use crate::models::MeasurementRecord;
use serde::{Deserialize, Serialize};
use serde_json::json;

pub const FIELD_NAMES: [&str; 9] = [
    "date",
    "department",
    "unit",
    "machine",
    "shift",
    "energy",
    "water",
    "waste",
    "emissions",
];

pub const CSV_FILE_NAME: &str = "sustainability_export.csv";
pub const XLSX_FILE_NAME: &str = "sustainability_export.xlsx";
pub const PDF_FILE_NAME: &str = "dashboard.pdf";
pub const SNAPSHOT_SELECTOR: &str = ".dashboard-root";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    Csv,
    Xlsx,
    Pdf,
}

/// Input for the spreadsheet encoder: one sheet, header row plus one row per
/// record, numbers kept as numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetTable {
    pub name: String,
    pub header: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

/// Handed to the page-capture collaborator for the visual snapshot export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRequest {
    pub selector: String,
    pub file_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ExportArtifact {
    Csv {
        file_name: String,
        content: String,
    },
    Sheet {
        file_name: String,
        table: SheetTable,
    },
    Snapshot {
        request: SnapshotRequest,
    },
}

/// Delimited serialization of the displayed subset as-is: header row of field
/// names, one data row per record.
pub fn csv_text(records: &[MeasurementRecord]) -> AppResult<String> {
    if records.is_empty() {
        return Err(AppError::Validation("No data to export".to_string()));
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in records {
        writer.serialize(record)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| AppError::Internal(err.to_string()))?;
    String::from_utf8(bytes).map_err(|err| AppError::Internal(err.to_string()))
}

pub fn sheet(records: &[MeasurementRecord]) -> AppResult<SheetTable> {
    if records.is_empty() {
        return Err(AppError::Validation("No data to export".to_string()));
    }

    let rows = records
        .iter()
        .map(|record| {
            vec![
                json!(record.date),
                json!(record.department),
                json!(record.unit),
                json!(record.machine),
                json!(record.shift),
                json!(record.energy),
                json!(record.water),
                json!(record.waste),
                json!(record.emissions),
            ]
        })
        .collect();

    Ok(SheetTable {
        name: "Data".to_string(),
        header: FIELD_NAMES.iter().map(|name| name.to_string()).collect(),
        rows,
    })
}

pub fn snapshot_request() -> SnapshotRequest {
    SnapshotRequest {
        selector: SNAPSHOT_SELECTOR.to_string(),
        file_name: PDF_FILE_NAME.to_string(),
    }
}

pub fn build(format: ExportFormat, records: &[MeasurementRecord]) -> AppResult<ExportArtifact> {
    match format {
        ExportFormat::Csv => Ok(ExportArtifact::Csv {
            file_name: CSV_FILE_NAME.to_string(),
            content: csv_text(records)?,
        }),
        ExportFormat::Xlsx => Ok(ExportArtifact::Sheet {
            file_name: XLSX_FILE_NAME.to_string(),
            table: sheet(records)?,
        }),
        ExportFormat::Pdf => Ok(ExportArtifact::Snapshot {
            request: snapshot_request(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::{build, csv_text, sheet, ExportArtifact, ExportFormat, FIELD_NAMES};
    use crate::models::MeasurementRecord;

    fn record() -> MeasurementRecord {
        MeasurementRecord {
            date: "2025-03-01".to_string(),
            department: "Dyeing".to_string(),
            unit: "Unit A".to_string(),
            machine: "Machine 1".to_string(),
            shift: "2".to_string(),
            energy: 120.5,
            water: 300.0,
            waste: 20.0,
            emissions: 45.5,
        }
    }

    #[test]
    fn csv_has_a_header_row_and_one_row_per_record() {
        let text = csv_text(&[record(), record()]).expect("csv");
        let lines: Vec<&str> = text.trim_end().lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], FIELD_NAMES.join(","));
        assert!(lines[1].starts_with("2025-03-01,Dyeing,Unit A,Machine 1,2,120.5"));
    }

    #[test]
    fn empty_subset_is_a_validation_failure() {
        assert!(csv_text(&[]).is_err());
        assert!(sheet(&[]).is_err());
    }

    #[test]
    fn sheet_keeps_numbers_as_numbers() {
        let table = sheet(&[record()]).expect("sheet");
        assert_eq!(table.name, "Data");
        assert_eq!(table.header, FIELD_NAMES.to_vec());
        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0][0], "2025-03-01");
        assert_eq!(table.rows[0][5], 120.5);
    }

    #[test]
    fn pdf_export_is_a_snapshot_request() {
        let artifact = build(ExportFormat::Pdf, &[]).expect("artifact");
        match artifact {
            ExportArtifact::Snapshot { request } => {
                assert_eq!(request.selector, ".dashboard-root");
                assert_eq!(request.file_name, "dashboard.pdf");
            }
            other => panic!("unexpected artifact: {other:?}"),
        }
    }
}
