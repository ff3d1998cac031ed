use chrono::NaiveDate;
use hisab_core::calendar::{self, Calendar, DateError};
use hisab_core::Transaction;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("Cannot render date: {0}")]
    Date(#[from] DateError),
    #[error("No columns selected")]
    NoColumns,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    DateAd,
    DateBs,
    Type,
    Source,
    Amount,
    Id,
    CreatedAt,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub field: Field,
    pub header: &'static str,
}

impl Column {
    pub const fn new(field: Field, header: &'static str) -> Self {
        Column { field, header }
    }

    fn render(&self, tx: &Transaction) -> Result<String, ExportError> {
        Ok(match self.field {
            Field::DateAd => calendar::format_iso(tx.date),
            Field::DateBs => Calendar::Bs.render(tx.date)?,
            Field::Type => tx.kind.to_string(),
            Field::Source => tx.source.clone(),
            Field::Amount => tx.amount.to_plain_string(),
            Field::Id => tx.id.to_string(),
            Field::CreatedAt => tx.created_at.to_rfc3339(),
        })
    }
}

/// Columns of the dashboard "Export All" file.
pub const EXPORT_ALL_COLUMNS: [Column; 4] = [
    Column::new(Field::DateAd, "Date"),
    Column::new(Field::Type, "Type"),
    Column::new(Field::Source, "Source/Item"),
    Column::new(Field::Amount, "Amount"),
];

/// Columns of the transaction browser "Export Filtered" file.
pub const EXPORT_FILTERED_COLUMNS: [Column; 5] = [
    Column::new(Field::DateBs, "Date (BS)"),
    Column::new(Field::DateAd, "Date (AD)"),
    Column::new(Field::Type, "Type"),
    Column::new(Field::Source, "Source/Item"),
    Column::new(Field::Amount, "Amount (NPR)"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportKind {
    All,
    Filtered,
}

impl ExportKind {
    pub fn columns(self) -> &'static [Column] {
        match self {
            ExportKind::All => &EXPORT_ALL_COLUMNS,
            ExportKind::Filtered => &EXPORT_FILTERED_COLUMNS,
        }
    }
}

/// `transactions-2024-01-15.csv` or `filtered-transactions-2024-01-15.csv`.
pub fn export_file_name(kind: ExportKind, on: NaiveDate) -> String {
    let prefix = match kind {
        ExportKind::All => "transactions",
        ExportKind::Filtered => "filtered-transactions",
    };
    format!("{prefix}-{}.csv", calendar::format_iso(on))
}

/// Writes a header row and one row per transaction, in input order.
/// Fields containing commas, quotes or line breaks are quoted with embedded
/// quotes doubled.
pub fn write_csv<W: Write>(
    writer: W,
    transactions: &[Transaction],
    columns: &[Column],
) -> Result<W, ExportError> {
    if columns.is_empty() {
        return Err(ExportError::NoColumns);
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);

    writer.write_record(columns.iter().map(|c| c.header))?;
    for tx in transactions {
        let row = columns
            .iter()
            .map(|c| c.render(tx))
            .collect::<Result<Vec<_>, _>>()?;
        writer.write_record(&row)?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::IoError(e.into_error()))
}

pub fn to_csv(transactions: &[Transaction], columns: &[Column]) -> Result<String, ExportError> {
    let bytes = write_csv(Vec::new(), transactions, columns)?;
    String::from_utf8(bytes).map_err(|e| ExportError::IoError(io::Error::new(io::ErrorKind::InvalidData, e)))
}

pub fn export_to_file(
    path: &Path,
    transactions: &[Transaction],
    columns: &[Column],
) -> Result<(), ExportError> {
    let file = File::create(path)?;
    let mut file = write_csv(file, transactions, columns)?;
    file.flush()?;
    tracing::info!("Exported {} transactions to {}", transactions.len(), path.display());
    Ok(())
}
