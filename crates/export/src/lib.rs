pub mod csv;

pub use self::csv::{
    export_file_name, export_to_file, to_csv, write_csv, Column, ExportError, ExportKind, Field,
    EXPORT_ALL_COLUMNS, EXPORT_FILTERED_COLUMNS,
};
