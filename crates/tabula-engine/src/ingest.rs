//! Bulk ingest from delimited files.

use std::fs::File;

use csv::{ReaderBuilder, Terminator};
use tabula_core::ast::{Literal, Load};
use tracing::info;

use crate::catalog::Catalog;
use crate::error::{EngineError, Result};

/// Loads a delimited file into a relation.
///
/// Fields arrive in declared column order; each row passes through the same
/// validation as a single-row insert, so key and FK constraints hold for
/// every loaded row. The first failing row aborts the load; rows already
/// ingested remain.
///
/// Returns the number of rows ingested.
///
/// # Errors
///
/// Returns an I/O error when the file cannot be read, and constraint or
/// conversion errors from the per-row inserts.
pub fn load(catalog: &mut Catalog, command: &Load) -> Result<usize> {
    let relation = catalog.get(&command.table)?;
    let columns: Vec<String> = relation
        .columns()
        .iter()
        .map(|c| c.name.clone())
        .collect();

    if !command.field_separator.is_ascii() {
        return Err(EngineError::InvalidSeparator(command.field_separator));
    }
    if !command.line_terminator.is_ascii() {
        return Err(EngineError::InvalidSeparator(command.line_terminator));
    }

    let file = File::open(&command.path)?;
    let mut builder = ReaderBuilder::new();
    builder
        .has_headers(false)
        .delimiter(command.field_separator as u8);
    if command.line_terminator != '\n' {
        builder.terminator(Terminator::Any(command.line_terminator as u8));
    }
    let mut reader = builder.from_reader(file);

    let mut ingested = 0usize;
    for (i, record) in reader.records().enumerate() {
        let record = record?;
        if i < command.skip_rows {
            continue;
        }
        let values: Vec<Literal> = record
            .iter()
            .map(|field| Literal::Str(String::from(field)))
            .collect();
        catalog.insert(&command.table, &columns, &values)?;
        ingested += 1;
    }

    info!(table = %command.table, rows = ingested, "load finished");
    Ok(ingested)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tabula_core::ast::{ColumnDef, CreateTable, DataType};

    fn catalog() -> Catalog {
        let mut catalog = Catalog::new();
        catalog
            .create_table(CreateTable {
                name: String::from("df1"),
                columns: vec![
                    ColumnDef {
                        name: String::from("Letter"),
                        data_type: DataType::Varchar(3),
                    },
                    ColumnDef {
                        name: String::from("Number"),
                        data_type: DataType::Int,
                    },
                ],
                primary_key: String::from("Letter"),
                foreign_keys: vec![],
            })
            .unwrap();
        catalog
    }

    fn write_file(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn load_cmd(path: &std::path::Path, skip_rows: usize) -> Load {
        Load {
            table: String::from("df1"),
            path: path.to_string_lossy().into_owned(),
            field_separator: ',',
            line_terminator: '\n',
            skip_rows,
        }
    }

    #[test]
    fn test_load_with_header_skip() {
        let mut catalog = catalog();
        let file = write_file("Letter,Number\naab,10\naac,20\n");
        let loaded = load(&mut catalog, &load_cmd(file.path(), 1)).unwrap();
        assert_eq!(loaded, 2);
        assert_eq!(catalog.get("df1").unwrap().row_count(), 2);
    }

    #[test]
    fn test_header_only_file_is_noop() {
        let mut catalog = catalog();
        let file = write_file("Letter,Number\n");
        let loaded = load(&mut catalog, &load_cmd(file.path(), 1)).unwrap();
        assert_eq!(loaded, 0);
        assert_eq!(catalog.get("df1").unwrap().row_count(), 0);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut catalog = catalog();
        let command = Load {
            table: String::from("df1"),
            path: String::from("/nonexistent/data.csv"),
            field_separator: ',',
            line_terminator: '\n',
            skip_rows: 0,
        };
        assert!(matches!(
            load(&mut catalog, &command),
            Err(EngineError::Io(_))
        ));
    }

    #[test]
    fn test_bad_row_aborts_but_keeps_prior_rows() {
        let mut catalog = catalog();
        let file = write_file("aab,10\naac,not_a_number\naad,30\n");
        let result = load(&mut catalog, &load_cmd(file.path(), 0));
        assert!(matches!(result, Err(EngineError::TypeConversion { .. })));
        assert_eq!(catalog.get("df1").unwrap().row_count(), 1);
    }

    #[test]
    fn test_custom_field_separator() {
        let mut catalog = catalog();
        let file = write_file("aab|10\naac|20\n");
        let mut command = load_cmd(file.path(), 0);
        command.field_separator = '|';
        assert_eq!(load(&mut catalog, &command).unwrap(), 2);
    }
}
