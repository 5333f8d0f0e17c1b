//! Output formatting utilities

use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::helpers::escape_tsv;
use crate::cli::OutputFormat;

/// Determine the effective output format based on context
pub fn effective_format(format: OutputFormat, is_list: bool) -> OutputFormat {
    match format {
        OutputFormat::Auto => {
            if is_list {
                OutputFormat::Tsv
            } else {
                OutputFormat::Yaml
            }
        }
        other => other,
    }
}

/// Print a value as pretty JSON or YAML
pub fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value).into_diagnostic()?);
        }
        _ => {
            print!("{}", serde_yml::to_string(value).into_diagnostic()?);
        }
    }
    Ok(())
}

/// Print rows as TSV, header first
pub fn print_tsv(header: &[String], rows: &[Vec<String>]) {
    println!("{}", header.join("\t"));
    for row in rows {
        let cells: Vec<String> = row.iter().map(|c| escape_tsv(c)).collect();
        println!("{}", cells.join("\t"));
    }
}

/// Print rows as RFC 4180 CSV, header first
pub fn print_csv(header: &[String], rows: &[Vec<String>]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(std::io::stdout());
    writer.write_record(header).into_diagnostic()?;
    for row in rows {
        writer.write_record(row).into_diagnostic()?;
    }
    writer.flush().into_diagnostic()?;
    Ok(())
}

/// Render rows as a boxed terminal table
pub fn render_table(header: &[String], rows: &[Vec<String>]) -> String {
    let mut builder = Builder::default();
    builder.push_record(header.iter().cloned());
    for row in rows {
        builder.push_record(row.iter().cloned());
    }
    let mut table = builder.build();
    table.with(Style::rounded());
    table.to_string()
}

/// Print rows in a flat format (TSV, CSV or table)
pub fn print_rows(format: OutputFormat, header: &[String], rows: &[Vec<String>]) -> Result<()> {
    match format {
        OutputFormat::Csv => print_csv(header, rows)?,
        OutputFormat::Table => println!("{}", render_table(header, rows)),
        _ => print_tsv(header, rows),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_format() {
        assert_eq!(effective_format(OutputFormat::Auto, true), OutputFormat::Tsv);
        assert_eq!(effective_format(OutputFormat::Auto, false), OutputFormat::Yaml);
        assert_eq!(effective_format(OutputFormat::Csv, false), OutputFormat::Csv);
    }

    #[test]
    fn test_render_table_contains_cells() {
        let header = vec!["Facet".to_string(), "Values".to_string()];
        let rows = vec![vec!["Lot".to_string(), "L1, L2".to_string()]];
        let table = render_table(&header, &rows);
        assert!(table.contains("Facet"));
        assert!(table.contains("L1, L2"));
        assert!(table.starts_with('╭'));
    }
}
