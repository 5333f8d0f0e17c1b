//! `metroscope rows` command - Records matching a selection

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::cli::commands::open_engine;
use crate::cli::output::{effective_format, print_rows, print_structured};
use crate::cli::{GlobalOpts, OutputFormat, SelectionArgs};
use crate::core::classify::RowFlags;
use crate::core::dataset::Record;
use crate::core::options::OptionScope;

/// Leading column naming the tool each row came from
pub const TOOL_COLUMN: &str = "Tool Number";

#[derive(clap::Args, Debug)]
pub struct RowsArgs {
    #[command(flatten)]
    pub target: SelectionArgs,

    /// Limit number of rows shown
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show count only
    #[arg(long)]
    pub count: bool,
}

/// A record serialized as an ordered map, tool number first
struct RowOut<'a> {
    tool: &'a str,
    names: &'a [&'static str],
    record: &'a Record,
    flagged: Vec<&'static str>,
}

impl Serialize for RowOut<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.names.len() + 2))?;
        map.serialize_entry(TOOL_COLUMN, self.tool)?;
        for (name, value) in self.names.iter().zip(self.record.values()) {
            map.serialize_entry(name, value)?;
        }
        map.serialize_entry("flagged", &self.flagged)?;
        map.end()
    }
}

fn flagged_columns(flags: Option<&RowFlags>) -> Vec<&'static str> {
    flags
        .map(|f| {
            f.cells
                .iter()
                .filter(|c| c.tag.is_flagged())
                .map(|c| c.column)
                .collect()
        })
        .unwrap_or_default()
}

/// Run the rows command
pub fn run(args: RowsArgs, global: &GlobalOpts) -> Result<()> {
    let engine = open_engine(global)?;
    let schema = args.target.schema();
    let selection = args.target.selection().into_diagnostic()?;
    let snapshot = engine
        .run(schema, &args.target.tool, &selection, OptionScope::Cascading)
        .into_diagnostic()?;

    if args.count {
        println!("{}", snapshot.rows.len());
        return Ok(());
    }

    let names: Vec<&'static str> = schema.descriptor().field_names().collect();
    let limit = args.limit.unwrap_or(usize::MAX);
    let tool = snapshot.dataset.tool_id();
    let shown: Vec<(&Record, Option<&RowFlags>)> = snapshot
        .records()
        .enumerate()
        .take(limit)
        .map(|(pos, record)| (record, snapshot.classification.table.get(pos)))
        .collect();

    let format = effective_format(global.format, true);
    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            let out: Vec<RowOut<'_>> = shown
                .iter()
                .map(|(record, flags)| RowOut {
                    tool,
                    names: &names,
                    record,
                    flagged: flagged_columns(*flags),
                })
                .collect();
            print_structured(&out, format)?;
        }
        _ => {
            let highlight = format == OutputFormat::Table;
            let mut header = vec![TOOL_COLUMN.to_string()];
            header.extend(names.iter().map(|n| n.to_string()));

            let rows: Vec<Vec<String>> = shown
                .iter()
                .map(|(record, flags)| {
                    let mut cells = vec![tool.to_string()];
                    for (name, value) in names.iter().zip(record.values()) {
                        let text = value.to_string();
                        let flagged = flags.is_some_and(|f| f.is_flagged(name));
                        if highlight && flagged {
                            cells.push(style(text).red().bold().to_string());
                        } else {
                            cells.push(text);
                        }
                    }
                    cells
                })
                .collect();
            print_rows(format, &header, &rows)?;

            if highlight {
                println!(
                    "{} of {} row(s) shown",
                    style(rows.len()).cyan(),
                    snapshot.rows.len()
                );
            }
        }
    }
    Ok(())
}
