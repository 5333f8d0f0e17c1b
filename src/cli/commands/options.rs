//! `metroscope options` command - Facet options under a selection

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::open_engine;
use crate::cli::helpers::join_values;
use crate::cli::output::{effective_format, print_rows, print_structured};
use crate::cli::{GlobalOpts, OutputFormat, SelectionArgs};
use crate::core::options::OptionScope;

#[derive(clap::Args, Debug)]
pub struct OptionsArgs {
    #[command(flatten)]
    pub target: SelectionArgs,

    /// Compute each facet's options without its own constraint
    #[arg(long)]
    pub exclude_self: bool,

    /// Only show this facet
    #[arg(long)]
    pub facet: Option<String>,
}

/// Run the options command
pub fn run(args: OptionsArgs, global: &GlobalOpts) -> Result<()> {
    let engine = open_engine(global)?;
    let schema = args.target.schema();
    let selection = args.target.selection().into_diagnostic()?;
    let scope = if args.exclude_self {
        OptionScope::ExcludeOwnFacet
    } else {
        OptionScope::Cascading
    };

    let only = match &args.facet {
        Some(name) => Some(schema.descriptor().find_facet(name).ok_or_else(|| {
            miette::miette!("'{}' is not a facet of the {} schema", name, schema)
        })?),
        None => None,
    };

    let dataset = engine.load(schema, &args.target.tool).into_diagnostic()?;
    let options = engine
        .resolve_options(&dataset, &selection, scope)
        .into_diagnostic()?;
    let entries: Vec<_> = options
        .iter()
        .filter(|e| only.map_or(true, |f| f == e.facet))
        .collect();

    match effective_format(global.format, true) {
        f @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&entries, f)?,
        OutputFormat::Table => {
            let header = vec![
                "Facet".to_string(),
                "Count".to_string(),
                "Options".to_string(),
            ];
            let rows: Vec<Vec<String>> = entries
                .iter()
                .map(|e| {
                    vec![
                        e.facet.to_string(),
                        e.values.len().to_string(),
                        join_values(&e.values, 60),
                    ]
                })
                .collect();
            print_rows(OutputFormat::Table, &header, &rows)?;
            if dataset.is_empty() {
                println!(
                    "No {} data for tool {}",
                    schema,
                    style(&args.target.tool).yellow()
                );
            }
        }
        format => {
            // One line per option keeps the output grep-friendly
            let header = vec!["facet".to_string(), "value".to_string()];
            let rows: Vec<Vec<String>> = entries
                .iter()
                .flat_map(|e| {
                    e.values
                        .iter()
                        .map(move |v| vec![e.facet.to_string(), v.to_string()])
                })
                .collect();
            print_rows(format, &header, &rows)?;
        }
    }
    Ok(())
}
