//! `metroscope tools` command - List the tool catalog

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::open_engine;
use crate::cli::output::{effective_format, print_rows, print_structured};
use crate::cli::{GlobalOpts, OutputFormat};

#[derive(clap::Args, Debug)]
pub struct ToolsArgs {
    /// Show count only
    #[arg(long)]
    pub count: bool,
}

/// Run the tools command
pub fn run(args: ToolsArgs, global: &GlobalOpts) -> Result<()> {
    let engine = open_engine(global)?;
    let tools: Vec<String> = engine.tool_catalog().into_diagnostic()?.into_iter().collect();

    if args.count {
        println!("{}", tools.len());
        return Ok(());
    }

    match effective_format(global.format, true) {
        f @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&tools, f)?,
        OutputFormat::Table => {
            if tools.is_empty() {
                println!(
                    "No tool databases found in {}",
                    style(engine.config().data_dir.display()).yellow()
                );
                return Ok(());
            }
            let rows: Vec<Vec<String>> = tools.iter().map(|t| vec![t.clone()]).collect();
            print_rows(OutputFormat::Table, &["Tool Number".to_string()], &rows)?;
            println!("{} tool(s)", style(tools.len()).cyan());
        }
        OutputFormat::Csv => {
            let rows: Vec<Vec<String>> = tools.iter().map(|t| vec![t.clone()]).collect();
            print_rows(OutputFormat::Csv, &["Tool Number".to_string()], &rows)?;
        }
        OutputFormat::Tsv | OutputFormat::Auto => {
            for tool in &tools {
                println!("{}", tool);
            }
        }
    }
    Ok(())
}
