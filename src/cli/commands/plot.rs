//! `metroscope plot` command - Braille scatter plots in the terminal

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::open_engine;
use crate::cli::output::print_structured;
use crate::cli::viz::{render_scatter, PLOT_HEIGHT, PLOT_WIDTH};
use crate::cli::{GlobalOpts, OutputFormat, SelectionArgs};
use crate::core::options::OptionScope;

#[derive(clap::Args, Debug)]
pub struct PlotArgs {
    #[command(flatten)]
    pub target: SelectionArgs,

    /// Plot number (1-based); all plots when omitted
    #[arg(long, short = 'p')]
    pub plot: Option<usize>,

    /// Canvas width in braille dots
    #[arg(long, default_value_t = PLOT_WIDTH)]
    pub width: u32,

    /// Canvas height in braille dots
    #[arg(long, default_value_t = PLOT_HEIGHT)]
    pub height: u32,

    /// List the available plots instead of drawing
    #[arg(long)]
    pub list: bool,
}

/// Run the plot command
pub fn run(args: PlotArgs, global: &GlobalOpts) -> Result<()> {
    let schema = args.target.schema();
    let specs = schema.descriptor().plots;

    if args.list {
        for (i, spec) in specs.iter().enumerate() {
            println!("{}  {}", style(i + 1).cyan(), spec.title);
        }
        return Ok(());
    }

    if let Some(n) = args.plot {
        if n == 0 || n > specs.len() {
            return Err(miette::miette!(
                "Plot {} does not exist; the {} schema has {} plot(s)",
                n,
                schema,
                specs.len()
            ));
        }
    }

    let engine = open_engine(global)?;
    let selection = args.target.selection().into_diagnostic()?;
    let snapshot = engine
        .run(schema, &args.target.tool, &selection, OptionScope::Cascading)
        .into_diagnostic()?;

    let series: Vec<_> = snapshot
        .classification
        .plots
        .iter()
        .enumerate()
        .filter(|(i, _)| args.plot.map_or(true, |n| n == i + 1))
        .map(|(_, s)| s)
        .collect();

    match global.format {
        f @ (OutputFormat::Json | OutputFormat::Yaml) => print_structured(&series, f)?,
        _ => {
            let rendered: Vec<String> = series
                .iter()
                .map(|s| render_scatter(s, args.width, args.height))
                .collect();
            println!("{}", rendered.join("\n\n"));
        }
    }
    Ok(())
}
