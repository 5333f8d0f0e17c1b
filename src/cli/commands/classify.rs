//! `metroscope classify` command - Threshold tags and fit lines

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::open_engine;
use crate::cli::helpers::format_number;
use crate::cli::output::{effective_format, print_rows, print_structured};
use crate::cli::viz::render_band;
use crate::cli::{GlobalOpts, OutputFormat, SelectionArgs};
use crate::core::classify::{column_mean, ThresholdRule};
use crate::core::options::OptionScope;

#[derive(clap::Args, Debug)]
pub struct ClassifyArgs {
    #[command(flatten)]
    pub target: SelectionArgs,
}

/// Run the classify command
pub fn run(args: ClassifyArgs, global: &GlobalOpts) -> Result<()> {
    let engine = open_engine(global)?;
    let schema = args.target.schema();
    let selection = args.target.selection().into_diagnostic()?;
    let snapshot = engine
        .run(schema, &args.target.tool, &selection, OptionScope::Cascading)
        .into_diagnostic()?;
    let classification = &snapshot.classification;

    let format = effective_format(global.format, true);
    if matches!(format, OutputFormat::Json | OutputFormat::Yaml) {
        return print_structured(classification, format);
    }

    let header: Vec<String> = [
        "plot",
        "points",
        "flagged",
        "mean_slope",
        "mean_intercept",
        "custom_slope",
    ]
    .iter()
    .map(|h| h.to_string())
    .collect();
    let rows: Vec<Vec<String>> = classification
        .plots
        .iter()
        .map(|plot| {
            let fit = plot.fit.as_ref();
            vec![
                plot.title.to_string(),
                plot.points.len().to_string(),
                plot.flagged_count().to_string(),
                format_number(fit.map(|f| f.mean_slope), 6),
                format_number(fit.map(|f| f.mean_intercept), 6),
                format_number(fit.map(|f| f.custom_slope), 6),
            ]
        })
        .collect();
    print_rows(format, &header, &rows)?;

    if format != OutputFormat::Table {
        return Ok(());
    }

    let flagged_rows = classification
        .table
        .iter()
        .filter(|r| r.cells.iter().any(|c| c.tag.is_flagged()))
        .count();
    println!(
        "{} of {} row(s) have highlighted cells",
        style(flagged_rows).red().bold(),
        snapshot.rows.len()
    );

    // Observed range against each closed validity band
    let view = snapshot.view();
    let desc = schema.descriptor();
    for rule in &engine.config().thresholds.rules(schema).table {
        let ThresholdRule::OutsideClosed { low, high } = rule.rule else {
            continue;
        };
        let index = desc.field_index(&rule.column).into_diagnostic()?;
        let values: Vec<f64> = view.column(index).filter_map(|v| v.as_f64()).collect();
        if values.is_empty() {
            continue;
        }
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean = column_mean(&view, index).into_diagnostic()?;
        println!();
        println!("{}", render_band(&rule.column, min, max, low, high));
        println!("  mean {:.4}", mean);
    }
    Ok(())
}
