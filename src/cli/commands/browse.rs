//! `metroscope browse` command - Interactive cascading selection
//!
//! Every pick re-runs the engine, so each facet's menu only offers values
//! still reachable under the current selection.

use console::style;
use dialoguer::{theme::ColorfulTheme, MultiSelect, Select};
use miette::{IntoDiagnostic, Result};
use std::io::IsTerminal;

use crate::cli::commands::open_engine;
use crate::cli::filters::{escape_value, SchemaArg};
use crate::cli::GlobalOpts;
use crate::core::options::{OptionScope, OptionsMap};
use crate::core::schema::SchemaKind;
use crate::core::selection::FacetSelection;
use crate::core::value::FieldValue;

#[derive(clap::Args, Debug)]
pub struct BrowseArgs {
    /// Dataset schema
    #[arg(value_enum)]
    pub schema: SchemaArg,

    /// Tool number
    pub tool: String,

    /// Offer each facet's values without its own constraint
    #[arg(long)]
    pub exclude_self: bool,
}

enum Action {
    Facet(&'static str),
    Summary,
    ClearAll,
    Done,
}

/// Run the browse command
pub fn run(args: BrowseArgs, global: &GlobalOpts) -> Result<()> {
    if !std::io::stdin().is_terminal() {
        return Err(miette::miette!(
            "browse needs an interactive terminal; use 'options' and 'rows' with -f instead"
        ));
    }

    let engine = open_engine(global)?;
    let schema: SchemaKind = args.schema.into();
    let scope = if args.exclude_self {
        OptionScope::ExcludeOwnFacet
    } else {
        OptionScope::Cascading
    };
    let theme = ColorfulTheme::default();
    let mut selection = FacetSelection::new(schema);

    loop {
        let snapshot = engine
            .run(schema, &args.tool, &selection, scope)
            .into_diagnostic()?;
        println!(
            "{} {} row(s) match on tool {}",
            style("→").cyan(),
            style(snapshot.rows.len()).cyan(),
            args.tool
        );

        let mut actions = Vec::new();
        let mut labels = Vec::new();
        for entry in snapshot.options.iter() {
            let picked = selection.values(entry.facet).map_or(0, |s| s.len());
            let mut label = format!("{:<22} {} option(s)", entry.facet, entry.values.len());
            if picked > 0 {
                label.push_str(&format!(", {} selected", picked));
            }
            labels.push(label);
            actions.push(Action::Facet(entry.facet));
        }
        labels.extend(["Summary", "Clear all", "Done"].map(String::from));
        actions.extend([Action::Summary, Action::ClearAll, Action::Done]);

        let choice = Select::with_theme(&theme)
            .with_prompt("Facet")
            .items(&labels)
            .default(0)
            .interact()
            .into_diagnostic()?;

        match actions.get(choice) {
            Some(Action::Facet(facet)) => {
                let values = picker_values(&snapshot.options, facet);
                if values.is_empty() {
                    println!("{} has no options", style(facet).yellow());
                    continue;
                }

                let current = selection.values(facet).cloned().unwrap_or_default();
                let defaults: Vec<bool> = values.iter().map(|v| current.contains(v)).collect();
                let value_labels: Vec<String> = values.iter().map(display_value).collect();
                let picked = MultiSelect::with_theme(&theme)
                    .with_prompt(format!("{} (space to toggle)", facet))
                    .items(&value_labels)
                    .defaults(&defaults)
                    .interact()
                    .into_diagnostic()?;

                selection.clear(facet).into_diagnostic()?;
                selection
                    .select(facet, picked.into_iter().map(|i| values[i].clone()))
                    .into_diagnostic()?;
            }
            Some(Action::Summary) => {
                for plot in &snapshot.classification.plots {
                    println!(
                        "  {:<28} {:>6} point(s) {:>6} flagged",
                        plot.title,
                        plot.points.len(),
                        style(plot.flagged_count()).red()
                    );
                }
            }
            Some(Action::ClearAll) => selection = FacetSelection::new(schema),
            Some(Action::Done) | None => break,
        }
    }

    print_equivalent(&args, &selection, schema.descriptor().facets);
    Ok(())
}

/// Values offered when editing a facet, as counted in the facet menu
///
/// Under the cascading scope a facet with a selection only offers what is
/// already selected; use "Clear all" or `--exclude-self` to widen it.
fn picker_values(options: &OptionsMap, facet: &str) -> Vec<FieldValue> {
    options.get(facet).map(<[_]>::to_vec).unwrap_or_default()
}

fn display_value(value: &FieldValue) -> String {
    if value.is_null() {
        "(null)".to_string()
    } else {
        value.to_string()
    }
}

/// Print the command that reproduces the final selection
fn print_equivalent(args: &BrowseArgs, selection: &FacetSelection, facets: &[&'static str]) {
    let filters: Vec<String> = equivalent_filters(selection, facets)
        .iter()
        .map(|f| format!("-f {}", shell_quote(f)))
        .collect();
    println!(
        "metroscope rows {} {} {}",
        args.schema,
        shell_quote(&args.tool),
        filters.join(" ")
    );
}

/// One `FACET=V1,V2` filter per constrained facet, values escaped
fn equivalent_filters(selection: &FacetSelection, facets: &[&'static str]) -> Vec<String> {
    let mut filters = Vec::new();
    for facet in facets {
        let Some(values) = selection.values(facet) else {
            continue;
        };
        let mut texts: Vec<String> = values
            .iter()
            .filter(|v| !v.is_null())
            .map(|v| escape_value(&v.to_string()))
            .collect();
        if texts.is_empty() {
            continue;
        }
        texts.sort();
        filters.push(format!("{}={}", facet, texts.join(",")));
    }
    filters
}

/// Single-quote a word for POSIX shells
fn shell_quote(word: &str) -> String {
    format!("'{}'", word.replace('\'', "'\\''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::filters::{build_selection, FacetFilter};
    use crate::core::dataset::fixtures::*;
    use crate::core::options::resolve_options_scoped;

    #[test]
    fn test_equivalent_filters_round_trip() {
        let schema = SchemaKind::Tad;
        let mut selection = FacetSelection::new(schema);
        selection
            .select("Stats", ["mean 1, sd 2", r"C:\runs"])
            .unwrap()
            .select("Lot", ["L1"])
            .unwrap();

        let filters = equivalent_filters(&selection, schema.descriptor().facets);
        assert_eq!(filters[0], "Lot=L1");

        let parsed: Vec<FacetFilter> = filters.iter().map(|f| f.parse().unwrap()).collect();
        assert_eq!(build_selection(schema, &parsed).unwrap(), selection);
    }

    #[test]
    fn test_shell_quote() {
        assert_eq!(shell_quote("Lot=L1"), "'Lot=L1'");
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
    }

    #[test]
    fn test_picker_follows_option_scope() {
        let ds = coarse(vec![
            coarse_row("Lot A", 1, 480.0, 405.0),
            coarse_row("Lot B", 2, 480.0, 405.0),
        ]);
        let selection = FacetSelection::new(SchemaKind::Coarse)
            .with("Lot Name", ["Lot A"])
            .unwrap();

        let cascading =
            resolve_options_scoped(&ds, &selection, OptionScope::Cascading).unwrap();
        assert_eq!(
            picker_values(&cascading, "Lot Name"),
            vec![FieldValue::from("Lot A")]
        );

        let widened =
            resolve_options_scoped(&ds, &selection, OptionScope::ExcludeOwnFacet).unwrap();
        assert_eq!(picker_values(&widened, "Lot Name").len(), 2);
        assert!(picker_values(&widened, "Recipe").is_empty());
    }
}
