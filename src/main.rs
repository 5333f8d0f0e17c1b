use clap::Parser;
use miette::Result;
use tracing_subscriber::EnvFilter;

use metroscope::cli::commands;
use metroscope::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Install miette's fancy error handler for diagnostics
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    match cli.command {
        Commands::Tools(args) => commands::tools::run(args, &cli.global),
        Commands::Options(args) => commands::options::run(args, &cli.global),
        Commands::Rows(args) => commands::rows::run(args, &cli.global),
        Commands::Classify(args) => commands::classify::run(args, &cli.global),
        Commands::Plot(args) => commands::plot::run(args, &cli.global),
        Commands::Browse(args) => commands::browse::run(args, &cli.global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}

/// Log to stderr; RUST_LOG wins over -v
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
