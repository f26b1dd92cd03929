// IronMen batch entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file; progress goes to stdout)
// 2. Load config
// 3. Load the season, roster, and draft-analysis snapshots
// 4. Run the ranking pipeline
// 5. Write the ranked table

use ironmen_app::config;
use ironmen_app::report;
use ironmen_app::sources;
use ironmen_core::pipeline;

use anyhow::Context;
use std::path::Path;
use tracing::info;

fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("IronMen pipeline starting");
    println!("Starting IronMen pipeline run...");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: seasons {}, output {}",
        config.seasons.join(", "),
        config.output.path
    );

    // 3. Load snapshots
    println!("Loading season totals for: {}", config.seasons.join(", "));
    let inputs = sources::load_all_from_paths(&config.data_paths, &config.seasons)
        .context("failed to load input snapshots")?;

    // 4. Rank
    println!("Computing IronMan scores and rankings...");
    let table = pipeline::run(inputs, &config.model).context("invalid model configuration")?;
    let summary = table.summary;
    println!(
        "Computed availability metrics for {} players.",
        summary.availability_records
    );
    println!(
        "Matched {} of {} roster players to league stats ({} unmatched, {} with ADP).",
        summary.linked,
        summary.roster_players,
        summary.unmatched(),
        summary.with_adp
    );

    // 5. Write
    let output = Path::new(&config.output.path);
    report::write_report(output, config.output.format, &table.players)
        .with_context(|| format!("failed to write rankings to {}", output.display()))?;
    println!(
        "Saved {} rows to {}. Run complete!",
        table.players.len(),
        output.display()
    );

    info!("IronMen pipeline run complete");
    Ok(())
}

/// Initialize tracing to log to `logs/ironmen.log`.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("ironmen.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("ironmen=info,ironmen_app=info,ironmen_core=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
