// Lineup optimizer entry point.
//
// 1. Initialize tracing
// 2. Load config (copying defaults on first run)
// 3. Optimize every roster shape and write the output files
// 4. Print the combined, score-sorted table

use lineup_app::app;
use lineup_app::config;
use lineup_app::output;

use anyhow::Context;
use std::time::Instant;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing()?;
    let started = Instant::now();

    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: budget {}, {} shapes, up to {} lineups each",
        config.optimizer.budget,
        config.shapes.len(),
        config.optimizer.max_rosters
    );

    let base_dir = std::env::current_dir()?;
    let result = app::run(&config, &base_dir).await?;

    println!("Lineup files created");
    for path in &result.files {
        println!("  {}", path.display());
    }
    for shape in &result.shapes {
        if let Err(e) = &shape.outcome {
            println!("  shape '{}' skipped: {}", shape.name, e);
        }
    }
    print!("{}", output::console_table(&result.merged, config.output.name_width));
    println!(
        "Total execution time: {:.2} seconds",
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Log to stderr so stdout carries only the lineup table.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("lineup_app=info,lineup_core=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
