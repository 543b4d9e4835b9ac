mod config;
mod directory;
mod error;
mod extractor;
mod fetch;
mod parser;
mod table;

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::warn;

use config::Config;
use extractor::Extractor;
use fetch::HttpFetcher;
use table::Level;

#[derive(Parser)]
#[command(name = "jsic_scraper", about = "Japan Standard Industrial Classification scraper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl the listing page and show how many codes each level has
    Codes {
        /// Print the full code lists as JSON
        #[arg(long)]
        json: bool,
    },
    /// Extract one classification level into a CSV file
    Extract {
        /// division, major_group, group or detail
        level: String,
        /// Output file (default: <out-dir>/jsic_<level>.csv)
        #[arg(short, long)]
        out: Option<PathBuf>,
        #[arg(long, default_value = config::DEFAULT_OUT_DIR)]
        out_dir: PathBuf,
    },
    /// Extract several levels, one CSV per level
    Run {
        /// Comma-separated levels (default: division,major_group,detail)
        #[arg(short, long, value_delimiter = ',')]
        levels: Vec<String>,
        #[arg(long, default_value = config::DEFAULT_OUT_DIR)]
        out_dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let fetcher = HttpFetcher::new(reqwest::Client::new());

    let result = match cli.command {
        Commands::Codes { json } => {
            let cfg = Config::default();
            let dir = directory::fetch_code_directory(&fetcher, &cfg.directory_url).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&dir)?);
            } else {
                for level in Level::ALL {
                    println!("{:<12} {}", level.name(), dir.codes(level).len());
                }
            }
            Ok(())
        }
        Commands::Extract { level, out, out_dir } => {
            let cfg = Config {
                out_dir,
                ..Config::default()
            };
            let table = Extractor::new(&fetcher, &cfg)
                .extract_classification(&level)
                .await
                .with_context(|| format!("Failed to extract JSIC {}", level))?;
            let path = out.unwrap_or_else(|| cfg.output_path(table.level));
            table
                .save(&path)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            println!(
                "Wrote {} rows ({}) to {}",
                table.len(),
                table.headers().join(", "),
                path.display()
            );
            Ok(())
        }
        Commands::Run { levels, out_dir } => {
            let mut cfg = Config {
                out_dir,
                ..Config::default()
            };
            if !levels.is_empty() {
                cfg.levels = levels
                    .iter()
                    .map(|l| l.parse::<Level>())
                    .collect::<Result<_, _>>()?;
            }
            run(&fetcher, &cfg).await
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn run(fetcher: &HttpFetcher, cfg: &Config) -> anyhow::Result<()> {
    let extractor = Extractor::new(fetcher, cfg);
    for &level in &cfg.levels {
        let table = extractor
            .extract(level)
            .await
            .with_context(|| format!("Failed to extract JSIC {}", level))?;
        if table.is_empty() {
            warn!("No {} codes found on the listing page", level);
        }
        let path = cfg.output_path(level);
        table
            .save(&path)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!(
            "Wrote {} rows ({}) to {}",
            table.len(),
            table.headers().join(", "),
            path.display()
        );
    }
    Ok(())
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
