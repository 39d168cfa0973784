//! CLI entry point for postwright

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "postwright")]
#[command(version)]
#[command(about = "Build a static blog from markdown posts", long_about = None)]
struct Cli {
    /// Set the base directory (defaults to current directory)
    #[arg(short, long, global = true)]
    cwd: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the site into the output directory
    #[command(alias = "b")]
    Build,

    /// Remove the output directory
    Clean,

    /// List site information
    List {
        /// Type of content to list (post, category)
        #[arg(default_value = "post")]
        r#type: String,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.debug {
        "postwright=debug,info"
    } else {
        "postwright=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run(cli).await {
        tracing::error!("Build failed: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let base_dir = match cli.cwd {
        Some(dir) => dir,
        None => std::env::current_dir()?,
    };
    let site = postwright::Site::new(&base_dir)?;

    match cli.command.unwrap_or(Commands::Build) {
        Commands::Build => {
            let report = site.build().await?;

            for failure in report.degraded() {
                tracing::warn!("Rendered with an error body: {}", failure);
            }
            for failure in report.skipped() {
                tracing::warn!("Not published: {}", failure);
            }

            if site.config.strict && !report.is_clean() {
                anyhow::bail!(
                    "{} document(s) failed and strict mode is on",
                    report.failures.len()
                );
            }

            println!(
                "Built {} posts and {} category pages into {:?}",
                report.posts, report.categories, site.output_dir
            );
        }

        Commands::Clean => {
            tracing::info!("Cleaning output folder...");
            site.clean()?;
            println!("Cleaned successfully!");
        }

        Commands::List { r#type } => {
            postwright::commands::list::run(&site, &r#type).await?;
        }
    }

    Ok(())
}
