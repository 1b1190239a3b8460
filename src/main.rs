mod app;
mod repl;

use anyhow::Result;
use app::{notice, render_payload, App};
use clap::{Parser, Subcommand};
use fluentiq_core::AppConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "fluentiq",
    about = "Upload speech recordings for analysis and explore your session history",
    version,
    author
)]
struct Cli {
    /// Path to config file (default: ~/.config/fluentiq/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the analysis service base URL
    #[arg(long, global = true)]
    api_base: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload a recording and wait for its analysis
    Analyze {
        file: PathBuf,
    },

    /// Show the most recent analysis result
    Result {
        /// Also write the result JSON and its charts
        #[arg(long)]
        export: bool,
    },

    /// List stored sessions
    History,

    /// Show one session in detail
    Show {
        id: i64,
    },

    /// Average scores across sessions
    Summary {
        /// Use the server-computed summary instead of computing locally
        #[arg(long)]
        remote: bool,
    },

    /// Compare two sessions side by side
    Compare {
        a: i64,
        b: i64,
        /// Also write the comparison radar as PNG
        #[arg(long)]
        png: bool,
    },

    /// Export sessions or charts
    Export {
        #[command(subcommand)]
        target: ExportTarget,
    },

    /// Interactive history shell (default)
    Shell,

    /// Show or manage configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ExportTarget {
    /// All sessions as CSV
    Csv,
    /// One session as JSON
    Json { id: i64 },
    /// Trend chart, plus the comparison radar when --compare is given
    Charts {
        #[arg(long, num_args = 2, value_names = ["A", "B"])]
        compare: Option<Vec<i64>>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Initialize default configuration file
    Init,
    /// Print config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up tracing.
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new(std::env::var("RUST_LOG").unwrap_or_else(|_| "fluentiq=info,warn".into()))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Load config.
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };

    // Apply CLI overrides.
    if let Some(api_base) = &cli.api_base {
        config.api.base_url = api_base.clone();
    }

    tracing::debug!("Analysis service: {}", config.api.base_url);

    let command = cli.command.unwrap_or(Commands::Shell);
    if let Commands::Config { action } = command {
        return handle_config_command(action, &config);
    }

    let mut app = App::new(config)?;
    match command {
        Commands::Analyze { file } => {
            let payload = app.analyze(&file).await?;
            println!("{}", render_payload(&payload));
        }
        Commands::Result { export } => match app.last_result()? {
            None => println!("No analysis result yet. Run `fluentiq analyze <file>` first."),
            Some((_, payload)) => {
                println!("{}", render_payload(&payload));
                if export {
                    if let Some((paths, notes)) = notice(app.export_last_result())? {
                        print_written(&paths, &notes);
                    }
                }
            }
        },
        Commands::History => {
            app.load().await?;
            println!("{}", app.history_report());
        }
        Commands::Show { id } => {
            app.load().await?;
            if let Some(detail) = notice(app.show(Some(id)))? {
                println!("{}", detail);
            }
        }
        Commands::Summary { remote } => {
            if !remote {
                app.load().await?;
            }
            println!("{}", app.summary(remote).await?);
        }
        Commands::Compare { a, b, png } => {
            app.load().await?;
            if let Some(table) = notice(app.compare(a, b))? {
                println!("{}", table);
                if png {
                    let (paths, notes) = app.export_charts()?;
                    print_written(&paths, &notes);
                }
            }
        }
        Commands::Export { target } => {
            app.load().await?;
            match target {
                ExportTarget::Csv => {
                    if let Some(path) = notice(app.export_csv())? {
                        print_written(&[path], &[]);
                    }
                }
                ExportTarget::Json { id } => {
                    if let Some(path) = notice(app.export_json(Some(id)))? {
                        print_written(&[path], &[]);
                    }
                }
                ExportTarget::Charts { compare } => {
                    if let Some([a, b]) = compare.as_deref() {
                        if let Some(table) = notice(app.compare(*a, *b))? {
                            println!("{}", table);
                        }
                    }
                    let (paths, notes) = app.export_charts()?;
                    print_written(&paths, &notes);
                }
            }
        }
        Commands::Shell => {
            repl::run(app).await?;
        }
        Commands::Config { .. } => unreachable!("handled above"),
    }

    Ok(())
}

fn print_written(paths: &[PathBuf], notes: &[String]) {
    for path in paths {
        println!("Wrote {}", path.display());
    }
    for note in notes {
        println!("Note: {}", note);
    }
}

fn handle_config_command(action: Option<ConfigAction>, config: &AppConfig) -> Result<()> {
    match action {
        Some(ConfigAction::Show) | None => {
            let toml_str = toml::to_string_pretty(config)?;
            println!("{}", toml_str);
        }
        Some(ConfigAction::Init) => {
            let path = AppConfig::default_path();
            if path.exists() {
                println!("Config already exists at: {}", path.display());
            } else {
                config.save()?;
                println!("Created default config at: {}", path.display());
            }
        }
        Some(ConfigAction::Path) => {
            println!("{}", AppConfig::default_path().display());
        }
    }
    Ok(())
}
