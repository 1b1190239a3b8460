use crate::app::{notice, App};
use anyhow::Result;
use rustyline::error::ReadlineError;
use rustyline::{Config as RlConfig, DefaultEditor};
use std::path::PathBuf;

const BANNER: &str = r#"
  ╔═══════════════════════════════════════════╗
  ║             fluentiq v0.1.0               ║
  ║   Speech analysis session history         ║
  ╚═══════════════════════════════════════════╝
"#;

const HELP: &str = "  Commands:
    /load                 Reload sessions from the service
    /list                 List loaded sessions
    /show <id>            Show one session
    /compare <a> <b>      Compare two sessions
    /summary [remote]     Average scores
    /export csv           Export all sessions as CSV
    /export json <id>     Export one session as JSON
    /export charts        Export the rendered charts as PNG
    /help                 Show this help
    /exit                 Quit";

/// Run the interactive history shell.
pub async fn run(mut app: App) -> Result<()> {
    println!("{}", BANNER);
    println!("{}", HELP);
    println!("\n  Endpoint: {}\n", app.config.api.base_url);

    if let Err(e) = app.load().await {
        println!("\x1b[0;31mCould not load sessions: {}\x1b[0m", e);
    } else {
        println!("  Loaded {} sessions.", app.store().len());
    }

    // Set up rustyline.
    let rl_config = RlConfig::builder().auto_add_history(true).build();
    let history_path = app.config.data_dir().join("shell_history.txt");
    let mut rl = DefaultEditor::with_config(rl_config)?;
    let _ = rl.load_history(&history_path);

    loop {
        let prompt = format!("\x1b[1;36mfluentiq\x1b[0m ({}) \x1b[1;32m❯\x1b[0m ", app.store().len());

        match rl.readline(&prompt) {
            Ok(line) => {
                let input = line.trim();
                if input.is_empty() {
                    continue;
                }
                if !input.starts_with('/') {
                    println!("Commands start with '/'. Type /help for available commands.");
                    continue;
                }

                match handle_command(input, &mut app).await {
                    Ok(true) => {}
                    Ok(false) => break, // /exit
                    Err(e) => println!("\x1b[0;31mError: {}\x1b[0m", e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("Goodbye!");
                break;
            }
            Err(e) => {
                eprintln!("Input error: {}", e);
                break;
            }
        }
    }

    // Save history.
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let _ = rl.save_history(&history_path);

    Ok(())
}

fn parse_id(raw: Option<&str>) -> std::result::Result<Option<i64>, String> {
    match raw {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|_| format!("'{}' is not a session id", s)),
    }
}

fn print_written(paths: &[PathBuf], notes: &[String]) {
    for path in paths {
        println!("  Wrote {}", path.display());
    }
    for note in notes {
        println!("  Note: {}", note);
    }
}

/// Handle a slash command. Returns `true` to continue the loop, `false` to exit.
async fn handle_command(input: &str, app: &mut App) -> Result<bool> {
    let mut parts = input.split_whitespace();
    let cmd = parts.next().unwrap_or("");
    let args: Vec<&str> = parts.collect();

    match cmd {
        "/exit" | "/quit" | "/q" => {
            println!("Goodbye!");
            return Ok(false);
        }
        "/load" => {
            let count = app.load().await?;
            println!("  Loaded {} sessions.", count);
        }
        "/list" | "/ls" => {
            println!("{}", app.history_report());
        }
        "/show" => match parse_id(args.first().copied()) {
            Ok(id) => {
                if let Some(detail) = notice(app.show(id))? {
                    println!("{}", detail);
                }
            }
            Err(msg) => println!("{}", msg),
        },
        "/compare" => {
            let ids = (parse_id(args.first().copied()), parse_id(args.get(1).copied()));
            match ids {
                (Ok(Some(a)), Ok(Some(b))) => {
                    if let Some(table) = notice(app.compare(a, b))? {
                        println!("{}", table);
                    }
                }
                (Err(msg), _) | (_, Err(msg)) => println!("{}", msg),
                _ => println!("Usage: /compare <a> <b>"),
            }
        }
        "/summary" => {
            let remote = args.first() == Some(&"remote");
            println!("{}", app.summary(remote).await?);
        }
        "/export" => match args.first().copied() {
            Some("csv") => {
                if let Some(path) = notice(app.export_csv())? {
                    print_written(&[path], &[]);
                }
            }
            Some("json") => match parse_id(args.get(1).copied()) {
                Ok(id) => {
                    if let Some(path) = notice(app.export_json(id))? {
                        print_written(&[path], &[]);
                    }
                }
                Err(msg) => println!("{}", msg),
            },
            Some("charts") => {
                let (paths, notes) = app.export_charts()?;
                print_written(&paths, &notes);
            }
            _ => println!("Usage: /export csv | /export json <id> | /export charts"),
        },
        "/help" | "/?" => {
            println!("{}", HELP);
        }
        _ => {
            println!(
                "Unknown command: {}. Type /help for available commands.",
                cmd
            );
        }
    }

    Ok(true)
}
