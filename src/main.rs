//! Binary entrypoint for the snakeladder CLI.
//!
//! Commands:
//! - `init` - write a starter `config.toml`
//! - `play [--launch <query>]` - interactive game loop
//! - `status` - storage statistics and the current session
//! - `export [--out <file>]` / `import <file>` - move one identity's data
//! - `housekeep` - purge records older than the retention window
//!
//! See the library crate docs for module-level details: `snakeladder::`.
use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

use snakeladder::app::{App, Command, CommandParser, Input, HELP};
use snakeladder::auth::LaunchFlags;
use snakeladder::config::Config;
use snakeladder::storage::transfer::ExportBundle;

#[derive(Parser)]
#[command(name = "snakeladder")]
#[command(about = "Single-player snakes & ladders with local accounts and cell comments")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Play interactively
    Play {
        /// Launch query string, e.g. "guest=true" or "logout=true"
        #[arg(long)]
        launch: Option<String>,
    },
    /// Show storage statistics and the current session
    Status,
    /// Export the current identity's game, comments and settings as JSON
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        out: Option<String>,
    },
    /// Import a previously exported bundle into the current identity
    Import {
        /// Bundle file
        file: String,
    },
    /// Remove records older than the retention window
    Housekeep,
}

type StdinLines = Lines<BufReader<Stdin>>;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Commands::Init = cli.command {
        init_logging(&None, cli.verbose);
        Config::create_default(&cli.config).await?;
        info!("Configuration file created at {}", cli.config);
        return Ok(());
    }

    // A missing config file is fine; defaults apply
    let config = match Config::load(&cli.config).await {
        Ok(c) => Some(c),
        Err(e) => {
            if std::path::Path::new(&cli.config).exists() {
                return Err(e);
            }
            None
        }
    };
    init_logging(&config, cli.verbose);
    let config = config.unwrap_or_default();

    match cli.command {
        Commands::Init => {}
        Commands::Play { launch } => {
            let flags = launch
                .as_deref()
                .map(LaunchFlags::from_query)
                .unwrap_or_default();
            let app = App::start_with_flags(config, flags);
            run_interactive(app).await?;
        }
        Commands::Status => {
            let app = App::start(config);
            print_status(&app);
        }
        Commands::Export { out } => {
            let app = App::start(config);
            let text = app.export_current().to_pretty_json()?;
            match out {
                Some(path) => {
                    tokio::fs::write(&path, text)
                        .await
                        .map_err(|e| anyhow!("Failed to write {}: {}", path, e))?;
                    info!("Exported '{}' to {}", app.sessions().identity_id(), path);
                }
                None => println!("{}", text),
            }
        }
        Commands::Import { file } => {
            let data = tokio::fs::read_to_string(&file)
                .await
                .map_err(|e| anyhow!("Failed to read {}: {}", file, e))?;
            let bundle = ExportBundle::from_json(&data)
                .map_err(|e| anyhow!("Failed to parse {}: {}", file, e))?;
            let mut app = App::start(config);
            let summary = app.import_current(bundle)?;
            println!(
                "Imported {} section(s) into '{}'{}",
                summary.imported(),
                app.sessions().identity_id(),
                if summary.rejected.is_empty() {
                    String::new()
                } else {
                    format!("; rejected: {}", summary.rejected.join(", "))
                }
            );
            if !summary.persisted {
                warn!("Import kept in memory only; storage is unavailable");
            }
        }
        Commands::Housekeep => {
            let mut app = App::start(config);
            let stats = app.housekeep();
            println!(
                "Scanned {} record(s): {} purged, {} kept, {} unstamped, {} malformed",
                stats.scanned, stats.purged, stats.kept, stats.unstamped, stats.malformed
            );
        }
    }

    Ok(())
}

fn print_status(app: &App) {
    let stats = app.stats();
    let storage = app.storage();
    println!("{} v{}", app.config().game.title, env!("CARGO_PKG_VERSION"));
    println!(
        "Storage: {} backend{}",
        storage.backend_name(),
        if storage.is_degraded() {
            " (unavailable, memory only)"
        } else {
            ""
        }
    );
    println!(
        "Records: {} | size {} chars (~{:.2} KiB of {} KiB)",
        stats.item_count,
        stats.total_size,
        stats.estimated_kib,
        stats.limit_bytes / 1024
    );
    println!("Accounts: {}", app.sessions().accounts().len());
    match app.current_session() {
        Some(s) => println!("Session: {} ({:?})", s.username, s.role),
        None => println!("Session: none"),
    }
    let state = app.game().state();
    println!(
        "Game: cell {} | rolls {} | moves {} | comments {}",
        state.position,
        state.roll_count,
        state.move_count,
        app.game().comments().len()
    );
}

async fn run_interactive(mut app: App) -> Result<()> {
    let parser = CommandParser::new();
    let mut lines: StdinLines = BufReader::new(tokio::io::stdin()).lines();

    println!("{}", app.render());
    if app.sessions().is_guest() {
        println!("{}", app.config().game.guest_notice);
    }
    println!("Type 'help' for commands.");

    loop {
        let Some(line) = read_line(&mut lines, &app.prompt()).await? else {
            break;
        };
        let command = match parser.parse(&line) {
            Input::Command(c) => c,
            Input::Empty => continue,
            Input::Quit => break,
            Input::Help => {
                println!("{}", HELP);
                continue;
            }
            Input::Show => {
                println!("{}", app.render());
                continue;
            }
            Input::Status => {
                print_status(&app);
                continue;
            }
            Input::ListComments => {
                let comments = app.game().comments();
                if comments.is_empty() {
                    println!("No comments yet.");
                }
                for c in comments.list() {
                    println!("{:>3}  {}  ({})", c.cell, c.text, c.date);
                }
                continue;
            }
            Input::Invalid(msg) => {
                println!("{}", msg);
                continue;
            }
            Input::LoginPrompt(user) => match prompt_login(&mut lines, user).await? {
                Some(c) => c,
                None => continue,
            },
            Input::RegisterPrompt(user) => match prompt_register(&mut lines, user).await? {
                Some(c) => c,
                None => continue,
            },
            Input::PasswordPrompt => match prompt_change_password().await? {
                Some(c) => c,
                None => continue,
            },
        };

        let moved = matches!(
            command,
            Command::Move | Command::MoveToCell(_) | Command::Reset
        );
        let switched = matches!(
            command,
            Command::Login { .. } | Command::Register { .. } | Command::EnterGuest | Command::Logout
        );
        let report = app.dispatch(command);
        if report.success {
            println!("{}", report.message);
        } else {
            println!("Error: {}", report.message);
        }
        if !report.persisted {
            println!("(not saved: storage unavailable)");
        }
        if report.success && (moved || switched) {
            println!("{}", app.render());
        }
    }
    info!("Session ended");
    Ok(())
}

async fn read_line(lines: &mut StdinLines, prompt: &str) -> Result<Option<String>> {
    let mut out = tokio::io::stdout();
    out.write_all(prompt.as_bytes()).await?;
    out.flush().await?;
    Ok(lines.next_line().await?)
}

async fn read_password(prompt: &'static str) -> Result<String> {
    let pass = tokio::task::spawn_blocking(move || rpassword::prompt_password(prompt)).await??;
    Ok(pass.trim().to_string())
}

async fn prompt_login(lines: &mut StdinLines, user: Option<String>) -> Result<Option<Command>> {
    let username = match user {
        Some(u) => u,
        None => match read_line(lines, "Username (empty for guest): ").await? {
            Some(u) => u.trim().to_string(),
            None => return Ok(None),
        },
    };
    // Guest login needs no password
    let password = if username.is_empty() || username == snakeladder::auth::GUEST_ID {
        String::new()
    } else {
        read_password("Password: ").await?
    };
    Ok(Some(Command::Login { username, password }))
}

async fn prompt_register(lines: &mut StdinLines, user: Option<String>) -> Result<Option<Command>> {
    let username = match user {
        Some(u) => u,
        None => match read_line(lines, "Username: ").await? {
            Some(u) => u.trim().to_string(),
            None => return Ok(None),
        },
    };
    let email = match read_line(lines, "Email (optional): ").await? {
        Some(e) if !e.trim().is_empty() => Some(e.trim().to_string()),
        _ => None,
    };
    let password = read_password("Password: ").await?;
    let confirm = read_password("Confirm password: ").await?;
    if password.is_empty() || username.is_empty() {
        println!("Fill in the required fields.");
        return Ok(None);
    }
    if password != confirm {
        println!("Passwords do not match.");
        return Ok(None);
    }
    Ok(Some(Command::Register {
        username,
        password,
        email,
    }))
}

async fn prompt_change_password() -> Result<Option<Command>> {
    let current = read_password("Current password: ").await?;
    let new_password = read_password("New password: ").await?;
    let confirm = read_password("Confirm new password: ").await?;
    if new_password != confirm {
        println!("Passwords do not match.");
        return Ok(None);
    }
    Ok(Some(Command::ChangePassword {
        current,
        new_password,
    }))
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse::<log::LevelFilter>().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    let file = config.as_ref().and_then(|c| c.logging.file.clone());
    let security_path = config.as_ref().and_then(|c| c.logging.security_file.clone());
    let log_file = file.and_then(|path| {
        std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .ok()
    });

    match log_file {
        Some(f) => {
            let write_mutex = std::sync::Arc::new(std::sync::Mutex::new(f));
            // Mirror to the console only when attached to a terminal
            let is_tty = atty::is(atty::Stream::Stderr);

            builder.format(move |fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                let line = format!("{} [{}] {}", ts, record.level(), record.args());

                if let Ok(mut guard) = write_mutex.lock() {
                    let _ = writeln!(guard, "{}", line);
                }

                if record.target() == "security" {
                    if let Some(ref sec_path) = security_path {
                        if let Ok(mut sf) = std::fs::OpenOptions::new()
                            .create(true)
                            .append(true)
                            .open(sec_path)
                        {
                            let _ = writeln!(sf, "{}", line);
                        }
                    }
                }

                // The interactive loop owns the terminal; keep info chatter in the file
                if is_tty && record.level() <= log::Level::Warn {
                    writeln!(fmt, "{}", line)
                } else {
                    Ok(())
                }
            });
        }
        None => {
            builder.format(|fmt, record| {
                let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                writeln!(fmt, "{} [{}] {}", ts, record.level(), record.args())
            });
        }
    }
    let _ = builder.try_init();
}
