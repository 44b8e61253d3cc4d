//! CLI entry point for jarvis

use anyhow::Result;
use clap::{Parser, Subcommand};
use console::style;
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use dialoguer::{Confirm, Input, Select};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tracing::info;

use jarvis_core::config::{Config, ConfigLoader};
use jarvis_core::logging::init_logging;
use jarvis_core::session::{
    FileStorage, MemoryStorage, SessionStorage, SessionStore, Turn,
};
use jarvis_providers::{ChatMessage, ModelFamily, ProviderGateway};
use jarvis_server::{db, run_server, AppState};

mod client;
mod render;

use client::{ApiClient, ApiStorage};
use render::render_turns;

#[derive(Parser)]
#[command(name = "jarvis")]
#[command(about = "A two-provider chat client with durable sessions")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize jarvis configuration
    Onboard,
    /// Run the HTTP API server
    Serve {
        /// Port override
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Launch the interactive chat TUI
    Chat {
        /// Model family to use
        #[arg(short, long)]
        family: Option<String>,
        /// Model to use
        #[arg(short, long)]
        model: Option<String>,
        /// Store sessions through the persistence API instead of local files
        #[arg(long)]
        remote: bool,
        /// Keep sessions in memory only
        #[arg(long)]
        no_persist: bool,
    },
    /// Send a single message and print the reply
    Send {
        /// Message to send
        #[arg(short, long)]
        message: String,
        /// Model family to use
        #[arg(short, long)]
        family: Option<String>,
        /// Model to use
        #[arg(short, long)]
        model: Option<String>,
    },
    /// Inspect locally stored sessions
    Sessions {
        #[command(subcommand)]
        command: SessionCommands,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// List stored sessions
    List,
    /// Delete a session by id
    Delete { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // `serve` configures logging from the config file; everything else
    // gets the plain fmt subscriber.
    if !matches!(cli.command, Commands::Serve { .. }) {
        tracing_subscriber::fmt::init();
    }

    let config_loader = if let Some(dir) = cli.config_dir {
        ConfigLoader::with_dir(dir)
    } else {
        ConfigLoader::new()
    };

    match cli.command {
        Commands::Onboard => run_onboard(&config_loader)?,
        Commands::Serve { port } => run_serve(&config_loader, port).await?,
        Commands::Chat {
            family,
            model,
            remote,
            no_persist,
        } => run_chat(&config_loader, family, model, remote, no_persist).await?,
        Commands::Send {
            message,
            family,
            model,
        } => run_send(&config_loader, &message, family, model).await?,
        Commands::Sessions { command } => match command {
            SessionCommands::List => run_sessions_list(&config_loader).await?,
            SessionCommands::Delete { id } => run_sessions_delete(&config_loader, &id).await?,
        },
    }

    Ok(())
}

/// Pick the family and model to use, falling back to configured defaults
fn resolve_family_model(
    config: &Config,
    family: Option<String>,
    model: Option<String>,
) -> (String, String) {
    let family = family.unwrap_or_else(|| config.defaults.family.clone());
    let model = model.unwrap_or_else(|| match ModelFamily::parse(&family) {
        Ok(ModelFamily::Anthropic) => config.defaults.anthropic_model.clone(),
        // Unknown families go to the server untouched and fail there
        _ => config.defaults.openai_model.clone(),
    });
    (family, model)
}

/// Run the onboard wizard
fn run_onboard(loader: &ConfigLoader) -> Result<()> {
    println!("{}", style("Welcome to jarvis!").bold().cyan());
    println!("Let's set up your configuration.\n");

    let config_path = loader.config_dir().join("config.json");
    if config_path.exists() {
        let overwrite = Confirm::new()
            .with_prompt("Configuration already exists. Overwrite?")
            .default(false)
            .interact()?;
        if !overwrite {
            println!("Onboard cancelled.");
            return Ok(());
        }
    }

    let mut config = Config::default();

    let families = [ModelFamily::OPENAI_WIRE, ModelFamily::ANTHROPIC_WIRE];
    let family_idx = Select::new()
        .with_prompt("Select your default model family")
        .items(&families)
        .default(0)
        .interact()?;
    config.defaults.family = families[family_idx].to_string();

    let openai_key: String = Input::new()
        .with_prompt("Enter your OpenAI API key (leave empty to skip)")
        .allow_empty(true)
        .interact_text()?;
    config.providers.openai.api_key = openai_key;

    let anthropic_key: String = Input::new()
        .with_prompt("Enter your Anthropic API key (leave empty to skip)")
        .allow_empty(true)
        .interact_text()?;
    config.providers.anthropic.api_key = anthropic_key;

    let openai_model: String = Input::new()
        .with_prompt("Default OpenAI model")
        .default(config.defaults.openai_model.clone())
        .interact_text()?;
    config.defaults.openai_model = openai_model;

    let anthropic_model: String = Input::new()
        .with_prompt("Default Anthropic model")
        .default(config.defaults.anthropic_model.clone())
        .interact_text()?;
    config.defaults.anthropic_model = anthropic_model;

    let default_db = format!("sqlite://{}/jarvis.db", loader.config_dir().display());
    let database_url: String = Input::new()
        .with_prompt("Database connection string (used by `jarvis serve`)")
        .default(default_db)
        .interact_text()?;
    config.database.url = database_url;

    loader.save(&config)?;

    println!(
        "\n{}",
        style("Configuration saved successfully!").green().bold()
    );
    println!("Config location: {}", config_path.display());
    println!("\nYou can now run:");
    println!("  {} - Start the API server", style("jarvis serve").cyan());
    println!("  {} - Open the chat TUI", style("jarvis chat").cyan());
    println!(
        "  {} - Send a one-shot message",
        style("jarvis send --message 'Hello!'").cyan()
    );

    Ok(())
}

/// Run the HTTP API server
async fn run_serve(loader: &ConfigLoader, port: Option<u16>) -> Result<()> {
    let config = loader.load()?;

    // Hard startup failure without a connection string
    if config.database.url.trim().is_empty() {
        anyhow::bail!(
            "database.url is required to run the server \
             (set DATABASE_URL or database.url in config.json)"
        );
    }

    let _guard = init_logging(&config.logging);

    let pool = db::connect(&config.database.url).await?;
    let gateway = Arc::new(ProviderGateway::from_config(&config));
    let state = AppState::new(pool, gateway);

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    run_server(
        state,
        &config.server.host,
        port.unwrap_or(config.server.port),
        shutdown_rx,
    )
    .await
}

/// Send a single message through the chat endpoint
async fn run_send(
    loader: &ConfigLoader,
    message: &str,
    family: Option<String>,
    model: Option<String>,
) -> Result<()> {
    let config = loader.load()?;
    let (family, model) = resolve_family_model(&config, family, model);
    let api = ApiClient::new(Some(config.client.api_url.clone()));

    println!("{}", style("Processing...").cyan());

    match api.chat(message, &family, &model, None, &[]).await {
        Ok(response) => {
            println!("\n{}", style("Response:").bold());
            println!("{}", response);
            Ok(())
        }
        Err(e) => anyhow::bail!("Failed to process message: {}", e),
    }
}

/// List locally stored sessions
async fn run_sessions_list(loader: &ConfigLoader) -> Result<()> {
    let storage = Arc::new(FileStorage::new(loader.config_dir()));
    let mut store = SessionStore::new(storage);
    store.load().await?;

    if store.sessions().is_empty() {
        println!("No stored sessions.");
        return Ok(());
    }

    println!("{}", style("Stored sessions").bold().cyan());
    for session in store.sessions() {
        let marker = if store.current_id() == Some(session.id.as_str()) {
            style("*").green().to_string()
        } else {
            " ".to_string()
        };
        println!(
            "{} {} ({}) - {} turns",
            marker,
            style(&session.name).bold(),
            session.id,
            session.turns.len()
        );
    }

    Ok(())
}

/// Delete a locally stored session
async fn run_sessions_delete(loader: &ConfigLoader, id: &str) -> Result<()> {
    let storage = Arc::new(FileStorage::new(loader.config_dir()));
    let mut store = SessionStore::new(storage);
    store.load().await?;

    if store.delete(id).await? {
        println!("{} Deleted session {}", style("✓").green().bold(), id);
    } else {
        println!("{} Session {} not found", style("✗").red(), id);
    }

    Ok(())
}

struct SendRequest {
    message: String,
    family: String,
    model: String,
    session_id: String,
    history: Vec<ChatMessage>,
}

enum SendOutcome {
    Reply(String),
    Failure(String),
}

struct ChatApp {
    input: String,
    scroll: u16,
    follow: bool,
    pending: bool,
    should_quit: bool,
    notice: Option<String>,
    family: String,
    model: String,
}

impl ChatApp {
    fn new(family: String, model: String) -> Self {
        Self {
            input: String::new(),
            scroll: 0,
            follow: true,
            pending: false,
            should_quit: false,
            notice: Some(
                "Enter to send, Shift+Enter for newline. /new /switch N /delete /quit".to_string(),
            ),
            family,
            model,
        }
    }
}

/// Run the interactive chat TUI
async fn run_chat(
    loader: &ConfigLoader,
    family: Option<String>,
    model: Option<String>,
    remote: bool,
    no_persist: bool,
) -> Result<()> {
    let config = loader.load()?;
    let (family, model) = resolve_family_model(&config, family, model);

    let storage: Arc<dyn SessionStorage> = if no_persist {
        Arc::new(MemoryStorage::new())
    } else if remote {
        Arc::new(ApiStorage::new(
            ApiClient::new(Some(config.client.api_url.clone())),
            config.client.user_id.clone(),
        ))
    } else {
        Arc::new(FileStorage::new(loader.config_dir()))
    };

    let mut store = SessionStore::new(storage);
    store.load().await?;

    // Worker owns the HTTP client; one request in flight at a time
    let api_url = config.client.api_url.clone();
    let (request_tx, mut request_rx) = mpsc::unbounded_channel::<SendRequest>();
    let (reply_tx, mut reply_rx) = mpsc::unbounded_channel::<SendOutcome>();
    tokio::spawn(async move {
        let api = ApiClient::new(Some(api_url));
        while let Some(req) = request_rx.recv().await {
            let outcome = match api
                .chat(
                    &req.message,
                    &req.family,
                    &req.model,
                    Some(&req.session_id),
                    &req.history,
                )
                .await
            {
                Ok(text) => SendOutcome::Reply(text),
                Err(e) => SendOutcome::Failure(e.to_string()),
            };
            let _ = reply_tx.send(outcome);
        }
    });

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = ChatApp::new(family, model);

    loop {
        // A completed round trip re-enables the submit action
        while let Ok(outcome) = reply_rx.try_recv() {
            match outcome {
                SendOutcome::Reply(text) => {
                    store.append_turn(Turn::assistant(text, &app.model)).await?;
                }
                SendOutcome::Failure(message) => {
                    store.append_turn(Turn::error(message)).await?;
                }
            }
            app.pending = false;
            app.follow = true;
        }

        let lines = render_turns(store.visible_turns());
        let session_name = store
            .current()
            .map(|s| s.name.clone())
            .unwrap_or_else(|| "(no session)".to_string());

        terminal.draw(|frame| {
            let chunks = Layout::default()
                .direction(Direction::Vertical)
                .constraints([
                    Constraint::Length(3),
                    Constraint::Min(1),
                    Constraint::Length(5),
                ])
                .split(frame.area());

            let status = if app.pending { "sending" } else { "idle" };
            let status_line = match &app.notice {
                Some(notice) => format!(
                    "{} | {} | {} | {} | {}",
                    app.family, app.model, session_name, status, notice
                ),
                None => format!(
                    "{} | {} | {} | {}",
                    app.family, app.model, session_name, status
                ),
            };
            frame.render_widget(
                Paragraph::new(status_line)
                    .block(Block::default().borders(Borders::ALL).title("jarvis chat")),
                chunks[0],
            );

            // Stick to the newest turn unless the user scrolled away
            let height = chunks[1].height.saturating_sub(2);
            if app.follow {
                app.scroll = (lines.len() as u16).saturating_sub(height);
            }
            let conversation = Paragraph::new(lines.clone())
                .block(Block::default().borders(Borders::ALL).title("conversation"))
                .wrap(Wrap { trim: false })
                .scroll((app.scroll, 0));
            frame.render_widget(conversation, chunks[1]);

            let input_title = if app.pending {
                "input (waiting for reply...)"
            } else {
                "input (Enter send, Shift+Enter newline)"
            };
            frame.render_widget(
                Paragraph::new(app.input.clone())
                    .block(Block::default().borders(Borders::ALL).title(input_title))
                    .wrap(Wrap { trim: false }),
                chunks[2],
            );
            frame.set_cursor_position((
                chunks[2].x + 1 + app.input.len() as u16,
                chunks[2].y + 1,
            ));
        })?;

        if event::poll(std::time::Duration::from_millis(60))? {
            if let CEvent::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        app.should_quit = true;
                    }
                    KeyCode::Esc => app.should_quit = true,
                    KeyCode::PageUp | KeyCode::Up => {
                        app.follow = false;
                        app.scroll = app.scroll.saturating_sub(1);
                    }
                    KeyCode::PageDown | KeyCode::Down => {
                        app.scroll = app.scroll.saturating_add(1);
                    }
                    KeyCode::End => {
                        app.follow = true;
                    }
                    KeyCode::Enter if key.modifiers.contains(KeyModifiers::SHIFT) => {
                        app.input.push('\n');
                    }
                    KeyCode::Enter => {
                        let content = app.input.trim().to_string();
                        app.input.clear();
                        if content.is_empty() {
                            continue;
                        }
                        if let Some(command) = content.strip_prefix('/') {
                            handle_command(command, &mut app, &mut store).await?;
                        } else if !app.pending {
                            // Optimistic append; the prior turns are the
                            // history the gateway receives
                            let history: Vec<ChatMessage> = store
                                .visible_turns()
                                .iter()
                                .map(|t| ChatMessage {
                                    role: t.role.clone(),
                                    content: t.content.clone(),
                                })
                                .collect();
                            let session_id = store
                                .append_turn(Turn::user(&content, &app.model))
                                .await?;
                            app.pending = true;
                            app.follow = true;
                            app.notice = None;
                            let _ = request_tx.send(SendRequest {
                                message: content,
                                family: app.family.clone(),
                                model: app.model.clone(),
                                session_id,
                                history,
                            });
                        }
                    }
                    KeyCode::Backspace => {
                        app.input.pop();
                    }
                    KeyCode::Char(ch) => {
                        app.input.push(ch);
                    }
                    _ => {}
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

/// Handle a /command entered in the chat input
async fn handle_command(
    command: &str,
    app: &mut ChatApp,
    store: &mut SessionStore,
) -> Result<()> {
    let mut parts = command.split_whitespace();
    match parts.next() {
        Some("quit") => app.should_quit = true,
        Some("new") => {
            let id = store.create().await?;
            app.notice = Some(format!("new session {}", id));
            app.follow = true;
        }
        Some("delete") => match store.current_id().map(str::to_string) {
            Some(id) => {
                store.delete(&id).await?;
                app.notice = Some("session deleted".to_string());
            }
            None => app.notice = Some("no session selected".to_string()),
        },
        Some("switch") => {
            let target = parts
                .next()
                .and_then(|raw| raw.parse::<usize>().ok())
                .and_then(|n| store.sessions().get(n.saturating_sub(1)))
                .map(|s| s.id.clone());
            match target {
                Some(id) => {
                    store.switch(&id).await?;
                    app.notice = None;
                    app.follow = true;
                }
                None => {
                    let names: Vec<String> = store
                        .sessions()
                        .iter()
                        .enumerate()
                        .map(|(i, s)| format!("{}:{}", i + 1, s.name))
                        .collect();
                    app.notice = Some(if names.is_empty() {
                        "no sessions".to_string()
                    } else {
                        names.join(" ")
                    });
                }
            }
        }
        _ => app.notice = Some(format!("unknown command: /{}", command)),
    }
    Ok(())
}
