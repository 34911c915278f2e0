mod app;
mod cli;
mod config;
mod error;
mod fetch;
mod form;
mod input;
mod k8s;
mod model;
mod ui;
mod workflow;

use anyhow::{Context, Result};
use app::{App, AppCommand};
use clap::Parser;
use cli::CliArgs;
use config::Settings;
use crossterm::event::{
    Event, EventStream, KeyEventKind, KeyboardEnhancementFlags, PopKeyboardEnhancementFlags,
    PushKeyboardEnhancementFlags,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
    supports_keyboard_enhancement,
};
use error::{SubmissionError, SubmissionStep};
use fetch::{FetchOutcome, spawn_fetches};
use futures::StreamExt;
use k8s::{ClusterApi, KubeGateway};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::fs::OpenOptions;
use std::io::{self, Stdout};
use std::path::Path;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use tokio::process::Command as TokioCommand;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use workflow::{SubmitPlan, spawn_submit};

type TuiTerminal = Terminal<CrosstermBackend<Stdout>>;
type SubmitOutcome = std::result::Result<Vec<SubmissionStep>, SubmissionError>;

struct Channels {
    fetch_tx: mpsc::UnboundedSender<FetchOutcome>,
    submit_tx: mpsc::UnboundedSender<SubmitOutcome>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(&args.log_filter, args.log_file.as_deref())?;

    let settings = Settings::load(&args)?;
    if let Some(source) = &settings.source {
        info!("settings loaded from {source}");
    }

    let gateway = KubeGateway::connect(settings.context.clone()).await?;
    let mut app = App::new(
        gateway.cluster().to_string(),
        gateway.context().to_string(),
        &settings,
    );
    let api: Arc<dyn ClusterApi> = Arc::new(gateway);

    run(&mut app, api, &settings).await
}

fn init_tracing(level_filter: &str, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_new(level_filter)
        .or_else(|_| EnvFilter::try_new("info"))
        .context("failed to initialize tracing filter")?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .compact();

    // The terminal belongs to the UI, so logs go to a file or nowhere.
    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("failed to open log file {}", path.display()))?;
            let _ = builder.with_writer(Mutex::new(file)).try_init();
        }
        None => {
            let _ = builder.with_writer(io::sink).try_init();
        }
    }

    Ok(())
}

async fn run(app: &mut App, api: Arc<dyn ClusterApi>, settings: &Settings) -> Result<()> {
    let (mut terminal, keyboard_enhanced) = init_terminal()?;
    let run_result = run_loop(&mut terminal, app, api, settings).await;
    let restore_result = restore_terminal(&mut terminal, keyboard_enhanced);

    match (run_result, restore_result) {
        (Err(run_error), Err(restore_error)) => Err(anyhow::anyhow!(
            "{run_error:#}\nterminal restore error: {restore_error:#}"
        )),
        (Err(error), _) => Err(error),
        (_, Err(error)) => Err(error),
        (Ok(()), Ok(())) => Ok(()),
    }
}

fn init_terminal() -> Result<(TuiTerminal, bool)> {
    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    let keyboard_enhanced = matches!(supports_keyboard_enhancement(), Ok(true));
    if keyboard_enhanced {
        execute!(
            stdout,
            EnterAlternateScreen,
            PushKeyboardEnhancementFlags(
                KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES
                    | KeyboardEnhancementFlags::REPORT_EVENT_TYPES
            )
        )
        .context("failed to enter alternate screen with keyboard enhancement")?;
    } else {
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("failed to create terminal backend")?;
    terminal.clear().context("failed to clear terminal")?;
    Ok((terminal, keyboard_enhanced))
}

fn restore_terminal(terminal: &mut TuiTerminal, keyboard_enhanced: bool) -> Result<()> {
    if keyboard_enhanced {
        execute!(terminal.backend_mut(), PopKeyboardEnhancementFlags)
            .context("failed to pop keyboard enhancement flags")?;
    }
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor().context("failed to show cursor")?;
    Ok(())
}

async fn run_loop(
    terminal: &mut TuiTerminal,
    app: &mut App,
    api: Arc<dyn ClusterApi>,
    settings: &Settings,
) -> Result<()> {
    let (fetch_tx, mut fetch_rx) = mpsc::unbounded_channel::<FetchOutcome>();
    let (submit_tx, mut submit_rx) = mpsc::unbounded_channel::<SubmitOutcome>();
    let channels = Channels {
        fetch_tx,
        submit_tx,
    };

    app.set_status("Loading cluster lists…");
    let initial = app.fetch_kinds();
    execute_app_command(app, &api, settings, &channels, AppCommand::Fetch(initial)).await;

    let mut reader = EventStream::new();

    loop {
        terminal
            .draw(|frame| ui::render(frame, app))
            .context("failed to render terminal frame")?;

        if !app.running() {
            break;
        }

        tokio::select! {
            maybe_event = reader.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        if let Some(action) = input::map_key(app.mode(), key) {
                            let command = app.apply_action(action);
                            execute_app_command(app, &api, settings, &channels, command).await;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(error)) => {
                        app.set_status(format!("terminal event error: {error}"));
                    }
                    None => {
                        app.set_status("terminal event stream closed");
                        break;
                    }
                }
            }
            maybe_outcome = fetch_rx.recv() => {
                if let Some(outcome) = maybe_outcome {
                    debug!(kind = %outcome.kind, ok = outcome.result.is_ok(), "fetch completed");
                    app.complete_fetch(outcome);
                }
            }
            maybe_outcome = submit_rx.recv() => {
                if let Some(outcome) = maybe_outcome {
                    let command = app.complete_submission(outcome);
                    execute_app_command(app, &api, settings, &channels, command).await;
                }
            }
        }
    }

    Ok(())
}

async fn execute_app_command(
    app: &mut App,
    api: &Arc<dyn ClusterApi>,
    settings: &Settings,
    channels: &Channels,
    command: AppCommand,
) {
    match command {
        AppCommand::None => {}
        AppCommand::Fetch(kinds) => {
            app.begin_fetch(&kinds);
            spawn_fetches(Arc::clone(api), kinds, channels.fetch_tx.clone());
        }
        AppCommand::Submit(config) => {
            let plan = SubmitPlan::from_settings(settings);
            spawn_submit(Arc::clone(api), config, plan, channels.submit_tx.clone());
        }
        AppCommand::OpenPolicyPage(url) => {
            if !settings.open_browser {
                return;
            }
            if let Err(error) = open_in_browser(&settings.browser_command, &url).await {
                warn!("failed to open {url}: {error:#}");
                app.set_status(format!("Backup target saved, open {url} manually"));
            }
        }
    }
}

async fn open_in_browser(command: &str, url: &str) -> Result<()> {
    let mut child = TokioCommand::new(command)
        .arg(url)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .with_context(|| format!("failed to launch {command}"))?;
    tokio::spawn(async move {
        let _ = child.wait().await;
    });
    Ok(())
}
