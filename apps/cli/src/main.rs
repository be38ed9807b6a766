use std::{sync::Arc, time::Duration};

use anyhow::Result;
use clap::{Parser, ValueEnum};
use console::style;
use copypasta::{ClipboardContext, ClipboardProvider};
use tracing_subscriber::EnvFilter;

use vidosik_core::{
    AnswerMode, ApiClient, Clipboard, MpvBackend, Session, SessionError, StateStore,
};

mod chat;
mod render;

/// CLI wrapper for AnswerMode (needed for clap ValueEnum)
#[derive(Clone, Default, ValueEnum)]
enum CliMode {
    #[default]
    Transcript,
    Buddy,
    Beyond,
}

impl From<CliMode> for AnswerMode {
    fn from(cli: CliMode) -> Self {
        match cli {
            CliMode::Transcript => AnswerMode::Transcript,
            CliMode::Buddy => AnswerMode::Buddy,
            CliMode::Beyond => AnswerMode::Beyond,
        }
    }
}

#[derive(Parser)]
#[command(name = "vidosik")]
#[command(about = "Analyze YouTube videos with an AI backend and chat about their content")]
struct Cli {
    /// Video URL. Omit to restore the previous session.
    url: Option<String>,

    /// Backend base URL
    #[arg(short, long, default_value = "http://localhost:8000")]
    server: String,

    /// Initial answer mode
    #[arg(short, long, default_value = "transcript")]
    mode: CliMode,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// Do not launch the embedded player
    #[arg(long)]
    no_player: bool,
}

struct SystemClipboard(ClipboardContext);

impl Clipboard for SystemClipboard {
    fn set_contents(&mut self, text: String) -> anyhow::Result<()> {
        self.0
            .set_contents(text)
            .map_err(|e| anyhow::anyhow!("clipboard write failed: {e}"))
    }
}

/// Stand-in when no system clipboard is reachable (headless terminals).
struct DisabledClipboard;

impl Clipboard for DisabledClipboard {
    fn set_contents(&mut self, _text: String) -> anyhow::Result<()> {
        anyhow::bail!("no system clipboard available")
    }
}

fn system_clipboard() -> Box<dyn Clipboard> {
    match ClipboardContext::new() {
        Ok(ctx) => Box::new(SystemClipboard(ctx)),
        Err(e) => {
            tracing::warn!(error = %e, "system clipboard unavailable");
            Box::new(DisabledClipboard)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    println!(
        "\n{}  {}\n",
        style("vidosik").cyan().bold(),
        style("Video Analysis").dim()
    );

    let api = ApiClient::new(&cli.server, Duration::from_secs(cli.timeout))?;

    match api.health().await {
        Ok(health) => println!(
            "{} Backend online ({})",
            style("✓").green().bold(),
            style(&health.status).dim()
        ),
        Err(e) => println!(
            "{} Backend health check failed: {}",
            style("!").yellow().bold(),
            style(e).dim()
        ),
    }

    let store = StateStore::in_default_location();

    let mut session = match cli.url {
        Some(url) => {
            let spinner = render::spinner("Analyzing video...");
            let result = match api.analyze(&url).await {
                Ok(result) => result,
                Err(SessionError::MissingAnalysis) => {
                    spinner.finish_and_clear();
                    // Terminal for this attempt; a stale snapshot must not
                    // resurrect it on the next launch.
                    let _ = store.clear().await;
                    println!(
                        "\n{} No analysis data available",
                        style("✗").red().bold()
                    );
                    println!("{}", style("Try another video.").dim());
                    std::process::exit(1);
                }
                Err(e) => {
                    spinner.finish_and_clear();
                    return Err(e.into());
                }
            };
            spinner.finish_with_message(format!(
                "{} Analyzed: {}",
                style("✓").green().bold(),
                style(&result.video_id).dim()
            ));

            let mut session = Session::start(result, Arc::new(api), system_clipboard());
            session.set_mode(cli.mode.into());
            session
        }
        None => match store.load().await {
            Some(snapshot) => {
                println!(
                    "{} Restored session for {}",
                    style("✓").green().bold(),
                    style(&snapshot.result.video_id).dim()
                );
                Session::restore(snapshot, Arc::new(api), system_clipboard())
            }
            None => {
                println!(
                    "{} No previous session. Pass a video URL to start one.",
                    style("!").yellow().bold()
                );
                std::process::exit(1);
            }
        },
    };

    session = session.with_store(store);
    if !cli.no_player {
        session = session.with_player(Arc::new(MpvBackend::default()));
    }
    session.persist().await?;

    match chat::run(&mut session).await? {
        chat::ExitAction::Back => {
            session.exit().await;
            println!("{}", style("Session closed.").dim());
        }
        chat::ExitAction::Quit => {
            session.suspend().await?;
            println!(
                "{}",
                style("Session saved. Run vidosik without a URL to resume.").dim()
            );
        }
    }

    Ok(())
}
