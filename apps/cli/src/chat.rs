use std::time::Duration;

use anyhow::Result;
use console::style;
use dialoguer::Input;
use vidosik_core::{AnswerMode, Reveal, Session, StaggeredReveal, Submission, Tab};

use crate::render;

const KEY_POINT_STAGGER: Duration = Duration::from_millis(100);

pub enum ExitAction {
    /// Back to the entry point; persisted state is cleared.
    Back,
    /// Plain quit; the session stays restorable.
    Quit,
}

/// Per-screen entrance state: the intro block shows once, key points
/// stagger in only on their first appearance.
struct Screen {
    intro: Reveal,
    key_points: StaggeredReveal,
}

/// The interactive session loop. Plain input asks the backend about the
/// video; slash commands drive tabs, clipboard, mode, and the player.
pub async fn run(session: &mut Session) -> Result<ExitAction> {
    let screen = Screen {
        intro: Reveal::new(),
        key_points: StaggeredReveal::new(session.key_points().len(), KEY_POINT_STAGGER),
    };

    if screen.intro.intersected() {
        render::intro(session);
    }
    render::tab_pane(session, &screen.key_points).await;
    render::conversation_tail(session, 0);
    let mut rendered = session.conversation().len();

    loop {
        let Some(line) = prompt().await? else {
            return Ok(ExitAction::Quit);
        };
        let input = line.trim().to_string();
        if input.is_empty() {
            continue;
        }

        if let Some(command) = input.strip_prefix('/') {
            let mut parts = command.split_whitespace();
            match parts.next().unwrap_or("") {
                "quit" | "q" => return Ok(ExitAction::Quit),
                "back" => return Ok(ExitAction::Back),
                "help" => render::help(),
                "player" => {
                    println!("{}", render::player_status(session.player_phase()));
                }
                "transcript" => render::transcript_panel(session),
                "mode" => match parts.next() {
                    None => render::mode_overview(session.mode()),
                    Some(name) => match parse_mode(name) {
                        Some(mode) => {
                            session.set_mode(mode);
                            session.persist().await?;
                            render::mode_hint(mode);
                        }
                        None => usage("/mode [transcript|buddy|beyond]"),
                    },
                },
                "tab" => match parts.next().and_then(parse_tab) {
                    Some(tab) => {
                        session.set_active_tab(tab);
                        session.persist().await?;
                        render::tab_pane(session, &screen.key_points).await;
                    }
                    None => usage("/tab summary|keypoints"),
                },
                "copy" => match parts.next() {
                    Some("transcript") => report_copy(session.copy_transcript()),
                    Some("summary") => report_copy(session.copy_summary()),
                    _ => usage("/copy transcript|summary"),
                },
                other => {
                    println!(
                        "{} Unknown command /{other}; try /help.",
                        style("!").yellow().bold()
                    );
                }
            }
        } else {
            let spinner = render::spinner("Thinking...");
            let submission = session.submit_question(&input).await;
            spinner.finish_and_clear();

            if submission == Submission::Ignored {
                continue;
            }
            render::conversation_tail(session, rendered);
            rendered = session.conversation().len();
        }
    }
}

fn parse_mode(name: &str) -> Option<AnswerMode> {
    match name {
        "transcript" => Some(AnswerMode::Transcript),
        "buddy" => Some(AnswerMode::Buddy),
        "beyond" => Some(AnswerMode::Beyond),
        _ => None,
    }
}

fn parse_tab(name: &str) -> Option<Tab> {
    match name {
        "summary" => Some(Tab::Summary),
        "keypoints" | "key-points" => Some(Tab::KeyPoints),
        _ => None,
    }
}

fn usage(expected: &str) {
    println!("{} Usage: {expected}", style("!").yellow().bold());
}

fn report_copy(result: anyhow::Result<()>) {
    match result {
        Ok(()) => println!("{} Copied!", style("✓").green().bold()),
        Err(e) => println!(
            "{} Copy failed: {}",
            style("!").yellow().bold(),
            style(e).dim()
        ),
    }
}

/// Read one line from the user; `None` means the input stream ended.
async fn prompt() -> Result<Option<String>> {
    tokio::task::spawn_blocking(|| {
        match Input::<String>::new()
            .with_prompt("you")
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => Ok(Some(line)),
            Err(dialoguer::Error::IO(_)) => Ok(None),
        }
    })
    .await?
}
