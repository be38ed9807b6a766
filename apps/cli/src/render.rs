use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use vidosik_core::{
    AnswerMode, CopyTag, PlayerPhase, Role, Session, StaggeredReveal, Tab,
    types::KEY_POINTS_PLACEHOLDER,
};

pub fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ")
            .template("{spinner:.cyan} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn intro(session: &Session) {
    println!("{}", style("─".repeat(60)).dim());
    println!(
        "{} {}",
        style("Video:").dim(),
        style(session.video_id()).cyan()
    );
    println!(
        "{} {}",
        style("Player:").dim(),
        player_status(session.player_phase())
    );
    println!(
        "{}",
        style("Type a question, or /help for commands.").dim()
    );
    println!("{}", style("─".repeat(60)).dim());
}

pub fn player_status(phase: Option<PlayerPhase>) -> String {
    match phase {
        None => style("disabled").dim().to_string(),
        Some(PlayerPhase::Loading) => style("loading...").yellow().to_string(),
        Some(PlayerPhase::Ready) => format!("{} ready", style("✓").green().bold()),
        Some(PlayerPhase::Error(message)) => format!("{} {}", style("✗").red().bold(), message),
    }
}

/// Render the active content pane. Key points stagger in on their first
/// showing; afterwards the revealed set is already complete and they print
/// straight through.
pub async fn tab_pane(session: &Session, key_points_reveal: &StaggeredReveal) {
    match session.active_tab() {
        Tab::Summary => {
            println!(
                "\n{}  {}",
                style("AI Summary").bold(),
                copy_label(session, CopyTag::Summary, "/copy summary")
            );
            println!("{}\n", session.summary_text());
        }
        Tab::KeyPoints => {
            println!("\n{}", style("Key Points").bold());
            let points = session.key_points();
            if points.is_empty() {
                println!("{}\n", style(KEY_POINTS_PLACEHOLDER).dim());
                return;
            }

            key_points_reveal.intersected();
            let mut shown = 0;
            while shown < points.len() {
                while shown < points.len() && key_points_reveal.is_revealed(shown) {
                    println!("  {} {}", style("•").cyan(), points[shown]);
                    shown += 1;
                }
                if shown < points.len() {
                    key_points_reveal.wait_changed().await;
                }
            }
            println!();
        }
    }
}

pub fn transcript_panel(session: &Session) {
    println!(
        "\n{}  {}",
        style("Transcript").bold(),
        copy_label(session, CopyTag::Transcript, "/copy transcript")
    );
    println!("{}\n", session.transcript_text());
}

fn copy_label(session: &Session, tag: CopyTag, command: &str) -> String {
    if session.copied_item() == Some(tag) {
        style("Copied!").green().to_string()
    } else {
        style(command).dim().to_string()
    }
}

pub fn conversation_tail(session: &Session, from: usize) {
    for entry in &session.conversation()[from..] {
        match entry.role {
            Role::User => {
                println!("{} {}", style("you ›").cyan().bold(), entry.text);
            }
            Role::Assistant => {
                let label = entry
                    .mode
                    .map(|mode| format!(" [{}]", mode.wire_name()))
                    .unwrap_or_default();
                println!(
                    "{}{} {}",
                    style("ai ›").magenta().bold(),
                    style(label).dim(),
                    entry.text
                );
            }
        }
    }
}

pub fn mode_hint(mode: AnswerMode) {
    let hint = mode.hint();
    println!("{} {}", style("Mode:").dim(), style(hint.title).bold());
    println!("  {}", hint.description);
    println!("  {} {}", style("Example:").dim(), style(hint.example).italic());
}

pub fn mode_overview(active: AnswerMode) {
    for mode in [AnswerMode::Transcript, AnswerMode::Buddy, AnswerMode::Beyond] {
        let hint = mode.hint();
        let marker = if mode == active {
            style("●").cyan().to_string()
        } else {
            style("○").dim().to_string()
        };
        println!(
            "{} {} {} {}",
            marker,
            style(hint.title).bold(),
            style("—").dim(),
            style(hint.description).dim()
        );
    }
    println!(
        "{}",
        style("Switch with /mode transcript|buddy|beyond.").dim()
    );
}

pub fn help() {
    let commands = [
        ("/tab summary|keypoints", "switch the content pane"),
        ("/transcript", "show the transcript panel"),
        ("/copy transcript|summary", "copy an artifact to the clipboard"),
        ("/mode [transcript|buddy|beyond]", "show or switch the answer mode"),
        ("/player", "show the player state"),
        ("/back", "end the session and clear saved state"),
        ("/quit", "leave, keeping the session restorable"),
    ];
    for (command, explanation) in commands {
        println!(
            "  {}  {}",
            style(format!("{command:<32}")).cyan(),
            style(explanation).dim()
        );
    }
}
