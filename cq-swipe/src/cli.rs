//! Terminal driver helpers
//!
//! Line-oriented input parsing and event rendering for the `cq-swipe`
//! binary. Kept separate from `main.rs` so it can be tested.

use crate::classifier::{Intent, Key};
use crate::session::SessionSnapshot;
use cq_common::events::{Direction, SwipeEvent};

pub const HELP: &str = "\
Commands:
  l, left, ←        reject (arrow key)
  r, right, →       accept (arrow key)
  n, reject         reject (button)
  y, accept         accept (button)
  move <offset>     drag the card without releasing
  drag <offset>     release a drag at <offset>
  s, status         show the current cards
  q, quit           finish and wait for pending commits";

/// One parsed line of terminal input
#[derive(Debug, Clone, PartialEq)]
pub enum TerminalCommand {
    Intent(Intent),
    Status,
    Help,
    Quit,
}

/// Parse a line of input
///
/// Returns `None` for blank lines and malformed drag offsets. Unknown
/// words become unmapped key presses, which the classifier ignores.
pub fn parse_line(line: &str) -> Option<TerminalCommand> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut parts = trimmed.split_whitespace();
    let word = parts.next()?.to_ascii_lowercase();

    let command = match word.as_str() {
        "l" | "left" | "←" => key(Key::ArrowLeft),
        "r" | "right" | "→" => key(Key::ArrowRight),
        "n" | "reject" => TerminalCommand::Intent(Intent::ButtonClicked(Direction::Reject)),
        "y" | "accept" => TerminalCommand::Intent(Intent::ButtonClicked(Direction::Accept)),
        "move" => TerminalCommand::Intent(Intent::GestureMoved(parts.next()?.parse().ok()?)),
        "drag" => TerminalCommand::Intent(Intent::GestureReleased(parts.next()?.parse().ok()?)),
        "s" | "status" => TerminalCommand::Status,
        "?" | "h" | "help" => TerminalCommand::Help,
        "q" | "quit" | "exit" => TerminalCommand::Quit,
        // Raw escape sequences from terminals that pass arrow keys through
        _ => key(trimmed.parse().unwrap_or_else(|never| match never {})),
    };
    Some(command)
}

fn key(key: Key) -> TerminalCommand {
    TerminalCommand::Intent(Intent::KeyPressed { key, repeat: false })
}

/// One-line description of an event
pub fn render_event(event: &SwipeEvent) -> String {
    match event {
        SwipeEvent::SessionStateChanged {
            old_state,
            new_state,
            ..
        } => format!("session: {} -> {}", old_state, new_state),
        SwipeEvent::FetchFailed { reason, .. } => {
            format!("could not load candidates: {}", reason)
        }
        SwipeEvent::CandidateShown {
            position,
            display_name,
            remaining,
            ..
        } => format!("#{} {} ({} left)", position + 1, display_name, remaining),
        SwipeEvent::DecisionCommitted {
            position,
            direction,
            ..
        } => format!("#{} {}", position + 1, direction),
        SwipeEvent::DecisionConfirmed { position, .. } => format!("#{} saved", position + 1),
        SwipeEvent::MatchFound { display_name, .. } => {
            format!("It's a match! You and {} liked each other.", display_name)
        }
        SwipeEvent::CommitFailed {
            position, reason, ..
        } => format!("#{} was not saved: {}", position + 1, reason),
        SwipeEvent::DataIntegrityWarning {
            render_key, reason, ..
        } => format!("warning: {} {}", render_key, reason),
        SwipeEvent::Announcement { text, .. } => format!("(say) {}", text),
    }
}

/// Multi-line view of the visible stack
pub fn render_snapshot(snapshot: &SessionSnapshot) -> String {
    let mut lines = vec![format!(
        "[{}] {}/{} decided, {} matches, {} pending, {} failed",
        snapshot.state,
        snapshot.cursor,
        snapshot.total,
        snapshot.summary.matches,
        snapshot.summary.pending,
        snapshot.summary.failed
    )];

    for card in &snapshot.visible {
        let marker = if card.is_top { ">" } else { " " };
        let skills = if card.skills.is_empty() {
            String::new()
        } else {
            format!(" [{}]", card.skills.join(", "))
        };
        lines.push(format!(
            "{} {} ({}%){}",
            marker, card.display_name, card.match_score, skills
        ));
    }

    if let Some(error) = &snapshot.last_error {
        lines.push(format!("error: {}", error));
    }
    lines.join("\n")
}
