//! Pure mapping from `ViewState` to what the terminal draws. Nothing here
//! touches the terminal, so the selection rules are testable on their own.

use crate::lichess::tournament_link;
use crate::state::{Clock, Tournament, TournamentStatus, ViewState};

pub const SKELETON_CARDS: usize = 6;
pub const EMPTY_MESSAGE: &str = "No tournaments right now";
pub const RETRY_HINT: &str = "Press r to retry";
pub const DEFAULT_VARIANT: &str = "Standard";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BadgeStyle {
    Created,
    Started,
    Finished,
    Plain,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusBadge {
    pub label: String,
    pub style: BadgeStyle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: String,
    pub name: String,
    pub url: String,
    pub badge: StatusBadge,
    pub live: bool,
    pub variant: String,
    pub players: u32,
    pub clock: Option<String>,
    pub duration: Option<String>,
    pub rated: Option<bool>,
    pub timing: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListView {
    Skeleton(usize),
    Error {
        message: String,
        retry_hint: &'static str,
    },
    Empty(&'static str),
    Grid(Vec<Card>),
}

pub fn select_view(view: &ViewState, base_url: &str, now_ms: i64) -> ListView {
    match view {
        ViewState::Loading => ListView::Skeleton(SKELETON_CARDS),
        ViewState::Error(message) => ListView::Error {
            message: message.clone(),
            retry_hint: RETRY_HINT,
        },
        ViewState::Ready(items) if items.is_empty() => ListView::Empty(EMPTY_MESSAGE),
        ViewState::Ready(items) => ListView::Grid(
            items
                .iter()
                .map(|t| build_card(t, base_url, now_ms))
                .collect(),
        ),
    }
}

pub fn build_card(t: &Tournament, base_url: &str, now_ms: i64) -> Card {
    Card {
        id: t.id.clone(),
        name: t.display_name().to_string(),
        url: tournament_link(base_url, &t.id),
        badge: status_badge(t.status.as_ref()),
        live: t.is_live(),
        variant: variant_label(t),
        players: t.nb_players.unwrap_or(0),
        clock: t.clock.map(clock_label),
        duration: duration_label(t),
        rated: t.rated,
        timing: timing_label(t, now_ms),
    }
}

pub fn status_badge(status: Option<&TournamentStatus>) -> StatusBadge {
    let (label, style) = match status {
        Some(TournamentStatus::Created) => ("Starting Soon".to_string(), BadgeStyle::Created),
        Some(TournamentStatus::Started) => ("Live".to_string(), BadgeStyle::Started),
        Some(TournamentStatus::Finished) => ("Finished".to_string(), BadgeStyle::Finished),
        Some(TournamentStatus::Other(raw)) => (raw.clone(), BadgeStyle::Plain),
        None => (String::new(), BadgeStyle::Plain),
    };
    StatusBadge { label, style }
}

/// Non-standard variants win, then the perf name, then "Standard".
pub fn variant_label(t: &Tournament) -> String {
    let variant = t
        .variant
        .as_ref()
        .and_then(|v| v.name.as_deref())
        .filter(|name| !name.is_empty() && *name != DEFAULT_VARIANT);
    let perf = t
        .perf
        .as_ref()
        .and_then(|p| p.name.as_deref())
        .filter(|name| !name.is_empty());
    variant.or(perf).unwrap_or(DEFAULT_VARIANT).to_string()
}

pub fn clock_label(clock: Clock) -> String {
    let limit = match clock.limit {
        15 => "¼".to_string(),
        30 => "½".to_string(),
        45 => "¾".to_string(),
        90 => "1.5".to_string(),
        secs if secs % 60 == 0 => (secs / 60).to_string(),
        secs => format!("{:.1}", secs as f64 / 60.0),
    };
    format!("{limit}+{}", clock.increment)
}

pub fn timing_label(t: &Tournament, now_ms: i64) -> Option<String> {
    match t.status.as_ref()? {
        TournamentStatus::Started => {
            let ends = t.finishes_at?;
            Some(format!("ends in {}", format_remaining(ends.saturating_sub(now_ms))))
        }
        TournamentStatus::Created => {
            let starts = t.starts_at?;
            if starts <= now_ms {
                Some("starting".to_string())
            } else {
                Some(format!("starts in {}", format_remaining(starts.saturating_sub(now_ms))))
            }
        }
        _ => None,
    }
}

fn format_remaining(ms: i64) -> String {
    let secs = ms.max(0) / 1000;
    if secs < 60 {
        return "<1m".to_string();
    }
    format_minutes(secs / 60)
}

fn format_minutes(minutes: i64) -> String {
    if minutes < 60 {
        return format!("{minutes}m");
    }
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Arena length, e.g. "57m" or "1h 30m".
pub fn duration_label(t: &Tournament) -> Option<String> {
    t.minutes
        .filter(|m| *m > 0)
        .map(|m| format_minutes(i64::from(m)))
}
