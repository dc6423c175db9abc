use std::collections::VecDeque;

use chrono::{DateTime, Local};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::config::DEFAULT_BASE_URL;
use crate::lichess::FetchError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TournamentStatus {
    Created,
    Started,
    Finished,
    // Anything the API sends that we do not know about, kept verbatim.
    Other(String),
}

impl TournamentStatus {
    /// Lichess encodes arena status as 10/20/30; older payloads and tests use
    /// the lowercase names.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(10) => Self::Created,
                Some(20) => Self::Started,
                Some(30) => Self::Finished,
                _ => Self::Other(n.to_string()),
            },
            Value::String(s) => match s.as_str() {
                "created" => Self::Created,
                "started" => Self::Started,
                "finished" => Self::Finished,
                other => Self::Other(other.to_string()),
            },
            Value::Null => Self::Other(String::new()),
            other => Self::Other(other.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for TournamentStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(Self::from_value(&value))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Variant {
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Perf {
    pub name: Option<String>,
}

/// Time control in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct Clock {
    #[serde(default)]
    pub limit: u32,
    #[serde(default)]
    pub increment: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tournament {
    pub id: String,
    pub full_name: Option<String>,
    pub name: Option<String>,
    pub status: Option<TournamentStatus>,
    pub nb_players: Option<u32>,
    pub variant: Option<Variant>,
    pub perf: Option<Perf>,
    pub clock: Option<Clock>,
    pub rated: Option<bool>,
    // Epoch milliseconds.
    pub starts_at: Option<i64>,
    pub finishes_at: Option<i64>,
    pub minutes: Option<u32>,
}

impl Tournament {
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .or(self.name.as_deref())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(&self.id)
    }

    pub fn is_live(&self) -> bool {
        self.status == Some(TournamentStatus::Started)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Error(String),
    Ready(Vec<Tournament>),
}

impl ViewState {
    pub fn items(&self) -> &[Tournament] {
        match self {
            ViewState::Ready(items) => items,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetTournaments(Vec<Tournament>),
    TournamentsFailed(FetchError),
    Log(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderCommand {
    Retry,
    Stop,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub view: ViewState,
    pub selected: usize,
    pub help_overlay: bool,
    pub logs: VecDeque<String>,
    pub last_updated: Option<DateTime<Local>>,
    pub base_url: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            view: ViewState::Loading,
            selected: 0,
            help_overlay: false,
            logs: VecDeque::new(),
            last_updated: None,
            base_url: base_url.into(),
        }
    }

    pub fn selected_tournament(&self) -> Option<&Tournament> {
        self.view.items().get(self.selected)
    }

    pub fn selected_tournament_id(&self) -> Option<String> {
        self.selected_tournament().map(|t| t.id.clone())
    }

    pub fn select_next(&mut self) {
        let total = self.view.items().len();
        if total == 0 {
            self.selected = 0;
            return;
        }
        self.selected = (self.selected + 1) % total;
    }

    pub fn select_prev(&mut self) {
        let total = self.view.items().len();
        if total == 0 {
            self.selected = 0;
            return;
        }
        if self.selected == 0 {
            self.selected = total - 1;
        } else {
            self.selected -= 1;
        }
    }

    pub fn clamp_selection(&mut self) {
        let total = self.view.items().len();
        if total == 0 {
            self.selected = 0;
        } else if self.selected >= total {
            self.selected = total - 1;
        }
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        const MAX_LOGS: usize = 200;
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetTournaments(items) => {
            // Keep the cursor on the same tournament across polls when it survives.
            let selected_id = state.selected_tournament_id();
            let count = items.len();
            state.selected = selected_id
                .and_then(|id| items.iter().position(|t| t.id == id))
                .unwrap_or(state.selected);
            state.view = ViewState::Ready(items);
            state.last_updated = Some(Local::now());
            state.clamp_selection();
            state.push_log(format!("[INFO] Loaded {count} tournaments"));
        }
        Delta::TournamentsFailed(err) => {
            state.push_log(format!("[WARN] Tournament fetch failed: {err}"));
            state.view = ViewState::Error(err.user_message().to_string());
            state.selected = 0;
        }
        Delta::Log(msg) => state.push_log(msg),
    }
}
