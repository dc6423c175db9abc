use reqwest::blocking::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::state::Tournament;

pub const RATE_LIMITED_MESSAGE: &str = "Rate limited. Please wait...";
pub const LOAD_FAILED_MESSAGE: &str = "Failed to load tournaments";

const NDJSON: &str = "application/x-ndjson";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("rate limited (http 429)")]
    RateLimited,
    #[error("http {0}")]
    Http(u16),
    #[error("request failed: {0}")]
    Network(String),
    #[error("invalid response: {0}")]
    Parse(String),
}

impl FetchError {
    /// Only rate limiting gets its own copy; every other failure is shown
    /// the same way and the detail stays in the logs.
    pub fn user_message(&self) -> &'static str {
        match self {
            FetchError::RateLimited => RATE_LIMITED_MESSAGE,
            _ => LOAD_FAILED_MESSAGE,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

pub fn tournaments_url(base_url: &str) -> String {
    format!("{base_url}/api/tournament")
}

pub fn tournament_link(base_url: &str, id: &str) -> String {
    format!("{base_url}/tournament/{id}")
}

pub fn game_export_url(base_url: &str, game_id: &str) -> String {
    format!("{base_url}/game/export/{game_id}.pgn?clocks=true&moves=true")
}

pub fn broadcasts_url(base_url: &str, nb: usize, include_finished: bool) -> String {
    if include_finished {
        format!("{base_url}/api/broadcast?nb={nb}&finished=true")
    } else {
        format!("{base_url}/api/broadcast?nb={nb}")
    }
}

pub fn check_status(status: u16) -> Result<(), FetchError> {
    match status {
        429 => Err(FetchError::RateLimited),
        200..=299 => Ok(()),
        other => Err(FetchError::Http(other)),
    }
}

/// Maps a finished HTTP exchange for the tournament list onto its outcome.
/// The status is judged before the body, so a 429 stays a rate limit even
/// when its body could not be read.
pub fn classify_response(
    status: u16,
    body: Result<String, FetchError>,
) -> Result<Vec<Tournament>, FetchError> {
    check_status(status)?;
    parse_tournaments_json(&body?)
}

pub fn fetch_tournaments(client: &Client, base_url: &str) -> Result<Vec<Tournament>, FetchError> {
    let url = tournaments_url(base_url);
    debug!(%url, "fetching tournaments");
    let resp = client.get(&url).header(ACCEPT, "application/json").send()?;
    let status = resp.status().as_u16();
    let body = resp.text().map_err(FetchError::from);
    classify_response(status, body)
        .inspect_err(|err| warn!(%url, status, %err, "tournament list request failed"))
}

#[derive(Debug, Deserialize)]
struct TournamentListResponse {
    started: Option<Vec<Tournament>>,
    created: Option<Vec<Tournament>>,
}

/// Flattens the list payload into `started` followed by `created`, each in
/// API order. Missing or null arrays count as empty.
pub fn parse_tournaments_json(raw: &str) -> Result<Vec<Tournament>, FetchError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let data: TournamentListResponse = serde_json::from_str(trimmed)
        .map_err(|err| FetchError::Parse(format!("invalid tournament json: {err}")))?;

    let mut items = data.started.unwrap_or_default();
    items.extend(data.created.unwrap_or_default());
    Ok(items)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct BroadcastTour {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub description: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct BroadcastRound {
    pub name: Option<String>,
    #[serde(default)]
    pub ongoing: bool,
    #[serde(rename = "startsAt")]
    pub starts_at: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Broadcast {
    #[serde(default)]
    pub tour: BroadcastTour,
    #[serde(default)]
    pub rounds: Vec<BroadcastRound>,
}

impl Broadcast {
    pub fn has_ongoing_round(&self) -> bool {
        self.rounds.iter().any(|r| r.ongoing)
    }
}

pub fn parse_broadcasts_ndjson(raw: &str) -> Result<Vec<Broadcast>, FetchError> {
    let mut out = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let item = serde_json::from_str::<Broadcast>(line).map_err(|err| {
            FetchError::Parse(format!("broadcast line {}: {err}", idx + 1))
        })?;
        out.push(item);
    }
    Ok(out)
}

/// With `include_finished` any broadcast that has rounds at all is kept;
/// otherwise only broadcasts with a round in progress.
pub fn filter_broadcasts(items: Vec<Broadcast>, include_finished: bool) -> Vec<Broadcast> {
    items
        .into_iter()
        .filter(|b| {
            if include_finished {
                !b.rounds.is_empty()
            } else {
                b.has_ongoing_round()
            }
        })
        .collect()
}

pub fn fetch_broadcasts(
    client: &Client,
    base_url: &str,
    nb: usize,
    include_finished: bool,
) -> Result<Vec<Broadcast>, FetchError> {
    let url = broadcasts_url(base_url, nb, include_finished);
    debug!(%url, "fetching broadcasts");
    let resp = client.get(&url).header(ACCEPT, NDJSON).send()?;
    let status = resp.status().as_u16();
    if let Err(err) = check_status(status) {
        warn!(%url, status, "broadcast request rejected");
        return Err(err);
    }
    let body = resp.text()?;
    parse_broadcasts_ndjson(&body)
}

pub fn fetch_game_pgn(client: &Client, base_url: &str, game_id: &str) -> Result<String, FetchError> {
    let url = game_export_url(base_url, game_id);
    debug!(%url, "exporting game");
    let resp = client.get(&url).send()?;
    let status = resp.status().as_u16();
    if let Err(err) = check_status(status) {
        warn!(%url, status, "game export rejected");
        return Err(err);
    }
    Ok(resp.text()?)
}
