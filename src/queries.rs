//! One-shot developer queries: export a game as PGN, list broadcasts.
//!
//! Neither returns a value or an error. Everything, including failures, is
//! handed to the caller's sink, so the binary can print it and tests can
//! collect it.

use tracing::warn;

use crate::config::Config;
use crate::http_client::init_http_client;
use crate::lichess::{self, Broadcast, FetchError};

pub const GAME_ID_PROMPT: &str = "Please provide a game id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutput {
    Prompt(String),
    Pgn(String),
    Broadcasts(Vec<Broadcast>),
    Failed(String),
}

pub fn fetch_game<S>(config: &Config, game_id: Option<&str>, sink: S)
where
    S: FnMut(QueryOutput),
{
    fetch_game_with(
        game_id,
        |id| {
            let client = init_http_client(config.http_timeout)
                .map_err(|err| FetchError::Network(format!("{err:#}")))?;
            lichess::fetch_game_pgn(client, &config.base_url, id)
        },
        sink,
    );
}

pub fn fetch_game_with<F, S>(game_id: Option<&str>, fetch: F, mut sink: S)
where
    F: FnOnce(&str) -> Result<String, FetchError>,
    S: FnMut(QueryOutput),
{
    let Some(id) = game_id.map(str::trim).filter(|id| !id.is_empty()) else {
        sink(QueryOutput::Prompt(GAME_ID_PROMPT.to_string()));
        return;
    };
    match fetch(id) {
        Ok(pgn) => sink(QueryOutput::Pgn(pgn)),
        Err(err) => {
            warn!(game_id = id, %err, "game export failed");
            sink(QueryOutput::Failed(format!("Error fetching game {id}: {err}")));
        }
    }
}

pub fn list_broadcasts<S>(config: &Config, include_finished: bool, sink: S)
where
    S: FnMut(QueryOutput),
{
    list_broadcasts_with(
        include_finished,
        || {
            let client = init_http_client(config.http_timeout)
                .map_err(|err| FetchError::Network(format!("{err:#}")))?;
            lichess::fetch_broadcasts(
                client,
                &config.base_url,
                config.broadcast_nb,
                include_finished,
            )
        },
        sink,
    );
}

pub fn list_broadcasts_with<F, S>(include_finished: bool, fetch: F, mut sink: S)
where
    F: FnOnce() -> Result<Vec<Broadcast>, FetchError>,
    S: FnMut(QueryOutput),
{
    match fetch() {
        Ok(items) => {
            let filtered = lichess::filter_broadcasts(items, include_finished);
            sink(QueryOutput::Broadcasts(filtered));
        }
        Err(err) => {
            warn!(include_finished, %err, "broadcast listing failed");
            sink(QueryOutput::Failed(format!("Error fetching broadcasts: {err}")));
        }
    }
}
