use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::lichess::FetchError;
use crate::state::{Delta, ProviderCommand, Tournament};

/// Owned handle for the tournament poll loop.
///
/// The loop fetches once on start, then once per `interval`, and delivers each
/// outcome as a `Delta`. Stopping cancels the schedule but does not interrupt a
/// request that is already on the wire; a result that lands after `stop` is
/// dropped before it reaches the channel. Dropping the handle stops the loop.
pub struct Poller {
    cmd_tx: Sender<ProviderCommand>,
    live: Arc<AtomicBool>,
}

impl Poller {
    pub fn start<F>(interval: Duration, fetch: F, tx: Sender<Delta>) -> Self
    where
        F: FnMut() -> Result<Vec<Tournament>, FetchError> + Send + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let live = Arc::new(AtomicBool::new(true));
        let flag = live.clone();

        thread::spawn(move || {
            let mut fetch = fetch;
            let mut next_due = Instant::now();
            info!(interval_secs = interval.as_secs(), "tournament poller started");

            loop {
                if !flag.load(Ordering::Acquire) {
                    break;
                }
                let wait = next_due.saturating_duration_since(Instant::now());
                match cmd_rx.recv_timeout(wait) {
                    Ok(ProviderCommand::Retry) => {
                        if !poll_once(&mut fetch, &tx, &flag) {
                            break;
                        }
                    }
                    Ok(ProviderCommand::Stop) | Err(RecvTimeoutError::Disconnected) => break,
                    Err(RecvTimeoutError::Timeout) => {
                        // Fixed cadence: the next slot counts from this deadline.
                        next_due += interval;
                        if !poll_once(&mut fetch, &tx, &flag) {
                            break;
                        }
                        // Missed slots collapse into one immediate fetch.
                        let now = Instant::now();
                        if next_due < now {
                            next_due = now;
                        }
                    }
                }
            }
            info!("tournament poller stopped");
        });

        Self { cmd_tx, live }
    }

    /// Queues a manual fetch. If a fetch is in flight the retry runs after it.
    pub fn retry(&self) -> bool {
        if !self.is_running() {
            return false;
        }
        self.cmd_tx.send(ProviderCommand::Retry).is_ok()
    }

    pub fn is_running(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    pub fn stop(&mut self) {
        if !self.live.swap(false, Ordering::AcqRel) {
            return;
        }
        // The thread may still be blocked on a request; it exits on its own once
        // the request returns.
        let _ = self.cmd_tx.send(ProviderCommand::Stop);
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

// Returns false once nobody is listening any more.
fn poll_once<F>(fetch: &mut F, tx: &Sender<Delta>, live: &AtomicBool) -> bool
where
    F: FnMut() -> Result<Vec<Tournament>, FetchError>,
{
    let outcome = fetch();
    if !live.load(Ordering::Acquire) {
        debug!("poller stopped while fetching; dropping result");
        return false;
    }
    let delta = match outcome {
        Ok(items) => {
            debug!(count = items.len(), "tournaments fetched");
            Delta::SetTournaments(items)
        }
        Err(err) => {
            warn!(%err, "tournament fetch failed");
            Delta::TournamentsFailed(err)
        }
    };
    tx.send(delta).is_ok()
}
