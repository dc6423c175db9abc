use anyhow::{Result, bail};
use chrono::DateTime;

use arena_terminal::config::{self, Config};
use arena_terminal::lichess::BroadcastRound;
use arena_terminal::logging;
use arena_terminal::queries::{self, QueryOutput};

fn main() -> Result<()> {
    config::load_dotenv();
    logging::init_stderr_logging()?;
    let cfg = Config::from_env();

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    match args.first().map(String::as_str) {
        Some("game") => {
            queries::fetch_game(&cfg, args.get(1).map(String::as_str), print_output);
        }
        Some("broadcasts") => {
            let finished = args.iter().skip(1).any(|a| a == "--finished");
            queries::list_broadcasts(&cfg, finished, print_output);
        }
        _ => bail!("usage: lichess_query game <id> | broadcasts [--finished]"),
    }
    Ok(())
}

fn print_output(output: QueryOutput) {
    match output {
        QueryOutput::Prompt(msg) => eprintln!("{msg}"),
        QueryOutput::Pgn(pgn) => println!("{pgn}"),
        QueryOutput::Broadcasts(items) => {
            if items.is_empty() {
                println!("No broadcasts");
                return;
            }
            for b in items {
                let ongoing = b.rounds.iter().filter(|r| r.ongoing).count();
                println!(
                    "{} [{}] rounds: {}, ongoing: {}",
                    b.tour.name,
                    b.tour.id,
                    b.rounds.len(),
                    ongoing
                );
                if let Some(url) = b.tour.url.as_deref() {
                    println!("  {url}");
                }
                if let Some(desc) = b.tour.description.as_deref().filter(|d| !d.is_empty()) {
                    println!("  {desc}");
                }
                for round in &b.rounds {
                    println!("  - {}", round_line(round));
                }
            }
        }
        QueryOutput::Failed(msg) => eprintln!("{msg}"),
    }
}

fn round_line(round: &BroadcastRound) -> String {
    let name = round.name.as_deref().unwrap_or("Unnamed round");
    if round.ongoing {
        return format!("{name} (ongoing)");
    }
    match round.starts_at.and_then(DateTime::from_timestamp_millis) {
        Some(at) => format!("{name} ({})", at.format("%Y-%m-%d %H:%M UTC")),
        None => name.to_string(),
    }
}
