use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use tracing::{info, warn};

use arena_terminal::config::{self, Config};
use arena_terminal::http_client::init_http_client;
use arena_terminal::lichess;
use arena_terminal::logging;
use arena_terminal::poller::Poller;
use arena_terminal::state::{AppState, Delta, apply_delta};
use arena_terminal::view::{BadgeStyle, Card, ListView, select_view};

const CARD_WIDTH: u16 = 40;
const CARD_HEIGHT: u16 = 7;

struct App {
    state: AppState,
    should_quit: bool,
    poller: Poller,
    poll_interval: Duration,
}

impl App {
    fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('r') | KeyCode::Char('R') => self.retry(),
            KeyCode::Char('j') | KeyCode::Char('l') | KeyCode::Down | KeyCode::Right => {
                self.state.select_next()
            }
            KeyCode::Char('k') | KeyCode::Char('h') | KeyCode::Up | KeyCode::Left => {
                self.state.select_prev()
            }
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn retry(&mut self) {
        if self.poller.retry() {
            self.state.push_log("[INFO] Refresh requested");
        } else {
            self.state.push_log("[WARN] Poller is not running");
        }
    }
}

fn main() -> Result<()> {
    config::load_dotenv();
    let cfg = Config::from_env();
    let file_logging = logging::init_tui_logging()?;
    let client = init_http_client(cfg.http_timeout)?;
    info!(base_url = %cfg.base_url, "starting arena terminal");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let base_url = cfg.base_url.clone();
    let poller = Poller::start(
        cfg.poll_interval,
        move || lichess::fetch_tournaments(client, &base_url),
        tx,
    );

    let mut app = App {
        state: AppState::with_base_url(cfg.base_url.clone()),
        should_quit: false,
        poller,
        poll_interval: cfg.poll_interval,
    };
    if !file_logging {
        app.state
            .push_log(format!("[INFO] Set {} to keep a log file", logging::LOG_FILE_ENV));
    }
    let res = run_app(&mut terminal, &mut app, rx);
    app.poller.stop();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        warn!(%err, "terminal loop failed");
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(app))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let now_ms = Utc::now().timestamp_millis();
    match select_view(&app.state.view, &app.state.base_url, now_ms) {
        ListView::Skeleton(count) => render_skeleton(frame, chunks[1], count),
        ListView::Error {
            message,
            retry_hint,
        } => render_error(frame, chunks[1], &message, retry_hint),
        ListView::Empty(message) => {
            let empty = Paragraph::new(message).style(Style::default().fg(Color::DarkGray));
            frame.render_widget(empty, chunks[1]);
        }
        ListView::Grid(cards) => render_grid(frame, chunks[1], &cards, app.state.selected),
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new("j/k/←/→ Move | r Refresh | ? Help | q Quit")
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(app: &App) -> String {
    let host = app
        .state
        .base_url
        .trim_start_matches("https://")
        .trim_start_matches("http://");
    let updated = app
        .state
        .last_updated
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string());
    format!(
        "♞ ARENA PULSE | {host} | Updated {updated} | every {}s",
        app.poll_interval.as_secs()
    )
}

fn grid_columns(area: Rect) -> usize {
    (area.width / CARD_WIDTH).max(1) as usize
}

fn card_rect(area: Rect, columns: usize, slot: usize) -> Rect {
    let col = (slot % columns) as u16;
    let row = (slot / columns) as u16;
    let width = area.width / columns as u16;
    Rect {
        x: area.x + col * width,
        y: area.y + row * CARD_HEIGHT,
        width,
        height: CARD_HEIGHT,
    }
}

fn render_skeleton(frame: &mut Frame, area: Rect, count: usize) {
    let columns = grid_columns(area);
    let visible_rows = (area.height / CARD_HEIGHT) as usize;
    let style = Style::default().fg(Color::DarkGray);
    let filler = "░".repeat(CARD_WIDTH.saturating_sub(6) as usize);
    let short = "░".repeat((CARD_WIDTH / 2) as usize);

    for slot in 0..count.min(columns * visible_rows) {
        let rect = card_rect(area, columns, slot);
        let text = [filler.as_str(), short.as_str(), filler.as_str()].join("\n");
        let card = Paragraph::new(text)
            .style(style)
            .block(Block::default().borders(Borders::ALL).border_style(style));
        frame.render_widget(card, rect);
    }
}

fn render_error(frame: &mut Frame, area: Rect, message: &str, retry_hint: &str) {
    let lines = vec![
        Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("[ {retry_hint} ]"),
            Style::default().fg(Color::Yellow),
        )),
    ];
    let popup = centered_rect(60, 30, area);
    let paragraph = Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(paragraph, popup);
}

fn render_grid(frame: &mut Frame, area: Rect, cards: &[Card], selected: usize) {
    if area.height < CARD_HEIGHT {
        let empty = Paragraph::new("Tournament grid needs more height")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, area);
        return;
    }

    let columns = grid_columns(area);
    let total_rows = cards.len().div_ceil(columns);
    let visible_rows = (area.height / CARD_HEIGHT) as usize;
    let (start_row, end_row) = visible_range(selected / columns, total_rows, visible_rows);

    for (slot, idx) in (start_row * columns..(end_row * columns).min(cards.len())).enumerate() {
        let rect = card_rect(area, columns, slot);
        render_card(frame, rect, &cards[idx], idx == selected);
    }
}

fn render_card(frame: &mut Frame, area: Rect, card: &Card, selected: bool) {
    let mut border = if card.live {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };
    if selected {
        border = border.add_modifier(Modifier::BOLD).bg(Color::DarkGray);
    }

    let mut status = vec![Span::styled(card.badge.label.clone(), badge_style(card.badge.style))];
    if card.live {
        status.push(Span::styled(
            "  ● LIVE",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ));
    }

    let mut details = vec![card.variant.clone()];
    if let Some(clock) = &card.clock {
        details.push(clock.clone());
    }
    if let Some(duration) = &card.duration {
        details.push(duration.clone());
    }
    match card.rated {
        Some(true) => details.push("Rated".to_string()),
        Some(false) => details.push("Casual".to_string()),
        None => {}
    }

    let mut players = format!("{} players", card.players);
    if let Some(timing) = &card.timing {
        players.push_str(" · ");
        players.push_str(timing);
    }

    let lines = vec![
        Line::from(status),
        Line::from(details.join(" · ")),
        Line::from(players),
        Line::from(Span::styled(
            card.url.clone(),
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::UNDERLINED),
        )),
    ];

    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .title(card.name.clone())
            .borders(Borders::ALL)
            .border_style(border),
    );
    frame.render_widget(paragraph, area);
}

fn badge_style(style: BadgeStyle) -> Style {
    match style {
        BadgeStyle::Created => Style::default().fg(Color::Yellow),
        BadgeStyle::Started => Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        BadgeStyle::Finished => Style::default().fg(Color::DarkGray),
        BadgeStyle::Plain => Style::default(),
    }
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    let skip = state.logs.len().saturating_sub(3);
    state
        .logs
        .iter()
        .skip(skip)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 50, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Arena Pulse - Help",
        "",
        "  j/k ↑/↓ ←/→  Move selection",
        "  r            Refresh now",
        "  ?            Toggle help",
        "  Esc          Close help",
        "  q            Quit",
        "",
        "Tournaments refresh on their own; open the",
        "link on a card in a browser to join.",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
