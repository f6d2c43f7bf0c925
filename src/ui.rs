use crate::client::{
    AppSnapshot,
    ResultBanner,
};
use color_eyre::eyre::Result;
use crossterm::{
    event::{
        Event,
        EventStream,
        KeyCode,
        KeyEventKind,
    },
    terminal::{
        disable_raw_mode,
        enable_raw_mode,
    },
};
use futures::StreamExt;
use lucky_grid::{
    animator::Highlight,
    catalog::GRID_SIZE,
    history::HistoryItem,
};
use ratatui::{
    prelude::*,
    widgets::*,
};
use std::io::{
    Stdout,
    stdout,
};

const GRID_COLUMNS: usize = 3;

pub type InputEvents = EventStream;

pub fn input_event_stream() -> InputEvents {
    EventStream::new()
}

pub enum UserEvent {
    Quit,
    Spin,
    Connect,
    Disconnect,
    ConfirmPurchase(u32),
    DismissResult,
    Redraw,
}

#[derive(Debug, Default)]
pub struct UiState {
    mode: Mode,
    show_history: bool,
    showing_result: bool,
    max_purchase: u32,
    terminal: Option<Terminal<CrosstermBackend<Stdout>>>,
}

#[derive(Clone, Debug, Default)]
enum Mode {
    #[default]
    Normal,
    PurchaseModal(PurchaseState),
    QuitModal,
}

#[derive(Clone, Debug)]
struct PurchaseState {
    quantity: u32,
}

impl Default for PurchaseState {
    fn default() -> Self {
        PurchaseState { quantity: 1 }
    }
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(stdout(), crossterm::terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    Ok(())
}

pub fn open_purchase(state: &mut UiState) {
    state.mode = Mode::PurchaseModal(PurchaseState::default());
}

pub fn draw(state: &mut UiState, snap: &AppSnapshot) -> Result<()> {
    state.showing_result = snap.result.is_some();
    state.max_purchase = snap.max_purchase.max(1);
    if let Some(mut term) = state.terminal.take() {
        term.draw(|f| ui(f, state, snap))?;
        state.terminal = Some(term);
    }
    Ok(())
}

/// Waits for the next key press that means something in the current mode.
/// Cancel safe.
pub async fn next_event(state: &mut UiState, events: &mut InputEvents) -> Result<UserEvent> {
    loop {
        let Some(event) = events.next().await else {
            return Ok(UserEvent::Quit);
        };
        let k = match event? {
            Event::Key(k) => k,
            Event::Resize(..) => return Ok(UserEvent::Redraw),
            _ => continue,
        };
        if k.kind != KeyEventKind::Press {
            continue;
        }
        match &mut state.mode {
            Mode::PurchaseModal(ps) => match k.code {
                KeyCode::Esc => {
                    state.mode = Mode::Normal;
                    return Ok(UserEvent::Redraw);
                }
                KeyCode::Enter => {
                    let quantity = ps.quantity;
                    state.mode = Mode::Normal;
                    return Ok(UserEvent::ConfirmPurchase(quantity));
                }
                KeyCode::Up | KeyCode::Right | KeyCode::Char('+') => {
                    ps.quantity = (ps.quantity + 1).min(state.max_purchase);
                    return Ok(UserEvent::Redraw);
                }
                KeyCode::Down | KeyCode::Left | KeyCode::Char('-') => {
                    ps.quantity = ps.quantity.saturating_sub(1).max(1);
                    return Ok(UserEvent::Redraw);
                }
                _ => continue,
            },
            Mode::QuitModal => match k.code {
                KeyCode::Char('y') | KeyCode::Char('Y') => return Ok(UserEvent::Quit),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    state.mode = Mode::Normal;
                    return Ok(UserEvent::Redraw);
                }
                _ => continue,
            },
            Mode::Normal => {}
        }
        if state.showing_result && matches!(k.code, KeyCode::Enter | KeyCode::Esc) {
            return Ok(UserEvent::DismissResult);
        }
        return Ok(match k.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                state.mode = Mode::QuitModal;
                UserEvent::Redraw
            }
            KeyCode::Char(' ') => UserEvent::Spin,
            KeyCode::Char('c') => UserEvent::Connect,
            KeyCode::Char('d') => UserEvent::Disconnect,
            KeyCode::Char('b') => {
                open_purchase(state);
                UserEvent::Redraw
            }
            KeyCode::Char('h') => {
                state.show_history = !state.show_history;
                UserEvent::Redraw
            }
            _ => continue,
        });
    }
}

fn ui(f: &mut Frame, state: &UiState, snap: &AppSnapshot) {
    f.render_widget(Clear, f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4), // status
            Constraint::Min(9),    // grid (+ history)
            Constraint::Length(3), // errors
            Constraint::Length(3), // help
        ])
        .split(f.area());

    draw_top(f, chunks[0], snap);
    if state.show_history {
        let middle = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(chunks[1]);
        draw_grid(f, middle[0], snap);
        draw_history(f, middle[1], &snap.game.history);
    } else {
        draw_grid(f, chunks[1], snap);
    }
    draw_errors(f, chunks[2], snap);
    draw_help(f, chunks[3]);
    draw_modals(f, state, snap);
}

fn draw_top(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let wallet = snap.game.account.as_deref().unwrap_or("not connected");
    let spinning = if snap.game.spinning { " | SPINNING" } else { "" };
    let status = Paragraph::new(format!(
        "Wallet: {} | Tickets: {} | Price: {} | Funds: {}{}\n{}",
        wallet,
        snap.game.economy.ticket_balance,
        snap.ticket_price,
        snap.funds,
        spinning,
        snap.status
    ))
    .block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(status, area);
}

fn draw_grid(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let block = Block::default().borders(Borders::ALL).title("Prize Grid");
    let inner = block.inner(area);
    f.render_widget(block, area);

    let rows = snap.game.prizes.len().max(GRID_SIZE).div_ceil(GRID_COLUMNS);
    let row_areas = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, rows as u32); rows])
        .split(inner);

    for (i, prize) in snap.game.prizes.iter().enumerate() {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(vec![Constraint::Ratio(1, GRID_COLUMNS as u32); GRID_COLUMNS])
            .split(row_areas[i / GRID_COLUMNS]);
        let rect = cols[i % GRID_COLUMNS];

        let lit = snap.highlight.and_then(Highlight::index) == Some(i);
        let forced = matches!(snap.highlight, Some(Highlight::Forced(idx)) if idx == i);
        let style = if forced && !prize.is_loss() {
            Style::default()
                .bg(parse_color(&prize.win_color))
                .fg(parse_color(&prize.win_text_color))
                .add_modifier(Modifier::BOLD)
        } else if forced {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else if lit {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let cell = Paragraph::new(prize.label.clone())
            .alignment(Alignment::Center)
            .style(style)
            .block(Block::default().borders(Borders::ALL).border_style(
                if lit { Style::default().fg(Color::Yellow) } else { Style::default() },
            ));
        f.render_widget(cell, rect);
    }
}

fn draw_history(f: &mut Frame, area: Rect, history: &[HistoryItem]) {
    let lines: Vec<Line> = if history.is_empty() {
        vec![Line::styled("No wins yet", Style::default().fg(Color::DarkGray))]
    } else {
        history
            .iter()
            .map(|item| {
                Line::from(format!(
                    "{}  {}",
                    item.won_at.format("%Y-%m-%d %H:%M:%S"),
                    item.prize.label
                ))
            })
            .collect()
    };
    let panel = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Win History"));
    f.render_widget(panel, area);
}

fn draw_errors(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let (text, color) = match snap.errors.last() {
        Some(e) => (e.clone(), Color::Red),
        None => ("No errors".to_string(), Color::DarkGray),
    };
    let errors = Paragraph::new(text)
        .style(Style::default().fg(color))
        .block(Block::default().borders(Borders::ALL).title("Errors"));
    f.render_widget(errors, area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help = Paragraph::new(
        "space spin | c connect | d disconnect | b buy tickets | h history | q/Esc quit",
    )
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, area);
}

fn draw_modals(f: &mut Frame, state: &UiState, snap: &AppSnapshot) {
    match &state.mode {
        Mode::PurchaseModal(ps) => {
            let area = centered_rect(40, 30, f.area());
            let block = Block::default().borders(Borders::ALL).title("Buy Tickets");
            let total = snap.ticket_price.saturating_mul(u64::from(ps.quantity));
            let p = Paragraph::new(format!(
                "Quantity: {} (max {})\nTotal: {} USDC\nEnter=buy Esc=cancel +/- to change",
                ps.quantity, snap.max_purchase, total
            ));
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        }
        Mode::QuitModal => {
            let area = centered_rect(40, 20, f.area());
            let block = Block::default().borders(Borders::ALL).title("Confirm Quit");
            let p = Paragraph::new("Quit the game? (Y/N)");
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        }
        Mode::Normal => {
            if let Some(result) = &snap.result {
                draw_result(f, result);
            }
        }
    }
}

fn draw_result(f: &mut Frame, result: &ResultBanner) {
    let area = centered_rect(50, 30, f.area());
    let (title, style) = if result.is_loss {
        ("No Luck", Style::default().fg(Color::Red))
    } else {
        (
            "Winner!",
            Style::default()
                .fg(parse_color(&result.prize.win_color))
                .add_modifier(Modifier::BOLD),
        )
    };
    let block = Block::default().borders(Borders::ALL).title(title);
    let message = result.message.as_deref().unwrap_or("...");
    let p = Paragraph::new(vec![
        Line::styled(result.prize.label.clone(), style),
        Line::from(message.to_string()),
        Line::from(""),
        Line::styled("Enter/Esc to close", Style::default().fg(Color::DarkGray)),
    ])
    .alignment(Alignment::Center);
    f.render_widget(Clear, area);
    f.render_widget(block.clone(), area);
    f.render_widget(p, block.inner(area));
}

fn parse_color(raw: &str) -> Color {
    raw.parse().unwrap_or(Color::Reset)
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h_percent) / 2),
            Constraint::Percentage(h_percent),
            Constraint::Percentage((100 - h_percent) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w_percent) / 2),
            Constraint::Percentage(w_percent),
            Constraint::Percentage((100 - w_percent) / 2),
        ])
        .split(popup_layout[1])[1]
}
