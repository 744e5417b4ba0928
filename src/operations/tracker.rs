use crate::db::storage::Storage;
use crate::errors::{StoreError, VALIDATION_MESSAGE};
use crate::operations::chart::ChartPresenter;
use crate::store::TransactionStore;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    prelude::{Alignment, Color, Constraint, Direction, Layout, Modifier, Rect, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};
use rust_decimal::{Decimal, RoundingStrategy};
use std::io;
use std::str::FromStr;
use tracing::error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Description,
    Amount,
}

impl Focus {
    fn toggle(self) -> Self {
        match self {
            Focus::Description => Focus::Amount,
            Focus::Amount => Focus::Description,
        }
    }
}

struct TrackerState<S: Storage> {
    store: TransactionStore<S>,
    chart: ChartPresenter,

    description_input: String,
    amount_input: String,
    focus: Focus,
    error: Option<String>,

    list_state: ListState,
}

impl<S: Storage> TrackerState<S> {
    fn new(store: TransactionStore<S>) -> Self {
        let mut chart = ChartPresenter::new();
        // Startup order: fresh backing surface first, then the initial render.
        chart.reset();
        chart.render(store.all());

        Self {
            store,
            chart,
            description_input: String::new(),
            amount_input: String::new(),
            focus: Focus::Description,
            error: None,
            list_state: ListState::default(),
        }
    }

    fn focused_input_mut(&mut self) -> &mut String {
        match self.focus {
            Focus::Description => &mut self.description_input,
            Focus::Amount => &mut self.amount_input,
        }
    }

    /// Form submission: validate, mutate, persist, re-render. On a
    /// validation failure the typed values stay in place; on success the
    /// form clears and the error line hides.
    fn submit(&mut self) {
        let Some(amount) = parse_amount(&self.amount_input) else {
            self.error = Some(VALIDATION_MESSAGE.to_string());
            return;
        };

        match self.store.add(&self.description_input, amount) {
            Ok(_) => {
                self.error = None;
                self.description_input.clear();
                self.amount_input.clear();
                self.refresh_chart();
            }
            Err(StoreError::Validation(message)) => {
                self.error = Some(message);
            }
            Err(e) => {
                error!("failed to add transaction: {e}");
                self.error = Some(e.to_string());
            }
        }
    }

    /// The per-row delete affordance: removes the highlighted transaction
    /// and runs the same re-render cascade as an add, minus validation.
    fn delete_selected(&mut self) {
        let Some(selected) = self.list_state.selected() else {
            return;
        };
        let Some(tx) = self.store.all().get(selected) else {
            return;
        };
        let id = tx.id;

        match self.store.remove(id) {
            Ok(()) => {
                let len = self.store.all().len();
                if len == 0 {
                    self.list_state.select(None);
                } else {
                    self.list_state.select(Some(selected.min(len - 1)));
                }
                self.refresh_chart();
            }
            Err(e) => {
                error!("failed to remove transaction {id}: {e}");
                self.error = Some(e.to_string());
            }
        }
    }

    fn refresh_chart(&mut self) {
        self.chart.render(self.store.all());
    }

    fn move_selection(&mut self, delta: i32) {
        let len = self.store.all().len();
        if len == 0 {
            self.list_state.select(None);
            return;
        }

        let current = self.list_state.selected().unwrap_or(0) as i32;
        let max_index = len.saturating_sub(1) as i32;
        let next = (current + delta).clamp(0, max_index) as usize;
        self.list_state.select(Some(next));
    }
}

pub fn run_tracker<S: Storage>(store: TransactionStore<S>) -> Result<(), String> {
    enable_raw_mode().map_err(|e| format!("Failed to enable raw mode: {}", e))?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)
        .map_err(|e| format!("Failed to enter alternate screen: {}", e))?;

    let result = (|| {
        let backend = ratatui::backend::CrosstermBackend::new(stdout);
        let mut terminal = ratatui::Terminal::new(backend)
            .map_err(|e| format!("Failed to initialize terminal: {}", e))?;

        let mut state = TrackerState::new(store);

        loop {
            terminal
                .draw(|frame| {
                    let size = frame.area();
                    let layout = Layout::default()
                        .direction(Direction::Vertical)
                        .constraints([
                            Constraint::Length(5),
                            Constraint::Min(8),
                            Constraint::Length(3),
                            Constraint::Length(2),
                        ])
                        .split(size);

                    render_form(frame, layout[0], &state);

                    let middle = Layout::default()
                        .direction(Direction::Horizontal)
                        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
                        .split(layout[1]);

                    render_list(frame, middle[0], &mut state);
                    state.chart.paint(frame, middle[1]);

                    render_balance(frame, layout[2], &state);
                    render_footer(frame, layout[3]);
                })
                .map_err(|e| format!("Failed to draw terminal UI: {}", e))?;

            if event::poll(std::time::Duration::from_millis(200))
                .map_err(|e| format!("Failed to poll input: {}", e))?
            {
                match event::read().map_err(|e| format!("Failed to read input: {}", e))? {
                    Event::Key(key) => {
                        if handle_key(&mut state, key) {
                            break;
                        }
                    }
                    Event::Resize(_, _) => {}
                    _ => {}
                }
            }
        }

        Ok(())
    })();

    disable_raw_mode().map_err(|e| format!("Failed to disable raw mode: {}", e))?;
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen)
        .map_err(|e| format!("Failed to leave alternate screen: {}", e))?;

    result
}

fn handle_key<S: Storage>(state: &mut TrackerState<S>, key: KeyEvent) -> bool {
    // Many terminals emit both a Press and a Release event. Only act on Press/Repeat.
    if key.kind == KeyEventKind::Release {
        return false;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return true;
    }

    match key.code {
        KeyCode::Esc => return true,
        KeyCode::Tab | KeyCode::BackTab => state.focus = state.focus.toggle(),
        KeyCode::Enter => state.submit(),
        KeyCode::Up => state.move_selection(-1),
        KeyCode::Down => state.move_selection(1),
        KeyCode::Delete => state.delete_selected(),
        KeyCode::Backspace => {
            state.focused_input_mut().pop();
        }
        KeyCode::Char(ch) => state.focused_input_mut().push(ch),
        _ => {}
    }

    false
}

fn render_form<S: Storage>(frame: &mut ratatui::Frame, area: Rect, state: &TrackerState<S>) {
    let block = Block::default().title("New Transaction").borders(Borders::ALL);

    let mut lines = vec![
        input_line(
            "Description",
            &state.description_input,
            state.focus == Focus::Description,
        ),
        input_line("Amount", &state.amount_input, state.focus == Focus::Amount),
    ];

    match state.error.as_deref() {
        Some(message) => lines.push(Line::from(Span::styled(
            message.to_string(),
            Style::default().fg(Color::Red),
        ))),
        None => lines.push(Line::from("")),
    }

    let paragraph = Paragraph::new(lines).block(block).alignment(Alignment::Left);
    frame.render_widget(paragraph, area);
}

fn input_line<'a>(label: &str, value: &str, focused: bool) -> Line<'a> {
    let marker = if focused { "> " } else { "  " };
    let style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(marker),
        Span::styled(format!("{label}: {value}"), style),
    ])
}

fn render_list<S: Storage>(frame: &mut ratatui::Frame, area: Rect, state: &mut TrackerState<S>) {
    let block = Block::default().title("Transactions").borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if state.store.all().is_empty() {
        let empty = Paragraph::new("No transactions yet")
            .alignment(Alignment::Center)
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    let items: Vec<ListItem> = state
        .store
        .all()
        .iter()
        .map(|tx| {
            let color = if tx.is_income() {
                Color::Green
            } else {
                Color::Red
            };
            ListItem::new(Line::from(Span::styled(
                format!("{}: {} IDR", tx.description, tx.amount.normalize()),
                Style::default().fg(color),
            )))
        })
        .collect();

    let list = List::new(items)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("➤ ");

    frame.render_stateful_widget(list, inner, &mut state.list_state);
}

fn render_balance<S: Storage>(frame: &mut ratatui::Frame, area: Rect, state: &TrackerState<S>) {
    let block = Block::default().title("Balance").borders(Borders::ALL);
    let paragraph = Paragraph::new(Span::styled(
        format_balance(state.store.balance()),
        Style::default().add_modifier(Modifier::BOLD),
    ))
    .block(block)
    .alignment(Alignment::Left);

    frame.render_widget(paragraph, area);
}

fn render_footer(frame: &mut ratatui::Frame, area: Rect) {
    let hint =
        "Type into the form  Tab switch field  Enter add  ↑/↓ select  Del remove  Esc quit";
    let block = Block::default().borders(Borders::ALL);
    frame.render_widget(
        Paragraph::new(hint).block(block).alignment(Alignment::Left),
        area,
    );
}

/// Numeric coercion of the raw amount field. Anything that is not a
/// plain decimal number fails validation.
fn parse_amount(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim()).ok()
}

/// Balance rounded to whole units, half away from zero, suffixed "IDR".
fn format_balance(balance: Decimal) -> String {
    let rounded = balance.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    format!("{} IDR", rounded)
}
