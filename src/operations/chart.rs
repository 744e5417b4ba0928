use ratatui::{
    prelude::{Alignment, Color, Constraint, Direction, Layout, Rect, Style},
    text::{Line, Span},
    widgets::canvas::{Canvas, Points},
    widgets::{Block, Borders, Clear, Paragraph},
};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use tracing::debug;

use crate::models::transaction::Transaction;

const INCOME_LABEL: &str = "Income";
const EXPENSES_LABEL: &str = "Expenses";
const INCOME_COLOR: Color = Color::Green;
const EXPENSES_COLOR: Color = Color::Red;

/// One live doughnut visualization: the two aggregates it was built
/// from. Replaced wholesale on every render, never updated in place.
pub struct DoughnutChart {
    pub income: Decimal,
    pub expenses: Decimal,
}

/// Owns at most one chart instance. `render` always tears down the
/// previous instance before installing the new one, so stale data can
/// never linger on screen.
pub struct ChartPresenter {
    instance: Option<DoughnutChart>,
    teardowns: usize,
}

impl ChartPresenter {
    pub fn new() -> Self {
        Self {
            instance: None,
            teardowns: 0,
        }
    }

    /// Discards whatever was drawn before. Called once at startup; the
    /// first frame after this paints on a cleared surface.
    pub fn reset(&mut self) {
        self.instance = None;
    }

    /// Derives the two aggregates from the current list and swaps in a
    /// fresh instance, destroying the prior one first if present.
    pub fn render(&mut self, transactions: &[Transaction]) {
        let income: Decimal = transactions
            .iter()
            .filter(|tx| tx.amount > Decimal::ZERO)
            .map(|tx| tx.amount)
            .sum();
        let expenses: Decimal = -transactions
            .iter()
            .filter(|tx| tx.amount < Decimal::ZERO)
            .map(|tx| tx.amount)
            .sum::<Decimal>();

        if self.instance.take().is_some() {
            self.teardowns += 1;
            debug!(teardowns = self.teardowns, "destroyed previous chart instance");
        }
        self.instance = Some(DoughnutChart { income, expenses });
    }

    pub fn instance(&self) -> Option<&DoughnutChart> {
        self.instance.as_ref()
    }

    pub fn paint(&self, frame: &mut ratatui::Frame, area: Rect) {
        let block = Block::default()
            .title("Income vs Expenses")
            .borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(Clear, area);
        frame.render_widget(block, area);

        if let Some(chart) = self.instance.as_ref() {
            chart.paint(frame, inner);
        }
    }

    #[cfg(test)]
    pub fn teardowns(&self) -> usize {
        self.teardowns
    }
}

impl DoughnutChart {
    fn paint(&self, frame: &mut ratatui::Frame, area: Rect) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(5), Constraint::Length(2)])
            .split(area);

        self.paint_doughnut(frame, layout[0]);
        self.paint_legend(frame, layout[1]);
    }

    fn paint_doughnut(&self, frame: &mut ratatui::Frame, area: Rect) {
        let total = (self.income + self.expenses).to_f64().unwrap_or(0.0);
        if total <= 0.0 {
            let empty = Paragraph::new("No transactions yet")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::DarkGray));
            frame.render_widget(empty, area);
            return;
        }

        let income_sweep =
            self.income.to_f64().unwrap_or(0.0) / total * std::f64::consts::TAU;
        let slices = [
            (0.0, income_sweep, INCOME_COLOR),
            (income_sweep, std::f64::consts::TAU, EXPENSES_COLOR),
        ];

        let canvas = Canvas::default()
            .x_bounds([-1.0, 1.0])
            .y_bounds([-1.0, 1.0])
            .paint(|ctx| {
                let step = 0.04;
                for (start, end, color) in &slices {
                    let mut points = Vec::new();
                    // radius starts past the hole to make it a doughnut
                    let mut r = 0.55;
                    while r <= 1.0 {
                        let mut angle = *start;
                        while angle <= *end {
                            points.push((r * angle.cos(), r * angle.sin()));
                            angle += 0.05;
                        }
                        r += step;
                    }
                    if !points.is_empty() {
                        ctx.draw(&Points {
                            coords: &points,
                            color: *color,
                        });
                    }
                }
            });

        frame.render_widget(canvas, area);
    }

    fn paint_legend(&self, frame: &mut ratatui::Frame, area: Rect) {
        let lines = vec![
            Line::from(vec![
                Span::styled("■ ", Style::default().fg(INCOME_COLOR)),
                Span::raw(format!("{}: {} IDR", INCOME_LABEL, self.income.normalize())),
            ]),
            Line::from(vec![
                Span::styled("■ ", Style::default().fg(EXPENSES_COLOR)),
                Span::raw(format!(
                    "{}: {} IDR",
                    EXPENSES_LABEL,
                    self.expenses.normalize()
                )),
            ]),
        ];

        frame.render_widget(Paragraph::new(lines).alignment(Alignment::Left), area);
    }
}
