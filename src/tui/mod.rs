//! Ratatui-based terminal UI.
//!
//! The dashboard shows the yield chart with a series selector and a
//! crosshair cursor, the month-end summary table, and a chat panel for
//! asking questions about the fetched table.

use std::io;
use std::time::Duration;

use chrono::{Datelike, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Terminal,
};

use crate::agent::{ChatCompletionsAgent, Conversation, Role};
use crate::app::pipeline::{self, DashboardData};
use crate::domain::{DashboardConfig, LongObservation, Selection, SeriesName};
use crate::error::AppError;
use crate::reshape::{crosshair_at, filter_selection, Crosshair};

mod plotters_chart;

use plotters_chart::{SeriesLine, YieldPlottersChart};

/// Start the TUI.
pub fn run(config: DashboardConfig) -> Result<(), AppError> {
    // Fetch before entering raw mode so load errors print normally.
    eprintln!("Fetching yield data...");
    let mut app = App::new(config)?;

    let _guard = TerminalGuard::new()?;
    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(4, format!("Failed to initialize terminal: {e}")))?;

    app.event_loop(&mut terminal)
}

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| AppError::new(4, format!("Failed to enable raw mode: {e}")))?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(4, format!("Failed to enter alternate screen: {e}")));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Blocking work deferred until after the next draw, so the status line
/// is visible while it runs.
enum Pending {
    Refresh,
    Ask(String),
}

struct App {
    config: DashboardConfig,
    data: DashboardData,
    selection: Selection,
    /// Index into `data.dates`; `None` hides the crosshair.
    cursor: Option<usize>,
    conversation: Conversation,
    agent: Option<ChatCompletionsAgent>,
    input: String,
    editing: bool,
    pending: Option<Pending>,
    status: String,
}

impl App {
    fn new(config: DashboardConfig) -> Result<Self, AppError> {
        let data = pipeline::run_dashboard(&config)?;
        let status = format!("Loaded {} observations.", data.long.len());
        Ok(Self {
            config,
            data,
            selection: Selection::All,
            cursor: None,
            conversation: Conversation::new(),
            agent: None,
            input: String::new(),
            editing: false,
            pending: None,
            status,
        })
    }

    fn event_loop<B: ratatui::backend::Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(4, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if let Some(work) = self.pending.take() {
                self.run_pending(work);
                needs_redraw = true;
                continue;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(4, format!("Event poll error: {e}")))? {
                continue;
            }

            match event::read().map_err(|e| AppError::new(4, format!("Event read error: {e}")))? {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        if self.editing {
            self.handle_input(code);
            return false;
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Tab | KeyCode::Char('s') => {
                self.selection = self.selection.next(&self.config.series);
                self.status = format!("series: {}", self.selection.display_name());
            }
            KeyCode::Left => self.move_cursor(-1),
            KeyCode::Right => self.move_cursor(1),
            KeyCode::PageUp => self.move_cursor(-20),
            KeyCode::PageDown => self.move_cursor(20),
            KeyCode::Home => self.cursor = (!self.data.dates.is_empty()).then_some(0),
            KeyCode::End => self.cursor = self.data.dates.len().checked_sub(1),
            KeyCode::Char('h') => {
                self.cursor = None;
                self.status = "Crosshair hidden.".to_string();
            }
            KeyCode::Char('r') => {
                self.pending = Some(Pending::Refresh);
                self.status = "Fetching yield data...".to_string();
            }
            KeyCode::Char('i') => {
                self.editing = true;
                self.status = "Type a question. Enter to send, Esc to cancel.".to_string();
            }
            KeyCode::Char('c') => {
                self.conversation = std::mem::take(&mut self.conversation).cleared();
                self.status = "Conversation cleared.".to_string();
            }
            _ => {}
        }

        false
    }

    fn handle_input(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.editing = false;
                self.status = "Question canceled.".to_string();
            }
            KeyCode::Enter => {
                self.editing = false;
                let question = std::mem::take(&mut self.input);
                if question.trim().is_empty() {
                    self.status = "Question is empty.".to_string();
                } else {
                    self.status = format!("Asking {}...", self.config.agent_model);
                    self.pending = Some(Pending::Ask(question));
                }
            }
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
    }

    fn move_cursor(&mut self, delta: isize) {
        self.cursor = step_cursor(self.cursor, delta, self.data.dates.len());
        if let Some(hit) = self.crosshair() {
            self.status = crate::report::format_crosshair(&hit);
        }
    }

    fn crosshair(&self) -> Option<Crosshair> {
        let date = *self.data.dates.get(self.cursor?)?;
        let visible = filter_selection(&self.data.long, self.selection);
        crosshair_at(&visible, date)
    }

    fn run_pending(&mut self, work: Pending) {
        match work {
            Pending::Refresh => match pipeline::run_dashboard(&self.config) {
                Ok(data) => {
                    self.data = data;
                    self.cursor = None;
                    self.status = format!("Loaded {} observations.", self.data.long.len());
                }
                Err(err) => {
                    log::warn!("refresh failed: {err}");
                    self.status = format!("Refresh failed: {err}");
                }
            },
            Pending::Ask(question) => {
                if self.agent.is_none() {
                    match ChatCompletionsAgent::from_env(&self.config.agent_model, self.config.agent_context_floor) {
                        Ok(agent) => self.agent = Some(agent),
                        Err(err) => {
                            self.status = err.to_string();
                            return;
                        }
                    }
                }
                let Some(agent) = &self.agent else {
                    return;
                };
                match crate::agent::ask(agent, &self.data.table, &self.conversation, &question) {
                    Ok(next) => {
                        self.conversation = next;
                        self.status = "Answered.".to_string();
                    }
                    Err(err) => {
                        log::warn!("agent failed: {err}");
                        self.status = format!("Agent failed: {err}");
                    }
                }
            }
        }
    }

    fn draw(&mut self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(5),
                Constraint::Min(0),
                Constraint::Length(10),
                Constraint::Length(3),
            ])
            .split(size);

        self.draw_header(frame, chunks[0]);
        self.draw_body(frame, chunks[1]);
        self.draw_chat(frame, chunks[2]);
        self.draw_footer(frame, chunks[3]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let mut lines: Vec<Line> = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("Treasury Yield Tracker", Style::default().fg(Color::Cyan)),
            Span::raw(" | Here is a simple way to monitor the market interest rate."),
        ]));

        let mut legend: Vec<Span> = vec![Span::styled("series: ", Style::default().fg(Color::Gray))];
        for &s in &self.config.series {
            let (r, g, b) = series_rgb(s);
            let mut style = Style::default().fg(Color::Rgb(r, g, b));
            if self.selection.matches(s) {
                style = style.add_modifier(Modifier::BOLD);
            } else {
                style = style.add_modifier(Modifier::DIM);
            }
            legend.push(Span::styled(format!("{} ", s.label()), style));
        }
        legend.push(Span::styled(
            format!(
                "| showing: {} | {}",
                self.selection.display_name(),
                crate::report::format_axis_range(&self.data.axis)
            ),
            Style::default().fg(Color::Gray),
        ));
        lines.push(Line::from(legend));

        let crosshair = match self.crosshair() {
            Some(hit) => crate::report::format_crosshair(&hit),
            None => "crosshair off (←/→ to move)".to_string(),
        };
        lines.push(Line::from(Span::styled(
            format!("{} | {crosshair}", crate::report::format_as_of(&self.data.table)),
            Style::default().fg(Color::Gray),
        )));

        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_body(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(0), Constraint::Length(56)])
            .split(area);

        self.draw_chart(frame, chunks[0]);
        self.draw_summary(frame, chunks[1]);
    }

    fn draw_chart(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Yield (%)").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);
        frame.render_widget(Clear, inner);

        let series = chart_series(&self.data, self.selection, self.cursor);

        let (chart_rect, insets) = chart_layout(inner);
        let widget = YieldPlottersChart {
            lines: &series.lines,
            quarter_rules: &series.quarter_rules,
            crosshair: series.crosshair,
            markers: &series.markers,
            x_bounds: series.x_bounds,
            y_bounds: series.y_bounds,
        };

        frame.render_widget(widget, chart_rect);
        if let Some(insets) = insets {
            draw_axis_ticks(frame, inner, chart_rect, insets, series.x_bounds, series.y_bounds);
        }
    }

    fn draw_summary(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let table = crate::report::format_month_end_table(&self.data.summary);
        let block = Block::default().title("Month-End Data").borders(Borders::ALL);
        let visible = block.inner(area).height as usize;

        // Header + rule stay pinned; body scrolls to the latest months.
        let lines: Vec<&str> = table.lines().collect();
        let (head, body) = lines.split_at(lines.len().min(2));
        let room = visible.saturating_sub(head.len());
        let skip = body.len().saturating_sub(room);

        let text: Vec<Line> = head
            .iter()
            .map(|l| Line::from(Span::styled(*l, Style::default().add_modifier(Modifier::BOLD))))
            .chain(body.iter().skip(skip).map(|l| Line::from(*l)))
            .collect();

        frame.render_widget(Paragraph::new(text).block(block), area);
    }

    fn draw_chat(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title("Ask about the data").borders(Borders::ALL);
        let inner = block.inner(area);

        let mut lines: Vec<Line> = Vec::new();
        for msg in self.conversation.messages() {
            let (who, color) = match msg.role {
                Role::User => ("you", Color::Green),
                Role::Assistant => ("assistant", Color::Cyan),
                Role::System => ("system", Color::Gray),
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{who}: "), Style::default().fg(color).add_modifier(Modifier::BOLD)),
                Span::raw(msg.content.clone()),
            ]));
        }
        if self.editing {
            lines.push(Line::from(Span::styled(
                format!("> {}_", self.input),
                Style::default().fg(Color::Yellow),
            )));
        }

        let total = wrapped_height(&lines, inner.width);
        let scroll = total.saturating_sub(inner.height as usize);
        let p = Paragraph::new(Text::from(lines))
            .wrap(Wrap { trim: false })
            .scroll((u16::try_from(scroll).unwrap_or(u16::MAX), 0))
            .block(block);
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = "Tab series  ←/→ crosshair  h hide  i ask  c clear chat  r refresh  q quit";
        let line = Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(&self.status, Style::default().fg(Color::Yellow)),
        ]);
        let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

/// Line colour by catalog position.
fn series_rgb(series: SeriesName) -> (u8, u8, u8) {
    const PALETTE: [(u8, u8, u8); 4] = [
        (0, 200, 255),  // 3 Month
        (255, 170, 0),  // 5 Year
        (255, 80, 80),  // 10 Year
        (180, 120, 255), // 30 Year
    ];
    PALETTE[series.index() % PALETTE.len()]
}

fn day_x(date: NaiveDate) -> f64 {
    date.num_days_from_ce() as f64
}

fn x_date(v: f64) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(v.round() as i32)
}

/// Move the crosshair by `delta` trading days, starting from the latest.
fn step_cursor(cursor: Option<usize>, delta: isize, len: usize) -> Option<usize> {
    let last = len.checked_sub(1)?;
    let next = match cursor {
        None => last,
        Some(i) => i.saturating_add_signed(delta).min(last),
    };
    Some(next)
}

/// Approximate rendered height of wrapped lines.
fn wrapped_height(lines: &[Line], width: u16) -> usize {
    let width = usize::from(width.max(1));
    lines
        .iter()
        .map(|l| l.width().max(1).div_ceil(width))
        .sum()
}

struct ChartSeries {
    lines: Vec<SeriesLine>,
    quarter_rules: Vec<f64>,
    crosshair: Option<f64>,
    markers: Vec<((f64, f64), (u8, u8, u8))>,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
}

/// Build chart series for Plotters.
///
/// Y bounds come from the unfiltered axis range, so toggling the selection
/// never rescales the chart.
fn chart_series(data: &DashboardData, selection: Selection, cursor: Option<usize>) -> ChartSeries {
    let visible: Vec<LongObservation> = filter_selection(&data.long, selection);

    let mut lines: Vec<SeriesLine> = Vec::new();
    for s in SeriesName::ALL {
        let points: Vec<(f64, f64)> = visible
            .iter()
            .filter(|o| o.series == s)
            .map(|o| (day_x(o.date), o.value))
            .collect();
        if !points.is_empty() {
            lines.push(SeriesLine {
                rgb: series_rgb(s),
                points,
            });
        }
    }

    let mut x_bounds = match (data.dates.first(), data.dates.last()) {
        (Some(&first), Some(&last)) => [day_x(first), day_x(last)],
        _ => [0.0, 1.0],
    };
    if x_bounds[1] <= x_bounds[0] {
        x_bounds = [x_bounds[0] - 1.0, x_bounds[0] + 1.0];
    }

    let mut y_bounds = [data.axis.low, data.axis.high];
    if y_bounds[1] <= y_bounds[0] {
        y_bounds = [y_bounds[0] - 0.5, y_bounds[0] + 0.5];
    }

    // Rule and markers share the snapped date.
    let hit = cursor
        .and_then(|i| data.dates.get(i))
        .and_then(|&date| crosshair_at(&visible, date));
    let markers = hit
        .as_ref()
        .map(|hit| {
            hit.values
                .iter()
                .map(|&(s, v)| ((day_x(hit.date), v), series_rgb(s)))
                .collect()
        })
        .unwrap_or_default();

    ChartSeries {
        lines,
        quarter_rules: data.quarter_starts.iter().map(|&d| day_x(d)).collect(),
        crosshair: hit.map(|hit| day_x(hit.date)),
        markers,
        x_bounds,
        y_bounds,
    }
}

#[derive(Debug, Clone, Copy)]
struct AxisInsets {
    left: u16,
    right: u16,
    top: u16,
    bottom: u16,
}

fn chart_layout(inner: Rect) -> (Rect, Option<AxisInsets>) {
    let insets = AxisInsets {
        left: 7,
        right: 2,
        top: 1,
        bottom: 2,
    };

    if inner.width <= insets.left + insets.right + 10
        || inner.height <= insets.top + insets.bottom + 5
    {
        return (inner, None);
    }

    let rect = Rect {
        x: inner.x + insets.left,
        y: inner.y + insets.top,
        width: inner.width - insets.left - insets.right,
        height: inner.height - insets.top - insets.bottom,
    };

    (rect, Some(insets))
}

fn draw_axis_ticks(
    frame: &mut ratatui::Frame<'_>,
    inner: Rect,
    chart: Rect,
    insets: AxisInsets,
    x_bounds: [f64; 2],
    y_bounds: [f64; 2],
) {
    let ticks = 5usize;
    let style = Style::default().fg(Color::Gray);

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let x_val = x_bounds[0] + u * (x_bounds[1] - x_bounds[0]);
        let Some(date) = x_date(x_val) else {
            continue;
        };
        let x = chart.x + ((chart.width - 1) as f64 * u).round() as u16;
        let label = date.format("%Y-%m").to_string();
        let label_len = label.len() as u16;
        let start = x
            .saturating_sub(label_len / 2)
            .min((inner.x + inner.width).saturating_sub(label_len));
        let y = chart.y + chart.height;
        if y >= inner.y + inner.height - 1 {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    for i in 0..ticks {
        let u = i as f64 / (ticks as f64 - 1.0);
        let y_val = y_bounds[0] + u * (y_bounds[1] - y_bounds[0]);
        let y = chart.y + (chart.height - 1) - ((chart.height - 1) as f64 * u).round() as u16;
        let label = format!("{y_val:.2}");
        let label_len = label.len() as u16;
        let x = inner.x + insets.left.saturating_sub(1);
        let start = x.saturating_sub(label_len);
        if start < inner.x {
            continue;
        }
        frame.render_widget(
            Paragraph::new(label).style(style),
            Rect {
                x: start,
                y,
                width: label_len,
                height: 1,
            },
        );
    }

    let x_label = Paragraph::new("date")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    let x_rect = Rect {
        x: chart.x,
        y: chart.y + chart.height + 1,
        width: chart.width,
        height: 1,
    };
    if x_rect.y < inner.y + inner.height {
        frame.render_widget(x_label, x_rect);
    }
}
