//! TUI layout and widget rendering.

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph};

use super::runtime::App;
use super::style;
use crate::sampling::histogram;

/// Bins of the total cost histogram.
const HISTOGRAM_BINS: usize = 10;

/// Renders the full TUI frame.
pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),      // header
            Constraint::Percentage(45), // state costs
            Constraint::Min(8),         // total cost histogram
            Constraint::Length(4),      // status panel
            Constraint::Length(1),      // footer
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);
    render_state_costs(frame, app, chunks[1]);
    render_histogram(frame, app, chunks[2]);
    render_status(frame, app, chunks[3]);
    render_footer(frame, chunks[4]);
}

/// Header bar: scenario, iteration progress, speed, run state.
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let (state_icon, state_label) = if app.is_finished() {
        ("■", "DONE")
    } else if app.paused {
        ("‖", "PAUSED")
    } else {
        ("▶", "RUNNING")
    };

    let header = Line::from(vec![
        Span::styled(
            " BICEP ",
            Style::default()
                .fg(style::HEADER_FG)
                .bg(style::HEADER_BG)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" "),
        Span::styled(
            &app.preset_name,
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            " │ iteration {}/{} │ {}ms │ {} {} ",
            app.iteration(),
            app.total_iterations,
            app.tick_interval_ms(),
            state_icon,
            state_label,
        )),
    ]);
    frame.render_widget(Paragraph::new(header), area);
}

/// Weighted upgrade cost per state of the latest iteration.
fn render_state_costs(frame: &mut Frame, app: &App, area: Rect) {
    let bars: Vec<Bar> = app
        .latest
        .iter()
        .flat_map(|r| r.state_costs.iter())
        .map(|(state, cost)| {
            Bar::default()
                .label(Line::from(state.clone()))
                .value(style::to_bar_value(*cost))
                .text_value(style::dollars(*cost))
        })
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .title(" Upgrade Cost by State (latest iteration, $k) ")
                .borders(Borders::ALL),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(7)
        .bar_gap(1)
        .bar_style(Style::default().fg(style::STATE_BAR));
    frame.render_widget(chart, area);
}

/// Distribution of total costs over the completed iterations.
fn render_histogram(frame: &mut Frame, app: &App, area: Rect) {
    let bins = histogram(&app.totals, HISTOGRAM_BINS);
    let bars: Vec<Bar> = bins
        .iter()
        .map(|(lo, _, count)| {
            Bar::default()
                .label(Line::from(style::dollars(*lo)))
                .value(*count as u64)
        })
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .title(" Total Cost Distribution (iterations per bin) ")
                .borders(Borders::ALL),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(8)
        .bar_gap(1)
        .bar_style(Style::default().fg(style::HISTOGRAM_BAR));
    frame.render_widget(chart, area);
}

/// Latest report totals and running ensemble statistics.
fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = Vec::new();
    if let Some(e) = &app.last_error {
        lines.push(Line::from(Span::styled(
            format!("  error: {e}"),
            Style::default().fg(style::ERROR_FG),
        )));
    }
    match (&app.latest, app.summary()) {
        (Some(r), Some(s)) => {
            lines.push(Line::from(format!(
                "  total={}  residential={}  commercial={}  upgrades={:.0}",
                style::dollars(r.total_cost),
                style::dollars(r.residential_cost),
                style::dollars(r.commercial_cost),
                r.weighted_upgrades,
            )));
            lines.push(Line::from(format!(
                "  mean={}  std={}  p5={}  p95={}",
                style::dollars(s.mean),
                style::dollars(s.std),
                style::dollars(s.p5),
                style::dollars(s.p95),
            )));
        }
        _ if app.last_error.is_none() => lines.push(Line::from("  Waiting for first iteration...")),
        _ => {}
    }

    let block = Block::default().title(" Status ").borders(Borders::ALL);
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Footer with keybinding hints.
fn render_footer(frame: &mut Frame, area: Rect) {
    let footer = Paragraph::new(Line::from(Span::styled(
        " q:Quit  Space:Pause  +/-:Speed  1/2:Scenario (bau/high)  r:Restart",
        Style::default().fg(style::FOOTER_FG),
    )));
    frame.render_widget(footer, area);
}
