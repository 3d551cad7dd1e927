//! Color constants and scaling helpers for the TUI.

use ratatui::style::Color;

/// State cost bar color.
pub const STATE_BAR: Color = Color::Cyan;
/// Total cost histogram bar color.
pub const HISTOGRAM_BAR: Color = Color::Green;
/// Header bar foreground.
pub const HEADER_FG: Color = Color::White;
/// Header bar background.
pub const HEADER_BG: Color = Color::DarkGray;
/// Footer help text color.
pub const FOOTER_FG: Color = Color::DarkGray;
/// Iteration error color.
pub const ERROR_FG: Color = Color::Red;

/// Bar values are integers; costs are shown in thousands of dollars.
pub fn to_bar_value(cost: f64) -> u64 {
    if cost.is_finite() && cost > 0.0 {
        (cost / 1000.0).round() as u64
    } else {
        0
    }
}

/// Short dollar label, e.g. `$1.2M`.
pub fn dollars(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("${:.1}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("${:.1}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("${:.1}k", value / 1e3)
    } else {
        format!("${value:.0}")
    }
}
