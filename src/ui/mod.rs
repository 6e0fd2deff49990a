//! UI rendering module for weatherdash
//!
//! This module contains all the rendering logic for the terminal user interface,
//! using the ratatui library for TUI components.

pub mod dashboard;
pub mod effects;
pub mod help_overlay;
pub mod map;
pub mod widgets;

use ratatui::Frame;

use crate::app::App;
use effects::Backdrop;

/// Renders a full frame: weather backdrop, dashboard and help overlay
pub fn render(frame: &mut Frame, app: &mut App) {
    let theme = app.theme();

    frame.render_widget(
        Backdrop::new(&theme, app.tick).animated(app.effects_enabled),
        frame.area(),
    );
    dashboard::render(frame, app, &theme);

    if app.show_help {
        help_overlay::render(frame);
    }
}
