//! Temperature sparkline for inline visualization

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Block characters for different temperature levels (8 levels)
const BLOCKS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// A one-line sparkline of temperatures, scaled between their min and max
pub struct TemperatureSparkline<'a> {
    temperatures: &'a [f64],
    /// Index drawn with the marker style
    marker: Option<usize>,
    /// Characters per temperature
    cell_width: usize,
    style: Style,
    marker_style: Style,
}

impl<'a> TemperatureSparkline<'a> {
    pub fn new(temperatures: &'a [f64]) -> Self {
        Self {
            temperatures,
            marker: None,
            cell_width: 1,
            style: Style::default().fg(Color::LightYellow),
            marker_style: Style::default()
                .fg(Color::LightRed)
                .add_modifier(Modifier::BOLD),
        }
    }

    pub fn marker(mut self, index: usize) -> Self {
        self.marker = Some(index);
        self
    }

    /// Repeats each block so the line lines up with wider columns
    pub fn cell_width(mut self, width: usize) -> Self {
        self.cell_width = width.max(1);
        self
    }

    pub fn style(mut self, style: Style) -> Self {
        self.style = style;
        self
    }

    fn range(&self) -> (f64, f64) {
        let min = self
            .temperatures
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min);
        let max = self
            .temperatures
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        (min, max)
    }

    fn temperature_to_block(&self, temperature: f64, min: f64, max: f64) -> char {
        let span = max - min;
        if span <= f64::EPSILON {
            return BLOCKS[3];
        }
        let normalized = ((temperature - min) / span).clamp(0.0, 1.0);
        let index = ((normalized * 7.0).round() as usize).min(7);
        BLOCKS[index]
    }

    /// Renders the sparkline as a styled line
    pub fn to_line(&self) -> Line<'static> {
        let (min, max) = self.range();
        let spans: Vec<Span<'static>> = self
            .temperatures
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let block = self.temperature_to_block(*t, min, max);
                let style = if self.marker == Some(i) {
                    self.marker_style
                } else {
                    self.style
                };
                Span::styled(block.to_string().repeat(self.cell_width), style)
            })
            .collect();
        Line::from(spans)
    }
}
