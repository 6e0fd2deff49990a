//! Map panel: world outline centred on the city with a marker
//!
//! The OpenStreetMap tile covering the marker is shown as a link; tiles are
//! not fetched or rasterised.

use std::f64::consts::PI;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::Span,
    widgets::{
        canvas::{Canvas, Map, MapResolution},
        Widget,
    },
};

/// Zoom level of the linked tile
pub const TILE_ZOOM: u8 = 10;

/// Longitude shown either side of the marker
const HALF_SPAN_LON: f64 = 30.0;
/// Latitude shown either side of the marker
const HALF_SPAN_LAT: f64 = 15.0;

/// Web Mercator latitude limit
const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

/// Slippy-map tile coordinates containing a point
pub fn tile_for(lat: f64, lon: f64, zoom: u8) -> (u32, u32) {
    let n = f64::from(1u32 << zoom);
    let lat_rad = lat.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let lon = lon.clamp(-180.0, 180.0);

    let x = ((lon + 180.0) / 360.0 * n).floor();
    let y = ((1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * n).floor();

    (x.clamp(0.0, n - 1.0) as u32, y.clamp(0.0, n - 1.0) as u32)
}

/// OpenStreetMap tile URL for a point at `zoom`
pub fn tile_url(lat: f64, lon: f64, zoom: u8) -> String {
    let (x, y) = tile_for(lat, lon, zoom);
    format!("https://tile.openstreetmap.org/{zoom}/{x}/{y}.png")
}

/// Canvas bounds around a point, shifted to stay inside the world
pub fn view_bounds(lat: f64, lon: f64) -> ([f64; 2], [f64; 2]) {
    fn window(center: f64, half: f64, limit: f64) -> [f64; 2] {
        let center = center.clamp(-limit + half, limit - half);
        [center - half, center + half]
    }
    (
        window(lon, HALF_SPAN_LON, 180.0),
        window(lat, HALF_SPAN_LAT, 90.0),
    )
}

/// World map centred on a location
pub struct LocationMap {
    lat: f64,
    lon: f64,
    outline: Color,
}

impl LocationMap {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            lat,
            lon,
            outline: Color::Green,
        }
    }

    pub fn outline(mut self, color: Color) -> Self {
        self.outline = color;
        self
    }
}

impl Widget for LocationMap {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let (x_bounds, y_bounds) = view_bounds(self.lat, self.lon);
        let (lat, lon, outline) = (self.lat, self.lon, self.outline);

        Canvas::default()
            .marker(Marker::Braille)
            .x_bounds(x_bounds)
            .y_bounds(y_bounds)
            .paint(move |ctx| {
                ctx.draw(&Map {
                    color: outline,
                    resolution: MapResolution::High,
                });
                ctx.layer();
                ctx.print(
                    lon,
                    lat,
                    Span::styled(
                        "◉",
                        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
                    ),
                );
            })
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_for_origin() {
        assert_eq!(tile_for(0.0, 0.0, 10), (512, 512));
    }

    #[test]
    fn test_tile_for_known_cities() {
        // London
        assert_eq!(tile_for(51.5074, -0.1278, 10), (511, 340));
        // Bengaluru
        assert_eq!(tile_for(12.97, 77.59, 10), (732, 474));
    }

    #[test]
    fn test_tile_for_clamps_edges() {
        assert_eq!(tile_for(89.9, 180.0, 10), (1023, 0));
        assert_eq!(tile_for(-89.9, -180.0, 10), (0, 1023));
    }

    #[test]
    fn test_tile_url_uses_zoom_10() {
        assert_eq!(
            tile_url(0.0, 0.0, TILE_ZOOM),
            "https://tile.openstreetmap.org/10/512/512.png"
        );
    }

    #[test]
    fn test_view_bounds_centres_marker() {
        let (x, y) = view_bounds(12.97, 77.59);
        assert!((x[0] - 47.59).abs() < 1e-9 && (x[1] - 107.59).abs() < 1e-9);
        assert!((y[0] + 2.03).abs() < 1e-9 && (y[1] - 27.97).abs() < 1e-9);
    }

    #[test]
    fn test_view_bounds_stays_inside_world() {
        let (x, y) = view_bounds(80.0, 175.0);
        assert_eq!(x, [120.0, 180.0]);
        assert_eq!(y, [60.0, 90.0]);
    }

    #[test]
    fn test_map_draws_marker() {
        let area = Rect::new(0, 0, 40, 12);
        let mut buf = Buffer::empty(area);

        LocationMap::new(12.97, 77.59).render(area, &mut buf);

        let content: String = buf.content().iter().map(|c| c.symbol()).collect();
        assert!(content.contains('◉'));
    }
}
