//! Weather backdrop: gradient background, overlay tint and animated particles
//!
//! Particle positions come from a fixed hash of their index, so a frame is a
//! pure function of the theme, the area and the tick. Counts are given for a
//! full 80x24 screen and scaled to the area being drawn.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Color,
    widgets::Widget,
};

use crate::theme::{Rgb, Theme, CLOUD_BANKS, LIGHTNING_BOLTS, SNOW_FLAKES, STARS};

/// Frames per second of the event loop
pub const TICKS_PER_SECOND: f32 = 10.0;

/// Cell count the particle totals are tuned for
const REFERENCE_CELLS: f32 = 80.0 * 24.0;

const RAIN_BACK: Color = Color::Rgb(191, 219, 254);
const RAIN_FRONT: Color = Color::Rgb(96, 165, 250);
const SNOW: Color = Color::Rgb(255, 255, 255);
const STAR: Color = Color::Rgb(254, 249, 195);
const SUN: Color = Color::Rgb(253, 224, 71);
const SUN_RAYS: Color = Color::Rgb(251, 146, 60);
const BOLT: Color = Color::Rgb(254, 240, 138);
const FOG: Color = Color::Rgb(229, 231, 235);
const CLOUD: Color = Color::Rgb(243, 244, 246);

const CLOUD_ART: [&str; 3] = ["   .--.    ", " .(    ).  ", "(___.__)__)"];
const SUN_ART: [&str; 3] = [" \\ | / ", "-- O --", " / | \\ "];
const BOLT_ART: [&str; 4] = ["  /", " / ", "/_ ", " / "];

/// Full-screen weather backdrop
pub struct Backdrop<'a> {
    theme: &'a Theme,
    tick: u64,
    animated: bool,
}

impl<'a> Backdrop<'a> {
    pub fn new(theme: &'a Theme, tick: u64) -> Self {
        Self {
            theme,
            tick,
            animated: true,
        }
    }

    /// Draws only the gradient when false
    pub fn animated(mut self, animated: bool) -> Self {
        self.animated = animated;
        self
    }
}

impl Widget for Backdrop<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        paint_gradient(self.theme, area, buf);

        if !self.animated {
            return;
        }

        let effects = self.theme.effects;
        let tick = self.tick;
        if effects.stars {
            draw_stars(area, buf, tick);
        }
        if effects.sun {
            draw_sun(area, buf, tick);
        }
        if effects.clouds {
            draw_clouds(area, buf, tick);
        }
        if effects.fog {
            draw_fog(area, buf, tick);
        }
        if let Some(profile) = self.theme.rain_profile() {
            draw_rain_layer(
                area,
                buf,
                tick,
                profile.background_drops,
                profile.background_fall_secs,
                1,
                '\'',
                RAIN_BACK,
            );
            draw_rain_layer(
                area,
                buf,
                tick,
                profile.foreground_drops,
                profile.foreground_fall_secs,
                2,
                '╲',
                RAIN_FRONT,
            );
        }
        if effects.snow {
            draw_snow(area, buf, tick);
        }
        if effects.thunder {
            draw_lightning(area, buf, tick);
        }
    }
}

/// Wash that blanks particles behind a panel and shifts its background
/// toward a color
pub struct Veil {
    toward: Rgb,
    amount: f32,
}

impl Veil {
    pub fn new(toward: Rgb, amount: f32) -> Self {
        Self { toward, amount }
    }
}

impl Widget for Veil {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for y in area.top()..area.bottom() {
            for x in area.left()..area.right() {
                if let Some(cell) = buf.cell_mut((x, y)) {
                    cell.set_symbol(" ");
                    if let Color::Rgb(r, g, b) = cell.bg {
                        let (r, g, b) = lerp((r, g, b), self.toward, self.amount);
                        cell.set_bg(Color::Rgb(r, g, b));
                    }
                }
            }
        }
    }
}

/// Linear blend of two colors, `t` in [0, 1]
pub fn lerp(a: Rgb, b: Rgb, t: f32) -> Rgb {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (f32::from(x) + (f32::from(y) - f32::from(x)) * t).round() as u8;
    (mix(a.0, b.0), mix(a.1, b.1), mix(a.2, b.2))
}

/// Background color of a cell: diagonal gradient with the overlay composited on top
pub fn cell_color(theme: &Theme, x: u16, y: u16, width: u16, height: u16) -> Rgb {
    let [from, to] = theme.background.stops();
    let fx = f32::from(x) / f32::from(width.max(2) - 1);
    let fy = f32::from(y) / f32::from(height.max(2) - 1);
    let base = lerp(from, to, (fx + fy) / 2.0);

    match theme.overlay.tint() {
        Some((tint, alpha)) => lerp(base, tint, alpha),
        None => base,
    }
}

fn paint_gradient(theme: &Theme, area: Rect, buf: &mut Buffer) {
    for y in 0..area.height {
        for x in 0..area.width {
            let (r, g, b) = cell_color(theme, x, y, area.width, area.height);
            if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
                cell.set_symbol(" ").set_bg(Color::Rgb(r, g, b));
            }
        }
    }
}

/// Scales a full-screen particle count to `area`, keeping at least one
fn scaled(count: usize, area: Rect) -> usize {
    let cells = f32::from(area.width) * f32::from(area.height);
    ((count as f32 * cells / REFERENCE_CELLS).round() as usize).max(1)
}

/// splitmix64 finaliser
fn hash(seed: u64, index: u64) -> u64 {
    let mut z = seed
        .wrapping_add(index.wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

fn put(buf: &mut Buffer, area: Rect, x: i32, y: i32, ch: char, fg: Color) {
    if x < 0 || y < 0 || x >= i32::from(area.width) || y >= i32::from(area.height) {
        return;
    }
    let pos = (area.x + x as u16, area.y + y as u16);
    if let Some(cell) = buf.cell_mut(pos) {
        cell.set_char(ch).set_fg(fg);
    }
}

fn put_art(buf: &mut Buffer, area: Rect, x: i32, y: i32, art: &[&str], fg: Color) {
    for (row, line) in art.iter().enumerate() {
        for (col, ch) in line.chars().enumerate() {
            if ch != ' ' {
                put(buf, area, x + col as i32, y + row as i32, ch, fg);
            }
        }
    }
}

/// Row reached by a particle that crosses the area in `fall_secs`
fn fall_row(phase: u64, tick: u64, fall_secs: f32, height: u16) -> i32 {
    let h = f32::from(height);
    let rows_per_tick = h / (fall_secs * TICKS_PER_SECOND);
    let y = (phase as f32 + tick as f32 * rows_per_tick) % h;
    y as i32
}

#[allow(clippy::too_many_arguments)]
fn draw_rain_layer(
    area: Rect,
    buf: &mut Buffer,
    tick: u64,
    drops: usize,
    fall_secs: f32,
    seed: u64,
    ch: char,
    fg: Color,
) {
    let width = u64::from(area.width);
    let height = u64::from(area.height);
    for i in 0..scaled(drops, area) as u64 {
        let x = (hash(seed, i) % width) as i32;
        let phase = hash(seed + 100, i) % height;
        let y = fall_row(phase, tick, fall_secs, area.height);
        // Drops drift right as they fall
        let drift = y / 3;
        put(buf, area, (x + drift) % i32::from(area.width), y, ch, fg);
    }
}

fn draw_snow(area: Rect, buf: &mut Buffer, tick: u64) {
    let width = u64::from(area.width);
    let height = u64::from(area.height);
    for i in 0..scaled(SNOW_FLAKES, area) as u64 {
        let x = (hash(3, i) % width) as i32;
        let phase = hash(4, i) % height;
        // Each flake takes 5 to 10 seconds to cross the screen
        let fall_secs = 5.0 + (hash(5, i) % 6) as f32;
        let y = fall_row(phase, tick, fall_secs, area.height);
        let sway = ((tick / 10 + i) % 3) as i32 - 1;
        let ch = if i % 3 == 0 { '*' } else { '•' };
        put(buf, area, x + sway, y, ch, SNOW);
    }
}

fn draw_stars(area: Rect, buf: &mut Buffer, tick: u64) {
    let width = u64::from(area.width);
    let height = u64::from(area.height);
    for i in 0..scaled(STARS, area) as u64 {
        let x = (hash(6, i) % width) as i32;
        let y = (hash(7, i) % height) as i32;
        // Twinkle: dark one phase in four, each star on its own beat
        let beat = (tick / 5 + hash(8, i)) % 4;
        if beat != 0 {
            let ch = if beat == 2 { '+' } else { '.' };
            put(buf, area, x, y, ch, STAR);
        }
    }
}

fn draw_sun(area: Rect, buf: &mut Buffer, tick: u64) {
    let x = i32::from(area.width) - 10;
    let pulse = if (tick / 10) % 2 == 0 { SUN } else { SUN_RAYS };
    put_art(buf, area, x, 1, &SUN_ART, pulse);
    put(buf, area, x + 3, 2, 'O', SUN);
}

fn draw_clouds(area: Rect, buf: &mut Buffer, tick: u64) {
    let art_width = CLOUD_ART[0].len() as i32;
    let lane = i32::from(area.width) + art_width;
    for bank in 0..CLOUD_BANKS as u64 {
        // Banks move at different speeds, starting half a screen apart
        let speed = 3 + bank * 2;
        let offset = (hash(9, bank) % lane as u64) as i64;
        let x = ((tick / speed) as i64 + offset) % i64::from(lane) - i64::from(art_width);
        let y = 1 + (bank as i32 * (i32::from(area.height) / 3).max(4));
        put_art(buf, area, x as i32, y, &CLOUD_ART, CLOUD);
    }
}

fn draw_fog(area: Rect, buf: &mut Buffer, tick: u64) {
    for y in 0..i32::from(area.height) {
        // Two bands drifting at different speeds
        let band = (y + (tick / 8) as i32) % 4;
        if band != 0 {
            continue;
        }
        let shift = (tick / 4) as i32;
        for x in 0..i32::from(area.width) {
            if (x + shift) % 5 != 0 {
                put(buf, area, x, y, '░', FOG);
            }
        }
    }
}

fn draw_lightning(area: Rect, buf: &mut Buffer, tick: u64) {
    let width = u64::from(area.width);
    for bolt in 0..LIGHTNING_BOLTS as u64 {
        // Each bolt flashes for 0.2s out of every 5s
        let period = (5.0 * TICKS_PER_SECOND) as u64;
        let phase = hash(10, bolt) % period;
        if (tick + phase) % period >= 2 {
            continue;
        }
        let x = (hash(11, bolt) % width) as i32;
        put_art(buf, area, x, 0, &BOLT_ART, BOLT);
    }
}
