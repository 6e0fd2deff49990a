//! Weather theme derivation
//!
//! Maps a weather description and the destination city's local hour to the
//! visual theme the dashboard paints behind its panels: a background gradient,
//! an overlay tint and a set of animated effect layers. Also maps descriptions
//! and icon codes to weather icons.
//!
//! Descriptions are scanned exactly once, by [`Cues::scan`]. Everything else
//! works from the resulting cue set and the [`Condition`] derived from it.

use bitflags::bitflags;

/// First hour (inclusive) counted as daytime
pub const DAY_START_HOUR: u8 = 6;
/// First hour (exclusive) no longer counted as daytime
pub const DAY_END_HOUR: u8 = 18;

/// Snowflakes in the snow layer
pub const SNOW_FLAKES: usize = 200;
/// Lightning bolts in the thunder layer
pub const LIGHTNING_BOLTS: usize = 3;
/// Stars in the night sky layer
pub const STARS: usize = 150;
/// Cloud banks in the cloud layer
pub const CLOUD_BANKS: usize = 2;

/// An RGB color stop
pub type Rgb = (u8, u8, u8);

bitflags! {
    /// Keywords found in a weather description
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Cues: u8 {
        const CLEAR = 1 << 0;
        const CLOUD = 1 << 1;
        const RAIN = 1 << 2;
        const HEAVY_RAIN = 1 << 3;
        const SNOW = 1 << 4;
        const THUNDER = 1 << 5;
        const FOG = 1 << 6;
    }
}

impl Cues {
    /// Scans a description for weather keywords, ignoring case.
    pub fn scan(description: &str) -> Self {
        let desc = description.to_lowercase();
        let mut cues = Cues::empty();

        cues.set(Cues::CLEAR, desc.contains("clear"));
        cues.set(Cues::CLOUD, desc.contains("cloud"));
        cues.set(Cues::RAIN, desc.contains("rain"));
        cues.set(Cues::HEAVY_RAIN, desc.contains("heavy rain"));
        cues.set(Cues::SNOW, desc.contains("snow"));
        cues.set(Cues::THUNDER, desc.contains("thunder"));
        cues.set(Cues::FOG, desc.contains("mist") || desc.contains("fog"));

        cues
    }
}

/// Closed classification of a weather description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Condition {
    ClearSky,
    Clouds,
    Rain,
    HeavyRain,
    Snow,
    Thunder,
    Fog,
    Unknown,
}

impl Condition {
    /// Picks the dominant condition, in background precedence order.
    pub fn from_cues(cues: Cues) -> Self {
        if cues.contains(Cues::HEAVY_RAIN) {
            Condition::HeavyRain
        } else if cues.contains(Cues::RAIN) {
            Condition::Rain
        } else if cues.contains(Cues::THUNDER) {
            Condition::Thunder
        } else if cues.contains(Cues::SNOW) {
            Condition::Snow
        } else if cues.contains(Cues::FOG) {
            Condition::Fog
        } else if cues.contains(Cues::CLEAR) {
            Condition::ClearSky
        } else if cues.contains(Cues::CLOUD) {
            Condition::Clouds
        } else {
            Condition::Unknown
        }
    }
}

/// Weather icon, matching the OpenWeatherMap icon set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeatherIcon {
    Clear,
    Clouds,
    Rain,
    Snow,
    Thunder,
    Mist,
    PartlyCloudy,
}

impl WeatherIcon {
    /// Picks an icon from description cues.
    ///
    /// Priority: clear, cloud, rain, snow, thunder, mist/fog, then partly cloudy.
    pub fn from_cues(cues: Cues) -> Self {
        if cues.contains(Cues::CLEAR) {
            WeatherIcon::Clear
        } else if cues.contains(Cues::CLOUD) {
            WeatherIcon::Clouds
        } else if cues.contains(Cues::RAIN) {
            WeatherIcon::Rain
        } else if cues.contains(Cues::SNOW) {
            WeatherIcon::Snow
        } else if cues.contains(Cues::THUNDER) {
            WeatherIcon::Thunder
        } else if cues.contains(Cues::FOG) {
            WeatherIcon::Mist
        } else {
            WeatherIcon::PartlyCloudy
        }
    }

    pub fn for_description(description: &str) -> Self {
        Self::from_cues(Cues::scan(description))
    }

    /// Maps an OpenWeatherMap icon code (e.g. "10n") to an icon.
    pub fn from_code(code: &str) -> Self {
        match code.get(..2) {
            Some("01") => WeatherIcon::Clear,
            Some("02") => WeatherIcon::PartlyCloudy,
            Some("03") | Some("04") => WeatherIcon::Clouds,
            Some("09") | Some("10") => WeatherIcon::Rain,
            Some("11") => WeatherIcon::Thunder,
            Some("13") => WeatherIcon::Snow,
            Some("50") => WeatherIcon::Mist,
            _ => WeatherIcon::PartlyCloudy,
        }
    }

    /// Daytime OpenWeatherMap icon code
    pub fn code(self) -> &'static str {
        match self {
            WeatherIcon::Clear => "01d",
            WeatherIcon::Clouds => "03d",
            WeatherIcon::Rain => "10d",
            WeatherIcon::Snow => "13d",
            WeatherIcon::Thunder => "11d",
            WeatherIcon::Mist => "50d",
            WeatherIcon::PartlyCloudy => "02d",
        }
    }

    pub fn url(self) -> String {
        icon_url(self.code())
    }

    /// Terminal glyph for the icon
    pub fn glyph(self) -> &'static str {
        match self {
            WeatherIcon::Clear => "\u{2600}",         // ☀
            WeatherIcon::Clouds => "\u{2601}",        // ☁
            WeatherIcon::Rain => "\u{1F327}",         // 🌧
            WeatherIcon::Snow => "\u{2744}",          // ❄
            WeatherIcon::Thunder => "\u{26C8}",       // ⛈
            WeatherIcon::Mist => "\u{1F32B}",         // 🌫
            WeatherIcon::PartlyCloudy => "\u{26C5}",  // ⛅
        }
    }
}

/// OpenWeatherMap image URL for an icon code
pub fn icon_url(code: &str) -> String {
    format!("https://openweathermap.org/img/wn/{}@2x.png", code)
}

/// Background gradient variants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Background {
    /// Darker rain sky for heavy rain
    HeavyRain,
    Rain,
    Snow,
    Fog,
    Sunny,
    DaySky,
    NightSky,
}

impl Background {
    /// Top-left and bottom-right gradient stops
    pub fn stops(self) -> [Rgb; 2] {
        match self {
            Background::HeavyRain => [(31, 41, 55), (17, 24, 39)],
            Background::Rain => [(75, 85, 99), (31, 41, 55)],
            Background::Snow => [(209, 213, 219), (107, 114, 128)],
            Background::Fog => [(156, 163, 175), (75, 85, 99)],
            Background::Sunny => [(254, 240, 138), (251, 146, 60)],
            Background::DaySky => [(125, 211, 252), (14, 165, 233)],
            Background::NightSky => [(30, 27, 75), (0, 0, 0)],
        }
    }

    fn is_precipitation(self) -> bool {
        matches!(
            self,
            Background::HeavyRain | Background::Rain | Background::Snow | Background::Fog
        )
    }
}

/// Semi-transparent wash composited over the background
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    Blue,
    White,
    Gray,
    Transparent,
}

impl Overlay {
    /// Tint color and opacity, or `None` when transparent
    pub fn tint(self) -> Option<(Rgb, f32)> {
        match self {
            Overlay::Blue => Some(((59, 130, 246), 0.2)),
            Overlay::White => Some(((255, 255, 255), 0.1)),
            Overlay::Gray => Some(((209, 213, 219), 0.3)),
            Overlay::Transparent => None,
        }
    }
}

/// Which animated layers are active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Effects {
    pub rain: bool,
    pub heavy_rain: bool,
    pub snow: bool,
    pub sun: bool,
    pub clouds: bool,
    pub thunder: bool,
    pub fog: bool,
    pub stars: bool,
}

/// Rain layer density and speed
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RainProfile {
    pub background_drops: usize,
    pub foreground_drops: usize,
    /// Seconds a background drop takes to cross the screen
    pub background_fall_secs: f32,
    /// Seconds a foreground drop takes to cross the screen
    pub foreground_fall_secs: f32,
}

impl RainProfile {
    pub const NORMAL: RainProfile = RainProfile {
        background_drops: 100,
        foreground_drops: 50,
        background_fall_secs: 1.5,
        foreground_fall_secs: 1.0,
    };

    pub const HEAVY: RainProfile = RainProfile {
        background_drops: 150,
        foreground_drops: 75,
        background_fall_secs: 1.0,
        foreground_fall_secs: 0.8,
    };
}

/// Complete visual theme for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub condition: Condition,
    pub background: Background,
    pub overlay: Overlay,
    pub effects: Effects,
    pub is_day: bool,
}

/// Whether `hour` falls in the [6, 18) daytime window
pub fn is_daytime(hour: u8) -> bool {
    (DAY_START_HOUR..DAY_END_HOUR).contains(&hour)
}

impl Theme {
    /// Derives the theme for a description at the destination city's local hour.
    ///
    /// `fallback_hour` is used when no local hour is known yet, i.e. before the
    /// first successful fetch.
    pub fn derive(description: &str, local_hour: Option<u8>, fallback_hour: u8) -> Self {
        let hour = local_hour.unwrap_or(fallback_hour);
        let is_day = is_daytime(hour);
        let cues = Cues::scan(description);
        let condition = Condition::from_cues(cues);

        let background = match condition {
            Condition::HeavyRain => Background::HeavyRain,
            Condition::Rain | Condition::Thunder => Background::Rain,
            Condition::Snow => Background::Snow,
            Condition::Fog => Background::Fog,
            Condition::ClearSky if is_day => Background::Sunny,
            _ if is_day => Background::DaySky,
            _ => Background::NightSky,
        };

        // Clouds drift over sky themes only. A plain clear day shows the sun alone.
        let clouds = !background.is_precipitation()
            && (cues.contains(Cues::CLOUD)
                || (cues.contains(Cues::CLEAR) && background != Background::Sunny));

        let overlay = if cues.contains(Cues::RAIN) {
            Overlay::Blue
        } else if cues.contains(Cues::SNOW) {
            Overlay::White
        } else if cues.contains(Cues::FOG) {
            Overlay::Gray
        } else {
            Overlay::Transparent
        };

        let effects = Effects {
            rain: matches!(background, Background::Rain | Background::HeavyRain),
            heavy_rain: cues.contains(Cues::HEAVY_RAIN),
            snow: background == Background::Snow,
            sun: background == Background::Sunny,
            clouds,
            thunder: cues.contains(Cues::THUNDER),
            fog: background == Background::Fog,
            stars: background == Background::NightSky,
        };

        Theme {
            condition,
            background,
            overlay,
            effects,
            is_day,
        }
    }

    /// Rain density for the rain layer, if it is active
    pub fn rain_profile(&self) -> Option<RainProfile> {
        if !self.effects.rain {
            None
        } else if self.effects.heavy_rain {
            Some(RainProfile::HEAVY)
        } else {
            Some(RainProfile::NORMAL)
        }
    }
}
