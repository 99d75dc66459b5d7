//! WMO weather code translation.
//! See: https://open-meteo.com/en/docs#weathervariables

/// Icon categories, in ascending order of the code ranges they cover
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IconCategory {
    Clear,
    PartlyCloudy,
    Overcast,
    Fog,
    Drizzle,
    Rain,
    Snow,
    Showers,
    Thunderstorm,
}

impl IconCategory {
    /// Map a WMO code onto its category by inclusive upper bound.
    /// Codes below zero land in `PartlyCloudy`, anything above 82 in `Thunderstorm`.
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            i32::MIN..=2 => Self::PartlyCloudy,
            3 => Self::Overcast,
            4..=48 => Self::Fog,
            49..=55 => Self::Drizzle,
            56..=65 => Self::Rain,
            66..=77 => Self::Snow,
            78..=82 => Self::Showers,
            _ => Self::Thunderstorm,
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Self::Clear => "☀️",
            Self::PartlyCloudy => "⛅",
            Self::Overcast => "☁️",
            Self::Fog => "🌫️",
            Self::Drizzle => "🌦️",
            Self::Rain => "🌧️",
            Self::Snow => "❄️",
            Self::Showers => "🌨️",
            Self::Thunderstorm => "⛈️",
        }
    }
}

/// Human-readable description for a WMO code, "Unknown" when not in the table
pub fn describe(code: i32) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Foggy",
        48 => "Icy fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Heavy drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        71 => "Slight snow",
        73 => "Moderate snow",
        75 => "Heavy snow",
        80 => "Rain showers",
        81 => "Moderate showers",
        82 => "Violent showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with hail",
        99 => "Thunderstorm heavy hail",
        _ => "Unknown",
    }
}

/// Icon glyph for a WMO code
pub fn icon(code: i32) -> &'static str {
    IconCategory::from_wmo_code(code).glyph()
}
