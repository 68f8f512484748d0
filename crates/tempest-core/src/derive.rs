//! Derived meteorological quantities
//!
//! Pure, timestamp-free computations. Inputs are the triggering field value
//! plus previously stored values for the same path; the caller is
//! responsible for reading those in arrival order.

/// Radiation at or above this level counts as sunshine (W/m²)
pub const SUNSHINE_THRESHOLD_WM2: f64 = 120.0;

/// An average strike distance of zero means no lightning was detected;
/// it is recorded as this far-away sentinel instead
pub const NO_LIGHTNING_SENTINEL_KM: f64 = 999.0;

/// Fallbacks for pressure reduction when no reading has arrived yet
pub const DEFAULT_TEMPERATURE_C: f64 = 15.0;
pub const DEFAULT_HUMIDITY_PCT: f64 = 50.0;

/// Beaufort scale lower bounds in m/s, index = force
const BEAUFORT_THRESHOLDS: [f64; 13] = [
    0.0, 0.3, 1.5, 3.3, 5.4, 7.9, 10.7, 13.8, 17.1, 20.7, 24.4, 28.4, 32.6,
];

/// 16-point compass rose; N repeats at the end to absorb the 360° wrap
const COMPASS: [&str; 17] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW", "N",
];

/// Single-bit sensor failure codes, ascending bit value
const SENSOR_FAULTS: [(u32, &str); 9] = [
    (0b0_0000_0001, "Lightning failed"),
    (0b0_0000_0010, "Lightning noise"),
    (0b0_0000_0100, "Lightning disturber"),
    (0b0_0000_1000, "Pressure failed"),
    (0b0_0001_0000, "Temperature failed"),
    (0b0_0010_0000, "Humidity failed"),
    (0b0_0100_0000, "Wind failed"),
    (0b0_1000_0000, "Precipitation failed"),
    (0b1_0000_0000, "Light/uv failed"),
];

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Sea-level reduced pressure (QFF) from raw station pressure, DWD
/// barometric reduction with humidity correction. Result in hPa, one
/// decimal.
pub fn reduced_pressure(
    station_pressure: f64,
    temperature: f64,
    humidity: f64,
    altitude_m: f64,
) -> f64 {
    const G_N: f64 = 9.80665; // gravitational acceleration (m/s²)
    const GAMMA: f64 = 0.0065; // temperature lapse (K per geopotential meter)
    const R: f64 = 287.06; // gas constant of dry air
    const T_0: f64 = 273.15;
    const C_HUM: f64 = 0.11; // DWD humidity coefficient
    const E_0: f64 = 6.11213; // hPa

    let e_d = humidity / 100.0 * E_0 * (17.5043 * temperature / (241.2 + temperature)).exp();
    let exponent = (G_N * altitude_m) / (R * (temperature + T_0 + C_HUM * e_d + GAMMA * altitude_m / 2.0));
    round1(station_pressure * exponent.exp())
}

/// Magnus-formula dewpoint in °C, one decimal. Coefficients switch at the
/// freezing point.
pub fn dewpoint(temperature: f64, humidity: f64) -> f64 {
    let (a, b) = if temperature >= 0.0 {
        (7.5, 237.3)
    } else {
        (7.6, 240.7)
    };
    let sdd = 6.1078 * 10f64.powf(a * temperature / (b + temperature));
    let dd = humidity / 100.0 * sdd;
    let v = (dd / 6.1078).log10();
    round1(b * v / (a - v))
}

/// Feels-like temperature in °C: heat index in hot humid conditions, wind
/// chill in cold windy conditions, otherwise the air temperature itself.
pub fn feels_like(temperature: f64, wind_speed: f64, humidity: f64) -> f64 {
    if temperature >= 26.7 && humidity >= 40.0 {
        let t = temperature;
        let h = humidity;
        round1(
            -8.784695 + 1.61139411 * t + 2.338549 * h
                - 0.14611605 * t * h
                - 0.012308094 * t * t
                - 0.016424828 * h * h
                + 0.002211732 * t * t * h
                + 0.00072546 * t * h * h
                - 0.000003582 * t * t * h * h,
        )
    } else if temperature < 10.0 && wind_speed > 1.4 {
        let wind_kmh = wind_speed * 3.6;
        round1(13.12 + 0.6215 * temperature + (0.3965 * temperature - 11.37) * wind_kmh.powf(0.16))
    } else {
        temperature
    }
}

/// Beaufort force 0–12 for a wind speed in m/s. Each threshold is an
/// inclusive lower bound for its step.
pub fn beaufort(speed: f64) -> u8 {
    let mut force = 0;
    for (step, threshold) in BEAUFORT_THRESHOLDS.iter().enumerate() {
        if speed >= *threshold {
            force = step as u8;
        }
    }
    force
}

/// Cardinal direction for a wind bearing in degrees
pub fn cardinal_direction(degrees: f64) -> &'static str {
    let index = (degrees / 22.5).round() as usize;
    COMPASS.get(index).copied().unwrap_or(COMPASS[0])
}

/// Ordinal rain-intensity bands over a normalized mm/h rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RainIntensity {
    None,
    VeryLight,
    Light,
    Moderate,
    Heavy,
    VeryHeavy,
    Extreme,
}

impl RainIntensity {
    pub fn label(self) -> &'static str {
        match self {
            RainIntensity::None => "none",
            RainIntensity::VeryLight => "very light",
            RainIntensity::Light => "light",
            RainIntensity::Moderate => "moderate",
            RainIntensity::Heavy => "heavy",
            RainIntensity::VeryHeavy => "very heavy",
            RainIntensity::Extreme => "extreme",
        }
    }
}

/// Normalize an accumulated amount over a report interval to mm/h
pub fn rain_rate_mm_per_hour(accumulated_mm: f64, report_interval_min: f64) -> f64 {
    accumulated_mm * 60.0 / report_interval_min
}

/// Classify a rain rate in mm/h; each band starts at its lower bound
pub fn classify_rain_rate(rate_mm_h: f64) -> RainIntensity {
    if rate_mm_h >= 50.0 {
        RainIntensity::Extreme
    } else if rate_mm_h >= 16.0 {
        RainIntensity::VeryHeavy
    } else if rate_mm_h >= 4.0 {
        RainIntensity::Heavy
    } else if rate_mm_h >= 1.0 {
        RainIntensity::Moderate
    } else if rate_mm_h >= 0.25 {
        RainIntensity::Light
    } else if rate_mm_h > 0.0 {
        RainIntensity::VeryLight
    } else {
        RainIntensity::None
    }
}

/// Human-readable sensor status from the failure bitmask, labels joined in
/// ascending bit order
pub fn sensor_status_text(mask: u32) -> String {
    let faults: Vec<&str> = SENSOR_FAULTS
        .iter()
        .filter(|(bit, _)| (mask & bit) == *bit)
        .map(|(_, label)| *label)
        .collect();
    if faults.is_empty() {
        "Sensors OK".to_string()
    } else {
        faults.join(", ")
    }
}
