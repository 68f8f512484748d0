//! Versioned message schema tables (WeatherFlow Smart Weather UDP v143)
//!
//! Static data only: each message type maps its positionally-encoded field
//! groups to named, typed field definitions. Lookup is pure; unknown
//! elements are reported as distinct conditions so callers can log-and-skip.

use thiserror::Error;

/// Value kind of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Numeric,
    Text,
    /// Numeric code with a fixed interpretation table (e.g. precipitation type)
    Enum,
}

/// One positional field of a message group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDefinition {
    /// Semantic state name, appended to the channel path
    pub name: &'static str,
    /// Human display name, used as node descriptor
    pub label: &'static str,
    pub unit: &'static str,
    pub kind: FieldKind,
    pub writable: bool,
}

/// Named group of positional fields within a message
#[derive(Debug)]
pub struct GroupSchema {
    pub key: &'static str,
    pub fields: &'static [FieldDefinition],
}

/// Full layout of one message type
#[derive(Debug)]
pub struct MessageSchema {
    pub message_type: &'static str,
    /// Display name for the channel node
    pub display_name: &'static str,
    pub groups: &'static [GroupSchema],
}

impl MessageSchema {
    pub fn group(&self, key: &str) -> Option<&'static GroupSchema> {
        self.groups.iter().find(|group| group.key == key)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchemaError {
    #[error("unknown message type: {0}")]
    UnknownMessageType(String),

    #[error("message '{message_type}' has no field group '{group}'")]
    UnknownGroup { message_type: String, group: String },

    #[error("field group '{group}' of '{message_type}' has no index {index}")]
    UnknownIndex {
        message_type: String,
        group: String,
        index: usize,
    },
}

const fn num(name: &'static str, label: &'static str, unit: &'static str) -> FieldDefinition {
    FieldDefinition {
        name,
        label,
        unit,
        kind: FieldKind::Numeric,
        writable: false,
    }
}

const fn text(name: &'static str, label: &'static str) -> FieldDefinition {
    FieldDefinition {
        name,
        label,
        unit: "",
        kind: FieldKind::Text,
        writable: false,
    }
}

const fn code(name: &'static str, label: &'static str) -> FieldDefinition {
    FieldDefinition {
        name,
        label,
        unit: "",
        kind: FieldKind::Enum,
        writable: false,
    }
}

const TIMESTAMP: FieldDefinition = num("timestamp", "Time of event", "");
const FIRMWARE: GroupSchema = GroupSchema {
    key: "firmware_revision",
    fields: &[num("firmware_revision", "Firmware revision", "")],
};

static EVT_PRECIP: MessageSchema = MessageSchema {
    message_type: "evt_precip",
    display_name: "Rain Start Event",
    groups: &[GroupSchema {
        key: "evt",
        fields: &[TIMESTAMP],
    }],
};

static EVT_STRIKE: MessageSchema = MessageSchema {
    message_type: "evt_strike",
    display_name: "Lightning Strike Event",
    groups: &[GroupSchema {
        key: "evt",
        fields: &[
            TIMESTAMP,
            num("distance", "Strike distance", "km"),
            num("energy", "Strike energy", ""),
        ],
    }],
};

static RAPID_WIND: MessageSchema = MessageSchema {
    message_type: "rapid_wind",
    display_name: "Rapid Wind",
    groups: &[GroupSchema {
        key: "ob",
        fields: &[
            TIMESTAMP,
            num("windSpeed", "Wind speed", "m/s"),
            num("windDirection", "Wind direction", "°"),
        ],
    }],
};

static OBS_AIR: MessageSchema = MessageSchema {
    message_type: "obs_air",
    display_name: "Observation (AIR)",
    groups: &[
        GroupSchema {
            key: "obs",
            fields: &[
                TIMESTAMP,
                num("stationPressure", "Station pressure (raw)", "hPa"),
                num("airTemperature", "Air Temperature", "°C"),
                num("relativeHumidity", "Relative Humidity", "%"),
                num("lightningStrikeCount", "Lightning Strike Count", ""),
                num("lightningStrikeAvgDistance", "Lightning Strike Avg Distance", "km"),
                num("battery", "Battery", "V"),
                num("reportInterval", "Report Interval", "min"),
            ],
        },
        FIRMWARE,
    ],
};

static OBS_SKY: MessageSchema = MessageSchema {
    message_type: "obs_sky",
    display_name: "Observation (Sky)",
    groups: &[
        GroupSchema {
            key: "obs",
            fields: &[
                TIMESTAMP,
                num("illuminance", "Illuminance", "Lux"),
                num("UV", "UV Index", ""),
                num("rainAccumulated", "Rain Accumulated", "mm"),
                num("windLull", "Wind Lull (minimum 3 second sample)", "m/s"),
                num("windAvg", "Wind Avg (average over report interval)", "m/s"),
                num("windGust", "Wind Gust (maximum 3 second sample)", "m/s"),
                num("windDirection", "Wind Direction", "°"),
                num("battery", "Battery", "V"),
                num("reportInterval", "Report Interval", "min"),
                num("solarRadiation", "Solar Radiation", "W/m^2"),
                num("localDayRainAccumulation", "Local Day Rain Accumulation", "mm"),
                code("precipitationType", "Precipitation Type"),
                num("windSampleInterval", "Wind Sample Interval", "s"),
            ],
        },
        FIRMWARE,
    ],
};

static OBS_ST: MessageSchema = MessageSchema {
    message_type: "obs_st",
    display_name: "Observation (Tempest)",
    groups: &[
        GroupSchema {
            key: "obs",
            fields: &[
                TIMESTAMP,
                num("windLull", "Wind Lull (minimum 3 second sample)", "m/s"),
                num("windAvg", "Wind Avg (average over report interval)", "m/s"),
                num("windGust", "Wind Gust (maximum 3 second sample)", "m/s"),
                num("windDirection", "Wind Direction", "°"),
                num("windSampleInterval", "Wind Sample Interval", "s"),
                num("stationPressure", "Station pressure (raw)", "hPa"),
                num("airTemperature", "Air Temperature", "°C"),
                num("relativeHumidity", "Relative Humidity", "%"),
                num("illuminance", "Illuminance", "Lux"),
                num("UV", "UV Index", ""),
                num("solarRadiation", "Solar Radiation", "W/m^2"),
                num("precipAccumulated", "Precipitation Accumulated", "mm"),
                code("precipitationType", "Precipitation Type"),
                num("lightningStrikeAvgDistance", "Lightning Strike Avg Distance", "km"),
                num("lightningStrikeCount", "Lightning Strike Count", ""),
                num("battery", "Battery", "V"),
                num("reportInterval", "Report Interval", "min"),
            ],
        },
        FIRMWARE,
    ],
};

static DEVICE_STATUS: MessageSchema = MessageSchema {
    message_type: "device_status",
    display_name: "Status (device)",
    groups: &[
        GroupSchema {
            key: "timestamp",
            fields: &[TIMESTAMP],
        },
        GroupSchema {
            key: "uptime",
            fields: &[num("uptime", "Uptime", "s")],
        },
        GroupSchema {
            key: "voltage",
            fields: &[num("voltage", "Voltage", "V")],
        },
        FIRMWARE,
        GroupSchema {
            key: "rssi",
            fields: &[num("rssi", "RSSI value", "")],
        },
        GroupSchema {
            key: "hub_rssi",
            fields: &[num("hub_rssi", "Hub RSSI value", "")],
        },
        GroupSchema {
            key: "sensor_status",
            fields: &[num("sensor_status", "Sensor status", "")],
        },
        GroupSchema {
            key: "debug",
            fields: &[num("debug", "Debug", "")],
        },
    ],
};

static HUB_STATUS: MessageSchema = MessageSchema {
    message_type: "hub_status",
    display_name: "Status (hub)",
    groups: &[
        GroupSchema {
            key: "firmware_revision",
            fields: &[text("firmware_revision", "Firmware revision")],
        },
        GroupSchema {
            key: "uptime",
            fields: &[num("uptime", "Uptime", "s")],
        },
        GroupSchema {
            key: "rssi",
            fields: &[num("rssi", "RSSI value", "")],
        },
        GroupSchema {
            key: "timestamp",
            fields: &[TIMESTAMP],
        },
        GroupSchema {
            key: "reset_flags",
            fields: &[text("reset_flags", "Reset flags")],
        },
        GroupSchema {
            key: "seq",
            fields: &[num("seq", "Seq", "")],
        },
        GroupSchema {
            key: "fs",
            fields: &[
                num("fs.internal_1", "internal 1", ""),
                num("fs.internal_2", "internal 2", ""),
                num("fs.internal_3", "internal 3", ""),
                num("fs.internal_4", "internal 4", ""),
            ],
        },
        GroupSchema {
            key: "radio_stats",
            fields: &[
                num("radio_stats.version", "Version", ""),
                num("radio_stats.rebootCount", "Reboot Count", ""),
                num("radio_stats.I2CBusErrorCount", "I2C Bus Error Count", ""),
                code("radio_stats.radioStatus", "Radio Status"),
                num("radio_stats.radioNetworkID", "Radio Network ID", ""),
            ],
        },
        GroupSchema {
            key: "mqtt_stats",
            fields: &[
                num("mqtt_stats.internal_1", "internal 1", ""),
                num("mqtt_stats.internal_2", "internal 2", ""),
            ],
        },
    ],
};

static MESSAGES: [&MessageSchema; 8] = [
    &EVT_PRECIP,
    &EVT_STRIKE,
    &RAPID_WIND,
    &OBS_AIR,
    &OBS_SKY,
    &OBS_ST,
    &DEVICE_STATUS,
    &HUB_STATUS,
];

/// Schema for a message type, if it is a known one
pub fn message_schema(message_type: &str) -> Option<&'static MessageSchema> {
    MESSAGES
        .iter()
        .find(|schema| schema.message_type == message_type)
        .copied()
}

/// Full positional lookup. Pure and side-effect-free; the three failure
/// modes are distinct so callers can report schema-version mismatches
/// precisely.
pub fn lookup(
    message_type: &str,
    group: &str,
    index: usize,
) -> Result<&'static FieldDefinition, SchemaError> {
    let schema = message_schema(message_type)
        .ok_or_else(|| SchemaError::UnknownMessageType(message_type.to_string()))?;
    let group_schema = schema.group(group).ok_or_else(|| SchemaError::UnknownGroup {
        message_type: message_type.to_string(),
        group: group.to_string(),
    })?;
    group_schema
        .fields
        .get(index)
        .ok_or_else(|| SchemaError::UnknownIndex {
            message_type: message_type.to_string(),
            group: group.to_string(),
            index,
        })
}

/// Device type by the first two characters of a serial number
pub fn device_kind(serial: &str) -> &'static str {
    match serial.get(..2) {
        Some("HB") => "Hub",
        Some("AR") => "Air",
        Some("SK") => "Sky",
        Some("ST") => "Tempest",
        _ => "Unknown",
    }
}

/// Metrics tracked for a daily minimum
const MIN_TRACKED: [&str; 5] = [
    "airTemperature",
    "stationPressure",
    "relativeHumidity",
    "lightningStrikeAvgDistance",
    "distance",
];

/// Metrics tracked for a daily maximum
const MAX_TRACKED: [&str; 12] = [
    "airTemperature",
    "windLull",
    "windGust",
    "windAvg",
    "windSpeed",
    "illuminance",
    "UV",
    "solarRadiation",
    "stationPressure",
    "relativeHumidity",
    "lightningStrikeCount",
    "energy",
];

pub fn is_min_tracked(name: &str) -> bool {
    MIN_TRACKED.contains(&name)
}

pub fn is_max_tracked(name: &str) -> bool {
    MAX_TRACKED.contains(&name)
}
