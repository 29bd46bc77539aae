//! Position Record Model
//!
//! One decoded row of the logger's CSV export, plus the `Track` grouping
//! that the segmenter builds and both renderers consume.

use geo::{point, HaversineDistance};

/// Record kind, integer-coded in the first CSV column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    LogEvent,
    Fix,
    Note,
    Unknown(i64),
}

impl RowKind {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => RowKind::LogEvent,
            1 => RowKind::Fix,
            2 => RowKind::Note,
            other => RowKind::Unknown(other),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RowKind::LogEvent => "log entry",
            RowKind::Fix => "coordinate",
            RowKind::Note => "note",
            RowKind::Unknown(_) => "unexpected?",
        }
    }

    /// Fixes and notes carry a real coordinate and can anchor interpolation.
    pub fn is_anchor(self) -> bool {
        matches!(self, RowKind::Fix | RowKind::Note)
    }
}

/// Network reachability at capture time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reachability {
    Unknown,
    Offline,
    Online,
}

impl Reachability {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Reachability::Offline,
            c if c > 0 => Reachability::Online,
            _ => Reachability::Unknown,
        }
    }
}

/// Second column tier (older firmware omits it entirely).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DeviceState {
    pub in_background: bool,
    pub requested_accuracy: i64,
    pub speed: f64,
    pub direction: f64,
    pub battery_level: f64,
}

/// Third column tier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PowerState {
    pub external_power: bool,
    pub reachability: Reachability,
}

impl Default for PowerState {
    fn default() -> Self {
        Self {
            external_power: false,
            reachability: Reachability::Unknown,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub kind: RowKind,
    pub text: String,
    pub longitude: f64,
    pub latitude: f64,
    pub longitude_text: String,
    pub latitude_text: String,
    /// Meters, negative when unknown.
    pub horizontal_accuracy: f64,
    /// Meters, negative when unknown.
    pub vertical_accuracy: f64,
    /// Meters, zero is not rendered.
    pub altitude: f64,
    /// Unix seconds.
    pub timestamp: i64,
    pub device: DeviceState,
    pub power: PowerState,
}

impl Position {
    pub fn coordinate(&self) -> (f64, f64) {
        (self.longitude, self.latitude)
    }

    pub fn has_text(&self) -> bool {
        !self.text.is_empty()
    }
}

/// A contiguous recording session. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    positions: Vec<Position>,
}

impl Track {
    /// Returns `None` for an empty position list.
    pub fn new(positions: Vec<Position>) -> Option<Self> {
        if positions.is_empty() {
            None
        } else {
            Some(Self { positions })
        }
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn first(&self) -> &Position {
        &self.positions[0]
    }

    /// Earliest and latest timestamp in the track.
    pub fn time_span(&self) -> (i64, i64) {
        let min = self.positions.iter().map(|p| p.timestamp).min().unwrap_or(0);
        let max = self.positions.iter().map(|p| p.timestamp).max().unwrap_or(0);
        (min, max)
    }

    /// Great-circle length of the polyline through every position.
    pub fn length_meters(&self) -> f64 {
        self.positions
            .windows(2)
            .map(|w| {
                let a = point!(x: w[0].longitude, y: w[0].latitude);
                let b = point!(x: w[1].longitude, y: w[1].latitude);
                a.haversine_distance(&b)
            })
            .sum()
    }
}

#[cfg(test)]
pub(crate) fn sample(kind: RowKind, timestamp: i64, longitude: f64, latitude: f64) -> Position {
    Position {
        kind,
        text: String::new(),
        longitude,
        latitude,
        longitude_text: longitude.to_string(),
        latitude_text: latitude.to_string(),
        horizontal_accuracy: -1.0,
        vertical_accuracy: -1.0,
        altitude: 0.0,
        timestamp,
        device: DeviceState::default(),
        power: PowerState::default(),
    }
}
