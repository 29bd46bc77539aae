//! Tolerant CSV loader for the logger export.
//!
//! Column layout (no header row):
//!
//! | tier | columns |
//! |------|---------|
//! | mandatory | kind, text, lon, lat, lon text, lat text, h acc, v acc, altitude, timestamp |
//! | 2 | in background, requested accuracy, speed, direction, battery level |
//! | 3 | external power, reachability |
//!
//! Rows that fail to parse are skipped with a warning. Optional tiers that
//! are missing fall back to their defaults, so exports from older firmware
//! still load.

use std::fs::File;
use std::io::Read;
use std::ops::Range;
use std::path::Path;
use std::str::FromStr;

use csv::{ReaderBuilder, StringRecord};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::{ConvertError, Result};
use crate::position::{DeviceState, Position, PowerState, Reachability, RowKind};

const MANDATORY_COLUMNS: usize = 10;
const DEVICE_TIER_END: usize = 15;
const POWER_TIER_END: usize = 17;

#[derive(Debug, Error)]
enum RowError {
    #[error("missing column {0}")]
    Missing(usize),
    #[error("column {column} is not a number: {value:?}")]
    Invalid { column: usize, value: String },
}

pub fn load_csv(path: &Path) -> Result<Vec<Position>> {
    let file = File::open(path).map_err(|e| ConvertError::io(path, e))?;
    let rows = parse_rows(file)?;
    debug!(path = %path.display(), rows = rows.len(), "loaded csv");
    Ok(rows)
}

/// Parses every record of `input`, keeping input order.
///
/// Only a failure of the underlying reader aborts; malformed rows are
/// dropped.
pub fn parse_rows<R: Read>(input: R) -> Result<Vec<Position>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(input);

    let mut rows = Vec::new();
    for (index, result) in reader.records().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                warn!("Ignoring line {}: {}", index + 1, e);
                continue;
            }
        };
        let line = record
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(index + 1);

        match parse_record(&record) {
            Ok(position) => rows.push(position),
            Err(e) => warn!("Ignoring line {}: {}", line, e),
        }
    }

    Ok(rows)
}

fn parse_record(record: &StringRecord) -> std::result::Result<Position, RowError> {
    if record.len() < MANDATORY_COLUMNS {
        return Err(RowError::Missing(record.len()));
    }

    let kind = RowKind::from_code(number::<i64>(record, 0)?);
    let device = if record.len() >= DEVICE_TIER_END {
        DeviceState {
            in_background: number::<i64>(record, 10)? != 0,
            requested_accuracy: number(record, 11)?,
            speed: number(record, 12)?,
            direction: number(record, 13)?,
            battery_level: number(record, 14)?,
        }
    } else {
        // a truncated tier still has to hold numbers where it has columns
        check_present::<i64>(record, 10..12)?;
        check_present::<f64>(record, 12..DEVICE_TIER_END)?;
        DeviceState::default()
    };
    let power = if record.len() >= POWER_TIER_END {
        PowerState {
            external_power: number::<i64>(record, 15)? > 0,
            reachability: Reachability::from_code(number(record, 16)?),
        }
    } else {
        check_present::<i64>(record, 15..POWER_TIER_END)?;
        PowerState::default()
    };

    Ok(Position {
        kind,
        text: text(record, 1)?.to_string(),
        longitude: number(record, 2)?,
        latitude: number(record, 3)?,
        longitude_text: text(record, 4)?.to_string(),
        latitude_text: text(record, 5)?.to_string(),
        horizontal_accuracy: number(record, 6)?,
        vertical_accuracy: number(record, 7)?,
        altitude: number(record, 8)?,
        timestamp: number(record, 9)?,
        device,
        power,
    })
}

fn text(record: &StringRecord, column: usize) -> std::result::Result<&str, RowError> {
    record.get(column).ok_or(RowError::Missing(column))
}

/// Parses whichever columns of `columns` the record has, discarding values.
fn check_present<T: FromStr>(
    record: &StringRecord,
    columns: Range<usize>,
) -> std::result::Result<(), RowError> {
    for column in columns.take_while(|&c| c < record.len()) {
        number::<T>(record, column)?;
    }
    Ok(())
}

fn number<T: FromStr>(record: &StringRecord, column: usize) -> std::result::Result<T, RowError> {
    let raw = text(record, column)?;
    raw.trim().parse().map_err(|_| RowError::Invalid {
        column,
        value: raw.to_string(),
    })
}
