//! Row Repair Pipeline
//!
//! Two passes over the loaded rows, always in this order:
//! 1. drop rows whose timestamp goes backwards relative to the row before them
//! 2. give every log event a coordinate interpolated from its nearest
//!    fix/note neighbours
//!
//! Both passes consume and return a fresh vector.

use tracing::{info, warn};

use crate::position::{Position, RowKind};

pub fn repair(rows: Vec<Position>) -> Vec<Position> {
    interpolate_log_events(drop_backwards_rows(rows))
}

/// Removes every row that is strictly older than its original predecessor.
///
/// Comparisons always use the predecessor from the input, even when that
/// predecessor is itself dropped.
pub fn drop_backwards_rows(rows: Vec<Position>) -> Vec<Position> {
    let mut kept = Vec::with_capacity(rows.len());
    let mut previous_timestamp: Option<i64> = None;

    for (index, row) in rows.into_iter().enumerate() {
        let backwards = previous_timestamp.map_or(false, |prev| row.timestamp < prev);
        previous_timestamp = Some(row.timestamp);

        if backwards {
            info!("Removing backwards position item {}", index + 1);
        } else {
            kept.push(row);
        }
    }

    kept
}

/// Fills in the coordinate of each log event from the surrounding anchors.
///
/// Anchors are looked up in the input sequence, before any coordinate has
/// been patched. A log event with no anchor on either side keeps the
/// placeholder coordinate it was parsed with.
pub fn interpolate_log_events(rows: Vec<Position>) -> Vec<Position> {
    let prev_anchor = nearest_anchors(&rows, 0..rows.len());
    let next_anchor = nearest_anchors(&rows, (0..rows.len()).rev());

    let coordinates: Vec<Option<(f64, f64)>> = (0..rows.len())
        .map(|index| {
            if rows[index].kind != RowKind::LogEvent {
                return None;
            }
            let prev = prev_anchor[index].map(|i| &rows[i]);
            let next = next_anchor[index].map(|i| &rows[i]);
            let timestamp = rows[index].timestamp;

            match (prev, next) {
                (Some(prev), Some(next)) => Some(interpolate(prev, next, timestamp)),
                (Some(anchor), None) | (None, Some(anchor)) => Some(anchor.coordinate()),
                (None, None) => {
                    warn!(
                        "Log entry {} has no coordinate to interpolate from, keeping ({}, {})",
                        index + 1,
                        rows[index].longitude,
                        rows[index].latitude
                    );
                    None
                }
            }
        })
        .collect();

    rows.into_iter()
        .zip(coordinates)
        .map(|(mut row, coordinate)| {
            if let Some((longitude, latitude)) = coordinate {
                row.longitude = longitude;
                row.latitude = latitude;
            }
            row
        })
        .collect()
}

/// For each row, the index of the closest anchor strictly before it in walk
/// order. Walking the indices in reverse gives the closest anchor after it.
fn nearest_anchors(rows: &[Position], walk: impl Iterator<Item = usize>) -> Vec<Option<usize>> {
    let mut nearest = vec![None; rows.len()];
    let mut last = None;
    for index in walk {
        nearest[index] = last;
        if rows[index].kind.is_anchor() {
            last = Some(index);
        }
    }
    nearest
}

/// Linear interpolation of the `(longitude, latitude)` pair between two
/// anchors by time. Timestamps outside `[prev, next]` clamp to the nearest
/// anchor instead of extrapolating.
pub fn interpolate(prev: &Position, next: &Position, timestamp: i64) -> (f64, f64) {
    let (t1, t2) = (prev.timestamp, next.timestamp);
    if t1 > t2 {
        warn!("Interpolation anchors with inverted timestamps ({}, {})", t1, t2);
        return prev.coordinate();
    }
    if timestamp <= t1 {
        return prev.coordinate();
    }
    if timestamp >= t2 {
        return next.coordinate();
    }

    let factor = (timestamp - t1) as f64 / (t2 - t1) as f64;
    let (x1, y1) = prev.coordinate();
    let (x2, y2) = next.coordinate();
    (x1 + factor * (x2 - x1), y1 + factor * (y2 - y1))
}
