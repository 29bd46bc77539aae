use tracing::debug;

use crate::position::{Position, Track};

/// Default gap between two rows that starts a new track, in seconds.
pub const TIME_THRESHOLD_SECS: i64 = 60 * 60;

/// Splits the repaired rows into tracks wherever two consecutive rows are
/// more than `threshold_secs` apart. A gap of exactly the threshold does not
/// split.
pub fn segment(rows: Vec<Position>, threshold_secs: i64) -> Vec<Track> {
    let mut tracks = Vec::new();
    let mut current: Vec<Position> = Vec::new();

    for row in rows {
        if let Some(last) = current.last() {
            if (row.timestamp - last.timestamp).abs() > threshold_secs {
                tracks.extend(Track::new(std::mem::take(&mut current)));
            }
        }
        current.push(row);
    }
    tracks.extend(Track::new(current));

    debug!(tracks = tracks.len(), threshold_secs, "segmented rows");
    tracks
}
