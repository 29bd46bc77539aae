//! GPX Renderer
//!
//! A plain GPX 1.1 document: metadata with the first point's time and one
//! `trk` per track. Rows carrying text (notes, annotated log entries) are
//! left out since GPX track points have no room for them.

use crate::error::{ConvertError, Result};
use crate::position::{Position, Track};
use crate::time_format::{span_name, utc_timestamp};
use crate::xml_check::self_check;

pub const GPX_NAMESPACE: &str = "http://www.topografix.com/GPX/1/1";

pub fn render_gpx(tracks: &[Track]) -> Result<String> {
    let first = tracks.first().ok_or(ConvertError::EmptyTracks)?.first();

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"no\" ?>\n\n");
    out.push_str(&format!(
        "<gpx version=\"1.1\" creator=\"{}\" xmlns=\"{}\">\n",
        env!("CARGO_PKG_NAME"),
        GPX_NAMESPACE
    ));
    out.push_str(&format!(
        "\t<metadata><link href=\"https://github.com/gradha/Record-my-position/\">\n\t<text>Record-my-position</text></link><time>{}</time></metadata>\n",
        utc_timestamp(first.timestamp)
    ));

    for track in tracks {
        render_track(track, &mut out);
    }
    out.push_str("</gpx>\n");

    self_check("gpx", &out)?;
    Ok(out)
}

/// Positions that become track points.
pub fn track_points(track: &Track) -> impl Iterator<Item = &Position> {
    track.positions().iter().filter(|p| !p.has_text())
}

fn render_track(track: &Track, out: &mut String) {
    let (start, end) = track.time_span();
    let count = track_points(track).count();

    out.push_str(&format!(
        "<trk><name>{}</name>\n<trkseg>",
        span_name(start, end, count)
    ));
    for position in track_points(track) {
        out.push_str(&track_point(position));
    }
    out.push_str("</trkseg></trk>\n");
}

fn track_point(position: &Position) -> String {
    let mut point = format!(
        "<trkpt lat=\"{:.6}\" lon=\"{:.6}\">",
        position.latitude, position.longitude
    );

    if position.altitude != 0.0 {
        point.push_str(&format!("<ele>{:.6}</ele>", position.altitude));
    }
    point.push_str(&format!("<time>{}</time>", utc_timestamp(position.timestamp)));
    if position.horizontal_accuracy >= 0.0 {
        point.push_str(&format!("<hdop>{:.2}</hdop>", position.horizontal_accuracy));
    }
    if position.vertical_accuracy >= 0.0 {
        point.push_str(&format!("<vdop>{:.2}</vdop>", position.vertical_accuracy));
    }
    let direction = position.device.direction;
    if (0.0..=360.0).contains(&direction) {
        point.push_str(&format!("<course>{:.2}</course>", direction));
    }
    if position.device.speed >= 0.0 {
        point.push_str(&format!("<speed>{:.3}</speed>", position.device.speed));
    }

    point.push_str("</trkpt>\n");
    point
}
