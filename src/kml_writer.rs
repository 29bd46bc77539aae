//! KML Renderer
//!
//! One `Document` with fixed line styles, one `Folder` per track and one
//! `Placemark` per position. Each placemark draws the segment to the next
//! position and a point at its own coordinate.
//!
//! Styles:
//! * `r1`..`r5` rotate per point index for ordinary segments
//! * `b1` marks a segment between two log events (both ends interpolated)
//! * `g1` marks a segment starting at a note

use std::fs::File;
use std::io::{Cursor, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::{ConvertError, Result};
use crate::position::{Position, Reachability, RowKind, Track};
use crate::time_format::{local_clock_seconds, local_datetime, span_name};
use crate::xml_check::{escape, self_check};

pub const KML_NAMESPACE: &str = "http://earth.google.com/kml/2.2";
/// Name of the single entry inside a KMZ archive.
pub const KMZ_ENTRY: &str = "doc.kml";

const ROTATING_STYLES: usize = 5;
const LINE_STYLES: [(&str, &str); 7] = [
    ("r1", "bb0000ff"),
    ("r2", "bb5a5aff"),
    ("r3", "bb688bff"),
    ("r4", "bb3262ff"),
    ("r5", "bb0076ff"),
    ("b1", "bbff0000"),
    ("g1", "bb00ff00"),
];

pub fn render_kml(tracks: &[Track], short_name: &str) -> Result<String> {
    if tracks.is_empty() {
        return Err(ConvertError::EmptyTracks);
    }

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str(&format!("<kml xmlns=\"{}\">\n", KML_NAMESPACE));
    out.push_str(&format!(
        "<Document><name>{}</name><open>1</open>\n",
        escape(short_name)
    ));
    out.push_str(
        " <description>Positions recorded with http://github.com/gradha/Record-my-position</description>\n",
    );
    for (id, color) in LINE_STYLES {
        out.push_str(&format!(
            " <Style id=\"{}\"><LineStyle><color>{}</color><width>5</width></LineStyle></Style>\n",
            id, color
        ));
    }

    for track in tracks {
        render_folder(track, &mut out);
    }
    out.push_str("</Document></kml>\n");

    self_check("kml", &out)?;
    Ok(out)
}

fn render_folder(track: &Track, out: &mut String) {
    let (start, end) = track.time_span();
    out.push_str(&format!(
        "<Folder><name>{}</name>\n<open>0</open>",
        escape(&span_name(start, end, track.len()))
    ));

    let positions = track.positions();
    for (index, position) in positions.iter().enumerate() {
        let next = positions.get(index + 1);
        let suffix = if position.has_text() { " log" } else { "" };

        out.push_str(&format!(
            "<Placemark><styleUrl>#{}</styleUrl>\n<name>{} {}{}</name>\n",
            style_for(index, position, next),
            index + 1,
            local_clock_seconds(position.timestamp),
            suffix
        ));
        out.push_str(&format!(
            "<description>{}</description>",
            escape(&describe(position))
        ));

        out.push_str("<MultiGeometry>\n");
        if let Some(next) = next {
            out.push_str(&format!(
                "<LineString><coordinates>{:.6},{:.6},0\n{:.6},{:.6},0</coordinates></LineString>\n",
                position.longitude, position.latitude, next.longitude, next.latitude
            ));
        }
        out.push_str(&format!(
            "<Point><coordinates>{:.6},{:.6},0</coordinates></Point>",
            position.longitude, position.latitude
        ));
        out.push_str("</MultiGeometry></Placemark>");
    }

    out.push_str("</Folder>\n");
}

/// Style id for the placemark at `index`. The rotation advances with the
/// index even when an override wins.
pub fn style_for(index: usize, position: &Position, next: Option<&Position>) -> String {
    let next_is_log = next.map_or(false, |n| n.kind == RowKind::LogEvent);
    if position.kind == RowKind::LogEvent && next_is_log {
        "b1".to_string()
    } else if position.kind == RowKind::Note {
        "g1".to_string()
    } else {
        format!("r{}", index % ROTATING_STYLES + 1)
    }
}

/// Human readable placemark description, one fact per line.
pub fn describe(position: &Position) -> String {
    let mut lines = Vec::new();

    let note = position.text.trim();
    if !note.is_empty() {
        lines.push(format!("{}\n", note));
    }

    lines.push(format!("Type: {}", position.kind.label()));

    if position.horizontal_accuracy > 0.0 {
        lines.push(format!(
            "Horizontal accuracy: {:.0}m.",
            position.horizontal_accuracy
        ));
    }

    if position.device.in_background {
        lines.push("Captured during background operation.".to_string());
    } else {
        lines.push("Captured during foreground operation.".to_string());
    }

    lines.push(format!("Battery {:.0}%.", position.device.battery_level * 100.0));

    if position.power.external_power {
        lines.push("External power source present.".to_string());
    } else {
        lines.push("Running on own batteries.".to_string());
    }

    match position.power.reachability {
        Reachability::Online => lines.push("Connected online.".to_string()),
        Reachability::Offline => lines.push("Online reachability not possible.".to_string()),
        Reachability::Unknown => {}
    }

    lines.push(format!("Timestamp {}", position.timestamp));
    lines.push(format!("\t{}.", local_datetime(position.timestamp)));

    lines.join("\n")
}

/// Packs the document as a single deflated `doc.kml` entry.
pub fn kmz_bytes(kml: &str) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    zip.start_file(KMZ_ENTRY, options)?;
    zip.write_all(kml.as_bytes())
        .map_err(|e| ConvertError::io(KMZ_ENTRY, e))?;
    Ok(zip.finish()?.into_inner())
}

pub fn write_kmz(path: &Path, kml: &str) -> Result<()> {
    let bytes = kmz_bytes(kml)?;
    let mut file = File::create(path).map_err(|e| ConvertError::io(path, e))?;
    file.write_all(&bytes).map_err(|e| ConvertError::io(path, e))
}
