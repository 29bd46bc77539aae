//! Converts position-logger CSV exports into KML/KMZ and GPX tracks.
//!
//! Pipeline: [`csv_loader`] → [`row_repair`] → [`track_segmenter`] →
//! [`kml_writer`] / [`gpx_writer`], driven per file by [`converter`].

pub mod converter;
pub mod csv_loader;
pub mod error;
pub mod gpx_writer;
pub mod kml_writer;
pub mod position;
pub mod row_repair;
pub mod time_format;
pub mod track_segmenter;
pub mod xml_check;

pub use converter::{convert_all, convert_file, ConversionReport, ConvertOptions, FileOutcome};
pub use error::{ConvertError, Result};
pub use position::{Position, RowKind, Track};
