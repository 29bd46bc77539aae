use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use csv_to_kml::converter::{collect_inputs, write_summary};
use csv_to_kml::csv_loader::load_csv;
use csv_to_kml::kml_writer::{render_kml, KMZ_ENTRY};
use csv_to_kml::row_repair::repair;
use csv_to_kml::track_segmenter::{segment, TIME_THRESHOLD_SECS};
use csv_to_kml::xml_check::check_well_formed;
use csv_to_kml::{convert_all, convert_file, ConvertError, ConvertOptions, RowKind};
use tempfile::TempDir;

const THREE_ROWS: &str = "\
1,,0,0,0,0,5,5,0,0
0,,0,0,0,0,-1,-1,0,50
1,,10,10,10,10,5,5,0,100
";

const MIXED: &str = "\
1,,2.1,41.3,2.1,41.3,10,15,120,1300000000,0,1,1.5,90,0.8,1,1
0,app went to background,0,0,0,0,-1,-1,0,1300000030,1,1,-1,-1,0.8,1,1
2,coffee break,2.2,41.4,2.2,41.4,8,-1,0,1300000060,0,1,0,-1,0.79,0,0
1,,2.3,41.5,2.3,41.5,10,15,0,1300000050
garbage line
1,,2.4,41.6,2.4,41.6,10,15,0,1300000120
1,,2.5,41.7,2.5,41.7,10,15,0,1300020000
";

fn write_input(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn uncompressed() -> ConvertOptions {
    ConvertOptions {
        compress: false,
        gpx: true,
        ..ConvertOptions::default()
    }
}

#[test]
fn three_row_end_to_end() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "walk.csv", THREE_ROWS);

    let tracks = segment(repair(load_csv(&input).unwrap()), TIME_THRESHOLD_SECS);
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].len(), 3);
    let middle = &tracks[0].positions()[1];
    assert_eq!(middle.kind, RowKind::LogEvent);
    assert_eq!(middle.coordinate(), (5.0, 5.0));

    let kml = render_kml(&tracks, "walk").unwrap();
    assert_eq!(kml.matches("<Folder>").count(), 1);
    assert_eq!(kml.matches("<Placemark>").count(), 3);
    let styles: Vec<&str> = kml
        .match_indices("<styleUrl>#")
        .map(|(i, _)| &kml[i + 11..i + 13])
        .collect();
    assert_eq!(styles, vec!["r1", "r2", "r3"]);
    assert!(kml.contains("5.000000,5.000000,0"));
}

#[test]
fn convert_file_writes_kml_and_gpx() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "day.csv", MIXED);

    let report = convert_file(&input, &uncompressed()).unwrap();
    assert_eq!(report.loaded_rows, 6);
    // the 1300000050 fix goes backwards and is dropped
    assert_eq!(report.kept_rows, 5);
    assert_eq!(report.tracks, 2);
    assert!(report.length_km > 0.0);

    let kml = fs::read_to_string(dir.path().join("day.kml")).unwrap();
    check_well_formed(&kml).unwrap();
    assert_eq!(kml.matches("<Folder>").count(), 2);
    assert_eq!(kml.matches("<Placemark>").count(), 5);
    assert!(kml.contains("<name>day</name>"));
    assert!(kml.contains("coffee break\n\nType: note"));
    assert!(kml.contains("Battery 80%."));
    assert!(kml.contains("Online reachability not possible."));
    assert!(!kml.contains("2.300000,41.500000"));

    let gpx_path = report.gpx_output.unwrap();
    assert_eq!(gpx_path, dir.path().join("day.gpx"));
    let gpx = fs::read_to_string(gpx_path).unwrap();
    check_well_formed(&gpx).unwrap();
    assert_eq!(gpx.matches("<trk>").count(), 2);
    // the annotated log entry and the note are not track points
    assert_eq!(gpx.matches("<trkpt ").count(), 3);
    assert!(gpx.contains("<metadata>"));
    assert!(gpx.contains("<time>2011-03-13T07:06:40Z</time></metadata>"));
    assert!(gpx.contains("<ele>120.000000</ele>"));
    assert!(gpx.contains("<course>90.00</course><speed>1.500</speed>"));
}

#[test]
fn kmz_is_default_output() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "walk.csv", THREE_ROWS);

    let report = convert_file(&input, &ConvertOptions::default()).unwrap();
    assert_eq!(report.kml_output, dir.path().join("walk.kmz"));
    assert!(report.gpx_output.is_none());
    assert!(!dir.path().join("walk.gpx").exists());

    let file = fs::File::open(&report.kml_output).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    assert_eq!(archive.len(), 1);
    let mut kml = String::new();
    archive
        .by_name(KMZ_ENTRY)
        .unwrap()
        .read_to_string(&mut kml)
        .unwrap();
    check_well_formed(&kml).unwrap();
}

#[test]
fn file_without_rows_is_no_data() {
    let dir = TempDir::new().unwrap();
    let input = write_input(&dir, "empty.csv", "nothing,useful\n");

    let err = convert_file(&input, &uncompressed()).unwrap_err();
    assert!(matches!(err, ConvertError::NoData { .. }));
    assert!(!dir.path().join("empty.kml").exists());
    assert!(!dir.path().join("empty.gpx").exists());
}

#[test]
fn failing_file_does_not_stop_batch() {
    let dir = TempDir::new().unwrap();
    let empty = write_input(&dir, "a.csv", "");
    let good = write_input(&dir, "b.csv", THREE_ROWS);
    let missing = dir.path().join("c.csv");

    let inputs = vec![empty.clone(), good.clone(), missing];
    for jobs in [1, 3] {
        let options = ConvertOptions {
            jobs,
            ..uncompressed()
        };
        let outcomes = convert_all(&inputs, &options);
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes[0].input, empty);
        assert!(matches!(outcomes[0].result, Err(ConvertError::NoData { .. })));
        assert!(outcomes[1].result.is_ok());
        assert!(matches!(outcomes[2].result, Err(ConvertError::Io { .. })));
    }
    assert!(dir.path().join("b.kml").exists());
}

#[test]
fn directories_expand_to_csv_files() {
    let dir = TempDir::new().unwrap();
    fs::create_dir(dir.path().join("nested")).unwrap();
    write_input(&dir, "b.CSV", THREE_ROWS);
    write_input(&dir, "nested/a.csv", THREE_ROWS);
    write_input(&dir, "notes.txt", "hi");
    let single = Path::new("/some/file.csv").to_path_buf();

    let inputs = collect_inputs(&[dir.path().to_path_buf(), single.clone()]).unwrap();
    assert_eq!(
        inputs,
        vec![
            dir.path().join("b.CSV"),
            dir.path().join("nested/a.csv"),
            single
        ]
    );
}

#[test]
fn summary_lists_every_input() {
    let dir = TempDir::new().unwrap();
    let good = write_input(&dir, "good.csv", THREE_ROWS);
    let bad = write_input(&dir, "bad.csv", "x\n");
    let outcomes = convert_all(&[good, bad], &uncompressed());

    let summary = dir.path().join("summary.csv");
    write_summary(&outcomes, &summary).unwrap();

    let mut reader = csv::Reader::from_path(&summary).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert_eq!(&headers[0], "input");
    assert_eq!(headers.iter().last(), Some("status"));
    let records: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].get(7), Some("SUCCESS"));
    assert!(records[1].get(7).unwrap().starts_with("ERROR: no data found"));
}
