use chrono::{Local, NaiveDate, TimeZone, Utc};
use djiutil::models::AltitudeReference;
use djiutil::services::{read_track, Converter, FileCatalog, Selection};
use std::fs;
use std::path::Path;
use tempfile::tempdir;

fn block(index: u32, second: u32, lat: f64, lon: f64) -> String {
    format!(
        "{index}\n\
         00:00:0{s},000 --> 00:00:0{s},016\n\
         <font size=\"28\">FrameCnt: {index}, DiffTime: 16ms\n\
         2023-08-28 17:26:0{s}.250\n\
         [iso: 160] [shutter: 1/297.91] [fnum: 2.8] [ev: 0] [latitude: {lat}] [longitude: {lon}] [rel_alt: 46.000 abs_alt: 19.621] </font>\n\n",
        index = index,
        s = second,
        lat = lat,
        lon = lon,
    )
}

fn write_shot(dir: &Path, index: u32, srt: Option<&str>) {
    fs::write(dir.join(format!("DJI_{index:04}.MP4")), "video").unwrap();
    if let Some(content) = srt {
        fs::write(dir.join(format!("DJI_{index:04}.SRT")), content).unwrap();
    }
}

#[test]
fn test_scan_select_convert_read_back() {
    let root = tempdir().unwrap();
    let media = root.path().join("DCIM/DJI_001");
    fs::create_dir_all(&media).unwrap();

    let flight = [
        block(1, 0, 36.27423, -41.36214),
        block(2, 1, 0.0, 0.0),
        block(3, 2, 36.27431, -41.36202),
        block(4, 3, 36.27440, -41.36190),
    ]
    .concat();
    write_shot(&media, 30, None);
    write_shot(&media, 31, Some(&flight));
    write_shot(&media, 32, Some("1\n00:00:01,000 --> 00:00:00,000\n[latitude: 1]\n"));
    fs::write(media.join("DJI_0031.LRF"), "preview").unwrap();

    let shots = FileCatalog::new().scan(root.path()).unwrap();
    assert_eq!(shots.iter().map(|s| s.index).collect::<Vec<_>>(), vec![30, 31, 32]);
    assert!(shots[1].has_lrf() && shots[1].has_srt());

    let selection = Selection::from_filters(None, Some("31-40"), Utc::now()).unwrap();
    let selected = selection.select(&shots);
    assert_eq!(selected.len(), 2);

    let report = Converter::new().convert_shots(selected);
    assert_eq!(report.succeeded(), 1);
    assert_eq!(report.failed(), 1);

    let xml = fs::read_to_string(media.join("DJI_0031.gpx")).unwrap();
    let track = read_track(&xml).unwrap();

    assert_eq!(track.name, "DJI_0031");
    assert_eq!(track.len(), 3);

    let expected: Vec<_> = [0, 2, 3]
        .iter()
        .map(|&s| {
            let naive = NaiveDate::from_ymd_opt(2023, 8, 28)
                .unwrap()
                .and_hms_milli_opt(17, 26, s, 250)
                .unwrap();
            Local
                .from_local_datetime(&naive)
                .earliest()
                .unwrap()
                .with_timezone(&Utc)
        })
        .collect();
    let times: Vec<_> = track.points.iter().map(|p| p.time.unwrap()).collect();
    assert_eq!(times, expected);

    let first = &track.points[0];
    assert_eq!(first.latitude, 36.27423);
    assert_eq!(first.longitude, -41.36214);
    let elevation = first.elevation.unwrap();
    assert_eq!(elevation.meters, 46.0);
    assert_eq!(elevation.reference, AltitudeReference::Takeoff);
}

#[test]
fn test_date_filter_matches_fresh_files() {
    let dir = tempdir().unwrap();
    write_shot(dir.path(), 1, None);
    write_shot(dir.path(), 2, None);

    let shots = FileCatalog::new().scan(dir.path()).unwrap();

    let recent = Selection::from_filters(Some("<1d"), None, Utc::now()).unwrap();
    assert_eq!(recent.select(&shots).len(), 2);

    let old = Selection::from_filters(Some(">1d"), None, Utc::now()).unwrap();
    assert!(old.select(&shots).is_empty());
}
