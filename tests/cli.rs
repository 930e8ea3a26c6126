use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;

const EXTRACT: &str = "\
個案研判日,縣市,鄉鎮,性別,是否為境外移入,年齡層,確定病例數
2021-05-01,台北市,中正區,M,0,20-24,3
2021-05-02,台北市,中正區,F,0,30-34,5
2021-05-03,新北市,板橋區,M,0,40-44,2
2021-05-03,新北市,板橋區,M,1,40-44,7
";

fn write_extract(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("extract.csv");
    fs::write(&path, EXTRACT).unwrap();
    path
}

#[test]
fn cli_shows_help() {
    let mut cmd = Command::cargo_bin("cases").unwrap();
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("render"))
        .stdout(predicate::str::contains("regions"));
}

#[test]
fn regions_lists_labels_with_totals() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_extract(dir.path());
    let mut cmd = Command::cargo_bin("cases").unwrap();
    cmd.arg("regions").arg("--data").arg(&data);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("台北市\t2021-05-01 ~ 2021-05-02\t8"))
        .stdout(predicate::str::contains("新北市\t2021-05-03 ~ 2021-05-03\t2"));
}

#[test]
fn render_writes_both_pngs_rows_and_specs() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_extract(dir.path());
    let out = dir.path().join("out");
    let rows = dir.path().join("rows.csv");
    let spec = dir.path().join("spec.json");

    let mut cmd = Command::cargo_bin("cases").unwrap();
    cmd.arg("render")
        .arg("--data")
        .arg(&data)
        .args(["-r", "台北市,新北市", "--start", "2021-05-02", "--end", "2021-05-03"])
        .args(["--width", "400", "--height", "300", "--stats"])
        .arg("--out-dir")
        .arg(&out)
        .arg("--rows")
        .arg(&rows)
        .arg("--spec-json")
        .arg(&spec);
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("顯示日期區間：2021-05-02 ~ 2021-05-03"))
        .stdout(predicate::str::contains("台北市  total=5"));

    for name in ["daily_confirmed.png", "cumulative_confirmed.png"] {
        let bytes = fs::read(out.join(name)).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
    }

    let text = fs::read_to_string(&rows).unwrap();
    assert_eq!(
        text.lines().collect::<Vec<_>>(),
        vec![
            "date,region,cases,cumulative",
            "2021-05-02,台北市,5,5",
            "2021-05-03,新北市,2,2",
        ]
    );

    let v: serde_json::Value = serde_json::from_str(&fs::read_to_string(&spec).unwrap()).unwrap();
    assert_eq!(v["daily"]["layout"]["xaxis"]["range"][0], "2021-05-02");
    assert_eq!(v["cumulative"]["data"].as_array().unwrap().len(), 2);
    assert!(v["daily"]["layout"]["xaxis"].get("_template").is_none());
}

#[test]
fn render_svg_and_fallback_window() {
    let dir = tempfile::tempdir().unwrap();
    let data = write_extract(dir.path());
    let mut cmd = Command::cargo_bin("cases").unwrap();
    cmd.arg("render")
        .arg("--data")
        .arg(&data)
        .args(["--start", "2021-07-01", "--end", "2021-06-01", "--format", "svg"])
        .args(["--width", "400", "--height", "300"])
        .arg("--out-dir")
        .arg(dir.path());
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("顯示日期區間：2021-05-01 ~ 2021-05-03"));
    let svg = fs::read_to_string(dir.path().join("daily_confirmed.svg")).unwrap();
    assert!(svg.contains("<svg"));
}

#[test]
fn missing_data_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let mut cmd = Command::cargo_bin("cases").unwrap();
    cmd.arg("regions")
        .arg("--data")
        .arg(dir.path().join("nope.csv"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("nope.csv"));
}
