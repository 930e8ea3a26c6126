use crate::models::{ViewRow, format_date};
use anyhow::{Context, Result};
use csv::WriterBuilder;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Save visible rows as CSV with header.
pub fn save_csv<P: AsRef<Path>>(rows: &[ViewRow], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = WriterBuilder::new()
        .from_path(path)
        .with_context(|| format!("creating {}", path.display()))?;
    wtr.serialize(("date", "region", "cases", "cumulative"))?;
    for r in rows {
        wtr.serialize((format_date(r.date), spreadsheet_safe(&r.label), r.cases, r.cumulative))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Save visible rows as pretty JSON array.
pub fn save_json<P: AsRef<Path>>(rows: &[ViewRow], path: P) -> Result<()> {
    let path = path.as_ref();
    let mut f = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let s = serde_json::to_string_pretty(rows)?;
    f.write_all(s.as_bytes())?;
    Ok(())
}

/// Save by extension: `.json` writes JSON, anything else CSV.
pub fn save_rows<P: AsRef<Path>>(rows: &[ViewRow], path: P) -> Result<()> {
    let path = path.as_ref();
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("json") => save_json(rows, path),
        _ => save_csv(rows, path),
    }
}

/// Spreadsheets evaluate cells starting with these as formulas.
fn spreadsheet_safe(s: &str) -> String {
    if s.starts_with(['=', '+', '-', '@']) {
        format!("'{s}")
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::tempdir;

    fn rows() -> Vec<ViewRow> {
        vec![
            ViewRow {
                date: NaiveDate::from_ymd_opt(2021, 5, 1).unwrap(),
                label: "台北市".into(),
                cases: 3,
                cumulative: 3,
            },
            ViewRow {
                date: NaiveDate::from_ymd_opt(2021, 5, 2).unwrap(),
                label: "=cmd".into(),
                cases: 5,
                cumulative: 8,
            },
        ]
    }

    #[test]
    fn write_csv_and_json() {
        let dir = tempdir().unwrap();
        let csvp = dir.path().join("x.csv");
        let jsonp = dir.path().join("x.JSON");
        save_rows(&rows(), &csvp).unwrap();
        save_rows(&rows(), &jsonp).unwrap();

        let text = std::fs::read_to_string(&csvp).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "date,region,cases,cumulative");
        assert_eq!(lines[1], "2021-05-01,台北市,3,3");
        assert_eq!(lines[2], "2021-05-02,'=cmd,5,8");

        let back: Vec<ViewRow> =
            serde_json::from_str(&std::fs::read_to_string(&jsonp).unwrap()).unwrap();
        assert_eq!(back, rows());
    }
}
