use case_trends::export::{decode_figure, export_png, sanitize_figure};
use case_trends::reconcile::RangeSource;
use case_trends::render::RenderOptions;
use case_trends::{
    ChartKind, Dashboard, DashboardConfig, Interaction, RelayoutEvent, load_daily_series,
};
use chrono::NaiveDate;
use std::fs;
use std::sync::Arc;

const EXTRACT: &str = "\
個案研判日,縣市,鄉鎮,性別,是否為境外移入,年齡層,確定病例數
2021/05/01,台北市,中正區,M,0,20-24,3
2021/05/02,台北市,中正區,F,0,30-34,5
2021/05/02,台北市,大安區,F,1,30-34,40
2021/05/03,新北市,板橋區,M,0,40-44,2
2021/05/04,高雄市,鼓山區,F,0,50-54,1
2021/05/04,高雄市,鳳山區,M,0,50-54,4
2021/05/05,境外移入,空值,M,1,20-24,9
";

fn d(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn dashboard() -> Dashboard {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("extract.csv");
    fs::write(&path, EXTRACT).unwrap();
    let config = DashboardConfig::default();
    let series = load_daily_series(&path, &config).unwrap();
    Dashboard::new(Arc::new(series), &config)
}

#[test]
fn initial_render_covers_the_extent() {
    let mut db = dashboard();
    db.interact(Interaction::Initial);
    let view = db.view().unwrap();
    assert_eq!(view.window.start, d("2021-05-01"));
    assert_eq!(view.window.end, d("2021-05-04"));
    assert_eq!(view.range_text, "顯示日期區間：2021-05-01 ~ 2021-05-04");
    // imported 40 is not counted
    let cum = &view.cumulative.data[0];
    assert_eq!(cum.name, "台北市");
    assert_eq!(cum.y, vec![3, 8]);
}

#[test]
fn legacy_label_is_selectable_and_overlays_the_parent() {
    let mut db = dashboard();
    assert!(db.choices().iter().any(|c| c == "舊高雄市"));
    db.interact(Interaction::SelectRegion {
        slot: 0,
        label: Some("高雄市".into()),
    });
    db.interact(Interaction::SelectRegion {
        slot: 1,
        label: Some("舊高雄市".into()),
    });
    let view = db.view().unwrap();
    let totals: Vec<(&str, u64)> = view
        .daily
        .data
        .iter()
        .map(|t| (t.name.as_str(), t.y.iter().sum()))
        .collect();
    assert_eq!(totals, vec![("高雄市", 5), ("舊高雄市", 1)]);
}

#[test]
fn zoom_on_the_daily_chart_rewrites_the_fields() {
    let mut db = dashboard();
    db.interact(Interaction::Initial);
    db.interact(Interaction::Relayout {
        chart: ChartKind::Daily,
        event: RelayoutEvent::from_json(
            r#"{"xaxis.range[0]": "2021-05-02 00:00:00", "xaxis.range[1]": "2021-05-03 12:00"}"#,
        )
        .unwrap(),
    });
    assert_eq!(db.start_text(), "2021-05-02");
    assert_eq!(db.end_text(), "2021-05-03");
    assert_eq!(
        db.last_reconciled().unwrap().source,
        RangeSource::Zoom(ChartKind::Daily)
    );
    assert_eq!(db.view().unwrap().cumulative.data[0].y, vec![5]);
}

#[test]
fn inverted_manual_bounds_fall_back_to_everything() {
    let mut db = dashboard();
    db.interact(Interaction::EditStart("2021-07-01".into()));
    db.interact(Interaction::EditEnd("2021-06-01".into()));
    db.interact(Interaction::ClickUpdate);
    assert_eq!(db.start_text(), "2021-05-01");
    assert_eq!(db.end_text(), "2021-05-04");
}

#[test]
fn export_uses_a_sanitized_copy_of_the_displayed_figure() {
    let mut db = dashboard();
    assert!(db.export(ChartKind::Daily, &small()).unwrap().is_none());

    db.interact(Interaction::Initial);
    let shown = db.figure(ChartKind::Cumulative).unwrap().clone();
    assert!(shown["layout"]["xaxis"]["rangeslider"].get("yaxis").is_some());
    assert!(decode_figure(&shown).is_err());

    let spec = decode_figure(&sanitize_figure(&shown)).unwrap();
    assert_eq!(&spec, &db.view().unwrap().cumulative);

    let img = export_png(Some(&shown), &small()).unwrap().unwrap();
    assert_eq!(img.file_name, "cumulative_confirmed.png");
    assert!(img.bytes.starts_with(b"\x89PNG\r\n\x1a\n"));
    // still decorated after export
    assert_eq!(db.figure(ChartKind::Cumulative), Some(&shown));
}

#[test]
fn empty_selection_still_exports() {
    let mut db = dashboard();
    db.interact(Interaction::SelectRegion { slot: 0, label: None });
    assert_eq!(db.view().unwrap().daily.trace_count(), 0);
    let img = db.export(ChartKind::Daily, &small()).unwrap().unwrap();
    assert!(img.bytes.starts_with(b"\x89PNG"));
}

fn small() -> RenderOptions {
    RenderOptions {
        width: 400,
        height: 300,
        ..RenderOptions::default()
    }
}
