mod common;

use account_dashboard_wasm::application::pages::{
    ChartGalleryPage, ChartPageConfig, DisplayMode, TimeframeSelection,
};
use account_dashboard_wasm::domain::{Severity, StreamKey, TransportError};
use common::{Harness, envelope, secs};
use serde_json::{Value, json};

fn config(extra: Value) -> ChartPageConfig {
    let mut base = json!({"indicatorId": "topdog", "timeframes": ["1h", "4h", "1d"]});
    if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
        base.extend(extra.clone());
    }
    serde_json::from_value(base).unwrap()
}

fn chart_ok(path: &str) -> account_dashboard_wasm::domain::Envelope {
    envelope(json!({"success": true, "image_path": path}))
}

#[test]
fn config_defaults() {
    let cfg = config(json!({}));
    assert_eq!(cfg.title, "TOPDOGINDEX");
    assert_eq!(cfg.default_timeframe, "all");
    assert_eq!(cfg.display_mode, DisplayMode::Grid);
    assert_eq!(cfg.page_container, ".chart-page");
    assert!(cfg.auto_refresh);
}

#[test]
fn start_loads_every_timeframe_and_arms_refresh() {
    let h = Harness::new();
    let page = ChartGalleryPage::new(&h.services(), config(json!({})));
    h.client.respond(chart_ok("/media/charts/1h.png"));
    h.client.respond(envelope(json!({"success": false, "error": "no data"})));
    h.client.fail(TransportError::Request("offline".into()));

    page.start();
    h.settle();

    let bodies: Vec<Value> = h
        .client
        .requests()
        .iter()
        .map(|r| {
            assert_eq!(r.path, "/metrics/topdog/api/chart/");
            serde_json::from_str(r.body.as_deref().unwrap()).unwrap()
        })
        .collect();
    assert_eq!(
        bodies,
        vec![json!({"timeframe": "1h"}), json!({"timeframe": "4h"}), json!({"timeframe": "1d"})]
    );

    let html = h.surface.html("#charts-container").unwrap();
    assert_eq!(html.matches(r#"<div class="chart-card">"#).count(), 1);
    assert_eq!(html.matches(r#"<div class="chart-card error-card">"#).count(), 2);
    assert!(html.contains(r#"<img src="/media/charts/1h.png""#));
    assert!(html.contains("<small>no data</small>"));
    assert!(html.contains("<small>offline</small>"));
    assert!(html.contains("<h3>TOPDOGINDEX - 1D</h3>"));

    assert_eq!(h.toasts.messages(Severity::Success), vec!["Charts loaded"]);
    assert!(h.toasts.messages(Severity::Error).is_empty());
    assert_eq!(
        h.surface.busy_log(),
        vec![("#loading-overlay".to_string(), true), ("#loading-overlay".to_string(), false)]
    );
    assert_eq!(page.controller().auto_refresh_period(&StreamKey::Charts), Some(secs(10)));
    assert_eq!(h.toasts.messages(Severity::Info), vec!["Charts auto refresh started (10s interval)"]);
}

#[test]
fn single_timeframe_selection() {
    let h = Harness::new();
    let page = ChartGalleryPage::new(&h.services(), config(json!({"autoRefresh": false})));
    h.client.respond(chart_ok("/media/charts/4h.png"));
    h.client.respond(chart_ok("/media/charts/15m.png"));

    page.select_timeframe("4h");
    h.settle();
    assert_eq!(page.selection(), TimeframeSelection::One("4h".into()));
    assert_eq!(h.client.request_count(), 1);
    assert!(h.surface.html("#charts-container").unwrap().contains(r#"<span class="chart-index">#2</span>"#));

    page.select_timeframe("15m");
    h.settle();
    assert!(h.surface.html("#charts-container").unwrap().contains(r#"<span class="chart-index">#0</span>"#));
    assert_eq!(h.runtime.active_timers(), 0);
}

#[test]
fn display_mode_switches_layout_classes() {
    let h = Harness::new();
    let page = ChartGalleryPage::new(&h.services(), config(json!({"autoRefresh": false})));

    page.set_display_mode("single");
    assert_eq!(page.display_mode(), DisplayMode::Single);
    assert!(h.surface.has_class("#charts-container", "charts-single"));
    assert!(!h.surface.has_class("#charts-container", "charts-grid"));
    assert!(h.surface.has_class(".chart-card", "chart-card-single"));
    assert!(h.surface.has_class(".chart-page", "single-mode"));

    page.set_display_mode("carousel");
    assert_eq!(page.display_mode(), DisplayMode::Grid);
    assert!(h.surface.has_class("#charts-container", "charts-grid"));
    assert!(!h.surface.has_class(".chart-page", "single-mode"));
}

#[test]
fn ticks_reload_the_current_selection() {
    let h = Harness::new();
    let page = ChartGalleryPage::new(&h.services(), config(json!({"defaultTimeframe": "1d"})));
    for _ in 0..3 {
        h.client.respond(chart_ok("/media/charts/1d.png"));
    }

    page.start();
    h.runtime.advance(secs(20));
    assert_eq!(h.client.request_count(), 3);

    page.set_auto_refresh(false);
    h.runtime.advance(secs(60));
    assert_eq!(h.client.request_count(), 3);
    page.shutdown();
}
