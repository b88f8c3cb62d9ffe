mod common;

use account_dashboard_wasm::application::pages::{TrendPage, TrendPageConfig};
use account_dashboard_wasm::domain::{Envelope, Severity, StreamKey, TransportError};
use common::{Harness, envelope, secs};
use serde_json::{Value, json};

const CONTENT: &str = ".chart-content";
const OVERLAY: &str = "#loading-overlay";

fn trend_page(h: &Harness) -> TrendPage {
    let config: TrendPageConfig =
        serde_json::from_value(json!({"indicatorId": "allcoin", "timeframes": ["5m", "1h"]})).unwrap();
    TrendPage::new(&h.services(), config)
}

fn requested_timeframes(h: &Harness) -> Vec<Value> {
    h.client
        .requests()
        .iter()
        .map(|r| {
            assert_eq!(r.path, "/metrics/allcoin/api/chart/");
            serde_json::from_str(r.body.as_deref().unwrap()).unwrap()
        })
        .collect()
}

#[test]
fn start_loads_five_minute_chart_and_arms_refresh() {
    let h = Harness::new();
    let page = trend_page(&h);
    h.client.respond(envelope(json!({"success": true, "image_path": "/media/trend/5m.png"})));

    page.start();
    h.settle();

    assert_eq!(page.timeframe(), "5m");
    assert_eq!(requested_timeframes(&h), vec![json!({"timeframe": "5m"})]);
    insta::assert_snapshot!(
        h.surface.html(CONTENT).unwrap(),
        @r#"<img id="chart-image" src="/media/trend/5m.png" alt="All-coin trend 5m" class="chart-image">"#
    );
    assert_eq!(h.surface.text("#chart-title").as_deref(), Some("All-coin trend - 5M"));
    assert!(h.surface.text("#last-update").is_some());
    assert_eq!(h.toasts.messages(Severity::Success), vec!["Chart loaded"]);
    assert_eq!(h.surface.busy_log(), vec![(OVERLAY.to_string(), true), (OVERLAY.to_string(), false)]);
    assert_eq!(page.controller().auto_refresh_period(&StreamKey::Trend), Some(secs(10)));
    assert_eq!(h.toasts.messages(Severity::Info), vec!["Chart auto refresh started (10s interval)"]);
}

#[test]
fn server_error_shows_error_block_and_toast() {
    let h = Harness::new();
    let page = trend_page(&h);
    h.client.respond(Envelope::failure("chart not ready"));

    page.refresh();
    h.settle();

    let html = h.surface.html(CONTENT).unwrap();
    assert!(html.starts_with(r#"<div class="error-message">"#));
    assert!(html.contains("<small>chart not ready</small>"));
    assert!(h.toasts.messages(Severity::Success).is_empty());
    assert_eq!(h.toasts.messages(Severity::Error), vec!["Refresh failed: chart not ready"]);
    assert_eq!(h.surface.text("#chart-title"), None);
    assert!(!h.surface.is_busy(OVERLAY));
}

#[test]
fn transport_error_shows_error_block_and_toast() {
    let h = Harness::new();
    let page = trend_page(&h);
    h.client.fail(TransportError::Status { status: 500, status_text: "Internal Server Error".into() });

    page.refresh();
    h.settle();

    assert!(h.surface.html(CONTENT).unwrap().contains("<small>HTTP 500 Internal Server Error</small>"));
    assert_eq!(h.toasts.messages(Severity::Error), vec!["Network error: HTTP 500 Internal Server Error"]);
    assert!(!page.controller().is_loaded(&StreamKey::Trend));
    assert!(!h.surface.is_busy(OVERLAY));
}

#[test]
fn chart_recovers_after_an_error() {
    let h = Harness::new();
    let page = trend_page(&h);
    h.client.respond(Envelope::failure("busy"));
    h.client.respond(envelope(json!({"success": true, "image_path": "/media/trend/5m.png"})));

    page.refresh();
    h.settle();
    page.refresh();
    h.settle();

    assert!(h.surface.html(CONTENT).unwrap().contains(r#"src="/media/trend/5m.png""#));
}

#[test]
fn timeframe_switch_requests_new_chart() {
    let h = Harness::new();
    let page = trend_page(&h);
    h.client.respond(envelope(json!({"success": true, "image_path": "/media/trend/1h.png"})));

    page.select_timeframe("1h");
    h.settle();
    page.select_timeframe("");

    assert_eq!(page.timeframe(), "1h");
    assert_eq!(requested_timeframes(&h), vec![json!({"timeframe": "1h"})]);
    assert_eq!(h.surface.text("#chart-title").as_deref(), Some("All-coin trend - 1H"));
}

#[test]
fn auto_refresh_ticks_until_stopped() {
    let h = Harness::new();
    let page = trend_page(&h);
    for _ in 0..3 {
        h.client.respond(envelope(json!({"success": true, "image_path": "/media/trend/5m.png"})));
    }

    page.start();
    h.settle();
    h.runtime.advance(secs(20));
    assert_eq!(h.client.request_count(), 3);

    page.set_auto_refresh(false);
    h.runtime.advance(secs(30));
    assert_eq!(h.client.request_count(), 3);
    assert_eq!(h.runtime.active_timers(), 0);
}
