mod common;

use account_dashboard_wasm::application::pages::{AccountDetailPage, AccountInfo};
use account_dashboard_wasm::domain::{Severity, StreamKey, TransportError, ViewKey};
use common::{Harness, envelope};
use serde_json::json;

const TBODY: &str = "#positions-tbody";
const TRIGGER: &str = "#refresh-positions";

fn detail_page(h: &Harness) -> AccountDetailPage {
    AccountDetailPage::new(
        &h.services(),
        AccountInfo { exchange: "binance".into(), account_id: "main".into() },
    )
}

#[test]
fn success_renders_and_toasts() {
    let h = Harness::new();
    let page = detail_page(&h);
    h.client.respond(envelope(json!({
        "success": true,
        "positions": [{"symbol": "BTCUSDT", "side": "long", "quantity": "0.5", "entryPrice": 42000, "markPrice": 43000.5, "pnlUnrealized": 500.25, "leverage": 10}]
    })));

    page.refresh(ViewKey::Positions);
    h.settle();

    let html = h.surface.html(TBODY).expect("positions rendered");
    assert!(html.contains(r#"<td class="symbol-cell">BTCUSDT</td>"#));
    assert!(html.contains("0.5000"));
    assert!(html.contains(r#"<td class="leverage-cell">10x</td>"#));
    assert!(html.contains(r#"unrealized-pnl-cell profit"#));
    assert_eq!(h.toasts.messages(Severity::Success), vec!["Positions refreshed"]);
    assert!(page.controller().is_loaded(&StreamKey::Positions));
    assert_eq!(h.client.requests()[0].path, "/accounts/binance/main/api/positions/");
}

#[test]
fn empty_positions_render_one_no_data_row() {
    let h = Harness::new();
    let page = detail_page(&h);
    h.client.respond(envelope(json!({"success": true, "positions": []})));

    page.start();
    h.settle();

    let html = h.surface.html(TBODY).expect("tbody written");
    assert_eq!(html.matches("<tr>").count(), 1);
    insta::assert_snapshot!(html, @r#"<tr><td colspan="9" class="no-data">No positions</td></tr>"#);
}

#[test]
fn server_failure_leaves_table_untouched() {
    let h = Harness::new();
    let page = detail_page(&h);
    h.client.respond(envelope(json!({"success": true, "positions": []})));
    h.client.respond(envelope(json!({"success": false, "error": "API key expired"})));
    h.client.respond(envelope(json!({"success": false})));

    page.refresh(ViewKey::Positions);
    h.settle();
    let before = h.surface.html(TBODY);
    let writes = h.surface.html_writes();

    page.refresh(ViewKey::Positions);
    h.settle();
    page.refresh(ViewKey::Positions);
    h.settle();

    assert_eq!(h.surface.html(TBODY), before);
    assert_eq!(h.surface.html_writes(), writes);
    assert_eq!(
        h.toasts.messages(Severity::Error),
        vec!["Refresh failed: API key expired", "Refresh failed: Unknown error"]
    );
}

#[test]
fn transport_failure_clears_busy_state() {
    let h = Harness::new();
    let page = detail_page(&h);
    h.client.fail(TransportError::Status { status: 502, status_text: "Bad Gateway".into() });

    page.refresh(ViewKey::Positions);
    h.settle();

    assert_eq!(h.surface.busy_log(), vec![(TRIGGER.to_string(), true), (TRIGGER.to_string(), false)]);
    assert!(!h.surface.is_busy(TRIGGER));
    assert_eq!(h.toasts.messages(Severity::Error), vec!["Network error: HTTP 502 Bad Gateway"]);
    assert_eq!(h.surface.html(TBODY), None);
    assert!(!page.controller().is_loaded(&StreamKey::Positions));
}

#[test]
fn busy_while_request_is_pending() {
    let h = Harness::new();
    let page = detail_page(&h);
    let reply = h.client.defer();

    page.refresh(ViewKey::Positions);
    h.settle();
    assert!(h.surface.is_busy(TRIGGER));
    assert!(page.controller().is_in_flight(&StreamKey::Positions));

    reply.send(Ok(envelope(json!({"success": true, "positions": []})))).expect("receiver alive");
    h.settle();
    assert!(!h.surface.is_busy(TRIGGER));
    assert!(!page.controller().is_in_flight(&StreamKey::Positions));
}

#[test]
fn stale_response_is_never_applied() {
    let h = Harness::new();
    let page = detail_page(&h);
    let first = h.client.defer();
    let second = h.client.defer();

    page.refresh(ViewKey::Positions);
    page.refresh(ViewKey::Positions);
    h.settle();
    assert_eq!(h.client.request_count(), 2);

    second
        .send(Ok(envelope(json!({"success": true, "positions": [{"symbol": "NEW", "quantity": 1}]}))))
        .expect("receiver alive");
    h.settle();
    first
        .send(Ok(envelope(json!({"success": true, "positions": [{"symbol": "OLD", "quantity": 1}]}))))
        .expect("receiver alive");
    h.settle();

    let html = h.surface.html(TBODY).expect("rendered");
    assert!(html.contains("NEW"));
    assert!(!html.contains("OLD"));
    assert_eq!(h.toasts.messages(Severity::Success).len(), 1);
    assert!(!h.surface.is_busy(TRIGGER));
}

#[test]
fn busy_until_last_overlapping_request_settles() {
    let h = Harness::new();
    let page = detail_page(&h);
    let first = h.client.defer();
    let second = h.client.defer();

    page.refresh(ViewKey::Positions);
    page.refresh(ViewKey::Positions);
    h.settle();

    first.send(Ok(envelope(json!({"success": true, "positions": []})))).expect("receiver alive");
    h.settle();
    assert!(h.surface.is_busy(TRIGGER));
    assert!(page.controller().is_in_flight(&StreamKey::Positions));

    second.send(Ok(envelope(json!({"success": true, "positions": []})))).expect("receiver alive");
    h.settle();
    assert!(!h.surface.is_busy(TRIGGER));
    assert_eq!(
        h.surface.busy_log(),
        vec![(TRIGGER.to_string(), true), (TRIGGER.to_string(), true), (TRIGGER.to_string(), false)]
    );
}
