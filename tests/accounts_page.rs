mod common;

use account_dashboard_wasm::application::pages::{AccountsPage, rendered_accounts};
use account_dashboard_wasm::application::render::account_row_selector;
use account_dashboard_wasm::domain::records::AccountRecord;
use account_dashboard_wasm::domain::{Severity, StreamKey};
use account_dashboard_wasm::infrastructure::memory::MemoryElement;
use common::{Harness, envelope, secs};
use serde_json::{Value, json};

fn accounts_json() -> Value {
    json!([
        {"exchange": "okx", "account_name": "Main", "account_id": "a1", "balance": 100.25, "status": "正常", "credentials_configured": true},
        {"exchange": "binance", "account_name": "Hedge", "account_id": 7, "balance": "50.25", "status": "连接错误"},
        {"exchange": "okx", "account_name": "Spare", "account_id": "a2", "balance": null, "status": "正常"}
    ])
}

fn initial_accounts() -> Vec<AccountRecord> {
    serde_json::from_value(accounts_json()).unwrap()
}

#[test]
fn start_summarises_server_rendered_rows() {
    let h = Harness::new();
    let page = AccountsPage::new(h.services(), initial_accounts());
    page.start();

    assert_eq!(h.surface.text("#total-accounts").as_deref(), Some("3"));
    assert_eq!(h.surface.text("#total-balance").as_deref(), Some("150.50 USDT"));
    assert_eq!(h.surface.text("#healthy-accounts").as_deref(), Some("2"));
}

#[test]
fn start_without_accounts_writes_nothing() {
    let h = Harness::new();
    let page = AccountsPage::new(h.services(), Vec::new());
    page.start();
    assert_eq!(h.surface.text("#total-accounts"), None);
}

#[test]
fn refresh_all_renders_rows_and_summary() {
    let h = Harness::new();
    let page = AccountsPage::new(h.services(), Vec::new());
    h.client.respond(envelope(json!({"success": true, "accounts": accounts_json()})));

    page.refresh_all();
    h.settle();

    let request = &h.client.requests()[0];
    assert_eq!(request.path, "/accounts/api/refresh/");
    assert_eq!(request.body, None);

    let html = h.surface.html("#accounts-tbody").unwrap();
    assert_eq!(html.matches("<tr class=\"account-row\"").count(), 3);
    assert!(html.contains(r#"data-account-id="7""#));
    assert_eq!(h.surface.text("#total-balance").as_deref(), Some("150.50 USDT"));
    assert_eq!(h.surface.busy_log(), vec![("#refresh-btn".to_string(), true), ("#refresh-btn".to_string(), false)]);
    assert_eq!(h.toasts.messages(Severity::Success), vec!["Accounts refreshed"]);
    assert_eq!(page.summary().accounts, 3);
}

#[test]
fn empty_refresh_shows_placeholder_row() {
    let h = Harness::new();
    let page = AccountsPage::new(h.services(), initial_accounts());
    h.client.respond(envelope(json!({"success": true, "accounts": []})));

    page.refresh_all();
    h.settle();

    let html = h.surface.html("#accounts-tbody").unwrap();
    assert!(html.contains(r#"class="no-data">No accounts<"#));
    assert_eq!(h.surface.text("#total-accounts").as_deref(), Some("0"));
}

#[test]
fn exchange_filter_hides_rows_and_recomputes_summary() {
    let h = Harness::new();
    let page = AccountsPage::new(h.services(), initial_accounts());

    page.filter_by_exchange("binance");
    assert!(h.surface.has_class(&account_row_selector("okx", "a1"), "hidden"));
    assert!(!h.surface.has_class(&account_row_selector("binance", "7"), "hidden"));
    assert_eq!(h.surface.text("#total-accounts").as_deref(), Some("1"));
    assert_eq!(h.surface.text("#total-balance").as_deref(), Some("50.25 USDT"));
    assert_eq!(h.surface.text("#healthy-accounts").as_deref(), Some("0"));

    // re-rendered rows keep the filter
    h.client.respond(envelope(json!({"success": true, "accounts": accounts_json()})));
    page.refresh_all();
    h.settle();
    let html = h.surface.html("#accounts-tbody").unwrap();
    assert_eq!(html.matches("account-row hidden").count(), 2);

    page.filter_by_exchange("");
    assert!(!h.surface.has_class(&account_row_selector("okx", "a1"), "hidden"));
    assert_eq!(page.summary().accounts, 3);
}

#[test]
fn single_balance_refresh_updates_one_row() {
    let h = Harness::new();
    let page = AccountsPage::new(h.services(), initial_accounts());
    h.client.respond(envelope(json!({"success": true, "balance": "99.1"})));

    page.refresh_single("okx", "a1");
    h.settle();

    let request = &h.client.requests()[0];
    assert_eq!(request.path, "/accounts/api/balance/");
    let body: Value = serde_json::from_str(request.body.as_deref().unwrap()).unwrap();
    assert_eq!(body, json!({"exchange": "okx", "account_id": "a1"}));

    let row = account_row_selector("okx", "a1");
    let cell = format!("{row} .balance-value");
    assert_eq!(h.surface.text(&cell).as_deref(), Some("99.10"));
    assert_eq!(h.surface.attribute(&cell, "data-balance").as_deref(), Some("99.1"));
    assert_eq!(h.surface.text("#total-balance").as_deref(), Some("149.35 USDT"));

    let trigger = format!("{row} .refresh-single");
    assert_eq!(h.surface.busy_log(), vec![(trigger.clone(), true), (trigger, false)]);
    assert_eq!(h.toasts.messages(Severity::Success), vec!["OKX account a1 balance refreshed"]);
    assert!(page.controller().is_registered(&page.balance_stream("okx", "a1")));
}

#[test]
fn balance_without_value_is_an_error() {
    let h = Harness::new();
    let page = AccountsPage::new(h.services(), initial_accounts());
    h.client.respond(envelope(json!({"success": true})));

    page.refresh_single("okx", "a2");
    h.settle();

    let errors = h.toasts.messages(Severity::Error);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].starts_with("Unexpected payload"));
    assert_eq!(h.surface.text("#total-balance"), None);
}

#[test]
fn auto_refresh_every_thirty_seconds() {
    let h = Harness::new();
    let page = AccountsPage::new(h.services(), Vec::new());
    h.client.respond(envelope(json!({"success": true, "accounts": []})));

    page.set_auto_refresh(true);
    assert_eq!(page.controller().auto_refresh_period(&StreamKey::Accounts), Some(secs(30)));
    h.runtime.advance(secs(29));
    assert_eq!(h.client.request_count(), 0);
    h.runtime.advance(secs(1));
    assert_eq!(h.client.request_count(), 1);

    page.set_auto_refresh(false);
    assert_eq!(
        h.toasts.messages(Severity::Info),
        vec!["Accounts auto refresh started (30s interval)", "Accounts auto refresh stopped"]
    );
}

fn rendered_row(exchange: &str, account_id: &str, balance: &str, status: &str) -> MemoryElement {
    MemoryElement::new()
        .with_attribute("data-exchange", exchange)
        .with_attribute("data-account-id", account_id)
        .with_child(".account-name", MemoryElement::new().with_text(" Main "))
        .with_child(".balance-value", MemoryElement::new().with_attribute("data-balance", balance))
        .with_child(".status-badge", MemoryElement::new().with_text(status))
        .with_child(".config-badge", MemoryElement::new().with_attribute("class", "config-badge config-ok"))
}

fn render_server_rows(h: &Harness) {
    h.surface.insert_elements(
        "tr.account-row",
        vec![
            rendered_row("okx", "a1", "100.25", " 正常 "),
            rendered_row("binance", "7", "50.25", "连接错误"),
            rendered_row("okx", "a2", "", "正常"),
        ],
    );
}

#[test]
fn rendered_rows_become_account_records() {
    let h = Harness::new();
    render_server_rows(&h);

    let accounts = rendered_accounts(h.surface.as_ref()).unwrap();
    assert_eq!(accounts.len(), 3);
    assert_eq!(accounts[0].id(), "a1");
    assert_eq!(accounts[0].account_name, "Main");
    assert_eq!(accounts[0].status, "正常");
    assert!(accounts[0].credentials_configured);
    assert_eq!(accounts[2].balance, None);
}

#[test]
fn page_without_initial_list_works_on_rendered_rows() {
    let h = Harness::new();
    render_server_rows(&h);
    let page = AccountsPage::new(h.services(), Vec::new());
    page.start();
    assert_eq!(h.surface.text("#total-balance").as_deref(), Some("150.50 USDT"));

    page.filter_by_exchange("okx");
    assert!(h.surface.has_class(&account_row_selector("binance", "7"), "hidden"));
    assert!(!h.surface.has_class(&account_row_selector("okx", "a1"), "hidden"));
    assert_eq!(h.surface.text("#total-accounts").as_deref(), Some("2"));
    assert_eq!(h.surface.text("#total-balance").as_deref(), Some("100.25 USDT"));
    assert_eq!(h.surface.text("#healthy-accounts").as_deref(), Some("2"));

    h.client.respond(envelope(json!({"success": true, "balance": 123.4})));
    page.refresh_single("okx", "a1");
    h.settle();
    assert_eq!(h.surface.text("#total-balance").as_deref(), Some("123.40 USDT"));
}

#[test]
fn balance_of_unknown_row_keeps_summary() {
    let h = Harness::new();
    let page = AccountsPage::new(h.services(), initial_accounts());
    page.start();
    h.client.respond(envelope(json!({"success": true, "balance": 999})));

    page.refresh_single("okx", "ghost");
    h.settle();

    let cell = format!("{} .balance-value", account_row_selector("okx", "ghost"));
    assert_eq!(h.surface.text(&cell).as_deref(), Some("999.00"));
    assert_eq!(h.surface.text("#total-balance").as_deref(), Some("150.50 USDT"));
    assert_eq!(page.summary().accounts, 3);
}
