use account_dashboard_wasm::application::render::{
    escape_html, format_number, no_data_row, position_row, positions_body,
};
use account_dashboard_wasm::domain::records::Position;
use quickcheck_macros::quickcheck;
use serde_json::json;

#[quickcheck]
fn escaped_text_has_no_markup(raw: String) -> bool {
    let escaped = escape_html(&raw);
    !escaped.contains('<') && !escaped.contains('>') && !escaped.contains('"')
}

#[quickcheck]
fn finite_numbers_keep_requested_decimals(value: f64, decimals: u8) -> bool {
    let decimals = usize::from(decimals % 9);
    let text = format_number(Some(value), decimals);
    if !value.is_finite() {
        return text == "N/A";
    }
    match text.split_once('.') {
        Some((_, fraction)) => fraction.len() == decimals,
        None => decimals == 0,
    }
}

#[test]
fn flat_position_hides_prices() {
    let position: Position = serde_json::from_value(json!({
        "symbol": "SOLUSDT",
        "quantity": 0.00005,
        "entryPrice": 150,
        "liquidationPrice": 120,
        "pnlRealized": -3.5,
        "leverage": 0
    }))
    .unwrap();

    let row = position_row(&position);
    assert!(row.contains(r#"<td class="entry-price-cell">N/A</td>"#));
    assert!(row.contains(r#"<td class="liquidation-price-cell">N/A</td>"#));
    assert!(row.contains(r#"<span class="side-badge side-flat">Flat</span>"#));
    assert!(row.contains(r#"<td class="realized-pnl-cell loss">-3.5000</td>"#));
    assert!(row.contains(r#"<td class="leverage-cell">1x</td>"#));
    assert!(!row.contains('\n'));
}

#[test]
fn placeholder_row_spans_all_columns() {
    insta::assert_snapshot!(
        no_data_row(7, "No <accounts>"),
        @r#"<tr><td colspan="7" class="no-data">No &lt;accounts&gt;</td></tr>"#
    );
    assert_eq!(positions_body(&[]), no_data_row(9, "No positions"));
}
