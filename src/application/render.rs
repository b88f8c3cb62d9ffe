//! HTML fragments for the dashboard tables and chart cards.
//!
//! Pure string builders; the page views push them into the surface.

use std::fmt::Write;

use crate::domain::logging::get_time_provider;
use crate::domain::records::{
    AccountRecord, ChartSlot, Order, Position, order_side_label, order_status_label,
    order_type_label, position_side_label,
};

pub const POSITION_COLUMNS: usize = 9;
pub const ORDER_COLUMNS: usize = 9;
pub const ACCOUNT_COLUMNS: usize = 7;

/// Escapes text for element content and double-quoted attributes.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escapes a value for a double-quoted CSS attribute selector.
pub fn escape_selector_value(raw: &str) -> String {
    raw.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Fixed-point number, `N/A` for a missing or non-finite value.
pub fn format_number(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*}", decimals, v),
        _ => "N/A".to_string(),
    }
}

/// Millisecond timestamps go through the time provider, anything else is shown as is.
pub fn format_order_time(raw: Option<&str>) -> String {
    match raw {
        None => "N/A".to_string(),
        Some(text) => match text.trim().parse::<u64>() {
            Ok(ms) => get_time_provider().format_datetime(ms),
            Err(_) => escape_html(text),
        },
    }
}

pub fn no_data_row(columns: usize, message: &str) -> String {
    format!(r#"<tr><td colspan="{columns}" class="no-data">{}</td></tr>"#, escape_html(message))
}

fn pnl_class(value: f64) -> &'static str {
    if value >= 0.0 { "profit" } else { "loss" }
}

pub fn position_row(position: &Position) -> String {
    let symbol = escape_html(position.symbol.as_deref().unwrap_or("N/A"));
    let side = position.side_or_flat();
    let open = position.is_open();
    let unrealized = position.pnl_unrealized.unwrap_or(0.0);
    let realized = position.pnl_realized.unwrap_or(0.0);
    let entry = if open { format_number(Some(position.entry_price.unwrap_or(0.0)), 4) } else { "N/A".into() };
    let liquidation = if open { format_number(position.liquidation_price, 4) } else { "N/A".into() };

    let mut row = String::from("<tr>");
    let _ = write!(row, r#"<td class="symbol-cell">{symbol}</td>"#);
    let _ = write!(
        row,
        r#"<td class="side-cell"><span class="side-badge side-{}">{}</span></td>"#,
        escape_html(side),
        escape_html(&position_side_label(side))
    );
    let _ = write!(
        row,
        r#"<td class="quantity-cell">{}</td>"#,
        format_number(Some(position.quantity.unwrap_or(0.0)), 4)
    );
    let _ = write!(row, r#"<td class="entry-price-cell">{entry}</td>"#);
    let _ = write!(
        row,
        r#"<td class="mark-price-cell">{}</td>"#,
        format_number(Some(position.mark_price.unwrap_or(0.0)), 4)
    );
    let _ = write!(
        row,
        r#"<td class="unrealized-pnl-cell {}">{}</td>"#,
        pnl_class(unrealized),
        format_number(Some(unrealized), 4)
    );
    let _ = write!(
        row,
        r#"<td class="realized-pnl-cell {}">{}</td>"#,
        pnl_class(realized),
        format_number(Some(realized), 4)
    );
    let _ = write!(row, r#"<td class="leverage-cell">{}x</td>"#, position.leverage_or_one());
    let _ = write!(row, r#"<td class="liquidation-price-cell">{liquidation}</td>"#);
    row.push_str("</tr>");
    row
}

pub fn positions_body(positions: &[Position]) -> String {
    if positions.is_empty() {
        return no_data_row(POSITION_COLUMNS, "No positions");
    }
    positions.iter().map(position_row).collect()
}

pub fn order_row(order: &Order) -> String {
    let order_id = escape_html(order.order_id.as_deref().unwrap_or("N/A"));
    let symbol = escape_html(order.symbol.as_deref().unwrap_or("N/A"));
    let order_type = order.order_type.as_deref().unwrap_or("N/A");
    let side = order.side.as_deref().unwrap_or("N/A");
    let status = order.status.as_deref().unwrap_or("N/A");

    let mut row = String::from("<tr>");
    let _ = write!(row, r#"<td class="order-id-cell">{order_id}</td>"#);
    let _ = write!(row, r#"<td class="symbol-cell">{symbol}</td>"#);
    let _ = write!(
        row,
        r#"<td class="order-type-cell">{}</td>"#,
        escape_html(&order_type_label(order_type))
    );
    let _ = write!(
        row,
        r#"<td class="side-cell"><span class="side-badge side-{}">{}</span></td>"#,
        escape_html(side),
        escape_html(&order_side_label(side))
    );
    let _ = write!(
        row,
        r#"<td class="quantity-cell">{}</td>"#,
        format_number(Some(order.quantity.unwrap_or(0.0)), 4)
    );
    let _ = write!(
        row,
        r#"<td class="price-cell">{}</td>"#,
        format_number(Some(order.price.unwrap_or(0.0)), 4)
    );
    let _ = write!(
        row,
        r#"<td class="status-cell"><span class="status-badge status-{}">{}</span></td>"#,
        escape_html(&status.to_lowercase()),
        escape_html(&order_status_label(status))
    );
    let _ = write!(
        row,
        r#"<td class="create-time-cell">{}</td>"#,
        format_order_time(order.created_at.as_deref())
    );
    let _ = write!(
        row,
        r#"<td class="actions-cell"><button class="btn btn-small btn-danger cancel-order" data-order-id="{order_id}">Cancel</button></td>"#
    );
    row.push_str("</tr>");
    row
}

pub fn orders_body(orders: &[Order]) -> String {
    if orders.is_empty() {
        return no_data_row(ORDER_COLUMNS, "No open orders");
    }
    orders.iter().map(order_row).collect()
}

pub fn account_row_selector(exchange: &str, account_id: &str) -> String {
    format!(
        r#"tr.account-row[data-exchange="{}"][data-account-id="{}"]"#,
        escape_selector_value(exchange),
        escape_selector_value(account_id)
    )
}

pub fn account_row(account: &AccountRecord, hidden: bool) -> String {
    let exchange = escape_html(&account.exchange);
    let account_id = escape_html(account.id());
    let (config_class, config_label) = if account.credentials_configured {
        ("ok", "✓ Configured")
    } else {
        ("error", "✗ Not configured")
    };

    let mut row = format!(
        r#"<tr class="account-row{}" data-exchange="{exchange}" data-account-id="{account_id}">"#,
        if hidden { " hidden" } else { "" }
    );
    let _ = write!(
        row,
        r#"<td class="exchange-cell"><span class="exchange-badge exchange-{exchange}">{}</span></td>"#,
        escape_html(&account.exchange.to_uppercase())
    );
    let _ = write!(row, r#"<td class="account-name">{}</td>"#, escape_html(&account.account_name));
    let _ = write!(row, r#"<td class="account-id">{account_id}</td>"#);
    let _ = write!(
        row,
        r#"<td class="balance-cell"><span class="balance-value" data-balance="{}">{:.2}</span></td>"#,
        account.balance_or_zero(),
        account.balance_or_zero()
    );
    let _ = write!(
        row,
        r#"<td class="status-cell"><span class="status-badge status-{}">{}</span></td>"#,
        account.health().as_ref(),
        escape_html(&account.status)
    );
    let _ = write!(
        row,
        r#"<td class="config-cell"><span class="config-badge config-{config_class}">{config_label}</span></td>"#
    );
    let _ = write!(
        row,
        r#"<td class="actions-cell"><button class="btn btn-small refresh-single" data-exchange="{exchange}" data-account-id="{account_id}">Refresh</button></td>"#
    );
    row.push_str("</tr>");
    row
}

pub fn error_block(message: &str) -> String {
    format!(
        r#"<div class="error-message"><div class="error-icon">⚠️</div><p>Load failed</p><small>{}</small></div>"#,
        escape_html(message)
    )
}

/// Image of the single-chart trend page.
pub fn trend_image(path: &str, timeframe: &str) -> String {
    format!(
        r#"<img id="chart-image" src="{}" alt="All-coin trend {}" class="chart-image">"#,
        escape_html(path),
        escape_html(timeframe)
    )
}

pub fn chart_card(title: &str, slot: &ChartSlot, rendered_at: &str) -> String {
    let timeframe = escape_html(&slot.timeframe.to_uppercase());
    let title = escape_html(title);
    let (class, content) = match (&slot.image_path, &slot.error) {
        (Some(path), None) => (
            "chart-card",
            format!(
                r#"<img src="{}" alt="{title} {}" class="chart-image">"#,
                escape_html(path),
                escape_html(&slot.timeframe)
            ),
        ),
        (_, error) => (
            "chart-card error-card",
            error_block(error.as_deref().unwrap_or("Unknown error")),
        ),
    };

    format!(
        concat!(
            r#"<div class="{class}">"#,
            r#"<div class="chart-header"><h3>{title} - {tf}</h3><span class="chart-index">#{index}</span></div>"#,
            r#"<div class="chart-content">{content}</div>"#,
            r#"<div class="chart-footer"><span class="chart-timeframe">{tf}</span><span class="chart-timestamp">{at}</span></div>"#,
            "</div>"
        ),
        class = class,
        title = title,
        tf = timeframe,
        index = slot.index,
        content = content,
        at = escape_html(rendered_at),
    )
}
