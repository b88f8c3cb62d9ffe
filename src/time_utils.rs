use js_sys::Date;
use wasm_bindgen::JsValue;

fn local_date(timestamp: u64) -> Date {
    Date::new(&JsValue::from_f64(timestamp as f64))
}

/// `HH:MM:SS` in the browser's local time zone.
pub fn format_clock(timestamp: u64) -> String {
    let date = local_date(timestamp);
    format!("{:02}:{:02}:{:02}", date.get_hours(), date.get_minutes(), date.get_seconds())
}

/// `YYYY/M/D HH:MM:SS` in local time, day and month unpadded.
pub fn format_datetime(timestamp: u64) -> String {
    let date = local_date(timestamp);
    format!(
        "{}/{}/{} {}",
        date.get_full_year(),
        date.get_month() + 1,
        date.get_date(),
        format_clock(timestamp)
    )
}
