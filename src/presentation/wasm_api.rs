//! JavaScript entry points. Each `mount*` function builds a page controller
//! on the live document, wires the template's controls and returns a handle
//! the page script keeps until it calls `dispose()`.

use std::rc::Rc;

use gloo::events::EventListener;
use gloo::utils::format::JsValueSerdeExt;
use serde::de::DeserializeOwned;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use web_sys::{Document, Element, Event, HtmlInputElement, HtmlSelectElement};

use crate::application::pages::{
    AccountDetailPage, AccountInfo, AccountsPage, ChartGalleryPage, ChartPageConfig, PageServices,
    TrendPage, TrendPageConfig,
};
use crate::domain::logging::LogComponent;
use crate::domain::records::AccountRecord;
use crate::domain::{AppError, ViewKey};
use crate::infrastructure::{BrowserRuntime, DomSurface, GlooApiClient};
use crate::presentation::toasts::LeptosNotificationSurface;
use crate::{log_info, log_warn};

const REFRESH_BUTTON: &str = "#refresh-btn";
const AUTO_REFRESH_CHECKBOX: &str = "#auto-refresh-checkbox";
const EXCHANGE_SELECT: &str = "#exchange-select";
const TIMEFRAME_SELECT: &str = "#timeframe-select";
const DISPLAY_MODE_SELECT: &str = "#display-mode-select";

fn to_js(err: AppError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

fn parse_config<T: DeserializeOwned>(value: &JsValue, what: &str) -> Result<T, JsValue> {
    value
        .into_serde::<T>()
        .map_err(|e| to_js(AppError::Config(format!("{what}: {e}"))))
}

fn browser_services() -> Result<(PageServices, Document), JsValue> {
    let surface = DomSurface::from_window().map_err(to_js)?;
    let document = surface.document().clone();
    let services = PageServices {
        client: Rc::new(GlooApiClient::default()),
        surface: Rc::new(surface),
        notifications: Rc::new(LeptosNotificationSurface::mount()),
        runtime: Rc::new(BrowserRuntime),
    };
    Ok((services, document))
}

/// Listener on the first element matching `selector`, if the template has one.
fn listen(
    document: &Document,
    selector: &str,
    event: &'static str,
    handler: impl FnMut(&Event) + 'static,
) -> Option<EventListener> {
    let element = document.query_selector(selector).ok().flatten();
    if element.is_none() {
        log_warn!(LogComponent::Presentation("Bindings"), "{} not found, {} not bound", selector, event);
    }
    element.map(|element| EventListener::new(&element, event, handler))
}

fn checkbox_state(event: &Event) -> Option<bool> {
    event.target()?.dyn_into::<HtmlInputElement>().ok().map(|input| input.checked())
}

fn select_value(event: &Event) -> Option<String> {
    event.target()?.dyn_into::<HtmlSelectElement>().ok().map(|select| select.value())
}

/// Closest ancestor (or self) of the event target matching `selector`.
fn closest(event: &Event, selector: &str) -> Option<Element> {
    event.target()?.dyn_into::<Element>().ok()?.closest(selector).ok().flatten()
}

fn on_pagehide(shutdown: impl Fn() + 'static) -> Option<EventListener> {
    web_sys::window().map(|window| EventListener::once(&window, "pagehide", move |_| shutdown()))
}

/// Accounts overview bound to the page.
#[wasm_bindgen]
pub struct AccountsHandle {
    page: Rc<AccountsPage>,
    listeners: Vec<EventListener>,
}

#[wasm_bindgen]
impl AccountsHandle {
    #[wasm_bindgen(js_name = refreshAll)]
    pub fn refresh_all(&self) {
        self.page.refresh_all();
    }

    #[wasm_bindgen(js_name = refreshSingle)]
    pub fn refresh_single(&self, exchange: String, account_id: String) {
        self.page.refresh_single(&exchange, &account_id);
    }

    #[wasm_bindgen(js_name = filterByExchange)]
    pub fn filter_by_exchange(&self, exchange: String) {
        self.page.filter_by_exchange(&exchange);
    }

    #[wasm_bindgen(js_name = setAutoRefresh)]
    pub fn set_auto_refresh(&self, enabled: bool) {
        self.page.set_auto_refresh(enabled);
    }

    pub fn dispose(&mut self) {
        self.listeners.clear();
        self.page.shutdown();
    }
}

/// Mounts the accounts overview. `initial` is the server-rendered account
/// list; when `undefined` the rows already in the table are read instead.
#[wasm_bindgen(js_name = mountAccountsPage)]
pub fn mount_accounts_page(initial: JsValue) -> Result<AccountsHandle, JsValue> {
    let accounts: Vec<AccountRecord> = if initial.is_undefined() || initial.is_null() {
        Vec::new()
    } else {
        parse_config(&initial, "accounts")?
    };
    let (services, document) = browser_services()?;
    let page = Rc::new(AccountsPage::new(services, accounts));
    page.start();

    let mut listeners = Vec::new();
    let p = Rc::clone(&page);
    listeners.extend(listen(&document, REFRESH_BUTTON, "click", move |_| p.refresh_all()));
    let p = Rc::clone(&page);
    listeners.extend(listen(&document, AUTO_REFRESH_CHECKBOX, "change", move |event| {
        if let Some(checked) = checkbox_state(event) {
            p.set_auto_refresh(checked);
        }
    }));
    let p = Rc::clone(&page);
    listeners.extend(listen(&document, EXCHANGE_SELECT, "change", move |event| {
        if let Some(exchange) = select_value(event) {
            p.filter_by_exchange(&exchange);
        }
    }));
    // Rows are re-rendered on refresh, so per-row buttons are delegated.
    let p = Rc::clone(&page);
    listeners.push(EventListener::new(&document, "click", move |event| {
        let Some(button) = closest(event, ".refresh-single") else {
            return;
        };
        match (button.get_attribute("data-exchange"), button.get_attribute("data-account-id")) {
            (Some(exchange), Some(account_id)) => p.refresh_single(&exchange, &account_id),
            _ => {
                log_warn!(LogComponent::Presentation("Accounts"), "refresh button without account data");
            }
        }
    }));
    let p = Rc::clone(&page);
    listeners.extend(on_pagehide(move || p.shutdown()));

    log_info!(LogComponent::Presentation("Accounts"), "accounts page mounted");
    Ok(AccountsHandle { page, listeners })
}

/// Account detail (positions / orders) bound to the page.
#[wasm_bindgen]
pub struct AccountDetailHandle {
    page: Rc<AccountDetailPage>,
    listeners: Vec<EventListener>,
}

fn parse_view(raw: &str) -> Option<ViewKey> {
    let view = raw.parse().ok();
    if view.is_none() {
        log_warn!(LogComponent::Presentation("AccountDetail"), "unknown view {}", raw);
    }
    view
}

#[wasm_bindgen]
impl AccountDetailHandle {
    /// `positions` or `orders`.
    pub fn refresh(&self, view: String) {
        if let Some(view) = parse_view(&view) {
            self.page.refresh(view);
        }
    }

    #[wasm_bindgen(js_name = switchView)]
    pub fn switch_view(&self, view: String) {
        if let Some(view) = parse_view(&view) {
            self.page.switch_view(view);
        }
    }

    #[wasm_bindgen(js_name = setAutoRefresh)]
    pub fn set_auto_refresh(&self, view: String, enabled: bool) {
        if let Some(view) = parse_view(&view) {
            self.page.set_auto_refresh(view, enabled);
        }
    }

    pub fn dispose(&mut self) {
        self.listeners.clear();
        self.page.shutdown();
    }
}

/// Mounts the account detail page for `window.accountInfo`.
#[wasm_bindgen(js_name = mountAccountDetailPage)]
pub fn mount_account_detail_page(account_info: JsValue) -> Result<AccountDetailHandle, JsValue> {
    let account: AccountInfo = parse_config(&account_info, "accountInfo")?;
    let (services, document) = browser_services()?;
    let page = Rc::new(AccountDetailPage::new(&services, account));
    page.start();

    let mut listeners = Vec::new();
    for view in ViewKey::ALL {
        let p = Rc::clone(&page);
        listeners.extend(listen(&document, &format!("#refresh-{view}"), "click", move |_| p.refresh(view)));
        let p = Rc::clone(&page);
        listeners.extend(listen(&document, &format!("#auto-refresh-{view}"), "change", move |event| {
            if let Some(checked) = checkbox_state(event) {
                p.set_auto_refresh(view, checked);
            }
        }));
    }
    let p = Rc::clone(&page);
    listeners.push(EventListener::new(&document, "click", move |event| {
        let view = closest(event, ".tab-btn")
            .and_then(|tab| tab.get_attribute("data-tab"))
            .and_then(|raw| parse_view(&raw));
        if let Some(view) = view {
            p.switch_view(view);
        }
    }));
    let p = Rc::clone(&page);
    listeners.extend(on_pagehide(move || p.shutdown()));

    log_info!(LogComponent::Presentation("AccountDetail"), "account detail page mounted");
    Ok(AccountDetailHandle { page, listeners })
}

/// Indicator chart gallery bound to the page.
#[wasm_bindgen]
pub struct ChartPageHandle {
    page: Rc<ChartGalleryPage>,
    listeners: Vec<EventListener>,
}

#[wasm_bindgen]
impl ChartPageHandle {
    pub fn refresh(&self) {
        self.page.refresh();
    }

    #[wasm_bindgen(js_name = selectTimeframe)]
    pub fn select_timeframe(&self, timeframe: String) {
        self.page.select_timeframe(&timeframe);
    }

    #[wasm_bindgen(js_name = setDisplayMode)]
    pub fn set_display_mode(&self, mode: String) {
        self.page.set_display_mode(&mode);
    }

    #[wasm_bindgen(js_name = setAutoRefresh)]
    pub fn set_auto_refresh(&self, enabled: bool) {
        self.page.set_auto_refresh(enabled);
    }

    pub fn dispose(&mut self) {
        self.listeners.clear();
        self.page.shutdown();
    }
}

/// Mounts a chart gallery from `window.chartPageConfig`.
#[wasm_bindgen(js_name = mountChartPage)]
pub fn mount_chart_page(config: JsValue) -> Result<ChartPageHandle, JsValue> {
    let config: ChartPageConfig = parse_config(&config, "chartPageConfig")?;
    let (services, document) = browser_services()?;
    let page = Rc::new(ChartGalleryPage::new(&services, config));
    page.start();

    let mut listeners = Vec::new();
    let p = Rc::clone(&page);
    listeners.extend(listen(&document, REFRESH_BUTTON, "click", move |_| p.refresh()));
    let p = Rc::clone(&page);
    listeners.extend(listen(&document, AUTO_REFRESH_CHECKBOX, "change", move |event| {
        if let Some(checked) = checkbox_state(event) {
            p.set_auto_refresh(checked);
        }
    }));
    let p = Rc::clone(&page);
    listeners.extend(listen(&document, TIMEFRAME_SELECT, "change", move |event| {
        if let Some(timeframe) = select_value(event) {
            p.select_timeframe(&timeframe);
        }
    }));
    let p = Rc::clone(&page);
    listeners.extend(listen(&document, DISPLAY_MODE_SELECT, "change", move |event| {
        if let Some(mode) = select_value(event) {
            p.set_display_mode(&mode);
        }
    }));
    let p = Rc::clone(&page);
    listeners.extend(on_pagehide(move || p.shutdown()));

    log_info!(LogComponent::Presentation("Charts"), "chart page mounted");
    Ok(ChartPageHandle { page, listeners })
}

/// All-coin trend chart bound to the page.
#[wasm_bindgen]
pub struct TrendPageHandle {
    page: Rc<TrendPage>,
    listeners: Vec<EventListener>,
}

#[wasm_bindgen]
impl TrendPageHandle {
    pub fn refresh(&self) {
        self.page.refresh();
    }

    #[wasm_bindgen(js_name = selectTimeframe)]
    pub fn select_timeframe(&self, timeframe: String) {
        self.page.select_timeframe(&timeframe);
    }

    #[wasm_bindgen(js_name = setAutoRefresh)]
    pub fn set_auto_refresh(&self, enabled: bool) {
        self.page.set_auto_refresh(enabled);
    }

    pub fn dispose(&mut self) {
        self.listeners.clear();
        self.page.shutdown();
    }
}

/// Mounts the trend chart from `window.allcoinTrendConfig`.
#[wasm_bindgen(js_name = mountTrendPage)]
pub fn mount_trend_page(config: JsValue) -> Result<TrendPageHandle, JsValue> {
    let config: TrendPageConfig = parse_config(&config, "allcoinTrendConfig")?;
    let (services, document) = browser_services()?;
    let page = Rc::new(TrendPage::new(&services, config));
    page.start();

    let mut listeners = Vec::new();
    let p = Rc::clone(&page);
    listeners.extend(listen(&document, REFRESH_BUTTON, "click", move |_| p.refresh()));
    let p = Rc::clone(&page);
    listeners.extend(listen(&document, AUTO_REFRESH_CHECKBOX, "change", move |event| {
        if let Some(checked) = checkbox_state(event) {
            p.set_auto_refresh(checked);
        }
    }));
    let p = Rc::clone(&page);
    listeners.extend(listen(&document, TIMEFRAME_SELECT, "change", move |event| {
        if let Some(timeframe) = select_value(event) {
            p.select_timeframe(&timeframe);
        }
    }));
    let p = Rc::clone(&page);
    listeners.extend(on_pagehide(move || p.shutdown()));

    log_info!(LogComponent::Presentation("Trend"), "trend page mounted");
    Ok(TrendPageHandle { page, listeners })
}
