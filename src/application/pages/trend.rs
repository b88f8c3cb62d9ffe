use std::cell::RefCell;
use std::rc::Rc;

use serde::Deserialize;

use crate::application::pages::PageServices;
use crate::application::pages::charts::LOADING_OVERLAY;
use crate::application::polling::{EndpointFetcher, PollingController, StreamBinding, StreamView};
use crate::application::ports::{ApiClient, BusyIndicator, Surface};
use crate::application::render::{error_block, trend_image};
use crate::domain::logging::get_time_provider;
use crate::domain::stream::CHART_REFRESH_PERIOD;
use crate::domain::{AppError, AppResult, Endpoint, Envelope, StreamKey};

pub const TREND_CONTENT: &str = ".chart-content";
pub const TREND_TITLE: &str = "#chart-title";
pub const LAST_UPDATE: &str = "#last-update";

fn default_timeframe() -> String {
    "5m".to_string()
}

/// `window.allcoinTrendConfig` of the all-coin trend template.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendPageConfig {
    pub indicator_id: String,
    #[serde(default)]
    pub timeframes: Vec<String>,
    #[serde(default = "default_timeframe")]
    pub default_timeframe: String,
}

struct TrendView {
    surface: Rc<dyn Surface>,
    timeframe: String,
}

impl StreamView for TrendView {
    fn render(&self, envelope: &Envelope) -> AppResult<()> {
        let path: String = envelope.field("image_path")?;
        let clock = get_time_provider();

        self.surface.set_html(TREND_CONTENT, &trend_image(&path, &self.timeframe))?;
        self.surface
            .set_text(TREND_TITLE, &format!("All-coin trend - {}", self.timeframe.to_uppercase()))?;
        self.surface.set_text(LAST_UPDATE, &clock.format_clock(clock.current_timestamp()))
    }

    fn render_failure(&self, error: &AppError) -> AppResult<()> {
        self.surface.set_html(TREND_CONTENT, &error_block(&error.detail()))
    }
}

/// One indicator chart whose timeframe is picked from a select box.
pub struct TrendPage {
    client: Rc<dyn ApiClient>,
    surface: Rc<dyn Surface>,
    controller: Rc<PollingController>,
    indicator_id: String,
    timeframe: RefCell<String>,
}

impl TrendPage {
    pub fn new(services: &PageServices, config: TrendPageConfig) -> Self {
        let page = Self {
            client: Rc::clone(&services.client),
            surface: Rc::clone(&services.surface),
            controller: services.controller(),
            indicator_id: config.indicator_id,
            timeframe: RefCell::new(config.default_timeframe),
        };
        page.bind();
        page
    }

    /// (Re)binds the stream to the current timeframe.
    fn bind(&self) {
        let timeframe = self.timeframe.borrow().clone();
        self.controller.register(
            StreamKey::Trend,
            StreamBinding {
                label: "Chart".into(),
                fetcher: Rc::new(EndpointFetcher::new(
                    Rc::clone(&self.client),
                    Endpoint::Chart { indicator_id: self.indicator_id.clone(), timeframe: timeframe.clone() },
                )),
                view: Rc::new(TrendView { surface: Rc::clone(&self.surface), timeframe }),
                busy: BusyIndicator::Overlay { overlay: LOADING_OVERLAY.into() },
                success_message: "Chart loaded".into(),
            },
        );
    }

    /// Loads the chart and arms the auto refresh.
    pub fn start(&self) {
        self.refresh();
        self.controller.start_auto_refresh(&StreamKey::Trend, CHART_REFRESH_PERIOD);
    }

    pub fn controller(&self) -> &Rc<PollingController> {
        &self.controller
    }

    pub fn timeframe(&self) -> String {
        self.timeframe.borrow().clone()
    }

    pub fn refresh(&self) {
        self.controller.spawn_refresh(StreamKey::Trend);
    }

    pub fn select_timeframe(&self, timeframe: &str) {
        if timeframe.is_empty() {
            return;
        }
        *self.timeframe.borrow_mut() = timeframe.to_string();
        self.bind();
        self.refresh();
    }

    pub fn set_auto_refresh(&self, enabled: bool) {
        if enabled {
            self.controller.start_auto_refresh(&StreamKey::Trend, CHART_REFRESH_PERIOD);
        } else {
            self.controller.stop_auto_refresh(&StreamKey::Trend);
        }
    }

    pub fn shutdown(&self) {
        self.controller.shutdown();
    }
}
