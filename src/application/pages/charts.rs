use std::cell::{Cell, RefCell};
use std::rc::Rc;

use futures::FutureExt;
use serde::Deserialize;
use strum::{AsRefStr, Display, EnumString};

use crate::application::pages::{PageServices, log_surface_error};
use crate::application::polling::{PollingController, StreamBinding, StreamFetcher, StreamView};
use crate::application::ports::{ApiClient, BusyIndicator, EnvelopeFuture, Surface};
use crate::application::render::chart_card;
use crate::domain::logging::get_time_provider;
use crate::domain::records::ChartSlot;
use crate::domain::stream::CHART_REFRESH_PERIOD;
use crate::domain::{AppResult, Endpoint, Envelope, StreamKey, TransportError};

pub const CHARTS_CONTAINER: &str = "#charts-container";
pub const LOADING_OVERLAY: &str = "#loading-overlay";

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, AsRefStr, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// Cards stacked vertically.
    #[default]
    Grid,
    /// All cards fitted on one screen.
    Single,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeframeSelection {
    All,
    One(String),
}

impl TimeframeSelection {
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() || raw == "all" { TimeframeSelection::All } else { TimeframeSelection::One(raw.to_string()) }
    }

    /// `(timeframe, 1-based index)` pairs to load; index 0 marks a
    /// timeframe missing from the configured list.
    pub fn resolve(&self, timeframes: &[String]) -> Vec<(String, usize)> {
        match self {
            TimeframeSelection::All => {
                timeframes.iter().enumerate().map(|(i, tf)| (tf.clone(), i + 1)).collect()
            }
            TimeframeSelection::One(tf) => {
                let index = timeframes.iter().position(|t| t == tf).map_or(0, |i| i + 1);
                vec![(tf.clone(), index)]
            }
        }
    }
}

fn default_title() -> String {
    "TOPDOGINDEX".to_string()
}

fn default_timeframe() -> String {
    "all".to_string()
}

fn default_page_container() -> String {
    ".chart-page".to_string()
}

fn default_auto_refresh() -> bool {
    true
}

/// Page config injected by the metrics templates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPageConfig {
    pub indicator_id: String,
    #[serde(default = "default_title")]
    pub title: String,
    pub timeframes: Vec<String>,
    /// `all` or one timeframe of `timeframes`.
    #[serde(default = "default_timeframe")]
    pub default_timeframe: String,
    #[serde(default)]
    pub display_mode: DisplayMode,
    #[serde(default = "default_page_container")]
    pub page_container: String,
    #[serde(default = "default_auto_refresh")]
    pub auto_refresh: bool,
}

/// Loads the selected timeframes one after another. A failing timeframe
/// becomes an error slot instead of failing the batch.
struct ChartBatchFetcher {
    client: Rc<dyn ApiClient>,
    indicator_id: String,
    timeframes: Vec<String>,
    selection: Rc<RefCell<TimeframeSelection>>,
}

impl StreamFetcher for ChartBatchFetcher {
    fn fetch(&self) -> EnvelopeFuture {
        let client = Rc::clone(&self.client);
        let indicator_id = self.indicator_id.clone();
        let wanted = self.selection.borrow().resolve(&self.timeframes);

        async move {
            let mut slots = Vec::with_capacity(wanted.len());
            for (timeframe, index) in wanted {
                let endpoint = Endpoint::Chart { indicator_id: indicator_id.clone(), timeframe: timeframe.clone() };
                let outcome = match endpoint.request() {
                    Ok(request) => client.post(request).await,
                    Err(err) => Err(TransportError::Request(err.to_string())),
                };
                let (image_path, error) = match outcome {
                    Ok(envelope) if envelope.success => match envelope.field::<String>("image_path") {
                        Ok(path) => (Some(path), None),
                        Err(err) => (None, Some(err.to_string())),
                    },
                    Ok(envelope) => (None, Some(envelope.error_message().to_string())),
                    Err(err) => (None, Some(err.to_string())),
                };
                slots.push(ChartSlot { timeframe, index, image_path, error });
            }

            serde_json::to_value(&slots)
                .map(|charts| Envelope::ok([("charts", charts)]))
                .map_err(|e| TransportError::Decode(e.to_string()))
        }
        .boxed_local()
    }
}

struct ChartGalleryView {
    surface: Rc<dyn Surface>,
    title: String,
    display_mode: Rc<Cell<DisplayMode>>,
    page_container: String,
}

impl ChartGalleryView {
    fn apply_display_mode(&self) -> AppResult<()> {
        let single = self.display_mode.get() == DisplayMode::Single;
        self.surface.toggle_class(CHARTS_CONTAINER, "charts-grid", !single)?;
        self.surface.toggle_class(CHARTS_CONTAINER, "charts-single", single)?;
        self.surface.toggle_class(".chart-card", "chart-card-grid", !single)?;
        self.surface.toggle_class(".chart-card", "chart-card-single", single)?;
        self.surface.toggle_class(&self.page_container, "single-mode", single)
    }
}

impl StreamView for ChartGalleryView {
    fn render(&self, envelope: &Envelope) -> AppResult<()> {
        let slots: Vec<ChartSlot> = envelope.field_or_default("charts")?;
        let clock = get_time_provider();
        let rendered_at = clock.format_clock(clock.current_timestamp());

        let html: String = slots.iter().map(|slot| chart_card(&self.title, slot, &rendered_at)).collect();
        self.surface.set_html(CHARTS_CONTAINER, &html)?;
        self.apply_display_mode()
    }
}

/// Server-rendered indicator charts for a set of timeframes.
pub struct ChartGalleryPage {
    controller: Rc<PollingController>,
    selection: Rc<RefCell<TimeframeSelection>>,
    view: Rc<ChartGalleryView>,
    auto_refresh: bool,
}

impl ChartGalleryPage {
    pub fn new(services: &PageServices, config: ChartPageConfig) -> Self {
        let controller = services.controller();
        let selection = Rc::new(RefCell::new(TimeframeSelection::parse(&config.default_timeframe)));
        let view = Rc::new(ChartGalleryView {
            surface: Rc::clone(&services.surface),
            title: config.title,
            display_mode: Rc::new(Cell::new(config.display_mode)),
            page_container: config.page_container,
        });

        controller.register(
            StreamKey::Charts,
            StreamBinding {
                label: "Charts".into(),
                fetcher: Rc::new(ChartBatchFetcher {
                    client: Rc::clone(&services.client),
                    indicator_id: config.indicator_id,
                    timeframes: config.timeframes,
                    selection: Rc::clone(&selection),
                }),
                view: Rc::clone(&view) as Rc<dyn StreamView>,
                busy: BusyIndicator::Overlay { overlay: LOADING_OVERLAY.into() },
                success_message: "Charts loaded".into(),
            },
        );

        Self { controller, selection, view, auto_refresh: config.auto_refresh }
    }

    /// Loads the charts and arms the auto refresh.
    pub fn start(&self) {
        self.controller.spawn_refresh(StreamKey::Charts);
        if self.auto_refresh {
            self.controller.start_auto_refresh(&StreamKey::Charts, CHART_REFRESH_PERIOD);
        }
    }

    pub fn controller(&self) -> &Rc<PollingController> {
        &self.controller
    }

    pub fn selection(&self) -> TimeframeSelection {
        self.selection.borrow().clone()
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.view.display_mode.get()
    }

    pub fn refresh(&self) {
        self.controller.spawn_refresh(StreamKey::Charts);
    }

    pub fn select_timeframe(&self, raw: &str) {
        *self.selection.borrow_mut() = TimeframeSelection::parse(raw);
        self.refresh();
    }

    /// Unknown mode names fall back to the grid.
    pub fn set_display_mode(&self, raw: &str) {
        self.view.display_mode.set(raw.parse().unwrap_or_default());
        log_surface_error("Charts", self.view.apply_display_mode());
    }

    pub fn set_auto_refresh(&self, enabled: bool) {
        if enabled {
            self.controller.start_auto_refresh(&StreamKey::Charts, CHART_REFRESH_PERIOD);
        } else {
            self.controller.stop_auto_refresh(&StreamKey::Charts);
        }
    }

    pub fn shutdown(&self) {
        self.controller.shutdown();
    }
}
