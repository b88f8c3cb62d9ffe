use std::cell::Cell;
use std::rc::Rc;

use serde::Deserialize;

use crate::application::pages::{PageServices, log_surface_error};
use crate::application::polling::{EndpointFetcher, PollingController, StreamBinding, StreamView};
use crate::application::ports::{BusyIndicator, Surface};
use crate::application::render::{orders_body, positions_body};
use crate::domain::records::{Order, Position};
use crate::domain::stream::ACCOUNT_REFRESH_PERIOD;
use crate::domain::{AppResult, Endpoint, Envelope, ViewKey};

pub const POSITIONS_TBODY: &str = "#positions-tbody";
pub const ORDERS_TBODY: &str = "#orders-tbody";
pub const POSITIONS_TRIGGER: &str = "#refresh-positions";
pub const ORDERS_TRIGGER: &str = "#refresh-orders";

/// `window.accountInfo` of the account detail template.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    pub exchange: String,
    pub account_id: String,
}

struct PositionsView {
    surface: Rc<dyn Surface>,
}

impl StreamView for PositionsView {
    fn render(&self, envelope: &Envelope) -> AppResult<()> {
        let positions: Vec<Position> = envelope.field_or_default("positions")?;
        self.surface.set_html(POSITIONS_TBODY, &positions_body(&positions))
    }
}

struct OrdersView {
    surface: Rc<dyn Surface>,
}

impl StreamView for OrdersView {
    fn render(&self, envelope: &Envelope) -> AppResult<()> {
        let orders: Vec<Order> = envelope.field_or_default("orders")?;
        self.surface.set_html(ORDERS_TBODY, &orders_body(&orders))
    }
}

/// Positions / orders tabs of one exchange account.
pub struct AccountDetailPage {
    controller: Rc<PollingController>,
    active: Cell<ViewKey>,
}

impl AccountDetailPage {
    pub fn new(services: &PageServices, account: AccountInfo) -> Self {
        let controller = services.controller();

        controller.register(
            ViewKey::Positions.stream(),
            StreamBinding {
                label: "Positions".into(),
                fetcher: Rc::new(EndpointFetcher::new(
                    Rc::clone(&services.client),
                    Endpoint::Positions {
                        exchange: account.exchange.clone(),
                        account_id: account.account_id.clone(),
                    },
                )),
                view: Rc::new(PositionsView { surface: Rc::clone(&services.surface) }),
                busy: BusyIndicator::spinner(POSITIONS_TRIGGER),
                success_message: "Positions refreshed".into(),
            },
        );

        controller.register(
            ViewKey::Orders.stream(),
            StreamBinding {
                label: "Orders".into(),
                fetcher: Rc::new(EndpointFetcher::new(
                    Rc::clone(&services.client),
                    Endpoint::Orders { exchange: account.exchange, account_id: account.account_id },
                )),
                view: Rc::new(OrdersView { surface: Rc::clone(&services.surface) }),
                busy: BusyIndicator::spinner(ORDERS_TRIGGER),
                success_message: "Orders refreshed".into(),
            },
        );

        Self { controller, active: Cell::new(ViewKey::Positions) }
    }

    /// Initial load: the positions tab is the default.
    pub fn start(&self) {
        self.controller.spawn_refresh(ViewKey::Positions.stream());
    }

    pub fn controller(&self) -> &Rc<PollingController> {
        &self.controller
    }

    pub fn active_view(&self) -> ViewKey {
        self.active.get()
    }

    pub fn refresh(&self, view: ViewKey) {
        self.controller.spawn_refresh(view.stream());
    }

    pub fn set_auto_refresh(&self, view: ViewKey, enabled: bool) {
        if enabled {
            self.controller.start_auto_refresh(&view.stream(), ACCOUNT_REFRESH_PERIOD);
        } else {
            self.controller.stop_auto_refresh(&view.stream());
        }
    }

    /// Shows `view`'s tab and panel. A panel whose stream never loaded (and
    /// has nothing in flight) is refreshed once.
    pub fn switch_view(&self, view: ViewKey) {
        let surface = self.controller.surface();
        log_surface_error("AccountDetail", surface.toggle_class(".tab-btn", "active", false));
        log_surface_error(
            "AccountDetail",
            surface.toggle_class(&format!(r#".tab-btn[data-tab="{view}"]"#), "active", true),
        );
        log_surface_error("AccountDetail", surface.toggle_class(".tab-panel", "active", false));
        log_surface_error(
            "AccountDetail",
            surface.toggle_class(&format!("#{view}-panel"), "active", true),
        );
        self.active.set(view);

        self.controller.ensure_loaded(&view.stream());
    }

    pub fn shutdown(&self) {
        self.controller.shutdown();
    }
}
