//! Page controllers: which streams a page has, how each renders, and what
//! the page's controls do.

pub mod account_detail;
pub mod accounts;
pub mod charts;
pub mod trend;

use std::rc::Rc;

use crate::application::notifier::Notifier;
use crate::application::polling::PollingController;
use crate::application::ports::{ApiClient, NotificationSurface, Runtime, Surface};
use crate::domain::logging::LogComponent;
use crate::domain::AppResult;
use crate::log_warn;

pub use account_detail::{AccountDetailPage, AccountInfo};
pub use accounts::{AccountSummary, AccountsBoard, AccountsPage, rendered_accounts};
pub use charts::{ChartGalleryPage, ChartPageConfig, DisplayMode, TimeframeSelection};
pub use trend::{TrendPage, TrendPageConfig};

/// Collaborators a page is built from.
#[derive(Clone)]
pub struct PageServices {
    pub client: Rc<dyn ApiClient>,
    pub surface: Rc<dyn Surface>,
    pub notifications: Rc<dyn NotificationSurface>,
    pub runtime: Rc<dyn Runtime>,
}

impl PageServices {
    pub fn controller(&self) -> Rc<PollingController> {
        let notifier = Rc::new(Notifier::new(Rc::clone(&self.notifications), Rc::clone(&self.runtime)));
        PollingController::new(Rc::clone(&self.surface), notifier, Rc::clone(&self.runtime))
    }
}

/// Cosmetic DOM updates outside a refresh only get logged when they fail.
pub(crate) fn log_surface_error(context: &'static str, result: AppResult<()>) {
    if let Err(err) = result {
        log_warn!(LogComponent::Application(context), "{}", err);
    }
}
