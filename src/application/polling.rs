use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::{Rc, Weak};
use std::time::Duration;

use futures::FutureExt;

use crate::application::notifier::Notifier;
use crate::application::ports::{
    ApiClient, BusyIndicator, EnvelopeFuture, Runtime, Surface, TimerHandle,
};
use crate::domain::logging::LogComponent;
use crate::domain::{AppError, AppResult, Endpoint, Envelope, StreamKey, TransportError};
use crate::{log_debug, log_info, log_warn};

/// Produces the envelope for one refresh of a stream.
pub trait StreamFetcher {
    fn fetch(&self) -> EnvelopeFuture;
}

/// Applies a refresh outcome to the page.
pub trait StreamView {
    fn render(&self, envelope: &Envelope) -> AppResult<()>;

    /// Shows a failed refresh in place. By default the last data stays up.
    fn render_failure(&self, _error: &AppError) -> AppResult<()> {
        Ok(())
    }
}

/// Single-endpoint fetcher, the common case.
pub struct EndpointFetcher {
    client: Rc<dyn ApiClient>,
    endpoint: Endpoint,
}

impl EndpointFetcher {
    pub fn new(client: Rc<dyn ApiClient>, endpoint: Endpoint) -> Self {
        Self { client, endpoint }
    }
}

impl StreamFetcher for EndpointFetcher {
    fn fetch(&self) -> EnvelopeFuture {
        match self.endpoint.request() {
            Ok(request) => self.client.post(request),
            Err(err) => futures::future::ready(Err(TransportError::Request(err.to_string()))).boxed_local(),
        }
    }
}

/// Everything the controller needs to drive one stream.
pub struct StreamBinding {
    /// Human name used in auto-refresh toasts ("Positions", "Charts", ...).
    pub label: String,
    pub fetcher: Rc<dyn StreamFetcher>,
    pub view: Rc<dyn StreamView>,
    pub busy: BusyIndicator,
    pub success_message: String,
}

struct StreamState {
    binding: StreamBinding,
    timer: Option<Box<dyn TimerHandle>>,
    period: Option<Duration>,
    loaded: bool,
    in_flight: usize,
    /// Sequence number of the last issued request.
    issued: u64,
    /// Sequence number of the newest response that was applied.
    applied: u64,
}

impl StreamState {
    fn new(binding: StreamBinding) -> Self {
        Self { binding, timer: None, period: None, loaded: false, in_flight: 0, issued: 0, applied: 0 }
    }
}

/// One request of a stream. Dropping it, whichever way the refresh ends,
/// releases the request and clears the busy indicator once no other request
/// of the stream is pending.
struct InFlight<'a> {
    controller: &'a PollingController,
    key: &'a StreamKey,
    indicator: BusyIndicator,
}

impl<'a> InFlight<'a> {
    fn engage(controller: &'a PollingController, key: &'a StreamKey, indicator: BusyIndicator) -> Self {
        controller.surface.set_busy(&indicator, true);
        Self { controller, key, indicator }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let idle = match self.controller.streams.borrow_mut().get_mut(self.key) {
            Some(state) => {
                state.in_flight = state.in_flight.saturating_sub(1);
                state.in_flight == 0
            }
            None => true,
        };
        if idle {
            self.controller.surface.set_busy(&self.indicator, false);
        }
    }
}

/// What to do with a response once it lands.
enum Settled {
    Apply { view: Rc<dyn StreamView>, success_message: String },
    Stale,
    Unregistered,
}

/// Drives the refresh streams of one page session.
///
/// Per stream: at most one armed timer, a "loaded" flag and a request
/// sequence. A response is applied only if no newer response of the same
/// stream has been applied before it; older ones are dropped.
pub struct PollingController {
    streams: RefCell<HashMap<StreamKey, StreamState>>,
    surface: Rc<dyn Surface>,
    notifier: Rc<Notifier>,
    runtime: Rc<dyn Runtime>,
}

impl PollingController {
    pub fn new(surface: Rc<dyn Surface>, notifier: Rc<Notifier>, runtime: Rc<dyn Runtime>) -> Rc<Self> {
        Rc::new(Self { streams: RefCell::new(HashMap::new()), surface, notifier, runtime })
    }

    pub fn notifier(&self) -> &Rc<Notifier> {
        &self.notifier
    }

    pub fn surface(&self) -> &Rc<dyn Surface> {
        &self.surface
    }

    /// Registers (or replaces the binding of) a stream. Timer and sequence
    /// state of an already registered stream are kept.
    pub fn register(&self, key: StreamKey, binding: StreamBinding) {
        let mut streams = self.streams.borrow_mut();
        match streams.get_mut(&key) {
            Some(state) => state.binding = binding,
            None => {
                streams.insert(key, StreamState::new(binding));
            }
        }
    }

    pub fn is_registered(&self, key: &StreamKey) -> bool {
        self.streams.borrow().contains_key(key)
    }

    pub fn is_loaded(&self, key: &StreamKey) -> bool {
        self.streams.borrow().get(key).is_some_and(|s| s.loaded)
    }

    pub fn is_in_flight(&self, key: &StreamKey) -> bool {
        self.streams.borrow().get(key).is_some_and(|s| s.in_flight > 0)
    }

    pub fn is_auto_refreshing(&self, key: &StreamKey) -> bool {
        self.streams.borrow().get(key).is_some_and(|s| s.timer.is_some())
    }

    pub fn auto_refresh_period(&self, key: &StreamKey) -> Option<Duration> {
        self.streams.borrow().get(key).and_then(|s| s.period)
    }

    /// Refreshes `key` once. Outcomes end up in the view or in a toast;
    /// nothing is returned to the caller.
    pub async fn trigger_refresh(&self, key: &StreamKey) {
        let Some((fetcher, busy, seq)) = self.begin(key) else {
            log_warn!(LogComponent::Application("Polling"), "refresh of unregistered stream {}", key);
            return;
        };

        let _request = InFlight::engage(self, key, busy);
        let outcome = fetcher.fetch().await;

        match self.settle(key, seq) {
            Settled::Apply { view, success_message } => {
                self.apply(key, outcome, view.as_ref(), &success_message)
            }
            Settled::Stale => {
                log_debug!(
                    LogComponent::Application("Polling"),
                    "dropping stale response #{} for {}",
                    seq,
                    key
                );
            }
            Settled::Unregistered => {}
        }
    }

    /// Fire-and-forget refresh on the runtime's task queue.
    pub fn spawn_refresh(self: &Rc<Self>, key: StreamKey) {
        let controller = Rc::clone(self);
        self.runtime.spawn(Box::pin(async move {
            controller.trigger_refresh(&key).await;
        }));
    }

    /// Refreshes `key` unless it already loaded or a request is pending.
    /// Returns whether a refresh was issued.
    pub fn ensure_loaded(self: &Rc<Self>, key: &StreamKey) -> bool {
        let needed = self
            .streams
            .borrow()
            .get(key)
            .is_some_and(|s| !s.loaded && s.in_flight == 0);
        if needed {
            self.spawn_refresh(key.clone());
        }
        needed
    }

    /// Arms a repeating refresh, replacing any timer already armed for `key`.
    /// The first refresh happens after one full period.
    pub fn start_auto_refresh(self: &Rc<Self>, key: &StreamKey, period: Duration) {
        let label = {
            let mut streams = self.streams.borrow_mut();
            let Some(state) = streams.get_mut(key) else {
                log_warn!(
                    LogComponent::Application("Polling"),
                    "auto refresh requested for unregistered stream {}",
                    key
                );
                return;
            };
            if let Some(previous) = state.timer.take() {
                previous.cancel();
            }
            state.binding.label.clone()
        };

        let weak: Weak<Self> = Rc::downgrade(self);
        let tick_key = key.clone();
        let handle = self.runtime.every(
            period,
            Box::new(move || {
                if let Some(controller) = weak.upgrade() {
                    controller.spawn_refresh(tick_key.clone());
                }
            }),
        );

        if let Some(state) = self.streams.borrow_mut().get_mut(key) {
            state.timer = Some(handle);
            state.period = Some(period);
        }

        log_info!(
            LogComponent::Application("Polling"),
            "auto refresh of {} every {:?}",
            key,
            period
        );
        self.notifier.info(format!(
            "{label} auto refresh started ({}s interval)",
            period.as_secs()
        ));
    }

    /// Cancels the timer of `key`. Silent when none is armed.
    pub fn stop_auto_refresh(&self, key: &StreamKey) {
        let stopped = {
            let mut streams = self.streams.borrow_mut();
            streams.get_mut(key).and_then(|state| {
                state.period = None;
                state.timer.take().map(|timer| (timer, state.binding.label.clone()))
            })
        };

        if let Some((timer, label)) = stopped {
            timer.cancel();
            log_info!(LogComponent::Application("Polling"), "auto refresh of {} stopped", key);
            self.notifier.info(format!("{label} auto refresh stopped"));
        }
    }

    /// Cancels every armed timer without toasts. In-flight requests still land.
    pub fn shutdown(&self) {
        let timers: Vec<Box<dyn TimerHandle>> = self
            .streams
            .borrow_mut()
            .values_mut()
            .filter_map(|state| {
                state.period = None;
                state.timer.take()
            })
            .collect();
        for timer in timers {
            timer.cancel();
        }
    }

    fn begin(&self, key: &StreamKey) -> Option<(Rc<dyn StreamFetcher>, BusyIndicator, u64)> {
        let mut streams = self.streams.borrow_mut();
        let state = streams.get_mut(key)?;
        state.issued += 1;
        state.in_flight += 1;
        Some((Rc::clone(&state.binding.fetcher), state.binding.busy.clone(), state.issued))
    }

    fn settle(&self, key: &StreamKey, seq: u64) -> Settled {
        let mut streams = self.streams.borrow_mut();
        let Some(state) = streams.get_mut(key) else {
            return Settled::Unregistered;
        };
        if seq <= state.applied {
            return Settled::Stale;
        }
        state.applied = seq;
        Settled::Apply {
            view: Rc::clone(&state.binding.view),
            success_message: state.binding.success_message.clone(),
        }
    }

    fn apply(
        &self,
        key: &StreamKey,
        outcome: Result<Envelope, TransportError>,
        view: &dyn StreamView,
        success_message: &str,
    ) {
        let result = outcome
            .map_err(AppError::from)
            .and_then(|envelope| envelope.check().and_then(|()| view.render(&envelope)));

        match result {
            Ok(()) => {
                if let Some(state) = self.streams.borrow_mut().get_mut(key) {
                    state.loaded = true;
                }
                self.notifier.success(success_message);
            }
            Err(err) => {
                log_warn!(LogComponent::Application("Polling"), "refresh of {} failed: {}", key, err);
                if let Err(render_err) = view.render_failure(&err) {
                    log_warn!(LogComponent::Application("Polling"), "{} error block: {}", key, render_err);
                }
                self.notifier.error(err.to_string());
            }
        }
    }
}

impl Drop for PollingController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
