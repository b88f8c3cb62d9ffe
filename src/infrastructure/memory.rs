//! Test doubles: a virtual-clock runtime, a recording DOM surface and toast
//! layer, and a scripted API client. They let the page controllers run
//! natively, outside a browser. Only compiled with the `testing` feature.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use futures::FutureExt;
use futures::channel::oneshot;
use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;

use crate::application::ports::{
    ApiClient, BusyIndicator, EnvelopeFuture, Field, NotificationSurface, Runtime, Surface,
    TaskFuture, TimerHandle,
};
use crate::domain::logging::LogComponent;
use crate::domain::{
    ApiRequest, AppResult, Envelope, Notification, NotificationId, Severity, ToastPhase,
    TransportError,
};
use crate::log_error;

struct ManualInterval {
    seq: u64,
    period: u64,
    next_due: u64,
    cancelled: Rc<Cell<bool>>,
    tick: Rc<RefCell<Box<dyn FnMut()>>>,
}

struct ManualTimeout {
    seq: u64,
    due: u64,
    callback: Box<dyn FnOnce()>,
}

/// Interval handle of [`ManualRuntime`]; cancelled on drop.
pub struct ManualTimer {
    cancelled: Rc<Cell<bool>>,
}

impl TimerHandle for ManualTimer {
    fn cancel(self: Box<Self>) {}
}

impl Drop for ManualTimer {
    fn drop(&mut self) {
        self.cancelled.set(true);
    }
}

enum Due {
    Interval(u64),
    Timeout(usize),
}

/// Single-threaded runtime with a virtual millisecond clock.
///
/// Spawned tasks run on a `LocalPool` whenever the clock advances or
/// [`ManualRuntime::run_until_stalled`] is called. Timers fire in due
/// order, ties broken by registration order.
pub struct ManualRuntime {
    now: Cell<u64>,
    seq: Cell<u64>,
    intervals: RefCell<Vec<ManualInterval>>,
    timeouts: RefCell<Vec<ManualTimeout>>,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
}

impl ManualRuntime {
    pub fn new() -> Rc<Self> {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Rc::new(Self {
            now: Cell::new(0),
            seq: Cell::new(0),
            intervals: RefCell::new(Vec::new()),
            timeouts: RefCell::new(Vec::new()),
            pool: RefCell::new(pool),
            spawner,
        })
    }

    fn next_seq(&self) -> u64 {
        let seq = self.seq.get();
        self.seq.set(seq + 1);
        seq
    }

    pub fn now(&self) -> u64 {
        self.now.get()
    }

    /// Armed, not cancelled intervals.
    pub fn active_timers(&self) -> usize {
        self.intervals.borrow().iter().filter(|i| !i.cancelled.get()).count()
    }

    pub fn pending_timeouts(&self) -> usize {
        self.timeouts.borrow().len()
    }

    pub fn run_until_stalled(&self) {
        self.pool.borrow_mut().run_until_stalled();
    }

    fn next_due(&self, limit: u64) -> Option<(u64, Due)> {
        self.intervals.borrow_mut().retain(|i| !i.cancelled.get());

        let interval = self
            .intervals
            .borrow()
            .iter()
            .map(|i| (i.next_due, i.seq, Due::Interval(i.seq)))
            .min_by_key(|(due, seq, _)| (*due, *seq));
        let timeout = self
            .timeouts
            .borrow()
            .iter()
            .enumerate()
            .map(|(idx, t)| (t.due, t.seq, Due::Timeout(idx)))
            .min_by_key(|(due, seq, _)| (*due, *seq));

        let earliest = match (interval, timeout) {
            (Some(a), Some(b)) => Some(if (a.0, a.1) <= (b.0, b.1) { a } else { b }),
            (a, b) => a.or(b),
        };
        earliest.filter(|(due, _, _)| *due <= limit).map(|(due, _, which)| (due, which))
    }

    /// Moves the clock forward, firing every timer that comes due on the way.
    pub fn advance(&self, by: Duration) {
        let target = self.now.get() + by.as_millis() as u64;
        self.run_until_stalled();

        while let Some((due, which)) = self.next_due(target) {
            self.now.set(due);
            match which {
                Due::Timeout(idx) => {
                    let timeout = self.timeouts.borrow_mut().remove(idx);
                    (timeout.callback)();
                }
                Due::Interval(seq) => {
                    let tick = {
                        let mut intervals = self.intervals.borrow_mut();
                        intervals.iter_mut().find(|i| i.seq == seq).map(|i| {
                            i.next_due += i.period;
                            Rc::clone(&i.tick)
                        })
                    };
                    if let Some(tick) = tick {
                        let mut callback = tick.borrow_mut();
                        (*callback)();
                    }
                }
            }
            self.run_until_stalled();
        }

        self.now.set(target);
    }
}

impl Runtime for ManualRuntime {
    fn every(&self, period: Duration, tick: Box<dyn FnMut()>) -> Box<dyn TimerHandle> {
        let cancelled = Rc::new(Cell::new(false));
        let period = (period.as_millis() as u64).max(1);
        self.intervals.borrow_mut().push(ManualInterval {
            seq: self.next_seq(),
            period,
            next_due: self.now.get() + period,
            cancelled: Rc::clone(&cancelled),
            tick: Rc::new(RefCell::new(tick)),
        });
        Box::new(ManualTimer { cancelled })
    }

    fn after(&self, delay: Duration, callback: Box<dyn FnOnce()>) {
        self.timeouts.borrow_mut().push(ManualTimeout {
            seq: self.next_seq(),
            due: self.now.get() + delay.as_millis() as u64,
            callback,
        });
    }

    fn spawn(&self, task: TaskFuture) {
        if let Err(err) = self.spawner.spawn_local(task) {
            log_error!(LogComponent::Infrastructure("ManualRuntime"), "spawn failed: {}", err);
        }
    }

    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

/// Pre-rendered markup that [`MemorySurface::read_all`] reads back.
#[derive(Debug, Clone, Default)]
pub struct MemoryElement {
    attributes: HashMap<String, String>,
    text: String,
    children: Vec<(String, MemoryElement)>,
}

impl MemoryElement {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: &str, value: &str) -> Self {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    /// Descendant found by exactly `selector`.
    pub fn with_child(mut self, selector: &str, child: MemoryElement) -> Self {
        self.children.push((selector.to_string(), child));
        self
    }

    fn child(&self, selector: &str) -> Option<&MemoryElement> {
        self.children.iter().find(|(s, _)| s == selector).map(|(_, child)| child)
    }

    fn read(&self, field: &Field<'_>) -> Option<String> {
        match *field {
            Field::Attribute(name) => self.attributes.get(name).cloned(),
            Field::ChildAttribute { selector, name } => {
                self.child(selector)?.attributes.get(name).cloned()
            }
            Field::ChildText(selector) => Some(self.child(selector)?.text.trim().to_string()),
        }
    }
}

/// Records every mutation keyed by selector.
#[derive(Default)]
pub struct MemorySurface {
    elements: RefCell<HashMap<String, Vec<MemoryElement>>>,
    html: RefCell<HashMap<String, String>>,
    text: RefCell<HashMap<String, String>>,
    attributes: RefCell<HashMap<(String, String), String>>,
    classes: RefCell<HashMap<String, BTreeSet<String>>>,
    busy: RefCell<HashMap<String, bool>>,
    busy_log: RefCell<Vec<(String, bool)>>,
    html_writes: Cell<usize>,
}

impl MemorySurface {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Elements matched by `selector` in later reads.
    pub fn insert_elements(&self, selector: &str, elements: Vec<MemoryElement>) {
        self.elements.borrow_mut().insert(selector.to_string(), elements);
    }

    pub fn html(&self, selector: &str) -> Option<String> {
        self.html.borrow().get(selector).cloned()
    }

    pub fn text(&self, selector: &str) -> Option<String> {
        self.text.borrow().get(selector).cloned()
    }

    pub fn attribute(&self, selector: &str, name: &str) -> Option<String> {
        self.attributes.borrow().get(&(selector.to_string(), name.to_string())).cloned()
    }

    pub fn has_class(&self, selector: &str, class: &str) -> bool {
        self.classes.borrow().get(selector).is_some_and(|set| set.contains(class))
    }

    pub fn is_busy(&self, target: &str) -> bool {
        self.busy.borrow().get(target).copied().unwrap_or(false)
    }

    /// `(target, busy)` transitions in call order.
    pub fn busy_log(&self) -> Vec<(String, bool)> {
        self.busy_log.borrow().clone()
    }

    pub fn html_writes(&self) -> usize {
        self.html_writes.get()
    }
}

impl Surface for MemorySurface {
    fn set_html(&self, selector: &str, html: &str) -> AppResult<()> {
        self.html_writes.set(self.html_writes.get() + 1);
        self.html.borrow_mut().insert(selector.to_string(), html.to_string());
        Ok(())
    }

    fn set_text(&self, selector: &str, text: &str) -> AppResult<()> {
        self.text.borrow_mut().insert(selector.to_string(), text.to_string());
        Ok(())
    }

    fn set_attribute(&self, selector: &str, name: &str, value: &str) -> AppResult<()> {
        self.attributes
            .borrow_mut()
            .insert((selector.to_string(), name.to_string()), value.to_string());
        Ok(())
    }

    fn toggle_class(&self, selector: &str, class: &str, on: bool) -> AppResult<()> {
        let mut classes = self.classes.borrow_mut();
        let set = classes.entry(selector.to_string()).or_default();
        if on {
            set.insert(class.to_string());
        } else {
            set.remove(class);
        }
        Ok(())
    }

    fn set_busy(&self, indicator: &BusyIndicator, busy: bool) {
        if let Some(target) = indicator.target() {
            self.busy.borrow_mut().insert(target.to_string(), busy);
            self.busy_log.borrow_mut().push((target.to_string(), busy));
        }
    }

    fn read_all(&self, selector: &str, fields: &[Field<'_>]) -> AppResult<Vec<Vec<Option<String>>>> {
        Ok(self
            .elements
            .borrow()
            .get(selector)
            .map(|elements| {
                elements
                    .iter()
                    .map(|element| fields.iter().map(|field| element.read(field)).collect())
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Toast layer that remembers every notification and its current phase.
#[derive(Default)]
pub struct RecordingNotifications {
    history: RefCell<Vec<Notification>>,
    phases: RefCell<HashMap<NotificationId, ToastPhase>>,
}

impl RecordingNotifications {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Every notification ever mounted, oldest first.
    pub fn history(&self) -> Vec<Notification> {
        self.history.borrow().clone()
    }

    pub fn messages(&self, severity: Severity) -> Vec<String> {
        self.history
            .borrow()
            .iter()
            .filter(|n| n.severity == severity)
            .map(|n| n.message.clone())
            .collect()
    }

    /// `None` once the toast was removed (or never existed).
    pub fn phase(&self, id: NotificationId) -> Option<ToastPhase> {
        self.phases.borrow().get(&id).copied()
    }

    pub fn on_screen(&self) -> usize {
        self.phases.borrow().len()
    }

    fn set_phase(&self, id: NotificationId, phase: ToastPhase) {
        if let Some(current) = self.phases.borrow_mut().get_mut(&id) {
            *current = phase;
        }
    }
}

impl NotificationSurface for RecordingNotifications {
    fn mount(&self, notification: &Notification) {
        self.history.borrow_mut().push(notification.clone());
        self.phases.borrow_mut().insert(notification.id, ToastPhase::Entering);
    }

    fn reveal(&self, id: NotificationId) {
        self.set_phase(id, ToastPhase::Visible);
    }

    fn dismiss(&self, id: NotificationId) {
        self.set_phase(id, ToastPhase::Leaving);
    }

    fn remove(&self, id: NotificationId) {
        self.phases.borrow_mut().remove(&id);
    }
}

enum Scripted {
    Ready(Result<Envelope, TransportError>),
    Deferred(oneshot::Receiver<Result<Envelope, TransportError>>),
}

/// Answers requests from a FIFO script and records what was asked.
#[derive(Default)]
pub struct ScriptedApiClient {
    script: RefCell<VecDeque<Scripted>>,
    requests: RefCell<Vec<ApiRequest>>,
}

impl ScriptedApiClient {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn respond(&self, envelope: Envelope) {
        self.script.borrow_mut().push_back(Scripted::Ready(Ok(envelope)));
    }

    pub fn fail(&self, error: TransportError) {
        self.script.borrow_mut().push_back(Scripted::Ready(Err(error)));
    }

    /// Next request stays pending until the returned sender fires.
    pub fn defer(&self) -> oneshot::Sender<Result<Envelope, TransportError>> {
        let (tx, rx) = oneshot::channel();
        self.script.borrow_mut().push_back(Scripted::Deferred(rx));
        tx
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.borrow().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl ApiClient for ScriptedApiClient {
    fn post(&self, request: ApiRequest) -> EnvelopeFuture {
        self.requests.borrow_mut().push(request);
        match self.script.borrow_mut().pop_front() {
            Some(Scripted::Ready(outcome)) => futures::future::ready(outcome).boxed_local(),
            Some(Scripted::Deferred(rx)) => async move {
                rx.await.unwrap_or_else(|_| Err(TransportError::Request("request dropped".into())))
            }
            .boxed_local(),
            None => futures::future::ready(Err(TransportError::Request("no scripted response".into())))
                .boxed_local(),
        }
    }
}
