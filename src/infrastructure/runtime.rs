use std::time::Duration;

use gloo_timers::callback::{Interval, Timeout};

use crate::application::ports::{Runtime, TaskFuture, TimerHandle};

fn millis(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

struct IntervalTimer(Interval);

impl TimerHandle for IntervalTimer {
    fn cancel(self: Box<Self>) {
        drop(self.0.cancel());
    }
}

/// Event loop of the page: `setInterval`, `setTimeout` and microtask spawning.
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserRuntime;

impl Runtime for BrowserRuntime {
    fn every(&self, period: Duration, mut tick: Box<dyn FnMut()>) -> Box<dyn TimerHandle> {
        Box::new(IntervalTimer(Interval::new(millis(period), move || tick())))
    }

    fn after(&self, delay: Duration, callback: Box<dyn FnOnce()>) {
        Timeout::new(millis(delay), callback).forget();
    }

    fn spawn(&self, task: TaskFuture) {
        wasm_bindgen_futures::spawn_local(task);
    }

    fn now_ms(&self) -> u64 {
        js_sys::Date::now() as u64
    }
}
