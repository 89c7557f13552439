//! Self-resetting flush timer
//!
//! One recurring tick task per queue. `reset` cancels the outstanding task
//! and arms a new one whose first tick lands a full period from now, so a
//! burst of submissions keeps pushing the flush out until things go quiet.
//! Once armed the task keeps ticking every period; idle ticks are cheap
//! because an empty flush does nothing.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Restartable recurring timer
pub struct FlushTimer {
    period: Duration,
    /// Runtime the tick task lives on, so `reset` works from any thread
    runtime: Handle,
    state: Mutex<TimerState>,
}

#[derive(Default)]
struct TimerState {
    /// At most one outstanding tick task
    task: Option<JoinHandle<()>>,
    stopped: bool,
}

impl FlushTimer {
    /// `period` must be non-zero
    pub fn new(period: Duration, runtime: Handle) -> Self {
        Self {
            period,
            runtime,
            state: Mutex::new(TimerState::default()),
        }
    }

    /// Cancel the outstanding tick task and start a new one
    ///
    /// `on_tick` runs on every expiry; returning `false` ends the task.
    /// Returns `false` without arming anything once the timer is stopped.
    pub fn reset<F>(&self, mut on_tick: F) -> bool
    where
        F: FnMut() -> bool + Send + 'static,
    {
        let mut state = self.state.lock();
        if state.stopped {
            return false;
        }

        if let Some(previous) = state.task.take() {
            previous.abort();
        }

        let period = self.period;
        let start = Instant::now() + period;
        state.task = Some(self.runtime.spawn(async move {
            let mut ticker = interval_at(start, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if !on_tick() {
                    break;
                }
            }
        }));

        true
    }

    /// Cancel the outstanding task for good
    ///
    /// Returns whether a task was armed.
    pub fn stop(&self) -> bool {
        let mut state = self.state.lock();
        state.stopped = true;
        match state.task.take() {
            Some(task) => {
                task.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.state
            .lock()
            .task
            .as_ref()
            .is_some_and(|task| !task.is_finished())
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Drop for FlushTimer {
    fn drop(&mut self) {
        if let Some(task) = self.state.get_mut().task.take() {
            task.abort();
        }
    }
}
