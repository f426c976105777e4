//! Cancellable one-shot timers.
//!
//! The dock never holds callbacks. It asks a [`Scheduler`] to deliver a [`DockTimer`] after a
//! delay and keeps the returned [`TimerId`]. When the timer fires, the owner of the dock routes
//! `(id, timer)` back into [`crate::dock::Dock::on_timer`], where fires whose id no longer
//! matches the pending handle are dropped as stale.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use calloop::timer::{TimeoutAction, Timer};
use calloop::{LoopHandle, RegistrationToken};

use crate::animation::Clock;
use crate::utils::id::IdCounter;

static TIMER_ID_COUNTER: IdCounter = IdCounter::new();

/// Handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

impl TimerId {
    fn next() -> Self {
        Self(TIMER_ID_COUNTER.next())
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// What a timer is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DockTimer {
    /// Hide delay elapsed, start sliding away.
    Hide,
    /// Unhide delay elapsed, start sliding back in.
    Unhide,
    /// Auto-hide animation frame.
    Pump,
    /// Transient effects frame.
    Effects,
}

pub trait Scheduler {
    /// Schedules `timer` to fire once after `after`.
    fn schedule(&mut self, after: Duration, timer: DockTimer) -> TimerId;

    /// Cancels a pending timer.
    ///
    /// Timers that have already fired or were never scheduled are ignored.
    fn cancel(&mut self, id: TimerId);
}

/// Receiver of timers fired by a [`CalloopScheduler`].
pub trait TimerTarget {
    fn on_timer(&mut self, id: TimerId, timer: DockTimer);
}

/// Scheduler running in virtual time.
///
/// Nothing fires on its own: the driver pops due timers with [`ManualScheduler::pop_due`], which
/// moves the shared [`Clock`] forward to each deadline before handing the timer out.
#[derive(Debug)]
pub struct ManualScheduler {
    clock: Clock,
    pending: Vec<Pending>,
}

#[derive(Debug, Clone, Copy)]
struct Pending {
    id: TimerId,
    deadline: Duration,
    timer: DockTimer,
}

impl ManualScheduler {
    pub fn new(clock: Clock) -> Self {
        Self {
            clock,
            pending: Vec::new(),
        }
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    /// Number of pending timers.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_pending(&self, id: TimerId) -> bool {
        self.pending.iter().any(|p| p.id == id)
    }

    /// Whether any pending timer is of the given kind.
    pub fn has_pending(&self, timer: DockTimer) -> bool {
        self.pending.iter().any(|p| p.timer == timer)
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.iter().map(|p| p.deadline).min()
    }

    /// Removes and returns the earliest timer due at or before `until`.
    ///
    /// Timers with equal deadlines come out in scheduling order. The clock is advanced to the
    /// deadline of the returned timer.
    pub fn pop_due(&mut self, until: Duration) -> Option<(TimerId, DockTimer)> {
        let (idx, _) = self
            .pending
            .iter()
            .enumerate()
            .filter(|(_, p)| p.deadline <= until)
            .min_by_key(|(_, p)| (p.deadline, p.id))?;

        let pending = self.pending.remove(idx);
        self.clock.set(pending.deadline);
        trace!(id = pending.id.0, timer = ?pending.timer, "firing timer");
        Some((pending.id, pending.timer))
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&mut self, after: Duration, timer: DockTimer) -> TimerId {
        let id = TimerId::next();
        let deadline = self.clock.now().saturating_add(after);
        self.pending.push(Pending {
            id,
            deadline,
            timer,
        });
        id
    }

    fn cancel(&mut self, id: TimerId) {
        self.pending.retain(|p| p.id != id);
    }
}

/// Scheduler backed by calloop timer sources.
///
/// Fired timers are delivered to the event loop data through [`TimerTarget`].
pub struct CalloopScheduler<D: 'static> {
    handle: LoopHandle<'static, D>,
    live: Rc<RefCell<HashMap<TimerId, RegistrationToken>>>,
}

impl<D: 'static> CalloopScheduler<D> {
    pub fn new(handle: LoopHandle<'static, D>) -> Self {
        Self {
            handle,
            live: Rc::new(RefCell::new(HashMap::new())),
        }
    }

    /// Number of timers registered and not yet fired or cancelled.
    pub fn live(&self) -> usize {
        self.live.borrow().len()
    }
}

impl<D: TimerTarget + 'static> Scheduler for CalloopScheduler<D> {
    fn schedule(&mut self, after: Duration, timer: DockTimer) -> TimerId {
        let id = TimerId::next();

        let live = self.live.clone();
        let source = Timer::from_duration(after);
        let res = self.handle.insert_source(source, move |_, _, data| {
            live.borrow_mut().remove(&id);
            data.on_timer(id, timer);
            TimeoutAction::Drop
        });

        match res {
            Ok(token) => {
                self.live.borrow_mut().insert(id, token);
            }
            Err(err) => {
                // 定时器永远不会触发；状态机会停在当前状态，直到下一次输入事件
                warn!("error inserting {timer:?} timer: {}", err.error);
            }
        }

        id
    }

    fn cancel(&mut self, id: TimerId) {
        let token = self.live.borrow_mut().remove(&id);
        if let Some(token) = token {
            self.handle.remove(token);
        }
    }
}
