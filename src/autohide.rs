//! Auto-hide state machine.
//!
//! Produces two values over time: `hide_offset` (0 = fully shown, 1 = fully off screen) and
//! `zoom_progress`, which the layout engine uses to fade the zoom out together with the hide
//! animation. Both are handed to the layout every frame; nothing reads them back from here.
//!
//! The machine owns at most one delay timer (hide or unhide) and at most one animation pump
//! timer. Starting either one cancels the previous one of the same kind.

use std::time::Duration;

use docking_config::Config;

use crate::animation::Curve;
use crate::scheduler::{DockTimer, Scheduler, TimerId};
use crate::utils::safe_div;

/// Interval between animation frames, about 60 fps.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HideState {
    Visible,
    Hiding,
    Hidden,
    Showing,
}

#[derive(Debug)]
pub struct AutoHide {
    state: HideState,
    hide_offset: f64,
    zoom_progress: f64,
    /// Linear progress of the running transition.
    progress: f64,
    /// Pending hide or unhide delay.
    delay: Option<(TimerId, DockTimer)>,
    /// Pending animation frame.
    pump: Option<TimerId>,
}

impl Default for AutoHide {
    fn default() -> Self {
        Self::new()
    }
}

impl AutoHide {
    pub fn new() -> Self {
        Self {
            state: HideState::Visible,
            hide_offset: 0.,
            zoom_progress: 1.,
            progress: 0.,
            delay: None,
            pump: None,
        }
    }

    pub fn state(&self) -> HideState {
        self.state
    }

    pub fn hide_offset(&self) -> f64 {
        self.hide_offset
    }

    pub fn zoom_progress(&self) -> f64 {
        self.zoom_progress
    }

    /// Whether a transition is running.
    pub fn is_animating(&self) -> bool {
        matches!(self.state, HideState::Hiding | HideState::Showing)
    }

    /// The pending delay timer, if any.
    pub fn pending_delay(&self) -> Option<DockTimer> {
        self.delay.map(|(_, timer)| timer)
    }

    pub fn is_pumping(&self) -> bool {
        self.pump.is_some()
    }

    pub fn on_pointer_leave(&mut self, config: &Config, scheduler: &mut impl Scheduler) {
        if !config.autohide {
            return;
        }

        self.cancel_delay(DockTimer::Unhide, scheduler);

        if !matches!(self.state, HideState::Visible | HideState::Showing) {
            return;
        }

        if self.pending_delay() == Some(DockTimer::Hide) {
            // 已经在等待隐藏
            return;
        }

        if config.hide_delay_ms == 0 {
            self.start_hiding(scheduler);
        } else {
            let delay = Duration::from_millis(config.hide_delay_ms);
            let id = scheduler.schedule(delay, DockTimer::Hide);
            trace!(?delay, "scheduled hide");
            self.delay = Some((id, DockTimer::Hide));
        }
    }

    pub fn on_pointer_enter(&mut self, config: &Config, scheduler: &mut impl Scheduler) {
        if !config.autohide {
            return;
        }

        self.zoom_progress = 1.;
        self.cancel_delay(DockTimer::Hide, scheduler);

        if !matches!(self.state, HideState::Hidden | HideState::Hiding) {
            return;
        }

        if self.pending_delay() == Some(DockTimer::Unhide) {
            return;
        }

        if config.unhide_delay_ms == 0 {
            self.start_showing(scheduler);
        } else {
            let delay = Duration::from_millis(config.unhide_delay_ms);
            let id = scheduler.schedule(delay, DockTimer::Unhide);
            trace!(?delay, "scheduled unhide");
            self.delay = Some((id, DockTimer::Unhide));
        }
    }

    /// Handles a fired timer.
    ///
    /// Returns `true` if the timer belonged to this machine and a redraw is needed.
    pub fn on_timer(
        &mut self,
        id: TimerId,
        timer: DockTimer,
        config: &Config,
        scheduler: &mut impl Scheduler,
    ) -> bool {
        match timer {
            DockTimer::Hide | DockTimer::Unhide => {
                if self.delay != Some((id, timer)) {
                    trace!(id = id.get(), ?timer, "ignoring stale delay timer");
                    return false;
                }
                self.delay = None;

                match timer {
                    DockTimer::Hide
                        if matches!(self.state, HideState::Visible | HideState::Showing) =>
                    {
                        self.start_hiding(scheduler)
                    }
                    DockTimer::Unhide
                        if matches!(self.state, HideState::Hidden | HideState::Hiding) =>
                    {
                        self.start_showing(scheduler)
                    }
                    _ => (),
                }
                true
            }
            DockTimer::Pump => {
                if self.pump != Some(id) {
                    trace!(id = id.get(), "ignoring stale pump timer");
                    return false;
                }
                self.pump = None;
                self.tick(config, scheduler);
                true
            }
            DockTimer::Effects => false,
        }
    }

    /// Snaps back to visible and cancels every pending timer.
    ///
    /// Used when auto-hide gets switched off so a half-finished transition does not keep running.
    pub fn reset(&mut self, scheduler: &mut impl Scheduler) {
        if let Some((id, _)) = self.delay.take() {
            scheduler.cancel(id);
        }
        if let Some(id) = self.pump.take() {
            scheduler.cancel(id);
        }

        if self.state != HideState::Visible {
            debug!(from = ?self.state, "resetting to visible");
        }

        self.state = HideState::Visible;
        self.hide_offset = 0.;
        self.zoom_progress = 0.;
        self.progress = 0.;
    }

    fn start_hiding(&mut self, scheduler: &mut impl Scheduler) {
        debug!(from = ?self.state, "hiding");
        // 从中途的 SHOWING 反转时，从当前偏移继续，避免跳变：ease_in(p) = offset
        self.progress = self.hide_offset.clamp(0., 1.).cbrt();
        self.state = HideState::Hiding;
        self.start_pump(scheduler);
    }

    fn start_showing(&mut self, scheduler: &mut impl Scheduler) {
        debug!(from = ?self.state, "showing");
        // 1 - ease_out(p) = offset  =>  p = 1 - cbrt(offset)
        self.progress = 1. - self.hide_offset.clamp(0., 1.).cbrt();
        self.state = HideState::Showing;
        self.start_pump(scheduler);
    }

    fn cancel_delay(&mut self, timer: DockTimer, scheduler: &mut impl Scheduler) {
        if let Some((id, pending)) = self.delay {
            if pending == timer {
                scheduler.cancel(id);
                self.delay = None;
            }
        }
    }

    fn start_pump(&mut self, scheduler: &mut impl Scheduler) {
        if let Some(id) = self.pump.take() {
            scheduler.cancel(id);
        }
        self.pump = Some(scheduler.schedule(FRAME_INTERVAL, DockTimer::Pump));
    }

    fn tick(&mut self, config: &Config, scheduler: &mut impl Scheduler) {
        let frame = FRAME_INTERVAL.as_millis() as f64;
        let step = safe_div(frame, config.hide_time_ms as f64, 1.);
        self.progress = (self.progress + step).min(1.);

        match self.state {
            HideState::Hiding => {
                self.hide_offset = Curve::EaseInCubic.y(self.progress);
                self.zoom_progress = 1. - self.hide_offset;

                if self.progress >= 1. {
                    debug!("hidden");
                    self.state = HideState::Hidden;
                    self.hide_offset = 1.;
                    self.zoom_progress = 0.;
                    return;
                }
            }
            HideState::Showing => {
                self.hide_offset = 1. - Curve::EaseOutCubic.y(self.progress);
                self.zoom_progress = 1. - self.hide_offset;

                if self.progress >= 1. {
                    debug!("visible");
                    self.state = HideState::Visible;
                    self.hide_offset = 0.;
                    return;
                }
            }
            HideState::Visible | HideState::Hidden => return,
        }

        trace!(
            state = ?self.state,
            hide_offset = self.hide_offset,
            zoom_progress = self.zoom_progress,
            "auto-hide tick"
        );
        self.pump = Some(scheduler.schedule(FRAME_INTERVAL, DockTimer::Pump));
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::animation::Clock;
    use crate::scheduler::ManualScheduler;

    fn config() -> Config {
        Config {
            autohide: true,
            hide_time_ms: 128,
            ..Default::default()
        }
    }

    struct Harness {
        config: Config,
        clock: Clock,
        scheduler: ManualScheduler,
        autohide: AutoHide,
        ticks: usize,
    }

    impl Harness {
        fn new(config: Config) -> Self {
            let clock = Clock::with_time(Duration::ZERO);
            Self {
                config,
                scheduler: ManualScheduler::new(clock.clone()),
                clock,
                autohide: AutoHide::new(),
                ticks: 0,
            }
        }

        fn leave(&mut self) {
            self.autohide.on_pointer_leave(&self.config, &mut self.scheduler);
        }

        fn enter(&mut self) {
            self.autohide.on_pointer_enter(&self.config, &mut self.scheduler);
        }

        fn advance_ms(&mut self, ms: u64) {
            let until = self.clock.now() + Duration::from_millis(ms);
            while let Some((id, timer)) = self.scheduler.pop_due(until) {
                if self
                    .autohide
                    .on_timer(id, timer, &self.config, &mut self.scheduler)
                {
                    self.ticks += 1;
                }
            }
            self.clock.set(until);
        }

        fn settle(&mut self) {
            self.advance_ms(10_000);
        }
    }

    #[test]
    fn full_hide_and_show_cycle() {
        let mut h = Harness::new(config());

        h.leave();
        assert_eq!(h.autohide.state(), HideState::Hiding);

        let mut last = h.autohide.hide_offset();
        for _ in 0..7 {
            h.advance_ms(16);
            let offset = h.autohide.hide_offset();
            assert!(offset >= last);
            assert_abs_diff_eq!(h.autohide.zoom_progress(), 1. - offset, epsilon = 1e-12);
            last = offset;
        }
        assert_eq!(h.autohide.state(), HideState::Hiding);

        h.advance_ms(16);
        assert_eq!(h.autohide.state(), HideState::Hidden);
        assert_eq!(h.autohide.hide_offset(), 1.);
        assert_eq!(h.autohide.zoom_progress(), 0.);
        assert!(h.scheduler.is_empty());

        h.enter();
        assert_eq!(h.autohide.state(), HideState::Showing);
        h.settle();
        assert_eq!(h.autohide.state(), HideState::Visible);
        assert_eq!(h.autohide.hide_offset(), 0.);
        assert_eq!(h.autohide.zoom_progress(), 1.);
        assert!(h.scheduler.is_empty());
    }

    #[test]
    fn hide_uses_ease_in() {
        let mut h = Harness::new(config());
        h.leave();
        // 8 帧完成，第 4 帧时 p = 0.5
        h.advance_ms(16 * 4);
        assert_abs_diff_eq!(h.autohide.hide_offset(), 0.125, epsilon = 1e-9);
    }

    #[test]
    fn reset_mid_hide_cancels_pump() {
        let mut h = Harness::new(config());
        h.leave();
        h.advance_ms(48);
        assert!(h.autohide.hide_offset() > 0.);

        h.autohide.reset(&mut h.scheduler);
        assert_eq!(h.autohide.state(), HideState::Visible);
        assert_eq!(h.autohide.hide_offset(), 0.);
        assert_eq!(h.autohide.zoom_progress(), 0.);
        assert!(h.scheduler.is_empty());

        let ticks = h.ticks;
        h.settle();
        assert_eq!(h.ticks, ticks);
        assert_eq!(h.autohide.state(), HideState::Visible);
    }

    #[test]
    fn reset_cancels_pending_delay() {
        let mut config = config();
        config.hide_delay_ms = 500;
        let mut h = Harness::new(config);

        h.leave();
        assert_eq!(h.autohide.pending_delay(), Some(DockTimer::Hide));
        h.autohide.reset(&mut h.scheduler);
        assert_eq!(h.autohide.pending_delay(), None);

        h.settle();
        assert_eq!(h.autohide.state(), HideState::Visible);
    }

    #[test]
    fn repeated_leave_does_not_stack() {
        let mut config = config();
        config.hide_delay_ms = 100;
        let mut h = Harness::new(config);

        h.leave();
        h.leave();
        assert_eq!(h.scheduler.len(), 1);

        h.advance_ms(100);
        assert_eq!(h.autohide.state(), HideState::Hiding);
        h.leave();
        assert_eq!(h.scheduler.len(), 1);

        h.settle();
        assert_eq!(h.autohide.state(), HideState::Hidden);
    }

    #[test]
    fn repeated_enter_does_not_stack() {
        let mut h = Harness::new(config());
        h.leave();
        h.settle();

        h.enter();
        h.enter();
        assert_eq!(h.scheduler.len(), 1);
        h.settle();
        assert_eq!(h.autohide.state(), HideState::Visible);
    }

    #[test]
    fn enter_cancels_hide_delay() {
        let mut config = config();
        config.hide_delay_ms = 200;
        let mut h = Harness::new(config);

        h.leave();
        h.advance_ms(100);
        h.enter();
        assert_eq!(h.autohide.pending_delay(), None);

        h.settle();
        assert_eq!(h.autohide.state(), HideState::Visible);
        assert_eq!(h.autohide.hide_offset(), 0.);
    }

    #[test]
    fn unhide_delay_is_respected() {
        let mut config = config();
        config.unhide_delay_ms = 300;
        let mut h = Harness::new(config);

        h.leave();
        h.settle();
        h.enter();
        assert_eq!(h.autohide.state(), HideState::Hidden);
        assert_eq!(h.autohide.zoom_progress(), 1.);

        h.advance_ms(299);
        assert_eq!(h.autohide.state(), HideState::Hidden);
        h.advance_ms(1);
        assert_eq!(h.autohide.state(), HideState::Showing);

        // 离开会取消等待中的显示
        h.leave();
        h.enter();
        h.leave();
        assert_eq!(h.autohide.pending_delay(), None);
    }

    #[test]
    fn reversing_mid_transition_is_continuous() {
        let mut h = Harness::new(config());
        h.leave();
        h.advance_ms(16 * 6);
        let before = h.autohide.hide_offset();

        h.enter();
        assert_eq!(h.autohide.state(), HideState::Showing);
        assert_abs_diff_eq!(h.autohide.hide_offset(), before, epsilon = 1e-9);

        h.advance_ms(16);
        assert!(h.autohide.hide_offset() < before);
        assert!(h.autohide.hide_offset() > 0.);
    }

    #[test]
    fn disabled_is_noop() {
        let mut config = config();
        config.autohide = false;
        let mut h = Harness::new(config);

        h.leave();
        h.enter();
        assert!(h.scheduler.is_empty());
        assert_eq!(h.autohide.state(), HideState::Visible);
    }

    #[test]
    fn zero_duration_hides_in_one_tick() {
        let mut config = config();
        config.hide_time_ms = 0;
        let mut h = Harness::new(config);

        h.leave();
        h.advance_ms(16);
        assert_eq!(h.autohide.state(), HideState::Hidden);
        assert_eq!(h.ticks, 1);
    }

    #[test]
    fn stale_timers_are_ignored() {
        let mut h = Harness::new(config());
        h.leave();
        let (id, timer) = h.scheduler.pop_due(Duration::from_secs(1)).unwrap();
        assert!(h.autohide.on_timer(id, timer, &h.config, &mut h.scheduler));

        // 同一个 id 再来一次就是过期的
        assert!(!h.autohide.on_timer(id, timer, &h.config, &mut h.scheduler));
        assert!(!h
            .autohide
            .on_timer(id, DockTimer::Effects, &h.config, &mut h.scheduler));
    }
}
