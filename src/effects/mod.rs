//! Transient per-item effects.
//!
//! Every effect is keyed by [`ItemId`] and decays back to exactly zero, at which point its entry
//! is removed. The tracker is stepped once per frame by the dock and sampled by the renderer:
//!
//! - hover lighten, a linear fade towards [`Theme::hover_lighten`] on the hovered item;
//! - click darken, a one-shot sine pulse;
//! - launch and urgent bounce, see [`crate::animation::bounce`];
//! - reorder slide, an exponentially decaying offset seeded by position jumps;
//! - urgent glow, a pulsing opacity during the glow window after an item turns urgent.

use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;
use std::time::Duration;

use docking_config::Theme;

use crate::animation::bounce_at;
use crate::autohide::FRAME_INTERVAL;
use crate::item::{DisplayItem, ItemId};

pub mod tint;

/// Position jumps of at most this many pixels between frames do not start a slide.
pub const SLIDE_MOVE_THRESHOLD: f64 = 2.;
/// Per-frame slide multiplier, settles in about 300 ms at 60 fps.
pub const SLIDE_DECAY: f64 = 0.75;
/// Slides smaller than this are dropped.
pub const SLIDE_CLEAR_THRESHOLD: f64 = 0.5;
/// Peak opacity of the click darken pulse.
pub const CLICK_DARKEN_MAX: f64 = 0.5;

/// Lowest urgent glow opacity.
const GLOW_MIN: f64 = 0.2;
/// Urgent glow amplitude on top of [`GLOW_MIN`].
const GLOW_RANGE: f64 = 0.75;

#[derive(Debug, Default)]
pub struct EffectsTracker {
    hovered: Option<ItemId>,
    hover: HashMap<ItemId, f64>,
    slide: HashMap<ItemId, f64>,
    /// Window-space positions from the previous frame.
    prev_positions: HashMap<ItemId, f64>,
    clicked: HashMap<ItemId, Duration>,
    launched: HashMap<ItemId, Duration>,
    /// When each currently urgent item became urgent.
    urgent: HashMap<ItemId, Duration>,
    /// Items last seen with `DisplayItem::is_urgent` set.
    ///
    /// Only a flag going from set to unset clears urgency; urgency reported through
    /// [`EffectsTracker::trigger_urgent`] stays until [`EffectsTracker::clear_urgent`].
    urgent_flagged: HashSet<ItemId>,
}

/// One-shot pulse: `sin(π·t/d) × max` for `t` in `0..d`, zero otherwise.
pub fn click_darken(elapsed: Duration, duration: Duration) -> f64 {
    if duration.is_zero() || elapsed >= duration {
        return 0.;
    }

    let p = elapsed.as_secs_f64() / duration.as_secs_f64();
    (PI * p).sin().max(0.) * CLICK_DARKEN_MAX
}

/// Urgent glow opacity `elapsed` after the item became urgent.
///
/// Oscillates between 0.2 and 0.95 with period `pulse`, and is zero once `glow_time` has
/// passed.
pub fn urgent_glow_opacity(elapsed: Duration, glow_time: Duration, pulse: Duration) -> f64 {
    if elapsed >= glow_time || pulse.is_zero() {
        return 0.;
    }

    let phase = elapsed.as_secs_f64() / pulse.as_secs_f64() * 2. * PI;
    GLOW_MIN + GLOW_RANGE * (phase.sin() + 1.) / 2.
}

/// Per-frame hover lighten step.
fn hover_step(theme: &Theme) -> f64 {
    let frame = FRAME_INTERVAL.as_millis() as u64;
    let frames = (theme.active_time_ms / frame).max(1);
    theme.hover_lighten / frames as f64
}

fn ms(ms: u64) -> Duration {
    Duration::from_millis(ms)
}

impl EffectsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger_click(&mut self, id: &ItemId, now: Duration) {
        trace!(%id, "click");
        self.clicked.insert(id.clone(), now);
    }

    pub fn trigger_launch(&mut self, id: &ItemId, now: Duration) {
        debug!(%id, "launch bounce");
        self.launched.insert(id.clone(), now);
    }

    /// Marks an item urgent, restarting the urgent bounce and glow.
    pub fn trigger_urgent(&mut self, id: &ItemId, now: Duration) {
        debug!(%id, "urgent");
        self.urgent.insert(id.clone(), now);
    }

    pub fn clear_urgent(&mut self, id: &ItemId) {
        if self.urgent.remove(id).is_some() {
            debug!(%id, "no longer urgent");
        }
    }

    /// Picks up timestamps recorded on the items themselves and forgets removed items.
    ///
    /// Only timestamps newer than what is tracked, and still inside their effect window, are
    /// taken, so old timestamps do not restart finished effects.
    pub fn observe_items(&mut self, items: &[DisplayItem], now: Duration, theme: &Theme) {
        for item in items {
            let id = &item.id;

            observe(
                &mut self.clicked,
                id,
                item.last_clicked,
                now,
                ms(theme.click_time_ms),
            );
            observe(
                &mut self.launched,
                id,
                item.last_launched,
                now,
                ms(theme.launch_bounce_time_ms),
            );

            if item.is_urgent {
                let window = ms(theme.urgent_glow_time_ms.max(theme.urgent_bounce_time_ms));
                observe(&mut self.urgent, id, item.last_urgent, now, window);
                self.urgent_flagged.insert(id.clone());
            } else if self.urgent_flagged.remove(id) {
                self.clear_urgent(id);
            }
        }

        let present = |id: &ItemId| items.iter().any(|item| &item.id == id);
        self.hover.retain(|id, _| present(id));
        self.slide.retain(|id, _| present(id));
        self.prev_positions.retain(|id, _| present(id));
        self.clicked.retain(|id, _| present(id));
        self.launched.retain(|id, _| present(id));
        self.urgent.retain(|id, _| present(id));
        self.urgent_flagged.retain(|id| present(id));
        if self.hovered.as_ref().is_some_and(|id| !present(id)) {
            self.hovered = None;
        }
    }

    /// Advances the hover lighten values by one frame.
    pub fn update_hover(&mut self, items: &[DisplayItem], hovered: Option<&ItemId>, theme: &Theme) {
        let max = theme.hover_lighten.max(0.);
        let step = hover_step(theme);
        self.hovered = hovered.cloned();

        for item in items {
            let id = &item.id;
            let current = self.hover.get(id).copied().unwrap_or(0.);

            if Some(id) == hovered {
                if max > 0. {
                    self.hover.insert(id.clone(), (current + step).min(max));
                }
            } else if current > 0. {
                let value = (current - step).max(0.);
                if value > 0. {
                    self.hover.insert(id.clone(), value);
                } else {
                    self.hover.remove(id);
                }
            }
        }

        self.hover
            .retain(|id, _| items.iter().any(|item| &item.id == id));
    }

    /// Advances slides by one frame given this frame's window-space item positions.
    ///
    /// An item that jumped by more than [`SLIDE_MOVE_THRESHOLD`] since the previous frame gets
    /// the jump added to its slide offset, so it renders where it was and glides to its new
    /// position.
    pub fn update_slides(&mut self, positions: &[(ItemId, f64)]) {
        for (id, new) in positions {
            if let Some(old) = self.prev_positions.get(id) {
                if (old - new).abs() > SLIDE_MOVE_THRESHOLD {
                    *self.slide.entry(id.clone()).or_insert(0.) += old - new;
                }
            }
        }

        self.slide.retain(|_, offset| {
            *offset *= SLIDE_DECAY;
            offset.abs() >= SLIDE_CLEAR_THRESHOLD
        });

        self.prev_positions = positions.iter().cloned().collect();
    }

    /// Seeds a slide for an item that moved from `old` to `new` outside of frame tracking.
    pub fn seed_slide(&mut self, id: &ItemId, old: f64, new: f64) {
        let delta = old - new;
        if !delta.is_finite() || delta.abs() <= SLIDE_MOVE_THRESHOLD {
            return;
        }

        trace!(%id, delta, "seeding slide");
        *self.slide.entry(id.clone()).or_insert(0.) += delta;
        // 下一帧按新位置比较，不要再算一次同样的跳变
        self.prev_positions.insert(id.clone(), new);
    }

    pub fn hover_lighten(&self, id: &ItemId) -> f64 {
        self.hover.get(id).copied().unwrap_or(0.)
    }

    pub fn slide_offset(&self, id: &ItemId) -> f64 {
        self.slide.get(id).copied().unwrap_or(0.)
    }

    pub fn click_darken(&self, id: &ItemId, now: Duration, theme: &Theme) -> f64 {
        self.clicked.get(id).map_or(0., |start| {
            click_darken(now.saturating_sub(*start), ms(theme.click_time_ms))
        })
    }

    /// Bounce height in pixels, launch and urgent bounces combined.
    pub fn bounce(&self, id: &ItemId, now: Duration, icon_size: f64, theme: &Theme) -> f64 {
        let mut rv = 0.;

        if let Some(start) = self.launched.get(id) {
            let t = now.saturating_sub(*start);
            rv += bounce_at(t, ms(theme.launch_bounce_time_ms), 2)
                * icon_size
                * theme.launch_bounce_height;
        }

        if let Some(start) = self.urgent.get(id) {
            let t = now.saturating_sub(*start);
            rv += bounce_at(t, ms(theme.urgent_bounce_time_ms), 1)
                * icon_size
                * theme.urgent_bounce_height;
        }

        if rv.is_finite() {
            rv.max(0.)
        } else {
            0.
        }
    }

    pub fn urgent_glow_opacity(&self, id: &ItemId, now: Duration, theme: &Theme) -> f64 {
        self.urgent.get(id).map_or(0., |start| {
            if now < *start {
                return 0.;
            }
            urgent_glow_opacity(
                now - *start,
                ms(theme.urgent_glow_time_ms),
                ms(theme.urgent_glow_pulse_ms),
            )
        })
    }

    /// Whether any effect still needs frames.
    ///
    /// The urgent glow is only drawn while the dock is fully hidden, so it only counts when
    /// `hidden` is set.
    pub fn is_animating(&self, now: Duration, theme: &Theme, hidden: bool) -> bool {
        let max = theme.hover_lighten.max(0.);
        let hover = self.hover.iter().any(|(id, value)| {
            let target = if Some(id) == self.hovered.as_ref() {
                max
            } else {
                0.
            };
            *value != target
        });
        if hover || !self.slide.is_empty() {
            return true;
        }

        let running = |map: &HashMap<ItemId, Duration>, duration: u64| {
            map.values()
                .any(|start| now.saturating_sub(*start) < ms(duration))
        };

        running(&self.clicked, theme.click_time_ms)
            || running(&self.launched, theme.launch_bounce_time_ms)
            || running(&self.urgent, theme.urgent_bounce_time_ms)
            || (hidden && running(&self.urgent, theme.urgent_glow_time_ms))
    }

    /// Whether any item is inside its urgent glow window.
    pub fn has_urgent_glow(&self, now: Duration, theme: &Theme) -> bool {
        self.urgent
            .values()
            .any(|start| now.saturating_sub(*start) < ms(theme.urgent_glow_time_ms))
    }

    /// Drops finished one-shot effects.
    pub fn prune(&mut self, now: Duration, theme: &Theme) {
        let click = ms(theme.click_time_ms);
        let launch = ms(theme.launch_bounce_time_ms);
        self.clicked.retain(|_, start| now.saturating_sub(*start) < click);
        self.launched
            .retain(|_, start| now.saturating_sub(*start) < launch);
        // 紧急标记保留到 set_urgent(false)，辉光由时间窗口自己归零
    }

    /// Number of tracked entries across all effects.
    pub fn tracked(&self) -> usize {
        self.hover.len()
            + self.slide.len()
            + self.clicked.len()
            + self.launched.len()
            + self.urgent.len()
    }
}

fn observe(
    map: &mut HashMap<ItemId, Duration>,
    id: &ItemId,
    stamp: Option<Duration>,
    now: Duration,
    window: Duration,
) {
    let Some(stamp) = stamp else {
        return;
    };
    if stamp > now || now - stamp >= window {
        return;
    }
    if map.get(id).is_some_and(|tracked| *tracked >= stamp) {
        return;
    }
    map.insert(id.clone(), stamp);
}
