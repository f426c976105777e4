//! The dock: input handling, timers and per-frame presentation.
//!
//! [`Dock`] owns every piece of mutable state of the core and hands the renderer a [`Frame`]
//! of computed values. Nothing is ever written back onto the [`DisplayItem`]s.
//!
//! 帧流程：
//!
//! ```text
//!   items ─┐
//!   cursor ┼─> compute_layout ─> content_bounds ─> shelf
//!   zoom ──┘          │
//!                     v
//!            effects (slide, hover, bounce, glow) ─> PresentedItem
//! ```

use std::time::Duration;

use docking_config::{Config, Position};

use crate::animation::Clock;
use crate::autohide::{AutoHide, HideState, FRAME_INTERVAL};
use crate::effects::tint::{Rgb, TintCache};
use crate::effects::EffectsTracker;
use crate::item::{DisplayItem, ItemId, ItemSource};
use crate::layout::{
    compute_layout, content_bounds, content_offset, hit_test, map_icon_position, rest_bounds,
    to_content_cursor, LayoutItem,
};
use crate::scheduler::{DockTimer, ManualScheduler, Scheduler, TimerId};

/// Per-frame factor by which the shelf width approaches its target.
pub const SHELF_SMOOTH_FACTOR: f64 = 0.3;

/// Everything the renderer needs to paint one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Increases by one with every computed frame.
    pub serial: u64,
    pub state: HideState,
    pub hide_offset: f64,
    pub zoom_progress: f64,
    pub shelf: Shelf,
    pub hovered: Option<ItemId>,
    pub items: Vec<PresentedItem>,
}

/// Background shelf along the main axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shelf {
    /// Window-space start along the main axis.
    pub main_pos: f64,
    pub width: f64,
    /// Cross-axis thickness, from the theme.
    pub height: f64,
    /// Distance the shelf is pushed towards the screen edge by the hide animation.
    pub hide_cross: f64,
}

/// Computed presentation of one item.
#[derive(Debug, Clone, PartialEq)]
pub struct PresentedItem {
    pub id: ItemId,
    /// Window-space main-axis position, slide offset included.
    pub main_pos: f64,
    /// Window-space top-left corner of the icon.
    pub pos: (f64, f64),
    pub scale: f64,
    /// Scaled main-axis extent.
    pub extent: f64,
    pub slide: f64,
    pub lighten: f64,
    pub darken: f64,
    /// Bounce height in pixels, away from the screen edge.
    pub bounce: f64,
    pub urgent_glow: f64,
    /// Opacity of the active-window glow on the shelf, zero for inactive items.
    pub active_glow: f64,
    /// Icon tint, computed for active and glowing items.
    pub tint: Option<Rgb>,
}

pub struct Dock<S: Scheduler> {
    config: Config,
    clock: Clock,
    scheduler: S,
    items: Box<dyn ItemSource>,

    autohide: AutoHide,
    effects: EffectsTracker,
    effects_pump: Option<TimerId>,
    tints: TintCache,

    /// Window-space pointer position along the main axis, negative when outside.
    cursor: f64,
    pointer_inside: bool,
    shelf_width: f64,
    serial: u64,
    redraw: bool,
}

impl<S: Scheduler> Dock<S> {
    pub fn new(config: Config, clock: Clock, scheduler: S, items: impl ItemSource + 'static) -> Self {
        Self {
            config,
            clock,
            scheduler,
            items: Box::new(items),
            autohide: AutoHide::new(),
            effects: EffectsTracker::new(),
            effects_pump: None,
            tints: TintCache::new(),
            cursor: -1.,
            pointer_inside: false,
            shelf_width: 0.,
            serial: 0,
            redraw: true,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn autohide(&self) -> &AutoHide {
        &self.autohide
    }

    pub fn effects(&self) -> &EffectsTracker {
        &self.effects
    }

    pub fn cursor(&self) -> f64 {
        self.cursor
    }

    pub fn is_effects_pumping(&self) -> bool {
        self.effects_pump.is_some()
    }

    /// Whether no timer of the dock is pending.
    pub fn is_idle(&self) -> bool {
        self.effects_pump.is_none()
            && !self.autohide.is_pumping()
            && self.autohide.pending_delay().is_none()
    }

    /// Returns whether a redraw was requested since the last call, and clears the request.
    pub fn take_redraw(&mut self) -> bool {
        std::mem::take(&mut self.redraw)
    }

    fn queue_redraw(&mut self) {
        self.redraw = true;
    }

    /// Replaces the config snapshot.
    pub fn set_config(&mut self, config: Config) {
        let was_autohide = self.config.autohide;
        self.config = config;

        match (was_autohide, self.config.autohide) {
            (true, false) => {
                debug!("auto-hide switched off");
                self.autohide.reset(&mut self.scheduler);
                if !self.pointer_inside {
                    self.cursor = -1.;
                }
            }
            (false, true) => {
                debug!("auto-hide switched on");
                if self.pointer_inside {
                    self.autohide
                        .on_pointer_enter(&self.config, &mut self.scheduler);
                } else {
                    self.autohide
                        .on_pointer_leave(&self.config, &mut self.scheduler);
                }
            }
            _ => (),
        }

        self.queue_redraw();
    }

    pub fn pointer_enter(&mut self, main: f64) {
        trace!(main, "pointer enter");
        self.cursor = main;
        self.pointer_inside = true;
        self.autohide
            .on_pointer_enter(&self.config, &mut self.scheduler);
        self.queue_redraw();
    }

    pub fn pointer_motion(&mut self, main: f64) {
        self.cursor = main;
        self.pointer_inside = true;
        self.queue_redraw();
    }

    pub fn pointer_leave(&mut self) {
        trace!("pointer leave");
        self.pointer_inside = false;

        // 自动隐藏时保留光标，缩放随隐藏动画一起淡出；完全隐藏后再清除
        if !self.config.autohide {
            self.cursor = -1.;
        }

        self.autohide
            .on_pointer_leave(&self.config, &mut self.scheduler);
        self.queue_redraw();
    }

    pub fn click(&mut self, id: &ItemId) {
        let now = self.clock.now();
        self.effects.trigger_click(id, now);
        self.start_effects_pump();
        self.queue_redraw();
    }

    pub fn launch(&mut self, id: &ItemId) {
        let now = self.clock.now();
        self.effects.trigger_launch(id, now);
        self.start_effects_pump();
        self.queue_redraw();
    }

    pub fn set_urgent(&mut self, id: &ItemId, urgent: bool) {
        if urgent {
            let now = self.clock.now();
            self.effects.trigger_urgent(id, now);
            self.start_effects_pump();
        } else {
            self.effects.clear_urgent(id);
        }
        self.queue_redraw();
    }

    /// Reports that the item at `index` moved from `old_pos` to `new_pos` (window space).
    ///
    /// Out-of-range indices are ignored.
    pub fn report_reorder(&mut self, index: usize, old_pos: f64, new_pos: f64) -> bool {
        let items = self.items.visible_items();
        let Some(item) = items.get(index) else {
            debug!(index, len = items.len(), "ignoring reorder of missing item");
            return false;
        };

        self.effects.seed_slide(&item.id, old_pos, new_pos);
        self.start_effects_pump();
        self.queue_redraw();
        true
    }

    /// Handles a fired timer, returning whether it requested a redraw.
    pub fn on_timer(&mut self, id: TimerId, timer: DockTimer) -> bool {
        let redraw = match timer {
            DockTimer::Effects => {
                if self.effects_pump != Some(id) {
                    trace!(id = id.get(), "ignoring stale effects timer");
                    return false;
                }
                self.effects_pump = None;

                let now = self.clock.now();
                if self.effects.is_animating(now, &self.config.theme, self.is_hidden()) {
                    self.start_effects_pump();
                }
                true
            }
            _ => self
                .autohide
                .on_timer(id, timer, &self.config, &mut self.scheduler),
        };

        if redraw {
            self.after_autohide_change();
            self.queue_redraw();
        }
        redraw
    }

    /// Item under a window-space pointer position.
    pub fn item_at(&self, main: f64, main_size: f64) -> Option<ItemId> {
        let items = self.items.visible_items();
        let (layout, local) = self.layout(&items, main, main_size);
        hit_test(&layout, local, self.config.theme.item_padding).map(|idx| items[idx].id.clone())
    }

    fn layout(&self, items: &[DisplayItem], cursor: f64, main_size: f64) -> (Vec<LayoutItem>, f64) {
        let theme = &self.config.theme;
        let rest = rest_bounds(items, self.config.icon_size, theme.h_padding, theme.item_padding);
        let local = to_content_cursor(cursor, main_size, rest);
        let layout = compute_layout(
            items,
            &self.config,
            local,
            theme.item_padding,
            theme.h_padding,
            self.zoom_progress(),
        );
        (layout, local)
    }

    fn zoom_progress(&self) -> f64 {
        if self.config.autohide {
            self.autohide.zoom_progress()
        } else {
            1.
        }
    }

    fn is_hidden(&self) -> bool {
        self.autohide.hide_offset() >= 1.
    }

    fn after_autohide_change(&mut self) {
        if self.autohide.state() != HideState::Hidden {
            return;
        }

        if !self.pointer_inside && self.cursor >= 0. {
            trace!("hidden, clearing cursor");
            self.cursor = -1.;
        }

        // 隐藏状态下紧急辉光需要持续重绘
        let now = self.clock.now();
        if self.effects_pump.is_none() && self.effects.has_urgent_glow(now, &self.config.theme) {
            self.start_effects_pump();
        }
    }

    /// Starts the effects pump, replacing a pending one.
    fn start_effects_pump(&mut self) {
        if let Some(id) = self.effects_pump.take() {
            self.scheduler.cancel(id);
        }
        self.effects_pump = Some(self.scheduler.schedule(FRAME_INTERVAL, DockTimer::Effects));
    }

    /// Computes the next frame for a window of the given size.
    ///
    /// Steps the per-frame effects (hover fade, slide decay), so it should be called once per
    /// painted frame.
    pub fn frame(&mut self, main_size: f64, cross_size: f64) -> Frame {
        let _span = tracy_client::span!("Dock::frame");

        self.serial += 1;
        let now = self.clock.now();
        let items = self.items.visible_items();
        let theme = self.config.theme.clone();

        self.effects.observe_items(&items, now, &theme);
        self.effects.prune(now, &theme);
        self.tints.retain(&items);

        let hide_offset = self.autohide.hide_offset();
        let zoom_progress = self.zoom_progress();
        let hidden = self.is_hidden();

        let (layout, local) = self.layout(&items, self.cursor, main_size);
        let bounds = content_bounds(&layout, theme.h_padding, theme.item_padding);
        let offset = content_offset(main_size, bounds);

        // 隐藏/显示过程中不平滑，保证架子和图标严格对齐
        let target = bounds.width();
        if self.shelf_width == 0. || hide_offset > 0. {
            self.shelf_width = target;
        } else {
            self.shelf_width += (target - self.shelf_width) * SHELF_SMOOTH_FACTOR;
        }

        let hide_cross = hide_offset * cross_size;
        let shelf = Shelf {
            main_pos: (main_size - self.shelf_width) / 2.,
            width: self.shelf_width,
            height: theme.shelf_height,
            hide_cross,
        };

        let hovered = if self.pointer_inside && !hidden {
            hit_test(&layout, local, theme.item_padding).map(|idx| items[idx].id.clone())
        } else {
            None
        };

        let positions: Vec<_> = items
            .iter()
            .zip(&layout)
            .map(|(item, li)| (item.id.clone(), li.x + offset))
            .collect();
        self.effects.update_slides(&positions);
        self.effects.update_hover(&items, hovered.as_ref(), &theme);

        let position = self.config.position;
        let presented = items
            .iter()
            .zip(&layout)
            .map(|(item, li)| {
                self.present(item, li, offset, now, cross_size, hide_cross, hidden, position)
            })
            .collect();

        if self.effects_pump.is_none() && self.effects.is_animating(now, &theme, hidden) {
            self.start_effects_pump();
        }

        trace!(
            serial = self.serial,
            hide_offset,
            zoom_progress,
            cursor = local,
            "frame"
        );

        Frame {
            serial: self.serial,
            state: self.autohide.state(),
            hide_offset,
            zoom_progress,
            shelf,
            hovered,
            items: presented,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn present(
        &mut self,
        item: &DisplayItem,
        li: &LayoutItem,
        offset: f64,
        now: Duration,
        cross_size: f64,
        hide_cross: f64,
        hidden: bool,
        position: Position,
    ) -> PresentedItem {
        let theme = &self.config.theme;
        let icon_size = self.config.icon_size;
        let id = &item.id;

        let slide = self.effects.slide_offset(id);
        let main_pos = li.x + offset + slide;
        let bounce = self.effects.bounce(id, now, icon_size, theme);
        let pos = map_icon_position(
            position,
            main_pos,
            cross_size,
            theme.bottom_padding,
            icon_size * li.scale,
            hide_cross,
            bounce,
        );

        // 紧急辉光只在完全隐藏时画在屏幕边缘
        let urgent_glow = if hidden {
            self.effects.urgent_glow_opacity(id, now, theme)
        } else {
            0.
        };

        let lighten = self.effects.hover_lighten(id);
        let darken = self.effects.click_darken(id, now, theme);

        let active_glow = if item.is_active {
            theme.glow_opacity.clamp(0., 1.)
        } else {
            0.
        };

        let tint = (item.is_active || urgent_glow > 0.).then(|| self.tints.get(item));

        PresentedItem {
            id: id.clone(),
            main_pos,
            pos,
            scale: li.scale,
            extent: li.extent(),
            slide,
            lighten,
            darken,
            bounce,
            urgent_glow,
            active_glow,
            tint,
        }
    }
}

impl Dock<ManualScheduler> {
    /// Fires every timer due within `delta` in order, then moves the clock to the end of it.
    ///
    /// Returns the number of timers that requested a redraw.
    pub fn advance(&mut self, delta: Duration) -> usize {
        let until = self.clock.now().saturating_add(delta);

        let mut redraws = 0;
        while let Some((id, timer)) = self.scheduler.pop_due(until) {
            if self.on_timer(id, timer) {
                redraws += 1;
            }
        }

        self.clock.set(until);
        redraws
    }
}
