//! Parabolic zoom layout.
//!
//! Maps the dock items, the pointer position along the main axis and the current zoom progress
//! to a position and a scale per item. Everything here is a pure function of its inputs: the
//! result is recomputed every frame and never stored.
//!
//! Coordinates are *content-local*: `0` is where the content would start if it had no padding,
//! so the first item rests at `edge_padding`. [`content_offset`] translates content-local
//! coordinates to window coordinates, and [`to_content_cursor`] goes the other way for the
//! pointer.
//!
//! ```text
//!   cursor:              v
//!   rest:        [A]  [B]  [C]  [D]  [E]
//!   zoomed:     [A] [B]  [CCC]  [D] [E]
//!                  <-            ->
//! ```
//!
//! Each item is pushed away from the cursor by an amount that only depends on its own distance
//! from the cursor, so far items all settle at the same constant shift instead of accumulating
//! their neighbours' shifts.

use docking_config::{Config, Position};
use serde::Serialize;

use crate::item::DisplayItem;
use crate::utils::safe_div;

#[cfg(test)]
mod tests;

/// Normalized distances above this are snapped to exactly `1.0`.
///
/// Without the snap, items right at the edge of the zoom range get a tiny residual scale and
/// displacement that flickers as the pointer moves.
pub const OFFSET_PCT_SNAP: f64 = 0.99;

/// Computed position and scale of a single item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LayoutItem {
    /// Start of the item along the main axis, content-local.
    pub x: f64,
    /// Scale factor, `1.0` is the rest size.
    pub scale: f64,
    /// Unscaled main-axis size of the drawn box.
    ///
    /// At rest this is the item's spacing size. While zooming every item is drawn as an
    /// icon-sized box around its pushed center, so it is the icon size.
    pub size: f64,
}

impl LayoutItem {
    /// Scaled main-axis extent.
    pub fn extent(&self) -> f64 {
        self.size * self.scale
    }

    pub fn center(&self) -> f64 {
        self.x + self.extent() / 2.
    }
}

/// Edges of the content along the main axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub left: f64,
    pub right: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.right - self.left
    }
}

/// Computes per-item positions and scales.
///
/// `cursor_main` is the content-local pointer position along the main axis, or any negative
/// value when the pointer is outside of the dock. `zoom_progress` in `0..=1` scales how much of
/// the zoom and displacement is applied.
pub fn compute_layout(
    items: &[DisplayItem],
    config: &Config,
    cursor_main: f64,
    item_gap: f64,
    edge_padding: f64,
    zoom_progress: f64,
) -> Vec<LayoutItem> {
    let _span = tracy_client::span!("compute_layout");

    if items.is_empty() {
        return Vec::new();
    }

    let icon_size = config.icon_size;
    let zoom_percent = config.effective_zoom();
    let zoom_progress = if zoom_progress.is_nan() {
        0.
    } else {
        zoom_progress.clamp(0., 1.)
    };

    // 位移半径：一个放大后图标的宽度。只有紧邻的图标被明显推开。
    let zoom_icon_size = icon_size * zoom_percent;
    // 缩放衰减半径：不超过 zoom_range 个图标宽度。
    let scale_horizon = icon_size * zoom_percent.min(config.zoom_range);

    let zooming = cursor_main >= 0. && zoom_icon_size > 0. && zoom_percent.is_finite();

    let mut rv = Vec::with_capacity(items.len());
    let mut x = edge_padding;
    for item in items {
        let size = item.spacing_size(icon_size);
        let rest_x = x;
        x += size + item_gap;

        if !zooming {
            rv.push(LayoutItem {
                x: rest_x,
                scale: 1.,
                size,
            });
            continue;
        }

        let rest_center = rest_x + size / 2.;
        let distance = (cursor_main - rest_center).abs();

        let offset = distance.min(zoom_icon_size);
        let offset_pct = snap(safe_div(offset, zoom_icon_size, 1.));

        // 位移 = 距离 × 放大量 × 锥形因子 × 进度
        // 锥形因子 (1 - pct/3) 在范围边缘处把推力减到 2/3，避免边界处跳变
        let displacement =
            offset * (zoom_percent - 1.) * (1. - offset_pct / 3.) * zoom_progress;

        let center = if cursor_main > rest_center {
            rest_center - displacement
        } else {
            rest_center + displacement
        };

        let scale_pct = if scale_horizon > 0. {
            snap(distance.min(scale_horizon) / scale_horizon)
        } else {
            1.
        };
        // 抛物线衰减：光标下方最大，边缘处平滑降到 1
        let zoom_factor = 1. - scale_pct * scale_pct;
        let scale = 1. + zoom_factor * (zoom_percent - 1.) * zoom_progress;

        // 位移和缩放都围绕视觉中心进行；尺寸覆盖只影响间距，绘制框始终是图标大小
        rv.push(LayoutItem {
            x: center - icon_size * scale / 2.,
            scale,
            size: icon_size,
        });
    }

    rv
}

fn snap(pct: f64) -> f64 {
    if pct > OFFSET_PCT_SNAP {
        1.
    } else {
        pct
    }
}

/// Left and right edges of the content, including displacement and zoom.
///
/// Each edge extends `edge_padding` plus half an item gap past the outermost item, so the shelf
/// keeps the same margin regardless of zoom.
pub fn content_bounds(layout: &[LayoutItem], edge_padding: f64, item_gap: f64) -> Bounds {
    let pad = edge_padding + item_gap / 2.;

    let (Some(first), Some(last)) = (layout.first(), layout.last()) else {
        return Bounds {
            left: 0.,
            right: 2. * pad,
        };
    };

    Bounds {
        left: first.x - pad,
        right: last.x + last.extent() + pad,
    }
}

/// Content width with every item at rest.
///
/// This is the width used to convert pointer coordinates into content-local space, and it must
/// stay equal to the width of [`content_bounds`] for a rest layout; otherwise zoom centers on
/// the wrong point.
pub fn rest_width(items: &[DisplayItem], icon_size: f64, edge_padding: f64, item_gap: f64) -> f64 {
    let pad = edge_padding + item_gap / 2.;
    let sizes: f64 = items.iter().map(|item| item.spacing_size(icon_size)).sum();
    let gaps = items.len().saturating_sub(1) as f64 * item_gap;
    2. * pad + sizes + gaps
}

/// Content bounds with every item at rest, computed without a layout.
pub fn rest_bounds(items: &[DisplayItem], icon_size: f64, edge_padding: f64, item_gap: f64) -> Bounds {
    if items.is_empty() {
        return content_bounds(&[], edge_padding, item_gap);
    }

    let left = -item_gap / 2.;
    Bounds {
        left,
        right: left + rest_width(items, icon_size, edge_padding, item_gap),
    }
}

/// Offset translating content-local coordinates to window coordinates.
///
/// Centers `bounds` inside a window of `main_size`.
pub fn content_offset(main_size: f64, bounds: Bounds) -> f64 {
    (main_size - bounds.width()) / 2. - bounds.left
}

/// Converts a window pointer position to content-local space.
///
/// Uses the rest bounds so that the conversion does not depend on the zoom it drives. Negative
/// input stays "outside".
pub fn to_content_cursor(cursor_main: f64, main_size: f64, rest: Bounds) -> f64 {
    if !(cursor_main >= 0.) {
        return -1.;
    }

    cursor_main - content_offset(main_size, rest)
}

/// Index of the item under the content-local cursor.
///
/// Each item owns half of the gap on either side of it.
pub fn hit_test(layout: &[LayoutItem], local_cursor: f64, item_gap: f64) -> Option<usize> {
    if !(local_cursor >= 0.) {
        return None;
    }

    let half_gap = item_gap / 2.;
    layout.iter().position(|item| {
        let start = item.x - half_gap;
        let end = item.x + item.extent() + half_gap;
        start <= local_cursor && local_cursor < end
    })
}

/// Maps a main-axis position to the window-space top-left corner of an icon.
///
/// `hide_cross` pushes the icon towards the screen edge, `bounce` lifts it away from it.
pub fn map_icon_position(
    position: Position,
    main_pos: f64,
    cross_size: f64,
    edge_padding: f64,
    scaled_size: f64,
    hide_cross: f64,
    bounce: f64,
) -> (f64, f64) {
    let cross_rest = cross_size - edge_padding - scaled_size;
    match position {
        Position::Bottom => (main_pos, cross_rest + hide_cross - bounce),
        Position::Top => (main_pos, edge_padding - hide_cross + bounce),
        Position::Left => (edge_padding - hide_cross + bounce, main_pos),
        Position::Right => (cross_rest + hide_cross - bounce, main_pos),
    }
}
