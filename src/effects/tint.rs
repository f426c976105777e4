//! Icon tint: the dominant color of an icon, used for the active and urgent glows.
//!
//! 用饱和度加权平均：灰色像素（图标背景常见）权重接近 0，鲜艳像素占主导。
//! 普通平均会得到发灰发棕的颜色。

use std::collections::HashMap;
use std::rc::Rc;

use crate::item::{DisplayItem, ItemId};

/// Pixels with alpha below this are skipped.
const ALPHA_THRESHOLD: u8 = 25;

/// Decoded icon pixels, 8 bits per channel, RGB or RGBA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IconImage {
    pub width: usize,
    pub height: usize,
    /// Bytes per row, at least `width * channels`.
    pub stride: usize,
    /// 3 (RGB) or 4 (RGBA).
    pub channels: usize,
    pub data: Vec<u8>,
}

impl IconImage {
    /// Creates a tightly packed RGBA image.
    pub fn from_rgba(width: usize, height: usize, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride: width * 4,
            channels: 4,
            data,
        }
    }

    /// Creates an image filled with a single RGBA color.
    pub fn solid(width: usize, height: usize, rgba: [u8; 4]) -> Self {
        let data = rgba.repeat(width * height);
        Self::from_rgba(width, height, data)
    }

    /// Returns the RGBA value of a pixel, or `None` if it lies outside the buffer.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if self.channels < 3 || x >= self.width || y >= self.height {
            return None;
        }

        let offset = y
            .checked_mul(self.stride)?
            .checked_add(x.checked_mul(self.channels)?)?;
        let px = self.data.get(offset..offset.checked_add(self.channels)?)?;
        let a = if self.channels >= 4 { px[3] } else { u8::MAX };
        Some([px[0], px[1], px[2], a])
    }
}

/// Color with channels in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const NEUTRAL: Self = Self {
        r: 0.5,
        g: 0.5,
        b: 0.5,
    };

    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }
}

/// Saturation-weighted average color of an icon.
///
/// Each opaque pixel is weighted by `(max - min) / max` of its channels. Missing, fully
/// transparent and fully gray icons give [`Rgb::NEUTRAL`].
pub fn average_icon_color(icon: Option<&IconImage>) -> Rgb {
    let Some(icon) = icon else {
        return Rgb::NEUTRAL;
    };

    let mut r_total = 0.;
    let mut g_total = 0.;
    let mut b_total = 0.;
    let mut score_total = 0.;
    let mut count = 0usize;

    for y in 0..icon.height {
        for x in 0..icon.width {
            let Some([r, g, b, a]) = icon.pixel(x, y) else {
                continue;
            };
            if a < ALPHA_THRESHOLD {
                continue;
            }

            let max = r.max(g).max(b);
            let min = r.min(g).min(b);
            let score = if max > 0 {
                f64::from(max - min) / f64::from(max)
            } else {
                0.
            };

            r_total += score * f64::from(r) / 255.;
            g_total += score * f64::from(g) / 255.;
            b_total += score * f64::from(b) / 255.;
            score_total += score;
            count += 1;
        }
    }

    if count == 0 || score_total <= 0. {
        return Rgb::NEUTRAL;
    }

    let mut rv = Rgb::new(
        r_total / score_total,
        g_total / score_total,
        b_total / score_total,
    );

    // 舍入误差可能让某个通道略超过 1
    let max = rv.r.max(rv.g).max(rv.b);
    if max > 1. {
        rv.r /= max;
        rv.g /= max;
        rv.b /= max;
    }

    rv
}

/// Per-item cache of icon tints.
///
/// Computing a tint walks every pixel, so it is done once per icon. An entry is recomputed when
/// the item's icon is replaced.
#[derive(Debug, Default)]
pub struct TintCache {
    entries: HashMap<ItemId, (Option<Rc<IconImage>>, Rgb)>,
}

impl TintCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&mut self, item: &DisplayItem) -> Rgb {
        if let Some((cached, color)) = self.entries.get(&item.id) {
            let same_icon = match (cached, &item.icon) {
                (Some(a), Some(b)) => Rc::ptr_eq(a, b),
                (None, None) => true,
                _ => false,
            };
            if same_icon {
                return *color;
            }
        }

        let color = average_icon_color(item.icon.as_deref());
        trace!(id = %item.id, ?color, "computed icon tint");
        self.entries.insert(item.id.clone(), (item.icon.clone(), color));
        color
    }

    /// Drops entries for items that are no longer shown.
    pub fn retain(&mut self, items: &[DisplayItem]) {
        self.entries
            .retain(|id, _| items.iter().any(|item| &item.id == id));
    }
}
