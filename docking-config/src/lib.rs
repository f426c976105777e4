//! 配置模块：dock 的数值配置快照与主题常量
//!
//! 职责：
//! - 定义布局引擎、自动隐藏状态机、动画效果所需的全部参数
//! - 从 JSON 文件加载配置（缺失字段取默认值，未知字段忽略）
//!
//! 核心只读取这里的值，从不修改；每次计算都会传入一份新的快照。

#[macro_use]
extern crate tracing;

use std::path::Path;

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

/// Screen edge the dock is anchored to.
///
/// 坐标约定：
///   主轴 (main axis)  -- 图标排列方向（底部/顶部为水平，左/右为垂直）
///   交叉轴 (cross axis) -- 垂直于主轴，朝向/远离屏幕边缘
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[default]
    Bottom,
    Top,
    Left,
    Right,
}

impl Position {
    /// Whether icons are laid out left-to-right.
    pub fn is_horizontal(self) -> bool {
        matches!(self, Position::Bottom | Position::Top)
    }
}

/// Dock configuration snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base icon size in pixels, before zoom.
    pub icon_size: f64,
    pub zoom_enabled: bool,
    /// Maximum zoom multiplier (1.5 = 150%).
    pub zoom_percent: f64,
    /// Number of icon widths over which the zoom tapers off.
    pub zoom_range: f64,
    pub position: Position,
    pub autohide: bool,
    // 单位均为毫秒
    pub hide_delay_ms: u64,
    pub unhide_delay_ms: u64,
    pub hide_time_ms: u64,
    pub theme: Theme,
}

/// Theme constants: layout paddings and animation parameters.
///
/// These are loaded, never computed. Bounce heights are fractions of the icon size, times are in
/// milliseconds, opacities and lighten levels are in `0..=1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    /// Padding between the shelf edge and the first/last icon (edge padding).
    pub h_padding: f64,
    /// Gap between two adjacent icons.
    pub item_padding: f64,
    /// Distance between the icon bottom and the screen edge.
    pub bottom_padding: f64,
    pub shelf_height: f64,

    pub urgent_bounce_height: f64,
    pub launch_bounce_height: f64,
    pub urgent_bounce_time_ms: u64,
    pub launch_bounce_time_ms: u64,
    pub click_time_ms: u64,
    pub hover_lighten: f64,
    /// Duration of the hover lighten fade in/out.
    pub active_time_ms: u64,
    pub urgent_glow_time_ms: u64,
    pub urgent_glow_pulse_ms: u64,
    /// Maximum opacity of the active-window glow on the shelf.
    pub glow_opacity: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            icon_size: 48.,
            zoom_enabled: true,
            zoom_percent: 1.5,
            zoom_range: 3.,
            position: Position::Bottom,
            autohide: false,
            hide_delay_ms: 0,
            unhide_delay_ms: 0,
            hide_time_ms: 250,
            theme: Theme::default(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            h_padding: 12.,
            item_padding: 6.,
            bottom_padding: 8.,
            shelf_height: 21.,
            urgent_bounce_height: 1.66,
            launch_bounce_height: 0.625,
            urgent_bounce_time_ms: 600,
            launch_bounce_time_ms: 600,
            click_time_ms: 300,
            hover_lighten: 0.2,
            active_time_ms: 150,
            urgent_glow_time_ms: 10_000,
            urgent_glow_pulse_ms: 2000,
            glow_opacity: 0.6,
        }
    }
}

impl Config {
    /// Loads the config from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let _span = tracing::debug_span!("Config::load").entered();

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("error reading {path:?}"))?;

        let config = Self::parse(&contents).context("error parsing")?;
        debug!("loaded config from {path:?}");
        Ok(config)
    }

    /// Parses a config from JSON text.
    ///
    /// Missing keys take their defaults and unknown keys are ignored.
    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        Ok(config)
    }

    /// Effective zoom multiplier, `1.0` when zoom is disabled.
    pub fn effective_zoom(&self) -> f64 {
        if self.zoom_enabled {
            self.zoom_percent
        } else {
            1.
        }
    }
}
