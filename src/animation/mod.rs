// animation/mod.rs
// 缓动库：纯数值函数，自动隐藏状态机和效果层共用。
// 所有函数无副作用；输入越界时返回中性值（0 或端点值），不会 panic。

use std::f64::consts::PI;
use std::time::Duration;

use keyframe::functions::{EaseInCubic, EaseOutCubic};
use keyframe::EasingFunction;

mod clock;
pub use clock::Clock;

/// Easing curve mapping linear progress in `0..=1` to eased progress in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Curve {
    Linear,
    /// Slow start, accelerating. Used while the dock slides away.
    EaseInCubic,
    /// Fast start, decelerating. Used while the dock slides back in.
    EaseOutCubic,
}

impl Curve {
    pub fn y(self, x: f64) -> f64 {
        // 先钳制到 [0, 1]，保证端点精确为 0 和 1
        let x = if x.is_nan() { 0. } else { x.clamp(0., 1.) };
        match self {
            Curve::Linear => x,
            Curve::EaseInCubic => EaseInCubic.y(x),
            Curve::EaseOutCubic => EaseOutCubic.y(x),
        }
    }
}

/// `t³`.
pub fn ease_in_cubic(t: f64) -> f64 {
    Curve::EaseInCubic.y(t)
}

/// `1 - (1 - t)³`.
pub fn ease_out_cubic(t: f64) -> f64 {
    Curve::EaseOutCubic.y(t)
}

/// Sinusoidal bounce with a decaying envelope.
///
/// Simulates `n` bounce arcs over `duration`, `t` and `duration` being in the same unit. The
/// first arc peaks at exactly `1.0`, every following arc is lower. Returns `0.0` outside of
/// `0..duration` and never returns a negative value.
pub fn bounce(t: f64, duration: f64, n: u32) -> f64 {
    if n == 0 || !(duration > 0.) || !(t >= 0.) || t >= duration {
        return 0.;
    }

    let n = f64::from(n);
    let p = t / duration;

    // 包络从 2n/(2n-1) 线性衰减到 0，钳制到 1 后第一个弧的峰值恰好为 1：
    //   峰值位于 p = 1/(2n)，此时 (1 - p) * 2n / (2n - 1) = 1
    let envelope = ((1. - p) * (2. * n) / (2. * n - 1.)).min(1.);
    (n * PI * p).sin().abs() * envelope
}

/// [`bounce`] for a time elapsed since the effect started.
pub fn bounce_at(elapsed: Duration, duration: Duration, n: u32) -> f64 {
    bounce(elapsed.as_secs_f64(), duration.as_secs_f64(), n)
}
