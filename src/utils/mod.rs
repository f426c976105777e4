//! 实用工具模块
//!
//! - 单调时钟读取（不受系统时间调整影响）
//! - 版本字符串
//! - 浮点比较辅助

use std::time::Duration;

use rustix::time::{clock_gettime, ClockId};

pub mod id;

/// 获取当前 docking 版本信息字符串
pub fn version() -> String {
    // 优先使用构建时注入的版本字符串
    if let Some(v) = option_env!("DOCKING_BUILD_VERSION_STRING") {
        return String::from(v);
    }

    const MAJOR: &str = env!("CARGO_PKG_VERSION_MAJOR");
    const MINOR: &str = env!("CARGO_PKG_VERSION_MINOR");
    const PATCH: &str = env!("CARGO_PKG_VERSION_PATCH");

    let commit = option_env!("DOCKING_BUILD_COMMIT").unwrap_or("unknown commit");

    if PATCH == "0" {
        format!("{MAJOR}.{MINOR} ({commit})")
    } else {
        format!("{MAJOR}.{MINOR}.{PATCH} ({commit})")
    }
}

/// 获取单调递增时钟时间
pub fn get_monotonic_time() -> Duration {
    let ts = clock_gettime(ClockId::Monotonic);
    Duration::new(ts.tv_sec as u64, ts.tv_nsec as u32)
}

/// Divides, returning `fallback` when the denominator is zero or the result is not finite.
pub fn safe_div(num: f64, den: f64, fallback: f64) -> f64 {
    if den == 0. {
        return fallback;
    }

    let rv = num / den;
    if rv.is_finite() {
        rv
    } else {
        fallback
    }
}
