//! docking：应用 dock 的布局与动画核心
//!
//! 模块从叶子到根：
//! - `animation`：缓动函数与共享时钟
//! - `layout`：抛物线缩放布局（纯函数）
//! - `autohide`：自动隐藏状态机
//! - `effects`：悬停、点击、弹跳、滑动、紧急辉光等瞬时效果
//! - `dock`：把以上部分连接起来，每帧输出给渲染器的数值

#[macro_use]
extern crate tracing;

pub mod animation;
pub mod autohide;
pub mod cli;
pub mod dock;
pub mod effects;
pub mod item;
pub mod layout;
pub mod scheduler;
pub mod utils;
