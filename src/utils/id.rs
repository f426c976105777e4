// 文件: utils/id.rs
// 作用: 唯一ID生成器，用于给调度器中的定时器分配句柄
//
// 定时器可能已经触发或被取消，调用方只持有ID而不持有定时器本身，
// 因此ID必须在进程内不重复。

use std::sync::atomic::{AtomicU64, Ordering};

/// Counter that returns unique IDs.
pub struct IdCounter {
    value: AtomicU64,
}

impl IdCounter {
    pub const fn new() -> Self {
        Self {
            // 从1开始计数，0 留作"无定时器"的含义更直观
            value: AtomicU64::new(1),
        }
    }

    pub fn next(&self) -> u64 {
        self.value.fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for IdCounter {
    fn default() -> Self {
        Self::new()
    }
}
