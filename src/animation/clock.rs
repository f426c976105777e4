// clock.rs
// 可共享的惰性时钟：dock 的所有时间戳（点击、启动、紧急）都从这里读取。
// 事件循环每次迭代清除一次缓存，使同一帧内的所有效果看到同一个时间点；
// 测试和无头模拟则直接设置时间。

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use crate::utils::get_monotonic_time;

/// Shareable lazy clock.
///
/// The clock will fetch the time once and then retain it until explicitly cleared with
/// [`Clock::clear`].
#[derive(Debug, Default, Clone)]
pub struct Clock {
    inner: Rc<RefCell<LazyClock>>,
}

#[derive(Debug, Default)]
struct LazyClock {
    time: Option<Duration>,
}

impl Clock {
    /// Creates a new clock with the given time.
    pub fn with_time(time: Duration) -> Self {
        Self {
            inner: Rc::new(RefCell::new(LazyClock { time: Some(time) })),
        }
    }

    /// Returns the current time.
    pub fn now(&self) -> Duration {
        self.inner.borrow_mut().now()
    }

    /// Sets the clock time.
    ///
    /// Time never goes backwards: setting an earlier time is ignored.
    pub fn set(&mut self, time: Duration) {
        let mut inner = self.inner.borrow_mut();
        match inner.time {
            Some(current) if time < current => {
                trace!(?current, ?time, "ignoring clock going backwards");
            }
            _ => inner.time = Some(time),
        }
    }

    /// Advances the clock by `delta`.
    pub fn advance(&mut self, delta: Duration) {
        let now = self.now();
        self.set(now.saturating_add(delta));
    }

    /// Clears the stored time so it's re-fetched again next.
    pub fn clear(&mut self) {
        self.inner.borrow_mut().time = None;
    }
}

// 相等比较基于指针：两个句柄指向同一个时钟才相等
impl PartialEq for Clock {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Clock {}

impl LazyClock {
    fn now(&mut self) -> Duration {
        *self.time.get_or_insert_with(get_monotonic_time)
    }
}
