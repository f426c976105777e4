//! Dock items as seen by the core.
//!
//! 条目集合由外部协作者拥有（固定/取消固定、进程启动/退出）；核心只读取快照，
//! 按 [`ItemId`] 记录自己的动画簿记，从不修改条目本身。

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use crate::effects::tint::IconImage;

/// Stable identity key of a dock item (for applications, the desktop file ID).
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub String);

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One dock entry.
///
/// Timestamps are monotonic times as returned by [`crate::animation::Clock`].
#[derive(Debug, Clone, Default)]
pub struct DisplayItem {
    pub id: ItemId,
    pub name: String,
    pub is_running: bool,
    pub is_active: bool,
    pub instance_count: u32,
    pub is_pinned: bool,
    pub is_urgent: bool,
    pub last_urgent: Option<Duration>,
    pub last_clicked: Option<Duration>,
    pub last_launched: Option<Duration>,
    /// Main-axis size override for entries such as separators.
    ///
    /// Only used for spacing: zoom falloff is always computed against the icon size.
    pub main_size: Option<f64>,
    pub icon: Option<Rc<IconImage>>,
}

impl DisplayItem {
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id: ItemId(id),
            ..Default::default()
        }
    }

    pub fn pinned(mut self) -> Self {
        self.is_pinned = true;
        self
    }

    pub fn running(mut self, instances: u32) -> Self {
        self.is_running = instances > 0;
        self.instance_count = instances;
        self
    }

    pub fn with_main_size(mut self, size: f64) -> Self {
        self.main_size = Some(size);
        self
    }

    /// Main-axis size used for spacing.
    pub fn spacing_size(&self, icon_size: f64) -> f64 {
        self.main_size.unwrap_or(icon_size)
    }
}

/// Supplies the ordered collection of items to display.
pub trait ItemSource {
    fn visible_items(&self) -> Vec<DisplayItem>;

    fn find(&self, id: &ItemId) -> Option<DisplayItem> {
        self.visible_items().into_iter().find(|item| &item.id == id)
    }
}

impl ItemSource for Vec<DisplayItem> {
    fn visible_items(&self) -> Vec<DisplayItem> {
        self.clone()
    }
}

/// Shared, mutable item list.
///
/// The collaborator keeps one handle to mutate the list while the dock reads from another.
#[derive(Debug, Default, Clone)]
pub struct SharedItems {
    inner: Rc<RefCell<Vec<DisplayItem>>>,
}

impl SharedItems {
    pub fn new(items: Vec<DisplayItem>) -> Self {
        Self {
            inner: Rc::new(RefCell::new(items)),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// Runs `f` on the item with the given ID, if present.
    pub fn update(&self, id: &ItemId, f: impl FnOnce(&mut DisplayItem)) -> bool {
        let mut items = self.inner.borrow_mut();
        match items.iter_mut().find(|item| &item.id == id) {
            Some(item) => {
                f(item);
                true
            }
            None => false,
        }
    }

    /// Moves the item at `from` to index `to`.
    ///
    /// Out-of-range indices are a no-op.
    pub fn reorder(&self, from: usize, to: usize) -> bool {
        let mut items = self.inner.borrow_mut();
        if from >= items.len() || to >= items.len() {
            return false;
        }

        let item = items.remove(from);
        items.insert(to, item);
        true
    }

    pub fn push(&self, item: DisplayItem) {
        self.inner.borrow_mut().push(item);
    }

    pub fn remove(&self, id: &ItemId) -> Option<DisplayItem> {
        let mut items = self.inner.borrow_mut();
        let idx = items.iter().position(|item| &item.id == id)?;
        Some(items.remove(idx))
    }
}

impl ItemSource for SharedItems {
    fn visible_items(&self) -> Vec<DisplayItem> {
        self.inner.borrow().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(items: &SharedItems) -> Vec<String> {
        items.visible_items().into_iter().map(|i| i.id.0).collect()
    }

    #[test]
    fn reorder_moves_items() {
        let items = SharedItems::new(vec![
            DisplayItem::new("a"),
            DisplayItem::new("b"),
            DisplayItem::new("c"),
        ]);

        assert!(items.reorder(0, 2));
        assert_eq!(ids(&items), ["b", "c", "a"]);
    }

    #[test]
    fn reorder_out_of_range_is_noop() {
        let items = SharedItems::new(vec![DisplayItem::new("a"), DisplayItem::new("b")]);

        assert!(!items.reorder(5, 0));
        assert!(!items.reorder(0, 2));
        assert_eq!(ids(&items), ["a", "b"]);
    }

    #[test]
    fn update_and_find() {
        let items = SharedItems::new(vec![DisplayItem::new("a").pinned()]);
        let id = ItemId::from("a");

        assert!(items.update(&id, |item| item.is_urgent = true));
        assert!(!items.update(&ItemId::from("missing"), |_| unreachable!()));
        assert!(items.find(&id).unwrap().is_urgent);
    }

    #[test]
    fn spacing_size_override() {
        let icon = DisplayItem::new("a");
        let separator = DisplayItem::new("sep").with_main_size(8.);

        assert_eq!(icon.spacing_size(48.), 48.);
        assert_eq!(separator.spacing_size(48.), 8.);
    }
}
