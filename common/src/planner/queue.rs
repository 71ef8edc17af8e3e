// Ordered queue of pending work items

use uuid::Uuid;

/// A pending work item as seen by the distribution pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedItem {
    pub item_id: Uuid,
    pub duration_minutes: u32,
    pub order_index: i32,
}

/// Pending items in study order
///
/// Items are sorted by topic order index. The sort is stable, so items that
/// share an index keep the order they were supplied in (creation order).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkQueue {
    items: Vec<QueuedItem>,
}

impl WorkQueue {
    pub fn new(mut items: Vec<QueuedItem>) -> Self {
        items.sort_by_key(|item| item.order_index);
        Self { items }
    }

    pub fn items(&self) -> &[QueuedItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of all item durations in minutes
    pub fn total_minutes(&self) -> u64 {
        self.items
            .iter()
            .map(|item| u64::from(item.duration_minutes))
            .sum()
    }
}

impl FromIterator<QueuedItem> for WorkQueue {
    fn from_iter<I: IntoIterator<Item = QueuedItem>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
