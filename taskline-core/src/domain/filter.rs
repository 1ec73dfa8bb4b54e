//! List filter selector

use serde::{Deserialize, Serialize};

use crate::domain::Item;

/// Which slice of the list to display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl ItemFilter {
    /// Pure projection of the source list; never mutates or reorders it.
    pub fn apply<'a>(&self, items: &'a [Item]) -> Vec<&'a Item> {
        match self {
            ItemFilter::All => items.iter().collect(),
            ItemFilter::Active => items.iter().filter(|i| !i.completed).collect(),
            ItemFilter::Completed => items.iter().filter(|i| i.completed).collect(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ItemFilter::All => "all",
            ItemFilter::Active => "active",
            ItemFilter::Completed => "completed",
        }
    }

    /// Parse a user-entered selector.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "all" => Some(ItemFilter::All),
            "active" => Some(ItemFilter::Active),
            "completed" | "done" => Some(ItemFilter::Completed),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, completed: bool) -> Item {
        Item {
            id: id.into(),
            text: format!("item {}", id),
            completed,
            owner_id: "user-1".into(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_filters_partition_the_list() {
        let items = vec![
            item("a", false),
            item("b", true),
            item("c", false),
            item("d", true),
        ];

        let active = ItemFilter::Active.apply(&items);
        let completed = ItemFilter::Completed.apply(&items);
        let all = ItemFilter::All.apply(&items);

        // Active and Completed partition All: no overlap, no loss.
        assert_eq!(active.len() + completed.len(), all.len());
        assert!(active.iter().all(|i| !i.completed));
        assert!(completed.iter().all(|i| i.completed));
        for i in &all {
            let in_active = active.iter().any(|a| a.id == i.id);
            let in_completed = completed.iter().any(|c| c.id == i.id);
            assert!(in_active != in_completed);
        }
    }

    #[test]
    fn test_apply_does_not_mutate_source() {
        let items = vec![item("a", false), item("b", true)];
        let before = items.clone();
        let _ = ItemFilter::Active.apply(&items);
        assert_eq!(items, before);
    }

    #[test]
    fn test_default_is_all() {
        assert_eq!(ItemFilter::default(), ItemFilter::All);
    }

    #[test]
    fn test_parse() {
        assert_eq!(ItemFilter::parse("active"), Some(ItemFilter::Active));
        assert_eq!(ItemFilter::parse("Completed"), Some(ItemFilter::Completed));
        assert_eq!(ItemFilter::parse(" all "), Some(ItemFilter::All));
        assert_eq!(ItemFilter::parse("bogus"), None);
    }
}
