//! Board data model
//!
//! A board owns its lists, the card sequence of every list and its custom
//! field schema. The mutation methods live next to the entities they manage
//! (`list.rs`, `card.rs`, `field.rs`); this module holds the container, its
//! invariants and the template guard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

use crate::order::renumber;
use crate::{Card, CustomField, Error, List, Result};

/// Lists every new board starts with: (id, title)
pub const DEFAULT_LISTS: [(&str, &str); 5] = [
    ("ideas", "Ideas"),
    ("doing", "In-Progress"),
    ("review", "Review"),
    ("approved", "Approved"),
    ("published", "Published"),
];

/// Top-level container of lists, cards and a custom field schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "BoardRecord")]
pub struct Board {
    pub id: String,

    pub title: String,

    pub created_at: DateTime<Utc>,

    /// List ids in display order
    pub(crate) lists_order: Vec<String>,

    pub(crate) lists: BTreeMap<String, List>,

    /// Cards of each list, in position order
    pub(crate) cards: BTreeMap<String, Vec<Card>>,

    pub(crate) custom_fields: Vec<CustomField>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) is_template: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,

    /// card id -> list id
    #[serde(skip)]
    pub(crate) card_index: HashMap<String, String>,
}

/// Partial update for a board's title and display metadata
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub cover: Option<String>,
}

impl BoardPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.icon.is_none()
            && self.description.is_none()
            && self.color.is_none()
            && self.cover.is_none()
    }
}

impl Board {
    /// Create a board with the default pipeline of lists and no custom fields
    pub fn new(id: String, title: String) -> Self {
        let mut board = Self {
            id,
            title,
            created_at: Utc::now(),
            lists_order: Vec::new(),
            lists: BTreeMap::new(),
            cards: BTreeMap::new(),
            custom_fields: Vec::new(),
            is_template: None,
            icon: None,
            description: None,
            color: None,
            cover: None,
            card_index: HashMap::new(),
        };
        for (position, (list_id, title)) in DEFAULT_LISTS.iter().enumerate() {
            board.insert_list(List::new(list_id.to_string(), title.to_string(), position));
        }
        board
    }

    pub fn is_template(&self) -> bool {
        self.is_template.unwrap_or(false)
    }

    /// Template guard: structural mutations must call this first
    pub fn guard_mutable(&self) -> Result<()> {
        if self.is_template() {
            return Err(Error::TemplateLocked(self.id.clone()));
        }
        Ok(())
    }

    /// List ids in display order
    pub fn lists_order(&self) -> &[String] {
        &self.lists_order
    }

    /// Lists in display order
    pub fn lists(&self) -> impl Iterator<Item = &List> {
        self.lists_order.iter().filter_map(|id| self.lists.get(id))
    }

    pub fn list(&self, list_id: &str) -> Option<&List> {
        self.lists.get(list_id)
    }

    /// Custom field schema, sorted by `order`
    pub fn custom_fields(&self) -> &[CustomField] {
        &self.custom_fields
    }

    /// Total number of cards across all lists
    pub fn card_count(&self) -> usize {
        self.cards.values().map(Vec::len).sum()
    }

    pub fn apply_patch(&mut self, patch: BoardPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(icon) = patch.icon {
            self.icon = Some(icon);
        }
        if let Some(description) = patch.description {
            self.description = Some(description);
        }
        if let Some(color) = patch.color {
            self.color = Some(color);
        }
        if let Some(cover) = patch.cover {
            self.cover = Some(cover);
        }
    }

    /// Rebuild the card id -> list id index from the card sequences
    pub(crate) fn reindex(&mut self) {
        self.card_index = self
            .cards
            .iter()
            .flat_map(|(list_id, cards)| cards.iter().map(move |c| (c.id.clone(), list_id.clone())))
            .collect();
    }

    /// Rewrite positions, field order, card list ids and the card index from
    /// the stored sequences, and drop values for fields not in the schema
    pub(crate) fn repair(&mut self) -> bool {
        let before = self.clone();

        for (index, list_id) in self.lists_order.iter().enumerate() {
            if let Some(list) = self.lists.get_mut(list_id) {
                list.position = index;
            }
        }
        for (list_id, cards) in self.cards.iter_mut() {
            cards.sort_by_key(|c| c.position);
            renumber(cards);
            for card in cards.iter_mut() {
                card.list_id.clone_from(list_id);
            }
        }

        self.normalize_fields();
        let schema: HashSet<String> = self.custom_fields.iter().map(|f| f.id.clone()).collect();
        for card in self.cards.values_mut().flatten() {
            card.custom.retain(|key, _| schema.contains(key));
        }

        self.reindex();
        *self != before
    }

    /// Check every structural invariant of the board
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: String| Error::Invariant {
            board: self.id.clone(),
            reason,
        };

        let ordered: HashSet<&String> = self.lists_order.iter().collect();
        if ordered.len() != self.lists_order.len() {
            return Err(fail("listsOrder contains duplicates".into()));
        }
        if ordered.len() != self.lists.len() || !self.lists.keys().all(|k| ordered.contains(k)) {
            return Err(fail("listsOrder does not match the list map".into()));
        }
        if self.cards.len() != self.lists.len() || !self.lists.keys().all(|k| self.cards.contains_key(k)) {
            return Err(fail("card sequences do not match the list map".into()));
        }
        for (index, list_id) in self.lists_order.iter().enumerate() {
            let list = &self.lists[list_id];
            if list.position != index {
                return Err(fail(format!("list {} has position {} at index {}", list_id, list.position, index)));
            }
        }

        let schema: HashSet<&str> = self.custom_fields.iter().map(|f| f.id.as_str()).collect();
        for (index, field) in self.custom_fields.iter().enumerate() {
            if field.order != index {
                return Err(fail(format!("field {} has order {} at index {}", field.id, field.order, index)));
            }
        }

        for (list_id, cards) in &self.cards {
            for (index, card) in cards.iter().enumerate() {
                if card.position != index {
                    return Err(fail(format!("card {} has position {} at index {}", card.id, card.position, index)));
                }
                if &card.list_id != list_id {
                    return Err(fail(format!("card {} claims list {} but is stored in {}", card.id, card.list_id, list_id)));
                }
                if let Some(key) = card.custom.keys().find(|k| !schema.contains(k.as_str())) {
                    return Err(fail(format!("card {} has a value for unknown field {}", card.id, key)));
                }
                if self.card_index.get(&card.id) != Some(list_id) {
                    return Err(fail(format!("card {} is missing from the index", card.id)));
                }
            }
        }
        if self.card_index.len() != self.card_count() {
            return Err(fail("card index has stale entries".into()));
        }

        Ok(())
    }
}

/// Wire form of a board; the card index is derived on load
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BoardRecord {
    id: String,
    title: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    lists_order: Vec<String>,
    #[serde(default)]
    lists: BTreeMap<String, List>,
    #[serde(default)]
    cards: BTreeMap<String, Vec<Card>>,
    #[serde(default)]
    custom_fields: Vec<CustomField>,
    #[serde(default)]
    is_template: Option<bool>,
    #[serde(default)]
    icon: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    color: Option<String>,
    #[serde(default)]
    cover: Option<String>,
}

impl From<BoardRecord> for Board {
    fn from(record: BoardRecord) -> Self {
        let mut board = Self {
            id: record.id,
            title: record.title,
            created_at: record.created_at,
            lists_order: record.lists_order,
            lists: record.lists,
            cards: record.cards,
            custom_fields: record.custom_fields,
            is_template: record.is_template,
            icon: record.icon,
            description: record.description,
            color: record.color,
            cover: record.cover,
            card_index: HashMap::new(),
        };
        board.reindex();
        board
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_board_has_default_lists() {
        let board = Board::new("board-1".into(), "Campaign".into());
        assert_eq!(
            board.lists_order(),
            &["ideas", "doing", "review", "approved", "published"]
        );
        let titles: Vec<&str> = board.lists().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["Ideas", "In-Progress", "Review", "Approved", "Published"]);
        assert!(board.custom_fields().is_empty());
        assert_eq!(board.card_count(), 0);
        board.validate().unwrap();
    }

    #[test]
    fn test_guard_mutable() {
        let mut board = Board::new("board-1".into(), "Campaign".into());
        assert!(board.guard_mutable().is_ok());
        board.is_template = Some(true);
        assert!(matches!(board.guard_mutable(), Err(Error::TemplateLocked(_))));
    }

    #[test]
    fn test_serialized_field_names() {
        let board = Board::new("board-1".into(), "Campaign".into());
        let json = serde_json::to_value(&board).unwrap();
        assert!(json.get("listsOrder").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("customFields").is_some());
        assert!(json.get("cards").is_some());
        assert!(json.get("isTemplate").is_none());
        assert!(json.get("cardIndex").is_none());
    }

    #[test]
    fn test_deserialize_rebuilds_index() {
        let mut board = Board::new("board-1".into(), "Campaign".into());
        let card_id = board.add_card("ideas", "Draft copy", "ana").unwrap();
        let json = serde_json::to_string(&board).unwrap();

        let loaded: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(loaded.card_index.get(&card_id).map(String::as_str), Some("ideas"));
        loaded.validate().unwrap();
        assert_eq!(loaded, board);
    }

    #[test]
    fn test_validate_detects_position_gap() {
        let mut board = Board::new("board-1".into(), "Campaign".into());
        board.add_card("ideas", "One", "ana").unwrap();
        board.cards.get_mut("ideas").unwrap()[0].position = 3;
        assert!(matches!(board.validate(), Err(Error::Invariant { .. })));
    }

    #[test]
    fn test_repair_closes_position_gaps() {
        let mut board = Board::new("board-1".into(), "Campaign".into());
        let first = board.add_card("ideas", "One", "ana").unwrap();
        let second = board.add_card("ideas", "Two", "ana").unwrap();
        {
            let cards = board.cards.get_mut("ideas").unwrap();
            cards[0].position = 4;
            cards[1].position = 1;
            cards[1].list_id = "doing".into();
        }
        board.lists.get_mut("review").unwrap().position = 9;

        assert!(board.repair());
        board.validate().unwrap();
        let ids: Vec<&str> = board.list_cards("ideas").unwrap().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec![second.as_str(), first.as_str()]);
        assert_eq!(board.list("review").unwrap().position, 2);
        assert!(!board.repair());
    }

    #[test]
    fn test_repair_leaves_list_mismatch() {
        let mut board = Board::new("board-1".into(), "Campaign".into());
        board.lists_order.push("ghost".into());
        board.repair();
        assert!(matches!(board.validate(), Err(Error::Invariant { .. })));
    }

    #[test]
    fn test_apply_patch_only_touches_given_fields() {
        let mut board = Board::new("board-1".into(), "Campaign".into());
        board.apply_patch(BoardPatch {
            color: Some("#ff0000".into()),
            ..Default::default()
        });
        assert_eq!(board.title, "Campaign");
        assert_eq!(board.color.as_deref(), Some("#ff0000"));
    }
}
