//! Cards and their per-list ordering
//!
//! Cards are looked up through the board's card index (card id -> list id),
//! which every add, move and delete keeps in step with the card sequences.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::activity::{ActivityKind, LogEntry};
use crate::id::generate_id;
use crate::order::{Positioned, check_index, check_insert_index, renumber, reorder_in_place};
use crate::{Board, Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl Label {
    pub fn new(name: &str, color: Option<String>) -> Self {
        Self {
            id: generate_id("label"),
            name: name.to_string(),
            color,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// A unit of work, owned by exactly one list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Card {
    pub id: String,

    /// Owning list; only move operations change it
    pub list_id: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Index within the owning list
    pub position: usize,

    #[serde(default)]
    pub labels: Vec<Label>,

    #[serde(default)]
    pub members: Vec<Member>,

    /// Timestamps from older records are read as their date part
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_date")]
    pub due_date: Option<NaiveDate>,

    /// Custom field values keyed by field id
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, Value>,

    /// Comment and activity log, oldest first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<LogEntry>,
}

impl Card {
    pub fn new(id: String, list_id: String, title: String, position: usize) -> Self {
        Self {
            id,
            list_id,
            title,
            description: None,
            position,
            labels: Vec::new(),
            members: Vec::new(),
            due_date: None,
            custom: BTreeMap::new(),
            comments: Vec::new(),
        }
    }

    /// Merge a patch; structural fields are not part of [`CardPatch`]
    pub fn apply_patch(&mut self, patch: CardPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = if description.is_empty() {
                None
            } else {
                Some(description)
            };
        }
        if let Some(labels) = patch.labels {
            self.labels = labels;
        }
        if let Some(members) = patch.members {
            self.members = members;
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = due_date;
        }
    }
}

impl Positioned for Card {
    fn set_position(&mut self, position: usize) {
        self.position = position;
    }
}

/// Partial update for a card.
///
/// There is deliberately no `listId` or `position`: those belong to the move
/// operations. Such keys in a JSON patch are ignored on deserialization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPatch {
    #[serde(default)]
    pub title: Option<String>,

    /// An empty string clears the description
    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub labels: Option<Vec<Label>>,

    #[serde(default)]
    pub members: Option<Vec<Member>>,

    /// `Some(None)` clears the due date
    #[serde(default, deserialize_with = "lenient_date_patch")]
    pub due_date: Option<Option<NaiveDate>>,
}

/// Read a due date given as `YYYY-MM-DD` or as a full timestamp.
/// `null` and blank strings mean no date.
fn lenient_date<'de, D>(deserializer: D) -> std::result::Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.date_naive())
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f").map(|dt| dt.date()))
        .map(Some)
        .map_err(|_| D::Error::custom(format!("invalid due date: {}", raw)))
}

/// Like [`lenient_date`], but an absent key (`None`) stays distinct from an
/// explicit `null` (`Some(None)`)
fn lenient_date_patch<'de, D>(deserializer: D) -> std::result::Result<Option<Option<NaiveDate>>, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_date(deserializer).map(Some)
}

impl Board {
    /// Find a card by id
    pub fn card(&self, card_id: &str) -> Option<&Card> {
        let list_id = self.card_index.get(card_id)?;
        self.cards.get(list_id)?.iter().find(|c| c.id == card_id)
    }

    /// Cards of a list in position order
    pub fn list_cards(&self, list_id: &str) -> Option<&[Card]> {
        self.cards.get(list_id).map(Vec::as_slice)
    }

    pub(crate) fn card_mut(&mut self, card_id: &str) -> Result<&mut Card> {
        let list_id = self
            .card_index
            .get(card_id)
            .ok_or_else(|| Error::CardNotFound(card_id.to_string()))?;
        self.cards
            .get_mut(list_id)
            .and_then(|cards| cards.iter_mut().find(|c| c.id == card_id))
            .ok_or_else(|| Error::CardNotFound(card_id.to_string()))
    }

    fn list_cards_mut(&mut self, list_id: &str) -> Result<&mut Vec<Card>> {
        self.cards
            .get_mut(list_id)
            .ok_or_else(|| Error::ListNotFound(list_id.to_string()))
    }

    /// Append a card to a list, seeding its log with a `created` entry
    pub(crate) fn add_card(&mut self, list_id: &str, title: &str, actor: &str) -> Result<String> {
        let cards = self.list_cards_mut(list_id)?;
        let id = generate_id("card");
        let mut card = Card::new(id.clone(), list_id.to_string(), title.to_string(), cards.len());
        card.comments.push(LogEntry::activity(
            &id,
            actor,
            ActivityKind::Created,
            &format!("Created card \"{}\"", title),
        ));
        cards.push(card);
        self.card_index.insert(id.clone(), list_id.to_string());
        Ok(id)
    }

    pub(crate) fn update_card(&mut self, card_id: &str, patch: CardPatch) -> Result<()> {
        self.card_mut(card_id)?.apply_patch(patch);
        Ok(())
    }

    /// Remove a card from `list_id` and renumber the survivors
    pub(crate) fn delete_card(&mut self, list_id: &str, card_id: &str) -> Result<()> {
        let cards = self.list_cards_mut(list_id)?;
        let index = cards
            .iter()
            .position(|c| c.id == card_id)
            .ok_or_else(|| Error::CardNotFound(card_id.to_string()))?;
        cards.remove(index);
        renumber(cards);
        self.card_index.remove(card_id);
        Ok(())
    }

    /// Move the card at `from` in `from_list` to index `to` in `to_list`.
    ///
    /// Both sequences are renumbered. Everything is validated before the
    /// first write, so a failed move changes nothing.
    pub(crate) fn move_card(
        &mut self,
        from_list: &str,
        to_list: &str,
        from: usize,
        to: usize,
        actor: &str,
    ) -> Result<()> {
        let source_len = self
            .cards
            .get(from_list)
            .map(Vec::len)
            .ok_or_else(|| Error::ListNotFound(from_list.to_string()))?;
        check_index(from, source_len)?;

        if from_list == to_list {
            check_index(to, source_len)?;
            let cards = self.list_cards_mut(from_list)?;
            reorder_in_place(cards, from, to);
            renumber(cards);
            return Ok(());
        }

        let dest_len = self
            .cards
            .get(to_list)
            .map(Vec::len)
            .ok_or_else(|| Error::ListNotFound(to_list.to_string()))?;
        check_insert_index(to, dest_len)?;

        let source_title = self.list_title(from_list);
        let dest_title = self.list_title(to_list);

        let source = self.list_cards_mut(from_list)?;
        let mut card = source.remove(from);
        renumber(source);

        card.list_id = to_list.to_string();
        card.comments.push(LogEntry::activity(
            &card.id,
            actor,
            ActivityKind::Moved,
            &format!("Moved from {} to {}", source_title, dest_title),
        ));
        self.card_index.insert(card.id.clone(), to_list.to_string());

        let dest = self.list_cards_mut(to_list)?;
        dest.insert(to, card);
        renumber(dest);
        Ok(())
    }

    /// Append an entry to a card's log
    pub(crate) fn append_entry(&mut self, card_id: &str, entry: LogEntry) -> Result<()> {
        self.card_mut(card_id)?.comments.push(entry);
        Ok(())
    }

    /// Add a label unless the card already carries one with the same name
    pub(crate) fn add_label(&mut self, card_id: &str, label: Label) -> Result<()> {
        let card = self.card_mut(card_id)?;
        if !card.labels.iter().any(|l| l.id == label.id || l.name == label.name) {
            card.labels.push(label);
        }
        Ok(())
    }

    /// Remove a label by id or name
    pub(crate) fn remove_label(&mut self, card_id: &str, label: &str) -> Result<()> {
        self.card_mut(card_id)?
            .labels
            .retain(|l| l.id != label && l.name != label);
        Ok(())
    }

    pub(crate) fn add_member(&mut self, card_id: &str, member: Member) -> Result<()> {
        let card = self.card_mut(card_id)?;
        if !card.members.iter().any(|m| m.id == member.id) {
            card.members.push(member);
        }
        Ok(())
    }

    pub(crate) fn remove_member(&mut self, card_id: &str, member_id: &str) -> Result<()> {
        self.card_mut(card_id)?.members.retain(|m| m.id != member_id);
        Ok(())
    }

    fn list_title(&self, list_id: &str) -> String {
        self.lists
            .get(list_id)
            .map(|l| l.title.clone())
            .unwrap_or_else(|| list_id.to_string())
    }
}
