//! Board registry and the mutation surface
//!
//! A [`Workspace`] is the whole planning state: every board plus the global
//! board display order. Boards sit behind `Arc` and are copied on write, so a
//! clone of the workspace taken before a mutation is never affected by it.
//!
//! Every mutation either succeeds or returns an error and leaves the
//! workspace exactly as it was.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::activity::{ActivityKind, EntryType, LogEntry};
use crate::id::generate_id;
use crate::template::{TEMPLATE_BOARD_ID, creative_request_board, reset_template};
use crate::{
    Board, BoardPatch, Card, CardPatch, CustomFieldPatch, Error, Label, Member, NewCustomField,
    Result,
};

const DEFAULT_ACTOR: &str = "system";
pub(crate) const DEFAULT_BOARD_PREFIX: &str = "board";

fn default_actor() -> String {
    DEFAULT_ACTOR.to_string()
}

fn default_board_prefix() -> String {
    DEFAULT_BOARD_PREFIX.to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workspace {
    #[serde(default)]
    boards: BTreeMap<String, Arc<Board>>,

    /// Global board display order; the template, if any, comes first
    #[serde(default)]
    board_order: Vec<String>,

    /// Author recorded on generated activity entries
    #[serde(skip, default = "default_actor")]
    actor: String,

    /// Prefix of new board ids
    #[serde(skip, default = "default_board_prefix")]
    board_prefix: String,
}

impl Default for Workspace {
    fn default() -> Self {
        Self {
            boards: BTreeMap::new(),
            board_order: Vec::new(),
            actor: default_actor(),
            board_prefix: default_board_prefix(),
        }
    }
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_actor(mut self, actor: &str) -> Self {
        self.set_actor(actor);
        self
    }

    pub fn set_actor(&mut self, actor: &str) {
        self.actor = actor.to_string();
    }

    pub fn actor(&self) -> &str {
        &self.actor
    }

    /// Set the prefix of new board ids; blank falls back to `board`
    pub fn set_board_prefix(&mut self, prefix: &str) {
        let prefix = prefix.trim().trim_end_matches('-');
        self.board_prefix = if prefix.is_empty() {
            default_board_prefix()
        } else {
            prefix.to_string()
        };
    }

    pub fn board_prefix(&self) -> &str {
        &self.board_prefix
    }

    // ---- reads ----

    pub fn board(&self, board_id: &str) -> Option<&Board> {
        self.boards.get(board_id).map(Arc::as_ref)
    }

    /// Boards in display order
    pub fn boards(&self) -> impl Iterator<Item = &Board> {
        self.board_order.iter().filter_map(|id| self.board(id))
    }

    pub fn board_order(&self) -> &[String] {
        &self.board_order
    }

    /// Id of the pinned template board, if one is pinned
    pub fn template_id(&self) -> Option<&str> {
        self.board_order
            .first()
            .filter(|id| self.board(id).is_some_and(Board::is_template))
            .map(String::as_str)
    }

    pub fn card(&self, board_id: &str, card_id: &str) -> Option<&Card> {
        self.board(board_id)?.card(card_id)
    }

    pub fn list_cards(&self, board_id: &str, list_id: &str) -> Option<&[Card]> {
        self.board(board_id)?.list_cards(list_id)
    }

    /// Check registry and per-board invariants
    pub fn validate(&self) -> Result<()> {
        let ordered: HashSet<&String> = self.board_order.iter().collect();
        if ordered.len() != self.board_order.len()
            || ordered.len() != self.boards.len()
            || !self.boards.keys().all(|id| ordered.contains(id))
        {
            return Err(Error::BoardOrder("does not match the board map".into()));
        }
        self.boards.values().try_for_each(|b| b.validate())
    }

    /// Rebuild derived data after loading a document that fails
    /// [`Workspace::validate`]: positions, field order, card list ids, stray
    /// custom values and the board order. Returns whether anything changed.
    ///
    /// List membership itself is never guessed; a board whose lists and card
    /// sequences disagree still fails validation afterwards.
    pub fn repair(&mut self) -> bool {
        let mut changed = false;
        for board in self.boards.values_mut() {
            if board.validate().is_err() {
                changed |= Arc::make_mut(board).repair();
            }
        }

        let before = self.board_order.len();
        let mut seen = HashSet::new();
        self.board_order
            .retain(|id| self.boards.contains_key(id) && seen.insert(id.clone()));
        let missing: Vec<String> = self
            .boards
            .keys()
            .filter(|id| !seen.contains(*id))
            .cloned()
            .collect();
        changed |= self.board_order.len() != before || !missing.is_empty();
        self.board_order.extend(missing);
        changed
    }

    // ---- board registry ----

    fn board_mut(&mut self, board_id: &str) -> Result<&mut Board> {
        self.boards
            .get_mut(board_id)
            .map(Arc::make_mut)
            .ok_or_else(|| Error::BoardNotFound(board_id.to_string()))
    }

    /// Template guard at the registry level
    fn check_unlocked(&self, board_id: &str, action: &str) -> Result<()> {
        let board = self
            .board(board_id)
            .ok_or_else(|| Error::BoardNotFound(board_id.to_string()))?;
        board.guard_mutable().inspect_err(|_| {
            warn!(board = board_id, action, "rejected change to template board");
        })
    }

    /// Like `board_mut`, but refuses template boards
    fn unlocked_board_mut(&mut self, board_id: &str, action: &str) -> Result<&mut Board> {
        self.check_unlocked(board_id, action)?;
        self.board_mut(board_id)
    }

    /// Create a board with the default lists.
    ///
    /// It goes right after the pinned template, or to the front when there
    /// is none.
    pub fn create_board(&mut self, title: &str) -> String {
        let id = generate_id(&self.board_prefix);
        let board = Board::new(id.clone(), title.to_string());
        self.boards.insert(id.clone(), Arc::new(board));

        let at = if self.template_id().is_some() { 1 } else { 0 };
        self.board_order.insert(at, id.clone());
        debug!(board = %id, title, "board created");
        id
    }

    pub fn delete_board(&mut self, board_id: &str) -> Result<()> {
        self.check_unlocked(board_id, "delete_board")?;
        self.boards.remove(board_id);
        self.board_order.retain(|id| id != board_id);
        debug!(board = board_id, "board deleted");
        Ok(())
    }

    pub fn update_board_title(&mut self, board_id: &str, title: &str) -> Result<()> {
        self.unlocked_board_mut(board_id, "update_board_title")?.title = title.to_string();
        Ok(())
    }

    /// Merge a partial patch into a board's title and display metadata
    pub fn update_board(&mut self, board_id: &str, patch: BoardPatch) -> Result<()> {
        self.unlocked_board_mut(board_id, "update_board")?.apply_patch(patch);
        Ok(())
    }

    /// (Re)create the template board and pin it first.
    ///
    /// Returns whether anything changed, so callers can skip a save.
    pub fn initialize_template_boards(&mut self) -> bool {
        let mut changed = false;
        match self.boards.get_mut(TEMPLATE_BOARD_ID) {
            Some(existing) => {
                let mut candidate = existing.as_ref().clone();
                reset_template(&mut candidate);
                if candidate != **existing {
                    *existing = Arc::new(candidate);
                    changed = true;
                }
            }
            None => {
                self.boards
                    .insert(TEMPLATE_BOARD_ID.to_string(), Arc::new(creative_request_board()));
                changed = true;
            }
        }

        let pinned = self.board_order.first().map(String::as_str) == Some(TEMPLATE_BOARD_ID)
            && self.board_order.iter().filter(|id| *id == TEMPLATE_BOARD_ID).count() == 1;
        if !pinned {
            self.board_order.retain(|id| id != TEMPLATE_BOARD_ID);
            self.board_order.insert(0, TEMPLATE_BOARD_ID.to_string());
            changed = true;
        }

        if changed {
            info!(board = TEMPLATE_BOARD_ID, "template board initialized");
        }
        changed
    }

    // ---- lists ----

    pub fn add_list(&mut self, board_id: &str, title: &str) -> Result<String> {
        let id = self.unlocked_board_mut(board_id, "add_list")?.add_list(title);
        debug!(board = board_id, list = %id, "list added");
        Ok(id)
    }

    pub fn delete_list(&mut self, board_id: &str, list_id: &str) -> Result<()> {
        self.unlocked_board_mut(board_id, "delete_list")?.delete_list(list_id)?;
        debug!(board = board_id, list = list_id, "list deleted");
        Ok(())
    }

    pub fn move_list(&mut self, board_id: &str, from: usize, to: usize) -> Result<()> {
        self.unlocked_board_mut(board_id, "move_list")?.move_list(from, to)?;
        debug!(board = board_id, from, to, "list moved");
        Ok(())
    }

    pub fn update_list_title(&mut self, board_id: &str, list_id: &str, title: &str) -> Result<()> {
        self.unlocked_board_mut(board_id, "update_list_title")?
            .rename_list(list_id, title)
    }

    // ---- cards ----

    pub fn add_card(&mut self, board_id: &str, list_id: &str, title: &str) -> Result<String> {
        let actor = self.actor.clone();
        let id = self.board_mut(board_id)?.add_card(list_id, title, &actor)?;
        debug!(board = board_id, list = list_id, card = %id, "card added");
        Ok(id)
    }

    pub fn update_card(&mut self, board_id: &str, card_id: &str, patch: CardPatch) -> Result<()> {
        self.board_mut(board_id)?.update_card(card_id, patch)
    }

    pub fn delete_card(&mut self, board_id: &str, list_id: &str, card_id: &str) -> Result<()> {
        self.board_mut(board_id)?.delete_card(list_id, card_id)?;
        debug!(board = board_id, list = list_id, card = card_id, "card deleted");
        Ok(())
    }

    pub fn move_card(
        &mut self,
        board_id: &str,
        from_list: &str,
        to_list: &str,
        from: usize,
        to: usize,
    ) -> Result<()> {
        let actor = self.actor.clone();
        self.board_mut(board_id)?
            .move_card(from_list, to_list, from, to, &actor)?;
        debug!(board = board_id, from_list, to_list, from, to, "card moved");
        Ok(())
    }

    /// Append a comment (or a free-form activity entry) to a card's log
    pub fn add_comment(
        &mut self,
        board_id: &str,
        card_id: &str,
        author: &str,
        content: &str,
        entry_type: EntryType,
    ) -> Result<String> {
        let entry = LogEntry::new(card_id, author, content, entry_type);
        let id = entry.id.clone();
        self.board_mut(board_id)?.append_entry(card_id, entry)?;
        Ok(id)
    }

    pub fn add_activity(
        &mut self,
        board_id: &str,
        card_id: &str,
        author: &str,
        kind: ActivityKind,
        description: &str,
    ) -> Result<String> {
        let entry = LogEntry::activity(card_id, author, kind, description);
        let id = entry.id.clone();
        self.board_mut(board_id)?.append_entry(card_id, entry)?;
        Ok(id)
    }

    pub fn add_label(&mut self, board_id: &str, card_id: &str, label: Label) -> Result<()> {
        self.board_mut(board_id)?.add_label(card_id, label)
    }

    pub fn remove_label(&mut self, board_id: &str, card_id: &str, label: &str) -> Result<()> {
        self.board_mut(board_id)?.remove_label(card_id, label)
    }

    pub fn add_member(&mut self, board_id: &str, card_id: &str, member: Member) -> Result<()> {
        self.board_mut(board_id)?.add_member(card_id, member)
    }

    pub fn remove_member(&mut self, board_id: &str, card_id: &str, member_id: &str) -> Result<()> {
        self.board_mut(board_id)?.remove_member(card_id, member_id)
    }

    // ---- custom fields ----

    pub fn add_custom_field(&mut self, board_id: &str, field: NewCustomField) -> Result<String> {
        let id = self
            .unlocked_board_mut(board_id, "add_custom_field")?
            .add_custom_field(field);
        debug!(board = board_id, field = %id, "custom field added");
        Ok(id)
    }

    pub fn update_custom_field(
        &mut self,
        board_id: &str,
        field_id: &str,
        patch: CustomFieldPatch,
    ) -> Result<()> {
        self.unlocked_board_mut(board_id, "update_custom_field")?
            .update_custom_field(field_id, patch)
    }

    pub fn delete_custom_field(&mut self, board_id: &str, field_id: &str) -> Result<()> {
        self.unlocked_board_mut(board_id, "delete_custom_field")?
            .delete_custom_field(field_id)?;
        debug!(board = board_id, field = field_id, "custom field deleted");
        Ok(())
    }

    pub fn reorder_custom_fields(&mut self, board_id: &str, from: usize, to: usize) -> Result<()> {
        self.unlocked_board_mut(board_id, "reorder_custom_fields")?
            .reorder_custom_fields(from, to)
    }

    pub fn set_card_custom_value(
        &mut self,
        board_id: &str,
        card_id: &str,
        field_id: &str,
        value: Value,
    ) -> Result<()> {
        self.board_mut(board_id)?
            .set_card_custom_value(card_id, field_id, value)
    }
}
