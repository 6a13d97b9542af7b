//! Lists: ordered columns within a board

use serde::{Deserialize, Serialize};

use crate::id::generate_id;
use crate::order::{check_index, reorder_in_place};
use crate::{Board, Error, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct List {
    pub id: String,
    pub title: String,
    /// Index within the board's `listsOrder`
    pub position: usize,
}

impl List {
    pub fn new(id: String, title: String, position: usize) -> Self {
        Self { id, title, position }
    }
}

impl Board {
    /// Append a list with an empty card sequence
    pub(crate) fn insert_list(&mut self, list: List) {
        self.lists_order.push(list.id.clone());
        self.cards.insert(list.id.clone(), Vec::new());
        self.lists.insert(list.id.clone(), list);
    }

    pub(crate) fn add_list(&mut self, title: &str) -> String {
        let id = generate_id("list");
        let position = self.lists_order.len();
        self.insert_list(List::new(id.clone(), title.to_string(), position));
        id
    }

    /// Remove a list together with its cards
    pub(crate) fn delete_list(&mut self, list_id: &str) -> Result<()> {
        if self.lists.remove(list_id).is_none() {
            return Err(Error::ListNotFound(list_id.to_string()));
        }
        self.lists_order.retain(|id| id != list_id);
        if let Some(cards) = self.cards.remove(list_id) {
            for card in cards {
                self.card_index.remove(&card.id);
            }
        }
        self.renumber_lists();
        Ok(())
    }

    pub(crate) fn move_list(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.lists_order.len();
        check_index(from, len)?;
        check_index(to, len)?;
        reorder_in_place(&mut self.lists_order, from, to);
        self.renumber_lists();
        Ok(())
    }

    pub(crate) fn rename_list(&mut self, list_id: &str, title: &str) -> Result<()> {
        let list = self
            .lists
            .get_mut(list_id)
            .ok_or_else(|| Error::ListNotFound(list_id.to_string()))?;
        list.title = title.to_string();
        Ok(())
    }

    /// Make every list's position match its index in `listsOrder`
    fn renumber_lists(&mut self) {
        for (position, id) in self.lists_order.iter().enumerate() {
            if let Some(list) = self.lists.get_mut(id) {
                list.position = position;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> Board {
        Board::new("board-1".into(), "Campaign".into())
    }

    fn positions(board: &Board) -> Vec<usize> {
        board.lists().map(|l| l.position).collect()
    }

    #[test]
    fn test_add_list_appends() {
        let mut board = board();
        let id = board.add_list("Archive");
        assert_eq!(board.lists_order().last(), Some(&id));
        assert_eq!(board.list(&id).unwrap().position, 5);
        assert!(board.cards[&id].is_empty());
        board.validate().unwrap();
    }

    #[test]
    fn test_delete_list_renumbers_and_drops_cards() {
        let mut board = board();
        let card = board.add_card("doing", "Shoot video", "ana").unwrap();
        board.delete_list("doing").unwrap();

        assert_eq!(board.lists_order(), &["ideas", "review", "approved", "published"]);
        assert_eq!(positions(&board), vec![0, 1, 2, 3]);
        assert!(board.card(&card).is_none());
        board.validate().unwrap();
    }

    #[test]
    fn test_delete_missing_list() {
        let mut board = board();
        assert!(matches!(board.delete_list("nope"), Err(Error::ListNotFound(_))));
        assert_eq!(board.lists_order().len(), 5);
    }

    #[test]
    fn test_move_list() {
        let mut board = board();
        board.move_list(4, 0).unwrap();
        assert_eq!(board.lists_order(), &["published", "ideas", "doing", "review", "approved"]);
        assert_eq!(positions(&board), vec![0, 1, 2, 3, 4]);
        assert_eq!(board.list("published").unwrap().position, 0);
        board.validate().unwrap();
    }

    #[test]
    fn test_move_list_out_of_range_leaves_order() {
        let mut board = board();
        assert!(matches!(board.move_list(0, 5), Err(Error::IndexOutOfRange { index: 5, len: 5 })));
        assert_eq!(board.lists_order()[0], "ideas");
    }

    #[test]
    fn test_rename_list_keeps_position() {
        let mut board = board();
        board.rename_list("review", "QA").unwrap();
        let list = board.list("review").unwrap();
        assert_eq!(list.title, "QA");
        assert_eq!(list.position, 2);
    }
}
