//! Per-board custom field schema and per-card values
//!
//! `order` is always the field's index in the schema. An explicit `order`
//! on add or update is a target index: the field is placed there and the
//! rest of the schema shifts around it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::id::generate_id;
use crate::order::{Positioned, check_index, renumber, reorder_in_place};
use crate::{Board, Error, Result};

/// Option seeded into select fields created without any
pub const DEFAULT_OPTION: &str = "Option 1";

/// Custom field value type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum FieldType {
    #[default]
    Text,
    LongText,
    Number,
    Date,
    SingleSelect,
    MultiSelect,
    Checkbox,
}

impl FieldType {
    pub fn is_select(&self) -> bool {
        matches!(self, FieldType::SingleSelect | FieldType::MultiSelect)
    }
}

impl std::str::FromStr for FieldType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "text" => Ok(FieldType::Text),
            "long-text" | "long_text" | "longtext" => Ok(FieldType::LongText),
            "number" => Ok(FieldType::Number),
            "date" => Ok(FieldType::Date),
            "single-select" | "single_select" | "select" => Ok(FieldType::SingleSelect),
            "multi-select" | "multi_select" => Ok(FieldType::MultiSelect),
            "checkbox" | "bool" => Ok(FieldType::Checkbox),
            _ => Err(crate::Error::InvalidFieldType(s.to_string())),
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::Text => write!(f, "text"),
            FieldType::LongText => write!(f, "long-text"),
            FieldType::Number => write!(f, "number"),
            FieldType::Date => write!(f, "date"),
            FieldType::SingleSelect => write!(f, "single-select"),
            FieldType::MultiSelect => write!(f, "multi-select"),
            FieldType::Checkbox => write!(f, "checkbox"),
        }
    }
}

/// A board-scoped, user-defined card attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomField {
    pub id: String,

    pub name: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,

    #[serde(default)]
    pub required: bool,

    /// Choices for select fields
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,

    #[serde(default)]
    pub show_on_card: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub help_text: Option<String>,

    /// Index within the schema
    pub order: usize,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

impl Positioned for CustomField {
    fn set_position(&mut self, position: usize) {
        self.order = position;
    }
}

/// Input for [`Board::add_custom_field`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomField {
    pub name: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub show_on_card: bool,
    #[serde(default)]
    pub help_text: Option<String>,
    /// Defaults to the end of the schema
    #[serde(default)]
    pub order: Option<usize>,
    #[serde(default)]
    pub default_value: Option<Value>,
}

impl NewCustomField {
    pub fn new(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            field_type,
            ..Default::default()
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn show_on_card(mut self) -> Self {
        self.show_on_card = true;
        self
    }

    pub fn options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = Some(options.into_iter().map(Into::into).collect());
        self
    }

    pub fn help_text(mut self, text: &str) -> Self {
        self.help_text = Some(text.to_string());
        self
    }

    pub fn order(mut self, order: usize) -> Self {
        self.order = Some(order);
        self
    }

    pub(crate) fn into_field(self, id: String, schema_len: usize) -> CustomField {
        let options = match self.options {
            Some(options) if !options.is_empty() => options,
            _ if self.field_type.is_select() => vec![DEFAULT_OPTION.to_string()],
            _ => Vec::new(),
        };
        CustomField {
            id,
            name: self.name,
            field_type: self.field_type,
            required: self.required,
            options,
            show_on_card: self.show_on_card,
            help_text: self.help_text,
            order: self.order.unwrap_or(schema_len),
            default_value: self.default_value,
        }
    }
}

/// Partial update for a custom field
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFieldPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "type", default)]
    pub field_type: Option<FieldType>,
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub show_on_card: Option<bool>,
    #[serde(default)]
    pub help_text: Option<String>,
    #[serde(default)]
    pub order: Option<usize>,
    #[serde(default)]
    pub default_value: Option<Value>,
}

impl CustomField {
    /// Apply every given attribute except `order`, which only the board can
    /// honor by moving the field
    pub fn apply_patch(&mut self, patch: CustomFieldPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(field_type) = patch.field_type {
            self.field_type = field_type;
        }
        if let Some(required) = patch.required {
            self.required = required;
        }
        if let Some(options) = patch.options {
            self.options = options;
        }
        if let Some(show_on_card) = patch.show_on_card {
            self.show_on_card = show_on_card;
        }
        if let Some(help_text) = patch.help_text {
            self.help_text = Some(help_text);
        }
        if let Some(default_value) = patch.default_value {
            self.default_value = Some(default_value);
        }
    }
}

/// Values that mean "no value": stored as an absent key instead
pub fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    }
}

impl Board {
    pub fn field(&self, field_id: &str) -> Option<&CustomField> {
        self.custom_fields.iter().find(|f| f.id == field_id)
    }

    pub(crate) fn add_custom_field(&mut self, new: NewCustomField) -> String {
        let id = generate_id("field");
        let len = self.custom_fields.len();
        let field = new.into_field(id.clone(), len);
        let at = field.order.min(len);
        self.custom_fields.insert(at, field);
        renumber(&mut self.custom_fields);
        id
    }

    /// Patch a field; a given `order` moves it to that index (clamped)
    pub(crate) fn update_custom_field(&mut self, field_id: &str, mut patch: CustomFieldPatch) -> Result<()> {
        let index = self
            .custom_fields
            .iter()
            .position(|f| f.id == field_id)
            .ok_or_else(|| Error::FieldNotFound(field_id.to_string()))?;
        let target = patch.order.take();
        self.custom_fields[index].apply_patch(patch);
        if let Some(target) = target {
            let last = self.custom_fields.len() - 1;
            reorder_in_place(&mut self.custom_fields, index, target.min(last));
            renumber(&mut self.custom_fields);
        }
        Ok(())
    }

    /// Remove a field and its value from every card on the board
    pub(crate) fn delete_custom_field(&mut self, field_id: &str) -> Result<()> {
        let before = self.custom_fields.len();
        self.custom_fields.retain(|f| f.id != field_id);
        if self.custom_fields.len() == before {
            return Err(Error::FieldNotFound(field_id.to_string()));
        }
        renumber(&mut self.custom_fields);

        for card in self.cards.values_mut().flatten() {
            card.custom.remove(field_id);
        }
        Ok(())
    }

    pub(crate) fn reorder_custom_fields(&mut self, from: usize, to: usize) -> Result<()> {
        let len = self.custom_fields.len();
        check_index(from, len)?;
        check_index(to, len)?;
        reorder_in_place(&mut self.custom_fields, from, to);
        renumber(&mut self.custom_fields);
        Ok(())
    }

    /// Set or clear one custom value on a card.
    ///
    /// Empty values remove the key. The value is not checked against the
    /// field's type.
    pub(crate) fn set_card_custom_value(&mut self, card_id: &str, field_id: &str, value: Value) -> Result<()> {
        if self.field(field_id).is_none() {
            return Err(Error::FieldNotFound(field_id.to_string()));
        }
        let card = self.card_mut(card_id)?;
        if is_empty_value(&value) {
            card.custom.remove(field_id);
        } else {
            card.custom.insert(field_id.to_string(), value);
        }
        Ok(())
    }

    /// Stable sort by the stored `order`, then rewrite `order` to the index.
    /// Used for schemas built or loaded wholesale.
    pub(crate) fn normalize_fields(&mut self) {
        self.custom_fields.sort_by_key(|f| f.order);
        renumber(&mut self.custom_fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn board() -> Board {
        Board::new("board-1".into(), "Campaign".into())
    }

    fn names(board: &Board) -> Vec<&str> {
        board.custom_fields().iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_add_field_appends_with_order() {
        let mut board = board();
        let due = board.add_custom_field(NewCustomField::new("Due", FieldType::Date));
        assert_eq!(board.field(&due).unwrap().order, 0);

        let owner = board.add_custom_field(NewCustomField::new("Owner", FieldType::Text));
        assert_eq!(board.field(&owner).unwrap().order, 1);
        board.validate().unwrap();
    }

    #[test]
    fn test_add_select_field_seeds_option() {
        let mut board = board();
        let id = board.add_custom_field(NewCustomField::new("Channel", FieldType::SingleSelect));
        assert_eq!(board.field(&id).unwrap().options, vec![DEFAULT_OPTION]);

        let id = board.add_custom_field(NewCustomField::new("Notes", FieldType::LongText));
        assert!(board.field(&id).unwrap().options.is_empty());

        let id = board.add_custom_field(
            NewCustomField::new("Tags", FieldType::MultiSelect).options(["a", "b"]),
        );
        assert_eq!(board.field(&id).unwrap().options, vec!["a", "b"]);
    }

    #[test]
    fn test_add_field_with_explicit_order_is_normalized() {
        let mut board = board();
        board.add_custom_field(NewCustomField::new("A", FieldType::Text));
        board.add_custom_field(NewCustomField::new("B", FieldType::Text));
        board.add_custom_field(NewCustomField::new("Z", FieldType::Text).order(10));
        assert_eq!(names(&board), vec!["A", "B", "Z"]);
        let orders: Vec<usize> = board.custom_fields().iter().map(|f| f.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_update_field_order_resorts() {
        let mut board = board();
        let a = board.add_custom_field(NewCustomField::new("A", FieldType::Text));
        board.add_custom_field(NewCustomField::new("B", FieldType::Text));
        board.add_custom_field(NewCustomField::new("C", FieldType::Text));

        board
            .update_custom_field(&a, CustomFieldPatch { order: Some(5), ..Default::default() })
            .unwrap();
        assert_eq!(names(&board), vec!["B", "C", "A"]);
        assert_eq!(board.field(&a).unwrap().order, 2);
    }

    #[test]
    fn test_explicit_order_places_field_at_index() {
        let mut board = board();
        board.add_custom_field(NewCustomField::new("A", FieldType::Text));
        board.add_custom_field(NewCustomField::new("B", FieldType::Text));
        let c = board.add_custom_field(NewCustomField::new("C", FieldType::Text));

        board
            .update_custom_field(&c, CustomFieldPatch { order: Some(0), ..Default::default() })
            .unwrap();
        assert_eq!(names(&board), vec!["C", "A", "B"]);

        board.add_custom_field(NewCustomField::new("D", FieldType::Text).order(1));
        assert_eq!(names(&board), vec!["C", "D", "A", "B"]);
        board.validate().unwrap();
    }

    #[test]
    fn test_update_without_order_keeps_position() {
        let mut board = board();
        board.add_custom_field(NewCustomField::new("A", FieldType::Text));
        let b = board.add_custom_field(NewCustomField::new("B", FieldType::Text));
        board
            .update_custom_field(&b, CustomFieldPatch { name: Some("Owner".into()), ..Default::default() })
            .unwrap();
        assert_eq!(names(&board), vec!["A", "Owner"]);
        assert_eq!(board.field(&b).unwrap().order, 1);
    }

    #[test]
    fn test_update_missing_field() {
        let mut board = board();
        assert!(matches!(
            board.update_custom_field("field-nope", CustomFieldPatch::default()),
            Err(Error::FieldNotFound(_))
        ));
    }

    #[test]
    fn test_delete_field_cascades_to_cards() {
        let mut board = board();
        let due = board.add_custom_field(NewCustomField::new("Due", FieldType::Date));
        let owner = board.add_custom_field(NewCustomField::new("Owner", FieldType::Text));
        let a = board.add_card("ideas", "a", "ana").unwrap();
        let b = board.add_card("review", "b", "ana").unwrap();
        for card in [&a, &b] {
            board.set_card_custom_value(card, &due, json!("2025-01-01")).unwrap();
            board.set_card_custom_value(card, &owner, json!("Ana")).unwrap();
        }

        board.delete_custom_field(&due).unwrap();

        for card in [&a, &b] {
            let card = board.card(card).unwrap();
            assert!(!card.custom.contains_key(&due));
            assert_eq!(card.custom.get(&owner), Some(&json!("Ana")));
        }
        assert_eq!(board.field(&owner).unwrap().order, 0);
        board.validate().unwrap();
    }

    #[test]
    fn test_reorder_fields() {
        let mut board = board();
        for name in ["A", "B", "C"] {
            board.add_custom_field(NewCustomField::new(name, FieldType::Text));
        }
        board.reorder_custom_fields(2, 0).unwrap();
        assert_eq!(names(&board), vec!["C", "A", "B"]);
        board.validate().unwrap();

        board.reorder_custom_fields(0, 2).unwrap();
        assert_eq!(names(&board), vec!["A", "B", "C"]);
        let orders: Vec<usize> = board.custom_fields().iter().map(|f| f.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);

        assert!(board.reorder_custom_fields(0, 3).is_err());
    }

    #[test]
    fn test_empty_value_removes_key() {
        let mut board = board();
        let due = board.add_custom_field(NewCustomField::new("Due", FieldType::Date));
        let a = board.add_card("ideas", "a", "ana").unwrap();

        board.set_card_custom_value(&a, &due, json!("2025-01-01")).unwrap();
        assert_eq!(board.card(&a).unwrap().custom.get(&due), Some(&json!("2025-01-01")));

        board.set_card_custom_value(&a, &due, json!("")).unwrap();
        assert!(board.card(&a).unwrap().custom.is_empty());

        board.set_card_custom_value(&a, &due, json!(null)).unwrap();
        assert!(board.card(&a).unwrap().custom.is_empty());
    }

    #[test]
    fn test_checkbox_false_is_kept() {
        let mut board = board();
        let done = board.add_custom_field(NewCustomField::new("Done", FieldType::Checkbox));
        let a = board.add_card("ideas", "a", "ana").unwrap();
        board.set_card_custom_value(&a, &done, json!(false)).unwrap();
        assert_eq!(board.card(&a).unwrap().custom.get(&done), Some(&json!(false)));
    }

    #[test]
    fn test_value_for_unknown_field_is_rejected() {
        let mut board = board();
        let a = board.add_card("ideas", "a", "ana").unwrap();
        assert!(matches!(
            board.set_card_custom_value(&a, "field-nope", json!("x")),
            Err(Error::FieldNotFound(_))
        ));
        assert!(board.card(&a).unwrap().custom.is_empty());
    }

    #[test]
    fn test_field_type_wire_names() {
        let field = NewCustomField::new("Notes", FieldType::LongText).into_field("field-1".into(), 0);
        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["type"], "long-text");
        assert_eq!(json["showOnCard"], false);
        assert_eq!("multi-select".parse::<FieldType>().unwrap(), FieldType::MultiSelect);
        assert!("nope".parse::<FieldType>().is_err());
    }
}
