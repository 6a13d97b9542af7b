//! The built-in template board: a creative request intake form
//!
//! Field ids are fixed so that re-initializing the template is idempotent.

use serde_json::json;

use crate::{Board, CustomField, FieldType};

pub const TEMPLATE_BOARD_ID: &str = "template-creative-request";
pub const TEMPLATE_BOARD_TITLE: &str = "Creative Request";

/// Build the template board from scratch
pub fn creative_request_board() -> Board {
    let mut board = Board::new(TEMPLATE_BOARD_ID.to_string(), TEMPLATE_BOARD_TITLE.to_string());
    board.description = Some("Intake form for new creative requests".to_string());
    board.icon = Some("clipboard".to_string());
    reset_template(&mut board);
    board
}

/// Restore the template flag and the intake schema on an existing board
pub(crate) fn reset_template(board: &mut Board) {
    board.is_template = Some(true);
    board.custom_fields = intake_schema();
    board.normalize_fields();

    // values for fields that are no longer in the schema
    let schema: Vec<String> = board.custom_fields.iter().map(|f| f.id.clone()).collect();
    for card in board.cards.values_mut().flatten() {
        card.custom.retain(|key, _| schema.contains(key));
    }
}

fn field(
    id: &str,
    name: &str,
    field_type: FieldType,
    required: bool,
    options: &[&str],
    help_text: &str,
) -> CustomField {
    CustomField {
        id: id.to_string(),
        name: name.to_string(),
        field_type,
        required,
        options: options.iter().map(|o| o.to_string()).collect(),
        show_on_card: required,
        help_text: Some(help_text.to_string()),
        order: 0,
        default_value: None,
    }
}

fn intake_schema() -> Vec<CustomField> {
    let mut fields = vec![
        field(
            "tpl-request-type",
            "Request Type",
            FieldType::SingleSelect,
            true,
            &["Social Post", "Video", "Graphic", "Copy", "Other"],
            "What kind of asset do you need?",
        ),
        field("tpl-requester", "Requester", FieldType::Text, true, &[], "Who is asking for this?"),
        field(
            "tpl-brief",
            "Brief",
            FieldType::LongText,
            true,
            &[],
            "Goal, audience and key message",
        ),
        field("tpl-deadline", "Deadline", FieldType::Date, true, &[], "When must it be published?"),
        field(
            "tpl-channels",
            "Channels",
            FieldType::MultiSelect,
            false,
            &["Instagram", "Facebook", "TikTok", "Website", "Email"],
            "Where will it appear?",
        ),
        field("tpl-budget", "Budget", FieldType::Number, false, &[], "Estimated spend, if any"),
        field(
            "tpl-assets-attached",
            "Assets Attached",
            FieldType::Checkbox,
            false,
            &[],
            "Tick when source files are linked",
        ),
    ];
    for (order, f) in fields.iter_mut().enumerate() {
        f.order = order;
    }
    if let Some(assets) = fields.iter_mut().find(|f| f.id == "tpl-assets-attached") {
        assets.default_value = Some(json!(false));
    }
    fields
}
