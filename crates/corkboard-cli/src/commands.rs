//! CLI command implementations

use anyhow::{Context as _, Result, anyhow, bail};
use colored::Colorize;
use corkboard_core::{
    Board, BoardPatch, Card, CardPatch, Config, CustomFieldPatch, EntryType, JsonFileStore, Label,
    Member, NewCustomField, Session, Workspace,
};
use serde_json::{Value, json};
use std::path::PathBuf;
use tabled::settings::Style;
use tabled::{Table, Tabled};

/// Resolved config and data locations shared by every command
pub struct Context {
    pub json: bool,
    pub config: Config,
    pub config_path: PathBuf,
    pub data_path: PathBuf,
}

impl Context {
    pub fn new(config_path: Option<PathBuf>, data_path: Option<PathBuf>, json: bool) -> Result<Self> {
        let config_path = config_path.unwrap_or_else(Config::default_path);
        let config = Config::load(&config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
        let data_path = data_path.unwrap_or_else(|| config.data_path());

        if !config.display.colors {
            colored::control::set_override(false);
        }

        Ok(Self {
            json,
            config,
            config_path,
            data_path,
        })
    }

    pub fn session(&self) -> Result<Session<JsonFileStore>> {
        let store = JsonFileStore::new(&self.data_path);
        Session::open(store, &self.config)
            .with_context(|| format!("Failed to open workspace {}", self.data_path.display()))
    }

    fn truncate(&self, title: &str) -> String {
        let max = self.config.display.max_title_length;
        if title.chars().count() <= max {
            title.to_string()
        } else {
            let cut: String = title.chars().take(max.saturating_sub(1)).collect();
            format!("{}…", cut)
        }
    }

    /// Print a success line, or `value` when `--json` is set
    fn done(&self, message: &str, value: Value) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string(&value)?);
        } else {
            println!("{} {}", "✓".green(), message);
        }
        Ok(())
    }
}

fn find_board<'a>(ws: &'a Workspace, id: &str) -> Result<&'a Board> {
    ws.board(id).ok_or_else(|| anyhow!("Board not found: {}", id))
}

fn find_card<'a>(ws: &'a Workspace, board: &str, card: &str) -> Result<&'a Card> {
    find_board(ws, board)?
        .card(card)
        .ok_or_else(|| anyhow!("Card not found: {}", card))
}

/// Interpret a CLI value as JSON when it parses, plain text otherwise
fn parse_value(raw: Option<String>) -> Value {
    match raw {
        None => Value::Null,
        Some(raw) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
    }
}

// ---- boards ----

#[derive(Tabled)]
struct BoardRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Title")]
    title: String,
    #[tabled(rename = "Lists")]
    lists: usize,
    #[tabled(rename = "Cards")]
    cards: usize,
    #[tabled(rename = "Fields")]
    fields: usize,
    #[tabled(rename = "Template")]
    template: String,
}

pub fn board_create(ctx: &Context, title: &str) -> Result<()> {
    let mut session = ctx.session()?;
    let id = session.mutate(|ws| Ok(ws.create_board(title)))?;
    ctx.done(&format!("Created board {} ({})", title, id.cyan()), json!({ "id": id }))
}

pub fn board_list(ctx: &Context) -> Result<()> {
    let session = ctx.session()?;
    let ws = session.workspace();

    if ctx.json {
        let boards: Vec<&Board> = ws.boards().collect();
        println!("{}", serde_json::to_string(&boards)?);
        return Ok(());
    }

    let rows: Vec<BoardRow> = ws
        .boards()
        .map(|b| BoardRow {
            id: b.id.clone(),
            title: ctx.truncate(&b.title),
            lists: b.lists_order().len(),
            cards: b.card_count(),
            fields: b.custom_fields().len(),
            template: if b.is_template() { "yes".into() } else { String::new() },
        })
        .collect();

    if rows.is_empty() {
        println!("No boards found");
    } else {
        println!("{}", Table::new(rows).with(Style::rounded()));
    }
    Ok(())
}

pub fn board_show(ctx: &Context, id: &str) -> Result<()> {
    let session = ctx.session()?;
    let board = find_board(session.workspace(), id)?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(board)?);
        return Ok(());
    }

    let marker = if board.is_template() { " [template]".yellow().to_string() } else { String::new() };
    println!("{} {}{}", board.id.cyan().bold(), board.title.bold(), marker);
    if let Some(ref desc) = board.description {
        println!("{}", desc);
    }
    println!(
        "Created:  {}",
        board.created_at.format(&ctx.config.display.date_format)
    );

    if !board.custom_fields().is_empty() {
        println!();
        println!("{}", "Fields:".bold());
        for field in board.custom_fields() {
            let required = if field.required { " *".red().to_string() } else { String::new() };
            println!(
                "  {}. {} [{}]{} {}",
                field.order,
                field.name,
                field.field_type.to_string().blue(),
                required,
                field.id.dimmed()
            );
        }
    }

    for list in board.lists() {
        let cards = board.list_cards(&list.id).unwrap_or_default();
        println!();
        if ctx.config.display.show_count {
            println!("{} ({}) {}", list.title.bold(), cards.len(), list.id.dimmed());
        } else {
            println!("{} {}", list.title.bold(), list.id.dimmed());
        }
        for card in cards {
            let labels: Vec<&str> = card.labels.iter().map(|l| l.name.as_str()).collect();
            let mut line = format!("  {} {} {}", card.position, card.id.cyan(), ctx.truncate(&card.title));
            if !labels.is_empty() {
                line.push_str(&format!(" {}", format!("[{}]", labels.join(", ")).magenta()));
            }
            if let Some(due) = card.due_date {
                line.push_str(&format!(" due {}", due));
            }
            println!("{}", line);
        }
    }
    Ok(())
}

pub fn board_rename(ctx: &Context, id: &str, title: &str) -> Result<()> {
    let mut session = ctx.session()?;
    session.mutate(|ws| ws.update_board_title(id, title))?;
    ctx.done(&format!("Renamed board {} to {}", id.cyan(), title), json!({ "id": id, "title": title }))
}

pub fn board_update(ctx: &Context, id: &str, patch: BoardPatch) -> Result<()> {
    if patch.is_empty() {
        bail!("Nothing to update");
    }
    let mut session = ctx.session()?;
    session.mutate(|ws| ws.update_board(id, patch))?;
    ctx.done(&format!("Updated board {}", id.cyan()), json!({ "id": id }))
}

pub fn board_delete(ctx: &Context, id: &str) -> Result<()> {
    let mut session = ctx.session()?;
    session.mutate(|ws| ws.delete_board(id))?;
    ctx.done(&format!("Deleted board {}", id.cyan()), json!({ "id": id, "deleted": true }))
}

pub fn template_init(ctx: &Context) -> Result<()> {
    let mut config = ctx.config.clone();
    config.init_templates = false;
    let mut session = Session::open(JsonFileStore::new(&ctx.data_path), &config)?;
    let changed = session.mutate(|ws| Ok(ws.initialize_template_boards()))?;
    let id = corkboard_core::TEMPLATE_BOARD_ID;
    let message = if changed {
        format!("Template board {} initialized", id.cyan())
    } else {
        format!("Template board {} already up to date", id.cyan())
    };
    ctx.done(&message, json!({ "id": id, "changed": changed }))
}

// ---- lists ----

pub fn list_add(ctx: &Context, board: &str, title: &str) -> Result<()> {
    let mut session = ctx.session()?;
    let id = session.mutate(|ws| ws.add_list(board, title))?;
    ctx.done(&format!("Added list {} ({})", title, id.cyan()), json!({ "id": id }))
}

pub fn list_rename(ctx: &Context, board: &str, list: &str, title: &str) -> Result<()> {
    let mut session = ctx.session()?;
    session.mutate(|ws| ws.update_list_title(board, list, title))?;
    ctx.done(&format!("Renamed list {} to {}", list.cyan(), title), json!({ "id": list, "title": title }))
}

pub fn list_move(ctx: &Context, board: &str, from: usize, to: usize) -> Result<()> {
    let mut session = ctx.session()?;
    session.mutate(|ws| ws.move_list(board, from, to))?;
    let order = find_board(session.workspace(), board)?.lists_order().to_vec();
    ctx.done(&format!("Moved list {} -> {}", from, to), json!({ "listsOrder": order }))
}

pub fn list_delete(ctx: &Context, board: &str, list: &str) -> Result<()> {
    let mut session = ctx.session()?;
    session.mutate(|ws| ws.delete_list(board, list))?;
    ctx.done(&format!("Deleted list {}", list.cyan()), json!({ "id": list, "deleted": true }))
}

// ---- cards ----

pub fn card_add(ctx: &Context, board: &str, list: &str, title: &str) -> Result<()> {
    let mut session = ctx.session()?;
    let id = session.mutate(|ws| ws.add_card(board, list, title))?;
    if ctx.json {
        let card = find_card(session.workspace(), board, &id)?;
        println!("{}", serde_json::to_string(card)?);
        return Ok(());
    }
    ctx.done(&format!("Created card {} in {}", id.cyan(), list), Value::Null)
}

pub fn card_show(ctx: &Context, board: &str, card: &str) -> Result<()> {
    let session = ctx.session()?;
    let ws = session.workspace();
    let b = find_board(ws, board)?;
    let card = find_card(ws, board, card)?;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(card)?);
        return Ok(());
    }

    let list = b.list(&card.list_id).map(|l| l.title.as_str()).unwrap_or("?");
    println!("{} {}", card.id.cyan().bold(), card.title.bold());
    println!();
    println!("List:     {} (position {})", list, card.position);
    if let Some(due) = card.due_date {
        println!("Due:      {}", due);
    }
    if !card.labels.is_empty() {
        let labels: Vec<&str> = card.labels.iter().map(|l| l.name.as_str()).collect();
        println!("Labels:   {}", labels.join(", "));
    }
    if !card.members.is_empty() {
        let members: Vec<&str> = card.members.iter().map(|m| m.name.as_str()).collect();
        println!("Members:  {}", members.join(", "));
    }

    if let Some(ref desc) = card.description {
        println!();
        println!("{}", "Description:".bold());
        println!("{}", desc);
    }

    if !card.custom.is_empty() {
        println!();
        println!("{}", "Fields:".bold());
        for field in b.custom_fields() {
            if let Some(value) = card.custom.get(&field.id) {
                let shown = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                println!("  {}: {}", field.name, shown);
            }
        }
    }
    Ok(())
}

pub fn card_update(ctx: &Context, board: &str, card: &str, patch: CardPatch) -> Result<()> {
    let mut session = ctx.session()?;
    session.mutate(|ws| ws.update_card(board, card, patch))?;
    if ctx.json {
        println!("{}", serde_json::to_string(find_card(session.workspace(), board, card)?)?);
        return Ok(());
    }
    ctx.done(&format!("Updated card {}", card.cyan()), Value::Null)
}

pub fn card_move(
    ctx: &Context,
    board: &str,
    from_list: &str,
    to_list: &str,
    from: usize,
    to: usize,
) -> Result<()> {
    let mut session = ctx.session()?;
    session.mutate(|ws| ws.move_card(board, from_list, to_list, from, to))?;
    let moved = session
        .workspace()
        .list_cards(board, to_list)
        .and_then(|cards| cards.get(to))
        .map(|c| c.id.clone())
        .unwrap_or_default();
    ctx.done(
        &format!("Moved card {} to {}[{}]", moved.cyan(), to_list, to),
        json!({ "id": moved, "listId": to_list, "position": to }),
    )
}

pub fn card_delete(ctx: &Context, board: &str, list: &str, card: &str) -> Result<()> {
    let mut session = ctx.session()?;
    session.mutate(|ws| ws.delete_card(board, list, card))?;
    ctx.done(&format!("Deleted card {}", card.cyan()), json!({ "id": card, "deleted": true }))
}

pub fn card_comment(
    ctx: &Context,
    board: &str,
    card: &str,
    content: &str,
    author: Option<String>,
) -> Result<()> {
    let author = author.unwrap_or_else(|| ctx.config.actor.clone());
    let mut session = ctx.session()?;
    let id = session.mutate(|ws| ws.add_comment(board, card, &author, content, EntryType::Comment))?;
    ctx.done(&format!("Commented on {}", card.cyan()), json!({ "id": id }))
}

pub fn card_log(ctx: &Context, board: &str, card: &str) -> Result<()> {
    let session = ctx.session()?;
    let card = find_card(session.workspace(), board, card)?;

    if ctx.json {
        println!("{}", serde_json::to_string(&card.comments)?);
    } else if card.comments.is_empty() {
        println!("No activity");
    } else {
        for entry in &card.comments {
            let when = entry.timestamp.format(&ctx.config.display.date_format).to_string();
            let line = entry.to_string();
            if entry.is_activity() {
                println!("{} {}", when.dimmed(), line.dimmed());
            } else {
                println!("{} {}", when.dimmed(), line);
            }
        }
    }
    Ok(())
}

pub fn card_set_field(
    ctx: &Context,
    board: &str,
    card: &str,
    field: &str,
    value: Option<String>,
) -> Result<()> {
    let value = parse_value(value);
    let mut session = ctx.session()?;
    session.mutate(|ws| ws.set_card_custom_value(board, card, field, value))?;
    let stored = find_card(session.workspace(), board, card)?.custom.get(field).cloned();
    let message = match stored {
        Some(_) => format!("Set {} on {}", field, card.cyan()),
        None => format!("Cleared {} on {}", field, card.cyan()),
    };
    ctx.done(&message, json!({ "id": card, "field": field, "value": stored }))
}

pub fn card_label(
    ctx: &Context,
    board: &str,
    card: &str,
    name: &str,
    color: Option<String>,
    remove: bool,
) -> Result<()> {
    let mut session = ctx.session()?;
    if remove {
        session.mutate(|ws| ws.remove_label(board, card, name))?;
        ctx.done(&format!("Removed label {} from {}", name, card.cyan()), json!({ "id": card }))
    } else {
        session.mutate(|ws| ws.add_label(board, card, Label::new(name, color)))?;
        ctx.done(&format!("Labeled {} with {}", card.cyan(), name), json!({ "id": card }))
    }
}

pub fn card_member(
    ctx: &Context,
    board: &str,
    card: &str,
    id: &str,
    name: Option<String>,
    remove: bool,
) -> Result<()> {
    let mut session = ctx.session()?;
    if remove {
        session.mutate(|ws| ws.remove_member(board, card, id))?;
        ctx.done(&format!("Removed {} from {}", id, card.cyan()), json!({ "id": card }))
    } else {
        let member = Member {
            id: id.to_string(),
            name: name.unwrap_or_else(|| id.to_string()),
            avatar: None,
        };
        session.mutate(|ws| ws.add_member(board, card, member))?;
        ctx.done(&format!("Assigned {} to {}", id, card.cyan()), json!({ "id": card }))
    }
}

// ---- custom fields ----

pub fn field_add(ctx: &Context, board: &str, field: NewCustomField) -> Result<()> {
    let name = field.name.clone();
    let mut session = ctx.session()?;
    let id = session.mutate(|ws| ws.add_custom_field(board, field))?;
    ctx.done(&format!("Added field {} ({})", name, id.cyan()), json!({ "id": id }))
}

pub fn field_update(ctx: &Context, board: &str, field: &str, patch: CustomFieldPatch) -> Result<()> {
    let mut session = ctx.session()?;
    session.mutate(|ws| ws.update_custom_field(board, field, patch))?;
    ctx.done(&format!("Updated field {}", field.cyan()), json!({ "id": field }))
}

pub fn field_move(ctx: &Context, board: &str, from: usize, to: usize) -> Result<()> {
    let mut session = ctx.session()?;
    session.mutate(|ws| ws.reorder_custom_fields(board, from, to))?;
    ctx.done(&format!("Moved field {} -> {}", from, to), json!({ "from": from, "to": to }))
}

pub fn field_delete(ctx: &Context, board: &str, field: &str) -> Result<()> {
    let mut session = ctx.session()?;
    session.mutate(|ws| ws.delete_custom_field(board, field))?;
    ctx.done(&format!("Deleted field {}", field.cyan()), json!({ "id": field, "deleted": true }))
}

// ---- config ----

/// Show current configuration
pub fn config_show(ctx: &Context) -> Result<()> {
    let config = &ctx.config;

    if ctx.json {
        println!("{}", serde_json::to_string_pretty(config)?);
    } else {
        println!("{}", "Current configuration:".bold());
        println!();
        println!("actor = \"{}\"", config.actor);
        println!("data_file = \"{}\"", ctx.data_path.display());
        println!("init_templates = {}", config.init_templates);
        println!();
        println!("[display]");
        println!("colors = {}", config.display.colors);
        println!("date_format = \"{}\"", config.display.date_format);
        println!("show_count = {}", config.display.show_count);
        println!("max_title_length = {}", config.display.max_title_length);
    }

    Ok(())
}

pub fn config_path(ctx: &Context) -> Result<()> {
    if ctx.json {
        println!(
            "{}",
            json!({ "config": ctx.config_path, "data": ctx.data_path })
        );
    } else {
        println!("config: {}", ctx.config_path.display());
        println!("data:   {}", ctx.data_path.display());
    }
    Ok(())
}

/// Reset configuration to defaults
pub fn config_reset(ctx: &Context) -> Result<()> {
    if let Some(parent) = ctx.config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&ctx.config_path, Config::default_with_comments())?;
    println!("{} Configuration reset to defaults", "✓".green());
    Ok(())
}

/// Get a specific config value
pub fn config_get(ctx: &Context, key: &str) -> Result<()> {
    let config_json = serde_json::to_value(&ctx.config)?;

    // "display.colors" -> ["display", "colors"]
    let mut value = &config_json;
    for part in key.split('.') {
        value = value
            .get(part)
            .ok_or_else(|| anyhow!("Config key not found: {}", key))?;
    }

    if ctx.json {
        println!("{}", serde_json::to_string(value)?);
    } else {
        match value {
            Value::String(s) => println!("{}", s),
            Value::Bool(b) => println!("{}", b),
            Value::Number(n) => println!("{}", n),
            Value::Null => println!("null"),
            _ => println!("{}", serde_json::to_string_pretty(value)?),
        }
    }

    Ok(())
}

/// Set a config value
pub fn config_set(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let mut config = ctx.config.clone();
    apply_config_value(&mut config, key, value)?;
    config.save(&ctx.config_path)?;
    println!("{} Set {} = {}", "✓".green(), key, value);
    Ok(())
}

fn apply_config_value(config: &mut Config, key: &str, value: &str) -> Result<()> {
    let parse_bool = |v: &str| {
        v.parse::<bool>()
            .map_err(|_| anyhow!("Invalid boolean value: {}", v))
    };

    match key {
        "actor" => config.actor = value.to_string(),
        "id_prefix" => {
            if !value.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
                bail!("Invalid id prefix: {} (use letters, digits and '-')", value);
            }
            config.id_prefix = value.to_string();
        }
        "data_file" => {
            config.data_file = if value.is_empty() { None } else { Some(PathBuf::from(value)) }
        }
        "init_templates" => config.init_templates = parse_bool(value)?,
        "display.colors" => config.display.colors = parse_bool(value)?,
        "display.date_format" => config.display.date_format = value.to_string(),
        "display.show_count" => config.display.show_count = parse_bool(value)?,
        "display.max_title_length" => {
            config.display.max_title_length = value
                .parse()
                .map_err(|_| anyhow!("Invalid integer value: {}", value))?;
        }
        _ => bail!("Unknown config key: {}", key),
    }
    Ok(())
}
