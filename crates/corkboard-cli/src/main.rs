//! cork - boards, lists and cards from the terminal
//!
//! The whole workspace lives in one JSON file; every command loads it,
//! applies at most one mutation and saves it back.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;

#[derive(Parser)]
#[command(name = "cork")]
#[command(about = "Plan boards, lists and cards from the command line")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Workspace data file
    #[arg(long, global = true, env = "CORK_DATA")]
    data: Option<PathBuf>,

    /// Config file
    #[arg(long, global = true, env = "CORK_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage boards
    Board {
        #[command(subcommand)]
        command: BoardCommands,
    },

    /// Manage the built-in template board
    Template {
        #[command(subcommand)]
        command: TemplateCommands,
    },

    /// Manage the lists of a board
    List {
        #[command(subcommand)]
        command: ListCommands,
    },

    /// Manage cards
    Card {
        #[command(subcommand)]
        command: CardCommands,
    },

    /// Manage a board's custom fields
    Field {
        #[command(subcommand)]
        command: FieldCommands,
    },

    /// Show or edit configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum BoardCommands {
    /// Create a board with the default lists
    Create {
        /// Board title
        title: String,
    },

    /// List boards in display order
    List,

    /// Show a board with its lists and cards
    Show {
        /// Board ID
        id: String,
    },

    /// Rename a board
    Rename {
        /// Board ID
        id: String,

        /// New title
        title: String,
    },

    /// Update board metadata
    Update {
        /// Board ID
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        icon: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(long)]
        color: Option<String>,

        #[arg(long)]
        cover: Option<String>,
    },

    /// Delete a board
    Delete {
        /// Board ID
        id: String,
    },
}

#[derive(Subcommand)]
enum TemplateCommands {
    /// Create or repair the template board and pin it first
    Init,
}

#[derive(Subcommand)]
enum ListCommands {
    /// Append a list
    Add {
        /// Board ID
        board: String,

        /// List title
        title: String,
    },

    /// Rename a list
    Rename {
        board: String,
        list: String,
        title: String,
    },

    /// Move a list from one index to another
    Move {
        board: String,
        from: usize,
        to: usize,
    },

    /// Delete a list and its cards
    Delete {
        board: String,
        list: String,
    },
}

#[derive(Subcommand)]
enum CardCommands {
    /// Add a card at the end of a list
    Add {
        board: String,
        list: String,
        title: String,
    },

    /// Show card details
    Show {
        board: String,
        card: String,
    },

    /// Update a card
    Update {
        board: String,
        card: String,

        #[arg(long)]
        title: Option<String>,

        /// New description (empty string clears it)
        #[arg(short, long)]
        description: Option<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<chrono::NaiveDate>,

        /// Remove the due date
        #[arg(long, conflicts_with = "due")]
        clear_due: bool,
    },

    /// Move a card between positions or lists
    Move {
        board: String,
        from_list: String,
        to_list: String,
        from: usize,
        to: usize,
    },

    /// Delete a card
    Delete {
        board: String,
        list: String,
        card: String,
    },

    /// Add a comment to a card
    Comment {
        board: String,
        card: String,
        content: String,

        /// Comment author (defaults to the configured actor)
        #[arg(long)]
        author: Option<String>,
    },

    /// Show a card's comments and activity
    Log {
        board: String,
        card: String,
    },

    /// Set a custom field value (omit the value to clear it)
    SetField {
        board: String,
        card: String,
        field: String,

        /// Value; parsed as JSON when possible, otherwise stored as text
        value: Option<String>,
    },

    /// Add or remove a label
    Label {
        board: String,
        card: String,
        name: String,

        #[arg(long)]
        color: Option<String>,

        #[arg(long)]
        remove: bool,
    },

    /// Add or remove a member
    Member {
        board: String,
        card: String,
        id: String,

        /// Display name (defaults to the id)
        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        remove: bool,
    },
}

#[derive(Subcommand)]
enum FieldCommands {
    /// Add a custom field
    Add {
        board: String,
        name: String,

        /// Field type (text, long-text, number, date, single-select, multi-select, checkbox)
        #[arg(short = 't', long = "type", default_value = "text")]
        field_type: String,

        #[arg(long)]
        required: bool,

        /// Option for select fields (repeatable)
        #[arg(long = "option")]
        options: Vec<String>,

        #[arg(long)]
        show_on_card: bool,

        #[arg(long)]
        help_text: Option<String>,

        /// Index to insert at; the others shift (defaults to the end)
        #[arg(long)]
        order: Option<usize>,
    },

    /// Update a custom field
    Update {
        board: String,
        field: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(short = 't', long = "type")]
        field_type: Option<String>,

        #[arg(long)]
        required: Option<bool>,

        /// Replace the options (repeatable)
        #[arg(long = "option")]
        options: Vec<String>,

        #[arg(long)]
        show_on_card: Option<bool>,

        #[arg(long)]
        help_text: Option<String>,

        /// Move the field to this index; the others shift around it
        #[arg(long)]
        order: Option<usize>,
    },

    /// Move a field from one index to another
    Move {
        board: String,
        from: usize,
        to: usize,
    },

    /// Delete a field and its values on every card
    Delete {
        board: String,
        field: String,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Print the config file path
    Path,
    /// Reset to default configuration
    Reset,
    /// Get a specific config value
    Get {
        /// Config key (e.g., "actor", "display.colors")
        key: String,
    },
    /// Set a config value
    Set {
        /// Config key
        key: String,
        /// New value
        value: String,
    },
}

fn init_tracing() {
    let filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let ctx = commands::Context::new(cli.config, cli.data, cli.json)?;

    match cli.command {
        Commands::Board { command } => match command {
            BoardCommands::Create { title } => commands::board_create(&ctx, &title),
            BoardCommands::List => commands::board_list(&ctx),
            BoardCommands::Show { id } => commands::board_show(&ctx, &id),
            BoardCommands::Rename { id, title } => commands::board_rename(&ctx, &id, &title),
            BoardCommands::Update {
                id,
                title,
                icon,
                description,
                color,
                cover,
            } => commands::board_update(
                &ctx,
                &id,
                corkboard_core::BoardPatch {
                    title,
                    icon,
                    description,
                    color,
                    cover,
                },
            ),
            BoardCommands::Delete { id } => commands::board_delete(&ctx, &id),
        },
        Commands::Template { command } => match command {
            TemplateCommands::Init => commands::template_init(&ctx),
        },
        Commands::List { command } => match command {
            ListCommands::Add { board, title } => commands::list_add(&ctx, &board, &title),
            ListCommands::Rename { board, list, title } => {
                commands::list_rename(&ctx, &board, &list, &title)
            }
            ListCommands::Move { board, from, to } => commands::list_move(&ctx, &board, from, to),
            ListCommands::Delete { board, list } => commands::list_delete(&ctx, &board, &list),
        },
        Commands::Card { command } => match command {
            CardCommands::Add { board, list, title } => {
                commands::card_add(&ctx, &board, &list, &title)
            }
            CardCommands::Show { board, card } => commands::card_show(&ctx, &board, &card),
            CardCommands::Update {
                board,
                card,
                title,
                description,
                due,
                clear_due,
            } => {
                let due_date = if clear_due { Some(None) } else { due.map(Some) };
                commands::card_update(
                    &ctx,
                    &board,
                    &card,
                    corkboard_core::CardPatch {
                        title,
                        description,
                        due_date,
                        ..Default::default()
                    },
                )
            }
            CardCommands::Move {
                board,
                from_list,
                to_list,
                from,
                to,
            } => commands::card_move(&ctx, &board, &from_list, &to_list, from, to),
            CardCommands::Delete { board, list, card } => {
                commands::card_delete(&ctx, &board, &list, &card)
            }
            CardCommands::Comment {
                board,
                card,
                content,
                author,
            } => commands::card_comment(&ctx, &board, &card, &content, author),
            CardCommands::Log { board, card } => commands::card_log(&ctx, &board, &card),
            CardCommands::SetField {
                board,
                card,
                field,
                value,
            } => commands::card_set_field(&ctx, &board, &card, &field, value),
            CardCommands::Label {
                board,
                card,
                name,
                color,
                remove,
            } => commands::card_label(&ctx, &board, &card, &name, color, remove),
            CardCommands::Member {
                board,
                card,
                id,
                name,
                remove,
            } => commands::card_member(&ctx, &board, &card, &id, name, remove),
        },
        Commands::Field { command } => match command {
            FieldCommands::Add {
                board,
                name,
                field_type,
                required,
                options,
                show_on_card,
                help_text,
                order,
            } => {
                let field = corkboard_core::NewCustomField {
                    name,
                    field_type: field_type.parse()?,
                    required,
                    options: (!options.is_empty()).then_some(options),
                    show_on_card,
                    help_text,
                    order,
                    default_value: None,
                };
                commands::field_add(&ctx, &board, field)
            }
            FieldCommands::Update {
                board,
                field,
                name,
                field_type,
                required,
                options,
                show_on_card,
                help_text,
                order,
            } => {
                let patch = corkboard_core::CustomFieldPatch {
                    name,
                    field_type: field_type
                        .map(|t| t.parse::<corkboard_core::FieldType>())
                        .transpose()?,
                    required,
                    options: (!options.is_empty()).then_some(options),
                    show_on_card,
                    help_text,
                    order,
                    default_value: None,
                };
                commands::field_update(&ctx, &board, &field, patch)
            }
            FieldCommands::Move { board, from, to } => commands::field_move(&ctx, &board, from, to),
            FieldCommands::Delete { board, field } => commands::field_delete(&ctx, &board, &field),
        },
        Commands::Config { command } => match command {
            Some(ConfigCommands::Show) | None => commands::config_show(&ctx),
            Some(ConfigCommands::Path) => commands::config_path(&ctx),
            Some(ConfigCommands::Reset) => commands::config_reset(&ctx),
            Some(ConfigCommands::Get { key }) => commands::config_get(&ctx, &key),
            Some(ConfigCommands::Set { key, value }) => commands::config_set(&ctx, &key, &value),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_card_move() {
        let cli = Cli::try_parse_from(["cork", "card", "move", "board-1", "ideas", "doing", "0", "2"])
            .unwrap();
        match cli.command {
            Commands::Card {
                command: CardCommands::Move { from_list, to_list, from, to, .. },
            } => {
                assert_eq!(from_list, "ideas");
                assert_eq!(to_list, "doing");
                assert_eq!((from, to), (0, 2));
            }
            _ => panic!("expected card move"),
        }
    }

    #[test]
    fn test_parse_field_add_with_options() {
        let cli = Cli::try_parse_from([
            "cork", "--json", "field", "add", "board-1", "Channel", "-t", "single-select",
            "--option", "Email", "--option", "Web",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Field {
                command: FieldCommands::Add { field_type, options, .. },
            } => {
                assert_eq!(field_type, "single-select");
                assert_eq!(options, vec!["Email", "Web"]);
            }
            _ => panic!("expected field add"),
        }
    }

    #[test]
    fn test_due_and_clear_due_conflict() {
        let result = Cli::try_parse_from([
            "cork", "card", "update", "board-1", "card-1", "--due", "2025-01-01", "--clear-due",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_due_date_is_rejected() {
        let result = Cli::try_parse_from(["cork", "card", "update", "b", "c", "--due", "tomorrow"]);
        assert!(result.is_err());
    }
}
