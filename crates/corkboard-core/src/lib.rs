//! corkboard-core: planning engine for boards, lists, cards and custom fields
//!
//! Keeps a hierarchy of ordered collections consistent under insert, move
//! and delete. All state transitions go through [`Workspace`]; storage is
//! plugged in through the [`Persistence`] trait.

pub mod activity;
pub mod board;
pub mod card;
pub mod config;
pub mod error;
pub mod field;
pub mod id;
pub mod list;
pub mod order;
pub mod session;
pub mod store;
pub mod template;
pub mod workspace;

pub use activity::{ActivityKind, EntryType, LogEntry};
pub use board::{Board, BoardPatch, DEFAULT_LISTS};
pub use card::{Card, CardPatch, Label, Member};
pub use config::Config;
pub use error::Error;
pub use field::{CustomField, CustomFieldPatch, FieldType, NewCustomField};
pub use id::generate_id;
pub use list::List;
pub use order::reorder;
pub use session::Session;
pub use store::{JsonFileStore, MemoryStore, Persistence};
pub use template::TEMPLATE_BOARD_ID;
pub use workspace::Workspace;

/// Result type for corkboard operations
pub type Result<T> = std::result::Result<T, Error>;
