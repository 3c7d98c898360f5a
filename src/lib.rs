pub mod config;
pub mod database;
pub mod models;
pub mod tagging;
pub mod search;
pub mod logging;
pub mod utils;
pub mod cli;
pub mod tui;

pub use config::Config;
pub use database::{Database, DatabaseError};
pub use models::{Post, PostForm, PostTag, PostWithTags, Tag, ValidationErrors};
pub use search::{PostListing, PostQuery};
pub use tagging::{parse_tag_names, TagNameInput};
pub use utils::Profile;
