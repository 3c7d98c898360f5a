use clap::{Parser, Subcommand};
use std::io::Write;
use thiserror::Error;

use crate::database::{Database, DatabaseError};
use crate::models::{PostForm, PostWithTags};
use crate::search::{PostListing, PostQuery};

#[derive(Parser)]
#[command(name = "tagpost")]
#[command(about = "Tagged posts with keyword and tag search, in the terminal")]
#[command(version)]
pub struct Cli {
    /// Custom config file path
    #[arg(short, long)]
    pub config: Option<String>,

    /// Use development mode (uses separate dev config/database)
    #[arg(long)]
    pub dev: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Launch interactive TUI (default if no subcommand)
    Tui,
    /// Create a post
    New {
        /// Post title
        title: String,
        /// Post body (markdown)
        #[arg(short, long)]
        description: String,
        /// Comma-separated tags
        #[arg(long)]
        tags: Option<String>,
    },
    /// Update a post; omitted fields keep their value, `--tags ""` clears tags
    Edit {
        id: i64,
        #[arg(long)]
        title: Option<String>,
        #[arg(short, long)]
        description: Option<String>,
        /// Comma-separated tags replacing the current ones
        #[arg(long)]
        tags: Option<String>,
    },
    /// Print one post with its tags
    Show {
        id: i64,
        #[arg(long)]
        json: bool,
    },
    /// Delete a post
    Delete { id: i64 },
    /// List posts, optionally filtered by keyword and/or tag
    List {
        /// Match against title or description
        #[arg(short = 'q', long = "keyword")]
        keyword: Option<String>,
        /// Only posts carrying this exact tag
        #[arg(short, long)]
        tag: Option<String>,
        #[arg(long)]
        json: bool,
    },
    /// Print every tag name
    Tags {
        #[arg(long)]
        json: bool,
    },
    /// Delete a tag by name; posts keep existing
    DeleteTag { name: String },
    /// Load sample tags and posts
    Seed,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DatabaseError),
    #[error("Failed to encode JSON: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Failed to write output: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Tag not found: {0}")]
    TagNotFound(String),
    #[error("Nothing to update: pass --title, --description or --tags")]
    NothingToUpdate,
}

fn write_post(out: &mut impl Write, post: &PostWithTags) -> Result<(), CliError> {
    writeln!(out, "#{} {}", post.post.id, post.post.title)?;
    if post.tags.is_empty() {
        writeln!(out, "Tags: (none)")?;
    } else {
        writeln!(out, "Tags: {}", post.tag_names_as_string())?;
    }
    writeln!(out, "Created: {}  Updated: {}", post.post.created_at, post.post.updated_at)?;
    writeln!(out)?;
    writeln!(out, "{}", post.post.description)?;
    Ok(())
}

fn write_listing(out: &mut impl Write, listing: &PostListing) -> Result<(), CliError> {
    if listing.is_filtered() {
        let mut criteria = Vec::new();
        if let Some(ref keyword) = listing.keyword {
            criteria.push(format!("\"{}\"", keyword));
        }
        if let Some(ref tag) = listing.tag {
            criteria.push(format!("tag: {}", tag));
        }
        writeln!(out, "Search results for {}: {} post(s)", criteria.join(", "), listing.total)?;
        if listing.posts.is_empty() {
            writeln!(out, "No posts match the current search.")?;
            return Ok(());
        }
    } else {
        writeln!(out, "{} post(s)", listing.total)?;
    }

    for post in &listing.posts {
        if post.tags.is_empty() {
            writeln!(out, "{:>4}  {}", post.post.id, post.post.title)?;
        } else {
            writeln!(out, "{:>4}  {}  [{}]", post.post.id, post.post.title, post.tag_names_as_string())?;
        }
    }
    Ok(())
}

/// Handle the new command
pub fn handle_new(
    title: String,
    description: String,
    tags: Option<String>,
    db: &Database,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let form = PostForm { title, description, tag_names: tags };
    let post = db.create_post(&form)?;
    writeln!(out, "Post created successfully (ID: {})", post.post.id)?;
    if !post.tags.is_empty() {
        writeln!(out, "Tags: {}", post.tag_names_as_string())?;
    }
    Ok(())
}

/// Handle the edit command
pub fn handle_edit(
    id: i64,
    title: Option<String>,
    description: Option<String>,
    tags: Option<String>,
    db: &Database,
    out: &mut impl Write,
) -> Result<(), CliError> {
    if title.is_none() && description.is_none() && tags.is_none() {
        return Err(CliError::NothingToUpdate);
    }

    let current = db.get_post(id)?;
    let form = PostForm {
        title: title.unwrap_or(current.post.title),
        description: description.unwrap_or(current.post.description),
        tag_names: tags,
    };
    let post = db.update_post(id, &form)?;
    writeln!(out, "Post updated successfully (ID: {})", post.post.id)?;
    Ok(())
}

pub fn handle_show(id: i64, json: bool, db: &Database, out: &mut impl Write) -> Result<(), CliError> {
    let post = db.get_post(id)?;
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&post)?)?;
    } else {
        write_post(out, &post)?;
    }
    Ok(())
}

pub fn handle_delete(id: i64, db: &Database, out: &mut impl Write) -> Result<(), CliError> {
    db.delete_post(id)?;
    writeln!(out, "Post deleted (ID: {})", id)?;
    Ok(())
}

/// Handle the list command
pub fn handle_list(
    keyword: Option<String>,
    tag: Option<String>,
    json: bool,
    db: &Database,
    out: &mut impl Write,
) -> Result<(), CliError> {
    let listing = db.list_posts(&PostQuery::new(keyword, tag))?;
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&listing)?)?;
    } else {
        write_listing(out, &listing)?;
    }
    Ok(())
}

pub fn handle_tags(json: bool, db: &Database, out: &mut impl Write) -> Result<(), CliError> {
    let names = db.all_tag_names()?;
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&names)?)?;
    } else {
        for name in names {
            writeln!(out, "{}", name)?;
        }
    }
    Ok(())
}

pub fn handle_delete_tag(name: &str, db: &Database, out: &mut impl Write) -> Result<(), CliError> {
    let tag = db
        .find_tag_by_name(name)?
        .ok_or_else(|| CliError::TagNotFound(name.trim().to_string()))?;
    db.delete_tag(tag.id)?;
    writeln!(out, "Tag deleted: {}", tag.name)?;
    Ok(())
}

pub fn handle_seed(db: &Database, out: &mut impl Write) -> Result<(), CliError> {
    let (tags, posts) = db.seed_sample_data()?;
    writeln!(out, "Sample data loaded: {} tags, {} posts", tags, posts)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn run(f: impl FnOnce(&mut Vec<u8>) -> Result<(), CliError>) -> String {
        let mut out = Vec::new();
        f(&mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn seeded() -> Database {
        let db = Database::in_memory().unwrap();
        db.create_post(&PostForm::new("Rails intro", "Getting started").with_tags("Ruby, Rails"))
            .unwrap();
        db.create_post(&PostForm::new("Plain", "No tags here")).unwrap();
        db
    }

    #[test]
    fn new_reports_id_and_tags() {
        let db = Database::in_memory().unwrap();
        let output = run(|out| {
            handle_new("T".into(), "D".into(), Some(" Go , Rust ,".into()), &db, out)
        });
        assert_eq!(output, "Post created successfully (ID: 1)\nTags: Go, Rust\n");
    }

    #[test]
    fn new_surfaces_validation_errors() {
        let db = Database::in_memory().unwrap();
        let err = handle_new("".into(), "D".into(), Some("Go".into()), &db, &mut Vec::<u8>::new()).unwrap_err();
        assert_eq!(err.to_string(), "Database error: Validation failed: Title can't be blank");
        assert_eq!(db.count_tags().unwrap(), 0);
    }

    #[test]
    fn edit_without_fields_is_rejected() {
        let db = seeded();
        assert!(matches!(
            handle_edit(1, None, None, None, &db, &mut Vec::<u8>::new()),
            Err(CliError::NothingToUpdate)
        ));
    }

    #[test]
    fn edit_title_only_keeps_tags() {
        let db = seeded();
        run(|out| handle_edit(1, Some("Renamed".into()), None, None, &db, out));
        let post = db.get_post(1).unwrap();
        assert_eq!(post.post.title, "Renamed");
        assert_eq!(post.tag_names(), vec!["Ruby", "Rails"]);
    }

    #[test]
    fn list_shows_filter_header_and_rows() {
        let db = seeded();
        let output = run(|out| handle_list(None, Some("Ruby".into()), false, &db, out));
        assert_eq!(output, "Search results for tag: Ruby: 1 post(s)\n   1  Rails intro  [Ruby, Rails]\n");
    }

    #[test]
    fn list_reports_no_matches() {
        let db = seeded();
        let output = run(|out| handle_list(Some("zzz".into()), None, false, &db, out));
        assert_eq!(output, "Search results for \"zzz\": 0 post(s)\nNo posts match the current search.\n");
    }

    #[test]
    fn list_json_carries_tag_vocabulary() {
        let db = seeded();
        let output = run(|out| handle_list(None, None, true, &db, out));
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["total"], 2);
        assert_eq!(value["all_tag_names"], serde_json::json!(["Rails", "Ruby"]));
        assert_eq!(value["posts"][0]["title"], "Rails intro");
        assert_eq!(value["posts"][0]["tags"][1]["name"], "Rails");
    }

    #[test]
    fn show_renders_untagged_post() {
        let db = seeded();
        let output = run(|out| handle_show(2, false, &db, out));
        assert!(output.starts_with("#2 Plain\nTags: (none)\n"));
        assert!(output.ends_with("\nNo tags here\n"));
    }

    #[test]
    fn delete_tag_by_unknown_name_fails() {
        let db = seeded();
        assert!(matches!(
            handle_delete_tag("Go", &db, &mut Vec::<u8>::new()),
            Err(CliError::TagNotFound(name)) if name == "Go"
        ));
    }

    #[test]
    fn delete_tag_keeps_posts() {
        let db = seeded();
        run(|out| handle_delete_tag(" Ruby ", &db, out));
        assert_eq!(db.count_posts().unwrap(), 2);
        assert_eq!(db.get_post(1).unwrap().tag_names(), vec!["Rails"]);
    }
}
