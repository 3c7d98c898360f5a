use log::{debug, info};
use rusqlite::{Connection, OptionalExtension};
use std::path::PathBuf;
use thiserror::Error;

use crate::models::{
    timestamp_now, validate_tag_name, Post, PostForm, PostTag, PostWithTags, Tag, ValidationErrors,
    TAKEN_MESSAGE,
};
use crate::search::{self, PostListing, PostQuery};
use crate::tagging::{self, TagNameInput};

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    SqliteError(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    DirectoryError(String),
    #[error("Validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("{entity} not found (ID: {id})")]
    NotFound { entity: &'static str, id: i64 },
}

impl From<ValidationErrors> for DatabaseError {
    fn from(errors: ValidationErrors) -> Self {
        DatabaseError::Validation(errors)
    }
}

impl DatabaseError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, DatabaseError::NotFound { .. })
    }

    pub fn validation_errors(&self) -> Option<&ValidationErrors> {
        match self {
            DatabaseError::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// True when a statement failed on a UNIQUE index
fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(failure, _) => {
            failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
        }
        _ => false,
    }
}

const SAMPLE_TAG_NAMES: &[&str] = &[
    "Ruby", "Rails", "JavaScript", "HTML", "CSS",
    "Programming", "Web", "Frontend", "Backend", "Database",
    "Beginner", "Intermediate", "Advanced", "Tutorial", "tips",
];

const SAMPLE_POST_COUNT: usize = 30;

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Create a new database connection and initialize the schema
    pub fn new(path: &str) -> Result<Self, DatabaseError> {
        let db_path = PathBuf::from(path);

        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DatabaseError::DirectoryError(e.to_string()))?;
            }
        }

        let conn = Connection::open(&db_path)?;
        debug!("opened database at {}", db_path.display());

        let db = Database { conn };
        db.initialize_schema()?;

        Ok(db)
    }

    /// Open a private in-memory database, used by tests and dry runs
    pub fn in_memory() -> Result<Self, DatabaseError> {
        let db = Database { conn: Connection::open_in_memory()? };
        db.initialize_schema()?;
        Ok(db)
    }

    /// Initialize the database schema (tables and indexes)
    fn initialize_schema(&self) -> Result<(), DatabaseError> {
        // Cascading deletes on post_tags depend on this
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS posts (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                title           TEXT NOT NULL,
                description     TEXT NOT NULL,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS tags (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                name            TEXT NOT NULL UNIQUE,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS post_tags (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                post_id         INTEGER NOT NULL REFERENCES posts(id) ON DELETE CASCADE,
                tag_id          INTEGER NOT NULL REFERENCES tags(id) ON DELETE CASCADE,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL,
                UNIQUE (post_id, tag_id)
            )",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_post_tags_tag_id ON post_tags(tag_id)",
            [],
        )?;

        self.conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_posts_title ON posts(title)",
            [],
        )?;

        Ok(())
    }

    /// Get a reference to the underlying connection
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub(crate) fn row_to_post(row: &rusqlite::Row) -> Result<Post, rusqlite::Error> {
        Ok(Post {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    /// Map a tag row whose columns start at `offset`
    pub(crate) fn row_to_tag_at(row: &rusqlite::Row, offset: usize) -> Result<Tag, rusqlite::Error> {
        Ok(Tag {
            id: row.get(offset)?,
            name: row.get(offset + 1)?,
            created_at: row.get(offset + 2)?,
            updated_at: row.get(offset + 3)?,
        })
    }

    fn row_to_tag(row: &rusqlite::Row) -> Result<Tag, rusqlite::Error> {
        Self::row_to_tag_at(row, 0)
    }

    fn row_to_post_tag(row: &rusqlite::Row) -> Result<PostTag, rusqlite::Error> {
        Ok(PostTag {
            id: row.get(0)?,
            post_id: row.get(1)?,
            tag_id: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    // Posts

    /// Validate and insert a post; when the form carries tag names the
    /// post's associations are synchronized in the same transaction
    pub fn create_post(&self, form: &PostForm) -> Result<PostWithTags, DatabaseError> {
        form.validate()?;

        let tx = self.conn.unchecked_transaction()?;
        let now = timestamp_now();
        tx.execute(
            "INSERT INTO posts (title, description, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![form.title, form.description, now, now],
        )?;
        let id = tx.last_insert_rowid();

        if let Some(ref raw) = form.tag_names {
            tagging::sync_post_tags(&tx, id, raw)?;
        }

        let post = load_post_with_tags(&tx, id)?;
        tx.commit()?;

        info!("created post {} with {} tag(s)", id, post.tags.len());
        Ok(post)
    }

    /// Update a post's scalar fields and, if tag names were submitted,
    /// replace its tag associations
    pub fn update_post(&self, id: i64, form: &PostForm) -> Result<PostWithTags, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        if find_post(&tx, id)?.is_none() {
            return Err(DatabaseError::NotFound { entity: "Post", id });
        }

        form.validate()?;

        tx.execute(
            "UPDATE posts SET title = ?1, description = ?2, updated_at = ?3 WHERE id = ?4",
            rusqlite::params![form.title, form.description, timestamp_now(), id],
        )?;

        if let Some(ref raw) = form.tag_names {
            tagging::sync_post_tags(&tx, id, raw)?;
        }

        let post = load_post_with_tags(&tx, id)?;
        tx.commit()?;

        info!("updated post {}", id);
        Ok(post)
    }

    /// Get a single post by ID with its tags
    pub fn get_post(&self, id: i64) -> Result<PostWithTags, DatabaseError> {
        load_post_with_tags(&self.conn, id)
    }

    /// Delete a post by ID; its associations go with it
    pub fn delete_post(&self, id: i64) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let deleted = tx.execute("DELETE FROM posts WHERE id = ?1", rusqlite::params![id])?;
        if deleted == 0 {
            return Err(DatabaseError::NotFound { entity: "Post", id });
        }
        tx.commit()?;
        info!("deleted post {}", id);
        Ok(())
    }

    pub fn count_posts(&self) -> Result<usize, DatabaseError> {
        count_rows(&self.conn, "posts")
    }

    // Tags

    /// Create a tag; the name is trimmed and must be unique
    pub fn create_tag(&self, name: &str) -> Result<Tag, DatabaseError> {
        insert_tag(&self.conn, name.trim())
    }

    pub fn rename_tag(&self, id: i64, name: &str) -> Result<Tag, DatabaseError> {
        let name = name.trim();
        let tx = self.conn.unchecked_transaction()?;
        if find_tag(&tx, id)?.is_none() {
            return Err(DatabaseError::NotFound { entity: "Tag", id });
        }
        validate_tag_name(name)?;
        if let Some(existing) = find_tag_by_name(&tx, name)? {
            if existing.id != id {
                return Err(ValidationErrors::single("name", TAKEN_MESSAGE).into());
            }
        }

        tx.execute(
            "UPDATE tags SET name = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![name, timestamp_now(), id],
        )
        .map_err(|e| unique_to_validation(e, "name"))?;

        let tag = find_tag(&tx, id)?.ok_or(DatabaseError::NotFound { entity: "Tag", id })?;
        tx.commit()?;
        Ok(tag)
    }

    pub fn get_tag(&self, id: i64) -> Result<Tag, DatabaseError> {
        find_tag(&self.conn, id)?.ok_or(DatabaseError::NotFound { entity: "Tag", id })
    }

    /// Exact, case-sensitive lookup of a tag by trimmed name
    pub fn find_tag_by_name(&self, name: &str) -> Result<Option<Tag>, DatabaseError> {
        find_tag_by_name(&self.conn, name.trim())
    }

    /// Delete a tag by ID; posts that carried it keep existing
    pub fn delete_tag(&self, id: i64) -> Result<(), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let deleted = tx.execute("DELETE FROM tags WHERE id = ?1", rusqlite::params![id])?;
        if deleted == 0 {
            return Err(DatabaseError::NotFound { entity: "Tag", id });
        }
        tx.commit()?;
        info!("deleted tag {}", id);
        Ok(())
    }

    /// Get all tags ordered by name ASC
    pub fn all_tags(&self) -> Result<Vec<Tag>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, created_at, updated_at FROM tags ORDER BY name ASC"
        )?;
        let tags = stmt.query_map([], Self::row_to_tag)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tags)
    }

    /// Every tag name ordered alphabetically, for tag selection controls
    pub fn all_tag_names(&self) -> Result<Vec<String>, DatabaseError> {
        search::all_tag_names(&self.conn)
    }

    pub fn count_tags(&self) -> Result<usize, DatabaseError> {
        count_rows(&self.conn, "tags")
    }

    /// Posts carrying a tag, in post ID order
    pub fn posts_for_tag(&self, tag_id: i64) -> Result<Vec<Post>, DatabaseError> {
        if find_tag(&self.conn, tag_id)?.is_none() {
            return Err(DatabaseError::NotFound { entity: "Tag", id: tag_id });
        }
        let mut stmt = self.conn.prepare(
            "SELECT p.id, p.title, p.description, p.created_at, p.updated_at
             FROM posts p JOIN post_tags pt ON pt.post_id = p.id
             WHERE pt.tag_id = ?1 ORDER BY p.id ASC"
        )?;
        let posts = stmt.query_map(rusqlite::params![tag_id], Self::row_to_post)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(posts)
    }

    // Associations

    /// Attach an existing tag to an existing post
    pub fn attach_tag(&self, post_id: i64, tag_id: i64) -> Result<PostTag, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        if find_post(&tx, post_id)?.is_none() {
            return Err(DatabaseError::NotFound { entity: "Post", id: post_id });
        }
        if find_tag(&tx, tag_id)?.is_none() {
            return Err(DatabaseError::NotFound { entity: "Tag", id: tag_id });
        }
        let post_tag = insert_post_tag(&tx, post_id, tag_id)?;
        tx.commit()?;
        Ok(post_tag)
    }

    pub fn tags_for_post(&self, post_id: i64) -> Result<Vec<Tag>, DatabaseError> {
        tags_for_post(&self.conn, post_id)
    }

    pub fn post_tags_for_post(&self, post_id: i64) -> Result<Vec<PostTag>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, post_id, tag_id, created_at, updated_at
             FROM post_tags WHERE post_id = ?1 ORDER BY id ASC"
        )?;
        let rows = stmt.query_map(rusqlite::params![post_id], Self::row_to_post_tag)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    pub fn count_post_tags(&self) -> Result<usize, DatabaseError> {
        count_rows(&self.conn, "post_tags")
    }

    // Tag store, synchronizer and search

    /// Resolve names to tags, creating the missing ones, in one transaction
    pub fn resolve_or_create_tags<I>(&self, names: I) -> Result<Vec<Tag>, DatabaseError>
    where
        I: IntoIterator,
        I::Item: TagNameInput,
    {
        let tx = self.conn.unchecked_transaction()?;
        let tags = tagging::resolve_or_create_tags(&tx, names)?;
        tx.commit()?;
        Ok(tags)
    }

    /// Replace a post's tag associations with the tags named in `raw`
    pub fn sync_post_tags(&self, post_id: i64, raw: &str) -> Result<Vec<Tag>, DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        if find_post(&tx, post_id)?.is_none() {
            return Err(DatabaseError::NotFound { entity: "Post", id: post_id });
        }
        let tags = tagging::sync_post_tags(&tx, post_id, raw)?;
        tx.commit()?;
        Ok(tags)
    }

    pub fn search_posts(&self, query: &PostQuery) -> Result<Vec<PostWithTags>, DatabaseError> {
        search::search_posts(&self.conn, query)
    }

    pub fn list_posts(&self, query: &PostQuery) -> Result<PostListing, DatabaseError> {
        search::list_posts(&self.conn, query)
    }

    /// Load the sample tag vocabulary and sample posts; running it again
    /// creates nothing new
    pub fn seed_sample_data(&self) -> Result<(usize, usize), DatabaseError> {
        let tx = self.conn.unchecked_transaction()?;
        let tags = tagging::resolve_or_create_tags(&tx, SAMPLE_TAG_NAMES.iter().copied())?;

        for i in 0..SAMPLE_POST_COUNT {
            let title = format!("Sample post {}", i + 1);
            let existing: Option<i64> = tx.query_row(
                "SELECT id FROM posts WHERE title = ?1 ORDER BY id LIMIT 1",
                rusqlite::params![title],
                |row| row.get(0),
            )
            .optional()?;

            let post_id = match existing {
                Some(id) => id,
                None => {
                    let now = timestamp_now();
                    tx.execute(
                        "INSERT INTO posts (title, description, created_at, updated_at)
                         VALUES (?1, ?2, ?3, ?4)",
                        rusqlite::params![
                            title,
                            format!(
                                "This is sample post number {}. Lorem ipsum dolor sit amet, consectetur adipiscing elit. \
                                 Sed do eiusmod tempor incididunt ut labore et dolore magna aliqua.",
                                i + 1
                            ),
                            now,
                            now
                        ],
                    )?;
                    tx.last_insert_rowid()
                }
            };

            if tags_for_post(&tx, post_id)?.is_empty() {
                // 1 to 4 distinct tags, spread across the vocabulary
                for k in 0..(i % 4 + 1) {
                    let tag = &tags[(i * 7 + k * 3) % tags.len()];
                    insert_post_tag(&tx, post_id, tag.id)?;
                }
            }
        }

        tx.commit()?;
        let counts = (self.count_tags()?, self.count_posts()?);
        info!("seeded sample data: {} tags, {} posts", counts.0, counts.1);
        Ok(counts)
    }
}

fn count_rows(conn: &Connection, table: &str) -> Result<usize, DatabaseError> {
    let count: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| row.get(0))?;
    Ok(count as usize)
}

fn unique_to_validation(err: rusqlite::Error, field: &str) -> DatabaseError {
    if is_unique_violation(&err) {
        ValidationErrors::single(field, TAKEN_MESSAGE).into()
    } else {
        DatabaseError::from(err)
    }
}

pub(crate) fn find_post(conn: &Connection, id: i64) -> Result<Option<Post>, DatabaseError> {
    let post = conn.query_row(
        "SELECT id, title, description, created_at, updated_at FROM posts WHERE id = ?1",
        rusqlite::params![id],
        Database::row_to_post,
    )
    .optional()?;
    Ok(post)
}

pub(crate) fn load_post_with_tags(conn: &Connection, id: i64) -> Result<PostWithTags, DatabaseError> {
    let post = find_post(conn, id)?.ok_or(DatabaseError::NotFound { entity: "Post", id })?;
    let tags = tags_for_post(conn, id)?;
    Ok(PostWithTags { post, tags })
}

pub(crate) fn find_tag(conn: &Connection, id: i64) -> Result<Option<Tag>, DatabaseError> {
    let tag = conn.query_row(
        "SELECT id, name, created_at, updated_at FROM tags WHERE id = ?1",
        rusqlite::params![id],
        Database::row_to_tag,
    )
    .optional()?;
    Ok(tag)
}

pub(crate) fn find_tag_by_name(conn: &Connection, name: &str) -> Result<Option<Tag>, DatabaseError> {
    let tag = conn.query_row(
        "SELECT id, name, created_at, updated_at FROM tags WHERE name = ?1",
        rusqlite::params![name],
        Database::row_to_tag,
    )
    .optional()?;
    Ok(tag)
}

/// Insert a tag after validating its (already trimmed) name
pub(crate) fn insert_tag(conn: &Connection, name: &str) -> Result<Tag, DatabaseError> {
    validate_tag_name(name)?;
    if find_tag_by_name(conn, name)?.is_some() {
        return Err(ValidationErrors::single("name", TAKEN_MESSAGE).into());
    }

    let now = timestamp_now();
    conn.execute(
        "INSERT INTO tags (name, created_at, updated_at) VALUES (?1, ?2, ?3)",
        rusqlite::params![name, now, now],
    )
    .map_err(|e| unique_to_validation(e, "name"))?;

    debug!("created tag {:?}", name);
    Ok(Tag {
        id: conn.last_insert_rowid(),
        name: name.to_string(),
        created_at: now.clone(),
        updated_at: now,
    })
}

pub(crate) fn insert_post_tag(conn: &Connection, post_id: i64, tag_id: i64) -> Result<PostTag, DatabaseError> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM post_tags WHERE post_id = ?1 AND tag_id = ?2)",
        rusqlite::params![post_id, tag_id],
        |row| row.get(0),
    )?;
    if exists {
        return Err(ValidationErrors::single("post_id", TAKEN_MESSAGE).into());
    }

    let now = timestamp_now();
    conn.execute(
        "INSERT INTO post_tags (post_id, tag_id, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![post_id, tag_id, now, now],
    )
    .map_err(|e| unique_to_validation(e, "post_id"))?;

    Ok(PostTag {
        id: conn.last_insert_rowid(),
        post_id,
        tag_id,
        created_at: now.clone(),
        updated_at: now,
    })
}

pub(crate) fn delete_post_tag(conn: &Connection, post_id: i64, tag_id: i64) -> Result<(), DatabaseError> {
    conn.execute(
        "DELETE FROM post_tags WHERE post_id = ?1 AND tag_id = ?2",
        rusqlite::params![post_id, tag_id],
    )?;
    Ok(())
}

/// Tags attached to a post, in association order
pub(crate) fn tags_for_post(conn: &Connection, post_id: i64) -> Result<Vec<Tag>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT t.id, t.name, t.created_at, t.updated_at
         FROM post_tags pt JOIN tags t ON t.id = pt.tag_id
         WHERE pt.post_id = ?1 ORDER BY pt.id ASC"
    )?;
    let tags = stmt.query_map(rusqlite::params![post_id], Database::row_to_tag)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(tags)
}
