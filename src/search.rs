//! Keyword and tag filtering over posts.

use log::debug;
use rusqlite::{params_from_iter, Connection};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::database::{Database, DatabaseError};
use crate::models::{Post, PostWithTags, Tag};

/// Listing criteria. Both parts are optional and combine with AND.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostQuery {
    pub keyword: Option<String>,
    pub tag: Option<String>,
}

impl PostQuery {
    pub fn new(keyword: Option<String>, tag: Option<String>) -> Self {
        Self { keyword, tag }
    }

    pub fn with_keyword(mut self, keyword: impl Into<String>) -> Self {
        self.keyword = Some(keyword.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Keyword used for matching; blank keywords do not restrict
    pub fn keyword_filter(&self) -> Option<&str> {
        self.keyword.as_deref().filter(|k| !k.trim().is_empty())
    }

    /// Trimmed tag name used for matching; blank tags do not restrict
    pub fn tag_filter(&self) -> Option<&str> {
        self.tag.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    pub fn is_unfiltered(&self) -> bool {
        self.keyword_filter().is_none() && self.tag_filter().is_none()
    }
}

/// Everything a listing view needs to render one page of results
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostListing {
    pub posts: Vec<PostWithTags>,
    pub total: usize,
    pub keyword: Option<String>,
    pub tag: Option<String>,
    pub all_tag_names: Vec<String>,
}

impl PostListing {
    pub fn is_filtered(&self) -> bool {
        self.keyword.is_some() || self.tag.is_some()
    }
}

/// Upper bound on bound ids per tag query, well below SQLite's variable limit
const TAG_BATCH_SIZE: usize = 500;

/// Case-insensitive substring match on title or description.
/// `needle` is already lowercased.
fn matches_keyword(post: &Post, needle: &str) -> bool {
    post.title.to_lowercase().contains(needle) || post.description.to_lowercase().contains(needle)
}

/// Posts matching the query, each once, in ascending ID order with tags loaded
pub fn search_posts(conn: &Connection, query: &PostQuery) -> Result<Vec<PostWithTags>, DatabaseError> {
    let mut sql = String::from(
        "SELECT DISTINCT p.id, p.title, p.description, p.created_at, p.updated_at FROM posts p",
    );
    let mut params: Vec<String> = Vec::new();

    if let Some(tag) = query.tag_filter() {
        sql.push_str(
            " JOIN post_tags pt ON pt.post_id = p.id JOIN tags t ON t.id = pt.tag_id WHERE t.name = ?",
        );
        params.push(tag.to_string());
    }
    sql.push_str(" ORDER BY p.id ASC");
    debug!("searching posts: keyword={:?} tag={:?}", query.keyword_filter(), query.tag_filter());

    let mut stmt = conn.prepare(&sql)?;
    let mut posts = stmt.query_map(params_from_iter(params.iter()), Database::row_to_post)?
        .collect::<Result<Vec<_>, _>>()?;

    // LIKE folds ASCII only
    if let Some(keyword) = query.keyword_filter() {
        let needle = keyword.to_lowercase();
        posts.retain(|post| matches_keyword(post, &needle));
    }

    with_tags(conn, posts)
}

/// Attach tags to a batch of posts, querying them in bounded id chunks
fn with_tags(conn: &Connection, posts: Vec<Post>) -> Result<Vec<PostWithTags>, DatabaseError> {
    let mut by_post: HashMap<i64, Vec<Tag>> = HashMap::new();

    for chunk in posts.chunks(TAG_BATCH_SIZE) {
        let placeholders = vec!["?"; chunk.len()].join(", ");
        let sql = format!(
            "SELECT pt.post_id, t.id, t.name, t.created_at, t.updated_at
             FROM post_tags pt JOIN tags t ON t.id = pt.tag_id
             WHERE pt.post_id IN ({}) ORDER BY pt.id ASC",
            placeholders
        );

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(chunk.iter().map(|p| p.id)), |row| {
            Ok((row.get::<_, i64>(0)?, Database::row_to_tag_at(row, 1)?))
        })?;

        for row in rows {
            let (post_id, tag) = row?;
            by_post.entry(post_id).or_default().push(tag);
        }
    }

    Ok(posts
        .into_iter()
        .map(|post| {
            let tags = by_post.remove(&post.id).unwrap_or_default();
            PostWithTags { post, tags }
        })
        .collect())
}

/// All tag names in alphabetical order
pub fn all_tag_names(conn: &Connection) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT name FROM tags ORDER BY name ASC")?;
    let names = stmt.query_map([], |row| row.get(0))?
        .collect::<Result<Vec<String>, _>>()?;
    Ok(names)
}

/// Run a search and gather the echo values and tag vocabulary alongside it
pub fn list_posts(conn: &Connection, query: &PostQuery) -> Result<PostListing, DatabaseError> {
    let posts = search_posts(conn, query)?;
    Ok(PostListing {
        total: posts.len(),
        posts,
        keyword: query.keyword_filter().map(str::to_string),
        tag: query.tag_filter().map(str::to_string),
        all_tag_names: all_tag_names(conn)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn post(title: &str, description: &str) -> Post {
        Post {
            id: 1,
            title: title.to_string(),
            description: description.to_string(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[rstest]
    #[case("über", true)]
    #[case("RUST", true)]
    #[case("straße", true)]
    #[case("100%", false)]
    fn keyword_folds_unicode_case(#[case] keyword: &str, #[case] expected: bool) {
        let post = post("Über Rust", "Notes from the STRASSE and the Straße");
        assert_eq!(matches_keyword(&post, &keyword.to_lowercase()), expected);
    }

    #[rstest]
    #[case(None, None, true)]
    #[case(Some(""), Some("  "), true)]
    #[case(Some("Rails"), None, false)]
    #[case(None, Some(" Ruby "), false)]
    fn blank_criteria_do_not_filter(
        #[case] keyword: Option<&str>,
        #[case] tag: Option<&str>,
        #[case] unfiltered: bool,
    ) {
        let query = PostQuery::new(keyword.map(String::from), tag.map(String::from));
        assert_eq!(query.is_unfiltered(), unfiltered);
    }

    #[test]
    fn tag_filter_is_trimmed() {
        let query = PostQuery::default().with_tag("  Ruby ");
        assert_eq!(query.tag_filter(), Some("Ruby"));
    }
}
