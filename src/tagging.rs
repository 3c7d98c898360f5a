//! Tag store and post/tag synchronization.
//!
//! Both operations take a plain [`Connection`] so they can run inside a
//! caller's transaction (a [`rusqlite::Transaction`] derefs to one).

use log::debug;
use rusqlite::Connection;
use std::collections::HashSet;

use crate::database::{self, DatabaseError};
use crate::models::Tag;

/// One entry of a tag-name collection. Entries may be absent (`None`),
/// which the tag store skips like blank names.
pub trait TagNameInput {
    fn tag_name(&self) -> Option<&str>;
}

impl TagNameInput for &str {
    fn tag_name(&self) -> Option<&str> {
        Some(*self)
    }
}

impl TagNameInput for String {
    fn tag_name(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl TagNameInput for &String {
    fn tag_name(&self) -> Option<&str> {
        Some(self.as_str())
    }
}

impl TagNameInput for Option<&str> {
    fn tag_name(&self) -> Option<&str> {
        *self
    }
}

impl TagNameInput for Option<String> {
    fn tag_name(&self) -> Option<&str> {
        self.as_deref()
    }
}

/// Trim every entry, drop absent and blank ones, and collapse duplicates
/// keeping the first occurrence
pub fn normalize_tag_names<I>(names: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: TagNameInput,
{
    let mut seen = HashSet::new();
    let mut normalized = Vec::new();
    for entry in names {
        let Some(name) = entry.tag_name().map(str::trim) else {
            continue;
        };
        if !name.is_empty() && seen.insert(name.to_string()) {
            normalized.push(name.to_string());
        }
    }
    normalized
}

/// Split comma-separated tag text into normalized names
pub fn parse_tag_names(raw: &str) -> Vec<String> {
    normalize_tag_names(raw.split(','))
}

/// Map names to stored tags, creating any that do not exist yet.
///
/// Matching is exact and case-sensitive after trimming. The result follows
/// the order of first appearance and holds no duplicates. A name that fails
/// validation aborts the call; tags created before it are only undone if the
/// caller's transaction is rolled back.
pub fn resolve_or_create_tags<I>(conn: &Connection, names: I) -> Result<Vec<Tag>, DatabaseError>
where
    I: IntoIterator,
    I::Item: TagNameInput,
{
    let mut tags = Vec::new();
    for name in normalize_tag_names(names) {
        let tag = match database::find_tag_by_name(conn, &name)? {
            Some(existing) => existing,
            None => database::insert_tag(conn, &name)?,
        };
        tags.push(tag);
    }
    Ok(tags)
}

/// Make a post's associations exactly the tags named in `raw`.
///
/// Associations whose tag is still wanted are kept, the rest are removed,
/// and missing ones are added. Returns the post's tags afterwards.
pub fn sync_post_tags(conn: &Connection, post_id: i64, raw: &str) -> Result<Vec<Tag>, DatabaseError> {
    let names = parse_tag_names(raw);
    let desired = resolve_or_create_tags(conn, &names)?;
    let current = database::tags_for_post(conn, post_id)?;

    let desired_ids: HashSet<i64> = desired.iter().map(|tag| tag.id).collect();
    let current_ids: HashSet<i64> = current.iter().map(|tag| tag.id).collect();

    let mut removed = 0;
    for tag in current.iter().filter(|tag| !desired_ids.contains(&tag.id)) {
        database::delete_post_tag(conn, post_id, tag.id)?;
        removed += 1;
    }

    let mut added = 0;
    for tag in desired.iter().filter(|tag| !current_ids.contains(&tag.id)) {
        database::insert_post_tag(conn, post_id, tag.id)?;
        added += 1;
    }

    debug!("synced tags for post {}: +{} -{}", post_id, added, removed);
    database::tags_for_post(conn, post_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("Ruby, Rails", vec!["Ruby", "Rails"])]
    #[case("Ruby,Rails,JavaScript", vec!["Ruby", "Rails", "JavaScript"])]
    #[case("  Ruby  ,  Rails  ", vec!["Ruby", "Rails"])]
    #[case("Ruby, , Rails, ", vec!["Ruby", "Rails"])]
    #[case("Ruby, Ruby", vec!["Ruby"])]
    #[case("Ruby, ruby", vec!["Ruby", "ruby"])]
    #[case("", vec![])]
    #[case(" , ,", vec![])]
    fn parses_comma_separated_names(#[case] raw: &str, #[case] expected: Vec<&str>) {
        assert_eq!(parse_tag_names(raw), expected);
    }

    #[test]
    fn absent_entries_are_skipped() {
        let names = vec![Some("Ruby"), None, Some("  "), Some(" Rails ")];
        assert_eq!(normalize_tag_names(names), vec!["Ruby", "Rails"]);
    }

    #[test]
    fn owned_and_borrowed_inputs_are_accepted() {
        let owned = vec!["Ruby".to_string(), "Rails".to_string()];
        assert_eq!(normalize_tag_names(&owned), vec!["Ruby", "Rails"]);
        assert_eq!(normalize_tag_names(owned), vec!["Ruby", "Rails"]);
        assert_eq!(normalize_tag_names(vec![Some("Go".to_string()), None]), vec!["Go"]);
    }
}
