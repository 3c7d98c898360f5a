use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use tagpost::{Database, PostForm, PostQuery};

#[fixture]
fn db() -> Database {
    let db = Database::in_memory().unwrap();
    for (title, description, tags) in [
        ("Intro to Rails", "Models, views and controllers", "Ruby, Rails"),
        ("CSS tricks", "100% width layouts", "CSS, Frontend"),
        ("Ruby blocks", "yield and procs", "Ruby"),
        ("snake_case names", "Naming in Ruby", ""),
    ] {
        db.create_post(&PostForm::new(title, description).with_tags(tags)).unwrap();
    }
    db
}

fn titles(db: &Database, query: PostQuery) -> Vec<String> {
    db.search_posts(&query)
        .unwrap()
        .into_iter()
        .map(|p| p.post.title)
        .collect()
}

#[rstest]
fn no_criteria_returns_everything_in_id_order(db: Database) {
    assert_eq!(
        titles(&db, PostQuery::default()),
        vec!["Intro to Rails", "CSS tricks", "Ruby blocks", "snake_case names"]
    );
}

#[rstest]
fn blank_criteria_do_not_filter(db: Database) {
    assert_eq!(titles(&db, PostQuery::new(Some("   ".into()), Some("".into()))).len(), 4);
}

#[rstest]
#[case("rails", vec!["Intro to Rails"])]
#[case("PROCS", vec!["Ruby blocks"])]
#[case("ruby", vec!["Ruby blocks", "snake_case names"])]
#[case("nothing here", vec![])]
fn keyword_matches_title_or_description(db: Database, #[case] keyword: &str, #[case] expected: Vec<&str>) {
    assert_eq!(titles(&db, PostQuery::default().with_keyword(keyword)), expected);
}

#[rstest]
#[case("100%", vec!["CSS tricks"])]
#[case("%", vec!["CSS tricks"])]
#[case("_", vec!["snake_case names"])]
fn wildcards_match_literally(db: Database, #[case] keyword: &str, #[case] expected: Vec<&str>) {
    assert_eq!(titles(&db, PostQuery::default().with_keyword(keyword)), expected);
}

#[rstest]
fn tag_filter_is_exact(db: Database) {
    assert_eq!(titles(&db, PostQuery::default().with_tag("Ruby")), vec!["Intro to Rails", "Ruby blocks"]);
    assert_eq!(titles(&db, PostQuery::default().with_tag(" Ruby ")).len(), 2);
    assert!(titles(&db, PostQuery::default().with_tag("ruby")).is_empty());
    assert!(titles(&db, PostQuery::default().with_tag("Rub")).is_empty());
    assert!(titles(&db, PostQuery::default().with_tag("Unknown")).is_empty());
}

#[rstest]
fn keyword_and_tag_combine(db: Database) {
    let query = PostQuery::default().with_keyword("procs").with_tag("Ruby");
    assert_eq!(titles(&db, query), vec!["Ruby blocks"]);
    let query = PostQuery::default().with_keyword("procs").with_tag("CSS");
    assert!(titles(&db, query).is_empty());
}

#[rstest]
fn each_post_appears_once(db: Database) {
    // Matches on both the title and two joined tag rows
    let query = PostQuery::default().with_keyword("Rails").with_tag("Rails");
    let posts = db.search_posts(&query).unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].tag_names(), vec!["Ruby", "Rails"]);
}

#[rstest]
fn results_carry_all_their_tags(db: Database) {
    let posts = db.search_posts(&PostQuery::default().with_tag("Frontend")).unwrap();
    assert_eq!(posts[0].tag_names(), vec!["CSS", "Frontend"]);
}

#[rstest]
fn listing_echoes_criteria_and_vocabulary(db: Database) {
    let listing = db.list_posts(&PostQuery::new(Some("ruby".into()), Some(" Ruby ".into()))).unwrap();
    assert_eq!(listing.total, 1);
    assert_eq!(listing.keyword.as_deref(), Some("ruby"));
    assert_eq!(listing.tag.as_deref(), Some("Ruby"));
    assert!(listing.is_filtered());
    assert_eq!(listing.all_tag_names, vec!["CSS", "Frontend", "Rails", "Ruby"]);
}

#[rstest]
#[case("über", vec!["Über Rust"])]
#[case("ÜBER", vec!["Über Rust"])]
#[case("ñandú", vec!["Notas"])]
fn keyword_folds_non_ascii_case(db: Database, #[case] keyword: &str, #[case] expected: Vec<&str>) {
    db.create_post(&PostForm::new("Über Rust", "Ownership")).unwrap();
    db.create_post(&PostForm::new("Notas", "El Ñandú corre")).unwrap();
    assert_eq!(titles(&db, PostQuery::default().with_keyword(keyword)), expected);
}

#[test]
fn listing_more_posts_than_sqlite_binds_per_statement() {
    let db = Database::in_memory().unwrap();
    db.conn()
        .execute_batch(
            "WITH RECURSIVE seq(n) AS (SELECT 1 UNION ALL SELECT n + 1 FROM seq WHERE n < 33000)
             INSERT INTO posts (title, description, created_at, updated_at)
             SELECT 'Post ' || n, 'Body', '2026-01-01 00:00:00', '2026-01-01 00:00:00' FROM seq;",
        )
        .unwrap();
    let tag = db.create_tag("Bulk").unwrap();
    db.attach_tag(1, tag.id).unwrap();
    db.attach_tag(33000, tag.id).unwrap();

    let posts = db.search_posts(&PostQuery::default()).unwrap();
    assert_eq!(posts.len(), 33000);
    assert_eq!(posts[0].tag_names(), vec!["Bulk"]);
    assert_eq!(posts[32999].tag_names(), vec!["Bulk"]);
    assert!(posts[16000].tags.is_empty());
}
