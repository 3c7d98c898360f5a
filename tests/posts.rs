use pretty_assertions::assert_eq;
use rstest::{fixture, rstest};
use tagpost::{Database, DatabaseError, PostForm};

#[fixture]
fn db() -> Database {
    Database::in_memory().unwrap()
}

#[rstest]
fn create_with_tags_links_them_in_order(db: Database) {
    let post = db.create_post(&PostForm::new("Title", "Body").with_tags("Ruby, Rails, , Ruby")).unwrap();
    assert_eq!(post.tag_names(), vec!["Ruby", "Rails"]);
    assert_eq!(post.tag_names_as_string(), "Ruby, Rails");
    assert_eq!(db.count_post_tags().unwrap(), 2);
}

#[rstest]
fn create_without_tags_has_none(db: Database) {
    let post = db.create_post(&PostForm::new("Title", "Body")).unwrap();
    assert!(post.tags.is_empty());
    assert_eq!(db.count_tags().unwrap(), 0);
}

#[rstest]
fn update_without_tag_names_keeps_tags(db: Database) {
    let post = db.create_post(&PostForm::new("Title", "Body").with_tags("Ruby")).unwrap();
    let updated = db.update_post(post.post.id, &PostForm::new("New title", "Body")).unwrap();
    assert_eq!(updated.post.title, "New title");
    assert_eq!(updated.tag_names(), vec!["Ruby"]);
}

#[rstest]
fn update_replaces_tag_set(db: Database) {
    let post = db.create_post(&PostForm::new("Title", "Body").with_tags("Ruby, Rails")).unwrap();
    let kept = db.post_tags_for_post(post.post.id).unwrap()[0].clone();

    let updated = db
        .update_post(post.post.id, &PostForm::new("Title", "Body").with_tags("Ruby, Web"))
        .unwrap();
    assert_eq!(updated.tag_names(), vec!["Ruby", "Web"]);
    // The surviving association is the same row
    assert_eq!(db.post_tags_for_post(post.post.id).unwrap()[0], kept);
    // Rails is detached but still exists
    assert!(db.find_tag_by_name("Rails").unwrap().is_some());
}

#[rstest]
fn empty_tag_text_clears_associations(db: Database) {
    let post = db.create_post(&PostForm::new("Title", "Body").with_tags("Ruby, Rails")).unwrap();
    let updated = db.update_post(post.post.id, &PostForm::new("Title", "Body").with_tags(" , ")).unwrap();
    assert!(updated.tags.is_empty());
    assert_eq!(db.count_post_tags().unwrap(), 0);
    assert_eq!(db.count_tags().unwrap(), 2);
}

#[rstest]
fn invalid_update_leaves_post_and_tags_untouched(db: Database) {
    let post = db.create_post(&PostForm::new("Title", "Body").with_tags("Ruby")).unwrap();
    let err = db
        .update_post(post.post.id, &PostForm::new("", "Body").with_tags("Go"))
        .unwrap_err();
    assert_eq!(err.validation_errors().unwrap().on("title"), vec!["can't be blank"]);

    let reloaded = db.get_post(post.post.id).unwrap();
    assert_eq!(reloaded.post.title, "Title");
    assert_eq!(reloaded.tag_names(), vec!["Ruby"]);
    assert!(db.find_tag_by_name("Go").unwrap().is_none());
}

#[rstest]
fn bad_tag_name_rolls_back_the_whole_create(db: Database) {
    let err = db
        .create_post(&PostForm::new("Title", "Body").with_tags("Go, abcdefghijklmnopqrstuvwxyz"))
        .unwrap_err();
    assert!(matches!(err, DatabaseError::Validation(_)));
    assert_eq!(db.count_posts().unwrap(), 0);
    assert_eq!(db.count_tags().unwrap(), 0);
}

#[rstest]
fn deleting_a_post_removes_its_associations_only(db: Database) {
    let a = db.create_post(&PostForm::new("A", "Body").with_tags("Ruby, Rails")).unwrap();
    db.create_post(&PostForm::new("B", "Body").with_tags("Ruby")).unwrap();

    db.delete_post(a.post.id).unwrap();
    assert_eq!(db.count_post_tags().unwrap(), 1);
    assert_eq!(db.count_tags().unwrap(), 2);
}

#[rstest]
fn deleting_a_tag_keeps_its_posts(db: Database) {
    let post = db.create_post(&PostForm::new("A", "Body").with_tags("Ruby, Rails")).unwrap();
    let ruby = db.find_tag_by_name("Ruby").unwrap().unwrap();

    db.delete_tag(ruby.id).unwrap();
    assert_eq!(db.get_post(post.post.id).unwrap().tag_names(), vec!["Rails"]);
}

#[rstest]
fn attaching_twice_is_rejected(db: Database) {
    let post = db.create_post(&PostForm::new("A", "Body")).unwrap();
    let tag = db.create_tag("Ruby").unwrap();
    db.attach_tag(post.post.id, tag.id).unwrap();

    let err = db.attach_tag(post.post.id, tag.id).unwrap_err();
    assert_eq!(err.validation_errors().unwrap().on("post_id"), vec!["has already been taken"]);
    assert_eq!(db.posts_for_tag(tag.id).unwrap().len(), 1);
}

#[rstest]
fn missing_records_report_not_found(db: Database) {
    assert!(db.get_post(42).unwrap_err().is_not_found());
    assert!(db.delete_post(42).unwrap_err().is_not_found());
    assert!(db.update_post(42, &PostForm::new("", "")).unwrap_err().is_not_found());
    assert!(db.sync_post_tags(42, "Ruby").unwrap_err().is_not_found());
    assert_eq!(db.get_post(42).unwrap_err().to_string(), "Post not found (ID: 42)");
    assert_eq!(db.count_tags().unwrap(), 0);
}

#[rstest]
fn seeding_loads_vocabulary_once(db: Database) {
    let (tags, posts) = db.seed_sample_data().unwrap();
    assert_eq!((tags, posts), (15, 30));
    db.seed_sample_data().unwrap();
    assert_eq!(db.count_tags().unwrap(), 15);
    assert_eq!(db.count_posts().unwrap(), 30);
}
