use excerpt_core::db::open_db_in_memory;
use excerpt_core::{
    CollectionId, CollectionRepository, Entity, NewParagraph, ParagraphPatch, ParagraphQuery,
    ParagraphRepository, RepoError, SqliteCollectionRepository, SqliteParagraphRepository,
    SqliteTagRepository, TagId, TagRepository, ValidationError,
};
use rusqlite::Connection;
use std::collections::BTreeSet;

struct Fixture {
    conn: Connection,
    physics: CollectionId,
    biology: CollectionId,
    thermo: TagId,
    optics: TagId,
}

fn fixture() -> Fixture {
    let mut conn = open_db_in_memory().unwrap();
    let (physics, biology) = {
        let mut repo = SqliteCollectionRepository::try_new(&mut conn).unwrap();
        (
            repo.create_collection("Physics").unwrap().id,
            repo.create_collection("Biology").unwrap().id,
        )
    };
    let (thermo, optics) = {
        let mut repo = SqliteTagRepository::try_new(&mut conn).unwrap();
        (
            repo.create_tag("Thermo Dynamics", None).unwrap().id,
            repo.create_tag("Optics", None).unwrap().id,
        )
    };
    Fixture {
        conn,
        physics,
        biology,
        thermo,
        optics,
    }
}

fn ids(tags: impl IntoIterator<Item = TagId>) -> BTreeSet<TagId> {
    tags.into_iter().collect()
}

#[test]
fn create_then_get_returns_hydrated_record() {
    let mut fx = fixture();
    let mut repo = SqliteParagraphRepository::try_new(&mut fx.conn).unwrap();

    let id = repo
        .create_paragraph(
            &NewParagraph::new(fx.physics, "Entropy", "Entropy always increases.")
                .with_tags([fx.thermo]),
        )
        .unwrap();

    let found = repo.get_paragraphs(&ParagraphQuery::by_id(id)).unwrap();
    assert_eq!(found.len(), 1);
    let paragraph = &found[0];
    assert_eq!(paragraph.id, id);
    assert_eq!(paragraph.title, "Entropy");
    assert_eq!(paragraph.content, "Entropy always increases.");
    assert_eq!(paragraph.collection.id, fx.physics);
    assert_eq!(paragraph.collection.name, "Physics");
    assert_eq!(paragraph.tag_ids(), ids([fx.thermo]));
    assert!(paragraph.is_active());
}

#[test]
fn create_deduplicates_tags_and_drops_unknown_ids() {
    let mut fx = fixture();
    let mut repo = SqliteParagraphRepository::try_new(&mut fx.conn).unwrap();

    let id = repo
        .create_paragraph(
            &NewParagraph::new(fx.physics, "Light", "Photons everywhere.").with_tags([
                fx.optics,
                fx.thermo,
                fx.optics,
                404,
            ]),
        )
        .unwrap();

    let paragraph = repo
        .get_paragraphs(&ParagraphQuery::by_id(id))
        .unwrap()
        .remove(0);
    assert_eq!(paragraph.tag_ids(), ids([fx.thermo, fx.optics]));
}

#[test]
fn create_keeps_multiline_content_verbatim() {
    let mut fx = fixture();
    let mut repo = SqliteParagraphRepository::try_new(&mut fx.conn).unwrap();
    let content = "First line.\n\n  Indented second line.\n";

    let id = repo
        .create_paragraph(&NewParagraph::new(fx.physics, "Layout", content))
        .unwrap();

    let paragraph = repo
        .get_paragraphs(&ParagraphQuery::by_id(id))
        .unwrap()
        .remove(0);
    assert_eq!(paragraph.content, content);
    assert!(paragraph.tags.is_empty());
}

#[test]
fn create_with_unknown_collection_fails_and_writes_nothing() {
    let mut fx = fixture();
    let mut repo = SqliteParagraphRepository::try_new(&mut fx.conn).unwrap();

    let err = repo
        .create_paragraph(&NewParagraph::new(999, "Orphan", "No home.").with_tags([fx.thermo]))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: Entity::Collection,
            id: 999
        }
    ));
    drop(repo);
    assert_eq!(count_rows(&fx.conn, "paragraphs"), 0);
    assert_eq!(count_rows(&fx.conn, "paragraph_tags"), 0);
}

#[test]
fn create_in_tombstoned_collection_is_not_found() {
    let mut fx = fixture();
    fx.conn
        .execute(
            "UPDATE collections SET deleted_at = 1 WHERE id = ?1;",
            [fx.biology],
        )
        .unwrap();
    let mut repo = SqliteParagraphRepository::try_new(&mut fx.conn).unwrap();

    let err = repo
        .create_paragraph(&NewParagraph::new(fx.biology, "Cells", "Small."))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: Entity::Collection,
            ..
        }
    ));
}

#[test]
fn create_requires_title_and_content() {
    let mut fx = fixture();
    let mut repo = SqliteParagraphRepository::try_new(&mut fx.conn).unwrap();

    let err = repo
        .create_paragraph(&NewParagraph::new(fx.physics, "", "body"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::EmptyField("title"))
    ));

    let err = repo
        .create_paragraph(&NewParagraph::new(fx.physics, "Title", "  \n"))
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::EmptyField("content"))
    ));
    drop(repo);
    assert_eq!(count_rows(&fx.conn, "paragraphs"), 0);
}

#[test]
fn failed_association_insert_rolls_back_paragraph() {
    let mut fx = fixture();
    // Make every association insert fail inside the create transaction.
    fx.conn
        .execute_batch(
            "CREATE TRIGGER reject_links BEFORE INSERT ON paragraph_tags
             BEGIN
                SELECT RAISE(ABORT, 'links disabled');
             END;",
        )
        .unwrap();
    let mut repo = SqliteParagraphRepository::try_new(&mut fx.conn).unwrap();

    let err = repo
        .create_paragraph(&NewParagraph::new(fx.physics, "Entropy", "Up.").with_tags([fx.thermo]))
        .unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    drop(repo);
    assert_eq!(count_rows(&fx.conn, "paragraphs"), 0);
}

#[test]
fn failed_tag_replace_rolls_back_update() {
    let mut fx = fixture();
    let id = {
        let mut repo = SqliteParagraphRepository::try_new(&mut fx.conn).unwrap();
        repo.create_paragraph(
            &NewParagraph::new(fx.physics, "Light", "Photons.").with_tags([fx.thermo]),
        )
        .unwrap()
    };
    // Title update and link delete succeed; the new link insert aborts.
    fx.conn
        .execute_batch(
            "CREATE TRIGGER reject_links BEFORE INSERT ON paragraph_tags
             BEGIN
                SELECT RAISE(ABORT, 'links disabled');
             END;",
        )
        .unwrap();
    let mut repo = SqliteParagraphRepository::try_new(&mut fx.conn).unwrap();

    let patch = ParagraphPatch {
        title: Some("New".to_string()),
        tag_ids: Some(vec![fx.optics]),
        ..ParagraphPatch::default()
    };
    let err = repo.update_paragraph(id, &patch).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));

    let paragraph = repo
        .get_paragraphs(&ParagraphQuery::by_id(id))
        .unwrap()
        .remove(0);
    assert_eq!(paragraph.title, "Light");
    assert_eq!(paragraph.tag_ids(), ids([fx.thermo]));
}

#[test]
fn failed_delete_keeps_paragraph_visible() {
    let mut fx = fixture();
    let id = {
        let mut repo = SqliteParagraphRepository::try_new(&mut fx.conn).unwrap();
        repo.create_paragraph(&NewParagraph::new(fx.physics, "Light", "Photons."))
            .unwrap()
    };
    fx.conn
        .execute_batch(
            "CREATE TRIGGER reject_tombstones BEFORE UPDATE OF deleted_at ON paragraphs
             BEGIN
                SELECT RAISE(ABORT, 'deletes disabled');
             END;",
        )
        .unwrap();
    let mut repo = SqliteParagraphRepository::try_new(&mut fx.conn).unwrap();

    let err = repo.delete_paragraph(id).unwrap_err();
    assert!(matches!(err, RepoError::Db(_)));
    let remaining = repo.get_paragraphs(&ParagraphQuery::by_id(id)).unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].deleted_at, None);

    // The aborted delete left no open transaction behind.
    drop(repo);
    fx.conn.execute_batch("DROP TRIGGER reject_tombstones;").unwrap();
    let mut repo = SqliteParagraphRepository::try_new(&mut fx.conn).unwrap();
    repo.delete_paragraph(id).unwrap();
}

#[test]
fn get_paragraphs_filters_by_collection_and_id() {
    let mut fx = fixture();
    let mut repo = SqliteParagraphRepository::try_new(&mut fx.conn).unwrap();
    let first = repo
        .create_paragraph(&NewParagraph::new(fx.physics, "Entropy", "Up."))
        .unwrap();
    let second = repo
        .create_paragraph(&NewParagraph::new(fx.physics, "Lenses", "Bend."))
        .unwrap();
    let cell = repo
        .create_paragraph(&NewParagraph::new(fx.biology, "Cells", "Small."))
        .unwrap();

    let all: Vec<i64> = repo
        .get_paragraphs(&ParagraphQuery::all())
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(all, vec![first, second, cell]);

    let physics: Vec<i64> = repo
        .get_paragraphs(&ParagraphQuery::in_collection(fx.physics))
        .unwrap()
        .iter()
        .map(|p| p.id)
        .collect();
    assert_eq!(physics, vec![first, second]);

    let both = ParagraphQuery {
        paragraph_id: Some(cell),
        collection_id: Some(fx.physics),
    };
    assert!(repo.get_paragraphs(&both).unwrap().is_empty());
    assert!(repo
        .get_paragraphs(&ParagraphQuery::by_id(12345))
        .unwrap()
        .is_empty());
}

#[test]
fn hydrated_tags_exclude_tombstoned_tags() {
    let mut fx = fixture();
    let id = {
        let mut repo = SqliteParagraphRepository::try_new(&mut fx.conn).unwrap();
        repo.create_paragraph(
            &NewParagraph::new(fx.physics, "Light", "Photons.").with_tags([fx.thermo, fx.optics]),
        )
        .unwrap()
    };
    fx.conn
        .execute("UPDATE tags SET deleted_at = 1 WHERE id = ?1;", [fx.optics])
        .unwrap();

    let repo = SqliteParagraphRepository::try_new(&mut fx.conn).unwrap();
    let paragraph = repo
        .get_paragraphs(&ParagraphQuery::by_id(id))
        .unwrap()
        .remove(0);
    assert_eq!(paragraph.tag_ids(), ids([fx.thermo]));
}

#[test]
fn update_with_tags_replaces_the_whole_set() {
    let mut fx = fixture();
    let mut repo = SqliteParagraphRepository::try_new(&mut fx.conn).unwrap();
    let id = repo
        .create_paragraph(&NewParagraph::new(fx.physics, "Light", "Photons.").with_tags([fx.thermo]))
        .unwrap();

    let patch = ParagraphPatch {
        tag_ids: Some(vec![fx.optics, fx.optics]),
        ..ParagraphPatch::default()
    };
    repo.update_paragraph(id, &patch).unwrap();

    let paragraph = repo
        .get_paragraphs(&ParagraphQuery::by_id(id))
        .unwrap()
        .remove(0);
    assert_eq!(paragraph.tag_ids(), ids([fx.optics]));
    assert_eq!(paragraph.title, "Light");
    assert_eq!(paragraph.content, "Photons.");

    let clear = ParagraphPatch {
        tag_ids: Some(Vec::new()),
        ..ParagraphPatch::default()
    };
    repo.update_paragraph(id, &clear).unwrap();
    let paragraph = repo
        .get_paragraphs(&ParagraphQuery::by_id(id))
        .unwrap()
        .remove(0);
    assert!(paragraph.tags.is_empty());
}

#[test]
fn update_scalars_only_keeps_tags() {
    let mut fx = fixture();
    let mut repo = SqliteParagraphRepository::try_new(&mut fx.conn).unwrap();
    let id = repo
        .create_paragraph(&NewParagraph::new(fx.physics, "Light", "Photons.").with_tags([fx.optics]))
        .unwrap();

    let patch = ParagraphPatch {
        title: Some("Light & Color".to_string()),
        ..ParagraphPatch::default()
    };
    repo.update_paragraph(id, &patch).unwrap();

    let paragraph = repo
        .get_paragraphs(&ParagraphQuery::by_id(id))
        .unwrap()
        .remove(0);
    assert_eq!(paragraph.title, "Light & Color");
    assert_eq!(paragraph.content, "Photons.");
    assert_eq!(paragraph.tag_ids(), ids([fx.optics]));
    assert_eq!(paragraph.collection.id, fx.physics);
}

#[test]
fn update_rejects_empty_patch_and_missing_paragraph() {
    let mut fx = fixture();
    let mut repo = SqliteParagraphRepository::try_new(&mut fx.conn).unwrap();
    let id = repo
        .create_paragraph(&NewParagraph::new(fx.physics, "Light", "Photons."))
        .unwrap();

    let err = repo
        .update_paragraph(id, &ParagraphPatch::default())
        .unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::NothingToUpdate)
    ));

    let patch = ParagraphPatch {
        content: Some("New".to_string()),
        tag_ids: Some(vec![fx.thermo]),
        ..ParagraphPatch::default()
    };
    let err = repo.update_paragraph(777, &patch).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: Entity::Paragraph,
            id: 777
        }
    ));
    drop(repo);
    assert_eq!(count_rows(&fx.conn, "paragraph_tags"), 0);
}

#[test]
fn deleted_paragraph_cannot_be_updated() {
    let mut fx = fixture();
    let mut repo = SqliteParagraphRepository::try_new(&mut fx.conn).unwrap();
    let id = repo
        .create_paragraph(&NewParagraph::new(fx.physics, "Light", "Photons."))
        .unwrap();
    repo.delete_paragraph(id).unwrap();

    let patch = ParagraphPatch {
        title: Some("Revived?".to_string()),
        ..ParagraphPatch::default()
    };
    assert!(matches!(
        repo.update_paragraph(id, &patch).unwrap_err(),
        RepoError::NotFound { .. }
    ));
}

#[test]
fn delete_hides_paragraph_and_second_delete_is_not_found() {
    let mut fx = fixture();
    let mut repo = SqliteParagraphRepository::try_new(&mut fx.conn).unwrap();
    let id = repo
        .create_paragraph(&NewParagraph::new(fx.physics, "Light", "Photons.").with_tags([fx.optics]))
        .unwrap();

    repo.delete_paragraph(id).unwrap();
    assert!(repo
        .get_paragraphs(&ParagraphQuery::by_id(id))
        .unwrap()
        .is_empty());
    assert!(repo.get_paragraphs(&ParagraphQuery::all()).unwrap().is_empty());

    let err = repo.delete_paragraph(id).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: Entity::Paragraph,
            ..
        }
    ));
    drop(repo);

    // The row stays in storage with its tombstone and associations.
    let deleted_at: Option<i64> = fx
        .conn
        .query_row(
            "SELECT deleted_at FROM paragraphs WHERE id = ?1;",
            [id],
            |row| row.get(0),
        )
        .unwrap();
    assert!(deleted_at.is_some());
    assert_eq!(count_rows(&fx.conn, "paragraph_tags"), 1);
}

fn count_rows(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
