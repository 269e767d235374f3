use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};
use uuid::Uuid;

use quill_core::RepoError;
use quill_core::domain::{Publication, timestamp};
use quill_core::pagination::Cursor;
use quill_core::ports::{ListQuery, PostRepository};

use crate::cursor::Keyset;
use crate::database::entity::post;
use crate::database::postgres_repo::PostgresPostRepository;

fn row(title: &str, seconds_ago: i64) -> post::Model {
    let at = timestamp() - chrono::TimeDelta::seconds(seconds_ago);
    post::Model {
        id: Uuid::new_v4(),
        title: title.to_owned(),
        content: "Content".to_owned(),
        author_name: "Ada".to_owned(),
        author_email: "ada@example.com".to_owned(),
        author_image: None,
        slug: None,
        published: false,
        created_at: at.into(),
        updated_at: at.into(),
        published_at: None,
    }
}

fn published_row(title: &str, seconds_ago: i64) -> post::Model {
    let mut model = row(title, seconds_ago);
    model.slug = Some(format!("{}-0a1b2c3d", title.to_lowercase()));
    model.published = true;
    model.published_at = Some(model.updated_at);
    model
}

#[tokio::test]
async fn test_get_post_maps_author_columns() {
    let model = row("Test Post", 0);
    let id = model.id;
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![model]])
        .into_connection();

    let post = PostgresPostRepository::new(db).get_post(id).await.unwrap();

    assert_eq!(post.id, id);
    assert_eq!(post.title, "Test Post");
    assert_eq!(post.author.email, "ada@example.com");
    assert!(!post.published);
}

#[tokio::test]
async fn test_missing_row_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([Vec::<post::Model>::new()])
        .into_connection();

    let result = PostgresPostRepository::new(db).get_post(Uuid::new_v4()).await;

    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_delete_of_missing_row_is_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_exec_results([MockExecResult {
            last_insert_id: 0,
            rows_affected: 0,
        }])
        .into_connection();

    let result = PostgresPostRepository::new(db).delete_post(Uuid::new_v4()).await;

    assert!(matches!(result, Err(RepoError::NotFound)));
}

#[tokio::test]
async fn test_list_posts_fetches_one_extra_row_for_cursor() {
    let rows = vec![
        published_row("Third", 0),
        published_row("Second", 10),
        published_row("First", 20),
    ];
    let second = rows[1].clone();
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([rows])
        .into_connection();

    let page = PostgresPostRepository::new(db)
        .list_posts(ListQuery {
            author: None,
            published: true,
            page_size: 2,
            cursor: None,
        })
        .await
        .unwrap();

    assert_eq!(page.data.len(), 2);
    let expected = Keyset::new(second.published_at.unwrap().into(), second.id).encode();
    assert_eq!(page.after, Some(expected));
}

#[tokio::test]
async fn test_bad_cursor_rejected_before_query() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

    let result = PostgresPostRepository::new(db)
        .list_posts(ListQuery {
            author: None,
            published: true,
            page_size: 10,
            cursor: Some(Cursor::new("not-a-cursor")),
        })
        .await;

    assert!(matches!(result, Err(RepoError::InvalidCursor(_))));
}

#[tokio::test]
async fn test_publish_writes_back_inside_transaction() {
    let draft = row("Hello", 60);
    let mut stored = published_row("Hello", 0);
    stored.id = draft.id;
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results([vec![draft.clone()], vec![stored.clone()]])
        .into_connection();

    let publication = Publication::new("Hello", "Content").unwrap();
    let post = PostgresPostRepository::new(db)
        .publish_post(draft.id, publication)
        .await
        .unwrap();

    assert_eq!(post.id, draft.id);
    assert!(post.published);
    assert_eq!(post.slug, stored.slug);
}
