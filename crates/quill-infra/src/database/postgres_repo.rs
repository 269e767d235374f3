//! PostgreSQL repository implementation.

use async_trait::async_trait;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Condition;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbConn, DbErr, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use quill_core::RepoError;
use quill_core::domain::{NewPost, Post, PostPatch, Publication, PublishOutcome};
use quill_core::pagination::{Cursor, Page, paginate};
use quill_core::ports::{ListQuery, PostRepository};

use super::entity::post::{self, Entity as PostEntity};
use crate::cursor::Keyset;

/// PostgreSQL post repository.
pub struct PostgresPostRepository {
    db: DbConn,
}

impl PostgresPostRepository {
    pub fn new(db: DbConn) -> Self {
        Self { db }
    }

    /// Load a row under `FOR UPDATE`, change it in memory and write it back in
    /// one transaction.
    async fn modify<R>(
        &self,
        id: Uuid,
        change: impl FnOnce(&mut Post) -> R + Send,
    ) -> Result<(Post, R), RepoError>
    where
        R: Send,
    {
        let txn = self.db.begin().await.map_err(db_err)?;

        let model = PostEntity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(db_err)?
            .ok_or(RepoError::NotFound)?;

        let mut post = Post::from(model);
        let outcome = change(&mut post);

        let updated = post::ActiveModel::from(post)
            .update(&txn)
            .await
            .map_err(db_err)?;
        txn.commit().await.map_err(db_err)?;

        Ok((updated.into(), outcome))
    }
}

fn db_err(e: DbErr) -> RepoError {
    if let Some(SqlErr::UniqueConstraintViolation(detail)) = e.sql_err() {
        return RepoError::Constraint(detail);
    }
    match &e {
        DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => RepoError::Connection(e.to_string()),
        DbErr::RecordNotFound(_) | DbErr::RecordNotUpdated => RepoError::NotFound,
        _ => RepoError::Query(e.to_string()),
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create_post(&self, new: NewPost) -> Result<Post, RepoError> {
        let model = post::ActiveModel::from(Post::new(new))
            .insert(&self.db)
            .await
            .map_err(db_err)?;
        tracing::debug!(post_id = %model.id, "Post inserted");
        Ok(model.into())
    }

    async fn get_post(&self, id: Uuid) -> Result<Post, RepoError> {
        PostEntity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(Into::into)
            .ok_or(RepoError::NotFound)
    }

    async fn get_post_by_slug(&self, slug: &str) -> Result<Post, RepoError> {
        PostEntity::find()
            .filter(post::Column::Slug.eq(slug))
            .filter(post::Column::Published.eq(true))
            .one(&self.db)
            .await
            .map_err(db_err)?
            .map(Into::into)
            .ok_or(RepoError::NotFound)
    }

    async fn update_post(&self, id: Uuid, patch: PostPatch) -> Result<Post, RepoError> {
        let (post, ()) = self.modify(id, |post| post.apply(patch)).await?;
        Ok(post)
    }

    async fn delete_post(&self, id: Uuid) -> Result<(), RepoError> {
        let result = PostEntity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }

    async fn publish_post(&self, id: Uuid, publication: Publication) -> Result<Post, RepoError> {
        let (post, outcome) = self.modify(id, |post| post.publish(publication)).await?;
        if outcome == PublishOutcome::FirstPublish {
            tracing::debug!(post_id = %id, slug = ?post.slug, "Slug assigned");
        }
        Ok(post)
    }

    async fn list_posts(&self, query: ListQuery) -> Result<Page<Post>, RepoError> {
        let order = if query.published {
            post::Column::PublishedAt
        } else {
            post::Column::UpdatedAt
        };

        let mut select = PostEntity::find().filter(post::Column::Published.eq(query.published));

        if let Some(author) = &query.author {
            select = select.filter(post::Column::AuthorEmail.eq(author.as_str()));
        }

        if let Some(cursor) = &query.cursor {
            let after = Keyset::decode(cursor)?;
            let at: DateTimeWithTimeZone = after.at.into();
            select = select.filter(
                Condition::any().add(order.lt(at)).add(
                    Condition::all()
                        .add(order.eq(at))
                        .add(post::Column::Id.lt(after.id)),
                ),
            );
        }

        let rows = select
            .order_by_desc(order)
            .order_by_desc(post::Column::Id)
            .limit(u64::from(query.page_size) + 1)
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let posts: Vec<Post> = rows.into_iter().map(Into::into).collect();
        Ok(paginate(posts, query.page_size as usize, |post: &Post| {
            Keyset::new(post.sort_key(), post.id).encode()
        }))
    }

    async fn list_all_slugs(
        &self,
        cursor: Option<Cursor>,
        page_size: u32,
    ) -> Result<Page<String>, RepoError> {
        let mut select = PostEntity::find()
            .select_only()
            .column(post::Column::Slug)
            .filter(post::Column::Published.eq(true))
            .filter(post::Column::Slug.is_not_null());

        if let Some(after) = &cursor {
            select = select.filter(post::Column::Slug.gt(after.as_str()));
        }

        let slugs: Vec<String> = select
            .order_by_asc(post::Column::Slug)
            .limit(u64::from(page_size) + 1)
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(db_err)?;

        Ok(paginate(slugs, page_size as usize, |slug: &String| {
            Cursor::new(slug.clone())
        }))
    }
}
