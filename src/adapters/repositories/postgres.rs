use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{check_new_group, check_text, EntityStore, FeedFilter};
use crate::{
	domain::{
		follow::Follow,
		identity::User,
		post::{
			entity::{Comment, Group, NewComment, NewGroup, NewPost, Post, PostChanges},
			CommentCard, PostCard,
		},
	},
	services::response::ServiceError,
};

/// Posts joined with their author and group, so a page is one round trip.
const POST_CARD_SELECT: &str = r#"
SELECT p.id, p.text, p.pub_date, p.author_id, p.group_id, p.image,
       u.username AS author_username,
       g.title AS group_title, g.slug AS group_slug, g.description AS group_description
FROM posts p
JOIN users u ON u.id = p.author_id
LEFT JOIN post_groups g ON g.id = p.group_id
"#;

const POST_COLUMNS: &str = "id, text, pub_date, author_id, group_id, image";

#[derive(sqlx::FromRow)]
struct PostCardRow {
	id: i64,
	text: String,
	pub_date: DateTime<Utc>,
	author_id: i64,
	group_id: Option<i64>,
	image: Option<String>,
	author_username: String,
	group_title: Option<String>,
	group_slug: Option<String>,
	group_description: Option<String>,
}

impl From<PostCardRow> for PostCard {
	fn from(row: PostCardRow) -> Self {
		let group = match (row.group_id, row.group_title, row.group_slug) {
			(Some(id), Some(title), Some(slug)) => Some(Group {
				id,
				title,
				slug,
				description: row.group_description.unwrap_or_default(),
			}),
			_ => None,
		};
		PostCard::new(
			Post {
				id: row.id,
				text: row.text,
				pub_date: row.pub_date,
				author_id: row.author_id,
				group_id: row.group_id,
				image: row.image,
			},
			User {
				id: row.author_id,
				username: row.author_username,
			},
			group,
		)
	}
}

#[derive(sqlx::FromRow)]
struct CommentCardRow {
	id: i64,
	post_id: i64,
	author_id: i64,
	text: String,
	created: DateTime<Utc>,
	author_username: String,
}

impl From<CommentCardRow> for CommentCard {
	fn from(row: CommentCardRow) -> Self {
		CommentCard {
			comment: Comment {
				id: row.id,
				post_id: row.post_id,
				author_id: row.author_id,
				text: row.text,
				created: row.created,
			},
			author: User {
				id: row.author_id,
				username: row.author_username,
			},
		}
	}
}

fn push_filter(
	query: &mut QueryBuilder<'_, Postgres>,
	filter: FeedFilter,
) {
	match filter {
		FeedFilter::All => {}
		FeedFilter::Group(group_id) => {
			query.push(" WHERE p.group_id = ").push_bind(group_id);
		}
		FeedFilter::Author(author_id) => {
			query.push(" WHERE p.author_id = ").push_bind(author_id);
		}
		FeedFilter::FollowedBy(follower_id) => {
			query
				.push(" WHERE p.author_id IN (SELECT f.author_id FROM follows f WHERE f.follower_id = ")
				.push_bind(follower_id)
				.push(")");
		}
	}
}

/// Unique and foreign-key violations are expected outcomes, not faults.
fn classify(
	err: sqlx::Error,
	missing: &'static str,
	conflict: impl FnOnce() -> String,
) -> ServiceError {
	match &err {
		sqlx::Error::Database(db) if db.is_unique_violation() => ServiceError::Conflict(conflict()),
		sqlx::Error::Database(db) if db.is_foreign_key_violation() => ServiceError::EntityNotFound(missing),
		_ => err.into(),
	}
}

#[derive(Clone)]
pub struct PgStore {
	pool: PgPool,
}

impl PgStore {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}
}

#[async_trait]
impl EntityStore for PgStore {
	async fn create_user(
		&self,
		username: &str,
	) -> Result<User, ServiceError> {
		if username.trim().is_empty() {
			return Err(ServiceError::BadRequest("username must not be empty".into()));
		}
		sqlx::query_as::<_, User>("INSERT INTO users (username) VALUES ($1) RETURNING id, username")
			.bind(username)
			.fetch_one(&self.pool)
			.await
			.map_err(|err| classify(err, "user", || format!("username `{username}` is taken")))
	}

	async fn find_user_by_username(
		&self,
		username: &str,
	) -> Result<Option<User>, ServiceError> {
		Ok(sqlx::query_as::<_, User>("SELECT id, username FROM users WHERE username = $1")
			.bind(username)
			.fetch_optional(&self.pool)
			.await?)
	}

	async fn delete_user(
		&self,
		id: i64,
	) -> Result<(), ServiceError> {
		let affected = sqlx::query("DELETE FROM users WHERE id = $1")
			.bind(id)
			.execute(&self.pool)
			.await?
			.rows_affected();
		if affected == 0 {
			return Err(ServiceError::EntityNotFound("user"));
		}
		Ok(())
	}

	async fn create_group(
		&self,
		group: NewGroup,
	) -> Result<Group, ServiceError> {
		check_new_group(&group)?;
		sqlx::query_as::<_, Group>(
			r#"
			INSERT INTO post_groups (title, slug, description)
			VALUES ($1, $2, $3)
			RETURNING id, title, slug, description
			"#,
		)
		.bind(&group.title)
		.bind(&group.slug)
		.bind(&group.description)
		.fetch_one(&self.pool)
		.await
		.map_err(|err| classify(err, "group", || format!("slug `{}` is taken", group.slug)))
	}

	async fn find_group_by_slug(
		&self,
		slug: &str,
	) -> Result<Option<Group>, ServiceError> {
		Ok(
			sqlx::query_as::<_, Group>("SELECT id, title, slug, description FROM post_groups WHERE slug = $1")
				.bind(slug)
				.fetch_optional(&self.pool)
				.await?,
		)
	}

	async fn list_groups(&self) -> Result<Vec<Group>, ServiceError> {
		Ok(
			sqlx::query_as::<_, Group>("SELECT id, title, slug, description FROM post_groups ORDER BY title, id")
				.fetch_all(&self.pool)
				.await?,
		)
	}

	async fn delete_group(
		&self,
		id: i64,
	) -> Result<(), ServiceError> {
		// posts.group_id is ON DELETE SET NULL
		let affected = sqlx::query("DELETE FROM post_groups WHERE id = $1")
			.bind(id)
			.execute(&self.pool)
			.await?
			.rows_affected();
		if affected == 0 {
			return Err(ServiceError::EntityNotFound("group"));
		}
		Ok(())
	}

	async fn create_post(
		&self,
		post: NewPost,
	) -> Result<Post, ServiceError> {
		check_text(&post.text)?;
		sqlx::query_as::<_, Post>(&format!(
			"INSERT INTO posts (text, author_id, group_id, image) VALUES ($1, $2, $3, $4) RETURNING {POST_COLUMNS}"
		))
		.bind(&post.text)
		.bind(post.author_id)
		.bind(post.group_id)
		.bind(&post.image)
		.fetch_one(&self.pool)
		.await
		.map_err(|err| classify(err, "user or group", String::new))
	}

	async fn get_post(
		&self,
		id: i64,
	) -> Result<PostCard, ServiceError> {
		let mut query = QueryBuilder::<Postgres>::new(POST_CARD_SELECT);
		query.push(" WHERE p.id = ").push_bind(id);
		query
			.build_query_as::<PostCardRow>()
			.fetch_optional(&self.pool)
			.await?
			.map(PostCard::from)
			.ok_or(ServiceError::EntityNotFound("post"))
	}

	async fn update_post(
		&self,
		id: i64,
		changes: PostChanges,
	) -> Result<Post, ServiceError> {
		check_text(&changes.text)?;
		let overwrite = changes.image.overwrite();
		sqlx::query_as::<_, Post>(&format!(
			r#"
			UPDATE posts
			SET text = $1, group_id = $2, image = CASE WHEN $3 THEN $4 ELSE image END
			WHERE id = $5
			RETURNING {POST_COLUMNS}
			"#
		))
		.bind(&changes.text)
		.bind(changes.group_id)
		.bind(overwrite.is_some())
		.bind(overwrite.flatten())
		.bind(id)
		.fetch_optional(&self.pool)
		.await
		.map_err(|err| classify(err, "group", String::new))?
		.ok_or(ServiceError::EntityNotFound("post"))
	}

	async fn delete_post(
		&self,
		id: i64,
	) -> Result<(), ServiceError> {
		let affected = sqlx::query("DELETE FROM posts WHERE id = $1")
			.bind(id)
			.execute(&self.pool)
			.await?
			.rows_affected();
		if affected == 0 {
			return Err(ServiceError::EntityNotFound("post"));
		}
		Ok(())
	}

	async fn list_posts(
		&self,
		filter: FeedFilter,
		limit: u64,
		offset: u64,
	) -> Result<Vec<PostCard>, ServiceError> {
		let mut query = QueryBuilder::<Postgres>::new(POST_CARD_SELECT);
		push_filter(&mut query, filter);
		query
			.push(" ORDER BY p.pub_date DESC, p.id DESC LIMIT ")
			.push_bind(limit as i64)
			.push(" OFFSET ")
			.push_bind(offset as i64);

		let rows = query.build_query_as::<PostCardRow>().fetch_all(&self.pool).await?;
		Ok(rows.into_iter().map(PostCard::from).collect())
	}

	async fn count_posts(
		&self,
		filter: FeedFilter,
	) -> Result<u64, ServiceError> {
		let mut query = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts p");
		push_filter(&mut query, filter);
		let count = query.build_query_scalar::<i64>().fetch_one(&self.pool).await?;
		Ok(count as u64)
	}

	async fn create_comment(
		&self,
		comment: NewComment,
	) -> Result<Comment, ServiceError> {
		check_text(&comment.text)?;
		sqlx::query_as::<_, Comment>(
			r#"
			INSERT INTO comments (post_id, author_id, text)
			VALUES ($1, $2, $3)
			RETURNING id, post_id, author_id, text, created
			"#,
		)
		.bind(comment.post_id)
		.bind(comment.author_id)
		.bind(&comment.text)
		.fetch_one(&self.pool)
		.await
		.map_err(|err| classify(err, "post", String::new))
	}

	async fn get_comment(
		&self,
		id: i64,
	) -> Result<Comment, ServiceError> {
		sqlx::query_as::<_, Comment>("SELECT id, post_id, author_id, text, created FROM comments WHERE id = $1")
			.bind(id)
			.fetch_optional(&self.pool)
			.await?
			.ok_or(ServiceError::EntityNotFound("comment"))
	}

	async fn list_comments(
		&self,
		post_id: i64,
	) -> Result<Vec<CommentCard>, ServiceError> {
		let rows = sqlx::query_as::<_, CommentCardRow>(
			r#"
			SELECT c.id, c.post_id, c.author_id, c.text, c.created, u.username AS author_username
			FROM comments c
			JOIN users u ON u.id = c.author_id
			WHERE c.post_id = $1
			ORDER BY c.created, c.id
			"#,
		)
		.bind(post_id)
		.fetch_all(&self.pool)
		.await?;
		Ok(rows.into_iter().map(CommentCard::from).collect())
	}

	async fn delete_comment(
		&self,
		id: i64,
	) -> Result<(), ServiceError> {
		let affected = sqlx::query("DELETE FROM comments WHERE id = $1")
			.bind(id)
			.execute(&self.pool)
			.await?
			.rows_affected();
		if affected == 0 {
			return Err(ServiceError::EntityNotFound("comment"));
		}
		Ok(())
	}

	async fn find_follow(
		&self,
		follower_id: i64,
		author_id: i64,
	) -> Result<Option<Follow>, ServiceError> {
		Ok(sqlx::query_as::<_, Follow>(
			"SELECT id, follower_id, author_id FROM follows WHERE follower_id = $1 AND author_id = $2",
		)
		.bind(follower_id)
		.bind(author_id)
		.fetch_optional(&self.pool)
		.await?)
	}

	async fn create_follow(
		&self,
		follower_id: i64,
		author_id: i64,
	) -> Result<bool, ServiceError> {
		let inserted = sqlx::query_as::<_, (i64,)>(
			r#"
			INSERT INTO follows (follower_id, author_id)
			VALUES ($1, $2)
			ON CONFLICT (follower_id, author_id) DO NOTHING
			RETURNING id
			"#,
		)
		.bind(follower_id)
		.bind(author_id)
		.fetch_optional(&self.pool)
		.await
		.map_err(|err| classify(err, "user", String::new))?;

		Ok(inserted.is_some())
	}

	async fn delete_follow(
		&self,
		follower_id: i64,
		author_id: i64,
	) -> Result<bool, ServiceError> {
		let affected = sqlx::query("DELETE FROM follows WHERE follower_id = $1 AND author_id = $2")
			.bind(follower_id)
			.bind(author_id)
			.execute(&self.pool)
			.await?
			.rows_affected();
		Ok(affected > 0)
	}

	async fn count_following(
		&self,
		follower_id: i64,
	) -> Result<u64, ServiceError> {
		let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM follows WHERE follower_id = $1")
			.bind(follower_id)
			.fetch_one(&self.pool)
			.await?;
		Ok(count as u64)
	}
}
