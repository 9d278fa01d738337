use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

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

#[derive(Default)]
struct Tables {
	users: BTreeMap<i64, User>,
	groups: BTreeMap<i64, Group>,
	posts: BTreeMap<i64, Post>,
	comments: BTreeMap<i64, Comment>,
	follows: BTreeMap<i64, Follow>,
	last_id: i64,
}

impl Tables {
	fn next_id(&mut self) -> i64 {
		self.last_id += 1;
		self.last_id
	}

	fn user(
		&self,
		id: i64,
	) -> Result<&User, ServiceError> {
		self.users.get(&id).ok_or(ServiceError::EntityNotFound("user"))
	}

	fn card(
		&self,
		post: &Post,
	) -> Result<PostCard, ServiceError> {
		Ok(PostCard::new(
			post.clone(),
			self.user(post.author_id)?.clone(),
			post.group_id.and_then(|id| self.groups.get(&id).cloned()),
		))
	}

	fn matches(
		&self,
		post: &Post,
		filter: FeedFilter,
	) -> bool {
		match filter {
			FeedFilter::All => true,
			FeedFilter::Group(group_id) => post.group_id == Some(group_id),
			FeedFilter::Author(author_id) => post.author_id == author_id,
			FeedFilter::FollowedBy(follower_id) => self
				.follows
				.values()
				.any(|follow| follow.follower_id == follower_id && follow.author_id == post.author_id),
		}
	}

	fn newest_first(
		&self,
		filter: FeedFilter,
	) -> Vec<&Post> {
		let mut posts: Vec<&Post> = self.posts.values().filter(|post| self.matches(post, filter)).collect();
		posts.sort_by(|a, b| b.pub_date.cmp(&a.pub_date).then(b.id.cmp(&a.id)));
		posts
	}
}

/// In-process store with the same relational rules as the Postgres schema.
/// Backs tests and `STORAGE_BACKEND=memory` runs.
#[derive(Default)]
pub struct MemoryStore {
	tables: RwLock<Tables>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl EntityStore for MemoryStore {
	async fn create_user(
		&self,
		username: &str,
	) -> Result<User, ServiceError> {
		if username.trim().is_empty() {
			return Err(ServiceError::BadRequest("username must not be empty".into()));
		}
		let mut tables = self.tables.write().await;
		if tables.users.values().any(|user| user.username == username) {
			return Err(ServiceError::Conflict(format!("username `{username}` is taken")));
		}
		let user = User {
			id: tables.next_id(),
			username: username.to_string(),
		};
		tables.users.insert(user.id, user.clone());
		Ok(user)
	}

	async fn find_user_by_username(
		&self,
		username: &str,
	) -> Result<Option<User>, ServiceError> {
		Ok(self
			.tables
			.read()
			.await
			.users
			.values()
			.find(|user| user.username == username)
			.cloned())
	}

	async fn delete_user(
		&self,
		id: i64,
	) -> Result<(), ServiceError> {
		let mut tables = self.tables.write().await;
		tables.users.remove(&id).ok_or(ServiceError::EntityNotFound("user"))?;

		tables.posts.retain(|_, post| post.author_id != id);
		let Tables { posts, comments, .. } = &mut *tables;
		comments.retain(|_, comment| comment.author_id != id && posts.contains_key(&comment.post_id));
		tables.follows.retain(|_, follow| follow.follower_id != id && follow.author_id != id);
		Ok(())
	}

	async fn create_group(
		&self,
		group: NewGroup,
	) -> Result<Group, ServiceError> {
		check_new_group(&group)?;
		let mut tables = self.tables.write().await;
		if tables.groups.values().any(|existing| existing.slug == group.slug) {
			return Err(ServiceError::Conflict(format!("slug `{}` is taken", group.slug)));
		}
		let group = Group {
			id: tables.next_id(),
			title: group.title,
			slug: group.slug,
			description: group.description,
		};
		tables.groups.insert(group.id, group.clone());
		Ok(group)
	}

	async fn find_group_by_slug(
		&self,
		slug: &str,
	) -> Result<Option<Group>, ServiceError> {
		Ok(self
			.tables
			.read()
			.await
			.groups
			.values()
			.find(|group| group.slug == slug)
			.cloned())
	}

	async fn list_groups(&self) -> Result<Vec<Group>, ServiceError> {
		let tables = self.tables.read().await;
		let mut groups: Vec<Group> = tables.groups.values().cloned().collect();
		groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
		Ok(groups)
	}

	async fn delete_group(
		&self,
		id: i64,
	) -> Result<(), ServiceError> {
		let mut tables = self.tables.write().await;
		tables.groups.remove(&id).ok_or(ServiceError::EntityNotFound("group"))?;
		for post in tables.posts.values_mut().filter(|post| post.group_id == Some(id)) {
			post.group_id = None;
		}
		Ok(())
	}

	async fn create_post(
		&self,
		post: NewPost,
	) -> Result<Post, ServiceError> {
		check_text(&post.text)?;
		let mut tables = self.tables.write().await;
		tables.user(post.author_id)?;
		if let Some(group_id) = post.group_id {
			if !tables.groups.contains_key(&group_id) {
				return Err(ServiceError::EntityNotFound("group"));
			}
		}
		let post = Post {
			id: tables.next_id(),
			text: post.text,
			pub_date: Utc::now(),
			author_id: post.author_id,
			group_id: post.group_id,
			image: post.image,
		};
		tables.posts.insert(post.id, post.clone());
		Ok(post)
	}

	async fn get_post(
		&self,
		id: i64,
	) -> Result<PostCard, ServiceError> {
		let tables = self.tables.read().await;
		let post = tables.posts.get(&id).ok_or(ServiceError::EntityNotFound("post"))?;
		tables.card(post)
	}

	async fn update_post(
		&self,
		id: i64,
		changes: PostChanges,
	) -> Result<Post, ServiceError> {
		check_text(&changes.text)?;
		let mut tables = self.tables.write().await;
		if let Some(group_id) = changes.group_id {
			if !tables.groups.contains_key(&group_id) {
				return Err(ServiceError::EntityNotFound("group"));
			}
		}
		let post = tables.posts.get_mut(&id).ok_or(ServiceError::EntityNotFound("post"))?;
		post.text = changes.text;
		post.group_id = changes.group_id;
		if let Some(image) = changes.image.overwrite() {
			post.image = image.map(str::to_string);
		}
		Ok(post.clone())
	}

	async fn delete_post(
		&self,
		id: i64,
	) -> Result<(), ServiceError> {
		let mut tables = self.tables.write().await;
		tables.posts.remove(&id).ok_or(ServiceError::EntityNotFound("post"))?;
		tables.comments.retain(|_, comment| comment.post_id != id);
		Ok(())
	}

	async fn list_posts(
		&self,
		filter: FeedFilter,
		limit: u64,
		offset: u64,
	) -> Result<Vec<PostCard>, ServiceError> {
		let tables = self.tables.read().await;
		tables
			.newest_first(filter)
			.into_iter()
			.skip(offset as usize)
			.take(limit as usize)
			.map(|post| tables.card(post))
			.collect()
	}

	async fn count_posts(
		&self,
		filter: FeedFilter,
	) -> Result<u64, ServiceError> {
		let tables = self.tables.read().await;
		Ok(tables.posts.values().filter(|post| tables.matches(post, filter)).count() as u64)
	}

	async fn create_comment(
		&self,
		comment: NewComment,
	) -> Result<Comment, ServiceError> {
		check_text(&comment.text)?;
		let mut tables = self.tables.write().await;
		tables.user(comment.author_id)?;
		if !tables.posts.contains_key(&comment.post_id) {
			return Err(ServiceError::EntityNotFound("post"));
		}
		let comment = Comment {
			id: tables.next_id(),
			post_id: comment.post_id,
			author_id: comment.author_id,
			text: comment.text,
			created: Utc::now(),
		};
		tables.comments.insert(comment.id, comment.clone());
		Ok(comment)
	}

	async fn get_comment(
		&self,
		id: i64,
	) -> Result<Comment, ServiceError> {
		self.tables
			.read()
			.await
			.comments
			.get(&id)
			.cloned()
			.ok_or(ServiceError::EntityNotFound("comment"))
	}

	async fn list_comments(
		&self,
		post_id: i64,
	) -> Result<Vec<CommentCard>, ServiceError> {
		let tables = self.tables.read().await;
		let mut comments: Vec<&Comment> =
			tables.comments.values().filter(|comment| comment.post_id == post_id).collect();
		comments.sort_by(|a, b| a.created.cmp(&b.created).then(a.id.cmp(&b.id)));
		comments
			.into_iter()
			.map(|comment| -> Result<CommentCard, ServiceError> {
				Ok(CommentCard {
					comment: comment.clone(),
					author: tables.user(comment.author_id)?.clone(),
				})
			})
			.collect()
	}

	async fn delete_comment(
		&self,
		id: i64,
	) -> Result<(), ServiceError> {
		self.tables
			.write()
			.await
			.comments
			.remove(&id)
			.map(|_| ())
			.ok_or(ServiceError::EntityNotFound("comment"))
	}

	async fn find_follow(
		&self,
		follower_id: i64,
		author_id: i64,
	) -> Result<Option<Follow>, ServiceError> {
		Ok(self
			.tables
			.read()
			.await
			.follows
			.values()
			.find(|follow| follow.follower_id == follower_id && follow.author_id == author_id)
			.cloned())
	}

	async fn create_follow(
		&self,
		follower_id: i64,
		author_id: i64,
	) -> Result<bool, ServiceError> {
		let mut tables = self.tables.write().await;
		tables.user(follower_id)?;
		tables.user(author_id)?;
		if tables
			.follows
			.values()
			.any(|follow| follow.follower_id == follower_id && follow.author_id == author_id)
		{
			return Ok(false);
		}
		let follow = Follow {
			id: tables.next_id(),
			follower_id,
			author_id,
		};
		tables.follows.insert(follow.id, follow);
		Ok(true)
	}

	async fn delete_follow(
		&self,
		follower_id: i64,
		author_id: i64,
	) -> Result<bool, ServiceError> {
		let mut tables = self.tables.write().await;
		let before = tables.follows.len();
		tables
			.follows
			.retain(|_, follow| !(follow.follower_id == follower_id && follow.author_id == author_id));
		Ok(tables.follows.len() < before)
	}

	async fn count_following(
		&self,
		follower_id: i64,
	) -> Result<u64, ServiceError> {
		Ok(self
			.tables
			.read()
			.await
			.follows
			.values()
			.filter(|follow| follow.follower_id == follower_id)
			.count() as u64)
	}
}

#[cfg(test)]
mod test {
	use super::MemoryStore;
	use crate::{
		adapters::repositories::{EntityStore, FeedFilter},
		domain::post::entity::{ImageChange, NewComment, NewGroup, NewPost, PostChanges},
		services::response::ServiceError,
	};

	fn new_group(slug: &str) -> NewGroup {
		NewGroup {
			title: "Тестовая группа".to_string(),
			slug: slug.to_string(),
			description: "Тестовое описание".to_string(),
		}
	}

	fn new_post(
		author_id: i64,
		group_id: Option<i64>,
		text: &str,
	) -> NewPost {
		NewPost {
			author_id,
			text: text.to_string(),
			group_id,
			image: None,
		}
	}

	#[tokio::test]
	async fn test_deleting_group_keeps_its_posts() {
		'_given: {
			let store = MemoryStore::new();
			let author = store.create_user("auth").await.unwrap();
			let group = store.create_group(new_group("test_group")).await.unwrap();
			let post = store.create_post(new_post(author.id, Some(group.id), "Тестовый пост")).await.unwrap();

			'_when: {
				store.delete_group(group.id).await.unwrap();

				let card = store.get_post(post.id).await.unwrap();
				assert_eq!(card.group_id, None);
				assert!(card.group.is_none());
				assert_eq!(store.count_posts(FeedFilter::All).await.unwrap(), 1);
				assert_eq!(store.count_posts(FeedFilter::Group(group.id)).await.unwrap(), 0);
			}
		}
	}

	#[tokio::test]
	async fn test_deleting_post_takes_its_comments() {
		let store = MemoryStore::new();
		let author = store.create_user("auth").await.unwrap();
		let post = store.create_post(new_post(author.id, None, "Тестовый пост")).await.unwrap();
		let comment = store
			.create_comment(NewComment {
				post_id: post.id,
				author_id: author.id,
				text: "Новый коммент".to_string(),
			})
			.await
			.unwrap();

		store.delete_post(post.id).await.unwrap();

		assert!(matches!(store.get_comment(comment.id).await, Err(ServiceError::EntityNotFound("comment"))));
		assert!(matches!(store.get_post(post.id).await, Err(ServiceError::EntityNotFound("post"))));
	}

	#[tokio::test]
	async fn test_deleting_user_cascades() {
		let store = MemoryStore::new();
		let author = store.create_user("auth").await.unwrap();
		let reader = store.create_user("Andrey").await.unwrap();
		let post = store.create_post(new_post(author.id, None, "Тестовый пост")).await.unwrap();
		let others = store.create_post(new_post(reader.id, None, "Другой пост")).await.unwrap();
		store
			.create_comment(NewComment {
				post_id: others.id,
				author_id: author.id,
				text: "Новый коммент".to_string(),
			})
			.await
			.unwrap();
		store.create_follow(reader.id, author.id).await.unwrap();

		store.delete_user(author.id).await.unwrap();

		assert!(store.get_post(post.id).await.is_err());
		assert!(store.list_comments(others.id).await.unwrap().is_empty());
		assert_eq!(store.count_following(reader.id).await.unwrap(), 0);
	}

	#[tokio::test]
	async fn test_listing_is_newest_first_and_resolves_authors() {
		let store = MemoryStore::new();
		let author = store.create_user("auth").await.unwrap();
		let group = store.create_group(new_group("test_group")).await.unwrap();
		for number in 0..13 {
			store
				.create_post(new_post(author.id, Some(group.id), &format!("Тестовый текст №{number}")))
				.await
				.unwrap();
		}

		let first = store.list_posts(FeedFilter::All, 10, 0).await.unwrap();
		assert_eq!(first.len(), 10);
		assert_eq!(first[0].text, "Тестовый текст №12");
		assert_eq!(first[0].author.username, "auth");
		assert_eq!(first[0].group.as_ref().unwrap().slug, "test_group");

		let second = store.list_posts(FeedFilter::Group(group.id), 10, 10).await.unwrap();
		assert_eq!(second.len(), 3);
		assert_eq!(second[2].text, "Тестовый текст №0");
	}

	#[tokio::test]
	async fn test_unique_slug_and_username() {
		let store = MemoryStore::new();
		store.create_user("auth").await.unwrap();
		assert!(matches!(store.create_user("auth").await, Err(ServiceError::Conflict(_))));

		store.create_group(new_group("test-slug")).await.unwrap();
		assert!(matches!(store.create_group(new_group("test-slug")).await, Err(ServiceError::Conflict(_))));
		assert!(matches!(store.create_group(new_group("test slug")).await, Err(ServiceError::BadRequest(_))));
	}

	#[tokio::test]
	async fn test_slug_longer_than_column_is_rejected() {
		let store = MemoryStore::new();

		let too_long = "s".repeat(51);
		assert!(matches!(store.create_group(new_group(&too_long)).await, Err(ServiceError::BadRequest(_))));
		assert!(store.list_groups().await.unwrap().is_empty());

		store.create_group(new_group(&"s".repeat(50))).await.unwrap();
	}

	#[tokio::test]
	async fn test_update_keeps_image_unless_replaced_or_cleared() {
		let store = MemoryStore::new();
		let author = store.create_user("auth").await.unwrap();
		let mut post = new_post(author.id, None, "Тестовый текст");
		post.image = Some("posts/small.gif".to_string());
		let post = store.create_post(post).await.unwrap();
		let changes = |image: ImageChange| PostChanges {
			text: "Новая запись в БД 2".to_string(),
			group_id: None,
			image,
		};

		let updated = store.update_post(post.id, changes(ImageChange::Keep)).await.unwrap();
		assert_eq!(updated.text, "Новая запись в БД 2");
		assert_eq!(updated.image.as_deref(), Some("posts/small.gif"));
		assert_eq!(updated.pub_date, post.pub_date);

		let updated = store
			.update_post(post.id, changes(ImageChange::Replace("posts/big.png".to_string())))
			.await
			.unwrap();
		assert_eq!(updated.image.as_deref(), Some("posts/big.png"));

		let updated = store.update_post(post.id, changes(ImageChange::Clear)).await.unwrap();
		assert_eq!(updated.image, None);
	}
}
