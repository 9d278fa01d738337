use std::sync::Arc;

use crate::{
	adapters::repositories::{EntityStore, FeedFilter},
	common::pagination::{Page, Paginator, POSTS_PER_PAGE},
	domain::{
		forms::BoundForm,
		identity::{RequestingIdentity, User},
		post::{entity::Group, PostCard},
		views::{PostDetailView, ProfileView},
	},
	services::{follow::FollowManager, response::ServiceError},
};

/// Builds the read side: paginated listings and the post detail view.
#[derive(Clone)]
pub struct FeedAssembler {
	store: Arc<dyn EntityStore>,
}

impl FeedAssembler {
	pub fn new(store: Arc<dyn EntityStore>) -> Self {
		Self { store }
	}

	/// Counts first so an out-of-range request can be clamped to the last page.
	async fn paginate(
		&self,
		filter: FeedFilter,
		requested: Option<&str>,
	) -> Result<Page<PostCard>, ServiceError> {
		let count = self.store.count_posts(filter).await?;
		let window = Paginator::new(count, POSTS_PER_PAGE).get_page(requested);
		let items = self.store.list_posts(filter, window.limit, window.offset).await?;
		tracing::debug!(?filter, count, page = window.number, "feed assembled");
		Ok(Page::new(items, window, count))
	}

	pub async fn list_all(
		&self,
		requested: Option<&str>,
	) -> Result<Page<PostCard>, ServiceError> {
		self.paginate(FeedFilter::All, requested).await
	}

	pub async fn list_by_group(
		&self,
		slug: &str,
		requested: Option<&str>,
	) -> Result<(Group, Page<PostCard>), ServiceError> {
		let group = self
			.store
			.find_group_by_slug(slug)
			.await?
			.ok_or(ServiceError::EntityNotFound("group"))?;
		let page = self.paginate(FeedFilter::Group(group.id), requested).await?;
		Ok((group, page))
	}

	pub async fn list_by_author(
		&self,
		username: &str,
		requested: Option<&str>,
	) -> Result<(User, Page<PostCard>), ServiceError> {
		let author = self
			.store
			.find_user_by_username(username)
			.await?
			.ok_or(ServiceError::EntityNotFound("user"))?;
		let page = self.paginate(FeedFilter::Author(author.id), requested).await?;
		Ok((author, page))
	}

	/// Posts by everyone the viewer follows. An anonymous viewer follows no one.
	pub async fn list_followed_feed(
		&self,
		viewer: &RequestingIdentity,
		requested: Option<&str>,
	) -> Result<Page<PostCard>, ServiceError> {
		match viewer.current() {
			Some(user) => self.paginate(FeedFilter::FollowedBy(user.id), requested).await,
			None => Ok(Page::empty()),
		}
	}

	pub async fn profile(
		&self,
		username: &str,
		viewer: &RequestingIdentity,
		requested: Option<&str>,
	) -> Result<ProfileView, ServiceError> {
		let (author, page_obj) = self.list_by_author(username, requested).await?;
		let following = match viewer.current() {
			Some(user) => FollowManager::new(self.store.clone()).is_following(user, &author).await?,
			None => false,
		};
		let following_count = self.store.count_following(author.id).await?;
		Ok(ProfileView {
			author,
			page_obj,
			following,
			following_count,
		})
	}

	pub async fn post_detail(
		&self,
		post_id: i64,
	) -> Result<PostDetailView, ServiceError> {
		let post = self.store.get_post(post_id).await?;
		let comments = self.store.list_comments(post_id).await?;
		Ok(PostDetailView {
			post,
			comments,
			form: BoundForm::empty(),
		})
	}
}

#[cfg(test)]
mod test {
	use std::sync::Arc;

	use super::FeedAssembler;
	use crate::{
		adapters::repositories::{EntityStore, MemoryStore},
		domain::{
			identity::RequestingIdentity,
			post::entity::{NewComment, NewGroup, NewPost},
		},
		services::response::ServiceError,
	};

	async fn seeded(posts: usize) -> (Arc<MemoryStore>, FeedAssembler) {
		let store = Arc::new(MemoryStore::new());
		let author = store.create_user("auth").await.unwrap();
		let group = store
			.create_group(NewGroup {
				title: "Тестовая группа".to_string(),
				slug: "test_group".to_string(),
				description: "Тестовое описание".to_string(),
			})
			.await
			.unwrap();
		for number in 0..posts {
			store
				.create_post(NewPost {
					author_id: author.id,
					text: format!("Тестовый текст №{number}"),
					group_id: Some(group.id),
					image: None,
				})
				.await
				.unwrap();
		}
		let feed = FeedAssembler::new(store.clone());
		(store, feed)
	}

	#[tokio::test]
	async fn test_paginator_splits_thirteen_posts_ten_and_three() {
		'_given: {
			let (_store, feed) = seeded(13).await;

			'_when: {
				let first = feed.list_all(Some("1")).await.unwrap();
				let second = feed.list_all(Some("2")).await.unwrap();
				assert_eq!(first.len(), 10);
				assert_eq!(second.len(), 3);
				assert_eq!(first.num_pages, 2);
				assert_eq!(first.count, 13);

				let (_, group_second) = feed.list_by_group("test_group", Some("2")).await.unwrap();
				assert_eq!(group_second.len(), 3);
				let (_, author_first) = feed.list_by_author("auth", None).await.unwrap();
				assert_eq!(author_first.len(), 10);
			}
		}
	}

	#[tokio::test]
	async fn test_page_past_the_end_shows_last_page() {
		let (_store, feed) = seeded(13).await;
		let page = feed.list_all(Some("42")).await.unwrap();
		assert_eq!(page.number, 2);
		assert_eq!(page.len(), 3);
		assert!(!page.has_next);
		assert!(page.has_previous);
	}

	#[tokio::test]
	async fn test_unknown_group_or_author_is_not_found() {
		let (_store, feed) = seeded(1).await;
		assert!(matches!(
			feed.list_by_group("no-such-group", None).await,
			Err(ServiceError::EntityNotFound("group"))
		));
		assert!(matches!(feed.list_by_author("nobody", None).await, Err(ServiceError::EntityNotFound("user"))));
	}

	#[tokio::test]
	async fn test_other_group_does_not_have_the_post() {
		let (store, feed) = seeded(1).await;
		store
			.create_group(NewGroup {
				title: "Тестовая группа 2".to_string(),
				slug: "test_group2".to_string(),
				description: "Тестовое описание 2".to_string(),
			})
			.await
			.unwrap();

		let (_, page) = feed.list_by_group("test_group2", None).await.unwrap();
		assert_eq!(page.count, 0);
		assert!(page.is_empty());
	}

	#[tokio::test]
	async fn test_followed_feed_only_has_followed_authors() {
		'_given: {
			let (store, feed) = seeded(0).await;
			let author = store.create_user("Pecheritsa").await.unwrap();
			let follower = store.create_user("follower").await.unwrap();
			let stranger = store.create_user("Andrey").await.unwrap();
			let post = store
				.create_post(NewPost {
					author_id: author.id,
					text: "Тестовый пост".to_string(),
					group_id: None,
					image: None,
				})
				.await
				.unwrap();
			store.create_follow(follower.id, author.id).await.unwrap();

			'_when: {
				let followed = feed.list_followed_feed(&follower.into(), None).await.unwrap();
				assert!(followed.iter().any(|card| card.id == post.id));

				let not_followed = feed.list_followed_feed(&stranger.into(), None).await.unwrap();
				assert!(!not_followed.iter().any(|card| card.id == post.id));

				let anonymous = feed.list_followed_feed(&RequestingIdentity::anonymous(), None).await.unwrap();
				assert!(anonymous.is_empty());
			}
		}
	}

	#[tokio::test]
	async fn test_profile_following_flag() {
		let (store, feed) = seeded(1).await;
		let reader = store.create_user("Andrey").await.unwrap();
		let author = store.find_user_by_username("auth").await.unwrap().unwrap();

		let view = feed.profile("auth", &reader.clone().into(), None).await.unwrap();
		assert!(!view.following);

		store.create_follow(reader.id, author.id).await.unwrap();
		let view = feed.profile("auth", &reader.into(), None).await.unwrap();
		assert!(view.following);

		let view = feed.profile("auth", &RequestingIdentity::anonymous(), None).await.unwrap();
		assert!(!view.following);
		assert_eq!(view.page_obj.len(), 1);
	}

	#[tokio::test]
	async fn test_post_detail_lists_comments_oldest_first() {
		let (store, feed) = seeded(1).await;
		let author = store.find_user_by_username("auth").await.unwrap().unwrap();
		let post_id = feed.list_all(None).await.unwrap().items[0].id;
		for text in ["первый", "второй"] {
			store
				.create_comment(NewComment {
					post_id,
					author_id: author.id,
					text: text.to_string(),
				})
				.await
				.unwrap();
		}

		let view = feed.post_detail(post_id).await.unwrap();
		assert_eq!(view.post.author.username, "auth");
		assert_eq!(view.comments.len(), 2);
		assert_eq!(view.comments[0].text, "первый");
		assert!(view.form.is_valid());
		assert!(matches!(feed.post_detail(post_id + 1000).await, Err(ServiceError::EntityNotFound("post"))));
	}
}
