use std::ops::Deref;

use serde::{Deserialize, Serialize};

use self::entity::{Comment, Group, Post};
use super::identity::User;
pub mod entity;

/// A post with its author and group already resolved, the unit every feed
/// is made of.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct PostCard {
	#[serde(flatten)]
	pub post: Post,
	/// Short title shown wherever the post is listed.
	#[serde(default)]
	pub label: String,
	pub author: User,
	pub group: Option<Group>,
}

impl PostCard {
	pub fn new(
		post: Post,
		author: User,
		group: Option<Group>,
	) -> Self {
		Self {
			label: post.label(),
			post,
			author,
			group,
		}
	}
}

impl Deref for PostCard {
	type Target = Post;
	fn deref(&self) -> &Self::Target {
		&self.post
	}
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct CommentCard {
	#[serde(flatten)]
	pub comment: Comment,
	pub author: User,
}

impl Deref for CommentCard {
	type Target = Comment;
	fn deref(&self) -> &Self::Target {
		&self.comment
	}
}

#[test]
fn test_card_is_rendered_with_label() {
	let card = PostCard::new(
		Post {
			id: 1,
			text: "Тестовый пост для проверки".to_string(),
			pub_date: chrono::Utc::now(),
			author_id: 1,
			group_id: None,
			image: None,
		},
		User {
			id: 1,
			username: "auth".to_string(),
		},
		None,
	);

	let json = serde_json::to_value(&card).unwrap();
	assert_eq!(json["label"], "Тестовый пост д");
	assert_eq!(json["text"], "Тестовый пост для проверки");
	assert_eq!(json["author"]["username"], "auth");
}
