use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of characters of a post used as its short label.
pub const LABEL_LENGTH: usize = 15;

pub const GROUP_TITLE_MAX_LENGTH: usize = 200;
pub const GROUP_SLUG_MAX_LENGTH: usize = 50;

#[derive(Clone, PartialEq, Eq, Debug, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
	pub id: i64,
	pub text: String,
	pub pub_date: DateTime<Utc>,
	pub author_id: i64,
	pub group_id: Option<i64>,
	/// Attachment reference such as `posts/small.gif`.
	pub image: Option<String>,
}

impl Post {
	pub fn label(&self) -> String {
		self.text.chars().take(LABEL_LENGTH).collect()
	}
}

#[derive(Clone, PartialEq, Eq, Debug, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct Group {
	pub id: i64,
	pub title: String,
	pub slug: String,
	pub description: String,
}

impl Group {
	/// Slugs are ASCII letters, digits, underscores and hyphens, at most
	/// [`GROUP_SLUG_MAX_LENGTH`] of them.
	pub fn is_valid_slug(slug: &str) -> bool {
		!slug.is_empty()
			&& slug.len() <= GROUP_SLUG_MAX_LENGTH
			&& slug
				.chars()
				.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
	}
}

#[derive(Clone, PartialEq, Eq, Debug, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
	pub id: i64,
	pub post_id: i64,
	pub author_id: i64,
	pub text: String,
	pub created: DateTime<Utc>,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct NewPost {
	pub author_id: i64,
	pub text: String,
	pub group_id: Option<i64>,
	pub image: Option<String>,
}

/// What an edit does to the attachment of a post.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub enum ImageChange {
	#[default]
	Keep,
	Clear,
	Replace(String),
}

impl ImageChange {
	/// Whether the stored attachment is overwritten, and with what.
	pub fn overwrite(&self) -> Option<Option<&str>> {
		match self {
			ImageChange::Keep => None,
			ImageChange::Clear => Some(None),
			ImageChange::Replace(image) => Some(Some(image.as_str())),
		}
	}
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PostChanges {
	pub text: String,
	pub group_id: Option<i64>,
	pub image: ImageChange,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct NewGroup {
	pub title: String,
	pub slug: String,
	pub description: String,
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct NewComment {
	pub post_id: i64,
	pub author_id: i64,
	pub text: String,
}
