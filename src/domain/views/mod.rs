// view models handed to the rendering layer
use serde::Serialize;

use super::{
	forms::{BoundForm, CommentForm, PostForm},
	identity::User,
	post::{entity::Group, CommentCard, PostCard},
};
use crate::common::pagination::Page;

#[derive(Debug, Serialize)]
pub struct IndexView {
	pub page_obj: Page<PostCard>,
	pub index: bool,
}

#[derive(Debug, Serialize)]
pub struct GroupView {
	pub group: Group,
	pub title: String,
	pub page_obj: Page<PostCard>,
}

#[derive(Debug, Serialize)]
pub struct ProfileView {
	pub author: User,
	pub page_obj: Page<PostCard>,
	/// Only ever true for a signed-in viewer who follows `author`.
	pub following: bool,
	pub following_count: u64,
}

#[derive(Debug, Serialize)]
pub struct PostDetailView {
	pub post: PostCard,
	pub comments: Vec<CommentCard>,
	pub form: BoundForm<CommentForm>,
}

#[derive(Debug, Serialize)]
pub struct PostFormView {
	pub form: BoundForm<PostForm>,
	/// Choices for the group field.
	pub groups: Vec<Group>,
	pub is_edit: bool,
	pub post_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct FollowView {
	pub page_obj: Page<PostCard>,
	pub follow: bool,
}
