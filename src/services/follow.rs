use std::sync::Arc;

use crate::{adapters::repositories::EntityStore, domain::identity::User, services::response::ServiceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
	Created,
	AlreadyFollowing,
	/// Follower and target are the same user; nothing was written.
	SelfFollow,
}

/// Maintains the follower -> author graph.
#[derive(Clone)]
pub struct FollowManager {
	store: Arc<dyn EntityStore>,
}

impl FollowManager {
	pub fn new(store: Arc<dyn EntityStore>) -> Self {
		Self { store }
	}

	/// Idempotent: a second call for the same pair leaves one record.
	pub async fn follow(
		&self,
		follower: &User,
		target: &User,
	) -> Result<FollowOutcome, ServiceError> {
		if follower.id == target.id {
			return Ok(FollowOutcome::SelfFollow);
		}
		let outcome = match self.store.create_follow(follower.id, target.id).await? {
			true => FollowOutcome::Created,
			false => FollowOutcome::AlreadyFollowing,
		};
		tracing::info!(follower = %follower.username, author = %target.username, ?outcome, "follow");
		Ok(outcome)
	}

	pub async fn unfollow(
		&self,
		follower: &User,
		target: &User,
	) -> Result<(), ServiceError> {
		if !self.store.delete_follow(follower.id, target.id).await? {
			return Err(ServiceError::EntityNotFound("follow"));
		}
		tracing::info!(follower = %follower.username, author = %target.username, "unfollow");
		Ok(())
	}

	pub async fn is_following(
		&self,
		follower: &User,
		target: &User,
	) -> Result<bool, ServiceError> {
		Ok(self.store.find_follow(follower.id, target.id).await?.is_some())
	}
}
