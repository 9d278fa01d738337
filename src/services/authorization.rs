use crate::{
	common::paths,
	domain::{
		identity::{RequestingIdentity, User},
		post::entity::{Comment, Post},
	},
};

/// Why a write was not let through. Each variant has a page to send the
/// viewer to instead of an error body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Denial {
	/// Anonymous viewer. `location` is the login entry point carrying `next`.
	LoginRequired { location: String },
	/// Authenticated, but not the author. The viewer goes to the read-only view.
	NotAuthor { post_id: i64 },
	/// Following yourself does nothing.
	SelfFollow { username: String },
}

impl Denial {
	pub fn location(&self) -> String {
		match self {
			Denial::LoginRequired { location } => location.clone(),
			Denial::NotAuthor { post_id } => paths::post_detail(*post_id),
			Denial::SelfFollow { username } => paths::profile(username),
		}
	}
}

#[derive(Debug, Clone)]
pub struct AuthorizationGate {
	login_url: String,
}

impl AuthorizationGate {
	pub fn new(login_url: impl Into<String>) -> Self {
		Self {
			login_url: login_url.into(),
		}
	}

	pub fn login_redirect(
		&self,
		requested: &str,
	) -> Denial {
		// `/` stays readable in `next`, like `/auth/login/?next=/create/`
		let next = urlencoding::encode(requested).replace("%2F", "/");
		Denial::LoginRequired {
			location: format!("{}?next={}", self.login_url, next),
		}
	}

	/// Any write starts here: the requester must be signed in.
	pub fn authenticated<'a>(
		&self,
		identity: &'a RequestingIdentity,
		requested: &str,
	) -> Result<&'a User, Denial> {
		identity.current().ok_or_else(|| self.login_redirect(requested))
	}

	/// The author of a new post is always the requester.
	pub fn authorize_post_create<'a>(
		&self,
		identity: &'a RequestingIdentity,
		requested: &str,
	) -> Result<&'a User, Denial> {
		self.authenticated(identity, requested)
	}

	pub fn authorize_post_edit<'a>(
		&self,
		identity: &'a RequestingIdentity,
		post: &Post,
		requested: &str,
	) -> Result<&'a User, Denial> {
		let user = self.authenticated(identity, requested)?;
		if user.id != post.author_id {
			tracing::info!(post_id = post.id, user = %user.username, "edit attempt by non-author");
			return Err(Denial::NotAuthor { post_id: post.id });
		}
		Ok(user)
	}

	pub fn authorize_post_delete<'a>(
		&self,
		identity: &'a RequestingIdentity,
		post: &Post,
		requested: &str,
	) -> Result<&'a User, Denial> {
		self.authorize_post_edit(identity, post, requested)
	}

	/// Author and post of a comment come from the requester and the path.
	pub fn authorize_comment<'a>(
		&self,
		identity: &'a RequestingIdentity,
		requested: &str,
	) -> Result<&'a User, Denial> {
		self.authenticated(identity, requested)
	}

	pub fn authorize_comment_delete<'a>(
		&self,
		identity: &'a RequestingIdentity,
		comment: &Comment,
		requested: &str,
	) -> Result<&'a User, Denial> {
		let user = self.authenticated(identity, requested)?;
		if user.id != comment.author_id {
			return Err(Denial::NotAuthor {
				post_id: comment.post_id,
			});
		}
		Ok(user)
	}

	pub fn authorize_follow<'a>(
		&self,
		identity: &'a RequestingIdentity,
		target: &User,
		requested: &str,
	) -> Result<&'a User, Denial> {
		let user = self.authenticated(identity, requested)?;
		if user.id == target.id {
			return Err(Denial::SelfFollow {
				username: target.username.clone(),
			});
		}
		Ok(user)
	}

	/// Ownership of the follow record is checked when it is looked up.
	pub fn authorize_unfollow<'a>(
		&self,
		identity: &'a RequestingIdentity,
		requested: &str,
	) -> Result<&'a User, Denial> {
		self.authenticated(identity, requested)
	}
}
