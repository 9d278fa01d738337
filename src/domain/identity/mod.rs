// domain for the actor making a request
use serde::{Deserialize, Serialize};

/// A registered author. Rows are owned by the upstream identity provider; the
/// store only keeps the ones content refers to.
#[derive(Clone, PartialEq, Eq, Debug, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
	pub id: i64,
	pub username: String,
}

/// Who is asking. `None` is an anonymous visitor.
///
/// Every gate and feed call takes this explicitly instead of reading it from
/// ambient request state.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
pub struct RequestingIdentity(Option<User>);

impl RequestingIdentity {
	pub fn anonymous() -> Self {
		Self(None)
	}

	pub fn current(&self) -> Option<&User> {
		self.0.as_ref()
	}
}

impl From<User> for RequestingIdentity {
	fn from(value: User) -> Self {
		Self(Some(value))
	}
}

impl From<Option<User>> for RequestingIdentity {
	fn from(value: Option<User>) -> Self {
		Self(value)
	}
}

#[test]
fn test_anonymous_identity_is_nobody() {
	assert_eq!(RequestingIdentity::anonymous().current(), None);
	assert_eq!(RequestingIdentity::from(None), RequestingIdentity::default());

	let identity: RequestingIdentity = User {
		id: 7,
		username: "auth".to_string(),
	}
	.into();
	assert_eq!(identity.current().map(|user| user.id), Some(7));
}
