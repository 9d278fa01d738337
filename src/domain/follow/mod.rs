use serde::{Deserialize, Serialize};

/// Directed edge `follower -> author`. One record per pair at most.
#[derive(Clone, PartialEq, Eq, Debug, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct Follow {
	pub id: i64,
	pub follower_id: i64,
	pub author_id: i64,
}
