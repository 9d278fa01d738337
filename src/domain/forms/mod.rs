// submissions as they arrive from the browser, and what validation makes of them
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::post::entity::ImageChange;

/// Raw post submission. Every field is kept as text so that a bad value can be
/// reported against its field and handed back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct PostForm {
	#[serde(default)]
	pub text: String,
	/// Group id, blank for none.
	#[serde(default)]
	pub group: String,
	/// Uploaded file name, blank for none.
	#[serde(default)]
	pub image: String,
	/// Checkbox asking to drop the current attachment, present when ticked.
	#[serde(default)]
	pub image_clear: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CommentForm {
	#[serde(default)]
	pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedPost {
	pub text: String,
	pub group_id: Option<i64>,
	pub image: ImageChange,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedComment {
	pub text: String,
}

/// Messages keyed by the field they belong to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors(BTreeMap<&'static str, Vec<String>>);

impl FieldErrors {
	pub fn add(
		&mut self,
		field: &'static str,
		message: impl Into<String>,
	) {
		self.0.entry(field).or_default().push(message.into());
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Names of the fields that failed, in a stable order.
	pub fn fields(&self) -> Vec<&'static str> {
		self.0.keys().copied().collect()
	}
}

/// A form as shown to the user: the submitted (or pre-filled) values and the
/// errors found in them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BoundForm<F> {
	pub fields: F,
	pub errors: FieldErrors,
}

impl<F: Default> BoundForm<F> {
	pub fn empty() -> Self {
		Self::default()
	}
}

impl<F> BoundForm<F> {
	pub fn filled(fields: F) -> Self {
		Self {
			fields,
			errors: FieldErrors::default(),
		}
	}

	pub fn rejected(
		fields: F,
		errors: FieldErrors,
	) -> Self {
		Self { fields, errors }
	}

	pub fn is_valid(&self) -> bool {
		self.errors.is_empty()
	}
}

#[test]
fn test_field_errors_collect_per_field() {
	let mut errors = FieldErrors::default();
	assert!(errors.is_empty());

	errors.add("text", "This field is required.");
	errors.add("text", "Second message.");
	errors.add("group", "Select a valid choice.");

	assert_eq!(errors.fields(), vec!["group", "text"]);

	let json = serde_json::to_value(&errors).unwrap();
	assert_eq!(json["text"].as_array().unwrap().len(), 2);
	assert_eq!(json["group"][0], "Select a valid choice.");
	assert!(json.get("image").is_none());
}
