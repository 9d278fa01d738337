use crate::domain::{
	forms::{CommentForm, FieldErrors, PostForm, ValidatedComment, ValidatedPost},
	post::entity::{Group, ImageChange, Post},
};

/// Directory attachments are stored under.
pub const IMAGE_UPLOAD_DIR: &str = "posts/";

/// Longest stored attachment reference, directory included (`posts.image`).
pub const IMAGE_PATH_MAX_LENGTH: usize = 100;

const IMAGE_EXTENSIONS: [&str; 6] = ["gif", "jpg", "jpeg", "png", "webp", "bmp"];

const REQUIRED: &str = "This field is required.";
const INVALID_CHOICE: &str = "Select a valid choice. That choice is not one of the available choices.";
const INVALID_IMAGE: &str =
	"Upload a valid image. The file you uploaded was either not an image or a corrupted image.";
const IMAGE_AND_CLEAR: &str = "Please either submit a file or check the clear checkbox, not both.";

/// Checks a post submission against the groups that exist right now.
pub fn validate_post(
	raw: &PostForm,
	groups: &[Group],
) -> Result<ValidatedPost, FieldErrors> {
	let mut errors = FieldErrors::default();

	let text = raw.text.trim();
	if text.is_empty() {
		errors.add("text", REQUIRED);
	}

	let group_id = match raw.group.trim() {
		"" => None,
		value => match value.parse::<i64>() {
			Ok(id) if groups.iter().any(|group| group.id == id) => Some(id),
			_ => {
				errors.add("group", INVALID_CHOICE);
				None
			}
		},
	};

	let clear = raw.image_clear.is_some();
	let image = match raw.image.trim() {
		"" if clear => ImageChange::Clear,
		"" => ImageChange::Keep,
		_ if clear => {
			errors.add("image", IMAGE_AND_CLEAR);
			ImageChange::Keep
		}
		name if !is_image_file_name(name) => {
			errors.add("image", INVALID_IMAGE);
			ImageChange::Keep
		}
		name => {
			let path = format!("{IMAGE_UPLOAD_DIR}{name}");
			let length = path.chars().count();
			if length > IMAGE_PATH_MAX_LENGTH {
				errors.add(
					"image",
					format!("Ensure this filename has at most {IMAGE_PATH_MAX_LENGTH} characters (it has {length})."),
				);
				ImageChange::Keep
			} else {
				ImageChange::Replace(path)
			}
		}
	};

	if !errors.is_empty() {
		return Err(errors);
	}
	Ok(ValidatedPost {
		text: text.to_string(),
		group_id,
		image,
	})
}

pub fn validate_comment(raw: &CommentForm) -> Result<ValidatedComment, FieldErrors> {
	let text = raw.text.trim();
	if text.is_empty() {
		let mut errors = FieldErrors::default();
		errors.add("text", REQUIRED);
		return Err(errors);
	}
	Ok(ValidatedComment { text: text.to_string() })
}

/// The edit form, pre-filled from a stored post.
pub fn to_editable_fields(post: &Post) -> PostForm {
	PostForm {
		text: post.text.clone(),
		group: post.group_id.map(|id| id.to_string()).unwrap_or_default(),
		image: post
			.image
			.as_deref()
			.map(|path| path.strip_prefix(IMAGE_UPLOAD_DIR).unwrap_or(path).to_string())
			.unwrap_or_default(),
		image_clear: None,
	}
}

fn is_image_file_name(name: &str) -> bool {
	if name.contains(['/', '\\']) || name.starts_with('.') {
		return false;
	}
	match name.rsplit_once('.') {
		Some((stem, extension)) if !stem.is_empty() => {
			let extension = extension.to_ascii_lowercase();
			IMAGE_EXTENSIONS.contains(&extension.as_str())
		}
		_ => false,
	}
}
