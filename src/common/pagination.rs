use serde::{Deserialize, Serialize};

/// Posts per page on every listing.
pub const POSTS_PER_PAGE: u64 = 10;

/// `?page=` as it came in. Kept as text, anything unparsable means page 1.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
	pub page: Option<String>,
}

impl PageQuery {
	pub fn requested(&self) -> Option<&str> {
		self.page.as_deref()
	}
}

/// The slice of a listing a page covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
	pub number: u64,
	pub num_pages: u64,
	pub offset: u64,
	pub limit: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
	count: u64,
	per_page: u64,
}

impl Paginator {
	pub fn new(
		count: u64,
		per_page: u64,
	) -> Self {
		Self {
			count,
			per_page: per_page.max(1),
		}
	}

	/// An empty listing still has one (empty) page.
	pub fn num_pages(&self) -> u64 {
		if self.count == 0 {
			1
		} else {
			self.count.div_ceil(self.per_page)
		}
	}

	/// Resolves a requested page number. Missing or malformed numbers give the
	/// first page; numbers out of range give the last one.
	pub fn get_page(
		&self,
		requested: Option<&str>,
	) -> PageWindow {
		let num_pages = self.num_pages();
		let number = match requested.and_then(|raw| raw.trim().parse::<i64>().ok()) {
			None => 1,
			Some(n) if n < 1 || n as u64 > num_pages => num_pages,
			Some(n) => n as u64,
		};
		PageWindow {
			number,
			num_pages,
			offset: (number - 1) * self.per_page,
			limit: self.per_page,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Page<T> {
	pub items: Vec<T>,
	pub number: u64,
	pub num_pages: u64,
	pub count: u64,
	pub has_previous: bool,
	pub has_next: bool,
}

impl<T> Page<T> {
	pub fn new(
		items: Vec<T>,
		window: PageWindow,
		count: u64,
	) -> Self {
		Self {
			items,
			number: window.number,
			num_pages: window.num_pages,
			count,
			has_previous: window.number > 1,
			has_next: window.number < window.num_pages,
		}
	}

	pub fn empty() -> Self {
		Self::new(Vec::new(), Paginator::new(0, POSTS_PER_PAGE).get_page(None), 0)
	}

	pub fn len(&self) -> usize {
		self.items.len()
	}

	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	pub fn iter(&self) -> std::slice::Iter<'_, T> {
		self.items.iter()
	}
}

#[cfg(test)]
mod test {
	use super::{Paginator, POSTS_PER_PAGE};

	#[test]
	fn test_thirteen_items_make_two_pages() {
		let paginator = Paginator::new(13, POSTS_PER_PAGE);
		assert_eq!(paginator.num_pages(), 2);

		let first = paginator.get_page(Some("1"));
		assert_eq!((first.offset, first.limit), (0, 10));

		let second = paginator.get_page(Some("2"));
		assert_eq!(second.offset, 10);
		assert_eq!(13 - second.offset, 3);
	}

	#[test]
	fn test_out_of_range_pages_clamp_to_last() {
		let paginator = Paginator::new(25, POSTS_PER_PAGE);
		assert_eq!(paginator.get_page(Some("99")).number, 3);
		assert_eq!(paginator.get_page(Some("0")).number, 3);
		assert_eq!(paginator.get_page(Some("-4")).number, 3);
	}

	#[test]
	fn test_missing_or_garbage_page_is_first() {
		let paginator = Paginator::new(25, POSTS_PER_PAGE);
		assert_eq!(paginator.get_page(None).number, 1);
		assert_eq!(paginator.get_page(Some("last")).number, 1);
		assert_eq!(paginator.get_page(Some(" 2 ")).number, 2);
	}

	#[test]
	fn test_empty_listing_has_one_page() {
		let paginator = Paginator::new(0, POSTS_PER_PAGE);
		assert_eq!(paginator.num_pages(), 1);
		let window = paginator.get_page(Some("5"));
		assert_eq!((window.number, window.offset), (1, 0));
	}
}
