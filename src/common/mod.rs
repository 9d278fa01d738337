pub mod identity;
pub mod page_cache;
pub mod pagination;
pub mod paths;
