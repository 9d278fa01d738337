pub mod follow;
pub mod forms;
pub mod identity;
pub mod post;
pub mod views;
