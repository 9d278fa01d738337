pub mod authorization;
pub mod feed;
pub mod follow;
pub mod handlers;
pub mod response;
pub mod validation;
