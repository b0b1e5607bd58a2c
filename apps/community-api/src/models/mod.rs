pub mod community;
pub mod membership;
pub mod post;
