pub mod id;
pub mod slug;

pub use slug::post_slug;
