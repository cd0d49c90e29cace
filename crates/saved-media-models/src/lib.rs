pub mod collection;
pub mod item;
pub mod toggle;
pub mod user;

pub use collection::Collection;
pub use item::{ItemKey, SavedItem};
pub use toggle::ToggleResponse;
pub use user::{AuthTokens, UserProfile};
