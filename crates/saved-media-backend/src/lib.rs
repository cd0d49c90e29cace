pub mod dto;
pub mod error;
pub mod http;
pub mod traits;
pub mod url;

pub use error::BackendError;
pub use http::HttpBackend;
pub use traits::SavedMediaApi;
pub use url::normalize_base_url;
