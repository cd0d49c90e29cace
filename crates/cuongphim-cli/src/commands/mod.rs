pub mod auth;
pub mod context;
pub mod list;
pub mod maintenance;
pub mod sync;
pub mod toggle;
