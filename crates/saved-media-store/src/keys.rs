/// Legacy favorites collection, folded into `WATCHLIST` by the migration
pub const FAVORITES: &str = "favorites";
/// The unified saved-media collection
pub const WATCHLIST: &str = "watchlist";
pub const FAVORITES_MIGRATED: &str = "favorites_migrated";
pub const FAVORITES_BACKUP: &str = "favorites_backup";
