//! Application constants and configuration

/// Default backend API root; overridable via settings.json
pub const DEFAULT_API_URL: &str = "http://127.0.0.1:4000/api";
/// Default image storage root; overridable via settings.json
pub const DEFAULT_STORAGE_URL: &str = "http://127.0.0.1:4000/storage";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Selectable page sizes for the vehicles table
pub const PAGE_SIZES: [u32; 3] = [10, 25, 50];
/// Number of page buttons shown in the pagination strip
pub const PAGINATION_WINDOW: u32 = 5;
/// Delay before a text-filter edit is sent to the backend
pub const FILTER_DEBOUNCE_MS: u64 = 1500;
