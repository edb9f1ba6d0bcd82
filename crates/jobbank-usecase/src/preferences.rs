//! Page-size preference
//!
//! The list screens remember the last page size the user picked. Where it
//! is remembered (a cookie, in practice) is the adapter's business; the
//! controller only sees this narrow get/set interface.

use chrono::Duration;
use jobbank_domain::PageSize;

/// Key under which the page size is remembered
pub const PAGE_SIZE_KEY: &str = "pageSizeValue";

/// How long a remembered page size lives
pub const PREFERENCE_LIFETIME_DAYS: i64 = 30;

/// Small client-side key/value storage
pub trait PreferenceStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: String, lifetime: Duration);
}

/// Pick the page size for a list request.
///
/// An explicit, listed size wins and is remembered. Otherwise a listed
/// remembered size is reused. Otherwise the default.
pub fn resolve_page_size(explicit: Option<u32>, prefs: &mut impl PreferenceStore) -> PageSize {
    if let Some(size) = explicit.and_then(PageSize::listed) {
        prefs.set(
            PAGE_SIZE_KEY,
            size.to_string(),
            Duration::days(PREFERENCE_LIFETIME_DAYS),
        );
        return size;
    }

    prefs
        .get(PAGE_SIZE_KEY)
        .and_then(|raw| raw.trim().parse::<u32>().ok())
        .and_then(PageSize::listed)
        .unwrap_or_default()
}
