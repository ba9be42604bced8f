pub mod comment;
pub mod image;
pub mod like;
pub mod post;
pub mod user;

/// Fixed page size for paginated listings.
pub const ITEMS_PER_PAGE: u32 = 20;

/// 1-based page number to row offset. Saturates rather than
/// overflowing on absurd page numbers from the query string.
pub fn page_offset(page: u32) -> u32 {
    page.saturating_sub(1).saturating_mul(ITEMS_PER_PAGE)
}
