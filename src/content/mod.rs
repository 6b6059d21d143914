//! Content module - post view models, listing pagination and reading time

pub mod pagination;
mod post;
mod reading_time;

pub use pagination::PaginationState;
pub use post::{ContentSection, PostDetail, PostSummary};
pub use reading_time::{
    count_words, estimate_reading_minutes, estimate_reading_minutes_at, plain_text,
    WORDS_PER_MINUTE,
};
