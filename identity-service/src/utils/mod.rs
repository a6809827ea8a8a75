pub mod context;
pub mod pagination;
pub mod time_ordered;

pub use context::{Interrupted, RequestContext};
pub use pagination::{Page, PageCursor, PaginationError};
