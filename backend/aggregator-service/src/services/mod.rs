pub mod aggregator;

pub use aggregator::{Aggregator, LATEST_POSTS_LIMIT, TOP_USERS_LIMIT};
