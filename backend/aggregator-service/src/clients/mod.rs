pub mod upstream;

pub use upstream::{HttpUpstreamClient, UpstreamApi};
