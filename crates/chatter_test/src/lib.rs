pub mod mock;
pub mod sse;

pub type Result = std::result::Result<(), Box<dyn std::error::Error>>;
pub use test_log::test;
