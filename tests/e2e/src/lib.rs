//! End-to-end test support
//!
//! - `harness`: an in-process mock of the WaniKani v2 API served over HTTP
//! - `mocks`: factories for realistic resources to seed it with

pub mod harness;

pub use harness::{MockServer, MockState, MockRecord, RecordedRequest, MOCK_TOKEN};
pub use mocks::TestDataFactory;
