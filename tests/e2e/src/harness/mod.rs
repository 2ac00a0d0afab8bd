//! Test harness


pub use mock_server::{MockRecord, MockServer, MockState, RecordedRequest, MOCK_TOKEN};
