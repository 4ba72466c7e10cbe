//! Tower Service implementations

pub mod core;
pub mod request;
pub mod response;

pub use self::core::A2AProtocolService;
pub use request::{A2ARequest, RequestContext};
pub use response::{A2AResponse, UpdateStream};
