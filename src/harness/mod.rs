//! Harness module - per-page agents exposed to test bodies
//!
//! Binds one agent to each page, gates every operation on network idle, and
//! keeps the agent dump on the test record.

pub mod fixture;
pub mod idle;
pub mod page;
pub mod registry;
pub mod test_info;
pub mod traits;

pub use fixture::{update_dump_annotation, AiFixture};
pub use idle::NetworkIdleGate;
pub use page::{PageHandle, PageId};
pub use registry::AgentRegistry;
pub use test_info::TestInfo;
pub use traits::{Agent, AgentFactory, Page};
