//! Midscene harness - natural-language GUI testing
//!
//! Drives a live page through instructions planned by a vision model. The
//! crate owns the planning protocol and the test-side plumbing; the page
//! driver and the agent are supplied by the caller.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **Planning**: UI-TARS prompt, action grammar and response parsing
//! - **Harness**: Agent registry, network idle gate and the test fixture
//! - **CLI**: Command-line inspection of the planning protocol
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use midscene_harness::harness::{AgentFactory, AgentRegistry, Page, PageHandle, TestInfo};
//! use midscene_harness::Config;
//!
//! async fn login_test(page: Arc<dyn Page>, factory: Arc<dyn AgentFactory>) -> midscene_harness::Result<()> {
//!     let registry = AgentRegistry::new(Config::load().harness, factory);
//!     let test = Arc::new(TestInfo::new("login-1", ["login.spec.ts", "logs in"]));
//!
//!     registry
//!         .with_fixture(PageHandle::new(page), test, |ai| async move {
//!             ai.ai_action("type alice into the user field and press enter").await?;
//!             ai.ai_assert("the dashboard greets alice", None).await
//!         })
//!         .await
//! }
//! ```

pub mod cli;
pub mod core;
pub mod harness;
pub mod planning;

// Re-export commonly used items
pub use core::{Config, HarnessError, Result};
pub use harness::{AgentRegistry, AiFixture};
pub use planning::{get_summary, PromptBuilder};
