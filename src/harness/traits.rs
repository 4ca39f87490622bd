//! Capabilities consumed from the page driver and the agent
//!
//! The harness never clicks, renders or calls a model itself. It reaches the
//! page automation layer through [`Page`] and the planning agent through
//! [`Agent`], and asks an [`AgentFactory`] to build one agent per page.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::core::{ActionType, AgentRecord, Result, WaitForOptions};
use crate::harness::page::PageHandle;

/// A live page owned by the test runner
#[async_trait]
pub trait Page: Send + Sync {
    /// Resolve once the page has no network activity, or fail with
    /// [`HarnessError::Timeout`](crate::core::HarnessError::Timeout) after `timeout`.
    async fn wait_for_network_idle(&self, timeout: Duration) -> Result<()>;
}

/// Vision agent bound to one page
#[async_trait]
pub trait Agent: Send + Sync {
    /// Run a free-form instruction as an action or a query
    async fn ai(&self, prompt: &str, kind: ActionType) -> Result<Value>;

    /// Plan and execute GUI actions until the instruction is done
    async fn ai_action(&self, prompt: &str) -> Result<Value>;

    /// Extract data shaped like `demand` from the page
    async fn ai_query(&self, demand: &Value) -> Result<Value>;

    /// Fail with [`HarnessError::AssertionFailed`](crate::core::HarnessError::AssertionFailed)
    /// when the assertion does not hold
    async fn ai_assert(&self, assertion: &str, error_msg: Option<&str>) -> Result<()>;

    /// Poll until the assertion holds or the bound in `opt` is exceeded
    async fn ai_wait_for(&self, assertion: &str, opt: Option<&WaitForOptions>) -> Result<()>;

    /// Everything the agent did so far, serialized for the report
    fn dump_data_string(&self) -> String;
}

/// Builds the agent for a newly seen page
pub trait AgentFactory: Send + Sync {
    fn create(&self, page: &PageHandle, record: AgentRecord) -> Arc<dyn Agent>;
}

impl<F> AgentFactory for F
where
    F: Fn(&PageHandle, AgentRecord) -> Arc<dyn Agent> + Send + Sync,
{
    fn create(&self, page: &PageHandle, record: AgentRecord) -> Arc<dyn Agent> {
        self(page, record)
    }
}
