//! Best-effort network idle wait before each operation

use std::time::Duration;
use tracing::{debug, warn};

use crate::core::HarnessConfig;
use crate::harness::traits::Page;

/// Waits for network quiescence without ever failing the caller
#[derive(Debug, Clone, Copy)]
pub struct NetworkIdleGate {
    timeout: Duration,
}

impl NetworkIdleGate {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(20000);

    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn from_config(config: &HarnessConfig) -> Self {
        Self::new(config.network_idle_timeout())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns whether the page reported idle in time. Timeouts and page
    /// errors are logged and swallowed; a page that ignores its own timeout is
    /// cut off at the same bound.
    pub async fn wait(&self, page: &dyn Page) -> bool {
        let timeout_ms = self.timeout.as_millis() as u64;

        match tokio::time::timeout(self.timeout, page.wait_for_network_idle(self.timeout)).await {
            Ok(Ok(())) => {
                debug!(timeout_ms, "Network idle");
                true
            }
            Ok(Err(e)) if e.is_timeout() => {
                warn!(error = %e, "Network idle timeout exceeded");
                false
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Network idle wait failed");
                false
            }
            Err(_) => {
                warn!(timeout_ms, "Network idle timeout exceeded");
                false
            }
        }
    }
}

impl Default for NetworkIdleGate {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TIMEOUT)
    }
}
