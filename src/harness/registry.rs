//! Agent registry - one agent per page
//!
//! A registry lives for one test worker. It remembers the agent built for each
//! page identity and hands the same instance back on every later lookup.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::core::{AgentRecord, HarnessConfig, Result};
use crate::harness::fixture::AiFixture;
use crate::harness::idle::NetworkIdleGate;
use crate::harness::page::{PageHandle, PageId};
use crate::harness::test_info::TestInfo;
use crate::harness::traits::{Agent, AgentFactory};

/// An agent together with the lock that serializes its operations
#[derive(Clone)]
pub(crate) struct BoundAgent {
    pub(crate) agent: Arc<dyn Agent>,
    pub(crate) lane: Arc<tokio::sync::Mutex<()>>,
}

/// Per-worker map from page identity to agent
pub struct AgentRegistry {
    config: HarnessConfig,
    factory: Arc<dyn AgentFactory>,
    agents: Mutex<HashMap<PageId, BoundAgent>>,
}

impl AgentRegistry {
    pub fn new(config: HarnessConfig, factory: Arc<dyn AgentFactory>) -> Self {
        Self {
            config,
            factory,
            agents: Mutex::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    fn agents(&self) -> MutexGuard<'_, HashMap<PageId, BoundAgent>> {
        self.agents.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record used to build the agent for `page` in `test`
    pub fn agent_record(&self, page_id: PageId, test: &TestInfo) -> AgentRecord {
        let group = test.task_group();
        AgentRecord {
            test_id: format!("{}-{}-{}", self.config.driver_tag, test.test_id(), page_id),
            cache_id: group.cache_id(),
            group_name: group.task_title,
            group_description: group.task_file,
            generate_report: false,
        }
    }

    pub(crate) fn bind(&self, page: &PageHandle, test: &TestInfo) -> BoundAgent {
        let page_id = page.identity();
        let mut agents = self.agents();

        agents
            .entry(page_id)
            .or_insert_with(|| {
                let record = self.agent_record(page_id, test);
                debug!(
                    page_id = %page_id,
                    test_id = %record.test_id,
                    cache_id = %record.cache_id,
                    "Creating agent for page"
                );
                BoundAgent {
                    agent: self.factory.create(page, record),
                    lane: Arc::new(tokio::sync::Mutex::new(())),
                }
            })
            .clone()
    }

    /// The agent bound to `page`, created on first use
    pub fn get_or_create(&self, page: &PageHandle, test: &TestInfo) -> Arc<dyn Agent> {
        self.bind(page, test).agent
    }

    /// Whether an agent already exists for `page`
    pub fn contains(&self, page: &PageHandle) -> bool {
        page.id()
            .map(|id| self.agents().contains_key(&id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.agents().len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents().is_empty()
    }

    /// Drop every agent; call at the end of the worker session
    pub fn clear(&self) {
        let dropped = std::mem::take(&mut *self.agents());
        debug!(count = dropped.len(), "Cleared agent registry");
    }

    /// Fixture for one test body against `page`
    pub fn fixture(&self, page: PageHandle, test: Arc<TestInfo>) -> AiFixture {
        let bound = self.bind(&page, &test);
        let lane = self
            .config
            .serialize_page_operations
            .then_some(bound.lane);
        AiFixture::new(
            bound.agent,
            page,
            test,
            NetworkIdleGate::from_config(&self.config),
            lane,
        )
    }

    /// Run a test body with a fixture, then record the agent dump on the test
    /// whether or not the body succeeded.
    pub async fn with_fixture<T, F, Fut>(
        &self,
        page: PageHandle,
        test: Arc<TestInfo>,
        body: F,
    ) -> Result<T>
    where
        F: FnOnce(AiFixture) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let fixture = self.fixture(page, test);
        let result = body(fixture.clone()).await;
        fixture.teardown();
        result
    }
}

impl std::fmt::Debug for AgentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRegistry")
            .field("config", &self.config)
            .field("agents", &self.len())
            .finish()
    }
}
