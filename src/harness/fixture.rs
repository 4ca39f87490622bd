//! AI fixture - the operations a test body calls
//!
//! Every operation runs as one named step: wait for the page network to settle,
//! call the bound agent, record the outcome on the test. The agent's result or
//! error is returned to the caller as is.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info_span, Instrument};

use crate::core::{
    AiOptions, Result, StepOutcome, StepRecord, WaitForOptions, DUMP_ANNOTATION_TYPE,
};
use crate::harness::idle::NetworkIdleGate;
use crate::harness::page::PageHandle;
use crate::harness::test_info::TestInfo;
use crate::harness::traits::Agent;

/// Write `dump` into the single dump annotation of `test`
pub fn update_dump_annotation(test: &TestInfo, dump: &str) {
    test.upsert_annotation(DUMP_ANNOTATION_TYPE, dump);
}

/// Operations bound to one page and one test
#[derive(Clone)]
pub struct AiFixture {
    agent: Arc<dyn Agent>,
    page: PageHandle,
    test: Arc<TestInfo>,
    gate: NetworkIdleGate,
    lane: Option<Arc<tokio::sync::Mutex<()>>>,
}

impl AiFixture {
    pub(crate) fn new(
        agent: Arc<dyn Agent>,
        page: PageHandle,
        test: Arc<TestInfo>,
        gate: NetworkIdleGate,
        lane: Option<Arc<tokio::sync::Mutex<()>>>,
    ) -> Self {
        Self {
            agent,
            page,
            test,
            gate,
            lane,
        }
    }

    pub fn agent(&self) -> &Arc<dyn Agent> {
        &self.agent
    }

    pub fn page(&self) -> &PageHandle {
        &self.page
    }

    pub fn test(&self) -> &TestInfo {
        &self.test
    }

    /// Free-form instruction; runs as an action unless `opts` asks for a query
    pub async fn ai(&self, prompt: &str, opts: AiOptions) -> Result<Value> {
        let kind = opts.kind.unwrap_or_default();
        self.run_step("ai", prompt, |agent| async move { agent.ai(prompt, kind).await })
            .await
    }

    pub async fn ai_action(&self, prompt: &str) -> Result<Value> {
        self.run_step("aiAction", prompt, |agent| async move {
            agent.ai_action(prompt).await
        })
        .await
    }

    pub async fn ai_query(&self, demand: &Value) -> Result<Value> {
        let label = serde_json::to_string(demand)?;
        self.run_step("aiQuery", &label, |agent| async move {
            agent.ai_query(demand).await
        })
        .await
    }

    /// [`ai_query`](Self::ai_query) deserialized into `T`
    pub async fn ai_query_as<T: DeserializeOwned>(&self, demand: &Value) -> Result<T> {
        let value = self.ai_query(demand).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn ai_assert(&self, assertion: &str, error_msg: Option<&str>) -> Result<()> {
        self.run_step("aiAssert", assertion, |agent| async move {
            agent.ai_assert(assertion, error_msg).await
        })
        .await
    }

    pub async fn ai_wait_for(&self, assertion: &str, opt: Option<&WaitForOptions>) -> Result<()> {
        self.run_step("aiWaitFor", assertion, |agent| async move {
            agent.ai_wait_for(assertion, opt).await
        })
        .await
    }

    /// Store the agent's current dump on the test. Called once the test body
    /// is done with the fixture.
    pub fn teardown(&self) {
        update_dump_annotation(&self.test, &self.agent.dump_data_string());
    }

    async fn run_step<T, F, Fut>(&self, operation: &str, subject: &str, call: F) -> Result<T>
    where
        F: FnOnce(Arc<dyn Agent>) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let title = format!("{} - {}", operation, subject);
        let span = info_span!("step", title = %title, test_id = %self.test.test_id());
        let started = Instant::now();

        let result = async {
            let _turn = match &self.lane {
                Some(lane) => Some(lane.lock().await),
                None => None,
            };
            debug!("Step started");
            self.gate.wait(self.page.page()).await;
            call(Arc::clone(&self.agent)).await
        }
        .instrument(span.clone())
        .await;

        let outcome = match &result {
            Ok(_) => StepOutcome::Passed,
            Err(e) => StepOutcome::Failed(e.to_string()),
        };
        span.in_scope(|| debug!(outcome = ?outcome, "Step finished"));

        self.test.record_step(StepRecord {
            title,
            outcome,
            duration: started.elapsed(),
        });

        result
    }
}

impl std::fmt::Debug for AiFixture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiFixture")
            .field("page", &self.page)
            .field("test_id", &self.test.test_id())
            .field("gate", &self.gate)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ActionType, HarnessError};
    use crate::harness::traits::Page;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;

    struct BlankPage;

    #[async_trait]
    impl Page for BlankPage {
        async fn wait_for_network_idle(&self, _timeout: Duration) -> Result<()> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct EchoAgent {
        calls: Mutex<Vec<String>>,
    }

    impl EchoAgent {
        fn log(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    #[async_trait]
    impl Agent for EchoAgent {
        async fn ai(&self, prompt: &str, kind: ActionType) -> Result<Value> {
            self.log(format!("ai:{}:{}", kind, prompt));
            Ok(Value::String(kind.to_string()))
        }
        async fn ai_action(&self, prompt: &str) -> Result<Value> {
            self.log(format!("aiAction:{}", prompt));
            Ok(serde_json::json!({ "done": true }))
        }
        async fn ai_query(&self, demand: &Value) -> Result<Value> {
            self.log(format!("aiQuery:{}", demand));
            Ok(serde_json::json!(["apple", "pear"]))
        }
        async fn ai_assert(&self, assertion: &str, error_msg: Option<&str>) -> Result<()> {
            self.log(format!("aiAssert:{}", assertion));
            if assertion.contains("missing") {
                return Err(HarnessError::assertion_failed(assertion, error_msg));
            }
            Ok(())
        }
        async fn ai_wait_for(&self, assertion: &str, opt: Option<&WaitForOptions>) -> Result<()> {
            self.log(format!("aiWaitFor:{}", assertion));
            Err(HarnessError::WaitForTimeout {
                assertion: assertion.to_string(),
                timeout_ms: opt.and_then(|o| o.timeout_ms).unwrap_or(15000),
            })
        }
        fn dump_data_string(&self) -> String {
            format!("{} calls", self.calls.lock().unwrap().len())
        }
    }

    fn fixture(agent: Arc<EchoAgent>) -> AiFixture {
        AiFixture::new(
            agent,
            PageHandle::new(Arc::new(BlankPage)),
            Arc::new(TestInfo::new("t", ["Suite", "Case"])),
            NetworkIdleGate::new(Duration::from_millis(100)),
            None,
        )
    }

    #[tokio::test]
    async fn test_ai_defaults_to_action() {
        let agent = Arc::new(EchoAgent::default());
        let fixture = fixture(agent.clone());

        assert_eq!(fixture.ai("open menu", AiOptions::default()).await.unwrap(), "action");
        assert_eq!(fixture.ai("read title", AiOptions::query()).await.unwrap(), "query");

        let calls = agent.calls.lock().unwrap().clone();
        assert_eq!(calls, vec!["ai:action:open menu", "ai:query:read title"]);
    }

    #[tokio::test]
    async fn test_step_titles() {
        let fixture = fixture(Arc::new(EchoAgent::default()));

        fixture.ai_action("click login").await.unwrap();
        fixture.ai_query(&serde_json::json!("string[], fruit names")).await.unwrap();
        fixture.ai_assert("logo is shown", None).await.unwrap();

        let titles: Vec<String> = fixture.test().steps().into_iter().map(|s| s.title).collect();
        assert_eq!(
            titles,
            vec![
                "aiAction - click login",
                "aiQuery - \"string[], fruit names\"",
                "aiAssert - logo is shown",
            ]
        );
    }

    #[tokio::test]
    async fn test_query_as_typed() {
        let fixture = fixture(Arc::new(EchoAgent::default()));
        let fruits: Vec<String> = fixture
            .ai_query_as(&serde_json::json!({ "fruits": "string[]" }))
            .await
            .unwrap();
        assert_eq!(fruits, vec!["apple", "pear"]);
    }

    #[tokio::test]
    async fn test_errors_pass_through_and_are_recorded() {
        let fixture = fixture(Arc::new(EchoAgent::default()));

        let err = fixture
            .ai_assert("missing banner", Some("banner gone"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            HarnessError::AssertionFailed { ref assertion, ref message }
                if assertion == "missing banner" && message.as_deref() == Some("banner gone")
        ));

        let opt = WaitForOptions {
            timeout_ms: Some(3000),
            check_interval_ms: None,
        };
        let err = fixture.ai_wait_for("spinner gone", Some(&opt)).await.unwrap_err();
        assert!(matches!(err, HarnessError::WaitForTimeout { timeout_ms: 3000, .. }));

        let steps = fixture.test().steps();
        assert_eq!(steps.len(), 2);
        assert!(steps.iter().all(|s| !s.passed()));
    }

    #[tokio::test]
    async fn test_teardown_updates_single_annotation() {
        let fixture = fixture(Arc::new(EchoAgent::default()));

        fixture.teardown();
        fixture.ai_action("scroll down").await.unwrap();
        fixture.teardown();

        let annotations = fixture.test().annotations();
        assert_eq!(annotations.len(), 1);
        assert_eq!(annotations[0].kind, DUMP_ANNOTATION_TYPE);
        assert_eq!(annotations[0].description.as_deref(), Some("1 calls"));
    }
}
