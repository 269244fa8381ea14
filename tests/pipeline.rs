//! End-to-end pipeline tests over the public API: submission through the
//! task manager, execution against instrumented drivers.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use deskpilot::config::AutomationConfig;
use deskpilot::drivers::{BrowserDriver, SystemDriver};
use deskpilot::engine::ConfirmationGate;
use deskpilot::llm::LlmBackend;
use deskpilot::{
    ActionStatus, AutomationEngine, CommandInterpreter, DeskPilotResult, TaskManager, TaskStatus,
};

/// Echoes a canned plan whose screenshot filenames are derived from the
/// command, so driver logs reveal which task each call belonged to.
struct EchoBackend;

#[async_trait]
impl LlmBackend for EchoBackend {
    fn name(&self) -> &str {
        "echo"
    }

    async fn complete(&self, prompt: &str) -> DeskPilotResult<String> {
        let marker = prompt
            .lines()
            .find_map(|line| line.strip_prefix("User command: take shots "))
            .unwrap_or("x")
            .trim()
            .to_string();
        Ok(format!(
            r#"[
                {{"action": "screenshot", "params": {{"filename": "{marker}-1.png"}}}},
                {{"action": "screenshot", "params": {{"filename": "{marker}-2.png"}}}}
            ]"#
        ))
    }
}

struct NullBrowser;

#[async_trait]
impl BrowserDriver for NullBrowser {
    async fn open(&self, _headless: bool) -> DeskPilotResult<()> {
        Ok(())
    }

    async fn navigate(&self, _url: &str) -> DeskPilotResult<()> {
        Ok(())
    }

    async fn search(&self, _site: &str, _query: &str) -> DeskPilotResult<()> {
        Ok(())
    }

    async fn click(&self, _selector: &str) -> DeskPilotResult<()> {
        Ok(())
    }

    async fn fill(&self, _selector: &str, _text: &str) -> DeskPilotResult<()> {
        Ok(())
    }

    async fn close(&self) -> DeskPilotResult<()> {
        Ok(())
    }
}

/// Tracks how many driver calls run concurrently and in what order.
#[derive(Default)]
struct InstrumentedSystem {
    active: AtomicUsize,
    max_active: AtomicUsize,
    calls: Mutex<Vec<String>>,
}

impl InstrumentedSystem {
    async fn enter(&self, label: String) {
        let active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(active, Ordering::SeqCst);
        self.calls.lock().unwrap().push(label);
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl SystemDriver for InstrumentedSystem {
    async fn launch_application(&self, name: &str) -> DeskPilotResult<()> {
        self.enter(format!("launch:{name}")).await;
        Ok(())
    }

    async fn press_key(&self, key: &str) -> DeskPilotResult<()> {
        self.enter(format!("key:{key}")).await;
        Ok(())
    }

    async fn hotkey(&self, keys: &str) -> DeskPilotResult<()> {
        self.enter(format!("hotkey:{keys}")).await;
        Ok(())
    }

    async fn type_text(&self, text: &str) -> DeskPilotResult<()> {
        self.enter(format!("type:{text}")).await;
        Ok(())
    }

    async fn wait(&self, _duration: Duration) -> DeskPilotResult<()> {
        self.enter("wait".to_string()).await;
        Ok(())
    }

    async fn screenshot(&self, filename: Option<&str>) -> DeskPilotResult<String> {
        let path = filename.unwrap_or("screenshot.png").to_string();
        self.enter(format!("shot:{path}")).await;
        Ok(path)
    }
}

fn manager_with(system: Arc<InstrumentedSystem>) -> TaskManager {
    let config = AutomationConfig {
        action_timeout_secs: 2,
        ..AutomationConfig::default()
    };
    let interpreter = CommandInterpreter::new(Arc::new(EchoBackend), Duration::from_secs(5));
    let engine = AutomationEngine::new(Arc::new(NullBrowser), system, &config);
    TaskManager::new(interpreter, engine, &config)
}

async fn wait_for_finish(manager: &TaskManager, id: uuid::Uuid) -> deskpilot::Task {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    loop {
        let task = manager.get(id).unwrap();
        if task.status.is_terminal() {
            return task;
        }
        assert!(tokio::time::Instant::now() < deadline, "task never finished");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

#[tokio::test]
async fn concurrent_submissions_never_overlap_on_the_backend() {
    let system = Arc::new(InstrumentedSystem::default());
    let manager = manager_with(system.clone());

    let a = manager.submit("take shots alpha").await.unwrap();
    let b = manager.submit("take shots beta").await.unwrap();

    let task_a = wait_for_finish(&manager, a).await;
    let task_b = wait_for_finish(&manager, b).await;

    assert_eq!(task_a.status, TaskStatus::Completed);
    assert_eq!(task_b.status, TaskStatus::Completed);

    // One engine run at a time, tasks in submission order, never interleaved.
    assert_eq!(system.max_active.load(Ordering::SeqCst), 1);
    assert_eq!(
        *system.calls.lock().unwrap(),
        vec![
            "shot:alpha-1.png",
            "shot:alpha-2.png",
            "shot:beta-1.png",
            "shot:beta-2.png"
        ]
    );
}

#[tokio::test]
async fn results_are_reported_in_plan_order_with_payloads() {
    let system = Arc::new(InstrumentedSystem::default());
    let manager = manager_with(system.clone());

    let id = manager.submit("take shots gamma").await.unwrap();
    let task = wait_for_finish(&manager, id).await;

    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(task.results.len(), 2);
    assert!(task
        .results
        .iter()
        .all(|r| r.status == ActionStatus::Succeeded));
    assert_eq!(task.results[0].payload.as_deref(), Some("gamma-1.png"));
    assert_eq!(task.results[1].payload.as_deref(), Some("gamma-2.png"));
}

#[tokio::test]
async fn approved_sensitive_plan_completes_end_to_end() {
    struct TypingBackend;

    #[async_trait]
    impl LlmBackend for TypingBackend {
        fn name(&self) -> &str {
            "typing"
        }

        async fn complete(&self, _prompt: &str) -> DeskPilotResult<String> {
            Ok(r#"[
                {"action": "open_app", "params": {"name": "notepad"}},
                {"action": "type_text", "params": {"text": "Hello World"}}
            ]"#
            .to_string())
        }
    }

    let config = AutomationConfig {
        action_timeout_secs: 2,
        require_confirmation: true,
        confirmation_timeout_secs: 2,
        ..AutomationConfig::default()
    };
    let system = Arc::new(InstrumentedSystem::default());
    let interpreter = CommandInterpreter::new(Arc::new(TypingBackend), Duration::from_secs(5));
    let (gate, mut approvals) = ConfirmationGate::channel(Duration::from_secs(2), 8);
    let engine = AutomationEngine::new(Arc::new(NullBrowser), system.clone(), &config)
        .with_confirmation(gate);
    let manager = TaskManager::new(interpreter, engine, &config);

    // Approve everything, the way a UI approval surface would.
    tokio::spawn(async move {
        while let Some(request) = approvals.recv().await {
            let _ = request.respond.send(true);
        }
    });

    let id = manager.submit("open notepad and type Hello World").await.unwrap();
    let task = wait_for_finish(&manager, id).await;

    assert_eq!(task.status, TaskStatus::Completed);
    assert_eq!(
        *system.calls.lock().unwrap(),
        vec!["launch:notepad", "type:Hello World"]
    );
}
