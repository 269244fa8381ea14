pub mod config;
pub mod drivers;
pub mod engine;
pub mod errors;
pub mod interpreter;
pub mod llm;
pub mod schema;
pub mod task;

pub use config::{load_config, AppConfig};
pub use engine::{ActionResult, ActionStatus, AutomationEngine, ConfirmationGate};
pub use errors::{DeskPilotError, DeskPilotResult};
pub use interpreter::CommandInterpreter;
pub use llm::BackendRegistry;
pub use schema::{Action, ActionKind, Plan};
pub use task::{Task, TaskEvent, TaskManager, TaskStatus};

/// Initializes tracing from `RUST_LOG` (default "info") and loads `.env`
/// if present. Call once at process start, before building the pipeline.
pub fn init() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Load .env file if present (ignore error if not found)
    let _ = dotenvy::dotenv();
}

/// Builds the full command pipeline from config: backend registry →
/// interpreter → engine → task manager. Must be called inside a Tokio
/// runtime.
///
/// When the config requires confirmation, the returned receiver carries the
/// approval requests; the transport layer answers them (or lets them time
/// out, which denies the action).
pub fn build_pipeline(
    config: &AppConfig,
    browser: std::sync::Arc<dyn drivers::BrowserDriver>,
    system: std::sync::Arc<dyn drivers::SystemDriver>,
) -> DeskPilotResult<(
    TaskManager,
    Option<tokio::sync::mpsc::Receiver<engine::ApprovalRequest>>,
)> {
    let registry = BackendRegistry::from_config(config);
    let backend = registry.get_active()?;
    let interpreter = CommandInterpreter::new(
        backend,
        std::time::Duration::from_secs(config.automation.interpret_timeout_secs),
    );

    let mut engine = AutomationEngine::new(browser, system, &config.automation);
    let mut approvals = None;
    if config.automation.require_confirmation {
        let (gate, rx) = ConfirmationGate::channel(
            std::time::Duration::from_secs(config.automation.confirmation_timeout_secs),
            8,
        );
        engine = engine.with_confirmation(gate);
        approvals = Some(rx);
    }

    let manager = TaskManager::new(interpreter, engine, &config.automation);
    Ok((manager, approvals))
}
