//! Execution backend capability traits.
//!
//! Concrete drivers (a WebDriver session, an OS input synthesizer) live
//! outside this crate and plug in through these traits. Calls block the
//! engine for their duration; failures surface as
//! [`DeskPilotError::Driver`](crate::errors::DeskPilotError) with a
//! human-readable cause.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::DeskPilotResult;

/// Browser capability set.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn open(&self, headless: bool) -> DeskPilotResult<()>;
    async fn navigate(&self, url: &str) -> DeskPilotResult<()>;
    async fn search(&self, site: &str, query: &str) -> DeskPilotResult<()>;
    async fn click(&self, selector: &str) -> DeskPilotResult<()>;
    async fn fill(&self, selector: &str, text: &str) -> DeskPilotResult<()>;
    async fn close(&self) -> DeskPilotResult<()>;
}

/// OS-level capability set.
#[async_trait]
pub trait SystemDriver: Send + Sync {
    async fn launch_application(&self, name: &str) -> DeskPilotResult<()>;
    async fn press_key(&self, key: &str) -> DeskPilotResult<()>;
    async fn hotkey(&self, keys: &str) -> DeskPilotResult<()>;
    async fn type_text(&self, text: &str) -> DeskPilotResult<()>;
    async fn wait(&self, duration: Duration) -> DeskPilotResult<()>;
    /// Captures the screen and returns the artifact path.
    async fn screenshot(&self, filename: Option<&str>) -> DeskPilotResult<String>;
}
