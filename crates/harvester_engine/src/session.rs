use std::time::Duration;

use crate::{ContextHandle, RenderError};

/// Capability interface over one rendering engine instance.
///
/// A session hosts any number of independently navigable browsing contexts.
/// Implementations must be shareable across tasks; the coordinator bounds how
/// many contexts are open at once.
#[async_trait::async_trait]
pub trait RenderSession: Send + Sync {
    /// Open a fresh context. Failure here is fatal to a harvest run.
    async fn open_context(&self) -> Result<ContextHandle, RenderError>;

    async fn navigate(&self, handle: ContextHandle, url: &str) -> Result<(), RenderError>;

    /// Serialized DOM of the context's current state.
    async fn snapshot(&self, handle: ContextHandle) -> Result<String, RenderError>;

    async fn scroll_to_bottom(&self, handle: ContextHandle) -> Result<(), RenderError>;

    async fn close_context(&self, handle: ContextHandle) -> Result<(), RenderError>;

    /// Wait up to `timeout` for `selector` to match. `Ok(false)` means the
    /// wait expired, which is not an error.
    async fn wait_for_element(
        &self,
        handle: ContextHandle,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, RenderError>;
}
