use std::collections::HashMap;

/// Context carried by immediate (non-queued) executions.
///
/// Queued jobs run detached from any originating request; immediate
/// invocations happen inside one, and the executor may need its identity
/// and forwarded headers. Opaque to the dispatch engine itself.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Authenticated user on whose behalf the request runs.
    pub user: Option<String>,

    /// Request headers forwarded to the executor.
    pub headers: HashMap<String, String>,
}

impl RequestContext {
    /// Create an empty request context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the authenticated user.
    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Add a forwarded header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}
