//! Ambient per-request context.
//!
//! A [`RequestContext`] is created once per inbound request and made
//! available to everything executing on that request's task — including
//! code reached through async continuations — via a tokio task-local.
//! Task-local scoping gives the two guarantees the audit trail depends
//! on: concurrent requests never observe each other's context, and deeply
//! nested code can look the context up without threading it through every
//! signature.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use ledgerline_entity::audit::model::ANONYMOUS_ACTOR;

tokio::task_local! {
    static CURRENT_CONTEXT: RequestContext;
}

/// Identifying metadata for one inbound request.
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Freshly generated correlation id.
    pub request_id: Uuid,
    /// Resolved principal, or `"anonymous"`.
    pub actor: String,
    /// Client network origin.
    pub ip_address: Option<String>,
    /// Client agent string.
    pub user_agent: Option<String>,
    /// When handling began; used to compute elapsed time.
    pub started_at: DateTime<Utc>,
}

impl RequestContext {
    /// Create a context for a resolved principal.
    pub fn new(
        actor: impl Into<String>,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            actor: actor.into(),
            ip_address,
            user_agent,
            started_at: Utc::now(),
        }
    }

    /// Create a context for an unauthenticated request.
    pub fn anonymous(ip_address: Option<String>, user_agent: Option<String>) -> Self {
        Self::new(ANONYMOUS_ACTOR, ip_address, user_agent)
    }

    /// The context of the task currently executing, if any.
    ///
    /// Returns `None` outside a [`RequestContext::scope`] — callers that
    /// need to log must treat that as the soft-fail path (warn and skip),
    /// never as an error.
    pub fn current() -> Option<RequestContext> {
        CURRENT_CONTEXT.try_with(|ctx| ctx.clone()).ok()
    }

    /// Run `fut` with this context ambiently available.
    pub async fn scope<F>(self, fut: F) -> F::Output
    where
        F: Future,
    {
        CURRENT_CONTEXT.scope(self, fut).await
    }
}
