//! Host entry point
//!
//! Takes a raw event, decides whether it is a device directive or a
//! conversational request, and always answers with a JSON value.

use serde::Serialize;
use serde_json::{json, Value};
use tracing::Instrument;

use crate::session::SessionContext;
use crate::skill::{SkillHandler, SkillRequestEnvelope};
use crate::smarthome::{DirectiveEnvelope, RouteOutcome, SmartHomeRouter};

/// Host-provided invocation metadata
#[derive(Debug, Clone, Default)]
pub struct InvocationContext {
    /// Host request id
    pub request_id: Option<String>,
}

/// Classifies events and dispatches them to the directive router or the skill
#[derive(Clone)]
pub struct InvocationHandler {
    router: SmartHomeRouter,
    skill: SkillHandler,
}

impl InvocationHandler {
    #[must_use]
    pub const fn new(router: SmartHomeRouter, skill: SkillHandler) -> Self {
        Self { router, skill }
    }

    /// Handle one event
    ///
    /// Protocol-level failures come back as protocol responses. Only an event
    /// that is neither a directive nor a skill request gets the 500 fallback.
    pub async fn handle(&self, event: Value, ctx: InvocationContext) -> Value {
        let span = tracing::info_span!(
            "invocation",
            request_id = ctx.request_id.as_deref().unwrap_or("-")
        );
        self.dispatch(event, ctx).instrument(span).await
    }

    async fn dispatch(&self, event: Value, ctx: InvocationContext) -> Value {
        if event.get("directive").is_some() {
            let envelope: DirectiveEnvelope = match serde_json::from_value(event) {
                Ok(envelope) => envelope,
                Err(e) => {
                    tracing::error!(error = %e, "malformed directive");
                    return internal_error();
                }
            };
            let session = SessionContext::for_bearer_token(envelope.directive.bearer_token())
                .with_request_id(ctx.request_id);

            return match self.router.route(&envelope.directive, &session).await {
                RouteOutcome::Respond(response) => to_json(&response),
                RouteOutcome::NothingToReport => json!({}),
            };
        }

        if event.pointer("/request/type").is_some() {
            let envelope: SkillRequestEnvelope = match serde_json::from_value(event) {
                Ok(envelope) => envelope,
                Err(e) => {
                    tracing::error!(error = %e, "malformed skill request");
                    return internal_error();
                }
            };
            let session = envelope
                .user_id()
                .map_or_else(SessionContext::default, SessionContext::for_identity)
                .with_request_id(ctx.request_id);

            return to_json(&self.skill.handle(&envelope, &session).await);
        }

        tracing::error!("event is neither a directive nor a skill request");
        internal_error()
    }
}

/// Generic host-level failure
#[must_use]
pub fn internal_error() -> Value {
    json!({
        "statusCode": 500,
        "body": json!({ "message": "Internal Server Error" }).to_string(),
    })
}

fn to_json<T: Serialize>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to serialize response");
        internal_error()
    })
}
