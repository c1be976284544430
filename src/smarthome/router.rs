//! Directive dispatch
//!
//! Each directive runs `classify → warm-up → one domain call → build`. Any
//! error on the way becomes an `ErrorResponse`; nothing is re-raised to the
//! caller.

use std::sync::Arc;

use chrono::Utc;

use super::directive::{ControlRequest, Directive, DirectiveKind, Scope};
use super::resolver::{self, SceneTrigger};
use super::response::{self, ErrorType, EventEndpoint, ResponseEnvelope};
use crate::backend::Backend;
use crate::session::SessionContext;
use crate::{Error, Result};

/// Result of routing one directive
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    /// A protocol envelope to return
    Respond(Box<ResponseEnvelope>),
    /// `ReportState` target is not in the backend's status listing
    NothingToReport,
}

impl RouteOutcome {
    fn respond(envelope: ResponseEnvelope) -> Self {
        Self::Respond(Box::new(envelope))
    }

    /// The envelope, if there is one
    #[must_use]
    pub fn envelope(&self) -> Option<&ResponseEnvelope> {
        match self {
            Self::Respond(envelope) => Some(envelope),
            Self::NothingToReport => None,
        }
    }
}

/// Routes device directives to the backend and builds the reply
#[derive(Clone)]
pub struct SmartHomeRouter {
    backend: Arc<dyn Backend>,
}

impl SmartHomeRouter {
    /// Create a router over a backend
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Route a directive, never failing
    pub async fn route(&self, directive: &Directive, ctx: &SessionContext) -> RouteOutcome {
        let namespace = directive.header.namespace.as_str();
        let name = directive.header.name.as_str();
        tracing::info!(namespace, name, endpoint_id = ?directive.endpoint_id(), "directive received");

        let kind = directive.kind();
        tracing::debug!(?kind, "directive classified");

        let result = match kind {
            DirectiveKind::Discover => self.discover(ctx).await,
            DirectiveKind::ReportState => self.report_state(directive, ctx).await,
            DirectiveKind::Control(request) => self.control(directive, &request, ctx).await,
            DirectiveKind::ActivateScene => self.activate_scene(directive, ctx).await,
            DirectiveKind::Unsupported => Err(Error::InvalidDirective(format!(
                "unsupported directive {namespace}.{name}"
            ))),
        };

        match result {
            Ok(outcome) => {
                tracing::debug!(namespace, name, "response built");
                outcome
            }
            Err(e) => {
                let kind = ErrorType::from(&e);
                if kind == ErrorType::BridgeUnreachable || kind == ErrorType::InternalError {
                    tracing::error!(namespace, name, error = %e, "directive failed");
                } else {
                    tracing::warn!(namespace, name, error = %e, "directive rejected");
                }
                RouteOutcome::respond(response::error(
                    directive.header.correlation_token.as_deref(),
                    echo_endpoint(directive),
                    kind,
                    &e.to_string(),
                ))
            }
        }
    }

    async fn discover(&self, ctx: &SessionContext) -> Result<RouteOutcome> {
        let session = self.backend.warm_up(ctx).await?;
        let records = self.backend.list_devices(&session).await?;

        let endpoints = resolver::resolve(&records);
        tracing::info!(
            devices = records.len(),
            endpoints = endpoints.len(),
            "discovery complete"
        );
        Ok(RouteOutcome::respond(response::discovery(endpoints)))
    }

    async fn report_state(&self, directive: &Directive, ctx: &SessionContext) -> Result<RouteOutcome> {
        let correlation_token = directive.require_correlation_token()?;
        let endpoint_id = directive.require_endpoint_id()?;

        let session = self.backend.warm_up(ctx).await?;
        let states = self.backend.read_device_status(&session).await?;

        let Some(state) = states.iter().find(|s| s.id == endpoint_id) else {
            tracing::debug!(endpoint_id, "no state for endpoint");
            return Ok(RouteOutcome::NothingToReport);
        };

        Ok(RouteOutcome::respond(response::state_report(
            correlation_token,
            endpoint(directive, endpoint_id),
            state,
            Utc::now(),
        )))
    }

    async fn control(
        &self,
        directive: &Directive,
        request: &ControlRequest,
        ctx: &SessionContext,
    ) -> Result<RouteOutcome> {
        let endpoint_id = directive.require_endpoint_id()?;
        if SceneTrigger::from_endpoint_id(endpoint_id).is_some() {
            return Err(Error::NotFound(format!(
                "scene {endpoint_id} has no position or mode"
            )));
        }
        let action = request.action()?;
        let scenario = action.scenario();

        let session = self.backend.warm_up(ctx).await?;
        if !session.has_shutter(endpoint_id) {
            return Err(Error::NotFound(format!("no shutter with endpoint id {endpoint_id}")));
        }
        self.backend.trigger_scenario(&session, scenario).await?;
        tracing::info!(endpoint_id, %scenario, "scenario triggered");

        Ok(RouteOutcome::respond(response::control(
            directive.header.correlation_token.as_deref(),
            endpoint(directive, endpoint_id),
        )))
    }

    async fn activate_scene(&self, directive: &Directive, ctx: &SessionContext) -> Result<RouteOutcome> {
        let correlation_token = directive.require_correlation_token()?;
        let scene = directive.scene()?;
        let scenario = scene.action().scenario();

        let session = self.backend.warm_up(ctx).await?;
        self.backend.trigger_scenario(&session, scenario).await?;
        tracing::info!(endpoint_id = scene.endpoint_id(), %scenario, "scene activated");

        Ok(RouteOutcome::respond(response::activation_started(
            correlation_token,
            endpoint(directive, scene.endpoint_id()),
            Utc::now(),
        )))
    }
}

fn endpoint(directive: &Directive, endpoint_id: &str) -> EventEndpoint {
    EventEndpoint {
        scope: directive_scope(directive),
        endpoint_id: endpoint_id.to_string(),
    }
}

fn echo_endpoint(directive: &Directive) -> Option<EventEndpoint> {
    directive.endpoint_id().map(|id| endpoint(directive, id))
}

fn directive_scope(directive: &Directive) -> Option<Scope> {
    directive.endpoint.as_ref().and_then(|e| e.scope.clone())
}
