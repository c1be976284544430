//! Conversational custom-skill path
//!
//! Handles launch, first-time setup and the two whole-home voice commands.
//! Backend failures become spoken error messages.

pub mod request;
pub mod speech;

use std::sync::Arc;

pub use request::{SkillIntent, SkillRequestEnvelope};
pub use speech::{Prompts, SkillResponse};

use crate::backend::{Backend, BackendSession, Scenario};
use crate::config::SkillConfig;
use crate::security::SetupTokenService;
use crate::session::SessionContext;

/// Answers custom-skill requests
#[derive(Clone)]
pub struct SkillHandler {
    backend: Arc<dyn Backend>,
    tokens: SetupTokenService,
    config: SkillConfig,
}

impl SkillHandler {
    #[must_use]
    pub fn new(backend: Arc<dyn Backend>, tokens: SetupTokenService, config: SkillConfig) -> Self {
        Self {
            backend,
            tokens,
            config,
        }
    }

    /// Handle one request
    pub async fn handle(&self, envelope: &SkillRequestEnvelope, ctx: &SessionContext) -> SkillResponse {
        let prompts = Prompts::for_locale(envelope.locale_or(self.config.default_locale));
        let intent = envelope.intent();
        tracing::info!(?intent, user_id = ?ctx.identity, "skill request received");

        // Interceptor: warm the backend up for the calling user before the intent runs
        let session = if ctx.identity.is_some() {
            match self.backend.warm_up(ctx).await {
                Ok(session) => Some(session),
                Err(e) => {
                    tracing::error!(user_id = ?ctx.identity, error = %e, "backend warm-up failed");
                    return not_understood(prompts);
                }
            }
        } else {
            None
        };

        match intent {
            SkillIntent::Launch => SkillResponse::speak(speech::plain(prompts.welcome))
                .with_reprompt(speech::plain(prompts.welcome)),
            SkillIntent::SetupEnvironment => self.setup(prompts, ctx).await,
            SkillIntent::OpenShutters => {
                self.run_scenario(session, ctx, Scenario::WakeUp, prompts.opening, prompts.open_failed)
                    .await
            }
            SkillIntent::CloseShutters => {
                self.run_scenario(session, ctx, Scenario::Bedtime, prompts.closing, prompts.close_failed)
                    .await
            }
            SkillIntent::Unhandled(name) => {
                tracing::warn!(request = %name, "unhandled skill request");
                not_understood(prompts)
            }
        }
    }

    async fn setup(&self, prompts: &Prompts, ctx: &SessionContext) -> SkillResponse {
        let Some(identity) = ctx.identity.as_deref() else {
            tracing::warn!("setup requested without a user id");
            return SkillResponse::speak(speech::plain(prompts.setup_failed));
        };

        match self.tokens.obtain_token(identity).await {
            Ok(code) => SkillResponse::speak(speech::setup_instructions(
                prompts,
                &self.config.setup_url,
                &code,
            )),
            Err(e) => {
                tracing::error!(user_id = identity, error = %e, "failed to obtain setup code");
                SkillResponse::speak(speech::plain(prompts.setup_failed))
            }
        }
    }

    async fn run_scenario(
        &self,
        session: Option<BackendSession>,
        ctx: &SessionContext,
        scenario: Scenario,
        success: &str,
        failure: &str,
    ) -> SkillResponse {
        let result = async {
            let session = match session {
                Some(session) => session,
                None => self.backend.warm_up(ctx).await?,
            };
            self.backend.trigger_scenario(&session, scenario).await
        }
        .await;

        match result {
            Ok(()) => {
                tracing::info!(%scenario, "scenario triggered by voice");
                SkillResponse::speak(speech::plain(success))
            }
            Err(e) => {
                tracing::error!(%scenario, error = %e, "scenario failed");
                SkillResponse::speak(speech::plain(failure))
            }
        }
    }
}

/// Catch-all answer, also used when the request cannot be served at all
fn not_understood(prompts: &Prompts) -> SkillResponse {
    SkillResponse::speak(speech::plain(prompts.not_understood))
        .with_reprompt(speech::plain(prompts.not_understood))
}
