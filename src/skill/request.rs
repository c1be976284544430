//! Conversational request envelope

use serde::Deserialize;

use crate::locale::Locale;

/// Top-level custom-skill request
#[derive(Debug, Clone, Deserialize)]
pub struct SkillRequestEnvelope {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub session: Option<SkillSession>,
    pub request: SkillRequest,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SkillSession {
    #[serde(default)]
    pub user: Option<SkillUser>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillUser {
    pub user_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillRequest {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub request_id: Option<String>,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub intent: Option<Intent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Intent {
    pub name: String,
}

/// What the user asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkillIntent {
    Launch,
    SetupEnvironment,
    OpenShutters,
    CloseShutters,
    /// Anything else, by request type or intent name
    Unhandled(String),
}

impl SkillRequestEnvelope {
    /// Voice-assistant user id, if the request has a session
    #[must_use]
    pub fn user_id(&self) -> Option<&str> {
        self.session
            .as_ref()
            .and_then(|s| s.user.as_ref())
            .map(|u| u.user_id.as_str())
    }

    /// Request locale, or `fallback` when absent or unsupported
    #[must_use]
    pub fn locale_or(&self, fallback: Locale) -> Locale {
        self.request
            .locale
            .as_deref()
            .and_then(Locale::parse)
            .unwrap_or(fallback)
    }

    #[must_use]
    pub fn intent(&self) -> SkillIntent {
        let intent = self.request.intent.as_ref().map(|i| i.name.as_str());
        match (self.request.kind.as_str(), intent) {
            ("LaunchRequest", _) => SkillIntent::Launch,
            ("IntentRequest", Some("SetupEnvironmentIntent")) => SkillIntent::SetupEnvironment,
            ("IntentRequest", Some("OpenShuttersIntent")) => SkillIntent::OpenShutters,
            ("IntentRequest", Some("CloseShuttersIntent")) => SkillIntent::CloseShutters,
            ("IntentRequest", Some(name)) => SkillIntent::Unhandled(name.to_string()),
            (kind, _) => SkillIntent::Unhandled(kind.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn envelope(request: serde_json::Value) -> SkillRequestEnvelope {
        serde_json::from_value(json!({
            "version": "1.0",
            "session": { "user": { "userId": "amzn1.ask.account.TEST" } },
            "request": request
        }))
        .unwrap()
    }

    #[test]
    fn test_intents() {
        let cases = [
            (json!({ "type": "LaunchRequest" }), SkillIntent::Launch),
            (
                json!({ "type": "IntentRequest", "intent": { "name": "SetupEnvironmentIntent" } }),
                SkillIntent::SetupEnvironment,
            ),
            (
                json!({ "type": "IntentRequest", "intent": { "name": "CloseShuttersIntent" } }),
                SkillIntent::CloseShutters,
            ),
            (
                json!({ "type": "IntentRequest", "intent": { "name": "AMAZON.HelpIntent" } }),
                SkillIntent::Unhandled("AMAZON.HelpIntent".to_string()),
            ),
            (
                json!({ "type": "SessionEndedRequest" }),
                SkillIntent::Unhandled("SessionEndedRequest".to_string()),
            ),
        ];

        for (request, expected) in cases {
            assert_eq!(envelope(request).intent(), expected);
        }
    }

    #[test]
    fn test_user_and_locale() {
        let e = envelope(json!({ "type": "LaunchRequest", "locale": "en-GB" }));
        assert_eq!(e.user_id(), Some("amzn1.ask.account.TEST"));
        assert_eq!(e.locale_or(Locale::DeDe), Locale::EnUs);

        let e = envelope(json!({ "type": "LaunchRequest", "locale": "fr-FR" }));
        assert_eq!(e.locale_or(Locale::DeDe), Locale::DeDe);
    }
}
