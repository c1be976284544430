//! Spoken prompts and SSML responses

use serde::{Deserialize, Serialize};

use crate::locale::Locale;

/// Prompt strings for one locale
#[derive(Debug, Clone, Copy)]
pub struct Prompts {
    pub welcome: &'static str,
    pub setup_intro: &'static str,
    pub setup_repeat: &'static str,
    pub setup_failed: &'static str,
    pub opening: &'static str,
    pub open_failed: &'static str,
    pub closing: &'static str,
    pub close_failed: &'static str,
    pub not_understood: &'static str,
}

const GERMAN: Prompts = Prompts {
    welcome: "Willkommen beim Velux Rolläden Skill! Du kannst mich bitten die Rolläden zu öffnen oder zu schließen. Vor der ersten Verwendung sage bitte: Umgebung einrichten. Was soll ich tun?",
    setup_intro: "Willkommen! Bitte die Web App unter {url} aufrufen und folgenden Token eingeben:",
    setup_repeat: "Um den Token zu wiederholen, sage bitte erneut \"Umgebung einrichten\"",
    setup_failed: "Fehler beim Laden der Konfigurationsdaten!",
    opening: "Die Rolläden werden geöffnet!",
    open_failed: "Beim Öffnen der Rolläden ist ein Fehler aufgetreten.",
    closing: "Die Rolläden werden geschlossen!",
    close_failed: "Beim Schließen der Rolläden ist ein Fehler aufgetreten.",
    not_understood: "Leider habe ich keine Ahnung was du von mir willst.",
};

const ENGLISH: Prompts = Prompts {
    welcome: "Welcome to the Velux roller shutter skill! You can ask me to open or close the shutters. Before first use, please say: set up environment. What should I do?",
    setup_intro: "Welcome! Please open the web app at {url} and enter the following token:",
    setup_repeat: "To hear the token again, say \"set up environment\" once more",
    setup_failed: "Loading the configuration data failed!",
    opening: "Opening the shutters!",
    open_failed: "Something went wrong while opening the shutters.",
    closing: "Closing the shutters!",
    close_failed: "Something went wrong while closing the shutters.",
    not_understood: "Sorry, I have no idea what you want me to do.",
};

impl Prompts {
    #[must_use]
    pub const fn for_locale(locale: Locale) -> &'static Self {
        match locale {
            Locale::DeDe => &GERMAN,
            Locale::EnUs => &ENGLISH,
        }
    }
}

/// Custom-skill response envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillResponse {
    pub version: String,
    pub response: ResponseBody,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    pub output_speech: OutputSpeech,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reprompt: Option<Reprompt>,
    pub should_end_session: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputSpeech {
    #[serde(rename = "type")]
    pub kind: String,
    pub ssml: String,
}

impl OutputSpeech {
    fn ssml(ssml: String) -> Self {
        Self {
            kind: "SSML".to_string(),
            ssml,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reprompt {
    pub output_speech: OutputSpeech,
}

impl SkillResponse {
    /// Speak `ssml` and end the session
    #[must_use]
    pub fn speak(ssml: String) -> Self {
        Self {
            version: "1.0".to_string(),
            response: ResponseBody {
                output_speech: OutputSpeech::ssml(ssml),
                reprompt: None,
                should_end_session: true,
            },
        }
    }

    /// Keep the session open, repeating `ssml` if the user stays silent
    #[must_use]
    pub fn with_reprompt(mut self, ssml: String) -> Self {
        self.response.reprompt = Some(Reprompt {
            output_speech: OutputSpeech::ssml(ssml),
        });
        self.response.should_end_session = false;
        self
    }
}

/// Wrap plain text in `<speak>`
#[must_use]
pub fn plain(text: &str) -> String {
    format!("<speak>{}</speak>", escape(text))
}

/// Setup instructions with the code spelled out
#[must_use]
pub fn setup_instructions(prompts: &Prompts, setup_url: &str, code: &str) -> String {
    let intro = escape(prompts.setup_intro).replace("{url}", &spoken_url(setup_url));
    format!(
        "<speak><p>{intro}</p><break strength='strong'/><p>{}.</p><break strength='strong'/><p>{}</p></speak>",
        spell_out(code),
        escape(prompts.setup_repeat),
    )
}

/// One character at a time, with a strong break after each
#[must_use]
pub fn spell_out(code: &str) -> String {
    code.chars()
        .map(|c| {
            format!(
                "<say-as interpret-as='spell-out'>{}</say-as><break strength='strong'/>",
                escape(&c.to_string())
            )
        })
        .collect()
}

/// Speak the host name as a word and the rest character by character
fn spoken_url(url: &str) -> String {
    match url.split_once('.') {
        Some((host, rest)) => format!(
            "{}<say-as interpret-as='characters'>.{}</say-as>",
            escape(host),
            escape(rest)
        ),
        None => escape(url),
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
