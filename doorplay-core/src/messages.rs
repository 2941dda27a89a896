use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    English,
    Hebrew,
}

impl Language {
    /// Directory name fragment used by the instruction image folders.
    pub fn name(self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hebrew => "Hebrew",
        }
    }

    /// Three-letter tag used by the wheel videos.
    pub fn short_tag(self) -> &'static str {
        &self.name()[..3]
    }
}

/// How the participant answers continuation prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputMode {
    #[default]
    Keyboard,
    Joystick,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKey {
    Rest,
    ContinueKeyboard,
    ContinueJoystick,
    FinalScorePrefix,
    FinalScoreSuffix,
}

pub struct MessageCatalog {
    table: HashMap<(Language, MessageKey), &'static str>,
}

impl MessageCatalog {
    fn load_from_static() -> Self {
        use Language::*;
        use MessageKey::*;

        let table = HashMap::from([
            ((English, Rest), "Let's rest a bit.\n"),
            ((English, ContinueKeyboard), "Press the spacebar when you're ready."),
            ((English, ContinueJoystick), "Press the joystick when you're ready."),
            ((English, FinalScorePrefix), "You scored "),
            (
                (English, FinalScoreSuffix),
                "Coins!\n Well done!\n\nThank you for your participation.",
            ),
            ((Hebrew, Rest), "בואו ננוח מעט.\n"),
            ((Hebrew, ContinueKeyboard), "לחצו על הרווח כשאתם מוכנים להמשיך."),
            ((Hebrew, ContinueJoystick), "לחצו על הג'ויסטיק כשאתם מוכנים להמשיך."),
            ((Hebrew, FinalScorePrefix), "צברת "),
            (
                (Hebrew, FinalScoreSuffix),
                "מטבעות\n כל הכבוד!\n\n תודה על השתתפותך בניסוי.",
            ),
        ]);

        Self { table }
    }

    pub fn get(&self, language: Language, key: MessageKey) -> &'static str {
        self.table.get(&(language, key)).copied().unwrap_or_default()
    }

    /// Break screen text shown before sessions after the first main block.
    pub fn rest_message(&self, language: Language, input: InputMode) -> String {
        let prompt = match input {
            InputMode::Keyboard => MessageKey::ContinueKeyboard,
            InputMode::Joystick => MessageKey::ContinueJoystick,
        };
        format!(
            "{}{}",
            self.get(language, MessageKey::Rest),
            self.get(language, prompt)
        )
    }

    pub fn final_summary(&self, language: Language, coins: i64) -> String {
        format!(
            "{}{} {}",
            self.get(language, MessageKey::FinalScorePrefix),
            coins,
            self.get(language, MessageKey::FinalScoreSuffix)
        )
    }
}

#[must_use]
pub fn catalog() -> &'static MessageCatalog {
    static CATALOG: OnceLock<MessageCatalog> = OnceLock::new();
    CATALOG.get_or_init(MessageCatalog::load_from_static)
}
