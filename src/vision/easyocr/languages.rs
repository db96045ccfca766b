//! Language codes and recognition script groups
//!
//! Each supported ISO 639-1 code maps to a script group, and each script
//! group maps to one recognition checkpoint plus its character dictionary.
//! Latin-script languages share a single checkpoint.

/// Languages the service accepts, in the order reported by `/languages`.
pub const SUPPORTED_LANGUAGES: [&str; 10] =
    ["en", "es", "fr", "de", "it", "pt", "ru", "ja", "ko", "zh"];

/// Fallback when a request carries no usable language codes.
pub const DEFAULT_LANGUAGE: &str = "en";

/// Recognition script families, one recognizer checkpoint each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptGroup {
    Latin,
    Cyrillic,
    Japanese,
    Korean,
    ChineseSimplified,
}

impl ScriptGroup {
    /// Checkpoint file name inside the model directory.
    pub fn model_file(&self) -> &'static str {
        match self {
            ScriptGroup::Latin => "latin_g2.onnx",
            ScriptGroup::Cyrillic => "cyrillic_g2.onnx",
            ScriptGroup::Japanese => "japanese_g2.onnx",
            ScriptGroup::Korean => "korean_g2.onnx",
            ScriptGroup::ChineseSimplified => "zh_sim_g2.onnx",
        }
    }

    /// Character dictionary file name inside the model directory.
    pub fn dict_file(&self) -> &'static str {
        match self {
            ScriptGroup::Latin => "latin_char.txt",
            ScriptGroup::Cyrillic => "cyrillic_char.txt",
            ScriptGroup::Japanese => "japanese_char.txt",
            ScriptGroup::Korean => "korean_char.txt",
            ScriptGroup::ChineseSimplified => "zh_sim_char.txt",
        }
    }
}

/// Script group for a supported language code, `None` for unknown codes.
pub fn script_for(lang: &str) -> Option<ScriptGroup> {
    match lang {
        "en" | "es" | "fr" | "de" | "it" | "pt" => Some(ScriptGroup::Latin),
        "ru" => Some(ScriptGroup::Cyrillic),
        "ja" => Some(ScriptGroup::Japanese),
        "ko" => Some(ScriptGroup::Korean),
        "zh" => Some(ScriptGroup::ChineseSimplified),
        _ => None,
    }
}

/// Whether a language code is supported.
pub fn is_supported(lang: &str) -> bool {
    script_for(lang).is_some()
}

/// Drop unsupported codes from a request, falling back to the default
/// language when nothing usable remains. Unsupported codes are filtered
/// silently rather than rejected.
pub fn filter_supported(requested: &[String]) -> Vec<String> {
    let mut filtered: Vec<String> = Vec::new();
    for lang in requested {
        let lang = lang.trim().to_lowercase();
        if is_supported(&lang) && !filtered.contains(&lang) {
            filtered.push(lang);
        }
    }
    if filtered.is_empty() {
        filtered.push(DEFAULT_LANGUAGE.to_string());
    }
    filtered
}

/// Deduplicated script groups needed to cover a set of language codes.
pub fn script_groups_for(languages: &[String]) -> Vec<ScriptGroup> {
    let mut groups = Vec::new();
    for lang in languages {
        if let Some(group) = script_for(lang) {
            if !groups.contains(&group) {
                groups.push(group);
            }
        }
    }
    groups
}
