//! Default value functions for `Config` fields.
//!
//! Used both by `impl Default for Config` and as
//! `#[serde(default = "crate::config::defaults::...")]` so that settings
//! written by older releases, which lack newer keys, still load.

use std::collections::BTreeMap;

use super::SearchEngine;

// ── Primitive helpers ──────────────────────────────────────────────────────

pub fn bool_false() -> bool {
    false
}

pub fn bool_true() -> bool {
    true
}

// ── Navigation ─────────────────────────────────────────────────────────────

pub fn home_page() -> String {
    "https://duckduckgo.com".to_string()
}

pub fn default_search_engine() -> String {
    "DuckDuckGo".to_string()
}

pub fn search_engines() -> BTreeMap<String, SearchEngine> {
    [
        ("DuckDuckGo", "https://duckduckgo.com/?q={}&kl={lang}", true),
        ("Google", "https://www.google.com/search?q={}&hl={lang}", true),
        ("Bing", "https://www.bing.com/search?q={}&setlang={lang}", true),
        ("Yandex", "https://yandex.com/search/?text={}&lang={lang}", true),
        ("Baidu", "https://www.baidu.com/s?wd={}", false),
        ("Naver", "https://search.naver.com/search.naver?query={}", false),
        ("Ecosia", "https://www.ecosia.org/search?q={}", false),
        ("Brave", "https://search.brave.com/search?q={}", false),
        ("Firefox", "https://www.mozilla.org/en-US/firefox/new/?q={}", false),
        ("Yahoo", "https://search.yahoo.com/search?p={}", false),
    ]
    .into_iter()
    .map(|(name, url, lang_param)| {
        (
            name.to_string(),
            SearchEngine {
                url: url.to_string(),
                lang_param,
            },
        )
    })
    .collect()
}

/// Engine used when the configured one is missing from `SEARCH_ENGINES`.
pub fn fallback_search_engine() -> SearchEngine {
    SearchEngine {
        url: "https://duckduckgo.com/?q={}".to_string(),
        lang_param: false,
    }
}

// ── Language ───────────────────────────────────────────────────────────────

pub fn language() -> String {
    "en".to_string()
}

pub fn supported_languages() -> BTreeMap<String, String> {
    [
        ("en", "English"),
        ("es", "Español"),
        ("fr", "Français"),
        ("de", "Deutsch"),
        ("it", "Italiano"),
        ("pt", "Português"),
        ("ru", "Русский"),
        ("zh", "中文"),
        ("ja", "日本語"),
        ("ko", "한국어"),
        ("ar", "العربية"),
        ("hi", "हिन्दी"),
        ("tr", "Türkçe"),
        ("fa", "فارسی"),
        ("ur", "اردو"),
        ("vi", "Tiếng Việt"),
        ("th", "ไทย"),
        ("nl", "Nederlands"),
        ("pl", "Polski"),
        ("uk", "Українська"),
        ("el", "Ελληνικά"),
        ("he", "עברית"),
        ("sv", "Svenska"),
        ("fi", "Suomi"),
        ("da", "Dansk"),
        ("no", "Norsk"),
        ("hu", "Magyar"),
        ("cs", "Čeština"),
        ("ro", "Română"),
        ("id", "Bahasa Indonesia"),
        ("ms", "Bahasa Melayu"),
        ("bn", "বাংলা"),
        ("ta", "தமிழ்"),
        ("te", "తెలుగు"),
        ("mr", "मराठी"),
        ("gu", "ગુજરાતી"),
        ("kn", "ಕನ್ನಡ"),
        ("ml", "മലയാളം"),
        ("pa", "ਪੰਜਾਬੀ"),
    ]
    .into_iter()
    .map(|(code, name)| (code.to_string(), name.to_string()))
    .collect()
}

// ── Engine & window ────────────────────────────────────────────────────────

pub fn user_agent() -> String {
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) \
     Chrome/91.0.4472.124 Safari/537.36"
        .to_string()
}

pub fn window_size() -> [u32; 2] {
    [1280, 720]
}

// ── Privacy ────────────────────────────────────────────────────────────────

pub fn adblock_lists() -> Vec<String> {
    vec![
        "https://easylist.to/easylist/easylist.txt".to_string(),
        "https://easylist.to/easylist/easyprivacy.txt".to_string(),
        "https://pgl.yoyo.org/adservers/serverlist.php?hostformat=hosts&showintro=0&mimetype=plaintext"
            .to_string(),
    ]
}

// ── Appearance & profile ───────────────────────────────────────────────────

pub fn background_opacity() -> f32 {
    0.5
}

pub fn current_profile() -> String {
    crate::validation::DEFAULT_PROFILE.to_string()
}
