//! Method implementations for `Config`.

use serde_json::{Map, Value};

use super::{Config, SearchEngine, SettingError, defaults};
use crate::error::{Result, StoreError};

impl Config {
    /// Default settings for a new profile called `name`.
    pub fn for_profile(name: &str) -> Self {
        Self {
            current_profile: name.to_string(),
            ..Self::default()
        }
    }

    pub fn profile_name(&self) -> &str {
        &self.current_profile
    }

    /// True for profiles protected by a password.
    pub fn is_encrypted(&self) -> bool {
        self.encrypted
    }

    /// True when an encrypted profile can be written back, i.e. its key is
    /// still held from the unlock.
    pub fn can_reencrypt(&self) -> bool {
        self.encrypted && self.unlock_key.is_some()
    }

    /// File names of collections that failed to load and came back as their
    /// defaults. [`ProfileStore::save_profile`](crate::ProfileStore::save_profile)
    /// does not write these.
    pub fn unreadable_collections(&self) -> impl Iterator<Item = &str> + '_ {
        self.unreadable_collections.iter().copied()
    }

    /// Forget the key of an unlocked encrypted profile. Later saves become
    /// no-ops until the profile is loaded again.
    pub fn forget_unlock_key(&mut self) {
        self.unlock_key = None;
    }

    // ── Setters ────────────────────────────────────────────────────────────

    pub fn set_home_page(&mut self, url: &str) -> Result<(), SettingError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SettingError::EmptyHomePage);
        }
        self.home_page = url.to_string();
        Ok(())
    }

    /// Select one of the configured search engines.
    pub fn set_search_engine(&mut self, name: &str) -> Result<(), SettingError> {
        if !self.search_engines.contains_key(name) {
            return Err(SettingError::UnknownSearchEngine(name.to_string()));
        }
        self.default_search_engine = name.to_string();
        Ok(())
    }

    pub fn set_language(&mut self, code: &str) -> Result<(), SettingError> {
        self.check_language(code)?;
        self.current_language = code.to_string();
        Ok(())
    }

    pub fn set_translate_target(&mut self, code: &str) -> Result<(), SettingError> {
        self.check_language(code)?;
        self.translate_target_lang = code.to_string();
        Ok(())
    }

    fn check_language(&self, code: &str) -> Result<(), SettingError> {
        if self.supported_languages.contains_key(code) {
            Ok(())
        } else {
            Err(SettingError::UnsupportedLanguage(code.to_string()))
        }
    }

    pub fn set_window_size(&mut self, width: u32, height: u32) -> Result<(), SettingError> {
        if width == 0 || height == 0 {
            return Err(SettingError::InvalidWindowSize(width, height));
        }
        self.window_size = [width, height];
        Ok(())
    }

    /// Clamped to `0.0..=1.0`; NaN resets to the default.
    pub fn set_background_opacity(&mut self, opacity: f32) {
        self.background_opacity = if opacity.is_nan() {
            defaults::background_opacity()
        } else {
            opacity.clamp(0.0, 1.0)
        };
    }

    /// `None` clears the background image.
    pub fn set_background_image(&mut self, path: Option<&str>) {
        self.background_image = path.map(str::trim).filter(|p| !p.is_empty()).map(String::from);
    }

    // ── Navigation ─────────────────────────────────────────────────────────

    /// The engine selected by `DEFAULT_SEARCH_ENGINE`, or plain DuckDuckGo if
    /// that name is not configured.
    pub fn search_engine(&self) -> SearchEngine {
        self.search_engines
            .get(&self.default_search_engine)
            .cloned()
            .unwrap_or_else(defaults::fallback_search_engine)
    }

    /// Search URL for `query` on the selected engine.
    pub fn search_url(&self, query: &str) -> String {
        let engine = self.search_engine();
        let template = if engine.lang_param {
            engine.url.replace("{lang}", &self.current_language)
        } else {
            engine.url
        };
        let encoded: String = url::form_urlencoded::byte_serialize(query.as_bytes()).collect();
        template.replacen("{}", &encoded, 1)
    }

    /// Resolve address-bar input: anything that looks like a host name (has a
    /// dot, no spaces) is opened directly, with `https://` added if no scheme
    /// is given; everything else is searched.
    pub fn navigation_target(&self, input: &str) -> String {
        let input = input.trim();
        if input.contains('.') && !input.contains(' ') {
            if input.starts_with("http://") || input.starts_with("https://") {
                input.to_string()
            } else {
                format!("https://{input}")
            }
        } else {
            self.search_url(input)
        }
    }

    // ── Settings-map conversion ────────────────────────────────────────────

    /// Serialize the persisted fields into a key -> value map.
    pub fn to_settings(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            other => Err(StoreError::Profile(format!(
                "settings serialized to {other} instead of a map"
            ))),
        }
    }

    /// Build a config from stored settings. Keys this struct does not know
    /// (such as the `session` blob sharing the scope) are ignored; missing
    /// keys take their defaults.
    pub fn from_settings(settings: Map<String, Value>) -> Result<Self> {
        Ok(serde_json::from_value(Value::Object(settings))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.home_page, "https://duckduckgo.com");
        assert_eq!(config.default_search_engine, "DuckDuckGo");
        assert_eq!(config.search_engines.len(), 10);
        assert_eq!(config.window_size, [1280, 720]);
        assert!(config.save_session);
        assert!(!config.webgl_enabled);
        assert_eq!(config.background_opacity, 0.5);
        assert_eq!(config.current_profile, "default");
        assert_eq!(config.apps.len(), 3);
        assert!(!config.is_encrypted());
    }

    #[test]
    fn test_settings_keys_are_screaming_case() {
        let map = Config::for_profile("work").to_settings().unwrap();
        assert_eq!(map["CURRENT_PROFILE"], "work");
        assert_eq!(map["DARK_THEME"], false);
        assert_eq!(map["WINDOW_SIZE"], serde_json::json!([1280, 720]));
        assert!(map.contains_key("OPENAI_API_KEY"));
        // Collections and unlock state are not settings.
        assert!(!map.contains_key("BOOKMARKS"));
        assert!(!map.contains_key("APPS"));
        assert!(!map.keys().any(|k| k.contains("UNLOCK") || k.contains("ENCRYPTED")));
    }

    #[test]
    fn test_from_settings_fills_missing_keys_and_ignores_unknown() {
        let mut map = Map::new();
        map.insert("HOME_PAGE".into(), "https://example.org".into());
        map.insert("DARK_THEME".into(), true.into());
        map.insert("session".into(), "{\"tabs\":[]}".into());

        let config = Config::from_settings(map).unwrap();
        assert_eq!(config.home_page, "https://example.org");
        assert!(config.dark_theme);
        assert_eq!(config.current_language, "en");
        assert_eq!(config.search_engines.len(), 10);
    }

    #[test]
    fn test_setters_validate() {
        let mut config = Config::default();

        assert!(config.set_search_engine("Brave").is_ok());
        assert_eq!(config.default_search_engine, "Brave");
        assert_eq!(
            config.set_search_engine("AltaVista"),
            Err(SettingError::UnknownSearchEngine("AltaVista".into()))
        );
        assert_eq!(config.default_search_engine, "Brave");

        assert!(config.set_language("tr").is_ok());
        assert!(config.set_language("xx").is_err());
        assert_eq!(config.current_language, "tr");

        assert!(config.set_window_size(0, 600).is_err());
        assert!(config.set_home_page("   ").is_err());

        config.set_background_opacity(3.0);
        assert_eq!(config.background_opacity, 1.0);
        config.set_background_opacity(f32::NAN);
        assert_eq!(config.background_opacity, 0.5);
    }

    #[test]
    fn test_search_url_expands_language_and_query() {
        let mut config = Config::default();
        config.set_language("de").unwrap();
        assert_eq!(
            config.search_url("rust lang"),
            "https://duckduckgo.com/?q=rust+lang&kl=de"
        );

        config.set_search_engine("Baidu").unwrap();
        assert_eq!(config.search_url("a&b"), "https://www.baidu.com/s?wd=a%26b");
    }

    #[test]
    fn test_unknown_engine_falls_back_to_duckduckgo() {
        let mut config = Config::default();
        config.default_search_engine = "Gone".into();
        assert_eq!(config.search_url("x"), "https://duckduckgo.com/?q=x");
    }

    #[test]
    fn test_navigation_target() {
        let config = Config::default();
        assert_eq!(config.navigation_target("example.org"), "https://example.org");
        assert_eq!(
            config.navigation_target("http://example.org"),
            "http://example.org"
        );
        assert_eq!(
            config.navigation_target("what is rust"),
            "https://duckduckgo.com/?q=what+is+rust&kl=en"
        );
    }
}
