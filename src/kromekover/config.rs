use serde::Serialize;

/// Browser identity presented to pages
///
/// Serialized into `window.__stealthProfile`, which every evasion script reads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StealthProfile {
    pub accept_language: String,
    pub platform: String,
    pub language: String,
    pub languages: Vec<String>,
    pub screen_width: u32,
    pub screen_height: u32,
    pub webgl_vendor: String,
    pub webgl_renderer: String,
    pub hardware_concurrency: u32,
    /// Hex seed for canvas noise, fresh per page
    pub session_seed: String,
}

impl Default for StealthProfile {
    fn default() -> Self {
        Self {
            accept_language: "en-US,en;q=0.9".to_string(),
            platform: "Win32".to_string(),
            language: "en-US".to_string(),
            languages: vec!["en-US".to_string(), "en".to_string()],
            screen_width: 1920,
            screen_height: 1080,
            webgl_vendor: "Intel Inc.".to_string(),
            webgl_renderer: "Intel(R) UHD Graphics".to_string(),
            hardware_concurrency: 8,
            session_seed: String::new(),
        }
    }
}

impl StealthProfile {
    /// Default profile with a random canvas seed
    #[must_use]
    pub fn with_random_seed() -> Self {
        let seed: [u8; 16] = rand::random();
        Self {
            session_seed: hex::encode(seed),
            ..Self::default()
        }
    }

    /// `window.__stealthProfile = {...};`
    #[must_use]
    pub fn bootstrap_script(&self) -> String {
        let json = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        format!("window.__stealthProfile = {json};")
    }
}
