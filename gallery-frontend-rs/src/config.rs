const DEFAULT_API_BASE: &str = if cfg!(feature = "local-backend") {
    "http://localhost:5000"
} else {
    "https://artwork-servar.vercel.app"
};

#[derive(serde::Serialize, serde::Deserialize, tsify::Tsify, Debug, Clone, PartialEq, Eq)]
#[tsify(into_wasm_abi, from_wasm_abi)]
#[serde(rename_all = "camelCase")]
pub struct GalleryConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Emails allowed into the admin pages.
    #[serde(default)]
    pub admin_emails: Vec<String>,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            admin_emails: Vec::new(),
        }
    }
}

impl GalleryConfig {
    /// Parse the comma-separated admin list the build environment provides.
    pub fn with_admin_list(mut self, list: &str) -> Self {
        self.admin_emails = list
            .split(',')
            .map(str::trim)
            .filter(|email| !email.is_empty())
            .map(str::to_string)
            .collect();
        self
    }

    pub fn is_admin(&self, email: &str) -> bool {
        self.admin_emails
            .iter()
            .any(|admin| admin.eq_ignore_ascii_case(email))
    }
}
