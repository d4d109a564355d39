//! Configuration for the Ingestion Service

use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::{IngestionError, Result};
use crate::schemas::{PlaceCategory, SourceApi};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    // Database
    pub database_url: Option<String>,

    // HTTP
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    // Pacing (milliseconds)
    #[serde(default = "default_page_delay")]
    pub page_delay_ms: u64,
    #[serde(default = "default_source_delay")]
    pub source_delay_ms: u64,

    // Pagination
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,
    #[serde(default = "default_max_pages")]
    pub default_max_pages: u32,

    // Korea Tourism Organization pet travel API
    pub kor_pet_tour_api_key: Option<String>,
    #[serde(default = "default_kor_pet_tour_base")]
    pub kor_pet_tour_base_url: String,
    #[serde(default = "default_kor_pet_tour_endpoint")]
    pub kor_pet_tour_endpoint: String,
    #[serde(default = "default_mobile_os")]
    pub mobile_os: String,
    #[serde(default = "default_mobile_app")]
    pub mobile_app: String,
    pub kor_pet_tour_default_category: Option<PlaceCategory>,

    // data.go.kr standard dataset
    pub data_go_kr_api_key: Option<String>,
    #[serde(default = "default_data_go_kr_base")]
    pub data_go_kr_base_url: String,
    #[serde(default = "default_data_go_kr_endpoint")]
    pub data_go_kr_endpoint: String,
    pub data_go_kr_default_category: Option<PlaceCategory>,

    // Seoul open API
    pub seoul_api_key: Option<String>,
    #[serde(default = "default_seoul_base")]
    pub seoul_base_url: String,
    #[serde(default = "default_seoul_endpoint")]
    pub seoul_endpoint: String,
    /// e.g. `hospital` for a veterinary-clinic dataset with no category column
    pub seoul_default_category: Option<PlaceCategory>,
}

fn default_request_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_user_agent() -> String {
    format!("PlaceIngestion/{}", env!("CARGO_PKG_VERSION"))
}

fn default_page_delay() -> u64 {
    500
}

fn default_source_delay() -> u64 {
    1000
}

fn default_page_size() -> u32 {
    100
}

fn default_max_pages() -> u32 {
    10
}

fn default_kor_pet_tour_base() -> String {
    "https://apis.data.go.kr/B551011/KorPetTourService".to_string()
}

fn default_kor_pet_tour_endpoint() -> String {
    "/areaBasedList".to_string()
}

fn default_mobile_os() -> String {
    "ETC".to_string()
}

fn default_mobile_app() -> String {
    "PlaceIngestion".to_string()
}

fn default_data_go_kr_base() -> String {
    "https://api.odcloud.kr/api".to_string()
}

fn default_data_go_kr_endpoint() -> String {
    "/15111389/v1/pet-friendly-facilities".to_string()
}

fn default_seoul_base() -> String {
    "https://openapi.seoul.go.kr:8088".to_string()
}

fn default_seoul_endpoint() -> String {
    "/LOCALDATA_020301".to_string()
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load .env file
        dotenvy::dotenv().ok();

        // Build config from environment
        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    .try_parsing(true)
            )
            .build()?;

        let cfg: Config = config.try_deserialize()?;
        Ok(cfg)
    }

    /// Validates the configuration
    pub fn validate(&self) -> Result<()> {
        if self.default_page_size == 0 {
            return Err(invalid("DEFAULT_PAGE_SIZE must be greater than zero"));
        }
        if self.default_max_pages == 0 {
            return Err(invalid("DEFAULT_MAX_PAGES must be greater than zero"));
        }
        if self.request_timeout_secs == 0 {
            return Err(invalid("REQUEST_TIMEOUT_SECS must be greater than zero"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn page_delay(&self) -> Duration {
        Duration::from_millis(self.page_delay_ms)
    }

    pub fn source_delay(&self) -> Duration {
        Duration::from_millis(self.source_delay_ms)
    }

    /// Credential configured for a source, if any
    pub fn credential(&self, api: SourceApi) -> Option<&str> {
        let key = match api {
            SourceApi::KorPetTour => self.kor_pet_tour_api_key.as_deref(),
            SourceApi::DataGoKr => self.data_go_kr_api_key.as_deref(),
            SourceApi::SeoulOpenApi => self.seoul_api_key.as_deref(),
        };
        key.map(str::trim).filter(|k| !k.is_empty())
    }

    /// Builds the configuration for one source.
    /// Fails with `SourceNotConfigured` when the source has no credential.
    pub fn source_config(&self, api: SourceApi) -> Result<SourceConfig> {
        let credential = self
            .credential(api)
            .ok_or_else(|| IngestionError::SourceNotConfigured(api.to_string()))?;

        let (base_url, endpoint, default_category) = match api {
            SourceApi::KorPetTour => (
                &self.kor_pet_tour_base_url,
                &self.kor_pet_tour_endpoint,
                self.kor_pet_tour_default_category,
            ),
            SourceApi::DataGoKr => (
                &self.data_go_kr_base_url,
                &self.data_go_kr_endpoint,
                self.data_go_kr_default_category,
            ),
            SourceApi::SeoulOpenApi => (&self.seoul_base_url, &self.seoul_endpoint, self.seoul_default_category),
        };

        let mut source = SourceConfig::new(api, base_url, endpoint, credential)
            .with_page_size(self.default_page_size)
            .with_max_pages(self.default_max_pages);

        if api == SourceApi::KorPetTour {
            source = source.with_client_app(&self.mobile_os, &self.mobile_app);
        }
        if let Some(category) = default_category {
            source = source.with_default_category(category);
        }

        Ok(source)
    }

    /// Every source with a credential, in harvest order
    pub fn source_configs(&self) -> Vec<SourceConfig> {
        SourceApi::ALL
            .into_iter()
            .filter_map(|api| self.source_config(api).ok())
            .collect()
    }

    /// Checks if a persistent database is configured
    pub fn has_database(&self) -> bool {
        self.database_url.is_some()
    }
}

fn invalid(message: &str) -> IngestionError {
    IngestionError::ConfigError(config::ConfigError::Message(message.to_string()))
}

/// Everything needed to page through one upstream source
#[derive(Debug, Clone)]
pub struct SourceConfig {
    pub api: SourceApi,
    pub base_url: String,
    pub endpoint: String,
    /// Already percent-encoded by whoever issued it; sent verbatim
    pub credential: String,
    pub credential_param: String,
    pub page_param: String,
    pub size_param: String,
    pub page_size: u32,
    pub max_pages: u32,
    /// Static query parameters, encoded normally
    pub params: BTreeMap<String, String>,
    /// Client identifiers required by the tour API family
    pub mobile_os: Option<String>,
    pub mobile_app: Option<String>,
    /// Category for items whose payload carries no usable category
    pub default_category: Option<PlaceCategory>,
}

impl SourceConfig {
    /// Creates a source config with the parameter conventions of `api`
    pub fn new(api: SourceApi, base_url: &str, endpoint: &str, credential: &str) -> Self {
        let (credential_param, page_param, size_param, static_params): (&str, &str, &str, &[(&str, &str)]) =
            match api {
                SourceApi::KorPetTour => ("serviceKey", "pageNo", "numOfRows", &[("_type", "json"), ("arrange", "C")][..]),
                SourceApi::DataGoKr => ("serviceKey", "page", "perPage", &[("returnType", "json")][..]),
                SourceApi::SeoulOpenApi => ("KEY", "pIndex", "pSize", &[("Type", "json")][..]),
            };

        Self {
            api,
            base_url: base_url.trim_end_matches('/').to_string(),
            endpoint: endpoint.to_string(),
            credential: credential.to_string(),
            credential_param: credential_param.to_string(),
            page_param: page_param.to_string(),
            size_param: size_param.to_string(),
            page_size: default_page_size(),
            max_pages: default_max_pages(),
            params: static_params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            mobile_os: None,
            mobile_app: None,
            default_category: None,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages;
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_client_app(mut self, mobile_os: &str, mobile_app: &str) -> Self {
        self.mobile_os = Some(mobile_os.to_string());
        self.mobile_app = Some(mobile_app.to_string());
        self
    }

    pub fn with_default_category(mut self, category: PlaceCategory) -> Self {
        self.default_category = Some(category);
        self
    }

    /// Fails before any request when the source cannot be paged at all
    pub fn ensure_usable(&self) -> Result<()> {
        if self.credential.trim().is_empty() {
            return Err(IngestionError::SourceNotConfigured(format!(
                "{}: missing credential",
                self.api
            )));
        }
        if self.base_url.is_empty() {
            return Err(IngestionError::SourceNotConfigured(format!(
                "{}: missing base url",
                self.api
            )));
        }
        if self.page_size == 0 || self.max_pages == 0 {
            return Err(IngestionError::SourceNotConfigured(format!(
                "{}: page size and page ceiling must be positive",
                self.api
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_config() -> Config {
        serde_json::from_value(serde_json::json!({})).unwrap()
    }

    #[test]
    fn test_default_values() {
        let config = empty_config();

        assert_eq!(config.page_delay_ms, 500);
        assert_eq!(config.default_page_size, 100);
        assert_eq!(config.default_max_pages, 10);
        assert_eq!(config.mobile_os, "ETC");
        assert!(!config.has_database());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unconfigured_sources_are_skipped() {
        let mut config = empty_config();
        assert!(config.source_configs().is_empty());
        assert!(matches!(
            config.source_config(SourceApi::DataGoKr),
            Err(IngestionError::SourceNotConfigured(_))
        ));

        config.seoul_api_key = Some("   ".to_string());
        assert!(config.source_configs().is_empty());

        config.kor_pet_tour_api_key = Some("abc%2Bdef".to_string());
        let sources = config.source_configs();
        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].api, SourceApi::KorPetTour);
        assert_eq!(sources[0].credential, "abc%2Bdef");
        assert_eq!(sources[0].mobile_os.as_deref(), Some("ETC"));
    }

    #[test]
    fn test_default_category_from_config() {
        let config: Config = serde_json::from_value(serde_json::json!({
            "seoul_api_key": "k",
            "data_go_kr_api_key": "k",
            "seoul_default_category": "hospital"
        }))
        .unwrap();

        let seoul = config.source_config(SourceApi::SeoulOpenApi).unwrap();
        assert_eq!(seoul.default_category, Some(PlaceCategory::Hospital));

        let data_go_kr = config.source_config(SourceApi::DataGoKr).unwrap();
        assert_eq!(data_go_kr.default_category, None);
    }

    #[test]
    fn test_unknown_default_category_is_rejected() {
        let result: std::result::Result<Config, _> =
            serde_json::from_value(serde_json::json!({"seoul_default_category": "zoo"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_source_conventions() {
        let source = SourceConfig::new(SourceApi::SeoulOpenApi, "https://example.org/", "/svc", "k");
        assert_eq!(source.base_url, "https://example.org");
        assert_eq!(source.page_param, "pIndex");
        assert_eq!(source.params.get("Type").map(String::as_str), Some("json"));
        assert!(source.mobile_app.is_none());
    }

    #[test]
    fn test_validate_rejects_zero_pages() {
        let mut config = empty_config();
        config.default_max_pages = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ensure_usable() {
        let source = SourceConfig::new(SourceApi::DataGoKr, "https://example.org", "/x", "");
        assert!(source.ensure_usable().is_err());

        let source = SourceConfig::new(SourceApi::DataGoKr, "https://example.org", "/x", "key").with_max_pages(0);
        assert!(source.ensure_usable().is_err());

        let source = SourceConfig::new(SourceApi::DataGoKr, "https://example.org", "/x", "key");
        assert!(source.ensure_usable().is_ok());
    }
}
