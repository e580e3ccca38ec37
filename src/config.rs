use crate::schema::FieldSchema;
use anyhow::{Context, Result};
use reqwest::Url;
use std::{env, path::PathBuf, time::Duration};

/// Name attribute of the device configuration form.
pub const DEFAULT_FORM_NAME: &str = "esp32cfg";

/// Application configuration loaded from the environment
#[derive(Clone, Debug)]
pub struct AppConfig {
    /// Page and form the submission interceptor is wired to
    pub form: FormConfig,

    /// HTTP client settings for talking to the device
    pub device: DeviceConfig,
}

#[derive(Clone, Debug)]
pub struct FormConfig {
    pub page_url: Url,
    pub name: String,
    pub action: String,
    pub schema_path: Option<PathBuf>,
}

#[derive(Clone, Debug, Default)]
pub struct DeviceConfig {
    pub request_timeout: Option<Duration>,
}

impl AppConfig {
    /// Load the configuration from environment variables
    pub fn load() -> Result<Self> {
        Self::load_with(|key| env::var(key).ok())
    }

    /// Load the configuration through `lookup`, which returns the value of a variable if set
    pub fn load_with(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let form = FormConfig::load(&lookup)?;
        let device = DeviceConfig::load(&lookup)?;

        Ok(Self { form, device })
    }
}

impl FormConfig {
    fn load(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let page_url = lookup("ESP32CFG_PAGE_URL")
            .unwrap_or_else(|| "http://192.168.4.1/".to_string());
        let page_url =
            Url::parse(&page_url).context("failed to parse ESP32CFG_PAGE_URL: invalid url")?;

        let name = lookup("ESP32CFG_FORM_NAME").unwrap_or_else(|| DEFAULT_FORM_NAME.to_string());
        let action = lookup("ESP32CFG_FORM_ACTION").unwrap_or_else(|| "/conf".to_string());
        let schema_path = lookup("ESP32CFG_SCHEMA_PATH").map(PathBuf::from);

        Ok(Self {
            page_url,
            name,
            action,
            schema_path,
        })
    }

    pub fn schema(&self) -> Result<FieldSchema> {
        match &self.schema_path {
            Some(path) => FieldSchema::from_json_file(path),
            None => Ok(FieldSchema::esp32cfg()),
        }
    }
}

impl DeviceConfig {
    fn load(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let request_timeout = lookup("ESP32CFG_REQUEST_TIMEOUT_SECS")
            .map(|secs| {
                secs.parse::<u64>()
                    .context("failed to parse ESP32CFG_REQUEST_TIMEOUT_SECS: invalid format")
            })
            .transpose()?
            .map(Duration::from_secs);

        Ok(Self { request_timeout })
    }
}
