use crate::{
    error::SubmitError,
    form::FormFields,
    http_client::{RequestEnvelope, handle_json_response},
    schema::FieldSchema,
};
use log::debug;
#[cfg(feature = "mock")]
use mockall::automock;
use reqwest::{Client, Url};
use serde_json::Value;
use trait_variant::make;

#[make(Send)]
#[cfg_attr(feature = "mock", automock)]
pub trait ConfigClient {
    /// Normalize `fields` and POST them as JSON to `url`, returning the parsed response
    async fn submit_config(&self, url: Url, fields: FormFields) -> Result<Value, SubmitError>;
}

/// Posts normalized configs to the device over HTTP.
#[derive(Clone, Debug)]
pub struct HttpConfigClient {
    client: Client,
    schema: FieldSchema,
}

impl HttpConfigClient {
    pub fn new(client: Client, schema: FieldSchema) -> Self {
        Self { client, schema }
    }

    pub fn schema(&self) -> &FieldSchema {
        &self.schema
    }
}

impl ConfigClient for HttpConfigClient {
    async fn submit_config(&self, url: Url, fields: FormFields) -> Result<Value, SubmitError> {
        let config = self.schema.normalize(&fields);
        let envelope = RequestEnvelope::json_post(url, &config)?;
        debug!("POST {}", envelope.url);

        let res = envelope.into_request(&self.client).send().await?;

        handle_json_response(res).await
    }
}
