use crate::{
    config_client::ConfigClient,
    dom::{Document, ListenerFuture, SubmitEvent, SubmitListener},
    error::SubmitError,
};
use log::{debug, error, info};
use serde_json::Value;
use std::{
    future::Future,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

/// Submission interceptor of the device configuration form.
///
/// Every submission is handled independently: there is no de-duplication of
/// rapid resubmissions and no cancellation of requests still in flight.
pub struct FormSubmitHandler<C> {
    client: Arc<C>,
    submissions: AtomicU64,
}

impl<C> FormSubmitHandler<C>
where
    C: ConfigClient + Send + Sync + 'static,
{
    pub fn new(client: C) -> Arc<Self> {
        Arc::new(Self {
            client: Arc::new(client),
            submissions: AtomicU64::new(0),
        })
    }

    /// Attaches the interceptor to the first form named `form_name`.
    ///
    /// Returns `false` without raising an error if there is no such form.
    pub fn initialize(self: &Arc<Self>, document: &mut Document, form_name: &str) -> bool {
        let Some(form) = document.query_form_by_name(form_name).cloned() else {
            debug!("no form named {form_name:?}, submit handler not attached");
            return false;
        };

        let listener: Arc<dyn SubmitListener> = self.clone();
        match document.add_submit_listener(&form, listener) {
            Ok(()) => {
                debug!("submit handler attached to form {form_name:?}");
                true
            }
            Err(e) => {
                debug!("submit handler not attached: {e:#}");
                false
            }
        }
    }

    /// Intercepts a submission of the form.
    ///
    /// The default navigation is prevented before this returns. The returned
    /// future posts the form data, logs the outcome and yields it.
    pub fn on_submit(
        &self,
        event: &mut SubmitEvent,
    ) -> impl Future<Output = Result<Value, SubmitError>> + Send + use<C> {
        event.prevent_default();

        let cnt = self.submissions.fetch_add(1, Ordering::Relaxed);
        let form = event.current_target();
        let url = form.action.clone();
        let fields = form.form_data();
        let client = self.client.clone();

        info!("#{cnt} on_submit() to {url}");

        async move {
            let result = client.submit_config(url, fields).await;

            match &result {
                Ok(response) => info!("#{cnt} response: {response}"),
                Err(e) => error!("#{cnt} submit failed: {e}"),
            }

            result
        }
    }
}

impl<C> SubmitListener for FormSubmitHandler<C>
where
    C: ConfigClient + Send + Sync + 'static,
{
    fn handle_submit(&self, event: &mut SubmitEvent) -> Option<ListenerFuture> {
        let submission = self.on_submit(event);

        Some(Box::pin(async move {
            // outcome is already logged by on_submit
            let _ = submission.await;
        }))
    }
}

#[cfg(all(test, feature = "mock"))]
mod tests {
    use super::*;
    use crate::{
        dom::{FormControl, FormElement},
        form::FormFields,
    };
    use mockall_double::double;
    use reqwest::{StatusCode, Url};
    use serde_json::json;

    #[double]
    use crate::config_client::ConfigClient;

    fn document_with_form(name: &str) -> Document {
        let page_url = Url::parse("http://192.168.4.1/").unwrap();
        let mut document = Document::new(page_url.clone());
        document.append_form(
            FormElement::new(Some(name), "/conf", &page_url)
                .unwrap()
                .with_control(FormControl::number("port", "8080"))
                .with_control(FormControl::checkbox("v4dhcp", true)),
        );
        document
    }

    #[tokio::test]
    async fn submit_posts_form_data_to_action() {
        let mut client_mock = ConfigClient::default();
        client_mock
            .expect_submit_config()
            .withf(|url, fields| {
                url.as_str() == "http://192.168.4.1/conf"
                    && *fields == FormFields::from_entries([("port", "8080"), ("v4dhcp", "on")])
            })
            .times(1)
            .returning(|_, _| Box::pin(async { Ok(json!({ "status": "ok" })) }));

        let handler = FormSubmitHandler::new(client_mock);
        let document = document_with_form("esp32cfg");
        let mut event = SubmitEvent::new(document.forms()[0].clone());

        let result = handler.on_submit(&mut event).await;

        assert!(event.default_prevented());
        assert_eq!(result.unwrap(), json!({ "status": "ok" }));
    }

    #[tokio::test]
    async fn failed_submit_is_returned_after_logging() {
        let mut client_mock = ConfigClient::default();
        client_mock.expect_submit_config().returning(|_, _| {
            Box::pin(async {
                Err(SubmitError::Status {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "IPv4 mask error: bits must be between 0..30".to_string(),
                })
            })
        });

        let handler = FormSubmitHandler::new(client_mock);
        let document = document_with_form("esp32cfg");
        let mut event = SubmitEvent::new(document.forms()[0].clone());

        let err = handler.on_submit(&mut event).await.unwrap_err();

        assert!(event.default_prevented());
        assert_eq!(err.to_string(), "IPv4 mask error: bits must be between 0..30");
    }

    #[tokio::test]
    async fn initialize_attaches_to_named_form_only() {
        let client_mock = ConfigClient::default();
        let handler = FormSubmitHandler::new(client_mock);

        let mut document = document_with_form("other");
        assert!(!handler.initialize(&mut document, "esp32cfg"));

        let dispatch = document.submit("other").unwrap();
        assert!(!dispatch.default_prevented);
        assert!(dispatch.pending.is_empty());
    }

    #[tokio::test]
    async fn dispatch_through_document_prevents_navigation() {
        let mut client_mock = ConfigClient::default();
        client_mock
            .expect_submit_config()
            .times(2)
            .returning(|_, _| Box::pin(async { Ok(json!({})) }));

        let handler = FormSubmitHandler::new(client_mock);
        let mut document = document_with_form("esp32cfg");
        assert!(handler.initialize(&mut document, "esp32cfg"));

        let first = document.submit("esp32cfg").unwrap();
        let second = document.submit("esp32cfg").unwrap();

        assert!(first.default_prevented);
        assert!(first.navigation.is_none());
        assert_eq!(first.pending.len(), 1);
        assert_eq!(second.pending.len(), 1);

        first.settle().await.unwrap();
        second.settle().await.unwrap();
    }
}
