pub mod config;
pub mod config_client;
pub mod dom;
pub mod error;
pub mod form;
pub mod handler;
pub mod http_client;
pub mod schema;

pub use crate::{
    config::{AppConfig, DEFAULT_FORM_NAME},
    config_client::{ConfigClient, HttpConfigClient},
    dom::{Document, FormControl, FormElement, SubmitDispatch, SubmitEvent},
    error::SubmitError,
    form::FormFields,
    handler::FormSubmitHandler,
    schema::{FieldKind, FieldRule, FieldSchema, NormalizedConfig},
};
