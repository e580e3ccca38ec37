use anyhow::{Context, Result};
use env_logger::{Builder, Env, Target};
use esp32cfg_form::{
    AppConfig, Document, FormElement, FormFields, FormSubmitHandler, HttpConfigClient,
    http_client::device_client,
};
use log::{error, info};
use std::io::Write;
use tokio::io::AsyncReadExt;

#[tokio::main]
async fn main() {
    log_panics::init();

    let mut builder = if cfg!(debug_assertions) {
        Builder::from_env(Env::default().default_filter_or("debug"))
    } else {
        Builder::from_env(Env::default().default_filter_or("info"))
    };

    builder.format(|f, record| match record.level() {
        log::Level::Error => {
            eprintln!("{}", record.args());
            Ok(())
        }
        _ => {
            writeln!(f, "{}", record.args())
        }
    });

    builder.target(Target::Stdout).init();

    info!("module version: {}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run().await {
        error!("application error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = AppConfig::load().context("failed to load configuration")?;
    let schema = config.form.schema()?;

    let mut body = String::new();
    tokio::io::stdin()
        .read_to_string(&mut body)
        .await
        .context("failed to read form body from stdin")?;
    let fields = FormFields::from_urlencoded(body.trim())?;

    let form = FormElement::new(
        Some(config.form.name.as_str()),
        &config.form.action,
        &config.form.page_url,
    )?
    .with_fields(&fields);

    let mut document = Document::new(config.form.page_url.clone());
    document.append_form(form);

    let client = HttpConfigClient::new(device_client(&config.device)?, schema);
    let handler = FormSubmitHandler::new(client);

    let form_name = config.form.name.clone();
    document.on_content_loaded(move |document| {
        handler.initialize(document, &form_name);
    });
    document.finish_parsing();

    document.submit(&config.form.name)?.settle().await
}
