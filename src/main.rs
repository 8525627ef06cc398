use anyhow::Context;

use email_capture::configuration::get_configuration;
use email_capture::startup::Application;
use email_capture::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let subscriber = get_subscriber("email-capture".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    let configuration = get_configuration().context("Failed to read configuration")?;
    let application = Application::build(configuration)
        .await
        .context("Failed to bind the capture endpoint")?;
    tracing::info!("Listening on port {}", application.port());
    application.run_until_stopped().await?;
    Ok(())
}
