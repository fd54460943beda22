use waitlist_api::config::get_configuration;
use waitlist_api::startup::Application;
use waitlist_api::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let subscriber = get_subscriber(String::from("waitlist_api"), String::from("info"));

    init_subscriber(subscriber);

    let config = get_configuration().expect("Missing configuration file.");
    let application = Application::build(config).await?;

    application.run_until_stop().await
}
