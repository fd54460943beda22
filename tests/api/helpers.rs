use reqwest::Response;
use secrecy::ExposeSecret;
use sqlx::{migrate, Connection, Executor, PgConnection, PgPool};
use uuid::Uuid;
use wiremock::MockServer;

use waitlist_api::authentication::ADMIN_SECRET_HEADER;
use waitlist_api::config::{get_configuration, DatabaseSettings, Settings};
use waitlist_api::startup::{get_connection_db_pool, Application};

pub struct TestApp {
    pub config: Settings,
    pub address: String,
    pub db_pool: PgPool,
    pub email_server: MockServer,
    pub admin_secret: String,
}

impl TestApp {
    pub async fn spawn_app() -> TestApp {
        let mut config = get_configuration().expect("Missing configuration file.");
        let db_test_name = format!("db_{}", Uuid::new_v4().to_string().replace('-', "_"));
        let email_server = MockServer::start().await;

        // We are using port 0 as way to define a different port per each test. Port 0 is a special case that operating systems
        // take into account: when port is 0, the OS will search for the first available port
        config.set_app_port(0);
        config.set_email_client_base_url(email_server.uri());

        let db_pool = configure_db(&mut config.database, db_test_name.clone()).await;
        let admin_secret = config.admin.secret.expose_secret().clone();

        let application = Application::build(config.clone())
            .await
            .expect("Failed to build application.");

        let address = format!("http://127.0.0.1:{}", application.get_port());

        tokio::spawn(application.run_until_stop());

        TestApp {
            address,
            config,
            db_pool,
            email_server,
            admin_secret,
        }
    }

    pub async fn post_waitlist(&self, body: serde_json::Value) -> Response {
        let client = reqwest::Client::new();
        let url = format!("{}/waitlist", self.address);

        client
            .post(&url)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_waitlist(&self, query: &str) -> Response {
        let client = reqwest::Client::new();
        let url = format!("{}/waitlist{}", self.address, query);

        client
            .get(&url)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get_products(&self, query: &str) -> Response {
        let client = reqwest::Client::new();
        let url = format!("{}/products{}", self.address, query);

        client
            .get(&url)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn admin_get(&self, path: &str) -> Response {
        let client = reqwest::Client::new();
        let url = format!("{}{}", self.address, path);

        client
            .get(&url)
            .header(ADMIN_SECRET_HEADER, &self.admin_secret)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn admin_delete(&self, path: &str) -> Response {
        let client = reqwest::Client::new();
        let url = format!("{}{}", self.address, path);

        client
            .delete(&url)
            .header(ADMIN_SECRET_HEADER, &self.admin_secret)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn create_product(&self, body: serde_json::Value) -> Response {
        let client = reqwest::Client::new();
        let url = format!("{}/admin/products", self.address);

        client
            .post(&url)
            .header(ADMIN_SECRET_HEADER, &self.admin_secret)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

async fn configure_db(db_config: &mut DatabaseSettings, db_test_name: String) -> PgPool {
    // Create database
    let mut connection = PgConnection::connect_with(&db_config.get_db_options())
        .await
        .expect("Failed to connect to Postgres.");

    connection
        .execute(&*format!(r#"CREATE DATABASE "{}";"#, db_test_name))
        .await
        .expect("Failed to create database.");

    connection
        .close()
        .await
        .expect("Failed to close connection.");

    // Execute migrations
    db_config.name = db_test_name;

    let db_pool = get_connection_db_pool(db_config);

    migrate!("./migrations")
        .run(&db_pool)
        .await
        .expect("Failed to run migrations.");

    db_pool
}
