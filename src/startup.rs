use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Pool, Postgres};
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

use crate::authentication::AdminSecret;
use crate::config::{DatabaseSettings, Settings};
use crate::email_client::EmailClient;
use crate::routes::{
    add_cart_item, create_product, get_cart, get_product, health_check, join_waitlist,
    list_products, list_subscribers, remove_cart_item, remove_subscriber, waitlist_stats,
    waitlist_status,
};

/// How many signups the waitlist advertises; only drives the
/// "remaining spots" counter, signups are never refused for capacity.
pub struct WaitlistCapacity(pub i64);

pub struct Application {
    pub port: u16,
    pub server: Server,
}

impl Application {
    pub async fn build(config: Settings) -> Result<Self, std::io::Error> {
        let db_pool = get_connection_db_pool(&config.database);
        let sender_email = config
            .get_email_client_sender()
            .expect("Sender email is not valid");
        let email_client = EmailClient::new(
            config.get_email_client_base_url(),
            sender_email,
            config.get_email_client_api(),
            None,
        );
        let redis_client = redis::Client::open(config.get_redis_address())
            .expect("Failed to create the Redis client.");

        let listener = TcpListener::bind(config.get_address())?;
        let port = listener.local_addr().unwrap().port();
        let admin_secret = AdminSecret(config.admin.secret.clone());
        let capacity = WaitlistCapacity(config.application.waitlist_capacity);

        tracing::info!("Server listening on port {}", port);

        let server = run(
            listener,
            db_pool,
            email_client,
            redis_client,
            admin_secret,
            capacity,
        )?;

        Ok(Self { port, server })
    }

    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stop(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    db_pool: PgPool,
    email_client: EmailClient,
    redis_client: redis::Client,
    admin_secret: AdminSecret,
    capacity: WaitlistCapacity,
) -> Result<Server, std::io::Error> {
    let db_pool = web::Data::new(db_pool);
    let email_client = web::Data::new(email_client);
    let redis_client = web::Data::new(redis_client);
    let admin_secret = web::Data::new(admin_secret);
    let capacity = web::Data::new(capacity);

    let server = HttpServer::new(move || {
        // App is where your application logic lives: routing, middlewares, request handler, etc
        App::new()
            // 'wrap' method adds a middleware to the App. This specific middleware provide incoming
            // request logger
            .wrap(TracingLogger::default())
            .route("/health_check", web::get().to(health_check))
            .route("/waitlist", web::post().to(join_waitlist))
            .route("/waitlist", web::get().to(waitlist_status))
            .route("/admin/waitlist", web::get().to(list_subscribers))
            .route("/admin/waitlist/stats", web::get().to(waitlist_stats))
            .route("/admin/waitlist/{id}", web::delete().to(remove_subscriber))
            .route("/admin/products", web::post().to(create_product))
            .route("/products", web::get().to(list_products))
            .route("/products/{slug}", web::get().to(get_product))
            .route("/cart/{session_id}", web::get().to(get_cart))
            .route("/cart/{session_id}/items", web::post().to(add_cart_item))
            .route(
                "/cart/{session_id}/items/{product_id}",
                web::delete().to(remove_cart_item),
            )
            .app_data(db_pool.clone())
            .app_data(email_client.clone())
            .app_data(redis_client.clone())
            .app_data(admin_secret.clone())
            .app_data(capacity.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}

pub fn get_connection_db_pool(config: &DatabaseSettings) -> Pool<Postgres> {
    PgPoolOptions::new()
        .acquire_timeout(std::time::Duration::from_secs(2))
        .connect_lazy_with(config.get_db_options())
}
