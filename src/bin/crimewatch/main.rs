use actix_session::{config::PersistentSession, storage::CookieSessionStore, SessionMiddleware};
use actix_web::cookie::{time::Duration, Key, SameSite};
use actix_web::http::header;
use actix_web::middleware::{DefaultHeaders, Logger};
use actix_web::web::Data;
use actix_web::{App, HttpServer};
use crimewatch::app_config;
use crimewatch::db;
use env_logger::Env;
use rand::{distributions::Alphanumeric, Rng};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    init_lib_mods();
    app_config::init();

    let config = app_config::get_config();
    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| config.database.url.clone());
    let db = db::connect(&database_url, config.database.max_connections)
        .await
        .expect("Failed to connect to the database.");
    if config.database.create_schema {
        db::create_schema(&db)
            .await
            .expect("Failed to create the database schema.");
    }

    let secret_key = match std::env::var("SECRET_KEY") {
        Ok(key) if key.len() >= 64 => Key::from(key.as_bytes()),
        other => {
            let random_string: String = rand::thread_rng()
                .sample_iter(&Alphanumeric)
                .take(128)
                .map(char::from)
                .collect();
            log::warn!("SECRET_KEY was invalid ({:?}). Session cookies will be invalidated every time the application is restarted. A secret key must be at least 64 bytes to be accepted.", other.map(|k| k.len()));
            Key::from(random_string.as_bytes())
        }
    };

    let session_ttl = Duration::minutes(i64::from(config.security.session_ttl_minutes));
    let secure_cookies = config.security.secure_cookies;
    let max_json_bytes = config.limits.max_json_bytes;
    let db = Data::new(db);

    log::info!("{} listening on {}", config.site.name, config.site.bind_address);

    HttpServer::new(move || {
        // Order of middleware IS IMPORTANT and is in REVERSE EXECUTION ORDER.
        App::new()
            .app_data(db.clone())
            .app_data(crimewatch::web::json_config(max_json_bytes))
            .app_data(crimewatch::web::query_config())
            // Security headers - applied to all responses
            .wrap(
                DefaultHeaders::new()
                    .add((header::X_FRAME_OPTIONS, "DENY"))
                    .add((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                    .add(("Referrer-Policy", "strict-origin-when-cross-origin"))
                    .add((
                        "Permissions-Policy",
                        "geolocation=(), microphone=(), camera=()",
                    )),
            )
            .wrap(
                SessionMiddleware::builder(CookieSessionStore::default(), secret_key.clone())
                    .cookie_same_site(SameSite::Lax)
                    .cookie_secure(secure_cookies)
                    .session_lifecycle(PersistentSession::default().session_ttl(session_ttl))
                    .build(),
            )
            .wrap(Logger::new("%a %r %s %Dms"))
            .configure(crimewatch::web::configure)
    })
    .bind(config.site.bind_address.as_str())?
    .run()
    .await
}

/// Initialize third party crates we rely on but don't have control over.
pub fn init_lib_mods() {
    if let Err(e) = dotenv::dotenv() {
        eprintln!("No .env file loaded: {}", e);
    }
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}
