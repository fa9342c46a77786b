pub mod administrative;
pub mod auth;
pub mod crimes;
pub mod dashboard;
pub mod evidence;
pub mod profile;
pub mod users;

use crate::error::CaseError;
use actix_web::web::{JsonConfig, QueryConfig};

/// Configures the web app by adding services from each web file.
///
/// @see https://docs.rs/actix-web/4/actix_web/struct.App.html#method.configure
pub fn configure(conf: &mut actix_web::web::ServiceConfig) {
    // Route resolution will stop at the first match.
    administrative::configure(conf);
    auth::configure(conf);
    crimes::configure(conf);
    dashboard::configure(conf);
    evidence::configure(conf);
    profile::configure(conf);
    users::configure(conf);
}

/// JSON extractor settings. Malformed bodies become 400 with the usual
/// `{"error": ...}` shape.
pub fn json_config(limit: usize) -> JsonConfig {
    JsonConfig::default()
        .limit(limit)
        .error_handler(|err, _req| CaseError::validation(err.to_string()).into())
}

pub fn query_config() -> QueryConfig {
    QueryConfig::default().error_handler(|err, _req| CaseError::validation(err.to_string()).into())
}
