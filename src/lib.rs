pub mod administrative;
pub mod app_config;
pub mod auth;
pub mod crime_log;
pub mod crimes;
pub mod db;
pub mod error;
pub mod evidence;
pub mod middleware;
pub mod orm;
pub mod session;
pub mod users;
pub mod web;
