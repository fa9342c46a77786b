//! SeaORM entities for every persisted table.

pub mod admins;
pub mod administratives;
pub mod crime_accused;
pub mod crime_logs;
pub mod crime_victims;
pub mod crimes;
pub mod evidence;
pub mod locations;
pub mod users;
