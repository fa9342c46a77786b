//! Database connection and schema bootstrap.

use crate::orm::{
    admins, administratives, crime_accused, crime_logs, crime_victims, crimes, evidence,
    locations, users,
};
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema,
};

/// Opens a pooled connection.
///
/// In-memory SQLite databases exist per connection, so they are pinned to a
/// single pooled connection.
pub async fn connect(url: &str, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(url.to_owned());
    if url.starts_with("sqlite::memory:") {
        opt.max_connections(1).min_connections(1);
    } else {
        opt.max_connections(max_connections);
    }
    opt.sqlx_logging(false);

    let db = Database::connect(opt).await?;
    log::info!("Connected to {:?} database", db.get_database_backend());
    Ok(db)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut stmt = schema.create_table_from_entity(entity);
    stmt.if_not_exists();
    db.execute(backend.build(&stmt)).await?;
    Ok(())
}

/// Creates every table from the entity definitions, parents before children.
pub async fn create_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, users::Entity).await?;
    create_table(db, &schema, admins::Entity).await?;
    create_table(db, &schema, administratives::Entity).await?;
    create_table(db, &schema, locations::Entity).await?;
    create_table(db, &schema, crimes::Entity).await?;
    create_table(db, &schema, crime_accused::Entity).await?;
    create_table(db, &schema, crime_victims::Entity).await?;
    create_table(db, &schema, evidence::Entity).await?;
    create_table(db, &schema, crime_logs::Entity).await?;

    log::debug!("Schema created");
    Ok(())
}
