pub mod memory;
pub mod pg;
pub mod pool;
pub mod schema;
pub mod store;

use diesel_migrations::{embed_migrations, EmbeddedMigrations};

/// Schema migrations, applied by `community-migrate` and the database tests.
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");
