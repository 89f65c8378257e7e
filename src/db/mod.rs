pub mod connection;
pub mod ingest_runs;
pub mod listings;

pub use connection::{init_db, Database};
pub use listings::ListingStore;
