pub mod models;
mod scraper;

pub use models::ScrapedRow;
pub use scraper::{parse_rows, CommandSource, JsonFileSource, ListingSource};
