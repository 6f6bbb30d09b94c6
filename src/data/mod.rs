pub mod bar;
pub mod loader;

pub use bar::{Bar, PriceSeries};
pub use loader::{load_csv, parse_date};
