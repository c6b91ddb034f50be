pub mod api;
pub mod client;
pub mod models;

pub use api::{page_from_answer, page_url};
pub use client::{ApiCall, ScryfallClient};
pub use models::{Card, ScryfallSearchAnswer};
