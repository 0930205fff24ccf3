pub mod news_api;
pub mod rss;
