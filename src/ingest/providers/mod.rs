pub mod gnews;
pub mod rss;
