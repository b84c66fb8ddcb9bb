pub mod config;
pub mod feed_loop;
pub mod logging;
pub mod recovery;
