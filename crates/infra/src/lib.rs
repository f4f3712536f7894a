pub mod config;
pub mod db;
pub mod logging;
pub mod media;
pub mod repositories;
