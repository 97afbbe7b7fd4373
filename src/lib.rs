pub mod config;
pub mod error;
pub mod models;
pub mod refresh;
pub mod scanner;
pub mod search;
pub mod state;
pub mod storage;
