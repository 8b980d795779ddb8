pub mod check;
pub mod cli;
pub mod comment;
pub mod config;
pub mod core;
pub mod engine;
pub mod exit;
pub mod github;
pub mod logs;
pub mod platform;
pub mod render;
pub mod report;
pub mod ui;
