pub mod ai;
pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod llm;
pub mod tools;
