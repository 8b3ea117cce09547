pub mod cli;
pub mod cmux;
pub mod config;
pub mod domain;
pub mod event_log;
pub mod mapping;
pub mod paths;
pub mod service;
pub mod workspaces;
