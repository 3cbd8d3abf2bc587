pub mod app;
pub mod archive;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod error;
pub mod fs_util;
pub mod http;
pub mod installer;
pub mod output;
pub mod store;
