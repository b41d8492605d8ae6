pub mod annex;
pub mod app;
pub mod config;
pub mod credentials;
pub mod domain;
pub mod encode;
pub mod error;
pub mod fs_util;
pub mod metadata;
pub mod output;
pub mod repository;
