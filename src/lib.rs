// Library for tests to access modules

pub mod auth;
pub mod config;
pub mod models;
pub mod routes;
pub mod server;
pub mod sysinfo_repo;
