pub mod errors;
pub mod extraction;
pub mod schema;
pub mod storage;

pub mod database;
pub mod server;
pub mod services;
