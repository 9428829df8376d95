use std::sync::Arc;

use crate::config::Config;
use crate::db::propertydb::PropertyStoreExt;
use crate::service::storage::ImageStorage;

pub mod config;
pub mod db;
pub mod dtos;
pub mod error;
pub mod handler;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
pub mod utils;

#[derive(Clone)]
pub struct AppState {
    pub env: Config,
    pub db_client: Arc<dyn PropertyStoreExt>,
    pub image_storage: Arc<dyn ImageStorage>,
}
