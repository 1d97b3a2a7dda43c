pub mod config;
pub mod error;
pub mod features;
pub mod model;
pub mod pages;
pub mod prediction_log;
pub mod service;
pub mod types;
pub mod validate;
pub mod web;
