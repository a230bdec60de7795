pub mod audit;
pub mod channels;
pub mod config;
pub mod db;
pub mod dto;
pub mod entity;
pub mod error;
pub mod lifecycle;
pub mod middleware;
pub mod models;
pub mod ocr;
pub mod reconciliation;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
pub mod webhook;
