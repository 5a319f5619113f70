pub mod config;
pub mod context;
pub mod data_types;
pub mod error;
pub mod filter;
pub mod repository;
pub mod sample;
pub mod sort;
