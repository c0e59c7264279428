pub mod error;
pub mod metadata;
pub mod query;
pub mod repo;
pub mod seed;
pub mod service;
pub mod validation;
