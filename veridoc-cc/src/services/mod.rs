//! Orchestration services

pub mod crosscheck;

pub use crosscheck::CrossCheckService;
