pub mod config;
pub mod domain;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod processing;
pub mod rules;
pub mod scoring;
pub mod storage;
