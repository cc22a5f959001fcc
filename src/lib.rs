//! docgate: quality-gate, label and route knowledge files for RAG and SQL
//! ingestion.
//!
//! Stages run strictly in order: [`scan`] → [`preprocess`] → [`sanitize`] →
//! [`normalize`] → [`label`] → [`route`] → [`render`] → [`archive`].
//! [`pipeline::Pipeline`] drives them for one input root.

pub mod archive;
pub mod cli;
pub mod config;
pub mod domain;
pub mod label;
pub mod normalize;
pub mod pipeline;
pub mod preprocess;
pub mod redact;
pub mod render;
pub mod route;
pub mod sanitize;
pub mod scan;
pub mod utils;
