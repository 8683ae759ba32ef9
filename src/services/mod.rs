pub mod aggregator;
pub mod converter;
pub mod encoding;
pub mod error;
pub mod exporter;
pub mod normalizer;
pub mod parser;
pub mod scratch;
