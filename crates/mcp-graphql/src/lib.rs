#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod errors;
pub mod forward;
pub mod introspection;
pub(crate) mod json_schema;
pub mod schema_source;
pub mod server;
