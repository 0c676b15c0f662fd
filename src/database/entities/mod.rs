pub mod common_types;

pub mod datasets;
pub mod fields;
pub mod metadata_properties;
pub mod questions;
pub mod records;
pub mod responses;
pub mod suggestions;
pub mod users;
pub mod vector_settings;
pub mod vectors;
pub mod workspaces;
