pub mod db_errors;
pub mod patch;

pub use patch::Patch;
