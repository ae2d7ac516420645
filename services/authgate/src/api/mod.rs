pub mod error;
pub mod openapi;
pub mod system;
pub mod types;
