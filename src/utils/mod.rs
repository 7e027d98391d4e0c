pub mod command;
pub mod error;
pub mod logger;
pub mod validation;
