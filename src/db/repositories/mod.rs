pub mod habit;
pub mod user;
