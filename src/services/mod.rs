pub mod assets;
pub mod employee;
pub mod user;
