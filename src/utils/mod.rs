pub mod database;
pub mod datetime;
pub mod pagination;
