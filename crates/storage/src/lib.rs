pub mod db;
pub mod schema;

pub use db::Database;

#[cfg(test)]
mod db_tests;
