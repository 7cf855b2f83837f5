//! sea-orm entities for the pet adoption schema plus the schema-level
//! validation every write path goes through.

pub mod errors;
pub mod db;
pub mod user;
pub mod breed;
pub mod pet;
pub mod notification;

#[cfg(test)]
mod tests;
