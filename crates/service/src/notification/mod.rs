//! Notifications stored for users, listed newest first.

pub mod domain;
pub mod repository;
pub mod repo;
pub mod service;
