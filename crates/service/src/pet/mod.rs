//! Pet aggregate: domain types, listing queries, persistence port and the
//! moderation/adoption workflow.

pub mod domain;
pub mod query;
pub mod repository;
pub mod repo;
pub mod service;
