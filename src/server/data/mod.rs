//! Data access layer.
//!
//! Entities are read and staged through a generic [`repository::Repository`] and committed by
//! a [`unit_of_work::UnitOfWork`]. Both are bound to a [`session::DbSession`], which owns the
//! connection, the optional explicit transaction and the change tracker shared by every
//! repository of one request scope.

pub mod entity;
pub mod query;
pub mod repository;
pub mod session;
pub mod tracked;
mod tracker;
pub mod unit_of_work;

#[cfg(test)]
mod tests;
