//! Service layer.
//!
//! Services are what controllers receive. The generic [`db::DataService`] forwards to a
//! repository without adding state of its own.

pub mod db;

#[cfg(test)]
mod tests;
