//! Administration of users, roles and departments.

pub mod departments;
pub mod roles;
pub mod users;
