pub mod attendance;
pub mod class;
pub mod department;
pub mod member;
pub mod report;
pub mod role;
pub mod transaction;
pub mod user;
