pub mod appointment;
pub mod auth;
pub mod error;
pub mod pagination;
pub mod prescription;
pub mod review;
pub mod user;
