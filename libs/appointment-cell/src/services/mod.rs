pub mod booking;
pub mod dashboard;
pub mod lifecycle;
pub mod matching;
pub mod policy;
pub mod validation;
