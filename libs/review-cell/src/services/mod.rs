pub mod review;
pub mod stats;
pub mod validation;
