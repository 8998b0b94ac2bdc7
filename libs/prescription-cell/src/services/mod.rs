pub mod prescription;
pub mod validation;
