pub mod hash;
pub mod validation;
