pub mod sniff;
pub mod validation;
