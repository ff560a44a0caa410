pub mod image;
pub mod interactions;
