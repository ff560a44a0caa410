pub mod input;
pub mod replay;
