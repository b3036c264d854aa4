pub mod qa;
pub mod root;
