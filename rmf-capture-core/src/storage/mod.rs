pub mod artifact;
pub mod metadata;
