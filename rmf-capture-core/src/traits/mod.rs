pub mod capture_provider;
pub mod hal;
pub mod sink;
