pub mod audio_models;
pub mod error;
pub mod handle;
pub mod settings;
pub mod state;
