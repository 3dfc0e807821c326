pub mod audio_frame;
pub mod audio_models;
pub mod config;
pub mod error;
pub mod state;
