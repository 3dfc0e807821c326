pub mod capture_delegate;
pub mod capture_source;
pub mod clock;
pub mod playback_delegate;
pub mod playback_sink;
