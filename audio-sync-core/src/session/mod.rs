pub mod capture_framer;
pub mod events;
pub mod jitter_buffer;
