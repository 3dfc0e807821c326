pub mod drift;
pub mod position_tracker;
pub mod ring_buffer;
