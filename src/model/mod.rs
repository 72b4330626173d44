pub mod buffer;
pub mod config;
pub mod cursor;
pub mod note;
pub mod spinner;
pub mod state;
