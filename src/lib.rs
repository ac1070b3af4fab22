pub mod audio;
pub mod chat;
pub mod config;
pub mod error;
pub mod highlight;
pub mod indicator;
pub mod logging;
pub mod render;
pub mod session;
pub mod stt;
pub mod tts;

pub use logging::{init_logging, log_debug, log_file_path};
