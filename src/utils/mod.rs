// Utils

pub mod common;
pub mod logging;
pub mod timestamp;

pub use common::create_progress_bar;
pub use logging::{init_tracing, LogFormat};
