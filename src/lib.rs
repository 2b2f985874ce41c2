// Declare the modules that form the library's public API.
// The binaries reach them through `use influx_gate::module_name;`
pub mod config;
pub mod data_model;
pub mod dataset;
pub mod error;
pub mod executor;
pub mod pipeline;
pub mod quality;
pub mod utils;

pub mod curate_logic;
pub mod validate_logic;

pub use data_model::{AuthorDocument, AuthorRecord, Verified};
pub use error::{PipelineError, Result};
