//! Input loaders: road-network JSON, KML bounding polygon and the request
//! trace CSV. Everything here runs before the event loop; any failure is a
//! fatal setup error.

pub mod map_file;
pub mod polygon;
pub mod trace;

use thiserror::Error;

/// Setup failures: anything that prevents the simulation from starting.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("map error: {0}")]
    Map(String),
}
