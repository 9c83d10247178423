#![forbid(unsafe_code)]
#![deny(unused_must_use)]

pub mod eval;
pub mod pipeline;

pub use pipeline::{run_pipeline, ExitStatus, Session, SessionOptions};
