//! Operations module provides the submission lookups shared by the API server and the CLI

pub mod submissions;
