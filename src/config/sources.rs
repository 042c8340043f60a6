//! Configuration sources, applied in precedence order by [`super::ConfigLoader`].

pub mod credentials;
pub mod environment;
pub mod global_file;
pub mod workspace_file;
