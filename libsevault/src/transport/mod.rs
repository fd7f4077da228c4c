//! Plugin socket transport.
//!
//! [`PluginServer`] serves the Docker volume-plugin protocol (HTTP/1 with
//! JSON bodies) on a Unix domain socket and dispatches each request to a
//! [`VolumePlugin`](crate::plugin::VolumePlugin).

pub mod server;

pub use server::{PluginServer, dispatch};
