// ABOUTME: Library root for zen-docker: docker_image and docker_container target types.
// ABOUTME: The CLI that runs scripts from a build file lives in main.rs.

pub mod config;
pub mod container;
pub mod error;
pub mod image;
pub mod output;
pub mod process;
pub mod registry;
pub mod runtime;
pub mod target;
pub mod types;
