// ABOUTME: Validated name types shared across the crate.
// ABOUTME: Stack and container names become Docker resource names, so they are restricted.

mod name;

pub use name::{ContainerName, NameError, StackName};
