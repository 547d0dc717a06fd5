/// Campaign Letter - Interactive Correspondence Renderer
///
/// Core library that turns campaign letters with inline entity tags into
/// annotated pages, backed by a knowledge base of characters, locations,
/// items and events, with tooltip and reveal behaviour for the host page.

pub mod app;
pub mod config;
pub mod core;

#[cfg(test)]
mod tests;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
