
pub mod logging;

// Campaign data and letter content
pub mod content;
pub mod knowledge_base;

// Markup: value trees, the page arena, tag scanning
pub mod dom;
pub mod scanner;

pub mod renderer;

// Interactive behaviour driven by host events
pub mod reveal;
pub mod tooltip;
