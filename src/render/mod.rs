mod core;

pub use self::core::{MarkupRenderer, RendererSettings};
