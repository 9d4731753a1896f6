//! Node descriptors and the patch engine that turns them into real nodes.

mod node;
mod patch;

pub use node::{ComponentId, VNode, VNodeKind};
pub use patch::{PatchStats, Patcher, TreePatcher};
