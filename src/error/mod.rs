mod types;

pub use types::{PortalError, Result};
