pub mod config;
pub mod context;
pub mod directories;
pub mod error;
pub mod identity;
pub mod mcp;
pub mod skill;
pub mod trace;
pub mod tree;
pub mod types;
pub mod uri;

pub use config::OpenVikingConfig;
pub use context::{Context, ContextType, Level, ResourceContentType, Vectorize};
pub use error::{ErrorCode, OvError, Result};
pub use identity::{RequestContext, Role, UserIdentifier};
pub use trace::TraceCollector;
