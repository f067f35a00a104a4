mod context;

pub use context::{RequestContext, TenantContext};
