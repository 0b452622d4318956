// Data synchronization: request lifecycle, timeout fallbacks and
// pagination, shared by every data domain of the dashboard.

pub mod fallback;
pub mod lifecycle;
pub mod pagination;
