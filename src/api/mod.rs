// Admin REST API boundary: the trait the store talks to, and the
// reqwest-backed implementation used by the binary.

pub mod client;
pub mod traits;
