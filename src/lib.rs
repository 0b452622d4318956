// arena-admin: client-side data sync for the sports-events admin dashboard
//
// This is the library root. Each module corresponds to one layer of the
// report moderation flow, from the REST boundary up to the state store.

pub mod api;
pub mod config;
pub mod output;
pub mod reports;
pub mod store;
pub mod sync;
