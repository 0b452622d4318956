// Moderation reports: wire-record classification, normalization into a
// canonical shape, per-subject aggregation, and update rules.

pub mod aggregate;
pub mod envelope;
pub mod models;
pub mod normalize;
pub mod patch;
pub mod raw;
