/// The capability every single-target tracker implements
pub mod tracker_api;

/// MOSSE correlation filter tracker
pub mod mosse;

/// Ordered collection of trackers with winner-take-all detection and persistence
pub mod collection;

/// Command layer that drives a collection from a frame loop
pub mod session;
