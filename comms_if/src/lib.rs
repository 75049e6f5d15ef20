//! # Communications interface crate.
//!
//! Provides all common communications interfaces for the arm control software.

// ------------------------------------------------------------------------------------------------
// MODULES
// ------------------------------------------------------------------------------------------------

/// Arm protocol objects and their JSON codecs
pub mod arm;

/// Network module
pub mod net;
