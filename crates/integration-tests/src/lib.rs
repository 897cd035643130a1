//! Integration tests for Ridgeline Outfitters.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p ridgeline-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `image_cleanup` - Primary-image consistency sweep, driven against an
//!   in-memory store (no database required)
