//! Background and domain services.

pub mod image_cleanup;

pub use image_cleanup::{ImageCleanupService, PgImageStore, PrimaryImageStore, SweepReport};
