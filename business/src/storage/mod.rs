//! Object storage for garment photos, subject photos, and composites.
//!
//! Keys are `<bucket>/<object path>`: the first segment names one of the
//! three public buckets in [`Bucket`], the rest is the object path, which
//! always starts with the owning user's id.

mod mock;
pub mod paths;
mod supabase;
mod traits;
mod types;

pub use mock::MockFileStorage;
pub use paths::Bucket;
pub use supabase::SupabaseFileStorage;
pub use traits::FileStorage;
pub use types::{FileMetadata, FileStorageError, FileUploadRequest};
