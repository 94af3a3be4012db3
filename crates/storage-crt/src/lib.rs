//! AWS SDK S3 backend for rusty-filesystem.
//!
//! This crate provides a `StorageClient` implementation using the AWS SDK for Rust,
//! and constructors that build a ready-to-use `Filesystem` from settings.
//!
//! # Example
//!
//! ```ignore
//! use rusty_filesystem_storage::StorageSettings;
//!
//! let settings = StorageSettings::new("my-bucket")
//!     .with_root("uploads")
//!     .with_region("us-west-2")
//!     .with_credentials(access_key, secret_key);
//! let fs = rusty_filesystem_storage_crt::s3(&settings).await?;
//!
//! fs.create("avatars/1.png", png_bytes).await?;
//! let url = fs.temporary_url("avatars/1.png", Duration::from_secs(300), &HashMap::new()).await?;
//! ```

mod client;
mod error;
mod filesystem;

pub use client::{default_endpoint, CrtStorageClient};
pub use error::CrtError;
pub use filesystem::{s3, s3_filesystem};
