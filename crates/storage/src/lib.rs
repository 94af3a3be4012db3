//! Filesystem abstraction over S3-compatible object storage.
//!
//! This crate provides a platform-agnostic, filesystem-style interface for
//! reading and writing files kept in an object store. It supports multiple
//! backends behind the [`FilesystemProvider`] trait:
//!
//! - **S3** - [`S3Filesystem`] over any [`StorageClient`] (the AWS SDK client
//!   lives in `rusty-filesystem-storage-crt`)
//! - **Memory** - [`MemoryStorageClient`] for tests and local runs
//! - **Local disk** - [`LocalFilesystem`]
//!
//! # Keys
//!
//! Every provider has a root prefix. A relative path `p` resolves to
//! `root/p`, or to `p` when the root is empty. `directory` derives a provider
//! with an extended root and shares the client with its parent.

pub mod content_type;
mod error;
mod filesystem;
mod local;
mod memory;
pub mod path;
mod s3;
mod traits;
mod types;

pub use content_type::{content_type_for_path, ContentType};
pub use error::StorageError;
pub use filesystem::Filesystem;
pub use local::LocalFilesystem;
pub use memory::{MemoryStorageClient, StoredObject};
pub use path::{resolve_path, scope_root};
pub use s3::S3Filesystem;
pub use traits::{FilesystemProvider, StorageClient};
pub use types::{
    AwsCredentials, ByteContent, ByteStream, File, FileSource, HttpMethod, ObjectBody,
    ObjectMetadata, PresignRequest, StorageSettings, DEFAULT_REGION,
};
