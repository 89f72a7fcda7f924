//! Remote repository inspection over the GitHub REST API
//!
//! The modules here are leaves the tool layer composes:
//!
//! - [`reference`] turns repository strings into a [`RepoRef`]
//! - [`semver`] orders raw tags newest first
//! - [`github`] is the HTTP client with pagination and rate-limit handling
//! - [`tree`] shapes recursive tree listings
//! - [`changelog`] lists the commits between two refs
//! - [`inspector`] implements one operation per tool on top of the above

pub mod changelog;
pub mod config;
pub mod error;
pub mod github;
pub mod inspector;
pub mod reference;
pub mod semver;
pub mod tree;

pub use config::ClientConfig;
pub use error::{ErrorKind, GitRemoteError, Result};
pub use github::GithubClient;
pub use inspector::RepositoryInspector;
pub use reference::{resolve_repository, RepoRef};
