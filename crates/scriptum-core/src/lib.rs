//! scriptum-core - Core library for Scriptum
//!
//! This crate contains the note and tag models, the synchronization
//! services over the remote note API, the durable local store, and the
//! auth/session context shared by every Scriptum interface.

pub mod auth;
pub mod error;
pub mod models;
pub mod remote;
pub mod repository;
pub mod store;
pub mod sync;
pub mod util;

pub use error::{Error, Result};
pub use models::{Note, NoteId};
