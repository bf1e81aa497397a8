//! Learnhub client - domain layer over the hosted Supabase backend.
//!
//! # Architecture
//!
//! All persistence, authentication and querying is delegated to the hosted
//! backend (Supabase: GoTrue auth, PostgREST row CRUD, object storage).
//! This crate owns the application state that a front end consumes:
//!
//! - [`session::SessionStore`] - the authenticated identity and derived
//!   profile, bootstrapped once at startup and updated on auth events
//! - [`courses::CourseStore`] - in-memory cache of courses with
//!   create/update/delete/enroll operations; course updates reconcile the
//!   edited lesson list against persisted rows
//! - [`reviews::Reviews`] - course review listing and submission
//!
//! # Example
//!
//! ```rust,ignore
//! use learnhub_client::{config::AppConfig, state::AppState};
//!
//! let config = AppConfig::from_env()?;
//! let app = AppState::new(config);
//! app.bootstrap().await?;
//!
//! for course in app.courses().catalog().await {
//!     println!("{} ({})", course.title, course.price);
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod courses;
pub mod error;
pub mod models;
pub mod reviews;
pub mod session;
pub mod state;
pub mod supabase;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use state::AppState;
