//! Command implementations, one module per subcommand group.

pub mod account;
pub mod catalog;
pub mod reviews;
