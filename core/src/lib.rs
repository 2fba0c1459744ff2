//! Core of lspcap: a transparent stdio relay that sits between an editor and a
//! language server, tees every stream into a log file and filters one known
//! piece of debug noise out of the server's stdout.

pub mod api;
pub mod capture;
pub mod config;
pub mod error;
pub mod relay;
