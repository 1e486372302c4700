//! Planning assistant for professional food stylists: chat with a
//! generative model, structured action extraction, image renders and
//! persistent sessions behind a small HTTP API.

#![deny(unsafe_code)] // Le code unsafe est interdit
#![warn(missing_docs)] // Toute fonction, struct, enum ou module public doit être documenté
#![deny(non_camel_case_types)]
#![deny(unused_must_use)] // Oblige à gérer explicitement les Result et Option
#![deny(nonstandard_style)]
#![forbid(unsafe_op_in_unsafe_fn)]
#![deny(clippy::unwrap_used)] // Interdit unwrap()
#![deny(clippy::expect_used)] // Interdit expect()
#![deny(clippy::panic)] // Interdit panic!()
#![deny(clippy::print_stdout)] // Interdit println!() en production
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

/// Chat endpoint transport: request parsing, rate-limit retry, replies.
pub mod chat;
/// Environment-driven configuration.
pub mod config;
/// Domain types: identifiers, sessions, messages, products.
pub mod core;
/// Generative API client and system prompts.
pub mod llm;
/// Extraction of structured action blocks from assistant replies.
pub mod parser;
/// HTTP server and API routes.
#[allow(clippy::missing_errors_doc, clippy::unused_async)]
pub mod server;
/// Entry helpers to start the styling agent.
pub mod start_styling_agent;
/// Session persistence (in-memory and `SQLite`).
pub mod storage;
/// Session/UI reconciliation: state machine, effects and workspace.
pub mod workflow;
