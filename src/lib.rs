//! Long-term memory for autonomous agents.
//!
//! longmem records the events an agent produces (actions it takes and
//! observations it receives) in a vector index and retrieves the ones most
//! similar to a free-text query. Writes are fire-and-forget: each event gets a
//! sequence index immediately and is embedded and stored by a bounded pool of
//! worker tasks.
//!
//! # Architecture
//!
//! - **Storage**: SQLite with [sqlite-vec](https://github.com/asg017/sqlite-vec)
//!   `vec0` tables, keyed by sequence index
//! - **Embeddings**: selected by strategy name: Ollama, OpenAI, Azure OpenAI,
//!   a disabled backend, or a local ONNX all-MiniLM-L6-v2 model
//! - **Resilience**: transient embedding failures are retried with randomized
//!   exponential backoff; failed inserts land in a dead-letter list
//! - **Transport**: MCP over stdio, plus a CLI
//!
//! # Modules
//!
//! - [`config`]: Configuration loading from TOML files and environment variables
//! - [`db`]: SQLite initialization, schema, and metadata
//! - [`embedding`]: Embedding strategies, providers, and the retry policy
//! - [`error`]: Error types
//! - [`events`]: Event records with optional metadata
//! - [`memory`]: The memory store and its vector index

pub mod config;
pub mod db;
pub mod embedding;
pub mod error;
pub mod events;
pub mod memory;
