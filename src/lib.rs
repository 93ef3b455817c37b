//! Sift: a conversational web-search assistant.
//!
//! A model answers questions by calling tools in a bounded reasoning loop.
//! The built-in tools search DuckDuckGo and fetch pages as readable text;
//! whole agents can also be exposed as tools for a coordinator.
//!
//! # Quick Start
//!
//! ```no_run
//! use sift::prelude::*;
//!
//! # async fn example() -> sift::error::Result<()> {
//! let config = SiftConfig::load()?;
//! let factory = AgentFactory::from_config(&config)?;
//! let mut session = ChatSession::new(factory.build(AgentMode::Single), 10);
//! let outcome = session.send("今日の東京の天気は？").await?;
//! println!("{}", outcome.output);
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod agent_loop;
pub mod config;
pub mod error;
pub mod extract;
pub mod models;
pub mod prelude;
pub mod provider;
pub mod tools;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
