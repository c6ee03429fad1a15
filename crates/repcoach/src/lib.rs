//! RepCoach - workout coaching chat service.
//!
//! A request gate in front of a small API, a streaming chat pipeline with a
//! progress-reporting tool, and read access to saved workouts.

pub mod api;
pub mod auth;
pub mod build_info;
pub mod chat;
pub mod config;
pub mod gate;
pub mod handlers;
pub mod llm;
pub mod server;
pub mod store;
pub mod tools;
