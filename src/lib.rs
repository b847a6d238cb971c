//! Warm-up intake: scripted attendee onboarding chat with audience analytics.

pub mod analytics;
pub mod app;
pub mod config;
pub mod error;
pub mod intake;
pub mod llm;
pub mod report;
pub mod store;
pub mod tools;
