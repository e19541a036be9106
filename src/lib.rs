//! Terminal and browser dashboard for the Nexus AGI agent service.
//!
//! The view controllers in [`views`] own all dashboard state and talk to the
//! backend through the non-blocking [`runtime`]. The [`shell`] routes events
//! to whichever controllers are mounted; [`watch`], [`web`] and [`cli`] are
//! the surfaces built on top.

pub mod activity;
pub mod api;
pub mod cli;
pub mod config;
pub mod monitor;
pub mod render;
pub mod runtime;
pub mod shell;
pub mod views;
pub mod watch;
pub mod web;
