//! Grid Snake - a terminal Snake game with obstacles, levels and speed-ups
//!
//! This library provides:
//! - Core game logic: tick rules, food and obstacle placement, level policy (game module)
//! - Keyboard and swipe input normalization (input module)
//! - TUI rendering of game snapshots (render module)
//! - Session statistics (metrics module)
//! - The interactive host loop (modes module)

pub mod game;
pub mod input;
pub mod metrics;
pub mod modes;
pub mod render;
