//! Pure simulation logic for Straphanger.
//!
//! This crate contains all game logic that is independent of any engine,
//! thread, or device. Functions take plain data and return results, making
//! them unit-testable and portable across the native engine, headless
//! harnesses, and any future front-end.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`calibration`] | Two-phase hold-to-measure grip calibration session |
//! | [`config`] | Aggregate serializable tuning configuration |
//! | [`filter`] | One-pole low-pass smoothing and normalization helpers |
//! | [`grip`] | Multi-channel grip debouncing with release grace period |
//! | [`reaction`] | Per-kind NPC impact reaction policies |
//! | [`separation`] | Personal-space crowd repulsion |
//! | [`sway`] | Swing drive, power accumulation, launch resolution |
//! | [`vec2`] | 2D vector math |

pub mod calibration;
pub mod config;
pub mod filter;
pub mod grip;
pub mod reaction;
pub mod separation;
pub mod sway;
pub mod vec2;
