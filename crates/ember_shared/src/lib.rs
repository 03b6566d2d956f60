//! # EMBER Shared
//!
//! Common math types used across the particle engine and its collaborators.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on engine crates. It only defines plain
//! data: [`Vec2`], [`Color4F`] and [`Transform2D`].

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod math;

pub use math::{Color4F, Transform2D, Vec2};
