//! hidl-gen - an IDL-to-code generator driver for HIDL
//!
//! This crate provides the core library functionality for hidl-gen:
//! mapping fully-qualified interface names to `.hal` files under a
//! multi-root package layout, parsing them into typed ASTs with
//! interface-hash enforcement, and planning per-package build files.

pub mod coordinator;
pub mod core;
pub mod gen;
pub mod parser;
pub mod util;

pub use crate::core::{Ast, FQName};

pub use crate::coordinator::{Coordinator, Enforce, Location};
