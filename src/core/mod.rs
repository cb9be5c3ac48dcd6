//! Core data structures.
//!
//! The foundational types used throughout the tool:
//! - fully-qualified names and their derivations (FQName)
//! - the parsed `.hal` representation (Ast and friends)

pub mod ast;
pub mod fqname;

pub use ast::{Ast, Interface, Method, NamedType, Scope, TypeDetail};
pub use fqname::{FQName, FqNameError, IBASE};
