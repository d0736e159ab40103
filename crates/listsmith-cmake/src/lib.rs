//! CMakeLists.txt generation and editing.
//!
//! This crate provides:
//! - An immutable registry of command types (keyword, fixed and default
//!   arguments, duplicate policy)
//! - The argument codec: quoting, tokenizing and `${name}` placeholders
//! - Command nodes and ordered lists documents with deterministic output
//! - Reading existing files back into documents for in-place edits
//!
//! # Example
//!
//! ```
//! use listsmith_cmake::{names, CommandNode, CommandRegistry, ListsDocument};
//! use std::sync::Arc;
//!
//! let registry = CommandRegistry::standard();
//! let board = registry.get(names::BOARD).unwrap();
//!
//! let mut doc = ListsDocument::new();
//! doc.append(CommandNode::with_args(Arc::clone(board), ["uno"]));
//!
//! assert_eq!(doc.serialize(None), "set(${PROJECT_NAME}_BOARD uno)\n");
//! ```

mod catalog;
mod codec;
mod command;
mod command_type;
mod document;
mod element;
mod error;
mod parse;
mod registry;
mod value;

pub use catalog::{names, DEFAULT_MINIMUM_VERSION, DEFAULT_TOOLCHAIN_FILE};
pub use codec::{decode, encode, is_identifier, resolve_placeholders};
pub use command::{CommandNode, UnknownCommand};
pub use command_type::CommandType;
pub use document::{ListsDocument, ListsElement};
pub use element::Element;
pub use error::{CodecError, CommandError, ParseError, RegistryError, Result};
pub use parse::Parsed;
pub use registry::{CommandRegistry, RegistryBuilder};
pub use value::{Value, ValueMap};
