//! Command invocations.

use crate::codec::{encode, resolve_placeholders};
use crate::command_type::CommandType;
use crate::element::Element;
use crate::error::{CommandError, Result};
use crate::value::ValueMap;
use rustc_hash::FxHashSet;
use smol_str::SmolStr;
use std::fmt;
use std::sync::Arc;

/// One invocation of a known command type.
///
/// The node owns its user arguments; fixed arguments come from the type
/// and are emitted ahead of them on serialization.
///
/// A node read from a file keeps its source text and re-emits it unchanged
/// until its arguments are modified.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandNode {
    command_type: Arc<CommandType>,
    args: Vec<String>,
    add_eol: bool,
    source: Option<String>,
}

impl CommandNode {
    /// Create a node, back-filling argument slots past `args.len()` from
    /// the type's default arguments.
    pub fn new<I, S>(command_type: Arc<CommandType>, args: I, add_eol: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut args: Vec<String> = args.into_iter().map(Into::into).collect();
        let defaults = command_type.default_args();
        if args.len() < defaults.len() {
            args.extend(defaults[args.len()..].iter().map(SmolStr::to_string));
        }

        Self {
            command_type,
            args,
            add_eol,
            source: None,
        }
    }

    /// Create a node terminated by a newline.
    pub fn with_args<I, S>(command_type: Arc<CommandType>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(command_type, args, true)
    }

    /// Create a node with no user arguments beyond the defaults.
    pub fn with_eol(command_type: Arc<CommandType>, add_eol: bool) -> Self {
        Self::new(command_type, Vec::<String>::new(), add_eol)
    }

    /// Create a node with default arguments, terminated by a newline.
    pub fn from_type(command_type: Arc<CommandType>) -> Self {
        Self::with_eol(command_type, true)
    }

    /// Create a node using the type's own line-termination default.
    pub fn of_type<I, S>(command_type: Arc<CommandType>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let add_eol = command_type.is_default_add_eol();
        Self::new(command_type, args, add_eol)
    }

    /// Rebuild a node from arguments read out of a file; no back-fill.
    ///
    /// `source` is the invocation text from the keyword through `)`, plus the
    /// `\r` of a CRLF line ending.
    pub(crate) fn from_parsed(
        command_type: Arc<CommandType>,
        args: Vec<String>,
        source: &str,
        add_eol: bool,
    ) -> Self {
        Self {
            command_type,
            args,
            add_eol,
            source: Some(source.to_string()),
        }
    }

    /// Source text this node was read from, if it is still unmodified.
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn command_type(&self) -> &Arc<CommandType> {
        &self.command_type
    }

    /// Whether this node is an instance of `ty`.
    pub fn is_type(&self, ty: &CommandType) -> bool {
        std::ptr::eq(Arc::as_ptr(&self.command_type), ty) || *self.command_type == *ty
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn arg_count(&self) -> usize {
        self.args.len()
    }

    pub fn arg(&self, index: usize) -> Result<&str> {
        self.args
            .get(index)
            .map(String::as_str)
            .ok_or(CommandError::IndexOutOfRange {
                index,
                len: self.args.len(),
            })
    }

    /// Replace the argument at `index`, or append when `index == arg_count()`.
    pub fn set_arg(&mut self, index: usize, arg: impl Into<String>) -> Result<()> {
        let len = self.args.len();
        match index.cmp(&len) {
            std::cmp::Ordering::Less => self.args[index] = arg.into(),
            std::cmp::Ordering::Equal => self.args.push(arg.into()),
            std::cmp::Ordering::Greater => {
                return Err(CommandError::IndexOutOfRange { index, len });
            }
        }
        self.source = None;
        Ok(())
    }

    pub fn add_arg(&mut self, arg: impl Into<String>) {
        self.source = None;
        self.args.push(arg.into());
    }

    /// Insert before `index`, shifting later arguments up; `index` may equal `arg_count()`.
    pub fn insert_arg(&mut self, index: usize, arg: impl Into<String>) -> Result<()> {
        let len = self.args.len();
        if index > len {
            return Err(CommandError::IndexOutOfRange { index, len });
        }
        self.source = None;
        self.args.insert(index, arg.into());
        Ok(())
    }

    pub fn remove_arg(&mut self, index: usize) -> Result<String> {
        let len = self.args.len();
        if index >= len {
            return Err(CommandError::IndexOutOfRange { index, len });
        }
        self.source = None;
        Ok(self.args.remove(index))
    }

    pub fn set_args<I, S>(&mut self, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.source = None;
        self.args.clear();
        self.args.extend(args.into_iter().map(Into::into));
    }

    /// Render the invocation as CMake text.
    pub fn serialize(&self, values: Option<&ValueMap>) -> String {
        self.text(values)
    }
}

impl Element for CommandNode {
    fn append_to(&self, out: &mut String, values: Option<&ValueMap>) {
        if let Some(source) = &self.source {
            out.push_str(source);
            if self.add_eol {
                out.push('\n');
            }
            return;
        }

        let ty = &*self.command_type;
        let no_dupe = ty.is_no_dupe_args();
        // keyed on raw text, before placeholder substitution
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        let mut sep = "";

        out.push_str(ty.command());
        out.push('(');

        for fixed in ty.fixed_args() {
            if no_dupe && !seen.insert(fixed.as_str()) {
                continue;
            }
            out.push_str(sep);
            sep = " ";
            out.push_str(&encode(&resolve_placeholders(fixed, values)));
        }

        for arg in &self.args {
            if no_dupe && !seen.insert(arg.as_str()) {
                continue;
            }
            out.push_str(sep);
            sep = " ";
            out.push_str(&encode(arg));
        }

        out.push(')');
        if self.add_eol {
            out.push('\n');
        }
    }

    fn is_add_eol(&self) -> bool {
        self.add_eol
    }

    fn set_add_eol(&mut self, add_eol: bool) {
        self.add_eol = add_eol;
    }
}

impl fmt::Display for CommandNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize(None))
    }
}

/// A command kept exactly as it was read.
///
/// Used for keywords the registry does not know and for invocations whose
/// argument text cannot be re-emitted faithfully (comments, bracket
/// arguments, nested parentheses, CMake escape sequences).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommand {
    keyword: SmolStr,
    raw: String,
    add_eol: bool,
}

impl UnknownCommand {
    pub fn new(keyword: &str, raw: impl Into<String>, add_eol: bool) -> Self {
        Self {
            keyword: SmolStr::new(keyword.to_ascii_lowercase()),
            raw: raw.into(),
            add_eol,
        }
    }

    /// Lowercase keyword.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Source text from the keyword through the closing parenthesis (plus the
    /// `\r` of a CRLF line ending).
    pub fn raw(&self) -> &str {
        &self.raw
    }
}

impl Element for UnknownCommand {
    fn append_to(&self, out: &mut String, _values: Option<&ValueMap>) {
        out.push_str(&self.raw);
        if self.add_eol {
            out.push('\n');
        }
    }

    fn is_add_eol(&self) -> bool {
        self.add_eol
    }

    fn set_add_eol(&mut self, add_eol: bool) {
        self.add_eol = add_eol;
    }
}
