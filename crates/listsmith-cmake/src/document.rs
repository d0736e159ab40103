//! Ordered command documents.

use crate::command::{CommandNode, UnknownCommand};
use crate::command_type::CommandType;
use crate::element::Element;
use crate::parse::{self, Parsed};
use crate::registry::CommandRegistry;
use crate::value::ValueMap;
use std::fmt;

/// One entry of a [`ListsDocument`].
#[derive(Debug, Clone, PartialEq)]
pub enum ListsElement {
    Command(CommandNode),
    Unknown(UnknownCommand),
    /// Whitespace and comments between commands, kept verbatim.
    Text(String),
}

impl ListsElement {
    pub fn as_command(&self) -> Option<&CommandNode> {
        match self {
            ListsElement::Command(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_command_mut(&mut self) -> Option<&mut CommandNode> {
        match self {
            ListsElement::Command(node) => Some(node),
            _ => None,
        }
    }
}

impl Element for ListsElement {
    fn append_to(&self, out: &mut String, values: Option<&ValueMap>) {
        match self {
            ListsElement::Command(node) => node.append_to(out, values),
            ListsElement::Unknown(raw) => raw.append_to(out, values),
            ListsElement::Text(text) => out.push_str(text),
        }
    }

    fn is_add_eol(&self) -> bool {
        match self {
            ListsElement::Command(node) => node.is_add_eol(),
            ListsElement::Unknown(raw) => raw.is_add_eol(),
            ListsElement::Text(text) => text.ends_with('\n'),
        }
    }

    fn set_add_eol(&mut self, add_eol: bool) {
        match self {
            ListsElement::Command(node) => node.set_add_eol(add_eol),
            ListsElement::Unknown(raw) => raw.set_add_eol(add_eol),
            ListsElement::Text(text) => {
                let has_eol = text.ends_with('\n');
                if add_eol && !has_eol {
                    text.push('\n');
                } else if !add_eol && has_eol {
                    text.pop();
                }
            }
        }
    }
}

impl From<CommandNode> for ListsElement {
    fn from(node: CommandNode) -> Self {
        ListsElement::Command(node)
    }
}

impl From<UnknownCommand> for ListsElement {
    fn from(raw: UnknownCommand) -> Self {
        ListsElement::Unknown(raw)
    }
}

/// A whole generated (or read-back) CMake script.
///
/// Element order is the execution order of the script.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListsDocument {
    elements: Vec<ListsElement>,
}

impl ListsDocument {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a document using the standard registry.
    pub fn parse(text: &str) -> Parsed {
        parse::parse(CommandRegistry::standard(), text)
    }

    /// Read a document, resolving keywords through `registry`.
    pub fn parse_with(registry: &CommandRegistry, text: &str) -> Parsed {
        parse::parse(registry, text)
    }

    pub fn append(&mut self, node: CommandNode) {
        self.elements.push(ListsElement::Command(node));
    }

    pub fn push(&mut self, element: impl Into<ListsElement>) {
        self.elements.push(element.into());
    }

    /// Append verbatim text such as a comment or a blank line.
    pub fn push_text(&mut self, text: impl Into<String>) {
        self.elements.push(ListsElement::Text(text.into()));
    }

    /// Insert `node` before the first command matching `anchor`.
    ///
    /// Returns the element index of the inserted node, or gives the node
    /// back if nothing matched.
    pub fn insert_before<F>(&mut self, anchor: F, node: CommandNode) -> Result<usize, CommandNode>
    where
        F: FnMut(&CommandNode) -> bool,
    {
        match self.position(anchor) {
            Some(index) => {
                self.elements.insert(index, ListsElement::Command(node));
                Ok(index)
            }
            None => Err(node),
        }
    }

    /// Insert `node` on the line after the first command matching `anchor`.
    ///
    /// When the anchor does not end its line (a trailing comment follows, or
    /// the file ends), the node goes after the rest of that line.
    pub fn insert_after<F>(&mut self, anchor: F, node: CommandNode) -> Result<usize, CommandNode>
    where
        F: FnMut(&CommandNode) -> bool,
    {
        let Some(index) = self.position(anchor) else {
            return Err(node);
        };
        let at = self.next_line_start(index);
        self.elements.insert(at, ListsElement::Command(node));
        Ok(at)
    }

    /// Element index where the line following the element at `index` starts,
    /// splitting a text run or adding a newline as needed.
    fn next_line_start(&mut self, index: usize) -> usize {
        let mut at = index + 1;
        if self.elements[index].is_add_eol() {
            return at;
        }

        if let Some(ListsElement::Text(text)) = self.elements.get_mut(at) {
            match text.find('\n') {
                Some(newline) => {
                    let rest = text.split_off(newline + 1);
                    if !rest.is_empty() {
                        self.elements.insert(at + 1, ListsElement::Text(rest));
                    }
                    return at + 1;
                }
                None => at += 1,
            }
        }

        self.elements.insert(at, ListsElement::Text("\n".to_string()));
        at + 1
    }

    fn position<F>(&self, mut pred: F) -> Option<usize>
    where
        F: FnMut(&CommandNode) -> bool,
    {
        self.elements
            .iter()
            .position(|e| e.as_command().is_some_and(&mut pred))
    }

    /// Remove every command matching `pred`, returning how many were removed.
    pub fn remove_all<F>(&mut self, mut pred: F) -> usize
    where
        F: FnMut(&CommandNode) -> bool,
    {
        let before = self.elements.len();
        self.elements
            .retain(|e| !e.as_command().is_some_and(&mut pred));
        before - self.elements.len()
    }

    pub fn find_first(&self, ty: &CommandType) -> Option<&CommandNode> {
        self.commands().find(|node| node.is_type(ty))
    }

    pub fn find_first_mut(&mut self, ty: &CommandType) -> Option<&mut CommandNode> {
        self.commands_mut().find(|node| node.is_type(ty))
    }

    pub fn find_all<'a>(
        &'a self,
        ty: &'a CommandType,
    ) -> impl Iterator<Item = &'a CommandNode> + 'a {
        self.commands().filter(move |node| node.is_type(ty))
    }

    /// Replace the first command of the same type as `node`, or append it.
    ///
    /// Returns the replaced node.
    pub fn set_command(&mut self, node: CommandNode) -> Option<CommandNode> {
        match self.find_first_mut(node.command_type()) {
            Some(existing) => Some(std::mem::replace(existing, node)),
            None => {
                self.append(node);
                None
            }
        }
    }

    pub fn commands(&self) -> impl Iterator<Item = &CommandNode> {
        self.elements.iter().filter_map(ListsElement::as_command)
    }

    pub fn commands_mut(&mut self) -> impl Iterator<Item = &mut CommandNode> {
        self.elements.iter_mut().filter_map(ListsElement::as_command_mut)
    }

    pub fn elements(&self) -> &[ListsElement] {
        &self.elements
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Render the full file content.
    pub fn serialize(&self, values: Option<&ValueMap>) -> String {
        let mut out = String::new();
        for element in &self.elements {
            element.append_to(&mut out, values);
        }
        out
    }
}

impl FromIterator<CommandNode> for ListsDocument {
    fn from_iter<I: IntoIterator<Item = CommandNode>>(iter: I) -> Self {
        Self {
            elements: iter.into_iter().map(ListsElement::Command).collect(),
        }
    }
}

impl Extend<CommandNode> for ListsDocument {
    fn extend<I: IntoIterator<Item = CommandNode>>(&mut self, iter: I) {
        self.elements.extend(iter.into_iter().map(ListsElement::Command));
    }
}

impl fmt::Display for ListsDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize(None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn types() -> (Arc<CommandType>, Arc<CommandType>, Arc<CommandType>) {
        (
            Arc::new(CommandType::new("set", "set")),
            Arc::new(CommandType::new("project", "project")),
            Arc::new(CommandType::new("msg", "message")),
        )
    }

    fn sample() -> ListsDocument {
        let (set, project, _) = types();
        [
            CommandNode::with_args(Arc::clone(&set), ["A", "1"]),
            CommandNode::with_args(project, ["demo"]),
            CommandNode::with_args(set, ["B", "2"]),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_serialize_concatenates_in_order() {
        let doc = sample();
        assert_eq!(doc.serialize(None), "set(A 1)\nproject(demo)\nset(B 2)\n");
        assert_eq!(doc.to_string(), doc.serialize(None));
    }

    #[test]
    fn test_find_first_and_all() {
        let (set, project, msg) = types();
        let doc = sample();

        assert_eq!(doc.find_first(&set).map(|n| n.args()[0].as_str()), Some("A"));
        assert_eq!(doc.find_all(&set).count(), 2);
        assert_eq!(doc.find_all(&project).count(), 1);
        assert!(doc.find_first(&msg).is_none());
    }

    #[test]
    fn test_insert_before_and_after() {
        let (_, _, msg) = types();
        let mut doc = sample();

        let is_project = |n: &CommandNode| n.command_type().command() == "project";

        let before = CommandNode::with_args(Arc::clone(&msg), ["before"]);
        let idx = doc.insert_before(is_project, before).unwrap();
        assert_eq!(idx, 1);

        let after = CommandNode::with_args(Arc::clone(&msg), ["after"]);
        let idx = doc.insert_after(is_project, after).unwrap();
        assert_eq!(idx, 3);

        assert_eq!(
            doc.serialize(None),
            "set(A 1)\nmessage(before)\nproject(demo)\nmessage(after)\nset(B 2)\n"
        );
    }

    #[test]
    fn test_insert_after_skips_trailing_comment() {
        let text = "set(A 1) # first\n\n# section\nset(B 2)\n";
        let mut doc = ListsDocument::parse(text).into_result().unwrap();
        let set = Arc::clone(doc.commands().next().unwrap().command_type());

        let idx = doc
            .insert_after(|n| n.args()[0] == "A", CommandNode::with_args(set, ["C", "3"]))
            .unwrap();
        assert_eq!(idx, 2);
        assert_eq!(
            doc.serialize(None),
            "set(A 1) # first\nset(C 3)\n\n# section\nset(B 2)\n"
        );
    }

    #[test]
    fn test_insert_after_last_line_without_newline() {
        let mut doc = ListsDocument::parse("set(A 1)").into_result().unwrap();
        let set = Arc::clone(doc.commands().next().unwrap().command_type());

        let node = CommandNode::with_args(set, ["B", "2"]);
        doc.insert_after(|_| true, node).unwrap();
        assert_eq!(doc.serialize(None), "set(A 1)\nset(B 2)\n");
    }

    #[test]
    fn test_insert_without_anchor_returns_node() {
        let (_, _, msg) = types();
        let mut doc = sample();
        let node = CommandNode::with_args(msg, ["x"]);
        let back =
            doc.insert_after(|n| n.command_type().command() == "add_executable", node.clone());
        assert_eq!(back, Err(node));
        assert_eq!(doc.len(), 3);
    }

    #[test]
    fn test_remove_all_keeps_text() {
        let (set, _, _) = types();
        let mut doc = sample();
        doc.push_text("# trailing\n");

        let removed = doc.remove_all(|n| n.is_type(&set));
        assert_eq!(removed, 2);
        assert_eq!(doc.serialize(None), "project(demo)\n# trailing\n");
    }

    #[test]
    fn test_set_command_replaces_or_appends() {
        let (set, _, msg) = types();
        let mut doc = sample();

        let old = doc.set_command(CommandNode::with_args(Arc::clone(&set), ["A", "9"]));
        assert_eq!(old.map(|n| n.args().to_vec()), Some(vec!["A".to_string(), "1".to_string()]));

        assert!(doc.set_command(CommandNode::with_args(msg, ["hi"])).is_none());
        assert_eq!(
            doc.serialize(None),
            "set(A 9)\nproject(demo)\nset(B 2)\nmessage(hi)\n"
        );
    }

    #[test]
    fn test_text_element_eol() {
        let mut text = ListsElement::Text("# note".to_string());
        assert!(!text.is_add_eol());
        text.set_add_eol(true);
        assert_eq!(text.text(None), "# note\n");
        text.set_add_eol(false);
        assert_eq!(text.text(None), "# note");
    }

    #[test]
    fn test_commands_mut_edits_in_place() {
        let mut doc = sample();
        for node in doc.commands_mut() {
            node.set_add_eol(false);
        }
        assert_eq!(doc.serialize(None), "set(A 1)project(demo)set(B 2)");
    }
}
