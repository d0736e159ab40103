use smol_str::SmolStr;

/// An immutable description of one kind of CMake command.
///
/// Several types may share a keyword (`set` is used for the board, the
/// port, the source list, ...); the `name` tells them apart.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CommandType {
    name: SmolStr,
    keyword: SmolStr,
    fixed_args: Vec<SmolStr>,
    default_args: Vec<SmolStr>,
    no_dupe_args: bool,
    default_add_eol: bool,
}

impl CommandType {
    /// Create a type with no fixed or default arguments.
    ///
    /// The keyword is stored lowercase.
    pub fn new(name: impl Into<SmolStr>, keyword: &str) -> Self {
        Self {
            name: name.into(),
            keyword: SmolStr::new(keyword.to_ascii_lowercase()),
            fixed_args: Vec::new(),
            default_args: Vec::new(),
            no_dupe_args: false,
            default_add_eol: true,
        }
    }

    pub fn with_fixed_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.fixed_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SmolStr>,
    {
        self.default_args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_no_dupe_args(mut self, no_dupe_args: bool) -> Self {
        self.no_dupe_args = no_dupe_args;
        self
    }

    pub fn with_default_add_eol(mut self, add_eol: bool) -> Self {
        self.default_add_eol = add_eol;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The command keyword, lowercase.
    pub fn command(&self) -> &str {
        &self.keyword
    }

    /// Argument templates emitted before any user argument.
    pub fn fixed_args(&self) -> &[SmolStr] {
        &self.fixed_args
    }

    /// Positional fallbacks for user argument slots left empty at construction.
    pub fn default_args(&self) -> &[SmolStr] {
        &self.default_args
    }

    pub fn is_no_dupe_args(&self) -> bool {
        self.no_dupe_args
    }

    pub fn is_default_add_eol(&self) -> bool {
        self.default_add_eol
    }

    /// Whether `args` starts with this type's fixed arguments, compared as raw text.
    pub fn matches_prefix<S: AsRef<str>>(&self, args: &[S]) -> bool {
        self.fixed_args.len() <= args.len()
            && self
                .fixed_args
                .iter()
                .zip(args)
                .all(|(fixed, arg)| fixed.as_str() == arg.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let ty = CommandType::new("set_board", "SET")
            .with_fixed_args(["${PROJECT_NAME}_BOARD"])
            .with_default_args(["uno"])
            .with_no_dupe_args(true);

        assert_eq!(ty.name(), "set_board");
        assert_eq!(ty.command(), "set");
        assert_eq!(ty.fixed_args(), ["${PROJECT_NAME}_BOARD"]);
        assert_eq!(ty.default_args(), ["uno"]);
        assert!(ty.is_no_dupe_args());
        assert!(ty.is_default_add_eol());
    }

    #[test]
    fn test_matches_prefix() {
        let ty = CommandType::new("set_port", "set").with_fixed_args(["${PROJECT_NAME}_PORT"]);
        assert!(ty.matches_prefix(&["${PROJECT_NAME}_PORT", "/dev/ttyUSB0"]));
        assert!(!ty.matches_prefix(&["PORT", "/dev/ttyUSB0"]));
        assert!(!ty.matches_prefix::<&str>(&[]));
        assert!(CommandType::new("set", "set").matches_prefix::<&str>(&[]));
    }
}
