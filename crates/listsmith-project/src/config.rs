//! Project settings (listsmith.toml format).

use listsmith_cmake::{
    is_identifier, CommandRegistry, CommandType, Value, ValueMap, DEFAULT_MINIMUM_VERSION,
};
use listsmith_common::Diagnostic;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

/// Root project settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectSettings {
    /// Project metadata.
    pub project: ProjectConfig,

    /// Target board and upload settings.
    #[serde(default)]
    pub board: BoardConfig,

    /// Sources, libraries and toolchain settings.
    #[serde(default)]
    pub build: BuildConfig,

    /// Extra placeholder values available to custom commands.
    #[serde(default)]
    pub values: BTreeMap<String, SettingValue>,

    /// Custom command types.
    #[serde(rename = "command", default)]
    pub commands: Vec<CommandConfig>,
}

/// Project metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name; becomes `PROJECT_NAME` in the generated file.
    pub name: String,

    /// What the project builds.
    #[serde(default)]
    pub kind: ProjectKind,

    /// Project version (optional).
    #[serde(default)]
    pub version: Option<String>,
}

/// Project kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectKind {
    /// Uploadable firmware image.
    #[default]
    Firmware,
    /// Arduino library.
    Library,
}

impl ProjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectKind::Firmware => "firmware",
            ProjectKind::Library => "library",
        }
    }
}

/// Board configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Board identifier (e.g., "uno", "mega", "nano").
    #[serde(default)]
    pub id: String,

    /// Board CPU variant (e.g., "atmega328").
    #[serde(default)]
    pub cpu: Option<String>,

    /// Serial port used for upload.
    #[serde(default)]
    pub port: Option<String>,

    /// Serial monitor baud rate.
    #[serde(default)]
    pub baud_rate: Option<u32>,

    /// Serial monitor command; defaults to picocom when a baud rate is set.
    #[serde(default)]
    pub serial: Option<Vec<String>>,

    /// Upload programmer id.
    #[serde(default)]
    pub programmer: Option<String>,
}

impl BoardConfig {
    /// Arguments of the serial monitor command, if one is configured.
    pub fn serial_args(&self) -> Option<Vec<String>> {
        if let Some(serial) = &self.serial {
            return Some(serial.clone());
        }
        self.baud_rate.map(|baud| {
            ["picocom", "@SERIAL_PORT@", "-b", &baud.to_string(), "-l"]
                .iter()
                .map(|s| s.to_string())
                .collect()
        })
    }
}

/// Build configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    /// Minimum CMake version.
    #[serde(default = "default_minimum_version")]
    pub cmake_minimum_version: String,

    /// Toolchain file (default: the arduino-cmake toolchain).
    #[serde(default)]
    pub toolchain_file: Option<String>,

    /// C++ standard (e.g., 11, 14, 17).
    #[serde(default)]
    pub cxx_standard: Option<u32>,

    /// Source files.
    #[serde(default)]
    pub sources: Vec<String>,

    /// Header files.
    #[serde(default)]
    pub headers: Vec<String>,

    /// Bundled Arduino libraries to link (e.g., "Wire", "SPI").
    #[serde(default)]
    pub arduino_libs: Vec<String>,

    /// Other libraries to link.
    #[serde(default)]
    pub libs: Vec<String>,

    /// Library search paths.
    #[serde(default)]
    pub link_directories: Vec<String>,

    /// Include directories.
    #[serde(default)]
    pub include_directories: Vec<String>,

    /// Subdirectories with their own lists files.
    #[serde(default)]
    pub subdirectories: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            cmake_minimum_version: default_minimum_version(),
            toolchain_file: None,
            cxx_standard: None,
            sources: Vec::new(),
            headers: Vec::new(),
            arduino_libs: Vec::new(),
            libs: Vec::new(),
            link_directories: Vec::new(),
            include_directories: Vec::new(),
            subdirectories: Vec::new(),
        }
    }
}

fn default_minimum_version() -> String {
    DEFAULT_MINIMUM_VERSION.to_string()
}

/// A value in the `[values]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
}

impl From<&SettingValue> for Value {
    fn from(value: &SettingValue) -> Self {
        match value {
            SettingValue::Bool(b) => Value::Bool(*b),
            SettingValue::Int(n) => Value::Int(*n),
            SettingValue::Float(n) => Value::Float(*n),
            SettingValue::Text(s) => Value::Text(s.clone()),
            SettingValue::List(items) => Value::List(items.clone()),
        }
    }
}

/// A custom command type, optionally emitted into generated files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Unique type name.
    pub name: String,

    /// CMake command keyword.
    pub keyword: String,

    /// Fixed argument templates; may reference `${placeholders}`.
    #[serde(default)]
    pub fixed: Vec<String>,

    /// Default argument values.
    #[serde(default)]
    pub defaults: Vec<String>,

    /// Suppress repeated arguments.
    #[serde(default)]
    pub no_dupe_args: bool,

    /// Terminate the command with a newline.
    #[serde(default = "default_true")]
    pub add_eol: bool,

    /// Emit an instance into generated files.
    #[serde(default = "default_true")]
    pub emit: bool,

    /// User arguments of the emitted instance.
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_true() -> bool {
    true
}

impl CommandConfig {
    pub fn to_command_type(&self) -> CommandType {
        CommandType::new(self.name.as_str(), &self.keyword)
            .with_fixed_args(self.fixed.iter().map(String::as_str))
            .with_default_args(self.defaults.iter().map(String::as_str))
            .with_no_dupe_args(self.no_dupe_args)
            .with_default_add_eol(self.add_eol)
    }
}

impl FromStr for ProjectSettings {
    type Err = crate::ProjectError;

    fn from_str(s: &str) -> crate::Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

impl ProjectSettings {
    /// Load settings from a TOML file.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        content.parse()
    }

    /// Minimal settings for a firmware project.
    pub fn firmware(name: &str, board: &str) -> Self {
        Self {
            project: ProjectConfig {
                name: name.to_string(),
                kind: ProjectKind::Firmware,
                version: None,
            },
            board: BoardConfig {
                id: board.to_string(),
                ..BoardConfig::default()
            },
            build: BuildConfig::default(),
            values: BTreeMap::new(),
            commands: Vec::new(),
        }
    }

    /// Add source files.
    pub fn with_sources(mut self, sources: &[&str]) -> Self {
        self.build.sources = sources.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Placeholder values for serialization.
    ///
    /// `[values]` entries are applied last and may override built-in keys.
    pub fn value_map(&self) -> ValueMap {
        let mut map = ValueMap::new()
            .with("project_name", self.project.name.as_str())
            .with("project_kind", self.project.kind.as_str())
            .with("board", self.board.id.as_str())
            .with("cmake_minimum_version", self.build.cmake_minimum_version.as_str())
            .with("sources", self.build.sources.clone())
            .with("headers", self.build.headers.clone());

        if let Some(version) = &self.project.version {
            map.insert("project_version", version.as_str());
        }
        if let Some(cpu) = &self.board.cpu {
            map.insert("cpu", cpu.as_str());
        }
        if let Some(port) = &self.board.port {
            map.insert("port", port.as_str());
        }
        if let Some(baud) = self.board.baud_rate {
            map.insert("baud_rate", baud);
        }
        if let Some(programmer) = &self.board.programmer {
            map.insert("programmer", programmer.as_str());
        }
        if let Some(std) = self.build.cxx_standard {
            map.insert("cxx_standard", std);
        }

        map.extend(self.values.iter().map(|(k, v)| (k.as_str(), Value::from(v))));
        map
    }

    /// The standard registry extended with this project's custom commands.
    pub fn registry(&self) -> crate::Result<CommandRegistry> {
        let mut builder = CommandRegistry::standard().extend();
        for command in &self.commands {
            builder.register(command.to_command_type())?;
        }
        Ok(builder.build())
    }

    /// Check the settings for problems that would produce a broken file.
    pub fn validate(&self) -> Vec<Diagnostic> {
        let mut diags = Vec::new();

        let name = self.project.name.trim();
        if name.is_empty() {
            diags.push(Diagnostic::error("project name is empty").with_help("set [project].name"));
        } else if !is_identifier(name) {
            diags.push(
                Diagnostic::warning(format!("project name `{name}` is not a plain identifier"))
                    .with_help("the name prefixes CMake variables such as `${PROJECT_NAME}_BOARD`"),
            );
        }

        if self.board.id.trim().is_empty() {
            diags.push(
                Diagnostic::error("no board selected").with_help("set [board].id, e.g. \"uno\""),
            );
        }

        if self.project.kind == ProjectKind::Firmware && self.build.sources.is_empty() {
            diags.push(Diagnostic::warning("firmware project has no sources"));
        }

        if self.board.baud_rate.is_some() && self.board.port.is_none() {
            diags.push(
                Diagnostic::warning("baud rate is set but no serial port")
                    .with_help("set [board].port so the serial monitor can connect"),
            );
        }

        for command in &self.commands {
            if !is_identifier(&command.keyword) {
                diags.push(Diagnostic::error(format!(
                    "custom command `{}` has invalid keyword `{}`",
                    command.name, command.keyword
                )));
            }
        }

        diags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_settings() {
        let toml = r#"
[project]
name = "blink"

[board]
id = "uno"
cpu = "atmega328"
port = "/dev/ttyUSB0"
baud_rate = 115200

[build]
cxx_standard = 11
sources = ["blink.cpp", "led.cpp"]
arduino_libs = ["Wire"]

[values]
author = "someone"
debug = true
level = 3
flags = ["-Os", "-g"]

[[command]]
name = "set_author"
keyword = "set"
fixed = ["AUTHOR", "${author}"]
        "#;

        let settings: ProjectSettings = toml.parse().unwrap();

        assert_eq!(settings.project.name, "blink");
        assert_eq!(settings.project.kind, ProjectKind::Firmware);
        assert_eq!(settings.board.cpu.as_deref(), Some("atmega328"));
        assert_eq!(settings.build.cmake_minimum_version, "2.8.4");
        assert_eq!(settings.build.sources, vec!["blink.cpp", "led.cpp"]);
        assert_eq!(settings.values.get("debug"), Some(&SettingValue::Bool(true)));
        assert_eq!(settings.values.get("level"), Some(&SettingValue::Int(3)));
        assert_eq!(settings.commands.len(), 1);
        assert!(settings.commands[0].emit);
        assert!(settings.validate().is_empty());
    }

    #[test]
    fn test_value_map() {
        let mut settings =
            ProjectSettings::firmware("blink", "uno").with_sources(&["a.cpp", "b.cpp"]);
        settings.board.baud_rate = Some(9600);
        settings
            .values
            .insert("board".to_string(), SettingValue::Text("override".to_string()));

        let map = settings.value_map();
        assert_eq!(map.get("project_name").map(|v| v.to_string()), Some("blink".into()));
        assert_eq!(map.get("project_kind").map(|v| v.to_string()), Some("firmware".into()));
        assert_eq!(map.get("sources").map(|v| v.to_string()), Some("a.cpp;b.cpp".into()));
        assert_eq!(map.get("baud_rate").map(|v| v.to_string()), Some("9600".into()));
        assert_eq!(map.get("board").map(|v| v.to_string()), Some("override".into()));
        assert!(!map.contains("port"));
    }

    #[test]
    fn test_serial_args() {
        let mut board = BoardConfig::default();
        assert_eq!(board.serial_args(), None);

        board.baud_rate = Some(57600);
        assert_eq!(
            board.serial_args().unwrap(),
            vec!["picocom", "@SERIAL_PORT@", "-b", "57600", "-l"]
        );

        board.serial = Some(vec!["screen".into(), "@SERIAL_PORT@".into()]);
        assert_eq!(board.serial_args().unwrap(), vec!["screen", "@SERIAL_PORT@"]);
    }

    #[test]
    fn test_validate() {
        let mut settings = ProjectSettings::firmware("my blink", "");
        settings.board.baud_rate = Some(9600);

        let messages: Vec<_> = settings.validate().iter().map(|d| d.message.clone()).collect();
        assert_eq!(
            messages,
            vec![
                "project name `my blink` is not a plain identifier",
                "no board selected",
                "firmware project has no sources",
                "baud rate is set but no serial port",
            ]
        );

        settings.project.name = String::new();
        assert!(settings.validate()[0].is_error());
    }

    #[test]
    fn test_registry_with_custom_commands() {
        let mut settings = ProjectSettings::firmware("blink", "uno");
        settings.commands.push(CommandConfig {
            name: "set_author".into(),
            keyword: "set".into(),
            fixed: vec!["AUTHOR".into()],
            defaults: vec![],
            no_dupe_args: false,
            add_eol: true,
            emit: true,
            args: vec![],
        });

        let registry = settings.registry().unwrap();
        assert!(registry.get("set_author").is_some());
        assert_eq!(registry.len(), CommandRegistry::standard().len() + 1);

        settings.commands.push(settings.commands[0].clone());
        assert!(matches!(
            settings.registry(),
            Err(crate::ProjectError::Registry(_))
        ));
    }

    #[test]
    fn test_library_kind() {
        let toml = r#"
[project]
name = "leds"
kind = "library"
        "#;
        let settings: ProjectSettings = toml.parse().unwrap();
        assert_eq!(settings.project.kind, ProjectKind::Library);
        assert_eq!(settings.board.id, "");
    }
}
