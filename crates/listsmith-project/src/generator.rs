//! Building and updating lists documents from project settings.

use crate::config::{ProjectKind, ProjectSettings};
use listsmith_cmake::{
    names, CommandNode, CommandRegistry, CommandType, ListsDocument, DEFAULT_TOOLCHAIN_FILE,
};
use std::sync::Arc;
use tracing::debug;

/// Settings-driven commands in the order they appear in a generated file.
const LAYOUT: &[&str] = &[
    names::MINIMUM_REQUIRED,
    names::TOOLCHAIN,
    names::CXX_STANDARD,
    names::PROJECT_NAME,
    names::BOARD,
    names::CPU,
    names::PROJECT,
    names::SOURCES,
    names::HEADERS,
    names::ARDUINO_LIBS,
    names::LIBS,
    names::PORT,
    names::SERIAL,
    names::PROGRAMMER,
    names::FIRMWARE,
    names::LIBRARY,
];

/// What [`Generator::update`] changed, by command type name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    pub updated: Vec<String>,
    pub inserted: Vec<String>,
    pub removed: Vec<String>,
}

impl UpdateSummary {
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.inserted.is_empty() && self.removed.is_empty()
    }
}

/// Turns project settings into lists documents.
pub struct Generator<'r> {
    registry: &'r CommandRegistry,
}

impl<'r> Generator<'r> {
    /// `registry` must contain the standard catalog (see [`ProjectSettings::registry`]).
    pub fn new(registry: &'r CommandRegistry) -> Self {
        Self { registry }
    }

    fn command_type(&self, name: &str) -> crate::Result<Arc<CommandType>> {
        self.registry.get(name).cloned().ok_or_else(|| {
            crate::ProjectError::Validation(format!("command type `{name}` is not registered"))
        })
    }

    fn node(&self, name: &str, args: Vec<String>) -> crate::Result<CommandNode> {
        Ok(CommandNode::with_args(self.command_type(name)?, args))
    }

    /// Arguments each settings-driven command should carry; `None` means
    /// the command should not be present.
    fn desired_args(&self, settings: &ProjectSettings, name: &str) -> Option<Vec<String>> {
        let build = &settings.build;
        let board = &settings.board;
        let list = |items: &[String]| (!items.is_empty()).then(|| items.to_vec());

        match name {
            names::MINIMUM_REQUIRED => Some(vec![build.cmake_minimum_version.clone()]),
            names::TOOLCHAIN => Some(vec![build
                .toolchain_file
                .clone()
                .unwrap_or_else(|| DEFAULT_TOOLCHAIN_FILE.to_string())]),
            names::CXX_STANDARD => build.cxx_standard.map(|std| vec![std.to_string()]),
            names::PROJECT_NAME => Some(vec![settings.project.name.clone()]),
            names::BOARD => Some(vec![board.id.clone()]),
            names::CPU => board.cpu.clone().map(|cpu| vec![cpu]),
            names::PROJECT => Some(Vec::new()),
            names::SOURCES => list(&build.sources),
            names::HEADERS => list(&build.headers),
            names::ARDUINO_LIBS => list(&build.arduino_libs),
            names::LIBS => list(&build.libs),
            names::PORT => board.port.clone().map(|port| vec![port]),
            names::SERIAL => board.serial_args(),
            names::PROGRAMMER => board.programmer.clone().map(|p| vec![p]),
            names::FIRMWARE => (settings.project.kind == ProjectKind::Firmware).then(Vec::new),
            names::LIBRARY => (settings.project.kind == ProjectKind::Library).then(Vec::new),
            _ => None,
        }
    }

    /// Build a fresh document for `settings`.
    pub fn generate(&self, settings: &ProjectSettings) -> crate::Result<ListsDocument> {
        let mut doc = ListsDocument::new();

        for &name in LAYOUT {
            match name {
                names::BOARD | names::SOURCES | names::FIRMWARE => doc.push_text("\n"),
                _ => {}
            }
            if name == names::PORT {
                self.push_directories(&mut doc, settings)?;
            }
            if matches!(name, names::FIRMWARE | names::LIBRARY)
                && name == self.generator_name(settings)
            {
                self.push_custom(&mut doc, settings)?;
            }
            if let Some(args) = self.desired_args(settings, name) {
                doc.append(self.node(name, args)?);
            }
        }

        debug!(
            project = %settings.project.name,
            commands = doc.commands().count(),
            "generated lists document"
        );
        Ok(doc)
    }

    fn generator_name(&self, settings: &ProjectSettings) -> &'static str {
        match settings.project.kind {
            ProjectKind::Firmware => names::FIRMWARE,
            ProjectKind::Library => names::LIBRARY,
        }
    }

    fn push_directories(
        &self,
        doc: &mut ListsDocument,
        settings: &ProjectSettings,
    ) -> crate::Result<()> {
        let build = &settings.build;
        if !build.link_directories.is_empty() {
            doc.append(self.node(names::LINK_DIRECTORIES, build.link_directories.clone())?);
        }
        if !build.include_directories.is_empty() {
            doc.append(self.node(names::INCLUDE_DIRECTORIES, build.include_directories.clone())?);
        }
        for dir in &build.subdirectories {
            doc.append(self.node(names::ADD_SUBDIRECTORY, vec![dir.clone()])?);
        }
        Ok(())
    }

    fn push_custom(
        &self,
        doc: &mut ListsDocument,
        settings: &ProjectSettings,
    ) -> crate::Result<()> {
        for command in settings.commands.iter().filter(|c| c.emit) {
            let ty = self.command_type(&command.name)?;
            doc.append(CommandNode::of_type(ty, command.args.iter().map(String::as_str)));
        }
        Ok(())
    }

    /// Bring an existing document in line with `settings`.
    ///
    /// Only the settings-driven commands are touched: existing ones get
    /// their arguments replaced, missing ones are inserted next to their
    /// layout neighbours, and ones the settings no longer call for are
    /// removed. Everything else in the document is left as it was.
    pub fn update(
        &self,
        settings: &ProjectSettings,
        doc: &mut ListsDocument,
    ) -> crate::Result<UpdateSummary> {
        let mut summary = UpdateSummary::default();
        self.swap_generator(settings, doc, &mut summary)?;

        for (index, &name) in LAYOUT.iter().enumerate() {
            let ty = self.command_type(name)?;
            match self.desired_args(settings, name) {
                Some(args) => match doc.find_first_mut(&ty) {
                    Some(node) => {
                        if node.args() != args.as_slice() {
                            node.set_args(args);
                            summary.updated.push(name.to_string());
                        }
                    }
                    None => {
                        self.insert_in_layout(doc, index, CommandNode::with_args(ty, args))?;
                        summary.inserted.push(name.to_string());
                    }
                },
                None => {
                    if doc.remove_all(|node| node.is_type(&ty)) > 0 {
                        summary.removed.push(name.to_string());
                    }
                }
            }
        }

        debug!(
            updated = summary.updated.len(),
            inserted = summary.inserted.len(),
            removed = summary.removed.len(),
            "updated lists document"
        );
        Ok(summary)
    }

    /// Replace the generator of the other project kind where it stands.
    fn swap_generator(
        &self,
        settings: &ProjectSettings,
        doc: &mut ListsDocument,
        summary: &mut UpdateSummary,
    ) -> crate::Result<()> {
        let wanted = self.generator_name(settings);
        let other = if wanted == names::FIRMWARE { names::LIBRARY } else { names::FIRMWARE };
        let wanted_ty = self.command_type(wanted)?;
        let other_ty = self.command_type(other)?;

        if doc.find_first(&wanted_ty).is_some() {
            return Ok(());
        }
        let node = CommandNode::with_args(wanted_ty, Vec::<String>::new());
        if doc.insert_before(|n| n.is_type(&other_ty), node).is_ok() {
            doc.remove_all(|n| n.is_type(&other_ty));
            summary.inserted.push(wanted.to_string());
            summary.removed.push(other.to_string());
        }
        Ok(())
    }

    /// Insert after the nearest preceding layout command present, else
    /// before the nearest following one, else at the end.
    fn insert_in_layout(
        &self,
        doc: &mut ListsDocument,
        index: usize,
        node: CommandNode,
    ) -> crate::Result<()> {
        let mut node = node;

        for &before in LAYOUT[..index].iter().rev() {
            let anchor = self.command_type(before)?;
            match doc.insert_after(|n| n.is_type(&anchor), node) {
                Ok(_) => return Ok(()),
                Err(back) => node = back,
            }
        }
        for &after in &LAYOUT[index + 1..] {
            let anchor = self.command_type(after)?;
            match doc.insert_before(|n| n.is_type(&anchor), node) {
                Ok(_) => return Ok(()),
                Err(back) => node = back,
            }
        }

        doc.append(node);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SettingValue;

    fn blink() -> ProjectSettings {
        let mut settings = ProjectSettings::firmware("blink", "uno").with_sources(&["blink.cpp"]);
        settings.build.cxx_standard = Some(11);
        settings
    }

    #[test]
    fn test_generate_minimal_firmware() {
        let settings = blink();
        let doc = Generator::new(CommandRegistry::standard()).generate(&settings).unwrap();

        insta::assert_snapshot!(doc.serialize(None), @r#"
        cmake_minimum_required(VERSION 2.8.4)
        set(CMAKE_TOOLCHAIN_FILE ${CMAKE_SOURCE_DIR}/cmake/ArduinoToolchain.cmake)
        set(CMAKE_CXX_STANDARD 11)
        set(PROJECT_NAME blink)

        set(${PROJECT_NAME}_BOARD uno)
        project(${PROJECT_NAME})

        set(${PROJECT_NAME}_SRCS blink.cpp)

        generate_arduino_firmware(${PROJECT_NAME})
        "#);
    }

    #[test]
    fn test_generate_full_library() {
        let mut settings = blink();
        settings.project.kind = crate::config::ProjectKind::Library;
        settings.board.cpu = Some("atmega328".into());
        settings.board.port = Some("/dev/ttyUSB0".into());
        settings.board.baud_rate = Some(9600);
        settings.board.programmer = Some("usbtinyisp".into());
        settings.build.headers = vec!["blink.h".into()];
        settings.build.arduino_libs = vec!["Wire".into(), "SPI".into()];
        settings.build.link_directories = vec!["${CMAKE_CURRENT_SOURCE_DIR}/libs".into()];
        settings.build.subdirectories = vec!["drivers".into()];
        settings
            .values
            .insert("author".into(), SettingValue::Text("Jane Doe".into()));
        settings.commands.push(crate::config::CommandConfig {
            name: "author".into(),
            keyword: "set".into(),
            fixed: vec!["AUTHOR".into(), "${author}".into()],
            defaults: vec![],
            no_dupe_args: false,
            add_eol: true,
            emit: true,
            args: vec![],
        });

        let registry = settings.registry().unwrap();
        let doc = Generator::new(&registry).generate(&settings).unwrap();

        insta::assert_snapshot!(doc.serialize(Some(&settings.value_map())), @r#"
        cmake_minimum_required(VERSION 2.8.4)
        set(CMAKE_TOOLCHAIN_FILE ${CMAKE_SOURCE_DIR}/cmake/ArduinoToolchain.cmake)
        set(CMAKE_CXX_STANDARD 11)
        set(PROJECT_NAME blink)

        set(${PROJECT_NAME}_BOARD uno)
        set(ARDUINO_CPU atmega328)
        project(${PROJECT_NAME})

        set(${PROJECT_NAME}_SRCS blink.cpp)
        set(${PROJECT_NAME}_HDRS blink.h)
        set(${PROJECT_NAME}_ARDLIBS Wire SPI)
        link_directories(${CMAKE_CURRENT_SOURCE_DIR}/libs)
        add_subdirectory(drivers)
        set(${PROJECT_NAME}_PORT /dev/ttyUSB0)
        set(${PROJECT_NAME}_SERIAL picocom @SERIAL_PORT@ -b 9600 -l)
        set(${PROJECT_NAME}_PROGRAMMER usbtinyisp)

        set(AUTHOR "Jane Doe")
        generate_arduino_library(${PROJECT_NAME})
        "#);
    }

    #[test]
    fn test_update_in_place() {
        let text = "\
# my project
cmake_minimum_required(VERSION 3.0)
set(PROJECT_NAME blink)
set(${PROJECT_NAME}_BOARD uno)
set(ARDUINO_CPU atmega328)
project(${PROJECT_NAME})
set(${PROJECT_NAME}_SRCS blink.cpp)
message(STATUS hello)
generate_arduino_firmware(${PROJECT_NAME})
";
        let mut doc = ListsDocument::parse(text).into_result().unwrap();

        let mut settings =
            ProjectSettings::firmware("blink", "mega").with_sources(&["blink.cpp", "led.cpp"]);
        settings.build.cmake_minimum_version = "3.0".into();
        settings.board.port = Some("/dev/ttyACM0".into());

        let summary = Generator::new(CommandRegistry::standard())
            .update(&settings, &mut doc)
            .unwrap();

        assert_eq!(summary.updated, vec![names::BOARD, names::SOURCES]);
        assert_eq!(summary.inserted, vec![names::TOOLCHAIN, names::PORT]);
        assert_eq!(summary.removed, vec![names::CPU]);

        insta::assert_snapshot!(doc.serialize(None), @r#"
        # my project
        cmake_minimum_required(VERSION 3.0)
        set(CMAKE_TOOLCHAIN_FILE ${CMAKE_SOURCE_DIR}/cmake/ArduinoToolchain.cmake)
        set(PROJECT_NAME blink)
        set(${PROJECT_NAME}_BOARD mega)
        project(${PROJECT_NAME})
        set(${PROJECT_NAME}_SRCS blink.cpp led.cpp)
        set(${PROJECT_NAME}_PORT /dev/ttyACM0)
        message(STATUS hello)
        generate_arduino_firmware(${PROJECT_NAME})
        "#);
    }

    #[test]
    fn test_update_after_trailing_comment() {
        let text = "\
set(PROJECT_NAME blink)
set(${PROJECT_NAME}_BOARD uno) # the board
project(${PROJECT_NAME})
set(EXTRA_FLAGS \"${EMPTY_FLAGS}\")
set(${PROJECT_NAME}_SRCS blink.cpp)
generate_arduino_firmware(${PROJECT_NAME})
";
        let mut doc = ListsDocument::parse(text).into_result().unwrap();

        let mut settings = ProjectSettings::firmware("blink", "uno").with_sources(&["blink.cpp"]);
        settings.board.cpu = Some("atmega328".into());
        let summary = Generator::new(CommandRegistry::standard())
            .update(&settings, &mut doc)
            .unwrap();
        assert_eq!(summary.inserted, vec![names::MINIMUM_REQUIRED, names::TOOLCHAIN, names::CPU]);

        insta::assert_snapshot!(doc.serialize(None), @r#"
        cmake_minimum_required(VERSION 2.8.4)
        set(CMAKE_TOOLCHAIN_FILE ${CMAKE_SOURCE_DIR}/cmake/ArduinoToolchain.cmake)
        set(PROJECT_NAME blink)
        set(${PROJECT_NAME}_BOARD uno) # the board
        set(ARDUINO_CPU atmega328)
        project(${PROJECT_NAME})
        set(EXTRA_FLAGS "${EMPTY_FLAGS}")
        set(${PROJECT_NAME}_SRCS blink.cpp)
        generate_arduino_firmware(${PROJECT_NAME})
        "#);
    }

    #[test]
    fn test_update_crlf_file() {
        let text = "set(PROJECT_NAME blink)\r\nset(${PROJECT_NAME}_SRCS blink.cpp)\r\n";
        let mut doc = ListsDocument::parse(text).into_result().unwrap();

        let mut settings = ProjectSettings::firmware("blink", "uno").with_sources(&["blink.cpp"]);
        settings.board.port = Some("/dev/ttyUSB0".into());
        Generator::new(CommandRegistry::standard())
            .update(&settings, &mut doc)
            .unwrap();

        let out = doc.serialize(None);
        assert!(out.contains(
            "set(${PROJECT_NAME}_SRCS blink.cpp)\r\nset(${PROJECT_NAME}_PORT /dev/ttyUSB0)\n"
        ));
        assert!(out.lines().all(|line| line.matches(')').count() <= 1), "{out}");
    }

    #[test]
    fn test_update_is_idempotent() {
        let settings = blink();
        let generator = Generator::new(CommandRegistry::standard());
        let mut doc = generator.generate(&settings).unwrap();
        let before = doc.serialize(None);

        let summary = generator.update(&settings, &mut doc).unwrap();
        assert!(summary.is_empty(), "{summary:?}");
        assert_eq!(doc.serialize(None), before);
    }

    #[test]
    fn test_update_switches_kind() {
        let mut settings = blink();
        let generator = Generator::new(CommandRegistry::standard());
        let mut doc = generator.generate(&settings).unwrap();

        settings.project.kind = crate::config::ProjectKind::Library;
        let summary = generator.update(&settings, &mut doc).unwrap();

        assert_eq!(summary.inserted, vec![names::LIBRARY]);
        assert_eq!(summary.removed, vec![names::FIRMWARE]);
        assert!(doc.serialize(None).ends_with("\ngenerate_arduino_library(${PROJECT_NAME})\n"));
    }

    #[test]
    fn test_missing_type_is_reported() {
        let registry = CommandRegistry::builder().build();
        let err = Generator::new(&registry).generate(&blink()).unwrap_err();
        assert!(matches!(err, crate::ProjectError::Validation(_)));
    }
}
