//! The standard command catalog for Arduino CMake projects.
//!
//! Specialized types carry literal fixed arguments so that parsed files
//! resolve back to them; generic per-keyword types catch everything else.

use crate::command_type::CommandType;
use crate::registry::{CommandRegistry, RegistryBuilder};

/// Names of the types in [`CommandRegistry::standard`].
pub mod names {
    pub const MINIMUM_REQUIRED: &str = "minimum_required";
    pub const TOOLCHAIN: &str = "toolchain";
    pub const CXX_STANDARD: &str = "cxx_standard";
    pub const PROJECT_NAME: &str = "project_name";
    pub const PROJECT: &str = "project_declaration";
    pub const BOARD: &str = "board";
    pub const CPU: &str = "cpu";
    pub const SOURCES: &str = "sources";
    pub const HEADERS: &str = "headers";
    pub const PORT: &str = "port";
    pub const SERIAL: &str = "serial";
    pub const PROGRAMMER: &str = "programmer";
    pub const ARDUINO_LIBS: &str = "arduino_libs";
    pub const LIBS: &str = "libs";
    pub const FIRMWARE: &str = "firmware";
    pub const LIBRARY: &str = "library";

    pub const SET: &str = "set";
    pub const PROJECT_ANY: &str = "project";
    pub const MINIMUM_REQUIRED_ANY: &str = "cmake_minimum_required";
    pub const LINK_DIRECTORIES: &str = "link_directories";
    pub const INCLUDE_DIRECTORIES: &str = "include_directories";
    pub const ADD_SUBDIRECTORY: &str = "add_subdirectory";
    pub const ADD_EXECUTABLE: &str = "add_executable";
    pub const ADD_LIBRARY: &str = "add_library";
    pub const TARGET_LINK_LIBRARIES: &str = "target_link_libraries";
    pub const MESSAGE: &str = "message";
    pub const OPTION: &str = "option";
}

/// Default toolchain file shipped with arduino-cmake.
pub const DEFAULT_TOOLCHAIN_FILE: &str = "${CMAKE_SOURCE_DIR}/cmake/ArduinoToolchain.cmake";

pub const DEFAULT_MINIMUM_VERSION: &str = "2.8.4";

pub(crate) fn standard_registry() -> CommandRegistry {
    let mut b = RegistryBuilder::default();

    b.insert(
        CommandType::new(names::MINIMUM_REQUIRED, "cmake_minimum_required")
            .with_fixed_args(["VERSION"])
            .with_default_args([DEFAULT_MINIMUM_VERSION])
            .with_no_dupe_args(true),
    );
    b.insert(
        CommandType::new(names::TOOLCHAIN, "set")
            .with_fixed_args(["CMAKE_TOOLCHAIN_FILE"])
            .with_default_args([DEFAULT_TOOLCHAIN_FILE]),
    );
    b.insert(
        CommandType::new(names::CXX_STANDARD, "set")
            .with_fixed_args(["CMAKE_CXX_STANDARD"])
            .with_default_args(["11"]),
    );
    b.insert(CommandType::new(names::PROJECT_NAME, "set").with_fixed_args(["PROJECT_NAME"]));
    b.insert(
        CommandType::new(names::PROJECT, "project")
            .with_fixed_args(["${PROJECT_NAME}"])
            .with_no_dupe_args(true),
    );

    project_var(&mut b, names::BOARD, "${PROJECT_NAME}_BOARD", false);
    b.insert(CommandType::new(names::CPU, "set").with_fixed_args(["ARDUINO_CPU"]));
    project_var(&mut b, names::SOURCES, "${PROJECT_NAME}_SRCS", true);
    project_var(&mut b, names::HEADERS, "${PROJECT_NAME}_HDRS", true);
    project_var(&mut b, names::PORT, "${PROJECT_NAME}_PORT", false);
    project_var(&mut b, names::SERIAL, "${PROJECT_NAME}_SERIAL", false);
    project_var(&mut b, names::PROGRAMMER, "${PROJECT_NAME}_PROGRAMMER", false);
    project_var(&mut b, names::ARDUINO_LIBS, "${PROJECT_NAME}_ARDLIBS", true);
    project_var(&mut b, names::LIBS, "${PROJECT_NAME}_LIBS", true);

    b.insert(
        CommandType::new(names::FIRMWARE, "generate_arduino_firmware")
            .with_fixed_args(["${PROJECT_NAME}"])
            .with_no_dupe_args(true),
    );
    b.insert(
        CommandType::new(names::LIBRARY, "generate_arduino_library")
            .with_fixed_args(["${PROJECT_NAME}"])
            .with_no_dupe_args(true),
    );

    for keyword in [
        names::SET,
        names::PROJECT_ANY,
        names::MINIMUM_REQUIRED_ANY,
        names::ADD_EXECUTABLE,
        names::ADD_LIBRARY,
        names::TARGET_LINK_LIBRARIES,
        names::MESSAGE,
        names::OPTION,
    ] {
        b.insert(CommandType::new(keyword, keyword));
    }
    for keyword in [
        names::LINK_DIRECTORIES,
        names::INCLUDE_DIRECTORIES,
        names::ADD_SUBDIRECTORY,
    ] {
        b.insert(CommandType::new(keyword, keyword).with_no_dupe_args(true));
    }

    b.build()
}

fn project_var(b: &mut RegistryBuilder, name: &str, variable: &str, no_dupe_args: bool) {
    b.insert(
        CommandType::new(name, "set")
            .with_fixed_args([variable])
            .with_no_dupe_args(no_dupe_args),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::is_identifier;
    use std::collections::HashSet;

    #[test]
    fn test_standard_catalog_is_well_formed() {
        let registry = CommandRegistry::standard();
        let mut seen = HashSet::new();
        for ty in registry.iter() {
            assert!(is_identifier(ty.command()), "{}", ty.command());
            assert!(seen.insert(ty.name().to_string()), "duplicate {}", ty.name());
        }
        assert_eq!(registry.len(), 27);
    }

    #[test]
    fn test_standard_resolution() {
        let registry = CommandRegistry::standard();

        let (ty, n) = registry.resolve("set", &["${PROJECT_NAME}_BOARD", "uno"]).unwrap();
        assert_eq!((ty.name(), n), (names::BOARD, 1));

        let (ty, n) = registry.resolve("project", &["${PROJECT_NAME}"]).unwrap();
        assert_eq!((ty.name(), n), (names::PROJECT, 1));

        let (ty, n) = registry.resolve("project", &["blink", "C", "CXX"]).unwrap();
        assert_eq!((ty.name(), n), (names::PROJECT_ANY, 0));

        let (ty, _) = registry.resolve("CMAKE_MINIMUM_REQUIRED", &["VERSION", "3.5"]).unwrap();
        assert_eq!(ty.name(), names::MINIMUM_REQUIRED);

        assert!(registry.resolve("if", &["WIN32"]).is_none());
    }
}
