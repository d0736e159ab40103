use clap::{Parser, Subcommand};
use listsmith_cmake::{CommandRegistry, ListsDocument};
use listsmith_common::Diagnostic;
use listsmith_project::{Generator, ProjectSettings, UpdateSummary};
use miette::{miette, IntoDiagnostic, NamedSource, Result, WrapErr};
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "listsmith")]
#[command(author, version, about = "Generate and edit CMakeLists.txt files for Arduino projects")]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a CMakeLists.txt from project settings
    New {
        /// Project settings file
        #[arg(short, long, default_value = "listsmith.toml")]
        settings: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Parse lists files and report problems
    Check {
        /// Lists files to check
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Project settings providing custom command types
        #[arg(short, long)]
        settings: Option<PathBuf>,
    },

    /// Re-emit a lists file in canonical form
    Fmt {
        /// Lists file to format
        file: PathBuf,

        /// Overwrite the file instead of printing
        #[arg(short, long)]
        write: bool,

        /// Project settings providing custom command types
        #[arg(short, long)]
        settings: Option<PathBuf>,
    },

    /// Apply project settings to an existing lists file
    Update {
        /// Lists file to update
        file: PathBuf,

        /// Project settings file
        #[arg(short, long, default_value = "listsmith.toml")]
        settings: PathBuf,

        /// Overwrite the file instead of printing
        #[arg(short, long)]
        write: bool,
    },

    /// List the known command types
    Commands {
        /// Project settings providing custom command types
        #[arg(short, long)]
        settings: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::New { settings, output } => {
            let settings = load_settings(&settings)?;
            let text = generate(&settings)?;
            emit(output.as_deref(), &text)?;
        }

        Commands::Check { files, settings } => {
            let registry = registry_for(settings.as_deref())?;
            let mut failed = 0;

            for file in &files {
                match read_document(&registry, file) {
                    Ok((_, doc)) => {
                        println!("{}: OK ({} commands)", file.display(), doc.commands().count())
                    }
                    Err(e) => {
                        eprintln!("{:?}", e);
                        failed += 1;
                    }
                }
            }

            if failed > 0 {
                return Err(miette!("{failed} of {} files failed to parse", files.len()));
            }
        }

        Commands::Fmt { file, write, settings } => {
            let registry = registry_for(settings.as_deref())?;
            let (_, doc) = read_document(&registry, &file)?;
            let text = doc.serialize(None);
            emit(write.then_some(file.as_path()), &text)?;
        }

        Commands::Update { file, settings, write } => {
            let settings = load_settings(&settings)?;
            let (text, summary) = update(&settings, &file)?;
            eprintln!(
                "{}: {} updated, {} inserted, {} removed",
                file.display(),
                summary.updated.len(),
                summary.inserted.len(),
                summary.removed.len()
            );
            emit(write.then_some(file.as_path()), &text)?;
        }

        Commands::Commands { settings } => {
            let registry = registry_for(settings.as_deref())?;
            for ty in registry.iter() {
                println!("{:<24} {}({})", ty.name(), ty.command(), ty.fixed_args().join(" "));
            }
        }
    }

    Ok(())
}

/// Install the stderr log subscriber; `LISTSMITH_LOG` takes precedence over `-v`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("LISTSMITH_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Load settings and report validation findings; errors abort.
fn load_settings(path: &Path) -> Result<ProjectSettings> {
    let settings = ProjectSettings::from_file(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to load {}", path.display()))?;

    let diags = settings.validate();
    report(&diags);
    let errors = diags.iter().filter(|d| d.is_error()).count();
    if errors > 0 {
        return Err(miette!("{}: {errors} settings error(s)", path.display()));
    }
    Ok(settings)
}

fn report(diags: &[Diagnostic]) {
    for diag in diags {
        eprintln!("{:?}", miette::Report::new(diag.clone()));
    }
}

fn registry_for(settings: Option<&Path>) -> Result<CommandRegistry> {
    match settings {
        Some(path) => load_settings(path)?.registry().into_diagnostic(),
        None => Ok(CommandRegistry::standard().clone()),
    }
}

/// Read and parse a lists file, rendering every parse error against its source.
fn read_document(registry: &CommandRegistry, path: &Path) -> Result<(String, ListsDocument)> {
    let text = std::fs::read_to_string(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to read {}", path.display()))?;

    let parsed = ListsDocument::parse_with(registry, &text);
    debug!(path = %path.display(), errors = parsed.errors.len(), "read lists file");
    if parsed.has_errors() {
        let count = parsed.errors.len();
        for err in parsed.errors {
            let report = miette::Report::new(err)
                .with_source_code(NamedSource::new(path.display().to_string(), text.clone()));
            eprintln!("{:?}", report);
        }
        return Err(miette!("{}: {count} parse error(s)", path.display()));
    }

    Ok((text, parsed.document))
}

fn generate(settings: &ProjectSettings) -> Result<String> {
    let registry = settings.registry().into_diagnostic()?;
    let doc = Generator::new(&registry).generate(settings).into_diagnostic()?;
    Ok(doc.serialize(Some(&settings.value_map())))
}

fn update(settings: &ProjectSettings, path: &Path) -> Result<(String, UpdateSummary)> {
    let registry = settings.registry().into_diagnostic()?;
    let (_, mut doc) = read_document(&registry, path)?;
    let summary = Generator::new(&registry).update(settings, &mut doc).into_diagnostic()?;
    Ok((doc.serialize(Some(&settings.value_map())), summary))
}

fn emit(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, text)
                .into_diagnostic()
                .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(suffix: &str, contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::with_suffix(suffix).unwrap();
        write!(file, "{contents}").unwrap();
        file
    }

    const SETTINGS: &str = r#"
[project]
name = "blink"

[board]
id = "uno"

[build]
sources = ["blink.cpp"]
"#;

    #[test]
    fn test_cli_parses() {
        let args = ["listsmith", "-v", "update", "CMakeLists.txt", "--write"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.verbose);
        match cli.command {
            Commands::Update { file, settings, write } => {
                assert_eq!(file, PathBuf::from("CMakeLists.txt"));
                assert_eq!(settings, PathBuf::from("listsmith.toml"));
                assert!(write);
            }
            _ => panic!("expected update"),
        }
    }

    #[test]
    fn test_new_then_update() {
        let settings_file = temp_file(".toml", SETTINGS);
        let settings = load_settings(settings_file.path()).unwrap();

        let lists = temp_file(".txt", "");
        emit(Some(lists.path()), &generate(&settings).unwrap()).unwrap();

        let mut changed = settings.clone();
        changed.board.id = "mega".into();
        let (text, summary) = update(&changed, lists.path()).unwrap();

        assert_eq!(summary.updated, vec!["board"]);
        assert!(text.contains("set(${PROJECT_NAME}_BOARD mega)\n"));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let settings_file = temp_file(".toml", "[project]\nname = \"\"\n");
        assert!(load_settings(settings_file.path()).is_err());
    }

    #[test]
    fn test_read_document_reports_errors() {
        let lists = temp_file(".txt", "project(blink)\nset(A \"unterminated)\n");
        assert!(read_document(CommandRegistry::standard(), lists.path()).is_err());

        let lists = temp_file(".txt", "project(blink)\n");
        let (text, doc) = read_document(CommandRegistry::standard(), lists.path()).unwrap();
        assert_eq!(doc.serialize(None), text);
    }
}
