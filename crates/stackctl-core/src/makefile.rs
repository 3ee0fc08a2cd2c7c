//! Makefile target discovery.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use camino::{Utf8Path, Utf8PathBuf};
use regex::Regex;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::exec::{Invocation, StreamMode};

/// A rule line: starts with an alphanumeric, no variables, comments, paths,
/// tabs or assignments before the colon, and the colon is not `:=`.
static RULE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9][^$#/\t=]*:([^=]|$)").expect("valid regex"));

/// Errors from reading a Makefile.
#[derive(Error, Debug)]
pub enum MakefileError {
    /// The file does not exist.
    #[error("Makefile not found: {0}")]
    NotFound(Utf8PathBuf),

    /// The file exists but could not be read.
    #[error("failed to read Makefile {path}: {source}")]
    Read {
        /// The Makefile.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },
}

/// Result alias for Makefile operations.
pub type MakefileResult<T> = Result<T, MakefileError>;

/// Target names defined by rule lines, deduplicated and sorted.
pub fn scan_targets(text: &str) -> Vec<String> {
    let mut targets = BTreeSet::new();
    for line in text.lines().filter(|line| RULE_LINE.is_match(line)) {
        let Some((names, _)) = line.split_once(':') else {
            continue;
        };
        targets.extend(names.split_whitespace().map(str::to_string));
    }
    targets.into_iter().collect()
}

/// A Makefile and its targets.
#[derive(Debug, Clone)]
pub struct Makefile {
    path: Utf8PathBuf,
    targets: Vec<String>,
}

impl Makefile {
    /// Read a Makefile and scan its targets.
    #[instrument(fields(path = %path))]
    pub fn load(path: &Utf8Path) -> MakefileResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                MakefileError::NotFound(path.to_path_buf())
            } else {
                MakefileError::Read {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;
        let targets = scan_targets(&text);
        debug!(count = targets.len(), "targets found");
        Ok(Self {
            path: path.to_path_buf(),
            targets,
        })
    }

    /// The file this was read from.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Target names, sorted.
    pub fn targets(&self) -> &[String] {
        &self.targets
    }

    /// `make -f <file> <target>`, run from the Makefile's directory.
    pub fn make(&self, target: &str) -> Invocation {
        let invocation = Invocation::new("make", ["-f", self.path.as_str(), target])
            .streams(StreamMode::Ignore, StreamMode::Inherit);
        match self.path.parent().filter(|dir| !dir.as_str().is_empty()) {
            Some(dir) => invocation.current_dir(dir),
            None => invocation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn scan_skips_comments_and_assignments() {
        let text = "build:\n\tcargo build\ntest: build\n\tcargo test\n# comment: not a target\nVAR := value\n";
        assert_eq!(scan_targets(text), ["build", "test"]);
    }

    #[test]
    fn scan_handles_multi_target_rules_and_duplicates() {
        let text = "lint fmt: deps\nlint:\n\techo\n";
        assert_eq!(scan_targets(text), ["fmt", "lint"]);
    }

    #[test]
    fn scan_ignores_special_and_pattern_lines() {
        let text = ".PHONY: build\n%.o: %.c\n$(OBJ): x\nsrc/main.o: main.c\nFOO=bar:baz\n\tindented: no\n";
        assert!(scan_targets(text).is_empty());
    }

    #[test]
    fn double_colon_rules_count() {
        assert_eq!(scan_targets("clean::\n"), ["clean"]);
    }

    #[test]
    fn load_and_build_invocation() {
        let tmp = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().join("Makefile")).unwrap();
        std::fs::write(&path, "build:\n\ttrue\n").unwrap();

        let makefile = Makefile::load(&path).unwrap();
        let invocation = makefile.make("build");

        assert_eq!(makefile.targets(), ["build"]);
        assert_eq!(invocation.args, ["-f", path.as_str(), "build"]);
        assert_eq!(invocation.cwd.as_deref(), path.parent());
        assert_eq!(invocation.stdout, StreamMode::Ignore);
        assert_eq!(invocation.stderr, StreamMode::Inherit);
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = Makefile::load(Utf8Path::new("/definitely/not/Makefile")).unwrap_err();
        assert!(matches!(err, MakefileError::NotFound(_)));
    }
}
