//! Shared fixtures for integration tests.
//!
//! The fake aligner is a shell script that follows MUSTANG's command line and
//! output naming. Its behavior is steered by markers in the input files:
//! - `FAIL`: print to stderr and exit 3
//! - `NOALN`: skip writing the alignment file
//! - `NOPDB`: skip writing the superposed PDB file
//! - `PARTIAL`: write the alignment, then exit 3
//! - `SLOW`: register in `<input dir>/running` for a moment and append the
//!   number of registered instances to `<input dir>/peaks`

#![allow(dead_code)]

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;
use std::io::Write;
use std::sync::{Arc, Mutex, OnceLock};
use tempfile::TempDir;
use tracing_subscriber::fmt::MakeWriter;

const FAKE_MUSTANG: &str = r#"#!/bin/sh
while [ $# -gt 0 ]; do
  case "$1" in
    -i) first="$2"; second="$3"; shift 3 ;;
    -o) stem="$2"; shift 2 ;;
    -F) format="$2"; shift 2 ;;
    *) shift ;;
  esac
done
if grep -q SLOW "$first" "$second"; then
  running="$(dirname "$first")/running"
  mkdir -p "$running"
  touch "$running/$$"
  ls "$running" | wc -l >> "$(dirname "$first")/peaks"
  sleep 0.2
  rm -f "$running/$$"
fi
if grep -q FAIL "$first" "$second"; then
  echo "MUSTANG could not align $first and $second" >&2
  exit 3
fi
ext="$format"
if [ "$format" = "fasta" ]; then ext="afasta"; fi
if ! grep -q NOALN "$first" "$second"; then
  printf '>%s\nACDEFGHIK\n' "$stem" > "$stem.$ext"
fi
if grep -q PARTIAL "$first" "$second"; then
  echo "MUSTANG stopped after writing $stem" >&2
  exit 3
fi
if ! grep -q NOPDB "$first" "$second"; then
  echo "ATOM      1  CA  ALA A   1" > "$stem.pdb"
fi
echo "<html></html>" > "$stem.html"
exit 0
"#;

static FAKE_MUSTANG_DIR: OnceLock<(TempDir, Utf8PathBuf)> = OnceLock::new();

/// Path to the fake aligner script.
///
/// Written once per test binary, before any test spawns it, so no process
/// ever executes the file while a write handle to it is open.
pub fn fake_mustang() -> Utf8PathBuf {
    let (_, path) = FAKE_MUSTANG_DIR.get_or_init(|| {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(temp_dir.path().join("mustang-fake")).unwrap();
        fs::write(&path, FAKE_MUSTANG).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        (temp_dir, path)
    });
    path.clone()
}

/// Temporary workspace with an input directory and an output directory path.
pub struct Workspace {
    _temp_dir: TempDir,
    pub root: Utf8PathBuf,
    pub input_dir: Utf8PathBuf,
    pub output_dir: Utf8PathBuf,
}

impl Workspace {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let root = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let input_dir = root.join("structures");
        fs::create_dir(&input_dir).unwrap();
        Self {
            _temp_dir: temp_dir,
            output_dir: root.join("results"),
            input_dir,
            root,
        }
    }

    /// Write `<id>.pdb` into the input directory with the given contents.
    pub fn structure(&self, id: &str, contents: &str) -> Utf8PathBuf {
        let path = self.input_dir.join(format!("{}.pdb", id));
        fs::write(&path, contents).unwrap();
        path
    }
}

/// Sorted file names in `dir`, or empty if it doesn't exist.
pub fn file_names(dir: &Utf8Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut names: Vec<String> = entries
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// In-memory log sink for a scoped tracing subscriber.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
        tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish()
    }
}

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
