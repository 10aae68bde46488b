use std::fs;
use std::path::{Path, PathBuf};

use camino::Utf8PathBuf;
use tempfile::{Builder, TempDir};

use crate::domain::TaxId;
use crate::error::KiraError;

/// Output directory for report files. Files are staged in a scratch
/// directory next to their destination and only moved into place together.
#[derive(Debug, Clone)]
pub struct OutputStore {
    root: Utf8PathBuf,
}

impl OutputStore {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn csv_name(tax_id: &TaxId) -> String {
        format!("taxid_{tax_id}_filtered.csv")
    }

    pub fn plot_name(tax_id: &TaxId) -> String {
        format!("taxid_{tax_id}_plot.png")
    }

    pub fn csv_path(&self, tax_id: &TaxId) -> Utf8PathBuf {
        self.root.join(Self::csv_name(tax_id))
    }

    pub fn plot_path(&self, tax_id: &TaxId) -> Utf8PathBuf {
        self.root.join(Self::plot_name(tax_id))
    }

    fn fs_root(&self) -> &Path {
        if self.root.as_str().is_empty() {
            Path::new(".")
        } else {
            self.root.as_std_path()
        }
    }

    pub fn stage(&self) -> Result<Staging, KiraError> {
        let root = self.fs_root();
        fs::create_dir_all(root).map_err(|err| KiraError::Filesystem(err.to_string()))?;
        let dir = Builder::new()
            .prefix(".kira-taxscan")
            .tempdir_in(root)
            .map_err(|err| KiraError::Filesystem(err.to_string()))?;
        Ok(Staging {
            dir,
            root: root.to_path_buf(),
        })
    }
}

/// Scratch directory that disappears on drop unless committed.
pub struct Staging {
    dir: TempDir,
    root: PathBuf,
}

impl Staging {
    pub fn path(&self, file_name: &str) -> PathBuf {
        self.dir.path().join(file_name)
    }

    /// Moves every named staged file into the output directory, replacing
    /// existing files. Replaced files are parked in the scratch directory
    /// until every move succeeds and are put back if one fails.
    pub fn commit(self, file_names: &[&str]) -> Result<(), KiraError> {
        for name in file_names {
            let staged = self.path(name);
            if !staged.exists() {
                return Err(KiraError::Filesystem(format!(
                    "staged file missing: {name}"
                )));
            }
        }

        let mut committed: Vec<(&str, bool)> = Vec::with_capacity(file_names.len());
        for name in file_names {
            match self.replace(name) {
                Ok(had_previous) => committed.push((*name, had_previous)),
                Err(err) => {
                    self.rollback(&committed);
                    return Err(err);
                }
            }
        }
        Ok(())
    }

    fn previous_path(&self, file_name: &str) -> PathBuf {
        self.dir.path().join(format!(".previous-{file_name}"))
    }

    fn replace(&self, name: &str) -> Result<bool, KiraError> {
        let dest = self.root.join(name);
        let had_previous = dest.is_file();
        if had_previous {
            fs::rename(&dest, self.previous_path(name))
                .map_err(|err| KiraError::Filesystem(err.to_string()))?;
        }
        if let Err(err) = fs::rename(self.path(name), &dest) {
            if had_previous {
                self.restore(name, &dest);
            }
            return Err(KiraError::Filesystem(err.to_string()));
        }
        Ok(had_previous)
    }

    fn rollback(&self, committed: &[(&str, bool)]) {
        for (name, had_previous) in committed.iter().rev() {
            let dest = self.root.join(name);
            if *had_previous {
                self.restore(name, &dest);
            } else if let Err(err) = fs::remove_file(&dest) {
                tracing::warn!(file = %dest.display(), %err, "could not remove partial output");
            }
        }
    }

    fn restore(&self, name: &str, dest: &Path) {
        if let Err(err) = fs::rename(self.previous_path(name), dest) {
            tracing::warn!(file = %dest.display(), %err, "could not restore previous output");
        }
    }
}
