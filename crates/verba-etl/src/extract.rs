//! Archive extraction with member whitelisting and zip-slip defense.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, warn};
use verba_core::DataKind;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("opening archive {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("reading archive {path}: {source}")]
    Zip {
        path: String,
        #[source]
        source: zip::result::ZipError,
    },
    #[error("archive member {0:?} resolves outside the destination directory")]
    UnsafePath(String),
    #[error("writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ExtractionSummary {
    pub extracted: usize,
    pub skipped: usize,
}

fn member_is_ingested(name: &str) -> bool {
    DataKind::ALL
        .iter()
        .filter(|kind| !kind.is_ingested())
        .all(|kind| !name.ends_with(kind.file_suffix()))
}

/// Extracts the whitelisted members of `archive` into `dest`, overwriting
/// existing files. Any member whose resolved path would escape `dest`
/// fails the archive wholesale before anything is written.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<ExtractionSummary, ExtractError> {
    fs::create_dir_all(dest).map_err(|source| ExtractError::Io {
        path: dest.display().to_string(),
        source,
    })?;

    let file = fs::File::open(archive).map_err(|source| ExtractError::Open {
        path: archive.display().to_string(),
        source,
    })?;
    let mut zip = zip::ZipArchive::new(file).map_err(|source| ExtractError::Zip {
        path: archive.display().to_string(),
        source,
    })?;

    // Path-safety pass first: a single hostile member rejects the archive
    // before any file lands on disk.
    for index in 0..zip.len() {
        let member = zip.by_index(index).map_err(|source| ExtractError::Zip {
            path: archive.display().to_string(),
            source,
        })?;
        if member.enclosed_name().is_none() {
            return Err(ExtractError::UnsafePath(member.name().to_string()));
        }
    }

    let mut summary = ExtractionSummary::default();
    for index in 0..zip.len() {
        let mut member = zip.by_index(index).map_err(|source| ExtractError::Zip {
            path: archive.display().to_string(),
            source,
        })?;
        let relative: PathBuf = match member.enclosed_name() {
            Some(name) => name,
            None => return Err(ExtractError::UnsafePath(member.name().to_string())),
        };

        if !member_is_ingested(member.name()) {
            summary.skipped += 1;
            debug!(member = member.name(), "skipping unused member");
            continue;
        }
        if member.is_dir() {
            continue;
        }

        let target = dest.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(|source| ExtractError::Io {
                path: parent.display().to_string(),
                source,
            })?;
        }
        let mut out = fs::File::create(&target).map_err(|source| ExtractError::Io {
            path: target.display().to_string(),
            source,
        })?;
        io::copy(&mut member, &mut out).map_err(|source| ExtractError::Io {
            path: target.display().to_string(),
            source,
        })?;
        summary.extracted += 1;
    }

    info!(
        dest = %dest.display(),
        extracted = summary.extracted,
        skipped = summary.skipped,
        "extraction completed"
    );
    Ok(summary)
}

/// Per-day working directory, removed on drop so cleanup happens on every
/// exit path, including unwinding.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
}

impl WorkDir {
    pub fn create(path: PathBuf) -> Result<Self, ExtractError> {
        fs::create_dir_all(&path).map_err(|source| ExtractError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if let Err(error) = fs::remove_dir_all(&self.path) {
            warn!(path = %self.path.display(), %error, "failed to remove working directory");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn build_archive(members: &[(&str, &str)]) -> tempfile::NamedTempFile {
        let file = tempfile::NamedTempFile::new().unwrap();
        let mut writer = zip::ZipWriter::new(file.reopen().unwrap());
        for (name, body) in members {
            writer
                .start_file(name.to_string(), SimpleFileOptions::default())
                .unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap();
        file
    }

    #[test]
    fn extracts_whitelisted_members_only() {
        let archive = build_archive(&[
            ("20250116_Despesas_Empenho.csv", "a;b\n1;2\n"),
            ("20250116_Despesas_Pagamento_ListaBancos.csv", "x;y\n"),
            ("20250116_Despesas_Pagamento_ListaFaturas.csv", "x;y\n"),
            ("20250116_Despesas_Pagamento_ListaPrecatorios.csv", "x;y\n"),
            ("20250116_Despesas_Liquidacao.csv", "c;d\n3;4\n"),
        ]);
        let dest = tempfile::tempdir().unwrap();

        let summary = extract_archive(archive.path(), dest.path()).unwrap();
        assert_eq!(summary.extracted, 2);
        assert_eq!(summary.skipped, 3);
        assert!(dest.path().join("20250116_Despesas_Empenho.csv").exists());
        assert!(!dest
            .path()
            .join("20250116_Despesas_Pagamento_ListaBancos.csv")
            .exists());
    }

    #[test]
    fn overwrites_existing_destination_files() {
        let archive = build_archive(&[("20250116_Despesas_Empenho.csv", "fresh")]);
        let dest = tempfile::tempdir().unwrap();
        std::fs::write(dest.path().join("20250116_Despesas_Empenho.csv"), "stale").unwrap();

        extract_archive(archive.path(), dest.path()).unwrap();
        let body =
            std::fs::read_to_string(dest.path().join("20250116_Despesas_Empenho.csv")).unwrap();
        assert_eq!(body, "fresh");
    }

    #[test]
    fn zip_slip_member_rejects_the_whole_archive() {
        let archive = build_archive(&[
            ("../outside.csv", "evil"),
            ("20250116_Despesas_Empenho.csv", "a;b\n1;2\n"),
        ]);
        let dest = tempfile::tempdir().unwrap();

        let result = extract_archive(archive.path(), dest.path());
        assert!(matches!(result, Err(ExtractError::UnsafePath(_))));
        // Nothing may have been written.
        assert_eq!(std::fs::read_dir(dest.path()).unwrap().count(), 0);
    }

    #[test]
    fn workdir_removes_itself_on_drop() {
        let base = tempfile::tempdir().unwrap();
        let inner = base.path().join("despesas_20250116");
        {
            let workdir = WorkDir::create(inner.clone()).unwrap();
            std::fs::write(workdir.path().join("f.csv"), "x").unwrap();
            assert!(inner.exists());
        }
        assert!(!inner.exists());
    }
}
