//! Sidecar precompression
//!
//! Writes `<file>.gz` and `<file>.br` next to every file at or above the size
//! threshold. Runs synchronously, before the listener is bound.

use brotli::enc::BrotliEncoderParams;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::ffi::OsString;
use std::fs;
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::error::CompressionError;
use crate::http::encoding::EncodingVariant;
use crate::logger;

const BROTLI_QUALITY: i32 = 11;
const BROTLI_WINDOW: i32 = 22;
const TEMP_EXTENSION: &str = "tmp";

/// Outcome of one compression run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CompressionReport {
    /// Regular files considered
    pub files: usize,
    /// Sidecars written in this run
    pub written: usize,
    /// Sidecars already holding the encoded bytes, left untouched
    pub fresh: usize,
    /// Files below the threshold
    pub below_threshold: usize,
}

/// Produces precompressed sidecars for the served tree
#[derive(Debug, Clone)]
pub struct CompressionEngine {
    root: PathBuf,
    gzip: bool,
    brotli: bool,
    threshold: u64,
}

impl CompressionEngine {
    pub const fn new(root: PathBuf, gzip: bool, brotli: bool, threshold: u64) -> Self {
        Self {
            root,
            gzip,
            brotli,
            threshold,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.files.directory.clone(),
            config.compression.gzip,
            config.compression.brotli,
            config.compression.threshold,
        )
    }

    /// Compress the whole served root (which may itself be a single file)
    pub fn compress_root(&self) -> Result<CompressionReport, CompressionError> {
        self.compress(Path::new(""))
    }

    /// Compress a file, or every file below a directory
    ///
    /// Relative targets are resolved against the served root. A missing target is
    /// an error the caller is expected to treat as fatal.
    pub fn compress(&self, target: &Path) -> Result<CompressionReport, CompressionError> {
        let target = if target.as_os_str().is_empty() {
            self.root.clone()
        } else if target.is_absolute() {
            target.to_path_buf()
        } else {
            self.root.join(target)
        };

        let meta = fs::metadata(&target)
            .map_err(|_| CompressionError::TargetMissing(target.clone()))?;

        let mut report = CompressionReport::default();
        if meta.is_dir() {
            for entry in WalkDir::new(&target) {
                let entry = entry.map_err(|source| CompressionError::Walk {
                    path: target.clone(),
                    source,
                })?;
                // Sidecars from earlier runs are outputs, not inputs
                if entry.file_type().is_file() && !is_sidecar(entry.path()) {
                    self.compress_file(entry.path(), &mut report)?;
                }
            }
        } else {
            self.compress_file(&target, &mut report)?;
        }

        Ok(report)
    }

    fn enabled_codecs(&self) -> impl Iterator<Item = EncodingVariant> + '_ {
        EncodingVariant::PREFERENCE.into_iter().filter(|v| match v {
            EncodingVariant::Gzip => self.gzip,
            EncodingVariant::Brotli => self.brotli,
            EncodingVariant::Identity => false,
        })
    }

    fn compress_file(
        &self,
        path: &Path,
        report: &mut CompressionReport,
    ) -> Result<(), CompressionError> {
        let io_err = |source| CompressionError::Io {
            path: path.to_path_buf(),
            source,
        };

        report.files += 1;
        let meta = fs::metadata(path).map_err(io_err)?;
        if meta.len() < self.threshold {
            report.below_threshold += 1;
            return Ok(());
        }

        let mut source: Option<Vec<u8>> = None;
        // Re-encoded on every run; mtimes do not reliably track content
        for codec in self.enabled_codecs() {
            let Some(ext) = codec.sidecar_extension() else {
                continue;
            };
            if path.extension().is_some_and(|e| e == ext) {
                continue;
            }

            let sidecar = sidecar_path(path, ext);
            if source.is_none() {
                source = Some(fs::read(path).map_err(io_err)?);
            }
            let data = source.as_deref().unwrap_or_default();
            let encoded = encode(codec, data).map_err(io_err)?;

            if fs::read(&sidecar).is_ok_and(|existing| existing == encoded) {
                report.fresh += 1;
                continue;
            }
            write_atomically(&sidecar, &encoded).map_err(|source| CompressionError::Io {
                path: sidecar.clone(),
                source,
            })?;

            logger::log_compression(&sidecar, data.len(), encoded.len());
            report.written += 1;
        }

        Ok(())
    }
}

/// Compress `data` with the given codec; identity returns a copy
///
/// Output is deterministic: the gzip header carries no timestamp or name.
pub fn encode(codec: EncodingVariant, data: &[u8]) -> io::Result<Vec<u8>> {
    match codec {
        EncodingVariant::Identity => Ok(data.to_vec()),
        EncodingVariant::Gzip => {
            let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 2), Compression::best());
            encoder.write_all(data)?;
            encoder.finish()
        }
        EncodingVariant::Brotli => {
            let params = BrotliEncoderParams {
                quality: BROTLI_QUALITY,
                lgwin: BROTLI_WINDOW,
                ..Default::default()
            };
            let mut compressed = Vec::with_capacity(data.len() / 2);
            brotli::BrotliCompress(&mut Cursor::new(data), &mut compressed, &params)?;
            Ok(compressed)
        }
    }
}

fn sidecar_path(path: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(path);
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Outputs of this engine, including temp files left by an interrupted run
fn is_sidecar(path: &Path) -> bool {
    path.extension()
        .is_some_and(|e| e == "gz" || e == "br" || e == TEMP_EXTENSION)
}

/// Readers on the request path never observe a half-written sidecar
fn write_atomically(path: &Path, data: &[u8]) -> io::Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::Builder::new()
        .prefix(".sidecar-")
        .suffix(&format!(".{TEMP_EXTENSION}"))
        .tempfile_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}
