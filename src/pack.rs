// siteback: site backup and restore.
// Copyright 2026 Martin Pool.

// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.

//! Pack a staging directory into one compressed archive file, and unpack it again.
//!
//! Archives are gzip-compressed tar files, with paths relative to the staging
//! root. The tar is first written uncompressed to an intermediate file next to
//! the destination, then compressed into a second temporary file that replaces
//! the destination, so a failure never leaves a truncated archive behind.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use tracing::{debug, info, warn};

use crate::live_tree::Kind;
use crate::monitor::collect::CollectMonitor;
use crate::*;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Pack everything under `staging_root` into a compressed archive at `archive_path`.
///
/// Fails with [Error::ArchiveExists] before doing any work if the archive
/// already exists and `overwrite` is false.
pub fn pack(staging_root: &Path, archive_path: &Path, overwrite: bool) -> Result<PathBuf> {
    if archive_path.exists() && !overwrite {
        return Err(Error::ArchiveExists {
            path: archive_path.to_owned(),
        });
    }
    let write_err = |source: io::Error| Error::WriteArchive {
        path: archive_path.to_owned(),
        source,
    };
    let parent = match archive_path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_owned(),
        _ => PathBuf::from("."),
    };
    fs::create_dir_all(&parent).map_err(write_err)?;

    // Removed when dropped, on every return path.
    let mut intermediate = tempfile::Builder::new()
        .prefix(".siteback-")
        .suffix(".tar")
        .tempfile_in(&parent)
        .map_err(write_err)?;
    write_tar(staging_root, intermediate.as_file_mut()).map_err(|err| match err {
        Error::IOError { source } => write_err(source),
        err => err,
    })?;
    let tar_len = intermediate.as_file().metadata().map_err(write_err)?.len();
    debug!(tar_len, "Wrote intermediate tar");

    let mut compressed = tempfile::Builder::new()
        .prefix(".siteback-")
        .suffix(".tar.gz")
        .tempfile_in(&parent)
        .map_err(write_err)?;
    compress(intermediate.as_file_mut(), compressed.as_file_mut()).map_err(write_err)?;
    compressed
        .persist(archive_path)
        .map_err(|err| write_err(err.error))?;
    let archive_len = fs::metadata(archive_path).map_err(write_err)?.len();
    info!(
        "Wrote archive {archive_path:?} ({})",
        crate::misc::bytes_to_human_mb(archive_len)
    );
    Ok(archive_path.to_owned())
}

fn write_tar(staging_root: &Path, out: &mut File) -> Result<()> {
    let mut builder = tar::Builder::new(BufWriter::new(out));
    builder.follow_symlinks(false);
    let tree = LiveTree::open(staging_root)?;
    for entry in tree.iter_entries(Exclude::nothing(), Arc::new(CollectMonitor::new()))? {
        let entry = entry?;
        if entry.apath.is_root() {
            continue;
        }
        if entry.kind == Kind::Unknown {
            warn!("Skipping special file {}", entry.apath);
            continue;
        }
        let path = entry.apath.below(staging_root);
        builder.append_path_with_name(&path, entry.apath.relative_str())?;
    }
    builder.into_inner()?.flush()?;
    Ok(())
}

fn compress(tar_file: &mut File, out: &mut File) -> io::Result<()> {
    tar_file.seek(SeekFrom::Start(0))?;
    let mut encoder = GzEncoder::new(BufWriter::new(out), Compression::default());
    io::copy(&mut BufReader::new(tar_file), &mut encoder)?;
    encoder.finish()?.flush()?;
    Ok(())
}

/// Unpack an archive into a new temporary staging directory.
///
/// Gzip-compressed and plain tar archives are both accepted.
pub fn unpack(archive_path: &Path) -> Result<StagingDir> {
    let read_err = |source: io::Error| Error::ReadArchive {
        path: archive_path.to_owned(),
        source,
    };
    let mut file = File::open(archive_path).map_err(read_err)?;
    let mut magic = [0u8; 2];
    let compressed = match file.read_exact(&mut magic) {
        Ok(()) => magic == GZIP_MAGIC,
        Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => false,
        Err(err) => return Err(read_err(err)),
    };
    file.seek(SeekFrom::Start(0)).map_err(read_err)?;
    let staging = StagingDir::temporary()?;
    let reader = BufReader::new(file);
    if compressed {
        unpack_tar(GzDecoder::new(reader), staging.path()).map_err(read_err)?;
    } else {
        unpack_tar(reader, staging.path()).map_err(read_err)?;
    }
    debug!(?archive_path, staging = ?staging.path(), compressed, "Unpacked archive");
    Ok(staging)
}

fn unpack_tar<R: Read>(reader: R, dest: &Path) -> io::Result<()> {
    let mut archive = tar::Archive::new(reader);
    archive.set_preserve_mtime(true);
    archive.set_preserve_permissions(true);
    // Entries whose paths would escape `dest` are skipped by the tar crate.
    archive.unpack(dest)
}
