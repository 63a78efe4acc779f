//! Persisted feature collections.
//!
//! [`codec`] holds the binary stream format; the helpers here move streams to
//! and from files.

pub mod codec;

pub use codec::{
    decode_feature_stream, encode_feature_stream, read_feature_stream, write_feature_stream,
};

use crate::error::Result;
use crate::feature::{Feature, FeatureCollection};
use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Load every feature of a stream file.
pub fn load_feature_file<P: AsRef<Path>>(path: P) -> Result<FeatureCollection> {
    let path = path.as_ref();
    let features = read_feature_stream(BufReader::new(File::open(path)?))?;
    log::info!("Loaded {} features from {}", features.len(), path.display());
    Ok(features)
}

/// Write `features` to `path`, replacing any previous file atomically.
pub fn save_feature_file<P: AsRef<Path>>(path: P, features: &[Feature]) -> Result<()> {
    let path = path.as_ref();
    let temp_path = temp_path(path);

    let file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)?;
    let mut writer = BufWriter::new(file);
    write_feature_stream(&mut writer, features)?;
    writer.flush()?;

    let file = writer.into_inner().map_err(|e| e.into_error())?;
    file.sync_all()?;
    drop(file);

    std::fs::rename(&temp_path, path)?;
    log::debug!("Saved {} features to {}", features.len(), path.display());
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut temp = path.to_path_buf();
    if let Some(name) = temp.file_name() {
        let mut new_name = name.to_string_lossy().into_owned();
        new_name.push_str(".tmp");
        temp.set_file_name(new_name);
    }
    temp
}
