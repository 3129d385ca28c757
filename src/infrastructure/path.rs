use crate::domain::pipeline_logging::INTERNAL_TARGET;
use log::debug;
use std::{
    env::{self, JoinPathsError},
    ffi::{OsStr, OsString},
    path::PathBuf,
};

#[derive(Debug, thiserror::Error)]
#[error("cannot add {directory} to PATH: {source}")]
pub struct PathSupplementError {
    pub directory: String,
    #[source]
    pub source: JoinPathsError,
}

/// Prepends `directory` to an existing search path value.
pub fn supplement_path(
    directory: &str,
    existing: Option<&OsStr>,
) -> Result<OsString, PathSupplementError> {
    let mut paths = vec![PathBuf::from(directory)];
    if let Some(existing) = existing {
        paths.extend(env::split_paths(existing));
    }

    env::join_paths(paths).map_err(|source| PathSupplementError {
        directory: directory.into(),
        source,
    })
}

/// Makes `directory` the first entry of the process `PATH`, so native
/// drivers shipped next to the pipeline are found before system ones.
pub fn append_to_path(directory: &str) -> Result<(), PathSupplementError> {
    let existing = env::var_os("PATH");
    let path = supplement_path(directory, existing.as_deref())?;
    debug!(target: INTERNAL_TARGET, "PATH is now {:?}", path);
    env::set_var("PATH", path);

    Ok(())
}
