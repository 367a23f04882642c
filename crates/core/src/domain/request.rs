// Probe Request (the two native libraries under test)

use std::ffi::{CString, OsStr};
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

/// The two libraries handed to the probe
///
/// The engine library is given to the platform loader as-is (a path or a
/// bare name resolved through the loader's search path). The extension path
/// is forwarded to the engine, so it is held as a C string.
#[derive(Debug, Clone)]
pub struct ProbeRequest {
    engine_library: PathBuf,
    extension_library: CString,
}

impl ProbeRequest {
    /// # Errors
    /// - AppError::InvalidArgument if the extension path contains a NUL byte
    pub fn new(engine_library: impl Into<PathBuf>, extension_library: impl AsRef<Path>) -> Result<Self> {
        let extension_library = to_c_string(extension_library.as_ref().as_os_str())?;
        Ok(Self {
            engine_library: engine_library.into(),
            extension_library,
        })
    }

    pub fn engine_library(&self) -> &Path {
        &self.engine_library
    }

    pub fn extension_library(&self) -> &CString {
        &self.extension_library
    }
}

/// Convert an OS string to a C string without re-encoding
pub fn to_c_string(value: &OsStr) -> Result<CString> {
    #[cfg(unix)]
    let bytes = {
        use std::os::unix::ffi::OsStrExt;
        value.as_bytes().to_vec()
    };

    #[cfg(not(unix))]
    let bytes = value
        .to_str()
        .ok_or_else(|| AppError::InvalidArgument(format!("{:?} is not valid UTF-8", value)))?
        .as_bytes()
        .to_vec();

    CString::new(bytes)
        .map_err(|_| AppError::InvalidArgument(format!("{:?} contains a NUL byte", value)))
}
