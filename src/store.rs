//! Path-addressed document resources.
//!
//! An [`Object`] is a file holding one record; a [`Collection`] is a file
//! holding an array of records. Both are cheap handles over a path: they
//! hold no state besides the path and an optional callback name, and any
//! number of them may point at the same file.
//!
//! A missing file is "no data yet": reads succeed and leave the destination
//! untouched.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::codec::{self, Marshal, Transform};
use crate::error::{Error, Result};

/// Read `path`, mapping a missing file to `None`.
fn read_file(path: &Path) -> Result<Option<Vec<u8>>> {
    match std::fs::read(path) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "document does not exist yet");
            Ok(None)
        }
        Err(e) => Err(Error::io(path, e)),
    }
}

/// Replace the contents of `path`, creating parent directories as needed.
fn write_file(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    std::fs::write(path, data).map_err(|e| Error::io(path, e))?;
    debug!(path = %path.display(), bytes = data.len(), "document written");
    Ok(())
}

// ---------------------------------------------------------------------------
// Object
// ---------------------------------------------------------------------------

/// A single-record document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Object {
    path: PathBuf,
    callback: Option<String>,
}

impl Object {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            callback: None,
        }
    }

    /// Wrap written content in `name(...)`. An empty name disables wrapping.
    ///
    /// The name is checked when the document is written: names longer than
    /// [`codec::MAX_CALLBACK_LEN`] or containing brackets fail there with
    /// [`Error::Encode`], since reads could not find the wrapper again.
    #[must_use]
    pub fn with_callback(mut self, name: impl Into<String>) -> Self {
        self.callback = Some(name.into()).filter(|n: &String| !n.is_empty());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn callback(&self) -> Option<&str> {
        self.callback.as_deref()
    }

    /// Decode the file into `dest`; a missing file leaves `dest` unchanged.
    ///
    /// # Errors
    /// [`Error::Io`] if the file cannot be read, [`Error::Decode`] if its
    /// contents are not a valid record.
    pub fn read<T: DeserializeOwned>(&self, dest: &mut T) -> Result<()> {
        if let Some(value) = self.load()? {
            *dest = value;
        }
        Ok(())
    }

    /// Decode the file, or `None` if it does not exist.
    ///
    /// # Errors
    /// See [`Object::read`].
    pub fn load<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        let Some(data) = read_file(&self.path)? else {
            return Ok(None);
        };
        codec::decode_one(&data)
            .map(Some)
            .map_err(|source| Error::Decode {
                path: self.path.clone(),
                source,
            })
    }

    /// Replace the file with the encoding of `content`.
    ///
    /// With a callback set, `content` must encode to a JSON object or array.
    ///
    /// # Errors
    /// [`Error::Encode`] leaves the file untouched; [`Error::Io`] if the file
    /// or its parent directories cannot be written.
    pub fn write<T: Marshal + ?Sized>(&self, content: &T) -> Result<()> {
        let data =
            codec::encode_one(self.callback(), content).map_err(|source| Error::Encode {
                path: self.path.clone(),
                source,
            })?;
        write_file(&self.path, &data)
    }

    /// Remove the backing file.
    ///
    /// # Errors
    /// [`Error::Io`] with kind `NotFound` if the file does not exist.
    pub fn delete(&self) -> Result<()> {
        std::fs::remove_file(&self.path).map_err(|e| Error::io(&self.path, e))?;
        debug!(path = %self.path.display(), "document deleted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// An array-shaped document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Collection {
    path: PathBuf,
    callback: Option<String>,
}

impl Collection {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            callback: None,
        }
    }

    /// Wrap written content in `name(...)`. An empty name disables wrapping.
    ///
    /// The name is checked when the document is written: names longer than
    /// [`codec::MAX_CALLBACK_LEN`] or containing brackets fail there with
    /// [`Error::Encode`], since reads could not find the wrapper again.
    #[must_use]
    pub fn with_callback(mut self, name: impl Into<String>) -> Self {
        self.callback = Some(name.into()).filter(|n: &String| !n.is_empty());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn callback(&self) -> Option<&str> {
        self.callback.as_deref()
    }

    /// Decode the file into `dest`; a missing file leaves `dest` unchanged.
    ///
    /// `null` entries and elements equal to `T::default()` are dropped.
    ///
    /// # Errors
    /// [`Error::Io`] if the file cannot be read, [`Error::Decode`] if its
    /// contents are not an array of `T`.
    pub fn read<T>(&self, dest: &mut Vec<T>) -> Result<()>
    where
        T: DeserializeOwned + Default + PartialEq,
    {
        if let Some(items) = self.load()? {
            *dest = items;
        }
        Ok(())
    }

    /// Decode the file, or `None` if it does not exist.
    ///
    /// # Errors
    /// See [`Collection::read`].
    pub fn load<T>(&self) -> Result<Option<Vec<T>>>
    where
        T: DeserializeOwned + Default + PartialEq,
    {
        let Some(data) = read_file(&self.path)? else {
            return Ok(None);
        };
        codec::decode_many(&data)
            .map(Some)
            .map_err(|source| Error::Decode {
                path: self.path.clone(),
                source,
            })
    }

    /// Replace the file with `content`, passing each element through
    /// `transforms` in order.
    ///
    /// # Errors
    /// [`Error::Encode`] if a transform or marshal hook fails; the file is
    /// left untouched. [`Error::Io`] if the file cannot be written.
    pub fn write<T: Marshal>(&self, content: &[T], transforms: &[&dyn Transform<T>]) -> Result<()> {
        let data = codec::encode_many(self.callback(), content, transforms).map_err(|source| {
            Error::Encode {
                path: self.path.clone(),
                source,
            }
        })?;
        write_file(&self.path, &data)
    }
}
