//! The boundary to the external media host that stores wallet icons and
//! receipt images.

use std::path::Path;

use crate::Error;

/// The folder on the media host an image is uploaded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaFolder {
    /// Wallet icons.
    Wallets,
    /// Transaction receipt images.
    Transactions,
}

impl MediaFolder {
    /// The folder name on the media host.
    pub fn as_str(self) -> &'static str {
        match self {
            MediaFolder::Wallets => "wallets",
            MediaFolder::Transactions => "transactions",
        }
    }
}

/// Uploads images to the media host and returns their public URL.
///
/// The services upload before writing anything to the stores, so a failed
/// upload aborts the whole operation and never leaves a half-written
/// record pointing at a missing image.
pub trait MediaUploader {
    /// Upload the image at `file` into `folder` and return its public
    /// URL.
    ///
    /// # Errors
    /// Returns [Error::Upload] if the media host rejects or fails the
    /// upload.
    fn upload(&self, file: &Path, folder: MediaFolder) -> Result<String, Error>;
}
