//! Reading Office Open XML packages that may be password protected.
//!
//! Unprotected `.xlsx`/`.docx` files are zip archives. Protected ones are
//! OLE compound files wrapping an encrypted package; those are decrypted in
//! memory and never written to disk in clear.

use std::path::Path;

use tracing::debug;

use crate::LoadError;

/// Leading bytes of an OLE compound file.
const OLE_SIGNATURE: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];

/// Whether the bytes look like an encrypted OOXML package.
pub fn is_encrypted(bytes: &[u8]) -> bool {
    bytes.starts_with(&OLE_SIGNATURE)
}

/// Read a package into memory, decrypting it when it is protected.
///
/// A protected file without a passphrase fails with
/// [`LoadError::PassphraseRequired`]; an unprotected file ignores the
/// passphrase.
pub fn read_package(path: &Path, passphrase: Option<&str>) -> Result<Vec<u8>, LoadError> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    if !is_encrypted(&bytes) {
        return Ok(bytes);
    }

    let Some(passphrase) = passphrase else {
        return Err(LoadError::PassphraseRequired(path.to_path_buf()));
    };
    debug!(path = %path.display(), "decrypting protected package");
    office_crypto::decrypt_from_file(path, passphrase).map_err(|e| LoadError::Decrypt {
        path: path.to_path_buf(),
        reason: format!("{e:?}"),
    })
}
