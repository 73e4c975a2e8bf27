//! Ed25519 key and certificate encoding helpers.
//!
//! A signer "certificate" here is the SPKI DER encoding of an Ed25519 public
//! key; its thumbprint is the SHA-256 of those bytes.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use ed25519_dalek::{SigningKey, VerifyingKey};
use pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use sigvet_core::Thumbprint;

use crate::error::{RegistryError, RegistryResult};

/// File name of the PKCS#8 PEM private key written by [`Keypair::write_pem_files`].
pub const PRIVATE_KEY_FILE: &str = "private_key.pem";

/// File name of the SPKI PEM public key written by [`Keypair::write_pem_files`].
pub const PUBLIC_KEY_FILE: &str = "public_key.pem";

/// Signing algorithm name written into signature entries.
pub const ALGORITHM_ED25519: &str = "Ed25519";

/// SPKI DER certificate for a verifying key.
pub fn certificate_der(key: &VerifyingKey) -> RegistryResult<Vec<u8>> {
    let doc = key
        .to_public_key_der()
        .map_err(|e| RegistryError::Certificate {
            message: format!("failed to encode public key: {}", e),
        })?;
    Ok(doc.as_bytes().to_vec())
}

/// Decode an SPKI DER certificate into a verifying key.
pub fn verifying_key_from_certificate(der: &[u8]) -> RegistryResult<VerifyingKey> {
    VerifyingKey::from_public_key_der(der).map_err(|e| RegistryError::Certificate {
        message: format!("invalid SPKI public key: {}", e),
    })
}

/// Certificate DER from an SPKI PEM public key.
pub fn certificate_from_public_pem(pem: &str) -> RegistryResult<Vec<u8>> {
    let key = VerifyingKey::from_public_key_pem(pem).map_err(|e| RegistryError::Certificate {
        message: format!("invalid SPKI PEM public key: {}", e),
    })?;
    certificate_der(&key)
}

/// Load a PKCS#8 PEM private key.
pub fn signing_key_from_pem(pem: &str) -> RegistryResult<SigningKey> {
    SigningKey::from_pkcs8_pem(pem).map_err(|e| RegistryError::Certificate {
        message: format!("invalid PKCS#8 PEM private key: {}", e),
    })
}

/// Paths of a keypair on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeypairFiles {
    pub private_key: PathBuf,
    pub public_key: PathBuf,
}

impl KeypairFiles {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            private_key: dir.join(PRIVATE_KEY_FILE),
            public_key: dir.join(PUBLIC_KEY_FILE),
        }
    }
}

/// A package signing keypair.
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// Fresh keypair from the OS-seeded thread RNG.
    pub fn generate() -> Self {
        Self {
            signing_key: SigningKey::generate(&mut rand::thread_rng()),
        }
    }

    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }

    /// SPKI DER certificate of the public half.
    pub fn certificate(&self) -> RegistryResult<Vec<u8>> {
        certificate_der(&self.signing_key.verifying_key())
    }

    /// Thumbprint the registry will know this signer by.
    pub fn thumbprint(&self) -> RegistryResult<Thumbprint> {
        Ok(Thumbprint::of_certificate(&self.certificate()?))
    }

    pub fn public_pem(&self) -> RegistryResult<String> {
        self.signing_key
            .verifying_key()
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| RegistryError::Certificate {
                message: format!("failed to encode SPKI PEM: {}", e),
            })
    }

    /// Write `private_key.pem` (owner-only on unix) and `public_key.pem`.
    ///
    /// Without `overwrite`, nothing is written if either file exists.
    pub fn write_pem_files(&self, dir: &Path, overwrite: bool) -> RegistryResult<KeypairFiles> {
        let files = KeypairFiles::in_dir(dir);
        if !overwrite {
            if let Some(existing) = [&files.private_key, &files.public_key]
                .into_iter()
                .find(|p| p.exists())
            {
                return Err(RegistryError::Exists {
                    message: existing.display().to_string(),
                });
            }
        }

        fs::create_dir_all(dir).map_err(|e| io_error(dir, e))?;

        let private_pem = self
            .signing_key
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| RegistryError::Certificate {
                message: format!("failed to encode PKCS#8 PEM: {}", e),
            })?;
        write_owner_only(&files.private_key, private_pem.as_bytes())?;
        fs::write(&files.public_key, self.public_pem()?)
            .map_err(|e| io_error(&files.public_key, e))?;

        Ok(files)
    }
}

fn io_error(path: &Path, err: std::io::Error) -> RegistryError {
    RegistryError::Io {
        message: format!("{}: {}", path.display(), err),
    }
}

fn write_owner_only(path: &Path, content: &[u8]) -> RegistryResult<()> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
        options.mode(0o600);
        // `mode` only applies on creation; tighten a replaced file too.
        if path.exists() {
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))
                .map_err(|e| io_error(path, e))?;
        }
    }

    let mut file = options.open(path).map_err(|e| io_error(path, e))?;
    file.write_all(content).map_err(|e| io_error(path, e))
}
