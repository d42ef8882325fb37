//! Client-certificate TLS configuration.
//!
//! Builds a mutual-TLS context from a PEM certificate and key. The context
//! pins the negotiated protocol to exactly one version and also trusts the
//! client certificate as a root, for private endpoints that share a CA
//! bundle with their clients.
//!
//! Hostname verification is turned off whenever this context is used. That
//! is a known weakening; callers that need hostname checks must not use it.

use std::path::{Path, PathBuf};

use reqwest::{Certificate, ClientBuilder, Identity, tls};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use foldmcp_core::Error;

/// Protocol versions that can be pinned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum TlsVersion {
    #[serde(rename = "TLSv1_2")]
    Tls12,
    #[default]
    #[serde(rename = "TLSv1_3")]
    Tls13,
}

impl TlsVersion {
    fn as_reqwest(self) -> tls::Version {
        match self {
            TlsVersion::Tls12 => tls::Version::TLS_1_2,
            TlsVersion::Tls13 => tls::Version::TLS_1_3,
        }
    }
}

/// Loaded client identity plus the pinned protocol version.
#[derive(Clone)]
pub struct TlsContext {
    identity: Identity,
    root: Certificate,
    version: TlsVersion,
}

impl std::fmt::Debug for TlsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TlsContext").field("version", &self.version).finish_non_exhaustive()
    }
}

impl TlsContext {
    /// Load a context from explicit paths, falling back to configured defaults.
    ///
    /// # Errors
    ///
    /// - `Error::Config` if a path is unset in both places, or the PEM is unusable
    /// - `Error::FileNotFound` if a path does not reference an existing file
    pub async fn build(
        cert_file: Option<&Path>, key_file: Option<&Path>, defaults: (Option<&Path>, Option<&Path>),
        version: TlsVersion,
    ) -> Result<Self, Error> {
        let cert_path = resolve_path(cert_file, defaults.0, "certificate", "ssl_cert_file / SSL_CERT_FILE")?;
        let key_path = resolve_path(key_file, defaults.1, "key", "ssl_key_file / SSL_KEY_FILE")?;

        let cert_pem = read_pem(&cert_path, "certificate").await?;
        let key_pem = read_pem(&key_path, "key").await?;

        let context = Self::from_pem(&cert_pem, &key_pem, version)?;
        tracing::debug!(cert = %cert_path.display(), ?version, "built client TLS context");
        Ok(context)
    }

    /// Build a context from PEM bytes already in memory.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if the certificate or key cannot be parsed.
    pub fn from_pem(cert_pem: &[u8], key_pem: &[u8], version: TlsVersion) -> Result<Self, Error> {
        let mut identity_pem = key_pem.to_vec();
        identity_pem.push(b'\n');
        identity_pem.extend_from_slice(cert_pem);

        let identity =
            Identity::from_pem(&identity_pem).map_err(|e| Error::Config(format!("invalid client identity: {e}")))?;
        let root = Certificate::from_pem(cert_pem).map_err(|e| Error::Config(format!("invalid certificate: {e}")))?;

        Ok(Self { identity, root, version })
    }

    /// The pinned protocol version.
    pub fn version(&self) -> TlsVersion {
        self.version
    }

    /// Apply identity, trust root, version pinning, and the hostname policy.
    pub fn apply(&self, builder: ClientBuilder) -> ClientBuilder {
        let version = self.version.as_reqwest();
        builder
            .identity(self.identity.clone())
            .add_root_certificate(self.root.clone())
            .min_tls_version(version)
            .max_tls_version(version)
            .danger_accept_invalid_hostnames(true)
    }
}

async fn read_pem(path: &Path, what: &str) -> Result<Vec<u8>, Error> {
    let is_file = tokio::fs::metadata(path).await.is_ok_and(|meta| meta.is_file());
    if !is_file {
        return Err(Error::FileNotFound(format!("{what} file not found at {}", path.display())));
    }

    tokio::fs::read(path)
        .await
        .map_err(|e| Error::Config(format!("cannot read {what} {}: {e}", path.display())))
}

fn resolve_path(explicit: Option<&Path>, fallback: Option<&Path>, what: &str, hint: &str) -> Result<PathBuf, Error> {
    explicit
        .or(fallback)
        .map(Path::to_path_buf)
        .ok_or_else(|| Error::Config(format!("{what} file path not provided and {hint} not set")))
}
