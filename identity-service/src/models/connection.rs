use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use x509_parser::parse_x509_certificate;

use crate::models::{OidcConnectionId, ProjectId, SamlConnectionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionVariant {
    Oidc,
    Saml,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConnectionId {
    Oidc(OidcConnectionId),
    Saml(SamlConnectionId),
}

impl ConnectionId {
    pub fn variant(&self) -> ConnectionVariant {
        match self {
            ConnectionId::Oidc(_) => ConnectionVariant::Oidc,
            ConnectionId::Saml(_) => ConnectionVariant::Saml,
        }
    }
}

/// Client secret as stored: ciphertext from the envelope-encryption
/// collaborator. Never printed.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedSecret {
    pub key_id: String,
    pub ciphertext: Vec<u8>,
}

impl std::fmt::Debug for EncryptedSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptedSecret")
            .field("key_id", &self.key_id)
            .field("ciphertext", &format_args!("[{} bytes]", self.ciphertext.len()))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OidcConnection {
    pub id: OidcConnectionId,
    pub project_id: ProjectId,
    /// Issuer URL, compared verbatim against the `iss` claim.
    pub issuer: String,
    /// Overrides `<issuer>/.well-known/openid-configuration` when set.
    pub configuration_url: Option<String>,
    pub client_id: String,
    pub encrypted_client_secret: EncryptedSecret,
    #[serde(default)]
    pub scopes: Vec<String>,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

impl OidcConnection {
    pub fn discovery_url(&self) -> String {
        match &self.configuration_url {
            Some(url) => url.clone(),
            None => format!(
                "{}/.well-known/openid-configuration",
                self.issuer.trim_end_matches('/')
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamlConnection {
    pub id: SamlConnectionId,
    pub project_id: ProjectId,
    pub idp_entity_id: Option<String>,
    pub idp_redirect_url: Option<String>,
    pub idp_certificate: Option<IdpCertificate>,
    pub is_primary: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum FederatedConnection {
    Oidc(OidcConnection),
    Saml(SamlConnection),
}

impl FederatedConnection {
    pub fn id(&self) -> ConnectionId {
        match self {
            FederatedConnection::Oidc(c) => ConnectionId::Oidc(c.id),
            FederatedConnection::Saml(c) => ConnectionId::Saml(c.id),
        }
    }

    pub fn variant(&self) -> ConnectionVariant {
        self.id().variant()
    }

    pub fn project_id(&self) -> ProjectId {
        match self {
            FederatedConnection::Oidc(c) => c.project_id,
            FederatedConnection::Saml(c) => c.project_id,
        }
    }

    pub fn is_primary(&self) -> bool {
        match self {
            FederatedConnection::Oidc(c) => c.is_primary,
            FederatedConnection::Saml(c) => c.is_primary,
        }
    }

    pub fn set_primary(&mut self, primary: bool) {
        match self {
            FederatedConnection::Oidc(c) => c.is_primary = primary,
            FederatedConnection::Saml(c) => c.is_primary = primary,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CertificateError {
    #[error("certificate PEM could not be decoded: {0}")]
    Pem(String),

    #[error("expected a CERTIFICATE PEM block, found {0:?}")]
    UnexpectedPemTag(String),

    #[error("certificate is not valid X.509: {0}")]
    X509(String),

    #[error("certificate has {0} trailing bytes")]
    TrailingData(usize),
}

/// An IdP signing certificate, held as DER.
///
/// Every constructor re-parses the bytes as X.509, so a value of this type
/// is always a well-formed certificate.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdpCertificate {
    der: Vec<u8>,
}

impl IdpCertificate {
    pub fn from_der(der: impl Into<Vec<u8>>) -> Result<Self, CertificateError> {
        let der = der.into();
        let (rest, _) =
            parse_x509_certificate(&der).map_err(|e| CertificateError::X509(e.to_string()))?;
        if !rest.is_empty() {
            return Err(CertificateError::TrailingData(rest.len()));
        }
        Ok(Self { der })
    }

    pub fn from_pem(text: &str) -> Result<Self, CertificateError> {
        let block = pem::parse(text).map_err(|e| CertificateError::Pem(e.to_string()))?;
        if block.tag() != "CERTIFICATE" {
            return Err(CertificateError::UnexpectedPemTag(block.tag().to_string()));
        }
        Self::from_der(block.into_contents())
    }

    /// Accept either form: PEM armor is detected by its header line.
    pub fn parse(input: &[u8]) -> Result<Self, CertificateError> {
        match std::str::from_utf8(input) {
            Ok(text) if text.trim_start().starts_with("-----BEGIN") => Self::from_pem(text),
            _ => Self::from_der(input.to_vec()),
        }
    }

    pub fn der(&self) -> &[u8] {
        &self.der
    }

    /// PEM with `\n` line endings.
    pub fn to_pem(&self) -> String {
        pem::encode(&pem::Pem::new("CERTIFICATE", self.der.clone())).replace("\r\n", "\n")
    }

    pub fn subject(&self) -> String {
        parse_x509_certificate(&self.der)
            .map(|(_, cert)| cert.subject().to_string())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for IdpCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdpCertificate")
            .field("subject", &self.subject())
            .finish()
    }
}

impl TryFrom<String> for IdpCertificate {
    type Error = CertificateError;

    fn try_from(pem: String) -> Result<Self, Self::Error> {
        Self::from_pem(&pem)
    }
}

impl From<IdpCertificate> for String {
    fn from(cert: IdpCertificate) -> Self {
        cert.to_pem()
    }
}
