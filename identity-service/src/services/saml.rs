use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::instrument;

use crate::models::{
    ConnectionId, ConnectionVariant, FederatedConnection, IdpCertificate, SamlConnection,
    SamlConnectionId, TenantScope,
};
use crate::services::error::SamlError;
use crate::services::store::ConnectionStore;

/// Service-provider endpoints the IdP is configured with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpMetadata {
    pub entity_id: String,
    pub acs_url: String,
}

impl SpMetadata {
    pub fn for_connection(vault_domain: &str, connection_id: SamlConnectionId) -> Self {
        let entity_id = format!("https://{}/api/saml/v1/{}", vault_domain, connection_id);
        let acs_url = format!("{}/acs", entity_id);
        Self { entity_id, acs_url }
    }

    /// SP `EntityDescriptor` with a single HTTP-POST assertion consumer.
    pub fn to_xml(&self) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8"?>"#,
                "\n",
                r#"<md:EntityDescriptor xmlns:md="urn:oasis:names:tc:SAML:2.0:metadata" entityID="{entity_id}">"#,
                "\n",
                r#"  <md:SPSSODescriptor AuthnRequestsSigned="false" WantAssertionsSigned="true" protocolSupportEnumeration="urn:oasis:names:tc:SAML:2.0:protocol">"#,
                "\n",
                r#"    <md:NameIDFormat>urn:oasis:names:tc:SAML:1.1:nameid-format:emailAddress</md:NameIDFormat>"#,
                "\n",
                r#"    <md:AssertionConsumerService Binding="urn:oasis:names:tc:SAML:2.0:bindings:HTTP-POST" Location="{acs_url}" index="0" isDefault="true"/>"#,
                "\n",
                r#"  </md:SPSSODescriptor>"#,
                "\n",
                r#"</md:EntityDescriptor>"#,
                "\n",
            ),
            entity_id = xml_escape(&self.entity_id),
            acs_url = xml_escape(&self.acs_url),
        )
    }
}

fn xml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// Caller-facing view of a SAML connection. The certificate is always PEM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SamlConnectionView {
    pub id: SamlConnectionId,
    pub idp_entity_id: Option<String>,
    pub idp_redirect_url: Option<String>,
    pub idp_certificate: Option<String>,
    pub sp_entity_id: String,
    pub sp_acs_url: String,
    pub is_primary: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SamlConnectionSettings {
    pub idp_entity_id: Option<String>,
    pub idp_redirect_url: Option<String>,
    /// DER or PEM.
    pub idp_certificate: Option<Vec<u8>>,
    pub is_primary: bool,
}

#[derive(Clone)]
pub struct SamlConnectionManager {
    store: Arc<dyn ConnectionStore>,
}

impl SamlConnectionManager {
    pub fn new(store: Arc<dyn ConnectionStore>) -> Self {
        Self { store }
    }

    #[instrument(skip_all, fields(project_id = %scope.project_id()))]
    pub async fn create(
        &self,
        scope: &TenantScope,
        settings: SamlConnectionSettings,
    ) -> Result<SamlConnectionView, SamlError> {
        let idp_certificate = settings
            .idp_certificate
            .as_deref()
            .map(IdpCertificate::parse)
            .transpose()?;

        let connection = SamlConnection {
            id: SamlConnectionId::new(),
            project_id: scope.project_id(),
            idp_entity_id: settings.idp_entity_id,
            idp_redirect_url: settings.idp_redirect_url,
            idp_certificate,
            is_primary: settings.is_primary,
            created_at: Utc::now(),
        };
        self.store
            .save_connection(FederatedConnection::Saml(connection.clone()))
            .await?;

        tracing::info!(connection_id = %connection.id, primary = connection.is_primary, "SAML connection created");
        Ok(view(scope, &connection))
    }

    /// Replace the IdP certificate. The input is validated before anything
    /// is written.
    #[instrument(skip_all, fields(project_id = %scope.project_id(), connection_id = %id))]
    pub async fn update_certificate(
        &self,
        scope: &TenantScope,
        id: SamlConnectionId,
        certificate: &[u8],
    ) -> Result<SamlConnectionView, SamlError> {
        let certificate = IdpCertificate::parse(certificate)?;
        let mut connection = self.load(scope, id).await?;
        connection.idp_certificate = Some(certificate);
        self.store
            .save_connection(FederatedConnection::Saml(connection.clone()))
            .await?;
        Ok(view(scope, &connection))
    }

    #[instrument(skip_all, fields(project_id = %scope.project_id(), connection_id = %id))]
    pub async fn set_primary(
        &self,
        scope: &TenantScope,
        id: SamlConnectionId,
    ) -> Result<(), SamlError> {
        if !self
            .store
            .set_primary(scope.project_id(), ConnectionId::Saml(id))
            .await?
        {
            return Err(SamlError::ConnectionNotFound);
        }
        tracing::info!("SAML connection set as primary");
        Ok(())
    }

    pub async fn get(
        &self,
        scope: &TenantScope,
        id: SamlConnectionId,
    ) -> Result<SamlConnectionView, SamlError> {
        let connection = self.load(scope, id).await?;
        Ok(view(scope, &connection))
    }

    pub async fn list(&self, scope: &TenantScope) -> Result<Vec<SamlConnectionView>, SamlError> {
        let connections = self
            .store
            .list_connections(scope.project_id(), ConnectionVariant::Saml)
            .await?;
        Ok(connections
            .into_iter()
            .filter_map(|c| match c {
                FederatedConnection::Saml(c) => Some(view(scope, &c)),
                FederatedConnection::Oidc(_) => None,
            })
            .collect())
    }

    async fn load(
        &self,
        scope: &TenantScope,
        id: SamlConnectionId,
    ) -> Result<SamlConnection, SamlError> {
        match self
            .store
            .get_connection(scope.project_id(), ConnectionId::Saml(id))
            .await?
        {
            Some(FederatedConnection::Saml(connection)) => Ok(connection),
            _ => Err(SamlError::ConnectionNotFound),
        }
    }
}

fn view(scope: &TenantScope, connection: &SamlConnection) -> SamlConnectionView {
    let sp = SpMetadata::for_connection(scope.vault_domain(), connection.id);
    SamlConnectionView {
        id: connection.id,
        idp_entity_id: connection.idp_entity_id.clone(),
        idp_redirect_url: connection.idp_redirect_url.clone(),
        idp_certificate: connection.idp_certificate.as_ref().map(IdpCertificate::to_pem),
        sp_entity_id: sp.entity_id,
        sp_acs_url: sp.acs_url,
        is_primary: connection.is_primary,
    }
}
