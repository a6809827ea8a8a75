mod common;

use std::sync::Arc;

use common::{new_scope, oidc_connection, store_oidc_connection, TEST_IDP_CERT_PEM};
use identity_service::models::{
    ConnectionId, ConnectionVariant, IdpCertificate, SamlConnectionId,
};
use identity_service::services::{
    ConnectionStore, InMemoryStore, SamlConnectionManager, SamlConnectionSettings,
};
use identity_service::SamlError;

fn settings(primary: bool) -> SamlConnectionSettings {
    SamlConnectionSettings {
        idp_entity_id: Some("https://idp.example.com/metadata".to_string()),
        idp_redirect_url: Some("https://idp.example.com/sso".to_string()),
        idp_certificate: None,
        is_primary: primary,
    }
}

#[tokio::test]
async fn test_newest_primary_wins() -> Result<(), anyhow::Error> {
    let store = Arc::new(InMemoryStore::new());
    let scope = new_scope();
    let manager = SamlConnectionManager::new(store.clone());

    let a = manager.create(&scope, settings(true)).await?;
    assert!(a.is_primary);

    let b = manager.create(&scope, settings(true)).await?;
    assert!(b.is_primary);
    assert!(!manager.get(&scope, a.id).await?.is_primary);

    manager.set_primary(&scope, a.id).await?;
    assert!(manager.get(&scope, a.id).await?.is_primary);
    assert!(!manager.get(&scope, b.id).await?.is_primary);

    let primaries = manager
        .list(&scope)
        .await?
        .into_iter()
        .filter(|c| c.is_primary)
        .count();
    assert_eq!(primaries, 1);
    Ok(())
}

#[tokio::test]
async fn test_primary_is_per_variant() -> Result<(), anyhow::Error> {
    let store = Arc::new(InMemoryStore::new());
    let scope = new_scope();
    let oidc = oidc_connection(scope.project_id(), "https://login.acme.test");
    store_oidc_connection(&store, &oidc).await?;

    let manager = SamlConnectionManager::new(store.clone());
    let saml = manager.create(&scope, settings(true)).await?;

    let saml_primary = store
        .primary_connection(scope.project_id(), ConnectionVariant::Saml)
        .await?
        .map(|c| c.id());
    assert_eq!(saml_primary, Some(ConnectionId::Saml(saml.id)));

    let oidc_primary = store
        .primary_connection(scope.project_id(), ConnectionVariant::Oidc)
        .await?
        .map(|c| c.id());
    assert_eq!(oidc_primary, Some(ConnectionId::Oidc(oidc.id)));

    // OIDC connections never show up in the SAML listing.
    assert_eq!(manager.list(&scope).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_certificate_accepts_der_and_pem() -> Result<(), anyhow::Error> {
    let store = Arc::new(InMemoryStore::new());
    let scope = new_scope();
    let manager = SamlConnectionManager::new(store);
    let expected = IdpCertificate::from_pem(TEST_IDP_CERT_PEM)?;

    let from_pem = manager
        .create(
            &scope,
            SamlConnectionSettings {
                idp_certificate: Some(TEST_IDP_CERT_PEM.as_bytes().to_vec()),
                ..settings(false)
            },
        )
        .await?;
    let pem = from_pem.idp_certificate.clone().unwrap_or_default();
    assert!(pem.starts_with("-----BEGIN CERTIFICATE-----"));
    assert_eq!(IdpCertificate::from_pem(&pem)?.der(), expected.der());

    let from_der = manager.create(&scope, settings(false)).await?;
    assert!(from_der.idp_certificate.is_none());
    let updated = manager
        .update_certificate(&scope, from_der.id, expected.der())
        .await?;
    let pem = updated.idp_certificate.unwrap_or_default();
    assert_eq!(IdpCertificate::from_pem(&pem)?.der(), expected.der());
    assert!(expected.subject().contains("idp.example.com"));
    Ok(())
}

#[tokio::test]
async fn test_bad_certificate_changes_nothing() -> Result<(), anyhow::Error> {
    let store = Arc::new(InMemoryStore::new());
    let scope = new_scope();
    let manager = SamlConnectionManager::new(store);

    let result = manager
        .create(
            &scope,
            SamlConnectionSettings {
                idp_certificate: Some(b"not a certificate".to_vec()),
                ..settings(true)
            },
        )
        .await;
    assert!(matches!(result, Err(SamlError::Certificate(_))));
    assert!(manager.list(&scope).await?.is_empty());

    let connection = manager
        .create(
            &scope,
            SamlConnectionSettings {
                idp_certificate: Some(TEST_IDP_CERT_PEM.as_bytes().to_vec()),
                ..settings(false)
            },
        )
        .await?;
    let truncated = &TEST_IDP_CERT_PEM.as_bytes()[..200];
    let result = manager
        .update_certificate(&scope, connection.id, truncated)
        .await;
    assert!(matches!(result, Err(SamlError::Certificate(_))));
    assert_eq!(
        manager.get(&scope, connection.id).await?.idp_certificate,
        connection.idp_certificate
    );
    Ok(())
}

#[tokio::test]
async fn test_sp_endpoints_and_tenant_isolation() -> Result<(), anyhow::Error> {
    let store = Arc::new(InMemoryStore::new());
    let scope = new_scope();
    let other = new_scope();
    let manager = SamlConnectionManager::new(store);

    let connection = manager.create(&scope, settings(false)).await?;
    assert_eq!(
        connection.sp_entity_id,
        format!("https://vault.acme.test/api/saml/v1/{}", connection.id)
    );
    assert_eq!(
        connection.sp_acs_url,
        format!("{}/acs", connection.sp_entity_id)
    );

    assert!(matches!(
        manager.get(&other, connection.id).await,
        Err(SamlError::ConnectionNotFound)
    ));
    assert!(matches!(
        manager.set_primary(&other, connection.id).await,
        Err(SamlError::ConnectionNotFound)
    ));
    assert!(matches!(
        manager.set_primary(&scope, SamlConnectionId::new()).await,
        Err(SamlError::ConnectionNotFound)
    ));
    Ok(())
}
