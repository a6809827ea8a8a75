//! Operator utility for inspecting vault identifiers and SP metadata.

use clap::{Parser, Subcommand};
use identity_service::codec::{identifier, IdKind};
use identity_service::config::IdentityConfig;
use identity_service::models::SamlConnectionId;
use identity_service::services::SpMetadata;
use identity_service::utils::time_ordered;
use service_core::error::AppError;
use service_core::observability::logging::init_tracing;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "identity-service")]
#[command(about = "Inspect vault identifiers and SAML SP metadata", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a fresh identifier of the given kind
    NewId {
        #[arg(value_parser = parse_kind)]
        kind: IdKind,
    },

    /// Decode an identifier and print its UUID form
    ParseId {
        #[arg(value_parser = parse_kind)]
        kind: IdKind,
        text: String,
    },

    /// Print the SP EntityDescriptor for a SAML connection
    SpMetadata {
        vault_domain: String,
        connection_id: SamlConnectionId,
    },
}

fn parse_kind(name: &str) -> Result<IdKind, String> {
    IdKind::from_name(name).ok_or_else(|| format!("unknown id kind {:?}", name))
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let config = IdentityConfig::from_env()?;
    init_tracing(&config.common);

    tracing::info!(
        service = %config.common.service_name,
        attempt_ttl_seconds = config.federation.attempt_ttl_seconds,
        "Identity configuration loaded"
    );

    match cli.command {
        Command::NewId { kind } => {
            let value = match kind {
                IdKind::AuditLogEvent => time_ordered::now()
                    .map_err(|e| AppError::InternalError(anyhow::Error::new(e)))?,
                _ => Uuid::new_v4(),
            };
            println!("{}", identifier::format(kind, value));
        }
        Command::ParseId { kind, text } => {
            let value = identifier::parse(kind, &text)
                .map_err(|e| AppError::BadRequest(anyhow::Error::new(e)))?;
            println!("{}", value);
            if value.get_version_num() == 7 {
                println!("{}", time_ordered::recover_timestamp(value).to_rfc3339());
            }
        }
        Command::SpMetadata {
            vault_domain,
            connection_id,
        } => {
            print!(
                "{}",
                SpMetadata::for_connection(&vault_domain, connection_id).to_xml()
            );
        }
    }

    Ok(())
}
