use tiberius::{AuthMethod, Client, Config as TiberiusConfig, SqlBrowser};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

use crate::credentials::Credentials;
use crate::error::SqlAntipathyError;

/// Type alias for SQL Server client
pub type MssqlClient = Client<Compat<TcpStream>>;

/// Translate credentials into a tiberius configuration.
///
/// A host written as `server\INSTANCE` is resolved through the SQL Browser service.
///
/// # Errors
///
/// Returns `SqlAntipathyError::ConfigError` if trusted connection is requested on a platform
/// without integrated authentication, or if neither it nor a user is given.
pub fn build_tiberius_config(credentials: &Credentials) -> Result<TiberiusConfig, SqlAntipathyError> {
    let mut config = TiberiusConfig::new();

    match credentials.host.split_once('\\') {
        Some((server, instance)) => {
            config.host(server);
            config.instance_name(instance);
        }
        None => config.host(&credentials.host),
    }
    if let Some(port) = credentials.port {
        config.port(port);
    }

    if let Some(database) = &credentials.database {
        config.database(database);
    }

    if credentials.trusted_connection {
        config.authentication(integrated_auth()?);
    } else {
        let user = credentials.user.as_deref().ok_or_else(|| {
            SqlAntipathyError::ConfigError("SQL Server login needs a user".to_string())
        })?;
        let password = credentials.password.as_deref().unwrap_or_default();
        config.authentication(AuthMethod::sql_server(user, password));
    }

    config.trust_cert();
    Ok(config)
}

#[cfg(windows)]
fn integrated_auth() -> Result<AuthMethod, SqlAntipathyError> {
    Ok(AuthMethod::Integrated)
}

#[cfg(not(windows))]
fn integrated_auth() -> Result<AuthMethod, SqlAntipathyError> {
    Err(SqlAntipathyError::ConfigError(
        "trusted connection is only available on Windows".to_string(),
    ))
}

/// Open a raw client, bounded by the credentials' login timeout.
///
/// # Errors
/// Returns `SqlAntipathyError::ConnectionError` if the MSSQL connection fails or times out.
pub async fn create_mssql_client(credentials: &Credentials) -> Result<MssqlClient, SqlAntipathyError> {
    let config = build_tiberius_config(credentials)?;
    let named_instance = credentials.host.contains('\\');

    let connect = async move {
        let tcp = if named_instance {
            TcpStream::connect_named(&config).await.map_err(|e| {
                SqlAntipathyError::ConnectionError(format!("SQL Browser lookup error: {e}"))
            })?
        } else {
            TcpStream::connect(config.get_addr()).await.map_err(|e| {
                SqlAntipathyError::ConnectionError(format!("TCP connection error: {e}"))
            })?
        };
        tcp.set_nodelay(true)
            .map_err(|e| SqlAntipathyError::ConnectionError(format!("TCP connection error: {e}")))?;

        Client::connect(config, tcp.compat_write()).await.map_err(|e| {
            SqlAntipathyError::ConnectionError(format!("SQL Server connection error: {e}"))
        })
    };

    tokio::time::timeout(credentials.timeout(), connect)
        .await
        .map_err(|_| {
            SqlAntipathyError::ConnectionError(format!(
                "SQL Server login timed out after {}s",
                credentials.timeout_secs
            ))
        })?
}
