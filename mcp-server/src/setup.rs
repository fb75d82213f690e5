use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

use ticktick_client::{OAuth2Session, OAuthConfig, TickTickHttpClient};

use crate::config::Config;
use crate::stdio::StdioMcpServer;

/// Default location of the `.env` file with the TickTick credentials.
pub const DEFAULT_DOTENV_DIR: &str = "~/.config/ticktick-mcp";

/// Name of the OAuth token cache file inside the dotenv directory.
const TOKEN_CACHE_FILE: &str = ".token-oauth";

/// Expand a leading `~` and make sure the directory exists.
pub fn resolve_dotenv_dir(raw: &str) -> Result<PathBuf> {
    let expanded = expand_home(raw)?;
    std::fs::create_dir_all(&expanded)
        .with_context(|| format!("Failed to create directory {}", expanded.display()))?;
    info!(dir = %expanded.display(), "using dotenv directory");
    Ok(expanded)
}

fn expand_home(raw: &str) -> Result<PathBuf> {
    if let Some(rest) = raw.strip_prefix("~/") {
        let home = dirs::home_dir().context("Could not determine the home directory")?;
        return Ok(home.join(rest));
    }
    if raw == "~" {
        return dirs::home_dir().context("Could not determine the home directory");
    }
    Ok(PathBuf::from(raw))
}

/// Load the required `.env` file from the dotenv directory. Missing file is
/// a fatal startup error; the message spells out what the file must contain.
pub fn load_env_file(dir: &Path) -> Result<PathBuf> {
    let env_path = dir.join(".env");
    if !env_path.is_file() {
        anyhow::bail!(
            "Required .env file not found at {}.\n\
             Create it with your TickTick credentials:\n\
             \x20 TICKTICK_CLIENT_ID=your_client_id\n\
             \x20 TICKTICK_CLIENT_SECRET=your_client_secret\n\
             \x20 TICKTICK_REDIRECT_URI=your_redirect_uri\n\
             \x20 TICKTICK_USERNAME=your_ticktick_email\n\
             \x20 TICKTICK_PASSWORD=your_ticktick_password",
            env_path.display()
        );
    }

    dotenv::from_path(&env_path)
        .with_context(|| format!("Failed to load environment from {}", env_path.display()))?;
    info!(path = %env_path.display(), "loaded environment variables");
    Ok(env_path)
}

/// Build the authenticated TickTick client.
///
/// Obtaining the OAuth token may require the interactive authorization flow
/// on first run; that happens before the stdio transport starts, so the
/// prompt on stderr does not interleave with protocol traffic.
pub async fn initialize_client(
    config: &Config,
    dotenv_dir: &Path,
) -> Result<Arc<TickTickHttpClient>> {
    let creds = &config.credentials;

    let oauth = OAuth2Session::new(OAuthConfig {
        client_id: creds.client_id.clone(),
        client_secret: creds.client_secret.clone(),
        redirect_uri: creds.redirect_uri.clone(),
        cache_path: dotenv_dir.join(TOKEN_CACHE_FILE),
    })
    .context("Failed to set up the OAuth session")?;

    let token = oauth
        .access_token()
        .await
        .context("Failed to obtain an OAuth token")?;

    let client = TickTickHttpClient::connect(&creds.username, &creds.password, &token)
        .await
        .context("Failed to connect to TickTick")?;

    info!("TickTick client initialized");
    Ok(Arc::new(client))
}

/// Initialize the complete application: client plus stdio server.
pub async fn initialize_app(
    config: &Config,
    dotenv_dir: &Path,
) -> Result<StdioMcpServer<TickTickHttpClient>> {
    let client = initialize_client(config, dotenv_dir)
        .await
        .context("Failed to initialize the TickTick client")?;
    Ok(StdioMcpServer::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_dotenv_dir_creates_missing_dirs() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("nested").join("ticktick-mcp");
        let resolved = resolve_dotenv_dir(target.to_str().unwrap()).unwrap();
        assert!(resolved.is_dir());
    }

    #[test]
    fn test_expand_home_prefix() {
        let expanded = expand_home("~/.config/ticktick-mcp").unwrap();
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.ends_with(".config/ticktick-mcp"));

        let plain = expand_home("/tmp/somewhere").unwrap();
        assert_eq!(plain, PathBuf::from("/tmp/somewhere"));
    }

    #[test]
    fn test_load_env_file_missing_is_fatal_with_guidance() {
        let temp = TempDir::new().unwrap();
        let error = load_env_file(temp.path()).unwrap_err().to_string();
        assert!(error.contains(".env file not found"));
        assert!(error.contains("TICKTICK_CLIENT_ID"));
        assert!(error.contains("TICKTICK_PASSWORD"));
    }

    #[test]
    fn test_load_env_file_reads_variables() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(".env"),
            "TICKTICK_TEST_MARKER=loaded-from-env-file\n",
        )
        .unwrap();

        load_env_file(temp.path()).unwrap();
        assert_eq!(
            std::env::var("TICKTICK_TEST_MARKER").unwrap(),
            "loaded-from-env-file"
        );
        std::env::remove_var("TICKTICK_TEST_MARKER");
    }
}
