//! Azure credential acquisition and Advisor recommendation listing.

use crate::CliResult;
use advisor_report_core::{RecommendationRecord, parse_recommendation_page};
use clap::Args;
use log::{debug, info, warn};
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::future::Future;
use std::pin::Pin;

const DEFAULT_AUTHORITY_URL: &str = "https://login.microsoftonline.com";
const DEFAULT_MANAGEMENT_URL: &str = "https://management.azure.com";
const MANAGEMENT_SCOPE: &str = "https://management.azure.com/.default";
const ADVISOR_API_VERSION: &str = "2023-01-01";

/// CLI arguments for reaching the Advisor API.
#[derive(Args, Clone, Debug)]
pub struct AzureArgs {
    /// Azure AD tenant of the service principal.
    #[arg(long, env = "AZURE_TENANT_ID")]
    pub tenant_id: String,
    /// Application (client) id of the service principal.
    #[arg(long, env = "AZURE_CLIENT_ID")]
    pub client_id: String,
    /// Client secret of the service principal.
    #[arg(long, env = "AZURE_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: String,
    /// Subscription whose recommendations are reported.
    #[arg(long, env = "AZURE_SUBSCRIPTION_ID")]
    pub subscription_id: String,
    /// Base URL of the Azure AD authority.
    #[arg(long, env = "AZURE_AUTHORITY_HOST", default_value = DEFAULT_AUTHORITY_URL)]
    pub authority_url: String,
    /// Base URL of Azure Resource Manager.
    #[arg(long, env = "AZURE_MANAGEMENT_URL", default_value = DEFAULT_MANAGEMENT_URL)]
    pub management_url: String,
}

/// Fetch every recommendation for the configured subscription.
#[cfg(not(test))]
pub async fn fetch_recommendations(args: &AzureArgs) -> CliResult<Vec<RecommendationRecord>> {
    let client = ReqwestAdvisorClient::new()?;
    fetch_recommendations_with(args, &client).await
}

/// Fetch recommendations with an injected API client.
///
/// Authentication failures abort; a failed list call yields no records.
async fn fetch_recommendations_with<C: AdvisorApi>(
    args: &AzureArgs,
    client: &C,
) -> CliResult<Vec<RecommendationRecord>> {
    let credentials = ClientCredentials::from_args(args)?;
    let authority = normalize_base_url(&args.authority_url)?;
    let management = normalize_base_url(&args.management_url)?;
    let subscription_id = require("subscription id", &args.subscription_id)?;

    let token = client
        .request_token(&token_url(&authority, &credentials.tenant_id), &credentials)
        .await?;
    if let Some(expires_in) = token.expires_in {
        debug!("access token valid for {expires_in} seconds");
    }

    let url = recommendations_url(&management, &subscription_id);
    let body = match client.list_recommendations(&url, &token.access_token).await {
        Ok(body) => body,
        Err(err) => {
            warn!("listing recommendations failed: {err}");
            return Ok(Vec::new());
        }
    };
    let page = parse_recommendation_page(&body)?;
    if let Some(next_link) = &page.next_link {
        warn!("more recommendations available at {next_link}; only the first page is reported");
    }
    info!(
        "received {} recommendations for subscription {subscription_id}",
        page.records.len()
    );
    Ok(page.records)
}

/// Service principal credentials for the client-credentials grant.
struct ClientCredentials {
    tenant_id: String,
    client_id: String,
    client_secret: String,
}

impl ClientCredentials {
    /// Validate and collect credentials from CLI arguments.
    fn from_args(args: &AzureArgs) -> CliResult<Self> {
        Ok(Self {
            tenant_id: require("tenant id", &args.tenant_id)?,
            client_id: require("client id", &args.client_id)?,
            client_secret: require("client secret", &args.client_secret)?,
        })
    }
}

impl fmt::Debug for ClientCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientCredentials")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

/// OAuth token payload returned by Azure AD.
#[derive(Debug, Deserialize, Clone)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

fn require(label: &str, value: &str) -> CliResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(format!("{label} is required").into());
    }
    Ok(trimmed.to_string())
}

/// Normalize a base URL for consistent request paths.
fn normalize_base_url(url: &str) -> CliResult<String> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err("base url is required".into());
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

fn token_url(authority: &str, tenant_id: &str) -> String {
    format!("{authority}/{tenant_id}/oauth2/v2.0/token")
}

fn recommendations_url(management: &str, subscription_id: &str) -> String {
    format!(
        "{management}/subscriptions/{subscription_id}/providers/Microsoft.Advisor/recommendations?api-version={ADVISOR_API_VERSION}"
    )
}

/// Request an access token with the client-credentials grant.
#[cfg_attr(test, allow(dead_code))]
async fn request_token(
    client: &Client,
    token_url: &str,
    credentials: &ClientCredentials,
) -> CliResult<TokenResponse> {
    let response = client
        .post(token_url)
        .header("Accept", "application/json")
        .form(&[
            ("grant_type", "client_credentials"),
            ("client_id", credentials.client_id.as_str()),
            ("client_secret", credentials.client_secret.as_str()),
            ("scope", MANAGEMENT_SCOPE),
        ])
        .send()
        .await?
        .error_for_status()?;
    Ok(response.json::<TokenResponse>().await?)
}

/// Fetch the raw recommendation list payload.
#[cfg_attr(test, allow(dead_code))]
async fn list_recommendations(client: &Client, url: &str, access_token: &str) -> CliResult<String> {
    let response = client
        .get(url)
        .bearer_auth(access_token)
        .header("Accept", "application/json")
        .send()
        .await?
        .error_for_status()?;
    Ok(response.text().await?)
}

/// HTTP client abstraction for the Advisor calls.
trait AdvisorApi {
    fn request_token<'a>(
        &'a self,
        token_url: &'a str,
        credentials: &'a ClientCredentials,
    ) -> Pin<Box<dyn Future<Output = CliResult<TokenResponse>> + Send + 'a>>;

    fn list_recommendations<'a>(
        &'a self,
        url: &'a str,
        access_token: &'a str,
    ) -> Pin<Box<dyn Future<Output = CliResult<String>> + Send + 'a>>;
}

/// Reqwest-backed Advisor client.
#[cfg_attr(test, allow(dead_code))]
struct ReqwestAdvisorClient {
    client: Client,
}

impl ReqwestAdvisorClient {
    /// Build a new reqwest Advisor client.
    #[cfg_attr(test, allow(dead_code))]
    fn new() -> CliResult<Self> {
        let client = Client::builder().user_agent("advisor-report").build()?;
        Ok(Self { client })
    }
}

impl AdvisorApi for ReqwestAdvisorClient {
    fn request_token<'a>(
        &'a self,
        token_url: &'a str,
        credentials: &'a ClientCredentials,
    ) -> Pin<Box<dyn Future<Output = CliResult<TokenResponse>> + Send + 'a>> {
        Box::pin(request_token(&self.client, token_url, credentials))
    }

    fn list_recommendations<'a>(
        &'a self,
        url: &'a str,
        access_token: &'a str,
    ) -> Pin<Box<dyn Future<Output = CliResult<String>> + Send + 'a>> {
        Box::pin(list_recommendations(&self.client, url, access_token))
    }
}
