//! EDA REST API client authenticating through the Keycloak proxy exposed by EDA.

use std::time::Duration;

use derive_builder::Builder;
use log::{debug, info, warn};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use self::transaction::{TransactionApi, TransactionItem, TransactionRequest};

pub use self::error::EdaError;

pub mod error;
pub mod transaction;

const KEYCLOAK_PATH: &str = "core/httpproxy/v1/keycloak";
const KEYCLOAK_ADMIN_REALM: &str = "master";
const KEYCLOAK_ADMIN_CLIENT_ID: &str = "admin-cli";
const EDA_REALM: &str = "eda";
const EDA_CLIENT_ID: &str = "eda";

const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(1);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Everything needed to reach and authenticate against an EDA instance.
#[derive(Debug, Clone, Builder)]
#[builder(setter(into))]
pub struct EdaConnection {
    /// base URL, e.g. `https://eda.example.com`
    pub url: String,
    #[builder(default = "\"admin\".to_owned()")]
    pub eda_user: String,
    #[builder(default = "\"admin\".to_owned()")]
    pub eda_password: String,
    /// Keycloak admin user of the `master` realm, only needed when the
    /// client secret isn't known
    #[builder(default = "\"admin\".to_owned()")]
    pub kc_user: String,
    #[builder(default = "\"admin\".to_owned()")]
    pub kc_password: String,
    #[builder(default)]
    pub kc_secret: Option<String>,
    /// verify the TLS certificate presented by EDA
    #[builder(default)]
    pub verify: bool,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct KeycloakClient {
    id: String,
    client_id: String,
}

#[derive(Deserialize)]
struct ClientSecret {
    value: String,
}

pub struct EdaClient {
    connection: EdaConnection,
    base_url: String,
    http: reqwest::Client,
    access_token: Option<String>,
    version: Option<String>,
    transaction: Vec<TransactionItem>,
}

impl EdaClient {
    pub fn new(connection: EdaConnection) -> Result<Self, EdaError> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(!connection.verify)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(EdaError::ClientSetup)?;

        Ok(Self {
            base_url: connection.url.trim_end_matches('/').to_owned(),
            connection,
            http,
            access_token: None,
            version: None,
            transaction: Vec::new(),
        })
    }

    pub fn url(&self) -> &str {
        &self.base_url
    }

    fn api_url(&self, api_path: &str) -> String {
        format!("{}/{}", self.base_url, api_path.trim_start_matches('/'))
    }

    /// Sends the request, retrying connection failures and timeouts.
    async fn execute(&self, url: &str, request: RequestBuilder) -> Result<Response, EdaError> {
        let mut attempt = 1;

        loop {
            let current = request.try_clone().ok_or_else(|| {
                EdaError::InvalidResponse("request body can't be retried".into())
            })?;

            match current.send().await {
                Ok(response) => return Ok(response),
                Err(error) if (error.is_connect() || error.is_timeout()) && attempt < MAX_ATTEMPTS => {
                    warn!("Request to {url} failed (attempt {attempt}/{MAX_ATTEMPTS}), retrying...");
                    debug!("{error:?}");
                    tokio::time::sleep(RETRY_DELAY * attempt).await;
                    attempt += 1;
                }
                Err(source) => {
                    return Err(EdaError::Request {
                        url: url.to_owned(),
                        source,
                    })
                }
            }
        }
    }

    async fn read_json<T: DeserializeOwned>(url: &str, response: Response) -> Result<T, EdaError> {
        let status = response.status();
        let body = response.text().await.map_err(|source| EdaError::Request {
            url: url.to_owned(),
            source,
        })?;

        if status != StatusCode::OK {
            return Err(EdaError::UnexpectedStatus {
                url: url.to_owned(),
                status,
                body,
            });
        }

        serde_json::from_str(&body)
            .map_err(|e| EdaError::InvalidResponse(format!("{url}: {e}").into()))
    }

    async fn post_form<T: DeserializeOwned>(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<T, EdaError> {
        let response = self.execute(url, self.http.post(url).form(form)).await?;

        Self::read_json(url, response).await
    }

    async fn fetch_admin_token(&self) -> Result<String, EdaError> {
        let url = self.api_url(&format!(
            "{KEYCLOAK_PATH}/realms/{KEYCLOAK_ADMIN_REALM}/protocol/openid-connect/token"
        ));
        let form = [
            ("grant_type", "password"),
            ("client_id", KEYCLOAK_ADMIN_CLIENT_ID),
            ("username", self.connection.kc_user.as_str()),
            ("password", self.connection.kc_password.as_str()),
        ];

        self.post_form::<TokenResponse>(&url, &form)
            .await?
            .access_token
            .ok_or(EdaError::Authentication(
                "no admin token in Keycloak response".into(),
            ))
    }

    /// Looks up the secret of the `eda` client using the `master` realm admin.
    async fn fetch_client_secret(&self) -> Result<String, EdaError> {
        if self.connection.kc_user.is_empty() || self.connection.kc_password.is_empty() {
            return Err(EdaError::Authentication(
                "no client secret and no Keycloak admin credentials provided".into(),
            ));
        }

        let admin_token = self.fetch_admin_token().await?;
        let clients_url = self.api_url(&format!("{KEYCLOAK_PATH}/admin/realms/{EDA_REALM}/clients"));

        let response = self
            .execute(&clients_url, self.http.get(&clients_url).bearer_auth(&admin_token))
            .await?;
        let clients: Vec<KeycloakClient> = Self::read_json(&clients_url, response).await?;
        let eda_client = clients
            .into_iter()
            .find(|c| c.client_id == EDA_CLIENT_ID)
            .ok_or(EdaError::Authentication(
                format!("client '{EDA_CLIENT_ID}' not found in realm '{EDA_REALM}'").into(),
            ))?;

        let secret_url = format!("{clients_url}/{}/client-secret", eda_client.id);
        let response = self
            .execute(&secret_url, self.http.get(&secret_url).bearer_auth(&admin_token))
            .await?;
        let secret: ClientSecret = Self::read_json(&secret_url, response).await?;

        Ok(secret.value)
    }

    async fn fetch_user_token(&self, client_secret: &str) -> Result<String, EdaError> {
        let url = self.api_url(&format!(
            "{KEYCLOAK_PATH}/realms/{EDA_REALM}/protocol/openid-connect/token"
        ));
        let form = [
            ("grant_type", "password"),
            ("client_id", EDA_CLIENT_ID),
            ("client_secret", client_secret),
            ("scope", "openid"),
            ("username", self.connection.eda_user.as_str()),
            ("password", self.connection.eda_password.as_str()),
        ];

        self.post_form::<TokenResponse>(&url, &form)
            .await?
            .access_token
            .ok_or(EdaError::Authentication(
                "no access token in Keycloak response".into(),
            ))
    }

    /// Acquires an access token through the Keycloak password grant.
    pub async fn login(&mut self) -> Result<(), EdaError> {
        let secret = match &self.connection.kc_secret {
            Some(secret) => secret.to_owned(),
            None => {
                debug!("No client secret provided, retrieving it from the Keycloak master realm");
                let secret = self.fetch_client_secret().await?;
                info!("Retrieved EDA client secret from Keycloak");
                self.connection.kc_secret = Some(secret.clone());
                secret
            }
        };

        self.access_token = Some(self.fetch_user_token(&secret).await?);
        debug!("Keycloak login successful (realm={EDA_REALM})");

        Ok(())
    }

    async fn access_token(&mut self) -> Result<String, EdaError> {
        if self.access_token.is_none() {
            debug!("No access token found, performing Keycloak login...");
            self.login().await?;
        }

        self.access_token
            .clone()
            .ok_or(EdaError::Authentication("login produced no token".into()))
    }

    pub async fn get(&mut self, api_path: &str) -> Result<Response, EdaError> {
        let url = self.api_url(api_path);
        let token = self.access_token().await?;
        debug!("GET {url}");

        self.execute(&url, self.http.get(&url).bearer_auth(token)).await
    }

    pub async fn post<T: Serialize + ?Sized>(
        &mut self,
        api_path: &str,
        payload: &T,
    ) -> Result<Response, EdaError> {
        let url = self.api_url(api_path);
        let token = self.access_token().await?;
        debug!("POST {url}");

        self.execute(&url, self.http.post(&url).bearer_auth(token).json(payload))
            .await
    }

    /// Authenticated GET whose `200` response is decoded as JSON.
    pub async fn get_json<T: DeserializeOwned>(&mut self, api_path: &str) -> Result<T, EdaError> {
        let url = self.api_url(api_path);
        let response = self.get(api_path).await?;

        Self::read_json(&url, response).await
    }

    /// Logs in unless a token is already cached.
    pub async fn ensure_login(&mut self) -> Result<(), EdaError> {
        self.access_token().await.map(|_| ())
    }

    /// Tries each path in turn and returns the first successful JSON response.
    /// Uses the cached token, so it can run concurrently after [`Self::ensure_login`].
    pub async fn get_json_any(
        &self,
        api_paths: &[String],
    ) -> Result<Option<serde_json::Value>, EdaError> {
        let token = self
            .access_token
            .as_deref()
            .ok_or(EdaError::Authentication("not logged in".into()))?;

        for path in api_paths {
            let url = self.api_url(path);
            debug!("GET {url}");
            let response = self
                .execute(&url, self.http.get(&url).bearer_auth(token))
                .await?;

            if response.status() == StatusCode::OK {
                return Self::read_json(&url, response).await.map(Some);
            }

            debug!("GET {path} returned {}", response.status());
        }

        Ok(None)
    }

    pub async fn is_up(&self) -> Result<bool, EdaError> {
        info!("Checking EDA health");
        let url = self.api_url("core/about/health");
        let response = self.execute(&url, self.http.get(&url)).await?;

        if response.status() != StatusCode::OK {
            return Ok(false);
        }

        let health: serde_json::Value = Self::read_json(&url, response).await?;

        Ok(health["status"] == "UP")
    }

    /// EDA release, e.g. `25.4.1`, cached after the first call.
    pub async fn version(&mut self) -> Result<String, EdaError> {
        if let Some(version) = &self.version {
            return Ok(version.to_owned());
        }

        debug!("Retrieving EDA version");
        let about: serde_json::Value = self.get_json("core/about/version").await?;
        let raw = about["eda"]["version"]
            .as_str()
            .ok_or(EdaError::InvalidResponse("missing eda.version".into()))?;
        let version = raw.split('-').next().unwrap_or(raw).to_owned();

        debug!("EDA version: {version}");
        self.version = Some(version.clone());

        Ok(version)
    }

    pub async fn is_authenticated(&mut self) -> bool {
        match self.version().await {
            Ok(_) => true,
            Err(error) => {
                debug!("Authentication check failed: {error:?}");
                false
            }
        }
    }

    async fn transaction_api(&mut self) -> Result<TransactionApi, EdaError> {
        Ok(TransactionApi::for_version(&self.version().await?))
    }

    /// Asks EDA whether the item would be accepted. Returns the rejection
    /// reason if it wouldn't.
    pub async fn validate_item(&mut self, item: &TransactionItem) -> Result<Option<String>, EdaError> {
        debug!("Validating transaction item {}", item.describe());

        let api = self.transaction_api().await?;
        let response = match api {
            TransactionApi::V1 => self.post(api.validate_path(), item).await?,
            TransactionApi::V2 => self.post(api.validate_path(), std::slice::from_ref(item)).await?,
        };

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let reason = response.text().await.unwrap_or_default();
        warn!("Validation error for {}: {reason}", item.describe());

        Ok(Some(reason))
    }

    pub fn add_item(&mut self, item: TransactionItem) {
        debug!("Adding item to transaction: {}", item.describe());
        self.transaction.push(item);
    }

    /// Validates the item and queues it for the next commit.
    pub async fn add_validated_item(&mut self, item: TransactionItem) -> Result<(), EdaError> {
        if let Some(reason) = self.validate_item(&item).await? {
            return Err(EdaError::ValidationFailed {
                item: item.describe(),
                reason,
            });
        }

        self.add_item(item);

        Ok(())
    }

    pub fn pending_items(&self) -> &[TransactionItem] {
        &self.transaction
    }

    /// Commits every queued item and waits for the transaction to finish.
    /// Returns the transaction id. Queued items are kept unless the commit
    /// succeeds.
    pub async fn commit_transaction(&mut self, description: &str) -> Result<String, EdaError> {
        let api = self.transaction_api().await?;
        let items = self.transaction.clone();
        let request = TransactionRequest {
            description,
            dryrun: false,
            result_type: "normal",
            retain: true,
            crs: &items,
        };

        info!("Committing transaction: {description}, {} items", items.len());
        let commit_url = self.api_url(api.commit_path());
        let response = self.post(api.commit_path(), &request).await?;
        let committed: serde_json::Value = Self::read_json(&commit_url, response).await?;

        let id = match &committed["id"] {
            serde_json::Value::String(id) => id.to_owned(),
            serde_json::Value::Number(id) => id.to_string(),
            _ => {
                return Err(EdaError::InvalidResponse(
                    format!("no transaction id in {committed}").into(),
                ))
            }
        };

        info!("Waiting for transaction {id} to complete...");
        let details: serde_json::Value = self.get_json(&api.result_path(&id)).await?;

        if details.get("code").is_some() {
            return Err(EdaError::CommitFailed {
                id,
                details: details.to_string(),
            });
        }

        info!("Transaction {id} committed");
        self.transaction.clear();

        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_builder_fills_defaults() {
        let connection = EdaConnectionBuilder::default()
            .url("https://eda.example.com/")
            .build()
            .unwrap();

        assert_eq!(connection.eda_user, "admin");
        assert_eq!(connection.kc_password, "admin");
        assert!(connection.kc_secret.is_none());
        assert!(!connection.verify);
    }

    #[test]
    fn connection_builder_requires_url() {
        assert!(EdaConnectionBuilder::default().build().is_err());
    }

    #[test]
    fn api_urls_are_joined_without_duplicate_slashes() {
        let connection = EdaConnectionBuilder::default()
            .url("https://eda.example.com/")
            .kc_secret(Some("secret".to_owned()))
            .build()
            .unwrap();
        let client = EdaClient::new(connection).unwrap();

        assert_eq!(client.url(), "https://eda.example.com");
        assert_eq!(
            client.api_url("/core/about/health"),
            "https://eda.example.com/core/about/health"
        );
    }

    #[test]
    fn items_are_queued_in_order() {
        let connection = EdaConnectionBuilder::default()
            .url("https://eda.example.com")
            .build()
            .unwrap();
        let mut client = EdaClient::new(connection).unwrap();

        client.add_item(TransactionItem::delete("", "Namespace", "clab-a", None, None));
        client.add_item(TransactionItem::delete("", "Namespace", "clab-b", None, None));

        let described = client
            .pending_items()
            .iter()
            .map(TransactionItem::describe)
            .collect::<Vec<_>>();
        assert_eq!(described, vec!["Namespace/clab-a", "Namespace/clab-b"]);
    }

    #[tokio::test]
    async fn failed_commit_keeps_queued_items() {
        let connection = EdaConnectionBuilder::default()
            .url("http://127.0.0.1:9")
            .kc_secret(Some("secret".to_owned()))
            .build()
            .unwrap();
        let mut client = EdaClient::new(connection).unwrap();

        client.add_item(TransactionItem::delete("", "Namespace", "clab-a", None, None));
        client.add_item(TransactionItem::delete("", "Namespace", "clab-b", None, None));

        assert!(client.commit_transaction("remove namespaces").await.is_err());
        assert_eq!(client.pending_items().len(), 2);
    }
}
