//! Central entry point for reading configuration from Vault

use reqwest::StatusCode;
use std::sync::Arc;
use tracing::{info, warn};

use crate::backends::SecretBackendMetadata;
use crate::config::VaultProperties;
use crate::error::{Result, VaultConfigError};
use crate::flatten::flatten;
use crate::secrets::Secrets;
use crate::vault::VaultSession;

const PATH_TEMPLATE: &str = "{backend}/{key}";

/// Read access to configuration stored in Vault
#[async_trait::async_trait]
pub trait VaultConfigOperations: Send + Sync {
    /// Read the secrets referenced by `backend`.
    ///
    /// Returns `Ok(None)` when the path does not exist, and also when Vault
    /// answers with any other non-success status while fail-fast is disabled.
    async fn read(&self, backend: &dyn SecretBackendMetadata) -> Result<Option<Secrets>>;
}

/// Reads secrets through a [`VaultSession`] and flattens them into properties
#[derive(Clone)]
pub struct VaultConfigTemplate {
    session: Arc<dyn VaultSession>,
    properties: VaultProperties,
}

impl VaultConfigTemplate {
    pub fn new(session: Arc<dyn VaultSession>, properties: VaultProperties) -> Self {
        Self {
            session,
            properties,
        }
    }

    /// Session used for requests issued by this template
    pub fn session(&self) -> &Arc<dyn VaultSession> {
        &self.session
    }
}

#[async_trait::async_trait]
impl VaultConfigOperations for VaultConfigTemplate {
    async fn read(&self, backend: &dyn SecretBackendMetadata) -> Result<Option<Secrets>> {
        let response = self
            .session
            .exchange(PATH_TEMPLATE, &backend.variables())
            .await?;

        info!("Fetching config from Vault at: {}", response.uri);

        if response.status == StatusCode::OK {
            let body = response.body.unwrap_or_default();
            let mut data = body.data.as_ref().map(flatten).unwrap_or_default();

            if let Some(transformer) = backend.property_transformer() {
                data = transformer.transform_properties(data);
            }

            return Ok(Some(Secrets::from_response(&body, data)));
        }

        if response.status == StatusCode::NOT_FOUND {
            info!("Could not locate PropertySource: key not found");
        } else if self.properties.fail_fast {
            return Err(VaultConfigError::FailFast {
                status: response.status.as_u16(),
                message: response.message,
            });
        } else {
            warn!(
                "Could not locate PropertySource: Status {} {}",
                response.status.as_u16(),
                response.message
            );
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::{GenericSecretBackendMetadata, PropertyNameTransformer};
    use crate::vault::{VaultResponse, VaultResponseEntity};
    use serde_json::{json, Map, Value};
    use std::collections::{BTreeMap, HashMap};
    use std::sync::Mutex;

    /// Session returning a canned response and recording requested variables
    struct StubSession {
        status: StatusCode,
        body: Option<VaultResponse>,
        message: String,
        requests: Mutex<Vec<HashMap<String, String>>>,
    }

    impl StubSession {
        fn new(status: StatusCode, body: Option<VaultResponse>, message: &str) -> Self {
            Self {
                status,
                body,
                message: message.to_string(),
                requests: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait::async_trait]
    impl VaultSession for StubSession {
        async fn exchange(
            &self,
            path_template: &str,
            variables: &HashMap<String, String>,
        ) -> Result<VaultResponseEntity> {
            assert_eq!(path_template, "{backend}/{key}");
            self.requests.lock().unwrap().push(variables.clone());
            Ok(VaultResponseEntity {
                status: self.status,
                uri: format!(
                    "http://localhost:8200/v1/{}/{}",
                    variables["backend"], variables["key"]
                ),
                body: self.body.clone(),
                message: self.message.clone(),
            })
        }
    }

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected a JSON object"),
        }
    }

    fn make_template(session: StubSession, fail_fast: bool) -> (VaultConfigTemplate, Arc<StubSession>) {
        let session = Arc::new(session);
        let properties = VaultProperties {
            fail_fast,
            ..VaultProperties::default()
        };
        (VaultConfigTemplate::new(session.clone(), properties), session)
    }

    fn full_response() -> VaultResponse {
        VaultResponse {
            data: Some(object(json!({
                "database": {"username": "app", "port": 5432},
                "hosts": ["a", "b"]
            }))),
            auth: Some(object(json!({"client_token": "abc", "policies": ["default"]}))),
            metadata: Some(object(json!({"version": 3}))),
            lease_duration: 3600,
            lease_id: Some("secret/myapp/lease-1".to_string()),
            renewable: true,
            request_id: Some("req-42".to_string()),
            warnings: Some(vec!["deprecated endpoint".to_string()]),
            wrap_info: Some(object(json!({"token": "wrapped", "ttl": 30}))),
        }
    }

    #[tokio::test]
    async fn test_read_flattens_nested_data() {
        let (template, session) =
            make_template(StubSession::new(StatusCode::OK, Some(full_response()), "OK"), false);
        let backend = GenericSecretBackendMetadata::new("secret", "myapp");

        let secrets = template.read(&backend).await.unwrap().unwrap();

        let expected: BTreeMap<String, String> = [
            ("database.username", "app"),
            ("database.port", "5432"),
            ("hosts[0]", "a"),
            ("hosts[1]", "b"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        assert_eq!(secrets.data(), &expected);

        let requests = session.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0]["backend"], "secret");
        assert_eq!(requests[0]["key"], "myapp");
    }

    #[tokio::test]
    async fn test_read_copies_envelope_metadata() {
        let response = full_response();
        let (template, _) =
            make_template(StubSession::new(StatusCode::OK, Some(response.clone()), "OK"), false);
        let backend = GenericSecretBackendMetadata::new("secret", "myapp");

        let secrets = template.read(&backend).await.unwrap().unwrap();

        assert_eq!(secrets.lease_id(), Some("secret/myapp/lease-1"));
        assert_eq!(secrets.lease_duration(), 3600);
        assert!(secrets.is_renewable());
        assert_eq!(secrets.request_id(), Some("req-42"));
        assert_eq!(secrets.warnings(), Some(&["deprecated endpoint".to_string()][..]));
        assert_eq!(secrets.wrap_info(), response.wrap_info.as_ref());
        assert_eq!(secrets.auth(), response.auth.as_ref());
        assert_eq!(secrets.metadata(), response.metadata.as_ref());
    }

    #[tokio::test]
    async fn test_read_applies_transformer() {
        let (template, _) =
            make_template(StubSession::new(StatusCode::OK, Some(full_response()), "OK"), false);
        let backend = GenericSecretBackendMetadata::new("secret", "myapp").with_transformer(
            PropertyNameTransformer::new()
                .add_key_transformation("database.username", "spring.datasource.username"),
        );

        let secrets = template.read(&backend).await.unwrap().unwrap();

        assert_eq!(secrets.get("spring.datasource.username"), Some("app"));
        assert_eq!(secrets.get("database.username"), None);
        assert_eq!(secrets.get("database.port"), Some("5432"));
    }

    #[tokio::test]
    async fn test_read_without_data_yields_empty_properties() {
        let body = VaultResponse {
            request_id: Some("req-1".to_string()),
            ..VaultResponse::default()
        };
        let (template, _) = make_template(StubSession::new(StatusCode::OK, Some(body), "OK"), true);
        let backend = GenericSecretBackendMetadata::new("secret", "empty");

        let secrets = template.read(&backend).await.unwrap().unwrap();
        assert!(secrets.data().is_empty());
        assert_eq!(secrets.request_id(), Some("req-1"));
    }

    #[tokio::test]
    async fn test_not_found_is_none_regardless_of_fail_fast() {
        for fail_fast in [false, true] {
            let (template, _) =
                make_template(StubSession::new(StatusCode::NOT_FOUND, None, "Not Found"), fail_fast);
            let backend = GenericSecretBackendMetadata::new("secret", "missing");

            let result = template.read(&backend).await.unwrap();
            assert!(result.is_none());
        }
    }

    #[tokio::test]
    async fn test_server_error_with_fail_fast() {
        let (template, _) = make_template(
            StubSession::new(StatusCode::INTERNAL_SERVER_ERROR, None, "internal error"),
            true,
        );
        let backend = GenericSecretBackendMetadata::new("secret", "myapp");

        let err = template.read(&backend).await.unwrap_err();
        match &err {
            VaultConfigError::FailFast { status, message } => {
                assert_eq!(*status, 500);
                assert_eq!(message, "internal error");
            }
            other => panic!("unexpected error: {}", other),
        }
        assert!(err.to_string().contains("500 internal error"));
    }

    #[tokio::test]
    async fn test_server_error_without_fail_fast() {
        let (template, _) = make_template(
            StubSession::new(StatusCode::INTERNAL_SERVER_ERROR, None, "internal error"),
            false,
        );
        let backend = GenericSecretBackendMetadata::new("secret", "myapp");

        assert!(template.read(&backend).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_over_http() {
        let mut server = mockito::Server::new_async().await;
        let _ok = server
            .mock("GET", "/v1/secret/myapp")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"request_id":"r1","lease_id":"","lease_duration":0,"renewable":false,
                    "data":{"mail":{"host":"smtp.example.com","ports":[25,587]}}}"#,
            )
            .create_async()
            .await;
        let _denied = server
            .mock("GET", "/v1/secret/forbidden")
            .with_status(403)
            .with_header("content-type", "application/json")
            .with_body(r#"{"errors":["permission denied"]}"#)
            .create_async()
            .await;

        let session = crate::vault::HttpVaultSession::new(server.url(), Some("t".to_string()))
            .unwrap();
        let properties = VaultProperties {
            fail_fast: true,
            ..VaultProperties::default()
        };
        let template = VaultConfigTemplate::new(Arc::new(session), properties);

        let secrets = template
            .read(&GenericSecretBackendMetadata::new("secret", "myapp"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(secrets.get("mail.host"), Some("smtp.example.com"));
        assert_eq!(secrets.get("mail.ports[1]"), Some("587"));
        assert_eq!(secrets.request_id(), Some("r1"));

        let err = template
            .read(&GenericSecretBackendMetadata::new("secret", "forbidden"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(403));
        assert!(err.to_string().contains("403 permission denied"));
    }

    #[tokio::test]
    async fn test_session_is_shared_with_caller() {
        let (template, stub) =
            make_template(StubSession::new(StatusCode::OK, Some(full_response()), "OK"), false);
        let backend = GenericSecretBackendMetadata::new("secret", "direct");

        let entity = template
            .session()
            .exchange(PATH_TEMPLATE, &backend.variables())
            .await
            .unwrap();

        assert_eq!(entity.uri, "http://localhost:8200/v1/secret/direct");
        assert_eq!(stub.requests.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_no_content_follows_fail_fast_policy() {
        let mut server = mockito::Server::new_async().await;
        let _no_content = server
            .mock("GET", "/v1/secret/app")
            .with_status(204)
            .create_async()
            .await;
        let backend = GenericSecretBackendMetadata::new("secret", "app");

        for fail_fast in [false, true] {
            let session = crate::vault::HttpVaultSession::new(server.url(), None).unwrap();
            let properties = VaultProperties {
                fail_fast,
                ..VaultProperties::default()
            };
            let template = VaultConfigTemplate::new(Arc::new(session), properties);

            let result = template.read(&backend).await;
            if fail_fast {
                match result {
                    Err(VaultConfigError::FailFast { status, message }) => {
                        assert_eq!(status, 204);
                        assert_eq!(message, "No Content");
                    }
                    other => panic!("unexpected result: {:?}", other),
                }
            } else {
                assert!(result.unwrap().is_none());
            }
        }
    }
}
