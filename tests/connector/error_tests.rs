//! Failure paths. Every failure aborts the call with no partial data.

use serde_json::json;
use sgverify::{PersonRequest, SgVerifyError};
use wiremock::{MockServer, ResponseTemplate};

use super::common::{client_key, connector, person_payload, STATE};
use super::mock_provider::{
    access_token, access_token_signed_by, encrypted_person, encrypted_person_signed_by,
    mount_person, mount_token,
};

async fn token_ok(server: &MockServer) {
    mount_token(
        server,
        ResponseTemplate::new(200).set_body_json(json!({ "access_token": access_token() })),
        1,
    )
    .await;
}

#[tokio::test]
async fn callback_error_makes_no_calls() {
    let server = MockServer::start().await;
    let connector = connector("TEST", &server.uri());

    let request = PersonRequest {
        error: Some("access_denied".into()),
        error_description: Some("user cancelled".into()),
        ..PersonRequest::new("auth-123", STATE)
    };
    let err = connector.get_person_data(&request).await.unwrap_err();

    match err {
        SgVerifyError::CallbackError { error, description } => {
            assert_eq!(error, "access_denied");
            assert_eq!(description, "user cancelled");
        }
        other => panic!("expected callback error, got {:?}", other),
    }
    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn missing_auth_code_makes_no_calls() {
    let server = MockServer::start().await;
    let connector = connector("TEST", &server.uri());

    let request = PersonRequest {
        auth_code: None,
        ..PersonRequest::new("", STATE)
    };
    let err = connector.get_person_data(&request).await.unwrap_err();
    assert!(matches!(err, SgVerifyError::MissingAuthCode));

    let err = connector
        .get_person_data(&PersonRequest::new("", STATE))
        .await
        .unwrap_err();
    assert!(matches!(err, SgVerifyError::MissingAuthCode));

    assert!(server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn token_endpoint_error_code() {
    let server = MockServer::start().await;
    mount_token(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "code": "ERR1", "message": "invalid code" })),
        1,
    )
    .await;
    mount_person(&server, ResponseTemplate::new(200), 0).await;

    let connector = connector("TEST", &server.uri());
    let err = connector
        .get_person_data(&PersonRequest::new("auth-123", STATE))
        .await
        .unwrap_err();

    assert!(matches!(err, SgVerifyError::ProviderError { ref code, .. } if code == "ERR1"));
    assert!(err.to_string().contains("ERR1"));
}

#[tokio::test]
async fn tampered_access_token_stops_before_person_call() {
    let server = MockServer::start().await;
    mount_token(
        &server,
        ResponseTemplate::new(200)
            .set_body_json(json!({ "access_token": access_token_signed_by(&client_key()) })),
        1,
    )
    .await;
    mount_person(&server, ResponseTemplate::new(200), 0).await;

    let connector = connector("TEST", &server.uri());
    let err = connector
        .get_person_data(&PersonRequest::new("auth-123", STATE))
        .await
        .unwrap_err();
    assert!(matches!(err, SgVerifyError::SignatureInvalid));
}

#[tokio::test]
async fn malformed_access_token() {
    let server = MockServer::start().await;
    mount_token(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "access_token": "only.two" })),
        1,
    )
    .await;

    let connector = connector("TEST", &server.uri());
    let err = connector
        .get_person_data(&PersonRequest::new("auth-123", STATE))
        .await
        .unwrap_err();
    assert!(matches!(err, SgVerifyError::MalformedToken(_)));
}

#[tokio::test]
async fn missing_access_token_is_invalid_response() {
    let server = MockServer::start().await;
    mount_token(&server, ResponseTemplate::new(200).set_body_json(json!({})), 1).await;

    let connector = connector("TEST", &server.uri());
    let err = connector.get_token("auth-123", STATE).await.unwrap_err();
    assert!(matches!(err, SgVerifyError::InvalidResponse(_)));
}

#[tokio::test]
async fn person_endpoint_error_code() {
    let server = MockServer::start().await;
    token_ok(&server).await;
    mount_person(
        &server,
        ResponseTemplate::new(401).set_body_json(json!({ "code": "401", "message": "UNAUTHORIZED" })),
        1,
    )
    .await;

    let connector = connector("TEST", &server.uri());
    let err = connector
        .get_person_data(&PersonRequest::new("auth-123", STATE))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SgVerifyError::ProviderError { ref code, ref message } if code == "401" && message == "UNAUTHORIZED"
    ));
}

#[tokio::test]
async fn server_error_without_code_is_transport_error() {
    let server = MockServer::start().await;
    mount_token(&server, ResponseTemplate::new(500).set_body_string("upstream down"), 1).await;

    let connector = connector("TEST", &server.uri());
    let err = connector
        .get_person_data(&PersonRequest::new("auth-123", STATE))
        .await
        .unwrap_err();
    match err {
        SgVerifyError::TransportError(err) => {
            assert_eq!(err.status, Some(500));
            assert_eq!(err.message, "upstream down");
        }
        other => panic!("expected transport error, got {:?}", other),
    }
}

#[tokio::test]
async fn person_signed_by_wrong_key() {
    let server = MockServer::start().await;
    token_ok(&server).await;
    mount_person(
        &server,
        ResponseTemplate::new(200)
            .set_body_string(encrypted_person_signed_by(&person_payload(), &client_key())),
        1,
    )
    .await;

    let connector = connector("TEST", &server.uri());
    let err = connector
        .get_person_data(&PersonRequest::new("auth-123", STATE))
        .await
        .unwrap_err();
    assert!(matches!(err, SgVerifyError::SignatureInvalid));
}

#[tokio::test]
async fn plain_json_person_rejected_when_secure() {
    let server = MockServer::start().await;
    token_ok(&server).await;
    mount_person(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "name": { "value": "Tan" } })),
        1,
    )
    .await;

    let connector = connector("TEST", &server.uri());
    let err = connector
        .get_person_data(&PersonRequest::new("auth-123", STATE))
        .await
        .unwrap_err();
    assert!(matches!(err, SgVerifyError::MalformedToken(_)));
}

#[tokio::test]
async fn truncated_jwe_is_malformed() {
    let server = MockServer::start().await;
    token_ok(&server).await;
    let jwe = encrypted_person(&person_payload());
    let truncated = jwe.rsplit_once('.').unwrap().0.to_string();
    mount_person(&server, ResponseTemplate::new(200).set_body_string(truncated), 1).await;

    let connector = connector("TEST", &server.uri());
    let err = connector
        .get_person_data(&PersonRequest::new("auth-123", STATE))
        .await
        .unwrap_err();
    assert!(matches!(err, SgVerifyError::MalformedToken(_)));
}

#[tokio::test]
async fn unreachable_provider_is_transport_error() {
    let connector = connector("TEST", "http://127.0.0.1:1");
    let err = connector
        .get_person_data(&PersonRequest::new("auth-123", STATE))
        .await
        .unwrap_err();
    assert!(matches!(err, SgVerifyError::TransportError(_)));
}

#[test]
fn secure_environment_requires_provider_certificate() {
    let mut options = super::common::options("PROD", "http://localhost");
    options.my_info_public_cert = None;
    let err = sgverify::SgVerifyConnector::new(options).err().unwrap();
    assert!(matches!(err, SgVerifyError::Config(_)));
}
