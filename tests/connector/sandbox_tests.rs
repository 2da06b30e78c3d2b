//! SANDBOX: no request signing, tokens and person data in the clear.

use serde_json::json;
use sgverify::{PersonAttribute, PersonRequest};
use wiremock::{MockServer, ResponseTemplate};

use super::common::{connector, STATE, SUBJECT};
use super::mock_provider::{mount_person, mount_token, query_fields, requests_to, unsigned_access_token};

#[tokio::test]
async fn plain_json_person_without_authorization() {
    let server = MockServer::start().await;
    mount_token(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "access_token": unsigned_access_token() })),
        1,
    )
    .await;
    mount_person(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "name": { "value": "Tan" } })),
        1,
    )
    .await;

    let connector = connector("SANDBOX", &server.uri());
    let response = connector
        .get_person_data(&PersonRequest::new("auth-123", STATE))
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&response).unwrap(),
        json!({ "data": { "name": { "value": "Tan" } }, "state": STATE })
    );

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 2);
    assert!(received
        .iter()
        .all(|request| request.headers.get("Authorization").is_none()));
}

#[tokio::test]
async fn empty_attributes_are_omitted() {
    let server = MockServer::start().await;
    mount_token(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "access_token": unsigned_access_token() })),
        1,
    )
    .await;
    mount_person(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({
            "name": { "value": "Tan" },
            "sex": { "code": "", "desc": "" },
            "mobileno": { "prefix": { "value": "" }, "areacode": { "value": "" }, "nbr": { "value": "" } },
        })),
        1,
    )
    .await;

    let connector = connector("SANDBOX", &server.uri());
    let person = connector
        .get_person_data(&PersonRequest::new("auth-123", STATE))
        .await
        .unwrap()
        .data;

    assert_eq!(person.len(), 1);
    assert!(person.get(PersonAttribute::Gender).is_none());
    assert!(person.get(PersonAttribute::MobileNumber).is_none());
}

#[tokio::test]
async fn tx_no_is_still_sent() {
    let server = MockServer::start().await;
    mount_token(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "access_token": unsigned_access_token() })),
        1,
    )
    .await;
    mount_person(&server, ResponseTemplate::new(200).set_body_json(json!({})), 1).await;

    let connector = connector("SANDBOX", &server.uri());
    let response = connector
        .get_person_data(&PersonRequest::new("auth-123", STATE).tx_no("TX-7"))
        .await
        .unwrap();
    assert!(response.data.is_empty());

    let requests = requests_to(&server, &format!("/person/{}", SUBJECT)).await;
    let fields = query_fields(&requests[0]);
    assert_eq!(fields[2], ("txNo".to_string(), "TX-7".to_string()));
}

#[tokio::test]
async fn non_object_person_payload_is_invalid() {
    let server = MockServer::start().await;
    mount_token(
        &server,
        ResponseTemplate::new(200).set_body_json(json!({ "access_token": unsigned_access_token() })),
        1,
    )
    .await;
    mount_person(&server, ResponseTemplate::new(200).set_body_json(json!(["name"])), 1).await;

    let connector = connector("SANDBOX", &server.uri());
    let err = connector
        .get_person_data(&PersonRequest::new("auth-123", STATE))
        .await
        .unwrap_err();
    assert!(matches!(err, sgverify::SgVerifyError::InvalidResponse(_)));
}
