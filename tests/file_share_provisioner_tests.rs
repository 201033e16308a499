use onboarding::error::ProvisionError;
use onboarding::providers::{FileShareProvisioner, Provisioner};
use serde_json::json;
use tracing::Level;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{body_json, header, method, path},
};

mod test_utils;
use test_utils::{
    FILE_SHARE_TOKEN, LogCapture, SAMPLE_EMAIL, UNREACHABLE_BASE, file_share_config, http_client,
    sample_employee,
};

fn provisioner(server: &MockServer) -> FileShareProvisioner {
    FileShareProvisioner::new(http_client(), file_share_config(&server.uri()))
}

#[tokio::test]
async fn invites_employee_to_shared_folder() {
    let (logs, _guard) = LogCapture::install();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sharing/add_folder_member"))
        .and(header(
            "authorization",
            format!("Bearer {}", FILE_SHARE_TOKEN).as_str(),
        ))
        .and(body_json(json!({
            "share_path": "/Company Shared/New Starters",
            "members": [{
                "member": {".tag": "email", "email": SAMPLE_EMAIL},
                "access_level": "viewer"
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::Value::Null))
        .expect(1)
        .mount(&server)
        .await;

    let result = provisioner(&server).provision(&sample_employee()).await;

    assert!(result.is_ok(), "{result:?}");
    let info = logs.only(Level::INFO);
    assert!(info.mentions(SAMPLE_EMAIL));
    assert!(info.mentions("/Company Shared/New Starters"));
    assert_eq!(logs.count(Level::ERROR), 0);
}

#[tokio::test]
async fn uses_configured_folder_and_access_level() {
    let (_logs, _guard) = LogCapture::install();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sharing/add_folder_member"))
        .and(body_json(json!({
            "share_path": "/Engineering/Onboarding",
            "members": [{
                "member": {".tag": "email", "email": SAMPLE_EMAIL},
                "access_level": "editor"
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::Value::Null))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = file_share_config(&server.uri());
    config.folder_path = "/Engineering/Onboarding".to_string();
    config.access_level = "editor".to_string();

    let result = FileShareProvisioner::new(http_client(), config)
        .provision(&sample_employee())
        .await;
    assert!(result.is_ok(), "{result:?}");
}

#[tokio::test]
async fn http_failure_is_logged_as_invite_error() {
    let (logs, _guard) = LogCapture::install();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sharing/add_folder_member"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "error_summary": "access_error/not_a_member/..",
            "error": {".tag": "access_error", "access_error": {".tag": "not_a_member"}}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = provisioner(&server)
        .provision(&sample_employee())
        .await
        .unwrap_err();

    assert!(matches!(err, ProvisionError::RemoteRejection { status: 409, .. }));
    let error = logs.only(Level::ERROR);
    assert!(error.mentions(SAMPLE_EMAIL));
    assert!(error.message.starts_with("Error inviting"));
    assert!(!error.message.contains("decoding"));
}

#[tokio::test]
async fn undecodable_body_is_logged_separately() {
    let (logs, _guard) = LogCapture::install();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sharing/add_folder_member"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
        .expect(1)
        .mount(&server)
        .await;

    let err = provisioner(&server)
        .provision(&sample_employee())
        .await
        .unwrap_err();

    assert!(matches!(err, ProvisionError::Decode { .. }));
    let error = logs.only(Level::ERROR);
    assert!(error.mentions(SAMPLE_EMAIL));
    assert!(error.message.starts_with("Error decoding file share response"));
    assert_eq!(error.field("error_kind"), Some("decode"));
}

#[tokio::test]
async fn unreachable_api_is_transport_failure() {
    let (logs, _guard) = LogCapture::install();

    let err = FileShareProvisioner::new(http_client(), file_share_config(UNREACHABLE_BASE))
        .provision(&sample_employee())
        .await
        .unwrap_err();

    assert!(matches!(err, ProvisionError::Transport { .. }));
    let error = logs.only(Level::ERROR);
    assert!(error.mentions(SAMPLE_EMAIL));
    assert!(error.message.starts_with("Error inviting"));
}
