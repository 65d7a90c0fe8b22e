use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use woo_software::{
    ActivateOptions, ApiError, ApiResult, CheckOptions, DeactivateOptions, GenerateKeyOptions,
    Platform, RemoteErrorCode, SoftwareAddOn, Transport, NO_ERROR,
};

fn addon_for(base_url: &str) -> SoftwareAddOn {
    let transport = Transport::from_base_url(base_url, None).expect("valid base url");
    SoftwareAddOn::with_transport(transport, "PRODUCT-1", Some("owner@example.com"))
        .with_activation_platform(Platform::Unspecified)
        .with_check_platform(Platform::Unspecified)
}

/// Runs every operation once, in a fixed order.
async fn run_all(addon: &SoftwareAddOn) -> Vec<(&'static str, ApiResult)> {
    vec![
        (
            "generate_key",
            addon
                .generate_key("SECRET", None, &GenerateKeyOptions::default())
                .await,
        ),
        (
            "activation",
            addon
                .activate_license("KEY", None, &ActivateOptions::default())
                .await,
        ),
        ("activation_reset", addon.reset_license("KEY", None).await),
        (
            "deactivation",
            addon
                .deactivate_license("KEY", None, &DeactivateOptions::default())
                .await,
        ),
        (
            "check",
            addon.check_license("KEY", None, &CheckOptions::default()).await,
        ),
    ]
}

fn query_of(request: &wiremock::Request) -> Vec<(String, String)> {
    request
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

fn keys_of(request: &wiremock::Request) -> Vec<String> {
    query_of(request).into_iter().map(|(k, _)| k).collect()
}

#[tokio::test]
async fn non_200_status_fails_every_operation() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/woocommerce/"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    for (name, result) in run_all(&addon_for(&server.uri())).await {
        assert!(!result.success(), "{name} should fail");
        assert_eq!(result.code(), Some(503), "{name}");
        assert!(result.error_message().contains("503"), "{name}");
        assert_eq!(result.error(), Some(&ApiError::Status(503)), "{name}");
        assert!(result.output().is_none(), "{name}");
        assert!(result.headers().is_some(), "{name}");
    }
}

#[tokio::test]
async fn connection_failure_reports_code_zero() {
    // Nothing listens on port 1.
    let addon = addon_for("http://127.0.0.1:1");

    for (name, result) in run_all(&addon).await {
        assert!(!result.success(), "{name} should fail");
        assert_eq!(result.code(), Some(0), "{name}");
        assert!(result.headers().is_none(), "{name}");
        assert!(
            matches!(result.error(), Some(ApiError::Transport(_))),
            "{name}: {:?}",
            result.error()
        );
    }
}

#[tokio::test]
async fn invalid_json_keeps_raw_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/woocommerce/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    for (name, result) in run_all(&addon_for(&server.uri())).await {
        assert!(!result.success(), "{name} should fail");
        assert_eq!(result.code(), Some(200), "{name}");
        assert_eq!(result.raw_output(), Some("<html>not json</html>"), "{name}");
        assert!(
            matches!(result.error(), Some(ApiError::InvalidJson(_))),
            "{name}"
        );
    }
}

#[tokio::test]
async fn valid_json_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/woocommerce/"))
        .and(query_param("request", "activation"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "activated": true,
            "instance": 1700000000,
            "message": "1 out of 1 activations remaining",
            "timestamp": 1700000000,
            "sig": "signature"
        })))
        .mount(&server)
        .await;

    let result = addon_for(&server.uri())
        .activate_license("KEY", None, &ActivateOptions::default())
        .await;

    assert!(result.success());
    assert_eq!(result.code(), Some(200));
    assert!(result.error().is_none());
    assert_eq!(result.error_message(), NO_ERROR);
    assert_eq!(result.json_output().unwrap()["activated"], json!(true));
}

#[tokio::test]
async fn remote_error_downgrades_result() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/woocommerce/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "error": "Exceeded maximum number of activations",
            "code": "103",
            "timestamp": 1700000000,
            "sig": "signature"
        })))
        .mount(&server)
        .await;

    for (name, result) in run_all(&addon_for(&server.uri())).await {
        assert!(!result.success(), "{name} should fail");
        assert_eq!(result.code(), Some(200), "{name}");
        assert_eq!(
            result.error_message(),
            "Code 103: Exceeded maximum number of activations",
            "{name}"
        );
        let remote = result.error().and_then(ApiError::remote).unwrap();
        assert_eq!(remote.code, RemoteErrorCode::ActivationLimitReached, "{name}");
        // The body stays available for inspection.
        assert!(result.json_output().is_some(), "{name}");
    }
}

#[tokio::test]
async fn transport_error_does_not_expose_keys() {
    // Nothing listens on port 1.
    let addon = addon_for("http://127.0.0.1:1");

    let generated = addon
        .generate_key("TOPSECRET123", None, &GenerateKeyOptions::default())
        .await;
    let activated = addon
        .activate_license("LICENSEKEY-ABCD", None, &ActivateOptions::default())
        .await;

    for result in [generated, activated] {
        assert!(matches!(result.error(), Some(ApiError::Transport(_))));
        let message = result.error_message();
        assert!(!message.contains("TOPSECRET123"), "{message}");
        assert!(!message.contains("LICENSEKEY-ABCD"), "{message}");
        assert!(!message.contains("wc-api"), "{message}");
    }
}

#[tokio::test]
async fn large_body_is_read_completely() {
    let server = MockServer::start().await;
    let messages: Vec<String> = (0..5_000).map(|i| format!("entry-{i}")).collect();
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "messages": messages })))
        .mount(&server)
        .await;

    let result = addon_for(&server.uri()).reset_license("KEY", None).await;

    assert!(result.success());
    let parsed = result.json_output().unwrap()["messages"].as_array().unwrap();
    assert_eq!(parsed.len(), 5_000);
}

#[tokio::test]
async fn query_keeps_call_site_order_and_omits_empty_values() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
        .mount(&server)
        .await;
    let addon = addon_for(&server.uri());

    let generate = GenerateKeyOptions {
        order_id: Some(String::new()),
        version: Some("2.1".to_string()),
        key_prefix: None,
        activations: 3,
    };
    addon.generate_key("SECRET", None, &generate).await;

    let activate = ActivateOptions {
        instance: Some(String::new()),
        platform: Some(Platform::from("")),
    };
    addon.activate_license("KEY", None, &activate).await;

    let deactivate = DeactivateOptions {
        instance: Some("1700000000".to_string()),
        activation_id: Some(String::new()),
    };
    addon.deactivate_license("KEY", None, &deactivate).await;

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 3);

    assert_eq!(
        query_of(&requests[0]),
        vec![
            ("wc-api".to_string(), "software-api".to_string()),
            ("request".to_string(), "generate_key".to_string()),
            ("secret_key".to_string(), "SECRET".to_string()),
            ("email".to_string(), "owner@example.com".to_string()),
            ("product_id".to_string(), "PRODUCT-1".to_string()),
            ("version".to_string(), "2.1".to_string()),
            ("activations".to_string(), "3".to_string()),
        ]
    );
    assert_eq!(
        keys_of(&requests[1]),
        vec!["wc-api", "request", "email", "license_key", "product_id"]
    );
    assert_eq!(
        keys_of(&requests[2]),
        vec!["wc-api", "request", "email", "license_key", "product_id", "instance"]
    );
}

#[tokio::test]
async fn reset_and_check_send_only_required_params() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "reset": true })))
        .mount(&server)
        .await;
    let addon = addon_for(&server.uri());

    addon.reset_license("KEY", None).await;
    addon.check_license("KEY", None, &CheckOptions::default()).await;

    let requests = server.received_requests().await.expect("recording enabled");
    for request in &requests {
        assert_eq!(
            keys_of(request),
            vec!["wc-api", "request", "email", "license_key", "product_id"]
        );
    }
    assert_eq!(query_of(&requests[0])[1].1, "activation_reset");
    assert_eq!(query_of(&requests[1])[1].1, "check");
}

#[tokio::test]
async fn activation_sends_system_platform_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "activated": true })))
        .mount(&server)
        .await;

    let transport = Transport::from_base_url(&server.uri(), None).unwrap();
    let addon = SoftwareAddOn::with_transport(transport, "PRODUCT-1", Some("owner@example.com"));
    addon
        .activate_license("KEY", None, &ActivateOptions::default())
        .await;

    let requests = server.received_requests().await.expect("recording enabled");
    let platform = query_of(&requests[0])
        .into_iter()
        .find(|(k, _)| k == "platform")
        .map(|(_, v)| v);
    assert_eq!(
        platform.as_deref(),
        Some(woo_software::hardware::get_system_info())
    );
}
