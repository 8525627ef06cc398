use std::collections::HashMap;
use std::time::Duration;

use wiremock::{matchers, Mock, ResponseTemplate};

use super::helpers::*;

struct SubscribeFormMatcher {
    email: &'static str,
}

impl wiremock::Match for SubscribeFormMatcher {
    fn matches(&self, request: &wiremock::Request) -> bool {
        let body: Result<HashMap<String, String>, _> = serde_urlencoded::from_bytes(&request.body);
        match body {
            Ok(fields) => {
                fields.get("resfmt").map(String::as_str) == Some("JSON")
                    && fields.get("emailids").map(String::as_str) == Some(self.email)
                    && fields.contains_key("listkey")
            }
            Err(_e) => false,
        }
    }
}

#[tokio::test]
async fn capture_returns_a_200_for_a_valid_email() {
    // Arrange
    let test_app = spawn_app().await;
    test_app.mount_token_granted().await;

    Mock::given(matchers::path("/json/listsubscribe"))
        .and(matchers::method("POST"))
        .and(matchers::header("Authorization", "Zoho-oauthtoken abc123"))
        .and(SubscribeFormMatcher {
            email: "jane.doe@schoolboard.org",
        })
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"code": "0"})))
        .expect(1)
        .mount(&test_app.campaign_server)
        .await;

    // Act
    let response = test_app
        .post_capture(&serde_json::json!({
            "email": "Jane.Doe@SchoolBoard.org",
            "source": "hero-banner",
        }))
        .await;

    // Assert
    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["email"], "jane.doe@schoolboard.org");
    assert_eq!(body["source"], "hero-banner");
    assert!(!body["message"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn capture_defaults_the_source_label() {
    let test_app = spawn_app().await;
    test_app.mount_token_granted().await;
    test_app.mount_subscribe_success(1).await;

    let response = test_app
        .post_capture(&serde_json::json!({"email": "jane.doe@schoolboard.org"}))
        .await;

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["source"], "landing-page");
}

#[tokio::test]
async fn capture_returns_a_400_when_the_body_is_not_json() {
    let test_app = spawn_app().await;

    let response = test_app.post_capture_raw("definitely not json").await;

    assert_eq!(400, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(!body["message"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn capture_returns_a_400_when_the_email_is_missing() {
    let test_app = spawn_app().await;

    let response = test_app.post_capture(&serde_json::json!({})).await;

    assert_eq!(400, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(!body["message"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn capture_returns_a_400_when_the_email_has_no_at_symbol() {
    let test_app = spawn_app().await;

    let response = test_app
        .post_capture(&serde_json::json!({"email": "ursuladomain.com"}))
        .await;

    assert_eq!(400, response.status().as_u16());
}

#[tokio::test]
async fn capture_rejects_gatekept_candidates_without_an_outbound_request() {
    // Arrange
    let test_app = spawn_app().await;
    Mock::given(matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.campaign_server)
        .await;

    let test_cases = vec![
        ("test@mailinator.com", "a disposable domain"),
        ("user@example.com", "a placeholder domain"),
        ("noreply@gmail.com", "a throwaway local part"),
    ];

    // Act
    for (email, reason) in test_cases {
        let response = test_app
            .post_capture(&serde_json::json!({"email": email}))
            .await;

        // Assert
        assert_eq!(
            400,
            response.status().as_u16(),
            "The API did not reject {}.",
            reason
        );
    }
}

#[tokio::test]
async fn capture_preflight_returns_a_200() {
    let test_app = spawn_app().await;

    let response = test_app.preflight_capture().await;

    assert_eq!(200, response.status().as_u16());
    assert!(response
        .headers()
        .contains_key("access-control-allow-origin"));
}

#[tokio::test]
async fn an_upstream_500_is_still_a_success_for_the_caller() {
    // Soft-failure guarantee: integration faults never surface as failure.
    let test_app = spawn_app().await;
    test_app.mount_token_granted().await;

    Mock::given(matchers::path("/json/listsubscribe"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&test_app.campaign_server)
        .await;

    let response = test_app
        .post_capture(&serde_json::json!({"email": "jane.doe@schoolboard.org"}))
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(!body["message"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn a_token_refresh_failure_is_still_a_success_for_the_caller() {
    let test_app = spawn_app().await;

    Mock::given(matchers::path("/token"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&test_app.campaign_server)
        .await;
    Mock::given(matchers::path("/json/listsubscribe"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.campaign_server)
        .await;

    let response = test_app
        .post_capture(&serde_json::json!({"email": "jane.doe@schoolboard.org"}))
        .await;

    assert_eq!(200, response.status().as_u16());
}

#[tokio::test]
async fn missing_credentials_are_absorbed_into_a_soft_success() {
    let test_app = spawn_app_with(|c| {
        c.campaign.refresh_token = None;
    })
    .await;
    Mock::given(matchers::any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&test_app.campaign_server)
        .await;

    let response = test_app
        .post_capture(&serde_json::json!({"email": "jane.doe@schoolboard.org"}))
        .await;

    assert_eq!(200, response.status().as_u16());
    let body: serde_json::Value = response.json().await.unwrap();
    assert!(!body["message"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn persistent_timeouts_are_retried_then_acknowledged_softly() {
    // max_retries is 3, so four subscribe attempts in total.
    let test_app = spawn_app_with(|c| {
        c.campaign.timeout_milliseconds = 200;
    })
    .await;
    test_app.mount_token_granted().await;

    Mock::given(matchers::path("/json/listsubscribe"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"code": "0"}))
                .set_delay(Duration::from_secs(30)),
        )
        .expect(4)
        .mount(&test_app.campaign_server)
        .await;

    let response = test_app
        .post_capture(&serde_json::json!({"email": "jane.doe@schoolboard.org"}))
        .await;

    assert_eq!(200, response.status().as_u16());
}
