use std::sync::LazyLock;

use secrecy::SecretString;
use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

use email_capture::{
    configuration::{get_configuration, Settings},
    startup::Application,
    telemetry::{get_subscriber, init_subscriber},
};

static TRACING: LazyLock<()> = LazyLock::new(|| {
    let default_filter_level = "debug".to_string();
    let subscriber_name = "test".to_string();
    match std::env::var("TEST_LOG") {
        Ok(_) => {
            let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::stdout);
            init_subscriber(subscriber);
        }
        Err(_) => {
            let subscriber = get_subscriber(subscriber_name, default_filter_level, std::io::sink);
            init_subscriber(subscriber);
        }
    }
});

pub struct TestApp {
    pub address: String,
    /// Stands in for both the token endpoint and the bulk-subscribe
    /// endpoint of the campaign provider.
    pub campaign_server: MockServer,
}

impl TestApp {
    pub async fn post_capture(&self, body: &serde_json::Value) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{}/api/email-capture", &self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn post_capture_raw(&self, body: impl Into<reqwest::Body>) -> reqwest::Response {
        reqwest::Client::new()
            .post(format!("{}/api/email-capture", &self.address))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn preflight_capture(&self) -> reqwest::Response {
        reqwest::Client::new()
            .request(
                reqwest::Method::OPTIONS,
                format!("{}/api/email-capture", &self.address),
            )
            .header("Origin", "https://www.example-landing.dev")
            .header("Access-Control-Request-Method", "POST")
            .header("Access-Control-Request-Headers", "content-type")
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn mount_token_granted(&self) {
        Mock::given(matchers::path("/token"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"access_token": "abc123"})),
            )
            .mount(&self.campaign_server)
            .await;
    }

    pub async fn mount_subscribe_success(&self, expected_calls: u64) {
        Mock::given(matchers::path("/json/listsubscribe"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"code": "0"})),
            )
            .expect(expected_calls)
            .mount(&self.campaign_server)
            .await;
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

pub async fn spawn_app_with(customize: impl FnOnce(&mut Settings)) -> TestApp {
    LazyLock::force(&TRACING);

    let campaign_server = MockServer::start().await;

    let configuration = {
        let mut c = get_configuration().expect("Failed to read configuration.");
        c.application.port = 0;
        c.campaign.token_url = campaign_server.uri();
        c.campaign.subscribe_url = campaign_server.uri();
        c.campaign.client_id = Some("1000.test-client".into());
        c.campaign.client_secret = Some(SecretString::new("test-secret".into()));
        c.campaign.refresh_token = Some(SecretString::new("1000.test-refresh".into()));
        c.campaign.list_key = Some(SecretString::new("test-list-key".into()));
        c.campaign.timeout_milliseconds = 500;
        c.campaign.backoff_milliseconds = 20;
        customize(&mut c);
        c
    };

    let app = Application::build(configuration)
        .await
        .expect("Failed to build the test application");
    let address = format!("http://127.0.0.1:{}", app.port());

    tokio::spawn(app.run_until_stopped());

    TestApp {
        address,
        campaign_server,
    }
}
