//! HTTP behaviour of the unsubscribe executor against a local mock server

use std::time::Duration;

use chrono::Utc;
use mailmute::executor::UnsubscribeExecutor;
use mailmute::models::UnsubscribeCandidate;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn candidate_with_links(links: Vec<String>) -> UnsubscribeCandidate {
    UnsubscribeCandidate {
        id: "<msg-1@shop.example>".to_string(),
        sender: "promo@shop.example".to_string(),
        subject: "Unsubscribe from our deals".to_string(),
        links,
        unsubscribe_mail_address: None,
        list_unsubscribe_header: None,
        confidence: 0.9,
        date: Utc::now(),
        content_preview: String::new(),
    }
}

fn executor() -> UnsubscribeExecutor {
    UnsubscribeExecutor::with_timeout(Duration::from_secs(2)).unwrap()
}

#[tokio::test]
async fn success_page_yields_success_outcome() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/unsub"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body><p>You have been successfully unsubscribed.</p></body></html>",
        ))
        .mount(&server)
        .await;

    let url = format!("{}/unsub", server.uri());
    let candidate = candidate_with_links(vec![url.clone()]);
    let outcomes = executor().execute(&candidate).await;

    assert_eq!(outcomes.len(), 1);
    assert!(outcomes[0].succeeded);
    assert_eq!(
        outcomes[0].outcome_text,
        format!("Successfully unsubscribed via: {}", url)
    );
}

#[tokio::test]
async fn success_short_circuits_remaining_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/first"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html>Unsubscribe successful</html>"),
        )
        .mount(&server)
        .await;
    // The second link would also succeed, but must never be visited
    Mock::given(method("GET"))
        .and(path("/second"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html>Unsubscribe successful</html>"),
        )
        .expect(0)
        .mount(&server)
        .await;

    let candidate = candidate_with_links(vec![
        format!("{}/first", server.uri()),
        format!("{}/second", server.uri()),
    ]);
    let outcomes = executor().execute(&candidate).await;

    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].strategy_label, "link_1");
    assert!(outcomes[0].succeeded);
}

#[tokio::test]
async fn form_page_is_reported_not_submitted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/confirm"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><body>
            <form method="post" action="/do-unsubscribe">
              <p>Click the button to unsubscribe from this list</p>
              <input type="submit" value="Confirm">
            </form>
            </body></html>"#,
        ))
        .mount(&server)
        .await;
    // Nothing may POST to the form target
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let url = format!("{}/confirm", server.uri());
    let candidate = candidate_with_links(vec![url.clone()]);
    let outcomes = executor().execute(&candidate).await;

    assert_eq!(outcomes.len(), 1);
    assert!(!outcomes[0].succeeded);
    assert_eq!(
        outcomes[0].outcome_text,
        format!(
            "Found unsubscribe form at {} (auto-submission not implemented for safety)",
            url
        )
    );
}

#[tokio::test]
async fn non_200_and_timeout_are_classified_per_link() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/gone"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&server)
        .await;

    let gone = format!("{}/gone", server.uri());
    let slow = format!("{}/slow", server.uri());
    let candidate = candidate_with_links(vec![gone.clone(), slow.clone()]);
    let outcomes = executor().execute(&candidate).await;

    // Both links were tried; neither failure aborted the candidate
    assert_eq!(outcomes.len(), 2);
    assert_eq!(
        outcomes[0].outcome_text,
        format!("Failed to visit {} - Status Code: 404", gone)
    );
    assert_eq!(
        outcomes[1].outcome_text,
        format!("Timeout accessing: {}", slow)
    );
    assert!(outcomes.iter().all(|o| !o.succeeded));
}

#[tokio::test]
async fn unreachable_host_yields_error_outcome() {
    // Port from a started-then-dropped server is very unlikely to be reused
    let url = {
        let server = MockServer::start().await;
        server.uri()
    };

    let candidate = candidate_with_links(vec![format!("{}/unsub", url)]);
    let outcomes = executor().execute(&candidate).await;

    assert_eq!(outcomes.len(), 1);
    assert!(!outcomes[0].succeeded);
    assert!(outcomes[0].outcome_text.starts_with("Error accessing"));
}

#[tokio::test]
async fn unclear_page_does_not_count_as_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/landing"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            "<html><body><h1>Welcome to our preference center</h1></body></html>",
        ))
        .mount(&server)
        .await;

    let url = format!("{}/landing", server.uri());
    let candidate = candidate_with_links(vec![url.clone()]);
    let outcomes = executor().execute(&candidate).await;

    assert_eq!(outcomes.len(), 1);
    assert!(!outcomes[0].succeeded);
    assert_eq!(
        outcomes[0].outcome_text,
        format!("Visited {} but unclear whether the unsubscribe took effect", url)
    );
}

#[tokio::test]
async fn email_stub_precedes_link_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/unsub"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("<html>Unsubscribe successful</html>"),
        )
        .mount(&server)
        .await;

    let url = format!("{}/unsub", server.uri());
    let mut candidate = candidate_with_links(vec![url]);
    candidate.list_unsubscribe_header =
        Some("<mailto:unsub@shop.example>, <https://shop.example/u>".to_string());
    candidate.unsubscribe_mail_address = Some("unsub@shop.example".to_string());

    let outcomes = executor().execute(&candidate).await;

    // The stub never succeeds, so the link is still attempted after it
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].strategy_label, "email");
    assert_eq!(
        outcomes[0].outcome_text,
        "Email unsubscribe request would be sent to: unsub@shop.example"
    );
    assert!(!outcomes[0].succeeded);
    assert_eq!(outcomes[1].strategy_label, "link_1");
    assert!(outcomes[1].succeeded);
}
