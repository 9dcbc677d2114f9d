//! Mock server helpers for the release feed and archive downloads

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::feed::feed_body;
use super::fixtures::FEED_PATH;

/// URL an archive is served from on `server`
pub fn archive_url(server: &MockServer, file_name: &str) -> String {
    format!("{}/download/{}", server.uri(), file_name)
}

/// Serve a feed entry for `code` advertising `build` at `archive_url`
pub async fn mock_feed(server: &MockServer, code: &str, build: &str, archive_url: &str, size: u64) {
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .and(query_param("code", code))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(feed_body(code, build, archive_url, size)),
        )
        .mount(server)
        .await;
}

/// Feed endpoint that must never be called
pub async fn mock_feed_unused(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(FEED_PATH))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(server)
        .await;
}

/// Serve `content` at `/download/<file_name>`
pub async fn mock_archive(server: &MockServer, file_name: &str, content: &[u8]) {
    Mock::given(method("GET"))
        .and(path(format!("/download/{}", file_name)))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(content.to_vec()))
        .mount(server)
        .await;
}

/// Archive endpoint that must never be called
pub async fn mock_archive_unused(server: &MockServer, file_name: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/download/{}", file_name)))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

/// Archive endpoint that always fails with `status`
pub async fn mock_archive_status(server: &MockServer, file_name: &str, status: u16) {
    Mock::given(method("GET"))
        .and(path(format!("/download/{}", file_name)))
        .respond_with(ResponseTemplate::new(status))
        .mount(server)
        .await;
}
