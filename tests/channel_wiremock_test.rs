use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use flate2::read::GzDecoder;
use rask_event_shipper::sender::{ChannelConfig, ChannelError, Compress, HttpChannel, UploadChannel};
use std::io::Read;
use std::time::Duration;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path},
};

const PAYLOAD: &str = r#"{"project":"p","user":"u","sign":"abc","content":"{}"}"#;

fn channel_for(server: &MockServer, timeout: Duration) -> HttpChannel {
    HttpChannel::new(ChannelConfig {
        endpoint: server.uri(),
        timeout,
        ..Default::default()
    })
    .unwrap()
}

fn accepted() -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(r#"{"Status":10000,"Msg":"ok"}"#)
}

/// Unwraps `data=<urlencoded base64(frame)>` back to the inner frame bytes.
fn outer_frame(body: &[u8]) -> Vec<u8> {
    let (key, value) = url::form_urlencoded::parse(body).next().unwrap();
    assert_eq!(key, "data");
    STANDARD.decode(value.as_bytes()).unwrap()
}

/// Unwraps the inner `data=<base64(payload)>` frame.
fn inner_payload(frame: &[u8]) -> String {
    let frame = std::str::from_utf8(frame).unwrap();
    let encoded = frame.strip_prefix("data=").unwrap();
    String::from_utf8(STANDARD.decode(encoded).unwrap()).unwrap()
}

#[tokio::test]
async fn uncompressed_post_carries_protocol_headers() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/logagent"))
        .and(header("compress", "none"))
        .and(header("lib", "Rust"))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .respond_with(accepted())
        .expect(1)
        .mount(&mock_server)
        .await;

    let channel = channel_for(&mock_server, Duration::from_secs(5));
    let response = channel.post(PAYLOAD, Compress::None).await.unwrap();

    assert!(response.is_accepted());
    assert_eq!(response.message, "ok");

    let requests = mock_server.received_requests().await.unwrap();
    let frame = outer_frame(&requests[0].body);
    assert_eq!(inner_payload(&frame), PAYLOAD);
}

#[tokio::test]
async fn gzip_post_decodes_to_original_payload() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/logagent"))
        .and(header("compress", "gzip"))
        .respond_with(accepted())
        .mount(&mock_server)
        .await;

    let channel = channel_for(&mock_server, Duration::from_secs(5));
    channel.post(PAYLOAD, Compress::Gzip).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let compressed = outer_frame(&requests[0].body);
    assert_eq!(&compressed[..2], &[0x1f, 0x8b]);

    let mut frame = Vec::new();
    GzDecoder::new(compressed.as_slice())
        .read_to_end(&mut frame)
        .unwrap();
    assert_eq!(inner_payload(&frame), PAYLOAD);
}

#[tokio::test]
async fn existing_ingest_path_is_not_doubled() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/logagent"))
        .respond_with(accepted())
        .expect(1)
        .mount(&mock_server)
        .await;

    let channel = HttpChannel::new(ChannelConfig {
        endpoint: format!("{}/logagent", mock_server.uri()),
        ..Default::default()
    })
    .unwrap();

    assert!(channel.post(PAYLOAD, Compress::None).await.unwrap().is_accepted());
}

#[tokio::test]
async fn server_error_is_http_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("Internal Server Error"))
        .mount(&mock_server)
        .await;

    let channel = channel_for(&mock_server, Duration::from_secs(5));

    match channel.post(PAYLOAD, Compress::None).await {
        Err(ChannelError::HttpError { status }) => assert_eq!(status, 500),
        other => panic!("Expected HttpError, got {other:?}"),
    }
}

#[tokio::test]
async fn malformed_body_is_invalid_response() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let channel = channel_for(&mock_server, Duration::from_secs(5));

    assert!(matches!(
        channel.post(PAYLOAD, Compress::None).await,
        Err(ChannelError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn rejected_status_is_returned_not_accepted() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"Status":10001,"Msg":"bad sign"}"#),
        )
        .mount(&mock_server)
        .await;

    let channel = channel_for(&mock_server, Duration::from_secs(5));
    let response = channel.post(PAYLOAD, Compress::None).await.unwrap();

    assert_eq!(response.status, 10001);
    assert!(!response.is_accepted());
}

#[tokio::test]
async fn slow_server_is_request_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(accepted().set_delay(Duration::from_millis(500)))
        .mount(&mock_server)
        .await;

    let channel = channel_for(&mock_server, Duration::from_millis(100));

    match channel.post(PAYLOAD, Compress::None).await {
        Err(ChannelError::RequestTimeout(timeout)) => {
            assert_eq!(timeout, Duration::from_millis(100));
        }
        other => panic!("Expected RequestTimeout, got {other:?}"),
    }
}
