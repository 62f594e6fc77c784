use promptcanvas::{
    backends::{build_http_client, BackendChain, ImageBackend},
    config::{GeminiConfig, PollingConfig, PollinationsConfig, ProdiaConfig},
    GeminiBackend, ImageFormat, PollinationsBackend, ProdiaBackend,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn tiny_png() -> Vec<u8> {
    let pixels = image::RgbImage::from_pixel(4, 4, image::Rgb([10, 20, 30]));
    let mut out = Cursor::new(Vec::new());
    pixels.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

fn fast_polling(max_attempts: u32) -> PollingConfig {
    PollingConfig {
        interval: Duration::from_millis(10),
        max_attempts,
    }
}

fn prodia(server: &MockServer, polling: PollingConfig) -> ProdiaBackend {
    let config = ProdiaConfig::new()
        .with_credentials("test-key")
        .with_base_url(format!("{}/v1", server.uri()));
    ProdiaBackend::new(build_http_client(Duration::from_secs(5)).unwrap(), &config, polling).unwrap()
}

fn pollinations(base_url: String) -> PollinationsBackend {
    PollinationsBackend::new(
        build_http_client(Duration::from_secs(5)).unwrap(),
        &PollinationsConfig::new().with_base_url(base_url),
    )
    .unwrap()
}

async fn mount_submit(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/sd/generate"))
        .and(header("X-Prodia-Key", "test-key"))
        .and(body_partial_json(json!({
            "prompt": "a red dragon",
            "steps": 25,
            "cfg_scale": 7,
            "width": 512,
            "height": 512
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job": "job-1",
            "status": "queued"
        })))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn prodia_polls_until_succeeded_then_downloads() {
    let server = MockServer::start().await;
    mount_submit(&server).await;

    Mock::given(method("GET"))
        .and(path("/v1/job/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job": "job-1",
            "status": "generating"
        })))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/job/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job": "job-1",
            "status": "succeeded",
            "imageUrl": format!("{}/images/job-1.png", server.uri())
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/images/job-1.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(tiny_png(), "image/png"))
        .expect(1)
        .mount(&server)
        .await;

    let image = prodia(&server, fast_polling(5)).generate("a red dragon").await.unwrap();
    assert_eq!(image.format, ImageFormat::Png);
    assert_eq!(image.backend, "prodia");
    assert_eq!(image.bytes, tiny_png());
}

#[tokio::test]
async fn prodia_synchronous_image_skips_polling() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sd/generate"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(tiny_png(), "image/png"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/v1/job/"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let image = prodia(&server, fast_polling(3)).generate("a red dragon").await.unwrap();
    assert_eq!(image.format, ImageFormat::Png);
}

#[tokio::test]
async fn prodia_failed_job_stops_polling() {
    let server = MockServer::start().await;
    mount_submit(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/job/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job": "job-1",
            "status": "failed"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let err = prodia(&server, fast_polling(30)).generate("a red dragon").await.unwrap_err();
    assert!(err.to_string().contains("failed"));
}

#[tokio::test]
async fn prodia_gives_up_after_attempt_budget() {
    let server = MockServer::start().await;
    mount_submit(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/job/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job": "job-1",
            "status": "generating"
        })))
        .expect(3)
        .mount(&server)
        .await;

    let err = prodia(&server, fast_polling(3)).generate("a red dragon").await.unwrap_err();
    assert!(err.to_string().contains("after 3 polls"));
}

#[tokio::test]
async fn stuck_job_falls_through_to_next_tier() {
    let server = MockServer::start().await;
    mount_submit(&server).await;
    Mock::given(method("GET"))
        .and(path("/v1/job/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "job": "job-1",
            "status": "queued"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex("^/prompt/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(tiny_png(), "image/png"))
        .expect(1)
        .mount(&server)
        .await;

    let chain = BackendChain::new(vec![
        Arc::new(prodia(&server, fast_polling(2))),
        Arc::new(pollinations(server.uri())),
    ]);
    let image = chain.submit_and_await("a red dragon").await.unwrap();
    assert_eq!(image.backend, "pollinations");
}

#[tokio::test]
async fn pollinations_requests_encoded_prompt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex("^/prompt/a%20cat%20on%20a%20roof$"))
        .and(query_param("width", "512"))
        .and(query_param("height", "512"))
        .and(query_param("nologo", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(tiny_png(), "image/jpeg"))
        .expect(1)
        .mount(&server)
        .await;

    let image = pollinations(server.uri()).generate("a cat on a roof").await.unwrap();
    // the declared content type is ignored in favour of the actual bytes
    assert_eq!(image.format, ImageFormat::Png);
}

#[tokio::test]
async fn pollinations_error_body_is_not_an_image() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex("^/prompt/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "busy" })))
        .mount(&server)
        .await;
    assert!(pollinations(server.uri()).generate("a cat").await.is_err());

    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path_regex("^/prompt/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;
    assert!(pollinations(server.uri()).generate("a cat").await.is_err());
}

#[tokio::test]
async fn gemini_decodes_inline_image() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/test-model:generateContent"))
        .and(header("x-goog-api-key", "gemini-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": {
                    "parts": [
                        { "text": "Here is your picture" },
                        { "inlineData": { "mimeType": "image/png", "data": BASE64.encode(tiny_png()) } }
                    ]
                }
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let config = GeminiConfig {
        model: "test-model".to_string(),
        ..GeminiConfig::new()
            .with_credentials("gemini-key")
            .with_base_url(format!("{}/v1beta", server.uri()))
    };
    let backend = GeminiBackend::new(build_http_client(Duration::from_secs(5)).unwrap(), &config).unwrap();

    let image = backend.generate("a lighthouse").await.unwrap();
    assert_eq!(image.backend, "gemini");
    assert_eq!(image.bytes, tiny_png());
}

#[tokio::test]
async fn unreachable_backends_yield_none() {
    let client = build_http_client(Duration::from_secs(2)).unwrap();
    let prodia = ProdiaBackend::new(
        client.clone(),
        &ProdiaConfig::new()
            .with_credentials("key")
            .with_base_url("http://127.0.0.1:9/v1"),
        fast_polling(2),
    )
    .unwrap();
    let chain = BackendChain::new(vec![
        Arc::new(prodia),
        Arc::new(pollinations("http://127.0.0.1:9".to_string())),
    ]);

    assert!(chain.submit_and_await("a red dragon").await.is_none());
}
