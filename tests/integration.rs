use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use pdfqa_core::{PdfIngestor, QaService};
use pdfqa_gateway::GatewayServer;
use pdfqa_llm::AnyProvider;
use pdfqa_llm::mock::MockProvider;
use pdfqa_memory::SqliteStore;
use pdfqa_memory::document::{RetrievalPipeline, SplitterConfig, TextSplitter};
use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio_tungstenite::tungstenite::Message;

const SKY_PDF: &[u8] = include_bytes!("fixtures/sky.pdf");

struct TestServer {
    addr: SocketAddr,
    dir: tempfile::TempDir,
    shutdown_tx: watch::Sender<bool>,
    handle: tokio::task::JoinHandle<Result<(), pdfqa_gateway::GatewayError>>,
}

impl TestServer {
    async fn start(provider: MockProvider, rate_limit: u32) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::new(dir.path().join("documents.db").to_str().unwrap())
            .await
            .unwrap();
        let pipeline = RetrievalPipeline::new(TextSplitter::new(SplitterConfig::default()), 5);
        let qa = QaService::new(store.clone(), AnyProvider::Mock(provider), pipeline);
        let ingestor = PdfIngestor::new(store.clone(), dir.path().join("uploaded_pdfs"));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = GatewayServer::new("127.0.0.1", addr.port(), store, ingestor, qa, shutdown_rx)
            .with_rate_limit(rate_limit, Duration::from_secs(60));
        let handle = tokio::spawn(server.serve_on(listener));

        Self {
            addr,
            dir,
            shutdown_tx,
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    async fn stop(self) {
        self.shutdown_tx.send(true).unwrap();
        let result = tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server stops after shutdown")
            .unwrap();
        assert!(result.is_ok());
    }
}

async fn upload(
    client: &reqwest::Client,
    server: &TestServer,
    bytes: &[u8],
    mime: &str,
) -> reqwest::Response {
    let part = Part::bytes(bytes.to_vec())
        .file_name("sky.pdf")
        .mime_str(mime)
        .unwrap();
    client
        .post(server.url("/upload/"))
        .multipart(Form::new().part("file", part))
        .send()
        .await
        .unwrap()
}

async fn ask(
    ws: &mut tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >,
    payload: &serde_json::Value,
) -> serde_json::Value {
    ws.send(Message::Text(payload.to_string().into())).await.unwrap();
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(10), ws.next())
            .await
            .expect("reply within timeout")
            .expect("channel open")
            .unwrap();
        if msg.is_text() {
            return serde_json::from_str(msg.to_text().unwrap()).unwrap();
        }
    }
}

#[tokio::test]
async fn upload_list_and_ask() {
    let server = TestServer::start(MockProvider::echoing(), 0).await;
    let client = reqwest::Client::new();

    let resp = upload(&client, &server, SKY_PDF, "application/pdf").await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "File uploaded successfully");
    let id = body["id"].as_str().unwrap().to_owned();
    assert!(
        server
            .dir
            .path()
            .join("uploaded_pdfs")
            .join(format!("{id}.pdf"))
            .exists()
    );

    let listing: serde_json::Value = client
        .get(server.url("/get_all_pdfs/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let pdfs = listing["pdfs"].as_array().unwrap();
    assert_eq!(pdfs.len(), 1);
    assert_eq!(pdfs[0]["id"], id.as_str());
    assert_eq!(pdfs[0]["filename"], "sky.pdf");
    assert!(pdfs[0]["upload_date"].is_string());

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws/qa/", server.addr))
        .await
        .unwrap();

    let reply = ask(
        &mut ws,
        &serde_json::json!({"pdf_id": "invalid_id", "question": "What color is the sky?"}),
    )
    .await;
    assert_eq!(reply, serde_json::json!({"error": "Document not found."}));

    // The echoing model returns the prompt, which carries the retrieved context.
    let reply = ask(
        &mut ws,
        &serde_json::json!({"pdf_id": id, "question": "What color is the sky?"}),
    )
    .await;
    let answer = reply["answer"].as_str().unwrap();
    assert!(answer.contains("blue"), "answer was: {answer}");
    assert!(answer.contains("Question: What color is the sky?"));

    ws.close(None).await.unwrap();
    server.stop().await;
}

#[tokio::test]
async fn empty_database_and_health() {
    let server = TestServer::start(MockProvider::default(), 0).await;
    let client = reqwest::Client::new();

    let health = client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(health.status(), StatusCode::OK);
    let body: serde_json::Value = health.json().await.unwrap();
    assert_eq!(body, serde_json::json!({"status": "ok"}));

    let listing: serde_json::Value = client
        .get(server.url("/get_all_pdfs/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(
        listing,
        serde_json::json!({"message": "No PDFs found in the database."})
    );

    server.stop().await;
}

#[tokio::test]
async fn rejects_non_pdf_uploads() {
    let server = TestServer::start(MockProvider::default(), 0).await;
    let client = reqwest::Client::new();

    let resp = upload(&client, &server, b"plain text", "text/plain").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body, serde_json::json!({"detail": "File must be a PDF"}));

    let resp = upload(&client, &server, b"not a pdf at all", "application/pdf").await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        serde_json::json!({"detail": "Failed to extract text from PDF"})
    );

    let listing: serde_json::Value = client
        .get(server.url("/get_all_pdfs/"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(listing.get("pdfs").is_none());

    server.stop().await;
}

#[tokio::test]
async fn sixth_request_in_window_is_rate_limited() {
    let server = TestServer::start(MockProvider::default(), 5).await;
    let client = reqwest::Client::new();

    for _ in 0..5 {
        let resp = client.get(server.url("/health")).send().await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    let resp = client.get(server.url("/get_all_pdfs/")).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(
        body,
        serde_json::json!({"detail": "Rate limit exceeded. Try again later."})
    );

    server.stop().await;
}
