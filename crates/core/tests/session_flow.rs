//! End-to-end session scenarios against a scripted HTTP responder.

use std::{sync::Arc, time::Duration};

use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::TcpListener,
};
use vidosik_core::{
    APOLOGY, Analysis, AnswerMode, ApiClient, AskTransport, Clipboard, Role, Session,
    SessionError, Tab, VideoAnalysis,
};

struct NullClipboard;

impl Clipboard for NullClipboard {
    fn set_contents(&mut self, _text: String) -> anyhow::Result<()> {
        Ok(())
    }
}

/// Serve every incoming request with the same JSON body.
async fn spawn_responder(body: serde_json::Value) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let body = body.to_string();
            tokio::spawn(async move {
                read_request(&mut stream).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });

    format!("http://{addr}")
}

/// Drain headers plus a content-length body; enough HTTP for one request.
async fn read_request(stream: &mut tokio::net::TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let Ok(n) = stream.read(&mut chunk).await else {
            return;
        };
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(header_end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let headers = String::from_utf8_lossy(&buf[..header_end]).to_lowercase();
        let content_length = headers
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= header_end + 4 + content_length {
            return;
        }
    }
}

fn client(base_url: &str) -> ApiClient {
    ApiClient::new(base_url, Duration::from_secs(5)).unwrap()
}

fn canned_result() -> VideoAnalysis {
    VideoAnalysis {
        video_id: "abc".into(),
        analysis: Analysis {
            transcript: Some("T".into()),
            summary: Some("S".into()),
            key_points: vec!["k1".into(), "k2".into()],
        },
    }
}

#[tokio::test]
async fn analyzed_video_renders_summary_then_key_points() {
    let base = spawn_responder(serde_json::json!({
        "status": "success",
        "video_id": "abc",
        "analysis": {
            "transcript": "T",
            "summary": "S",
            "key_points": ["k1", "k2"],
        },
    }))
    .await;

    let api = client(&base);
    let result = api.analyze("https://youtu.be/abc").await.unwrap();
    assert_eq!(result.video_id, "abc");

    let mut session = Session::start(result, Arc::new(api), Box::new(NullClipboard));
    assert_eq!(session.active_tab(), Tab::Summary);
    assert_eq!(session.summary_text(), "S");

    session.set_active_tab(Tab::KeyPoints);
    assert_eq!(session.active_tab(), Tab::KeyPoints);
    assert_eq!(
        session.key_points().to_vec(),
        vec!["k1".to_string(), "k2".to_string()]
    );
}

#[tokio::test]
async fn analyze_without_analysis_payload_is_a_hard_failure() {
    let base = spawn_responder(serde_json::json!({
        "status": "success",
        "video_id": "abc",
    }))
    .await;

    let err = client(&base)
        .analyze("https://youtu.be/abc")
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::MissingAnalysis));
}

#[tokio::test]
async fn beyond_answer_arrives_as_two_tagged_entries() {
    let base = spawn_responder(serde_json::json!({
        "status": "success",
        "data": {
            "type": "beyond",
            "transcript_answer": "A",
            "general_answer": "B",
        },
    }))
    .await;

    let mut session = Session::start(
        canned_result(),
        Arc::new(client(&base)),
        Box::new(NullClipboard),
    );
    session.submit_question("What is this about?").await;

    let log = session.conversation();
    assert_eq!(log.len(), 4);
    assert_eq!(log[2].text, "A");
    assert_eq!(log[2].mode, Some(AnswerMode::Transcript));
    assert_eq!(log[3].text, "B");
    assert_eq!(log[3].mode, Some(AnswerMode::Beyond));
    assert_eq!(log[2].created_at, log[3].created_at);
}

#[tokio::test]
async fn single_answer_keeps_its_declared_kind() {
    let base = spawn_responder(serde_json::json!({
        "status": "success",
        "data": { "type": "buddy", "answer": "hello there" },
    }))
    .await;

    let api = client(&base);
    let outcome = api
        .ask("abc", "hey buddy", AnswerMode::Buddy)
        .await
        .unwrap();
    assert_eq!(
        outcome,
        vidosik_core::AskOutcome::Single {
            mode: AnswerMode::Buddy,
            answer: "hello there".into(),
        }
    );
}

#[tokio::test]
async fn transport_failure_appends_exactly_one_apology() {
    // Bind a port, then free it so the request is refused.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let mut session = Session::start(
        canned_result(),
        Arc::new(client(&base)),
        Box::new(NullClipboard),
    );
    let before = session.conversation().len();

    session.submit_question("anyone there?").await;

    let log = session.conversation();
    assert_eq!(log.len(), before + 2);
    assert_eq!(log[log.len() - 2].role, Role::User);
    let last = log.last().unwrap();
    assert_eq!(last.role, Role::Assistant);
    assert_eq!(last.text, APOLOGY);
    assert!(last.mode.is_none());
}
