//! Integration tests for the askstream client.
//! These tests run the real HTTP client against a throw-away local server.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use futures::StreamExt;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    use askstream::chat::{ChatConfig, ChatSession};
    use askstream::{
        AskOutcome, AskRequest, ChatBackend, Client, ContextMode, HistorySummary,
        MemorySessionStore, NullRenderer, RenameRequest, Thread, Tier,
    };

    /// A request as the server saw it.
    #[derive(Debug)]
    struct Captured {
        method: String,
        path: String,
        headers: Vec<(String, String)>,
        body: String,
    }

    impl Captured {
        fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }
    }

    /// A canned response: status line, extra headers, and body pieces that
    /// are written with a pause in between.
    struct Canned {
        status: &'static str,
        content_type: &'static str,
        pieces: Vec<Vec<u8>>,
    }

    impl Canned {
        fn json(status: &'static str, body: &str) -> Self {
            Self {
                status,
                content_type: "application/json",
                pieces: vec![body.as_bytes().to_vec()],
            }
        }

        fn stream(pieces: &[&[u8]]) -> Self {
            Self {
                status: "200 OK",
                content_type: "text/event-stream",
                pieces: pieces.iter().map(|p| p.to_vec()).collect(),
            }
        }
    }

    /// Serves one canned response per connection, in order, and returns
    /// what it received.
    async fn serve(responses: Vec<Canned>) -> (String, JoinHandle<Vec<Captured>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}/api/v1/", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let mut captured = Vec::new();
            for canned in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                captured.push(read_request(&mut socket).await);

                let head = format!(
                    "HTTP/1.1 {}\r\nContent-Type: {}\r\nConnection: close\r\n\r\n",
                    canned.status, canned.content_type
                );
                socket.write_all(head.as_bytes()).await.unwrap();
                for piece in canned.pieces {
                    socket.write_all(&piece).await.unwrap();
                    socket.flush().await.unwrap();
                    tokio::time::sleep(Duration::from_millis(10)).await;
                }
                socket.shutdown().await.unwrap();
            }
            captured
        });
        (base_url, handle)
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> Captured {
        let mut raw = Vec::new();
        let mut buf = [0u8; 1024];
        let header_end = loop {
            let n = socket.read(&mut buf).await.unwrap();
            assert!(n > 0, "client closed before sending a request");
            raw.extend_from_slice(&buf[..n]);
            if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8(raw[..header_end].to_vec()).unwrap();
        let mut lines = head.split("\r\n");
        let mut request_line = lines.next().unwrap().split(' ');
        let method = request_line.next().unwrap().to_string();
        let path = request_line.next().unwrap().to_string();
        let headers: Vec<(String, String)> = lines
            .filter_map(|line| line.split_once(": "))
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();

        let content_length = headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
            .map(|(_, v)| v.parse::<usize>().unwrap())
            .unwrap_or(0);
        let mut body = raw[header_end..].to_vec();
        while body.len() < content_length {
            let n = socket.read(&mut buf).await.unwrap();
            body.extend_from_slice(&buf[..n]);
        }

        Captured {
            method,
            path,
            headers,
            body: String::from_utf8(body).unwrap(),
        }
    }

    fn client(base_url: &str) -> Client {
        Client::with_options(Some(base_url.to_string()), Some(Duration::from_secs(5))).unwrap()
    }

    fn ask_request(question: &str) -> AskRequest {
        AskRequest::build(
            &Thread::new(),
            question,
            "chat_1",
            Tier::Free,
            ContextMode::WithHistory,
        )
    }

    #[tokio::test]
    async fn ask_streams_fragmented_records() {
        let (base_url, server) = serve(vec![Canned::stream(&[
            b": keep-alive\n",
            b"data: {\"content\":\"Hel",
            b"lo\"}\n",
            b"data: {\"content\":\", w\xc3",
            b"\xb6rld\"}\r\ndata: not json\n",
            b"data: {\"content\":\"!\"}",
        ])])
        .await;

        let client = client(&base_url);
        let deltas: Vec<String> = client
            .ask(Some("tok"), &ask_request("Say hello"))
            .await
            .unwrap()
            .map(|delta| delta.unwrap())
            .collect()
            .await;
        assert_eq!(deltas, vec!["Hello", ", w\u{f6}rld", "!"]);

        let captured = server.await.unwrap();
        let request = &captured[0];
        assert_eq!(request.method, "POST");
        assert_eq!(request.path, "/api/v1/ask");
        assert_eq!(request.header("authorization"), Some("Bearer tok"));
        let body: serde_json::Value = serde_json::from_str(&request.body).unwrap();
        assert_eq!(body["question"], "Say hello");
        assert_eq!(body["chatId"], "chat_1");
        assert_eq!(body["tier"], "free");
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[tokio::test]
    async fn guest_ask_sends_no_authorization() {
        let (base_url, server) =
            serve(vec![Canned::stream(&[b"data: {\"content\":\"ok\"}\n"])]).await;
        let stream = client(&base_url)
            .ask(None, &ask_request("hi"))
            .await
            .unwrap();
        assert_eq!(stream.count().await, 1);

        let captured = server.await.unwrap();
        assert_eq!(captured[0].header("authorization"), None);
    }

    #[tokio::test]
    async fn history_and_thread_round_trip() {
        let (base_url, server) = serve(vec![
            Canned::json(
                "200 OK",
                r#"[{"chatId":"c1","displayQuestion":"First"},{"displayQuestion":"Loose"}]"#,
            ),
            Canned::json(
                "200 OK",
                r#"[{"question":"q","answer":"a","chatId":"c 1"}]"#,
            ),
        ])
        .await;
        let client = client(&base_url);

        let summaries = client.history("tok").await.unwrap();
        assert_eq!(
            summaries,
            vec![
                HistorySummary::new("c1", "First"),
                HistorySummary::untracked("Loose")
            ]
        );
        let messages = client.thread("tok", "c 1").await.unwrap();
        assert_eq!(messages[0].answer, "a");

        let captured = server.await.unwrap();
        assert_eq!(captured[0].path, "/api/v1/history");
        assert_eq!(captured[1].path, "/api/v1/history/c%201");
        assert!(captured.iter().all(|c| c.method == "GET"));
    }

    #[tokio::test]
    async fn mutations_use_expected_verbs() {
        let (base_url, server) = serve(vec![
            Canned::json("200 OK", "{}"),
            Canned::json("200 OK", "{}"),
            Canned::json("200 OK", "{}"),
        ])
        .await;
        let client = client(&base_url);

        let rename = RenameRequest {
            chat_id: "c1".to_string(),
            new_title: "Renamed".to_string(),
        };
        client.rename_thread("tok", &rename).await.unwrap();
        client.delete_thread("tok", "c1").await.unwrap();
        client.clear_history("tok").await.unwrap();

        let captured = server.await.unwrap();
        let calls: Vec<(&str, &str)> = captured
            .iter()
            .map(|c| (c.method.as_str(), c.path.as_str()))
            .collect();
        assert_eq!(
            calls,
            vec![
                ("PUT", "/api/v1/history/rename"),
                ("DELETE", "/api/v1/history/c1"),
                ("DELETE", "/api/v1/history"),
            ]
        );
        let body: serde_json::Value = serde_json::from_str(&captured[0].body).unwrap();
        assert_eq!(body["chatId"], "c1");
        assert_eq!(body["newTitle"], "Renamed");
    }

    #[tokio::test]
    async fn error_statuses_map_to_variants() {
        let (base_url, server) = serve(vec![
            Canned::json("401 Unauthorized", r#"{"message":"bad token"}"#),
            Canned::json("404 Not Found", r#"{"detail":"no such chat"}"#),
            Canned::json("503 Service Unavailable", ""),
        ])
        .await;
        let client = client(&base_url);

        let err = client.history("tok").await.unwrap_err();
        assert!(err.is_authentication());
        assert!(err.to_string().contains("bad token"));

        let err = client.thread("tok", "gone").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.status_code(), Some(404));

        let err = client
            .ask(Some("tok"), &ask_request("q"))
            .await
            .err()
            .unwrap();
        assert!(err.is_server_error());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn connection_refused_is_a_connection_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client(&format!("http://{addr}/"));
        let err = client.history("tok").await.unwrap_err();
        assert!(err.is_connection());
    }

    #[tokio::test]
    async fn session_asks_over_http() {
        let (base_url, server) = serve(vec![Canned::stream(&[
            b"data: {\"content\":\"4\"}\n",
        ])])
        .await;
        let backend = Arc::new(client(&base_url));
        let store = Arc::new(MemorySessionStore::new());
        let mut session = ChatSession::open(store, backend, &ChatConfig::default())
            .await
            .unwrap();

        let outcome = session
            .ask("What is 2+2?", &mut NullRenderer)
            .await
            .unwrap();
        assert_eq!(outcome, AskOutcome::Settled);
        assert_eq!(session.thread().last().unwrap().answer, "4");
        assert!(session.chat_id().unwrap().starts_with("chat_"));
        server.await.unwrap();
    }
}
