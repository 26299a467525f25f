//! Integration tests for the WebSocket transport: a real server and
//! client exchanging frames over loopback.

#[cfg(feature = "websocket")]
mod websocket {
    use broadside_transport::{Connection, Transport, WebSocketTransport};
    use futures_util::{SinkExt, StreamExt};
    use tokio_tungstenite::tungstenite::Message;

    type ClientWs = tokio_tungstenite::WebSocketStream<
        tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
    >;

    /// Binds a transport on an ephemeral port and returns it with the
    /// resolved address.
    async fn bind() -> (WebSocketTransport, String) {
        let transport = WebSocketTransport::bind("127.0.0.1:0")
            .await
            .expect("should bind");
        let addr = transport.local_addr().expect("local addr").to_string();
        (transport, addr)
    }

    async fn connect_client(addr: &str, path: &str) -> ClientWs {
        let url = format!("ws://{addr}{path}");
        let (ws, _) = tokio_tungstenite::connect_async(&url)
            .await
            .expect("client should connect");
        ws
    }

    #[tokio::test]
    async fn test_accept_and_exchange_text_frames() {
        let (mut transport, addr) = bind().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client = connect_client(&addr, "/ws/alice").await;
        let conn = server_handle.await.expect("task should complete");

        assert!(conn.id().into_inner() > 0);

        // Server → client.
        conn.send("hello from server").await.expect("send");
        let msg = client.next().await.unwrap().unwrap();
        assert_eq!(msg.into_text().unwrap().as_str(), "hello from server");

        // Client → server.
        client
            .send(Message::Text("hello from client".into()))
            .await
            .unwrap();
        let received = conn.recv().await.expect("recv");
        assert_eq!(received.as_deref(), Some("hello from client"));
    }

    #[tokio::test]
    async fn test_connection_exposes_upgrade_path() {
        let (mut transport, addr) = bind().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let _client = connect_client(&addr, "/ws/secret-token-42").await;
        let conn = server_handle.await.expect("task should complete");

        assert_eq!(conn.path(), "/ws/secret-token-42");
    }

    #[tokio::test]
    async fn test_recv_returns_none_on_clean_close() {
        let (mut transport, addr) = bind().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client = connect_client(&addr, "/ws/alice").await;
        let conn = server_handle.await.expect("task should complete");

        client.close(None).await.unwrap();
        let received = conn.recv().await.expect("recv");
        assert_eq!(received, None);
    }

    #[tokio::test]
    async fn test_binary_frame_is_tolerated_as_text() {
        let (mut transport, addr) = bind().await;

        let server_handle = tokio::spawn(async move {
            transport.accept().await.expect("should accept")
        });

        let mut client = connect_client(&addr, "/ws/alice").await;
        let conn = server_handle.await.expect("task should complete");

        client
            .send(Message::Binary(b"{\"type\":\"create_room\"}".to_vec().into()))
            .await
            .unwrap();
        let received = conn.recv().await.expect("recv");
        assert_eq!(received.as_deref(), Some("{\"type\":\"create_room\"}"));
    }

    #[tokio::test]
    async fn test_distinct_connections_get_distinct_ids() {
        let (mut transport, addr) = bind().await;

        let server_handle = tokio::spawn(async move {
            let a = transport.accept().await.expect("accept a");
            let b = transport.accept().await.expect("accept b");
            (a, b)
        });

        let _c1 = connect_client(&addr, "/ws/alice").await;
        let _c2 = connect_client(&addr, "/ws/bob").await;
        let (a, b) = server_handle.await.expect("task should complete");

        assert_ne!(a.id(), b.id());
    }
}
