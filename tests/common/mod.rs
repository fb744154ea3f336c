//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chain_dispatch::config::ServerConfig;
use chain_dispatch::{Dispatcher, HttpServer, Module, Shutdown};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Names of handlers in the order their bodies ran.
pub type Calls = Arc<Mutex<Vec<String>>>;

pub fn calls() -> Calls {
    Arc::new(Mutex::new(Vec::new()))
}

pub fn recorded(calls: &Calls) -> Vec<String> {
    calls.lock().unwrap().clone()
}

/// A module with one GET route that records its call and returns `result`.
pub fn recording_module(name: &'static str, pattern: &str, result: bool, calls: &Calls) -> Module {
    let calls = calls.clone();
    Module::new(name).on_get(pattern, move |ctx, _cancel| {
        let calls = calls.clone();
        Box::pin(async move {
            calls.lock().unwrap().push(name.to_string());
            if result {
                ctx.response_mut().string_response(name);
            }
            Ok(result)
        })
    })
}

/// A dispatcher server running on an ephemeral port.
pub struct TestServer {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

impl TestServer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the server task to finish.
    pub async fn stop(self) {
        self.shutdown.trigger();
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("server did not stop")
            .expect("server task panicked")
            .expect("server returned an error");
    }
}

pub async fn spawn_server(dispatcher: Dispatcher) -> TestServer {
    spawn_server_with(dispatcher, ServerConfig::default()).await
}

pub async fn spawn_server_with(dispatcher: Dispatcher, mut config: ServerConfig) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    config.listener.bind_address = addr.to_string();

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, Arc::new(dispatcher), shutdown.clone());
    let handle = tokio::spawn(server.run(listener));

    TestServer {
        addr,
        shutdown,
        handle,
    }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
