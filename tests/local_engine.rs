//! End-to-end tests against the local engine on an ephemeral port.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use worker_server::config::{ServerConfig, ServerType};
use worker_server::event::Event;
use worker_server::lifecycle::MASTER_PID_ENV;
use worker_server::response::Cookie;
use worker_server::{LocalEngine, RequestContext};

mod common;

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

fn http_config(worker_num: usize, task_worker_num: i64) -> ServerConfig {
    common::config(ServerType::Http, worker_num, task_worker_num)
}

#[tokio::test]
async fn http_request_reaches_the_application() {
    let engine = LocalEngine::new(http_config(2, 0), |ctx: &mut RequestContext| {
        let name = ctx.request().get("name").unwrap_or("nobody").to_string();
        let visits = ctx.request().cookie("visits").unwrap_or("0").to_string();
        ctx.response()
            .set_header("X-Visits", visits)
            .set_cookie("seen", Cookie::new("yes"))
            .set_status(202);
        format!("hi {name} on {}", ctx.request().path().unwrap_or("?"))
    })
    .unwrap();
    let running = engine.start().await.unwrap();
    let base = format!("http://{}", running.local_addr());
    assert_eq!(
        std::env::var(MASTER_PID_ENV).ok(),
        Some(std::process::id().to_string())
    );

    let res = client()
        .get(format!("{base}/greet?name=ada"))
        .header("Cookie", "visits=3")
        .send()
        .await
        .expect("server unreachable");

    assert_eq!(res.status(), 202);
    assert_eq!(res.headers()["x-visits"], "3");
    assert_eq!(res.headers()["set-cookie"], "seen=yes; Path=/");
    assert_eq!(res.text().await.unwrap(), "hi ada on /greet");

    running.stop().await.unwrap();
}

#[tokio::test]
async fn form_body_is_decoded_into_post_params() {
    let engine = LocalEngine::new(http_config(1, 0), |ctx: &mut RequestContext| {
        ctx.request().post("title").unwrap_or("missing").to_string()
    })
    .unwrap();
    let running = engine.start().await.unwrap();

    let res = client()
        .post(format!("http://{}/notes", running.local_addr()))
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body("title=first+note")
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "first note");

    running.stop().await.unwrap();
}

#[tokio::test]
async fn favicon_gets_an_empty_answer() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let engine = LocalEngine::new(http_config(1, 0), move |_: &mut RequestContext| {
        counter.fetch_add(1, Ordering::SeqCst);
        "page"
    })
    .unwrap();
    let running = engine.start().await.unwrap();

    let res = client()
        .get(format!("http://{}/favicon.ico", running.local_addr()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert!(res.text().await.unwrap().is_empty());
    assert_eq!(calls.load(Ordering::SeqCst), 0);

    running.stop().await.unwrap();
}

#[tokio::test]
async fn async_mode_answers_first_and_runs_on_a_task_worker() {
    let ran = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicUsize::new(0));

    let mut config = http_config(1, 1);
    config.async_mode = true;
    let counter = Arc::clone(&ran);
    let finish_counter = Arc::clone(&finished);
    let engine = LocalEngine::new(config, move |_: &mut RequestContext| {
        counter.fetch_add(1, Ordering::SeqCst);
        "ignored"
    })
    .unwrap()
    .setup(move |server| {
        let finish_counter = Arc::clone(&finish_counter);
        server.on(Event::Finish, move |_| {
            finish_counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
    });
    let running = engine.start().await.unwrap();

    let res = client()
        .get(format!("http://{}/report", running.local_addr()))
        .send()
        .await
        .unwrap();
    assert_eq!(res.text().await.unwrap(), "success");

    let done = common::eventually(Duration::from_secs(5), || {
        ran.load(Ordering::SeqCst) == 1 && finished.load(Ordering::SeqCst) == 1
    })
    .await;
    assert!(done, "task never ran or never finished");

    running.stop().await.unwrap();
}

#[tokio::test]
async fn panicking_app_answers_bad_gateway_and_worker_recovers() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let engine = LocalEngine::new(http_config(1, 0), move |ctx: &mut RequestContext| {
        counter.fetch_add(1, Ordering::SeqCst);
        if ctx.request().path() == Some("/boom") {
            panic!("application failure");
        }
        "fine"
    })
    .unwrap();
    let running = engine.start().await.unwrap();
    let base = format!("http://{}", running.local_addr());
    let client = client();

    let res = client.get(format!("{base}/boom")).send().await.unwrap();
    assert_eq!(res.status(), 502);

    let res = client.get(format!("{base}/ok")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "fine");
    assert_eq!(calls.load(Ordering::SeqCst), 2);

    running.stop().await.unwrap();
}

#[tokio::test]
async fn socket_round_trip() {
    let connects = Arc::new(AtomicUsize::new(0));
    let closes = Arc::new(AtomicUsize::new(0));

    let config = common::config(ServerType::Socket, 2, 0);
    let (on_connect, on_close) = (Arc::clone(&connects), Arc::clone(&closes));
    let engine = LocalEngine::new(config, |ctx: &mut RequestContext| {
        let input = ctx.request().input_str().unwrap_or_default().trim().to_uppercase();
        format!("{input}\n")
    })
    .unwrap()
    .setup(move |server| {
        let on_connect = Arc::clone(&on_connect);
        server.on(Event::Connect, move |_| {
            on_connect.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
        let on_close = Arc::clone(&on_close);
        server.on(Event::Close, move |_| {
            on_close.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });
    });
    let running = engine.start().await.unwrap();

    let mut stream = TcpStream::connect(running.local_addr()).await.unwrap();
    stream.write_all(b"ping\n").await.unwrap();

    let mut buf = [0u8; 64];
    let n = tokio::time::timeout(Duration::from_secs(5), stream.read(&mut buf))
        .await
        .expect("no reply")
        .unwrap();
    assert_eq!(&buf[..n], b"PING\n");

    drop(stream);
    let closed = common::eventually(Duration::from_secs(5), || {
        connects.load(Ordering::SeqCst) == 1 && closes.load(Ordering::SeqCst) == 1
    })
    .await;
    assert!(closed, "connect/close events missing");

    running.stop().await.unwrap();
}

#[tokio::test]
async fn stopped_server_refuses_connections() {
    let engine = LocalEngine::new(http_config(1, 0), |_: &mut RequestContext| "up").unwrap();
    let running = engine.start().await.unwrap();
    let addr = running.local_addr();

    running.stop().await.unwrap();

    assert!(TcpStream::connect(addr).await.is_err());
}
