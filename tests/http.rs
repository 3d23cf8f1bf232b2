use once_cell::sync::Lazy;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::net::TcpListener;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time::sleep;

#[derive(Debug, Deserialize, PartialEq, Eq)]
struct Counts {
    total: usize,
    completed: usize,
    pending: usize,
}

#[derive(Debug, Deserialize)]
struct TaskView {
    id: String,
    text: String,
    completed: bool,
}

#[derive(Debug, Deserialize)]
struct Change {
    changed: bool,
    task: Option<TaskView>,
    row_html: Option<String>,
    removed_id: Option<String>,
    counts: Counts,
    warning: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TaskList {
    tasks: Vec<TaskView>,
    counts: Counts,
}

struct TestServer {
    base_url: String,
    child: Child,
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

static TEST_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));
static SERVER: Lazy<Mutex<Option<Arc<TestServer>>>> = Lazy::new(|| Mutex::new(None));

#[cfg(unix)]
mod cleanup {
    use std::sync::atomic::{AtomicI32, Ordering};
    use std::sync::Once;

    static REGISTER: Once = Once::new();
    static PID: AtomicI32 = AtomicI32::new(0);

    pub fn register(pid: u32) {
        REGISTER.call_once(|| {
            PID.store(pid as i32, Ordering::SeqCst);
            unsafe {
                libc::atexit(on_exit);
            }
        });
    }

    extern "C" fn on_exit() {
        let pid = PID.load(Ordering::SeqCst);
        if pid > 0 {
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }
    }
}

fn pick_free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind random port");
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

fn unique_data_path(label: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!("task_widget_http_{label}_{}_{}.json", std::process::id(), nanos));
    path
}

async fn wait_until_ready(base_url: &str) {
    let client = Client::new();
    let deadline = Instant::now() + Duration::from_secs(3);
    loop {
        if let Ok(resp) = client.get(format!("{base_url}/api/counts")).send().await {
            if resp.status().is_success() {
                return;
            }
        }
        if Instant::now() > deadline {
            panic!("server did not become ready");
        }
        sleep(Duration::from_millis(100)).await;
    }
}

async fn spawn_server(data_path: &PathBuf) -> TestServer {
    let port = pick_free_port();
    let child = Command::new(env!("CARGO_BIN_EXE_task_widget"))
        .env("PORT", port.to_string())
        .env("APP_DATA_PATH", data_path)
        .env("WEATHER_API_URL", "http://127.0.0.1:9")
        .env("RUST_LOG", "info")
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .spawn()
        .expect("failed to spawn server");

    #[cfg(unix)]
    cleanup::register(child.id());

    let base_url = format!("http://127.0.0.1:{port}");
    wait_until_ready(&base_url).await;

    TestServer { base_url, child }
}

async fn shared_server() -> Arc<TestServer> {
    let mut guard = SERVER.lock().await;
    if let Some(server) = guard.as_ref() {
        return Arc::clone(server);
    }
    let server = Arc::new(spawn_server(&unique_data_path("shared")).await);
    *guard = Some(Arc::clone(&server));
    server
}

async fn add(client: &Client, base_url: &str, text: &str) -> Change {
    client
        .post(format!("{base_url}/api/tasks"))
        .json(&json!({ "text": text }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn clear(client: &Client, base_url: &str) -> Change {
    client
        .delete(format!("{base_url}/api/tasks"))
        .json(&json!({ "confirmed": true }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

async fn list(client: &Client, base_url: &str) -> TaskList {
    client
        .get(format!("{base_url}/api/tasks"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn http_task_lifecycle_updates_counts() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let base = server.base_url.as_str();
    let client = Client::new();
    clear(&client, base).await;

    let added = add(&client, base, "  Buy milk  ").await;
    let task = added.task.expect("added task");
    assert_eq!(task.text, "Buy milk");
    assert!(!task.completed);
    assert!(added.row_html.unwrap().contains(&format!(r#"id="task-{}""#, task.id)));
    assert_eq!(added.counts, Counts { total: 1, completed: 0, pending: 1 });
    assert!(added.warning.is_none());

    let toggled: Change = client
        .post(format!("{base}/api/tasks/{}/toggle", task.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(toggled.task.unwrap().completed);
    assert_eq!(toggled.counts, Counts { total: 1, completed: 1, pending: 0 });

    let edited: Change = client
        .patch(format!("{base}/api/tasks/{}", task.id))
        .json(&json!({ "text": "   " }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!edited.changed);
    assert_eq!(edited.task.unwrap().text, "Buy milk");

    let edited: Change = client
        .patch(format!("{base}/api/tasks/{}", task.id))
        .json(&json!({ "text": "Buy oat milk" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(edited.changed);
    assert_eq!(edited.task.unwrap().text, "Buy oat milk");

    let removed: Change = client
        .delete(format!("{base}/api/tasks/{}", task.id))
        .json(&json!({ "confirmed": true }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(removed.removed_id, Some(task.id));
    assert_eq!(removed.counts, Counts { total: 0, completed: 0, pending: 0 });
    assert!(list(&client, base).await.tasks.is_empty());
}

#[tokio::test]
async fn http_empty_text_is_rejected() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let client = Client::new();

    let before = list(&client, &server.base_url).await;
    let response = client
        .post(format!("{}/api/tasks", server.base_url))
        .json(&json!({ "text": " \t " }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.text().await.unwrap(), "Añade una tarea, por favor");

    let after = list(&client, &server.base_url).await;
    assert_eq!(after.counts, before.counts);
}

#[tokio::test]
async fn http_unconfirmed_delete_and_stale_ids_change_nothing() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let base = server.base_url.as_str();
    let client = Client::new();
    clear(&client, base).await;
    let id = add(&client, base, "keep me").await.task.unwrap().id;

    let declined: Change = client
        .delete(format!("{base}/api/tasks/{id}"))
        .json(&json!({ "confirmed": false }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!declined.changed);

    let no_body: Change = client
        .delete(format!("{base}/api/tasks"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!no_body.changed);
    assert_eq!(no_body.counts.total, 1);

    let stale: Change = client
        .post(format!("{base}/api/tasks/1-999999/toggle"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!stale.changed);
    assert!(stale.task.is_none());
    assert_eq!(stale.counts, Counts { total: 1, completed: 0, pending: 1 });

    let malformed = client
        .post(format!("{base}/api/tasks/not-an-id/toggle"))
        .send()
        .await
        .unwrap();
    assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
    assert_eq!(list(&client, base).await.counts.total, 1);
}

#[tokio::test]
async fn http_clear_resets_counts() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let base = server.base_url.as_str();
    let client = Client::new();

    add(&client, base, "one").await;
    add(&client, base, "two").await;
    let cleared = clear(&client, base).await;
    assert!(cleared.changed);
    assert_eq!(cleared.counts, Counts { total: 0, completed: 0, pending: 0 });

    let counts: Counts = client
        .get(format!("{base}/api/counts"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(counts.total, 0);
}

#[tokio::test]
async fn http_index_renders_rows_and_counters() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let base = server.base_url.as_str();
    let client = Client::new();
    clear(&client, base).await;
    let id = add(&client, base, "<script>x</script>").await.task.unwrap().id;

    let html = client.get(format!("{base}/")).send().await.unwrap().text().await.unwrap();
    assert!(html.contains(&format!(r#"<li id="task-{id}""#)));
    assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
    assert!(html.contains(r#"<span id="total-tasks" class="value">1</span>"#));
}

#[tokio::test]
async fn http_weather_failure_is_reported_and_city_persists() {
    let _guard = TEST_LOCK.lock().await;
    let server = shared_server().await;
    let base = server.base_url.as_str();
    let client = Client::new();

    let weather = client.get(format!("{base}/api/weather")).send().await.unwrap();
    assert_eq!(weather.status(), StatusCode::BAD_GATEWAY);

    let blank = client
        .put(format!("{base}/api/weather/city"))
        .json(&json!({ "city": "  " }))
        .send()
        .await
        .unwrap();
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);

    let set: serde_json::Value = client
        .put(format!("{base}/api/weather/city"))
        .json(&json!({ "city": " Valencia " }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(set["city"], "Valencia");

    let html = client.get(format!("{base}/")).send().await.unwrap().text().await.unwrap();
    assert!(html.contains(">Valencia</span>"));
}

#[tokio::test]
async fn http_clock_reports_padded_time() {
    let server = shared_server().await;
    let clock: serde_json::Value = Client::new()
        .get(format!("{}/api/clock", server.base_url))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let time = clock["time"].as_str().unwrap();
    assert_eq!(time.len(), 8);
    assert_eq!(time.as_bytes()[2], b':');
    assert!(clock["date"].as_str().unwrap().contains(", "));
}

#[tokio::test]
async fn http_tasks_survive_restart_and_old_ids_are_inert() {
    let data_path = unique_data_path("restart");
    let client = Client::new();

    let second = {
        let server = spawn_server(&data_path).await;
        add(&client, &server.base_url, "first").await;
        let second = add(&client, &server.base_url, "second").await.task.unwrap();
        client
            .post(format!("{}/api/tasks/{}/toggle", server.base_url, second.id))
            .send()
            .await
            .unwrap();
        second
    };

    let server = spawn_server(&data_path).await;
    let restored = list(&client, &server.base_url).await;
    let texts: Vec<_> = restored.tasks.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, vec!["first", "second"]);
    assert!(!restored.tasks[0].completed);
    assert!(restored.tasks[1].completed);
    assert_eq!(restored.counts, Counts { total: 2, completed: 1, pending: 1 });
    assert!(restored.tasks.iter().all(|t| t.id != second.id));

    let stale: Change = client
        .post(format!("{}/api/tasks/{}/toggle", server.base_url, second.id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(!stale.changed);
    assert!(stale.row_html.is_none());
    assert_eq!(stale.counts, Counts { total: 2, completed: 1, pending: 1 });
    drop(server);
    let _ = std::fs::remove_file(&data_path);
}

#[tokio::test]
async fn http_malformed_store_starts_empty() {
    let data_path = unique_data_path("malformed");
    std::fs::write(&data_path, r#"{"tasks": "[{not json", "weatherCity": "Quito"}"#).unwrap();

    let server = spawn_server(&data_path).await;
    let client = Client::new();
    let restored = list(&client, &server.base_url).await;
    assert!(restored.tasks.is_empty());
    assert_eq!(restored.counts, Counts { total: 0, completed: 0, pending: 0 });

    let added = add(&client, &server.base_url, "fresh start").await;
    assert_eq!(added.counts.total, 1);
    drop(server);
    let _ = std::fs::remove_file(&data_path);
}
