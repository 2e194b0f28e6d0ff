//! Todo List Example
//!
//! Fetches a todo list through a classified `PendingCall`, delivering the
//! outcome on a queue drained by the main thread, the way a UI loop would.
//!
//! Set `TODO_BASE_URL` to target another server and `RUST_LOG=triage=debug`
//! to see the exchanges.

// Example-specific lint allowances
#![allow(missing_docs)]
#![allow(clippy::print_stdout)]
#![allow(clippy::print_stderr)]

use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;
use triage::TaskQueue;
use triage::prelude::*;

const DEFAULT_BASE_URL: &str = "https://jsonplaceholder.typicode.com/";

// ============================================================================
// Data Types
// ============================================================================

/// One todo entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToDoItem {
    pub user_id: u64,
    pub id: u64,
    pub title: String,
    pub completed: bool,
}

// ============================================================================
// Service
// ============================================================================

/// Todo endpoints.
#[service]
pub trait TodoService {
    /// Every todo.
    #[get("todos")]
    fn todo_list(&self) -> PendingCall<Vec<ToDoItem>>;

    /// One todo.
    #[get("todos/{id}")]
    fn todo(&self, id: u64) -> PendingCall<ToDoItem>;
}

pub fn todo_service(base_url: &str, executor: QueueExecutor) -> Result<TodoServiceClient> {
    ServiceClient::builder()
        .base_url(base_url)
        .config(ClientConfig::builder().timeout(Duration::from_secs(15)).build())
        .with_logging()
        .callback_executor(executor)
        .add_call_adapter_factory(ClassifyingAdapterFactory)
        .build()?
        .create()
}

// ============================================================================
// Rendering
// ============================================================================

/// What the screen shows after a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    List(Vec<String>),
    SignIn,
    Message(String),
}

/// Renders the todo list outcome.
pub struct ListView {
    screen: tokio::sync::oneshot::Sender<Screen>,
}

impl ListView {
    fn show(self, screen: Screen) {
        let _ = self.screen.send(screen);
    }
}

impl Callback<Vec<ToDoItem>> for ListView {
    fn success(self, response: Response<Vec<ToDoItem>>) {
        let lines = response
            .into_body()
            .unwrap_or_default()
            .into_iter()
            .map(|item| {
                let mark = if item.completed { 'x' } else { ' ' };
                format!("[{mark}] {:>3} {}", item.id, item.title)
            })
            .collect();
        self.show(Screen::List(lines));
    }

    fn unauthenticated(self, _response: RawResponse) {
        self.show(Screen::SignIn);
    }

    fn client_error(self, response: RawResponse) {
        self.show(Screen::Message(format!(
            "request rejected (HTTP {})",
            response.status()
        )));
    }

    fn server_error(self, response: RawResponse) {
        self.show(Screen::Message(format!(
            "server unavailable (HTTP {}), try again later",
            response.status()
        )));
    }

    fn network_error(self, error: Error) {
        self.show(Screen::Message(format!("offline: {error}")));
    }

    fn unexpected_error(self, error: Error) {
        self.show(Screen::Message(format!("something went wrong: {error}")));
    }
}

/// Enqueue the list call and drain the queue until its outcome is shown.
pub async fn load_list(todos: &TodoServiceClient, queue: &mut TaskQueue) -> Result<Screen> {
    let (screen, shown) = tokio::sync::oneshot::channel();
    todos.todo_list().enqueue(ListView { screen })?;

    if !queue.run_next().await {
        return Err(Error::unexpected("completion queue closed"));
    }
    shown
        .await
        .map_err(|_| Error::unexpected("list view dropped without rendering"))
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let base_url = std::env::var("TODO_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
    info!(%base_url, "loading todos");

    let (executor, mut queue) = QueueExecutor::new();
    let todos = todo_service(&base_url, executor)?;

    match load_list(&todos, &mut queue).await? {
        Screen::List(lines) => {
            println!("{} todos", lines.len());
            for line in lines.iter().take(10) {
                println!("{line}");
            }
        }
        Screen::SignIn => println!("please sign in"),
        Screen::Message(message) => eprintln!("{message}"),
    }

    // Blocking style, from a thread allowed to block.
    let worker = todos.clone();
    let first = tokio::task::spawn_blocking(move || worker.todo(1).execute_blocking())
        .await
        .map_err(|err| Error::unexpected(err.to_string()))?;
    match first {
        Ok(response) => println!("first todo: {:?}", response.body()),
        Err(err) => eprintln!("first todo failed with {}: {err}", err.outcome()),
    }

    Ok(())
}

// ============================================================================
// Tests using wiremock
// ============================================================================
