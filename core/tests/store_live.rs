//! Store operations against the live mock server through `ReqwestTransport`.

use std::sync::Arc;

use chrono::{Duration, Utc};
use todo_core::{
    ClientConfig, CreateTodo, FormSubmission, Operation, Phase, ReqwestTransport, TodoClient, TodoFilter, TodoForm,
    TodoStatus, TodoStore,
};

async fn spawn_server() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(mock_server::run(listener));
    format!("http://{addr}/api")
}

async fn store() -> TodoStore<ReqwestTransport> {
    let config = ClientConfig::new(spawn_server().await);
    TodoStore::new(TodoClient::new(&config.base_url), ReqwestTransport::new())
}

fn create(title: &str) -> CreateTodo {
    CreateTodo {
        title: title.to_string(),
        description: None,
        due_date: None,
    }
}

#[tokio::test]
async fn create_then_fetch_keeps_server_order_and_front_insertion() {
    let store = store().await;

    store.create_todo(&create("first")).await.unwrap();
    store.create_todo(&create("second")).await.unwrap();

    // locally, the newest is at the front
    let titles: Vec<String> = store.read(|s| s.items().iter().map(|t| t.title.clone()).collect());
    assert_eq!(titles, vec!["second", "first"]);

    // the server lists in insertion order and fetch adopts it wholesale
    store.fetch_todos().await.unwrap();
    let titles: Vec<String> = store.read(|s| s.items().iter().map(|t| t.title.clone()).collect());
    assert_eq!(titles, vec!["first", "second"]);
}

#[tokio::test]
async fn form_edit_round_trip_clears_selection() {
    let store = store().await;
    let created = store.create_todo(&create("Draft")).await.unwrap();
    store.set_selected(Some(created.clone()));

    let mut form = TodoForm::from_initial(store.selected().as_ref());
    form.title = "Final".to_string();
    form.description = "ready to ship".to_string();
    let FormSubmission::Update(update) = form.submit().unwrap() else {
        panic!("editing a selected todo must produce an update");
    };

    let updated = store.update_todo(&update).await.unwrap();
    assert_eq!(updated.id, created.id);
    assert!(store.selected().is_none());
    store.read(|s| {
        assert_eq!(s.items()[0].title, "Final");
        assert_eq!(s.items()[0].description.as_deref(), Some("ready to ship"));
    });
}

#[tokio::test]
async fn status_change_and_overdue_filter() {
    let store = store().await;
    let yesterday = Utc::now() - Duration::days(1);
    let late = store
        .create_todo(&CreateTodo {
            title: "Pay rent".to_string(),
            description: None,
            due_date: Some(yesterday),
        })
        .await
        .unwrap();
    store.create_todo(&create("Someday")).await.unwrap();

    store.set_filter(TodoFilter {
        overdue: true,
        ..TodoFilter::default()
    });
    let visible: Vec<String> = store.visible_todos().into_iter().map(|t| t.id).collect();
    assert_eq!(visible, vec![late.id.clone()]);

    let done = store.update_todo_status(&late.id, TodoStatus::Done).await.unwrap();
    assert!(done.is_completed());
    assert!(store.visible_todos().is_empty());
}

#[tokio::test]
async fn delete_and_missing_ids_surface_server_errors() {
    let store = store().await;
    let created = store.create_todo(&create("Temporary")).await.unwrap();

    store.delete_todo(&created.id).await.unwrap();
    assert!(store.read(|s| s.items().is_empty()));

    let err = store.delete_todo(&created.id).await.unwrap_err();
    assert_eq!(err.operation, Operation::Delete);
    assert_eq!(err.message, format!("Todo {} not found", created.id));
    assert_eq!(store.error(), Some(err.message.clone()));
    assert_eq!(
        store.read(|s| s.phase(Operation::Delete).cloned()),
        Some(Phase::Rejected(err.message))
    );
}

#[tokio::test]
async fn concurrent_dispatches_from_shared_store() {
    let store = Arc::new(store().await);

    let handles: Vec<_> = (0..5)
        .map(|i| {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.create_todo(&create(&format!("task {i}"))).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert!(!store.loading());
    assert_eq!(store.read(|s| s.items().len()), 5);
    assert_eq!(store.fetch_todos().await.unwrap().len(), 5);
}

#[tokio::test]
async fn unreachable_server_reports_transport_error() {
    // bind then drop to get a port nothing listens on
    let addr = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap()
    };
    let store = TodoStore::new(TodoClient::new(&format!("http://{addr}/api")), ReqwestTransport::new());

    let err = store.fetch_todos().await.unwrap_err();
    assert!(!err.message.is_empty());
    assert!(store.error().is_some());
    assert!(!store.loading());
}
