use super::*;
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use shared::{domain::ServiceId, error::ErrorCode};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct ServerState {
    saves: Arc<Mutex<Vec<(String, SaveServicesRequest)>>>,
}

async fn handle_fetch(
    Path(folder_id): Path<String>,
) -> Result<Json<Folder>, (StatusCode, Json<ApiError>)> {
    if folder_id == "missing" {
        return Err((
            StatusCode::NOT_FOUND,
            Json(ApiError::new(ErrorCode::NotFound, "no such folder")),
        ));
    }
    Ok(Json(Folder {
        id: FolderId::new(folder_id.clone()),
        name: format!("Folder {folder_id}"),
        services: vec![Service {
            id: ServiceId::from("1"),
            title: "Web Service".into(),
            description: "Modern website development".into(),
        }],
    }))
}

async fn handle_create(Json(request): Json<CreateFolderRequest>) -> Json<CreatedFolder> {
    Json(CreatedFolder {
        id: FolderId::from("srv-1"),
        name: request.name,
    })
}

async fn handle_save(
    State(state): State<ServerState>,
    Path(folder_id): Path<String>,
    Json(request): Json<SaveServicesRequest>,
) -> StatusCode {
    state.saves.lock().await.push((folder_id, request));
    StatusCode::NO_CONTENT
}

async fn spawn_folder_server() -> anyhow::Result<(String, ServerState)> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    let state = ServerState::default();
    let app = Router::new()
        .route("/api/folders", post(handle_create))
        .route("/api/folders/:folder_id", get(handle_fetch))
        .route("/api/folders/:folder_id/services", put(handle_save))
        .with_state(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok((format!("http://{addr}/api/"), state))
}

#[test]
fn rejects_urls_that_cannot_be_a_base() {
    assert!(HttpFolderRemote::new("not a url").is_err());
    assert!(HttpFolderRemote::new("mailto:ops@example.com").is_err());
}

#[test]
fn endpoint_appends_escaped_segments_to_base_path() {
    let remote = HttpFolderRemote::new("http://localhost:9000/api/").expect("remote");
    let url = remote
        .endpoint(&["folders", "a b/c", "services"])
        .expect("endpoint");
    assert_eq!(
        url.as_str(),
        "http://localhost:9000/api/folders/a%20b%2Fc/services"
    );
}

#[tokio::test]
async fn fetch_decodes_folder_payload() {
    let (base_url, _state) = spawn_folder_server().await.expect("spawn server");
    let remote = HttpFolderRemote::new(&base_url).expect("remote");

    let folder = remote
        .fetch_folder(&FolderId::from("42"))
        .await
        .expect("fetch");

    assert_eq!(folder.id.as_str(), "42");
    assert_eq!(folder.name, "Folder 42");
    assert_eq!(folder.services.len(), 1);
}

#[tokio::test]
async fn fetch_surfaces_api_error_message() {
    let (base_url, _state) = spawn_folder_server().await.expect("spawn server");
    let remote = HttpFolderRemote::new(&base_url).expect("remote");

    let err = remote
        .fetch_folder(&FolderId::from("missing"))
        .await
        .expect_err("must fail");

    let rendered = format!("{err:#}");
    assert!(rendered.contains("404"), "unexpected error: {rendered}");
    assert!(rendered.contains("no such folder"), "unexpected error: {rendered}");
    assert!(err.downcast_ref::<ApiException>().is_some());
}

#[tokio::test]
async fn create_returns_server_assigned_id() {
    let (base_url, _state) = spawn_folder_server().await.expect("spawn server");
    let remote = HttpFolderRemote::new(&base_url).expect("remote");

    let created = remote.create_folder("Ops").await.expect("create");

    assert_eq!(created.id.as_str(), "srv-1");
    assert_eq!(created.name, "Ops");
}

#[tokio::test]
async fn save_puts_full_ordered_service_list() {
    let (base_url, state) = spawn_folder_server().await.expect("spawn server");
    let remote = HttpFolderRemote::new(&base_url).expect("remote");
    let services = vec![
        Service {
            id: ServiceId::from("b"),
            title: "Second".into(),
            description: "added first".into(),
        },
        Service {
            id: ServiceId::from("a"),
            title: "First".into(),
            description: "added second".into(),
        },
    ];

    remote
        .save_services(&FolderId::from("f-9"), &services)
        .await
        .expect("save");
    remote
        .save_services(&FolderId::from("f-9"), &services)
        .await
        .expect("repeat save");

    let saves = state.saves.lock().await;
    assert_eq!(saves.len(), 2);
    assert_eq!(saves[0].0, "f-9");
    assert_eq!(saves[0].1.services, services);
}

#[tokio::test]
async fn unreachable_server_is_a_remote_failure() {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    let remote = HttpFolderRemote::new(&format!("http://{addr}/")).expect("remote");

    let err = remote.create_folder("Ops").await.expect_err("must fail");

    assert!(err.to_string().contains("failed to reach folder service"));
}

#[tokio::test]
async fn controller_drives_http_remote_end_to_end() {
    let (base_url, state) = spawn_folder_server().await.expect("spawn server");
    let controller = crate::FolderSessionController::new(Arc::new(
        HttpFolderRemote::new(&base_url).expect("remote"),
    ));

    controller.create_folder("Ops").await.expect("create");
    controller
        .add_service(shared::domain::NewServiceDraft::new("A", "B"))
        .expect("add");
    assert!(controller.save_services().await.expect("save"));

    let saves = state.saves.lock().await;
    assert_eq!(saves[0].0, "srv-1");
    assert_eq!(saves[0].1.services[0].title, "A");
    assert_eq!(
        controller.snapshot().message,
        crate::status::SAVE_SUCCEEDED
    );
}
