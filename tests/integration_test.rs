// Integration tests for clinic-tui against an in-process mock backend.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use serde_json::{Value, json};

use clinic_tui::api::ApiClient;
use clinic_tui::app::keymap::Keymap;
use clinic_tui::app::update::handle_key;
use clinic_tui::app::{AppState, Screen, Theme};
use clinic_tui::auth::AuthService;
use clinic_tui::config::Config;
use clinic_tui::error::AuthError;
use clinic_tui::form::{FormController, SubmitOutcome};
use clinic_tui::model::{InventoryItem, Patient, RoleNaming, User};
use clinic_tui::nav::View;
use clinic_tui::notify::{NotificationCenter, Severity};
use clinic_tui::session::{Session, SessionStore};

const PASSWORD: &str = "Secret1!";

#[derive(Clone, Default)]
struct Backend {
    patients: Arc<Mutex<Vec<Value>>>,
    inventory: Arc<Mutex<Vec<Value>>>,
    patient_posts: Arc<AtomicUsize>,
}

fn token(exp: i64) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(json!({"sub": "ana", "exp": exp}).to_string());
    format!("{header}.{payload}.c2ln")
}

fn valid_token() -> String {
    token(chrono::Utc::now().timestamp() + 3600)
}

fn hr_user() -> Value {
    json!({"cedula": "10000001", "username": "ana", "fullName": "Ana Ruiz", "role": "HUMAN_RESOURCES", "active": true})
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("Bearer ") && v != "Bearer revoked")
}

async fn health() -> Json<Value> {
    Json(json!({"status": "UP"}))
}

async fn login(Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    if body["username"] == "ana" && body["password"] == PASSWORD {
        (
            StatusCode::OK,
            Json(json!({"success": true, "token": valid_token(), "user": hr_user()})),
        )
    } else {
        (StatusCode::UNAUTHORIZED, Json(json!({"message": "Bad credentials"})))
    }
}

async fn list_users(headers: HeaderMap) -> (StatusCode, Json<Value>) {
    if !authorized(&headers) {
        return (StatusCode::UNAUTHORIZED, Json(json!({"message": "expired"})));
    }
    (
        StatusCode::OK,
        Json(json!([
            hr_user(),
            {"cedula": "10000002", "username": "luis", "fullName": "Luis Gomez", "role": "MEDICO", "active": false}
        ])),
    )
}

async fn list_patients(State(b): State<Backend>) -> Json<Value> {
    Json(Value::Array(b.patients.lock().unwrap().clone()))
}

async fn create_patient(State(b): State<Backend>, Json(body): Json<Value>) -> (StatusCode, Json<Value>) {
    b.patient_posts.fetch_add(1, Ordering::SeqCst);
    b.patients.lock().unwrap().push(body.clone());
    (StatusCode::CREATED, Json(body))
}

async fn list_inventory(State(b): State<Backend>) -> Json<Value> {
    Json(json!({"data": b.inventory.lock().unwrap().clone()}))
}

async fn delete_inventory(State(b): State<Backend>, Path(id): Path<String>) -> StatusCode {
    let mut items = b.inventory.lock().unwrap();
    let before = items.len();
    items.retain(|i| i["id"].to_string() != id);
    if items.len() < before { StatusCode::NO_CONTENT } else { StatusCode::NOT_FOUND }
}

async fn spawn_backend(backend: Backend) -> String {
    let router = Router::new()
        .route("/api/public/health", get(health))
        .route("/api/auth/login", post(login))
        .route("/api/users", get(list_users))
        .route("/api/patients", get(list_patients).post(create_patient))
        .route("/api/inventory", get(list_inventory))
        .route("/api/inventory/:id", delete(delete_inventory))
        .with_state(backend);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{addr}/api")
}

fn client(base: &str) -> ApiClient {
    ApiClient::new(base, Duration::from_secs(5)).unwrap()
}

fn seeded() -> Backend {
    let b = Backend::default();
    b.patients.lock().unwrap().extend([
        json!({"cedula": "20000001", "fullName": "Marta Diaz", "gender": "FEMENINO"}),
        json!({"cedula": "20000002", "fullName": "Pedro Lopez", "gender": "MASCULINO"}),
    ]);
    b.inventory.lock().unwrap().extend([
        json!({"id": 1, "name": "Gauze", "type": "SUPPLY", "quantity": 40, "minimumStock": 10}),
        json!({"id": 2, "name": "Ibuprofen", "type": "MEDICATION", "quantity": 3, "minimumStock": 10}),
        json!({"id": 3, "name": "Syringe", "type": "SUPPLY", "quantity": 0, "minimumStock": 5}),
    ]);
    b
}

fn fill_patient(form: &mut FormController<Patient>, cedula: &str) {
    let ed = form.editor_mut().unwrap();
    ed.set_text("cedula", cedula);
    ed.set_text("username", "anaruiz");
    ed.set_text("password", PASSWORD);
    ed.set_text("confirmPassword", PASSWORD);
    ed.set_text("fullName", "Ana Ruiz");
    ed.set_text("birthDate", "1990-04-01");
    ed.set_text("gender", "FEMENINO");
    ed.set_text("address", "Calle 1");
    ed.set_text("phoneNumber", "3001234567");
    ed.set_text("email", "ana@mail.co");
}

// 1) Wrong password: 401 maps to invalid credentials and storage is untouched
#[tokio::test]
async fn wrong_password_leaves_session_storage_unchanged() {
    let base = spawn_backend(Backend::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "previous contents").unwrap();

    let auth = AuthService::new(client(&base), SessionStore::new(&path));
    let err = auth.login("ana", "wrong-password").await.unwrap_err();

    assert_eq!(err, AuthError::InvalidCredentials);
    assert!(auth.api().token().is_none());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "previous contents");
}

// 2) Successful login is persisted and restored by a fresh client
#[tokio::test]
async fn login_is_persisted_and_restored() {
    let base = spawn_backend(Backend::default()).await;
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("session.json");

    let auth = AuthService::new(client(&base), SessionStore::new(&path));
    let session = auth.login("ana", PASSWORD).await.unwrap();
    assert_eq!(session.current_user.username, "ana");
    assert!(path.exists());

    let again = AuthService::new(client(&base), SessionStore::new(&path));
    let restored = again.restore(chrono::Utc::now()).unwrap();
    assert_eq!(restored, session);
    assert_eq!(again.api().token(), Some(session.auth_token));
}

// 3) Expired tokens are dropped on restore
#[test]
fn expired_token_is_cleared_on_restore() {
    let dir = tempfile::tempdir().unwrap();
    let store = SessionStore::new(dir.path().join("session.json"));
    let user: User = serde_json::from_value(hr_user()).unwrap();
    store
        .save(&Session {
            auth_token: token(chrono::Utc::now().timestamp() - 60),
            current_user: user,
        })
        .unwrap();

    let auth = AuthService::new(client("http://127.0.0.1:9/api"), store.clone());
    assert!(auth.restore(chrono::Utc::now()).is_none());
    assert!(!store.path().exists());
    assert!(auth.api().token().is_none());
}

// 4) A valid create form issues exactly one POST and the reload shows the new row
#[tokio::test]
async fn valid_create_posts_once_and_reload_counts_it() {
    let backend = seeded();
    let base = spawn_backend(backend.clone()).await;
    let api = client(&base);
    let mut sink = NotificationCenter::default();

    let before = api.list::<Patient>().await.unwrap();
    assert!(before.iter().all(|p| p.cedula != "12345678"));

    let mut form: FormController<Patient> = FormController::new();
    form.open(None);
    fill_patient(&mut form, "12345678");
    let outcome = form.submit(&api, &mut sink, RoleNaming::English).await;

    assert_eq!(outcome, SubmitOutcome::Saved);
    assert!(!form.is_open());
    assert_eq!(backend.patient_posts.load(Ordering::SeqCst), 1);
    let after = api.list::<Patient>().await.unwrap();
    assert_eq!(after.len(), before.len() + 1);
    assert!(after.iter().any(|p| p.cedula == "12345678"));
    assert_eq!(sink.visible().last().map(|n| n.severity), Some(Severity::Success));
}

// 5) An invalid national ID never reaches the network
#[tokio::test]
async fn invalid_cedula_never_issues_a_request() {
    let backend = seeded();
    let base = spawn_backend(backend.clone()).await;
    let api = client(&base);
    let mut sink = NotificationCenter::default();

    let mut form: FormController<Patient> = FormController::new();
    form.open(None);
    fill_patient(&mut form, "12ab");
    let outcome = form.submit(&api, &mut sink, RoleNaming::English).await;

    assert_eq!(outcome, SubmitOutcome::Invalid);
    assert!(form.is_open());
    assert!(form.editor().unwrap().error_for("cedula").is_some());
    assert_eq!(backend.patient_posts.load(Ordering::SeqCst), 0);
}

// 6) Deleting one inventory item removes exactly one row
#[tokio::test]
async fn deleting_inventory_item_decrements_total() {
    let backend = seeded();
    let base = spawn_backend(backend.clone()).await;
    let api = client(&base);

    let before = api.list::<InventoryItem>().await.unwrap();
    assert_eq!(before.len(), 3);
    api.remove::<InventoryItem>("2").await.unwrap();

    let after = api.list::<InventoryItem>().await.unwrap();
    assert_eq!(after.len(), 2);
    assert!(after.iter().all(|i| i.id.as_deref() != Some("2")));
    assert_eq!(api.remove::<InventoryItem>("2").await.unwrap_err().status(), Some(404));
}

fn app_for(base: &str, dir: &std::path::Path, rt: &tokio::runtime::Runtime) -> AppState {
    let auth = AuthService::new(client(base), SessionStore::new(dir.join("session.json")));
    AppState::new(Config::default(), Theme::mocha(), Keymap::default(), auth, rt.handle().clone())
}

// 7) Logging in through the app lands on the role's first section and loads it
#[test]
fn app_login_lands_on_role_view() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let base = rt.block_on(spawn_backend(seeded()));
    let dir = tempfile::tempdir().unwrap();
    let mut app = app_for(&base, dir.path(), &rt);

    app.login.username = "ana".into();
    app.login.password = PASSWORD.into();
    app.submit_login();
    assert!(app.login.busy);

    let event = app.wait_event(Duration::from_secs(5)).unwrap();
    app.handle_event(event);
    assert_eq!(app.screen, Screen::Dashboard);
    assert_eq!(app.active_view(), Some(View::Users));

    let event = app.wait_event(Duration::from_secs(5)).unwrap();
    app.handle_event(event);
    assert_eq!(app.lists.users.total(), 2);
    assert_eq!(app.lists.users.count_where(|u| u.active), 1);
}

// 8) A 401 on any call drops the session and returns to the login screen
#[test]
fn unauthorized_response_returns_to_login() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let base = rt.block_on(spawn_backend(seeded()));
    let dir = tempfile::tempdir().unwrap();
    let mut app = app_for(&base, dir.path(), &rt);

    let session = Session {
        auth_token: "revoked".into(),
        current_user: serde_json::from_value(hr_user()).unwrap(),
    };
    app.auth.establish(&session).unwrap();
    assert!(app.start_session(session));

    let event = app.wait_event(Duration::from_secs(5)).unwrap();
    app.handle_event(event);

    assert_eq!(app.screen, Screen::Login);
    assert!(app.session.is_none());
    assert!(!dir.path().join("session.json").exists());
    assert!(app.notifications.visible().iter().any(|n| n.severity == Severity::Warning));
}

// 9) Responses that arrive after logout are dropped
#[test]
fn events_from_before_logout_are_dropped() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let base = rt.block_on(spawn_backend(seeded()));
    let dir = tempfile::tempdir().unwrap();
    let mut app = app_for(&base, dir.path(), &rt);

    let session = Session {
        auth_token: valid_token(),
        current_user: serde_json::from_value(hr_user()).unwrap(),
    };
    app.auth.establish(&session).unwrap();
    app.start_session(session);
    app.logout();

    assert!(app.wait_event(Duration::from_millis(500)).is_none());
    assert_eq!(app.lists.users.total(), 0);
    assert_eq!(app.screen, Screen::Login);
}

// 10) Deleting an inventory item from the app removes one row after the reload
#[test]
fn app_delete_inventory_item_drops_total_by_one() {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let base = rt.block_on(spawn_backend(seeded()));
    let dir = tempfile::tempdir().unwrap();
    let mut app = app_for(&base, dir.path(), &rt);

    let mut user = hr_user();
    user["role"] = json!("SOPORTE_INFORMACION");
    let session = Session {
        auth_token: valid_token(),
        current_user: serde_json::from_value(user).unwrap(),
    };
    app.auth.establish(&session).unwrap();
    app.start_session(session);
    assert_eq!(app.active_view(), Some(View::Inventory));
    let event = app.wait_event(Duration::from_secs(5)).unwrap();
    app.handle_event(event);
    let before = app.lists.inventory.total();
    assert_eq!(before, 3);

    app.lists.inventory.select_next();
    assert_eq!(app.lists.inventory.selected_item().and_then(|i| i.id.as_deref()), Some("2"));
    handle_key(&mut app, KeyEvent::new(KeyCode::Char('d'), KeyModifiers::NONE));
    handle_key(&mut app, KeyEvent::new(KeyCode::Char('y'), KeyModifiers::NONE));
    assert!(app.modal.is_none());

    // delete answer, then the reload it triggers
    for _ in 0..2 {
        let event = app.wait_event(Duration::from_secs(5)).unwrap();
        app.handle_event(event);
    }
    assert_eq!(app.lists.inventory.total(), before - 1);
    assert!(app.lists.inventory.items().iter().all(|i| i.id.as_deref() != Some("2")));
    assert!(app.notifications.visible().iter().any(|n| n.message == "Inventory item deleted successfully"));
}
