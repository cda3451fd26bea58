//! Single binary web server: JSON API over in-memory rotation sessions.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT.

use actix_web::{
    delete, get, post, put,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use chrono::Utc;
use court_rotation_web::persistence::{export_history_csv, from_json, import_roster_csv, to_json};
use court_rotation_web::{CourtId, LevelTag, PlayerId, Session, SessionConfig};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use uuid::Uuid;

type SessionId = Uuid;

/// Per-session entry: session data + last activity time (for auto-cleanup).
struct SessionEntry {
    session: Session,
    last_activity: Instant,
}

impl SessionEntry {
    fn new(session: Session) -> Self {
        Self {
            session,
            last_activity: Instant::now(),
        }
    }
}

type AppState = Data<RwLock<HashMap<SessionId, SessionEntry>>>;

/// Sessions not accessed for this long are removed.
const INACTIVITY_TIMEOUT: Duration = Duration::from_secs(12 * 3600);

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(serde::Serialize)]
struct CreatedResponse<'a> {
    id: SessionId,
    session: &'a Session,
}

#[derive(serde::Serialize)]
struct ReplanResponse<'a> {
    replanned: bool,
    session: &'a Session,
}

#[derive(Deserialize)]
struct AddPlayerBody {
    name: String,
    #[serde(default)]
    level: LevelTag,
}

#[derive(Deserialize)]
struct ActiveBody {
    active: bool,
}

#[derive(Deserialize)]
struct LevelBody {
    level: LevelTag,
}

#[derive(Deserialize)]
struct PartnerBody {
    partner_id: Option<PlayerId>,
}

#[derive(Deserialize)]
struct PositionBody {
    index: usize,
}

#[derive(Deserialize)]
struct SessionPath {
    id: SessionId,
}

#[derive(Deserialize)]
struct SessionPlayerPath {
    id: SessionId,
    player_id: PlayerId,
}

#[derive(Deserialize)]
struct SessionCourtPath {
    id: SessionId,
    court_id: CourtId,
}

fn bad_request(e: impl Display) -> HttpResponse {
    HttpResponse::BadRequest().json(serde_json::json!({ "error": e.to_string() }))
}

/// Ok with the whole session, or 400 with the error message.
fn respond<T, E: Display>(session: &Session, result: Result<T, E>) -> HttpResponse {
    match result {
        Ok(_) => HttpResponse::Ok().json(session),
        Err(e) => bad_request(e),
    }
}

/// Look up a session (404 if missing), refresh its activity time and run `f` on it.
fn with_session(
    state: &AppState,
    id: SessionId,
    f: impl FnOnce(&mut Session) -> HttpResponse,
) -> HttpResponse {
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    match g.get_mut(&id) {
        Some(entry) => {
            entry.last_activity = Instant::now();
            f(&mut entry.session)
        }
        None => HttpResponse::NotFound().json(serde_json::json!({ "error": "No session" })),
    }
}

/// Store a new session and return it with its id.
fn insert_session(state: &AppState, session: Session) -> HttpResponse {
    let id = Uuid::new_v4();
    let mut g = match state.write() {
        Ok(guard) => guard,
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let entry = g.entry(id).or_insert(SessionEntry::new(session));
    log::info!("Created session {}", id);
    HttpResponse::Ok().json(CreatedResponse {
        id,
        session: &entry.session,
    })
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "court-rotation-web",
    })
}

/// Create a new session (config optional; defaults to 2 courts, no level priority).
#[post("/api/sessions")]
async fn api_create_session(state: AppState, body: Option<Json<SessionConfig>>) -> HttpResponse {
    let config = body.map(|b| b.into_inner()).unwrap_or_default();
    match Session::new(config) {
        Ok(session) => insert_session(&state, session),
        Err(e) => bad_request(e),
    }
}

/// Create a session from an exported JSON snapshot (any supported version).
#[post("/api/sessions/import")]
async fn api_import_session(state: AppState, body: String) -> HttpResponse {
    match from_json(&body) {
        Ok(session) => insert_session(&state, session),
        Err(e) => bad_request(e),
    }
}

#[get("/api/sessions/{id}")]
async fn api_get_session(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    with_session(&state, path.id, |s| HttpResponse::Ok().json(&*s))
}

#[get("/api/sessions/{id}/export")]
async fn api_export_session(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    with_session(&state, path.id, |s| match to_json(s) {
        Ok(json) => HttpResponse::Ok()
            .content_type("application/json")
            .body(json),
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    })
}

#[get("/api/sessions/{id}/history.csv")]
async fn api_export_history(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    with_session(&state, path.id, |s| {
        let mut out = Vec::new();
        match export_history_csv(&s.history, &mut out) {
            Ok(()) => HttpResponse::Ok()
                .content_type("text/csv; charset=utf-8")
                .body(out),
            Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
        }
    })
}

#[post("/api/sessions/{id}/players")]
async fn api_add_player(
    state: AppState,
    path: Path<SessionPath>,
    body: Json<AddPlayerBody>,
) -> HttpResponse {
    with_session(&state, path.id, |s| {
        let r = s.add_player(body.name.trim(), body.level);
        respond(s, r)
    })
}

/// Add players from CSV text (`name,level,active,fixed_partner`).
#[post("/api/sessions/{id}/players/import")]
async fn api_import_players(state: AppState, path: Path<SessionPath>, body: String) -> HttpResponse {
    with_session(&state, path.id, |s| {
        let r = import_roster_csv(s, body.as_bytes());
        respond(s, r)
    })
}

#[delete("/api/sessions/{id}/players/{player_id}")]
async fn api_remove_player(state: AppState, path: Path<SessionPlayerPath>) -> HttpResponse {
    with_session(&state, path.id, |s| {
        let r = s.remove_player(path.player_id);
        respond(s, r)
    })
}

#[put("/api/sessions/{id}/players/{player_id}/active")]
async fn api_set_active(
    state: AppState,
    path: Path<SessionPlayerPath>,
    body: Json<ActiveBody>,
) -> HttpResponse {
    with_session(&state, path.id, |s| {
        let r = s.set_active(path.player_id, body.active);
        respond(s, r)
    })
}

#[put("/api/sessions/{id}/players/{player_id}/level")]
async fn api_set_level(
    state: AppState,
    path: Path<SessionPlayerPath>,
    body: Json<LevelBody>,
) -> HttpResponse {
    with_session(&state, path.id, |s| {
        let r = s.set_level(path.player_id, body.level);
        respond(s, r)
    })
}

/// Link a fixed partner, or unlink with `{"partner_id": null}`.
#[put("/api/sessions/{id}/players/{player_id}/partner")]
async fn api_set_partner(
    state: AppState,
    path: Path<SessionPlayerPath>,
    body: Json<PartnerBody>,
) -> HttpResponse {
    with_session(&state, path.id, |s| {
        let r = s.set_fixed_partner(path.player_id, body.partner_id);
        respond(s, r)
    })
}

#[put("/api/sessions/{id}/players/{player_id}/position")]
async fn api_move_player(
    state: AppState,
    path: Path<SessionPlayerPath>,
    body: Json<PositionBody>,
) -> HttpResponse {
    with_session(&state, path.id, |s| {
        let r = s.move_player(path.player_id, body.index);
        respond(s, r)
    })
}

#[post("/api/sessions/{id}/players/{player_id}/reset")]
async fn api_reset_player(state: AppState, path: Path<SessionPlayerPath>) -> HttpResponse {
    with_session(&state, path.id, |s| {
        let r = s.reset_player(path.player_id);
        respond(s, r)
    })
}

#[post("/api/sessions/{id}/reset")]
async fn api_reset_all(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    with_session(&state, path.id, |s| {
        s.reset_all();
        HttpResponse::Ok().json(&*s)
    })
}

#[put("/api/sessions/{id}/config")]
async fn api_set_config(
    state: AppState,
    path: Path<SessionPath>,
    body: Json<SessionConfig>,
) -> HttpResponse {
    with_session(&state, path.id, |s| {
        let r = s.set_config(body.into_inner());
        respond(s, r)
    })
}

/// Fill every empty court and start those matches.
#[post("/api/sessions/{id}/courts/assign")]
async fn api_assign_courts(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    with_session(&state, path.id, |s| {
        let r = s.assign_open_courts(Utc::now(), &mut rand::thread_rng());
        respond(s, r)
    })
}

#[post("/api/sessions/{id}/courts/{court_id}/start")]
async fn api_start_court(state: AppState, path: Path<SessionCourtPath>) -> HttpResponse {
    with_session(&state, path.id, |s| {
        let r = s.start_next_match(path.court_id, Utc::now(), &mut rand::thread_rng());
        respond(s, r)
    })
}

#[post("/api/sessions/{id}/courts/{court_id}/finish")]
async fn api_finish_court(state: AppState, path: Path<SessionCourtPath>) -> HttpResponse {
    with_session(&state, path.id, |s| {
        let r = s.finish_match(path.court_id);
        respond(s, r)
    })
}

/// Recompute the planned next matches unconditionally.
#[post("/api/sessions/{id}/plan")]
async fn api_plan_next(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    with_session(&state, path.id, |s| {
        s.plan_next(&mut rand::thread_rng());
        HttpResponse::Ok().json(&*s)
    })
}

/// Recompute the plan only if roster/config changes made it stale.
#[post("/api/sessions/{id}/plan/refresh")]
async fn api_refresh_plan(state: AppState, path: Path<SessionPath>) -> HttpResponse {
    with_session(&state, path.id, |s| {
        let replanned = s.refresh_plan(&mut rand::thread_rng());
        HttpResponse::Ok().json(ReplanResponse {
            replanned,
            session: s,
        })
    })
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let host = std::env::var("HOST").unwrap_or_else(|_| default_host());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or_else(default_port);
    let bind = (host.as_str(), port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    let state = Data::new(RwLock::new(HashMap::<SessionId, SessionEntry>::new()));

    // Background task: every 30 minutes, remove sessions inactive for 12+ hours
    let state_cleanup = state.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(Duration::from_secs(30 * 60));
        loop {
            interval.tick().await;
            let mut g = match state_cleanup.write() {
                Ok(guard) => guard,
                Err(_) => continue,
            };
            let before = g.len();
            g.retain(|_, entry| entry.last_activity.elapsed() < INACTIVITY_TIMEOUT);
            let removed = before - g.len();
            if removed > 0 {
                log::info!("Cleaned up {} inactive session(s) (no activity for 12h)", removed);
            }
        }
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_create_session)
            .service(api_import_session)
            .service(api_get_session)
            .service(api_export_session)
            .service(api_export_history)
            .service(api_add_player)
            .service(api_import_players)
            .service(api_remove_player)
            .service(api_set_active)
            .service(api_set_level)
            .service(api_set_partner)
            .service(api_move_player)
            .service(api_reset_player)
            .service(api_reset_all)
            .service(api_set_config)
            .service(api_assign_courts)
            .service(api_start_court)
            .service(api_finish_court)
            .service(api_plan_next)
            .service(api_refresh_plan)
    })
    .bind(bind)?
    .run()
    .await
}
