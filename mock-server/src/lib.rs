use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::{net::TcpListener, sync::RwLock};

/// A logged heart rate measurement.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HeartLog {
    pub log_id: u64,
    pub tracker: String,
    pub heart_rate: f64,
    #[serde(skip)]
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
}

#[derive(Deserialize)]
pub struct CreateHeartLog {
    pub tracker: String,
    #[serde(rename = "heartRate")]
    pub heart_rate: f64,
    pub date: String,
    pub time: Option<String>,
}

/// A logged sleep period.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SleepEntry {
    pub log_id: u64,
    pub date_of_sleep: String,
    pub start_time: String,
    pub duration: u64,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSleepLog {
    pub start_time: String,
    pub duration: u64,
    pub date: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SleepListQuery {
    pub before_date: Option<String>,
    pub after_date: Option<String>,
    pub sort: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

#[derive(Default)]
pub struct Store {
    next_id: u64,
    heart: BTreeMap<u64, HeartLog>,
    sleep: BTreeMap<u64, SleepEntry>,
}

impl Store {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

pub type Db = Arc<RwLock<Store>>;

type ApiResult = Result<Json<Value>, (StatusCode, Json<Value>)>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/{version}/user/{user}/heart.json", post(create_heart_log))
        .route("/{version}/user/{user}/heart/date/{*rest}", get(heart_on_date))
        .route("/{version}/user/{user}/heart/{file}", delete(delete_heart_log))
        .route("/{version}/user/{user}/sleep.json", post(create_sleep_log))
        .route("/{version}/user/{user}/sleep/date/{*rest}", get(sleep_on_dates))
        .route("/{version}/user/{user}/sleep/list.json", get(list_sleep))
        .route("/{version}/user/{user}/sleep/{file}", delete(delete_sleep_log))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn bad_request(message: &str) -> (StatusCode, Json<Value>) {
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"errors": [{"errorType": "validation", "message": message}]})),
    )
}

/// `42.json` -> 42
fn log_id(file: &str) -> Option<u64> {
    file.strip_suffix(".json")?.parse().ok()
}

/// `a/b/c.json` -> `["a", "b", "c"]`; `.json` -> `[""]`
fn segments(rest: &str) -> Vec<&str> {
    rest.strip_suffix(".json").unwrap_or(rest).split('/').collect()
}

async fn create_heart_log(
    State(db): State<Db>,
    Path((_version, _user)): Path<(String, String)>,
    Form(input): Form<CreateHeartLog>,
) -> (StatusCode, Json<Value>) {
    let mut store = db.write().await;
    let log = HeartLog {
        log_id: store.next_id(),
        tracker: input.tracker,
        heart_rate: input.heart_rate,
        date: input.date,
        time: input.time,
    };
    store.heart.insert(log.log_id, log.clone());
    (StatusCode::CREATED, Json(json!({ "heartLog": log })))
}

async fn heart_on_date(
    State(db): State<Db>,
    Path((_version, _user, rest)): Path<(String, String, String)>,
) -> Json<Value> {
    let date = segments(&rest)[0].to_string();
    let store = db.read().await;
    let heart: Vec<&HeartLog> = store
        .heart
        .values()
        .filter(|log| date.is_empty() || log.date == date)
        .collect();

    let mut by_tracker: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for log in &heart {
        let entry = by_tracker.entry(log.tracker.as_str()).or_default();
        entry.0 += log.heart_rate;
        entry.1 += 1;
    }
    let average: Vec<Value> = by_tracker
        .into_iter()
        .map(|(tracker, (sum, n))| json!({"heartRate": sum / n as f64, "tracker": tracker}))
        .collect();

    Json(json!({ "average": average, "heart": heart }))
}

async fn delete_heart_log(
    State(db): State<Db>,
    Path((_version, _user, file)): Path<(String, String, String)>,
) -> Result<StatusCode, StatusCode> {
    let id = log_id(&file).ok_or(StatusCode::BAD_REQUEST)?;
    let mut store = db.write().await;
    store
        .heart
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn create_sleep_log(
    State(db): State<Db>,
    Path((_version, _user)): Path<(String, String)>,
    Form(input): Form<CreateSleepLog>,
) -> (StatusCode, Json<Value>) {
    let mut store = db.write().await;
    let entry = SleepEntry {
        log_id: store.next_id(),
        date_of_sleep: input.date,
        start_time: input.start_time,
        duration: input.duration,
    };
    store.sleep.insert(entry.log_id, entry.clone());
    (StatusCode::CREATED, Json(json!({ "sleep": entry })))
}

async fn sleep_on_dates(
    State(db): State<Db>,
    Path((_version, _user, rest)): Path<(String, String, String)>,
) -> ApiResult {
    let (start, end) = match segments(&rest)[..] {
        [date] => (date.to_string(), date.to_string()),
        [start, end] => (start.to_string(), end.to_string()),
        _ => return Err(bad_request("expected /sleep/date/{date} or /sleep/date/{start}/{end}")),
    };
    let store = db.read().await;
    let sleep: Vec<&SleepEntry> = store
        .sleep
        .values()
        .filter(|e| e.date_of_sleep >= start && e.date_of_sleep <= end)
        .collect();
    let minutes: u64 = sleep.iter().map(|e| e.duration / 60_000).sum();
    Ok(Json(json!({
        "sleep": sleep,
        "summary": {"totalMinutesAsleep": minutes, "totalSleepRecords": sleep.len()}
    })))
}

async fn list_sleep(
    State(db): State<Db>,
    Path((version, _user)): Path<(String, String)>,
    Query(query): Query<SleepListQuery>,
) -> ApiResult {
    if version != "1.2" {
        return Err(bad_request("sleep/list is only available in API version 1.2"));
    }
    if query.before_date.is_none() && query.after_date.is_none() {
        return Err(bad_request("beforeDate or afterDate is required"));
    }
    let sort = match query.sort.as_deref() {
        Some(sort @ ("asc" | "desc")) => sort,
        _ => return Err(bad_request("sort must be asc or desc")),
    };
    let limit = query.limit.ok_or_else(|| bad_request("limit is required"))?;
    let offset = query.offset.unwrap_or_default();

    let store = db.read().await;
    let mut sleep: Vec<&SleepEntry> = store
        .sleep
        .values()
        .filter(|e| query.before_date.as_ref().map_or(true, |d| &e.date_of_sleep <= d))
        .filter(|e| query.after_date.as_ref().map_or(true, |d| &e.date_of_sleep >= d))
        .collect();
    sleep.sort_by(|a, b| a.date_of_sleep.cmp(&b.date_of_sleep));
    if sort == "desc" {
        sleep.reverse();
    }
    let page: Vec<&SleepEntry> = sleep.into_iter().skip(offset).take(limit).collect();

    Ok(Json(json!({
        "sleep": page,
        "pagination": {
            "beforeDate": query.before_date,
            "afterDate": query.after_date,
            "limit": limit,
            "offset": offset,
            "sort": sort,
            "next": "",
            "previous": ""
        }
    })))
}

async fn delete_sleep_log(
    State(db): State<Db>,
    Path((_version, _user, file)): Path<(String, String, String)>,
) -> Result<StatusCode, StatusCode> {
    let id = log_id(&file).ok_or(StatusCode::BAD_REQUEST)?;
    let mut store = db.write().await;
    store
        .sleep
        .remove(&id)
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(StatusCode::NOT_FOUND)
}
