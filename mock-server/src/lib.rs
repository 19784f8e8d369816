use std::{collections::BTreeMap, sync::Arc};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Link {
    pub href: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct UserLinks {
    pub locations: Link,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: u64,
    pub name: String,
    #[serde(rename = "_links")]
    pub links: UserLinks,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Location {
    pub id: u64,
    pub city: String,
}

#[derive(Deserialize)]
pub struct CreateUser {
    pub name: String,
    #[serde(default)]
    pub locations: Vec<u64>,
}

#[derive(Deserialize)]
pub struct UpdateUser {
    pub id: u64,
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub offset: usize,
    pub limit: Option<usize>,
}

#[derive(Clone, Debug)]
struct UserRecord {
    name: String,
    locations: Vec<u64>,
}

#[derive(Debug)]
pub struct Directory {
    users: BTreeMap<u64, UserRecord>,
    locations: BTreeMap<u64, Location>,
    next_id: u64,
}

impl Directory {
    /// Two users living in Paris; Vincent is user 1.
    pub fn seeded() -> Self {
        let users = BTreeMap::from([
            (1, UserRecord { name: "Vincent".to_string(), locations: vec![1] }),
            (2, UserRecord { name: "Alice".to_string(), locations: vec![1] }),
        ]);
        let locations = BTreeMap::from([
            (1, Location { id: 1, city: "Paris".to_string() }),
            (2, Location { id: 2, city: "Lyon".to_string() }),
        ]);
        Self { users, locations, next_id: 3 }
    }

    fn view(&self, id: u64) -> Option<User> {
        self.users.get(&id).map(|record| User {
            id,
            name: record.name.clone(),
            links: UserLinks {
                locations: Link { href: format!("/users/{id}/locations") },
            },
        })
    }
}

pub type Db = Arc<RwLock<Directory>>;

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Directory::seeded()));
    Router::new()
        .route("/users", get(list_users).post(create_user).put(update_user))
        .route("/users/{id}", get(get_user).delete(delete_user))
        .route("/users/{id}/locations", get(user_locations))
        .route("/locations/{id}/users", get(location_users))
        .route("/failure", get(failure))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn list_users(State(db): State<Db>) -> Json<Vec<User>> {
    let db = db.read().await;
    Json(db.users.keys().filter_map(|id| db.view(*id)).collect())
}

async fn create_user(
    State(db): State<Db>,
    Json(input): Json<CreateUser>,
) -> Result<(StatusCode, Json<User>), StatusCode> {
    let mut db = db.write().await;
    let id = db.next_id;
    db.next_id += 1;
    db.users.insert(id, UserRecord { name: input.name, locations: input.locations });
    let user = db.view(id).ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn update_user(State(db): State<Db>, Json(input): Json<UpdateUser>) -> Result<Json<User>, StatusCode> {
    let mut db = db.write().await;
    let record = db.users.get_mut(&input.id).ok_or(StatusCode::NOT_FOUND)?;
    if let Some(name) = input.name {
        record.name = name;
    }
    db.view(input.id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn get_user(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<User>, StatusCode> {
    db.read().await.view(id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

async fn delete_user(State(db): State<Db>, Path(id): Path<u64>) -> Result<StatusCode, StatusCode> {
    let mut db = db.write().await;
    db.users.remove(&id).map(|_| StatusCode::NO_CONTENT).ok_or(StatusCode::NOT_FOUND)
}

async fn user_locations(State(db): State<Db>, Path(id): Path<u64>) -> Result<Json<Vec<Location>>, StatusCode> {
    let db = db.read().await;
    let record = db.users.get(&id).ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(
        record.locations.iter().filter_map(|loc| db.locations.get(loc).cloned()).collect(),
    ))
}

async fn location_users(
    State(db): State<Db>,
    Path(id): Path<u64>,
    Query(page): Query<Pagination>,
) -> Result<Json<Vec<User>>, StatusCode> {
    let db = db.read().await;
    if !db.locations.contains_key(&id) {
        return Err(StatusCode::NOT_FOUND);
    }
    let users = db
        .users
        .iter()
        .filter(|(_, record)| record.locations.contains(&id))
        .filter_map(|(user_id, _)| db.view(*user_id))
        .skip(page.offset)
        .take(page.limit.unwrap_or(usize::MAX))
        .collect();
    Ok(Json(users))
}

async fn failure() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error")
}
