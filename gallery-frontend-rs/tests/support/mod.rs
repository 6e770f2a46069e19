#![allow(dead_code)]

//! An in-memory gallery backend speaking the same routes as the real one.

use std::{
    cell::RefCell,
    collections::{BTreeMap, HashMap},
    rc::Rc,
};

use futures::channel::oneshot;
use gallery_frontend_rs::api::{ApiClient, HttpMethod, HttpRequest, HttpResponse, Transport};
use gallery_frontend_rs::fallback::LocalFallback;
use gallery_frontend_rs::models::User;
use gallery_frontend_rs::notifications::AppEvents;
use gallery_frontend_rs::reconcile::Reconciler;
use gallery_frontend_rs::session::SessionContext;
use serde_json::{Value, json};
use stash::MemoryStore;
use url::Url;

pub const BASE: &str = "https://api.test";

pub type TestReconciler = Reconciler<FakeBackend, MemoryStore>;

enum Failure {
    Status(u16, Value),
    Network,
}

type Route = (HttpMethod, String);

#[derive(Default)]
struct State {
    items: BTreeMap<String, Value>,
    favorites: Vec<Value>,
    failures: HashMap<Route, Failure>,
    held: Vec<(Route, oneshot::Receiver<()>)>,
    requests: Vec<Route>,
    next_id: u32,
}

#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Rc<RefCell<State>>,
}

fn respond(status: u16, body: Value) -> HttpResponse {
    HttpResponse {
        status,
        text: body.to_string(),
    }
}

fn ok(body: Value) -> HttpResponse {
    respond(200, json!({ "data": body }))
}

fn not_found(what: &str) -> HttpResponse {
    respond(404, json!({ "message": format!("{what} not found") }))
}

impl State {
    fn fresh_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{prefix}{}", self.next_id)
    }

    fn route(
        &mut self,
        method: HttpMethod,
        path: &str,
        query: &HashMap<String, String>,
        body: Option<Value>,
    ) -> HttpResponse {
        let owner = query.get("userEmail");
        let owned_by = |v: &Value| owner.is_none_or(|email| v["userEmail"] == email.as_str());
        let segments: Vec<&str> = path.trim_matches('/').split('/').collect();

        match (method, segments.as_slice()) {
            (HttpMethod::Get, ["items"]) => {
                let items: Vec<Value> = self.items.values().filter(|i| owned_by(i)).cloned().collect();
                ok(json!(items))
            }
            (HttpMethod::Post, ["items"]) => {
                let id = self.fresh_id("art");
                let mut item = body.unwrap_or_else(|| json!({}));
                item["_id"] = json!(id);
                self.items.insert(id, item.clone());
                ok(item)
            }
            (HttpMethod::Get, ["items", id]) => match self.items.get(*id) {
                Some(item) => ok(item.clone()),
                None => not_found("Item"),
            },
            (HttpMethod::Put, ["items", id]) => {
                if !self.items.contains_key(*id) {
                    return not_found("Item");
                }
                let mut item = body.unwrap_or_else(|| json!({}));
                item["_id"] = json!(id);
                self.items.insert(id.to_string(), item.clone());
                ok(item)
            }
            (HttpMethod::Patch, ["items", id]) => match self.items.get_mut(*id) {
                Some(item) => {
                    if let (Some(fields), Some(Value::Object(patch))) = (item.as_object_mut(), body)
                    {
                        fields.extend(patch);
                    }
                    ok(item.clone())
                }
                None => not_found("Item"),
            },
            (HttpMethod::Post, ["items", id, "like"]) => match self.items.get_mut(*id) {
                Some(item) => {
                    let likes = item["likes"].as_u64().unwrap_or(0) + 1;
                    item["likes"] = json!(likes);
                    ok(item.clone())
                }
                None => not_found("Item"),
            },
            (HttpMethod::Delete, ["items", id]) | (HttpMethod::Delete, ["admin", "artworks", id]) => {
                match self.items.remove(*id) {
                    Some(_) => ok(json!({ "deleted": id })),
                    None => not_found("Item"),
                }
            }
            (HttpMethod::Get, ["admin", "artworks"]) => {
                let items: Vec<Value> = self.items.values().cloned().collect();
                ok(json!(items))
            }
            (HttpMethod::Get, ["favorites"]) => {
                let favorites: Vec<Value> =
                    self.favorites.iter().filter(|f| owned_by(f)).cloned().collect();
                ok(json!(favorites))
            }
            (HttpMethod::Post, ["favorites"]) => {
                let mut favorite = body.unwrap_or_else(|| json!({}));
                let duplicate = self.favorites.iter().any(|f| {
                    f["itemId"] == favorite["itemId"] && f["userEmail"] == favorite["userEmail"]
                });
                if duplicate {
                    return respond(409, json!({ "message": "Already in favorites" }));
                }
                favorite["_id"] = json!(self.fresh_id("fav"));
                self.favorites.push(favorite.clone());
                ok(favorite)
            }
            (HttpMethod::Delete, ["favorites", id]) => {
                match self.favorites.iter().position(|f| f["_id"] == *id) {
                    Some(index) => {
                        self.favorites.remove(index);
                        ok(json!({ "deleted": id }))
                    }
                    None => not_found("Favorite"),
                }
            }
            _ => respond(404, json!({ "message": "Route not found" })),
        }
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_item(self, item: Value) -> Self {
        let id = item["_id"].as_str().unwrap_or_default().to_string();
        self.state.borrow_mut().items.insert(id, item);
        self
    }

    pub fn with_favorite(self, favorite: Value) -> Self {
        self.state.borrow_mut().favorites.push(favorite);
        self
    }

    pub fn item(&self, id: &str) -> Option<Value> {
        self.state.borrow().items.get(id).cloned()
    }

    pub fn favorites(&self) -> Vec<Value> {
        self.state.borrow().favorites.clone()
    }

    pub fn remove_favorite(&self, id: &str) {
        self.state.borrow_mut().favorites.retain(|f| f["_id"] != id);
    }

    /// Answer every `method path` request with `status` and `body` from now on.
    pub fn fail(&self, method: HttpMethod, path: &str, status: u16, body: Value) {
        self.state
            .borrow_mut()
            .failures
            .insert((method, path.to_string()), Failure::Status(status, body));
    }

    /// Make `method path` fail without an HTTP response.
    pub fn disconnect(&self, method: HttpMethod, path: &str) {
        self.state
            .borrow_mut()
            .failures
            .insert((method, path.to_string()), Failure::Network);
    }

    /// The next `method path` request waits until the returned sender fires (or is dropped).
    pub fn hold(&self, method: HttpMethod, path: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.state
            .borrow_mut()
            .held
            .push(((method, path.to_string()), rx));
        tx
    }

    pub fn requests(&self) -> Vec<(HttpMethod, String)> {
        self.state.borrow().requests.clone()
    }

    pub fn count(&self, method: HttpMethod, path: &str) -> usize {
        self.state
            .borrow()
            .requests
            .iter()
            .filter(|(m, p)| *m == method && p == path)
            .count()
    }

    pub fn client(&self) -> ApiClient<FakeBackend> {
        ApiClient::new(self.clone(), BASE).unwrap()
    }
}

impl Transport for FakeBackend {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, String> {
        let url = Url::parse(&request.url).map_err(|e| e.to_string())?;
        let route: Route = (request.method, url.path().to_string());
        self.state.borrow_mut().requests.push(route.clone());

        let gate = {
            let mut state = self.state.borrow_mut();
            state
                .held
                .iter()
                .position(|(held, _)| *held == route)
                .map(|index| state.held.remove(index).1)
        };
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        let mut state = self.state.borrow_mut();
        match state.failures.get(&route) {
            Some(Failure::Network) => return Err("Failed to fetch".to_string()),
            Some(Failure::Status(status, body)) => return Ok(respond(*status, body.clone())),
            None => {}
        }

        let query: HashMap<String, String> = url.query_pairs().into_owned().collect();
        Ok(state.route(request.method, &route.1, &query, request.body))
    }
}

pub fn ana() -> User {
    User {
        email: "ana@example.com".into(),
        display_name: Some("Ana Lopez".into()),
        photo_url: None,
    }
}

pub fn artwork_json(id: &str, likes: u64) -> Value {
    json!({
        "_id": id,
        "title": format!("Artwork {id}"),
        "imageUrl": format!("https://img.test/{id}.png"),
        "artistName": "Bo",
        "category": "Painting",
        "likes": likes,
        "userEmail": "ana@example.com",
    })
}

pub fn reconciler_with_store(
    backend: &FakeBackend,
    store: MemoryStore,
    user: Option<User>,
) -> Rc<TestReconciler> {
    Rc::new(Reconciler::new(
        backend.client(),
        LocalFallback::new(store),
        SessionContext::with_user(user),
        AppEvents::default(),
    ))
}

pub fn reconciler(backend: &FakeBackend, user: Option<User>) -> Rc<TestReconciler> {
    reconciler_with_store(backend, MemoryStore::default(), user)
}
