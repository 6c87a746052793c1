//! Binds the chat router to HTTP routes.
//!
//! Every reply is JSON with CORS headers. Rejections are ordinary `200`
//! replies with `success: false`, except a history read without a room,
//! which is a `400`.


use log::debug;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::chat::{ChatCommand, ChatRouter, PostMessageRequest, Rejection, Reply, UpdateSessionRequest, History};
use crate::parser::{HttpRequest, Method};
use crate::server::{Error, HttpResponse, HttpServer, StatusCode};

/// Chat endpoint: history reads and dispatched posts.
pub const CHAT_PATH: &str = "/api/chat";
/// Room listing.
pub const ROOMS_PATH: &str = "/api/rooms";
/// Post a message.
pub const MESSAGE_PATH: &str = "/api/message";
/// Session updates.
pub const SESSION_PATH: &str = "/api/session";

/// Client identifier used when the peer address is unknown.
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Identify the client behind a request by its peer IP.
pub fn client_id(request: &HttpRequest) -> String {
    request
        .remote_addr
        .map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| UNKNOWN_CLIENT.to_string())
}

/// Decode a POST body into a JSON object.
///
/// Form bodies become an object of strings, except `replyTo`, which is
/// itself JSON. Other bodies are read as JSON unless they declare another
/// content type. Anything that fails to decode becomes `null`.
pub fn decode_body(request: &HttpRequest) -> Value {
    if request.is_form() {
        return match request.form() {
            Ok(fields) => form_to_value(fields.into_iter()),
            Err(e) => {
                debug!("Undecodable form body: {e}");
                Value::Null
            }
        };
    }

    request.json::<Value>().unwrap_or_else(|e| {
        debug!("Undecodable JSON body: {e}");
        Value::Null
    })
}

fn form_to_value(fields: impl Iterator<Item = (String, String)>) -> Value {
    let object: Map<String, Value> = fields
        .map(|(name, value)| {
            let value = if name == "replyTo" {
                serde_json::from_str(&value).unwrap_or(Value::Null)
            } else {
                Value::String(value)
            };
            (name, value)
        })
        .collect();
    Value::Object(object)
}

fn json_reply<T: Serialize>(status: StatusCode, body: &T) -> Result<HttpResponse, Error> {
    Ok(HttpResponse::new(status).with_json(body)?.with_cors())
}

fn preflight() -> HttpResponse {
    HttpResponse::new(StatusCode::NoContent)
        .with_header("Content-Length", "0")
        .with_cors()
}

/// Answer `GET /api/chat?room=<name>`.
async fn read_history(router: &ChatRouter, request: &HttpRequest) -> Result<HttpResponse, Error> {
    match request.get_query_param("room").map(|room| room.trim()) {
        Some(room) if !room.is_empty() => json_reply(StatusCode::Ok, &router.history(room).await),
        _ => {
            let reply: Reply<History> = Reply::rejected(Rejection::MissingRoom);
            json_reply(StatusCode::BadRequest, &reply)
        }
    }
}

/// Register every chat endpoint on `server`.
pub async fn mount(server: &HttpServer, router: ChatRouter) {
    let chat = router.clone();
    server.add_route(CHAT_PATH, vec![Method::GET, Method::POST], move |request| {
        let router = chat.clone();
        async move {
            if request.method == Method::POST {
                let command = ChatCommand::from_value(decode_body(&request));
                let reply = router.dispatch(&client_id(&request), command).await;
                json_reply(StatusCode::Ok, &reply)
            } else {
                read_history(&router, &request).await
            }
        }
    }).await;

    let rooms = router.clone();
    server.add_route(ROOMS_PATH, vec![Method::GET], move |_request| {
        let router = rooms.clone();
        async move { json_reply(StatusCode::Ok, &router.list_rooms().await) }
    }).await;

    let messages = router.clone();
    server.add_route(MESSAGE_PATH, vec![Method::POST], move |request| {
        let router = messages.clone();
        async move {
            let post: PostMessageRequest = serde_json::from_value(decode_body(&request)).unwrap_or_default();
            let reply = router.post_message(&client_id(&request), post).await;
            json_reply(StatusCode::Ok, &reply)
        }
    }).await;

    let sessions = router;
    server.add_route(SESSION_PATH, vec![Method::POST], move |request| {
        let router = sessions.clone();
        async move {
            let update: UpdateSessionRequest = serde_json::from_value(decode_body(&request)).unwrap_or_default();
            let reply = router.update_session(&client_id(&request), update).await;
            json_reply(StatusCode::Ok, &reply)
        }
    }).await;

    for path in [CHAT_PATH, ROOMS_PATH, MESSAGE_PATH, SESSION_PATH] {
        server.add_route(path, vec![Method::OPTIONS], |_request| async { Ok(preflight()) }).await;
    }
}
