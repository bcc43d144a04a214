use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use deskline_api::identity::{SessionKeys, hash_password};
use deskline_api::messaging::{GatewayError, MessageReceipt, MessagingGateway};
use deskline_api::{AppStateInner, router};
use deskline_db::Database;
use deskline_db::models::NewUser;
use deskline_types::models::{Capability, Role};

const ADMIN_EMAIL: &str = "admin@desk.test";
const ADMIN_PASSWORD: &str = "admin-password";

#[derive(Default)]
struct RecordingGateway {
    sent: Mutex<Vec<(String, String, Vec<String>)>>,
}

#[async_trait]
impl MessagingGateway for RecordingGateway {
    async fn send_template_message(
        &self,
        recipient: &str,
        template: &str,
        parameters: &[String],
    ) -> Result<MessageReceipt, GatewayError> {
        self.sent.lock().unwrap().push((
            recipient.to_string(),
            template.to_string(),
            parameters.to_vec(),
        ));
        Ok(MessageReceipt {
            message_id: "wamid.test".into(),
        })
    }
}

struct Harness {
    app: Router,
    gateway: Arc<RecordingGateway>,
}

impl Harness {
    fn new() -> Self {
        let db = Database::open_in_memory().unwrap();
        db.seed_defaults().unwrap();
        db.ensure_admin(&NewUser {
            email: ADMIN_EMAIL.into(),
            name: "Admin".into(),
            phone: None,
            password_hash: hash_password(ADMIN_PASSWORD).unwrap(),
            role: Role::Admin,
            capabilities: [Capability::Tickets, Capability::Answers].into_iter().collect(),
        })
        .unwrap();

        let gateway = Arc::new(RecordingGateway::default());
        let state = Arc::new(AppStateInner {
            db,
            keys: SessionKeys::new("integration-secret", chrono::Duration::hours(1)),
            gateway: gateway.clone(),
            otp_template: "otp_code".into(),
        });
        Self {
            app: router(state, Duration::from_secs(5)),
            gateway,
        }
    }

    async fn call(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(body) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let resp = self.app.clone().oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn login(&self, email: &str, password: &str) -> String {
        let (status, body) = self
            .call(
                "POST",
                "/auth/login",
                None,
                Some(json!({ "email": email, "password": password })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["data"]["session"]["token"].as_str().unwrap().to_string()
    }

    async fn admin(&self) -> String {
        self.login(ADMIN_EMAIL, ADMIN_PASSWORD).await
    }

    async fn create_user(&self, admin: &str, email: &str, role: &str, extra: Value) -> String {
        let mut body = json!({
            "email": email,
            "name": email,
            "password": "password123",
            "role": role,
        });
        if let (Some(obj), Some(extra)) = (body.as_object_mut(), extra.as_object()) {
            obj.extend(extra.clone());
        }
        let (status, body) = self.call("POST", "/users", Some(admin), Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["data"]["user"]["id"].as_str().unwrap().to_string()
    }
}

#[tokio::test]
async fn health_is_public() {
    let h = Harness::new();
    let (status, body) = h.call("GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
}

#[tokio::test]
async fn missing_or_bad_tokens_are_unauthorized() {
    let h = Harness::new();
    let (status, body) = h.call("GET", "/teams", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "fail");

    let (status, _) = h.call("GET", "/teams", Some("not-a-jwt"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn a_second_login_invalidates_the_first_token() {
    let h = Harness::new();
    let first = h.admin().await;
    let (status, _) = h.call("GET", "/auth/me", Some(&first), None).await;
    assert_eq!(status, StatusCode::OK);

    let second = h.admin().await;
    let (status, _) = h.call("GET", "/auth/me", Some(&first), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = h.call("GET", "/auth/me", Some(&second), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["user"]["email"], ADMIN_EMAIL);

    let (status, _) = h.call("POST", "/auth/logout", Some(&second), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = h.call("GET", "/auth/me", Some(&second), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn otp_login_works_once() {
    let h = Harness::new();
    let admin = h.admin().await;
    h.create_user(&admin, "ana@desk.test", "user", json!({ "phone": "+34 600 111 222" }))
        .await;

    let (status, _) = h
        .call("POST", "/auth/otp", None, Some(json!({ "email": "ana@desk.test" })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let code = {
        let sent = h.gateway.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "+34 600 111 222");
        assert_eq!(sent[0].1, "otp_code");
        sent[0].2[0].clone()
    };

    let verify = json!({ "email": "ana@desk.test", "code": code });
    let (status, body) = h.call("POST", "/auth/otp/verify", None, Some(verify.clone())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert!(body["data"]["session"]["token"].is_string());

    let (status, body) = h.call("POST", "/auth/otp/verify", None, Some(verify)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["status"], "fail");
}

#[tokio::test]
async fn unknown_email_gets_the_same_otp_answer() {
    let h = Harness::new();
    let (status, body) = h
        .call("POST", "/auth/otp", None, Some(json!({ "email": "ghost@desk.test" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert!(h.gateway.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn password_reset_makes_old_tokens_forbidden() {
    let h = Harness::new();
    let admin = h.admin().await;
    let id = h.create_user(&admin, "bo@desk.test", "user", json!({})).await;
    let token = h.login("bo@desk.test", "password123").await;
    tokio::time::sleep(Duration::from_millis(5)).await;

    let (status, _) = h
        .call(
            "PUT",
            &format!("/users/{id}/password"),
            Some(&admin),
            Some(json!({ "new_password": "new-password" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = h.call("GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    h.login("bo@desk.test", "new-password").await;
}

#[tokio::test]
async fn deleted_accounts_are_forbidden() {
    let h = Harness::new();
    let admin = h.admin().await;
    let id = h.create_user(&admin, "cy@desk.test", "user", json!({})).await;
    let token = h.login("cy@desk.test", "password123").await;

    let (status, _) = h.call("DELETE", &format!("/users/{id}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = h.call("GET", "/auth/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = h
        .call(
            "POST",
            "/auth/login",
            None,
            Some(json!({ "email": "cy@desk.test", "password": "password123" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = h.call("GET", &format!("/users/{id}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn guard_refuses_before_any_side_effect() {
    let h = Harness::new();
    let admin = h.admin().await;
    h.create_user(&admin, "dee@desk.test", "user", json!({})).await;
    let agent = h.login("dee@desk.test", "password123").await;

    let (status, _) = h
        .call("POST", "/teams", Some(&agent), Some(json!({ "name": "Rogue" })))
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (_, body) = h.call("GET", "/teams", Some(&agent), None).await;
    assert!(
        body["data"]["teams"]
            .as_array()
            .unwrap()
            .iter()
            .all(|t| t["name"] != "Rogue")
    );

    let (status, _) = h.call("GET", "/tickets", Some(&agent), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_request_fields_are_rejected() {
    let h = Harness::new();
    let admin = h.admin().await;
    let (status, body) = h
        .call(
            "POST",
            "/teams",
            Some(&admin),
            Some(json!({ "name": "Sales", "default": true })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");
}

#[tokio::test]
async fn supervisor_cannot_lead_two_teams() {
    let h = Harness::new();
    let admin = h.admin().await;
    let u1 = h.create_user(&admin, "u1@desk.test", "supervisor", json!({})).await;

    let (status, body) = h
        .call(
            "POST",
            "/teams",
            Some(&admin),
            Some(json!({ "name": "A", "supervisor_id": u1, "users": [u1] })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["data"]["team"]["supervisor_id"], u1.as_str());

    let (status, _) = h
        .call(
            "POST",
            "/teams",
            Some(&admin),
            Some(json!({ "name": "B", "supervisor_id": u1 })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, body) = h.call("GET", "/teams", Some(&admin), None).await;
    let names: Vec<_> = body["data"]["teams"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap().to_string())
        .collect();
    assert!(names.contains(&"A".to_string()));
    assert!(!names.contains(&"B".to_string()));

    let (_, body) = h.call("GET", &format!("/users/{u1}"), Some(&admin), None).await;
    assert_eq!(body["data"]["user"]["supervisor"], true);
}

#[tokio::test]
async fn supervisors_cannot_move_other_supervisors_or_admins() {
    let h = Harness::new();
    let admin = h.admin().await;
    let s1 = h.create_user(&admin, "s1@desk.test", "supervisor", json!({})).await;
    let s2 = h.create_user(&admin, "s2@desk.test", "supervisor", json!({})).await;
    let agent = h.create_user(&admin, "agent@desk.test", "user", json!({})).await;

    let (status, body) = h
        .call(
            "POST",
            "/teams",
            Some(&admin),
            Some(json!({ "name": "A", "supervisor_id": s1 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let a = body["data"]["team"]["id"].as_str().unwrap().to_string();
    let (status, body) = h
        .call(
            "POST",
            "/teams",
            Some(&admin),
            Some(json!({ "name": "B", "supervisor_id": s2 })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let b = body["data"]["team"]["id"].as_str().unwrap().to_string();

    let (_, body) = h.call("GET", "/auth/me", Some(&admin), None).await;
    let admin_id = body["data"]["user"]["id"].as_str().unwrap().to_string();

    let s2_token = h.login("s2@desk.test", "password123").await;
    let (status, _) = h
        .call(
            "PUT",
            &format!("/users/{s1}/team"),
            Some(&s2_token),
            Some(json!({ "team_id": null })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = h
        .call(
            "PUT",
            &format!("/users/{admin_id}/team"),
            Some(&s2_token),
            Some(json!({ "team_id": a })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, body) = h.call("GET", &format!("/teams/{a}"), Some(&admin), None).await;
    assert_eq!(body["data"]["team"]["supervisor_id"], s1.as_str());
    let roster: Vec<_> = body["data"]["team"]["users"]
        .as_array()
        .unwrap()
        .iter()
        .map(|u| u["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(roster, vec![s1.clone()]);

    // A plain member with no team may join the supervisor's own team.
    let (status, body) = h
        .call(
            "PUT",
            &format!("/users/{agent}/team"),
            Some(&s2_token),
            Some(json!({ "team_id": b })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["user"]["team_id"], b.as_str());
}

#[tokio::test]
async fn default_team_cannot_be_deleted() {
    let h = Harness::new();
    let admin = h.admin().await;
    let (_, body) = h.call("GET", "/teams", Some(&admin), None).await;
    let teams = body["data"]["teams"].as_array().unwrap().clone();
    let default: Vec<_> = teams.iter().filter(|t| t["default"] == true).collect();
    assert_eq!(default.len(), 1);
    let id = default[0]["id"].as_str().unwrap();

    let (status, _) = h.call("DELETE", &format!("/teams/{id}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = h.call("GET", &format!("/teams/{id}"), Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["team"]["default"], true);
    assert!(body["data"]["team"]["users"].is_array());
}

#[tokio::test]
async fn public_answer_set_must_be_empty_to_delete() {
    let h = Harness::new();
    let admin = h.admin().await;

    let (status, body) = h
        .call(
            "POST",
            "/answer-sets",
            Some(&admin),
            Some(json!({ "name": "Greetings", "visibility": "public" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let set = body["data"]["answer_set"]["id"].as_str().unwrap().to_string();

    let mut answers = Vec::new();
    for (name, text) in [("hi", "Hello!"), ("bye", "Goodbye!")] {
        let (status, body) = h
            .call(
                "POST",
                &format!("/answer-sets/{set}/answers"),
                Some(&admin),
                Some(json!({ "name": name, "body": text })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        answers.push(body["data"]["answer"]["id"].as_str().unwrap().to_string());
    }

    let (status, _) = h
        .call("DELETE", &format!("/answer-sets/{set}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    for id in &answers {
        let (status, _) = h.call("DELETE", &format!("/answers/{id}"), Some(&admin), None).await;
        assert_eq!(status, StatusCode::OK);
    }
    let (status, _) = h
        .call("DELETE", &format!("/answer-sets/{set}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = h
        .call("GET", &format!("/answer-sets/{set}"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn second_private_answer_set_conflicts() {
    let h = Harness::new();
    let admin = h.admin().await;
    h.create_user(&admin, "u2@desk.test", "user", json!({ "capabilities": ["answers"] }))
        .await;
    let u2 = h.login("u2@desk.test", "password123").await;

    let body = json!({ "name": "Mine", "visibility": "private" });
    let (status, _) = h.call("POST", "/answer-sets", Some(&u2), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED);

    let body = json!({ "name": "Mine again", "visibility": "private" });
    let (status, _) = h.call("POST", "/answer-sets", Some(&u2), Some(body)).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn solved_status_cannot_be_default() {
    let h = Harness::new();
    let admin = h.admin().await;
    let (_, body) = h.call("GET", "/ticket-statuses", Some(&admin), None).await;
    let solved = body["data"]["statuses"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["name"] == "Solved")
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let (status, _) = h
        .call("PUT", &format!("/ticket-statuses/{solved}/default"), Some(&admin), None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn tickets_start_in_the_default_status() {
    let h = Harness::new();
    let admin = h.admin().await;

    let (status, body) = h
        .call(
            "POST",
            "/tickets",
            Some(&admin),
            Some(json!({ "subject": "Printer jammed" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let ticket = body["data"]["ticket"].clone();

    let (_, statuses) = h.call("GET", "/ticket-statuses", Some(&admin), None).await;
    let open = statuses["data"]["statuses"]
        .as_array()
        .unwrap()
        .iter()
        .find(|s| s["default"] == true)
        .unwrap()["id"]
        .clone();
    assert_eq!(ticket["status_id"], open);

    let id = ticket["id"].as_str().unwrap();
    let (status, body) = h
        .call(
            "POST",
            &format!("/tickets/{id}/comments"),
            Some(&admin),
            Some(json!({ "body": "Tried turning it off and on." })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let (_, body) = h
        .call("GET", &format!("/tickets/{id}/comments"), Some(&admin), None)
        .await;
    assert_eq!(body["data"]["comments"].as_array().unwrap().len(), 1);
}
