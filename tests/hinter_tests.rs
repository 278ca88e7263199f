// tests/hinter_tests.rs

use crowd_hinter::{config::Config, routes, state::AppState, utils::hash::hash_password};
use serde_json::json;
use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

const BLOCK_NAME: &str = "crowdsource_hinter";

/// Helper function to spawn the app on a random port for testing.
/// Each test gets its own in-memory SQLite database, so tests are isolated
/// and need no external services.
async fn spawn_app() -> (String, SqlitePool) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite for testing");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        staff_username: None,
        staff_password: None,
    };

    let state = AppState {
        pool: pool.clone(),
        config,
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, pool)
}

async fn seed_staff(pool: &SqlitePool, username: &str, password: &str) {
    let hashed = hash_password(password).expect("Failed to hash staff password");
    sqlx::query("INSERT INTO users (username, password, role) VALUES (?, ?, 'staff')")
        .bind(username)
        .bind(&hashed)
        .execute(pool)
        .await
        .expect("Failed to seed staff user");
}

async fn login(client: &reqwest::Client, address: &str, username: &str, password: &str) -> String {
    let resp = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Login failed")
        .json::<serde_json::Value>()
        .await
        .expect("Failed to parse login json");

    resp["token"].as_str().expect("Token not found").to_string()
}

async fn register_and_login(client: &reqwest::Client, address: &str, username: &str) -> String {
    let password = "password123";
    let resp = client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Register failed");
    assert_eq!(resp.status().as_u16(), 201);

    login(client, address, username, password).await
}

/// Test context: a course with one hinter block, a seeded staff account and
/// one enrolled student.
struct TestContext {
    address: String,
    client: reqwest::Client,
    course_id: i64,
    student_token: String,
    staff_token: String,
}

async fn setup_course_with_student() -> TestContext {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    seed_staff(&pool, "staff_user", "staffpass").await;
    let staff_token = login(&client, &address, "staff_user", "staffpass").await;

    let resp = client
        .post(format!("{}/api/courses", address))
        .bearer_auth(&staff_token)
        .json(&json!({ "display_name": "Crowdsource Hinter Test Course" }))
        .send()
        .await
        .expect("Failed to create course");
    assert_eq!(resp.status().as_u16(), 201);
    let course_id = resp.json::<serde_json::Value>().await.unwrap()["id"]
        .as_i64()
        .expect("Course id not found");

    let resp = client
        .post(format!("{}/api/courses/{}/blocks", address, course_id))
        .bearer_auth(&staff_token)
        .json(&json!({ "name": BLOCK_NAME }))
        .send()
        .await
        .expect("Failed to create hinter block");
    assert_eq!(resp.status().as_u16(), 201);

    let username = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let student_token = register_and_login(&client, &address, &username).await;

    let resp = client
        .post(format!("{}/api/courses/{}/enroll", address, course_id))
        .bearer_auth(&student_token)
        .send()
        .await
        .expect("Failed to enroll student");
    assert_eq!(resp.status().as_u16(), 200);

    TestContext {
        address,
        client,
        course_id,
        student_token,
        staff_token,
    }
}

impl TestContext {
    /// Call a hinter ajax event (get_hint, rate_hint, etc.) as the student
    /// and return the parsed JSON response.
    async fn call_event(&self, handler: &str, body: serde_json::Value) -> serde_json::Value {
        let resp = self
            .client
            .post(format!(
                "{}/api/courses/{}/hinter/{}/{}",
                self.address, self.course_id, BLOCK_NAME, handler
            ))
            .bearer_auth(&self.student_token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute event request");

        assert!(
            resp.status().is_success(),
            "event '{}' failed with status {}",
            handler,
            resp.status()
        );

        resp.json().await.expect("Failed to parse event json")
    }

    /// The course page must stay reachable after every hinter event.
    async fn assert_course_page_ok(&self) {
        let resp = self
            .client
            .get(format!("{}/api/courses/{}", self.address, self.course_id))
            .send()
            .await
            .expect("Failed to fetch course page");
        assert_eq!(resp.status().as_u16(), 200);
    }

    async fn add_hint(&self, answer: &str, text: &str) {
        self.call_event(
            "add_new_hint",
            json!({ "new_hint_submission": text, "answer": answer }),
        )
        .await;
    }
}

#[tokio::test]
async fn get_hint_with_no_hints_returns_sentinel() {
    let ctx = setup_course_with_student().await;

    let result = ctx
        .call_event("get_hint", json!({ "submittedanswer": "ans=incorrect+answer+1" }))
        .await;

    assert_eq!(
        result,
        json!({
            "BestHint": "Sorry, there are no hints for this answer.",
            "StudentAnswer": "incorrect answer 1",
            "HintCategory": false
        })
    );
    ctx.assert_course_page_ok().await;
}

#[tokio::test]
async fn add_new_hint_returns_created() {
    let ctx = setup_course_with_student().await;

    let resp = ctx
        .client
        .post(format!(
            "{}/api/courses/{}/hinter/{}/add_new_hint",
            ctx.address, ctx.course_id, BLOCK_NAME
        ))
        .bearer_auth(&ctx.student_token)
        .json(&json!({
            "new_hint_submission": "new hint for answer 1",
            "answer": "incorrect answer 1"
        }))
        .send()
        .await
        .expect("Failed to add hint");

    assert_eq!(resp.status().as_u16(), 201);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["id"].as_i64().is_some());
    ctx.assert_course_page_ok().await;
}

#[tokio::test]
async fn get_hint_returns_submitted_hint() {
    let ctx = setup_course_with_student().await;

    ctx.call_event("get_hint", json!({ "submittedanswer": "ans=incorrect+answer+1" }))
        .await;
    ctx.add_hint("incorrect answer 1", "new hint for answer 1").await;

    let result = ctx
        .call_event("get_hint", json!({ "submittedanswer": "ans=incorrect+answer+1" }))
        .await;

    assert_eq!(
        result,
        json!({
            "BestHint": "new hint for answer 1",
            "StudentAnswer": "incorrect answer 1",
            "HintCategory": "ErrorResponse"
        })
    );
    ctx.assert_course_page_ok().await;
}

#[tokio::test]
async fn rate_hint_upvote_succeeds() {
    let ctx = setup_course_with_student().await;
    ctx.add_hint("incorrect answer 1", "new hint for answer 1").await;

    let result = ctx
        .call_event(
            "rate_hint",
            json!({
                "student_answer": "incorrect answer 1",
                "hint": "new hint for answer 1",
                "student_rating": "upvote"
            }),
        )
        .await;

    assert_eq!(result, json!({ "success": true }));
    ctx.assert_course_page_ok().await;
}

#[tokio::test]
async fn rate_hint_downvote_succeeds() {
    let ctx = setup_course_with_student().await;
    ctx.add_hint("incorrect answer 1", "new hint for answer 1").await;

    let result = ctx
        .call_event(
            "rate_hint",
            json!({
                "student_answer": "incorrect answer 1",
                "hint": "new hint for answer 1",
                "student_rating": "downvote"
            }),
        )
        .await;

    assert_eq!(result, json!({ "success": true }));
}

#[tokio::test]
async fn report_hint_returns_reported() {
    let ctx = setup_course_with_student().await;
    ctx.add_hint("incorrect answer 1", "new hint for answer 1").await;

    let result = ctx
        .call_event(
            "rate_hint",
            json!({
                "student_answer": "incorrect answer 1",
                "hint": "new hint for answer 1",
                "student_rating": "report"
            }),
        )
        .await;

    assert_eq!(
        result,
        json!({ "rating": "reported", "hint": "new hint for answer 1" })
    );
}

#[tokio::test]
async fn rate_hint_with_unknown_rating_fails() {
    let ctx = setup_course_with_student().await;
    ctx.add_hint("incorrect answer 1", "new hint for answer 1").await;

    let resp = ctx
        .client
        .post(format!(
            "{}/api/courses/{}/hinter/{}/rate_hint",
            ctx.address, ctx.course_id, BLOCK_NAME
        ))
        .bearer_auth(&ctx.student_token)
        .json(&json!({
            "student_answer": "incorrect answer 1",
            "hint": "new hint for answer 1",
            "student_rating": "sideways"
        }))
        .send()
        .await
        .expect("Failed to rate hint");

    assert_eq!(resp.status().as_u16(), 400);
}

#[tokio::test]
async fn reported_hint_is_not_shown() {
    let ctx = setup_course_with_student().await;

    ctx.add_hint("incorrect answer 1", "new hint for answer 1").await;
    ctx.call_event(
        "rate_hint",
        json!({
            "student_answer": "incorrect answer 1",
            "hint": "new hint for answer 1",
            "student_rating": "report"
        }),
    )
    .await;

    let result = ctx
        .call_event("get_hint", json!({ "submittedanswer": "ans=incorrect+answer+1" }))
        .await;

    assert_eq!(
        result,
        json!({
            "BestHint": "Sorry, there are no hints for this answer.",
            "StudentAnswer": "incorrect answer 1",
            "HintCategory": false
        })
    );
}

#[tokio::test]
async fn get_used_hint_answer_data_returns_and_resets() {
    let ctx = setup_course_with_student().await;

    // A sentinel response must not be recorded as a used hint.
    ctx.call_event("get_hint", json!({ "submittedanswer": "ans=incorrect+answer+1" }))
        .await;
    let empty = ctx.call_event("get_used_hint_answer_data", json!({})).await;
    assert_eq!(empty, json!({}));

    ctx.add_hint("incorrect answer 1", "new hint for answer 1").await;
    ctx.call_event("get_hint", json!({ "submittedanswer": "ans=incorrect+answer+1" }))
        .await;

    let result = ctx.call_event("get_used_hint_answer_data", json!({})).await;
    assert_eq!(result, json!({ "new hint for answer 1": "incorrect answer 1" }));

    // The record is cleared once read.
    let again = ctx.call_event("get_used_hint_answer_data", json!({})).await;
    assert_eq!(again, json!({}));
}

#[tokio::test]
async fn shows_best_hint() {
    let ctx = setup_course_with_student().await;

    ctx.add_hint("incorrect answer 1", "new hint for answer 1").await;
    ctx.add_hint("incorrect answer 1", "new hint for answer 1 to report").await;

    ctx.call_event(
        "rate_hint",
        json!({
            "student_answer": "incorrect answer 1",
            "hint": "new hint for answer 1 to report",
            "student_rating": "upvote"
        }),
    )
    .await;
    ctx.call_event(
        "rate_hint",
        json!({
            "student_answer": "incorrect answer 1",
            "hint": "new hint for answer 1 to report",
            "student_rating": "report"
        }),
    )
    .await;

    // The reported hint outranks on votes but is excluded; the remaining
    // hint wins.
    let result = ctx
        .call_event("get_hint", json!({ "submittedanswer": "ans=incorrect+answer+1" }))
        .await;

    assert_eq!(
        result,
        json!({
            "BestHint": "new hint for answer 1",
            "StudentAnswer": "incorrect answer 1",
            "HintCategory": "ErrorResponse"
        })
    );
}

#[tokio::test]
async fn resubmitting_a_hint_upvotes_it() {
    let ctx = setup_course_with_student().await;

    ctx.add_hint("incorrect answer 1", "first hint").await;
    ctx.add_hint("incorrect answer 1", "second hint").await;
    // Same text again: endorses the existing hint instead of duplicating.
    ctx.add_hint("incorrect answer 1", "second hint").await;

    let result = ctx
        .call_event("get_hint", json!({ "submittedanswer": "ans=incorrect+answer+1" }))
        .await;

    assert_eq!(result["BestHint"], "second hint");
}

#[tokio::test]
async fn staff_tally_lists_all_hints_per_answer() {
    let ctx = setup_course_with_student().await;

    ctx.add_hint("incorrect answer 1", "good hint").await;
    ctx.add_hint("incorrect answer 1", "bad hint").await;
    ctx.call_event(
        "rate_hint",
        json!({
            "student_answer": "incorrect answer 1",
            "hint": "good hint",
            "student_rating": "upvote"
        }),
    )
    .await;
    ctx.call_event(
        "rate_hint",
        json!({
            "student_answer": "incorrect answer 1",
            "hint": "bad hint",
            "student_rating": "report"
        }),
    )
    .await;

    let resp = ctx
        .client
        .get(format!(
            "{}/api/courses/{}/hinter/{}/hints",
            ctx.address, ctx.course_id, BLOCK_NAME
        ))
        .bearer_auth(&ctx.staff_token)
        .send()
        .await
        .expect("Failed to fetch tally");

    assert_eq!(resp.status().as_u16(), 200);
    let tally: serde_json::Value = resp.json().await.unwrap();

    assert_eq!(
        tally,
        json!([
            {
                "answer": "incorrect answer 1",
                "hints": [
                    { "text": "good hint", "rating": 1, "reported": false },
                    { "text": "bad hint", "rating": 0, "reported": true }
                ]
            }
        ])
    );
}

#[tokio::test]
async fn staff_tally_rejects_students() {
    let ctx = setup_course_with_student().await;

    let resp = ctx
        .client
        .get(format!(
            "{}/api/courses/{}/hinter/{}/hints",
            ctx.address, ctx.course_id, BLOCK_NAME
        ))
        .bearer_auth(&ctx.student_token)
        .send()
        .await
        .expect("Failed to fetch tally");

    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn unreport_restores_hint() {
    let ctx = setup_course_with_student().await;

    ctx.add_hint("incorrect answer 1", "new hint for answer 1").await;
    ctx.call_event(
        "rate_hint",
        json!({
            "student_answer": "incorrect answer 1",
            "hint": "new hint for answer 1",
            "student_rating": "report"
        }),
    )
    .await;

    let hidden = ctx
        .call_event("get_hint", json!({ "submittedanswer": "ans=incorrect+answer+1" }))
        .await;
    assert_eq!(hidden["HintCategory"], json!(false));

    let resp = ctx
        .client
        .post(format!(
            "{}/api/courses/{}/hinter/{}/unreport_hint",
            ctx.address, ctx.course_id, BLOCK_NAME
        ))
        .bearer_auth(&ctx.staff_token)
        .json(&json!({ "answer": "incorrect answer 1", "hint": "new hint for answer 1" }))
        .send()
        .await
        .expect("Failed to unreport hint");
    assert_eq!(resp.status().as_u16(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "success": true }));

    let restored = ctx
        .call_event("get_hint", json!({ "submittedanswer": "ans=incorrect+answer+1" }))
        .await;
    assert_eq!(restored["BestHint"], "new hint for answer 1");
    assert_eq!(restored["HintCategory"], "ErrorResponse");
}

#[tokio::test]
async fn hinter_requires_authentication() {
    let ctx = setup_course_with_student().await;

    let resp = ctx
        .client
        .post(format!(
            "{}/api/courses/{}/hinter/{}/get_hint",
            ctx.address, ctx.course_id, BLOCK_NAME
        ))
        .json(&json!({ "submittedanswer": "ans=incorrect+answer+1" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(resp.status().as_u16(), 401);
}

#[tokio::test]
async fn hinter_requires_enrollment() {
    let ctx = setup_course_with_student().await;

    // A logged-in user who never enrolled.
    let outsider = format!("o_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let outsider_token = register_and_login(&ctx.client, &ctx.address, &outsider).await;

    let resp = ctx
        .client
        .post(format!(
            "{}/api/courses/{}/hinter/{}/get_hint",
            ctx.address, ctx.course_id, BLOCK_NAME
        ))
        .bearer_auth(&outsider_token)
        .json(&json!({ "submittedanswer": "ans=incorrect+answer+1" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(resp.status().as_u16(), 403);
}

#[tokio::test]
async fn unknown_block_returns_404() {
    let ctx = setup_course_with_student().await;

    let resp = ctx
        .client
        .post(format!(
            "{}/api/courses/{}/hinter/no_such_block/get_hint",
            ctx.address, ctx.course_id
        ))
        .bearer_auth(&ctx.student_token)
        .json(&json!({ "submittedanswer": "ans=incorrect+answer+1" }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(resp.status().as_u16(), 404);
}

#[tokio::test]
async fn hint_text_is_sanitized() {
    let ctx = setup_course_with_student().await;

    ctx.add_hint(
        "incorrect answer 1",
        "check the sign <script>alert('xss')</script>",
    )
    .await;

    let result = ctx
        .call_event("get_hint", json!({ "submittedanswer": "ans=incorrect+answer+1" }))
        .await;

    let shown = result["BestHint"].as_str().unwrap();
    assert!(!shown.contains("<script>"));
    assert!(shown.contains("check the sign"));
}
