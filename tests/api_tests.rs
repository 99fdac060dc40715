// tests/api_tests.rs

use std::sync::Arc;
use std::time::Duration;

use academy::{
    catalog::Catalog,
    config::Config,
    error::AppError,
    models::tutor::{TutorQuestion, TutorReply},
    routes,
    sandbox::{Sandbox, SandboxConfig},
    state::AppState,
    store::{SharedStore, SqliteStore},
    tutor::TutorClient,
};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde_json::{Value, json};
use sqlx::sqlite::SqlitePoolOptions;

const SECRET: &str = "test_secret_for_integration_tests";

struct EchoTutor;

#[async_trait::async_trait]
impl TutorClient for EchoTutor {
    async fn ask(&self, question: &TutorQuestion) -> Result<TutorReply, AppError> {
        Ok(TutorReply {
            answer: format!("You asked: {}", question.question),
            response_type: "explanation".to_string(),
        })
    }
}

/// Helper function to spawn the app on a random port for testing.
/// Returns the base URL (e.g., "http://127.0.0.1:12345").
async fn spawn_app_with(tutor: Option<Arc<dyn TutorClient>>) -> String {
    spawn_app_configured(tutor, 2).await
}

async fn spawn_app_configured(
    tutor: Option<Arc<dyn TutorClient>>,
    sandbox_max_concurrency: usize,
) -> String {
    // 1. Create an in-memory database; one connection keeps it alive.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    // 2. Run migrations
    let store: SharedStore = Arc::new(SqliteStore::new(pool).await.expect("Failed to migrate database"));

    // 3. Create test configuration and state
    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: SECRET.to_string(),
        rust_log: "error".to_string(),
        catalog_path: concat!(env!("CARGO_MANIFEST_DIR"), "/catalog.json").to_string(),
        port: 0,
        sandbox: SandboxConfig {
            timeout: Duration::from_millis(2_000),
            loop_iteration_limit: 100_000,
            recursion_limit: 256,
            max_code_bytes: 16 * 1024,
            max_output_chars: 64 * 1024,
        },
        sandbox_max_concurrency,
        tutor_url: None,
    };

    let catalog = Catalog::load(&config.catalog_path).expect("Failed to load catalog");
    // Sandbox runs re-execute the server binary in worker mode.
    let sandbox = Sandbox::new(config.sandbox.clone(), env!("CARGO_BIN_EXE_academy"));
    let state = AppState::new(config, store, catalog, sandbox, tutor);

    // 4. Create the router with the app state
    let app = routes::create_router(state);

    // 5. Bind to port 0 to get a random available port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    // 6. Spawn the server in the background
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    address
}

async fn spawn_app() -> String {
    spawn_app_with(None).await
}

fn token_for(sub: &str, role: &str) -> String {
    let exp = chrono::Utc::now().timestamp() + 600;
    encode(
        &Header::default(),
        &json!({ "sub": sub, "role": role, "exp": exp }),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .expect("Failed to sign token")
}

fn new_student() -> String {
    format!("s_{}", &uuid::Uuid::new_v4().to_string()[..8])
}

#[tokio::test]
async fn health_check_404() {
    // Arrange
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    // Act
    let response = client
        .get(&format!("{}/random_path_that_does_not_exist", address))
        .send()
        .await
        .expect("Failed to execute request");

    // Assert
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn catalog_is_public() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let courses: Vec<Value> = client
        .get(&format!("{}/api/courses", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(courses.len(), 2);
    assert_eq!(courses[0]["lesson_count"], 3);

    let missing = client
        .get(&format!("{}/api/courses/does-not-exist", address))
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);

    // The answer key never leaves the server.
    let test: Value = client
        .get(&format!("{}/api/tests/js-final", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(test["questions"].as_array().unwrap().len(), 5);
    assert!(test["questions"][0].get("correct_option_id").is_none());
}

#[tokio::test]
async fn protected_routes_require_token() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(&format!("{}/api/sandbox/execute", address))
        .json(&json!({ "code": "console.log(1)" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let response = client
        .get(&format!("{}/api/courses/js-fundamentals/progress", address))
        .header("Authorization", "Bearer not-a-token")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn sandbox_reports_results_as_data() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = token_for(&new_student(), "student");

    let ok: Value = client
        .post(&format!("{}/api/sandbox/execute", address))
        .bearer_auth(&token)
        .json(&json!({ "code": "console.log(1+1)" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ok["success"], true);
    assert_eq!(ok["output"], "2");
    assert!(ok["error"].is_null());

    let failed = client
        .post(&format!("{}/api/sandbox/execute", address))
        .bearer_auth(&token)
        .json(&json!({ "code": "foo()" }))
        .send()
        .await
        .unwrap();
    // A faulty script is still a successful request.
    assert_eq!(failed.status().as_u16(), 200);
    let failed: Value = failed.json().await.unwrap();
    assert_eq!(failed["success"], false);
    assert!(failed["error"].as_str().unwrap().contains("foo is not defined"));
}

#[tokio::test]
async fn lab_run_completes_on_matching_output() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = token_for(&new_student(), "student");
    let run_url = format!("{}/api/labs/sum-two-numbers/run", address);

    // 1. Wrong answer: saved as draft, not completed
    let wrong: Value = client
        .post(&run_url)
        .bearer_auth(&token)
        .json(&json!({ "code": "function add(a, b) { return a - b; }\nconsole.log(add(2, 3));" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(wrong["result"]["output"], "-1");
    assert_eq!(wrong["output_matches"], false);
    assert_eq!(wrong["progress"]["completed"], false);
    assert!(wrong["progress"]["completed_at"].is_null());

    // 2. Correct answer with trailing blank lines: completed
    let right: Value = client
        .post(&run_url)
        .bearer_auth(&token)
        .json(&json!({ "code": "function add(a, b) { return a + b; }\nconsole.log(add(2, 3)); console.log('');" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(right["output_matches"], true);
    assert_eq!(right["progress"]["completed"], true);
    assert!(right["progress"]["completed_at"].is_string());

    // 3. A later draft keeps completion
    let draft: Value = client
        .put(&format!("{}/api/labs/sum-two-numbers/draft", address))
        .bearer_auth(&token)
        .json(&json!({ "code": "// experimenting" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(draft["completed"], true);
    assert_eq!(draft["user_code"], "// experimenting");

    let progress: Value = client
        .get(&format!("{}/api/labs/sum-two-numbers/progress", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(progress, draft);
}

#[tokio::test]
async fn test_attempt_is_single_shot() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = token_for(&new_student(), "student");
    let attempt_url = format!("{}/api/tests/js-final/attempt", address);

    // No attempt yet
    let none = client.get(&attempt_url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(none.status().as_u16(), 404);

    // 3 of 5 correct at a 60% threshold
    let answers = json!({ "answers": [
        { "question_id": "q1", "selected_option_id": "b" },
        { "question_id": "q2", "selected_option_id": "b" },
        { "question_id": "q3", "selected_option_id": "b" },
        { "question_id": "q4", "selected_option_id": "b" },
        { "question_id": "q5", "selected_option_id": "a" }
    ]});
    let first = client
        .post(&attempt_url)
        .bearer_auth(&token)
        .json(&answers)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 201);
    let first: Value = first.json().await.unwrap();
    assert_eq!(first["score_percentage"], 60);
    assert_eq!(first["correct_count"], 3);
    assert_eq!(first["passed"], true);

    // Retake is rejected even with perfect answers
    let perfect = json!({ "answers": [
        { "question_id": "q1", "selected_option_id": "b" },
        { "question_id": "q2", "selected_option_id": "b" },
        { "question_id": "q3", "selected_option_id": "b" },
        { "question_id": "q4", "selected_option_id": "a" },
        { "question_id": "q5", "selected_option_id": "b" }
    ]});
    let second = client
        .post(&attempt_url)
        .bearer_auth(&token)
        .json(&perfect)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 409);
    let body: Value = second.json().await.unwrap();
    assert_eq!(body["error"], "You have already completed this test.");

    // The stored attempt is still the first one
    let stored: Value = client
        .get(&attempt_url)
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored, first);
}

#[tokio::test]
async fn eligibility_follows_progress() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = token_for(&new_student(), "student");
    let eligibility_url = format!("{}/api/courses/js-fundamentals/eligibility", address);

    let fetch = |url: String| {
        let client = client.clone();
        let token = token.clone();
        async move {
            client
                .get(&url)
                .bearer_auth(&token)
                .send()
                .await
                .unwrap()
                .json::<Value>()
                .await
                .unwrap()
        }
    };

    // 1. Nothing done yet
    let initial = fetch(eligibility_url.clone()).await;
    assert_eq!(initial["eligible"], false);
    assert_eq!(initial["test_passed"], false);
    assert_eq!(initial["project_submitted"], false);
    assert_eq!(initial["stage"], "not_started");

    // 2. Complete all lessons (repeating one is harmless)
    for lesson in ["variables", "functions", "arrays", "arrays"] {
        let response = client
            .put(&format!(
                "{}/api/courses/js-fundamentals/lessons/{}/completion",
                address, lesson
            ))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }
    let lessons_done = fetch(eligibility_url.clone()).await;
    assert_eq!(lessons_done["completed_lessons"], 3);
    assert_eq!(lessons_done["lessons_complete"], true);
    assert_eq!(lessons_done["stage"], "lessons_done");

    // 3. Pass the test
    let attempt = client
        .post(&format!("{}/api/tests/js-final/attempt", address))
        .bearer_auth(&token)
        .json(&json!({ "answers": [
            { "question_id": "q1", "selected_option_id": "b" },
            { "question_id": "q2", "selected_option_id": "b" },
            { "question_id": "q3", "selected_option_id": "b" },
            { "question_id": "q4", "selected_option_id": "a" },
            { "question_id": "q5", "selected_option_id": "b" }
        ]}))
        .send()
        .await
        .unwrap();
    assert_eq!(attempt.status().as_u16(), 201);
    assert_eq!(fetch(eligibility_url.clone()).await["test_passed"], true);

    // 4. Submit the project
    let project = client
        .post(&format!("{}/api/projects/todo-app/submission", address))
        .bearer_auth(&token)
        .json(&json!({
            "github_url": "https://github.com/student/todo-app",
            "notes": "<b>Done</b><script>alert(1)</script>"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(project.status().as_u16(), 200);
    let project: Value = project.json().await.unwrap();
    assert_eq!(project["notes"], "<b>Done</b>");

    let eligible = fetch(eligibility_url.clone()).await;
    assert_eq!(eligible["eligible"], true);
    assert_eq!(eligible["stage"], "eligible");

    // 5. Reopening a lesson drops eligibility again
    let response = client
        .delete(&format!(
            "{}/api/courses/js-fundamentals/lessons/arrays/completion",
            address
        ))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let reopened = fetch(eligibility_url).await;
    assert_eq!(reopened["eligible"], false);
    assert_eq!(reopened["stage"], "in_progress");
}

#[tokio::test]
async fn course_without_requirements_only_needs_lessons() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = token_for(&new_student(), "student");

    let toggled: Value = client
        .post(&format!("{}/api/courses/web-basics/lessons/http/toggle", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(toggled["completed_lessons"].as_array().unwrap().len(), 1);

    let result: Value = client
        .get(&format!("{}/api/courses/web-basics/eligibility", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(result["eligible"], true);
    assert!(result["test_passed"].is_null());
    assert!(result["project_submitted"].is_null());

    // Unknown lesson is a 404, not a silent no-op
    let unknown = client
        .post(&format!("{}/api/courses/web-basics/lessons/nope/toggle", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(unknown.status().as_u16(), 404);
}

#[tokio::test]
async fn project_submission_is_validated() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = token_for(&new_student(), "student");

    let response = client
        .post(&format!("{}/api/projects/todo-app/submission", address))
        .bearer_auth(&token)
        .json(&json!({ "github_url": "https://gitlab.com/student/todo-app" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let missing = client
        .get(&format!("{}/api/projects/todo-app/submission", address))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(missing.status().as_u16(), 404);
}

#[tokio::test]
async fn admin_can_clear_an_attempt() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let student = new_student();
    let student_token = token_for(&student, "student");
    let admin_token = token_for("admin-1", "admin");

    client
        .post(&format!("{}/api/tests/js-final/attempt", address))
        .bearer_auth(&student_token)
        .json(&json!({ "answers": [] }))
        .send()
        .await
        .unwrap();

    let clear_url = format!("{}/api/admin/students/{}/attempts/js-final", address, student);

    let forbidden = client.delete(&clear_url).bearer_auth(&student_token).send().await.unwrap();
    assert_eq!(forbidden.status().as_u16(), 403);

    let cleared = client.delete(&clear_url).bearer_auth(&admin_token).send().await.unwrap();
    assert_eq!(cleared.status().as_u16(), 204);

    let again = client.delete(&clear_url).bearer_auth(&admin_token).send().await.unwrap();
    assert_eq!(again.status().as_u16(), 404);

    let gone = client
        .get(&format!("{}/api/tests/js-final/attempt", address))
        .bearer_auth(&student_token)
        .send()
        .await
        .unwrap();
    assert_eq!(gone.status().as_u16(), 404);
}

#[tokio::test]
async fn tutor_requires_configuration() {
    let token = token_for(&new_student(), "student");
    let client = reqwest::Client::new();
    let question = json!({
        "question": "Why is my loop infinite?",
        "context": { "course_id": "js-fundamentals", "lab_id": "sum-two-numbers" }
    });

    let address = spawn_app().await;
    let unavailable = client
        .post(&format!("{}/api/tutor/ask", address))
        .bearer_auth(&token)
        .json(&question)
        .send()
        .await
        .unwrap();
    assert_eq!(unavailable.status().as_u16(), 503);

    let address = spawn_app_with(Some(Arc::new(EchoTutor))).await;
    let reply: Value = client
        .post(&format!("{}/api/tutor/ask", address))
        .bearer_auth(&token)
        .json(&question)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(reply["answer"], "You asked: Why is my loop infinite?");
    assert_eq!(reply["response_type"], "explanation");
}

#[tokio::test]
async fn runaway_script_releases_its_sandbox_slot() {
    // A single slot: the second request only runs if the first one's worker is gone.
    let address = spawn_app_configured(None, 1).await;
    let client = reqwest::Client::new();
    let token = token_for(&new_student(), "student");

    // Exponential recursion stays under both engine limits, so only the clock stops it.
    let runaway: Value = client
        .post(&format!("{}/api/sandbox/execute", address))
        .bearer_auth(&token)
        .json(&json!({ "code": "function f(n) { if (n === 0) return 0; return f(n - 1) + f(n - 1); } f(60);" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(runaway["success"], false);
    assert!(runaway["error"].as_str().unwrap().contains("timed out"));

    let next = tokio::time::timeout(
        Duration::from_secs(10),
        client
            .post(&format!("{}/api/sandbox/execute", address))
            .bearer_auth(&token)
            .json(&json!({ "code": "console.log('next')" }))
            .send(),
    )
    .await
    .expect("second run was not admitted")
    .unwrap()
    .json::<Value>()
    .await
    .unwrap();
    assert_eq!(next["success"], true);
    assert_eq!(next["output"], "next");
}

#[tokio::test]
async fn draft_size_follows_sandbox_limit() {
    let address = spawn_app().await;
    let client = reqwest::Client::new();
    let token = token_for(&new_student(), "student");

    // 16 KiB limit in this app's config.
    let response = client
        .put(&format!("{}/api/labs/sum-two-numbers/draft", address))
        .bearer_auth(&token)
        .json(&json!({ "code": "x".repeat(16 * 1024 + 1) }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 400);

    let response = client
        .put(&format!("{}/api/labs/sum-two-numbers/draft", address))
        .bearer_auth(&token)
        .json(&json!({ "code": "x".repeat(16 * 1024) }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
}
