use chrono::Utc;
use mockito::{Matcher, Server, ServerGuard};
use serde_json::{json, Map, Value};
use std::time::Duration;

use gitremote_mcp::gitremote::ClientConfig;
use gitremote_mcp::tools::{ProtocolHandler, ToolRequest, ToolResult};

fn handler_for(server: &ServerGuard) -> ProtocolHandler {
    let config = ClientConfig {
        max_retries: 0,
        retry_base_delay: Duration::from_millis(1),
        request_timeout: Duration::from_secs(5),
        max_content_bytes: 64,
        ..ClientConfig::default().with_api_base_url(server.url())
    }
    .with_token_override(Some("test-token".to_string()));
    ProtocolHandler::from_config(config).unwrap()
}

fn request(name: &str, arguments: Value) -> ToolRequest {
    let arguments: Map<String, Value> = arguments.as_object().cloned().unwrap_or_default();
    ToolRequest::new(name, arguments)
}

fn success(result: ToolResult) -> Value {
    match result {
        ToolResult::Success(payload) => payload,
        ToolResult::Failure(failure) => panic!("expected success, got {:?}", failure),
    }
}

fn failure_kind(result: &ToolResult) -> String {
    result.to_json()["error"]["kind"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

fn commit_json(sha: &str, message: &str, date: &str) -> Value {
    json!({
        "sha": sha,
        "html_url": format!("https://github.com/acme/widgets/commit/{}", sha),
        "commit": {
            "message": message,
            "author": {"name": "Dana", "date": date},
            "committer": {"name": "GitHub", "date": date}
        },
        "author": {"login": "dana"}
    })
}

#[tokio::test]
async fn test_get_tags_sorts_and_limits() {
    let mut server = Server::new_async().await;
    let mut tags: Vec<Value> = (0..20)
        .map(|i| json!({"name": format!("v1.{}.0", (i * 7) % 20)}))
        .collect();
    tags.insert(3, json!({"name": "release-final"}));
    tags.push(json!({"name": "v2.0.0-rc.1"}));

    let mock = server
        .mock("GET", "/repos/acme/widgets/tags")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("per_page".into(), "100".into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
        ]))
        .with_status(200)
        .with_body(Value::Array(tags).to_string())
        .create_async()
        .await;

    let handler = handler_for(&server);
    let payload = success(
        handler
            .handle(request(
                "get_tags",
                json!({"url": "https://github.com/acme/widgets", "limit": 5}),
            ))
            .await,
    );

    assert_eq!(payload["repository"], "acme/widgets");
    assert_eq!(payload["count"], 5);
    assert_eq!(payload["limit_applied"], 5);
    assert_eq!(payload["latest"], "v1.19.0");
    assert_eq!(payload["unparsed_count"], 1);
    assert_eq!(payload["total_count"], 22);
    assert_eq!(payload["truncated"], false);
    assert_eq!(
        payload["tags"],
        json!(["v2.0.0-rc.1", "v1.19.0", "v1.18.0", "v1.17.0", "v1.16.0"])
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_tags_keeps_unparseable_tags_last() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/acme/widgets/tags")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"[{"name": "nightly"}, {"name": "v0.9.0"}, {"name": "alpha"}, {"name": "v1.0.0"}]"#)
        .create_async()
        .await;

    let payload = success(
        handler_for(&server)
            .handle(request("get_tags", json!({"url": "acme/widgets"})))
            .await,
    );

    assert_eq!(payload["tags"], json!(["v1.0.0", "v0.9.0", "nightly", "alpha"]));
    assert_eq!(payload["limit_applied"], Value::Null);
}

#[tokio::test]
async fn test_get_tags_failed_page_returns_no_partial_list() {
    let mut server = Server::new_async().await;
    let link = format!(
        "<{}/repos/acme/widgets/tags?per_page=100&page=2>; rel=\"next\"",
        server.url()
    );
    server
        .mock("GET", "/repos/acme/widgets/tags")
        .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
        .with_status(200)
        .with_header("link", &link)
        .with_body(r#"[{"name": "v2.0.0"}, {"name": "v1.0.0"}]"#)
        .create_async()
        .await;
    server
        .mock("GET", "/repos/acme/widgets/tags")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .with_status(503)
        .with_body(r#"{"message": "down"}"#)
        .create_async()
        .await;

    let result = handler_for(&server)
        .handle(request("get_tags", json!({"url": "acme/widgets"})))
        .await;

    assert_eq!(failure_kind(&result), "NetworkError");
    let json = result.to_json();
    assert!(json.get("tags").is_none());
    assert!(json["error"]["message"].as_str().unwrap().contains("503"));
}

#[tokio::test]
async fn test_get_tags_reports_page_cap_truncation() {
    let mut server = Server::new_async().await;
    let link = format!(
        "<{}/repos/acme/widgets/tags?per_page=100&page=2>; rel=\"next\"",
        server.url()
    );
    server
        .mock("GET", "/repos/acme/widgets/tags")
        .match_query(Matcher::UrlEncoded("page".into(), "1".into()))
        .with_status(200)
        .with_header("link", &link)
        .with_body(r#"[{"name": "v1.1.0"}, {"name": "v1.0.0"}]"#)
        .create_async()
        .await;
    let second = server
        .mock("GET", "/repos/acme/widgets/tags")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .expect(0)
        .create_async()
        .await;

    let config = ClientConfig {
        max_retries: 0,
        page_cap: 1,
        ..ClientConfig::default().with_api_base_url(server.url())
    };
    let payload = success(
        ProtocolHandler::from_config(config)
            .unwrap()
            .handle(request("get_tags", json!({"url": "acme/widgets"})))
            .await,
    );

    assert_eq!(payload["truncated"], true);
    assert_eq!(payload["total_count"], 2);
    assert_eq!(payload["latest"], "v1.1.0");
    second.assert_async().await;
}

#[tokio::test]
async fn test_get_changelog_lists_commits_oldest_first() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/acme/widgets/commits/v1.0.0")
        .with_status(200)
        .with_body(commit_json("aaa111", "Release 1.0.0", "2024-01-01T00:00:00Z").to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/repos/acme/widgets/commits/v1.2.0")
        .with_status(200)
        .with_body(commit_json("ddd444", "Release 1.2.0", "2024-03-01T00:00:00Z").to_string())
        .create_async()
        .await;
    let compare = server
        .mock("GET", "/repos/acme/widgets/compare/aaa111...ddd444")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({
                "status": "ahead",
                "ahead_by": 3,
                "behind_by": 0,
                "total_commits": 3,
                "commits": [
                    commit_json("bbb222", "Add retry backoff\n\nExponential with jitter.", "2024-01-10T00:00:00Z"),
                    commit_json("ccc333", "Deprecate old client", "2024-02-01T00:00:00Z"),
                    commit_json("ddd444", "Release 1.2.0", "2024-03-01T00:00:00Z"),
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let payload = success(
        handler_for(&server)
            .handle(request(
                "get_changelog",
                json!({"url": "acme/widgets", "start_tag": "v1.0.0", "end_tag": "v1.2.0"}),
            ))
            .await,
    );

    assert_eq!(payload["from"], "v1.0.0");
    assert_eq!(payload["to"], "v1.2.0");
    assert_eq!(payload["from_commit"], "aaa111");
    assert_eq!(payload["to_commit"], "ddd444");
    assert_eq!(payload["total_commits"], 3);

    let ids: Vec<&str> = payload["commits"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["bbb222", "ccc333", "ddd444"]);
    assert_eq!(payload["commits"][0]["summary"], "Add retry backoff");
    assert_eq!(payload["commits"][0]["author"], "Dana");
    compare.assert_async().await;
}

#[tokio::test]
async fn test_get_changelog_unknown_ref_is_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/acme/widgets/commits/v1.0.0")
        .with_status(200)
        .with_body(commit_json("aaa111", "Release 1.0.0", "2024-01-01T00:00:00Z").to_string())
        .create_async()
        .await;
    server
        .mock("GET", "/repos/acme/widgets/commits/v9.9.9")
        .with_status(422)
        .with_body(r#"{"message": "No commit found for SHA: v9.9.9"}"#)
        .create_async()
        .await;
    let compare = server
        .mock("GET", Matcher::Regex("/compare/".to_string()))
        .expect(0)
        .create_async()
        .await;

    let result = handler_for(&server)
        .handle(request(
            "get_changelog",
            json!({"url": "acme/widgets", "start_tag": "v1.0.0", "end_tag": "v9.9.9"}),
        ))
        .await;

    assert_eq!(failure_kind(&result), "NotFound");
    assert!(result.to_json()["error"]["message"]
        .as_str()
        .unwrap()
        .contains("v9.9.9"));
    compare.assert_async().await;
}

#[tokio::test]
async fn test_missing_argument_makes_no_request() {
    let mut server = Server::new_async().await;
    let any = server
        .mock("GET", Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let result = handler_for(&server)
        .handle(request(
            "get_changelog",
            json!({"url": "acme/widgets", "start_tag": "v1.0.0"}),
        ))
        .await;

    assert_eq!(failure_kind(&result), "ValidationError");
    assert!(result.to_json()["error"]["message"]
        .as_str()
        .unwrap()
        .contains("end_tag"));
    any.assert_async().await;
}

#[tokio::test]
async fn test_invalid_repository_is_validation_error() {
    let server = Server::new_async().await;
    let result = handler_for(&server)
        .handle(request("get_readme", json!({"url": "https://github.com/acme"})))
        .await;
    assert_eq!(failure_kind(&result), "ValidationError");
}

fn tree_body() -> String {
    json!({
        "sha": "tree123",
        "truncated": false,
        "tree": [
            {"path": "Cargo.toml", "type": "blob", "size": 300},
            {"path": "examples", "type": "tree"},
            {"path": "examples/basic.rs", "type": "blob", "size": 420},
            {"path": "src", "type": "tree"},
            {"path": "src/lib.rs", "type": "blob", "size": 900},
            {"path": "src/client/mod.rs", "type": "blob", "size": 1500},
            {"path": "vendor/dep", "type": "commit"}
        ]
    })
    .to_string()
}

#[tokio::test]
async fn test_get_file_tree_flat_listing() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/acme/widgets/git/trees/v1.0.0")
        .match_query(Matcher::UrlEncoded("recursive".into(), "1".into()))
        .with_status(200)
        .with_body(tree_body())
        .create_async()
        .await;

    let payload = success(
        handler_for(&server)
            .handle(request(
                "get_file_tree",
                json!({"url": "acme/widgets", "branch": "v1.0.0"}),
            ))
            .await,
    );

    assert_eq!(payload["ref"], "v1.0.0");
    assert_eq!(payload["truncated"], false);
    assert_eq!(payload["upstream_truncated"], false);
    assert!(payload.get("tree").is_none());

    let paths: Vec<&str> = payload["entries"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["path"].as_str().unwrap())
        .collect();
    // src/client and vendor are synthesized
    assert_eq!(
        paths,
        vec![
            "Cargo.toml",
            "examples",
            "examples/basic.rs",
            "src",
            "src/client",
            "src/client/mod.rs",
            "src/lib.rs",
            "vendor",
            "vendor/dep",
        ]
    );
    assert_eq!(payload["total_count"], 9);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_file_tree_hierarchical_subtree() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/acme/widgets/git/trees/HEAD")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(tree_body())
        .create_async()
        .await;

    let payload = success(
        handler_for(&server)
            .handle(request(
                "get_file_tree",
                json!({"url": "acme/widgets", "hierarchical": true, "path": "src", "max_depth": 1}),
            ))
            .await,
    );

    assert_eq!(payload["ref"], "HEAD");
    assert_eq!(payload["path"], "src");
    assert_eq!(payload["truncated"], true);
    let names: Vec<&str> = payload["tree"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["client", "lib.rs"]);
}

#[tokio::test]
async fn test_get_file_tree_unknown_directory() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/acme/widgets/git/trees/HEAD")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(tree_body())
        .create_async()
        .await;

    let result = handler_for(&server)
        .handle(request("get_file_tree", json!({"url": "acme/widgets", "path": "docs"})))
        .await;
    assert_eq!(failure_kind(&result), "NotFound");
}

#[tokio::test]
async fn test_get_file_content_truncates_large_files() {
    let mut server = Server::new_async().await;
    let body = "x".repeat(100);
    let mock = server
        .mock("GET", "/repos/acme/widgets/contents/src/lib.rs")
        .match_query(Matcher::UrlEncoded("ref".into(), "main".into()))
        .match_header("accept", "application/vnd.github.raw")
        .with_status(200)
        .with_header("content-type", "application/vnd.github.raw")
        .with_body(&body)
        .create_async()
        .await;

    let payload = success(
        handler_for(&server)
            .handle(request(
                "get_file_content",
                json!({"url": "acme/widgets", "path": "/src/lib.rs", "ref": "main"}),
            ))
            .await,
    );

    assert_eq!(payload["path"], "src/lib.rs");
    assert_eq!(payload["ref"], "main");
    assert_eq!(payload["is_truncated"], true);
    assert_eq!(payload["size"], 100);
    assert_eq!(payload["content"].as_str().unwrap().len(), 64);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_file_content_rejects_directories() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/acme/widgets/contents/src")
        .with_status(200)
        .with_header("content-type", "application/json; charset=utf-8")
        .with_body(r#"[{"name": "lib.rs", "path": "src/lib.rs", "type": "file"}]"#)
        .create_async()
        .await;

    let result = handler_for(&server)
        .handle(request("get_file_content", json!({"url": "acme/widgets", "path": "src"})))
        .await;
    assert_eq!(failure_kind(&result), "ValidationError");
}

#[tokio::test]
async fn test_get_file_content_missing_file() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/acme/widgets/contents/nope.rs")
        .with_status(404)
        .with_body(r#"{"message": "Not Found"}"#)
        .create_async()
        .await;

    let result = handler_for(&server)
        .handle(request("get_file_content", json!({"url": "acme/widgets", "path": "nope.rs"})))
        .await;
    assert_eq!(failure_kind(&result), "NotFound");
}

#[tokio::test]
async fn test_get_readme() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/repos/acme/widgets/readme")
        .with_status(200)
        .with_header("content-type", "application/vnd.github.raw")
        .with_body("# Widgets\n\ncargo add widgets")
        .create_async()
        .await;

    let payload = success(
        handler_for(&server)
            .handle(request("get_readme", json!({"url": "git@github.com:acme/widgets.git"})))
            .await,
    );

    assert_eq!(payload["repository"], "acme/widgets");
    assert_eq!(payload["is_truncated"], false);
    assert_eq!(payload["content"], "# Widgets\n\ncargo add widgets");
    assert_eq!(payload["ref"], Value::Null);
}

#[tokio::test]
async fn test_search_repository() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/search/code")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("q".into(), "spawn_blocking repo:acme/widgets".into()),
            Matcher::UrlEncoded("per_page".into(), "2".into()),
        ]))
        .match_header("accept", "application/vnd.github.text-match+json")
        .with_status(200)
        .with_body(
            json!({
                "total_count": 7,
                "incomplete_results": false,
                "items": [
                    {
                        "path": "src/runtime.rs",
                        "html_url": "https://github.com/acme/widgets/blob/main/src/runtime.rs",
                        "text_matches": [{"fragment": "tokio::task::spawn_blocking(move || {"}]
                    },
                    {"path": "src/io.rs", "html_url": null}
                ]
            })
            .to_string(),
        )
        .create_async()
        .await;

    let payload = success(
        handler_for(&server)
            .handle(request(
                "search_repository",
                json!({"url": "acme/widgets", "query": "spawn_blocking", "limit": 2}),
            ))
            .await,
    );

    assert_eq!(payload["total_count"], 7);
    assert_eq!(payload["matches"].as_array().unwrap().len(), 2);
    assert_eq!(payload["matches"][0]["snippet"], "tokio::task::spawn_blocking(move || {");
    assert_eq!(payload["matches"][1]["snippet"], Value::Null);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_search_repository_caps_limit_at_one_page() {
    let mut server = Server::new_async().await;
    let link = format!(
        "<{}/search/code?per_page=100&page=2>; rel=\"next\"",
        server.url()
    );
    let items: Vec<Value> = (0..100)
        .map(|i| json!({"path": format!("src/mod_{}.rs", i), "html_url": null}))
        .collect();
    server
        .mock("GET", "/search/code")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("per_page".into(), "100".into()),
            Matcher::UrlEncoded("page".into(), "1".into()),
        ]))
        .with_status(200)
        .with_header("link", &link)
        .with_body(
            json!({"total_count": 450, "incomplete_results": false, "items": items}).to_string(),
        )
        .create_async()
        .await;
    let second = server
        .mock("GET", "/search/code")
        .match_query(Matcher::UrlEncoded("page".into(), "2".into()))
        .expect(0)
        .create_async()
        .await;

    let payload = success(
        handler_for(&server)
            .handle(request(
                "search_repository",
                json!({"url": "acme/widgets", "query": "mod", "limit": 500}),
            ))
            .await,
    );

    assert_eq!(payload["matches"].as_array().unwrap().len(), 100);
    assert_eq!(payload["total_count"], 450);
    second.assert_async().await;
}

#[tokio::test]
async fn test_rate_limited_result_reports_reset_time() {
    let mut server = Server::new_async().await;
    let reset = Utc::now().timestamp() + 600;
    server
        .mock("GET", "/repos/acme/widgets/readme")
        .with_status(403)
        .with_header("x-ratelimit-remaining", "0")
        .with_header("x-ratelimit-reset", &reset.to_string())
        .with_body(r#"{"message": "API rate limit exceeded"}"#)
        .create_async()
        .await;

    let handler = handler_for(&server);
    let result = handler
        .handle(request("get_readme", json!({"url": "acme/widgets"})))
        .await;

    assert_eq!(failure_kind(&result), "RateLimited");
    let error = &result.to_json()["error"];
    assert!(error["reset_at"].is_string());
    assert!(error["retry_after_secs"].as_u64().unwrap() <= 600);

    // the session survives and later calls fail fast with the same kind
    let again = handler
        .handle(request("get_tags", json!({"url": "acme/widgets"})))
        .await;
    assert_eq!(failure_kind(&again), "RateLimited");
}
