//! End-to-end client tests against a mock HTTP server.

use std::time::Duration;

use mockito::{Matcher, Server};
use openqa_client::{Client, Error, Method, ParamValue, Params, Setting};
use serde_json::{Value, json};

const KEY: &str = "aaaaaaaaaaaaaaaa";
const SECRET: &str = "bbbbbbbbbbbbbbbb";

fn client_for(server: &Server) -> Client {
    Client::with_credentials(&server.url(), KEY, SECRET)
        .unwrap()
        .wait(Duration::ZERO)
}

#[test_log::test]
fn get_parses_json_body() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/api/v1/jobs/1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 1, "state": "done"}"#)
        .create();

    let client = client_for(&server);
    let body = client.request(Method::GET, "jobs/1", None, None).unwrap();

    mock.assert();
    assert_eq!(body, json!({"id": 1, "state": "done"}));
}

#[test_log::test]
fn raw_request_returns_literal_body() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/api/v1/jobs/1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 1, "state": "done"}"#)
        .create();

    let client = client_for(&server);
    let response = client
        .request_raw(Method::GET, "jobs/1", None, None)
        .unwrap();

    mock.assert();
    assert_eq!(response.text().unwrap(), r#"{"id": 1, "state": "done"}"#);
}

#[test_log::test]
fn not_found_fails_after_a_single_call() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/api/v1/jobs/999999")
        .with_status(404)
        .with_body("no such job")
        .expect(1)
        .create();

    let client = client_for(&server);
    let err = client
        .request(Method::GET, "jobs/999999", None, None)
        .unwrap_err();

    mock.assert();
    assert_eq!(err.status(), Some(404));
    assert_eq!(err.body(), Some("no such job"));
    assert_eq!(err.attempts(), Some(1));
}

#[test_log::test]
fn get_jobs_sends_latest_as_literal_one() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/api/v1/jobs")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("build".into(), "20200227.n.0".into()),
            Matcher::UrlEncoded("latest".into(), "1".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"jobs": [{"id": 1, "clone_id": null, "settings": {}}]}"#)
        .create();

    let client = client_for(&server);
    let jobs = client
        .get_jobs(None, Some("20200227.n.0"), true)
        .unwrap();

    mock.assert();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id, 1);
}

#[test_log::test]
fn get_jobs_comma_joins_ids() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/api/v1/jobs")
        .match_query(Matcher::UrlEncoded("ids".into(), "5,7".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            r#"{"jobs": [
                {"id": 5, "clone_id": null, "settings": {}},
                {"id": 7, "clone_id": null, "settings": {}}
            ]}"#,
        )
        .create();

    let client = client_for(&server);
    let jobs = client.get_jobs(Some(&[5, 7]), None, false).unwrap();

    mock.assert();
    assert_eq!(jobs.iter().map(|j| j.id).collect::<Vec<_>>(), vec![5, 7]);
}

#[test_log::test]
fn find_clones_fetches_the_final_job_in_a_chain() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/api/v1/jobs")
        .match_query(Matcher::UrlEncoded("ids".into(), "9".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"jobs": [{"id": 9, "clone_id": null, "settings": {}}]}"#)
        .create();

    let client = client_for(&server);
    let jobs = serde_json::from_value(json!([
        {"id": 5, "clone_id": 9, "settings": {}},
    ]))
    .unwrap();
    let resolved = client.find_clones(jobs).unwrap();

    mock.assert();
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].id, 9);
    assert_eq!(resolved[0].clone_id, None);
}

#[test_log::test]
fn clone_cycle_terminates_with_a_bounded_result() {
    let mut server = Server::new();
    // 5 claims to be cloned as 6 and 6 as 5, so the walk can never settle
    let five_to_six = server
        .mock("GET", "/api/v1/jobs")
        .match_query(Matcher::UrlEncoded("ids".into(), "6".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"jobs": [{"id": 6, "clone_id": 5, "settings": {}}]}"#)
        .expect_at_least(1)
        .create();
    let six_to_five = server
        .mock("GET", "/api/v1/jobs")
        .match_query(Matcher::UrlEncoded("ids".into(), "5".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"jobs": [{"id": 5, "clone_id": 6, "settings": {}}]}"#)
        .expect_at_least(1)
        .create();

    let client = client_for(&server);
    let jobs = serde_json::from_value(json!([
        {"id": 5, "clone_id": 6, "settings": {}},
    ]))
    .unwrap();
    let resolved = client.find_clones(jobs).unwrap();

    five_to_six.assert();
    six_to_five.assert();
    // the walk gives up at its round limit and hands back what it has,
    // with the unresolved clone marker still set
    assert_eq!(resolved.len(), 1);
    assert!(resolved[0].clone_id.is_some());
}

#[test_log::test]
fn malformed_json_is_a_hard_error_not_retried() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/api/v1/jobs/1")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body("{not json")
        .expect(1)
        .create();

    let client = client_for(&server).max_attempts(5);
    let err = client.request(Method::GET, "jobs/1", None, None).unwrap_err();

    mock.assert();
    assert!(matches!(err, Error::Json(_)), "got {:?}", err);
}

#[test_log::test]
fn yaml_content_type_is_decoded_as_yaml() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/api/v1/job_templates_scheduling/1")
        .with_status(200)
        .with_header("content-type", "text/yaml")
        .with_body("---\nerror: some failure\ncount: 3\n")
        .create();

    let client = client_for(&server);
    let body = client
        .request(Method::GET, "job_templates_scheduling/1", None, None)
        .unwrap();

    mock.assert();
    assert_eq!(body, json!({"error": "some failure", "count": 3}));
}

#[test_log::test]
fn unknown_content_type_passes_text_through() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/api/v1/jobs/1")
        .with_status(200)
        .with_header("content-type", "text/plain")
        .with_body("pong")
        .create();

    let client = client_for(&server);
    let body = client.request(Method::GET, "jobs/1", None, None).unwrap();

    mock.assert();
    assert_eq!(body, Value::String("pong".to_string()));
}

#[test_log::test]
fn no_content_decodes_as_null() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/api/v1/jobs/1/cancel")
        .with_status(204)
        .create();

    let client = client_for(&server);
    let body = client
        .request(Method::POST, "jobs/1/cancel", None, None)
        .unwrap();

    mock.assert();
    assert_eq!(body, Value::Null);
}

#[test_log::test]
fn requests_carry_auth_headers() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/api/v1/jobs")
        .match_header("x-api-key", KEY)
        .match_header("x-api-microtime", Matcher::Regex(r"^\d+\.\d{6}$".into()))
        .match_header("x-api-hash", Matcher::Regex("^[0-9a-f]{40}$".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"jobs": []}"#)
        .create();

    let client = client_for(&server);
    client.request(Method::GET, "jobs", None, None).unwrap();

    mock.assert();
}

#[test_log::test]
fn anonymous_get_is_unsigned() {
    let mut server = Server::new();
    let mock = server
        .mock("GET", "/api/v1/jobs/1")
        .match_header("x-api-key", Matcher::Missing)
        .match_header("x-api-hash", Matcher::Missing)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 1}"#)
        .create();

    let client = Client::anonymous(&server.url()).unwrap();
    let body = client.request(Method::GET, "jobs/1", None, None).unwrap();

    mock.assert();
    assert_eq!(body, json!({"id": 1}));
}

#[test_log::test]
fn anonymous_post_fails_before_any_call() {
    let mut server = Server::new();
    let mock = server.mock("POST", "/api/v1/jobs").expect(0).create();

    let client = Client::anonymous(&server.url()).unwrap();
    let err = client.request(Method::POST, "jobs", None, None).unwrap_err();

    mock.assert();
    assert!(matches!(err, Error::MissingCredentials { .. }));
}

#[test_log::test]
fn form_data_is_posted_with_settings_flattened() {
    let mut server = Server::new();
    let mock = server
        .mock("POST", "/api/v1/job_groups/1")
        .match_header("content-type", "application/x-www-form-urlencoded")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("name".into(), "something".into()),
            Matcher::UrlEncoded("settings[NICVLAN]".into(), "17".into()),
        ]))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"id": 1}"#)
        .create();

    let client = client_for(&server);
    let mut data = Params::new();
    data.insert("name".to_string(), ParamValue::from("something"));
    data.insert(
        "settings".to_string(),
        ParamValue::Settings(vec![Setting::new("NICVLAN", "17")]),
    );
    let body = client
        .request(Method::POST, "job_groups/1", None, Some(&data))
        .unwrap();

    mock.assert();
    assert_eq!(body, json!({"id": 1}));
}
