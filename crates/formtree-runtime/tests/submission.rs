#![forbid(unsafe_code)]
//! Submission tests against the in-memory backends.

use formtree_core::{ConfigError, FormMessage};
use formtree_render::FormBuilder;
use formtree_runtime::mock::{MockApi, MockTransport};
use formtree_runtime::transport::{Method, Response};
use formtree_runtime::{
    ClickOutcome, FormInstance, Part, Payload, SubmitEvent, SubmitOutcome, process_form,
};
use pollster::block_on;
use pretty_assertions::assert_eq;
use serde_json::json;
use tracing_test::traced_test;

fn form(attribute: serde_json::Value) -> FormInstance {
    FormInstance::from_builder(&FormBuilder::new(), &json!({ "field": attribute }).to_string())
        .unwrap()
}

#[test]
fn api_submit_answering_201_reports_created() {
    let mut form = form(json!({"type": "form", "apiname": "users", "children": [
        {"type": "text", "name": "name", "value": "x"},
        {"type": "submit", "name": "save"}
    ]}));
    let api = MockApi::new()
        .with_api("users", "/api/users")
        .with_response("/api/users", Ok(Response::from_status(201)));

    let outcome = block_on(form.click("save", &MockTransport::new(), &api));

    assert_eq!(
        outcome,
        Some(ClickOutcome::Submitted(SubmitOutcome::Saved { created: true }))
    );
    assert_eq!(
        form.state().messages("m__form"),
        &[FormMessage::info("Succesfully created")]
    );
    let calls = api.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].method, Method::Put);
    assert_eq!(calls[0].body, Some(json!({"name": "x"})));
}

#[test]
fn api_submit_answering_200_reports_updated() {
    let mut form = form(json!({"type": "form", "apiname": "users", "children": [
        {"type": "text", "name": "name", "value": "x"}
    ]}));
    let api = MockApi::new()
        .with_api("users", "/api/users")
        .with_response("/api/users", Ok(Response::new(200, json!({"id": 4}))));
    let outcome = block_on(form.submit(&MockTransport::new(), &api));
    assert_eq!(outcome, SubmitOutcome::Saved { created: false });
    assert_eq!(
        form.state().messages("m__form"),
        &[FormMessage::info("Succesfully updated")]
    );
}

#[test]
fn failure_without_body_reports_undefined_and_501() {
    let mut form = form(json!({"type": "form", "action": "/submit", "children": [
        {"type": "text", "name": "name", "value": "x"}
    ]}));
    let transport = MockTransport::new().with_response("/submit", Err(Response::empty()));

    let outcome = block_on(form.submit(&transport, &MockApi::new()));

    assert_eq!(outcome, SubmitOutcome::Failed { status: 501 });
    assert_eq!(
        form.state().messages("m__form"),
        &[FormMessage::error("Server error (undefined)")]
    );
}

#[test]
fn url_submit_sends_json_with_declared_method() {
    let mut form = form(json!({"type": "form", "action": "/things/1", "method": "put", "children": [
        {"type": "text", "name": "name", "value": "x"}
    ]}));
    let transport = MockTransport::new()
        .with_response("/things/1", Ok(Response::new(200, json!({"redirect": "/things"}))));

    let outcome = block_on(form.submit(&transport, &MockApi::new()));

    assert_eq!(outcome, SubmitOutcome::Redirect("/things".into()));
    let request = &transport.requests()[0];
    assert_eq!(request.method, Method::Put);
    assert_eq!(request.content_type.as_deref(), Some("application/json"));
    assert_eq!(request.payload, Payload::Json(json!({"name": "x"})));
}

#[test]
fn form_encodings_leave_content_type_to_transport() {
    let mut urlencoded = form(json!({
        "type": "form", "action": "/u",
        "enctype": "application/x-www-form-urlencoded; charset=utf-8",
        "children": [{"type": "text", "name": "name", "value": "a b"}]
    }));
    let mut multipart = form(json!({
        "type": "form", "action": "/m", "enctype": "multipart/form-data",
        "children": [{"type": "text", "name": "name", "value": "a b"}]
    }));
    let transport = MockTransport::new()
        .with_response("/u", Ok(Response::from_status(200)))
        .with_response("/m", Ok(Response::from_status(200)));

    block_on(urlencoded.submit(&transport, &MockApi::new()));
    block_on(multipart.submit(&transport, &MockApi::new()));

    let requests = transport.requests();
    assert_eq!(requests[0].method, Method::Post);
    assert_eq!(requests[0].content_type, None);
    assert_eq!(requests[0].payload, Payload::UrlEncoded("name=a+b".into()));
    assert_eq!(requests[1].content_type, None);
    assert_eq!(
        requests[1].payload,
        Payload::Multipart(vec![Part {
            name: "name".into(),
            value: "a b".into()
        }])
    );
}

#[test]
fn invalid_form_shows_errors_and_sends_nothing() {
    let mut built = FormBuilder::new()
        .build(&json!({"field": {"type": "form", "action": "/submit", "children": [
            {"type": "email", "name": "email", "required": true}
        ]}}).to_string())
        .unwrap();
    let transport = MockTransport::new();
    let mut event = SubmitEvent::new();

    let outcome = block_on(process_form(&mut built.state, &mut event, &transport, &MockApi::new()));

    assert_eq!(outcome, SubmitOutcome::Invalid);
    assert!(event.is_default_prevented());
    assert!(event.is_propagation_stopped());
    assert!(built.state.is_dirty("email"));
    assert!(transport.requests().is_empty());
}

#[test]
#[traced_test]
fn unresolvable_api_aborts_and_keeps_messages() {
    let mut form = form(json!({"type": "form", "apiname": "ghosts", "children": [
        {"type": "text", "name": "name"}
    ]}));
    form.state_mut()
        .set_messages("m__form", vec![FormMessage::info("earlier")]);
    let api = MockApi::new();

    let outcome = block_on(form.submit(&MockTransport::new(), &api));

    assert_eq!(
        outcome,
        SubmitOutcome::Aborted(ConfigError::UnknownApi("ghosts".into()))
    );
    assert!(api.calls().is_empty());
    assert_eq!(form.state().messages("m__form"), &[FormMessage::info("earlier")]);
    assert!(logs_contain("Could not find api url for ghosts"));
}

#[test]
#[traced_test]
fn form_without_target_aborts() {
    let mut form = form(json!({"type": "form", "children": [
        {"type": "text", "name": "name"}
    ]}));
    let transport = MockTransport::new();

    let outcome = block_on(form.submit(&transport, &MockApi::new()));

    assert_eq!(outcome, SubmitOutcome::Aborted(ConfigError::NoSubmitTarget));
    assert!(transport.requests().is_empty());
    assert!(logs_contain("Could not process form. No target or api"));
}

#[test]
fn server_messages_are_merged_per_key() {
    let mut form = form(json!({"type": "form", "action": "/submit", "children": [
        {"type": "text", "name": "name", "value": "x"}
    ]}));
    let transport = MockTransport::new().with_response(
        "/submit",
        Err(Response::new(422, json!({"messages": {
            "name": [{"message": "Too short", "error": true}]
        }}))),
    );

    let outcome = block_on(form.submit(&transport, &MockApi::new()));

    assert_eq!(outcome, SubmitOutcome::Failed { status: 422 });
    assert_eq!(form.state().messages("name"), &[FormMessage::error("Too short")]);
    assert!(form.state().messages("m__form").is_empty());
}
