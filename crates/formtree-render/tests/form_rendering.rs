#![forbid(unsafe_code)]
//! End-to-end rendering tests: attribute in, node tree and live state out.

use formtree_core::{ClickAction, ConfigError, FormDefaults, Node};
use formtree_render::FormBuilder;
use pretty_assertions::assert_eq;
use serde_json::json;
use tracing_test::traced_test;

/// Texts of visible error messages under the field's error container.
fn visible_errors<'a>(form: &'a Node, state: &formtree_core::FormState) -> Vec<&'a str> {
    form.find_all(|n| n.has_class("form-error"))
        .into_iter()
        .flat_map(|p| p.visible(state))
        .filter(|n| n.tag() == "span")
        .filter_map(Node::text)
        .collect()
}

#[test]
fn required_text_field_left_empty_shows_one_message() {
    let mut built = FormBuilder::new()
        .build(r#"{"field": {"type": "form", "children": [
            {"type": "text", "name": "email", "required": true}
        ]}}"#)
        .unwrap();
    built.state.seed_value("email", json!(""));
    assert!(visible_errors(&built.node, &built.state).is_empty());

    built.state.mark_dirty("email");
    assert_eq!(
        visible_errors(&built.node, &built.state),
        vec!["This field is required"]
    );
}

#[test]
fn satisfied_constraints_show_nothing_dirty_or_not() {
    let mut built = FormBuilder::new()
        .build(r#"{"field": {"type": "form", "children": [
            {"type": "email", "name": "email", "required": true, "maxlength": 40},
            {"type": "number", "name": "age", "min": 18}
        ]}}"#)
        .unwrap();
    built.state.seed_value("email", json!("ada@example.org"));
    built.state.seed_value("age", json!(36));
    assert!(visible_errors(&built.node, &built.state).is_empty());
    built.state.show_errors();
    assert!(visible_errors(&built.node, &built.state).is_empty());
    assert!(!built.state.is_form_invalid());
}

#[test]
fn type_mismatch_shows_catch_all() {
    let mut built = FormBuilder::new()
        .build(r#"{"field": {"type": "form", "children": [
            {"type": "email", "name": "email", "required": true}
        ]}}"#)
        .unwrap();
    built.state.set_value("email", json!("not an address"));
    assert_eq!(
        visible_errors(&built.node, &built.state),
        vec!["Not a valid email"]
    );
}

#[test]
fn ids_are_unique_and_follow_render_order() {
    let built = FormBuilder::new()
        .build(r#"{"field": {"type": "form", "id": "fabcd", "children": [
            {"type": "text", "name": "first"},
            {"type": "fieldset", "label": "Address", "children": [
                {"type": "text", "name": "street"},
                {"type": "select", "name": "country", "options": ["it", "uk"]}
            ]},
            {"type": "textarea", "name": "notes"}
        ]}}"#)
        .unwrap();
    let ids: Vec<_> = built
        .node
        .find_all(|n| n.binding().is_some())
        .into_iter()
        .filter_map(|n| n.attr("id"))
        .collect();
    assert_eq!(
        ids,
        vec![
            "first-fabcd-1",
            "street-fabcd-2",
            "country-fabcd-3",
            "notes-fabcd-4"
        ]
    );
    let filled = &built.spec.children()[1].children()[0];
    assert_eq!(filled.id.as_deref(), Some("street-fabcd-2"));
}

#[test]
fn unknown_type_does_not_break_siblings() {
    let built = FormBuilder::new()
        .build(r#"{"field": {"type": "form", "children": [
            {"type": "captcha", "name": "robot", "label": "Are you human?", "children": [
                {"type": "text", "name": "hidden_inside"}
            ]},
            {"type": "text", "name": "after"}
        ]}}"#)
        .unwrap();
    let form = &built.node;
    assert_eq!(form.children()[1].to_html(), "<span>Are you human?</span>");
    assert!(form.find(|n| n.attr("name") == Some("hidden_inside")).is_none());
    assert!(form.find(|n| n.attr("name") == Some("after")).is_some());
}

#[test]
fn inherited_options_flow_to_children_without_overriding() {
    let built = FormBuilder::new()
        .with_defaults(FormDefaults::new().show_labels(false))
        .build(r#"{"field": {"type": "form", "layout": "horizontal", "labelSpan": 4, "children": [
            {"type": "text", "name": "a"},
            {"type": "text", "name": "b", "showLabels": true, "labelSpan": 1},
            {"type": "fieldset", "layout": "default", "children": [
                {"type": "text", "name": "c"}
            ]}
        ]}}"#)
        .unwrap();
    let label_of = |name: &str| {
        built
            .node
            .find(|n| n.tag() == "label" && n.text() == Some(name))
            .unwrap()
            .clone()
    };
    let a = label_of("a");
    assert!(a.has_class("sr-only"));
    assert!(a.has_class("col-sm-4"));
    let b = label_of("b");
    assert!(!b.has_class("sr-only"));
    assert!(b.has_class("col-sm-2"));
    let c = label_of("c");
    assert!(c.has_class("sr-only"));
    assert!(!c.has_class("control-label"));
}

#[test]
#[traced_test]
fn unknown_click_handler_is_logged_and_unwired() {
    let built = FormBuilder::new()
        .with_handler("reset_all", |state| state.clear_messages())
        .build(r#"{"field": {"type": "form", "children": [
            {"type": "button", "name": "wipe", "click": "reset_all"},
            {"type": "button", "name": "launch", "click": "missiles"}
        ]}}"#)
        .unwrap();
    assert_eq!(
        built.state.click_action("wipeClick"),
        Some(&ClickAction::Handler("reset_all".into()))
    );
    assert_eq!(built.state.click_action("launchClick"), None);
    let launch = built.node.find(|n| n.attr("name") == Some("launch")).unwrap();
    assert_eq!(launch.attr("data-click"), None);
    assert!(logs_contain(
        &ConfigError::UnknownClickHandler("missiles".into()).to_string()
    ));
}

#[test]
#[traced_test]
fn unknown_child_layout_renders_fallback() {
    let built = FormBuilder::new()
        .build(r#"{"field": {"type": "form", "children": [
            {"type": "text", "name": "x", "label": "X", "layout": "masonry"},
            {"type": "text", "name": "y"}
        ]}}"#)
        .unwrap();
    assert_eq!(built.node.children()[1].to_html(), "<span>X</span>");
    assert!(built.node.find(|n| n.attr("name") == Some("y")).is_some());
    assert!(logs_contain("masonry"));
}

#[test]
#[traced_test]
fn children_on_leaf_are_ignored() {
    let built = FormBuilder::new()
        .build(r#"{"field": {"type": "form", "children": [
            {"type": "text", "name": "x", "children": [{"type": "text", "name": "inner"}]}
        ]}}"#)
        .unwrap();
    assert!(built.node.find(|n| n.attr("name") == Some("inner")).is_none());
    assert!(logs_contain("cannot have children"));
}

#[test]
fn live_markup_reflects_model_and_messages() {
    let mut built = FormBuilder::new()
        .build(r#"{"field": {"type": "form", "children": [
            {"type": "text", "name": "city", "value": "Rome"}
        ]}}"#)
        .unwrap();
    built.state.set_messages(
        "m__form",
        vec![formtree_core::FormMessage::error("Try again")],
    );
    built.state.set_value("city", json!("Oslo"));
    let html = built.node.render_live(&built.state);
    assert!(html.contains("value=\"Oslo\""));
    assert!(html.contains("<p class=\"text-danger\">Try again</p>"));
    assert!(!html.contains("form-error"));
}
