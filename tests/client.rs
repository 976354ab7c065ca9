//! Pipeline-level tests against a recording in-memory requester: path
//! accumulation, node identity, method dispatch, query normalization, morph
//! hooks and retargeting. No network involved.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use restling::{
    CallOptions, Endpoint, Error, Method, Query, QueryInput, Requester, RestError, RestRequest,
};
use serde_json::{Value, json};

type RespondFn = Box<dyn Fn(&RestRequest) -> Result<Value, Error> + Send + Sync>;

/// Records every descriptor it receives and answers via a canned closure.
struct Recorder {
    seen: Mutex<Vec<RestRequest>>,
    respond: RespondFn,
}

impl Recorder {
    /// Echoes the request body back (`null` for bodyless calls).
    fn echo() -> Arc<Recorder> {
        Recorder::with(|request| Ok(request.body.clone().unwrap_or(Value::Null)))
    }

    fn with(
        respond: impl Fn(&RestRequest) -> Result<Value, Error> + Send + Sync + 'static,
    ) -> Arc<Recorder> {
        Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
            respond: Box::new(respond),
        })
    }

    fn last(&self) -> RestRequest {
        self.seen.lock().unwrap().last().cloned().expect("no request recorded")
    }

    fn count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl Requester for Recorder {
    async fn send(&self, request: RestRequest) -> Result<Value, Error> {
        self.seen.lock().unwrap().push(request.clone());
        (self.respond)(&request)
    }
}

fn harness() -> (Arc<Recorder>, Endpoint) {
    let recorder = Recorder::echo();
    let api = Endpoint::root(recorder.clone());
    (recorder, api)
}

#[tokio::test]
async fn path_accumulates_across_property_chains() {
    let (recorder, api) = harness();
    api.at("a").unwrap().at("b").unwrap().at("c").unwrap().get(CallOptions::new()).await.unwrap();
    assert_eq!(recorder.last().endpoint(), "a/b/c");

    api.at("foo").unwrap().at(1u32).unwrap().get(CallOptions::new()).await.unwrap();
    let request = recorder.last();
    assert_eq!(request.endpoint(), "foo/1");
    assert!(request.path.parts()[1].is_resource());
}

#[test]
fn repeated_access_yields_the_identical_node() {
    let (_, api) = harness();
    let foo = api.at("foo").unwrap();
    assert!(foo.same_node(&api.at("foo").unwrap()));

    // Unrelated accesses in between do not disturb the cache.
    let _ = api.at("bar").unwrap();
    let _ = foo.at("baz").unwrap();
    assert!(foo.same_node(&api.at("foo").unwrap()));
    assert!(foo.at(1u32).unwrap().same_node(&api.at("foo").unwrap().at(1u32).unwrap()));

    // Handles are clones of the same node, not copies of its state.
    assert!(foo.clone().same_node(&foo));
    assert!(!foo.same_node(&api.at("bar").unwrap()));
}

#[test]
fn invalid_segments_are_rejected() {
    let (_, api) = harness();
    for segment in ["", "a/b", "a b", "a?b", "a#b"] {
        match api.at(segment) {
            Err(Error::InvalidPathSegment(s)) => assert_eq!(s, segment),
            other => panic!("expected InvalidPathSegment, got {other:?}"),
        }
    }
}

#[tokio::test]
async fn bodyless_methods_never_carry_a_body() {
    let (recorder, api) = harness();
    let node = api.at("foo").unwrap();

    node.get(CallOptions::new()).await.unwrap();
    assert_eq!(recorder.last().method, Method::Get);
    assert!(recorder.last().body.is_none());

    node.delete(CallOptions::new()).await.unwrap();
    assert_eq!(recorder.last().method, Method::Delete);
    assert!(recorder.last().body.is_none());

    // Even a body smuggled through `invoke` is dropped for GET.
    node.invoke(Method::Get, Some(json!({"x": 1})), CallOptions::new()).await.unwrap();
    assert!(recorder.last().body.is_none());
}

#[tokio::test]
async fn body_methods_carry_the_serialized_body() {
    let (recorder, api) = harness();
    let node = api.at("echo").unwrap();

    let reply = node.post(json!({"msg": "Hello, World!"}), CallOptions::new()).await.unwrap();
    assert_eq!(reply, json!({"msg": "Hello, World!"}));
    assert_eq!(recorder.last().method, Method::Post);
    assert_eq!(recorder.last().body, Some(json!({"msg": "Hello, World!"})));

    #[derive(serde::Serialize)]
    struct Patch<'a> {
        name: &'a str,
    }
    node.put(Patch { name: "Bar" }, CallOptions::new()).await.unwrap();
    assert_eq!(recorder.last().method, Method::Put);
    assert_eq!(recorder.last().body, Some(json!({"name": "Bar"})));

    node.patch(json!(42), CallOptions::new()).await.unwrap();
    assert_eq!(recorder.last().method, Method::Patch);
}

#[tokio::test]
async fn null_query_values_are_dropped_and_scalars_stringified() {
    let (recorder, api) = harness();
    let options = CallOptions::new().query(QueryInput::map([
        ("a", json!(1)),
        ("gone", json!(null)),
        ("b", json!("x")),
        ("c", json!(false)),
    ]));
    api.at("bar").unwrap().get(options).await.unwrap();

    let query = recorder.last().query;
    assert_eq!(
        query.pairs().unwrap(),
        &[
            ("a".to_owned(), "1".to_owned()),
            ("b".to_owned(), "x".to_owned()),
            ("c".to_owned(), "false".to_owned()),
        ]
    );
}

#[tokio::test]
async fn prebuilt_query_strings_pass_through_verbatim() {
    let (recorder, api) = harness();
    api.at("bar")
        .unwrap()
        .get(CallOptions::new().query("a=1&a=2&flag"))
        .await
        .unwrap();
    assert_eq!(recorder.last().query, Query::Raw("a=1&a=2&flag".to_owned()));
}

#[tokio::test]
async fn unset_morphs_are_the_identity() {
    let (recorder, api) = harness();
    let node = api.at("plain").unwrap();
    node.post(json!({"k": "v"}), CallOptions::new()).await.unwrap();

    let request = recorder.last();
    assert_eq!(request.body, Some(json!({"k": "v"})));
    assert_eq!(request.query, Query::Pairs(Vec::new()));
    assert!(request.headers.is_empty());
}

#[tokio::test]
async fn morph_outputs_reach_the_requester() {
    let (recorder, api) = harness();
    let node = api.at("morphing").unwrap();

    node.set_body_morph(|path, body| {
        assert_eq!(path, "morphing");
        Ok(body.map(|b| json!({ "wrapped": b })))
    });
    node.set_query_morph(|_, mut query| {
        query.set("extra", "1");
        Ok(query)
    });
    node.set_header_morph(|_, mut headers| {
        headers.insert(
            HeaderName::from_static("x-morphed"),
            HeaderValue::from_static("yes"),
        );
        Ok(headers)
    });

    node.post(json!({"a": 1}), CallOptions::new().query(QueryInput::map([("a", json!(1))])))
        .await
        .unwrap();

    let request = recorder.last();
    assert_eq!(request.body, Some(json!({"wrapped": {"a": 1}})));
    assert_eq!(request.query.get("a"), Some("1"));
    assert_eq!(request.query.get("extra"), Some("1"));
    assert_eq!(request.headers.get("x-morphed").unwrap(), "yes");
}

#[tokio::test]
async fn result_morph_shapes_the_returned_value() {
    let recorder = Recorder::with(|_| Ok(json!({"msg": "Hello, World!"})));
    let api = Endpoint::root(recorder.clone());
    let node = api.at("morphing").unwrap();
    node.set_result_morph(|_, result| Ok(result["msg"].clone()));

    let reply = node.get(CallOptions::new()).await.unwrap();
    assert_eq!(reply, json!("Hello, World!"));
}

#[tokio::test]
async fn morphs_do_not_apply_to_parents_or_children() {
    let (recorder, api) = harness();
    let parent = api.at("foo").unwrap();
    parent.set_body_morph(|_, _| Ok(Some(json!("morphed"))));

    // The child inherits nothing.
    parent.at(1u32).unwrap().post(json!("raw"), CallOptions::new()).await.unwrap();
    assert_eq!(recorder.last().body, Some(json!("raw")));

    // The node itself is morphed.
    parent.post(json!("raw"), CallOptions::new()).await.unwrap();
    assert_eq!(recorder.last().body, Some(json!("morphed")));
}

#[tokio::test]
async fn a_failing_result_morph_discards_the_fetched_result() {
    let recorder = Recorder::with(|_| Ok(json!({"id": 1})));
    let api = Endpoint::root(recorder.clone());
    let node = api.at("foo").unwrap();
    node.set_result_morph(|_, _| Err("shape mismatch".into()));

    let err = node.get(CallOptions::new()).await.unwrap_err();
    match err {
        Error::Morph { path, source } => {
            assert_eq!(path, "foo");
            assert_eq!(source.to_string(), "shape mismatch");
        }
        other => panic!("expected Morph error, got {other:?}"),
    }
    // The request itself went out before the morph failed.
    assert_eq!(recorder.count(), 1);
}

#[tokio::test]
async fn cleared_morphs_revert_to_passthrough() {
    let (recorder, api) = harness();
    let node = api.at("foo").unwrap();
    node.set_body_morph(|_, _| Ok(Some(json!("morphed"))));
    node.clear_morphs();

    node.post(json!("raw"), CallOptions::new()).await.unwrap();
    assert_eq!(recorder.last().body, Some(json!("raw")));
}

#[tokio::test]
async fn a_failing_body_morph_aborts_before_dispatch() {
    let (recorder, api) = harness();
    let node = api.at("foo").unwrap();
    node.set_body_morph(|_, _| Err("bad body".into()));

    let err = node.post(json!(1), CallOptions::new()).await.unwrap_err();
    assert!(matches!(err, Error::Morph { .. }));
    assert_eq!(recorder.count(), 0);
}

#[tokio::test]
async fn requester_errors_propagate_unmodified() {
    let recorder = Recorder::with(|request| {
        Err(RestError::new(
            format!("http://h/api/{}", request.endpoint()),
            StatusCode::NOT_FOUND,
            HeaderMap::new(),
            "missing".to_owned(),
        )
        .into())
    });
    let api = Endpoint::root(recorder.clone());

    let err = api.at("nowhere").unwrap().get(CallOptions::new()).await.unwrap_err();
    match err {
        Error::Rest(rest) => {
            assert_eq!(rest.status(), StatusCode::NOT_FOUND);
            assert_eq!(rest.url(), "http://h/api/nowhere");
            assert_eq!(rest.body(), "missing");
        }
        other => panic!("expected Rest error, got {other:?}"),
    }
}

#[tokio::test]
async fn retarget_shares_the_transport_but_drops_hooks_and_cache() {
    let (recorder, api) = harness();
    let old_foo = api.at("foo").unwrap();
    old_foo.set_result_morph(|_, _| Ok(json!("morphed")));

    // Retargeting from a child node still reaches the shared requester.
    let fresh = old_foo.retarget();
    assert!(fresh.path().is_root());
    let new_foo = fresh.at("foo").unwrap();
    assert!(!new_foo.same_node(&old_foo));

    let reply = new_foo.post(json!("raw"), CallOptions::new()).await.unwrap();
    assert_eq!(reply, json!("raw"));

    let morphed = old_foo.post(json!("raw"), CallOptions::new()).await.unwrap();
    assert_eq!(morphed, json!("morphed"));

    // Both trees went through the one recorder.
    assert_eq!(recorder.count(), 2);
}

#[tokio::test]
async fn unconsumed_options_pass_through_to_the_requester() {
    let (recorder, api) = harness();
    api.at("foo")
        .unwrap()
        .get(CallOptions::new().extra("trace-id", json!("abc-123")))
        .await
        .unwrap();
    assert_eq!(recorder.last().extra.get("trace-id"), Some(&json!("abc-123")));
}

#[tokio::test]
async fn per_call_headers_reach_the_descriptor() {
    let (recorder, api) = harness();
    api.at("foo")
        .unwrap()
        .get(CallOptions::new().header(
            HeaderName::from_static("x-request-id"),
            HeaderValue::from_static("7"),
        ))
        .await
        .unwrap();
    assert_eq!(recorder.last().headers.get("x-request-id").unwrap(), "7");
}
