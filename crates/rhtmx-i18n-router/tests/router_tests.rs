//! Integration tests for rhtmx-i18n-router
//!
//! Tests load `tests/fixtures/routes.yml` and cover:
//! - Loading sources (errors, merging, prefixes)
//! - Forward lookup (`find`, method filtering, case insensitivity)
//! - URL generation (required / optional parameters, query, full scheme)
//! - Language switching and overloaded parameters
//! - Option filtering
//! - Cache round trip

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use pretty_assertions::assert_eq;
use rhtmx_i18n_router::*;
use rstest::rstest;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn table() -> RouteTable {
    let decls = load_sources(&[RouteSource::new(fixture("routes.yml"))]).unwrap();
    TableBuilder::new().build(&decls).unwrap()
}

fn router_for(method: &str) -> Router {
    let request = RequestContext::new()
        .with_method(method)
        .with_host("www.example.com");
    Router::new(table(), request, "FR")
}

fn router() -> Router {
    router_for("GET")
}

fn params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_empty_source_list() {
    assert!(matches!(load_sources(&[]), Err(RouterError::EmptySource)));
}

#[test]
fn test_invalid_path() {
    let err = load_sources(&[RouteSource::new("/path/does/not/exist.yaml")]).unwrap_err();
    assert!(matches!(err, RouterError::FileNotFound(_)));
}

#[test]
fn test_empty_files_only() {
    let err = load_sources(&[RouteSource::new(fixture("empty.yml"))]).unwrap_err();
    assert!(matches!(err, RouterError::NoRoutes));
}

#[test]
fn test_sources_merge_in_order() {
    let decls = load_sources(&[
        RouteSource::new(fixture("routes.yml")),
        RouteSource::new(fixture("empty.yml")),
        RouteSource::new(fixture("extra.json")),
    ])
    .unwrap();
    let table = TableBuilder::new().build(&decls).unwrap();

    let root = table.get("TEST_ROOT").unwrap();
    assert_eq!(root.langs().collect::<Vec<_>>(), vec!["FR", "EN", "DE"]);
    assert_eq!(root.controller(), "ControllerTest::Root");
    assert_eq!(table.ids().last(), Some("LEGAL"));
}

#[test]
fn test_source_prefix() {
    let decls = load_sources(&[
        RouteSource::new(fixture("routes.yml")),
        RouteSource::new(fixture("extra.json")).with_prefix("SITE_"),
    ])
    .unwrap();
    assert!(decls.get("SITE_LEGAL").is_some());
    assert!(decls.get("LEGAL").is_none());

    // A prefixed partial route has no controller of its own
    let err = TableBuilder::new().build(&decls).unwrap_err();
    assert!(matches!(err, RouterError::MissingController { ref id } if id == "SITE_TEST_ROOT"));
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_root() {
    let router = router();
    let mut route = router.route("TEST_ROOT", Some("FR"));
    assert_eq!(route.id(), "TEST_ROOT");
    assert_eq!(route.lang(), "FR");
    assert_eq!(route.controller(), "ControllerTest::Root");
    assert_eq!(route.option("unexpected"), None);
    assert!(route.options().is_empty());
    assert_eq!(route.url(), "/fr/accueil");
}

#[test]
fn test_base_path_is_joined_to_templates() {
    let mut decls = RouteDeclarations::new();
    decls
        .set("TEST_ROOT", "__", "ControllerTest::Root")
        .set("TEST_ROOT", "FR", "accueil");
    let table = TableBuilder::new().base_path("/fr/").build(&decls).unwrap();
    let mut router = Router::new(table, RequestContext::new(), "FR");

    assert_eq!(router.route("TEST_ROOT", Some("FR")).url(), "/fr/accueil");
    assert_eq!(router.find("/fr/accueil").id(), "TEST_ROOT");
    assert!(router.find("/accueil").is_empty());
}

#[test]
fn test_custom_options() {
    let router = router();
    let route = router.route("TEST_CUSTOM_OPTIONS", Some("FR"));
    assert_eq!(route.option("unexpected"), None);
    assert_eq!(route.option("test_option_1"), Some(&OptionValue::Bool(false)));
    assert_eq!(route.option("test_option_2"), Some(&OptionValue::Bool(true)));
    assert_eq!(route.option("test_option_3"), Some(&OptionValue::Int(1234)));
    assert_eq!(route.option("test_option_4"), Some(&OptionValue::Str("bonjour".into())));
}

#[test]
fn test_required_args() {
    let mut router = router();
    let mut route = router.find("/fr/test-arguments/bonjour/1234567890");
    route.set_query_params(path::parse_query("hello=world"));

    assert_eq!(route.id(), "TEST_REQUIRED_ARGS");
    assert_eq!(route.lang(), "FR");
    assert_eq!(route.controller(), "ControllerTest::Arguments");
    assert_eq!(route.url(), "/fr/test-arguments/bonjour/1234567890?hello=world");
    assert_eq!(route.param("required1"), Some("bonjour"));
    assert_eq!(route.param("required2"), Some("1234567890"));
    assert_eq!(route.param("hello"), Some("world"));
    assert_eq!(route.query_params(), &params(&[("hello", "world")]));
    assert_eq!(
        route.rewrite_params(),
        &params(&[("required1", "bonjour"), ("required2", "1234567890")])
    );

    route.unset_query_param("hello");
    assert_eq!(route.url(), "/fr/test-arguments/bonjour/1234567890");
}

#[test]
fn test_find_attaches_query_string() {
    let mut router = router();
    let route = router.find("/fr/test-arguments/bonjour/1234567890?hello=world");
    assert_eq!(route.id(), "TEST_REQUIRED_ARGS");
    assert_eq!(route.param("required1"), Some("bonjour"));
    assert_eq!(route.param("required2"), Some("1234567890"));
    assert_eq!(route.param("hello"), Some("world"));
}

#[test]
fn test_optional_args() {
    let mut router = router();
    let mut route = router.find("/fr/test-arguments-optionel");
    assert_eq!(route.id(), "TEST_OPTIONAL_ARGS");
    assert_eq!(route.lang(), "FR");
    assert_eq!(route.controller(), "ControllerTest::Arguments");
    assert_eq!(route.url(), "/fr/test-arguments-optionel");

    route.set_rewrite_param("optional", "1234567890");
    assert_eq!(route.param("optional"), Some("1234567890"));
    assert_eq!(route.rewrite_params(), &params(&[("optional", "1234567890")]));
    assert_eq!(route.url(), "/fr/test-arguments-optionel/optional-1234567890");

    route.unset_rewrite_param("optional");
    assert_eq!(route.url(), "/fr/test-arguments-optionel");

    route.set_lang("EN");
    assert_eq!(route.url(), "/en/test-optional-arguments");
    assert!(!route.has_errors());
}

#[test]
fn test_required_and_optional_args() {
    let mut router = router();
    let path = "/fr/test-arguments-optionels-et-obligatoires/hello/12345/world/67890";
    let mut route = router.find(path);
    assert_eq!(route.id(), "TEST_REQUIRED_AND_OPTIONAL_ARGS");
    assert_eq!(route.lang(), "FR");
    assert_eq!(route.controller(), "ControllerTest::Arguments");
    assert_eq!(route.url(), path);

    route
        .set_rewrite_param("required1", "hello")
        .set_rewrite_param("required2", "12345")
        .set_rewrite_param("optional1", "world")
        .set_rewrite_param("optional2", "67890");
    route.unset_rewrite_param("optional1").unset_rewrite_param("optional2");
    assert_eq!(
        route.url(),
        "/fr/test-arguments-optionels-et-obligatoires/hello/12345"
    );
}

// ============================================================================
// Matching
// ============================================================================

#[rstest]
#[case("/FR/TEST-ARGUMENTS/Bonjour/42", "TEST_REQUIRED_ARGS", "FR")]
#[case("en/home/", "TEST_ROOT", "EN")]
#[case("/fr/archives/2024", "TEST_CONSTRAINED_ARGS", "FR")]
#[case("/en/archives/2024/12", "TEST_CONSTRAINED_ARGS", "EN")]
#[case("/fr/archives/24", "", "")]
#[case("/fr/archives/2024/13", "", "")]
#[case("/fr/test-arguments/x/y/z", "", "")]
#[case("/fr/formulaire/contact", "", "")]
fn test_find(#[case] path: &str, #[case] id: &str, #[case] lang: &str) {
    let mut router = router();
    let route = router.find(path);
    assert_eq!(route.id(), id);
    assert_eq!(route.lang(), lang);
}

#[test]
fn test_not_found_is_the_empty_route() {
    let mut router = router();
    let mut route = router.find("/nowhere");
    assert!(route.is_empty());
    assert_eq!(route.url(), "");
    assert!(!route.has_errors());
}

#[test]
fn test_method_filtering() {
    let mut get = router_for("GET");
    assert!(get.find("/fr/formulaire/contact").is_empty());

    let mut post = router_for("POST");
    let route = post.find("/fr/formulaire/contact");
    assert_eq!(route.id(), "TEST_POST_ONLY");
    assert_eq!(route.param("form"), Some("contact"));

    // Unrestricted routes answer every method
    assert_eq!(post.find("/fr/accueil").id(), "TEST_ROOT");
    assert_eq!(post.find("/fr/formulaire/contact/?from=menu").id(), "TEST_POST_ONLY");
}

#[test]
fn test_round_trip_generate_then_find() {
    let mut router = router();
    let mut route = router.url(
        "TEST_REQUIRED_ARGS",
        Some("EN"),
        params(&[("required1", "alpha"), ("required2", "beta")]),
        Params::new(),
        false,
    );
    let url = route.url();
    assert_eq!(url, "/en/test-arguments/alpha/beta");

    let found = router.find(&url);
    assert_eq!(found.id(), "TEST_REQUIRED_ARGS");
    assert_eq!(found.lang(), "EN");
    assert_eq!(found.rewrite_params(), route.rewrite_params());
}

// ============================================================================
// Generation errors
// ============================================================================

#[test]
fn test_missing_required_param_records_one_error() {
    let router = router();
    let mut route = router.url(
        "TEST_REQUIRED_ARGS",
        None,
        params(&[("required1", "alpha")]),
        Params::new(),
        false,
    );
    assert_eq!(route.url(), "");
    assert_eq!(route.errors().len(), 1);
    assert!(route.errors()[0].to_string().contains("required2"));
}

#[test]
fn test_constraint_violation() {
    let router = router();
    let mut route = router.url(
        "TEST_CONSTRAINED_ARGS",
        Some("FR"),
        params(&[("year", "20x4")]),
        Params::new(),
        false,
    );
    assert_eq!(route.url(), "");
    assert_eq!(
        route.errors(),
        &[GenerationError::ParamMismatch {
            id: "TEST_CONSTRAINED_ARGS".into(),
            lang: "FR".into(),
            name: "year".into(),
            regex: "\\d{4}".into(),
            value: "20x4".into(),
        }]
    );
}

#[test]
fn test_debug_hook_receives_errors() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);

    let mut router = router();
    router.set_debug(Some(Arc::new(move |err: &GenerationError| {
        sink.lock().unwrap().push(err.clone());
    })));

    let mut route = router.route("TEST_ROOT", Some("IT"));
    assert_eq!(route.url(), "");
    assert_eq!(
        seen.lock().unwrap().as_slice(),
        &[GenerationError::UnknownLanguage {
            id: "TEST_ROOT".into(),
            lang: "IT".into(),
        }]
    );
}

// ============================================================================
// Switching
// ============================================================================

#[test]
fn test_switch_lang_after_run() {
    let request = RequestContext::new()
        .with_host("www.example.com")
        .with_uri("/fr/test-arguments/bonjour/42?hello=world");
    let mut router = Router::new(table(), request, "FR");
    router.run();
    assert_eq!(router.current().id(), "TEST_REQUIRED_ARGS");

    router.overload_params("EN", [("required1", "hello there")]);
    assert_eq!(
        router.switch_lang("EN", false).url(),
        "/en/test-arguments/hello%20there/42?hello=world"
    );
    assert_eq!(
        router.switch_lang("EN", true).url(),
        "http://www.example.com/en/test-arguments/hello%20there/42?hello=world"
    );
}

// ============================================================================
// Filtering
// ============================================================================

#[test]
fn test_filter_by_option() {
    let router = router();
    let filter = Filter::new().option("test_option_3", "1234", OptionType::Int);
    let ids: Vec<String> = router
        .filter(&filter)
        .iter()
        .map(|route| route.id().to_string())
        .collect();
    assert_eq!(ids, vec!["TEST_CUSTOM_OPTIONS", "TEST_POST_ONLY"]);

    let strict = Filter::new()
        .option("test_option_3", "1234", OptionType::Int)
        .methods(["POST"])
        .lang("EN");
    let routes = router.filter(&strict);
    let ids: Vec<&str> = routes.iter().map(Route::id).collect();
    assert_eq!(ids, vec!["TEST_POST_ONLY"]);
    assert!(routes.iter().all(|route| route.lang() == "EN"));

    // Routes without declared methods never satisfy a method filter
    let post_only: Vec<String> = router
        .filter(&Filter::new().methods(["POST"]))
        .iter()
        .map(|route| route.id().to_string())
        .collect();
    assert_eq!(post_only, vec!["TEST_POST_ONLY"]);

    let bool_filter = Filter::new().option("test_option_2", "1", OptionType::Bool);
    assert_eq!(router.filter(&bool_filter).len(), 1);
}

// ============================================================================
// Cache
// ============================================================================

#[test]
fn test_cache_idempotence() {
    let fresh = table();
    let json = fresh.to_cache_json().unwrap();
    let restored = RouteTable::from_cache_json(&json).unwrap();
    assert_eq!(restored.export(), fresh.export());

    let request = RequestContext::new().with_host("www.example.com");
    let mut before = Router::new(fresh, request.clone(), "FR");
    let mut after = Router::new(restored, request, "FR");

    for path in [
        "/fr/accueil",
        "/fr/test-arguments/bonjour/1234567890?hello=world",
        "/en/test-optional-arguments/optional-7",
        "/en/archives/2024/05",
        "/nowhere",
    ] {
        let mut a = before.find(path);
        let mut b = after.find(path);
        assert_eq!(a.id(), b.id(), "{}", path);
        assert_eq!(a.rewrite_params(), b.rewrite_params(), "{}", path);
        assert_eq!(a.url(), b.url(), "{}", path);
    }

    assert_eq!(
        before.route("TEST_OPTIONAL_ARGS", Some("EN")).url(),
        after.route("TEST_OPTIONAL_ARGS", Some("EN")).url()
    );
}
