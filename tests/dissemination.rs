mod common;

use std::sync::Arc;

use http::header::{HeaderValue, IF_NONE_MATCH};
use http::Method;

use disadis::auth::Decision;
use disadis::{Disseminator, Request, Status};

use common::{BODY, Failure, Fixed, Recording, body};

fn pipeline(repo: &Arc<Recording>, versioned: bool) -> Disseminator {
    Disseminator::new(repo.clone(), "content")
        .prefix("vecnet:")
        .versioned(versioned)
}

fn if_none_match(req: Request, value: &'static str) -> Request {
    req.with_header(IF_NONE_MATCH, HeaderValue::from_static(value))
}

// ── Success and headers ───────────────────────────────────────────────────────

#[tokio::test]
async fn current_version_is_served_with_descriptor_headers() {
    for versioned in [false, true] {
        let repo = Arc::new(Recording::new());
        let resp = pipeline(&repo, versioned).handle(&Request::get("/abc123")).await;

        assert_eq!(resp.status(), Status::Ok);
        assert_eq!(resp.header("content-type"), Some("application/pdf"));
        assert_eq!(resp.header("content-length"), Some(BODY.len().to_string().as_str()));
        assert_eq!(resp.header("content-disposition"), Some(r#"inline; filename="paper.pdf""#));
        assert_eq!(resp.header("content-transfer-encoding"), Some("binary"));
        assert_eq!(resp.header("cache-control"), Some("private"));
        assert_eq!(resp.header("etag"), Some("abc123.3"));
        assert_eq!(body(resp).await, BODY);
    }
}

#[tokio::test]
async fn trailing_slash_is_ignored() {
    let repo = Arc::new(Recording::new());
    let resp = pipeline(&repo, false).handle(&Request::get("/abc123/")).await;
    assert_eq!(resp.status(), Status::Ok);
}

// ── Scenario A: version pinning and conditional GET ───────────────────────────

#[tokio::test]
async fn matching_version_is_served() {
    let repo = Arc::new(Recording::new());
    let resp = pipeline(&repo, true).handle(&Request::get("/abc123/3")).await;
    assert_eq!(resp.status(), Status::Ok);
    assert_eq!(resp.header("etag"), Some("abc123.3"));
    assert_eq!(body(resp).await, BODY);
}

#[tokio::test]
async fn other_version_is_forbidden_without_fetching_content() {
    let repo = Arc::new(Recording::new());
    let p = pipeline(&repo, true);
    for v in ["0", "2", "4", "5", "300"] {
        let resp = p.handle(&Request::get(&format!("/abc123/{v}"))).await;
        assert_eq!(resp.status(), Status::Forbidden, "version {v}");
    }
    assert_eq!(repo.content_calls(), 0);
}

#[tokio::test]
async fn matching_validator_is_not_modified() {
    let repo = Arc::new(Recording::new());
    let req = if_none_match(Request::get("/abc123"), "abc123.3");
    let resp = pipeline(&repo, false).handle(&req).await;

    assert_eq!(resp.status(), Status::NotModified);
    assert_eq!(resp.header("etag"), Some("abc123.3"));
    assert!(!resp.has_body());
    assert_eq!(repo.info_calls(), 1);
    assert_eq!(repo.content_calls(), 0);
}

#[tokio::test]
async fn validator_on_any_header_line_counts() {
    let repo = Arc::new(Recording::new());
    let req = if_none_match(if_none_match(Request::get("/abc123/3"), "abc123.1"), "abc123.3");
    let resp = pipeline(&repo, true).handle(&req).await;
    assert_eq!(resp.status(), Status::NotModified);
    assert_eq!(repo.content_calls(), 0);
}

#[tokio::test]
async fn stale_validator_gets_full_content() {
    let repo = Arc::new(Recording::new());
    let req = if_none_match(Request::get("/abc123"), "abc123.2");
    let resp = pipeline(&repo, false).handle(&req).await;
    assert_eq!(resp.status(), Status::Ok);
    assert_eq!(body(resp).await, BODY);
}

#[tokio::test]
async fn version_mismatch_wins_over_matching_validator() {
    let repo = Arc::new(Recording::new());
    let req = if_none_match(Request::get("/abc123/5"), "abc123.3");
    let resp = pipeline(&repo, true).handle(&req).await;
    assert_eq!(resp.status(), Status::Forbidden);
}

#[tokio::test]
async fn unparsable_version_id_reads_as_mismatch() {
    let repo = Arc::new(Recording::with_version_id("abc123"));
    let p = pipeline(&repo, true);

    assert_eq!(p.handle(&Request::get("/abc123/0")).await.status(), Status::Forbidden);
    // Without a pinned version the same datastream is still served.
    assert_eq!(p.handle(&Request::get("/abc123")).await.status(), Status::Ok);
}

// ── Scenario B: version segments ──────────────────────────────────────────────

#[tokio::test]
async fn version_segment_on_unversioned_handler_is_not_found() {
    let repo = Arc::new(Recording::new());
    let p = pipeline(&repo, false);
    for path in ["/abc123/3", "/abc123/5", "/abc123/x"] {
        assert_eq!(p.handle(&Request::get(path)).await.status(), Status::NotFound, "{path}");
    }
    assert_eq!(repo.info_calls(), 0);
}

#[tokio::test]
async fn malformed_version_segment_is_not_found() {
    let repo = Arc::new(Recording::new());
    let p = pipeline(&repo, true);
    for path in ["/abc123/-1", "/abc123/v3", "/abc123/3/extra", "/abc123//"] {
        assert_eq!(p.handle(&Request::get(path)).await.status(), Status::NotFound, "{path}");
    }
    assert_eq!(repo.info_calls(), 0);
}

#[tokio::test]
async fn empty_identifier_is_not_found() {
    let repo = Arc::new(Recording::new());
    let resp = pipeline(&repo, true).handle(&Request::get("/")).await;
    assert_eq!(resp.status(), Status::NotFound);
    assert_eq!(repo.info_calls(), 0);
}

// ── Scenario C: repository failures ───────────────────────────────────────────

#[tokio::test]
async fn missing_metadata_is_not_found_and_skips_content() {
    let repo = Arc::new(Recording::new().failing_info(Failure::NotFound));
    let resp = pipeline(&repo, false).handle(&Request::get("/abc123")).await;
    assert_eq!(resp.status(), Status::NotFound);
    assert_eq!(repo.content_calls(), 0);
}

#[tokio::test]
async fn unknown_object_is_not_found() {
    let repo = Arc::new(Recording::new());
    let resp = pipeline(&repo, false).handle(&Request::get("/zzz999")).await;
    assert_eq!(resp.status(), Status::NotFound);
    assert_eq!(repo.content_calls(), 0);
}

#[tokio::test]
async fn metadata_failure_is_a_generic_server_error() {
    let repo = Arc::new(Recording::new().failing_info(Failure::Other));
    let resp = pipeline(&repo, false).handle(&Request::get("/abc123")).await;
    assert_eq!(resp.status(), Status::InternalServerError);
    assert_eq!(body(resp).await, "500 Internal Server Error\n");
    assert_eq!(repo.content_calls(), 0);
}

#[tokio::test]
async fn content_vanishing_after_metadata_is_not_found() {
    let repo = Arc::new(Recording::new().failing_content(Failure::NotFound));
    let resp = pipeline(&repo, false).handle(&Request::get("/abc123")).await;
    assert_eq!(resp.status(), Status::NotFound);
    assert_eq!(repo.content_calls(), 1);
}

#[tokio::test]
async fn content_failure_is_a_generic_server_error() {
    let repo = Arc::new(Recording::new().failing_content(Failure::Other));
    let resp = pipeline(&repo, false).handle(&Request::get("/abc123")).await;
    assert_eq!(resp.status(), Status::InternalServerError);
    let text = body(resp).await;
    assert!(!String::from_utf8_lossy(&text).contains("exploded"));
}

// ── Scenario D: methods ───────────────────────────────────────────────────────

#[tokio::test]
async fn non_get_is_not_found_before_anything_else() {
    let repo = Arc::new(Recording::new());
    let auth = Arc::new(Fixed::new(Decision::Deny));
    let p = pipeline(&repo, true).authorizer(auth.clone());

    for method in [Method::POST, Method::PUT, Method::DELETE, Method::HEAD] {
        let resp = p.handle(&Request::new(method.clone(), "/abc123")).await;
        assert_eq!(resp.status(), Status::NotFound, "{method}");
    }
    assert_eq!(auth.calls(), 0);
    assert_eq!(repo.info_calls(), 0);
}

// ── Authorization ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn decisions_map_to_statuses_without_touching_the_repository() {
    for (decision, status) in [
        (Decision::Deny, Status::Unauthorized),
        (Decision::NotFound, Status::NotFound),
        (Decision::Error, Status::InternalServerError),
    ] {
        let repo = Arc::new(Recording::new());
        let auth = Arc::new(Fixed::new(decision));
        let resp = pipeline(&repo, true)
            .authorizer(auth)
            .handle(&Request::get("/abc123"))
            .await;
        assert_eq!(resp.status(), status, "{decision:?}");
        assert_eq!(repo.info_calls() + repo.content_calls(), 0);
    }
}

#[tokio::test]
async fn authorization_sees_prefixed_identifier_and_allows() {
    let repo = Arc::new(Recording::new());
    let auth = Arc::new(Fixed::new(Decision::Allow));
    let resp = pipeline(&repo, true)
        .authorizer(auth.clone())
        .handle(&Request::get("/abc123/3"))
        .await;
    assert_eq!(resp.status(), Status::Ok);
    assert_eq!(auth.last_pid().as_deref(), Some("vecnet:abc123"));
}

#[tokio::test]
async fn denial_hides_version_information() {
    let repo = Arc::new(Recording::new());
    let auth = Arc::new(Fixed::new(Decision::Deny));
    let versioned = pipeline(&repo, true).authorizer(auth.clone());
    let unversioned = pipeline(&repo, false).authorizer(auth);

    assert_eq!(versioned.handle(&Request::get("/abc123/3")).await.status(), Status::Unauthorized);
    assert_eq!(versioned.handle(&Request::get("/abc123/5")).await.status(), Status::Unauthorized);
    assert_eq!(versioned.handle(&Request::get("/abc123/x")).await.status(), Status::Unauthorized);
    assert_eq!(unversioned.handle(&Request::get("/abc123/3")).await.status(), Status::Unauthorized);
}

// ── Resource release ──────────────────────────────────────────────────────────

#[tokio::test]
async fn byte_source_released_when_response_is_dropped_unread() {
    let repo = Arc::new(Recording::new());
    let resp = pipeline(&repo, false).handle(&Request::get("/abc123")).await;
    assert_eq!(resp.status(), Status::Ok);
    assert!(!repo.released());

    drop(resp);
    assert!(repo.released());
}

#[tokio::test]
async fn byte_source_released_after_full_read() {
    let repo = Arc::new(Recording::new());
    let resp = pipeline(&repo, false).handle(&Request::get("/abc123")).await;
    assert_eq!(body(resp).await, BODY);
    assert!(repo.released());
}

#[tokio::test]
async fn label_with_quotes_stays_one_filename() {
    let mut inner = disadis::repository::MemoryRepository::new();
    inner.insert("p:1", "content", r#"my "best" paper.pdf"#, "application/pdf", "content.1", &b"x"[..]);
    let p = Disseminator::new(Arc::new(inner), "content").prefix("p:");

    let resp = p.handle(&Request::get("/1")).await;
    assert_eq!(
        resp.header("content-disposition"),
        Some(r#"inline; filename="my \"best\" paper.pdf""#)
    );
}
