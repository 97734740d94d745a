//! End-to-end tests against the in-memory service.

use std::sync::Arc;
use std::time::Duration;

use blog_client::{
    ApiClient, ApiError, ClientConfig, CommentError, CommentTree, LikeToggle, PostOutcome,
    Session, Threads, ToggleOutcome,
};
use blog_mock_server::{Db, MockServer, Route};
use blog_shared::{CommentId, LikeState, PostId, UserId};

struct Fixture {
    server: MockServer,
    api: Arc<ApiClient>,
    post: PostId,
    alice: Session,
    bob: Session,
}

/// alice writes one post; bob is a second reader.
async fn fixture(nested: bool) -> Fixture {
    let mut db = Db::new();
    db.set_nested_comments(nested);
    let alice = db.add_user("alice", "alice-token");
    db.add_user("bob", "bob-token");
    let post = db.add_post(alice, "Hello", "<p>First post</p>");

    let server = MockServer::start(db).await.unwrap();
    let api = Arc::new(ApiClient::new(&ClientConfig::new(server.base_url())).unwrap());

    Fixture {
        server,
        api,
        post,
        alice: Session::new("alice", "alice-token"),
        bob: Session::new("bob", "bob-token"),
    }
}

fn ids(threads: &Threads) -> Vec<(CommentId, Vec<CommentId>)> {
    let mut out: Vec<_> = threads
        .roots
        .iter()
        .map(|t| (t.root.id, t.replies.iter().map(|r| r.id).collect()))
        .collect();
    out.sort();
    out
}

#[tokio::test]
async fn test_post_and_reply_show_up_after_reload() {
    let fx = fixture(false).await;
    let tree = CommentTree::new(fx.api.clone(), fx.post);

    let root = match tree.post(&fx.bob, "Nice post", None).await.unwrap() {
        PostOutcome::Posted { id } => id.unwrap(),
        PostOutcome::Skipped => panic!("content was not blank"),
    };
    tree.post(&fx.alice, "Thanks!", Some(root)).await.unwrap();

    let threads = tree.threads();
    assert_eq!(threads.roots.len(), 1);
    assert_eq!(threads.roots[0].root.content, "Nice post");
    assert_eq!(threads.roots[0].replies.len(), 1);
    assert_eq!(threads.roots[0].replies[0].author_username, "alice");
    assert_eq!(threads.total(), 2);
    assert!(tree.status().error().is_none());

    // Each successful mutation is followed by a list call.
    assert_eq!(fx.server.db().requests(Route::ListComments), 2);
}

#[tokio::test]
async fn test_blank_post_sends_nothing() {
    let fx = fixture(false).await;
    let tree = CommentTree::new(fx.api.clone(), fx.post);

    let outcome = tree.post(&fx.bob, "  \n\t", None).await.unwrap();
    assert_eq!(outcome, PostOutcome::Skipped);

    let db = fx.server.db();
    assert_eq!(db.requests(Route::CreateComment), 0);
    assert_eq!(db.requests(Route::ListComments), 0);
}

#[tokio::test]
async fn test_deleting_root_removes_its_replies() {
    let fx = fixture(false).await;
    let (root, other) = {
        let mut db = fx.server.db();
        let bob = UserId(2);
        let root = db.add_comment(fx.post, bob, "root", None);
        db.add_comment(fx.post, bob, "reply", Some(root));
        let other = db.add_comment(fx.post, bob, "other", None);
        (root, other)
    };

    let tree = CommentTree::new(fx.api.clone(), fx.post);
    tree.load(&fx.bob).await.unwrap();
    assert_eq!(tree.len(), 3);

    tree.delete(&fx.bob, root).await.unwrap();

    let threads = tree.threads();
    assert_eq!(threads.roots.len(), 1);
    assert_eq!(threads.roots[0].root.id, other);
    assert_eq!(threads.total(), 1);
    assert_eq!(fx.server.db().comment_count(fx.post), 1);
}

#[tokio::test]
async fn test_delete_permissions() {
    let fx = fixture(false).await;
    let carol = Session::new("carol", "carol-token");
    let comment = {
        let mut db = fx.server.db();
        db.add_user("carol", "carol-token");
        db.add_comment(fx.post, UserId(2), "bob's", None)
    };

    let tree = CommentTree::new(fx.api.clone(), fx.post);
    tree.load(&carol).await.unwrap();

    let err = tree.delete(&carol, comment).await.unwrap_err();
    assert!(matches!(err, CommentError::Authorization(_)));
    assert!(matches!(err.api_error(), ApiError::Forbidden));
    // A failed delete keeps the last good view.
    assert_eq!(tree.len(), 1);
    assert!(tree.status().error().is_some());

    // The post author may remove any comment on their post.
    tree.delete(&fx.alice, comment).await.unwrap();
    assert!(tree.is_empty());
    assert!(tree.status().error().is_none());
}

#[tokio::test]
async fn test_anonymous_mutation_is_rejected_without_request() {
    let fx = fixture(false).await;
    let tree = CommentTree::new(fx.api.clone(), fx.post);

    let err = tree
        .post(&Session::anonymous(), "hello", None)
        .await
        .unwrap_err();
    assert!(matches!(err, CommentError::Authorization(_)));
    assert_eq!(fx.server.db().requests(Route::CreateComment), 0);
}

#[tokio::test]
async fn test_unknown_token_is_unauthorized() {
    let fx = fixture(false).await;
    let stranger = Session::new("mallory", "forged");

    let err = fx.api.list_posts(&stranger).await.unwrap_err();
    assert!(matches!(err, ApiError::Unauthorized));

    let tree = CommentTree::new(fx.api.clone(), fx.post);
    let err = tree.post(&stranger, "hi", None).await.unwrap_err();
    assert!(matches!(err, CommentError::Authorization(_)));
}

#[tokio::test]
async fn test_failed_post_keeps_view() {
    let fx = fixture(false).await;
    let tree = CommentTree::new(fx.api.clone(), fx.post);
    tree.post(&fx.bob, "first", None).await.unwrap();

    fx.server.db().fail_next(Route::CreateComment, 1);
    let err = tree.post(&fx.bob, "second", None).await.unwrap_err();
    assert!(matches!(err, CommentError::Post(_)));
    assert!(matches!(err.api_error(), ApiError::Server(_)));
    assert_eq!(tree.len(), 1);

    // Retry goes through.
    tree.post(&fx.bob, "second", None).await.unwrap();
    assert_eq!(tree.len(), 2);
}

#[tokio::test]
async fn test_nested_listing_builds_same_tree() {
    let flat = fixture(false).await;
    let nested = fixture(true).await;

    for fx in [&flat, &nested] {
        let mut db = fx.server.db();
        let bob = UserId(2);
        let a = db.add_comment(fx.post, bob, "a", None);
        let b = db.add_comment(fx.post, bob, "b", None);
        db.add_comment(fx.post, bob, "a1", Some(a));
        db.add_comment(fx.post, bob, "b1", Some(b));
        db.add_comment(fx.post, bob, "a2", Some(a));
    }

    let flat_tree = CommentTree::new(flat.api.clone(), flat.post);
    let nested_tree = CommentTree::new(nested.api.clone(), nested.post);
    let flat_threads = flat_tree.load(&flat.bob).await.unwrap();
    let nested_threads = nested_tree.load(&nested.bob).await.unwrap();

    assert_eq!(ids(&flat_threads), ids(&nested_threads));
    assert_eq!(nested_threads.total(), 5);
    assert!(nested_threads.orphaned.is_empty());
    assert_eq!(nested_tree.len(), 5);
}

#[tokio::test]
async fn test_toggle_like_commits_server_state() {
    let fx = fixture(false).await;
    {
        let mut db = fx.server.db();
        db.like(fx.post, UserId(1));
    }
    let post = fx.api.get_post(&fx.bob, fx.post).await.unwrap();
    assert_eq!(post.like_state(), LikeState::new(false, 1));

    let toggle = LikeToggle::from_post(fx.api.clone(), &post);
    let outcome = toggle.toggle(&fx.bob).await.unwrap();
    assert_eq!(outcome, ToggleOutcome::Reconciled(LikeState::new(true, 2)));
    assert_eq!(toggle.state(), LikeState::new(true, 2));

    toggle.toggle(&fx.bob).await.unwrap();
    assert_eq!(toggle.state(), LikeState::new(false, 1));
    assert_eq!(fx.server.db().like_count(fx.post), 1);
}

#[tokio::test]
async fn test_toggle_like_server_count_wins() {
    let fx = fixture(false).await;
    // Stale local view: the server already has one like from alice.
    fx.server.db().like(fx.post, UserId(1));

    let toggle = LikeToggle::new(fx.api.clone(), fx.post, LikeState::new(false, 0));
    toggle.toggle(&fx.bob).await.unwrap();
    assert_eq!(toggle.state(), LikeState::new(true, 2));
}

#[tokio::test]
async fn test_failed_toggle_restores_exact_state() {
    let fx = fixture(false).await;
    fx.server.db().fail_next(Route::ToggleLike, 1);

    let before = LikeState::new(false, 7);
    let toggle = LikeToggle::new(fx.api.clone(), fx.post, before);

    let err = toggle.toggle(&fx.bob).await.unwrap_err();
    assert!(matches!(err.api_error(), ApiError::Server(_)));
    assert_eq!(toggle.state(), before);
    assert!(!toggle.is_pending());
    assert_eq!(fx.server.db().like_count(fx.post), 0);
}

#[tokio::test]
async fn test_double_toggle_sends_one_request() {
    let fx = fixture(false).await;
    let toggle = LikeToggle::new(fx.api.clone(), fx.post, LikeState::new(false, 0));

    let (first, second) = tokio::join!(toggle.toggle(&fx.bob), toggle.toggle(&fx.bob));
    assert_eq!(first.unwrap(), ToggleOutcome::Reconciled(LikeState::new(true, 1)));
    assert_eq!(second.unwrap(), ToggleOutcome::Ignored);
    assert_eq!(fx.server.db().requests(Route::ToggleLike), 1);
}

#[tokio::test]
async fn test_slow_toggle_times_out_and_rolls_back() {
    let fx = fixture(false).await;
    fx.server
        .db()
        .delay(Route::ToggleLike, Duration::from_secs(2));

    let before = LikeState::new(true, 3);
    let toggle = LikeToggle::new(fx.api.clone(), fx.post, before)
        .with_timeout(Duration::from_millis(50));

    let err = toggle.toggle(&fx.bob).await.unwrap_err();
    assert!(matches!(err.api_error(), ApiError::Timeout));
    assert_eq!(toggle.state(), before);
}

#[tokio::test]
async fn test_post_crud_and_user_listings() {
    let fx = fixture(false).await;

    let created = fx
        .api
        .create_post(&fx.bob, "Second", "<p>by bob</p>")
        .await
        .unwrap();
    assert_eq!(created.author, "bob");
    assert_eq!(created.like_count, 0);

    let posts = fx.api.list_posts(&Session::anonymous()).await.unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0].id, created.id);

    let updated = fx
        .api
        .update_post(&fx.bob, created.id, "Second, edited", "<p>by bob</p>")
        .await
        .unwrap();
    assert_eq!(updated.title, "Second, edited");

    let err = fx
        .api
        .update_post(&fx.alice, created.id, "Hijacked", "")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Forbidden));

    let err = fx
        .api
        .create_post(&fx.bob, "   ", "empty title")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    let mine = fx.api.user_posts(&fx.bob, "bob").await.unwrap();
    assert_eq!(mine.len(), 1);

    fx.api.delete_post(&fx.bob, created.id).await.unwrap();
    let err = fx.api.get_post(&fx.bob, created.id).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound));
}

#[tokio::test]
async fn test_user_comments_listing() {
    let fx = fixture(false).await;
    let tree = CommentTree::new(fx.api.clone(), fx.post);
    tree.post(&fx.bob, "one", None).await.unwrap();
    tree.post(&fx.alice, "two", None).await.unwrap();

    let bobs = fx.api.user_comments(&fx.alice, "bob").await.unwrap();
    assert_eq!(bobs.len(), 1);
    assert_eq!(bobs[0].content, "one");

    let err = fx.api.user_comments(&fx.alice, "nobody").await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound));
}
