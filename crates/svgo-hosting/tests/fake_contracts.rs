//! Contract tests for the in-memory hosting fake.
//!
//! The pipeline tests rely on the fake behaving like a content-addressed
//! git host; these tests pin that behavior down.

use svgo_hosting::fakes::MemoryHosting;
use svgo_hosting::{
    ChangeSource, ChangeStatus, Encoding, FileChange, HostingApi, HostingError, Operation,
    TreeEntry,
};

// ===========================================================================
// git data
// ===========================================================================

#[tokio::test]
async fn get_ref_resolves_seeded_branch() {
    let host = MemoryHosting::new();
    let tip = host.seed_branch("heads/main", "initial");

    let git_ref = host.get_ref("heads/main").await.unwrap();
    assert_eq!(git_ref.sha, tip);
    assert_eq!(git_ref.name, "heads/main");
}

#[tokio::test]
async fn get_ref_missing_branch_is_not_found() {
    let host = MemoryHosting::new();
    let err = host.get_ref("heads/nope").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn blobs_are_content_addressed() {
    let host = MemoryHosting::new();
    let a = host.create_blob("<svg/>", Encoding::Utf8).await.unwrap();
    let b = host.create_blob("<svg/>", Encoding::Utf8).await.unwrap();
    let c = host.create_blob("<svg></svg>", Encoding::Utf8).await.unwrap();

    assert_eq!(a, b);
    assert_ne!(a, c);
    assert_eq!(host.blob_count(), 2);
}

#[tokio::test]
async fn blob_over_limit_is_rejected() {
    let host = MemoryHosting::new();
    host.set_max_blob_size(4);
    let err = host.create_blob("<svg/>", Encoding::Utf8).await.unwrap_err();
    assert!(matches!(err, HostingError::BlobTooLarge { size: 6, limit: 4 }));
}

#[tokio::test]
async fn tree_commit_update_round_trip() {
    let host = MemoryHosting::new();
    let tip = host.seed_branch("heads/main", "initial");
    let base = host.get_commit(&tip).await.unwrap();

    let blob = host.create_blob("<svg/>", Encoding::Utf8).await.unwrap();
    let tree = host
        .create_tree(&base.tree_sha, &[TreeEntry::file("a.svg", &blob.sha)])
        .await
        .unwrap();
    let commit = host
        .create_commit("optimize", &tree, &[tip.clone()])
        .await
        .unwrap();
    host.update_ref("heads/main", &commit.sha).await.unwrap();

    assert_eq!(host.branch_tip("heads/main"), Some(commit.sha.clone()));
    let files = host.commit_files(&commit.sha).unwrap();
    assert_eq!(files.get("a.svg"), Some(&blob.sha));
    assert_eq!(host.commit(&commit.sha).unwrap().parents, vec![tip]);
}

#[tokio::test]
async fn tree_rejects_unknown_blob() {
    let host = MemoryHosting::new();
    let tip = host.seed_branch("heads/main", "initial");
    let base = host.get_commit(&tip).await.unwrap();

    let err = host
        .create_tree(&base.tree_sha, &[TreeEntry::file("a.svg", "deadbeef")])
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn update_ref_refuses_non_fast_forward() {
    let host = MemoryHosting::new();
    let tip = host.seed_branch("heads/main", "initial");
    let base = host.get_commit(&tip).await.unwrap();
    let orphan = host
        .create_commit("orphan", &base.tree_sha, &[])
        .await
        .unwrap();

    let err = host.update_ref("heads/main", &orphan.sha).await.unwrap_err();
    assert!(matches!(err, HostingError::Http { status: 422, .. }));
    assert_eq!(host.branch_tip("heads/main"), Some(tip));
}

// ===========================================================================
// pull request data
// ===========================================================================

#[tokio::test]
async fn list_changes_preserves_order() {
    let host = MemoryHosting::new();
    let source = ChangeSource::PullRequest { number: 3 };
    let changes = vec![
        FileChange::new("z.svg", ChangeStatus::Added),
        FileChange::new("a.svg", ChangeStatus::Modified),
    ];
    host.set_changes(source.clone(), changes.clone());

    assert_eq!(host.list_changes(&source).await.unwrap(), changes);
}

#[tokio::test]
async fn comments_default_to_empty() {
    let host = MemoryHosting::new();
    assert!(host.list_comments(9).await.unwrap().is_empty());
}

#[tokio::test]
async fn get_file_is_scoped_to_ref() {
    let host = MemoryHosting::new();
    host.put_file("abc", "a.svg", "PHN2Zy8+", Encoding::Base64);

    let file = host.get_file("a.svg", "abc").await.unwrap();
    assert_eq!(file.encoding, Encoding::Base64);
    assert!(host.get_file("a.svg", "def").await.unwrap_err().is_not_found());
}

// ===========================================================================
// accounting and injection
// ===========================================================================

#[tokio::test]
async fn injected_failures_are_counted_as_calls() {
    let host = MemoryHosting::new();
    host.seed_branch("heads/main", "initial");
    host.fail(Operation::GetRef);

    let err = host.get_ref("heads/main").await.unwrap_err();
    assert!(matches!(err, HostingError::Injected { .. }));
    assert_eq!(host.calls(Operation::GetRef), 1);
    assert_eq!(host.write_calls(), 0);
}

#[tokio::test]
async fn create_comment_is_recorded() {
    let host = MemoryHosting::new();
    host.create_comment(5, "done").await.unwrap();
    assert_eq!(host.posted_comments(), vec![(5, "done".to_string())]);
}
