//! Shared test fixtures

#![allow(dead_code)]

pub mod mock_platform;

pub use mock_platform::{AcceptCall, MockPlatformService};

use chrono::{DateTime, Duration, TimeZone, Utc};
use mr_autopilot::merge::{Classification, ClassifiedMergeRequest};
use mr_autopilot::types::{
    AccessGrant, AccessLevel, BranchProtection, Member, MergeRequest, MergeRequestDetails,
    PipelineStatus, Project,
};

/// Head commit every fixture MR is based on unless overridden
pub const TARGET_HEAD: &str = "aaaa1111";

/// Account that maintains every fixture project
pub const MAINTAINER: u64 = 10;

/// Account with developer access on every fixture project
pub const DEVELOPER: u64 = 20;

/// Account with reporter access on every fixture project
pub const REPORTER: u64 = 30;

pub fn make_project(id: u64, path: &str) -> Project {
    Project {
        id,
        path: path.to_string(),
    }
}

pub fn make_member(id: u64, level: u32) -> Member {
    Member {
        id,
        username: format!("user{id}"),
        access_level: AccessLevel::from(level),
    }
}

/// Maintainer, developer and reporter, plus the bot as maintainer
pub fn standard_members() -> Vec<Member> {
    vec![
        make_member(1, 40),
        make_member(MAINTAINER, 40),
        make_member(DEVELOPER, 30),
        make_member(REPORTER, 20),
    ]
}

pub fn protection(
    branch: &str,
    merge_access: Vec<AccessGrant>,
    push_access: Vec<AccessGrant>,
) -> BranchProtection {
    BranchProtection {
        branch: branch.to_string(),
        merge_access,
        push_access,
    }
}

/// Creation time of fixture MR `iid`: later iids are newer
pub fn created_at(iid: u64) -> DateTime<Utc> {
    let base = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
    base + Duration::minutes(i64::try_from(iid).unwrap())
}

/// An MR that is mergeable now: approved by a maintainer, green pipeline,
/// based on `TARGET_HEAD`
pub fn make_details(iid: u64, target: &str) -> MergeRequestDetails {
    MergeRequestDetails {
        iid,
        title: format!("Change {iid}"),
        source_branch: format!("feature-{iid}"),
        target_branch: target.to_string(),
        is_draft: false,
        work_in_progress: false,
        created_at: created_at(iid),
        head_pipeline: Some(PipelineStatus::Success),
        base_sha: Some(TARGET_HEAD.to_string()),
        has_conflicts: false,
        approved_by: vec![MAINTAINER],
        web_url: format!("https://gitlab.example.com/group/repo/-/merge_requests/{iid}"),
    }
}

/// An MR whose base lags the target head
pub fn needs_rebase(iid: u64, target: &str) -> MergeRequestDetails {
    MergeRequestDetails {
        base_sha: Some("stale000".to_string()),
        ..make_details(iid, target)
    }
}

/// An MR whose pipeline is still running
pub fn running(iid: u64, target: &str) -> MergeRequestDetails {
    MergeRequestDetails {
        head_pipeline: Some(PipelineStatus::Running),
        ..make_details(iid, target)
    }
}

pub fn make_mr(iid: u64, target: &str) -> MergeRequest {
    MergeRequest::from(&make_details(iid, target))
}

/// Planner input for MR `iid`
pub fn classified(iid: u64, classification: Classification) -> ClassifiedMergeRequest {
    ClassifiedMergeRequest {
        mr: make_mr(iid, "main"),
        has_conflicts: false,
        classification,
    }
}

/// Planner input for a conflicted MR `iid`
pub fn classified_conflicted(iid: u64, classification: Classification) -> ClassifiedMergeRequest {
    ClassifiedMergeRequest {
        has_conflicts: true,
        ..classified(iid, classification)
    }
}

/// Mock with one project, standard members and `main` at `TARGET_HEAD`
pub fn standard_mock(project: &Project) -> MockPlatformService {
    let mock = MockPlatformService::new();
    mock.add_project(project.clone());
    mock.set_members(project.id, standard_members());
    mock.set_branch_head("main", TARGET_HEAD);
    mock
}
