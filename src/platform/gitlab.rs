//! GitLab platform service implementation

use crate::error::{Error, Result};
use crate::platform::PlatformService;
use crate::types::{
    AcceptOptions, AccessGrant, AccessLevel, BranchProtection, Member, MergeRequest,
    MergeRequestDetails, MergeResult, PipelineStatus, Project, RoleClass, User,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::LazyLock;
use tracing::{debug, trace};
use url::Url;

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Page size for list endpoints (GitLab's maximum)
const PER_PAGE: u32 = 100;

/// Header carrying the next page number; empty on the last page
const NEXT_PAGE_HEADER: &str = "x-next-page";

/// Title markers GitLab treats as draft: a known prefix, or a bare "Draft"
static DRAFT_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(\[draft\]|\(draft\)|draft:|draft\s+-|draft\s*$|\[wip\]|wip:)")
        .expect("draft title pattern is valid")
});

/// GitLab service using reqwest
pub struct GitLabService {
    client: Client,
    token: String,
    api_base: String,
}

#[derive(Deserialize)]
struct ApiUser {
    id: u64,
    username: String,
}

#[derive(Deserialize)]
struct ApiProject {
    id: u64,
    path_with_namespace: String,
}

#[derive(Deserialize)]
struct ApiMember {
    id: u64,
    username: String,
    access_level: AccessLevel,
}

#[derive(Deserialize)]
struct ApiProtectedBranch {
    name: String,
    #[serde(default)]
    merge_access_levels: Vec<ApiAccessGrant>,
    #[serde(default)]
    push_access_levels: Vec<ApiAccessGrant>,
}

#[derive(Deserialize)]
struct ApiAccessGrant {
    access_level: Option<u32>,
    user_id: Option<u64>,
    group_id: Option<u64>,
    access_level_description: Option<String>,
}

#[derive(Deserialize)]
struct ApiMergeRequest {
    iid: u64,
    title: String,
    source_branch: String,
    target_branch: String,
    #[serde(default)]
    draft: bool,
    created_at: DateTime<Utc>,
    web_url: String,
}

/// Single-MR response; carries fields the listing omits
#[derive(Deserialize)]
struct ApiMergeRequestDetails {
    iid: u64,
    title: String,
    source_branch: String,
    target_branch: String,
    #[serde(default)]
    draft: bool,
    work_in_progress: Option<bool>,
    created_at: DateTime<Utc>,
    head_pipeline: Option<ApiPipeline>,
    diff_refs: Option<ApiDiffRefs>,
    #[serde(default)]
    has_conflicts: bool,
    web_url: String,
}

#[derive(Deserialize)]
struct ApiPipeline {
    status: PipelineStatus,
}

#[derive(Deserialize)]
struct ApiDiffRefs {
    base_sha: Option<String>,
}

#[derive(Deserialize)]
struct ApiApprovalState {
    #[serde(default)]
    rules: Vec<ApiApprovalRule>,
}

#[derive(Deserialize)]
struct ApiApprovalRule {
    #[serde(default)]
    approved_by: Vec<ApiUser>,
}

#[derive(Deserialize)]
struct ApiBranch {
    commit: ApiCommit,
}

#[derive(Deserialize)]
struct ApiCommit {
    id: String,
}

#[derive(Deserialize)]
struct ApiMergeResponse {
    state: String,
    merge_commit_sha: Option<String>,
    #[serde(default)]
    merge_when_pipeline_succeeds: bool,
}

impl From<ApiAccessGrant> for AccessGrant {
    fn from(grant: ApiAccessGrant) -> Self {
        if let Some(user_id) = grant.user_id {
            return Self::User(user_id);
        }
        let description = grant
            .access_level_description
            .unwrap_or_else(|| "unknown".to_string());
        if let Some(group_id) = grant.group_id {
            return Self::Unrecognized(format!("group {group_id} ({description})"));
        }
        match grant.access_level {
            Some(level) if level == AccessLevel::NoAccess.as_u32() => Self::Role(RoleClass::NoOne),
            Some(level) if level == AccessLevel::Developer.as_u32() => {
                Self::Role(RoleClass::DevelopersAndMaintainers)
            }
            Some(level) if level == AccessLevel::Maintainer.as_u32() => {
                Self::Role(RoleClass::Maintainers)
            }
            Some(level) => Self::Unrecognized(format!("access level {level} ({description})")),
            None => Self::Unrecognized(format!("grant without access level ({description})")),
        }
    }
}

impl From<ApiProtectedBranch> for BranchProtection {
    fn from(rule: ApiProtectedBranch) -> Self {
        Self {
            branch: rule.name,
            merge_access: rule.merge_access_levels.into_iter().map(Into::into).collect(),
            push_access: rule.push_access_levels.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<ApiMergeRequest> for MergeRequest {
    fn from(mr: ApiMergeRequest) -> Self {
        Self {
            iid: mr.iid,
            title: mr.title,
            source_branch: mr.source_branch,
            target_branch: mr.target_branch,
            is_draft: mr.draft,
            created_at: mr.created_at,
            web_url: mr.web_url,
        }
    }
}

/// Whether a title carries a draft/WIP marker
fn is_draft_title(title: &str) -> bool {
    DRAFT_TITLE.is_match(title)
}

/// Whether a wildcard protection name such as `release/*` covers `branch`
///
/// `*` matches any run of characters, including `/`.
fn wildcard_covers(pattern: &str, branch: &str) -> bool {
    if !pattern.contains('*') {
        return false;
    }
    let expr = format!("^{}$", regex::escape(pattern).replace(r"\*", ".*"));
    Regex::new(&expr).is_ok_and(|re| re.is_match(branch))
}

/// Fold every wildcard rule covering `branch` into one protection
///
/// A user allowed by any matching rule may merge, so grants are unioned.
fn combine_wildcard_rules(
    rules: Vec<ApiProtectedBranch>,
    branch: &str,
) -> Option<BranchProtection> {
    rules
        .into_iter()
        .filter(|rule| wildcard_covers(&rule.name, branch))
        .map(BranchProtection::from)
        .reduce(|mut combined, rule| {
            combined.branch = format!("{}, {}", combined.branch, rule.branch);
            combined.merge_access.extend(rule.merge_access);
            combined.push_access.extend(rule.push_access);
            combined
        })
}

/// Parse the next page number from a list response, if any
fn next_page(response: &Response) -> Option<u32> {
    response
        .headers()
        .get(NEXT_PAGE_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

impl GitLabService {
    /// Create a new GitLab service for the instance at `base_url`
    pub fn new(token: String, base_url: &str) -> Result<Self> {
        let url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid GitLab URL '{base_url}': {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::Config(format!(
                "GitLab URL must use http or https: {base_url}"
            )));
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::GitLabApi(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            token,
            api_base: format!("{}/api/v4", url.as_str().trim_end_matches('/')),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    fn project_url(project_id: u64, path: &str) -> String {
        format!("/projects/{project_id}{path}")
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.header("PRIVATE-TOKEN", &self.token)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let value = self
            .authed(self.client.get(self.api_url(path)))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(e.to_string()))?
            .json()
            .await?;
        Ok(value)
    }

    /// Fetch every page of a list endpoint
    async fn get_all<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let url = self.api_url(path);
        let mut items = Vec::new();
        let mut page = 1;

        loop {
            trace!(path, page, "fetching page");
            let response = self
                .authed(self.client.get(&url))
                .query(query)
                .query(&[("page", page), ("per_page", PER_PAGE)])
                .send()
                .await?
                .error_for_status()
                .map_err(|e| Error::GitLabApi(e.to_string()))?;

            let next = next_page(&response);
            let batch: Vec<T> = response.json().await?;
            items.extend(batch);

            match next {
                Some(n) if n > page => page = n,
                _ => break,
            }
        }

        Ok(items)
    }

    async fn get_approvers(&self, project_id: u64, iid: u64) -> Result<Vec<u64>> {
        let state: ApiApprovalState = self
            .get_json(&Self::project_url(
                project_id,
                &format!("/merge_requests/{iid}/approval_state"),
            ))
            .await?;

        let mut approvers: Vec<u64> = state
            .rules
            .into_iter()
            .flat_map(|rule| rule.approved_by.into_iter().map(|u| u.id))
            .collect();
        approvers.sort_unstable();
        approvers.dedup();
        Ok(approvers)
    }
}

#[async_trait]
impl PlatformService for GitLabService {
    async fn current_user(&self) -> Result<User> {
        let user: ApiUser = self.get_json("/user").await?;
        debug!(user_id = user.id, username = %user.username, "authenticated");
        Ok(User {
            id: user.id,
            username: user.username,
        })
    }

    async fn get_project(&self, project_id: u64) -> Result<Project> {
        let project: ApiProject = self.get_json(&Self::project_url(project_id, "")).await?;
        Ok(Project {
            id: project.id,
            path: project.path_with_namespace,
        })
    }

    async fn list_member_projects(&self) -> Result<Vec<Project>> {
        let projects: Vec<ApiProject> = self
            .get_all(
                "/projects",
                &[("membership", "true"), ("archived", "false"), ("simple", "true")],
            )
            .await?;
        debug!(count = projects.len(), "listed member projects");
        Ok(projects
            .into_iter()
            .map(|p| Project {
                id: p.id,
                path: p.path_with_namespace,
            })
            .collect())
    }

    async fn list_members(&self, project_id: u64) -> Result<Vec<Member>> {
        let members: Vec<ApiMember> = self
            .get_all(&Self::project_url(project_id, "/members/all"), &[])
            .await?;
        debug!(project_id, count = members.len(), "listed project members");
        Ok(members
            .into_iter()
            .map(|m| Member {
                id: m.id,
                username: m.username,
                access_level: m.access_level,
            })
            .collect())
    }

    async fn get_branch_protection(
        &self,
        project_id: u64,
        branch: &str,
    ) -> Result<Option<BranchProtection>> {
        debug!(project_id, branch, "getting branch protection");
        let url = self.api_url(&Self::project_url(
            project_id,
            &format!("/protected_branches/{}", urlencoding::encode(branch)),
        ));

        let response = self.authed(self.client.get(&url)).send().await?;
        if response.status() != StatusCode::NOT_FOUND {
            let rule: ApiProtectedBranch = response
                .error_for_status()
                .map_err(|e| Error::GitLabApi(e.to_string()))?
                .json()
                .await?;
            return Ok(Some(rule.into()));
        }

        // The single-rule lookup only knows exact names
        let rules: Vec<ApiProtectedBranch> = self
            .get_all(&Self::project_url(project_id, "/protected_branches"), &[])
            .await?;
        let protection = combine_wildcard_rules(rules, branch);
        match &protection {
            Some(rule) => {
                debug!(project_id, branch, rules = %rule.branch, "branch matches wildcard rule");
            }
            None => debug!(project_id, branch, "branch is not protected"),
        }
        Ok(protection)
    }

    async fn list_open_merge_requests(&self, project_id: u64) -> Result<Vec<MergeRequest>> {
        let mrs: Vec<ApiMergeRequest> = self
            .get_all(
                &Self::project_url(project_id, "/merge_requests"),
                &[
                    ("state", "opened"),
                    ("wip", "no"),
                    ("order_by", "created_at"),
                    ("sort", "asc"),
                ],
            )
            .await?;
        debug!(project_id, count = mrs.len(), "listed open MRs");
        Ok(mrs.into_iter().map(Into::into).collect())
    }

    async fn get_merge_request(&self, project_id: u64, iid: u64) -> Result<MergeRequestDetails> {
        debug!(project_id, mr_iid = iid, "getting MR details");
        let mr: ApiMergeRequestDetails = self
            .get_json(&Self::project_url(project_id, &format!("/merge_requests/{iid}")))
            .await?;
        let approved_by = self.get_approvers(project_id, iid).await?;

        let work_in_progress = mr
            .work_in_progress
            .unwrap_or_else(|| is_draft_title(&mr.title));

        Ok(MergeRequestDetails {
            iid: mr.iid,
            title: mr.title,
            source_branch: mr.source_branch,
            target_branch: mr.target_branch,
            is_draft: mr.draft,
            work_in_progress,
            created_at: mr.created_at,
            head_pipeline: mr.head_pipeline.map(|p| p.status),
            base_sha: mr.diff_refs.and_then(|d| d.base_sha),
            has_conflicts: mr.has_conflicts,
            approved_by,
            web_url: mr.web_url,
        })
    }

    async fn get_branch_head(&self, project_id: u64, branch: &str) -> Result<String> {
        let branch_info: ApiBranch = self
            .get_json(&Self::project_url(
                project_id,
                &format!("/repository/branches/{}", urlencoding::encode(branch)),
            ))
            .await?;
        Ok(branch_info.commit.id)
    }

    async fn accept_merge_request(
        &self,
        project_id: u64,
        iid: u64,
        options: AcceptOptions,
    ) -> Result<MergeResult> {
        debug!(
            project_id,
            mr_iid = iid,
            squash = options.squash,
            when_pipeline_succeeds = options.merge_when_pipeline_succeeds,
            "accepting MR"
        );
        let url = self.api_url(&Self::project_url(
            project_id,
            &format!("/merge_requests/{iid}/merge"),
        ));

        let response: ApiMergeResponse = self
            .authed(self.client.put(&url))
            .json(&serde_json::json!({
                "squash": options.squash,
                "merge_when_pipeline_succeeds": options.merge_when_pipeline_succeeds,
            }))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(format!("Merge failed: {e}")))?
            .json()
            .await?;

        let result = MergeResult {
            merged: response.state == "merged",
            auto_merge_armed: response.merge_when_pipeline_succeeds,
            sha: response.merge_commit_sha,
        };
        debug!(
            project_id,
            mr_iid = iid,
            merged = result.merged,
            auto_merge_armed = result.auto_merge_armed,
            sha = ?result.sha,
            "accept complete"
        );
        Ok(result)
    }

    async fn rebase_merge_request(&self, project_id: u64, iid: u64) -> Result<()> {
        debug!(project_id, mr_iid = iid, "requesting rebase");
        let url = self.api_url(&Self::project_url(
            project_id,
            &format!("/merge_requests/{iid}/rebase"),
        ));

        self.authed(self.client.put(&url))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| Error::GitLabApi(format!("Rebase failed: {e}")))?;
        Ok(())
    }
}
