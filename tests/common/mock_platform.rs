//! Mock platform service for testing
//!
//! These are test utilities - not all may be used in every test binary.

#![allow(dead_code)]

use async_trait::async_trait;
use mr_autopilot::error::{Error, Result};
use mr_autopilot::platform::PlatformService;
use mr_autopilot::types::{
    AcceptOptions, BranchProtection, Member, MergeRequest, MergeRequestDetails, MergeResult,
    Project, User,
};
use std::collections::HashMap;
use std::sync::Mutex;

/// Call record for `accept_merge_request`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptCall {
    pub project_id: u64,
    pub iid: u64,
    pub options: AcceptOptions,
}

/// Simple mock platform service for testing
///
/// Hand-written rather than generated so responses can be set per branch
/// and per MR.
///
/// Features:
/// - Configurable responses per project, branch and MR
/// - Call tracking for verification
/// - Error injection for failure path testing
///
/// Unset responses default to: unprotected branches, no members, no MRs.
/// Unset MR details, branch heads and projects are errors.
pub struct MockPlatformService {
    user: Mutex<User>,
    projects: Mutex<HashMap<u64, Project>>,
    member_projects: Mutex<Vec<Project>>,
    members: Mutex<HashMap<u64, Vec<Member>>>,
    protections: Mutex<HashMap<String, Option<BranchProtection>>>,
    merge_requests: Mutex<HashMap<u64, Vec<MergeRequest>>>,
    details: Mutex<HashMap<u64, MergeRequestDetails>>,
    branch_heads: Mutex<HashMap<String, String>>,
    accept_responses: Mutex<HashMap<u64, MergeResult>>,
    // Call tracking
    protection_calls: Mutex<Vec<String>>,
    details_calls: Mutex<Vec<u64>>,
    branch_head_calls: Mutex<Vec<String>>,
    accept_calls: Mutex<Vec<AcceptCall>>,
    rebase_calls: Mutex<Vec<u64>>,
    // Error injection
    error_on_current_user: Mutex<Option<String>>,
    error_on_list_members: Mutex<HashMap<u64, String>>,
    error_on_list_mrs: Mutex<Option<String>>,
    error_on_protection: Mutex<HashMap<String, String>>,
    error_on_details: Mutex<HashMap<u64, String>>,
    error_on_accept: Mutex<HashMap<u64, String>>,
    error_on_rebase: Mutex<HashMap<u64, String>>,
}

impl Default for MockPlatformService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPlatformService {
    /// Create a mock acting as `@autopilot` (ID 1)
    pub fn new() -> Self {
        Self {
            user: Mutex::new(User {
                id: 1,
                username: "autopilot".to_string(),
            }),
            projects: Mutex::new(HashMap::new()),
            member_projects: Mutex::new(Vec::new()),
            members: Mutex::new(HashMap::new()),
            protections: Mutex::new(HashMap::new()),
            merge_requests: Mutex::new(HashMap::new()),
            details: Mutex::new(HashMap::new()),
            branch_heads: Mutex::new(HashMap::new()),
            accept_responses: Mutex::new(HashMap::new()),
            protection_calls: Mutex::new(Vec::new()),
            details_calls: Mutex::new(Vec::new()),
            branch_head_calls: Mutex::new(Vec::new()),
            accept_calls: Mutex::new(Vec::new()),
            rebase_calls: Mutex::new(Vec::new()),
            error_on_current_user: Mutex::new(None),
            error_on_list_members: Mutex::new(HashMap::new()),
            error_on_list_mrs: Mutex::new(None),
            error_on_protection: Mutex::new(HashMap::new()),
            error_on_details: Mutex::new(HashMap::new()),
            error_on_accept: Mutex::new(HashMap::new()),
            error_on_rebase: Mutex::new(HashMap::new()),
        }
    }

    // === Response setup ===

    /// Set the acting account
    pub fn set_user(&self, id: u64, username: &str) {
        *self.user.lock().unwrap() = User {
            id,
            username: username.to_string(),
        };
    }

    /// Register a project for `get_project`
    pub fn add_project(&self, project: Project) {
        self.projects.lock().unwrap().insert(project.id, project);
    }

    /// Set the projects returned by `list_member_projects`
    pub fn set_member_projects(&self, projects: Vec<Project>) {
        *self.member_projects.lock().unwrap() = projects;
    }

    /// Set the members of a project
    pub fn set_members(&self, project_id: u64, members: Vec<Member>) {
        self.members.lock().unwrap().insert(project_id, members);
    }

    /// Set the protection rule for a branch (`None` = unprotected)
    pub fn set_protection(&self, branch: &str, rule: Option<BranchProtection>) {
        self.protections
            .lock()
            .unwrap()
            .insert(branch.to_string(), rule);
    }

    /// Add an open MR with its details
    pub fn add_merge_request(&self, project_id: u64, details: MergeRequestDetails) {
        self.merge_requests
            .lock()
            .unwrap()
            .entry(project_id)
            .or_default()
            .push(MergeRequest::from(&details));
        self.details.lock().unwrap().insert(details.iid, details);
    }

    /// Set the head commit of a branch
    pub fn set_branch_head(&self, branch: &str, sha: &str) {
        self.branch_heads
            .lock()
            .unwrap()
            .insert(branch.to_string(), sha.to_string());
    }

    /// Override the accept response for an MR
    pub fn set_accept_response(&self, iid: u64, result: MergeResult) {
        self.accept_responses.lock().unwrap().insert(iid, result);
    }

    // === Error injection methods ===

    /// Make `current_user` return an error
    pub fn fail_current_user(&self, msg: &str) {
        *self.error_on_current_user.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `list_members` fail for a project
    pub fn fail_list_members(&self, project_id: u64, msg: &str) {
        self.error_on_list_members
            .lock()
            .unwrap()
            .insert(project_id, msg.to_string());
    }

    /// Make `list_open_merge_requests` return an error
    pub fn fail_list_merge_requests(&self, msg: &str) {
        *self.error_on_list_mrs.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `get_branch_protection` fail for a branch
    pub fn fail_protection(&self, branch: &str, msg: &str) {
        self.error_on_protection
            .lock()
            .unwrap()
            .insert(branch.to_string(), msg.to_string());
    }

    /// Make `get_merge_request` fail for an MR
    pub fn fail_details(&self, iid: u64, msg: &str) {
        self.error_on_details
            .lock()
            .unwrap()
            .insert(iid, msg.to_string());
    }

    /// Make `accept_merge_request` fail for an MR
    pub fn fail_accept(&self, iid: u64, msg: &str) {
        self.error_on_accept
            .lock()
            .unwrap()
            .insert(iid, msg.to_string());
    }

    /// Make `rebase_merge_request` fail for an MR
    pub fn fail_rebase(&self, iid: u64, msg: &str) {
        self.error_on_rebase
            .lock()
            .unwrap()
            .insert(iid, msg.to_string());
    }

    // === Call tracking ===

    /// Branches whose protection was requested, in call order
    pub fn get_protection_calls(&self) -> Vec<String> {
        self.protection_calls.lock().unwrap().clone()
    }

    /// MRs whose details were requested, in call order
    pub fn get_details_calls(&self) -> Vec<u64> {
        self.details_calls.lock().unwrap().clone()
    }

    /// Branches whose head was requested, in call order
    pub fn get_branch_head_calls(&self) -> Vec<String> {
        self.branch_head_calls.lock().unwrap().clone()
    }

    /// Accept calls, in call order
    pub fn get_accept_calls(&self) -> Vec<AcceptCall> {
        self.accept_calls.lock().unwrap().clone()
    }

    /// Rebased MRs, in call order
    pub fn get_rebase_calls(&self) -> Vec<u64> {
        self.rebase_calls.lock().unwrap().clone()
    }

    /// Whether any write was issued
    pub fn has_writes(&self) -> bool {
        !self.accept_calls.lock().unwrap().is_empty()
            || !self.rebase_calls.lock().unwrap().is_empty()
    }

    /// Assert the MRs accepted, in order
    pub fn assert_accepted(&self, expected: &[u64]) {
        let iids: Vec<u64> = self.get_accept_calls().iter().map(|c| c.iid).collect();
        assert_eq!(iids, expected, "accepted MRs mismatch");
    }

    /// Assert the MRs rebased, in order
    pub fn assert_rebased(&self, expected: &[u64]) {
        assert_eq!(self.get_rebase_calls(), expected, "rebased MRs mismatch");
    }
}

fn injected(slot: &Mutex<Option<String>>) -> Result<()> {
    match slot.lock().unwrap().as_ref() {
        Some(msg) => Err(Error::Platform(msg.clone())),
        None => Ok(()),
    }
}

fn injected_for<K: std::hash::Hash + Eq>(slot: &Mutex<HashMap<K, String>>, key: &K) -> Result<()> {
    match slot.lock().unwrap().get(key) {
        Some(msg) => Err(Error::Platform(msg.clone())),
        None => Ok(()),
    }
}

#[async_trait]
impl PlatformService for MockPlatformService {
    async fn current_user(&self) -> Result<User> {
        injected(&self.error_on_current_user)?;
        Ok(self.user.lock().unwrap().clone())
    }

    async fn get_project(&self, project_id: u64) -> Result<Project> {
        self.projects
            .lock()
            .unwrap()
            .get(&project_id)
            .cloned()
            .ok_or_else(|| Error::GitLabApi(format!("404 Not Found: project {project_id}")))
    }

    async fn list_member_projects(&self) -> Result<Vec<Project>> {
        Ok(self.member_projects.lock().unwrap().clone())
    }

    async fn list_members(&self, project_id: u64) -> Result<Vec<Member>> {
        injected_for(&self.error_on_list_members, &project_id)?;
        Ok(self
            .members
            .lock()
            .unwrap()
            .get(&project_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_branch_protection(
        &self,
        _project_id: u64,
        branch: &str,
    ) -> Result<Option<BranchProtection>> {
        self.protection_calls
            .lock()
            .unwrap()
            .push(branch.to_string());
        injected_for(&self.error_on_protection, &branch.to_string())?;
        Ok(self
            .protections
            .lock()
            .unwrap()
            .get(branch)
            .cloned()
            .flatten())
    }

    async fn list_open_merge_requests(&self, project_id: u64) -> Result<Vec<MergeRequest>> {
        injected(&self.error_on_list_mrs)?;
        Ok(self
            .merge_requests
            .lock()
            .unwrap()
            .get(&project_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn get_merge_request(&self, _project_id: u64, iid: u64) -> Result<MergeRequestDetails> {
        self.details_calls.lock().unwrap().push(iid);
        injected_for(&self.error_on_details, &iid)?;
        self.details
            .lock()
            .unwrap()
            .get(&iid)
            .cloned()
            .ok_or_else(|| Error::GitLabApi(format!("404 Not Found: MR !{iid}")))
    }

    async fn get_branch_head(&self, _project_id: u64, branch: &str) -> Result<String> {
        self.branch_head_calls
            .lock()
            .unwrap()
            .push(branch.to_string());
        self.branch_heads
            .lock()
            .unwrap()
            .get(branch)
            .cloned()
            .ok_or_else(|| Error::GitLabApi(format!("404 Not Found: branch {branch}")))
    }

    async fn accept_merge_request(
        &self,
        project_id: u64,
        iid: u64,
        options: AcceptOptions,
    ) -> Result<MergeResult> {
        self.accept_calls.lock().unwrap().push(AcceptCall {
            project_id,
            iid,
            options,
        });
        injected_for(&self.error_on_accept, &iid)?;

        let armed = options.merge_when_pipeline_succeeds;
        Ok(self
            .accept_responses
            .lock()
            .unwrap()
            .get(&iid)
            .cloned()
            .unwrap_or(MergeResult {
                merged: !armed,
                auto_merge_armed: armed,
                sha: (!armed).then(|| format!("merged{iid}")),
            }))
    }

    async fn rebase_merge_request(&self, _project_id: u64, iid: u64) -> Result<()> {
        self.rebase_calls.lock().unwrap().push(iid);
        injected_for(&self.error_on_rebase, &iid)
    }
}
