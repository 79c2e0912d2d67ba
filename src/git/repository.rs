use crate::domain::ReleaseTag;
use crate::error::{Backend, Result, VoyagerError};
use git2::{Direction, ErrorCode, Oid, PushOptions, RemoteCallbacks, Repository as Git2Repo};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

/// Tag store backed by a git remote.
///
/// Tags are created locally and pushed; reads go straight to the remote
/// (`ls-remote`) so the local ref cache never decides what exists.
pub struct Git2TagStore {
    repo: Mutex<Git2Repo>,
    remote: String,
}

impl Git2TagStore {
    /// Open or discover a git repository, using `remote` as the tag store
    pub fn open<P: AsRef<Path>>(path: P, remote: impl Into<String>) -> Result<Self> {
        let repo = Git2Repo::discover(path)
            .map_err(|e| VoyagerError::config(format!("Not in a git repository: {}", e)))?;

        Ok(Self::from_git2(repo, remote))
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo, remote: impl Into<String>) -> Self {
        Git2TagStore {
            repo: Mutex::new(repo),
            remote: remote.into(),
        }
    }

    /// URL of the configured remote, used to infer owner/name
    pub fn remote_url(&self) -> Result<Option<String>> {
        let repo = self.repo();
        let remote = repo.find_remote(&self.remote).map_err(|e| {
            VoyagerError::config(format!("Remote '{}' not found: {}", self.remote, e))
        })?;
        Ok(remote.url().ok().map(|url| url.to_string()))
    }

    fn repo(&self) -> MutexGuard<'_, Git2Repo> {
        self.repo.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Read tag refs straight from the remote.
    ///
    /// Annotated tags are reported by the remote twice; the peeled `^{}`
    /// entry carries the commit and wins.
    fn remote_tags(&self, repo: &Git2Repo) -> Result<BTreeMap<String, String>> {
        let operation = "list tags";
        let mut remote = repo
            .find_remote(&self.remote)
            .map_err(|e| network(operation, e))?;
        let connection = remote
            .connect_auth(Direction::Fetch, Some(remote_callbacks()), None)
            .map_err(|e| network(operation, e))?;

        let mut direct = BTreeMap::new();
        let mut peeled = BTreeMap::new();
        for head in connection.list().map_err(|e| network(operation, e))? {
            let Some(tag) = head.name().strip_prefix("refs/tags/") else {
                continue;
            };
            match tag.strip_suffix("^{}") {
                Some(base) => peeled.insert(base.to_string(), head.oid().to_string()),
                None => direct.insert(tag.to_string(), head.oid().to_string()),
            };
        }

        direct.extend(peeled);
        Ok(direct)
    }

    /// Push a refspec, turning a per-ref rejection into an error message
    fn push(&self, repo: &Git2Repo, refspec: &str, operation: &str) -> Result<()> {
        let mut remote = repo
            .find_remote(&self.remote)
            .map_err(|e| network(operation, e))?;

        let rejection: RefCell<Option<String>> = RefCell::new(None);
        let mut callbacks = remote_callbacks();
        callbacks.push_update_reference(|refname, status| {
            if let Some(status) = status {
                debug!(refname, status, "remote rejected reference update");
                *rejection.borrow_mut() = Some(status.to_string());
            }
            Ok(())
        });

        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);

        let pushed = remote.push(&[refspec], Some(&mut push_options));
        drop(push_options);

        pushed.map_err(|e| network(operation, e))?;
        match rejection.into_inner() {
            Some(status) => Err(VoyagerError::Network {
                backend: Backend::TagStore,
                operation: operation.to_string(),
                reason: format!("remote rejected update: {}", status),
            }),
            None => Ok(()),
        }
    }

    fn delete_local(repo: &Git2Repo, name: &str) -> Result<bool> {
        match repo.find_reference(&format!("refs/tags/{}", name)) {
            Ok(mut reference) => {
                reference
                    .delete()
                    .map_err(|e| network(&format!("delete local tag {}", name), e))?;
                Ok(true)
            }
            Err(e) if e.code() == ErrorCode::NotFound => Ok(false),
            Err(e) => Err(network(&format!("delete local tag {}", name), e)),
        }
    }
}

impl super::TagStore for Git2TagStore {
    fn head_commit(&self) -> Result<String> {
        let repo = self.repo();
        let head = repo
            .head()
            .and_then(|head| head.peel_to_commit())
            .map_err(|e| network("resolve HEAD", e))?;
        Ok(head.id().to_string())
    }

    fn create_tag(&self, name: &str, commit: &str) -> Result<()> {
        let operation = format!("create tag {}", name);
        let repo = self.repo();

        if self.remote_tags(&repo)?.contains_key(name) {
            return Err(VoyagerError::conflict(Backend::TagStore, name));
        }

        let oid = Oid::from_str(commit).map_err(|e| {
            VoyagerError::validation(format!("Invalid commit id '{}': {}", commit, e))
        })?;
        let object = repo
            .find_object(oid, None)
            .map_err(|e| network(&operation, e))?;

        // a local ref the remote does not have is stale and gets replaced
        repo.tag_lightweight(name, &object, true)
            .map_err(|e| network(&operation, e))?;

        let refspec = format!("refs/tags/{0}:refs/tags/{0}", name);
        if let Err(err) = self.push(&repo, &refspec, &operation) {
            // keep the local view in line with the remote
            let cleanup = Self::delete_local(&repo, name);
            return Err(failed_push(name, err, cleanup));
        }

        debug!(tag = name, commit, remote = %self.remote, "tag pushed");
        Ok(())
    }

    fn delete_tag(&self, name: &str) -> Result<()> {
        let operation = format!("delete tag {}", name);
        let repo = self.repo();

        if !self.remote_tags(&repo)?.contains_key(name) {
            Self::delete_local(&repo, name)?;
            return Err(VoyagerError::not_found(Backend::TagStore, name));
        }

        self.push(&repo, &format!(":refs/tags/{}", name), &operation)?;
        Self::delete_local(&repo, name)?;

        debug!(tag = name, remote = %self.remote, "tag deleted");
        Ok(())
    }

    fn list_tags(&self) -> Result<Vec<ReleaseTag>> {
        let repo = self.repo();
        Ok(self
            .remote_tags(&repo)?
            .into_iter()
            .map(|(name, commit)| ReleaseTag::new(name, commit))
            .collect())
    }
}

/// Error for a rejected tag push. A failed local cleanup is only logged so the
/// push error, and its conflict classification, is what the caller sees.
fn failed_push(name: &str, err: VoyagerError, cleanup: Result<bool>) -> VoyagerError {
    if let Err(cleanup) = cleanup {
        warn!(tag = name, error = %cleanup, "could not remove local tag after failed push");
    }
    let rejected = matches!(
        &err,
        VoyagerError::Network { reason, .. }
            if reason.contains("already exists") || reason.contains("non-fast-forward")
    );
    if rejected {
        VoyagerError::conflict(Backend::TagStore, name)
    } else {
        err
    }
}

fn network(operation: &str, err: git2::Error) -> VoyagerError {
    VoyagerError::network(Backend::TagStore, operation, err.message())
}

/// Credentials for fetch and push: SSH keys from ~/.ssh, then the SSH
/// agent, then git's default credential helpers.
fn remote_callbacks<'a>() -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(|_url, username_from_url, allowed_types| {
        let username = username_from_url.unwrap_or("git");
        if allowed_types.contains(git2::CredentialType::SSH_KEY) {
            if let Some(home) = dirs::home_dir() {
                for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let path = home.join(".ssh").join(key);
                    if path.exists() {
                        if let Ok(cred) = git2::Cred::ssh_key(username, None, &path, None) {
                            return Ok(cred);
                        }
                    }
                }
            }

            if let Ok(cred) = git2::Cred::ssh_key_from_agent(username) {
                return Ok(cred);
            }
        }

        git2::Cred::default()
    });
    callbacks
}
