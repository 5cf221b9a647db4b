use std::{fs::{self, File},
          io::ErrorKind,
          path::Path};

use tempfile::TempDir;

use crate::{git,
            git::{r#impl::LocalClient, Branch, Error, Output},
            result_extra::ResultExtra};

/// A clone of the canonical repository in a temporary directory.
///
/// The directory is created empty and removed (with everything in it) on drop.
#[derive(Debug)]
pub struct WorkingCopy {
  dir: TempDir,
  client: LocalClient,
}

impl WorkingCopy {
  pub(super) fn new(client: LocalClient) -> git::Result<Self> {
    let dir = tempfile::Builder::new().prefix("pushjob-").tempdir()?;
    log::debug!("working copy {:?} for {:?}", dir.path(), client.url);

    Ok(Self { dir, client })
  }

  fn git(&self, args: &[&str]) -> git::Result<Output> {
    self.client.git(self.dir.path(), args)
  }
}

impl git::RepoContext for WorkingCopy {
  fn workdir(&self) -> &Path {
    self.dir.path()
  }

  fn clone_repo(&self) -> git::Result<Output> {
    let url = self.client.url.to_string_lossy().to_string();
    self.git(&["clone", "--quiet", &url, "."])
  }

  fn checkout(&self, branch: &Branch) -> git::Result<Output> {
    self.git(&["checkout", "--quiet", &branch.0])
  }

  fn branch_create(&self, branch: &Branch) -> git::Result<Output> {
    self.git(&["checkout", "--quiet", "-b", &branch.0])
  }

  fn add(&self, path: &str) -> git::Result<Output> {
    self.git(&["add", "--", path])
  }

  fn add_all(&self) -> git::Result<Output> {
    self.git(&["add", "-A"])
  }

  fn remove_all(&self) -> git::Result<Output> {
    self.git(&["rm", "-r", "-f", "--quiet", "--ignore-unmatch", "--", "."])
  }

  fn commit_all(&self, message: &str) -> git::Result<Output> {
    self.git(&["commit", "--quiet", "-a", "-m", message])
  }

  fn push_all(&self) -> git::Result<Output> {
    self.git(&["push", "--quiet", "--all"])
  }

  fn push_branch(&self, remote: &str, branch: &Branch) -> git::Result<Output> {
    self.git(&["push", "--quiet", remote, &branch.0])
  }

  fn short_revision(&self) -> git::Result<String> {
    self.git(&["rev-parse", "--short", "HEAD"])
        .map(|Output(out)| out.trim().to_string())
        .filter(|hash| !hash.is_empty(),
                |_| Error::CommandFailed("rev-parse --short HEAD".into(), Output("no revision".into())))
  }

  fn tracked_files(&self) -> git::Result<Vec<String>> {
    self.git(&["ls-files", "-z"]).map(|Output(out)| {
                                   out.split('\0')
                                      .filter(|f| !f.is_empty())
                                      .map(String::from)
                                      .collect()
                                 })
  }

  fn read_file(&self, name: &str) -> git::Result<Option<String>> {
    fs::read(self.dir.path().join(name)).map(Some)
                                        .and_then_err(|e| match e.kind() {
                                          | ErrorKind::NotFound => Ok(None),
                                          | _ => Err(Error::from(e)),
                                        })?
                                        .map(|bytes| String::from_utf8(bytes).map_err(|_| Error::NotText(name.into())))
                                        .transpose()
  }

  fn write_file(&self, name: &str, content: &str) -> git::Result<()> {
    fs::write(self.dir.path().join(name), content).map_err(Error::from)
  }

  fn open_file(&self, name: &str) -> git::Result<File> {
    File::create(self.dir.path().join(name)).map_err(Error::from)
  }
}
