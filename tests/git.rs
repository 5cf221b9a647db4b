mod common;

use common::*;
use pushjob::{git::{Branch, Client, Error, RepoContext},
              job::{DESCRIPTOR_FILE, READY_MESSAGE, TEMPLATE}};

fn cloned(fx: &Fixture) -> Box<dyn RepoContext> {
  let repo = fx.local_client().open().unwrap();
  repo.clone_repo().unwrap();
  repo.checkout(&Branch::from("master")).unwrap();
  repo
}

#[test]
fn working_copy_is_empty_and_removed_on_drop() {
  let fx = Fixture::new();
  fx.submit(&[("a.txt", "a")]);

  let repo = fx.local_client().open().unwrap();
  let dir = repo.workdir().to_path_buf();

  assert!(dir.is_dir());
  assert_eq!(std::fs::read_dir(&dir).unwrap().count(), 0);

  repo.clone_repo().unwrap();
  assert_eq!(repo.read_file("a.txt").unwrap(), Some("a".to_string()));

  drop(repo);
  assert!(!dir.exists());
}

#[test]
fn working_copy_is_removed_on_error_paths() {
  let fx = Fixture::new();
  fx.submit(&[("a.txt", "a")]);

  let mut dir = None;
  let res = (|| -> pushjob::git::Result<()> {
    let repo = fx.local_client().open()?;
    dir = Some(repo.workdir().to_path_buf());

    repo.clone_repo()?;
    repo.checkout(&Branch::from("does-not-exist"))?;
    Ok(())
  })();

  assert!(matches!(res, Err(Error::CommandFailed(_, _))));
  assert!(!dir.unwrap().exists());
}

#[test]
fn files_branches_and_pushes() {
  let fx = Fixture::new();
  fx.submit(&[("a.txt", "a")]);

  let repo = cloned(&fx);
  assert_eq!(repo.read_file("missing.txt").unwrap(), None);
  assert_eq!(repo.tracked_files().unwrap(), vec!["a.txt".to_string()]);

  let hash = repo.short_revision().unwrap();
  assert!(fx.rev("master").unwrap().starts_with(&hash));

  repo.branch_create(&Branch::from("results")).unwrap();
  repo.write_file("b.txt", "b").unwrap();
  repo.add_all().unwrap();
  repo.commit_all("add b").unwrap();
  repo.push_all().unwrap();

  assert_eq!(fx.branches(), vec!["master".to_string(), "results".to_string()]);
  assert_eq!(fx.show("results", "b.txt"), Some("b".to_string()));
  assert_eq!(fx.show("master", "b.txt"), None);
  assert_eq!(fx.subject("results"), "add b");
}

#[test]
fn push_single_branch() {
  let fx = Fixture::new();
  fx.submit(&[("a.txt", "a")]);

  let repo = cloned(&fx);
  repo.branch_create(&Branch::from("local-only")).unwrap();
  repo.checkout(&Branch::from("master")).unwrap();
  repo.write_file("a.txt", "changed").unwrap();
  repo.commit_all("change a").unwrap();
  repo.push_branch("origin", &Branch::from("master")).unwrap();

  assert_eq!(fx.branches(), vec!["master".to_string()]);
  assert_eq!(fx.show("master", "a.txt"), Some("changed".to_string()));
}

#[test]
fn reset_to_template_is_idempotent() {
  let fx = Fixture::new();
  fx.submit(&[("a.txt", "a"), (DESCRIPTOR_FILE, "[job]\ncommand = ls\n")]);

  let master = Branch::from("master");
  let repo = cloned(&fx);

  assert!(repo.reset_to(&master, DESCRIPTOR_FILE, TEMPLATE, READY_MESSAGE).unwrap());
  assert!(!repo.reset_to(&master, DESCRIPTOR_FILE, TEMPLATE, READY_MESSAGE).unwrap());

  repo.push_all().unwrap();

  assert_eq!(fx.files("master"), vec![DESCRIPTOR_FILE.to_string()]);
  assert_eq!(fx.show("master", DESCRIPTOR_FILE), Some(TEMPLATE.to_string()));
  assert_eq!(fx.subject("master"), READY_MESSAGE);

  // a fresh working copy sees nothing to do either
  let again = cloned(&fx);
  assert!(!again.reset_to(&master, DESCRIPTOR_FILE, TEMPLATE, READY_MESSAGE).unwrap());
}

#[test]
fn reset_removes_extra_files_even_when_descriptor_matches() {
  let fx = Fixture::new();
  fx.submit(&[("extra.sh", "echo hi"), (DESCRIPTOR_FILE, TEMPLATE)]);

  let repo = cloned(&fx);
  assert!(repo.reset_to(&Branch::from("master"), DESCRIPTOR_FILE, TEMPLATE, READY_MESSAGE).unwrap());
  assert_eq!(repo.tracked_files().unwrap(), vec![DESCRIPTOR_FILE.to_string()]);
}

#[test]
fn binary_file_is_not_text() {
  let fx = Fixture::new();
  fx.submit_raw("master", &[(DESCRIPTOR_FILE, &b"\xff\xfe\x00"[..])]);

  let repo = cloned(&fx);

  assert!(matches!(repo.read_file(DESCRIPTOR_FILE), Err(Error::NotText(_))));
  assert!(repo.reset_to(&Branch::from("master"), DESCRIPTOR_FILE, TEMPLATE, READY_MESSAGE).unwrap());
  assert_eq!(repo.read_file(DESCRIPTOR_FILE).unwrap(), Some(TEMPLATE.to_string()));
}
