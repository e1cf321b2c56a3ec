//! Root discovery and folder change detection against the local store.
//!
//! A folder scan diffs the files on disk against the stored inventory by
//! project-relative path, rewrites the project's totals and appends one
//! activity entry when anything changed. Each scan is one transaction.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::clock::{to_wire, Clock};
use crate::config::ScanSettings;
use crate::db::Database;
use crate::error::{Result, TrackError};
use crate::models::{
    FileRecord, NewProject, Project, ProjectFilter, RootScanSummary, ScanAllSummary, ScanError,
    ScanSummary,
};
use crate::scan::walker::{list_subdirectories, FolderWalker, WalkedFile};

/// Scans projects and roots tracked in a [`Database`].
pub struct FolderMonitor<'a> {
    db: &'a Database,
    settings: &'a ScanSettings,
    clock: &'a dyn Clock,
}

fn signed(v: u64) -> i64 {
    i64::try_from(v).unwrap_or(i64::MAX)
}

fn is_modified(previous: &FileRecord, current: &WalkedFile) -> bool {
    let content_changed = match (&previous.file_hash, &current.hash) {
        (Some(old), Some(new)) => old != new,
        _ => false,
    };
    previous.size != current.size || previous.last_modified != current.last_modified || content_changed
}

impl<'a> FolderMonitor<'a> {
    pub fn new(db: &'a Database, settings: &'a ScanSettings, clock: &'a dyn Clock) -> Self {
        Self {
            db,
            settings,
            clock,
        }
    }

    /// Scan one project folder and record what changed since the last scan.
    pub fn scan_project(&self, project_id: i64) -> Result<ScanSummary> {
        let project = self
            .db
            .get_project(project_id)?
            .ok_or(TrackError::ProjectNotFound { id: project_id })?;
        let folder = Path::new(&project.folder_path);
        if !folder.is_dir() {
            return Err(TrackError::FolderNotFound {
                path: project.folder_path.clone(),
            });
        }

        let walked = FolderWalker::new(self.settings).walk(folder)?;
        let now = to_wire(self.clock.now());

        let summary = self.db.in_transaction(|db| apply_scan(db, &project, &walked, &now))?;
        tracing::info!(
            project = project.id,
            added = summary.files_added,
            modified = summary.files_modified,
            deleted = summary.files_deleted,
            size_change = summary.size_change,
            "scanned {}",
            project.name
        );
        Ok(summary)
    }

    /// Discover projects under a root: new subdirectories become projects,
    /// tracked projects whose folder vanished are deactivated.
    ///
    /// A missing or unreadable root path is reported in the summary, not as an error.
    pub fn scan_root(&self, root_id: i64) -> Result<RootScanSummary> {
        let root = self
            .db
            .get_root(root_id)?
            .ok_or(TrackError::RootNotFound { id: root_id })?;
        let root_path = Path::new(&root.path);
        if !root_path.is_dir() {
            tracing::warn!("projects root path does not exist: {}", root.path);
            return Ok(RootScanSummary {
                error: Some("Path does not exist".into()),
                ..Default::default()
            });
        }
        let subdirs = match list_subdirectories(root_path) {
            Ok(dirs) => dirs,
            Err(e) => {
                tracing::warn!("cannot read projects root {}: {e}", root.path);
                return Ok(RootScanSummary {
                    error: Some(e.to_string()),
                    ..Default::default()
                });
            }
        };
        let now = to_wire(self.clock.now());

        let summary = self.db.in_transaction(|db| {
            let existing: HashMap<String, Project> = db
                .projects_for_root(root_id)?
                .into_iter()
                .map(|p| (p.folder_path.clone(), p))
                .collect();
            let mut summary = RootScanSummary::default();
            let mut current = HashSet::new();

            for dir in &subdirs {
                let folder_path = dir.to_string_lossy().into_owned();
                if !existing.contains_key(&folder_path) {
                    // Registered by hand or under another root: leave it alone.
                    if db.get_project_by_path(&folder_path)?.is_none() {
                        let mut new = NewProject::from_path(&folder_path, None);
                        new.root = Some(root_id);
                        db.insert_project(&new, true, &now)?;
                        summary.new_projects += 1;
                    }
                }
                current.insert(folder_path);
            }

            for (path, project) in &existing {
                if project.active && !current.contains(path) {
                    db.set_project_active(project.id, false)?;
                    summary.removed_projects += 1;
                }
            }

            db.set_root_last_scan(root_id, &now)?;
            Ok(summary)
        })?;
        tracing::info!(
            root = root_id,
            new = summary.new_projects,
            removed = summary.removed_projects,
            "discovered projects under {}",
            root.name
        );
        Ok(summary)
    }

    /// Discovery over every auto-discover root, then a scan of every active project.
    ///
    /// Per-project failures are collected rather than aborting the run.
    pub fn scan_all(&self) -> Result<ScanAllSummary> {
        let mut all = ScanAllSummary::default();
        for root in self.db.list_roots()? {
            let result = self.scan_root(root.id)?;
            all.discovery.insert(root.name, result);
        }

        let active = self.db.list_projects(&ProjectFilter::active())?;
        all.total_projects = active.len() as u64;
        for project in &active {
            match self.scan_project(project.id) {
                Ok(scan) => all.record(&scan),
                Err(e) => {
                    tracing::warn!("scan of {} failed: {e}", project.name);
                    all.errors.push(ScanError {
                        project: project.name.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        let (total_files, total_size) = self.db.active_totals()?;
        all.total_files = total_files;
        all.total_size = total_size;
        Ok(all)
    }
}

fn apply_scan(db: &Database, project: &Project, walked: &[WalkedFile], now: &str) -> Result<ScanSummary> {
    let previous: HashMap<String, FileRecord> = db
        .files_for_project(project.id)?
        .into_iter()
        .map(|f| (f.path.clone(), f))
        .collect();

    let mut summary = ScanSummary::default();
    let mut new_total: u64 = 0;

    for file in walked {
        new_total += file.size;
        match previous.get(&file.relative_path) {
            None => {
                db.insert_file(project.id, &file.to_record())?;
                summary.files_added += 1;
            }
            Some(prev) if is_modified(prev, file) => {
                let mut updated = prev.clone();
                updated.size = file.size;
                updated.last_modified.clone_from(&file.last_modified);
                updated.file_hash.clone_from(&file.hash);
                db.update_file(&updated)?;
                summary.files_modified += 1;
            }
            Some(prev) if prev.file_hash.is_none() && file.hash.is_some() => {
                // First hashed scan of an unchanged file.
                let mut updated = prev.clone();
                updated.file_hash.clone_from(&file.hash);
                db.update_file(&updated)?;
            }
            Some(_) => {}
        }
    }

    let current: HashSet<&str> = walked.iter().map(|f| f.relative_path.as_str()).collect();
    for (path, prev) in &previous {
        if !current.contains(path.as_str()) {
            db.delete_file(prev.id)?;
            summary.files_deleted += 1;
        }
    }

    summary.size_change = signed(new_total) - signed(project.total_size);
    db.update_project_totals(project.id, walked.len() as u64, new_total, now)?;
    if summary.has_changes() {
        db.insert_activity(project.id, now, &summary)?;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::reconcile;
    use crate::clock::FixedClock;
    use crate::models::NewRoot;
    use chrono::{TimeZone, Utc};
    use std::fs;
    use tempfile::TempDir;

    fn clock() -> FixedClock {
        FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap())
    }

    fn setup() -> (Database, TempDir) {
        (Database::open_in_memory().unwrap(), TempDir::new().unwrap())
    }

    fn add_project(db: &Database, dir: &Path) -> i64 {
        let new = NewProject::from_path(&dir.to_string_lossy(), None);
        db.insert_project(&new, false, "2024-01-01T00:00:00.000000Z")
            .unwrap()
    }

    #[test]
    fn first_scan_adds_everything() {
        let (db, tmp) = setup();
        fs::write(tmp.path().join("a.pdf"), "12345").unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();
        fs::write(tmp.path().join("sub/b.jpg"), "123").unwrap();
        let pid = add_project(&db, tmp.path());

        let settings = ScanSettings::default();
        let clock = clock();
        let summary = FolderMonitor::new(&db, &settings, &clock)
            .scan_project(pid)
            .unwrap();
        assert_eq!(summary.files_added, 2);
        assert_eq!(summary.size_change, 8);

        let project = db.get_project(pid).unwrap().unwrap();
        assert_eq!(project.total_files, 2);
        assert_eq!(project.total_size, 8);
        assert_eq!(project.last_scan.as_deref(), Some("2024-06-01T09:00:00.000000Z"));
        let log = db.all_activity(pid).unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].timestamp, "2024-06-01T09:00:00.000000Z");
    }

    #[test]
    fn rescan_detects_modify_delete_and_add() {
        let (db, tmp) = setup();
        fs::write(tmp.path().join("keep.txt"), "same").unwrap();
        fs::write(tmp.path().join("grow.txt"), "x").unwrap();
        fs::write(tmp.path().join("gone.txt"), "bye").unwrap();
        let pid = add_project(&db, tmp.path());
        let settings = ScanSettings::default();
        let clock = clock();
        let monitor = FolderMonitor::new(&db, &settings, &clock);
        monitor.scan_project(pid).unwrap();

        fs::write(tmp.path().join("grow.txt"), "xxxxxxxx").unwrap();
        fs::remove_file(tmp.path().join("gone.txt")).unwrap();
        fs::write(tmp.path().join("new.txt"), "hi").unwrap();

        let summary = monitor.scan_project(pid).unwrap();
        assert_eq!(summary.files_added, 1);
        assert_eq!(summary.files_modified, 1);
        assert_eq!(summary.files_deleted, 1);
        assert_eq!(summary.size_change, 7 - 3 + 2);

        let project = db.get_project(pid).unwrap().unwrap();
        let files = db.files_for_project(pid).unwrap();
        let log = db.all_activity(pid).unwrap();
        assert_eq!(log.len(), 2);
        assert!(reconcile(&project, &files, &log).consistent);
    }

    #[test]
    fn unchanged_folder_logs_nothing() {
        let (db, tmp) = setup();
        fs::write(tmp.path().join("a.txt"), "abc").unwrap();
        let pid = add_project(&db, tmp.path());
        let settings = ScanSettings::default();
        let clock = clock();
        let monitor = FolderMonitor::new(&db, &settings, &clock);
        monitor.scan_project(pid).unwrap();

        let again = monitor.scan_project(pid).unwrap();
        assert!(!again.has_changes());
        assert_eq!(again.size_change, 0);
        assert_eq!(db.all_activity(pid).unwrap().len(), 1);
    }

    #[test]
    fn missing_folder_is_an_error() {
        let (db, tmp) = setup();
        let pid = add_project(&db, &tmp.path().join("nope"));
        let settings = ScanSettings::default();
        let clock = clock();
        let err = FolderMonitor::new(&db, &settings, &clock)
            .scan_project(pid)
            .unwrap_err();
        assert!(matches!(err, TrackError::FolderNotFound { .. }));

        let err = FolderMonitor::new(&db, &settings, &clock)
            .scan_project(404)
            .unwrap_err();
        assert!(matches!(err, TrackError::ProjectNotFound { id: 404 }));
    }

    #[test]
    fn root_discovery_creates_and_soft_removes() {
        let (db, tmp) = setup();
        fs::create_dir(tmp.path().join("alpha")).unwrap();
        fs::create_dir(tmp.path().join("beta")).unwrap();
        fs::write(tmp.path().join("loose.txt"), "x").unwrap();
        let root = db
            .insert_root(
                &NewRoot::from_path(&tmp.path().to_string_lossy(), Some("Main"), true),
                "2024-01-01T00:00:00.000000Z",
            )
            .unwrap();
        let settings = ScanSettings::default();
        let clock = clock();
        let monitor = FolderMonitor::new(&db, &settings, &clock);

        let first = monitor.scan_root(root).unwrap();
        assert_eq!(first.new_projects, 2);
        assert_eq!(first.removed_projects, 0);
        let projects = db.projects_for_root(root).unwrap();
        assert!(projects.iter().all(|p| p.is_auto_discovered && p.active));
        assert_eq!(projects[0].name, "alpha");

        fs::remove_dir(tmp.path().join("beta")).unwrap();
        let second = monitor.scan_root(root).unwrap();
        assert_eq!(second.new_projects, 0);
        assert_eq!(second.removed_projects, 1);
        let active = db.list_projects(&ProjectFilter::active()).unwrap();
        assert_eq!(active.len(), 1);

        let third = monitor.scan_root(root).unwrap();
        assert_eq!(third.removed_projects, 0);
        assert!(db.get_root(root).unwrap().unwrap().last_scan.is_some());
    }

    #[test]
    fn missing_root_path_reports_error() {
        let (db, tmp) = setup();
        let missing = tmp.path().join("missing");
        let root = db
            .insert_root(
                &NewRoot::from_path(&missing.to_string_lossy(), None, true),
                "2024-01-01T00:00:00.000000Z",
            )
            .unwrap();
        let settings = ScanSettings::default();
        let clock = clock();
        let summary = FolderMonitor::new(&db, &settings, &clock)
            .scan_root(root)
            .unwrap();
        assert_eq!(summary.error.as_deref(), Some("Path does not exist"));
        assert_eq!(summary.new_projects, 0);
    }

    #[test]
    fn scan_all_discovers_scans_and_collects_errors() {
        let (db, tmp) = setup();
        let root_dir = tmp.path().join("projects");
        fs::create_dir_all(root_dir.join("letters")).unwrap();
        fs::write(root_dir.join("letters/l1.pdf"), "1234").unwrap();
        fs::create_dir_all(root_dir.join("maps")).unwrap();
        fs::write(root_dir.join("maps/m1.png"), "12").unwrap();
        db.insert_root(
            &NewRoot::from_path(&root_dir.to_string_lossy(), Some("Archive"), true),
            "2024-01-01T00:00:00.000000Z",
        )
        .unwrap();
        add_project(&db, &tmp.path().join("vanished"));

        let settings = ScanSettings::default();
        let clock = clock();
        let all = FolderMonitor::new(&db, &settings, &clock).scan_all().unwrap();

        assert_eq!(all.discovery["Archive"].new_projects, 2);
        assert_eq!(all.total_projects, 3);
        assert_eq!(all.scanned_projects, 2);
        assert_eq!(all.total_files_added, 2);
        assert_eq!(all.total_size_change, 6);
        assert_eq!(all.total_files, 2);
        assert_eq!(all.total_size, 6);
        assert_eq!(all.errors.len(), 1);
        assert_eq!(all.errors[0].project, "vanished");
    }

    #[test]
    fn scan_all_discovers_every_root() {
        let (db, tmp) = setup();
        let manual = tmp.path().join("manual");
        fs::create_dir_all(manual.join("deeds")).unwrap();
        fs::write(manual.join("deeds/d1.tif"), "abc").unwrap();
        db.insert_root(
            &NewRoot::from_path(&manual.to_string_lossy(), Some("Manual"), false),
            "2024-01-01T00:00:00.000000Z",
        )
        .unwrap();

        let settings = ScanSettings::default();
        let clock = clock();
        let all = FolderMonitor::new(&db, &settings, &clock).scan_all().unwrap();

        assert_eq!(all.discovery["Manual"].new_projects, 1);
        assert_eq!(all.scanned_projects, 1);
        assert_eq!(all.total_files, 1);
    }
}
