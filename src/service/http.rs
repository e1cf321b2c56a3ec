//! [`ProjectService`] over the tracking REST API.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;

use crate::config::ServiceSettings;
use crate::error::{Result, TrackError};
use crate::models::{
    ActivityLogEntry, ActivityReport, FileRecord, NewCategory, NewProject, NewRoot, NewTask,
    Project, ProjectDetail, ProjectFilter, ProjectRoot, RootScanSummary, ScanAllSummary,
    ScanSummary, Task, TaskCategory, TaskComment, TaskDetail, TaskFilter, TaskUpdate,
};
use crate::service::{ActivityWindow, FileQuery, ProjectService, TaskService};

/// Envelope of the scan endpoints.
#[derive(Debug, Deserialize)]
struct ScanEnvelope<T> {
    success: bool,
    #[serde(default)]
    message: String,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ScanAllEnvelope {
    #[serde(default)]
    discovery: std::collections::BTreeMap<String, RootScanSummary>,
    scan: ScanAllSummary,
}

/// Upper bound on `next` links followed for one listing.
const MAX_PAGES: usize = 1000;

/// List endpoints answer with a bare array, or a page object when pagination is on.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Listing<T> {
    Plain(Vec<T>),
    Paged {
        results: Vec<T>,
        #[serde(default)]
        next: Option<String>,
    },
}

impl<T> Listing<T> {
    fn into_page(self) -> (Vec<T>, Option<String>) {
        match self {
            Self::Plain(v) => (v, None),
            Self::Paged { results, next } => (results, next.filter(|n| !n.is_empty())),
        }
    }
}

/// The activity endpoint sends a report, or a page of entries without a
/// summary when pagination is on.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ActivityBody {
    Report(ActivityReport),
    Listing(Listing<ActivityLogEntry>),
}

pub struct HttpService {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpService {
    pub fn new(base_url: &str, settings: &ServiceSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: settings.auth_token.clone().filter(|t| !t.is_empty()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Send and return status plus body text.
    async fn exchange(&self, request: RequestBuilder) -> Result<(StatusCode, String)> {
        let response = self.authorized(request).send().await?;
        let status = response.status();
        let body = response.text().await?;
        tracing::debug!(status = status.as_u16(), bytes = body.len(), "response");
        Ok((status, body))
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let (status, body) = self.exchange(request).await?;
        if !status.is_success() {
            return Err(TrackError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&body)?)
    }

    async fn fetch_list<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<Vec<T>> {
        let listing: Listing<T> = self.fetch(request).await?;
        self.follow_pages(listing).await
    }

    /// Collect every page of a listing by following its `next` links.
    async fn follow_pages<T: DeserializeOwned>(&self, first: Listing<T>) -> Result<Vec<T>> {
        let (mut items, mut next) = first.into_page();
        let mut pages = 1;
        while let Some(link) = next {
            if pages >= MAX_PAGES {
                return Err(TrackError::Other(format!(
                    "listing exceeded {MAX_PAGES} pages"
                )));
            }
            let url = if link.starts_with("http://") || link.starts_with("https://") {
                link
            } else {
                self.url(&link)
            };
            tracing::debug!(%url, page = pages + 1, "following page");
            let page: Listing<T> = self.fetch(self.client.get(url)).await?;
            let (more, following) = page.into_page();
            items.extend(more);
            next = following;
            pages += 1;
        }
        Ok(items)
    }

    async fn send_empty(&self, request: RequestBuilder) -> Result<()> {
        let (status, body) = self.exchange(request).await?;
        if !status.is_success() {
            return Err(TrackError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }

    /// POST to a scan endpoint and unwrap its `{success, message, result}` envelope.
    async fn trigger_scan<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.client.post(self.url(path));
        let (status, body) = self.exchange(request).await?;
        decode_scan(status, body)
    }
}

fn decode_scan<T: DeserializeOwned>(status: StatusCode, body: String) -> Result<T> {
    let envelope = match serde_json::from_str::<ScanEnvelope<T>>(&body) {
        Ok(envelope) => envelope,
        Err(_) if !status.is_success() => {
            return Err(TrackError::Api {
                status: status.as_u16(),
                body,
            })
        }
        Err(e) => return Err(e.into()),
    };
    if !envelope.success {
        return Err(TrackError::ScanFailed {
            message: envelope.message,
        });
    }
    envelope.result.ok_or_else(|| TrackError::ScanFailed {
        message: "scan response carried no result".into(),
    })
}

fn filter_query(filter: &ProjectFilter) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(active) = filter.active {
        query.push(("active", active.to_string()));
    }
    if let Some(discovered) = filter.is_auto_discovered {
        query.push(("is_auto_discovered", discovered.to_string()));
    }
    query
}

fn task_query(filter: &TaskFilter) -> Vec<(&'static str, String)> {
    let mut query = Vec::new();
    if let Some(project) = filter.project {
        query.push(("project", project.to_string()));
    }
    if let Some(status) = filter.status {
        query.push(("status", status.as_str().to_string()));
    }
    if let Some(priority) = filter.priority {
        query.push(("priority", priority.as_str().to_string()));
    }
    if let Some(category) = filter.category {
        query.push(("category", category.to_string()));
    }
    query
}

impl ProjectService for HttpService {
    async fn list_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>> {
        let request = self
            .client
            .get(self.url("projects/"))
            .query(&filter_query(filter));
        let projects: Vec<Project> = self.fetch_list(request).await?;
        // Servers without query filtering return everything.
        Ok(projects.into_iter().filter(|p| filter.matches(p)).collect())
    }

    async fn get_project(&self, id: i64) -> Result<ProjectDetail> {
        self.fetch(self.client.get(self.url(&format!("projects/{id}/"))))
            .await
    }

    async fn create_project(&self, new: &NewProject) -> Result<Project> {
        self.fetch(self.client.post(self.url("projects/")).json(new))
            .await
    }

    async fn set_project_active(&self, id: i64, active: bool) -> Result<Project> {
        let request = self
            .client
            .patch(self.url(&format!("projects/{id}/")))
            .json(&json!({ "active": active }));
        self.fetch(request).await
    }

    async fn delete_project(&self, id: i64) -> Result<()> {
        self.send_empty(self.client.delete(self.url(&format!("projects/{id}/"))))
            .await
    }

    async fn get_activity(&self, id: i64, window: ActivityWindow) -> Result<ActivityReport> {
        tracing::debug!(project = id, days = window.days(), "fetching activity");
        let request = self
            .client
            .get(self.url(&format!("projects/{id}/activity/")))
            .query(&[("days", window.days())]);
        match self.fetch(request).await? {
            ActivityBody::Report(report) => Ok(report),
            ActivityBody::Listing(listing) => Ok(ActivityReport {
                logs: self.follow_pages(listing).await?,
                summary: None,
            }),
        }
    }

    async fn list_files(&self, id: i64, query: &FileQuery) -> Result<Vec<FileRecord>> {
        let mut request = self.client.get(self.url(&format!("projects/{id}/files/")));
        if let Some(name) = query.filename_contains.as_deref().filter(|s| !s.is_empty()) {
            request = request.query(&[("filename", name)]);
        }
        self.fetch_list(request).await
    }

    async fn scan_project(&self, id: i64) -> Result<ScanSummary> {
        self.trigger_scan(&format!("projects/{id}/scan/")).await
    }

    async fn list_roots(&self) -> Result<Vec<ProjectRoot>> {
        self.fetch_list(self.client.get(self.url("roots/"))).await
    }

    async fn create_root(&self, new: &NewRoot) -> Result<ProjectRoot> {
        self.fetch(self.client.post(self.url("roots/")).json(new))
            .await
    }

    async fn delete_root(&self, id: i64) -> Result<()> {
        self.send_empty(self.client.delete(self.url(&format!("roots/{id}/"))))
            .await
    }

    async fn scan_root(&self, id: i64) -> Result<RootScanSummary> {
        self.trigger_scan(&format!("roots/{id}/scan/")).await
    }

    async fn scan_all(&self) -> Result<ScanAllSummary> {
        let envelope: ScanAllEnvelope = self.fetch(self.client.post(self.url("scan-all/"))).await?;
        let mut summary = envelope.scan;
        summary.discovery = envelope.discovery;
        Ok(summary)
    }
}

impl TaskService for HttpService {
    async fn list_categories(&self) -> Result<Vec<TaskCategory>> {
        self.fetch_list(self.client.get(self.url("projects/categories/")))
            .await
    }

    async fn create_category(&self, new: &NewCategory) -> Result<TaskCategory> {
        new.validate()?;
        self.fetch(self.client.post(self.url("projects/categories/")).json(new))
            .await
    }

    async fn delete_category(&self, id: i64) -> Result<()> {
        let url = self.url(&format!("projects/categories/{id}/"));
        self.send_empty(self.client.delete(url)).await
    }

    async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>> {
        let request = self
            .client
            .get(self.url("projects/tasks/"))
            .query(&task_query(filter));
        let tasks: Vec<Task> = self.fetch_list(request).await?;
        Ok(tasks.into_iter().filter(|t| filter.matches(t)).collect())
    }

    async fn get_task(&self, id: i64) -> Result<TaskDetail> {
        self.fetch(self.client.get(self.url(&format!("projects/tasks/{id}/"))))
            .await
    }

    async fn create_task(&self, new: &NewTask) -> Result<Task> {
        let mut new = new.clone();
        new.validate()?;
        self.fetch(self.client.post(self.url("projects/tasks/")).json(&new))
            .await
    }

    async fn update_task(&self, id: i64, update: &TaskUpdate) -> Result<Task> {
        let mut update = update.clone();
        update.validate()?;
        let request = self
            .client
            .patch(self.url(&format!("projects/tasks/{id}/")))
            .json(&update);
        self.fetch(request).await
    }

    async fn delete_task(&self, id: i64) -> Result<()> {
        self.send_empty(self.client.delete(self.url(&format!("projects/tasks/{id}/"))))
            .await
    }

    async fn add_comment(&self, task: i64, text: &str) -> Result<TaskComment> {
        let request = self
            .client
            .post(self.url(&format!("projects/tasks/{task}/add_comment/")))
            .json(&json!({ "text": text }));
        self.fetch(request).await
    }

    async fn list_comments(&self, task: i64) -> Result<Vec<TaskComment>> {
        let url = self.url(&format!("projects/tasks/{task}/comments/"));
        self.fetch_list(self.client.get(url)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    /// Serve one canned response and report the request head back.
    fn one_shot(status: &str, body: &str) -> (String, mpsc::Receiver<Vec<String>>) {
        serve(&[(status, body)])
    }

    /// Serve canned responses to successive connections. `{base}` in a body
    /// is replaced with the server's base URL.
    fn serve(responses: &[(&str, &str)]) -> (String, mpsc::Receiver<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let base = format!("http://{addr}/api/");
        let responses: Vec<String> = responses
            .iter()
            .map(|(status, body)| {
                let body = body.replace("{base}", &base);
                format!(
                    "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                    body.len()
                )
            })
            .collect();
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            for response in responses {
                let (mut stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut head = Vec::new();
                let mut content_length = 0usize;
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).unwrap();
                    let line = line.trim_end().to_string();
                    if line.is_empty() {
                        break;
                    }
                    if let Some(v) = line.to_lowercase().strip_prefix("content-length:") {
                        content_length = v.trim().parse().unwrap();
                    }
                    head.push(line);
                }
                let mut body = vec![0u8; content_length];
                std::io::Read::read_exact(&mut reader, &mut body).unwrap();
                head.push(String::from_utf8(body).unwrap());
                stream.write_all(response.as_bytes()).unwrap();
                let _ = tx.send(head);
            }
        });
        (base, rx)
    }

    fn service(base: &str, token: Option<&str>) -> HttpService {
        let settings = ServiceSettings {
            auth_token: token.map(str::to_string),
            timeout_secs: 5,
            ..Default::default()
        };
        HttpService::new(base, &settings).unwrap()
    }

    #[test]
    fn url_joins_without_double_slash() {
        let svc = service("http://host/api/", None);
        assert_eq!(svc.url("projects/3/"), "http://host/api/projects/3/");
        assert_eq!(svc.url("/roots/"), "http://host/api/roots/");
    }

    #[test]
    fn scan_envelope_decoding() {
        let ok: ScanSummary = decode_scan(
            StatusCode::OK,
            r#"{"success": true, "message": "done", "result": {"files_added": 2}}"#.into(),
        )
        .unwrap();
        assert_eq!(ok.files_added, 2);

        let failed = decode_scan::<ScanSummary>(
            StatusCode::INTERNAL_SERVER_ERROR,
            r#"{"success": false, "message": "Error scanning project: gone"}"#.into(),
        )
        .unwrap_err();
        assert!(matches!(failed, TrackError::ScanFailed { ref message } if message.contains("gone")));

        let not_found =
            decode_scan::<ScanSummary>(StatusCode::NOT_FOUND, r#"{"detail": "Not found."}"#.into())
                .unwrap_err();
        assert!(matches!(not_found, TrackError::Api { status: 404, .. }));
    }

    #[test]
    fn listing_accepts_paged_and_plain() {
        let plain: Listing<Project> = serde_json::from_str(r#"[{"id": 1}]"#).unwrap();
        let (items, next) = plain.into_page();
        assert_eq!(items.len(), 1);
        assert!(next.is_none());
        let paged: Listing<Project> = serde_json::from_str(
            r#"{"count": 3, "next": "http://host/api/projects/?page=2", "results": [{"id": 1}, {"id": 2}]}"#,
        )
        .unwrap();
        let (items, next) = paged.into_page();
        assert_eq!(items.len(), 2);
        assert_eq!(next.as_deref(), Some("http://host/api/projects/?page=2"));
    }

    #[tokio::test]
    async fn list_follows_next_links() {
        let (base, rx) = serve(&[
            (
                "200 OK",
                r#"{"count": 3, "next": "{base}roots/?page=2", "results": [{"id": 1}, {"id": 2}]}"#,
            ),
            ("200 OK", r#"{"count": 3, "next": null, "results": [{"id": 3}]}"#),
        ]);
        let roots = service(&base, None).list_roots().await.unwrap();
        let ids: Vec<i64> = roots.iter().map(|r| r.id).collect();
        assert_eq!(ids, [1, 2, 3]);
        assert!(rx.recv().unwrap()[0].starts_with("GET /api/roots/ "));
        assert!(rx.recv().unwrap()[0].starts_with("GET /api/roots/?page=2 "));
    }

    #[tokio::test]
    async fn list_projects_sends_filter_and_token() {
        let (base, rx) = one_shot(
            "200 OK",
            r#"[{"id": 1, "name": "A", "active": true, "is_auto_discovered": true},
                {"id": 2, "name": "B", "active": false}]"#,
        );
        let svc = service(&base, Some("s3cret"));
        let projects = svc
            .list_projects(&ProjectFilter::discovered())
            .await
            .unwrap();
        assert_eq!(projects.len(), 1);
        assert_eq!(projects[0].name, "A");

        let head = rx.recv().unwrap();
        assert!(head[0].starts_with("GET /api/projects/?"));
        assert!(head[0].contains("active=true"));
        assert!(head[0].contains("is_auto_discovered=true"));
        assert!(head
            .iter()
            .any(|h| h.eq_ignore_ascii_case("authorization: Bearer s3cret")));
    }

    #[tokio::test]
    async fn activity_requests_window_days() {
        let (base, rx) = one_shot(
            "200 OK",
            r#"{"logs": [{"id": 1, "timestamp": "2024-06-01T10:00:00Z", "files_added": 3}],
                "summary": {"total_added": 3, "active_days": 1}}"#,
        );
        let report = service(&base, None)
            .get_activity(9, ActivityWindow::Week)
            .await
            .unwrap();
        assert_eq!(report.logs[0].files_added, 3);
        assert_eq!(report.summary.unwrap().active_days, 1);
        let head = rx.recv().unwrap();
        assert!(head[0].starts_with("GET /api/projects/9/activity/?days=7 "));
    }

    #[tokio::test]
    async fn paged_activity_keeps_its_entries() {
        let (base, _rx) = serve(&[
            (
                "200 OK",
                r#"{"count": 3, "next": "{base}projects/9/activity/?days=30&page=2", "previous": null,
                    "results": [{"id": 1, "timestamp": "2024-06-01T10:00:00Z", "files_added": 3},
                                {"id": 2, "timestamp": "2024-06-02T10:00:00Z", "files_modified": 1}]}"#,
            ),
            (
                "200 OK",
                r#"{"count": 3, "next": null,
                    "results": [{"id": 3, "timestamp": "2024-06-03T10:00:00Z", "files_deleted": 2}]}"#,
            ),
        ]);
        let report = service(&base, None)
            .get_activity(9, ActivityWindow::Month)
            .await
            .unwrap();
        let ids: Vec<i64> = report.logs.iter().map(|l| l.id).collect();
        assert_eq!(ids, [1, 2, 3]);
        assert_eq!(report.logs[0].files_added, 3);
        assert!(report.summary.is_none());
    }

    #[tokio::test]
    async fn non_success_status_is_api_error() {
        let (base, _rx) = one_shot("404 Not Found", r#"{"detail": "Not found."}"#);
        let err = service(&base, None).get_project(1).await.unwrap_err();
        match err {
            TrackError::Api { status, body } => {
                assert_eq!(status, 404);
                assert!(body.contains("Not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn set_active_patches_flag() {
        let (base, rx) = one_shot("200 OK", r#"{"id": 4, "name": "P", "active": false}"#);
        let p = service(&base, None).set_project_active(4, false).await.unwrap();
        assert!(!p.active);
        let head = rx.recv().unwrap();
        assert!(head[0].starts_with("PATCH /api/projects/4/ "));
        assert_eq!(head.last().unwrap(), r#"{"active":false}"#);
    }

    #[tokio::test]
    async fn list_tasks_sends_filter_codes() {
        let (base, rx) = one_shot(
            "200 OK",
            r#"[{"id": 1, "title": "A", "project": 3, "status": "BLOCKED", "priority": "HIGH"},
                {"id": 2, "title": "B", "project": 3, "status": "COMPLETED"}]"#,
        );
        let filter = TaskFilter {
            project: Some(3),
            status: Some(crate::models::TaskStatus::Blocked),
            ..Default::default()
        };
        let tasks = service(&base, None).list_tasks(&filter).await.unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].title, "A");
        let head = rx.recv().unwrap();
        assert!(head[0].starts_with("GET /api/projects/tasks/?project=3&status=BLOCKED "));
    }

    #[tokio::test]
    async fn add_comment_posts_text() {
        let (base, rx) = one_shot(
            "201 Created",
            r#"{"id": 5, "task": 2, "text": "looks good", "created_at": "2024-06-01T10:00:00Z"}"#,
        );
        let comment = service(&base, None)
            .add_comment(2, "looks good")
            .await
            .unwrap();
        assert_eq!(comment.id, 5);
        let head = rx.recv().unwrap();
        assert!(head[0].starts_with("POST /api/projects/tasks/2/add_comment/ "));
        assert_eq!(head.last().unwrap(), r#"{"text":"looks good"}"#);
    }

    #[tokio::test]
    async fn update_task_patches_set_fields() {
        let (base, rx) = one_shot(
            "200 OK",
            r#"{"id": 2, "title": "T", "project": 1, "status": "COMPLETED"}"#,
        );
        let update = TaskUpdate {
            status: Some(crate::models::TaskStatus::Completed),
            due_date: Some(Some("2024-7-4".into())),
            ..Default::default()
        };
        let task = service(&base, None).update_task(2, &update).await.unwrap();
        assert_eq!(task.status, crate::models::TaskStatus::Completed);
        let head = rx.recv().unwrap();
        assert!(head[0].starts_with("PATCH /api/projects/tasks/2/ "));
        assert_eq!(
            head.last().unwrap(),
            r#"{"status":"COMPLETED","due_date":"2024-07-04"}"#
        );
    }

    #[tokio::test]
    async fn scan_all_merges_discovery() {
        let (base, _rx) = one_shot(
            "200 OK",
            r#"{"discovery": {"Main": {"new_projects": 2, "removed_projects": 0}},
                "scan": {"total_projects": 2, "scanned_projects": 2, "errors": []}}"#,
        );
        let all = service(&base, None).scan_all().await.unwrap();
        assert_eq!(all.discovery["Main"].new_projects, 2);
        assert_eq!(all.scanned_projects, 2);
    }
}
