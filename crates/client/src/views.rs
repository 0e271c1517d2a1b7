//! Page-level list views.
//!
//! Each view issues one read request, tracks a loading flag, and renders an
//! empty-state message, an inline error, or one line per item.

use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use mizan_auth::Module;

use crate::http::{ApiClient, ClientError};
use crate::session::PermissionSession;

/// A list resource backing one dashboard or portal page.
pub trait ListResource: DeserializeOwned + Send + Sync + 'static {
    const ENDPOINT: &'static str;
    const TITLE: &'static str;
    const EMPTY_MESSAGE: &'static str;

    /// Module whose read access gates the page; `None` for portal pages.
    const MODULE: Option<Module> = None;

    fn summary(&self) -> String;
}

/// Either a bare array or the first page of a paginated envelope.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ListPayload<R> {
    Plain(Vec<R>),
    Page { results: Vec<R> },
}

impl<R> ListPayload<R> {
    pub(crate) fn into_items(self) -> Vec<R> {
        match self {
            ListPayload::Plain(items) => items,
            ListPayload::Page { results } => results,
        }
    }
}

#[async_trait]
pub trait ListSource: Send + Sync {
    async fn fetch_list<R: ListResource>(&self) -> Result<Vec<R>, ClientError>;
}

#[async_trait]
impl ListSource for ApiClient {
    async fn fetch_list<R: ListResource>(&self) -> Result<Vec<R>, ClientError> {
        let payload: ListPayload<R> = self.get_json(R::ENDPOINT).await?;
        Ok(payload.into_items())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Forbidden,
    Failed,
    Empty,
    Populated,
}

#[derive(Debug, Clone)]
pub struct ListView<R> {
    loading: bool,
    forbidden: bool,
    items: Vec<R>,
    error: Option<String>,
}

impl<R: ListResource> Default for ListView<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: ListResource> ListView<R> {
    /// A view that has not loaded yet.
    pub fn new() -> Self {
        Self {
            loading: true,
            forbidden: false,
            items: Vec::new(),
            error: None,
        }
    }

    /// Create and load in one step.
    pub async fn fetch<L: ListSource + ?Sized>(source: &L) -> Self {
        let mut view = Self::new();
        view.load(source).await;
        view
    }

    /// One read request. Failures leave the list empty with a generic error.
    pub async fn load<L: ListSource + ?Sized>(&mut self, source: &L) {
        self.loading = true;
        self.forbidden = false;
        match source.fetch_list::<R>().await {
            Ok(items) => {
                tracing::debug!(endpoint = R::ENDPOINT, count = items.len(), "list loaded");
                self.items = items;
                self.error = None;
            }
            Err(err) => {
                tracing::error!(endpoint = R::ENDPOINT, error = %err, "failed to load list");
                self.items.clear();
                self.error = Some(format!(
                    "Could not load {}. Please try again later.",
                    R::TITLE.to_lowercase()
                ));
            }
        }
        self.loading = false;
    }

    /// Like [`ListView::load`], but a gated page the caller cannot read is
    /// marked forbidden without touching the network.
    pub async fn load_gated<S, L>(&mut self, session: &PermissionSession<S>, source: &L)
    where
        L: ListSource + ?Sized,
    {
        if let Some(module) = R::MODULE {
            if !session.can_read(module) {
                tracing::debug!(endpoint = R::ENDPOINT, %module, "no read access; skipping load");
                self.items.clear();
                self.error = None;
                self.forbidden = true;
                self.loading = false;
                return;
            }
        }
        self.load(source).await;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn is_forbidden(&self) -> bool {
        self.forbidden
    }

    pub fn items(&self) -> &[R] {
        &self.items
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn state(&self) -> ViewState {
        if self.loading {
            ViewState::Loading
        } else if self.forbidden {
            ViewState::Forbidden
        } else if self.error.is_some() {
            ViewState::Failed
        } else if self.items.is_empty() {
            ViewState::Empty
        } else {
            ViewState::Populated
        }
    }

    /// Plain-text rendering: a title line followed by the body.
    pub fn render(&self) -> String {
        let mut out = format!("{}\n", R::TITLE);
        match self.state() {
            ViewState::Loading => out.push_str("Loading...\n"),
            ViewState::Forbidden => {
                let module = R::MODULE.map(|m| m.as_str()).unwrap_or("this page");
                out.push_str(&format!("You do not have access to {module}.\n"));
            }
            ViewState::Failed => {
                out.push_str(self.error.as_deref().unwrap_or_default());
                out.push('\n');
            }
            ViewState::Empty => {
                out.push_str(R::EMPTY_MESSAGE);
                out.push('\n');
            }
            ViewState::Populated => {
                for item in &self.items {
                    out.push_str("- ");
                    out.push_str(&item.summary());
                    out.push('\n');
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use mizan_auth::{AccessLevel, Profile};
    use mizan_core::UserId;

    use super::*;
    use crate::session::tests::{FakeBackend, treasurer_backend};
    use crate::types::{Announcement, Survey, Transaction};

    /// Serves canned JSON bodies per endpoint.
    #[derive(Default)]
    struct FakeLists {
        bodies: HashMap<&'static str, serde_json::Value>,
        requests: Mutex<Vec<&'static str>>,
    }

    impl FakeLists {
        fn with(mut self, endpoint: &'static str, body: serde_json::Value) -> Self {
            self.bodies.insert(endpoint, body);
            self
        }

        fn requests(&self) -> Vec<&'static str> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ListSource for FakeLists {
        async fn fetch_list<R: ListResource>(&self) -> Result<Vec<R>, ClientError> {
            self.requests.lock().unwrap().push(R::ENDPOINT);
            let body = self
                .bodies
                .get(R::ENDPOINT)
                .cloned()
                .ok_or_else(|| ClientError::Api(500, "boom".into()))?;
            let payload: ListPayload<R> =
                serde_json::from_value(body).map_err(|e| ClientError::Parse(e.to_string()))?;
            Ok(payload.into_items())
        }
    }

    #[tokio::test]
    async fn empty_list_renders_empty_message() {
        let source = FakeLists::default().with(Announcement::ENDPOINT, serde_json::json!([]));
        let view = ListView::<Announcement>::fetch(&source).await;

        assert!(!view.is_loading());
        assert_eq!(view.state(), ViewState::Empty);
        assert_eq!(view.render(), "Announcements\nNo announcements at the moment.\n");
    }

    #[tokio::test]
    async fn populated_list_renders_one_line_per_item() {
        let source = FakeLists::default().with(
            Survey::ENDPOINT,
            serde_json::json!([
                {"id": 1, "title": "Census 2024", "is_active": true},
                {"id": 2, "title": "Madrasa feedback"}
            ]),
        );
        let view = ListView::<Survey>::fetch(&source).await;

        assert_eq!(view.state(), ViewState::Populated);
        assert_eq!(
            view.render(),
            "Surveys\n- #1 Census 2024 [active]\n- #2 Madrasa feedback [closed]\n"
        );
    }

    #[tokio::test]
    async fn paginated_envelope_is_accepted() {
        let source = FakeLists::default().with(
            Announcement::ENDPOINT,
            serde_json::json!({"count": 1, "next": null, "results": [{"id": 9, "title": "Jumuah at 1:30"}]}),
        );
        let view = ListView::<Announcement>::fetch(&source).await;
        assert_eq!(view.items().len(), 1);
        assert_eq!(view.items()[0].title, "Jumuah at 1:30");
    }

    #[tokio::test]
    async fn failure_leaves_list_empty_with_generic_error() {
        let view = ListView::<Transaction>::fetch(&FakeLists::default()).await;

        assert!(!view.is_loading());
        assert!(view.items().is_empty());
        assert_eq!(view.state(), ViewState::Failed);
        assert_eq!(
            view.error(),
            Some("Could not load transactions. Please try again later.")
        );
    }

    #[tokio::test]
    async fn reload_after_failure_clears_error() {
        let mut view = ListView::<Announcement>::fetch(&FakeLists::default()).await;
        assert_eq!(view.state(), ViewState::Failed);

        let source = FakeLists::default().with(Announcement::ENDPOINT, serde_json::json!([]));
        view.load(&source).await;
        assert_eq!(view.state(), ViewState::Empty);
    }

    #[tokio::test]
    async fn gated_page_without_access_skips_request() {
        let backend = FakeBackend {
            profile: Some(Profile::new(UserId::new(5), false)),
            staff: Some(vec![]),
            ..Default::default()
        };
        let session = PermissionSession::initialize(backend).await;
        let source = FakeLists::default().with(Transaction::ENDPOINT, serde_json::json!([]));

        let mut view = ListView::<Transaction>::new();
        view.load_gated(&session, &source).await;

        assert_eq!(view.state(), ViewState::Forbidden);
        assert!(source.requests().is_empty());
        assert_eq!(view.render(), "Transactions\nYou do not have access to finance.\n");
    }

    #[tokio::test]
    async fn gated_page_with_access_loads() {
        let session = PermissionSession::initialize(treasurer_backend()).await;
        assert!(session.has_permission("finance", AccessLevel::Write));

        let source = FakeLists::default().with(
            Transaction::ENDPOINT,
            serde_json::json!([{"id": 1, "amount": "20.00"}]),
        );
        let mut view = ListView::<Transaction>::new();
        view.load_gated(&session, &source).await;

        assert_eq!(view.state(), ViewState::Populated);
        assert_eq!(source.requests(), vec![Transaction::ENDPOINT]);
    }

    #[tokio::test]
    async fn portal_pages_are_never_gated() {
        let session = PermissionSession::initialize(FakeBackend::default()).await;
        let source = FakeLists::default().with(Announcement::ENDPOINT, serde_json::json!([]));

        let mut view = ListView::<Announcement>::new();
        view.load_gated(&session, &source).await;
        assert_eq!(view.state(), ViewState::Empty);
    }

    #[test]
    fn fresh_view_is_loading() {
        let view = ListView::<Survey>::new();
        assert_eq!(view.state(), ViewState::Loading);
        assert_eq!(view.render(), "Surveys\nLoading...\n");
    }
}
