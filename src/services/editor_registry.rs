use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::api::ScheduleApi;
use crate::editor::{EditorView, SaveOutcome, ScheduleEditor, SnapshotStore};
use crate::error::{AppError, EditorError};
use crate::models::ScheduleId;
use crate::services::{Credential, RequestContext};

pub type SharedEditor = Arc<Mutex<ScheduleEditor>>;

/// An open editor and the credential that opened it.
#[derive(Clone)]
struct EditorEntry {
    owner: Credential,
    editor: SharedEditor,
}

/// Open schedule editors, one per browser tab. Editors are never shared and
/// are dropped after sitting idle for the configured timeout. An editor is
/// only visible to requests carrying the credential it was opened with.
#[derive(Clone)]
pub struct EditorRegistry {
    api: Arc<dyn ScheduleApi>,
    editors: Cache<Uuid, EditorEntry>,
}

impl EditorRegistry {
    pub fn new(api: Arc<dyn ScheduleApi>, idle_timeout: Duration) -> Self {
        let editors = Cache::builder()
            .time_to_idle(idle_timeout)
            .eviction_listener(|id, _editor, cause| {
                log::debug!("Editor {} evicted ({:?})", id, cause);
            })
            .build();

        Self { api, editors }
    }

    pub fn api(&self) -> &Arc<dyn ScheduleApi> {
        &self.api
    }

    pub async fn open(
        &self,
        schedule_id: &ScheduleId,
        ctx: &RequestContext,
    ) -> Result<(Uuid, EditorView), AppError> {
        let editor = ScheduleEditor::open(self.api.as_ref(), schedule_id, ctx).await?;
        let view = editor.view();
        let id = Uuid::new_v4();

        let entry = EditorEntry {
            owner: ctx.credential.clone(),
            editor: Arc::new(Mutex::new(editor)),
        };
        self.editors.insert(id, entry).await;
        log::info!("Editor {} opened for schedule {}", id, schedule_id);

        Ok((id, view))
    }

    pub async fn get(&self, id: Uuid, ctx: &RequestContext) -> Result<SharedEditor, AppError> {
        match self.editors.get(&id).await {
            Some(entry) if entry.owner == ctx.credential => Ok(entry.editor),
            Some(_) => {
                log::warn!("Editor {} requested with another credential", id);
                Err(AppError::NotFound(format!("Editor {} not found", id)))
            }
            None => Err(AppError::NotFound(format!("Editor {} not found", id))),
        }
    }

    pub async fn close(&self, id: Uuid, ctx: &RequestContext) -> Result<(), AppError> {
        self.get(id, ctx).await?;
        self.editors.invalidate(&id).await;
        log::info!("Editor {} closed", id);
        Ok(())
    }

    /// Runs a synchronous edit against one editor and returns its new view.
    pub async fn edit<T>(
        &self,
        id: Uuid,
        ctx: &RequestContext,
        f: impl FnOnce(&mut ScheduleEditor) -> Result<T, EditorError>,
    ) -> Result<(T, EditorView), AppError> {
        let editor = self.get(id, ctx).await?;
        let mut editor = editor.lock().await;
        let value = f(&mut editor)?;
        Ok((value, editor.view()))
    }

    pub async fn view(&self, id: Uuid, ctx: &RequestContext) -> Result<EditorView, AppError> {
        let editor = self.get(id, ctx).await?;
        let view = editor.lock().await.view();
        Ok(view)
    }

    /// Reloads the snapshot. The fetch runs without holding the editor lock,
    /// so the editor stays readable meanwhile.
    pub async fn refresh(&self, id: Uuid, ctx: &RequestContext) -> Result<EditorView, AppError> {
        let editor = self.get(id, ctx).await?;
        let schedule_id = editor.lock().await.schedule().id.clone();

        let result = SnapshotStore::fetch(self.api.as_ref(), &schedule_id, ctx).await;

        let mut editor = editor.lock().await;
        editor.apply_refresh(result)?;
        Ok(editor.view())
    }

    /// Saves an editor's pending edits.
    ///
    /// The bulk write runs on its own task: if the caller goes away the
    /// request still completes and its result lands on the editor, or is
    /// dropped with it when the editor was closed meanwhile.
    pub async fn save(
        &self,
        id: Uuid,
        publish: bool,
        ctx: RequestContext,
    ) -> Result<(SaveOutcome, EditorView), AppError> {
        let editor = self.get(id, &ctx).await?;
        let prepared = editor.lock().await.prepare_save(publish)?;
        let api = Arc::clone(&self.api);

        let task = tokio::spawn(async move {
            let result = prepared.send(api.as_ref(), &ctx).await;
            let mut editor = editor.lock().await;
            let outcome = editor.complete_save(prepared, result)?;
            Ok::<_, EditorError>((outcome, editor.view()))
        });

        let (outcome, view) = task
            .await
            .map_err(|e| AppError::internal_server_error_message(format!("Save task failed: {}", e)))??;
        Ok((outcome, view))
    }

    pub async fn open_count(&self) -> u64 {
        self.editors.run_pending_tasks().await;
        self.editors.entry_count()
    }
}
