//! Admin page controller.
//!
//! Drives [`PageStateMachine`] and executes the actions it asks for against
//! an [`OptimisticMutator`]. The page also owns the session's search/sort
//! descriptor and the queue of transient notices (toasts) shown to the user.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::debug;

use sa_core::catalog::{
    Attribute, AttributeDraft, AttributePatch, Collection, CollectionDraft, CollectionPatch,
    Customer, CustomerDraft, CustomerPatch, GalleryImage, GalleryImageDraft, GalleryImagePatch,
    Role, RoleDraft, RolePatch,
};
use sa_core::{
    paginate, Entity, FilterSortDescriptor, MutationError, Page, PageAction, PageEvent, PageState,
    PageStateMachine, RecordId,
};

use crate::mutator::OptimisticMutator;

/// Form data of an admin dialog.
///
/// The create dialog submits the whole form as a draft; the edit dialog
/// submits it as a patch that overwrites every editable field. An empty
/// optional field clears the stored value.
pub trait PageForm<T: Entity>: Clone + Send + Sync + 'static {
    fn to_draft(&self) -> T::Draft;
    fn to_patch(&self) -> T::Patch;
}

fn filled(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.trim().is_empty())
}

impl PageForm<Role> for RoleDraft {
    fn to_draft(&self) -> RoleDraft {
        self.clone()
    }

    fn to_patch(&self) -> RolePatch {
        RolePatch {
            title: Some(self.title.clone()),
            routes: Some(self.routes.clone()),
        }
    }
}

impl PageForm<Collection> for CollectionDraft {
    fn to_draft(&self) -> CollectionDraft {
        self.clone()
    }

    fn to_patch(&self) -> CollectionPatch {
        CollectionPatch {
            name: Some(self.name.clone()),
            description: Some(filled(&self.description)),
            featured: Some(self.featured),
        }
    }
}

impl PageForm<Customer> for CustomerDraft {
    fn to_draft(&self) -> CustomerDraft {
        self.clone()
    }

    fn to_patch(&self) -> CustomerPatch {
        CustomerPatch {
            name: Some(self.name.clone()),
            email: Some(self.email.clone()),
            phone: Some(filled(&self.phone)),
        }
    }
}

impl PageForm<GalleryImage> for GalleryImageDraft {
    fn to_draft(&self) -> GalleryImageDraft {
        self.clone()
    }

    // The stored file itself cannot be replaced from the edit dialog.
    fn to_patch(&self) -> GalleryImagePatch {
        GalleryImagePatch {
            title: Some(self.title.clone()),
            featured: Some(self.featured),
        }
    }
}

impl PageForm<Attribute> for AttributeDraft {
    fn to_draft(&self) -> AttributeDraft {
        self.clone()
    }

    fn to_patch(&self) -> AttributePatch {
        AttributePatch {
            name: Some(self.name.clone()),
            values: Some(self.values.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

/// A transient notification. Errors never take the page down; they end up
/// here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }
}

pub struct AdminPage<T: Entity, F: PageForm<T>> {
    mutator: Arc<OptimisticMutator<T>>,
    state: Mutex<PageState<F>>,
    descriptor: Mutex<FilterSortDescriptor>,
    notices: Mutex<Vec<Notice>>,
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Entity, F: PageForm<T>> AdminPage<T, F> {
    pub fn new(mutator: Arc<OptimisticMutator<T>>) -> Self {
        Self {
            mutator,
            state: Mutex::new(PageState::Closed),
            descriptor: Mutex::new(FilterSortDescriptor::default()),
            notices: Mutex::new(Vec::new()),
        }
    }

    pub fn mutator(&self) -> &Arc<OptimisticMutator<T>> {
        &self.mutator
    }

    pub fn state(&self) -> PageState<F> {
        lock(&self.state).clone()
    }

    /// Feeds `event` to the state machine and runs the resulting actions
    /// until the page settles. Returns the settled state.
    pub async fn dispatch(&self, event: PageEvent<F>) -> PageState<F> {
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            let actions = {
                let mut state = lock(&self.state);
                let current = std::mem::replace(&mut *state, PageState::Closed);
                let (next, actions) = PageStateMachine::transition(current, event);
                *state = next;
                actions
            };

            for action in actions {
                if let Some(follow_up) = self.execute(action).await {
                    queue.push_back(follow_up);
                }
            }
        }

        self.state()
    }

    async fn execute(&self, action: PageAction<F>) -> Option<PageEvent<F>> {
        match action {
            PageAction::Create(form) => {
                let outcome = self.mutator.create_record(form.to_draft()).await;
                Some(Self::outcome_event(outcome))
            }
            PageAction::Update { id, form } => {
                let outcome = self.mutator.update_record(&id, form.to_patch()).await;
                Some(Self::outcome_event(outcome))
            }
            PageAction::NotifySuccess(id) => {
                debug!(collection = T::COLLECTION, id = %id, "submit succeeded");
                self.push_notice(Notice::success(format!("Saved {}", T::COLLECTION)));
                None
            }
            PageAction::NotifyError(message) => {
                self.push_notice(Notice::error(message));
                None
            }
        }
    }

    fn outcome_event(outcome: Result<T, MutationError>) -> PageEvent<F> {
        match outcome {
            Ok(record) => PageEvent::SubmitSuccess(record.id().clone()),
            Err(err) => PageEvent::SubmitFailure(err.to_string()),
        }
    }

    /// Delete button. Works outside of the dialog; the outcome is reported
    /// as a notice and returned.
    pub async fn delete(&self, id: &RecordId) -> Result<(), MutationError> {
        let outcome = self.mutator.delete_record(id).await;
        match &outcome {
            Ok(()) => self.push_notice(Notice::success(format!("Deleted from {}", T::COLLECTION))),
            Err(err) => self.push_notice(Notice::error(err.to_string())),
        }
        outcome
    }

    pub fn set_search(&self, text: impl Into<String>) {
        lock(&self.descriptor).search_text = text.into();
    }

    pub fn toggle_sort(&self, key: &str) {
        lock(&self.descriptor).toggle_sort(key);
    }

    pub fn descriptor(&self) -> FilterSortDescriptor {
        lock(&self.descriptor).clone()
    }

    /// Rows to render: the mirror passed through the current descriptor.
    pub fn rows(&self) -> Vec<T> {
        let descriptor = self.descriptor();
        self.mutator.store().view(&descriptor)
    }

    /// One page of [`AdminPage::rows`], 1-based.
    pub fn rows_page(&self, page: usize, page_size: usize) -> Page<T> {
        paginate(&self.rows(), page, page_size)
    }

    fn push_notice(&self, notice: Notice) {
        lock(&self.notices).push(notice);
    }

    /// Takes all queued notices, oldest first.
    pub fn drain_notices(&self) -> Vec<Notice> {
        std::mem::take(&mut *lock(&self.notices))
    }
}
