//! Page state machine.
//!
//! One explicit reducer per page replaces the loose "dialog open / editing
//! record / form data / submitting" flags. `F` is the page's form data.

use crate::ids::RecordId;

/// What a submit will do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageMode {
    Create,
    Edit(RecordId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PageState<F> {
    /// No dialog open.
    #[default]
    Closed,
    /// Create dialog open.
    Creating { form: F },
    /// Edit dialog open for an existing record.
    Editing { id: RecordId, form: F },
    /// Mutation outstanding; the submit control is disabled.
    Submitting { mode: PageMode, form: F },
    /// Last submit failed; the dialog stays open with the entered data.
    Failed {
        mode: PageMode,
        form: F,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageEvent<F> {
    OpenCreate(F),
    OpenEdit { id: RecordId, form: F },
    EditForm(F),
    Submit,
    SubmitSuccess(RecordId),
    SubmitFailure(String),
    Close,
}

/// Side effects requested by a transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAction<F> {
    Create(F),
    Update { id: RecordId, form: F },
    NotifySuccess(RecordId),
    NotifyError(String),
}

impl<F> PageState<F> {
    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Closed)
    }

    pub fn is_submitting(&self) -> bool {
        matches!(self, Self::Submitting { .. })
    }

    pub fn form(&self) -> Option<&F> {
        match self {
            Self::Closed => None,
            Self::Creating { form }
            | Self::Editing { form, .. }
            | Self::Submitting { form, .. }
            | Self::Failed { form, .. } => Some(form),
        }
    }
}

/// Pure page state machine: no side effects, only actions.
pub struct PageStateMachine;

impl PageStateMachine {
    pub fn transition<F: Clone>(
        state: PageState<F>,
        event: PageEvent<F>,
    ) -> (PageState<F>, Vec<PageAction<F>>) {
        match (state, event) {
            (PageState::Closed, PageEvent::OpenCreate(form)) => {
                (PageState::Creating { form }, Vec::new())
            }
            (PageState::Closed, PageEvent::OpenEdit { id, form }) => {
                (PageState::Editing { id, form }, Vec::new())
            }

            (PageState::Creating { .. }, PageEvent::EditForm(form)) => {
                (PageState::Creating { form }, Vec::new())
            }
            (PageState::Editing { id, .. }, PageEvent::EditForm(form)) => {
                (PageState::Editing { id, form }, Vec::new())
            }
            (PageState::Failed { mode, .. }, PageEvent::EditForm(form)) => match mode {
                PageMode::Create => (PageState::Creating { form }, Vec::new()),
                PageMode::Edit(id) => (PageState::Editing { id, form }, Vec::new()),
            },

            (PageState::Creating { form }, PageEvent::Submit) => Self::submit(PageMode::Create, form),
            (PageState::Editing { id, form }, PageEvent::Submit) => {
                Self::submit(PageMode::Edit(id), form)
            }
            (PageState::Failed { mode, form, .. }, PageEvent::Submit) => Self::submit(mode, form),

            (PageState::Submitting { .. }, PageEvent::SubmitSuccess(id)) => {
                (PageState::Closed, vec![PageAction::NotifySuccess(id)])
            }
            (PageState::Submitting { mode, form }, PageEvent::SubmitFailure(message)) => (
                PageState::Failed {
                    mode,
                    form,
                    message: message.clone(),
                },
                vec![PageAction::NotifyError(message)],
            ),

            (
                PageState::Creating { .. } | PageState::Editing { .. } | PageState::Failed { .. },
                PageEvent::Close,
            ) => (PageState::Closed, Vec::new()),

            (state, _event) => (state, Vec::new()),
        }
    }

    fn submit<F: Clone>(mode: PageMode, form: F) -> (PageState<F>, Vec<PageAction<F>>) {
        let action = match &mode {
            PageMode::Create => PageAction::Create(form.clone()),
            PageMode::Edit(id) => PageAction::Update {
                id: id.clone(),
                form: form.clone(),
            },
        };
        (PageState::Submitting { mode, form }, vec![action])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type State = PageState<String>;

    #[test]
    fn create_flow_closes_on_success() {
        let (state, actions) =
            PageStateMachine::transition(State::Closed, PageEvent::OpenCreate("Editor".into()));
        assert!(actions.is_empty());

        let (state, actions) = PageStateMachine::transition(state, PageEvent::Submit);
        assert!(state.is_submitting());
        assert_eq!(actions, vec![PageAction::Create("Editor".to_string())]);

        let id = RecordId::from("r1");
        let (state, actions) =
            PageStateMachine::transition(state, PageEvent::SubmitSuccess(id.clone()));
        assert_eq!(state, State::Closed);
        assert_eq!(actions, vec![PageAction::NotifySuccess(id)]);
    }

    #[test]
    fn failure_keeps_form_data() {
        let state = State::Submitting {
            mode: PageMode::Create,
            form: "Editor".into(),
        };
        let (state, actions) =
            PageStateMachine::transition(state, PageEvent::SubmitFailure("boom".into()));
        assert_eq!(state.form().map(String::as_str), Some("Editor"));
        assert!(state.is_open());
        assert_eq!(actions, vec![PageAction::NotifyError("boom".to_string())]);
    }

    #[test]
    fn retry_after_failure_resubmits_same_mode() {
        let id = RecordId::from("r1");
        let state = State::Failed {
            mode: PageMode::Edit(id.clone()),
            form: "Editor".into(),
            message: "boom".into(),
        };
        let (_, actions) = PageStateMachine::transition(state, PageEvent::Submit);
        assert_eq!(
            actions,
            vec![PageAction::Update {
                id,
                form: "Editor".to_string()
            }]
        );
    }

    #[test]
    fn cannot_close_or_resubmit_while_submitting() {
        let state = State::Submitting {
            mode: PageMode::Create,
            form: "Editor".into(),
        };
        let (next, actions) = PageStateMachine::transition(state.clone(), PageEvent::Close);
        assert_eq!(next, state);
        assert!(actions.is_empty());

        let (next, actions) = PageStateMachine::transition(state.clone(), PageEvent::Submit);
        assert_eq!(next, state);
        assert!(actions.is_empty());
    }

    #[test]
    fn editing_after_failure_returns_to_edit_state() {
        let id = RecordId::from("r1");
        let state = State::Failed {
            mode: PageMode::Edit(id.clone()),
            form: "old".into(),
            message: "boom".into(),
        };
        let (next, _) = PageStateMachine::transition(state, PageEvent::EditForm("new".into()));
        assert_eq!(
            next,
            State::Editing {
                id,
                form: "new".into()
            }
        );
    }
}
