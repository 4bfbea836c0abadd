//! Workflow Engine.
//!
//! Validates and applies idea and task changes. Every public mutation takes
//! the acting user and goes through [`WorkflowEngine::authorize`] first. A
//! committed change requests exactly one trail event and publishes one
//! [`PlatformEvent`]; completing an idea also locks its task discussions.
//! Each public mutation ends in exactly one notification, success or error.
//! Reviews and undo are reached only through the approval coordinator.

use std::sync::Arc;

use chrono::Utc;
use ideaflow_core::discussion::DiscussionOwner;
use ideaflow_core::error::CoreError;
use ideaflow_core::identity::Actor;
use ideaflow_core::roles::Capability;
use ideaflow_core::status::IdeaStatus;
use ideaflow_core::task::{validate_assignee_fields, validate_percent_complete};
use ideaflow_core::trail::event_types;
use ideaflow_core::transition::{
    accepts_tasks, check_completion, event_type_for, validate_idea_transition, TransitionOrigin,
};
use ideaflow_core::types::DbId;
use ideaflow_db::models::attachment::{Attachment, FileUpload};
use ideaflow_db::models::discussion::{
    Discussion, DiscussionMessage, DiscussionThread, NewMessage,
};
use ideaflow_db::models::idea::{CreateIdea, Idea, IdeaFilter, IdeaStatusChange, IdeaUpdate, NewIdea};
use ideaflow_db::models::task::{CreateTask, NewTask, Task, TaskFilter, TaskUpdate};
use ideaflow_db::EntityStore;
use ideaflow_events::bus::names;
use ideaflow_events::{EventBus, PlatformEvent};
use validator::Validate;

use crate::discussion::DiscussionLockManager;
use crate::error::WorkflowResult;
use crate::notify::ActionNotifier;
use crate::trail::{AuditTrailLogger, TrailEntry};

pub struct WorkflowEngine {
    store: Arc<dyn EntityStore>,
    trail: Arc<AuditTrailLogger>,
    discussions: DiscussionLockManager,
    bus: Arc<EventBus>,
    notify: ActionNotifier,
}

impl WorkflowEngine {
    pub fn new(
        store: Arc<dyn EntityStore>,
        trail: Arc<AuditTrailLogger>,
        bus: Arc<EventBus>,
        notify: ActionNotifier,
    ) -> Self {
        let discussions =
            DiscussionLockManager::new(Arc::clone(&store), Arc::clone(&trail), Arc::clone(&bus));
        Self {
            store,
            trail,
            discussions,
            bus,
            notify,
        }
    }

    pub fn trail(&self) -> &AuditTrailLogger {
        &self.trail
    }

    pub fn discussions(&self) -> &DiscussionLockManager {
        &self.discussions
    }

    /// The one capability check used by every mutating operation.
    pub fn authorize(&self, actor: &Actor, capability: Capability) -> Result<(), CoreError> {
        if actor.can(capability) {
            Ok(())
        } else {
            tracing::debug!(user_id = actor.id, role = %actor.role, ?capability, "Capability denied");
            Err(CoreError::Forbidden(format!(
                "Role '{}' lacks the {capability:?} capability",
                actor.role
            )))
        }
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    pub async fn list_ideas(&self, filter: &IdeaFilter) -> WorkflowResult<Vec<Idea>> {
        Ok(self.store.list_ideas(filter).await?)
    }

    pub async fn get_idea(&self, id: DbId) -> WorkflowResult<Idea> {
        Ok(self.store.get_idea(id).await?)
    }

    pub async fn list_tasks(&self, filter: &TaskFilter) -> WorkflowResult<Vec<Task>> {
        Ok(self.store.list_tasks(filter).await?)
    }

    pub async fn get_task(&self, id: DbId) -> WorkflowResult<Task> {
        Ok(self.store.get_task(id).await?)
    }

    // -----------------------------------------------------------------------
    // Ideas
    // -----------------------------------------------------------------------

    /// Submit a new idea. It starts in `PendingApproval`.
    pub async fn submit_idea(&self, actor: &Actor, input: NewIdea) -> WorkflowResult<Idea> {
        let result = self.submit_idea_inner(actor, input).await;
        self.notify.report(result, |idea| {
            (
                "Idea submitted".into(),
                format!("\"{}\" is awaiting review.", idea.title),
            )
        })
    }

    async fn submit_idea_inner(&self, actor: &Actor, input: NewIdea) -> WorkflowResult<Idea> {
        self.authorize(actor, Capability::SubmitIdeas)?;
        input.validate()?;

        let id = self
            .store
            .create_idea(&CreateIdea::from_submission(input, actor.id))
            .await?;
        let idea = self.store.get_idea(id).await?;

        self.trail
            .append(
                actor,
                TrailEntry::new(id, event_types::SUBMITTED)
                    .description(idea.title.clone())
                    .metadata(serde_json::json!({
                        "category": idea.category,
                        "priority": idea.priority,
                    })),
            )
            .await;

        tracing::info!(idea_id = id, user_id = actor.id, "Idea submitted");
        self.publish_idea(names::IDEA_SUBMITTED, &idea, actor, serde_json::json!({}));
        Ok(idea)
    }

    /// Edit title, description, category or priority. The creator may edit
    /// while the idea is pending; task managers may edit at any time.
    pub async fn update_idea(
        &self,
        actor: &Actor,
        id: DbId,
        update: IdeaUpdate,
    ) -> WorkflowResult<Idea> {
        let result = self.update_idea_inner(actor, id, update).await;
        self.notify.report(result, |idea| {
            ("Idea updated".into(), format!("\"{}\" was saved.", idea.title))
        })
    }

    async fn update_idea_inner(
        &self,
        actor: &Actor,
        id: DbId,
        update: IdeaUpdate,
    ) -> WorkflowResult<Idea> {
        self.authorize(actor, Capability::SubmitIdeas)?;
        update.validate()?;
        if update.is_empty() {
            return Err(CoreError::Validation("No fields to update".into()).into());
        }

        let idea = self.store.get_idea(id).await?;
        let own_pending = idea.created_by == actor.id && idea.status == IdeaStatus::PendingApproval;
        if !own_pending {
            self.authorize(actor, Capability::ManageTasks)?;
        }

        self.store.update_idea(id, &update).await?;
        let updated = self.store.get_idea(id).await?;

        let mut fields = Vec::new();
        if update.title.is_some() {
            fields.push("title");
        }
        if update.description.is_some() {
            fields.push("description");
        }
        if update.category.is_some() {
            fields.push("category");
        }
        if update.priority.is_some() {
            fields.push("priority");
        }
        self.trail
            .append(
                actor,
                TrailEntry::new(id, event_types::IDEA_UPDATED)
                    .metadata(serde_json::json!({ "fields": fields })),
            )
            .await;

        self.publish_idea(
            names::IDEA_UPDATED,
            &updated,
            actor,
            serde_json::json!({ "fields": fields }),
        );
        Ok(updated)
    }

    /// Upload a file and attach it to the idea.
    pub async fn attach_to_idea(
        &self,
        actor: &Actor,
        id: DbId,
        file: FileUpload,
    ) -> WorkflowResult<Attachment> {
        let result = self.attach_to_idea_inner(actor, id, file).await;
        self.notify.report(result, |attachment| {
            (
                "Attachment added".into(),
                format!("{} was attached.", attachment.file_name),
            )
        })
    }

    async fn attach_to_idea_inner(
        &self,
        actor: &Actor,
        id: DbId,
        file: FileUpload,
    ) -> WorkflowResult<Attachment> {
        self.authorize(actor, Capability::SubmitIdeas)?;
        if file.file_name.trim().is_empty() {
            return Err(CoreError::Validation("File name must not be empty".into()).into());
        }
        let idea = self.store.get_idea(id).await?;
        if idea.created_by != actor.id {
            self.authorize(actor, Capability::ManageTasks)?;
        }

        let attachment = self.store.upload_attachment(id, file).await?;
        self.store.add_idea_attachment(id, &attachment).await?;

        self.trail
            .append(
                actor,
                TrailEntry::new(id, event_types::ATTACHMENT_ADDED)
                    .description(attachment.file_name.clone())
                    .metadata(serde_json::json!({
                        "file_name": attachment.file_name,
                        "url": attachment.url,
                    })),
            )
            .await;

        self.publish_idea(
            names::IDEA_ATTACHMENT_ADDED,
            &idea,
            actor,
            serde_json::json!({ "file_name": attachment.file_name }),
        );
        Ok(attachment)
    }

    /// Move an idea to `to` on a user's direct request.
    ///
    /// The capability for `to` is checked first. Only completion is reachable
    /// here: approve and reject go through the approval coordinator, work
    /// starts with the first task and `PendingApproval` is reached only by
    /// undo.
    pub async fn transition_idea(
        &self,
        actor: &Actor,
        id: DbId,
        to: IdeaStatus,
    ) -> WorkflowResult<Idea> {
        let result = self.transition_idea_inner(actor, id, to).await;
        self.notify.report(result, |idea| {
            (
                "Idea status changed".into(),
                format!("\"{}\" is now {}.", idea.title, idea.status),
            )
        })
    }

    async fn transition_idea_inner(
        &self,
        actor: &Actor,
        id: DbId,
        to: IdeaStatus,
    ) -> WorkflowResult<Idea> {
        let capability = match to {
            IdeaStatus::Approved | IdeaStatus::Rejected | IdeaStatus::PendingApproval => {
                Capability::ReviewIdeas
            }
            IdeaStatus::Completed => Capability::CompleteIdeas,
            IdeaStatus::InProgress => Capability::ManageTasks,
        };
        self.authorize(actor, capability)?;
        let idea = self.store.get_idea(id).await?;
        self.apply_transition(actor, idea, to, TransitionOrigin::Direct)
            .await
    }

    /// Approve or reject on behalf of the approval coordinator, which owns
    /// the notification.
    pub(crate) async fn review_idea(
        &self,
        actor: &Actor,
        id: DbId,
        decision: IdeaStatus,
    ) -> WorkflowResult<Idea> {
        self.authorize(actor, Capability::ReviewIdeas)?;
        let idea = self.store.get_idea(id).await?;
        self.apply_transition(actor, idea, decision, TransitionOrigin::Review)
            .await
    }

    /// Compensating transition used by undo; the only way back into
    /// `PendingApproval`.
    pub(crate) async fn restore_idea(
        &self,
        actor: &Actor,
        id: DbId,
        to: IdeaStatus,
    ) -> WorkflowResult<Idea> {
        self.authorize(actor, Capability::ReviewIdeas)?;
        let idea = self.store.get_idea(id).await?;
        self.apply_transition(actor, idea, to, TransitionOrigin::Undo)
            .await
    }

    async fn apply_transition(
        &self,
        actor: &Actor,
        mut idea: Idea,
        to: IdeaStatus,
        origin: TransitionOrigin,
    ) -> WorkflowResult<Idea> {
        let from = idea.status;
        validate_idea_transition(from, to, origin)?;

        let tasks = if to == IdeaStatus::Completed {
            let tasks = self.store.list_tasks(&TaskFilter::for_idea(idea.id)).await?;
            let statuses: Vec<_> = tasks.iter().map(|t| t.status).collect();
            check_completion(&statuses)?;
            tasks
        } else {
            Vec::new()
        };

        let now = Utc::now();
        let change = if to.carries_decision() {
            IdeaStatusChange {
                status: to,
                approved_by: Some(actor.id),
                approved_at: Some(now),
            }
        } else {
            IdeaStatusChange {
                status: to,
                approved_by: None,
                approved_at: None,
            }
        };
        self.store.set_idea_status(idea.id, &change).await?;

        idea.status = to;
        idea.approved_by = change.approved_by;
        idea.approved_at = change.approved_at;
        idea.modified_at = now;

        self.trail
            .append(
                actor,
                TrailEntry::new(idea.id, event_type_for(to, origin))
                    .description(idea.title.clone())
                    .statuses(from, to)
                    .metadata(serde_json::json!({ "origin": origin.as_str() })),
            )
            .await;

        tracing::info!(idea_id = idea.id, %from, %to, ?origin, user_id = actor.id, "Idea transitioned");

        if to == IdeaStatus::Completed {
            let task_ids: Vec<DbId> = tasks.iter().map(|t| t.id).collect();
            let locked = self.discussions.lock_for_tasks(actor, &task_ids).await;
            if !locked.is_empty() {
                tracing::info!(idea_id = idea.id, ?locked, "Task discussions locked on completion");
            }
        }

        let bus_name = match (origin, to) {
            (TransitionOrigin::Undo, _) => names::IDEA_RESTORED,
            (_, IdeaStatus::Approved) => names::IDEA_APPROVED,
            (_, IdeaStatus::Rejected) => names::IDEA_REJECTED,
            _ => names::IDEA_STATUS_CHANGED,
        };
        self.publish_idea(
            bus_name,
            &idea,
            actor,
            serde_json::json!({ "from": from, "to": to }),
        );
        Ok(idea)
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    /// Create a task under an approved or in-progress idea.
    ///
    /// The first task of an `Approved` idea moves the idea to `InProgress`,
    /// recorded as its own trail event. The task's discussion thread is
    /// opened alongside.
    pub async fn create_task(&self, actor: &Actor, input: NewTask) -> WorkflowResult<Task> {
        let result = self.create_task_inner(actor, input).await;
        self.notify.report(result, |task| {
            ("Task created".into(), format!("\"{}\" was created.", task.title))
        })
    }

    async fn create_task_inner(&self, actor: &Actor, input: NewTask) -> WorkflowResult<Task> {
        self.authorize(actor, Capability::ManageTasks)?;
        input.validate()?;

        let idea = self.store.get_idea(input.idea_id).await?;
        if !accepts_tasks(idea.status) {
            return Err(CoreError::Conflict(format!(
                "Tasks can only be created for approved or in-progress ideas; idea {} is {}",
                idea.id, idea.status
            ))
            .into());
        }

        let id = self.store.create_task(&CreateTask::from(input)).await?;
        let task = self.store.get_task(id).await?;

        self.trail
            .append(
                actor,
                TrailEntry::new(task.idea_id, event_types::TASK_CREATED)
                    .task(id)
                    .description(task.title.clone())
                    .metadata(serde_json::json!({ "assigned_to": task.assigned_to })),
            )
            .await;
        tracing::info!(task_id = id, idea_id = task.idea_id, "Task created");

        if idea.status == IdeaStatus::Approved {
            let idea_id = idea.id;
            if let Err(e) = self
                .apply_transition(actor, idea, IdeaStatus::InProgress, TransitionOrigin::TaskCreation)
                .await
            {
                tracing::error!(idea_id, task_id = id, error = %e, "Failed to start idea on first task");
            }
        }

        if let Err(e) = self
            .discussions
            .create_thread(actor, DiscussionOwner::Task(id), Some(task.title.clone()))
            .await
        {
            tracing::error!(task_id = id, error = %e, "Failed to open task discussion");
        }

        self.bus.publish(
            PlatformEvent::new(names::TASK_CREATED)
                .for_idea(task.idea_id)
                .with_source("task", id)
                .with_actor(actor.id)
                .with_payload(serde_json::json!({ "title": task.title })),
        );
        Ok(task)
    }

    /// Update a task. Task managers may change every field; assignees only
    /// status and progress. Status moves freely among the task statuses.
    pub async fn update_task(
        &self,
        actor: &Actor,
        id: DbId,
        update: TaskUpdate,
    ) -> WorkflowResult<Task> {
        let result = self.update_task_inner(actor, id, update).await;
        self.notify.report(result, |task| {
            ("Task updated".into(), format!("\"{}\" was saved.", task.title))
        })
    }

    async fn update_task_inner(
        &self,
        actor: &Actor,
        id: DbId,
        update: TaskUpdate,
    ) -> WorkflowResult<Task> {
        let task = self.store.get_task(id).await?;
        let changed = update.changed_fields();

        if !actor.can(Capability::ManageTasks) {
            self.authorize(actor, Capability::UpdateAssignedTasks)?;
            if !task.is_assigned_to(actor.id) {
                return Err(CoreError::Forbidden(format!(
                    "Task {id} is not assigned to user {}",
                    actor.id
                ))
                .into());
            }
            validate_assignee_fields(&changed)?;
        }

        if changed.is_empty() {
            return Err(CoreError::Validation("No fields to update".into()).into());
        }
        update.validate()?;
        if let Some(pct) = update.percent_complete {
            validate_percent_complete(pct)?;
        }

        self.store.update_task(id, &update).await?;
        let mut updated = task.clone();
        update.apply_to(&mut updated);
        updated.modified_at = Utc::now();

        let entry = match update.status {
            Some(status) if status != task.status => {
                TrailEntry::new(task.idea_id, event_types::STATUS_CHANGED)
                    .task(id)
                    .description(task.title.clone())
                    .statuses(task.status, status)
            }
            _ => TrailEntry::new(task.idea_id, event_types::TASK_UPDATED)
                .task(id)
                .description(task.title.clone()),
        }
        .metadata(serde_json::json!({ "fields": changed }));
        self.trail.append(actor, entry).await;

        tracing::info!(task_id = id, idea_id = task.idea_id, ?changed, "Task updated");
        self.bus.publish(
            PlatformEvent::new(names::TASK_UPDATED)
                .for_idea(task.idea_id)
                .with_source("task", id)
                .with_actor(actor.id)
                .with_payload(serde_json::json!({
                    "fields": changed,
                    "from": task.status,
                    "to": updated.status,
                })),
        );
        Ok(updated)
    }

    // -----------------------------------------------------------------------
    // Discussions
    // -----------------------------------------------------------------------

    pub async fn open_discussion(
        &self,
        actor: &Actor,
        owner: DiscussionOwner,
        context: Option<String>,
    ) -> WorkflowResult<Discussion> {
        let result = match self.authorize(actor, Capability::Comment) {
            Ok(()) => self.discussions.create_thread(actor, owner, context).await,
            Err(e) => Err(e.into()),
        };
        self.notify.report(result, |thread| {
            (
                "Discussion opened".into(),
                format!("Discussion #{} is open.", thread.id),
            )
        })
    }

    pub async fn discussion(&self, id: DbId) -> WorkflowResult<DiscussionThread> {
        self.discussions.get_thread(id).await
    }

    pub async fn set_discussion_locked(
        &self,
        actor: &Actor,
        id: DbId,
        locked: bool,
    ) -> WorkflowResult<Discussion> {
        let result = match self.authorize(actor, Capability::ModerateDiscussions) {
            Ok(()) => self.discussions.set_locked(actor, id, locked).await,
            Err(e) => Err(e.into()),
        };
        self.notify.report(result, |thread| {
            let title = if thread.locked {
                "Discussion locked"
            } else {
                "Discussion unlocked"
            };
            (title.into(), format!("Discussion #{} was updated.", thread.id))
        })
    }

    pub async fn add_message(
        &self,
        actor: &Actor,
        id: DbId,
        input: NewMessage,
    ) -> WorkflowResult<DiscussionMessage> {
        let result = match self.authorize(actor, Capability::Comment) {
            Ok(()) => self.discussions.add_message(actor, id, input).await,
            Err(e) => Err(e.into()),
        };
        self.notify.report(result, |_| {
            (
                "Message posted".into(),
                format!("Your message was added to discussion #{id}."),
            )
        })
    }

    fn publish_idea(&self, name: &str, idea: &Idea, actor: &Actor, payload: serde_json::Value) {
        self.bus.publish(
            PlatformEvent::new(name)
                .for_idea(idea.id)
                .with_source("idea", idea.id)
                .with_actor(actor.id)
                .with_payload(payload),
        );
    }
}
