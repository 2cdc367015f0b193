use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;

use crate::api::server::AppState;
use crate::api::session::CurrentUser;
use crate::api::MessageResponse;
use crate::db::models::{due_date, Priority, RecurrencePattern, Todo, DEFAULT_CATEGORY};
use crate::db::repo::{next_id, Commit};
use crate::error::AppError;
use crate::tasks::{self, recurrence, summary, ListParams, ListQuery};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodo {
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "due_date::deserialize")]
    pub due_date: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub recurring: Option<bool>,
    pub recurrence_pattern: Option<RecurrencePattern>,
}

impl CreateTodo {
    fn into_todo(self, id: u64, user_id: u64, now: DateTime<Utc>) -> Todo {
        Todo {
            id,
            user_id,
            title: self.title,
            description: self.description.unwrap_or_default(),
            completed: false,
            priority: self.priority.unwrap_or_default(),
            category: self
                .category
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
            due_date: self.due_date,
            recurring: self.recurring.unwrap_or(false),
            recurrence_pattern: self.recurrence_pattern.unwrap_or_default(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update: only the fields present in the request are applied.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodo {
    pub title: Option<String>,
    pub description: Option<String>,
    pub completed: Option<bool>,
    #[serde(default, deserialize_with = "due_date::deserialize_patch")]
    pub due_date: Option<Option<NaiveDate>>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub recurring: Option<bool>,
    pub recurrence_pattern: Option<RecurrencePattern>,
}

impl UpdateTodo {
    fn apply(self, todo: &mut Todo, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            todo.title = title;
        }
        if let Some(description) = self.description {
            todo.description = description;
        }
        if let Some(completed) = self.completed {
            todo.completed = completed;
        }
        if let Some(due_date) = self.due_date {
            todo.due_date = due_date;
        }
        if let Some(priority) = self.priority {
            todo.priority = priority;
        }
        if let Some(category) = self.category {
            todo.category = category;
        }
        if let Some(recurring) = self.recurring {
            todo.recurring = recurring;
        }
        if let Some(pattern) = self.recurrence_pattern {
            todo.recurrence_pattern = pattern;
        }
        todo.updated_at = now;
    }
}

/// `GET /todos`. Materializes overdue daily tasks before filtering, so this
/// read may write.
pub async fn list_todos(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    params: Result<Query<ListParams>, QueryRejection>,
) -> Result<Json<Vec<Todo>>, AppError> {
    let Query(params) = params?;
    let query = ListQuery::from(params);
    let today = tasks::today();
    let now = Utc::now();

    let mut todos = state
        .store
        .todos
        .update(|todos| {
            let created = recurrence::materialize_daily(todos, user.id, today, now, next_id(todos));
            let changed = !created.is_empty();
            if changed {
                tracing::debug!(user_id = user.id, count = created.len(), "materialized daily todos");
            }
            todos.extend(created);

            let mine: Vec<Todo> = todos.iter().filter(|t| t.user_id == user.id).cloned().collect();
            Ok(if changed {
                Commit::Write(mine)
            } else {
                Commit::Skip(mine)
            })
        })
        .await?;

    query.apply(&mut todos, today);
    Ok(Json(todos))
}

pub async fn create_todo(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    payload: Result<Json<CreateTodo>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), AppError> {
    let Json(payload) = payload?;
    if payload.title.trim().is_empty() {
        return Err(AppError::validation("Title is required"));
    }

    let now = Utc::now();
    let todo = state
        .store
        .todos
        .update(|todos| {
            let todo = payload.into_todo(next_id(todos), user.id, now);
            todos.push(todo.clone());
            Ok(Commit::Write(todo))
        })
        .await?;

    tracing::debug!(user_id = user.id, todo_id = todo.id, "created todo");
    Ok((StatusCode::CREATED, Json(todo)))
}

pub async fn update_todo(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    id: Result<Path<u64>, PathRejection>,
    payload: Result<Json<UpdateTodo>, JsonRejection>,
) -> Result<Json<Todo>, AppError> {
    let Path(id) = id?;
    let Json(patch) = payload?;
    if patch.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(AppError::validation("Title cannot be empty"));
    }

    let today = tasks::today();
    let now = Utc::now();
    let todo = state
        .store
        .todos
        .update(|todos| {
            let index = todos
                .iter()
                .position(|t| t.id == id && t.user_id == user.id)
                .ok_or(AppError::NotFound("Todo"))?;

            let completing = patch.completed == Some(true) && !todos[index].completed;
            if completing && todos[index].is_daily() {
                let next = recurrence::next_instance(&todos[index], next_id(todos), today, now);
                tracing::debug!(user_id = user.id, todo_id = id, next_id = next.id, "scheduled next daily todo");
                todos.push(next);
            }

            let todo = &mut todos[index];
            patch.apply(todo, now);
            Ok(Commit::Write(todo.clone()))
        })
        .await?;

    Ok(Json(todo))
}

pub async fn delete_todo(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
    id: Result<Path<u64>, PathRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Path(id) = id?;
    state
        .store
        .todos
        .update(|todos| {
            let index = todos
                .iter()
                .position(|t| t.id == id && t.user_id == user.id)
                .ok_or(AppError::NotFound("Todo"))?;
            todos.remove(index);
            Ok(Commit::Write(()))
        })
        .await?;

    tracing::debug!(user_id = user.id, todo_id = id, "deleted todo");
    Ok(Json(MessageResponse::new("Todo deleted successfully")))
}

pub async fn todo_stats(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<summary::Stats>, AppError> {
    let todos = state.store.todos_for(user.id).await?;
    Ok(Json(summary::stats(&todos, tasks::today())))
}

pub async fn todo_categories(
    State(state): State<Arc<AppState>>,
    user: CurrentUser,
) -> Result<Json<Vec<String>>, AppError> {
    let todos = state.store.todos_for(user.id).await?;
    Ok(Json(summary::categories(&todos)))
}
