use chrono::{DateTime, NaiveDate, Utc};

use crate::db::models::{RecurrencePattern, Todo};

/// Open copies, dated today, of every completed daily task of `user_id` whose
/// due date has passed. Ids are handed out from `next_id` upwards.
///
/// A copy loses its recurrence pattern so that it does not spawn copies of its
/// own. A series that still has an open recurring todo (same title and
/// category), whatever its due date, gets no new copy, so each series shows at
/// most one open instance across listings.
pub fn materialize_daily(
    todos: &[Todo],
    user_id: u64,
    today: NaiveDate,
    now: DateTime<Utc>,
    mut next_id: u64,
) -> Vec<Todo> {
    let mut created: Vec<Todo> = Vec::new();

    for todo in todos.iter().filter(|t| t.user_id == user_id) {
        let past_due = todo.due_date.is_some_and(|due| due < today);
        if !(todo.is_daily() && todo.completed && past_due) {
            continue;
        }
        let exists = todos
            .iter()
            .chain(created.iter())
            .any(|other| is_open_in_series(other, todo));
        if exists {
            continue;
        }

        created.push(Todo {
            id: next_id,
            completed: false,
            due_date: Some(today),
            recurrence_pattern: RecurrencePattern::None,
            created_at: now,
            updated_at: now,
            ..todo.clone()
        });
        next_id += 1;
    }

    created
}

fn is_open_in_series(other: &Todo, source: &Todo) -> bool {
    other.id != source.id
        && other.recurring
        && !other.completed
        && other.user_id == source.user_id
        && other.title == source.title
        && other.category == source.category
}

/// The instance that follows `todo` once it is completed: due the day after
/// its own due date, or tomorrow when it had none.
pub fn next_instance(todo: &Todo, id: u64, today: NaiveDate, now: DateTime<Utc>) -> Todo {
    let base = todo.due_date.unwrap_or(today);
    Todo {
        id,
        completed: false,
        due_date: Some(base.succ_opt().unwrap_or(base)),
        created_at: now,
        updated_at: now,
        ..todo.clone()
    }
}
