use chrono::NaiveDate;
use serde::Deserialize;
use std::cmp::Ordering;

use crate::db::models::{SortField, SortOrder, Todo};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Completed,
    Overdue,
}

impl StatusFilter {
    /// Unknown values mean no filter.
    pub fn from_param(raw: &str) -> Self {
        match raw {
            "active" => StatusFilter::Active,
            "completed" => StatusFilter::Completed,
            "overdue" => StatusFilter::Overdue,
            _ => StatusFilter::All,
        }
    }

    fn matches(self, todo: &Todo, today: NaiveDate) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Active => !todo.completed,
            StatusFilter::Completed => todo.completed,
            StatusFilter::Overdue => todo.is_overdue(today),
        }
    }
}

/// Raw `GET /todos` query string.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub filter: Option<String>,
    pub search: Option<String>,
    pub category: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListQuery {
    pub status: StatusFilter,
    /// Lowercased; empty means no search.
    pub search: String,
    pub category: Option<String>,
    pub sort_by: SortField,
    pub sort_order: SortOrder,
}

impl From<ListParams> for ListQuery {
    fn from(params: ListParams) -> Self {
        Self {
            status: params
                .filter
                .as_deref()
                .map(StatusFilter::from_param)
                .unwrap_or_default(),
            search: params.search.unwrap_or_default().to_lowercase(),
            category: params.category.filter(|c| !c.is_empty()),
            sort_by: params
                .sort_by
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
            sort_order: params
                .sort_order
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
        }
    }
}

impl ListQuery {
    pub fn matches(&self, todo: &Todo, today: NaiveDate) -> bool {
        self.matches_search(todo)
            && self.category.as_ref().is_none_or(|c| todo.category == *c)
            && self.status.matches(todo, today)
    }

    fn matches_search(&self, todo: &Todo) -> bool {
        if self.search.is_empty() {
            return true;
        }
        [&todo.title, &todo.description, &todo.category]
            .iter()
            .any(|field| field.to_lowercase().contains(&self.search))
    }

    /// Filters and sorts `todos` in place.
    pub fn apply(&self, todos: &mut Vec<Todo>, today: NaiveDate) {
        todos.retain(|todo| self.matches(todo, today));
        sort_todos(todos, self.sort_by, self.sort_order);
    }
}

pub fn compare_by(field: SortField, a: &Todo, b: &Todo) -> Ordering {
    match field {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        // A missing due date sorts as the Unix epoch.
        SortField::DueDate => due_or_epoch(a).cmp(&due_or_epoch(b)),
        SortField::Priority => a.priority.rank().cmp(&b.priority.rank()),
        SortField::Title => a.title.cmp(&b.title),
        SortField::Category => a.category.cmp(&b.category),
    }
}

fn due_or_epoch(todo: &Todo) -> NaiveDate {
    // NaiveDate::default() is 1970-01-01.
    todo.due_date.unwrap_or_default()
}

/// Ascending keeps ties in input order; descending is the exact reverse, so
/// ties come out in reversed input order.
pub fn sort_todos(todos: &mut [Todo], field: SortField, order: SortOrder) {
    todos.sort_by(|a, b| compare_by(field, a, b));
    if order == SortOrder::Desc {
        todos.reverse();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::Priority;
    use chrono::{TimeZone, Utc};

    fn todo(id: u64, title: &str) -> Todo {
        let created =
            Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + chrono::Duration::hours(id as i64);
        Todo {
            id,
            user_id: 1,
            title: title.to_string(),
            description: String::new(),
            completed: false,
            priority: Priority::Medium,
            category: "General".to_string(),
            due_date: None,
            recurring: false,
            recurrence_pattern: Default::default(),
            created_at: created,
            updated_at: created,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ids(todos: &[Todo]) -> Vec<u64> {
        todos.iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_params_fall_back_to_defaults() {
        let query = ListQuery::from(ListParams {
            filter: Some("bogus".into()),
            search: Some("MiLk".into()),
            category: Some(String::new()),
            sort_by: Some("color".into()),
            sort_order: Some("sideways".into()),
        });

        assert_eq!(query.status, StatusFilter::All);
        assert_eq!(query.search, "milk");
        assert_eq!(query.category, None);
        assert_eq!(query.sort_by, SortField::CreatedAt);
        assert_eq!(query.sort_order, SortOrder::Desc);
    }

    #[test]
    fn test_search_is_case_insensitive_across_fields() {
        let mut a = todo(1, "Buy MILK");
        a.category = "Errands".into();
        let mut b = todo(2, "Call mom");
        b.description = "about the milkman".into();
        let mut c = todo(3, "Taxes");
        c.category = "Milk Money".into();
        let d = todo(4, "Gym");

        let mut todos = vec![a, b, c, d];
        let query = ListQuery {
            search: "milk".into(),
            sort_order: SortOrder::Asc,
            ..Default::default()
        };
        query.apply(&mut todos, date(2024, 5, 10));

        assert_eq!(ids(&todos), vec![1, 2, 3]);
    }

    #[test]
    fn test_category_is_exact() {
        let mut a = todo(1, "a");
        a.category = "Work".into();
        let mut b = todo(2, "b");
        b.category = "work".into();

        let mut todos = vec![a, b];
        let query = ListQuery {
            category: Some("Work".into()),
            ..Default::default()
        };
        query.apply(&mut todos, date(2024, 5, 10));

        assert_eq!(ids(&todos), vec![1]);
    }

    #[test]
    fn test_status_filters() {
        let today = date(2024, 5, 10);
        let mut done = todo(1, "done");
        done.completed = true;
        done.due_date = Some(date(2024, 5, 1));
        let mut late = todo(2, "late");
        late.due_date = Some(date(2024, 5, 9));
        let mut due_today = todo(3, "today");
        due_today.due_date = Some(today);
        let open = todo(4, "open");
        let all = vec![done, late, due_today, open];

        let run = |status| {
            let mut todos = all.clone();
            ListQuery {
                status,
                sort_order: SortOrder::Asc,
                ..Default::default()
            }
            .apply(&mut todos, today);
            ids(&todos)
        };

        assert_eq!(run(StatusFilter::All), vec![1, 2, 3, 4]);
        assert_eq!(run(StatusFilter::Active), vec![2, 3, 4]);
        assert_eq!(run(StatusFilter::Completed), vec![1]);
        assert_eq!(run(StatusFilter::Overdue), vec![2]);
    }

    #[test]
    fn test_sort_by_priority() {
        let mut low = todo(1, "low");
        low.priority = Priority::Low;
        let mut high = todo(2, "high");
        high.priority = Priority::High;
        let medium = todo(3, "medium");

        let mut todos = vec![low, high, medium];
        sort_todos(&mut todos, SortField::Priority, SortOrder::Desc);
        assert_eq!(ids(&todos), vec![2, 3, 1]);

        sort_todos(&mut todos, SortField::Priority, SortOrder::Asc);
        assert_eq!(ids(&todos), vec![1, 3, 2]);
    }

    #[test]
    fn test_missing_due_date_sorts_as_epoch() {
        let mut a = todo(1, "a");
        a.due_date = Some(date(2024, 6, 1));
        let b = todo(2, "b");
        let mut c = todo(3, "c");
        c.due_date = Some(date(2024, 5, 1));

        let mut todos = vec![a, b, c];
        sort_todos(&mut todos, SortField::DueDate, SortOrder::Asc);
        assert_eq!(ids(&todos), vec![2, 3, 1]);
    }

    #[test]
    fn test_ties_follow_direction() {
        let mut todos = vec![todo(1, "x"), todo(2, "x"), todo(3, "x")];

        sort_todos(&mut todos, SortField::Title, SortOrder::Asc);
        assert_eq!(ids(&todos), vec![1, 2, 3]);

        sort_todos(&mut todos, SortField::Title, SortOrder::Desc);
        assert_eq!(ids(&todos), vec![3, 2, 1]);
    }

    #[test]
    fn test_sort_by_created_at_ascending() {
        let mut todos = vec![todo(2, "b"), todo(3, "c"), todo(1, "a")];
        sort_todos(&mut todos, SortField::CreatedAt, SortOrder::Asc);
        assert_eq!(ids(&todos), vec![1, 2, 3]);
    }

    #[test]
    fn test_sort_by_updated_at() {
        let mut a = todo(1, "a");
        a.updated_at = a.created_at + chrono::Duration::days(3);
        let mut b = todo(2, "b");
        b.updated_at = b.created_at + chrono::Duration::days(1);
        let c = todo(3, "c");

        let mut todos = vec![a, b, c];
        sort_todos(&mut todos, SortField::UpdatedAt, SortOrder::Asc);
        assert_eq!(ids(&todos), vec![3, 2, 1]);

        sort_todos(&mut todos, SortField::UpdatedAt, SortOrder::Desc);
        assert_eq!(ids(&todos), vec![1, 2, 3]);
    }

    #[test]
    fn test_sort_by_category() {
        let mut a = todo(1, "a");
        a.category = "Work".into();
        let mut b = todo(2, "b");
        b.category = "Errands".into();
        let mut c = todo(3, "c");
        c.category = "Home".into();

        let mut todos = vec![a, b, c];
        sort_todos(&mut todos, SortField::Category, SortOrder::Asc);
        assert_eq!(ids(&todos), vec![2, 3, 1]);

        sort_todos(&mut todos, SortField::Category, SortOrder::Desc);
        assert_eq!(ids(&todos), vec![1, 3, 2]);
    }

    #[test]
    fn test_default_sort_is_newest_first() {
        let mut todos = vec![todo(1, "a"), todo(3, "c"), todo(2, "b")];
        ListQuery::default().apply(&mut todos, date(2024, 5, 10));
        assert_eq!(ids(&todos), vec![3, 2, 1]);
    }
}
