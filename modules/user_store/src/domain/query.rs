//! Optional criteria folded into one AND predicate.
//!
//! The in-memory backend evaluates [`UserFilter::matches`]; the SeaORM backend
//! turns the same criteria into a `Condition` (see `infra::storage::sea_orm_repo`).

use crate::contract::model::{User, UserQuery};

/// One equality criterion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Criterion {
    Department(String),
    Role(String),
    Active(bool),
}

impl Criterion {
    pub fn matches(&self, user: &User) -> bool {
        match self {
            Criterion::Department(d) => &user.department == d,
            Criterion::Role(r) => &user.role == r,
            Criterion::Active(a) => user.active == *a,
        }
    }
}

/// Conjunction of criteria; empty matches every user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    criteria: Vec<Criterion>,
}

impl UserFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn department(mut self, department: impl Into<String>) -> Self {
        self.criteria.push(Criterion::Department(department.into()));
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.criteria.push(Criterion::Role(role.into()));
        self
    }

    pub fn active(mut self, active: bool) -> Self {
        self.criteria.push(Criterion::Active(active));
        self
    }

    /// Active members of `department`.
    pub fn active_in(department: impl Into<String>) -> Self {
        Self::all().department(department).active(true)
    }

    pub fn criteria(&self) -> &[Criterion] {
        &self.criteria
    }

    pub fn is_empty(&self) -> bool {
        self.criteria.is_empty()
    }

    pub fn matches(&self, user: &User) -> bool {
        self.criteria.iter().all(|c| c.matches(user))
    }
}

impl From<&UserQuery> for UserFilter {
    fn from(q: &UserQuery) -> Self {
        let mut filter = UserFilter::all();
        if let Some(d) = &q.department {
            filter = filter.department(d.clone());
        }
        if let Some(r) = &q.role {
            filter = filter.role(r.clone());
        }
        if let Some(a) = q.active {
            filter = filter.active(a);
        }
        filter
    }
}

impl UserQuery {
    /// The criteria of this query, without paging.
    pub fn filter(&self) -> UserFilter {
        UserFilter::from(self)
    }

    pub fn matches(&self, user: &User) -> bool {
        self.filter().matches(user)
    }
}

/// Result ordering; ties on name fall back to id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    ById,
    ByName,
}

impl SortOrder {
    pub fn sort(self, users: &mut [User]) {
        match self {
            SortOrder::ById => users.sort_by_key(|u| u.id),
            SortOrder::ByName => users.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id))),
        }
    }
}

/// Offset window over an ordered result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub offset: u64,
    pub limit: u64,
}

impl Window {
    pub fn new(offset: u64, limit: u64) -> Self {
        Self { offset, limit }
    }

    pub fn apply<T>(self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(usize::try_from(self.offset).unwrap_or(usize::MAX))
            .take(usize::try_from(self.limit).unwrap_or(usize::MAX))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(id: i64, name: &str, department: &str, role: &str, active: bool) -> User {
        let now = Utc::now();
        User {
            id,
            name: name.into(),
            email: format!("u{id}@x.com"),
            department: department.into(),
            role: role.into(),
            active,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn empty_filter_matches_everything() {
        let f = UserFilter::all();
        assert!(f.is_empty());
        assert!(f.matches(&user(1, "Ana", "IT", "Dev", true)));
        assert!(f.matches(&user(2, "Bo", "HR", "Mgr", false)));
    }

    #[test]
    fn criteria_are_conjunctive() {
        let f = UserFilter::all().department("IT").role("Dev").active(true);
        assert!(f.matches(&user(1, "Ana", "IT", "Dev", true)));
        assert!(!f.matches(&user(2, "Ana", "IT", "Dev", false)));
        assert!(!f.matches(&user(3, "Ana", "IT", "Lead", true)));
        assert!(!f.matches(&user(4, "Ana", "HR", "Dev", true)));
    }

    #[test]
    fn equality_is_exact() {
        let f = UserFilter::all().department("IT");
        assert!(!f.matches(&user(1, "Ana", "it", "Dev", true)));
        assert!(!f.matches(&user(1, "Ana", "IT ", "Dev", true)));
    }

    #[test]
    fn query_conversion_skips_absent_criteria() {
        let q = UserQuery {
            role: Some("Dev".into()),
            active: Some(false),
            ..Default::default()
        };
        assert_eq!(
            q.filter().criteria(),
            &[Criterion::Role("Dev".into()), Criterion::Active(false)]
        );
        assert!(q.matches(&user(1, "Ana", "HR", "Dev", false)));
        assert!(UserQuery::default().filter().is_empty());
    }

    #[test]
    fn name_order_breaks_ties_by_id() {
        let mut users = vec![
            user(3, "Carl", "IT", "Dev", true),
            user(2, "Ana", "IT", "Dev", true),
            user(1, "Carl", "IT", "Dev", true),
        ];
        SortOrder::ByName.sort(&mut users);
        let ids: Vec<_> = users.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[test]
    fn window_skips_then_takes() {
        let w = Window::new(2, 2);
        assert_eq!(w.apply(1..=5), vec![3, 4]);
        assert_eq!(Window::new(10, 2).apply(1..=5), Vec::<i32>::new());
    }
}
