//! Filtering, sorting and paging of the employee directory.

use std::{cmp::Ordering, collections::HashSet, fmt, str::FromStr};

use regex::Regex;
use thiserror::Error;

use crate::domain::{
    department::DepartmentId,
    employee::{Employee, Status},
    stats::{StatusCounts, tab_counts},
    tree::OrgTree,
};

/// Criteria an employee must satisfy to be listed.
///
/// An empty filter matches everyone. Criteria combine with AND.
#[derive(Debug, Clone, Default)]
pub struct EmployeeFilter {
    statuses: Vec<Status>,
    departments: Option<HashSet<DepartmentId>>,
    unassigned: bool,
    contains: Option<String>,
    regex: Option<Regex>,
}

impl EmployeeFilter {
    /// A filter that matches everyone.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to the given statuses. An empty list means any status.
    #[must_use]
    pub fn with_statuses(mut self, statuses: impl IntoIterator<Item = Status>) -> Self {
        self.statuses = statuses.into_iter().collect();
        self
    }

    /// Restricts to employees in `department` or any of its descendants.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnknownDepartment`] if the tree has no such
    /// department.
    pub fn with_department(mut self, tree: &OrgTree, department: &DepartmentId) -> Result<Self, QueryError> {
        let node = tree
            .find_node(department)
            .ok_or_else(|| QueryError::UnknownDepartment(department.clone()))?;
        self.departments = Some(node.descendant_id_set());
        Ok(self)
    }

    /// Restricts to employees without a department.
    #[must_use]
    pub const fn unassigned_only(mut self) -> Self {
        self.unassigned = true;
        self
    }

    /// Case-insensitive substring match against name, email and department
    /// path.
    #[must_use]
    pub fn with_text(mut self, text: &str) -> Self {
        let text = text.trim();
        self.contains = (!text.is_empty()).then(|| text.to_lowercase());
        self
    }

    /// Regular expression match against name, email and department path.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::InvalidPattern`] if the pattern does not compile.
    pub fn with_regex(mut self, pattern: &str) -> Result<Self, QueryError> {
        let regex = Regex::new(pattern).map_err(|source| QueryError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        self.regex = Some(regex);
        Ok(self)
    }

    /// The same filter with the status restriction dropped.
    ///
    /// Tab badges count what each tab would show, so they apply every other
    /// criterion.
    #[must_use]
    pub fn without_status(&self) -> Self {
        Self {
            statuses: Vec::new(),
            ..self.clone()
        }
    }

    /// Whether `employee` satisfies every criterion.
    #[must_use]
    pub fn matches(&self, employee: &Employee, tree: &OrgTree) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&employee.status) {
            return false;
        }

        if self.unassigned && employee.department_id.is_some() {
            return false;
        }

        if let Some(departments) = &self.departments {
            let inside = employee
                .department_id
                .as_ref()
                .is_some_and(|id| departments.contains(id));
            if !inside {
                return false;
            }
        }

        if self.contains.is_none() && self.regex.is_none() {
            return true;
        }

        let path = department_path(employee, tree);

        if let Some(search) = &self.contains {
            let hit = [employee.name.as_str(), employee.email.as_str(), path.as_str()]
                .iter()
                .any(|field| field.to_lowercase().contains(search));
            if !hit {
                return false;
            }
        }

        if let Some(regex) = &self.regex {
            let hit = [employee.name.as_str(), employee.email.as_str(), path.as_str()]
                .iter()
                .any(|field| regex.is_match(field));
            if !hit {
                return false;
            }
        }

        true
    }
}

/// Errors building a query.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The department filter names a department that does not exist.
    #[error("Department '{0}' not found")]
    UnknownDepartment(DepartmentId),

    /// The search pattern is not a valid regular expression.
    #[error("Invalid search pattern '{pattern}'")]
    InvalidPattern {
        /// The offending pattern.
        pattern: String,
        /// Why it failed to compile.
        #[source]
        source: regex::Error,
    },
}

/// Employees matching `filter`, in directory order.
#[must_use]
pub fn filter_employees<'a>(employees: &'a [Employee], filter: &EmployeeFilter, tree: &OrgTree) -> Vec<&'a Employee> {
    employees.iter().filter(|e| filter.matches(e, tree)).collect()
}

/// Status tab badges for a filter: every criterion except the status applies.
#[must_use]
pub fn filtered_tab_counts(employees: &[Employee], filter: &EmployeeFilter, tree: &OrgTree) -> StatusCounts {
    let filter = filter.without_status();
    tab_counts(employees.iter().filter(|e| filter.matches(e, tree)))
}

fn department_path(employee: &Employee, tree: &OrgTree) -> String {
    employee
        .department_id
        .as_ref()
        .and_then(|id| tree.path(id))
        .unwrap_or_default()
}

/// Column to sort the employee list by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    /// Employee name.
    #[default]
    Name,
    /// Email address.
    Email,
    /// Job title.
    Position,
    /// Department path.
    Department,
    /// Monitoring status.
    Status,
    /// Compliance percentage.
    Compliance,
    /// Average daily VDT hours.
    AvgVdt,
    /// Today's VDT time as displayed.
    TodayVdt,
    /// Last activity as displayed.
    LastActive,
}

impl SortKey {
    /// All sort keys.
    pub const ALL: [Self; 9] = [
        Self::Name,
        Self::Email,
        Self::Position,
        Self::Department,
        Self::Status,
        Self::Compliance,
        Self::AvgVdt,
        Self::TodayVdt,
        Self::LastActive,
    ];

    /// Kebab-case name accepted by [`FromStr`].
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Position => "position",
            Self::Department => "department",
            Self::Status => "status",
            Self::Compliance => "compliance",
            Self::AvgVdt => "avg-vdt",
            Self::TodayVdt => "today-vdt",
            Self::LastActive => "last-active",
        }
    }

    fn value(self, employee: &Employee, tree: &OrgTree) -> SortValue {
        match self {
            Self::Name => SortValue::text(&employee.name),
            Self::Email => SortValue::text(&employee.email),
            Self::Position => SortValue::text(&employee.position),
            Self::Department => SortValue::text(&department_path(employee, tree)),
            Self::Status => SortValue::text(employee.status.as_str()),
            Self::Compliance => SortValue::Number(f64::from(employee.compliance)),
            Self::AvgVdt => SortValue::Number(employee.avg_vdt),
            Self::TodayVdt => SortValue::text(&employee.today_vdt),
            Self::LastActive => SortValue::text(&employee.last_active),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = InvalidSortKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == normalized)
            .ok_or_else(|| InvalidSortKeyError(s.to_string()))
    }
}

/// Error returned when parsing an unknown sort key.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown sort key '{0}'")]
pub struct InvalidSortKeyError(String);

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

impl SortDirection {
    /// The other direction.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }

    const fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Ascending => ordering,
            Self::Descending => ordering.reverse(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum SortValue {
    Text(String),
    Number(f64),
}

impl SortValue {
    fn text(value: &str) -> Self {
        Self::Text(value.to_lowercase())
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Text(a), Self::Text(b)) => a.cmp(b),
            (Self::Number(a), Self::Number(b)) => a.total_cmp(b),
            (Self::Text(_), Self::Number(_)) => Ordering::Less,
            (Self::Number(_), Self::Text(_)) => Ordering::Greater,
        }
    }
}

/// Sorts employees by one column.
///
/// The sort is stable in both directions: employees with equal keys keep
/// their input order. Text columns compare case-insensitively.
pub fn sort_employees<'a>(
    employees: impl IntoIterator<Item = &'a Employee>,
    key: SortKey,
    direction: SortDirection,
    tree: &OrgTree,
) -> Vec<&'a Employee> {
    let mut keyed: Vec<(SortValue, &Employee)> = employees
        .into_iter()
        .map(|employee| (key.value(employee, tree), employee))
        .collect();
    keyed.sort_by(|(a, _), (b, _)| direction.apply(a.compare(b)));
    keyed.into_iter().map(|(_, employee)| employee).collect()
}

/// One page of a longer list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Page<'a, T> {
    /// Items on this page.
    pub items: &'a [T],
    /// 1-based page number, clamped to the available range.
    pub number: usize,
    /// Number of pages; at least 1 even for an empty list.
    pub total_pages: usize,
    /// Number of items across all pages.
    pub total_items: usize,
    /// Maximum number of items per page.
    pub page_size: usize,
}

impl<T> Page<'_, T> {
    /// 1-based index of the first item on this page, 0 if the page is empty.
    #[must_use]
    pub fn first_item(&self) -> usize {
        if self.items.is_empty() {
            0
        } else {
            self.offset() + 1
        }
    }

    /// 1-based index of the last item on this page, 0 if the page is empty.
    #[must_use]
    pub fn last_item(&self) -> usize {
        self.offset() + self.items.len()
    }

    fn offset(&self) -> usize {
        (self.number - 1) * self.page_size
    }
}

/// Splits `items` into pages of `page_size` and returns page `number`.
///
/// Out-of-range page numbers clamp to the first or last page. A zero page
/// size is treated as one.
#[must_use]
pub fn paginate<T>(items: &[T], number: usize, page_size: usize) -> Page<'_, T> {
    let page_size = page_size.max(1);
    let total_pages = items.len().div_ceil(page_size).max(1);
    let number = number.clamp(1, total_pages);
    let start = (number - 1) * page_size;
    let end = (start + page_size).min(items.len());

    Page {
        items: &items[start.min(items.len())..end],
        number,
        total_pages,
        total_items: items.len(),
        page_size,
    }
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;
    use crate::domain::{
        employee::tests::employee,
        tree::tests::{id, sample_tree},
    };

    fn staff() -> Vec<Employee> {
        let mut staff = vec![
            employee("e1", Some("fe-ui"), Status::Active, 85, 6.2),
            employee("e2", Some("be-api"), Status::Warning, 45, 8.7),
            employee("e3", Some("qa"), Status::Active, 92, 5.0),
            employee("e4", Some("sales1"), Status::Offline, 0, 0.0),
            employee("e5", None, Status::Pending, 0, 0.0),
        ];
        staff[0].name = "Minjun Kim".to_string();
        staff[1].name = "seoyeon lee".to_string();
        staff[2].name = "Doyun Park".to_string();
        staff[3].name = "Jiwoo Choi".to_string();
        staff[4].name = "Haeun Jung".to_string();
        staff
    }

    fn ids<'a>(employees: impl IntoIterator<Item = &'a Employee>) -> Vec<&'a str> {
        employees.into_iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn empty_filter_matches_everyone() {
        let tree = sample_tree();
        let employees = staff();
        assert_eq!(filter_employees(&employees, &EmployeeFilter::new(), &tree).len(), 5);
    }

    #[test]
    fn department_filter_includes_descendants() {
        let tree = sample_tree();
        let employees = staff();
        let filter = EmployeeFilter::new().with_department(&tree, &id("dev")).unwrap();

        assert_eq!(ids(filter_employees(&employees, &filter, &tree)), ["e1", "e2", "e3"]);
    }

    #[test]
    fn unknown_department_is_rejected() {
        let tree = sample_tree();
        let err = EmployeeFilter::new().with_department(&tree, &id("ghost")).unwrap_err();
        assert!(matches!(err, QueryError::UnknownDepartment(_)));
    }

    #[test_case("MINJUN", &["e1"]; "name ignores case")]
    #[test_case("e2@company", &["e2"]; "email")]
    #[test_case("be-api", &["e2"]; "department path")]
    #[test_case("dev >", &["e1", "e2", "e3"]; "path separator")]
    #[test_case("   ", &["e1", "e2", "e3", "e4", "e5"]; "blank search matches all")]
    fn text_search(query: &str, expected: &[&str]) {
        let tree = sample_tree();
        let employees = staff();
        let filter = EmployeeFilter::new().with_text(query);

        assert_eq!(ids(filter_employees(&employees, &filter, &tree)), expected);
    }

    #[test]
    fn regex_search_matches_any_field() {
        let tree = sample_tree();
        let employees = staff();
        let filter = EmployeeFilter::new().with_regex("^(Doyun|Jiwoo) ").unwrap();

        assert_eq!(ids(filter_employees(&employees, &filter, &tree)), ["e3", "e4"]);
    }

    #[test]
    fn invalid_regex_is_reported() {
        assert!(matches!(
            EmployeeFilter::new().with_regex("(unclosed"),
            Err(QueryError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn status_and_unassigned_filters_combine() {
        let tree = sample_tree();
        let employees = staff();

        let pending = EmployeeFilter::new().with_statuses([Status::Pending]).unassigned_only();
        assert_eq!(ids(filter_employees(&employees, &pending, &tree)), ["e5"]);

        let active = EmployeeFilter::new().with_statuses([Status::Active]).unassigned_only();
        assert!(filter_employees(&employees, &active, &tree).is_empty());
    }

    #[test]
    fn tab_counts_ignore_the_status_criterion() {
        let tree = sample_tree();
        let employees = staff();
        let filter = EmployeeFilter::new()
            .with_statuses([Status::Warning])
            .with_department(&tree, &id("dev"))
            .unwrap();

        let counts = filtered_tab_counts(&employees, &filter, &tree);

        assert_eq!(counts.all, 3);
        assert_eq!(counts.active, 2);
        assert_eq!(counts.warning, 1);
    }

    #[test]
    fn name_sort_is_case_insensitive() {
        let tree = sample_tree();
        let employees = staff();

        let sorted = sort_employees(&employees, SortKey::Name, SortDirection::Ascending, &tree);

        assert_eq!(ids(sorted), ["e3", "e5", "e4", "e1", "e2"]);
    }

    #[test_case(SortKey::Name; "name")]
    #[test_case(SortKey::Email; "email")]
    #[test_case(SortKey::AvgVdt; "avg vdt")]
    fn descending_reverses_ascending_without_ties(key: SortKey) {
        let tree = sample_tree();
        let employees: Vec<_> = staff().into_iter().filter(|e| e.avg_vdt > 0.0).collect();

        let ascending = ids(sort_employees(&employees, key, SortDirection::Ascending, &tree));
        let mut descending = ids(sort_employees(&employees, key, SortDirection::Descending, &tree));
        descending.reverse();

        assert_eq!(ascending, descending);
    }

    #[test_case(SortDirection::Ascending; "ascending")]
    #[test_case(SortDirection::Descending; "descending")]
    fn ties_keep_input_order(direction: SortDirection) {
        let tree = sample_tree();
        let employees = vec![
            employee("a", None, Status::Active, 70, 1.0),
            employee("b", None, Status::Active, 90, 1.0),
            employee("c", None, Status::Active, 70, 1.0),
            employee("d", None, Status::Active, 90, 1.0),
        ];

        let sorted = ids(sort_employees(&employees, SortKey::Compliance, direction, &tree));

        let expected = match direction {
            SortDirection::Ascending => ["a", "c", "b", "d"],
            SortDirection::Descending => ["b", "d", "a", "c"],
        };
        assert_eq!(sorted, expected);
    }

    #[test]
    fn sort_key_parses_both_spellings() {
        assert_eq!("avg_vdt".parse::<SortKey>().unwrap(), SortKey::AvgVdt);
        assert_eq!("Last-Active".parse::<SortKey>().unwrap(), SortKey::LastActive);
        assert!("salary".parse::<SortKey>().is_err());
    }

    #[test_case(0, 1, 0, 1; "empty list still has one page")]
    #[test_case(25, 1, 8, 4; "first page")]
    #[test_case(25, 4, 1, 4; "last page is short")]
    #[test_case(25, 9, 1, 4; "past the end clamps to last page")]
    #[test_case(16, 2, 8, 2; "exact multiple")]
    fn pagination(len: usize, number: usize, expected_items: usize, expected_pages: usize) {
        let items: Vec<usize> = (0..len).collect();

        let page = paginate(&items, number, 8);

        assert_eq!(page.items.len(), expected_items);
        assert_eq!(page.total_pages, expected_pages);
        assert_eq!(page.total_items, len);
    }

    #[test]
    fn page_reports_item_range() {
        let items: Vec<usize> = (0..25).collect();
        let page = paginate(&items, 2, 8);
        assert_eq!(page.items[0], 8);
        assert_eq!((page.first_item(), page.last_item()), (9, 16));
    }
}
