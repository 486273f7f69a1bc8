//! Search, filter and sort columns of the paginated admin lists.

use std::cmp::Ordering;

use crate::listing::{bool_filter, cmp_opt_ci, contains_ci, SortDir, TableColumns, TableRow};
use crate::{PoGroupView, UnitView, UserView, Vendor};

pub const USER_TABLE: TableColumns = TableColumns {
	sort_columns: &["last_name", "first_name", "email", "created_at"],
	default_sort: "last_name",
	default_dir: SortDir::Asc,
	filters: &["is_active", "is_admin", "department_id"],
};

pub const VENDOR_TABLE: TableColumns = TableColumns {
	sort_columns: &["name", "contact_info", "is_active", "created_at"],
	default_sort: "name",
	default_dir: SortDir::Asc,
	filters: &["is_active"],
};

pub const UNIT_TABLE: TableColumns = TableColumns {
	sort_columns: &["unit_number", "unit_type", "is_active", "created_at"],
	default_sort: "unit_number",
	default_dir: SortDir::Asc,
	filters: &["is_active", "unit_type", "department_id"],
};

pub const PO_GROUP_TABLE: TableColumns = TableColumns {
	sort_columns: &["po_number", "created_at", "total", "order_count"],
	default_sort: "created_at",
	default_dir: SortDir::Desc,
	filters: &[],
};

fn cmp_ci(a: &str, b: &str) -> Ordering {
	cmp_opt_ci(Some(a), Some(b))
}

impl TableRow for UserView {
	fn matches_search(&self, needle: &str) -> bool {
		contains_ci(&self.first_name, needle)
			|| contains_ci(&self.last_name, needle)
			|| contains_ci(&self.email, needle)
			|| self
				.job_title
				.as_deref()
				.is_some_and(|t| contains_ci(t, needle))
	}

	fn matches_filter(&self, key: &str, value: &str) -> bool {
		match key {
			"is_active" => bool_filter(self.is_active, value),
			"is_admin" => bool_filter(self.is_admin, value),
			"department_id" => self.department_id.as_deref() == Some(value),
			_ => true,
		}
	}

	fn compare_by(&self, other: &Self, column: &str) -> Ordering {
		match column {
			"first_name" => cmp_ci(&self.first_name, &other.first_name),
			"email" => self.email.cmp(&other.email),
			"created_at" => self.created_at.cmp(&other.created_at),
			_ => cmp_ci(&self.last_name, &other.last_name)
				.then_with(|| cmp_ci(&self.first_name, &other.first_name)),
		}
	}
}

impl TableRow for Vendor {
	fn matches_search(&self, needle: &str) -> bool {
		contains_ci(&self.name, needle)
			|| self
				.contact_info
				.as_deref()
				.is_some_and(|c| contains_ci(c, needle))
	}

	fn matches_filter(&self, key: &str, value: &str) -> bool {
		match key {
			"is_active" => bool_filter(self.is_active, value),
			_ => true,
		}
	}

	fn compare_by(&self, other: &Self, column: &str) -> Ordering {
		match column {
			"contact_info" => {
				cmp_opt_ci(self.contact_info.as_deref(), other.contact_info.as_deref())
			},
			"is_active" => self.is_active.cmp(&other.is_active),
			"created_at" => self.created_at.cmp(&other.created_at),
			_ => cmp_ci(&self.name, &other.name),
		}
	}
}

impl TableRow for UnitView {
	fn matches_search(&self, needle: &str) -> bool {
		contains_ci(&self.unit.unit_number, needle)
			|| self
				.unit
				.description
				.as_deref()
				.is_some_and(|d| contains_ci(d, needle))
	}

	fn matches_filter(&self, key: &str, value: &str) -> bool {
		match key {
			"is_active" => bool_filter(self.unit.is_active, value),
			"unit_type" => self.unit.unit_type.as_str() == value,
			"department_id" => self.unit.department_id.as_deref() == Some(value),
			_ => true,
		}
	}

	fn compare_by(&self, other: &Self, column: &str) -> Ordering {
		match column {
			"unit_type" => self.unit.unit_type.as_str().cmp(other.unit.unit_type.as_str()),
			"is_active" => self.unit.is_active.cmp(&other.unit.is_active),
			"created_at" => self.unit.created_at.cmp(&other.unit.created_at),
			_ => cmp_ci(&self.unit.unit_number, &other.unit.unit_number),
		}
	}
}

impl TableRow for PoGroupView {
	fn matches_search(&self, needle: &str) -> bool {
		contains_ci(&self.po_number, needle)
	}

	fn matches_filter(&self, _key: &str, _value: &str) -> bool {
		true
	}

	fn compare_by(&self, other: &Self, column: &str) -> Ordering {
		match column {
			"po_number" => cmp_ci(&self.po_number, &other.po_number),
			"total" => self.total.cmp(&other.total),
			"order_count" => self.order_count.cmp(&other.order_count),
			_ => self.created_at.cmp(&other.created_at),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{ListQuery, Unit, UnitType, User};
	use chrono::{Duration, Utc};
	use std::collections::HashMap;

	fn user(first: &str, last: &str, admin: bool, active: bool) -> UserView {
		let now = Utc::now();
		let user = User {
			id: format!("{}-{}", first, last),
			email: format!("{}.{}@example.com", first, last).to_lowercase(),
			password_hash: String::new(),
			first_name: first.into(),
			last_name: last.into(),
			phone: None,
			department_id: None,
			job_title: Some("Mechanic".into()),
			is_admin: admin,
			is_active: active,
			created_at: now,
			updated_at: now,
		};
		UserView::new(&user, false, false, None)
	}

	fn query(params: &[(&str, &str)]) -> ListQuery {
		ListQuery::from_params(
			params
				.iter()
				.map(|(k, v)| (k.to_string(), v.to_string()))
				.collect::<HashMap<_, _>>(),
		)
	}

	#[test]
	fn test_users_default_sort_and_filters() {
		let rows = vec![
			user("Zed", "Adams", false, true),
			user("Amy", "Baker", true, true),
			user("Bob", "Adams", false, false),
		];

		let page = USER_TABLE.apply(rows.clone(), &ListQuery::default());
		let names: Vec<_> = page.data.iter().map(|u| u.full_name.as_str()).collect();
		assert_eq!(names, vec!["Bob Adams", "Zed Adams", "Amy Baker"]);

		let filters = query(&[("is_active", "true"), ("is_admin", "false")]);
		let page = USER_TABLE.apply(rows.clone(), &filters);
		assert_eq!(page.total, 1);
		assert_eq!(page.data[0].first_name, "Zed");

		let page = USER_TABLE.apply(rows, &query(&[("search", "baker")]));
		assert_eq!(page.total, 1);
	}

	#[test]
	fn test_units_filter_by_type() {
		let now = Utc::now();
		let unit = |number: &str, unit_type: UnitType, offset: i64| UnitView {
			unit: Unit {
				id: number.into(),
				unit_number: number.into(),
				description: None,
				unit_type,
				department_id: None,
				is_active: true,
				created_by_id: None,
				created_at: now + Duration::seconds(offset),
				updated_at: now,
			},
			department: None,
		};
		let rows = vec![
			unit("T-2", UnitType::Trailer, 0),
			unit("V-1", UnitType::Vehicle, 1),
			unit("T-1", UnitType::Trailer, 2),
		];

		let page = UNIT_TABLE.apply(rows.clone(), &query(&[("unit_type", "trailer")]));
		let numbers: Vec<_> = page.data.iter().map(|u| u.unit.unit_number.as_str()).collect();
		assert_eq!(numbers, vec!["T-1", "T-2"]);

		let page = UNIT_TABLE.apply(
			rows,
			&query(&[("sort_by", "created_at"), ("sort_dir", "desc")]),
		);
		assert_eq!(page.data[0].unit.unit_number, "T-1");
	}
}
