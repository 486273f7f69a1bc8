//! Searchable, sortable and paginated list views.
//!
//! Admin tables (users, vendors, units, PO groups) share one query contract:
//! `search`, `sort_by`, `sort_dir`, `page`, `per_page` plus per-table filter
//! keys. Each table describes its columns with a [`TableColumns`] and its rows
//! implement [`TableRow`].

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashMap;

pub const DEFAULT_PER_PAGE: usize = 10;
pub const MAX_PER_PAGE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDir {
	Asc,
	Desc,
}

impl SortDir {
	fn parse(s: &str) -> Option<Self> {
		match s.to_ascii_lowercase().as_str() {
			"asc" => Some(Self::Asc),
			"desc" => Some(Self::Desc),
			_ => None,
		}
	}
}

/// Parsed list query string.
#[derive(Debug, Clone, PartialEq)]
pub struct ListQuery {
	pub search: Option<String>,
	pub sort_by: Option<String>,
	pub sort_dir: Option<SortDir>,
	pub page: usize,
	pub per_page: usize,
	/// Remaining non-empty parameters; a table only honours the keys it
	/// lists in [`TableColumns::filters`].
	pub filters: HashMap<String, String>,
}

impl Default for ListQuery {
	fn default() -> Self {
		Self {
			search: None,
			sort_by: None,
			sort_dir: None,
			page: 1,
			per_page: DEFAULT_PER_PAGE,
			filters: HashMap::new(),
		}
	}
}

impl ListQuery {
	/// Builds a query from raw query-string parameters.
	///
	/// Unparseable or out-of-range paging values fall back to their defaults
	/// rather than failing the request; `per_page` is capped at
	/// [`MAX_PER_PAGE`].
	pub fn from_params(mut params: HashMap<String, String>) -> Self {
		let non_empty = |v: Option<String>| {
			v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
		};

		let search = non_empty(params.remove("search"));
		let sort_by = non_empty(params.remove("sort_by"));
		let sort_dir = non_empty(params.remove("sort_dir")).and_then(|s| SortDir::parse(&s));
		let page = params
			.remove("page")
			.and_then(|p| p.trim().parse::<usize>().ok())
			.filter(|p| *p >= 1)
			.unwrap_or(1);
		let per_page = params
			.remove("per_page")
			.and_then(|p| p.trim().parse::<usize>().ok())
			.filter(|p| *p >= 1)
			.map(|p| p.min(MAX_PER_PAGE))
			.unwrap_or(DEFAULT_PER_PAGE);

		let filters = params
			.into_iter()
			.filter(|(_, v)| !v.trim().is_empty())
			.collect();

		Self {
			search,
			sort_by,
			sort_dir,
			page,
			per_page,
			filters,
		}
	}
}

/// One page of a list view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
	pub data: Vec<T>,
	pub total: usize,
	pub page: usize,
	pub per_page: usize,
	pub total_pages: usize,
}

impl<T> Page<T> {
	/// Converts every row, keeping the paging metadata.
	pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
		Page {
			data: self.data.into_iter().map(f).collect(),
			total: self.total,
			page: self.page,
			per_page: self.per_page,
			total_pages: self.total_pages,
		}
	}
}

/// A row that can be searched, filtered and sorted by column name.
pub trait TableRow {
	/// `needle` is already lower-cased.
	fn matches_search(&self, needle: &str) -> bool;

	/// Whether the row passes the filter `key = value`. Only called for keys
	/// listed in the table's [`TableColumns::filters`].
	fn matches_filter(&self, key: &str, value: &str) -> bool;

	/// Ascending comparison on `column`. Only called for columns listed in
	/// [`TableColumns::sort_columns`].
	fn compare_by(&self, other: &Self, column: &str) -> Ordering;
}

/// Column metadata for one list view.
#[derive(Debug, Clone, Copy)]
pub struct TableColumns {
	pub sort_columns: &'static [&'static str],
	pub default_sort: &'static str,
	pub default_dir: SortDir,
	pub filters: &'static [&'static str],
}

impl TableColumns {
	/// Applies search, filters, sort and pagination to `rows`.
	///
	/// An unknown `sort_by` falls back to the default column and direction.
	/// A page past the end yields an empty `data` with correct totals.
	pub fn apply<T: TableRow>(&self, rows: Vec<T>, query: &ListQuery) -> Page<T> {
		let needle = query.search.as_ref().map(|s| s.to_lowercase());
		let active_filters: Vec<(&str, &str)> = self
			.filters
			.iter()
			.filter_map(|key| query.filters.get(*key).map(|v| (*key, v.as_str())))
			.collect();

		let mut rows: Vec<T> = rows
			.into_iter()
			.filter(|row| needle.as_deref().is_none_or(|n| row.matches_search(n)))
			.filter(|row| {
				active_filters
					.iter()
					.all(|(key, value)| row.matches_filter(key, value))
			})
			.collect();

		let (column, dir) = match query.sort_by.as_deref() {
			Some(col) if self.sort_columns.contains(&col) => {
				(col, query.sort_dir.unwrap_or(SortDir::Asc))
			},
			_ => (self.default_sort, self.default_dir),
		};
		rows.sort_by(|a, b| {
			let ord = a.compare_by(b, column);
			match dir {
				SortDir::Asc => ord,
				SortDir::Desc => ord.reverse(),
			}
		});

		let total = rows.len();
		let per_page = query.per_page.clamp(1, MAX_PER_PAGE);
		let total_pages = total.div_ceil(per_page).max(1);
		let page = query.page.max(1);
		let data = rows
			.into_iter()
			.skip((page - 1).saturating_mul(per_page))
			.take(per_page)
			.collect();

		Page {
			data,
			total,
			page,
			per_page,
			total_pages,
		}
	}
}

/// Case-insensitive substring match against an already lower-cased needle.
pub fn contains_ci(haystack: &str, needle: &str) -> bool {
	haystack.to_lowercase().contains(needle)
}

/// Matches a boolean column against a `true`/`false` filter value.
/// Unrecognised values do not filter anything out.
pub fn bool_filter(actual: bool, value: &str) -> bool {
	match value.to_ascii_lowercase().as_str() {
		"true" | "1" => actual,
		"false" | "0" => !actual,
		_ => true,
	}
}

/// Compares optional strings case-insensitively, sorting missing values first.
pub fn cmp_opt_ci(a: Option<&str>, b: Option<&str>) -> Ordering {
	a.map(str::to_lowercase).cmp(&b.map(str::to_lowercase))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Debug, Clone, PartialEq)]
	struct Row {
		name: &'static str,
		active: bool,
		rank: u32,
	}

	impl TableRow for Row {
		fn matches_search(&self, needle: &str) -> bool {
			contains_ci(self.name, needle)
		}

		fn matches_filter(&self, key: &str, value: &str) -> bool {
			match key {
				"is_active" => bool_filter(self.active, value),
				_ => true,
			}
		}

		fn compare_by(&self, other: &Self, column: &str) -> Ordering {
			match column {
				"rank" => self.rank.cmp(&other.rank),
				_ => self.name.to_lowercase().cmp(&other.name.to_lowercase()),
			}
		}
	}

	const TABLE: TableColumns = TableColumns {
		sort_columns: &["name", "rank"],
		default_sort: "name",
		default_dir: SortDir::Asc,
		filters: &["is_active"],
	};

	fn rows() -> Vec<Row> {
		vec![
			Row { name: "Kenworth", active: true, rank: 3 },
			Row { name: "Peterbilt", active: false, rank: 1 },
			Row { name: "Ford", active: true, rank: 2 },
			Row { name: "kubota", active: true, rank: 5 },
		]
	}

	fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
		pairs
			.iter()
			.map(|(k, v)| (k.to_string(), v.to_string()))
			.collect()
	}

	#[test]
	fn test_query_defaults_and_caps() {
		let q = ListQuery::from_params(params(&[
			("page", "0"),
			("per_page", "1000"),
			("search", "  "),
			("is_active", ""),
			("unit_type", "trailer"),
		]));
		assert_eq!(q.page, 1);
		assert_eq!(q.per_page, MAX_PER_PAGE);
		assert_eq!(q.search, None);
		assert!(!q.filters.contains_key("is_active"));
		assert_eq!(q.filters.get("unit_type").map(String::as_str), Some("trailer"));

		let q = ListQuery::from_params(params(&[("page", "abc"), ("per_page", "-5")]));
		assert_eq!(q.page, 1);
		assert_eq!(q.per_page, DEFAULT_PER_PAGE);
	}

	#[test]
	fn test_search_is_case_insensitive_substring() {
		let q = ListQuery::from_params(params(&[("search", "K")]));
		let page = TABLE.apply(rows(), &q);
		let names: Vec<_> = page.data.iter().map(|r| r.name).collect();
		assert_eq!(names, vec!["Kenworth", "kubota"]);
	}

	#[test]
	fn test_filter_and_sort() {
		let q = ListQuery::from_params(params(&[
			("is_active", "true"),
			("sort_by", "rank"),
			("sort_dir", "desc"),
		]));
		let page = TABLE.apply(rows(), &q);
		let ranks: Vec<_> = page.data.iter().map(|r| r.rank).collect();
		assert_eq!(ranks, vec![5, 3, 2]);
		assert_eq!(page.total, 3);
	}

	#[test]
	fn test_unknown_sort_falls_back_to_default() {
		let q = ListQuery::from_params(params(&[("sort_by", "password_hash"), ("sort_dir", "desc")]));
		let page = TABLE.apply(rows(), &q);
		let names: Vec<_> = page.data.iter().map(|r| r.name).collect();
		assert_eq!(names, vec!["Ford", "Kenworth", "kubota", "Peterbilt"]);
	}

	#[test]
	fn test_pagination() {
		let q = ListQuery::from_params(params(&[("per_page", "3"), ("page", "2")]));
		let page = TABLE.apply(rows(), &q);
		assert_eq!(page.total, 4);
		assert_eq!(page.total_pages, 2);
		assert_eq!(page.data.len(), 1);
		assert_eq!(page.data[0].name, "Peterbilt");

		let q = ListQuery::from_params(params(&[("page", "9")]));
		let page = TABLE.apply(rows(), &q);
		assert!(page.data.is_empty());
		assert_eq!(page.total, 4);

		let empty = TABLE.apply(Vec::<Row>::new(), &ListQuery::default());
		assert_eq!(empty.total_pages, 1);
		let mapped = empty.map(|r| r.name);
		assert_eq!(mapped.page, 1);
	}
}
