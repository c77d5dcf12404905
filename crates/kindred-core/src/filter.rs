//! Member search.

use serde::{Deserialize, Serialize};

use crate::model::{Member, FOREST_ROOT_ID};

/// Search options. Every option that is set must match (logical AND); unset
/// or blank options match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    /// Case-insensitive substring of the member's name or code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_query: Option<String>,
    /// Case-insensitive substring of the occupation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupation: Option<String>,
    /// Case-insensitive substring of any tag
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Earliest birth year, inclusive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_year: Option<i32>,
    /// Latest birth year, inclusive
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_year: Option<i32>,
}

fn needle(opt: &Option<String>) -> Option<String> {
    opt.as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(needle))
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        needle(&self.text_query).is_none()
            && needle(&self.occupation).is_none()
            && needle(&self.tag).is_none()
            && self.start_year.is_none()
            && self.end_year.is_none()
    }

    pub fn matches(&self, member: &Member) -> bool {
        if member.id == FOREST_ROOT_ID {
            return false;
        }
        if let Some(q) = needle(&self.text_query) {
            if !contains_ci(Some(&member.name), &q) && !contains_ci(member.code.as_deref(), &q) {
                return false;
            }
        }
        if let Some(q) = needle(&self.occupation) {
            if !contains_ci(member.occupation.as_deref(), &q) {
                return false;
            }
        }
        if let Some(q) = needle(&self.tag) {
            if !member.tags.iter().any(|t| contains_ci(Some(t), &q)) {
                return false;
            }
        }
        if self.start_year.is_some() || self.end_year.is_some() {
            let Some(year) = birth_year(member) else {
                return false;
            };
            if self.start_year.is_some_and(|s| year < s) || self.end_year.is_some_and(|e| year > e) {
                return false;
            }
        }
        true
    }
}

/// Year parsed from the leading digits of the birth date ("1352-04-01" → 1352).
pub fn birth_year(member: &Member) -> Option<i32> {
    let date = member.birth_date.as_deref()?.trim();
    let digits: String = date.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Members matching `criteria`, in their input order.
pub fn filter<'a>(members: impl IntoIterator<Item = &'a Member>, criteria: &FilterCriteria) -> Vec<&'a Member> {
    members.into_iter().filter(|m| criteria.matches(m)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Gender, Graph};
    use crate::traverse::flatten;

    fn person(id: &str, name: &str, born: Option<&str>) -> Member {
        let mut m = Member::new(id, name, Gender::Male);
        m.birth_date = born.map(String::from);
        m
    }

    fn sample() -> Graph {
        let mut scholar = person("b", "Tran Bao", Some("1352-02-11"));
        scholar.occupation = Some("Court Scholar".into());
        scholar.tags = vec!["Mandarin".into(), "poet".into()];
        scholar.code = Some("TR-007".into());
        let root = person("a", "Tran An", Some("1320"))
            .with_child(scholar)
            .with_child(person("c", "Tran Cuong", Some("unknown")))
            .with_child(person("d", "Le Dung", Some("1358")))
            .with_child(person("e", "Tran Em", None));
        Graph::new(root)
    }

    fn ids(members: Vec<&Member>) -> Vec<&str> {
        members.into_iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn empty_criteria_match_everyone() {
        let graph = sample();
        let all = flatten(&graph);
        assert!(FilterCriteria::default().is_empty());
        assert_eq!(filter(all.clone(), &FilterCriteria::default()).len(), all.len());
    }

    #[test]
    fn text_query_checks_name_and_code() {
        let graph = sample();
        let by_name = FilterCriteria {
            text_query: Some("TRAN".into()),
            ..Default::default()
        };
        assert_eq!(ids(filter(flatten(&graph), &by_name)), vec!["a", "b", "c", "e"]);

        let by_code = FilterCriteria {
            text_query: Some("tr-007".into()),
            ..Default::default()
        };
        assert_eq!(ids(filter(flatten(&graph), &by_code)), vec!["b"]);
    }

    #[test]
    fn occupation_and_tag_are_anded() {
        let graph = sample();
        let criteria = FilterCriteria {
            occupation: Some("scholar".into()),
            tag: Some("POE".into()),
            ..Default::default()
        };
        assert_eq!(ids(filter(flatten(&graph), &criteria)), vec!["b"]);

        let miss = FilterCriteria {
            occupation: Some("scholar".into()),
            tag: Some("general".into()),
            ..Default::default()
        };
        assert!(filter(flatten(&graph), &miss).is_empty());
    }

    #[test]
    fn year_range_drops_unparseable_and_keeps_order() {
        let graph = sample();
        let criteria = FilterCriteria {
            start_year: Some(1350),
            end_year: Some(1360),
            ..Default::default()
        };
        assert_eq!(ids(filter(flatten(&graph), &criteria)), vec!["b", "d"]);

        let open_ended = FilterCriteria {
            end_year: Some(1340),
            ..Default::default()
        };
        assert_eq!(ids(filter(flatten(&graph), &open_ended)), vec!["a"]);
    }

    #[test]
    fn forest_root_never_matches() {
        let fake = Member::new(FOREST_ROOT_ID, "", Gender::Other);
        assert!(!FilterCriteria::default().matches(&fake));
    }

    #[test]
    fn birth_year_reads_leading_digits() {
        assert_eq!(birth_year(&person("x", "x", Some(" 1402/3/1"))), Some(1402));
        assert_eq!(birth_year(&person("x", "x", Some("circa 1402"))), None);
        assert_eq!(birth_year(&person("x", "x", None)), None);
    }
}
