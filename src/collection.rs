//! Deduplicated course list with filtering, sorting and headline stats

use crate::course::CourseRecord;
use std::collections::{BTreeSet, HashSet};
use std::str::FromStr;

const UNKNOWN: &str = "Unknown";

/// Unique courses in first-seen order, keyed by trimmed lower-case course name
#[derive(Debug, Default, Clone)]
pub struct CourseCollection {
    records: Vec<CourseRecord>,
    seen: HashSet<String>,
}

impl CourseCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `record` unless its name is missing or already present. Returns whether it was kept.
    pub fn insert(&mut self, record: CourseRecord) -> bool {
        let Some(key) = record.dedup_key() else {
            return false;
        };
        if !self.seen.insert(key) {
            return false;
        }
        self.records.push(record);
        true
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[CourseRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<CourseRecord> {
        self.records
    }

    pub fn clear(&mut self) {
        self.records.clear();
        self.seen.clear();
    }

    pub fn filter(&self, filter: &CourseFilter) -> Vec<&CourseRecord> {
        self.records.iter().filter(|c| filter.matches(c)).collect()
    }

    /// Every course, filtered then sorted. Sorting is stable.
    pub fn view(&self, filter: &CourseFilter, sort: SortKey) -> Vec<&CourseRecord> {
        let mut courses = self.filter(filter);
        courses.sort_by(|a, b| sort.value(a).cmp(sort.value(b)));
        courses
    }

    /// Distinct universities, sorted, with missing values reported as "Unknown"
    pub fn universities(&self) -> Vec<String> {
        self.distinct(|c| c.university())
    }

    /// Distinct degree types, sorted, with missing values reported as "Unknown"
    pub fn degree_types(&self) -> Vec<String> {
        self.distinct(|c| c.degree_type())
    }

    pub fn stats(&self) -> CollectionStats {
        CollectionStats {
            courses: self.len(),
            universities: self.universities().len(),
            degree_types: self.degree_types().len(),
        }
    }

    fn distinct<'a, F>(&'a self, field: F) -> Vec<String>
    where
        F: Fn(&'a CourseRecord) -> Option<&'a str>,
    {
        self.records
            .iter()
            .map(|c| field(c).unwrap_or(UNKNOWN))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .map(String::from)
            .collect()
    }
}

impl FromIterator<CourseRecord> for CourseCollection {
    fn from_iter<T: IntoIterator<Item = CourseRecord>>(iter: T) -> Self {
        let mut collection = Self::new();
        collection.extend(iter);
        collection
    }
}

impl Extend<CourseRecord> for CourseCollection {
    fn extend<T: IntoIterator<Item = CourseRecord>>(&mut self, iter: T) {
        for record in iter {
            self.insert(record);
        }
    }
}

/// Headline numbers shown above the course list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionStats {
    pub courses: usize,
    pub universities: usize,
    pub degree_types: usize,
}

/// Exact-match filter on university and degree type. `None` means "All".
#[derive(Debug, Clone, Default)]
pub struct CourseFilter {
    pub university: Option<String>,
    pub degree_type: Option<String>,
}

impl CourseFilter {
    pub fn matches(&self, course: &CourseRecord) -> bool {
        let field_matches = |wanted: &Option<String>, actual: Option<&str>| match wanted {
            Some(wanted) => actual.unwrap_or(UNKNOWN) == wanted.as_str(),
            None => true,
        };
        field_matches(&self.university, course.university())
            && field_matches(&self.degree_type, course.degree_type())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    CourseName,
    University,
    DegreeType,
}

impl SortKey {
    fn value<'a>(&self, course: &'a CourseRecord) -> &'a str {
        match self {
            SortKey::CourseName => course.course_name.as_deref().unwrap_or(""),
            SortKey::University => course.university().unwrap_or(""),
            SortKey::DegreeType => course.degree_type().unwrap_or(""),
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_', ' '], "").as_str() {
            "coursename" | "name" | "course" => Ok(SortKey::CourseName),
            "university" | "uni" => Ok(SortKey::University),
            "degreetype" | "degree" => Ok(SortKey::DegreeType),
            other => Err(format!(
                "unknown sort key '{other}', expected course-name, university or degree-type"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn course(name: &str, university: Option<&str>, degree: Option<&str>) -> CourseRecord {
        let mut record = CourseRecord::new(name, format!("https://example.ac.uk/{name}"));
        if let Some(u) = university {
            record.extra.insert("university".into(), json!(u));
        }
        if let Some(d) = degree {
            record.extra.insert("degree_type".into(), json!(d));
        }
        record
    }

    #[test]
    fn test_first_seen_wins() {
        let mut collection = CourseCollection::new();
        assert!(collection.insert(course("Accounting BA", Some("Leeds Beckett"), None)));
        assert!(!collection.insert(course("  accounting ba ", Some("Liverpool"), None)));
        assert!(!collection.insert(CourseRecord {
            source_url: "https://x.example".into(),
            ..Default::default()
        }));

        assert_eq!(collection.len(), 1);
        assert_eq!(collection.records()[0].university(), Some("Leeds Beckett"));
    }

    #[test]
    fn test_clear_resets_seen_names() {
        let mut collection: CourseCollection =
            vec![course("Physics", None, None)].into_iter().collect();
        collection.clear();
        assert!(collection.is_empty());
        assert!(collection.insert(course("Physics", None, None)));
    }

    #[test]
    fn test_filter_and_sort() {
        let collection: CourseCollection = vec![
            course("Zoology", Some("Brighton"), Some("BSc")),
            course("Actuarial Science", Some("Heriot-Watt"), Some("MSc")),
            course("Biology PGCE", Some("Brighton"), Some("PGCE")),
            course("Hospitality", None, Some("BSc")),
        ]
        .into_iter()
        .collect();

        let brighton = CourseFilter {
            university: Some("Brighton".into()),
            degree_type: None,
        };
        let names: Vec<_> = collection
            .view(&brighton, SortKey::CourseName)
            .iter()
            .map(|c| c.display_name())
            .collect();
        assert_eq!(names, vec!["Biology PGCE", "Zoology"]);

        let unknown = CourseFilter {
            university: Some("Unknown".into()),
            degree_type: Some("BSc".into()),
        };
        assert_eq!(collection.filter(&unknown).len(), 1);

        let by_degree: Vec<_> = collection
            .view(&CourseFilter::default(), SortKey::DegreeType)
            .iter()
            .map(|c| c.display_name())
            .collect();
        assert_eq!(
            by_degree,
            vec!["Zoology", "Hospitality", "Actuarial Science", "Biology PGCE"]
        );
    }

    #[test]
    fn test_stats() {
        let collection: CourseCollection = vec![
            course("A", Some("Brighton"), Some("BSc")),
            course("B", Some("Brighton"), None),
            course("C", None, None),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            collection.stats(),
            CollectionStats {
                courses: 3,
                universities: 2,
                degree_types: 2,
            }
        );
        assert_eq!(collection.universities(), vec!["Brighton", "Unknown"]);
    }

    #[test]
    fn test_sort_key_from_str() {
        assert_eq!("Course Name".parse::<SortKey>(), Ok(SortKey::CourseName));
        assert_eq!("degree-type".parse::<SortKey>(), Ok(SortKey::DegreeType));
        assert!("fees".parse::<SortKey>().is_err());
    }
}
