//! Operator / alarm / cluster selection
//!
//! A selection list that is omitted or empty resolves to the matching catalog list,
//! never to "whatever values appear in the data".

use super::catalog::Catalog;
use std::collections::HashSet;

/// Caller-supplied selection; `None` or an empty list means "use the catalog"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionCriteria {
    pub operators: Option<Vec<String>>,
    pub alarms: Option<Vec<String>>,
    pub clusters: Option<Vec<String>>,
}

impl SelectionCriteria {
    pub fn new(
        operators: Option<Vec<String>>,
        alarms: Option<Vec<String>>,
        clusters: Option<Vec<String>>,
    ) -> Self {
        Self {
            operators,
            alarms,
            clusters,
        }
    }

    /// Substitute catalog lists for missing or empty selections
    pub fn resolve(&self, catalog: &Catalog) -> ResolvedCriteria {
        ResolvedCriteria {
            operators: pick(&self.operators, &catalog.operators),
            alarms: pick(&self.alarms, &catalog.alarms),
            clusters: pick(&self.clusters, &catalog.clusters),
        }
    }
}

fn pick(selected: &Option<Vec<String>>, fallback: &[String]) -> Vec<String> {
    match selected {
        Some(values) if !values.is_empty() => values.clone(),
        _ => fallback.to_vec(),
    }
}

/// Concrete selection lists after catalog substitution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCriteria {
    pub operators: Vec<String>,
    pub alarms: Vec<String>,
    pub clusters: Vec<String>,
}

impl ResolvedCriteria {
    pub fn operator_set(&self) -> HashSet<&str> {
        self.operators.iter().map(String::as_str).collect()
    }

    pub fn alarm_set(&self) -> HashSet<&str> {
        self.alarms.iter().map(String::as_str).collect()
    }

    pub fn cluster_set(&self) -> HashSet<&str> {
        self.clusters.iter().map(String::as_str).collect()
    }

    /// Suggested download name for the rendered image
    ///
    /// Format: `Processed_Data_<operators>_<alarms>_<clusters>.png`, each list joined
    /// with `_`. Characters that are not allowed in file names become `-`.
    pub fn download_file_name(&self) -> String {
        let name = format!(
            "Processed_Data_{}_{}_{}.png",
            self.operators.join("_"),
            self.alarms.join("_"),
            self.clusters.join("_")
        );
        name.chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
                other => other,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Catalog {
        Catalog {
            clusters: vec!["Pune-1".into(), "Goa".into()],
            operators: vec!["RJIO".into(), "Mobile".into()],
            alarms: vec!["4G OUTAGE".into()],
            administrative_columns: vec![],
        }
    }

    #[test]
    fn test_missing_selection_uses_catalog() {
        let resolved = SelectionCriteria::default().resolve(&catalog());
        assert_eq!(resolved.clusters, vec!["Pune-1", "Goa"]);
        assert_eq!(resolved.operators, vec!["RJIO", "Mobile"]);
        assert_eq!(resolved.alarms, vec!["4G OUTAGE"]);
    }

    #[test]
    fn test_empty_selection_uses_catalog() {
        let criteria = SelectionCriteria::new(Some(vec![]), Some(vec![]), Some(vec![]));
        let resolved = criteria.resolve(&catalog());
        assert_eq!(resolved, SelectionCriteria::default().resolve(&catalog()));
    }

    #[test]
    fn test_explicit_selection_is_kept_even_outside_catalog() {
        let criteria = SelectionCriteria::new(Some(vec!["Airtel Dumps".into()]), None, None);
        let resolved = criteria.resolve(&catalog());
        assert_eq!(resolved.operators, vec!["Airtel Dumps"]);
        assert!(resolved.operator_set().contains("Airtel Dumps"));
        assert!(!resolved.operator_set().contains("RJIO"));
    }

    #[test]
    fn test_download_file_name() {
        let criteria = SelectionCriteria::new(
            Some(vec!["RJIO".into(), "Mobile".into()]),
            Some(vec!["Mains Fail/EB Fail".into()]),
            Some(vec!["Pune-1".into()]),
        );
        let resolved = criteria.resolve(&catalog());
        assert_eq!(
            resolved.download_file_name(),
            "Processed_Data_RJIO_Mobile_Mains Fail-EB Fail_Pune-1.png"
        );
    }
}
