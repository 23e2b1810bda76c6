//! Query records and the line-oriented query source
//!
//! A query line is `id:term term term` or just `term term term` with
//! integer term IDs. Queries without an id fall back to their position in
//! the batch, rendered as a string at output time.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::warn;

use crate::base::{Error, Result, Score, TermId};

#[derive(Clone, Debug)]
pub struct Query {
    pub id: Option<String>,
    pub terms: Vec<TermId>,
    /// Initial top-k entry threshold, if one was supplied for this query
    pub threshold: Option<Score>,
}

impl Query {
    pub fn new(terms: Vec<TermId>) -> Self {
        Self {
            id: None,
            terms,
            threshold: None,
        }
    }

    /// Parses one query line; returns `None` for blank lines
    pub fn parse(line: &str) -> Option<Query> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }

        let (id, rest) = match line.split_once(':') {
            Some((id, rest)) => (Some(id.to_string()), rest),
            None => (None, line),
        };

        let mut terms = Vec::new();
        for token in rest.split_whitespace() {
            match token.parse::<TermId>() {
                Ok(term) => terms.push(term),
                Err(_) => {
                    warn!("Ignoring unparsable term '{}' in query", token);
                }
            }
        }

        Some(Query {
            id,
            terms,
            threshold: None,
        })
    }

    /// The query identifier, or its batch position as a deterministic
    /// fallback
    pub fn id_or(&self, position: usize) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => position.to_string(),
        }
    }

    /// Deduplicated terms with their weights: 1 per term, or the term's
    /// multiplicity within the query when `weighted` is set
    pub fn term_weights(&self, weighted: bool) -> Vec<(TermId, f32)> {
        let mut out: Vec<(TermId, f32)> = Vec::new();
        for &term in &self.terms {
            match out.iter_mut().find(|(t, _)| *t == term) {
                Some((_, w)) if weighted => *w += 1.,
                Some(_) => {}
                None => out.push((term, 1.)),
            }
        }
        out
    }
}

/// Reads all queries from a file, one per line
pub fn read_queries(path: &Path) -> Result<Vec<Query>> {
    let reader = BufReader::new(File::open(path)?);
    let mut queries = Vec::new();
    for line in reader.lines() {
        if let Some(query) = Query::parse(&line?) {
            queries.push(query);
        }
    }
    Ok(queries)
}

/// Reads per-query thresholds (one float per line) and attaches them to the
/// queries positionally. A count mismatch is a configuration error.
pub fn attach_thresholds(queries: &mut [Query], path: &Path) -> Result<()> {
    let reader = BufReader::new(File::open(path)?);
    let mut thresholds = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let value = line
            .parse::<Score>()
            .map_err(|_| Error::Config(format!("invalid threshold '{}'", line)))?;
        thresholds.push(value);
    }

    if thresholds.len() != queries.len() {
        return Err(Error::Config(format!(
            "{} thresholds for {} queries",
            thresholds.len(),
            queries.len()
        )));
    }

    for (query, threshold) in queries.iter_mut().zip(thresholds) {
        query.threshold = Some(threshold);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_id() {
        let query = Query::parse("q17:3 1 4 1").unwrap();
        assert_eq!(query.id.as_deref(), Some("q17"));
        assert_eq!(query.terms, vec![3, 1, 4, 1]);
    }

    #[test]
    fn test_parse_without_id() {
        let query = Query::parse("5 9 2").unwrap();
        assert!(query.id.is_none());
        assert_eq!(query.id_or(12), "12");
        assert_eq!(query.terms, vec![5, 9, 2]);
    }

    #[test]
    fn test_parse_blank_line() {
        assert!(Query::parse("   ").is_none());
    }

    #[test]
    fn test_term_weights_unweighted() {
        let query = Query::parse("1 2 1 3 1").unwrap();
        assert_eq!(
            query.term_weights(false),
            vec![(1, 1.), (2, 1.), (3, 1.)]
        );
    }

    #[test]
    fn test_term_weights_weighted() {
        let query = Query::parse("1 2 1 3 1").unwrap();
        assert_eq!(
            query.term_weights(true),
            vec![(1, 3.), (2, 1.), (3, 1.)]
        );
    }

    #[test]
    fn test_empty_term_list() {
        let query = Query::parse("q1:").unwrap();
        assert!(query.terms.is_empty());
        assert!(query.term_weights(false).is_empty());
    }

    #[test]
    fn test_attach_thresholds() {
        let dir = temp_dir::TempDir::new().expect("Could not create temporary directory");
        let path = dir.path().join("thresholds");
        std::fs::write(&path, "1.5\n\n2.25\n").unwrap();

        let mut queries = vec![Query::new(vec![1]), Query::new(vec![2])];
        attach_thresholds(&mut queries, &path).unwrap();
        assert_eq!(queries[0].threshold, Some(1.5));
        assert_eq!(queries[1].threshold, Some(2.25));
    }

    #[test]
    fn test_threshold_count_mismatch() {
        let dir = temp_dir::TempDir::new().expect("Could not create temporary directory");
        let path = dir.path().join("thresholds");
        std::fs::write(&path, "1.5\n").unwrap();

        let mut queries = vec![Query::new(vec![1]), Query::new(vec![2])];
        let result = attach_thresholds(&mut queries, &path);
        assert!(matches!(result, Err(Error::Config(_))));
        // No partial attachment on failure
        assert!(queries.iter().all(|q| q.threshold.is_none()));
    }

    #[test]
    fn test_invalid_threshold() {
        let dir = temp_dir::TempDir::new().expect("Could not create temporary directory");
        let path = dir.path().join("thresholds");
        std::fs::write(&path, "1.5\nhigh\n").unwrap();

        let mut queries = vec![Query::new(vec![1]), Query::new(vec![2])];
        assert!(matches!(
            attach_thresholds(&mut queries, &path),
            Err(Error::Config(_))
        ));
    }
}
