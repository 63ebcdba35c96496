//! CQL attribute filter expressions.

use map_common::RecordRef;
use std::fmt;

/// A CQL filter expression carried as the `CQL_FILTER` request parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CqlFilter(String);

impl CqlFilter {
    /// Build the attribute filter selecting one worksite record.
    ///
    /// The identifier is interpolated verbatim. Identifiers come from links
    /// issued by the upstream planning system and never contain quotes; they
    /// are not escaped here.
    pub fn for_record(record: &RecordRef) -> Self {
        match record {
            RecordRef::Single { pk } => Self(format!("pk='{}'", pk)),
            RecordRef::BlockSite {
                block_id,
                working_site_id,
            } => Self(format!(
                "blockid='{}' AND workingsiteid='{}'",
                block_id, working_site_id
            )),
        }
    }

    /// Wrap a raw CQL expression.
    pub fn raw(expr: impl Into<String>) -> Self {
        Self(expr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CqlFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_key_filter() {
        let record = RecordRef::parse("ABC123").unwrap();
        assert_eq!(CqlFilter::for_record(&record).as_str(), "pk='ABC123'");
    }

    #[test]
    fn test_two_key_filter() {
        let record = RecordRef::parse("X_Y").unwrap();
        assert_eq!(
            CqlFilter::for_record(&record).as_str(),
            "blockid='X' AND workingsiteid='Y'"
        );
    }

    #[test]
    fn test_identifier_goes_in_verbatim() {
        let record = RecordRef::parse("A-B.C").unwrap();
        assert_eq!(CqlFilter::for_record(&record).as_str(), "pk='A-B.C'");
    }
}
