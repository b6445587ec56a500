//! Records of values for logging.
//!
//! The network itself does not log metrics; a [`Record`] is handed to the caller,
//! e.g. by [`CnnDriver::param_stats`](crate::CnnDriver::param_stats), so that a
//! training harness can forward it to its own recorder.
use crate::DriverError;
use std::collections::btree_map::{BTreeMap, IntoIter, Iter, Keys};

/// Possible types of values stored in a [`Record`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordValue {
    /// A single floating-point value.
    Scalar(f32),

    /// A 1-dimensional array of floating-point values.
    Array1(Vec<f32>),

    /// A text value.
    String(String),
}

/// Key-value pairs sorted by key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record(BTreeMap<String, RecordValue>);

impl Record {
    /// Creates an empty record.
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Creates a record containing a single scalar value.
    pub fn from_scalar(name: impl Into<String>, value: f32) -> Self {
        let mut record = Self::empty();
        record.insert(name, RecordValue::Scalar(value));
        record
    }

    /// Returns an iterator over the keys in the record.
    pub fn keys(&self) -> Keys<String, RecordValue> {
        self.0.keys()
    }

    /// Inserts a key-value pair into the record.
    pub fn insert(&mut self, k: impl Into<String>, v: RecordValue) {
        self.0.insert(k.into(), v);
    }

    /// Returns an iterator over the key-value pairs in the record.
    pub fn iter(&self) -> Iter<'_, String, RecordValue> {
        self.0.iter()
    }

    /// Returns an iterator that consumes the record.
    pub fn into_iter_in_record(self) -> IntoIter<String, RecordValue> {
        self.0.into_iter()
    }

    /// Gets a reference to the value associated with the given key.
    pub fn get(&self, k: &str) -> Option<&RecordValue> {
        self.0.get(k)
    }

    /// Returns the number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Checks if the record is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Merges two records, consuming both.
    ///
    /// Values of `record` overwrite those of `self` for the same key.
    pub fn merge(self, record: Record) -> Self {
        Record(self.0.into_iter().chain(record.0).collect())
    }

    /// Gets a scalar value from the record.
    pub fn get_scalar(&self, k: &str) -> Result<f32, DriverError> {
        match self.0.get(k) {
            Some(RecordValue::Scalar(v)) => Ok(*v),
            Some(_) => Err(DriverError::RecordValueType("Scalar".to_string())),
            None => Err(DriverError::RecordKey(k.to_string())),
        }
    }

    /// Gets a 1-dimensional array from the record.
    pub fn get_array1(&self, k: &str) -> Result<Vec<f32>, DriverError> {
        match self.0.get(k) {
            Some(RecordValue::Array1(v)) => Ok(v.clone()),
            Some(_) => Err(DriverError::RecordValueType("Array1".to_string())),
            None => Err(DriverError::RecordKey(k.to_string())),
        }
    }

    /// Gets a string value from the record.
    pub fn get_string(&self, k: &str) -> Result<String, DriverError> {
        match self.0.get(k) {
            Some(RecordValue::String(s)) => Ok(s.clone()),
            Some(_) => Err(DriverError::RecordValueType("String".to_string())),
            None => Err(DriverError::RecordKey(k.to_string())),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_get_with_wrong_type() {
        let mut record = Record::from_scalar("loss", 0.5);
        record.insert("stage", RecordValue::String("layer1".to_string()));

        assert_eq!(record.get_scalar("loss"), Ok(0.5));
        assert_eq!(
            record.get_scalar("stage"),
            Err(DriverError::RecordValueType("Scalar".to_string()))
        );
        assert_eq!(
            record.get_array1("missing"),
            Err(DriverError::RecordKey("missing".to_string()))
        );
    }

    #[test]
    fn test_merge_overwrites() {
        let r1 = Record::from_scalar("a", 1.0).merge(Record::from_scalar("b", 2.0));
        let r2 = r1.merge(Record::from_scalar("a", 3.0));

        assert_eq!(r2.len(), 2);
        assert_eq!(r2.get_scalar("a"), Ok(3.0));
        assert_eq!(r2.keys().cloned().collect::<Vec<_>>(), vec!["a", "b"]);
    }
}
