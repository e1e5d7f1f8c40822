//! Arbitration ID Route Table

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

/// Errors building an arbitration table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("Arbitration id 0x{0:X} mapped more than once")]
    DuplicateId(u32),

    #[error("Arbitration id 0x{0:X} mapped to an empty topic")]
    EmptyTopic(u32),
}

/// Immutable mapping from arbitration id to destination topic
///
/// Built once at startup; a new configuration means building a new table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArbitrationTable {
    routes: HashMap<u32, String>,
}

impl ArbitrationTable {
    /// Build a table, rejecting duplicate ids and empty topics
    pub fn new<I, S>(entries: I) -> Result<Self, TableError>
    where
        I: IntoIterator<Item = (u32, S)>,
        S: Into<String>,
    {
        let mut routes = HashMap::new();
        for (id, topic) in entries {
            let topic = topic.into();
            if topic.is_empty() {
                return Err(TableError::EmptyTopic(id));
            }
            if routes.insert(id, topic).is_some() {
                return Err(TableError::DuplicateId(id));
            }
        }

        debug!("Arbitration table built with {} routes", routes.len());
        Ok(Self { routes })
    }

    /// Destination topic for an arbitration id
    pub fn get(&self, arbitration_id: u32) -> Option<&str> {
        self.routes.get(&arbitration_id).map(String::as_str)
    }

    /// Routes ordered by arbitration id
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        let mut routes: Vec<_> = self
            .routes
            .iter()
            .map(|(id, topic)| (*id, topic.as_str()))
            .collect();
        routes.sort_unstable_by_key(|(id, _)| *id);
        routes.into_iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

impl Default for ArbitrationTable {
    /// Simulator sensor topics
    fn default() -> Self {
        let routes = [
            (0x100, "simsensor/blindspot"),
            (0x101, "simsensor/pedestrian"),
            (0x102, "simsensor/frontalcollision"),
            (0x103, "simsensor/rearcollision"),
        ]
        .into_iter()
        .map(|(id, topic)| (id, topic.to_string()))
        .collect();

        Self { routes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_routes() {
        let table = ArbitrationTable::default();
        assert_eq!(table.len(), 4);
        assert_eq!(table.get(0x100), Some("simsensor/blindspot"));
        assert_eq!(table.get(0x101), Some("simsensor/pedestrian"));
        assert_eq!(table.get(0x102), Some("simsensor/frontalcollision"));
        assert_eq!(table.get(0x103), Some("simsensor/rearcollision"));
        assert_eq!(table.get(0x999), None);

        let ids: Vec<u32> = table.iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![0x100, 0x101, 0x102, 0x103]);
    }

    #[test]
    fn test_custom_table() {
        let table = ArbitrationTable::new([(0x200, "simsensor/lane")]).unwrap();
        assert_eq!(table.get(0x200), Some("simsensor/lane"));
        assert_eq!(table.get(0x100), None);
    }

    #[test]
    fn test_invalid_tables() {
        assert_eq!(
            ArbitrationTable::new([(0x100, "a"), (0x100, "b")]),
            Err(TableError::DuplicateId(0x100))
        );
        assert_eq!(
            ArbitrationTable::new([(0x101, "")]),
            Err(TableError::EmptyTopic(0x101))
        );
        assert!(ArbitrationTable::new(Vec::<(u32, String)>::new()).unwrap().is_empty());
    }
}
