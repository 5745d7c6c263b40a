use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use rusqlite_migration::{Migrations, M};

use crate::app::{Result, TributaryError};
use crate::domain::FreshnessEntry;
use crate::store::{FreshnessStore, SubscriptionSource};

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn run_migrations(&self) -> Result<()> {
        let migrations = Migrations::new(vec![M::up(include_str!(
            "../../migrations/001-initial/up.sql"
        ))]);

        let mut conn = self.conn()?;
        migrations
            .to_latest(&mut conn)
            .map_err(|e| TributaryError::Persistence(format!("migration failed: {e}")))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| TributaryError::Persistence(e.to_string()))
    }

    fn parse_datetime(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    /// Adds `urls` to `list`, ignoring ones already present. Returns how many
    /// were new.
    pub fn subscribe(&self, list: &str, urls: &[String]) -> Result<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut added = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO subscriptions (list, url, added_at) VALUES (?1, ?2, ?3)",
            )?;
            let now = Utc::now().to_rfc3339();
            for url in urls {
                added += stmt.execute(params![list, url, now])?;
            }
        }
        tx.commit()?;
        Ok(added)
    }
}

impl SubscriptionSource for SqliteStore {
    fn list_urls(&self, list: &str) -> Result<BTreeSet<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT url FROM subscriptions WHERE list = ?1")?;
        let urls = stmt
            .query_map(params![list], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<BTreeSet<_>, _>>()?;
        Ok(urls)
    }

    fn all_lists(&self) -> Result<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT DISTINCT list FROM subscriptions ORDER BY list")?;
        let lists = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(lists)
    }
}

impl FreshnessStore for SqliteStore {
    fn load(&self) -> Result<HashMap<String, FreshnessEntry>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT url, validation_token, last_fetch, fetch_after FROM freshness",
        )?;
        let entries = stmt
            .query_map([], |row| {
                let last_fetch: String = row.get(2)?;
                let fetch_after: String = row.get(3)?;
                Ok(FreshnessEntry {
                    url: row.get(0)?,
                    validation_token: row.get(1)?,
                    last_fetch: Self::parse_datetime(&last_fetch),
                    fetch_after: Self::parse_datetime(&fetch_after),
                })
            })?
            .map(|entry| entry.map(|e| (e.url.clone(), e)))
            .collect::<std::result::Result<HashMap<_, _>, _>>()?;
        Ok(entries)
    }

    fn save(&self, entries: &HashMap<String, FreshnessEntry>) -> Result<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM freshness", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO freshness (url, validation_token, last_fetch, fetch_after)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;
            for entry in entries.values() {
                stmt.execute(params![
                    entry.url,
                    entry.validation_token,
                    entry.last_fetch.to_rfc3339(),
                    entry.fetch_after.to_rfc3339(),
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_load_empty() {
        let store = SqliteStore::in_memory().unwrap();
        assert!(store.load().unwrap().is_empty());
    }

    #[test]
    fn test_save_then_load() {
        let store = SqliteStore::in_memory().unwrap();
        let mut entry = FreshnessEntry::new("https://example.com/feed.xml");
        entry.validation_token = "W/\"123\"".into();
        entry.last_fetch = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        entry.fetch_after = Utc.with_ymd_and_hms(2024, 5, 1, 12, 1, 0).unwrap();

        let entries = HashMap::from([(entry.url.clone(), entry.clone())]);
        store.save(&entries).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded["https://example.com/feed.xml"], entry);
    }

    #[test]
    fn test_save_replaces_previous_snapshot() {
        let store = SqliteStore::in_memory().unwrap();
        let a = FreshnessEntry::new("https://a.example/feed");
        let b = FreshnessEntry::new("https://b.example/feed");

        store
            .save(&HashMap::from([(a.url.clone(), a.clone())]))
            .unwrap();
        store
            .save(&HashMap::from([(b.url.clone(), b.clone())]))
            .unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains_key(&b.url));
    }

    #[test]
    fn test_zero_entry_round_trips_as_epoch() {
        let store = SqliteStore::in_memory().unwrap();
        let entry = FreshnessEntry::new("https://example.com/feed.xml");
        store
            .save(&HashMap::from([(entry.url.clone(), entry.clone())]))
            .unwrap();

        let loaded = store.load().unwrap();
        assert!(!loaded[&entry.url].has_been_fetched());
    }

    #[test]
    fn test_subscribe_and_list() {
        let store = SqliteStore::in_memory().unwrap();
        let added = store
            .subscribe(
                "tech",
                &["https://a.example/feed".into(), "https://b.example/feed".into()],
            )
            .unwrap();
        assert_eq!(added, 2);

        let added = store
            .subscribe("tech", &["https://a.example/feed".into()])
            .unwrap();
        assert_eq!(added, 0);

        store
            .subscribe("news", &["https://a.example/feed".into()])
            .unwrap();

        assert_eq!(store.all_lists().unwrap(), vec!["news", "tech"]);
        assert_eq!(store.list_urls("tech").unwrap().len(), 2);
        assert_eq!(store.list_urls("news").unwrap().len(), 1);
        assert!(store.list_urls("missing").unwrap().is_empty());
    }
}
