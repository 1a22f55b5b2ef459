use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info, warn};
use palmistry_common::clock::Clock;
use palmistry_common::image_id::{generate_image_id, is_valid_image_id};
use rand::RngCore;
use rusqlite::OptionalExtension;

use crate::*;

// file hierarchy
// base_path
// - images.sqlite
// - objects
//   - ab
//     - cd
//       - abcd...

/// Metadata in sqlite, bytes on disk. Records survive a restart but still
/// expire.
pub struct SqliteImageStore<Rng: RngCore> {
    db: Arc<Mutex<rusqlite::Connection>>,
    base_path: PathBuf,
    rng: Arc<Mutex<Rng>>,
    clock: Clock,
    limits: StoreLimits,
}

impl<Rng: RngCore> Clone for SqliteImageStore<Rng> {
    fn clone(&self) -> Self {
        Self {
            db: self.db.clone(),
            base_path: self.base_path.clone(),
            rng: self.rng.clone(),
            clock: self.clock.clone(),
            limits: self.limits,
        }
    }
}

impl<Rng: RngCore> Debug for SqliteImageStore<Rng> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteImageStore")
            .field("base_path", &self.base_path)
            .field("clock", &self.clock)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

fn to_db_time(time: SystemTime) -> String {
    let time: DateTime<Utc> = time.into();
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn from_db_time(s: &str) -> Result<SystemTime, ImageStoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(SystemTime::from)
        .map_err(|_| ImageStoreError::InvalidTimestamp(s.to_string()))
}

fn remove_file_if_exists(path: &Path) -> Result<(), ImageStoreError> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ImageStoreError::IOError(e)),
    }
}

impl<Rng: RngCore> SqliteImageStore<Rng> {
    pub fn new<P: AsRef<Path>>(
        base_path: P,
        rng: Rng,
        clock: Clock,
        limits: StoreLimits,
    ) -> Result<Self, ImageStoreError> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path).map_err(ImageStoreError::IOError)?;
        let db = rusqlite::Connection::open(base_path.join("images.sqlite"))
            .map_err(ImageStoreError::Sqlite)?;

        Ok(Self {
            db: Arc::new(Mutex::new(db)),
            base_path,
            rng: Arc::new(Mutex::new(rng)),
            clock,
            limits,
        })
    }

    pub fn migration(&self) -> Result<(), ImageStoreError> {
        self.db()
            .execute(
                "CREATE TABLE IF NOT EXISTS image (
                image_id TEXT PRIMARY KEY,
                content_type TEXT NOT NULL,
                size INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                access_seq INTEGER NOT NULL
            )",
                rusqlite::params![],
            )
            .map_err(ImageStoreError::Sqlite)?;
        Ok(())
    }

    fn db(&self) -> MutexGuard<'_, rusqlite::Connection> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn generate_id(&self) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        generate_image_id(&mut *rng)
    }

    fn object_path(&self, image_id: &str) -> PathBuf {
        let hierarchy1 = &image_id[0..2];
        let hierarchy2 = &image_id[2..4];
        self.base_path
            .join("objects")
            .join(hierarchy1)
            .join(hierarchy2)
            .join(image_id)
    }

    fn next_access_seq(db: &rusqlite::Connection) -> Result<i64, ImageStoreError> {
        db.query_row(
            "SELECT COALESCE(MAX(access_seq), 0) + 1 FROM image",
            rusqlite::params![],
            |row| row.get(0),
        )
        .map_err(ImageStoreError::Sqlite)
    }

    fn remove(&self, db: &rusqlite::Connection, image_id: &str) -> Result<bool, ImageStoreError> {
        let affected = db
            .execute(
                "DELETE FROM image WHERE image_id = ?",
                rusqlite::params![image_id],
            )
            .map_err(ImageStoreError::Sqlite)?;
        remove_file_if_exists(&self.object_path(image_id))?;
        Ok(affected > 0)
    }

    fn purge_expired_with(
        &self,
        db: &rusqlite::Connection,
        now: SystemTime,
    ) -> Result<u64, ImageStoreError> {
        let expired: Vec<String> = {
            let mut stmt = db
                .prepare("SELECT image_id FROM image WHERE expires_at <= ?")
                .map_err(ImageStoreError::Sqlite)?;
            let rows = stmt
                .query_map(rusqlite::params![to_db_time(now)], |row| row.get(0))
                .map_err(ImageStoreError::Sqlite)?;
            rows.collect::<Result<Vec<String>, _>>()
                .map_err(ImageStoreError::Sqlite)?
        };
        for image_id in &expired {
            self.remove(db, image_id)?;
        }
        Ok(expired.len() as u64)
    }

    fn usage(db: &rusqlite::Connection) -> Result<(usize, u64), ImageStoreError> {
        db.query_row(
            "SELECT COUNT(*), COALESCE(SUM(size), 0) FROM image",
            rusqlite::params![],
            |row| {
                let stored: i64 = row.get(0)?;
                let total_bytes: i64 = row.get(1)?;
                Ok((stored as usize, total_bytes as u64))
            },
        )
        .map_err(ImageStoreError::Sqlite)
    }

    fn evict_lru(&self, db: &rusqlite::Connection) -> Result<bool, ImageStoreError> {
        let oldest: Option<String> = db
            .query_row(
                "SELECT image_id FROM image ORDER BY access_seq ASC LIMIT 1",
                rusqlite::params![],
                |row| row.get(0),
            )
            .optional()
            .map_err(ImageStoreError::Sqlite)?;
        match oldest {
            Some(image_id) => {
                info!("evicted image {}", image_id);
                self.remove(db, &image_id)
            }
            None => Ok(false),
        }
    }
}

impl<Rng: RngCore> ImageStoreTrait for SqliteImageStore<Rng> {
    fn put_image(&self, request: PutImageRequest) -> Result<PutImageResponse, ImageStoreError> {
        let size = request.data.len() as u64;
        self.limits.check_image_size(size)?;

        let now = self.clock.now();
        let expires_at = now + self.limits.ttl;
        let image_id = self.generate_id();

        let db = self.db();
        self.purge_expired_with(&db, now)?;
        loop {
            let (stored, total_bytes) = Self::usage(&db)?;
            if !self.limits.must_evict(stored, total_bytes, size) || !self.evict_lru(&db)? {
                break;
            }
        }

        let object_path = self.object_path(&image_id);
        if let Some(parent) = object_path.parent() {
            std::fs::create_dir_all(parent).map_err(ImageStoreError::IOError)?;
        }
        std::fs::write(&object_path, &request.data).map_err(ImageStoreError::IOError)?;

        let access_seq = Self::next_access_seq(&db)?;
        let inserted = db.execute(
            "INSERT INTO image (image_id, content_type, size, created_at, expires_at, access_seq) VALUES (?, ?, ?, ?, ?, ?)",
            rusqlite::params![
                image_id,
                request.content_type,
                size as i64,
                to_db_time(now),
                to_db_time(expires_at),
                access_seq
            ],
        );
        if let Err(e) = inserted {
            remove_file_if_exists(&object_path)?;
            return Err(ImageStoreError::Sqlite(e));
        }
        debug!("stored image {} ({} bytes)", image_id, size);

        Ok(PutImageResponse {
            image_id,
            expires_at,
        })
    }

    fn get_image(&self, request: GetImageRequest) -> Result<GetImageResponse, ImageStoreError> {
        if !is_valid_image_id(&request.image_id) {
            return Ok(GetImageResponse::NotFound);
        }
        let now = self.clock.now();
        let db = self.db();

        let row: Option<(String, String)> = db
            .query_row(
                "SELECT content_type, expires_at FROM image WHERE image_id = ?",
                rusqlite::params![request.image_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(ImageStoreError::Sqlite)?;
        let Some((content_type, expires_at)) = row else {
            return Ok(GetImageResponse::NotFound);
        };

        let expires_at = from_db_time(&expires_at)?;
        if expires_at <= now {
            self.remove(&db, &request.image_id)?;
            return Ok(GetImageResponse::NotFound);
        }

        let data = match std::fs::read(self.object_path(&request.image_id)) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("image {} has no object file, dropping it", request.image_id);
                self.remove(&db, &request.image_id)?;
                return Ok(GetImageResponse::NotFound);
            }
            Err(e) => return Err(ImageStoreError::IOError(e)),
        };

        let access_seq = Self::next_access_seq(&db)?;
        db.execute(
            "UPDATE image SET access_seq = ? WHERE image_id = ?",
            rusqlite::params![access_seq, request.image_id],
        )
        .map_err(ImageStoreError::Sqlite)?;

        Ok(GetImageResponse::Found {
            data,
            content_type,
            expires_at,
        })
    }

    fn delete_image(
        &self,
        request: DeleteImageRequest,
    ) -> Result<DeleteImageResponse, ImageStoreError> {
        if !is_valid_image_id(&request.image_id) {
            return Ok(DeleteImageResponse::NotFound);
        }
        let db = self.db();
        if self.remove(&db, &request.image_id)? {
            Ok(DeleteImageResponse::Deleted)
        } else {
            Ok(DeleteImageResponse::NotFound)
        }
    }

    fn purge_expired(
        &self,
        _request: PurgeExpiredRequest,
    ) -> Result<PurgeExpiredResponse, ImageStoreError> {
        let now = self.clock.now();
        let db = self.db();
        let purged = self.purge_expired_with(&db, now)?;
        Ok(PurgeExpiredResponse { purged })
    }

    fn get_stats(&self, _request: GetStatsRequest) -> Result<GetStatsResponse, ImageStoreError> {
        let now = to_db_time(self.clock.now());
        self.db()
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(size), 0) FROM image WHERE expires_at > ?",
                rusqlite::params![now],
                |row| {
                    let stored: i64 = row.get(0)?;
                    let total_bytes: i64 = row.get(1)?;
                    Ok(GetStatsResponse {
                        stored: stored as u64,
                        total_bytes: total_bytes as u64,
                    })
                },
            )
            .map_err(ImageStoreError::Sqlite)
    }

    fn limits(&self) -> StoreLimits {
        self.limits
    }
}
