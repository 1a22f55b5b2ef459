use std::fmt::Debug;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::SystemTime;

use log::{debug, info};
use lru::LruCache;
use palmistry_common::clock::Clock;
use palmistry_common::image_id::{generate_image_id, is_valid_image_id};
use rand::RngCore;

use crate::*;

#[derive(Debug)]
struct StoredImage {
    data: Vec<u8>,
    content_type: String,
    expires_at: SystemTime,
}

#[derive(Debug)]
struct Images {
    cache: LruCache<String, StoredImage>,
    total_bytes: u64,
}

impl Images {
    fn insert(&mut self, image_id: String, image: StoredImage) {
        self.total_bytes += image.data.len() as u64;
        self.cache.put(image_id, image);
    }

    fn remove(&mut self, image_id: &str) -> bool {
        match self.cache.pop(image_id) {
            Some(image) => {
                self.total_bytes -= image.data.len() as u64;
                true
            }
            None => false,
        }
    }

    fn evict_lru(&mut self) -> bool {
        match self.cache.pop_lru() {
            Some((image_id, image)) => {
                self.total_bytes -= image.data.len() as u64;
                info!("evicted image {} ({} bytes)", image_id, image.data.len());
                true
            }
            None => false,
        }
    }

    fn purge_expired(&mut self, now: SystemTime) -> u64 {
        let expired: Vec<String> = self
            .cache
            .iter()
            .filter(|(_, image)| image.expires_at <= now)
            .map(|(image_id, _)| image_id.clone())
            .collect();
        for image_id in &expired {
            self.remove(image_id);
        }
        expired.len() as u64
    }
}

/// Process-local store. Bounded by the limits, lost on restart.
pub struct MemoryImageStore<Rng: RngCore> {
    images: Arc<Mutex<Images>>,
    rng: Arc<Mutex<Rng>>,
    clock: Clock,
    limits: StoreLimits,
}

impl<Rng: RngCore> Clone for MemoryImageStore<Rng> {
    fn clone(&self) -> Self {
        Self {
            images: self.images.clone(),
            rng: self.rng.clone(),
            clock: self.clock.clone(),
            limits: self.limits,
        }
    }
}

impl<Rng: RngCore> Debug for MemoryImageStore<Rng> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryImageStore")
            .field("clock", &self.clock)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}

impl<Rng: RngCore> MemoryImageStore<Rng> {
    pub fn new(rng: Rng, clock: Clock, limits: StoreLimits) -> Self {
        Self {
            images: Arc::new(Mutex::new(Images {
                cache: LruCache::unbounded(),
                total_bytes: 0,
            })),
            rng: Arc::new(Mutex::new(rng)),
            clock,
            limits,
        }
    }

    fn images(&self) -> MutexGuard<'_, Images> {
        self.images.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn generate_id(&self) -> String {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        generate_image_id(&mut *rng)
    }
}

impl<Rng: RngCore> ImageStoreTrait for MemoryImageStore<Rng> {
    fn put_image(&self, request: PutImageRequest) -> Result<PutImageResponse, ImageStoreError> {
        let size = request.data.len() as u64;
        self.limits.check_image_size(size)?;

        let now = self.clock.now();
        let expires_at = now + self.limits.ttl;
        let image_id = self.generate_id();

        let mut images = self.images();
        images.purge_expired(now);
        while self
            .limits
            .must_evict(images.cache.len(), images.total_bytes, size)
        {
            if !images.evict_lru() {
                break;
            }
        }
        images.insert(
            image_id.clone(),
            StoredImage {
                data: request.data,
                content_type: request.content_type,
                expires_at,
            },
        );
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
        let mut images = self.images();

        let expired = match images.cache.peek(&request.image_id) {
            Some(image) => image.expires_at <= now,
            None => return Ok(GetImageResponse::NotFound),
        };
        if expired {
            images.remove(&request.image_id);
            return Ok(GetImageResponse::NotFound);
        }

        let res = images
            .cache
            .get(&request.image_id)
            .map(|image| GetImageResponse::Found {
                data: image.data.clone(),
                content_type: image.content_type.clone(),
                expires_at: image.expires_at,
            })
            .unwrap_or(GetImageResponse::NotFound);
        Ok(res)
    }

    fn delete_image(
        &self,
        request: DeleteImageRequest,
    ) -> Result<DeleteImageResponse, ImageStoreError> {
        if self.images().remove(&request.image_id) {
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
        let purged = self.images().purge_expired(now);
        Ok(PurgeExpiredResponse { purged })
    }

    fn get_stats(&self, _request: GetStatsRequest) -> Result<GetStatsResponse, ImageStoreError> {
        let now = self.clock.now();
        let images = self.images();
        let (stored, total_bytes) = images
            .cache
            .iter()
            .filter(|(_, image)| image.expires_at > now)
            .fold((0, 0), |(stored, total_bytes), (_, image)| {
                (stored + 1, total_bytes + image.data.len() as u64)
            });
        Ok(GetStatsResponse {
            stored,
            total_bytes,
        })
    }

    fn limits(&self) -> StoreLimits {
        self.limits
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand_pcg::Pcg64Mcg;

    use super::*;

    fn fixed_clock() -> Clock {
        Clock::new_with_fixed_time(
            SystemTime::UNIX_EPOCH + Duration::from_secs(40 * 365 * 24 * 60 * 60),
        )
    }

    fn put(store: &MemoryImageStore<Pcg64Mcg>, data: &[u8]) -> String {
        store
            .put_image(PutImageRequest {
                data: data.to_vec(),
                content_type: "image/png".to_string(),
            })
            .unwrap()
            .image_id
    }

    fn get(store: &MemoryImageStore<Pcg64Mcg>, image_id: &str) -> GetImageResponse {
        store
            .get_image(GetImageRequest {
                image_id: image_id.to_string(),
            })
            .unwrap()
    }

    #[test]
    fn test_put_and_get() {
        let store = MemoryImageStore::new(Pcg64Mcg::new(42), fixed_clock(), StoreLimits::default());
        let image_id = put(&store, b"Hello, world!");

        let GetImageResponse::Found {
            data, content_type, ..
        } = get(&store, &image_id)
        else {
            panic!("image not found");
        };
        assert_eq!(data, b"Hello, world!");
        assert_eq!(content_type, "image/png");
    }

    #[test]
    fn test_expired_image_is_not_found() {
        let clock = fixed_clock();
        let store = MemoryImageStore::new(Pcg64Mcg::new(42), clock.clone(), StoreLimits::default());
        let image_id = put(&store, b"palm");

        clock.advance(Duration::from_secs(299));
        assert!(matches!(get(&store, &image_id), GetImageResponse::Found { .. }));

        clock.advance(Duration::from_secs(1));
        assert!(matches!(get(&store, &image_id), GetImageResponse::NotFound));
        assert_eq!(
            store.get_stats(GetStatsRequest {}).unwrap(),
            GetStatsResponse {
                stored: 0,
                total_bytes: 0
            }
        );
    }

    #[test]
    fn test_unknown_and_malformed_ids() {
        let store = MemoryImageStore::new(Pcg64Mcg::new(42), fixed_clock(), StoreLimits::default());
        put(&store, b"palm");
        assert!(matches!(get(&store, &"A".repeat(43)), GetImageResponse::NotFound));
        assert!(matches!(get(&store, "../etc/passwd"), GetImageResponse::NotFound));
    }

    #[test]
    fn test_evicts_least_recently_used_by_count() {
        let limits = StoreLimits {
            max_items: 2,
            ..StoreLimits::default()
        };
        let store = MemoryImageStore::new(Pcg64Mcg::new(42), fixed_clock(), limits);
        let first = put(&store, b"first");
        let second = put(&store, b"second");

        // touching `first` makes `second` the eviction candidate
        get(&store, &first);
        let third = put(&store, b"third");

        assert!(matches!(get(&store, &first), GetImageResponse::Found { .. }));
        assert!(matches!(get(&store, &second), GetImageResponse::NotFound));
        assert!(matches!(get(&store, &third), GetImageResponse::Found { .. }));
    }

    #[test]
    fn test_evicts_by_total_bytes() {
        let limits = StoreLimits {
            max_total_bytes: 10,
            ..StoreLimits::default()
        };
        let store = MemoryImageStore::new(Pcg64Mcg::new(42), fixed_clock(), limits);
        put(&store, b"12345");
        put(&store, b"67890");
        put(&store, b"abc");

        let stats = store.get_stats(GetStatsRequest {}).unwrap();
        assert_eq!(
            stats,
            GetStatsResponse {
                stored: 2,
                total_bytes: 8
            }
        );
    }

    #[test]
    fn test_rejects_empty_and_oversized_images() {
        let limits = StoreLimits {
            max_image_bytes: 4,
            ..StoreLimits::default()
        };
        let store = MemoryImageStore::new(Pcg64Mcg::new(42), fixed_clock(), limits);
        let empty = store.put_image(PutImageRequest {
            data: vec![],
            content_type: "image/png".to_string(),
        });
        assert!(matches!(empty, Err(ImageStoreError::EmptyImage)));

        let oversized = store.put_image(PutImageRequest {
            data: b"12345".to_vec(),
            content_type: "image/png".to_string(),
        });
        assert!(matches!(
            oversized,
            Err(ImageStoreError::ImageTooLarge { size: 5, limit: 4 })
        ));
    }

    #[test]
    fn test_purge_expired() {
        let clock = fixed_clock();
        let store = MemoryImageStore::new(Pcg64Mcg::new(42), clock.clone(), StoreLimits::default());
        put(&store, b"old");
        clock.advance(Duration::from_secs(200));
        put(&store, b"new");
        clock.advance(Duration::from_secs(100));

        let res = store.purge_expired(PurgeExpiredRequest {}).unwrap();
        insta::assert_debug_snapshot!(res, @r###"
        PurgeExpiredResponse {
            purged: 1,
        }
        "###);
    }

    #[test]
    fn test_delete_image() {
        let store = MemoryImageStore::new(Pcg64Mcg::new(42), fixed_clock(), StoreLimits::default());
        let image_id = put(&store, b"palm");
        let req = || DeleteImageRequest {
            image_id: image_id.clone(),
        };
        assert_eq!(store.delete_image(req()).unwrap(), DeleteImageResponse::Deleted);
        assert_eq!(store.delete_image(req()).unwrap(), DeleteImageResponse::NotFound);
    }

    #[test]
    fn test_clones_share_images() {
        let store = MemoryImageStore::new(Pcg64Mcg::new(42), fixed_clock(), StoreLimits::default());
        let other = store.clone();
        let image_id = put(&store, b"palm");
        assert!(matches!(get(&other, &image_id), GetImageResponse::Found { .. }));
    }
}
