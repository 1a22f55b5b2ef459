use std::path::Path;

use palmistry_common::clock::Clock;
use rand::{thread_rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::{
    memory::MemoryImageStore, sqlite::SqliteImageStore, DeleteImageRequest, DeleteImageResponse,
    GetImageRequest, GetImageResponse, GetStatsRequest, GetStatsResponse, ImageStoreError,
    ImageStoreTrait, PurgeExpiredRequest, PurgeExpiredResponse, PutImageRequest,
    PutImageResponse, StoreLimits,
};

#[derive(Debug, Clone)]
pub enum ImageStore {
    Memory(MemoryImageStore<ChaCha20Rng>),
    Sqlite(SqliteImageStore<ChaCha20Rng>),
}

fn crypto_rng() -> Result<ChaCha20Rng, ImageStoreError> {
    ChaCha20Rng::from_rng(thread_rng())
        .map_err(|e| ImageStoreError::IOError(std::io::Error::other(e)))
}

impl ImageStore {
    pub fn new_memory(clock: Clock, limits: StoreLimits) -> Result<Self, ImageStoreError> {
        Ok(ImageStore::Memory(MemoryImageStore::new(
            crypto_rng()?,
            clock,
            limits,
        )))
    }

    pub fn new_sqlite<P: AsRef<Path>>(
        base_path: P,
        clock: Clock,
        limits: StoreLimits,
    ) -> Result<Self, ImageStoreError> {
        let store = SqliteImageStore::new(base_path, crypto_rng()?, clock, limits)?;
        store.migration()?;
        Ok(ImageStore::Sqlite(store))
    }
}

impl ImageStoreTrait for ImageStore {
    fn put_image(&self, request: PutImageRequest) -> Result<PutImageResponse, ImageStoreError> {
        match self {
            ImageStore::Memory(store) => store.put_image(request),
            ImageStore::Sqlite(store) => store.put_image(request),
        }
    }

    fn get_image(&self, request: GetImageRequest) -> Result<GetImageResponse, ImageStoreError> {
        match self {
            ImageStore::Memory(store) => store.get_image(request),
            ImageStore::Sqlite(store) => store.get_image(request),
        }
    }

    fn delete_image(
        &self,
        request: DeleteImageRequest,
    ) -> Result<DeleteImageResponse, ImageStoreError> {
        match self {
            ImageStore::Memory(store) => store.delete_image(request),
            ImageStore::Sqlite(store) => store.delete_image(request),
        }
    }

    fn purge_expired(
        &self,
        request: PurgeExpiredRequest,
    ) -> Result<PurgeExpiredResponse, ImageStoreError> {
        match self {
            ImageStore::Memory(store) => store.purge_expired(request),
            ImageStore::Sqlite(store) => store.purge_expired(request),
        }
    }

    fn get_stats(&self, request: GetStatsRequest) -> Result<GetStatsResponse, ImageStoreError> {
        match self {
            ImageStore::Memory(store) => store.get_stats(request),
            ImageStore::Sqlite(store) => store.get_stats(request),
        }
    }

    fn limits(&self) -> StoreLimits {
        match self {
            ImageStore::Memory(store) => store.limits(),
            ImageStore::Sqlite(store) => store.limits(),
        }
    }
}
