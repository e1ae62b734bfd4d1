//! Serialization Module
//!
//! Encodes typed values into the opaque bytes the caches store.

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::CacheBackend;
use crate::error::Result;

// == Serializer ==
/// Converts values to and from opaque payloads.
pub trait Serializer: Send + Sync {
    fn marshal<T: Serialize + ?Sized>(&self, value: &T) -> Result<Bytes>;

    fn unmarshal<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T>;
}

/// JSON encoding via serde_json. The default for typed access.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSerializer;

impl Serializer for JsonSerializer {
    fn marshal<T: Serialize + ?Sized>(&self, value: &T) -> Result<Bytes> {
        Ok(Bytes::from(serde_json::to_vec(value)?))
    }

    fn unmarshal<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(data)?)
    }
}

/// Compact binary encoding via bincode.
///
/// Not self-describing: a payload only decodes into the type that wrote it.
#[derive(Debug, Clone, Copy, Default)]
pub struct BincodeSerializer;

impl Serializer for BincodeSerializer {
    fn marshal<T: Serialize + ?Sized>(&self, value: &T) -> Result<Bytes> {
        Ok(Bytes::from(bincode::serialize(value)?))
    }

    fn unmarshal<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T> {
        Ok(bincode::deserialize(data)?)
    }
}

// == Typed Access ==
/// Typed `get`/`set` on top of any [`CacheBackend`], with the encoding
/// chosen per call.
#[async_trait]
pub trait TypedCacheExt: CacheBackend {
    async fn set_with<S, T>(&self, serializer: &S, key: &str, value: &T) -> Result<()>
    where
        S: Serializer,
        T: Serialize + Sync + ?Sized,
    {
        let encoded = serializer.marshal(value)?;
        self.set(key, encoded).await
    }

    async fn get_with<S, T>(&self, serializer: &S, key: &str) -> Result<T>
    where
        S: Serializer,
        T: DeserializeOwned,
    {
        let raw = self.get(key).await?;
        serializer.unmarshal(&raw)
    }

    async fn set_json<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + Sync + ?Sized,
    {
        self.set_with(&JsonSerializer, key, value).await
    }

    async fn get_json<T>(&self, key: &str) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.get_with(&JsonSerializer, key).await
    }
}

impl<C: CacheBackend + ?Sized> TypedCacheExt for C {}
