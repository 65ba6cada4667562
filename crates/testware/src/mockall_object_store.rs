use async_trait::async_trait;
use futures::stream::BoxStream;
use mockall::mock;
use object_store::{
    GetOptions, GetResult, ListResult, MultipartUpload, ObjectMeta, ObjectStore as OSObjectStore,
    PutMode, PutMultipartOpts, PutOptions, PutPayload, PutResult, Result, path::Path,
};
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

mock! {
    pub ObjectStore {}

    #[async_trait]
    impl OSObjectStore for ObjectStore {
        async fn put_opts(&self, location: &Path, payload: PutPayload, opts: PutOptions) -> Result<PutResult>;
        async fn put_multipart_opts(&self, location: &Path, opts: PutMultipartOpts) -> Result<Box<dyn MultipartUpload>>;
        async fn get_opts(&self, location: &Path, options: GetOptions) -> Result<GetResult>;
        async fn delete(&self, location: &Path) -> Result<()>;
        fn list<'a>(&'a self, prefix: Option<&'a Path>) -> BoxStream<'static, Result<ObjectMeta>>;
        async fn list_with_delimiter<'a, 'b>(&'a self, prefix: Option<&'b Path>) -> Result<ListResult>;
        async fn copy(&self, from: &Path, to: &Path) -> Result<()>;
        async fn copy_if_not_exists(&self, from: &Path, to: &Path) -> Result<()>;
    }
}

impl std::fmt::Debug for MockObjectStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "MockObjectStore")
    }
}

impl Display for MockObjectStore {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "MockObjectStore")
    }
}

fn unavailable() -> object_store::Error {
    object_store::Error::Generic {
        store: "mock",
        source: "bucket unavailable".into(),
    }
}

/// A store whose uploads and reads all fail.
pub fn unavailable_store() -> Arc<dyn OSObjectStore> {
    let mut store = MockObjectStore::new();
    store.expect_put_opts().returning(|_, _, _| Err(unavailable()));
    store.expect_get_opts().returning(|_, _| Err(unavailable()));
    Arc::new(store)
}

/// A store expecting exactly one create-only upload to `expected_path` of
/// `expected_len` bytes.
pub fn single_upload_store(expected_path: &str, expected_len: usize) -> Arc<dyn OSObjectStore> {
    let expected_path = Path::from(expected_path);
    let mut store = MockObjectStore::new();
    store
        .expect_put_opts()
        .withf(move |location, payload, opts| {
            *location == expected_path
                && payload.content_length() == expected_len
                && matches!(opts.mode, PutMode::Create)
        })
        .times(1)
        .returning(|_, _, _| {
            Ok(PutResult {
                e_tag: Some("etag".to_string()),
                version: None,
            })
        });
    Arc::new(store)
}
