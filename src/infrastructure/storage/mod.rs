mod azure_blob_store;

pub use azure_blob_store::AzureBlobStore;
